//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary directories
//! - Archive fixtures written with the `tar` crate
//! - Command builder helpers with configuration isolated from the host

use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Variables the library reads; removed so the host cannot leak in.
const DIRCOPY_ENV_VARS: [&str; 10] = [
    "DIRCOPY_OWNER",
    "DIRCOPY_GROUP",
    "DIRCOPY_MODE",
    "DIRCOPY_IDENTICAL",
    "DIRCOPY_SPECIALX",
    "DIRCOPY_VERBOSE",
    "DIRCOPY_DIFF",
    "DIRCOPY_DRY_RUN",
    "DIRCOPY_CONFIG_DIR",
    "DIRCOPY_LOG_MODE",
];

/// Test environment with an archive and a destination path.
///
/// This struct provides an isolated test environment with:
/// - A temporary directory for test files
/// - `archive`: path of the archive (written by [`TestEnv::write_archive`])
/// - `dest`: destination path (not created yet)
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Archive path
    pub archive: PathBuf,
    /// Destination path
    pub dest: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let archive = temp_path.join("payload.tar");
        let dest = temp_path.join("site");

        Self {
            temp_dir,
            temp_path,
            archive,
            dest,
        }
    }

    /// Get a bare command builder without pre-configured flags.
    ///
    /// The `DIRCOPY_*` variables are still removed.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("dircopy").expect("Failed to find dircopy binary");
        for key in DIRCOPY_ENV_VARS {
            cmd.env_remove(key);
        }
        cmd.current_dir(&self.temp_path);
        cmd
    }

    /// Get a command builder that ignores configuration files.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--no-config");
        cmd
    }

    /// A `sync` invocation against this environment's archive and
    /// destination, with mode 640 and traversal bits for directories.
    pub fn sync(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("sync")
            .arg("--archive")
            .arg(&self.archive)
            .arg("--dest")
            .arg(&self.dest)
            .arg("--mode")
            .arg("640")
            .arg("--specialx");
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write the archive from `(path, contents)` pairs. A path ending in
    /// `/` is added as a directory.
    pub fn write_archive(&self, entries: &[(&str, &str)]) {
        let file = fs::File::create(&self.archive).expect("Failed to create archive");
        let mut builder = tar::Builder::new(file);

        for (path, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_mtime(1_600_000_000);
            header.set_uid(u64::from(nix::unistd::geteuid().as_raw()));
            header.set_gid(u64::from(nix::unistd::getegid().as_raw()));
            if let Some(dir) = path.strip_suffix('/') {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                header.set_cksum();
                builder
                    .append_data(&mut header, dir, std::io::empty())
                    .expect("Failed to append directory");
            } else {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(contents.len() as u64);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, contents.as_bytes())
                    .expect("Failed to append file");
            }
        }

        builder.finish().expect("Failed to finish archive");
    }

    /// Compress the archive in place with gzip.
    pub fn gzip_archive(&self) {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let data = fs::read(&self.archive).expect("Failed to read archive");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data).expect("Failed to compress");
        let compressed = encoder.finish().expect("Failed to finish gzip stream");
        fs::write(&self.archive, compressed).expect("Failed to write archive");
    }

    /// Write a file below the destination with mode 0644.
    pub fn write_dest(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.dest.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent");
        }
        fs::write(&path, contents).expect("Failed to write file");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644))
            .expect("Failed to set permissions");
        path
    }

    /// Permission bits of a path below the destination.
    pub fn mode_of(&self, rel: &str) -> u32 {
        let path = if rel.is_empty() {
            self.dest.clone()
        } else {
            self.dest.join(rel)
        };
        fs::symlink_metadata(path)
            .expect("Failed to stat")
            .permissions()
            .mode()
            & 0o7777
    }

    /// Write a configuration file into the working directory.
    pub fn write_project_config(&self, contents: &str) -> PathBuf {
        let path = self.temp_path.join("dircopy.yaml");
        fs::write(&path, contents).expect("Failed to write config");
        path
    }
}
