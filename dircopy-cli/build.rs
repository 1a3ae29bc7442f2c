//! Build script for dircopy-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Build scripts cannot depend on the crate being built, so the command
//! structure is described again here.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

fn archive_arg() -> Arg {
    Arg::new("archive")
        .long("archive")
        .help("Archive path (tar, optionally gzip-compressed)")
        .value_name("PATH")
        .required(true)
}

fn dest_arg() -> Arg {
    Arg::new("dest")
        .long("dest")
        .help("Destination directory")
        .value_name("PATH")
        .required(true)
}

fn switch(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::SetTrue)
}

/// Build the CLI command structure for man page generation.
///
/// Keep this structure synchronized with src/cli.rs and src/commands/.
fn build_cli() -> Command {
    Command::new("dircopy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Synchronize a directory tree from a tar archive")
        .long_about(
            "Reconcile a destination directory with a tar archive: extract changed \
             entries, optionally remove entries the archive does not list, and \
             enforce ownership and permissions on the whole tree",
        )
        .arg(switch("verbose", "Enable verbose output").global(true))
        .arg(switch("quiet", "Suppress non-essential output").global(true))
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .help("Override the user configuration directory (default: ~/.dircopy)")
                .value_name("PATH")
                .global(true)
                .env("DIRCOPY_CONFIG_DIR"),
        )
        .arg(switch("no-config", "Do not read configuration files").global(true))
        .subcommands(vec![
            Command::new("sync")
                .about("Reconcile a destination directory with an archive")
                .arg(archive_arg())
                .arg(dest_arg())
                .arg(Arg::new("owner").long("owner").value_name("USER").help("Owner of the destination tree"))
                .arg(Arg::new("group").long("group").value_name("GROUP").help("Group of the destination tree"))
                .arg(Arg::new("mode").long("mode").value_name("MODE").help("Octal mode for files, 3 or 4 digits"))
                .arg(switch("identical", "Remove destination entries that are not in the archive").visible_alias("delete"))
                .arg(switch("specialx", "Force execute bits on directories").visible_alias("x4dirs"))
                .arg(switch("diff", "Include the before/after report"))
                .arg(switch("dry-run", "Report what would change without changing anything"))
                .arg(Arg::new("format").long("format").value_name("FORMAT").help("Output format (human, json)")),
            Command::new("diff")
                .about("Show which archive entries differ from the destination")
                .arg(archive_arg())
                .arg(dest_arg()),
            Command::new("list")
                .about("List the entries of an archive")
                .arg(archive_arg()),
            Command::new("validate")
                .about("Validate configuration and show the resolved target")
                .long_about("Merge configuration sources and resolve owner, group and modes"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() -> std::io::Result<()> {
    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").unwrap_or_default());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;

    fs::write(man_dir.join("dircopy.1"), buffer)?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
    Ok(())
}
