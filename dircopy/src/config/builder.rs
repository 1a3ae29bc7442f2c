//! Builder that layers every configuration source into one [`Config`].

use std::env;
use std::path::{Path, PathBuf};

use crate::config::environment::EnvironmentConfig;
use crate::config::loader::{ConfigLoader, ConfigSource};
use crate::config::merger::ConfigMerger;
use crate::config::schema::Config;
use crate::config::validator::ConfigValidator;
use crate::error::Result;

/// Builds the effective configuration.
///
/// Sources are merged from lowest to highest precedence: user config,
/// `dircopy.yaml`, `dircopy.local.yaml`, environment, programmatic
/// overrides. The result is validated before it is returned.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    working_dir: Option<PathBuf>,
    user_config_dir: Option<PathBuf>,
    skip_files: bool,
    skip_env: bool,
    overrides: Option<Config>,
}

impl ConfigBuilder {
    /// Creates a builder that reads files from the current directory and
    /// `~/.dircopy`, plus the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start project config discovery from `dir` instead of the current
    /// directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    /// Read the user config from `dir/config.yaml` instead of `~/.dircopy`.
    #[must_use]
    pub fn with_user_config_dir(mut self, dir: &Path) -> Self {
        self.user_config_dir = Some(dir.to_path_buf());
        self
    }

    /// Do not read any configuration file.
    #[must_use]
    pub fn skip_files(mut self) -> Self {
        self.skip_files = true;
        self
    }

    /// Ignore `DIRCOPY_*` environment variables.
    #[must_use]
    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Apply `config` on top of every other source.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.overrides = Some(config);
        self
    }

    /// Loads, merges and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be read or parsed, an
    /// environment variable is malformed, or validation fails.
    pub fn build(self) -> Result<Config> {
        let mut sources: Vec<ConfigSource> = Vec::new();

        if !self.skip_files {
            let working_dir = match self.working_dir {
                Some(dir) => dir,
                None => env::current_dir()?,
            };
            sources = ConfigLoader::load_all(&working_dir, self.user_config_dir.as_deref())?;
        }

        let mut config = ConfigMerger::merge(sources);

        if !self.skip_env {
            EnvironmentConfig::apply_overrides(&mut config)?;
        }

        if let Some(ref overrides) = self.overrides {
            ConfigMerger::merge_into(&mut config, overrides);
        }

        ConfigValidator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_skip_everything_yields_defaults() {
        let config = ConfigBuilder::new().skip_files().skip_env().build().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides_beat_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(project.path().join("dircopy.yaml"), "owner: file\nidentical: true\n").unwrap();

        let config = ConfigBuilder::new()
            .with_working_dir(project.path())
            .with_user_config_dir(user.path())
            .skip_env()
            .with_config(Config {
                owner: Some("override".into()),
                ..Config::default()
            })
            .build()
            .unwrap();

        assert_eq!(config.owner.as_deref(), Some("override"));
        assert_eq!(config.identical, Some(true));
    }

    #[test]
    #[serial]
    fn test_environment_beats_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(project.path().join("dircopy.local.yaml"), "diff: false\n").unwrap();
        env::set_var("DIRCOPY_DIFF", "on");

        let result = ConfigBuilder::new()
            .with_working_dir(project.path())
            .with_user_config_dir(user.path())
            .build();
        env::remove_var("DIRCOPY_DIFF");

        assert_eq!(result.unwrap().diff, Some(true));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let result = ConfigBuilder::new()
            .skip_files()
            .skip_env()
            .with_config(Config {
                group: Some(String::new()),
                ..Config::default()
            })
            .build();
        assert!(result.unwrap_err().is_validation());
    }
}
