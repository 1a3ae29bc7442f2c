//! Environment variable handling for configuration overrides.
//!
//! This module provides support for `DIRCOPY_*` environment variables that
//! override configuration file values.

use crate::config::schema::Config;
use crate::error::{Error, Result};
use crate::mode::ModeString;
use std::env;

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use dircopy::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// Reads all `DIRCOPY_*` environment variables and applies them with
    /// higher precedence than file-based configs.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable value is invalid
    /// (malformed mode, invalid boolean).
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Ok(owner) = env::var("DIRCOPY_OWNER") {
            config.owner = Some(owner);
        }

        if let Ok(group) = env::var("DIRCOPY_GROUP") {
            config.group = Some(group);
        }

        if let Ok(mode) = env::var("DIRCOPY_MODE") {
            config.mode = Some(ModeString::parse(&mode).map_err(|e| Error::Validation {
                field: "DIRCOPY_MODE".into(),
                message: e.to_string(),
            })?);
        }

        let flags: [(&str, &mut Option<bool>); 5] = [
            ("DIRCOPY_IDENTICAL", &mut config.identical),
            ("DIRCOPY_SPECIALX", &mut config.specialx),
            ("DIRCOPY_VERBOSE", &mut config.verbose),
            ("DIRCOPY_DIFF", &mut config.diff),
            ("DIRCOPY_DRY_RUN", &mut config.dry_run),
        ];
        for (name, field) in flags {
            if let Ok(val) = env::var(name) {
                *field = Some(Self::parse_bool(name, &val)?);
            }
        }

        Ok(())
    }

    /// Parse a boolean value from a string.
    ///
    /// Accepts: true/1/yes/on for true, false/0/no/off for false (case-insensitive).
    fn parse_bool(field: &str, s: &str) -> Result<bool> {
        match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::Validation {
                field: field.into(),
                message: format!(
                    "Invalid boolean value: '{s}' (expected true/false/1/0/yes/no/on/off)"
                ),
            }),
        }
    }
}
