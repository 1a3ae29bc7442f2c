//! Configuration validation.

use crate::config::schema::Config;
use crate::error::{Error, Result};

/// Validates configuration values that deserialization cannot check.
///
/// Modes are already validated when parsed into [`crate::ModeString`];
/// this checks the free-form principal names.
///
/// # Examples
///
/// ```
/// use dircopy::config::{Config, ConfigValidator};
///
/// ConfigValidator::validate(&Config::default()).unwrap();
///
/// let bad = Config { owner: Some("  ".into()), ..Default::default() };
/// assert!(ConfigValidator::validate(&bad).is_err());
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field.
    pub fn validate(config: &Config) -> Result<()> {
        if let Some(ref owner) = config.owner {
            Self::validate_principal("owner", owner)?;
        }

        if let Some(ref group) = config.group {
            Self::validate_principal("group", group)?;
        }

        if let Some(ref mode) = config.mode {
            // Re-parse in case the value was built programmatically.
            crate::ModeString::parse(mode.as_str())?;
        }

        Ok(())
    }

    /// Checks that an owner or group is non-empty after trimming, has no
    /// null bytes, and fits a system user/group name.
    fn validate_principal(field: &str, value: &str) -> Result<()> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot be empty or only whitespace".into(),
            });
        }

        if trimmed.contains('\0') {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot contain null bytes".into(),
            });
        }

        if trimmed.len() > 255 {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot exceed 255 characters".into(),
            });
        }

        Ok(())
    }
}
