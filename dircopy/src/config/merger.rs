//! Configuration merging and precedence handling.

use crate::config::loader::ConfigSource;
use crate::config::schema::Config;

/// Merges configuration sources according to precedence rules.
///
/// # Examples
///
/// ```
/// use dircopy::config::{Config, ConfigMerger};
///
/// let low = Config { owner: Some("low".to_string()), ..Default::default() };
/// let high = Config { owner: Some("high".to_string()), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.owner, Some("high".to_string()));
/// ```
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge multiple configuration sources into final config.
    ///
    /// Sources should be provided in order from lowest to highest precedence.
    #[must_use]
    pub fn merge(sources: Vec<ConfigSource>) -> Config {
        let mut result = Config::default();

        for source in sources {
            log::debug!("merging configuration from {}", source.path.display());
            Self::merge_into(&mut result, &source.config);
        }

        result
    }

    /// Merge source config into target (source overwrites target when set).
    pub fn merge_into(target: &mut Config, source: &Config) {
        if source.owner.is_some() {
            target.owner.clone_from(&source.owner);
        }

        if source.group.is_some() {
            target.group.clone_from(&source.group);
        }

        if source.mode.is_some() {
            target.mode.clone_from(&source.mode);
        }

        if source.identical.is_some() {
            target.identical = source.identical;
        }

        if source.specialx.is_some() {
            target.specialx = source.specialx;
        }

        if source.verbose.is_some() {
            target.verbose = source.verbose;
        }

        if source.diff.is_some() {
            target.diff = source.diff;
        }

        if source.dry_run.is_some() {
            target.dry_run = source.dry_run;
        }
    }
}
