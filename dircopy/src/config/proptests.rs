//! Property-based tests for configuration merging.

use super::merger::ConfigMerger;
use super::schema::Config;
use crate::mode::ModeString;
use proptest::prelude::*;

fn mode_strategy() -> impl Strategy<Value = ModeString> {
    (0u32..=0o1777).prop_map(ModeString::from_bits)
}

fn config_strategy() -> impl Strategy<Value = Config> {
    (
        prop::option::of("[a-z][a-z0-9-]{0,15}"),
        prop::option::of("[a-z][a-z0-9-]{0,15}"),
        prop::option::of(mode_strategy()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(owner, group, mode, identical, specialx, dry_run)| Config {
            owner,
            group,
            mode,
            identical,
            specialx,
            dry_run,
            ..Default::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // Higher precedence wins wherever it is set
    #[test]
    fn config_merge_higher_precedence_wins(low in config_strategy(), high in config_strategy()) {
        let mut result = low.clone();
        ConfigMerger::merge_into(&mut result, &high);

        prop_assert_eq!(result.owner, high.owner.or(low.owner));
        prop_assert_eq!(result.group, high.group.or(low.group));
        prop_assert_eq!(result.mode, high.mode.or(low.mode));
        prop_assert_eq!(result.identical, high.identical.or(low.identical));
        prop_assert_eq!(result.specialx, high.specialx.or(low.specialx));
        prop_assert_eq!(result.dry_run, high.dry_run.or(low.dry_run));
    }

    // Empty config is identity element for merge
    #[test]
    fn config_merge_identity(config in config_strategy()) {
        let mut merged = config.clone();
        ConfigMerger::merge_into(&mut merged, &Config::default());
        prop_assert_eq!(merged, config);
    }

    // Generated configs survive a YAML round trip
    #[test]
    fn config_yaml_roundtrip(config in config_strategy()) {
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        prop_assert_eq!(parsed, config);
    }
}
