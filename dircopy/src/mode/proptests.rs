//! Property-based tests for mode strings.

use super::ModeString;
use proptest::prelude::*;

fn mode_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-7]{3}",
        "[01][0-7]{3}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // Every permission digit of a traversal-granted mode has its execute bit.
    #[test]
    fn traversal_sets_every_execute_bit(raw in mode_strategy()) {
        let mode = ModeString::parse(&raw).unwrap();
        let dir = mode.with_traversal();
        prop_assert_eq!(dir.bits() & 0o111, 0o111);
    }

    // Granting traversal only ever adds execute bits.
    #[test]
    fn traversal_only_adds_execute_bits(raw in mode_strategy()) {
        let mode = ModeString::parse(&raw).unwrap();
        let dir = mode.with_traversal();
        prop_assert_eq!(dir.bits() & !0o111, mode.bits() & !0o111);
        prop_assert_eq!(dir.as_str().len(), mode.as_str().len());
    }

    // Applying the grant twice changes nothing further.
    #[test]
    fn traversal_is_idempotent(raw in mode_strategy()) {
        let once = ModeString::parse(&raw).unwrap().with_traversal();
        let twice = once.with_traversal();
        prop_assert_eq!(once, twice);
    }

    // Rendering bits and parsing them back is lossless for valid modes.
    #[test]
    fn bits_survive_rendering(raw in mode_strategy()) {
        let mode = ModeString::parse(&raw).unwrap();
        let rendered = ModeString::from_bits(mode.bits());
        prop_assert_eq!(rendered.bits(), mode.bits());
    }
}
