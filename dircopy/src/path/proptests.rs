//! Property-based tests for archive path normalization.

use super::ArchivePath;
use proptest::prelude::*;
use std::path::Path;

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z0-9_-]{1,8}",
        1 => Just(".".to_string()),
        1 => Just(String::new()),
    ]
}

fn raw_name() -> impl Strategy<Value = String> {
    (any::<bool>(), prop::collection::vec(segment(), 1..6), any::<bool>()).prop_map(
        |(leading, segments, trailing)| {
            let mut name = segments.join("/");
            if leading {
                name.insert(0, '/');
            }
            if trailing {
                name.push('/');
            }
            name
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // Normalizing an already normalized path changes nothing.
    #[test]
    fn prop_normalize_is_idempotent(raw in raw_name()) {
        if let Some(path) = ArchivePath::normalize(&raw).unwrap() {
            let again = ArchivePath::parse(path.as_str()).unwrap();
            prop_assert_eq!(again, path);
        }
    }

    // Normalized paths carry no empty, `.` or `..` segments.
    #[test]
    fn prop_normalized_segments_are_plain(raw in raw_name()) {
        if let Some(path) = ArchivePath::normalize(&raw).unwrap() {
            for part in path.as_str().split('/') {
                prop_assert!(!part.is_empty());
                prop_assert!(part != "." && part != "..");
            }
        }
    }

    // Any `..` segment is rejected wherever it appears.
    #[test]
    fn prop_parent_segment_is_rejected(
        before in prop::collection::vec("[a-z]{1,4}", 0..3),
        after in prop::collection::vec("[a-z]{1,4}", 0..3),
    ) {
        let mut parts = before;
        parts.push("..".to_string());
        parts.extend(after);
        prop_assert!(ArchivePath::normalize(&parts.join("/")).is_err());
    }

    // Ancestors are proper prefixes, nearest first, one per extra segment.
    #[test]
    fn prop_ancestors_shrink_by_one_segment(segments in prop::collection::vec("[a-z]{1,4}", 1..6)) {
        let path = ArchivePath::parse(&segments.join("/")).unwrap();
        let ancestors: Vec<ArchivePath> = path.ancestors().collect();

        prop_assert_eq!(ancestors.len(), path.depth() - 1);
        for (i, ancestor) in ancestors.iter().enumerate() {
            prop_assert_eq!(ancestor.depth(), path.depth() - 1 - i);
            let prefix = format!("{}/", ancestor.as_str());
            prop_assert!(path.as_str().starts_with(&prefix));
        }
    }

    // A relative filesystem path round-trips through `under`.
    #[test]
    fn prop_under_stays_below_root(segments in prop::collection::vec("[a-z]{1,4}", 1..6)) {
        let root = Path::new("/srv/root");
        let path = ArchivePath::parse(&segments.join("/")).unwrap();
        let absolute = path.under(root);

        prop_assert!(absolute.starts_with(root));
        let back = ArchivePath::from_relative(absolute.strip_prefix(root).unwrap()).unwrap();
        prop_assert_eq!(back, path);
    }
}
