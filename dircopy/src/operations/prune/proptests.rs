//! Property-based tests for directory removal ordering.

use super::PruneEngine;
use crate::path::ArchivePath;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn dir_set() -> impl Strategy<Value = BTreeSet<ArchivePath>> {
    prop::collection::vec(prop::collection::vec("[a-c]", 1..5), 0..20).prop_map(|paths| {
        let mut dirs = BTreeSet::new();
        for segments in paths {
            let path = ArchivePath::parse(&segments.join("/")).unwrap();
            dirs.extend(path.ancestors());
            dirs.insert(path);
        }
        dirs
    })
}

proptest! {
    // A directory is never scheduled before anything nested inside it
    #[test]
    fn descendants_come_first(dirs in dir_set()) {
        let order = PruneEngine::removal_order(&dirs);
        for (i, dir) in order.iter().enumerate() {
            for later in &order[i + 1..] {
                let nested = later.as_str().starts_with(&format!("{}/", dir.as_str()));
                prop_assert!(!nested, "{} scheduled after its parent {}", later, dir);
            }
        }
    }

    // Depth never increases along the removal order
    #[test]
    fn depth_is_non_increasing(dirs in dir_set()) {
        let order = PruneEngine::removal_order(&dirs);
        for pair in order.windows(2) {
            prop_assert!(pair[0].depth() >= pair[1].depth());
        }
    }

    // Ordering neither drops nor duplicates directories
    #[test]
    fn order_is_a_permutation(dirs in dir_set()) {
        let order = PruneEngine::removal_order(&dirs);
        prop_assert_eq!(order.len(), dirs.len());
        let back: BTreeSet<ArchivePath> = order.into_iter().collect();
        prop_assert_eq!(back, dirs);
    }
}
