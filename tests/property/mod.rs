//! Property-based testing for foldercheck
//!
//! Uses proptest to check the comparison rules over random snapshots and
//! scans, and the check cycle over random trees in memory.

use ::foldercheck::diff::compare;
use ::foldercheck::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Directory contents: filename to digest
fn listing_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{1,6}\\.txt", "[0-9a-f]{4}", 0..16)
}

/// Previous snapshot with arbitrary versions
fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    prop::collection::btree_map("[a-z]{1,6}\\.txt", ("[0-9a-f]{4}", 1u32..50), 0..16).prop_map(|map| {
        map.into_iter()
            .map(|(name, (hash, version))| (name, FileRecord::new(hash, version)))
            .collect::<Snapshot>()
    })
}

fn scan(listing: &BTreeMap<String, String>) -> Vec<ScannedFile> {
    listing
        .iter()
        .map(|(name, hash)| ScannedFile::new(name.clone(), hash.clone()))
        .collect()
}

proptest! {
    #[test]
    fn prop_first_visit_is_baseline(listing in listing_strategy()) {
        let outcome = compare(None, &scan(&listing)).unwrap();

        prop_assert!(outcome.changes.is_empty());
        prop_assert_eq!(outcome.snapshot.len(), listing.len());
        for (name, hash) in &listing {
            prop_assert_eq!(outcome.snapshot.get(name), Some(&FileRecord::new(hash.clone(), 1)));
        }
    }

    #[test]
    fn prop_second_visit_reports_nothing(old in snapshot_strategy(), listing in listing_strategy()) {
        let files = scan(&listing);
        let first = compare(Some(&old), &files).unwrap();
        let second = compare(Some(&first.snapshot), &files).unwrap();

        prop_assert!(second.changes.is_empty());
        prop_assert_eq!(second.snapshot, first.snapshot);
    }

    #[test]
    fn prop_changes_match_set_difference(old in snapshot_strategy(), listing in listing_strategy()) {
        let outcome = compare(Some(&old), &scan(&listing)).unwrap();

        // The new snapshot holds exactly the scanned names
        let names: Vec<&str> = outcome.snapshot.iter().map(|(name, _)| name).collect();
        let expected: Vec<&str> = listing.keys().map(String::as_str).collect();
        prop_assert_eq!(names, expected);

        let mut reported = BTreeMap::new();
        for change in &outcome.changes {
            // At most one change per name
            prop_assert!(reported.insert(change.filename.clone(), change.clone()).is_none());
        }

        for (name, hash) in &listing {
            let record = outcome.snapshot.get(name).unwrap();
            match old.get(name) {
                None => {
                    prop_assert_eq!(record.version, 1);
                    prop_assert_eq!(reported.get(name), Some(&FileChange::added(name.clone())));
                }
                Some(previous) if &previous.hash == hash => {
                    prop_assert_eq!(record.version, previous.version);
                    prop_assert!(!reported.contains_key(name));
                }
                Some(previous) => {
                    prop_assert_eq!(record.version, previous.version + 1);
                    prop_assert_eq!(
                        reported.get(name),
                        Some(&FileChange::modified(name.clone(), previous.version + 1))
                    );
                }
            }
        }

        for (name, previous) in old.iter() {
            if !listing.contains_key(name) {
                prop_assert_eq!(
                    reported.get(name),
                    Some(&FileChange::deleted(name, previous.version))
                );
            }
        }
    }

    #[test]
    fn prop_deleted_entries_come_last(old in snapshot_strategy(), listing in listing_strategy()) {
        let outcome = compare(Some(&old), &scan(&listing)).unwrap();
        let first_deleted = outcome
            .changes
            .iter()
            .position(|c| c.kind == ChangeKind::Deleted)
            .unwrap_or(outcome.changes.len());

        prop_assert!(outcome.changes[first_deleted..].iter().all(|c| c.kind == ChangeKind::Deleted));
    }
}

#[cfg(unix)]
mod tree {
    use super::*;
    use std::sync::Arc;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_tree_check_cycle(
            files in prop::collection::btree_map("[a-c]{1,2}/[a-z]{1,4}\\.txt", "[a-z]{0,8}", 1..12),
        ) {
            let fs = Arc::new(MemoryFileSystem::new());
            fs.create_dir_all("/root");
            for (path, content) in &files {
                fs.write_file(format!("/root/{}", path), content);
            }

            let checker = FolderChecker::builder()
                .file_system(fs.clone())
                .current_dir("/")
                .build()
                .unwrap();

            let first = checker.check("/root").unwrap();
            prop_assert!(!first.cancelled);
            prop_assert!(first
                .directories
                .iter()
                .all(|d| d.outcome == DirectoryOutcome::NewDirectory));

            // Pre-order: every directory is listed after its parent
            let paths: Vec<_> = first.directories.iter().map(|d| d.path.clone()).collect();
            for (i, path) in paths.iter().enumerate().skip(1) {
                let parent = path.parent().unwrap();
                prop_assert!(paths[..i].iter().any(|p| p == parent));
            }

            let second = checker.check("/root").unwrap();
            prop_assert_eq!(second.stats().total_changes(), 0);
            prop_assert_eq!(second.directories.len(), first.directories.len());
        }
    }
}
