//! Main test module for foldercheck
//!
//! This module includes all test suites:
//! - Integration tests for full check and purge cycles
//! - Property-based tests for the comparison rules

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::foldercheck::*;
    use std::fs;
    use tempfile::TempDir;

    fn checker(home: &std::path::Path) -> FolderChecker {
        FolderChecker::builder()
            .language(Language::English)
            .home_dir(home)
            .current_dir(home)
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let checker = checker(temp_dir.path());

        let report = checker.check("~").unwrap();
        assert_eq!(report.directories.len(), 1);
        assert_eq!(report.directories[0].outcome, DirectoryOutcome::NewDirectory);

        let raw = fs::read_to_string(temp_dir.path().join(DEFAULT_SIDECAR_NAME)).unwrap();
        assert_eq!(raw, "{}");
    }

    #[test]
    fn test_special_filenames() {
        let temp_dir = TempDir::new().unwrap();
        let checker = checker(temp_dir.path());

        let special_names = vec![
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file.with.dots.txt",
            "file@with#special$chars.txt",
            "file(with)parens.txt",
            "file[with]brackets.txt",
            "file{with}braces.txt",
        ];

        let mut created = Vec::new();
        for name in &special_names {
            // Skip names the OS does not support
            if fs::write(temp_dir.path().join(name), format!("Content of {}", name)).is_ok() {
                created.push(*name);
            }
        }

        checker.check("~").unwrap();
        let snapshot: Snapshot =
            serde_json::from_str(&fs::read_to_string(temp_dir.path().join(DEFAULT_SIDECAR_NAME)).unwrap())
                .unwrap();
        for name in &created {
            assert!(snapshot.contains(name), "missing {}", name);
        }

        fs::write(temp_dir.path().join(created[0]), "changed").unwrap();
        let text = checker.run(&CheckRequest::check("~"));
        assert!(text.contains(&format!("[M] {} (version 2)", created[0])), "{}", text);
    }

    #[test]
    fn test_unicode_filenames() {
        let temp_dir = TempDir::new().unwrap();
        let checker = checker(temp_dir.path());

        let unicode_names = vec!["soubor.txt", "žluťoučký kůň.txt", "文件.txt", "🚀.txt"];
        let mut created = Vec::new();
        for name in &unicode_names {
            if fs::write(temp_dir.path().join(name), name.as_bytes()).is_ok() {
                created.push(*name);
            }
        }
        if created.is_empty() {
            return;
        }

        checker.check("~").unwrap();
        for name in &created {
            fs::remove_file(temp_dir.path().join(name)).unwrap();
        }

        let report = checker.check("~").unwrap();
        let deleted: Vec<&str> = report.directories[0]
            .changes()
            .iter()
            .filter(|c| c.kind == ChangeKind::Deleted)
            .map(|c| c.filename.as_str())
            .collect();
        let mut expected = created.clone();
        expected.sort();
        assert_eq!(deleted, expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_not_followed_by_default() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("real")).unwrap();
        fs::write(temp_dir.path().join("real/file.txt"), "x").unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("real"), temp_dir.path().join("link")).unwrap();

        let report = checker(temp_dir.path()).check("~").unwrap();
        let visited: Vec<&str> = report.directories.iter().map(|d| d.display_path.as_str()).collect();
        assert_eq!(visited, vec!["~", "~/real"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("a")).unwrap();
        // a/back -> temp root
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("a/back")).unwrap();

        let checker = FolderChecker::builder()
            .home_dir(temp_dir.path())
            .current_dir(temp_dir.path())
            .follow_symlinks(true)
            .build()
            .unwrap();

        let report = checker.check("~").unwrap();
        assert_eq!(report.directories.len(), 2);
    }
}
