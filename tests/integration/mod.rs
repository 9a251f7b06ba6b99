//! Integration tests for foldercheck
//!
//! Runs full check and purge cycles against real temporary directories, plus
//! the fault scenarios that need [`MemoryFileSystem`].

use ::foldercheck::*;
use ::foldercheck::hasher::hash_data;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test harness owning a temporary tree and a checker over it
pub struct FolderTestHarness {
    pub temp_dir: TempDir,
    pub checker: FolderChecker,
}

impl FolderTestHarness {
    /// Create a harness with English messages and `~` mapped to the temp dir
    pub fn new() -> Self {
        Self::with_builder(|builder| builder)
    }

    /// Create a harness, letting the caller adjust the builder
    pub fn with_builder(adjust: impl FnOnce(FolderCheckerBuilder) -> FolderCheckerBuilder) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let builder = FolderChecker::builder()
            .language(Language::English)
            .home_dir(temp_dir.path())
            .current_dir(temp_dir.path());
        let checker = adjust(builder).build().unwrap();
        Self { temp_dir, checker }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.path(relative)).unwrap();
    }

    pub fn snapshot(&self, relative_dir: &str) -> Snapshot {
        let sidecar = self.path(relative_dir).join(DEFAULT_SIDECAR_NAME);
        serde_json::from_slice(&fs::read(sidecar).unwrap()).unwrap()
    }

    /// Run a check of `~/<relative>` and return the rendered text
    pub fn check_text(&self, relative: &str) -> String {
        self.checker.run(&CheckRequest::check(format!("~/{}", relative)))
    }
}

impl Default for FolderTestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worked_example_on_disk() {
        let harness = FolderTestHarness::new();
        harness.write("test/a.txt", "alpha");
        harness.write("test/b.txt", "beta");

        assert_eq!(harness.check_text("test"), "Checking: ~/test\nNew directory.\n");
        let baseline = harness.snapshot("test");
        assert_eq!(baseline.get("a.txt"), Some(&FileRecord::new(hash_data(b"alpha"), 1)));
        assert_eq!(baseline.get("b.txt"), Some(&FileRecord::new(hash_data(b"beta"), 1)));

        harness.write("test/a.txt", "alpha, second edition");
        harness.remove("test/b.txt");
        harness.write("test/c.txt", "gamma");

        assert_eq!(
            harness.check_text("test"),
            "Checking: ~/test\n[M] a.txt (version 2)\n[A] c.txt\n[D] b.txt\n"
        );

        let snapshot = harness.snapshot("test");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("a.txt").map(|r| r.version), Some(2));
        assert_eq!(snapshot.get("c.txt").map(|r| r.version), Some(1));
        assert!(!snapshot.contains("b.txt"));
    }

    #[test]
    fn test_consecutive_runs_are_idempotent() {
        let harness = FolderTestHarness::new();
        harness.write("docs/one.txt", "1");
        harness.write("docs/nested/two.txt", "2");

        harness.check_text("docs");
        let sidecar = harness.path("docs").join(DEFAULT_SIDECAR_NAME);
        let before = fs::read(&sidecar).unwrap();

        assert_eq!(
            harness.check_text("docs"),
            "Checking: ~/docs\nNo changes.\nChecking: ~/docs/nested\nNo changes.\n"
        );
        assert_eq!(fs::read(&sidecar).unwrap(), before);
    }

    #[test]
    fn test_versions_count_modifications() {
        let harness = FolderTestHarness::new();
        harness.write("log/entry.txt", "v1");
        harness.check_text("log");

        for (i, content) in ["v2", "v3", "v4"].iter().enumerate() {
            harness.write("log/entry.txt", content);
            let text = harness.check_text("log");
            assert!(text.contains(&format!("[M] entry.txt (version {})", i + 2)), "{}", text);
        }

        // Same content again keeps the version
        harness.write("log/entry.txt", "v4");
        assert_eq!(harness.check_text("log"), "Checking: ~/log\nNo changes.\n");
        assert_eq!(harness.snapshot("log").get("entry.txt").map(|r| r.version), Some(4));
    }

    #[test]
    fn test_new_subdirectory_reported_in_pre_order() {
        let harness = FolderTestHarness::new();
        harness.write("tree/a/file.txt", "a");
        harness.write("tree/c/file.txt", "c");
        harness.check_text("tree");

        harness.write("tree/b/deep/file.txt", "b");
        assert_eq!(
            harness.check_text("tree"),
            "Checking: ~/tree\nNo changes.\n\
             Checking: ~/tree/a\nNo changes.\n\
             Checking: ~/tree/b\nNew directory.\n\
             Checking: ~/tree/b/deep\nNew directory.\n\
             Checking: ~/tree/c\nNo changes.\n"
        );
    }

    #[test]
    fn test_legacy_field_names_are_read() {
        let harness = FolderTestHarness::new();
        harness.write("legacy/a.txt", "alpha");
        let legacy = format!(r#"{{"a.txt":{{"Hash":"{}","Version":3}}}}"#, hash_data(b"alpha"));
        harness.write(&format!("legacy/{}", DEFAULT_SIDECAR_NAME), &legacy);

        assert_eq!(harness.check_text("legacy"), "Checking: ~/legacy\nNo changes.\n");

        let raw = fs::read_to_string(harness.path("legacy").join(DEFAULT_SIDECAR_NAME)).unwrap();
        assert!(raw.contains(r#""version":3"#), "{}", raw);
    }

    #[test]
    fn test_corrupt_sidecar_isolated() {
        let harness = FolderTestHarness::new();
        harness.write("mixed/bad/file.txt", "x");
        harness.write("mixed/good/file.txt", "y");
        harness.write(&format!("mixed/bad/{}", DEFAULT_SIDECAR_NAME), "garbage");

        let report = harness.checker.check("~/mixed").unwrap();
        assert!(report.directory(&harness.path("mixed/bad")).unwrap().is_error());
        assert_eq!(
            report.directory(&harness.path("mixed/good")).unwrap().outcome,
            DirectoryOutcome::NewDirectory
        );

        // The corrupt side-car is left for the user to inspect
        let raw = fs::read_to_string(harness.path("mixed/bad").join(DEFAULT_SIDECAR_NAME)).unwrap();
        assert_eq!(raw, "garbage");
    }

    #[test]
    fn test_relative_root_and_missing_root() {
        let harness = FolderTestHarness::new();
        harness.write("rel/file.txt", "x");

        let text = harness.checker.run(&CheckRequest::check("rel"));
        assert_eq!(text, "Checking: rel\nNew directory.\n");

        assert_eq!(harness.check_text("absent"), "Folder not found.\n");
        assert!(!harness.path("absent").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_sidecar_read_only_between_runs() {
        let harness = FolderTestHarness::new();
        harness.write("ro/a.txt", "a");
        harness.check_text("ro");

        let sidecar = harness.path("ro").join(DEFAULT_SIDECAR_NAME);
        assert!(fs::metadata(&sidecar).unwrap().permissions().readonly());

        // A protected side-car is still updated on the next run
        harness.write("ro/b.txt", "b");
        assert_eq!(harness.check_text("ro"), "Checking: ~/ro\n[A] b.txt\n");
        assert!(fs::metadata(&sidecar).unwrap().permissions().readonly());
    }

    #[test]
    fn test_ignore_patterns_on_disk() {
        let harness = FolderTestHarness::with_builder(|builder| {
            builder.ignore_patterns(vec!["*.log".to_string(), "target".to_string()])
        });
        harness.write("proj/main.rs", "fn main() {}");
        harness.write("proj/build.log", "noise");
        harness.write("proj/target/out.bin", "binary");

        assert_eq!(harness.check_text("proj"), "Checking: ~/proj\nNew directory.\n");
        let snapshot = harness.snapshot("proj");
        assert_eq!(snapshot.len(), 1);
        assert!(!harness.path("proj/target").join(DEFAULT_SIDECAR_NAME).exists());
    }

    #[test]
    fn test_purge_then_check_starts_over() {
        let harness = FolderTestHarness::new();
        harness.write("p/a.txt", "a");
        harness.write("p/sub/b.txt", "b");
        harness.check_text("p");

        let text = harness.checker.run(&CheckRequest::purge("~/p"));
        assert_eq!(
            text,
            format!(
                "Deleting: ~/p/{name}\nDeleting: ~/p/sub/{name}\n",
                name = DEFAULT_SIDECAR_NAME
            )
        );
        assert!(!harness.path("p").join(DEFAULT_SIDECAR_NAME).exists());
        assert!(!harness.path("p/sub").join(DEFAULT_SIDECAR_NAME).exists());

        assert_eq!(
            harness.check_text("p"),
            "Checking: ~/p\nNew directory.\nChecking: ~/p/sub\nNew directory.\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_purge_skips_denied_branch() {
        let fs = Arc::new(MemoryFileSystem::new());
        for dir in ["/r", "/r/a", "/r/a/b"] {
            fs.write_file(format!("{}/{}", dir, DEFAULT_SIDECAR_NAME), b"{}");
        }
        fs.deny_listing("/r/a");

        let checker = FolderChecker::builder()
            .file_system(fs.clone())
            .current_dir("/")
            .language(Language::English)
            .build()
            .unwrap();

        let report = checker.purge("/r").unwrap();
        assert_eq!(report.removed_count(), 2);
        assert!(report.entries.iter().all(|e| e.error.is_none()));
        assert!(fs.file("/r/a/b/fileinfo.~db").is_some());

        let text = checker.reporter().render_purge(&report);
        assert_eq!(
            text,
            "Deleting: /r/fileinfo.~db\n\
             Deleting: /r/a/fileinfo.~db\n\
             Unauthorized access on folder: /r/a\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_does_not_stop_walk() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write_file("/r/locked/secret.bin", b"s");
        fs.write_file("/r/open/public.txt", b"p");
        fs.make_unreadable("/r/locked/secret.bin");

        let checker = FolderChecker::builder()
            .file_system(fs.clone())
            .current_dir("/")
            .language(Language::English)
            .build()
            .unwrap();

        let text = checker.run(&CheckRequest::check("/r"));
        assert_eq!(
            text,
            "Checking: /r\nNew directory.\n\
             Checking: /r/locked\nCannot hash file \"/r/locked/secret.bin\": reading \"/r/locked/secret.bin\" denied\n\
             Checking: /r/open\nNew directory.\n"
        );
        assert!(fs.file("/r/locked/fileinfo.~db").is_none());
    }
}
