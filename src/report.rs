//! Text rendering of check and purge results
//!
//! The output is line oriented, every line ends with `\n`:
//!
//! ```text
//! Checking: ~/photos
//! Nový adresář.
//! Checking: ~/photos/2024
//! [M] a.txt (version 2)
//! [A] c.txt
//! [D] b.txt
//! ```
//!
//! Status sentences are localized through [`Language`]; the change lines keep
//! the same grammar in every language.

use crate::types::{
    ChangeKind, CheckReport, DirectoryNote, DirectoryOutcome, DirectoryReport, FileChange, PurgeReport,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Language of status sentences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Czech
    #[default]
    Czech,
    /// English
    English,
}

struct Messages {
    new_directory: &'static str,
    no_changes: &'static str,
    folder_not_found: &'static str,
    cancelled: &'static str,
    unauthorized: &'static str,
    listing_failed: &'static str,
}

const CZECH: Messages = Messages {
    new_directory: "Nový adresář.",
    no_changes: "Žádné změny.",
    folder_not_found: "Složka nebyla nalezena.",
    cancelled: "Kontrola přerušena.",
    unauthorized: "Přístup odepřen ke složce:",
    listing_failed: "Nelze vypsat složku",
};

const ENGLISH: Messages = Messages {
    new_directory: "New directory.",
    no_changes: "No changes.",
    folder_not_found: "Folder not found.",
    cancelled: "Check cancelled.",
    unauthorized: "Unauthorized access on folder:",
    listing_failed: "Cannot list folder",
};

impl Language {
    fn messages(self) -> &'static Messages {
        match self {
            Language::Czech => &CZECH,
            Language::English => &ENGLISH,
        }
    }
}

/// Renders reports as text
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    language: Language,
}

impl Reporter {
    /// Create a reporter for `language`
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// The single message of a run whose root does not exist
    pub fn folder_not_found(&self) -> String {
        format!("{}\n", self.language.messages().folder_not_found)
    }

    /// Render a check run
    pub fn render_check(&self, report: &CheckReport) -> String {
        let mut out = String::new();
        for dir in &report.directories {
            self.write_directory(&mut out, dir);
        }
        if report.cancelled {
            push_line(&mut out, self.language.messages().cancelled);
        }
        out
    }

    /// Render a purge run
    pub fn render_purge(&self, report: &PurgeReport) -> String {
        let mut out = String::new();
        for entry in &report.entries {
            push_line(&mut out, &format!("Deleting: {}", entry.display_path));
            if let Some(error) = &entry.error {
                push_line(&mut out, error);
            }
            self.write_notes(&mut out, &entry.notes, parent_display(&entry.display_path));
        }
        if report.cancelled {
            push_line(&mut out, self.language.messages().cancelled);
        }
        out
    }

    fn write_directory(&self, out: &mut String, dir: &DirectoryReport) {
        let messages = self.language.messages();
        push_line(out, &format!("Checking: {}", dir.display_path));

        match &dir.outcome {
            DirectoryOutcome::NewDirectory => push_line(out, messages.new_directory),
            DirectoryOutcome::Existing { changes } if changes.is_empty() => {
                push_line(out, messages.no_changes)
            }
            DirectoryOutcome::Existing { changes } => {
                for change in changes {
                    push_line(out, &change_line(change));
                }
            }
            DirectoryOutcome::Error { message } => push_line(out, message),
        }

        self.write_notes(out, &dir.notes, &dir.display_path);
    }

    fn write_notes(&self, out: &mut String, notes: &[DirectoryNote], display_path: &str) {
        let messages = self.language.messages();
        for note in notes {
            let line = match note {
                DirectoryNote::Unauthorized => format!("{} {}", messages.unauthorized, display_path),
                DirectoryNote::ListingFailed { message } => {
                    format!("{} {}: {}", messages.listing_failed, display_path, message)
                }
            };
            push_line(out, &line);
        }
    }
}

/// Render a single change line
pub fn change_line(change: &FileChange) -> String {
    match change.kind {
        ChangeKind::Added => format!("[A] {}", change.filename),
        ChangeKind::Modified => format!("[M] {} (version {})", change.filename, change.version),
        ChangeKind::Deleted => format!("[D] {}", change.filename),
    }
}

/// Folder part of a displayed side-car path
fn parent_display(sidecar_display: &str) -> &str {
    match sidecar_display.rfind(['/', std::path::MAIN_SEPARATOR]) {
        Some(0) => &sidecar_display[..1],
        Some(idx) => &sidecar_display[..idx],
        None => sidecar_display,
    }
}

fn push_line(out: &mut String, line: &str) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", line);
}
