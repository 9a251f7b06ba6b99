//! # foldercheck CLI
//!
//! Reports added, modified and deleted files in every folder of a tree.
//!
//! ## Usage
//! ```bash
//! # Check the home directory
//! foldercheck
//!
//! # Check a folder, English messages, with a summary
//! foldercheck ~/photos --lang en --stats
//!
//! # Remove all side-car files again
//! foldercheck ~/photos --purge
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use foldercheck::{
    CheckReport, CheckerConfig, FolderCheckError, FolderChecker, Language, ProgressInfo, PurgeReport,
};
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Detect file changes folder by folder
#[derive(Parser)]
#[command(name = "foldercheck")]
#[command(version)]
#[command(about = "Detect added, modified and deleted files in every folder of a tree")]
#[command(long_about = None)]
struct Cli {
    /// Root folder, `~` expands to the home directory
    #[arg(default_value = "~")]
    path: String,

    /// Delete side-car files instead of checking
    #[arg(long)]
    purge: bool,

    /// Language of status messages
    #[arg(long, value_enum)]
    lang: Option<LangArg>,

    /// Name of the per-folder side-car file
    #[arg(long)]
    sidecar_name: Option<String>,

    /// Skip entries matching a glob pattern (repeatable)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Descend into symbolic links to folders
    #[arg(long)]
    follow_symlinks: bool,

    /// Leave side-car files writable
    #[arg(long)]
    no_protect: bool,

    /// Load settings from a JSON file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a summary after the report
    #[arg(long)]
    stats: bool,

    /// Show a spinner while walking
    #[arg(long)]
    progress: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LangArg {
    Cs,
    En,
}

impl From<LangArg> for Language {
    fn from(lang: LangArg) -> Self {
        match lang {
            LangArg::Cs => Language::Czech,
            LangArg::En => Language::English,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the report
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Main command runner, returns the exit code
fn run(cli: Cli) -> Result<i32> {
    let config = load_config(&cli)?;

    let progress = if cli.progress { Some(spinner()?) } else { None };

    let mut builder = FolderChecker::builder().config(config);
    if let Some(pb) = &progress {
        let pb = pb.clone();
        builder = builder.progress_callback(Arc::new(move |info: ProgressInfo| {
            pb.set_message(format!(
                "{} {} ({})",
                info.operation,
                info.current_item.unwrap_or_default(),
                info.processed
            ));
        }));
    }
    let checker = match builder.build() {
        Ok(checker) => checker,
        Err(e) => return Ok(report_failure(&e)),
    };

    let start = Instant::now();
    let result = if cli.purge {
        checker.purge(&cli.path).map(Outcome::Purge)
    } else {
        checker.check(&cli.path).map(Outcome::Check)
    };

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(FolderCheckError::RootNotFound(_)) => {
            println!("{}", checker.reporter().folder_not_found().trim_end().red());
            return Ok(1);
        }
        Err(e) => return Ok(report_failure(&e)),
    };

    let text = match &outcome {
        Outcome::Check(report) => checker.reporter().render_check(report),
        Outcome::Purge(report) => checker.reporter().render_purge(report),
    };
    for line in text.lines() {
        println!("{}", colorize(line));
    }

    if cli.stats {
        print_stats(&outcome, start.elapsed());
    }

    Ok(0)
}

/// Print a library error with its hint, returns the exit code
fn report_failure(e: &FolderCheckError) -> i32 {
    eprintln!("{}: {}", "Error".red().bold(), e.user_message());
    1
}

enum Outcome {
    Check(CheckReport),
    Purge(PurgeReport),
}

/// Merge the config file and command-line flags, flags win
fn load_config(cli: &Cli) -> Result<CheckerConfig> {
    let mut config = match &cli.config {
        Some(path) => CheckerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => CheckerConfig::default(),
    };

    if let Some(lang) = cli.lang {
        config.language = lang.into();
    }
    if let Some(name) = &cli.sidecar_name {
        config.sidecar_name = name.clone();
    }
    config.ignore_patterns.extend(cli.ignore.iter().cloned());
    if cli.follow_symlinks {
        config.follow_symlinks = true;
    }
    if cli.no_protect {
        config.protect_sidecar = false;
    }

    Ok(config)
}

fn spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Scanning folders...");
    Ok(pb)
}

fn colorize(line: &str) -> ColoredString {
    if line.starts_with("Checking: ") || line.starts_with("Deleting: ") {
        line.blue().bold()
    } else if line.starts_with("[A] ") {
        line.green()
    } else if line.starts_with("[M] ") {
        line.yellow()
    } else if line.starts_with("[D] ") {
        line.red()
    } else {
        line.normal()
    }
}

fn print_stats(outcome: &Outcome, elapsed: Duration) {
    // Millisecond precision is enough for a summary
    let elapsed = Duration::from_millis(elapsed.as_millis() as u64);

    println!();
    println!("{}", "Summary:".blue().bold());
    match outcome {
        Outcome::Check(report) => {
            let stats = report.stats();
            println!("  Folders checked: {}", stats.directories_visited.to_string().yellow());
            println!("  New folders: {}", stats.directories_new);
            println!("  Added: {}", stats.files_added.to_string().green());
            println!("  Modified: {}", stats.files_modified.to_string().yellow());
            println!("  Deleted: {}", stats.files_deleted.to_string().red());
            if stats.directories_failed > 0 {
                println!("  Failed folders: {}", stats.directories_failed.to_string().red());
            }
        }
        Outcome::Purge(report) => {
            println!("  Folders visited: {}", report.entries.len().to_string().yellow());
            println!("  Side-car files deleted: {}", report.removed_count().to_string().green());
        }
    }
    println!("  Duration: {}", format_duration(elapsed));
}
