//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Config
//!     Thumbnails: /home/me/thumbnails
//!     Script: /home/me/thumbnails/generate-%n.sh (500 per script)
//!     Time stamp: %y_%m_%d_%H_%M_%S_ (e.g. 2024_03_05_10_00_00_)
//!     Suffix: .json
//!     Extensions: .jpg .jpeg
//!     Log: console
//!
//! Users
//! alice
//!     /srv/photos/alice/2016
//!     /srv/photos/alice/2017 (missing)
//!
//! Commands
//!     convert "%in" -thumbnail 300x300 "%out"
//! ```
//!
//! ## Run
//!
//! ```text
//! Found 1204 photos, 12 without thumbnails
//!     Cache: 1192 have thumbnails, 12 missing (1204 total, 31 directories listed)
//!     Time: 412ms (min:00 sec:00 ms:412)
//! Scheduled 12 thumbnails
//!     Script: /home/me/thumbnails/generate-0000.sh
//!     Time: 35ms (min:00 sec:00 ms:035)
//! ```
//!
//! ## Dump
//!
//! ```text
//! /srv/photos/alice/2016/IMG_0001.jpg (MM, 2 tags)
//!     DateTime=2016:11:06 11:29:18
//!     Make=LG Electronics
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::ThumbnailConfig;
use crate::dict::DictEvent;
use crate::exif::ExifImage;
use crate::run::RunSummary;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Shared helpers
// ============================================================================

/// `1234ms (min:00 sec:01 ms:234)`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let secs = ms / 1000;
    format!(
        "{ms}ms (min:{:02} sec:{:02} ms:{:03})",
        secs / 60,
        secs % 60,
        ms % 1000
    )
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

// ============================================================================
// Check
// ============================================================================

/// Describe a loaded config.
///
/// `example` is the time stamp pattern applied to some moment; `exists`
/// tells whether a user path is there.
pub fn format_check_output(
    config: &ThumbnailConfig,
    example: &str,
    exists: impl Fn(&Path) -> bool,
) -> Vec<String> {
    let mut lines = vec!["Config".to_string()];
    lines.push(format!("    Thumbnails: {}", config.thumbnails_root));
    lines.push(match config.max_per_file {
        Some(max) => format!("    Script: {} ({max} per script)", config.exec_file),
        None => format!("    Script: {}", config.exec_file),
    });
    lines.push(format!(
        "    Time stamp: {} (e.g. {example})",
        config.timestamp_pattern
    ));
    lines.push(format!("    Suffix: {}", config.suffix));
    if config.image_extensions.is_empty() {
        lines.push("    Extensions: any".to_string());
    } else {
        lines.push(format!("    Extensions: {}", config.image_extensions.join(" ")));
    }
    lines.push(if config.log_name.is_empty() {
        "    Log: console".to_string()
    } else {
        format!(
            "    Log: {}{}",
            Path::new(&config.log_path).join(&config.log_name).display(),
            if config.log_console { " (and console)" } else { "" }
        )
    });

    lines.push(String::new());
    lines.push("Users".to_string());
    let mut last_user: Option<&str> = None;
    let paths = config.user_paths();
    for path in &paths {
        if last_user != Some(path.user.as_str()) {
            lines.push(path.user.clone());
            last_user = Some(path.user.as_str());
        }
        let full = path.full_path();
        let marker = if exists(&full) { "" } else { " (missing)" };
        lines.push(format!("    {}{marker}", full.display()));
    }
    if paths.is_empty() {
        lines.push("    (none)".to_string());
    }

    lines.push(String::new());
    lines.push("Commands".to_string());
    for exec in &config.exec {
        lines.push(format!("    {exec}"));
    }
    lines
}

pub fn print_check_output(config: &ThumbnailConfig, example: &str) {
    for line in format_check_output(config, example, Path::is_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Run
// ============================================================================

/// One line for a verbose run, `None` for events not worth a line.
pub fn format_event(event: &DictEvent) -> Option<String> {
    match event {
        DictEvent::Found {
            number,
            path,
            has_thumbnail,
        } => Some(format!(
            "{number:04} {}{}",
            path.display(),
            if *has_thumbnail { "" } else { " (missing)" }
        )),
        DictEvent::ScanFailed { message } => Some(format!("ERROR: {message}")),
        DictEvent::Scheduled { number, output } => {
            Some(format!("{number:04} \u{2192} {}", output.display()))
        }
        DictEvent::Skipped { path, reason } => {
            Some(format!("SKIPPED: {}: {reason}", path.display()))
        }
    }
}

/// Summary after a run.
pub fn format_run_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Found {}, {} without thumbnails",
        plural(summary.files_found, "photo", "photos"),
        summary.missing
    )];
    lines.push(format!("    Cache: {}", summary.cache));
    if summary.scan_failures > 0 {
        lines.push(format!(
            "    Unreadable: {}",
            plural(summary.scan_failures, "path", "paths")
        ));
    }
    lines.push(format!("    Time: {}", format_elapsed(summary.populate_time)));

    lines.push(format!(
        "Scheduled {}",
        plural(summary.scheduled, "thumbnail", "thumbnails")
    ));
    if summary.failures > 0 {
        lines.push(format!("    Skipped: {}", summary.failures));
    }
    for script in &summary.scripts {
        lines.push(format!("    Script: {}", script.display()));
    }
    lines.push(format!("    Time: {}", format_elapsed(summary.create_time)));
    lines
}

pub fn print_run_summary(summary: &RunSummary) {
    for line in format_run_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Dump
// ============================================================================

/// Decoded tags of one image.
pub fn format_dump(image: &ExifImage, debug: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}, {})",
        image.path().display(),
        image.byte_order(),
        plural(image.entries().len(), "tag", "tags")
    )];
    if debug {
        lines.push(format!("    {}", image.diagnostics()));
    }
    for entry in image.entries() {
        lines.push(format!("    {}", entry.output()));
    }
    lines
}

pub fn print_dump(image: &ExifImage, debug: bool) {
    for line in format_dump(image, debug) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
