//! Progress bar utilities for CLI output
//!
//! This module provides the scan progress bar, console output helpers and
//! the dual console/file log writer.

use crate::duplicate::ScanProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;

// ============================================================================
// Styles - Consistent visual appearance
// ============================================================================

/// Get the progress bar style for fingerprinting
fn progress_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.green} [{bar:40.cyan/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

/// Shorten a path for one-line display, keeping its tail
pub fn short_path(path: &Path, max_chars: usize) -> String {
    let text = path.to_string_lossy();
    let count = text.chars().count();
    if count <= max_chars {
        return text.into_owned();
    }
    let tail: String = text.chars().skip(count - max_chars.saturating_sub(1)).collect();
    format!("…{}", tail)
}

// ============================================================================
// Progress bar for scans
// ============================================================================

/// Progress bar fed by the scanner's progress callback
pub struct ScanProgressBar {
    bar: ProgressBar,
}

impl ScanProgressBar {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(progress_bar_style());
        Self { bar }
    }

    /// Apply one progress report
    pub fn update(&self, progress: &ScanProgress) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.current as u64);
        self.bar.set_message(short_path(&progress.current_file, 40));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ScanProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Logging helpers
// ============================================================================

/// Writer that sends log output to both stderr and a file
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.console.write(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}
