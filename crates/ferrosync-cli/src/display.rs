//! Display utilities for the ferrosync CLI

use console::style;
use ferrosync_types::{SyncConfig, SyncStats};
use std::time::Duration;

/// Announce the run about to start
pub fn print_banner(config: &SyncConfig) {
    println!(
        "{} Mirroring {} to {}",
        style("⟲").blue().bold(),
        style(config.source.display()).cyan(),
        style(config.destination.display()).cyan()
    );

    let mode = if config.verify {
        "verify (content hash)"
    } else if config.compare_size {
        "fast (mtime and size)"
    } else {
        "fast (mtime)"
    };
    println!(
        "  Mode: {}, workers: {}",
        style(mode).dim(),
        style(config.workers).dim()
    );
}

/// Display the statistics of a finished run
pub fn print_sync_stats(stats: &SyncStats) {
    println!();
    println!("{}", style("Sync Statistics:").bold().underlined());
    println!("  Files copied: {}", style(stats.files_copied).green());
    println!("  Files deleted: {}", style(stats.files_deleted).green());
    println!(
        "  Bytes copied: {}",
        style(format_bytes(stats.bytes_copied)).green()
    );
    println!("  Files skipped: {}", style(stats.files_skipped).yellow());

    if stats.files_verified_identical > 0 || stats.verify_inconclusive > 0 {
        println!(
            "  Verified identical: {}",
            style(stats.files_verified_identical).cyan()
        );
        println!(
            "  Verification inconclusive: {}",
            style(stats.verify_inconclusive).yellow()
        );
    }

    let errors = stats.error_count();
    println!(
        "  Errors: {}",
        if errors > 0 {
            style(errors).red()
        } else {
            style(errors).green()
        }
    );
    println!(
        "  Duration: {}",
        style(format_duration(stats.elapsed)).blue()
    );
    println!(
        "  Transfer rate: {}",
        style(format!("{:.2} MB/s", stats.transfer_rate() / 1024.0 / 1024.0)).blue()
    );

    print_errors(stats);

    if stats.has_errors() {
        display_warning("Sync completed with errors");
    } else {
        display_success("Sync completed");
    }
}

/// List every recorded error on stderr, in the order they occurred
pub fn print_errors(stats: &SyncStats) {
    if !stats.has_errors() {
        return;
    }

    eprintln!();
    eprintln!("{}", style("Errors:").red().bold().underlined());
    for error in &stats.errors {
        eprintln!("  {} {}", style("✗").red(), error);
    }
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Display a warning message with proper formatting
pub fn display_warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

/// Display an error message with proper formatting
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

/// Display a success message with proper formatting
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), style(message).green());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0.00 B")]
    #[case(1023, "1023.00 B")]
    #[case(1536, "1.50 KB")]
    #[case(5 * 1024 * 1024, "5.00 MB")]
    #[case(u64::MAX, "16777216.00 TB")]
    fn test_format_bytes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }

    #[rstest]
    #[case(Duration::from_millis(1500), "1.50s")]
    #[case(Duration::from_secs(125), "2m 5s")]
    #[case(Duration::from_secs(3725), "1h 2m 5s")]
    fn test_format_duration(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }
}
