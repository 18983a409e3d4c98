//! Progress rendering for sync runs

use console::style;
use ferrosync_types::{SyncObserver, SyncPhase, TaskOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.blue} {msg}";

/// Observer driving an `indicatif` progress bar
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    /// Create a new progress observer; a quiet observer draws nothing
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_style(spinner_style());

        Self { bar }
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl SyncObserver for ProgressObserver {
    fn on_phase(&self, phase: SyncPhase) {
        let message = match phase {
            SyncPhase::Scanning => "Scanning directories...",
            SyncPhase::Classifying => "Comparing files...",
            SyncPhase::Verifying => "Hashing candidate files...",
            SyncPhase::Copying => "Copying files...",
            SyncPhase::Deleting => "Deleting orphaned files...",
            SyncPhase::Reporting => "Summarizing...",
            SyncPhase::Idle | SyncPhase::Done | SyncPhase::Aborted => return,
        };
        self.bar.set_message(message);
    }

    fn on_planned(&self, phase: SyncPhase, total: u64) {
        if phase == SyncPhase::Verifying {
            self.bar.set_style(spinner_style());
            self.bar
                .set_message(format!("Hashing {} candidate pairs...", total));
            return;
        }

        self.bar.set_style(bar_style());
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn on_outcome(&self, outcome: &TaskOutcome) {
        self.bar.inc(1);

        if outcome.success {
            let name = outcome
                .path
                .file_name()
                .map_or_else(|| outcome.path.to_string_lossy(), |n| n.to_string_lossy());
            self.bar.set_message(format!("{}: {}", outcome.kind, name));
        } else {
            self.bar.suspend(|| {
                eprintln!(
                    "{} {}",
                    style("⚠").yellow().bold(),
                    style(&outcome.message).yellow()
                );
            });
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .map(|style| style.progress_chars("█▉▊▋▌▍▎▏  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrosync_types::TaskKind;

    #[test]
    fn test_templates_parse() {
        assert!(ProgressStyle::with_template(BAR_TEMPLATE).is_ok());
        assert!(ProgressStyle::with_template(SPINNER_TEMPLATE).is_ok());
    }

    #[test]
    fn test_outcomes_advance_bar() {
        let observer = ProgressObserver::new(true);
        observer.on_phase(SyncPhase::Copying);
        observer.on_planned(SyncPhase::Copying, 3);
        observer.on_outcome(&TaskOutcome::succeeded(TaskKind::Copy, "/d/a.txt", 5));
        observer.on_outcome(&TaskOutcome::failed(TaskKind::Copy, "/d/b.txt", "disk full"));

        assert_eq!(observer.bar.length(), Some(3));
        assert_eq!(observer.bar.position(), 2);

        observer.on_planned(SyncPhase::Deleting, 1);
        assert_eq!(observer.bar.position(), 0);
        observer.finish();
        assert!(observer.bar.is_finished());
    }
}
