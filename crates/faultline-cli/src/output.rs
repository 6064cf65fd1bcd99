//! Terminal messages and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for corpus runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` versions
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Handle to the running bar, shareable with worker threads
    #[must_use]
    pub fn progress_bar(&self) -> Option<ProgressBar> {
        self.progress_bar.clone()
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message("Done");
        }
    }

    fn line(&self, symbol: &str, plain: &str, paint: fn(&str) -> String, message: &str) {
        let prefix = if self.use_color {
            paint(symbol)
        } else {
            plain.to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("✓", "DONE", |p| style(p).green().bold().to_string(), message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.line("✗", "FAIL", |p| style(p).red().bold().to_string(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("⚠", "SKIP", |p| style(p).yellow().bold().to_string(), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("ℹ", "INFO", |p| style(p).blue().bold().to_string(), message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print the outcome of a corpus operation
    pub fn summary(&self, completed: usize, skipped: usize, duration: Duration) {
        if self.quiet && skipped == 0 {
            return;
        }

        let total = completed + skipped;
        let secs = duration.as_secs_f64();

        if self.use_color {
            let done = Style::new().green().bold();
            let skip = Style::new().yellow().bold();
            let status = if skipped > 0 {
                skip.apply_to("PARTIAL")
            } else {
                done.apply_to("COMPLETE")
            };
            let _ = self.term.write_line(&format!(
                "{status} {total} versions in {secs:.2}s ({} completed, {} skipped)",
                done.apply_to(completed),
                skip.apply_to(skipped)
            ));
        } else {
            let status = if skipped > 0 { "PARTIAL" } else { "COMPLETE" };
            let _ = self.term.write_line(&format!(
                "{status} {total} versions in {secs:.2}s ({completed} completed, {skipped} skipped)"
            ));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reporter() {
        let reporter = ProgressReporter::new(true, false);
        assert!(reporter.use_color);
        assert!(!reporter.quiet);
        assert!(reporter.progress_bar().is_none());
    }

    #[test]
    fn test_quiet_reporter_has_no_bar() {
        let mut reporter = ProgressReporter::new(false, true);
        reporter.start_progress(3, "versions");
        assert!(reporter.progress_bar().is_none());
        reporter.finish();
    }

    #[test]
    fn test_progress_bar_counts() {
        let mut reporter = ProgressReporter::new(false, false);
        reporter.start_progress(3, "versions");
        let bar = reporter.progress_bar().unwrap();
        bar.inc(2);
        assert_eq!(bar.position(), 2);
        reporter.finish();
    }

    #[test]
    fn test_messages_without_color() {
        let reporter = ProgressReporter::new(false, false);
        reporter.success("v1 done");
        reporter.failure("v2 invalid");
        reporter.warning("v3 skipped");
        reporter.info("ranking");
        reporter.header("Summary");
        reporter.summary(2, 1, Duration::from_millis(1500));
    }
}
