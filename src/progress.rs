//! Textual progress indicator with percentage and estimated time remaining

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "[{bar:40}] {percent:>3}% {eta}";

/// Progress over a fixed number of ticks
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Progress drawn to stderr
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }

    /// Progress that only counts
    pub fn hidden(total: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total);
        Self { bar }
    }

    pub fn tick(&mut self) {
        self.inc(1);
    }

    pub fn inc(&mut self, ticks: u64) {
        self.bar.inc(ticks);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Terminate the progress line
    pub fn finish(&mut self) {
        self.bar.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_advance() {
        let mut progress = Progress::hidden(4);
        progress.tick();
        assert_eq!(progress.position(), 1);
        progress.inc(3);
        assert_eq!(progress.position(), 4);
    }

    #[test]
    fn test_template_is_valid() {
        assert!(ProgressStyle::default_bar().template(TEMPLATE).is_ok());
    }
}
