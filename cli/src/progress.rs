//! Terminal progress bar.
//!
//! Wraps an indicatif bar behind the engine's [`Progress`] trait.

use blacklist_engine::Progress;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}";

/// Progress bar for a reconciliation batch.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Create a hidden bar labelled `message`; it appears on `start`.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::hidden();
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░");
        bar.set_style(style);
        bar.set_message(message.to_string());

        Self { bar }
    }

    /// Current position of the bar.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Whether the bar has been finished.
    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

impl Progress for BarProgress {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar
            .set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn advance(&self, completed: u64) {
        if completed > self.bar.position() {
            self.bar.set_position(completed);
        }
    }

    fn finish(&self) {
        self.bar.finish();
    }
}
