use std::sync::atomic::{AtomicUsize, Ordering};

use engine_logging::engine_info;
use wiki_engine::{ProgressSink, ScrapeEvent};

/// Logs a progress line roughly every tenth of the target.
pub struct LogProgress {
    target: usize,
    step: usize,
    done: AtomicUsize,
}

impl LogProgress {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            step: (target / 10).max(1),
            done: AtomicUsize::new(0),
        }
    }
}

impl ProgressSink for LogProgress {
    fn emit(&self, event: ScrapeEvent) {
        if matches!(event, ScrapeEvent::TitleQueued { .. }) {
            return;
        }
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.step == 0 || done == self.target {
            engine_info!("Progress: {}/{} titles processed", done, self.target);
        }
    }
}
