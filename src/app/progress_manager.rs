//! Progress bar for download runs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use workshop_core::download::{Outcome, RunObserver};
use workshop_core::plan::WorkUnit;

/// [`RunObserver`] drawing an indicatif bar on stderr.
#[derive(Debug, Clone)]
pub(crate) struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Creates a reporter for `total` units; hidden when `enabled` is false.
    pub(crate) fn new(enabled: bool, total: usize) -> Self {
        let total = u64::try_from(total).unwrap_or(u64::MAX);
        let bar = if enabled {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl RunObserver for ProgressReporter {
    fn on_unit_started(&self, unit: &WorkUnit) {
        self.bar.set_message(format!("Downloading item {}...", unit.id));
    }

    fn on_outcome(&self, _outcome: &Outcome) {
        self.bar.inc(1);
    }
}
