use std::time::{Duration, Instant};

/// Statistics for one labelling call.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total execution time, classifier call included.
    pub total_time: Duration,
    /// Number of texts labelled.
    pub items_processed: usize,
    /// Number of texts that fell back to the "other" label.
    pub fallbacks: usize,
}

impl PipelineStats {
    /// Create a new stats tracker (call at start of operation).
    pub(crate) fn start() -> PipelineStatsBuilder {
        PipelineStatsBuilder {
            start_time: Instant::now(),
        }
    }

    /// Fraction of items that received no real label.
    pub fn fallback_rate(&self) -> f64 {
        if self.items_processed == 0 {
            return 0.0;
        }
        self.fallbacks as f64 / self.items_processed as f64
    }
}

/// Tracks timing from creation to finish.
pub(crate) struct PipelineStatsBuilder {
    start_time: Instant,
}

impl PipelineStatsBuilder {
    pub fn finish(self, items_processed: usize, fallbacks: usize) -> PipelineStats {
        PipelineStats {
            total_time: self.start_time.elapsed(),
            items_processed,
            fallbacks,
        }
    }
}
