//! Interval classification.
//!
//! Key-down intervals are non-negative and key-up intervals negative, so
//! one signed threshold pair covers both. `classify_mark` and
//! `classify_gap` take unsigned elapsed time and give the same answers as
//! [`IntervalClassifier::classify`] on the matching signed value.

use morse_core::config::TimingConfig;
use morse_core::{Mark, Timestamp};

#[derive(Debug, Clone, Copy)]
pub struct IntervalClassifier {
    timing: TimingConfig,
}

impl IntervalClassifier {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// Classify a signed interval in milliseconds.
    pub fn classify(&self, interval_ms: i64) -> Mark {
        if interval_ms >= 0 {
            self.classify_mark(interval_ms)
        } else {
            self.classify_gap(interval_ms.saturating_neg())
        }
    }

    /// Classify the interval from `from` to `to`.
    ///
    /// `(press, release)` yields a mark. `(next_press, last_release)` is
    /// negative and yields a gap.
    pub fn classify_interval(&self, from: Timestamp, to: Timestamp) -> Mark {
        self.classify(to.millis_since(from))
    }

    /// Classify how long the key was held down. Negative input counts as 0.
    pub fn classify_mark(&self, held_ms: i64) -> Mark {
        if held_ms.max(0) > self.timing.short_mark_max_ms {
            Mark::LongMark
        } else {
            Mark::ShortMark
        }
    }

    /// Classify how long the key was up. Negative input counts as 0.
    pub fn classify_gap(&self, idle_ms: i64) -> Mark {
        if -idle_ms.max(0) >= self.timing.short_gap_min_ms {
            Mark::ShortGap
        } else {
            Mark::LongGap
        }
    }
}
