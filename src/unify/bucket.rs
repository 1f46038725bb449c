//! Duration bucketing policies.
//!
//! Two schemes have been used over the same tables: a seven-level numeric
//! scheme and a binary short-term/long-term split. A deployment picks one
//! through its [`Ruleset`](crate::config::Ruleset).

/// Maps an hour count onto an ordered set of bucket labels.
pub trait BucketPolicy: Send + Sync {
    /// Label for `hours`.
    fn label(&self, hours: f64) -> &'static str;

    /// All labels in ascending order.
    fn labels(&self) -> &'static [&'static str];

    /// Position of `label` in [`labels`](Self::labels).
    fn rank(&self, label: &str) -> Option<usize> {
        self.labels().iter().position(|l| *l == label)
    }
}

/// Seven-level numeric buckets.
///
/// | Upper bound (h, inclusive) | Label    |
/// |----------------------------|----------|
/// | 15                         | 0-15h    |
/// | 48                         | 15-48h   |
/// | 336                        | 2-14d    |
/// | 720                        | 14-30d   |
/// | 2160                       | 1-3mo    |
/// | 4320                       | 3-6mo    |
/// | above                      | >6mo     |
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdBuckets;

const THRESHOLD_LABELS: &[&str] = &[
    "0-15h", "15-48h", "2-14d", "14-30d", "1-3mo", "3-6mo", ">6mo",
];

const THRESHOLDS: &[f64] = &[15.0, 48.0, 336.0, 720.0, 2160.0, 4320.0];

impl BucketPolicy for ThresholdBuckets {
    fn label(&self, hours: f64) -> &'static str {
        THRESHOLDS
            .iter()
            .position(|&upper| hours <= upper)
            .map_or(THRESHOLD_LABELS[THRESHOLDS.len()], |i| THRESHOLD_LABELS[i])
    }

    fn labels(&self) -> &'static [&'static str] {
        THRESHOLD_LABELS
    }
}

/// Binary short-term/long-term split at `short_term_max_hours` (inclusive).
#[derive(Debug, Clone, Copy)]
pub struct TermBuckets {
    pub short_term_max_hours: f64,
}

/// Default split for [`TermBuckets`]: two weeks.
pub const DEFAULT_SHORT_TERM_MAX_HOURS: f64 = 336.0;

impl Default for TermBuckets {
    fn default() -> Self {
        Self {
            short_term_max_hours: DEFAULT_SHORT_TERM_MAX_HOURS,
        }
    }
}

const TERM_LABELS: &[&str] = &["Short-term", "Long-term"];

impl BucketPolicy for TermBuckets {
    fn label(&self, hours: f64) -> &'static str {
        match hours {
            h if h <= self.short_term_max_hours => TERM_LABELS[0],
            _ => TERM_LABELS[1],
        }
    }

    fn labels(&self) -> &'static [&'static str] {
        TERM_LABELS
    }
}
