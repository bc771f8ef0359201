use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default maximum depth of the Myers search
pub const DEFAULT_SCAN_LIMIT: usize = 500;

/// Default size, in bytes, of the neighborhood re-diffed around an edit
pub const DEFAULT_UPDATE_MARGIN: usize = 1000;

/// Configuration options for diffing
///
/// ```
/// use std::time::Duration;
/// use chunk_diff::DiffConfig;
///
/// let config = DiffConfig::default()
///     .scan_limit(1000)
///     .timeout(Duration::from_millis(50));
/// assert_eq!(config.scan_limit, Some(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiffConfig {
    /// Maximum depth of the bidirectional search before the remaining
    /// range is reported as one imprecise change. `None` is unbounded.
    pub scan_limit: Option<usize>,

    /// Wall clock budget for a single diff call
    pub timeout: Option<Duration>,

    /// How far around an edit incremental updates look for chunks to redo
    pub margin: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            scan_limit: Some(DEFAULT_SCAN_LIMIT),
            timeout: None,
            margin: DEFAULT_UPDATE_MARGIN,
        }
    }
}

impl DiffConfig {
    /// A configuration without any search budget. Always precise, but
    /// pathological inputs may take quadratic time.
    pub fn exact() -> Self {
        Self {
            scan_limit: None,
            timeout: None,
            margin: DEFAULT_UPDATE_MARGIN,
        }
    }

    /// Set the maximum search depth
    pub fn scan_limit(mut self, limit: usize) -> Self {
        self.scan_limit = Some(limit);
        self
    }

    /// Remove the search depth limit
    pub fn unlimited_scan(mut self) -> Self {
        self.scan_limit = None;
        self
    }

    /// Set the wall clock budget
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the incremental update margin
    pub fn margin(mut self, margin: usize) -> Self {
        self.margin = margin;
        self
    }
}
