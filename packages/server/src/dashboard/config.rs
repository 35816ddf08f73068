use std::time::Duration;

use shelter_core::{DEFAULT_PAGE_SIZE, DEFAULT_TOP_N};

/// Tuning for the dashboard pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Maximum records fetched per query. 0 fetches everything.
    pub fetch_limit: usize,
    /// Bars in the top-breeds chart.
    pub top_n: usize,
    /// Table rows per page.
    pub page_size: usize,
    /// Sessions untouched for this long are dropped when a new one opens.
    pub session_idle_timeout: Duration,
    /// Open sessions kept at most; the least recently used go first.
    pub max_sessions: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            fetch_limit: 2000,
            top_n: DEFAULT_TOP_N,
            page_size: DEFAULT_PAGE_SIZE,
            session_idle_timeout: Duration::from_secs(30 * 60),
            max_sessions: 1024,
        }
    }
}
