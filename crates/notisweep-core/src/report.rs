use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::SweepAction;

/// Summary of one completed sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub run_id: String,
    /// Notifications fetched across all pages.
    pub total: usize,
    /// Notifications that matched the noise filter.
    pub matched: usize,
    pub marked_read: usize,
    pub muted: usize,
    pub failures: Vec<ItemFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SweepReport {
    pub fn new(run_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            total: 0,
            matched: 0,
            marked_read: 0,
            muted: 0,
            failures: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A write that failed while the sweep carried on with later items.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub notification_id: String,
    pub action: SweepAction,
    pub error: String,
}

/// Result of asking for a sweep.
#[derive(Debug, Clone)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another sweep was already running; nothing was done.
    Skipped,
}

impl SweepOutcome {
    pub fn report(&self) -> Option<&SweepReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped => None,
        }
    }
}

/// Why a sweep stopped before processing every match.
#[derive(Debug, thiserror::Error)]
pub enum SweepError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to list notifications: {0}")]
    Fetch(#[source] E),
    #[error("failed to {action} for notification {notification_id}: {source}")]
    Action {
        notification_id: String,
        action: SweepAction,
        #[source]
        source: E,
    },
}
