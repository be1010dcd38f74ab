use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use notisweep_core::SweepReport;

/// Shared view of the sweeper: the in-progress slot and the last result.
#[derive(Debug, Default)]
pub struct SweepStatus {
    in_progress: AtomicBool,
    last: RwLock<Option<LastSweep>>,
}

/// Releases the in-progress slot on drop.
#[derive(Debug)]
pub struct SweepGuard<'a> {
    status: &'a SweepStatus,
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.status.in_progress.store(false, Ordering::Release);
    }
}

/// Summary of the most recent sweep, exposed on `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct LastSweep {
    pub run_id: Option<String>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: bool,
    pub total: usize,
    pub matched: usize,
    pub marked_read: usize,
    pub muted: usize,
    pub failures: usize,
    pub error: Option<String>,
}

impl SweepStatus {
    /// Claim the single sweep slot. `None` if a sweep is already running.
    pub fn try_begin(&self) -> Option<SweepGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SweepGuard { status: self })
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub async fn last(&self) -> Option<LastSweep> {
        self.last.read().await.clone()
    }

    pub async fn record_report(&self, report: &SweepReport) {
        *self.last.write().await = Some(LastSweep {
            run_id: Some(report.run_id.clone()),
            finished_at: report.finished_at,
            succeeded: report.is_clean(),
            total: report.total,
            matched: report.matched,
            marked_read: report.marked_read,
            muted: report.muted,
            failures: report.failures.len(),
            error: None,
        });
    }

    pub async fn record_error(&self, run_id: &str, error: String) {
        *self.last.write().await = Some(LastSweep {
            run_id: Some(run_id.to_string()),
            finished_at: Utc::now(),
            succeeded: false,
            total: 0,
            matched: 0,
            marked_read: 0,
            muted: 0,
            failures: 0,
            error: Some(error),
        });
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sweep: Arc<SweepStatus>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(sweep: Arc<SweepStatus>) -> Self {
        Self {
            sweep,
            started_at: Utc::now(),
        }
    }
}
