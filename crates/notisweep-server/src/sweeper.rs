use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::Instrument;

use notisweep_core::{
    ItemFailure, NoiseFilter, Notification, NotificationApi, SweepAction, SweepError,
    SweepOutcome, SweepReport, paginate,
};

use crate::progress::SweepProgress;
use crate::state::SweepStatus;

/// Pause between processed notifications.
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(200);

/// What to do when a write fails for one notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the sweep and report the error.
    #[default]
    Abort,
    /// Record the failure and move on to the next notification.
    Continue,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(format!("unknown failure policy {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Mute the owning repository before marking each match read.
    pub mute_repositories: bool,
    pub item_delay: Duration,
    pub on_item_error: FailurePolicy,
    pub show_progress: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            mute_repositories: false,
            item_delay: DEFAULT_ITEM_DELAY,
            on_item_error: FailurePolicy::Abort,
            show_progress: false,
        }
    }
}

/// Fetches the notification feed and dismisses everything the filter matches.
pub struct Sweeper<A> {
    api: Arc<A>,
    filter: NoiseFilter,
    options: SweepOptions,
    status: Arc<SweepStatus>,
}

impl<A: NotificationApi> Sweeper<A> {
    pub fn new(api: Arc<A>, filter: NoiseFilter, options: SweepOptions) -> Self {
        Self {
            api,
            filter,
            options,
            status: Arc::new(SweepStatus::default()),
        }
    }

    pub fn status(&self) -> Arc<SweepStatus> {
        Arc::clone(&self.status)
    }

    pub fn options(&self) -> &SweepOptions {
        &self.options
    }

    /// Run one sweep unless another is already in flight.
    pub async fn sweep(&self) -> Result<SweepOutcome, SweepError<A::Error>> {
        let Some(_guard) = self.status.try_begin() else {
            tracing::warn!("A sweep is already running, skipping this trigger");
            return Ok(SweepOutcome::Skipped);
        };

        let run_id = short_run_id();
        let span = tracing::info_span!("sweep", run_id = %run_id);
        match self.run(run_id.clone()).instrument(span).await {
            Ok(report) => {
                self.status.record_report(&report).await;
                Ok(SweepOutcome::Completed(report))
            },
            Err(e) => {
                self.status.record_error(&run_id, e.to_string()).await;
                Err(e)
            },
        }
    }

    async fn run(&self, run_id: String) -> Result<SweepReport, SweepError<A::Error>> {
        let mut report = SweepReport::new(run_id, Utc::now());

        let api: &A = &self.api;
        let notifications = paginate(move |request| api.list_notifications(request))
            .await
            .map_err(SweepError::Fetch)?;
        let matches = self.filter.select(&notifications);
        report.total = notifications.len();
        report.matched = matches.len();

        tracing::info!(
            "Parsing {} out of {} notifications",
            report.matched,
            report.total
        );

        let progress = SweepProgress::new(self.options.show_progress, matches.len());

        for notification in matches {
            progress.message(&self.describe(notification));

            if let Err((action, source)) = self.dismiss(notification, &mut report).await {
                match self.options.on_item_error {
                    FailurePolicy::Abort => {
                        progress.abandon();
                        return Err(SweepError::Action {
                            notification_id: notification.id.clone(),
                            action,
                            source,
                        });
                    },
                    FailurePolicy::Continue => {
                        tracing::warn!(
                            notification_id = %notification.id,
                            %action,
                            error = %source,
                            "Failed to dismiss notification, continuing"
                        );
                        report.failures.push(ItemFailure {
                            notification_id: notification.id.clone(),
                            action,
                            error: source.to_string(),
                        });
                    },
                }
            }

            progress.tick();
            if !self.options.item_delay.is_zero() {
                tokio::time::sleep(self.options.item_delay).await;
            }
        }

        progress.finish();
        report.finished_at = Utc::now();
        tracing::info!(
            "Fin. Marked {} notifications as read!",
            report.marked_read
        );
        Ok(report)
    }

    /// Mute (when configured) then mark read. Counts are updated as each
    /// write succeeds.
    async fn dismiss(
        &self,
        notification: &Notification,
        report: &mut SweepReport,
    ) -> Result<(), (SweepAction, A::Error)> {
        if self.options.mute_repositories {
            self.api
                .mute_repository(
                    &notification.repository.owner.login,
                    &notification.repository.name,
                )
                .await
                .map_err(|e| (SweepAction::MuteRepository, e))?;
            report.muted += 1;
        }

        self.api
            .mark_thread_read(&notification.id)
            .await
            .map_err(|e| (SweepAction::MarkRead, e))?;
        report.marked_read += 1;
        Ok(())
    }

    fn describe(&self, notification: &Notification) -> String {
        if self.options.mute_repositories {
            format!(
                "Muting {} and marking {} {} as read.",
                notification.repository_slug(),
                notification.subject.url,
                notification.subject.title
            )
        } else {
            format!(
                "Marking {} {} as read.",
                notification.subject.url, notification.subject.title
            )
        }
    }
}

fn short_run_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
