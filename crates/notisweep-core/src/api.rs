use std::fmt;

use async_trait::async_trait;

use crate::notification::Notification;
use crate::pagination::{Page, PageRequest};

/// Remote operations the sweeper needs from a notification service.
///
/// Every write is idempotent on the remote side: marking a read thread as
/// read, or muting an already-muted repository, changes nothing.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch one page of the authenticated user's notifications.
    async fn list_notifications(
        &self,
        request: PageRequest,
    ) -> Result<Page<Notification>, Self::Error>;

    /// Mark a notification thread as read.
    async fn mark_thread_read(&self, thread_id: &str) -> Result<(), Self::Error>;

    /// Ignore all future notifications from `owner/repo`.
    async fn mute_repository(&self, owner: &str, repo: &str) -> Result<(), Self::Error>;
}

/// A write performed on a matching notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepAction {
    MuteRepository,
    MarkRead,
}

impl fmt::Display for SweepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MuteRepository => write!(f, "mute repository"),
            Self::MarkRead => write!(f, "mark as read"),
        }
    }
}
