pub mod api;
pub mod filter;
pub mod notification;
pub mod pagination;
pub mod report;

pub use api::{NotificationApi, SweepAction};
pub use filter::NoiseFilter;
pub use notification::{Notification, SECURITY_ALERT};
pub use pagination::{Page, PageRequest, paginate};
pub use report::{ItemFailure, SweepError, SweepOutcome, SweepReport};

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::api::NotificationApi;
    use crate::notification::{Notification, Owner, Repository, Subject};
    use crate::pagination::{Page, PageRequest};

    /// Build a notification in repository `acme/widgets`.
    pub fn make_notification(id: &str, reason: &str, url: &str) -> Notification {
        make_notification_in(id, reason, url, "acme", "widgets")
    }

    /// Build a notification in the given repository.
    pub fn make_notification_in(
        id: &str,
        reason: &str,
        url: &str,
        owner: &str,
        repo: &str,
    ) -> Notification {
        Notification {
            id: id.to_string(),
            reason: reason.to_string(),
            unread: true,
            updated_at: None,
            subject: Subject {
                title: format!("Alert {id}"),
                url: url.to_string(),
                kind: None,
            },
            repository: Repository {
                name: repo.to_string(),
                full_name: format!("{owner}/{repo}"),
                owner: Owner {
                    login: owner.to_string(),
                },
            },
        }
    }

    /// A remote call observed by [`RecordingApi`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RecordedCall {
        List(u32),
        MarkRead(String),
        Mute(String, String),
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    pub struct FakeError(pub String);

    /// In-memory notification service.
    ///
    /// Marking a thread read removes it from the unread feed, so a second
    /// sweep sees only what the first one left behind.
    pub struct RecordingApi {
        notifications: Mutex<Vec<Notification>>,
        page_size: usize,
        calls: Mutex<Vec<RecordedCall>>,
        failing_threads: HashSet<String>,
        fail_listing: bool,
    }

    impl RecordingApi {
        pub fn new(notifications: Vec<Notification>) -> Self {
            Self {
                notifications: Mutex::new(notifications),
                page_size: crate::pagination::PER_PAGE as usize,
                calls: Mutex::new(Vec::new()),
                failing_threads: HashSet::new(),
                fail_listing: false,
            }
        }

        /// Serve pages of `size` items instead of the requested page size.
        pub fn with_page_size(mut self, size: usize) -> Self {
            self.page_size = size.max(1);
            self
        }

        /// Make `mark_thread_read` fail for the given thread.
        pub fn failing_on(mut self, thread_id: &str) -> Self {
            self.failing_threads.insert(thread_id.to_string());
            self
        }

        pub fn failing_listing(mut self) -> Self {
            self.fail_listing = true;
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Write calls only (listing excluded).
        pub fn writes(&self) -> Vec<RecordedCall> {
            self.calls()
                .into_iter()
                .filter(|c| !matches!(c, RecordedCall::List(_)))
                .collect()
        }

        pub fn unread_ids(&self) -> Vec<String> {
            self.notifications
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.id.clone())
                .collect()
        }
    }

    #[async_trait]
    impl NotificationApi for RecordingApi {
        type Error = FakeError;

        async fn list_notifications(
            &self,
            request: PageRequest,
        ) -> Result<Page<Notification>, FakeError> {
            self.calls
                .lock()
                .unwrap()
                .push(RecordedCall::List(request.page));
            if self.fail_listing {
                return Err(FakeError("listing unavailable".to_string()));
            }
            let all = self.notifications.lock().unwrap();
            let start = (request.page as usize - 1) * self.page_size;
            let items: Vec<Notification> =
                all.iter().skip(start).take(self.page_size).cloned().collect();
            Ok(Page {
                has_next: start + self.page_size < all.len(),
                items,
            })
        }

        async fn mark_thread_read(&self, thread_id: &str) -> Result<(), FakeError> {
            self.calls
                .lock()
                .unwrap()
                .push(RecordedCall::MarkRead(thread_id.to_string()));
            if self.failing_threads.contains(thread_id) {
                return Err(FakeError(format!("thread {thread_id} rejected")));
            }
            self.notifications
                .lock()
                .unwrap()
                .retain(|n| n.id != thread_id);
            Ok(())
        }

        async fn mute_repository(&self, owner: &str, repo: &str) -> Result<(), FakeError> {
            self.calls
                .lock()
                .unwrap()
                .push(RecordedCall::Mute(owner.to_string(), repo.to_string()));
            Ok(())
        }
    }
}
