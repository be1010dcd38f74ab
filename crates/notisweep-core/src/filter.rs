use crate::notification::Notification;

/// Rule deciding which notifications are noise.
///
/// A notification matches when its reason equals
/// [`SECURITY_ALERT`](crate::notification::SECURITY_ALERT) and its
/// subject URL contains the keyword. Both comparisons are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseFilter {
    keyword: String,
}

impl NoiseFilter {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    pub fn matches(&self, notification: &Notification) -> bool {
        notification.is_security_alert() && notification.subject.url.contains(&self.keyword)
    }

    /// Matching notifications, in input order.
    pub fn select<'a>(&self, notifications: &'a [Notification]) -> Vec<&'a Notification> {
        notifications.iter().filter(|n| self.matches(n)).collect()
    }
}
