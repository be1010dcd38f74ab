use serde::{Deserialize, Deserializer, Serialize};

/// `reason` value GitHub assigns to Dependabot and code-scanning alerts.
pub const SECURITY_ALERT: &str = "security_alert";

/// A notification thread as returned by `GET /notifications`.
///
/// Only the fields the sweeper reads are modelled; anything else in the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub reason: String,
    #[serde(default = "default_unread")]
    pub unread: bool,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub subject: Subject,
    pub repository: Repository,
}

fn default_unread() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub title: String,
    /// API URL of the subject. GitHub sends `null` for some subject types.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

impl Notification {
    pub fn is_security_alert(&self) -> bool {
        self.reason == SECURITY_ALERT
    }

    /// `owner/name` of the repository the thread belongs to.
    pub fn repository_slug(&self) -> String {
        if self.repository.full_name.is_empty() {
            format!("{}/{}", self.repository.owner.login, self.repository.name)
        } else {
            self.repository.full_name.clone()
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
