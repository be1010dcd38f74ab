use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("request to GitHub failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("GitHub API returned {status} for {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },
    #[error("failed to decode GitHub response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("invalid authorization header value")]
    InvalidHeader,
}

impl GitHubError {
    /// Status code for errors that came back from the API.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) | Self::Decode(e) => e.status(),
            Self::InvalidHeader => None,
        }
    }
}
