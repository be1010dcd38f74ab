/// Default GitHub REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Configuration for the GitHub notifications client.
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// Personal access token with the `notifications` scope.
    pub token: String,
    /// API root without a trailing slash. Overridable for GitHub Enterprise
    /// and for tests.
    pub api_base: String,
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: format!("notisweep/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

impl GitHubClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}
