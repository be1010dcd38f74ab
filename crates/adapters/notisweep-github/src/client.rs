use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK};

use notisweep_core::{Notification, NotificationApi, Page, PageRequest};

use crate::config::GitHubClientConfig;
use crate::error::GitHubError;
use crate::link;

const API_VERSION: &str = "2022-11-28";

/// GitHub REST client for the notifications and subscription endpoints.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(config: GitHubClientConfig) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| GitHubError::InvalidHeader)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(GitHubError::Http)?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GitHubError> {
        let resp = request.send().await.map_err(GitHubError::Http)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let url = resp.url().to_string();
        tracing::warn!(%status, url, "GitHub API request failed");
        let body = resp.text().await.unwrap_or_default();
        Err(GitHubError::Status { status, url, body })
    }
}

#[async_trait]
impl NotificationApi for GitHubClient {
    type Error = GitHubError;

    async fn list_notifications(
        &self,
        request: PageRequest,
    ) -> Result<Page<Notification>, GitHubError> {
        let url = format!("{}/notifications", self.api_base);
        let resp = self
            .send(self.client.get(&url).query(&[
                ("per_page", request.per_page),
                ("page", request.page),
            ]))
            .await?;

        let has_next = resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .is_some_and(link::has_next);
        let items: Vec<Notification> = resp.json().await.map_err(GitHubError::Decode)?;

        Ok(Page { items, has_next })
    }

    async fn mark_thread_read(&self, thread_id: &str) -> Result<(), GitHubError> {
        let url = format!("{}/notifications/threads/{thread_id}", self.api_base);
        self.send(self.client.patch(&url)).await?;
        Ok(())
    }

    async fn mute_repository(&self, owner: &str, repo: &str) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{owner}/{repo}/subscription", self.api_base);
        self.send(
            self.client
                .put(&url)
                .json(&serde_json::json!({ "subscribed": false, "ignored": true })),
        )
        .await?;
        Ok(())
    }
}
