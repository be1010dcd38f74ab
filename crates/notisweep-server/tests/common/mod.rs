use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, put};
use serde_json::{Value, json};

use notisweep_core::NoiseFilter;
use notisweep_github::{GitHubClient, GitHubClientConfig};
use notisweep_server::build_app;
use notisweep_server::state::{AppState, SweepStatus};
use notisweep_server::sweeper::{SweepOptions, Sweeper};

pub const KEYWORD: &str = "acme-corp";

/// A request the fake GitHub API received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { page: usize, per_page: usize },
    MarkRead(String),
    Mute { owner: String, repo: String, ignored: bool },
}

#[derive(Default)]
struct Inner {
    /// Unread feed, in the order GitHub would return it.
    unread: Vec<Value>,
    calls: Vec<Call>,
    failing_threads: HashSet<String>,
}

type Shared = Arc<Mutex<Inner>>;

/// In-process stand-in for the GitHub notifications API.
pub struct FakeGitHub {
    pub addr: SocketAddr,
    inner: Shared,
    _server: tokio::task::JoinHandle<()>,
}

impl FakeGitHub {
    pub async fn start(unread: Vec<Value>) -> Self {
        Self::start_with_failures(unread, &[]).await
    }

    /// Start with `mark as read` returning 500 for the given thread ids.
    pub async fn start_with_failures(unread: Vec<Value>, failing: &[&str]) -> Self {
        let inner: Shared = Arc::new(Mutex::new(Inner {
            unread,
            calls: Vec::new(),
            failing_threads: failing.iter().map(|s| s.to_string()).collect(),
        }));

        let app = Router::new()
            .route("/notifications", get(list_notifications))
            .route("/notifications/threads/{id}", patch(mark_thread_read))
            .route("/repos/{owner}/{repo}/subscription", put(set_subscription))
            .with_state(Arc::clone(&inner));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            inner,
            _server: handle,
        }
    }

    pub fn client(&self) -> GitHubClient {
        let config = GitHubClientConfig::new("ghp_integration")
            .with_api_base(format!("http://{}", self.addr));
        GitHubClient::new(config).unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Write calls only, in arrival order.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List { .. }))
            .collect()
    }

    pub fn unread_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .unread
            .iter()
            .filter_map(|n| n["id"].as_str().map(String::from))
            .collect()
    }
}

async fn list_notifications(
    State(inner): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(50);

    let mut inner = inner.lock().unwrap();
    inner.calls.push(Call::List { page, per_page });

    let start = (page - 1) * per_page;
    let items: Vec<Value> = inner
        .unread
        .iter()
        .skip(start)
        .take(per_page)
        .cloned()
        .collect();
    let has_next = start + per_page < inner.unread.len();
    drop(inner);

    let body = axum::Json(Value::Array(items));
    if has_next {
        let link = format!(
            r#"<http://fake/notifications?per_page={per_page}&page={}>; rel="next""#,
            page + 1
        );
        ([(header::LINK, link)], body).into_response()
    } else {
        body.into_response()
    }
}

async fn mark_thread_read(State(inner): State<Shared>, Path(id): Path<String>) -> StatusCode {
    let mut inner = inner.lock().unwrap();
    inner.calls.push(Call::MarkRead(id.clone()));
    if inner.failing_threads.contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    inner.unread.retain(|n| n["id"] != id.as_str());
    StatusCode::RESET_CONTENT
}

async fn set_subscription(
    State(inner): State<Shared>,
    Path((owner, repo)): Path<(String, String)>,
    axum::Json(body): axum::Json<Value>,
) -> axum::Json<Value> {
    let ignored = body["ignored"].as_bool().unwrap_or(false);
    inner.lock().unwrap().calls.push(Call::Mute {
        owner,
        repo,
        ignored,
    });
    axum::Json(json!({ "subscribed": false, "ignored": ignored }))
}

/// Notification JSON shaped like the GitHub API payload.
pub fn notification(id: &str, reason: &str, url: &str, owner: &str, repo: &str) -> Value {
    json!({
        "id": id,
        "unread": true,
        "reason": reason,
        "updated_at": "2026-01-01T00:00:00Z",
        "subject": {
            "title": format!("Notification {id}"),
            "url": url,
            "type": "RepositoryVulnerabilityAlert"
        },
        "repository": {
            "name": repo,
            "full_name": format!("{owner}/{repo}"),
            "owner": { "login": owner }
        },
        "url": format!("https://api.github.com/notifications/threads/{id}")
    })
}

/// A security alert whose URL contains [`KEYWORD`].
pub fn matching(id: &str) -> Value {
    notification(
        id,
        "security_alert",
        &format!("https://api.github.com/repos/{KEYWORD}/app/dependabot/alerts/{id}"),
        KEYWORD,
        "app",
    )
}

/// Options with no inter-item delay and no progress bar.
pub fn fast_options() -> SweepOptions {
    SweepOptions {
        item_delay: Duration::ZERO,
        show_progress: false,
        ..SweepOptions::default()
    }
}

pub fn sweeper_for(fake: &FakeGitHub, options: SweepOptions) -> Arc<Sweeper<GitHubClient>> {
    Arc::new(Sweeper::new(
        Arc::new(fake.client()),
        NoiseFilter::new(KEYWORD),
        options,
    ))
}

/// The health listener, bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new(status: Arc<SweepStatus>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = build_app(AppState::new(status));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}
