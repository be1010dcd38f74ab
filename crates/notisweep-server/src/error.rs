use notisweep_github::GitHubError;

use crate::scheduler::ScheduleError;

/// Invalid or unreadable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no GitHub token configured (set GITHUB_ACCESS_TOKEN)")]
    MissingToken,
    #[error("sweep keyword must not be empty (set KEYWORD)")]
    EmptyKeyword,
    #[error("invalid schedule: {0}")]
    InvalidSchedule(#[from] ScheduleError),
    #[error("{0} is not a valid listen address")]
    InvalidListenAddr(String),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Anything that stops the process from starting or keeps it from serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build GitHub client: {0}")]
    GitHub(#[from] GitHubError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("health listener stopped: {0}")]
    Serve(#[source] std::io::Error),
}
