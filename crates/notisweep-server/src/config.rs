use std::time::Duration;

use serde::Deserialize;

use notisweep_github::GitHubClientConfig;
use notisweep_github::config::DEFAULT_API_BASE;

use crate::error::ConfigError;
use crate::scheduler::{DEFAULT_CRON, HourlySchedule, RunMode};
use crate::sweeper::{FailurePolicy, SweepOptions};

/// Optional config file read from the working directory.
pub const CONFIG_FILE: &str = "notisweep.toml";

/// `environment` value that disables the progress bar and switches logs to JSON.
pub const PRODUCTION: &str = "production";

/// Top-level configuration, loaded from `notisweep.toml` and the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deployment tag; anything other than `production` shows a progress bar.
    pub environment: String,
    pub github: GitHubSection,
    pub sweep: SweepSection,
    pub schedule: ScheduleSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            environment: "development".to_string(),
            github: GitHubSection::default(),
            sweep: SweepSection::default(),
            schedule: ScheduleSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubSection {
    pub token: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepSection {
    /// Substring the subject URL must contain for a security alert to be dismissed.
    pub keyword: String,
    pub mute_repositories: bool,
    pub delay_ms: u64,
    pub on_item_error: FailurePolicy,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            mute_repositories: false,
            delay_ms: 200,
            on_item_error: FailurePolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub cron: String,
    pub run_mode: RunMode,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            cron: DEFAULT_CRON.to_string(),
            run_mode: RunMode::Scheduled,
        }
    }
}

impl ServerConfig {
    /// Load `notisweep.toml` if it exists, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(content) => {
                let cfg = Self::from_toml(&content, CONFIG_FILE)?;
                tracing::info!("Loaded configuration from {CONFIG_FILE}");
                if cfg.github.token.is_some() {
                    tracing::warn!(
                        "github.token is set in {CONFIG_FILE}, use GITHUB_ACCESS_TOKEN in production"
                    );
                }
                cfg
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No {CONFIG_FILE} found, using defaults");
                Self::default()
            },
            Err(source) => {
                return Err(ConfigError::Read {
                    path: CONFIG_FILE.to_string(),
                    source,
                });
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Apply overrides from `lookup` (normally `std::env::var`). Empty values
    /// are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("GITHUB_ACCESS_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(base) = get("NOTISWEEP_GITHUB_API") {
            self.github.api_base = base;
        }
        if let Some(keyword) = get("KEYWORD") {
            self.sweep.keyword = keyword;
        }
        if let Some(port) = get("PORT") {
            self.port = parse_env("PORT", port, |v| v.trim().parse().ok())?;
        }
        if let Some(env) = get("APP_ENV") {
            self.environment = env;
        }
        if let Some(mute) = get("NOTISWEEP_MUTE") {
            self.sweep.mute_repositories = parse_env("NOTISWEEP_MUTE", mute, parse_bool)?;
        }
        if let Some(delay) = get("NOTISWEEP_DELAY_MS") {
            self.sweep.delay_ms =
                parse_env("NOTISWEEP_DELAY_MS", delay, |v| v.trim().parse().ok())?;
        }
        if let Some(policy) = get("NOTISWEEP_ON_ITEM_ERROR") {
            self.sweep.on_item_error =
                parse_env("NOTISWEEP_ON_ITEM_ERROR", policy, |v| v.parse().ok())?;
        }
        if let Some(cron) = get("NOTISWEEP_SCHEDULE") {
            self.schedule.cron = cron;
        }
        if let Some(mode) = get("NOTISWEEP_RUN_MODE") {
            self.schedule.run_mode =
                parse_env("NOTISWEEP_RUN_MODE", mode, |v| v.parse().ok())?;
        }

        Ok(())
    }

    /// Reject configurations the sweeper cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github.token.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingToken);
        }
        if self.sweep.keyword.is_empty() {
            return Err(ConfigError::EmptyKeyword);
        }
        self.schedule()?;
        let addr = self.listen_addr();
        if addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(addr));
        }
        if self.sweep.delay_ms == 0 {
            tracing::warn!("sweep.delay_ms is 0, writes will not be spaced out");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION
    }

    /// JSON log lines in production, whether set by `APP_ENV` or the file.
    pub fn json_logs(&self) -> bool {
        self.is_production()
    }

    pub fn schedule(&self) -> Result<HourlySchedule, ConfigError> {
        Ok(self.schedule.cron.parse()?)
    }

    pub fn github_client_config(&self) -> Result<GitHubClientConfig, ConfigError> {
        let token = self.github.token.clone().ok_or(ConfigError::MissingToken)?;
        Ok(GitHubClientConfig {
            timeout_secs: self.github.timeout_secs,
            ..GitHubClientConfig::new(token).with_api_base(&self.github.api_base)
        })
    }

    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            mute_repositories: self.sweep.mute_repositories,
            item_delay: Duration::from_millis(self.sweep.delay_ms),
            on_item_error: self.sweep.on_item_error,
            show_progress: !self.is_production(),
        }
    }
}

fn parse_env<T>(
    var: &'static str,
    value: String,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    parse(&value).ok_or(ConfigError::InvalidEnv { var, value })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
