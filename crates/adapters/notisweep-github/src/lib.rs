pub mod client;
pub mod config;
pub mod error;
pub mod link;

pub use client::GitHubClient;
pub use config::GitHubClientConfig;
pub use error::GitHubError;
