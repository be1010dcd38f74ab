use tracing_subscriber::EnvFilter;

use notisweep_server::config::ServerConfig;

#[tokio::main]
async fn main() {
    // Config loading logs through a temporary human-readable subscriber;
    // the global format depends on the loaded `environment`.
    let loaded = tracing::subscriber::with_default(
        tracing_subscriber::fmt().with_env_filter(env_filter()).finish(),
        || ServerConfig::load().and_then(|cfg| cfg.validate().map(|()| cfg)),
    );

    let config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(false);
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        },
    };

    init_tracing(config.json_logs());
    tracing::info!(environment = %config.environment, "notisweep starting");

    if let Err(e) = notisweep_server::run(config).await {
        tracing::error!(error = %e, "notisweep stopped");
        std::process::exit(1);
    }
}

/// `RUST_LOG` overrides the default `info` level.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(json: bool) {
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }
}
