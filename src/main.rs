use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use healthdash::config::DashConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let config = DashConfig::from_env()?;
    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "healthdash",
        "healthdash starting: RUST_LOG='{}', addr={}, data_dir='{}', pages={}",
        rust_log,
        config.addr(),
        config.data_dir.display(),
        config.pages_file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<built-in>".to_string())
    );

    healthdash::server::run(config).await
}
