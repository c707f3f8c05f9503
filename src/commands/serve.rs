use agency_estimator::{config::Config, server};
use anyhow::Result;
use colored::Colorize;
use tracing::info;

/// Execute the serve command (blocks until shutdown)
pub async fn execute(cfg: Config) -> Result<()> {
    println!("{}", "Starting estimator server...".green());
    info!(
        database = %cfg.database.path,
        page_rate_mode = ?cfg.catalog.page_rate_mode,
        "Starting estimator"
    );

    server::start_server(cfg).await
}
