use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use agency_estimator::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.get_command();

    if let cli::Commands::Version = command {
        println!("Agency Estimator v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cfg = config::load_config(&args.config)?;
    init_tracing(&cfg.server.log_level, &cfg.server.log_format);

    match command {
        cli::Commands::Serve => commands::serve::execute(cfg).await?,
        cli::Commands::Check => commands::check::execute(&args.config, &cfg),
        cli::Commands::Catalog { action } => match action {
            cli::CatalogCommands::Import { file, force } => {
                commands::catalog::import(&cfg, &file, force).await?
            }
            cli::CatalogCommands::Show => commands::catalog::show(&cfg).await?,
        },
        cli::Commands::Estimate(estimate_args) => {
            commands::estimate::execute(&cfg, estimate_args).await?
        }
        cli::Commands::Version => {}
    }

    Ok(())
}
