use agency_estimator::{
    catalog::{read_catalog_file, Catalog, CatalogLoader, CatalogStore, InMemoryCatalogStore, SqliteCatalogStore},
    config::Config,
    db,
    estimator::{Handoff, PriceFormatter, Stepper},
};
use anyhow::{anyhow, Result};
use colored::Colorize;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tracing::warn;

use crate::cli::EstimateArgs;

/// Execute the estimate command
pub async fn execute(cfg: &Config, args: EstimateArgs) -> Result<()> {
    let catalog = load_catalog(cfg, &args).await?;

    let project_type = catalog
        .project_type_by_name(&args.project_type)
        .ok_or_else(|| anyhow!("unknown project type '{}'", args.project_type))?
        .id;
    let timeline = catalog
        .timeline_by_name(&args.timeline)
        .ok_or_else(|| anyhow!("unknown timeline '{}'", args.timeline))?
        .id;
    let complexity = catalog
        .complexity_by_name(&args.complexity)
        .ok_or_else(|| anyhow!("unknown complexity '{}'", args.complexity))?
        .id;

    let mut features = Vec::with_capacity(args.features.len());
    for name in &args.features {
        match catalog.feature_by_name(name) {
            Some(f) => features.push(f.id),
            None => warn!(feature = %name, "Unknown feature, skipping"),
        }
    }

    let mut stepper = Stepper::new(Arc::new(catalog), cfg.catalog.page_rate_mode);
    stepper.select_project_type(project_type)?;
    stepper.set_pages(args.pages)?;
    stepper.set_features(features)?;
    stepper.select_timeline(timeline)?;
    stepper.select_complexity(complexity)?;
    let result = stepper.calculate()?.clone();

    let handoff = Handoff::new(
        url::Url::parse(&cfg.handoff.consult_url)?,
        PriceFormatter::new(cfg.handoff.locale, cfg.handoff.currency.clone()),
    );
    let display_price = handoff.display_price(&result);
    let consult_url = handoff.consult_link(&result);

    if args.json {
        let body = json!({
            "result": result,
            "display_price": display_price,
            "consult_url": consult_url.as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let money = handoff.formatter();
    let b = &result.breakdown;
    println!("{}", "Estimate".bold());
    println!("  {}: {}", "Project type".cyan(), result.project_type_name);
    println!("  {}: {}", "Pages".cyan(), result.pages);
    if result.feature_names.is_empty() {
        println!("  {}: {}", "Features".cyan(), "(none)".dimmed());
    } else {
        println!("  {}: {}", "Features".cyan(), result.feature_names.join(", "));
    }
    println!("  {}: {}", "Timeline".cyan(), result.timeline_label);
    println!("  {}: {}", "Complexity".cyan(), result.complexity_label);
    println!();
    println!("  Base price:   {}", money.format(b.base_price));
    println!(
        "  Pages:        {} ({} × {})",
        money.format(b.pages_cost),
        result.pages,
        money.format(b.page_rate)
    );
    println!("  Features:     {}", money.format(b.features_cost));
    println!("  Subtotal:     {}", money.format(b.subtotal));
    println!(
        "  Multipliers:  ×{} complexity, ×{} timeline",
        b.complexity_multiplier, b.timeline_multiplier
    );
    println!();
    println!("  {}: {}", "Estimated price".bold(), display_price.green().bold());
    println!("  {}: {}", "Consult".dimmed(), consult_url);

    Ok(())
}

async fn load_catalog(cfg: &Config, args: &EstimateArgs) -> Result<Catalog> {
    let timeout = Duration::from_secs(cfg.catalog.load_timeout_seconds);

    match &args.catalog {
        Some(path) => {
            let (_, document) = read_catalog_file(path).await?;
            let store: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalogStore::from_document(&document));
            Ok(CatalogLoader::new(store, timeout).load().await?)
        }
        None => {
            let pool = db::connect(&cfg.database).await?;
            let loader = CatalogLoader::new(Arc::new(SqliteCatalogStore::new(pool.clone())), timeout);
            let catalog = loader.load().await;
            pool.close().await;
            Ok(catalog?)
        }
    }
}
