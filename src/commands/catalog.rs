use agency_estimator::{
    catalog::{import_catalog, read_catalog_file, CatalogLoader, SqliteCatalogStore},
    config::Config,
    db,
    estimator::PriceFormatter,
};
use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::{path::Path, sync::Arc, time::Duration};
use tracing::info;

/// Import a catalog document into the configured database
pub async fn import(cfg: &Config, file: &Path, force: bool) -> Result<()> {
    info!(file = %file.display(), force, "Importing catalog document");

    let (content, document) = read_catalog_file(file).await?;
    let pool = db::connect(&cfg.database).await?;
    let store = SqliteCatalogStore::new(pool.clone());

    let report = import_catalog(&store, &content, &document, force).await?;
    pool.close().await;

    if report.unchanged {
        println!(
            "{}",
            "Catalog unchanged since last import (use --force to re-apply)".yellow()
        );
        return Ok(());
    }

    println!("{}", "✓ Catalog imported".green());
    println!("  Project types: {}", report.project_types);
    println!("  Features:      {}", report.features);
    println!("  Page tiers:    {}", report.pages);
    println!("  Timelines:     {}", report.timelines);
    println!("  Complexities:  {}", report.complexities);
    println!("  {}: {}", "Hash".dimmed(), &report.hash[..12.min(report.hash.len())]);

    Ok(())
}

/// Print the active catalog the way the estimator sees it
pub async fn show(cfg: &Config) -> Result<()> {
    let pool = db::connect(&cfg.database).await?;
    let loader = CatalogLoader::new(
        Arc::new(SqliteCatalogStore::new(pool.clone())),
        Duration::from_secs(cfg.catalog.load_timeout_seconds),
    );
    let catalog = loader.load().await;
    pool.close().await;
    let catalog = catalog?;

    let money = PriceFormatter::new(cfg.handoff.locale, cfg.handoff.currency.clone());

    println!("{}", "Project Types".bold());
    let mut table = new_table(&["ID", "Name", "Base Price", "Description"]);
    for p in &catalog.project_types {
        table.add_row(vec![
            Cell::new(p.id),
            Cell::new(&p.name),
            Cell::new(money.format(p.base_price)).fg(Color::Green),
            Cell::new(p.description.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}\n");

    println!("{}", "Features".bold());
    if catalog.features.is_empty() {
        println!("  {}\n", "(none)".dimmed());
    } else {
        let mut table = new_table(&["ID", "Name", "Price", "Description"]);
        for f in &catalog.features {
            table.add_row(vec![
                Cell::new(f.id),
                Cell::new(&f.name),
                Cell::new(money.format(f.price)).fg(Color::Green),
                Cell::new(f.description.as_deref().unwrap_or("")),
            ]);
        }
        println!("{table}\n");
    }

    println!("{}", "Page Rates".bold());
    let mut table = new_table(&["ID", "From Pages", "Price / Page"]);
    for p in &catalog.pages {
        table.add_row(vec![
            Cell::new(p.id),
            Cell::new(p.page_count),
            Cell::new(money.format(p.price_per_page)).fg(Color::Green),
        ]);
    }
    println!("{table}\n");

    println!("{}", "Timelines".bold());
    let mut table = new_table(&["ID", "Type", "Multiplier", "Description"]);
    for t in &catalog.timelines {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.timeline_type),
            Cell::new(format!("×{}", t.multiplier)).fg(Color::Cyan),
            Cell::new(t.description.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}\n");

    println!("{}", "Complexity".bold());
    let mut table = new_table(&["ID", "Label", "Multiplier", "Description"]);
    for c in &catalog.complexities {
        table.add_row(vec![
            Cell::new(c.id),
            Cell::new(&c.label),
            Cell::new(format!("×{}", c.multiplier)).fg(Color::Cyan),
            Cell::new(c.description.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");

    Ok(())
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Yellow)));
    table
}
