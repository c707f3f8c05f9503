use agency_estimator::config::Config;
use colored::Colorize;
use std::path::Path;

/// Execute the check command
///
/// The config was already loaded and validated by the time this runs.
pub fn execute(path: &Path, cfg: &Config) {
    println!("{}", "✓ Configuration test successful".green());
    if !path.exists() {
        println!(
            "  {} {} not found, using defaults and environment",
            "note:".yellow(),
            path.display()
        );
    }
    println!();

    println!("{}", "Configuration Summary:".bold());
    println!("  {}: {}:{}", "Server".cyan(), cfg.server.host, cfg.server.port);
    println!("  {}: {}", "Log Level".cyan(), cfg.server.log_level);
    println!("  {}: {}", "Log Format".cyan(), cfg.server.log_format);
    println!("  {}: {}", "Database".cyan(), cfg.database.path);
    println!();

    println!("{}", "Catalog:".cyan());
    println!("    Load timeout: {}s", cfg.catalog.load_timeout_seconds);
    println!("    Page rate mode: {:?}", cfg.catalog.page_rate_mode);
    println!();

    println!("{}", "Handoff:".cyan());
    println!("    Consult URL: {}", cfg.handoff.consult_url);
    println!("    Locale: {}", cfg.handoff.locale);
    println!("    Currency: {}", cfg.handoff.currency);
    println!();

    println!("{}", "Sessions:".cyan());
    println!("    Idle timeout: {}s", cfg.sessions.idle_timeout_seconds);
    println!("    Cleanup interval: {}s", cfg.sessions.cleanup_interval_seconds);
}
