use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::estimator::PageRateMode;
use crate::i18n::Locale;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub handoff: HandoffConfig,
    #[serde(default)]
    pub i18n: I18nConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database path (default: "./data/catalog.db")
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Upper bound for loading all catalog tables (default: 10)
    #[serde(default = "default_load_timeout_seconds")]
    pub load_timeout_seconds: u64,

    /// Per-page rate selection (default: flat_first_row)
    #[serde(default)]
    pub page_rate_mode: PageRateMode,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            load_timeout_seconds: default_load_timeout_seconds(),
            page_rate_mode: PageRateMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandoffConfig {
    /// Lead-capture page that receives the estimate
    #[serde(default = "default_consult_url")]
    pub consult_url: String,
    #[serde(default)]
    pub locale: Locale,
    /// ISO 4217 code (default: VND)
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            consult_url: default_consult_url(),
            locale: Locale::default(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I18nConfig {
    /// Translation lookup timeout in milliseconds (default: 500)
    #[serde(default = "default_i18n_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_i18n_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionsConfig {
    /// Drop sessions idle for longer than this (default: 1800)
    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,
    /// How often the idle sweep runs (default: 300)
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_idle_timeout_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_database_path() -> String {
    "./data/catalog.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_load_timeout_seconds() -> u64 {
    10
}

fn default_consult_url() -> String {
    "http://localhost:3000/contact".to_string()
}

fn default_currency() -> String {
    "VND".to_string()
}

fn default_i18n_timeout_ms() -> u64 {
    500
}

fn default_idle_timeout_seconds() -> u64 {
    1800
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

/// Load configuration from `path` (optional) overlaid with `ESTIMATOR__*` env vars
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("ESTIMATOR").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.host.trim().is_empty() {
        anyhow::bail!("server.host cannot be empty");
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("server.log_format must be 'text' or 'json', got '{}'", other),
    }

    if cfg.database.path.trim().is_empty() {
        anyhow::bail!("database.path cannot be empty");
    }
    if cfg.database.max_connections == 0 {
        anyhow::bail!("database.max_connections must be >= 1");
    }

    if cfg.catalog.load_timeout_seconds == 0 {
        anyhow::bail!("catalog.load_timeout_seconds must be >= 1");
    }

    let url = url::Url::parse(&cfg.handoff.consult_url)
        .map_err(|e| anyhow::anyhow!("handoff.consult_url is not a valid URL: {}", e))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("handoff.consult_url must be an absolute http(s) URL");
    }

    let currency = cfg.handoff.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        anyhow::bail!("handoff.currency must be a 3-letter ISO 4217 code");
    }

    if cfg.i18n.timeout_ms == 0 {
        anyhow::bail!("i18n.timeout_ms must be >= 1");
    }

    if cfg.sessions.idle_timeout_seconds == 0 || cfg.sessions.cleanup_interval_seconds == 0 {
        anyhow::bail!("sessions timeouts must be >= 1 second");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.catalog.page_rate_mode, PageRateMode::FlatFirstRow);
        assert_eq!(cfg.handoff.locale, Locale::Vi);
    }

    #[test]
    fn test_validate_rejects_bad_consult_url() {
        let mut cfg = Config::default();
        cfg.handoff.consult_url = "not a url".to_string();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("handoff.consult_url"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut cfg = Config::default();
        cfg.catalog.load_timeout_seconds = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_currency() {
        let mut cfg = Config::default();
        cfg.handoff.currency = "dollars".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [server]
            port = 9090

            [catalog]
            page_rate_mode = "tiered"

            [handoff]
            consult_url = "https://agency.example/contact"
            locale = "en"
            currency = "USD"
            "#
        )
        .unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.catalog.page_rate_mode, PageRateMode::Tiered);
        assert_eq!(cfg.handoff.locale, Locale::En);
        assert_eq!(cfg.i18n.timeout_ms, 500);
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let cfg = load_config(Path::new("/nonexistent/estimator-config.toml")).unwrap();
        assert_eq!(cfg.server.port, 8080);
    }
}
