use crate::catalog::store::SqliteCatalogStore;
use crate::catalog::CatalogError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Catalog document as maintained by the admin (TOML or JSON)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub project_types: Vec<ProjectTypeEntry>,
    #[serde(default)]
    pub features: Vec<FeatureEntry>,
    #[serde(default)]
    pub pages: Vec<PageEntry>,
    #[serde(default)]
    pub timelines: Vec<TimelineEntry>,
    #[serde(default)]
    pub complexities: Vec<ComplexityEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTypeEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_price: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEntry {
    pub page_count: i64,
    pub price_per_page: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timeline_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub multiplier: f64,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityEntry {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub multiplier: f64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Result of a catalog import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub project_types: usize,
    pub features: usize,
    pub pages: usize,
    pub timelines: usize,
    pub complexities: usize,
    /// True when the document hash matched the last import and nothing was written
    pub unchanged: bool,
    pub hash: String,
}

/// Parse a catalog document; `format` is `"toml"` or `"json"`
pub fn parse_catalog_document(content: &str, format: &str) -> Result<CatalogDocument, CatalogError> {
    let document: CatalogDocument = match format {
        "toml" => toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?,
        "json" => serde_json::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?,
        other => {
            return Err(CatalogError::Parse(format!(
                "unsupported catalog format: {}",
                other
            )))
        }
    };

    validate_document(&document)?;
    Ok(document)
}

/// Read a catalog file, picking the format from its extension.
///
/// Returns the raw content alongside the parsed document so callers can hash it.
pub async fn read_catalog_file(path: &Path) -> Result<(String, CatalogDocument), CatalogError> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => "json",
        Some("toml") | None => "toml",
        Some(other) => {
            return Err(CatalogError::Parse(format!(
                "unsupported catalog file extension: .{}",
                other
            )))
        }
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CatalogError::Parse(format!("{}: {}", path.display(), e)))?;
    let document = parse_catalog_document(&content, format)?;
    Ok((content, document))
}

/// Check prices, multipliers and natural-key uniqueness
pub fn validate_document(document: &CatalogDocument) -> Result<(), CatalogError> {
    let mut names = HashSet::new();
    for entry in &document.project_types {
        require_name(&entry.name, "project type")?;
        require_non_negative(entry.base_price, "base_price", &entry.name)?;
        if !names.insert(entry.name.to_lowercase()) {
            return Err(duplicate("project type", &entry.name));
        }
    }

    let mut names = HashSet::new();
    for entry in &document.features {
        require_name(&entry.name, "feature")?;
        require_non_negative(entry.price, "price", &entry.name)?;
        if !names.insert(entry.name.to_lowercase()) {
            return Err(duplicate("feature", &entry.name));
        }
    }

    let mut counts = HashSet::new();
    for entry in &document.pages {
        if entry.page_count < 1 {
            return Err(CatalogError::Invalid(format!(
                "page tier {}: page_count must be >= 1",
                entry.page_count
            )));
        }
        require_non_negative(entry.price_per_page, "price_per_page", &entry.page_count.to_string())?;
        if !counts.insert(entry.page_count) {
            return Err(duplicate("page tier", &entry.page_count.to_string()));
        }
    }

    let mut names = HashSet::new();
    for entry in &document.timelines {
        require_name(&entry.timeline_type, "timeline")?;
        require_multiplier(entry.multiplier, &entry.timeline_type)?;
        if !names.insert(entry.timeline_type.to_lowercase()) {
            return Err(duplicate("timeline", &entry.timeline_type));
        }
    }

    let mut names = HashSet::new();
    for entry in &document.complexities {
        require_name(&entry.label, "complexity")?;
        require_multiplier(entry.multiplier, &entry.label)?;
        if !names.insert(entry.label.to_lowercase()) {
            return Err(duplicate("complexity", &entry.label));
        }
    }

    Ok(())
}

fn require_name(name: &str, kind: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::Invalid(format!("{} name cannot be empty", kind)));
    }
    Ok(())
}

fn require_non_negative(value: i64, field: &str, owner: &str) -> Result<(), CatalogError> {
    if value < 0 {
        return Err(CatalogError::Invalid(format!(
            "'{}': {} must not be negative",
            owner, field
        )));
    }
    Ok(())
}

fn require_multiplier(value: f64, owner: &str) -> Result<(), CatalogError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CatalogError::Invalid(format!(
            "'{}': multiplier must be a finite non-negative number",
            owner
        )));
    }
    Ok(())
}

fn duplicate(kind: &str, key: &str) -> CatalogError {
    CatalogError::Invalid(format!("{} '{}' is duplicated", kind, key))
}

/// Calculate SHA256 hash of content
pub fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Import a parsed document into the store.
///
/// Skips the write when `content` hashes to the last imported hash, unless `force` is set.
pub async fn import_catalog(
    store: &SqliteCatalogStore,
    content: &str,
    document: &CatalogDocument,
    force: bool,
) -> Result<ImportReport, CatalogError> {
    let hash = calculate_hash(content);

    let mut report = ImportReport {
        project_types: document.project_types.len(),
        features: document.features.len(),
        pages: document.pages.len(),
        timelines: document.timelines.len(),
        complexities: document.complexities.len(),
        unchanged: false,
        hash: hash.clone(),
    };

    if !force {
        if let Some(last) = store.last_import_hash().await? {
            if last == hash {
                info!("Catalog document unchanged (no import needed)");
                report.unchanged = true;
                return Ok(report);
            }
        }
    }

    store.apply_document(document, &hash).await?;
    info!(
        project_types = report.project_types,
        features = report.features,
        pages = report.pages,
        timelines = report.timelines,
        complexities = report.complexities,
        "Catalog document imported"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_document_defaults_active() {
        let doc = parse_catalog_document(
            r#"{"features": [{"name": "Blog", "price": 1000000}]}"#,
            "json",
        )
        .unwrap();
        assert_eq!(doc.features.len(), 1);
        assert!(doc.features[0].active);
        assert!(doc.project_types.is_empty());
    }

    #[test]
    fn test_rejects_negative_price() {
        let result = parse_catalog_document(
            r#"
            [[features]]
            name = "Blog"
            price = -5
            "#,
            "toml",
        );
        assert!(matches!(result, Err(CatalogError::Invalid(msg)) if msg.contains("must not be negative")));
    }

    #[test]
    fn test_rejects_duplicate_timeline_case_insensitive() {
        let result = parse_catalog_document(
            r#"
            [[timelines]]
            timeline_type = "Short"
            multiplier = 1.2

            [[timelines]]
            timeline_type = "short"
            multiplier = 1.3
            "#,
            "toml",
        );
        assert!(matches!(result, Err(CatalogError::Invalid(msg)) if msg.contains("duplicated")));
    }

    #[test]
    fn test_rejects_zero_page_count() {
        let result = parse_catalog_document(
            r#"
            [[pages]]
            page_count = 0
            price_per_page = 100
            "#,
            "toml",
        );
        assert!(matches!(result, Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            parse_catalog_document("", "yaml"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_import_skips_unchanged_content() {
        let pool = crate::db::connect_in_memory().await.unwrap();
        let store = SqliteCatalogStore::new(pool);
        let content = r#"
            [[project_types]]
            name = "Company Site"
            base_price = 5000000
        "#;
        let doc = parse_catalog_document(content, "toml").unwrap();

        let first = import_catalog(&store, content, &doc, false).await.unwrap();
        assert!(!first.unchanged);
        assert_eq!(first.project_types, 1);

        let second = import_catalog(&store, content, &doc, false).await.unwrap();
        assert!(second.unchanged);

        let forced = import_catalog(&store, content, &doc, true).await.unwrap();
        assert!(!forced.unchanged);
    }

    #[tokio::test]
    async fn test_read_catalog_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        tokio::fs::write(&path, r#"{"complexities": [{"label": "Simple", "multiplier": 1.0}]}"#)
            .await
            .unwrap();

        let (_content, doc) = read_catalog_file(&path).await.unwrap();
        assert_eq!(doc.complexities[0].label, "Simple");

        let bad = dir.path().join("catalog.csv");
        tokio::fs::write(&bad, "x").await.unwrap();
        assert!(matches!(read_catalog_file(&bad).await, Err(CatalogError::Parse(_))));
    }
}
