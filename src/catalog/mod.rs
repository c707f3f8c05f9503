pub mod import;
pub mod loader;
pub mod models;
pub mod store;

pub use import::{import_catalog, parse_catalog_document, read_catalog_file, CatalogDocument, ImportReport};
pub use loader::{timeline_priority, CatalogLoader};
pub use models::{
    Catalog, CatalogSection, ComplexityPrice, FeaturePrice, PagePrice, ProjectType, TimelinePrice,
};
pub use store::{CatalogStore, InMemoryCatalogStore, SqliteCatalogStore};

/// Errors raised while loading or importing the price catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// One of the parallel fetches failed or timed out
    #[error("failed to load pricing data: {0}")]
    Load(String),

    /// Fetch succeeded but required sections are empty
    #[error("price catalog is not configured yet (missing: {})", join_sections(.missing))]
    Incomplete { missing: Vec<CatalogSection> },

    /// The owning session was torn down before the load finished
    #[error("catalog load cancelled")]
    Cancelled,

    /// Catalog document failed validation
    #[error("invalid catalog document: {0}")]
    Invalid(String),

    /// Catalog document could not be read or parsed
    #[error("failed to parse catalog document: {0}")]
    Parse(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn join_sections(sections: &[CatalogSection]) -> String {
    sections
        .iter()
        .map(CatalogSection::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
