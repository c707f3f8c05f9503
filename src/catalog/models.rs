use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Project type with its base price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProjectType {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub base_price: i64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Flat-priced feature add-on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FeaturePrice {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Per-page rate tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PagePrice {
    pub id: i64,
    pub page_count: i64,
    pub price_per_page: i64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Delivery timeline bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TimelinePrice {
    pub id: i64,
    pub timeline_type: String,
    pub description: Option<String>,
    pub multiplier: f64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Complexity bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ComplexityPrice {
    pub id: i64,
    pub label: String,
    pub description: Option<String>,
    pub multiplier: f64,
    pub is_active: bool,
    pub created_at: i64,
}

/// The five catalog collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSection {
    ProjectTypes,
    Features,
    Pages,
    Timelines,
    Complexities,
}

impl CatalogSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectTypes => "project_types",
            Self::Features => "features",
            Self::Pages => "pages",
            Self::Timelines => "timelines",
            Self::Complexities => "complexities",
        }
    }
}

impl fmt::Display for CatalogSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the active price catalog.
///
/// Loaded once per session and never mutated afterwards; share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub project_types: Vec<ProjectType>,
    pub features: Vec<FeaturePrice>,
    pub pages: Vec<PagePrice>,
    pub timelines: Vec<TimelinePrice>,
    pub complexities: Vec<ComplexityPrice>,
}

impl Catalog {
    pub fn project_type(&self, id: i64) -> Option<&ProjectType> {
        self.project_types.iter().find(|p| p.id == id)
    }

    pub fn feature(&self, id: i64) -> Option<&FeaturePrice> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn timeline(&self, id: i64) -> Option<&TimelinePrice> {
        self.timelines.iter().find(|t| t.id == id)
    }

    pub fn complexity(&self, id: i64) -> Option<&ComplexityPrice> {
        self.complexities.iter().find(|c| c.id == id)
    }

    pub fn project_type_by_name(&self, name: &str) -> Option<&ProjectType> {
        self.project_types
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn feature_by_name(&self, name: &str) -> Option<&FeaturePrice> {
        self.features.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn timeline_by_name(&self, name: &str) -> Option<&TimelinePrice> {
        self.timelines
            .iter()
            .find(|t| t.timeline_type.eq_ignore_ascii_case(name))
    }

    pub fn complexity_by_name(&self, name: &str) -> Option<&ComplexityPrice> {
        self.complexities
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(name))
    }

    /// Sections that must be non-empty before an estimate can be computed.
    ///
    /// Features are optional and never reported.
    pub fn missing_sections(&self) -> Vec<CatalogSection> {
        let mut missing = Vec::new();
        if self.project_types.is_empty() {
            missing.push(CatalogSection::ProjectTypes);
        }
        if self.pages.is_empty() {
            missing.push(CatalogSection::Pages);
        }
        if self.timelines.is_empty() {
            missing.push(CatalogSection::Timelines);
        }
        if self.complexities.is_empty() {
            missing.push(CatalogSection::Complexities);
        }
        missing
    }
}
