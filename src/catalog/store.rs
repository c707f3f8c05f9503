use crate::catalog::import::CatalogDocument;
use crate::catalog::models::{
    Catalog, ComplexityPrice, FeaturePrice, PagePrice, ProjectType, TimelinePrice,
};
use crate::catalog::CatalogError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

const LAST_CATALOG_HASH_KEY: &str = "last_catalog_hash";

/// Read access to the admin-maintained price catalog.
///
/// Every fetch returns active rows only. Page prices come back ordered by
/// ascending `page_count`, everything else by creation time.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn project_types(&self) -> Result<Vec<ProjectType>, CatalogError>;
    async fn feature_prices(&self) -> Result<Vec<FeaturePrice>, CatalogError>;
    async fn page_prices(&self) -> Result<Vec<PagePrice>, CatalogError>;
    async fn timeline_prices(&self) -> Result<Vec<TimelinePrice>, CatalogError>;
    async fn complexity_prices(&self) -> Result<Vec<ComplexityPrice>, CatalogError>;
}

// ============================================================================
// SQLite store
// ============================================================================

/// Catalog store backed by the SQLite tables in `migrations/`
#[derive(Clone)]
pub struct SqliteCatalogStore {
    db_pool: SqlitePool,
}

impl SqliteCatalogStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db_pool
    }

    /// Hash of the last imported catalog document, if any
    pub async fn last_import_hash(&self) -> Result<Option<String>, CatalogError> {
        let row = sqlx::query_as::<_, (String,)>(
            "SELECT value FROM catalog_metadata WHERE key = ?",
        )
        .bind(LAST_CATALOG_HASH_KEY)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(row.and_then(|(value,)| if value.is_empty() { None } else { Some(value) }))
    }

    /// Upsert every entry of a catalog document and record its hash.
    ///
    /// Rows are matched by natural key (name, page count, timeline type, label).
    /// Rows absent from the document are left untouched.
    pub async fn apply_document(
        &self,
        document: &CatalogDocument,
        hash: &str,
    ) -> Result<(), CatalogError> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = self.db_pool.begin().await?;

        for entry in &document.project_types {
            sqlx::query(
                r#"
                INSERT INTO project_types (name, description, base_price, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    description = excluded.description,
                    base_price = excluded.base_price,
                    is_active = excluded.is_active,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&entry.name)
            .bind(&entry.description)
            .bind(entry.base_price)
            .bind(entry.active)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &document.features {
            sqlx::query(
                r#"
                INSERT INTO feature_prices (name, description, price, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    description = excluded.description,
                    price = excluded.price,
                    is_active = excluded.is_active,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&entry.name)
            .bind(&entry.description)
            .bind(entry.price)
            .bind(entry.active)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &document.pages {
            sqlx::query(
                r#"
                INSERT INTO page_prices (page_count, price_per_page, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(page_count) DO UPDATE SET
                    price_per_page = excluded.price_per_page,
                    is_active = excluded.is_active,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(entry.page_count)
            .bind(entry.price_per_page)
            .bind(entry.active)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &document.timelines {
            sqlx::query(
                r#"
                INSERT INTO timeline_prices (timeline_type, description, multiplier, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(timeline_type) DO UPDATE SET
                    description = excluded.description,
                    multiplier = excluded.multiplier,
                    is_active = excluded.is_active,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&entry.timeline_type)
            .bind(&entry.description)
            .bind(entry.multiplier)
            .bind(entry.active)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &document.complexities {
            sqlx::query(
                r#"
                INSERT INTO complexity_prices (label, description, multiplier, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(label) DO UPDATE SET
                    description = excluded.description,
                    multiplier = excluded.multiplier,
                    is_active = excluded.is_active,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&entry.label)
            .bind(&entry.description)
            .bind(entry.multiplier)
            .bind(entry.active)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO catalog_metadata (key, value, updated_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(LAST_CATALOG_HASH_KEY)
        .bind(hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(hash = %hash, "Catalog document applied");
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn project_types(&self) -> Result<Vec<ProjectType>, CatalogError> {
        Ok(sqlx::query_as::<_, ProjectType>(
            r#"
            SELECT id, name, description, base_price, is_active, created_at
            FROM project_types
            WHERE is_active = 1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?)
    }

    async fn feature_prices(&self) -> Result<Vec<FeaturePrice>, CatalogError> {
        Ok(sqlx::query_as::<_, FeaturePrice>(
            r#"
            SELECT id, name, description, price, is_active, created_at
            FROM feature_prices
            WHERE is_active = 1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?)
    }

    async fn page_prices(&self) -> Result<Vec<PagePrice>, CatalogError> {
        Ok(sqlx::query_as::<_, PagePrice>(
            r#"
            SELECT id, page_count, price_per_page, is_active, created_at
            FROM page_prices
            WHERE is_active = 1
            ORDER BY page_count ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?)
    }

    async fn timeline_prices(&self) -> Result<Vec<TimelinePrice>, CatalogError> {
        Ok(sqlx::query_as::<_, TimelinePrice>(
            r#"
            SELECT id, timeline_type, description, multiplier, is_active, created_at
            FROM timeline_prices
            WHERE is_active = 1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?)
    }

    async fn complexity_prices(&self) -> Result<Vec<ComplexityPrice>, CatalogError> {
        Ok(sqlx::query_as::<_, ComplexityPrice>(
            r#"
            SELECT id, label, description, multiplier, is_active, created_at
            FROM complexity_prices
            WHERE is_active = 1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Fixed catalog held in memory, used for file-based estimates and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    rows: Catalog,
}

impl InMemoryCatalogStore {
    /// Wrap raw rows; inactive rows are kept and filtered on fetch
    pub fn new(rows: Catalog) -> Self {
        Self { rows }
    }

    /// Build rows from a catalog document, assigning ids in document order
    pub fn from_document(document: &CatalogDocument) -> Self {
        let mut next_id = 0i64;
        let mut id = || {
            next_id += 1;
            next_id
        };

        let project_types = document
            .project_types
            .iter()
            .map(|e| ProjectType {
                id: id(),
                name: e.name.clone(),
                description: e.description.clone(),
                base_price: e.base_price,
                is_active: e.active,
                created_at: 0,
            })
            .collect();
        let features = document
            .features
            .iter()
            .map(|e| FeaturePrice {
                id: id(),
                name: e.name.clone(),
                description: e.description.clone(),
                price: e.price,
                is_active: e.active,
                created_at: 0,
            })
            .collect();
        let pages = document
            .pages
            .iter()
            .map(|e| PagePrice {
                id: id(),
                page_count: e.page_count,
                price_per_page: e.price_per_page,
                is_active: e.active,
                created_at: 0,
            })
            .collect();
        let timelines = document
            .timelines
            .iter()
            .map(|e| TimelinePrice {
                id: id(),
                timeline_type: e.timeline_type.clone(),
                description: e.description.clone(),
                multiplier: e.multiplier,
                is_active: e.active,
                created_at: 0,
            })
            .collect();
        let complexities = document
            .complexities
            .iter()
            .map(|e| ComplexityPrice {
                id: id(),
                label: e.label.clone(),
                description: e.description.clone(),
                multiplier: e.multiplier,
                is_active: e.active,
                created_at: 0,
            })
            .collect();

        Self::new(Catalog {
            project_types,
            features,
            pages,
            timelines,
            complexities,
        })
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn project_types(&self) -> Result<Vec<ProjectType>, CatalogError> {
        let mut rows: Vec<_> = self
            .rows
            .project_types
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }

    async fn feature_prices(&self) -> Result<Vec<FeaturePrice>, CatalogError> {
        let mut rows: Vec<_> = self
            .rows
            .features
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }

    async fn page_prices(&self) -> Result<Vec<PagePrice>, CatalogError> {
        let mut rows: Vec<_> = self
            .rows
            .pages
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.page_count);
        Ok(rows)
    }

    async fn timeline_prices(&self) -> Result<Vec<TimelinePrice>, CatalogError> {
        let mut rows: Vec<_> = self
            .rows
            .timelines
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }

    async fn complexity_prices(&self) -> Result<Vec<ComplexityPrice>, CatalogError> {
        let mut rows: Vec<_> = self
            .rows
            .complexities
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }
}
