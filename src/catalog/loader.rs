use crate::catalog::models::{Catalog, TimelinePrice};
use crate::catalog::store::CatalogStore;
use crate::catalog::CatalogError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Display rank for timeline labels, most urgent first
const TIMELINE_PRIORITY: &[(&str, u32)] = &[
    ("urgent", 1),
    ("short", 2),
    ("standard", 3),
    ("flexible", 4),
    ("long", 5),
];

/// Rank for labels outside the priority map
const UNRANKED_TIMELINE: u32 = 99;

/// Urgency rank of a timeline label (case-insensitive)
pub fn timeline_priority(timeline_type: &str) -> u32 {
    TIMELINE_PRIORITY
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(timeline_type.trim()))
        .map(|(_, rank)| *rank)
        .unwrap_or(UNRANKED_TIMELINE)
}

/// Stable re-sort by urgency; ties keep creation order
fn sort_timelines(timelines: &mut [TimelinePrice]) {
    timelines.sort_by_key(|t| timeline_priority(&t.timeline_type));
}

/// Loads the full active catalog from a store
#[derive(Clone)]
pub struct CatalogLoader {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
}

impl CatalogLoader {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Fetch all five collections in parallel.
    ///
    /// Any failed fetch (or the timeout elapsing) fails the whole load; partial
    /// results are discarded. A load that succeeds with an empty required
    /// section returns [`CatalogError::Incomplete`].
    pub async fn load(&self) -> Result<Catalog, CatalogError> {
        let fetch = async {
            tokio::try_join!(
                self.store.project_types(),
                self.store.feature_prices(),
                self.store.page_prices(),
                self.store.timeline_prices(),
                self.store.complexity_prices(),
            )
        };

        let (project_types, features, pages, mut timelines, complexities) =
            match tokio::time::timeout(self.timeout, fetch).await {
                Ok(Ok(sections)) => sections,
                Ok(Err(e)) => {
                    error!(error = %e, "Failed to load pricing data");
                    return Err(match e {
                        CatalogError::Load(msg) => CatalogError::Load(msg),
                        other => CatalogError::Load(other.to_string()),
                    });
                }
                Err(_) => {
                    error!(timeout = ?self.timeout, "Pricing data load timed out");
                    return Err(CatalogError::Load(format!(
                        "timed out after {:?}",
                        self.timeout
                    )));
                }
            };

        sort_timelines(&mut timelines);

        let catalog = Catalog {
            project_types,
            features,
            pages,
            timelines,
            complexities,
        };

        let missing = catalog.missing_sections();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Price catalog incomplete");
            return Err(CatalogError::Incomplete { missing });
        }

        info!(
            project_types = catalog.project_types.len(),
            features = catalog.features.len(),
            pages = catalog.pages.len(),
            timelines = catalog.timelines.len(),
            complexities = catalog.complexities.len(),
            "Loaded price catalog"
        );

        Ok(catalog)
    }

    /// Like [`load`](Self::load), but gives up as soon as `cancel` flips to
    /// `true` or its sender is dropped.
    pub async fn load_until(
        &self,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Catalog, CatalogError> {
        if *cancel.borrow() {
            return Err(CatalogError::Cancelled);
        }

        tokio::select! {
            result = self.load() => result,
            _ = cancelled(&mut cancel) => {
                info!("Catalog load cancelled by teardown");
                Err(CatalogError::Cancelled)
            }
        }
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender dropped: the owner is gone
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::{ComplexityPrice, FeaturePrice, PagePrice, ProjectType};
    use crate::catalog::store::InMemoryCatalogStore;
    use crate::catalog::CatalogSection;
    use async_trait::async_trait;

    fn timeline(id: i64, label: &str, created_at: i64) -> TimelinePrice {
        TimelinePrice {
            id,
            timeline_type: label.to_string(),
            description: None,
            multiplier: 1.0,
            is_active: true,
            created_at,
        }
    }

    fn full_catalog() -> Catalog {
        Catalog {
            project_types: vec![ProjectType {
                id: 1,
                name: "Company Site".to_string(),
                description: None,
                base_price: 5_000_000,
                is_active: true,
                created_at: 0,
            }],
            features: vec![],
            pages: vec![PagePrice {
                id: 2,
                page_count: 1,
                price_per_page: 300_000,
                is_active: true,
                created_at: 0,
            }],
            timelines: vec![
                timeline(3, "Long", 1),
                timeline(4, "Someday", 2),
                timeline(5, "Urgent", 3),
                timeline(6, "Short", 4),
            ],
            complexities: vec![ComplexityPrice {
                id: 7,
                label: "Medium".to_string(),
                description: None,
                multiplier: 1.1,
                is_active: true,
                created_at: 0,
            }],
        }
    }

    struct FailingStore;

    #[async_trait]
    impl CatalogStore for FailingStore {
        async fn project_types(&self) -> Result<Vec<ProjectType>, CatalogError> {
            Ok(vec![])
        }
        async fn feature_prices(&self) -> Result<Vec<FeaturePrice>, CatalogError> {
            Err(CatalogError::Load("feature_prices unavailable".to_string()))
        }
        async fn page_prices(&self) -> Result<Vec<PagePrice>, CatalogError> {
            Ok(vec![])
        }
        async fn timeline_prices(&self) -> Result<Vec<TimelinePrice>, CatalogError> {
            Ok(vec![])
        }
        async fn complexity_prices(&self) -> Result<Vec<ComplexityPrice>, CatalogError> {
            Ok(vec![])
        }
    }

    /// Never answers the project type query
    struct HangingStore;

    #[async_trait]
    impl CatalogStore for HangingStore {
        async fn project_types(&self) -> Result<Vec<ProjectType>, CatalogError> {
            std::future::pending().await
        }
        async fn feature_prices(&self) -> Result<Vec<FeaturePrice>, CatalogError> {
            Ok(vec![])
        }
        async fn page_prices(&self) -> Result<Vec<PagePrice>, CatalogError> {
            Ok(vec![])
        }
        async fn timeline_prices(&self) -> Result<Vec<TimelinePrice>, CatalogError> {
            Ok(vec![])
        }
        async fn complexity_prices(&self) -> Result<Vec<ComplexityPrice>, CatalogError> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_timeline_priority() {
        assert_eq!(timeline_priority("Urgent"), 1);
        assert_eq!(timeline_priority(" short "), 2);
        assert_eq!(timeline_priority("long"), 5);
        assert_eq!(timeline_priority("next quarter"), 99);
    }

    #[tokio::test]
    async fn test_load_sorts_timelines_by_urgency() {
        let loader = CatalogLoader::new(
            Arc::new(InMemoryCatalogStore::new(full_catalog())),
            Duration::from_secs(5),
        );
        let catalog = loader.load().await.unwrap();

        let labels: Vec<_> = catalog
            .timelines
            .iter()
            .map(|t| t.timeline_type.as_str())
            .collect();
        assert_eq!(labels, vec!["Urgent", "Short", "Long", "Someday"]);
    }

    #[tokio::test]
    async fn test_load_is_all_or_nothing() {
        let loader = CatalogLoader::new(Arc::new(FailingStore), Duration::from_secs(5));
        match loader.load().await {
            Err(CatalogError::Load(msg)) => assert!(msg.contains("feature_prices")),
            other => panic!("expected load error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_reports_incomplete_catalog() {
        let mut catalog = full_catalog();
        catalog.complexities.clear();
        catalog.pages.clear();
        let loader = CatalogLoader::new(
            Arc::new(InMemoryCatalogStore::new(catalog)),
            Duration::from_secs(5),
        );

        match loader.load().await {
            Err(CatalogError::Incomplete { missing }) => {
                assert_eq!(missing, vec![CatalogSection::Pages, CatalogSection::Complexities]);
            }
            other => panic!("expected incomplete error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inactive_rows_do_not_count() {
        let mut catalog = full_catalog();
        catalog.project_types[0].is_active = false;
        let loader = CatalogLoader::new(
            Arc::new(InMemoryCatalogStore::new(catalog)),
            Duration::from_secs(5),
        );

        assert!(matches!(
            loader.load().await,
            Err(CatalogError::Incomplete { missing }) if missing == vec![CatalogSection::ProjectTypes]
        ));
    }

    #[tokio::test]
    async fn test_load_times_out() {
        let loader = CatalogLoader::new(Arc::new(HangingStore), Duration::from_millis(50));
        assert!(matches!(loader.load().await, Err(CatalogError::Load(msg)) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_load_until_cancelled() {
        let loader = CatalogLoader::new(Arc::new(HangingStore), Duration::from_secs(60));
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let task = tokio::spawn(async move { loader.load_until(cancel_rx).await });
        cancel_tx.send(true).unwrap();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(CatalogError::Cancelled)));
    }

    #[tokio::test]
    async fn test_load_until_sender_dropped() {
        let loader = CatalogLoader::new(Arc::new(HangingStore), Duration::from_secs(60));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        drop(cancel_tx);

        assert!(matches!(
            loader.load_until(cancel_rx).await,
            Err(CatalogError::Cancelled)
        ));
    }
}
