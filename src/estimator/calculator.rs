use crate::catalog::{Catalog, PagePrice};
use crate::estimator::selection::{Selection, Step};
use crate::estimator::EstimateError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How the per-page rate is picked from the page price table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageRateMode {
    /// First active row (lowest page count) applies to every page count
    #[default]
    FlatFirstRow,
    /// Bracketed: each tier's rate covers the pages from its `page_count` up
    /// to the next tier. The smallest tier also covers everything below it.
    Tiered,
}

/// Intermediate values of a computed estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: i64,
    pub page_rate: i64,
    pub pages_cost: i64,
    pub features_cost: i64,
    pub subtotal: i64,
    pub complexity_multiplier: f64,
    pub timeline_multiplier: f64,
}

/// A computed estimate with the selection resolved against the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub project_type_id: i64,
    pub project_type_name: String,
    pub pages: i64,
    pub feature_ids: Vec<i64>,
    pub feature_names: Vec<String>,
    /// Selected ids with no matching catalog row; priced at zero
    pub skipped_feature_ids: Vec<i64>,
    pub complexity_id: i64,
    pub complexity_label: String,
    pub timeline_id: i64,
    pub timeline_label: String,
    pub breakdown: PriceBreakdown,
    pub estimated_price: i64,
}

/// Compute the price for a selection.
///
/// `round((base + pages * page_rate + features) * complexity * timeline)`
pub fn estimate(
    catalog: &Catalog,
    selection: &Selection,
    mode: PageRateMode,
) -> Result<EstimateResult, EstimateError> {
    let missing = selection.missing_steps();
    if !missing.is_empty() {
        return Err(EstimateError::MissingSelections { missing });
    }

    let project_type = selection
        .project_type_id
        .and_then(|id| catalog.project_type(id))
        .ok_or(EstimateError::InvalidSelection {
            step: Step::ProjectType,
            id: selection.project_type_id,
        })?;
    let timeline = selection
        .timeline_id
        .and_then(|id| catalog.timeline(id))
        .ok_or(EstimateError::InvalidSelection {
            step: Step::Timeline,
            id: selection.timeline_id,
        })?;
    let complexity = selection
        .complexity_id
        .and_then(|id| catalog.complexity(id))
        .ok_or(EstimateError::InvalidSelection {
            step: Step::Complexity,
            id: selection.complexity_id,
        })?;

    let pages = selection.pages.max(1);
    let invalid_pages = EstimateError::InvalidSelection {
        step: Step::Pages,
        id: None,
    };
    let (page_rate, pages_cost) =
        price_pages(&catalog.pages, pages, mode).ok_or_else(|| invalid_pages.clone())?;

    // Catalog order keeps the handoff feature list stable
    let mut feature_ids = Vec::new();
    let mut feature_names = Vec::new();
    let mut features_cost = 0i64;
    for feature in catalog
        .features
        .iter()
        .filter(|f| selection.feature_ids.contains(&f.id))
    {
        feature_ids.push(feature.id);
        feature_names.push(feature.name.clone());
        features_cost = features_cost.checked_add(feature.price).ok_or(
            EstimateError::InvalidSelection {
                step: Step::Features,
                id: Some(feature.id),
            },
        )?;
    }

    let skipped_feature_ids: Vec<i64> = selection
        .feature_ids
        .iter()
        .copied()
        .filter(|id| catalog.feature(*id).is_none())
        .collect();
    if !skipped_feature_ids.is_empty() {
        warn!(
            skipped = ?skipped_feature_ids,
            "Selected features not found in catalog; priced at zero"
        );
    }

    let subtotal = project_type
        .base_price
        .checked_add(pages_cost)
        .and_then(|v| v.checked_add(features_cost))
        .ok_or_else(|| invalid_pages.clone())?;

    let mut price = subtotal as f64;
    price *= complexity.multiplier;
    price *= timeline.multiplier;
    let price = price.round();
    if !price.is_finite() || price < 0.0 || price >= i64::MAX as f64 {
        warn!(pages, subtotal, "Estimate out of range");
        return Err(invalid_pages);
    }
    let estimated_price = price as i64;

    Ok(EstimateResult {
        project_type_id: project_type.id,
        project_type_name: project_type.name.clone(),
        pages,
        feature_ids,
        feature_names,
        skipped_feature_ids,
        complexity_id: complexity.id,
        complexity_label: complexity.label.clone(),
        timeline_id: timeline.id,
        timeline_label: timeline.timeline_type.clone(),
        breakdown: PriceBreakdown {
            base_price: project_type.base_price,
            page_rate,
            pages_cost,
            features_cost,
            subtotal,
            complexity_multiplier: complexity.multiplier,
            timeline_multiplier: timeline.multiplier,
        },
        estimated_price,
    })
}

/// Marginal per-page rate and total page cost for `pages` under `mode`.
///
/// `None` if the table is empty or the cost does not fit in an i64.
/// `tiers` must be ordered by ascending `page_count`, as the store returns them.
fn price_pages(tiers: &[PagePrice], pages: i64, mode: PageRateMode) -> Option<(i64, i64)> {
    let first = tiers.first()?;
    match mode {
        PageRateMode::FlatFirstRow => Some((
            first.price_per_page,
            pages.checked_mul(first.price_per_page)?,
        )),
        PageRateMode::Tiered => {
            let mut rate = first.price_per_page;
            let mut cost = 0i64;
            for (i, tier) in tiers.iter().enumerate() {
                let start = if i == 0 { 1 } else { tier.page_count.max(1) };
                if start > pages {
                    break;
                }
                let end = tiers
                    .get(i + 1)
                    .map_or(pages, |next| (next.page_count - 1).min(pages));
                if end < start {
                    continue;
                }
                let bracket = (end - start + 1).checked_mul(tier.price_per_page)?;
                cost = cost.checked_add(bracket)?;
                rate = tier.price_per_page;
            }
            Some((rate, cost))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ComplexityPrice, FeaturePrice, ProjectType, TimelinePrice};

    fn catalog() -> Catalog {
        Catalog {
            project_types: vec![ProjectType {
                id: 1,
                name: "Company Site".to_string(),
                description: None,
                base_price: 5_000_000,
                is_active: true,
                created_at: 0,
            }],
            features: vec![
                FeaturePrice {
                    id: 10,
                    name: "Blog".to_string(),
                    description: None,
                    price: 1_000_000,
                    is_active: true,
                    created_at: 0,
                },
                FeaturePrice {
                    id: 11,
                    name: "Shop".to_string(),
                    description: None,
                    price: 3_000_000,
                    is_active: true,
                    created_at: 1,
                },
            ],
            pages: vec![
                PagePrice {
                    id: 20,
                    page_count: 1,
                    price_per_page: 300_000,
                    is_active: true,
                    created_at: 0,
                },
                PagePrice {
                    id: 21,
                    page_count: 10,
                    price_per_page: 200_000,
                    is_active: true,
                    created_at: 0,
                },
            ],
            timelines: vec![TimelinePrice {
                id: 30,
                timeline_type: "Short".to_string(),
                description: None,
                multiplier: 1.2,
                is_active: true,
                created_at: 0,
            }],
            complexities: vec![ComplexityPrice {
                id: 40,
                label: "Medium".to_string(),
                description: None,
                multiplier: 1.1,
                is_active: true,
                created_at: 0,
            }],
        }
    }

    fn selection(pages: i64, features: &[i64]) -> Selection {
        let mut s = Selection::new();
        s.set_project_type(1);
        s.set_pages(pages);
        s.set_features(features.iter().copied());
        s.set_timeline(30);
        s.set_complexity(40);
        s
    }

    #[test]
    fn test_company_site_with_blog() {
        let result = estimate(&catalog(), &selection(5, &[10]), PageRateMode::FlatFirstRow).unwrap();
        assert_eq!(result.breakdown.subtotal, 7_500_000);
        assert_eq!(result.estimated_price, 9_900_000);
        assert_eq!(result.feature_names, vec!["Blog".to_string()]);
    }

    #[test]
    fn test_empty_features() {
        let result = estimate(&catalog(), &selection(5, &[]), PageRateMode::FlatFirstRow).unwrap();
        // (5,000,000 + 5 * 300,000) * 1.1 * 1.2
        assert_eq!(result.estimated_price, 8_580_000);
        assert_eq!(result.breakdown.features_cost, 0);
    }

    #[test]
    fn test_missing_selection_is_rejected() {
        let mut s = selection(5, &[10]);
        s.timeline_id = None;
        match estimate(&catalog(), &s, PageRateMode::FlatFirstRow) {
            Err(EstimateError::MissingSelections { missing }) => {
                assert_eq!(missing, vec![Step::Timeline]);
            }
            other => panic!("expected missing selections, got {:?}", other),
        }
    }

    #[test]
    fn test_stale_id_is_invalid_selection() {
        let mut s = selection(5, &[]);
        s.set_complexity(999);
        assert!(matches!(
            estimate(&catalog(), &s, PageRateMode::FlatFirstRow),
            Err(EstimateError::InvalidSelection { step: Step::Complexity, id: Some(999) })
        ));
    }

    #[test]
    fn test_unknown_feature_is_skipped() {
        let result = estimate(&catalog(), &selection(5, &[10, 77]), PageRateMode::FlatFirstRow).unwrap();
        assert_eq!(result.skipped_feature_ids, vec![77]);
        assert_eq!(result.feature_ids, vec![10]);
        assert_eq!(result.breakdown.features_cost, 1_000_000);
    }

    #[test]
    fn test_flat_rate_ignores_tiers() {
        let result = estimate(&catalog(), &selection(12, &[]), PageRateMode::FlatFirstRow).unwrap();
        assert_eq!(result.breakdown.page_rate, 300_000);
        assert_eq!(result.breakdown.pages_cost, 3_600_000);
    }

    #[test]
    fn test_tiered_rate_prices_each_bracket() {
        let few = estimate(&catalog(), &selection(9, &[]), PageRateMode::Tiered).unwrap();
        assert_eq!(few.breakdown.page_rate, 300_000);
        assert_eq!(few.breakdown.pages_cost, 2_700_000);

        // 9 pages at 300,000 then 3 at 200,000
        let many = estimate(&catalog(), &selection(12, &[]), PageRateMode::Tiered).unwrap();
        assert_eq!(many.breakdown.page_rate, 200_000);
        assert_eq!(many.breakdown.pages_cost, 3_300_000);
    }

    #[test]
    fn test_tiered_below_smallest_tier_uses_it() {
        let mut c = catalog();
        c.pages[0].page_count = 3;
        let result = estimate(&c, &selection(2, &[]), PageRateMode::Tiered).unwrap();
        assert_eq!(result.breakdown.pages_cost, 600_000);
    }

    #[test]
    fn test_huge_page_count_is_rejected_not_wrapped() {
        for mode in [PageRateMode::FlatFirstRow, PageRateMode::Tiered] {
            assert!(matches!(
                estimate(&catalog(), &selection(i64::MAX / 1000, &[]), mode),
                Err(EstimateError::InvalidSelection { step: Step::Pages, id: None })
            ));
        }
    }

    #[test]
    fn test_feature_sum_overflow_is_rejected() {
        let mut c = catalog();
        c.features[0].price = i64::MAX;
        assert!(matches!(
            estimate(&c, &selection(5, &[10, 11]), PageRateMode::FlatFirstRow),
            Err(EstimateError::InvalidSelection { step: Step::Features, .. })
        ));
    }

    #[test]
    fn test_price_beyond_i64_after_multipliers_is_rejected() {
        let mut c = catalog();
        c.project_types[0].base_price = i64::MAX / 2;
        c.complexities[0].multiplier = 3.0;
        assert!(matches!(
            estimate(&c, &selection(1, &[]), PageRateMode::FlatFirstRow),
            Err(EstimateError::InvalidSelection { step: Step::Pages, .. })
        ));
    }

    #[test]
    fn test_empty_page_table_is_invalid() {
        let mut c = catalog();
        c.pages.clear();
        assert!(matches!(
            estimate(&c, &selection(1, &[]), PageRateMode::FlatFirstRow),
            Err(EstimateError::InvalidSelection { step: Step::Pages, .. })
        ));
    }

    #[test]
    fn test_deterministic_and_monotonic() {
        let c = catalog();
        let mut previous = 0;
        for pages in 1..=30 {
            let a = estimate(&c, &selection(pages, &[10]), PageRateMode::FlatFirstRow).unwrap();
            let b = estimate(&c, &selection(pages, &[10]), PageRateMode::FlatFirstRow).unwrap();
            assert_eq!(a.estimated_price, b.estimated_price);
            assert!(a.estimated_price >= previous);
            previous = a.estimated_price;

            let more = estimate(&c, &selection(pages, &[10, 11]), PageRateMode::FlatFirstRow).unwrap();
            assert!(more.estimated_price >= a.estimated_price);
        }
    }

    #[test]
    fn test_tiered_is_monotonic_across_volume_discount() {
        let c = catalog();
        let mut previous = 0;
        for pages in 1..=30 {
            let result = estimate(&c, &selection(pages, &[10]), PageRateMode::Tiered).unwrap();
            assert!(
                result.estimated_price >= previous,
                "price dropped at {} pages",
                pages
            );
            previous = result.estimated_price;
        }
    }
}
