use axum::{extract::State, Json};

use super::AppState;
use crate::{catalog::Catalog, error::AppError};

/// GET /api/catalog
///
/// Loads a fresh snapshot of the active catalog.
pub async fn get_catalog(State(state): State<AppState>) -> Result<Json<Catalog>, AppError> {
    match state.loader.load().await {
        Ok(catalog) => Ok(Json(catalog)),
        Err(e) => Err(state.catalog_error(e).await),
    }
}
