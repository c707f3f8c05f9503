use axum::{extract::State, Json};

use super::{AppJson, AppState, EstimateResponse, SelectionUpdate};
use crate::error::AppError;

/// POST /api/estimate
///
/// One-shot estimate: loads the catalog, applies the selection and calculates.
pub async fn create_estimate(
    State(state): State<AppState>,
    AppJson(request): AppJson<SelectionUpdate>,
) -> Result<Json<EstimateResponse>, AppError> {
    let catalog = match state.loader.load().await {
        Ok(catalog) => catalog,
        Err(e) => return Err(state.catalog_error(e).await),
    };

    let mut stepper = state.stepper(catalog);
    let outcome = request
        .apply(&mut stepper)
        .and_then(|_| stepper.calculate().cloned());

    match outcome {
        Ok(result) => Ok(Json(state.estimate_response(result).await)),
        Err(e) => Err(state.estimate_error(e).await),
    }
}
