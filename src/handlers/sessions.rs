//! Stepper sessions over HTTP
//!
//! A session is mounted with `POST /api/sessions`, which starts a catalog load
//! in the background. Clients poll `GET /api/sessions/:id` until the status
//! leaves `loading`, then drive the selection and calculation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::{AppJson, AppPath, AppState, EstimateResponse, SelectionUpdate};
use crate::{
    error::AppError,
    estimator::{EstimateError, EstimateResult},
    session::SessionView,
};

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub view: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consult_url: Option<String>,
}

impl SessionResponse {
    fn new(state: &AppState, view: SessionView) -> Self {
        let display_price = view.result.as_ref().map(|r| state.handoff.display_price(r));
        let consult_url = view
            .result
            .as_ref()
            .map(|r| state.handoff.consult_link(r).to_string());

        Self {
            view,
            display_price,
            consult_url,
        }
    }
}

/// POST /api/sessions
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let id = state.sessions.mount();
    (
        StatusCode::CREATED,
        Json(json!({ "id": id, "status": "loading" })),
    )
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let view = state.sessions.view(id)?;
    Ok(Json(SessionResponse::new(&state, view)))
}

/// PUT /api/sessions/:id/selection
pub async fn update_selection(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<SelectionUpdate>,
) -> Result<Json<SessionResponse>, AppError> {
    if let Err(e) = state.sessions.with_stepper(id, |stepper| update.apply(stepper))? {
        return Err(state.estimate_error(e).await);
    }

    let view = state.sessions.view(id)?;
    Ok(Json(SessionResponse::new(&state, view)))
}

/// POST /api/sessions/:id/calculate
pub async fn calculate(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<EstimateResponse>, AppError> {
    // Clone out of the stepper so no session guard is held across an await
    let outcome: Result<EstimateResult, EstimateError> = state
        .sessions
        .with_stepper(id, |stepper| stepper.calculate().cloned())?;

    match outcome {
        Ok(result) => Ok(Json(state.estimate_response(result).await)),
        Err(e) => Err(state.estimate_error(e).await),
    }
}

/// POST /api/sessions/:id/recalculate
pub async fn recalculate(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    state.sessions.with_stepper(id, |stepper| stepper.recalculate())?;

    let view = state.sessions.view(id)?;
    Ok(Json(SessionResponse::new(&state, view)))
}

/// GET /api/sessions/:id/consult
///
/// Redirects to the consultation page with the estimate attached.
pub async fn consult(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Redirect, AppError> {
    let link = state
        .sessions
        .with_stepper(id, |stepper| stepper.consult_link(&state.handoff))?;

    match link {
        Ok(url) => Ok(Redirect::to(url.as_str())),
        Err(e) => Err(state.estimate_error(e).await),
    }
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.teardown(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::SessionNotFound(id.to_string()))
    }
}
