pub mod catalog;
pub mod estimate;
pub mod health;
pub mod sessions;

use crate::{
    catalog::{CatalogError, CatalogLoader, CatalogStore},
    config::Config,
    error::{validation_kind, AppError},
    estimator::{EstimateError, EstimateResult, Handoff, PriceFormatter, Stepper},
    i18n::{localize, MessageKey, StaticTranslator, Translator},
    session::SessionRegistry,
};
use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

/// `Json` whose rejections use the `AppError` envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` whose rejections use the `AppError` envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// State shared by all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub loader: CatalogLoader,
    pub sessions: Arc<SessionRegistry>,
    pub handoff: Arc<Handoff>,
    pub translator: Arc<dyn Translator>,
}

impl AppState {
    pub fn from_config(config: Config, store: Arc<dyn CatalogStore>) -> anyhow::Result<Self> {
        let loader = CatalogLoader::new(
            store,
            Duration::from_secs(config.catalog.load_timeout_seconds),
        );
        let sessions = Arc::new(SessionRegistry::new(
            loader.clone(),
            config.catalog.page_rate_mode,
            Duration::from_secs(config.sessions.idle_timeout_seconds),
        ));
        let handoff = Arc::new(Handoff::new(
            url::Url::parse(&config.handoff.consult_url)?,
            PriceFormatter::new(config.handoff.locale, config.handoff.currency.clone()),
        ));

        Ok(Self {
            config: Arc::new(config),
            loader,
            sessions,
            handoff,
            translator: Arc::new(StaticTranslator),
        })
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// A one-off stepper over `catalog`, configured like session steppers
    pub fn stepper(&self, catalog: crate::catalog::Catalog) -> Stepper {
        Stepper::new(Arc::new(catalog), self.config.catalog.page_rate_mode)
    }

    pub async fn message(&self, key: MessageKey) -> String {
        localize(
            self.translator.as_ref(),
            key,
            self.config.handoff.locale,
            Duration::from_millis(self.config.i18n.timeout_ms),
        )
        .await
    }

    /// Map a catalog failure to its user-facing error
    pub async fn catalog_error(&self, err: CatalogError) -> AppError {
        match err {
            CatalogError::Incomplete { .. } => AppError::CatalogIncomplete(format!(
                "{} ({})",
                self.message(MessageKey::CatalogIncomplete).await,
                err
            )),
            CatalogError::Invalid(_) | CatalogError::Parse(_) => err.into(),
            _ => AppError::CatalogLoad(format!(
                "{} ({})",
                self.message(MessageKey::CatalogLoadFailed).await,
                err
            )),
        }
    }

    /// Map a validation failure to its localized error
    pub async fn estimate_error(&self, err: EstimateError) -> AppError {
        let message = match err {
            EstimateError::MissingSelections { .. } => {
                self.message(MessageKey::MissingSelections).await
            }
            EstimateError::InvalidSelection { .. } => {
                self.message(MessageKey::InvalidSelection).await
            }
            EstimateError::ResultShown | EstimateError::NoEstimate => err.to_string(),
        };

        AppError::Validation {
            kind: validation_kind(&err),
            message,
        }
    }

    /// Response body for a finished estimate
    pub async fn estimate_response(&self, result: EstimateResult) -> EstimateResponse {
        EstimateResponse {
            display_price: self.handoff.display_price(&result),
            consult_url: self.handoff.consult_link(&result).to_string(),
            message: self.message(MessageKey::EstimateReady).await,
            result,
        }
    }
}

/// Partial selection payload; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionUpdate {
    pub project_type_id: Option<i64>,
    pub pages: Option<i64>,
    pub feature_ids: Option<Vec<i64>>,
    pub timeline_id: Option<i64>,
    pub complexity_id: Option<i64>,
}

impl SelectionUpdate {
    pub fn apply(&self, stepper: &mut Stepper) -> Result<(), EstimateError> {
        if let Some(id) = self.project_type_id {
            stepper.select_project_type(id)?;
        }
        if let Some(pages) = self.pages {
            stepper.set_pages(pages)?;
        }
        if let Some(ids) = &self.feature_ids {
            stepper.set_features(ids.clone())?;
        }
        if let Some(id) = self.timeline_id {
            stepper.select_timeline(id)?;
        }
        if let Some(id) = self.complexity_id {
            stepper.select_complexity(id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EstimateResponse {
    pub result: EstimateResult,
    pub display_price: String,
    pub consult_url: String,
    pub message: String,
}
