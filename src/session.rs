use crate::catalog::{Catalog, CatalogError, CatalogLoader, CatalogSection};
use crate::error::AppError;
use crate::estimator::{EstimateResult, PageRateMode, Selection, Stepper, StepperPhase};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

/// Lifecycle of one estimator session
pub enum SessionState {
    /// Catalog load in flight
    Loading,
    /// Catalog load failed; the client should reload
    Failed(String),
    /// Catalog loaded but required sections are empty
    Incomplete(Vec<CatalogSection>),
    Ready(Stepper),
}

impl SessionState {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Failed(_) => "failed",
            Self::Incomplete(_) => "incomplete",
            Self::Ready(_) => "ready",
        }
    }
}

struct SessionEntry {
    state: SessionState,
    last_seen: Instant,
    /// Flipped (or dropped) on teardown to abort an in-flight load
    cancel: watch::Sender<bool>,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<CatalogSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Catalog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    pub completed_steps: u8,
    pub can_calculate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EstimateResult>,
}

/// Owns every live stepper session.
///
/// Each session loads its own catalog snapshot on mount; the snapshot and the
/// stepper live exactly as long as the session entry.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionEntry>,
    loader: CatalogLoader,
    mode: PageRateMode,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(loader: CatalogLoader, mode: PageRateMode, idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            loader,
            mode,
            idle_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Register a new session and start loading its catalog in the background
    pub fn mount(self: &Arc<Self>) -> Uuid {
        let id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        self.sessions.insert(
            id,
            SessionEntry {
                state: SessionState::Loading,
                last_seen: Instant::now(),
                cancel: cancel_tx,
            },
        );
        debug!(session = %id, "Session mounted");

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let result = registry.loader.load_until(cancel_rx).await;
            registry.finish_load(id, result);
        });

        id
    }

    /// Store the load outcome, unless the session was torn down meanwhile
    fn finish_load(&self, id: Uuid, result: Result<Catalog, CatalogError>) {
        if matches!(result, Err(CatalogError::Cancelled)) {
            return;
        }

        let Some(mut entry) = self.sessions.get_mut(&id) else {
            debug!(session = %id, "Session gone before catalog load finished");
            return;
        };

        entry.state = match result {
            Ok(catalog) => SessionState::Ready(self.new_stepper(id, Arc::new(catalog))),
            Err(CatalogError::Incomplete { missing }) => SessionState::Incomplete(missing),
            Err(e) => SessionState::Failed(e.to_string()),
        };
        debug!(session = %id, status = entry.state.status(), "Session catalog load finished");
    }

    fn new_stepper(&self, id: Uuid, catalog: Arc<Catalog>) -> Stepper {
        Stepper::new(catalog, self.mode).with_completion_hook(Box::new(move |result| {
            info!(
                session = %id,
                project_type = %result.project_type_name,
                estimated_price = result.estimated_price,
                "Session estimate completed"
            );
        }))
    }

    /// Remove a session and cancel its load; returns false if it did not exist
    pub fn teardown(&self, id: Uuid) -> bool {
        match self.sessions.remove(&id) {
            Some((_, entry)) => {
                let _ = entry.cancel.send(true);
                debug!(session = %id, "Session torn down");
                true
            }
            None => false,
        }
    }

    /// Snapshot a session
    pub fn view(&self, id: Uuid) -> Result<SessionView, AppError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        entry.last_seen = Instant::now();

        let mut view = SessionView {
            id,
            status: entry.state.status(),
            error: None,
            missing: Vec::new(),
            catalog: None,
            selection: None,
            completed_steps: 0,
            can_calculate: false,
            phase: None,
            result: None,
        };

        match &entry.state {
            SessionState::Loading => {}
            SessionState::Failed(msg) => view.error = Some(msg.clone()),
            SessionState::Incomplete(missing) => view.missing = missing.clone(),
            SessionState::Ready(stepper) => {
                view.catalog = Some(stepper.catalog().as_ref().clone());
                view.selection = Some(stepper.selection().clone());
                view.completed_steps = stepper.completed_steps();
                view.can_calculate = stepper.can_calculate();
                view.phase = Some(match stepper.phase() {
                    StepperPhase::Selecting => "selecting",
                    StepperPhase::Result(_) => "result",
                });
                view.result = stepper.result().cloned();
            }
        }

        Ok(view)
    }

    /// Run `f` against the stepper of a ready session
    pub fn with_stepper<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Stepper) -> R,
    ) -> Result<R, AppError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        entry.last_seen = Instant::now();

        match &mut entry.state {
            SessionState::Ready(stepper) => Ok(f(stepper)),
            SessionState::Loading => Err(AppError::SessionNotReady(
                "pricing data is still loading".to_string(),
            )),
            SessionState::Failed(msg) => Err(AppError::CatalogLoad(msg.clone())),
            SessionState::Incomplete(missing) => Err(CatalogError::Incomplete {
                missing: missing.clone(),
            }
            .into()),
        }
    }

    /// Drop sessions idle past the timeout; returns how many were removed
    pub fn sweep_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();

        self.sessions.retain(|_id, entry| {
            let keep = now.duration_since(entry.last_seen) < self.idle_timeout;
            if !keep {
                let _ = entry.cancel.send(true);
            }
            keep
        });

        before.saturating_sub(self.sessions.len())
    }

    /// Periodically sweep idle sessions
    pub async fn idle_cleanup_loop(self: Arc<Self>, every: Duration) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let removed = self.sweep_idle();
            tracing::debug!(
                removed,
                active_sessions = self.sessions.len(),
                "Session cleanup completed"
            );
        }
    }
}
