use crate::catalog::Catalog;
use crate::estimator::calculator::{estimate, EstimateResult, PageRateMode};
use crate::estimator::handoff::Handoff;
use crate::estimator::selection::Selection;
use crate::estimator::EstimateError;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Invoked synchronously with every successful estimate
pub type CompletionHook = Box<dyn Fn(&EstimateResult) + Send + Sync>;

/// Stepper state
#[derive(Debug, Clone, PartialEq)]
pub enum StepperPhase {
    /// Initial phase; all slots are editable
    Selecting,
    /// An estimate is shown; only recalculate or consult are allowed
    Result(EstimateResult),
}

/// Multi-step selection controller over a loaded catalog
pub struct Stepper {
    catalog: Arc<Catalog>,
    mode: PageRateMode,
    selection: Selection,
    phase: StepperPhase,
    on_complete: Option<CompletionHook>,
}

impl Stepper {
    pub fn new(catalog: Arc<Catalog>, mode: PageRateMode) -> Self {
        Self {
            catalog,
            mode,
            selection: Selection::new(),
            phase: StepperPhase::Selecting,
            on_complete: None,
        }
    }

    pub fn with_completion_hook(mut self, hook: CompletionHook) -> Self {
        self.on_complete = Some(hook);
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn phase(&self) -> &StepperPhase {
        &self.phase
    }

    pub fn result(&self) -> Option<&EstimateResult> {
        match &self.phase {
            StepperPhase::Result(result) => Some(result),
            StepperPhase::Selecting => None,
        }
    }

    pub fn estimated_price(&self) -> Option<i64> {
        self.result().map(|r| r.estimated_price)
    }

    pub fn completed_steps(&self) -> u8 {
        self.selection.completed_steps()
    }

    /// True when project type, timeline and complexity are all chosen
    pub fn can_calculate(&self) -> bool {
        matches!(self.phase, StepperPhase::Selecting) && self.selection.is_complete()
    }

    fn selecting_mut(&mut self) -> Result<&mut Selection, EstimateError> {
        match self.phase {
            StepperPhase::Selecting => Ok(&mut self.selection),
            StepperPhase::Result(_) => Err(EstimateError::ResultShown),
        }
    }

    pub fn select_project_type(&mut self, id: i64) -> Result<(), EstimateError> {
        self.selecting_mut()?.set_project_type(id);
        Ok(())
    }

    pub fn set_pages(&mut self, pages: i64) -> Result<(), EstimateError> {
        self.selecting_mut()?.set_pages(pages);
        Ok(())
    }

    pub fn toggle_feature(&mut self, id: i64) -> Result<bool, EstimateError> {
        Ok(self.selecting_mut()?.toggle_feature(id))
    }

    pub fn add_feature(&mut self, id: i64) -> Result<(), EstimateError> {
        self.selecting_mut()?.add_feature(id);
        Ok(())
    }

    pub fn remove_feature(&mut self, id: i64) -> Result<(), EstimateError> {
        self.selecting_mut()?.remove_feature(id);
        Ok(())
    }

    pub fn set_features(&mut self, ids: Vec<i64>) -> Result<(), EstimateError> {
        self.selecting_mut()?.set_features(ids);
        Ok(())
    }

    pub fn select_timeline(&mut self, id: i64) -> Result<(), EstimateError> {
        self.selecting_mut()?.set_timeline(id);
        Ok(())
    }

    pub fn select_complexity(&mut self, id: i64) -> Result<(), EstimateError> {
        self.selecting_mut()?.set_complexity(id);
        Ok(())
    }

    /// Compute the estimate and move to the Result phase.
    ///
    /// On error nothing changes: selections are kept and the phase stays Selecting.
    pub fn calculate(&mut self) -> Result<&EstimateResult, EstimateError> {
        if let StepperPhase::Result(_) = self.phase {
            return Err(EstimateError::ResultShown);
        }

        let result = estimate(&self.catalog, &self.selection, self.mode).map_err(|e| {
            debug!(error = %e, "Estimate rejected");
            e
        })?;

        info!(
            project_type = %result.project_type_name,
            pages = result.pages,
            features = result.feature_ids.len(),
            estimated_price = result.estimated_price,
            "Estimate calculated"
        );

        if let Some(hook) = &self.on_complete {
            hook(&result);
        }

        self.phase = StepperPhase::Result(result);
        match &self.phase {
            StepperPhase::Result(result) => Ok(result),
            StepperPhase::Selecting => Err(EstimateError::NoEstimate),
        }
    }

    /// Back to Selecting with every slot and the computed price reset
    pub fn recalculate(&mut self) {
        self.selection = Selection::new();
        self.phase = StepperPhase::Selecting;
    }

    /// "Consult Now": the lead-capture link for the shown estimate
    pub fn consult_link(&self, handoff: &Handoff) -> Result<Url, EstimateError> {
        self.result()
            .map(|result| handoff.consult_link(result))
            .ok_or(EstimateError::NoEstimate)
    }
}
