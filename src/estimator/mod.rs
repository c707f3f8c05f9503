pub mod calculator;
pub mod handoff;
pub mod selection;
pub mod stepper;

pub use calculator::{estimate, EstimateResult, PageRateMode, PriceBreakdown};
pub use handoff::{Handoff, PriceFormatter};
pub use selection::{Selection, Step};
pub use stepper::{CompletionHook, Stepper, StepperPhase};

/// Validation failures raised while selecting or calculating.
///
/// All of them are recoverable: the stepper keeps its selections and the
/// user completes or fixes the offending step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    #[error("please complete all selections (missing: {})", join_steps(.missing))]
    MissingSelections { missing: Vec<Step> },

    #[error("invalid selection for {step}")]
    InvalidSelection { step: Step, id: Option<i64> },

    #[error("an estimate is already shown; recalculate to change selections")]
    ResultShown,

    #[error("no estimate has been calculated yet")]
    NoEstimate,
}

fn join_steps(steps: &[Step]) -> String {
    steps
        .iter()
        .map(Step::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
