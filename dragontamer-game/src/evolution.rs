//! Linear growth-stage machine driven by affinity thresholds.
use serde::{Deserialize, Serialize};

use crate::state::{EconomyState, Stage};

/// A single forward transition that has just been taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    pub from: Stage,
    pub to: Stage,
}

/// Next stage for `(stage, affinity)`, at most one step forward.
///
/// The check is keyed on the current stage, so re-evaluating after a
/// transition never fires the same transition twice.
#[must_use]
pub fn evaluate(stage: Stage, affinity: f64) -> Option<Stage> {
    let next = stage.next()?;
    (affinity >= next.threshold()).then_some(next)
}

/// Apply [`evaluate`] to the state, returning the transition if one fired.
pub fn advance(state: &mut EconomyState) -> Option<StageChange> {
    let from = state.stage;
    let to = evaluate(from, state.affinity())?;
    state.stage = to;
    log::info!("stage advanced from {from} to {to}");
    Some(StageChange { from, to })
}
