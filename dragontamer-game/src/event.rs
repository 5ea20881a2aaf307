//! Typed events handed from the engine to the presentation layer.
//!
//! Events are consumed, never stored in saves. Each carries a stable log key
//! so a front end can look up its own wording.

use serde::{Deserialize, Serialize};

use crate::constants::{
    LOG_AFFINITY_GAINED, LOG_FED, LOG_PURCHASE_DECLINED, LOG_STAGE_CHANGED, LOG_UPGRADE_PURCHASED,
};
use crate::evolution::StageChange;
use crate::state::Stage;
use crate::upgrades::UpgradeId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EngineEvent {
    AffinityGained { amount: f64 },
    Fed,
    StageChanged { from: Stage, to: Stage },
    UpgradePurchased { id: UpgradeId },
    PurchaseDeclined { id: UpgradeId },
}

impl EngineEvent {
    #[must_use]
    pub const fn log_key(&self) -> &'static str {
        match self {
            Self::AffinityGained { .. } => LOG_AFFINITY_GAINED,
            Self::Fed => LOG_FED,
            Self::StageChanged { .. } => LOG_STAGE_CHANGED,
            Self::UpgradePurchased { .. } => LOG_UPGRADE_PURCHASED,
            Self::PurchaseDeclined { .. } => LOG_PURCHASE_DECLINED,
        }
    }
}

impl From<StageChange> for EngineEvent {
    fn from(change: StageChange) -> Self {
        Self::StageChanged {
            from: change.from,
            to: change.to,
        }
    }
}
