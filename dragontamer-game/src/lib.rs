//! Dragon Tamer Economy Engine
//!
//! Platform-agnostic core logic for the Dragon Tamer idle game: the economy
//! state, needs decay, bond and feed actions, the evolution stage machine,
//! the upgrade store, and the save format. Rendering, input wiring, and
//! timers belong to the host; it drives the engine through four entry points
//! and drains typed events back out.

pub mod actions;
pub mod config;
pub mod constants;
pub mod engine;
pub mod event;
pub mod evolution;
pub mod needs;
pub mod numbers;
pub mod snapshot;
pub mod state;
pub mod storage;
pub mod upgrades;

// Re-export commonly used types
pub use actions::{BondOutcome, FeedOutcome, bond, bond_gain, feed};
pub use config::{ConfigError, EngineConfig};
pub use engine::{PersistError, SharedEngine, TamerEngine};
pub use event::EngineEvent;
pub use evolution::{StageChange, advance, evaluate};
pub use needs::{NeedsReport, apply_needs_tick};
pub use snapshot::{LoadReport, Snapshot, UpgradeRecord, restore};
pub use state::{CreatureType, EconomyState, Stage, Stats};
pub use storage::{MemoryStorage, SaveStorage};
pub use upgrades::{
    CatalogError, DeclineReason, EffectKind, Feature, PurchaseOutcome, Upgrade, UpgradeId,
    UpgradeStore, escalate_cost, replay_cost,
};
