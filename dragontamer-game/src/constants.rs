//! Centralized balance and tuning constants for the Dragon Tamer economy.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that balance can only be adjusted via
//! code changes reviewed in version control, rather than through save data.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_AFFINITY_GAINED: &str = "log.affinity-gained";
pub(crate) const LOG_FED: &str = "log.fed";
pub(crate) const LOG_STAGE_CHANGED: &str = "log.stage-changed";
pub(crate) const LOG_UPGRADE_PURCHASED: &str = "log.upgrade-purchased";
pub(crate) const LOG_PURCHASE_DECLINED: &str = "log.purchase-declined";

// Stat bounds --------------------------------------------------------------
pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;
pub(crate) const DEFAULT_HEALTH: i32 = 100;
pub(crate) const DEFAULT_HUNGER: i32 = 0;
pub(crate) const DEFAULT_HAPPINESS: i32 = 50;
pub(crate) const DEFAULT_ENERGY: i32 = 100;

// Needs decay --------------------------------------------------------------
pub(crate) const HUNGER_ACCRUAL: i32 = 5;
pub(crate) const ICE_HUNGER_ACCRUAL: i32 = HUNGER_ACCRUAL / 2;
pub(crate) const HAPPINESS_DECAY: i32 = 2;
pub(crate) const FOREST_HAPPINESS_DECAY: i32 = HAPPINESS_DECAY / 2;

// Bonding ------------------------------------------------------------------
pub(crate) const BASE_BOND_STRENGTH: f64 = 1.0;
pub(crate) const FIRE_BOND_BONUS: f64 = 1.0;
pub(crate) const BOND_HAPPINESS_GAIN: i32 = 5;
pub(crate) const BOND_ENERGY_COST: i32 = 10;

// Feeding ------------------------------------------------------------------
pub(crate) const FEED_HUNGER_RELIEF: i32 = 30;
pub(crate) const FEED_HEALTH_GAIN: i32 = 5;
pub(crate) const FEED_ENERGY_GAIN: i32 = 20;

// Evolution thresholds -----------------------------------------------------
pub(crate) const HATCHLING_AFFINITY: f64 = 50.0;
pub(crate) const JUVENILE_AFFINITY: f64 = 200.0;
pub(crate) const ADULT_AFFINITY: f64 = 1_000.0;
pub(crate) const ELDER_AFFINITY: f64 = 5_000.0;

// Store --------------------------------------------------------------------
pub(crate) const COST_GROWTH_FACTOR: f64 = 1.5;

// Host defaults ------------------------------------------------------------
pub const DEFAULT_SAVE_KEY: &str = "dragonTamer";
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 3;
pub(crate) const SNAPSHOT_VERSION: u32 = 1;
/// Undrained events kept by an engine; older ones are dropped first.
pub const MAX_PENDING_EVENTS: usize = 256;

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f64 = 1e-9;
