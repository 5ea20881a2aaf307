//! Player-triggered bond and feed actions.
use serde::{Deserialize, Serialize};

use crate::constants::{
    BOND_ENERGY_COST, BOND_HAPPINESS_GAIN, FEED_ENERGY_GAIN, FEED_HEALTH_GAIN,
    FEED_HUNGER_RELIEF, FIRE_BOND_BONUS,
};
use crate::state::{CreatureType, EconomyState};
use crate::upgrades::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BondOutcome {
    pub gain: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedOutcome {
    Fed,
    /// Hunger was already zero; nothing changed.
    NotHungry,
    /// Feeding has not been unlocked yet; nothing changed.
    Locked,
}

/// Affinity granted by a single bond.
#[must_use]
pub fn bond_gain(state: &EconomyState) -> f64 {
    let bonus = match state.creature_type() {
        CreatureType::Fire => FIRE_BOND_BONUS,
        CreatureType::Ice | CreatureType::Forest => 0.0,
    };
    state.bond_strength() + bonus
}

/// Bond with the creature. Energy is spent but never blocks the action.
pub fn bond(state: &mut EconomyState) -> BondOutcome {
    let gain = bond_gain(state);
    state.add_affinity(gain);
    state.adjust_stats(|stats| {
        stats.happiness += BOND_HAPPINESS_GAIN;
        stats.energy -= BOND_ENERGY_COST;
    });
    log::debug!("bond: +{gain} affinity (balance {})", state.affinity());
    BondOutcome { gain }
}

/// Feed the creature when it is hungry and, if `require_unlock`, when the
/// feeding feature is owned.
pub fn feed(state: &mut EconomyState, require_unlock: bool) -> FeedOutcome {
    if require_unlock && !state.has_unlocked(Feature::Feeding) {
        log::debug!("feed declined: feeding not unlocked");
        return FeedOutcome::Locked;
    }
    if state.stats.hunger <= 0 {
        return FeedOutcome::NotHungry;
    }
    state.adjust_stats(|stats| {
        stats.hunger -= FEED_HUNGER_RELIEF;
        stats.health += FEED_HEALTH_GAIN;
        stats.energy += FEED_ENERGY_GAIN;
    });
    log::debug!("fed: hunger now {}", state.stats.hunger);
    FeedOutcome::Fed
}
