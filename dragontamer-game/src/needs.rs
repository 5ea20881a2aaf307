//! Per-tick needs decay.
use serde::{Deserialize, Serialize};

use crate::constants::{
    FOREST_HAPPINESS_DECAY, HAPPINESS_DECAY, HUNGER_ACCRUAL, ICE_HUNGER_ACCRUAL,
};
use crate::state::{CreatureType, EconomyState};
use crate::upgrades::EffectKind;

/// What a tick actually changed, after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NeedsReport {
    pub hunger_delta: i32,
    pub happiness_delta: i32,
    /// Hunger removed by owned upgrades this tick.
    pub upgrade_relief: i32,
}

#[must_use]
pub const fn hunger_accrual(creature: CreatureType) -> i32 {
    match creature {
        CreatureType::Ice => ICE_HUNGER_ACCRUAL,
        CreatureType::Fire | CreatureType::Forest => HUNGER_ACCRUAL,
    }
}

#[must_use]
pub const fn happiness_decay(creature: CreatureType) -> i32 {
    match creature {
        CreatureType::Forest => FOREST_HAPPINESS_DECAY,
        CreatureType::Fire | CreatureType::Ice => HAPPINESS_DECAY,
    }
}

/// Advance hunger and happiness by one tick, then apply upgrade passives in id order.
pub fn apply_needs_tick(state: &mut EconomyState) -> NeedsReport {
    let creature = state.creature_type();
    let hunger_before = state.stats.hunger;
    let happiness_before = state.stats.happiness;

    state.adjust_stats(|stats| stats.hunger += hunger_accrual(creature));
    state.adjust_stats(|stats| stats.happiness -= happiness_decay(creature));

    let mut upgrade_relief = 0;
    let passives: Vec<(EffectKind, u32)> = state
        .upgrades
        .iter()
        .filter(|upgrade| upgrade.owned > 0)
        .map(|upgrade| (upgrade.effect, upgrade.owned))
        .collect();
    for (effect, owned) in passives {
        match effect {
            EffectKind::HungerRelief { per_unit } => {
                let units = i32::try_from(owned).unwrap_or(i32::MAX);
                let before = state.stats.hunger;
                state.adjust_stats(|stats| {
                    stats.hunger = stats.hunger.saturating_sub(per_unit.saturating_mul(units));
                });
                upgrade_relief += before - state.stats.hunger;
            }
            // Bond strength is derived from the ledger on demand.
            EffectKind::BondBoost { .. } | EffectKind::Unlock { .. } => {}
        }
    }

    let report = NeedsReport {
        hunger_delta: state.stats.hunger - hunger_before,
        happiness_delta: state.stats.happiness - happiness_before,
        upgrade_relief,
    };
    log::debug!(
        "needs tick: hunger {hunger_before}->{} happiness {happiness_before}->{} relief {upgrade_relief}",
        state.stats.hunger,
        state.stats.happiness
    );
    report
}
