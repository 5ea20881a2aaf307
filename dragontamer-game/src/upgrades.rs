//! Upgrade catalog, ownership ledger, and the purchase rule.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::constants::{BASE_BOND_STRENGTH, COST_GROWTH_FACTOR};
use crate::numbers::{floor_f64_to_u64, u64_to_f64};

/// Stable numeric identifier of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub u32);

impl UpgradeId {
    pub const STABLE: Self = Self(1);
    pub const TRAINER: Self = Self(2);
    pub const WIZARD_TOWER: Self = Self(3);
    pub const FEEDING_TROUGH: Self = Self(4);
    pub const ARMORY: Self = Self(5);
}

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Feature switched on by a binary unlock upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Feeding,
    MagicTraining,
    Equipment,
}

impl Feature {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feeding => "feeding",
            Self::MagicTraining => "magic_training",
            Self::Equipment => "equipment",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the economy an upgrade modifies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    /// Removes hunger on every tick, scaled by owned units.
    HungerRelief { per_unit: i32 },
    /// Adds to bond strength, scaled by owned units.
    BondBoost { per_unit: f64 },
    /// Owning one unit switches a feature on; further units do nothing.
    Unlock { feature: Feature },
}

impl EffectKind {
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Unlock { .. })
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::HungerRelief { per_unit } => format!("Reduces hunger by {per_unit} per tick"),
            Self::BondBoost { per_unit } => {
                format!("Boosts bond strength by {:.0}%", per_unit * 100.0)
            }
            Self::Unlock { feature } => format!("Unlocks {feature}"),
        }
    }
}

/// One catalog entry together with its ownership ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: UpgradeId,
    pub name: String,
    pub base_cost: u64,
    /// Price of the next unit; zero in catalog JSON means "same as base".
    #[serde(default)]
    pub current_cost: u64,
    pub effect: EffectKind,
    #[serde(default)]
    pub owned: u32,
}

impl Upgrade {
    #[must_use]
    pub fn new(id: UpgradeId, name: &str, base_cost: u64, effect: EffectKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            base_cost,
            current_cost: base_cost,
            effect,
            owned: 0,
        }
    }

    /// Whether a further purchase is ruled out regardless of affinity.
    #[must_use]
    pub const fn is_maxed(&self) -> bool {
        self.effect.is_binary() && self.owned > 0
    }

    #[must_use]
    pub fn can_afford(&self, affinity: f64) -> bool {
        affinity >= u64_to_f64(self.current_cost)
    }

    fn reset(&mut self) {
        self.owned = 0;
        self.current_cost = self.base_cost;
    }
}

/// Geometric cost escalation applied once per purchase, rounded down.
#[must_use]
pub fn escalate_cost(cost: u64) -> u64 {
    floor_f64_to_u64(u64_to_f64(cost) * COST_GROWTH_FACTOR).max(cost)
}

/// Price after `owned` purchases starting from `base_cost`.
///
/// Stops as soon as escalation reaches a fixed point, which happens for
/// prices that saturate at `u64::MAX` and for prices too small to grow.
#[must_use]
pub fn replay_cost(base_cost: u64, owned: u32) -> u64 {
    let mut cost = base_cost;
    for _ in 0..owned {
        let next = escalate_cost(cost);
        if next == cost {
            break;
        }
        cost = next;
    }
    cost
}

/// Errors raised when a catalog definition is structurally invalid.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has no upgrades")]
    Empty,
    #[error("upgrade id {0} appears more than once")]
    DuplicateId(UpgradeId),
    #[error("upgrade {0} must have a base cost above zero")]
    ZeroCost(UpgradeId),
    #[error("catalog JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a purchase request was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum DeclineReason {
    InsufficientAffinity { cost: u64 },
    AlreadyUnlocked,
    UnknownUpgrade,
}

/// Result of a purchase request. A decline leaves every balance untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased {
        id: UpgradeId,
        paid: u64,
        next_cost: u64,
        owned: u32,
    },
    Declined {
        id: UpgradeId,
        reason: DeclineReason,
    },
}

impl PurchaseOutcome {
    #[must_use]
    pub const fn is_purchased(&self) -> bool {
        matches!(self, Self::Purchased { .. })
    }

    #[must_use]
    pub const fn id(&self) -> UpgradeId {
        match self {
            Self::Purchased { id, .. } | Self::Declined { id, .. } => *id,
        }
    }
}

/// The upgrade catalog and ledger, kept sorted by id so passive effects
/// apply in a fixed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeStore {
    upgrades: Vec<Upgrade>,
}

impl Default for UpgradeStore {
    fn default() -> Self {
        Self::standard()
    }
}

impl UpgradeStore {
    /// The reference five-entry catalog, nothing owned.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            upgrades: vec![
                Upgrade::new(
                    UpgradeId::STABLE,
                    "Dragon Stable",
                    50,
                    EffectKind::HungerRelief { per_unit: 2 },
                ),
                Upgrade::new(
                    UpgradeId::TRAINER,
                    "Royal Trainer",
                    200,
                    EffectKind::BondBoost { per_unit: 0.5 },
                ),
                Upgrade::new(
                    UpgradeId::WIZARD_TOWER,
                    "Wizard Tower",
                    1_000,
                    EffectKind::Unlock {
                        feature: Feature::MagicTraining,
                    },
                ),
                Upgrade::new(
                    UpgradeId::FEEDING_TROUGH,
                    "Feeding Trough",
                    300,
                    EffectKind::Unlock {
                        feature: Feature::Feeding,
                    },
                ),
                Upgrade::new(
                    UpgradeId::ARMORY,
                    "Dragon Armory",
                    800,
                    EffectKind::Unlock {
                        feature: Feature::Equipment,
                    },
                ),
            ],
        }
    }

    /// Build a store from catalog entries, validating ids and costs.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog is empty, repeats an id, or prices an
    /// upgrade at zero.
    pub fn from_upgrades(mut upgrades: Vec<Upgrade>) -> Result<Self, CatalogError> {
        if upgrades.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for upgrade in &mut upgrades {
            if !seen.insert(upgrade.id) {
                return Err(CatalogError::DuplicateId(upgrade.id));
            }
            if upgrade.base_cost == 0 {
                return Err(CatalogError::ZeroCost(upgrade.id));
            }
            if upgrade.current_cost < upgrade.base_cost {
                upgrade.current_cost = upgrade.base_cost;
            }
        }
        upgrades.sort_by_key(|upgrade| upgrade.id);
        Ok(Self { upgrades })
    }

    /// Load a catalog from a JSON array of upgrades.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the catalog is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let upgrades: Vec<Upgrade> = serde_json::from_str(json)?;
        Self::from_upgrades(upgrades)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: UpgradeId) -> Option<&Upgrade> {
        self.upgrades.iter().find(|upgrade| upgrade.id == id)
    }

    pub fn get_mut(&mut self, id: UpgradeId) -> Option<&mut Upgrade> {
        self.upgrades.iter_mut().find(|upgrade| upgrade.id == id)
    }

    #[must_use]
    pub fn owned(&self, id: UpgradeId) -> u32 {
        self.get(id).map_or(0, |upgrade| upgrade.owned)
    }

    #[must_use]
    pub fn total_owned(&self) -> u32 {
        self.upgrades
            .iter()
            .fold(0u32, |acc, upgrade| acc.saturating_add(upgrade.owned))
    }

    /// Bond strength derived from owned bond boosts: `1 + Σ per_unit * owned`.
    #[must_use]
    pub fn bond_strength(&self) -> f64 {
        self.upgrades
            .iter()
            .filter_map(|upgrade| match upgrade.effect {
                EffectKind::BondBoost { per_unit } => Some(per_unit * f64::from(upgrade.owned)),
                _ => None,
            })
            .fold(BASE_BOND_STRENGTH, |acc, boost| acc + boost)
    }

    #[must_use]
    pub fn is_unlocked(&self, feature: Feature) -> bool {
        self.upgrades.iter().any(|upgrade| {
            upgrade.owned > 0
                && matches!(upgrade.effect, EffectKind::Unlock { feature: f } if f == feature)
        })
    }

    /// Cheapest upgrade that is still purchasable at some price.
    #[must_use]
    pub fn cheapest_available(&self) -> Option<&Upgrade> {
        self.upgrades
            .iter()
            .filter(|upgrade| !upgrade.is_maxed())
            .min_by_key(|upgrade| (upgrade.current_cost, upgrade.id))
    }

    /// Spend `affinity` on one unit of `id` if it is affordable.
    pub fn purchase(&mut self, affinity: &mut f64, id: UpgradeId) -> PurchaseOutcome {
        let Some(upgrade) = self.get_mut(id) else {
            return PurchaseOutcome::Declined {
                id,
                reason: DeclineReason::UnknownUpgrade,
            };
        };
        if upgrade.is_maxed() {
            return PurchaseOutcome::Declined {
                id,
                reason: DeclineReason::AlreadyUnlocked,
            };
        }
        if !upgrade.can_afford(*affinity) {
            return PurchaseOutcome::Declined {
                id,
                reason: DeclineReason::InsufficientAffinity {
                    cost: upgrade.current_cost,
                },
            };
        }

        let paid = upgrade.current_cost;
        *affinity = (*affinity - u64_to_f64(paid)).max(0.0);
        upgrade.owned = upgrade.owned.saturating_add(1);
        upgrade.current_cost = escalate_cost(paid);
        PurchaseOutcome::Purchased {
            id,
            paid,
            next_cost: upgrade.current_cost,
            owned: upgrade.owned,
        }
    }

    /// Collapse binary unlocks to a single owned unit and lift prices below
    /// their base back up to it.
    pub fn normalize(&mut self) {
        for upgrade in &mut self.upgrades {
            if upgrade.effect.is_binary() {
                upgrade.owned = upgrade.owned.min(1);
            }
            upgrade.current_cost = upgrade.current_cost.max(upgrade.base_cost);
        }
    }

    /// Return every entry to zero owned at base cost.
    pub fn reset(&mut self) {
        for upgrade in &mut self.upgrades {
            upgrade.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLOAT_EPSILON;

    #[test]
    fn purchase_deducts_and_escalates_cost() {
        let mut store = UpgradeStore::standard();
        let mut affinity = 50.0;

        let outcome = store.purchase(&mut affinity, UpgradeId::STABLE);

        assert_eq!(
            outcome,
            PurchaseOutcome::Purchased {
                id: UpgradeId::STABLE,
                paid: 50,
                next_cost: 75,
                owned: 1,
            }
        );
        assert!(affinity.abs() < FLOAT_EPSILON);
        let stable = store.get(UpgradeId::STABLE).unwrap();
        assert_eq!(stable.owned, 1);
        assert_eq!(stable.current_cost, 75);
    }

    #[test]
    fn insufficient_affinity_declines_without_change() {
        let mut store = UpgradeStore::standard();
        let mut affinity = 10.0;

        let outcome = store.purchase(&mut affinity, UpgradeId::STABLE);

        assert_eq!(
            outcome,
            PurchaseOutcome::Declined {
                id: UpgradeId::STABLE,
                reason: DeclineReason::InsufficientAffinity { cost: 50 },
            }
        );
        assert!((affinity - 10.0).abs() < FLOAT_EPSILON);
        assert_eq!(store, UpgradeStore::standard());
    }

    #[test]
    fn escalation_compounds_and_rounds_down() {
        let mut store = UpgradeStore::standard();
        let mut affinity = 10_000.0;
        for _ in 0..3 {
            assert!(store.purchase(&mut affinity, UpgradeId::STABLE).is_purchased());
        }
        // 50 -> 75 -> 112 -> 168
        assert_eq!(store.get(UpgradeId::STABLE).unwrap().current_cost, 168);
        assert!((affinity - (10_000.0 - 50.0 - 75.0 - 112.0)).abs() < FLOAT_EPSILON);
        assert_eq!(escalate_cost(1), 1);
    }

    #[test]
    fn replayed_cost_matches_purchases_and_saturates() {
        assert_eq!(replay_cost(50, 0), 50);
        assert_eq!(replay_cost(50, 3), 168);
        assert_eq!(replay_cost(1, u32::MAX), 1);
        assert_eq!(replay_cost(50, u32::MAX), u64::MAX);
    }

    #[test]
    fn unlocks_are_binary_but_scaling_upgrades_stack() {
        let mut store = UpgradeStore::standard();
        let mut affinity = 100_000.0;
        assert!(!store.is_unlocked(Feature::Feeding));
        assert!(store.purchase(&mut affinity, UpgradeId::FEEDING_TROUGH).is_purchased());
        assert!(store.is_unlocked(Feature::Feeding));
        assert_eq!(
            store.purchase(&mut affinity, UpgradeId::FEEDING_TROUGH),
            PurchaseOutcome::Declined {
                id: UpgradeId::FEEDING_TROUGH,
                reason: DeclineReason::AlreadyUnlocked,
            }
        );

        for _ in 0..4 {
            assert!(store.purchase(&mut affinity, UpgradeId::TRAINER).is_purchased());
        }
        assert_eq!(store.owned(UpgradeId::TRAINER), 4);
        assert!((store.bond_strength() - 3.0).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn unknown_upgrade_is_declined() {
        let mut store = UpgradeStore::standard();
        let mut affinity = 1_000.0;
        let outcome = store.purchase(&mut affinity, UpgradeId(42));
        assert_eq!(
            outcome,
            PurchaseOutcome::Declined {
                id: UpgradeId(42),
                reason: DeclineReason::UnknownUpgrade,
            }
        );
    }

    #[test]
    fn catalog_json_is_validated_and_sorted() {
        let json = r#"[
            {"id": 7, "name": "Ember Shrine", "baseCost": 120,
             "effect": {"kind": "bond_boost", "per_unit": 0.25}},
            {"id": 2, "name": "Hay Loft", "baseCost": 40,
             "effect": {"kind": "hunger_relief", "per_unit": 1}}
        ]"#;
        let store = UpgradeStore::from_json(json).unwrap();
        let ids: Vec<UpgradeId> = store.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![UpgradeId(2), UpgradeId(7)]);
        assert_eq!(store.get(UpgradeId(7)).unwrap().current_cost, 120);

        let duplicate = r#"[
            {"id": 1, "name": "A", "baseCost": 1, "effect": {"kind": "hunger_relief", "per_unit": 1}},
            {"id": 1, "name": "B", "baseCost": 1, "effect": {"kind": "hunger_relief", "per_unit": 1}}
        ]"#;
        assert!(matches!(
            UpgradeStore::from_json(duplicate),
            Err(CatalogError::DuplicateId(UpgradeId(1)))
        ));
        assert!(matches!(
            UpgradeStore::from_json("[]"),
            Err(CatalogError::Empty)
        ));
        assert!(matches!(
            UpgradeStore::from_json("{"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn cheapest_available_skips_owned_unlocks() {
        let mut store = UpgradeStore::standard();
        assert_eq!(store.cheapest_available().unwrap().id, UpgradeId::STABLE);
        let mut affinity = 10_000.0;
        for _ in 0..5 {
            store.purchase(&mut affinity, UpgradeId::STABLE);
        }
        // Stable now costs 378; trainer at 200 is cheapest.
        assert_eq!(store.cheapest_available().unwrap().id, UpgradeId::TRAINER);
        store.reset();
        assert_eq!(store, UpgradeStore::standard());
    }

    #[test]
    fn normalize_caps_unlocks_and_floors_prices() {
        let mut store = UpgradeStore::standard();
        store.get_mut(UpgradeId::ARMORY).unwrap().owned = 3;
        store.get_mut(UpgradeId::TRAINER).unwrap().owned = 3;
        store.get_mut(UpgradeId::STABLE).unwrap().current_cost = 2;

        store.normalize();

        assert_eq!(store.owned(UpgradeId::ARMORY), 1);
        assert_eq!(store.owned(UpgradeId::TRAINER), 3);
        assert_eq!(store.get(UpgradeId::STABLE).unwrap().current_cost, 50);
    }
}
