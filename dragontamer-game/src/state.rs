use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    ADULT_AFFINITY, DEFAULT_ENERGY, DEFAULT_HAPPINESS, DEFAULT_HEALTH, DEFAULT_HUNGER,
    ELDER_AFFINITY, HATCHLING_AFFINITY, JUVENILE_AFFINITY, STAT_MAX, STAT_MIN,
};
use crate::numbers::non_negative;
use crate::upgrades::{Feature, PurchaseOutcome, UpgradeId, UpgradeStore};

/// Growth stage of the creature. Ordering follows the evolution sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Egg,
    Hatchling,
    Juvenile,
    Adult,
    Elder,
}

impl Stage {
    pub const ALL: [Self; 5] = [
        Self::Egg,
        Self::Hatchling,
        Self::Juvenile,
        Self::Adult,
        Self::Elder,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Egg => "egg",
            Self::Hatchling => "hatchling",
            Self::Juvenile => "juvenile",
            Self::Adult => "adult",
            Self::Elder => "elder",
        }
    }

    /// The stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Egg => Some(Self::Hatchling),
            Self::Hatchling => Some(Self::Juvenile),
            Self::Juvenile => Some(Self::Adult),
            Self::Adult => Some(Self::Elder),
            Self::Elder => None,
        }
    }

    /// Affinity required to enter this stage.
    #[must_use]
    pub const fn threshold(self) -> f64 {
        match self {
            Self::Egg => 0.0,
            Self::Hatchling => HATCHLING_AFFINITY,
            Self::Juvenile => JUVENILE_AFFINITY,
            Self::Adult => ADULT_AFFINITY,
            Self::Elder => ELDER_AFFINITY,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "egg" => Ok(Self::Egg),
            "hatchling" => Ok(Self::Hatchling),
            "juvenile" => Ok(Self::Juvenile),
            "adult" => Ok(Self::Adult),
            "elder" => Ok(Self::Elder),
            _ => Err(()),
        }
    }
}

impl From<Stage> for String {
    fn from(value: Stage) -> Self {
        value.as_str().to_string()
    }
}

/// Elemental type rolled once when the creature is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatureType {
    Fire,
    Ice,
    Forest,
}

impl CreatureType {
    pub const ALL: [Self; 3] = [Self::Fire, Self::Ice, Self::Forest];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Ice => "ice",
            Self::Forest => "forest",
        }
    }

    #[must_use]
    pub const fn trait_label(self) -> &'static str {
        match self {
            Self::Fire => "Bonding gives +1 affinity",
            Self::Ice => "Hunger grows slower",
            Self::Forest => "Happiness decays slower",
        }
    }

    /// Uniformly pick a type.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for CreatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreatureType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fire" => Ok(Self::Fire),
            "ice" => Ok(Self::Ice),
            "forest" => Ok(Self::Forest),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub health: i32,
    pub hunger: i32,
    pub happiness: i32,
    pub energy: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            health: DEFAULT_HEALTH,
            hunger: DEFAULT_HUNGER,
            happiness: DEFAULT_HAPPINESS,
            energy: DEFAULT_ENERGY,
        }
    }
}

impl Stats {
    pub fn clamp(&mut self) {
        self.health = self.health.clamp(STAT_MIN, STAT_MAX);
        self.hunger = self.hunger.clamp(STAT_MIN, STAT_MAX);
        self.happiness = self.happiness.clamp(STAT_MIN, STAT_MAX);
        self.energy = self.energy.clamp(STAT_MIN, STAT_MAX);
    }

    #[must_use]
    pub fn in_bounds(&self) -> bool {
        [self.health, self.hunger, self.happiness, self.energy]
            .iter()
            .all(|value| (STAT_MIN..=STAT_MAX).contains(value))
    }
}

/// The authoritative mutable record of one creature's economy.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomyState {
    affinity: f64,
    pub stage: Stage,
    creature_type: CreatureType,
    pub stats: Stats,
    pub upgrades: UpgradeStore,
}

impl EconomyState {
    /// Fresh state: zero affinity, an egg, default stats, nothing owned.
    #[must_use]
    pub fn new(creature_type: CreatureType) -> Self {
        Self::with_catalog(creature_type, UpgradeStore::standard())
    }

    /// Fresh state over a custom catalog; owned counts and prices are reset.
    #[must_use]
    pub fn with_catalog(creature_type: CreatureType, mut upgrades: UpgradeStore) -> Self {
        upgrades.reset();
        Self {
            affinity: 0.0,
            stage: Stage::Egg,
            creature_type,
            stats: Stats::default(),
            upgrades,
        }
    }

    /// Roll a creature type and build a fresh state.
    pub fn hatch<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(CreatureType::roll(rng))
    }

    #[must_use]
    pub const fn affinity(&self) -> f64 {
        self.affinity
    }

    /// Overwrite the balance; negative or non-finite values become zero.
    pub fn set_affinity(&mut self, value: f64) {
        self.affinity = non_negative(value);
    }

    pub fn add_affinity(&mut self, gain: f64) {
        self.set_affinity(self.affinity + gain);
    }

    /// Spend affinity on one unit of an upgrade. See [`UpgradeStore::purchase`].
    pub fn purchase(&mut self, id: UpgradeId) -> PurchaseOutcome {
        self.upgrades.purchase(&mut self.affinity, id)
    }

    #[must_use]
    pub const fn creature_type(&self) -> CreatureType {
        self.creature_type
    }

    /// Multiplier on bond gains, recomputed from owned upgrades on every call.
    #[must_use]
    pub fn bond_strength(&self) -> f64 {
        self.upgrades.bond_strength()
    }

    #[must_use]
    pub fn has_unlocked(&self, feature: Feature) -> bool {
        self.upgrades.is_unlocked(feature)
    }

    /// Bring a hand-built state back inside the economy's bounds: stats
    /// clamped, affinity sanitized, unlocks owned at most once.
    pub fn normalize(&mut self) {
        self.stats.clamp();
        self.set_affinity(self.affinity);
        self.upgrades.normalize();
    }

    /// Apply a closure to the stats and clamp afterwards.
    pub fn adjust_stats(&mut self, f: impl FnOnce(&mut Stats)) {
        f(&mut self.stats);
        self.stats.clamp();
    }
}
