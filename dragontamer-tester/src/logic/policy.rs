use std::fmt;
use std::str::FromStr;

use dragontamer_game::{EconomyState, Feature, UpgradeId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// What a policy wants to do after one clock tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub bonds: u32,
    pub feed: bool,
    pub purchase: Option<UpgradeId>,
}

impl PolicyDecision {
    #[must_use]
    pub const fn bonds_only(bonds: u32) -> Self {
        Self {
            bonds,
            feed: false,
            purchase: None,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Decide the player input for the tick that just ran.
    fn decide(&mut self, state: &EconomyState, bonds_per_tick: u32) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    BondOnly,
    Balanced,
    Hoarder,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::BondOnly, Self::Balanced, Self::Hoarder, Self::Random];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::BondOnly => "bond-only",
            Self::Balanced => "balanced",
            Self::Hoarder => "hoarder",
            Self::Random => "random",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BondOnly => "Bond Only",
            Self::Balanced => "Balanced",
            Self::Hoarder => "Hoarder",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::BondOnly => "Bonds every tick, never feeds or shops",
            Self::Balanced => "Buys the cheapest upgrade it can afford and feeds when hungry",
            Self::Hoarder => "Saves until it holds twice an upgrade's price before buying",
            Self::Random => "Seeded mix of bonds, feeds and purchases, including bad ids",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::BondOnly => Box::new(BondOnlyPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Hoarder => Box::new(HoarderPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }

    /// Expand a list of strategy keys; `all` selects every strategy.
    ///
    /// # Errors
    ///
    /// Returns the first key that names no strategy.
    pub fn expand(keys: &[String]) -> Result<Vec<Self>, String> {
        let mut strategies = Vec::new();
        for key in keys {
            let selected: Vec<Self> = if key.eq_ignore_ascii_case("all") {
                Self::ALL.to_vec()
            } else {
                vec![key.parse().map_err(|()| key.clone())?]
            };
            for strategy in selected {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
        }
        Ok(strategies)
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key() == key)
            .ok_or(())
    }
}

struct BondOnlyPolicy;
struct BalancedPolicy;
struct HoarderPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

fn wants_food(state: &EconomyState, threshold: i32) -> bool {
    state.has_unlocked(Feature::Feeding) && state.stats.hunger >= threshold
}

impl PlayerPolicy for BondOnlyPolicy {
    fn name(&self) -> &'static str {
        "BondOnly"
    }

    fn decide(&mut self, _state: &EconomyState, bonds_per_tick: u32) -> PolicyDecision {
        PolicyDecision::bonds_only(bonds_per_tick)
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn decide(&mut self, state: &EconomyState, bonds_per_tick: u32) -> PolicyDecision {
        let purchase = state
            .upgrades
            .cheapest_available()
            .filter(|upgrade| upgrade.can_afford(state.affinity()))
            .map(|upgrade| upgrade.id);
        PolicyDecision {
            bonds: bonds_per_tick,
            feed: wants_food(state, 50),
            purchase,
        }
    }
}

impl PlayerPolicy for HoarderPolicy {
    fn name(&self) -> &'static str {
        "Hoarder"
    }

    fn decide(&mut self, state: &EconomyState, bonds_per_tick: u32) -> PolicyDecision {
        let purchase = state
            .upgrades
            .cheapest_available()
            .filter(|upgrade| upgrade.can_afford(state.affinity() / 2.0))
            .map(|upgrade| upgrade.id);
        PolicyDecision {
            bonds: bonds_per_tick,
            feed: wants_food(state, 80),
            purchase,
        }
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn decide(&mut self, state: &EconomyState, bonds_per_tick: u32) -> PolicyDecision {
        let bonds = self.rng.gen_range(0..=bonds_per_tick.saturating_mul(2));
        let feed = self.rng.gen_bool(0.3);
        let purchase = if self.rng.gen_bool(0.25) {
            // One slot past the catalog so unknown ids get exercised too.
            let ids: Vec<UpgradeId> = state.upgrades.iter().map(|upgrade| upgrade.id).collect();
            let pick = self.rng.gen_range(0..=ids.len());
            Some(ids.get(pick).copied().unwrap_or(UpgradeId(u32::MAX)))
        } else {
            None
        };
        PolicyDecision {
            bonds,
            feed,
            purchase,
        }
    }
}
