//! Save format and the tolerant loader.
//!
//! Saves are written as one camelCase JSON record per slot. Loading never
//! fails: each field that is missing or malformed falls back to its default
//! on its own, and the names of those fields are reported back. Saves made by
//! the original browser build (`dragonAffinity`, `medievalUpgrades`, ...) are
//! read through the same path.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::SNAPSHOT_VERSION;
use crate::numbers::{floor_f64_to_u64, round_f64_to_i32};
use crate::state::{CreatureType, EconomyState, Stage, Stats};
use crate::upgrades::{UpgradeId, UpgradeStore, replay_cost};

const KEY_AFFINITY: (&str, &str) = ("affinity", "dragonAffinity");
const KEY_BOND_STRENGTH: (&str, &str) = ("bondStrength", "bondStrength");
const KEY_STAGE: (&str, &str) = ("stage", "dragonStage");
const KEY_CREATURE: (&str, &str) = ("creatureType", "dragonType");
const KEY_STATS: (&str, &str) = ("stats", "dragonStats");
const KEY_UPGRADES: (&str, &str) = ("upgrades", "medievalUpgrades");
const KEY_OWNED: (&str, &str) = ("ownedCount", "owned");
const KEY_COST: (&str, &str) = ("currentCost", "cost");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRecord {
    pub id: UpgradeId,
    #[serde(default)]
    pub name: String,
    pub owned_count: u32,
    pub current_cost: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub affinity: f64,
    /// Written for readers of the raw save; ignored on load since it is derived.
    pub bond_strength: f64,
    pub stage: Stage,
    pub creature_type: CreatureType,
    pub stats: Stats,
    pub upgrades: Vec<UpgradeRecord>,
}

impl Snapshot {
    #[must_use]
    pub fn capture(state: &EconomyState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            affinity: state.affinity(),
            bond_strength: state.bond_strength(),
            stage: state.stage,
            creature_type: state.creature_type(),
            stats: state.stats,
            upgrades: state
                .upgrades
                .iter()
                .map(|upgrade| UpgradeRecord {
                    id: upgrade.id,
                    name: upgrade.name.clone(),
                    owned_count: upgrade.owned,
                    current_cost: upgrade.current_cost,
                })
                .collect(),
        }
    }

    /// Serialize for a storage slot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Which fields a load had to substitute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// The payload was not a JSON object at all; a fresh state was built.
    pub unreadable: bool,
    /// At least one field was read from the legacy browser layout.
    pub legacy: bool,
    pub defaulted: Vec<String>,
}

impl LoadReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.unreadable && self.defaulted.is_empty()
    }

    fn default_field(&mut self, name: &str) {
        self.defaulted.push(name.to_string());
    }
}

/// Rebuild a state from a stored payload over `catalog`.
///
/// `rng` is only consulted when the creature type is missing.
pub fn restore<R: Rng + ?Sized>(
    payload: &str,
    catalog: &UpgradeStore,
    rng: &mut R,
) -> (EconomyState, LoadReport) {
    let mut report = LoadReport::default();
    let root = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => map,
        _ => {
            report.unreadable = true;
            let state = EconomyState::with_catalog(CreatureType::roll(rng), catalog.clone());
            return (state, report);
        }
    };

    let creature = lookup(&root, KEY_CREATURE, &mut report)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<CreatureType>().ok())
        .unwrap_or_else(|| {
            report.default_field(KEY_CREATURE.0);
            CreatureType::roll(rng)
        });
    let mut state = EconomyState::with_catalog(creature, catalog.clone());

    match lookup(&root, KEY_AFFINITY, &mut report).and_then(Value::as_f64) {
        Some(value) if value.is_finite() && value >= 0.0 => state.set_affinity(value),
        _ => report.default_field(KEY_AFFINITY.0),
    }

    match lookup(&root, KEY_STAGE, &mut report)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<Stage>().ok())
    {
        Some(stage) => state.stage = stage,
        None => report.default_field(KEY_STAGE.0),
    }

    match lookup(&root, KEY_STATS, &mut report).and_then(Value::as_object) {
        Some(stats) => state.stats = restore_stats(stats, &mut report),
        None => report.default_field(KEY_STATS.0),
    }

    match lookup(&root, KEY_UPGRADES, &mut report).and_then(Value::as_array) {
        Some(records) => restore_upgrades(&mut state.upgrades, records, &mut report),
        None => report.default_field(KEY_UPGRADES.0),
    }

    if let Some(stored) = lookup(&root, KEY_BOND_STRENGTH, &mut report).and_then(Value::as_f64)
        && (stored - state.bond_strength()).abs() > f64::EPSILON
    {
        log::debug!(
            "stored bond strength {stored} differs from derived {}; using derived",
            state.bond_strength()
        );
    }

    (state, report)
}

fn lookup<'a>(
    map: &'a Map<String, Value>,
    (modern, legacy): (&str, &str),
    report: &mut LoadReport,
) -> Option<&'a Value> {
    if let Some(value) = map.get(modern) {
        return Some(value);
    }
    let value = map.get(legacy)?;
    report.legacy = true;
    Some(value)
}

fn restore_stats(map: &Map<String, Value>, report: &mut LoadReport) -> Stats {
    let defaults = Stats::default();
    let mut read = |name: &str, fallback: i32| -> i32 {
        map.get(name)
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite())
            .map_or_else(
                || {
                    report.default_field(&format!("stats.{name}"));
                    fallback
                },
                round_f64_to_i32,
            )
    };
    let mut stats = Stats {
        health: read("health", defaults.health),
        hunger: read("hunger", defaults.hunger),
        happiness: read("happiness", defaults.happiness),
        energy: read("energy", defaults.energy),
    };
    stats.clamp();
    stats
}

fn restore_upgrades(store: &mut UpgradeStore, records: &[Value], report: &mut LoadReport) {
    for record in records {
        let Some(fields) = record.as_object() else {
            report.default_field("upgrades[]");
            continue;
        };
        let Some(id) = fields
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|raw| u32::try_from(raw).ok())
            .map(UpgradeId)
        else {
            report.default_field("upgrades[].id");
            continue;
        };
        let Some(upgrade) = store.get_mut(id) else {
            log::debug!("ignoring saved upgrade {id} that is not in the catalog");
            continue;
        };

        let Some(owned) = lookup(fields, KEY_OWNED, report)
            .and_then(Value::as_u64)
            .and_then(|raw| u32::try_from(raw).ok())
        else {
            report.default_field(&format!("upgrades[{id}].ownedCount"));
            continue;
        };
        let owned = if upgrade.effect.is_binary() {
            owned.min(1)
        } else {
            owned
        };

        let cost = lookup(fields, KEY_COST, report)
            .and_then(Value::as_f64)
            .map(floor_f64_to_u64)
            .filter(|cost| *cost >= upgrade.base_cost)
            .unwrap_or_else(|| {
                report.default_field(&format!("upgrades[{id}].currentCost"));
                replay_cost(upgrade.base_cost, owned)
            });

        upgrade.owned = owned;
        upgrade.current_cost = cost;
    }
}
