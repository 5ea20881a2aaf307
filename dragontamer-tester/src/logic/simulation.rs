use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use dragontamer_game::{
    ConfigError, EngineConfig, EngineEvent, FeedOutcome, MemoryStorage, Stage, Stats, TamerEngine,
    UpgradeStore,
};

use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

/// Failures beyond this many per run are counted but not recorded.
const MAX_RECORDED_FAILURES: usize = 10;

/// How long and how hard a simulated player plays.
#[derive(Debug, Clone, Copy)]
pub struct SimulationPlan {
    pub ticks: u32,
    pub bonds_per_tick: u32,
}

/// Tick at which a stage was first reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMark {
    pub stage: Stage,
    pub tick: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub seed: u64,
    pub strategy: String,
    pub creature_type: String,
    pub ticks: u32,
    pub final_stage: Stage,
    pub stage_marks: Vec<StageMark>,
    pub final_affinity: f64,
    pub bond_strength: f64,
    pub bonds: u64,
    pub feeds: u64,
    pub declined_feeds: u64,
    pub purchases: u32,
    pub declined_purchases: u32,
    pub min_stats: Stats,
    pub passed: bool,
    pub failures: Vec<String>,
    pub failure_count: usize,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl SimulationRecord {
    /// Tick at which `stage` was reached, if it was.
    #[must_use]
    pub fn reached_at(&self, stage: Stage) -> Option<u32> {
        self.stage_marks
            .iter()
            .find(|mark| mark.stage == stage)
            .map(|mark| mark.tick)
    }

    fn fail(&mut self, message: String) {
        self.failure_count += 1;
        if self.failures.len() < MAX_RECORDED_FAILURES {
            self.failures.push(message);
        }
    }
}

/// Drive one engine over in-memory storage and check its invariants after
/// every tick.
///
/// # Errors
///
/// Returns an error if `config` is invalid.
pub fn run_simulation(
    config: &EngineConfig,
    catalog: &UpgradeStore,
    strategy: GameplayStrategy,
    seed: u64,
    plan: SimulationPlan,
) -> Result<SimulationRecord, ConfigError> {
    let started = Instant::now();
    let mut engine =
        TamerEngine::open_with_catalog(MemoryStorage::new(), config.clone(), catalog.clone(), seed)?;
    let mut policy = strategy.create_policy(seed);
    log::debug!(
        "simulating {} for seed {seed} with a {} creature",
        policy.name(),
        engine.state().creature_type()
    );

    let mut record = SimulationRecord {
        seed,
        strategy: strategy.key().to_string(),
        creature_type: engine.state().creature_type().to_string(),
        ticks: plan.ticks,
        final_stage: Stage::Egg,
        stage_marks: vec![StageMark {
            stage: engine.state().stage,
            tick: 0,
        }],
        final_affinity: 0.0,
        bond_strength: 0.0,
        bonds: 0,
        feeds: 0,
        declined_feeds: 0,
        purchases: 0,
        declined_purchases: 0,
        min_stats: engine.state().stats,
        passed: true,
        failures: Vec::new(),
        failure_count: 0,
        duration: Duration::ZERO,
    };
    let mut last_stage = engine.state().stage;

    for tick in 1..=plan.ticks {
        engine.tick();
        let decision = policy.decide(engine.state(), plan.bonds_per_tick);
        for _ in 0..decision.bonds {
            engine.request_bond();
        }
        if decision.feed && engine.request_feed() != FeedOutcome::Fed {
            record.declined_feeds += 1;
        }
        if let Some(id) = decision.purchase {
            engine.request_purchase(id);
        }

        for event in engine.drain_events() {
            match event {
                EngineEvent::AffinityGained { .. } => record.bonds += 1,
                EngineEvent::Fed => record.feeds += 1,
                EngineEvent::UpgradePurchased { .. } => record.purchases += 1,
                EngineEvent::PurchaseDeclined { .. } => record.declined_purchases += 1,
                EngineEvent::StageChanged { from, to } => {
                    if from != last_stage || from.next() != Some(to) {
                        record.fail(format!(
                            "tick {tick}: stage jumped {from} -> {to} while at {last_stage}"
                        ));
                    }
                    last_stage = to;
                    record.stage_marks.push(StageMark { stage: to, tick });
                }
            }
        }

        check_invariants(&engine, &mut record, tick, last_stage);
        track_minimums(&mut record.min_stats, engine.state().stats);
    }

    let state = engine.state();
    record.final_stage = state.stage;
    record.final_affinity = state.affinity();
    record.bond_strength = state.bond_strength();
    record.passed = record.failure_count == 0;
    record.duration = started.elapsed();
    Ok(record)
}

fn check_invariants(
    engine: &TamerEngine<MemoryStorage>,
    record: &mut SimulationRecord,
    tick: u32,
    expected_stage: Stage,
) {
    let state = engine.state();
    if !state.stats.in_bounds() {
        record.fail(format!("tick {tick}: stats out of bounds {:?}", state.stats));
    }
    if !(state.affinity().is_finite() && state.affinity() >= 0.0) {
        record.fail(format!("tick {tick}: affinity {}", state.affinity()));
    }
    if state.stage != expected_stage {
        record.fail(format!(
            "tick {tick}: stage {} without a matching event",
            state.stage
        ));
    }
    for upgrade in state.upgrades.iter() {
        if upgrade.effect.is_binary() && upgrade.owned > 1 {
            record.fail(format!(
                "tick {tick}: {} owned {} times",
                upgrade.name, upgrade.owned
            ));
        }
    }
    if engine.persist_failures() > 0 {
        record.fail(format!(
            "tick {tick}: {} autosaves failed",
            engine.persist_failures()
        ));
    }
}

fn track_minimums(min: &mut Stats, current: Stats) {
    min.health = min.health.min(current.health);
    min.hunger = min.hunger.min(current.hunger);
    min.happiness = min.happiness.min(current.happiness);
    min.energy = min.energy.min(current.energy);
}

/// Run every strategy against every seed.
///
/// # Errors
///
/// Returns an error if `config` is invalid.
pub fn run_matrix(
    config: &EngineConfig,
    catalog: &UpgradeStore,
    strategies: &[GameplayStrategy],
    seeds: &[u64],
    plan: SimulationPlan,
) -> Result<Vec<SimulationRecord>, ConfigError> {
    let mut records = Vec::with_capacity(strategies.len() * seeds.len());
    for &strategy in strategies {
        for &seed in seeds {
            records.push(run_simulation(config, catalog, strategy, seed, plan)?);
        }
    }
    Ok(records)
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: SimulationPlan = SimulationPlan {
        ticks: 400,
        bonds_per_tick: 3,
    };

    fn run(strategy: GameplayStrategy, seed: u64) -> SimulationRecord {
        run_simulation(
            &EngineConfig::default(),
            &UpgradeStore::standard(),
            strategy,
            seed,
            PLAN,
        )
        .unwrap()
    }

    #[test]
    fn every_strategy_keeps_invariants() {
        for strategy in GameplayStrategy::ALL {
            for seed in [1, 2, 3] {
                let record = run(strategy, seed);
                assert!(record.passed, "{strategy} seed {seed}: {:?}", record.failures);
                assert_eq!(record.failure_count, 0);
            }
        }
    }

    #[test]
    fn bond_only_hatches_on_schedule() {
        let record = run(GameplayStrategy::BondOnly, 5);
        assert_eq!(record.bonds, u64::from(PLAN.ticks * PLAN.bonds_per_tick));
        assert_eq!(record.purchases, 0);
        // At least one affinity per bond, three bonds a tick: 50 within 17 ticks.
        let hatched = record.reached_at(Stage::Hatchling).unwrap();
        assert!(hatched <= 17, "hatched at {hatched}");
        assert_eq!(record.reached_at(Stage::Egg), Some(0));
    }

    #[test]
    fn balanced_outgrows_bond_only() {
        let balanced = run(GameplayStrategy::Balanced, 11);
        let bond_only = run(GameplayStrategy::BondOnly, 11);
        assert!(balanced.purchases > 0);
        assert!(balanced.bond_strength > bond_only.bond_strength);
    }

    #[test]
    fn random_strategy_hits_declines() {
        let record = run(GameplayStrategy::Random, 3);
        assert!(record.passed, "{:?}", record.failures);
        assert!(record.declined_purchases > 0);
    }

    #[test]
    fn stage_marks_are_ordered() {
        let record = run(GameplayStrategy::Balanced, 8);
        let stages: Vec<Stage> = record.stage_marks.iter().map(|mark| mark.stage).collect();
        let mut sorted = stages.clone();
        sorted.sort();
        assert_eq!(stages, sorted);
        assert_eq!(stages.last().copied(), Some(record.final_stage));
    }

    #[test]
    fn matrix_covers_each_pair() {
        let records = run_matrix(
            &EngineConfig::default(),
            &UpgradeStore::standard(),
            &[GameplayStrategy::BondOnly, GameplayStrategy::Hoarder],
            &[1, 2, 3],
            SimulationPlan {
                ticks: 10,
                bonds_per_tick: 1,
            },
        )
        .unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[3].strategy, "hoarder");
    }
}
