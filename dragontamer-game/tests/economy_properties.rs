use dragontamer_game::{
    CreatureType, DeclineReason, EconomyState, EngineConfig, EngineEvent, FeedOutcome,
    MemoryStorage, PurchaseOutcome, Stage, TamerEngine, UpgradeId,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const EPSILON: f64 = 1e-9;

fn engine_with(state: EconomyState) -> TamerEngine<MemoryStorage> {
    TamerEngine::from_state(state, MemoryStorage::new(), EngineConfig::default(), 42)
        .expect("default config is valid")
}

#[test]
fn random_operation_sequences_keep_invariants() {
    for seed in [1_u64, 7, 1337, 9001] {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut engine =
            TamerEngine::open(MemoryStorage::new(), EngineConfig::default(), seed).unwrap();
        let mut last_stage = engine.state().stage;

        for _ in 0..2_000 {
            match rng.gen_range(0..6) {
                0 => {
                    engine.tick();
                }
                1 | 2 => {
                    engine.request_bond();
                }
                3 => {
                    engine.request_feed();
                }
                _ => {
                    let id = UpgradeId(rng.gen_range(0..=6));
                    engine.request_purchase(id);
                }
            }

            let state = engine.state();
            assert!(state.stats.in_bounds(), "seed {seed}: {:?}", state.stats);
            assert!(state.affinity() >= 0.0, "seed {seed}");
            assert!(state.stage >= last_stage, "seed {seed}: stage regressed");
            last_stage = state.stage;
            for upgrade in state.upgrades.iter() {
                if upgrade.effect.is_binary() {
                    assert!(upgrade.owned <= 1, "seed {seed}: {} owned twice", upgrade.name);
                }
                assert!(upgrade.current_cost >= upgrade.base_cost);
            }
        }
        assert_eq!(engine.persist_failures(), 0);
    }
}

#[test]
fn first_stable_purchase_spends_exactly_its_price() {
    let mut state = EconomyState::new(CreatureType::Ice);
    state.set_affinity(50.0);
    let mut engine = engine_with(state);

    let outcome = engine.request_purchase(UpgradeId::STABLE);

    assert_eq!(
        outcome,
        PurchaseOutcome::Purchased {
            id: UpgradeId::STABLE,
            paid: 50,
            next_cost: 75,
            owned: 1,
        }
    );
    assert!(engine.state().affinity().abs() < EPSILON);
    let stable = engine.state().upgrades.get(UpgradeId::STABLE).unwrap();
    assert_eq!(stable.owned, 1);
    assert_eq!(stable.current_cost, 75);
}

#[test]
fn unaffordable_purchase_is_declined_without_side_effects() {
    let mut state = EconomyState::new(CreatureType::Forest);
    state.set_affinity(49.0);
    let mut engine = engine_with(state);
    let before = engine.state().clone();

    let outcome = engine.request_purchase(UpgradeId::STABLE);

    assert_eq!(
        outcome,
        PurchaseOutcome::Declined {
            id: UpgradeId::STABLE,
            reason: DeclineReason::InsufficientAffinity { cost: 50 },
        }
    );
    assert_eq!(engine.state(), &before);
}

#[test]
fn feeding_a_sated_creature_changes_nothing() {
    let mut state = EconomyState::new(CreatureType::Fire);
    state.upgrades.get_mut(UpgradeId::FEEDING_TROUGH).unwrap().owned = 1;
    let mut engine = engine_with(state);
    let before = engine.state().clone();

    assert_eq!(engine.request_feed(), FeedOutcome::NotHungry);
    assert_eq!(engine.state(), &before);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn feeding_is_locked_until_trough_is_owned() {
    let mut state = EconomyState::new(CreatureType::Fire);
    state.stats.hunger = 60;
    state.set_affinity(300.0);
    let mut engine = engine_with(state);

    assert_eq!(engine.request_feed(), FeedOutcome::Locked);
    assert_eq!(engine.state().stats.hunger, 60);

    assert!(
        engine
            .request_purchase(UpgradeId::FEEDING_TROUGH)
            .is_purchased()
    );
    assert_eq!(engine.request_feed(), FeedOutcome::Fed);
    assert_eq!(engine.state().stats.hunger, 30);
}

#[test]
fn unlocked_feeding_can_be_disabled_by_config() {
    let mut state = EconomyState::new(CreatureType::Ice);
    state.stats.hunger = 10;
    let config = EngineConfig {
        require_feed_unlock: false,
        ..EngineConfig::default()
    };
    let mut engine = TamerEngine::from_state(state, MemoryStorage::new(), config, 1).unwrap();

    assert_eq!(engine.request_feed(), FeedOutcome::Fed);
    assert_eq!(engine.state().stats.hunger, 0);
    assert_eq!(engine.drain_events(), vec![EngineEvent::Fed]);
}

#[test]
fn tick_raises_hunger_by_five_for_non_ice() {
    let mut state = EconomyState::new(CreatureType::Fire);
    state.stats.hunger = 90;
    let mut engine = engine_with(state);

    engine.tick();

    assert_eq!(engine.state().stats.hunger, 95);
    assert_eq!(engine.state().stats.happiness, 48);
}

#[test]
fn bond_from_forty_nine_hatches_the_egg() {
    let mut state = EconomyState::new(CreatureType::Forest);
    state.set_affinity(49.0);
    let mut engine = engine_with(state);

    let outcome = engine.request_bond();

    assert!((outcome.gain - 1.0).abs() < EPSILON);
    assert!((engine.state().affinity() - 50.0).abs() < EPSILON);
    assert_eq!(engine.state().stage, Stage::Hatchling);
}

#[test]
fn stages_advance_one_step_per_evaluation() {
    let mut state = EconomyState::new(CreatureType::Ice);
    state.set_affinity(6_000.0);
    let mut engine = engine_with(state);

    let mut seen = vec![engine.state().stage];
    for _ in 0..4 {
        engine.tick();
        seen.push(engine.state().stage);
    }

    assert_eq!(seen, Stage::ALL.to_vec());
    engine.tick();
    assert_eq!(engine.state().stage, Stage::Elder);
}

#[test]
fn purchases_never_regress_the_stage() {
    let mut state = EconomyState::new(CreatureType::Fire);
    state.set_affinity(1_000.0);
    state.stage = Stage::Adult;
    let mut engine = engine_with(state);

    assert!(
        engine
            .request_purchase(UpgradeId::WIZARD_TOWER)
            .is_purchased()
    );
    assert!(engine.state().affinity().abs() < EPSILON);
    engine.tick();
    assert_eq!(engine.state().stage, Stage::Adult);
}

#[test]
fn trainer_raises_bond_gain_immediately() {
    let mut state = EconomyState::new(CreatureType::Fire);
    state.set_affinity(200.0);
    let mut engine = engine_with(state);

    assert!(engine.request_purchase(UpgradeId::TRAINER).is_purchased());
    let outcome = engine.request_bond();

    // 1.0 base + 0.5 trainer + 1.0 fire bonus
    assert!((outcome.gain - 2.5).abs() < EPSILON);
    assert!((engine.snapshot().bond_strength - 1.5).abs() < EPSILON);
}

#[test]
fn unlock_upgrades_are_bought_once() {
    let mut state = EconomyState::new(CreatureType::Ice);
    state.set_affinity(5_000.0);
    let mut engine = engine_with(state);

    assert!(engine.request_purchase(UpgradeId::ARMORY).is_purchased());
    let affinity = engine.state().affinity();
    assert_eq!(
        engine.request_purchase(UpgradeId::ARMORY),
        PurchaseOutcome::Declined {
            id: UpgradeId::ARMORY,
            reason: DeclineReason::AlreadyUnlocked,
        }
    );
    assert!((engine.state().affinity() - affinity).abs() < EPSILON);
}

#[test]
fn shared_engine_serializes_entry_points_across_threads() {
    let engine = TamerEngine::open(MemoryStorage::new(), EngineConfig::default(), 3)
        .unwrap()
        .into_shared();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    engine.lock().unwrap().request_bond();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let mut engine = engine.lock().unwrap();
    let gains = engine
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, EngineEvent::AffinityGained { .. }))
        .count();
    assert_eq!(gains, 100);
    assert!(engine.state().affinity() >= 100.0 - EPSILON);
}
