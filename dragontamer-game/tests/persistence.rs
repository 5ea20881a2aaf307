use dragontamer_game::{
    CreatureType, EconomyState, EngineConfig, MemoryStorage, SaveStorage, Snapshot, Stage, Stats,
    TamerEngine, UpgradeId, UpgradeStore,
};
use serde_json::json;

const SLOT: &str = "dragonTamer";

#[test]
fn state_survives_a_save_and_reload() {
    let storage = MemoryStorage::new();
    let mut state = EconomyState::new(CreatureType::Forest);
    state.set_affinity(260.0);
    state.stats.hunger = 40;
    let mut engine =
        TamerEngine::from_state(state, storage.clone(), EngineConfig::default(), 8).unwrap();
    engine.tick();
    assert!(engine.request_purchase(UpgradeId::STABLE).is_purchased());
    assert!(engine.request_purchase(UpgradeId::TRAINER).is_purchased());
    engine.request_bond();
    let expected = engine.snapshot();
    engine.close().unwrap();

    let reopened = TamerEngine::open(storage, EngineConfig::default(), 999).unwrap();

    assert!(reopened.load_report().is_clean());
    assert!(!reopened.load_report().legacy);
    assert_eq!(reopened.snapshot(), expected);
    assert_eq!(reopened.state().creature_type(), CreatureType::Forest);
    assert_eq!(reopened.state().stage, Stage::Hatchling);
    assert_eq!(reopened.state().upgrades.owned(UpgradeId::TRAINER), 1);
    assert_eq!(
        reopened
            .state()
            .upgrades
            .get(UpgradeId::STABLE)
            .unwrap()
            .current_cost,
        75
    );
}

#[test]
fn custom_save_key_is_used_for_every_write() {
    let storage = MemoryStorage::new();
    let config = EngineConfig {
        save_key: "slot-b".to_string(),
        ..EngineConfig::default()
    };
    let mut engine = TamerEngine::open(storage.clone(), config, 2).unwrap();
    engine.request_bond();

    assert!(storage.peek(SLOT).is_none());
    let saved: Snapshot = serde_json::from_str(&storage.peek("slot-b").unwrap()).unwrap();
    assert!((saved.affinity - engine.state().affinity()).abs() < f64::EPSILON);
}

#[test]
fn partial_snapshot_fills_missing_stats_with_defaults() {
    let payload = json!({
        "affinity": 75,
        "stage": "hatchling",
        "creatureType": "ice",
        "stats": {"hunger": 20}
    })
    .to_string();
    let storage = MemoryStorage::with_slot(SLOT, &payload);

    let engine = TamerEngine::open(storage, EngineConfig::default(), 4).unwrap();

    assert_eq!(
        engine.state().stats,
        Stats {
            hunger: 20,
            ..Stats::default()
        }
    );
    assert_eq!(engine.state().stage, Stage::Hatchling);
    assert_eq!(engine.state().upgrades.total_owned(), 0);
    let defaulted = &engine.load_report().defaulted;
    for field in ["stats.health", "stats.happiness", "stats.energy", "upgrades"] {
        assert!(defaulted.iter().any(|f| f == field), "{field} in {defaulted:?}");
    }
}

#[test]
fn legacy_browser_save_is_migrated_on_next_write() {
    let payload = json!({
        "dragonAffinity": 1200.5,
        "bondStrength": 2.0,
        "dragonStage": "adult",
        "dragonType": "fire",
        "dragonStats": {"health": 90, "hunger": 12, "happiness": 64, "energy": 30},
        "medievalUpgrades": [
            {"id": 1, "name": "Stable", "cost": 112, "owned": 2},
            {"id": 2, "name": "Royal Trainer", "cost": 300, "owned": 1},
            {"id": 3, "name": "Wizard Tower", "cost": 1000, "owned": 0}
        ]
    })
    .to_string();
    let storage = MemoryStorage::with_slot(SLOT, &payload);

    let mut engine = TamerEngine::open(storage.clone(), EngineConfig::default(), 4).unwrap();

    assert!(engine.load_report().legacy);
    assert!(engine.load_report().is_clean());
    assert_eq!(engine.state().creature_type(), CreatureType::Fire);
    assert_eq!(engine.state().stage, Stage::Adult);
    assert_eq!(engine.state().stats.energy, 30);
    assert_eq!(engine.state().upgrades.owned(UpgradeId::STABLE), 2);
    // Derived from the trainer count, not the stored 2.0.
    assert!((engine.state().bond_strength() - 1.5).abs() < f64::EPSILON);

    // Opening does not rewrite a readable save; the first mutation does.
    assert_eq!(storage.peek(SLOT).as_deref(), Some(payload.as_str()));
    engine.tick();
    let rewritten: serde_json::Value = serde_json::from_str(&storage.peek(SLOT).unwrap()).unwrap();
    assert_eq!(rewritten["creatureType"], json!("fire"));
    assert_eq!(rewritten["version"], json!(1));
    assert!(rewritten.get("dragonAffinity").is_none());
}

#[test]
fn corrupt_payload_starts_a_fresh_creature() {
    let storage = MemoryStorage::with_slot(SLOT, "{\"affinity\": 12");

    let engine = TamerEngine::open(storage, EngineConfig::default(), 6).unwrap();

    assert!(engine.load_report().unreadable);
    assert!(!engine.load_report().is_clean());
    assert_eq!(engine.state().stage, Stage::Egg);
    assert!(engine.state().affinity().abs() < f64::EPSILON);
    assert_eq!(engine.state().stats, Stats::default());
}

#[test]
fn new_game_clears_the_slot_before_hatching() {
    let storage = MemoryStorage::new();
    let mut state = EconomyState::new(CreatureType::Ice);
    state.set_affinity(60.0);
    let mut engine =
        TamerEngine::from_state(state, storage.clone(), EngineConfig::default(), 12).unwrap();
    engine.request_bond();

    engine.new_game();

    let saved: Snapshot = serde_json::from_str(&storage.peek(SLOT).unwrap()).unwrap();
    assert_eq!(saved.stage, Stage::Egg);
    assert!(saved.affinity.abs() < f64::EPSILON);
    assert_eq!(saved.creature_type, engine.state().creature_type());
}

#[test]
fn custom_catalog_is_restored_by_id() {
    let catalog = UpgradeStore::from_json(
        r#"[
            {"id": 10, "name": "Nest", "baseCost": 5, "effect": {"kind": "hunger_relief", "per_unit": 1}},
            {"id": 11, "name": "Whistle", "baseCost": 8, "effect": {"kind": "bond_boost", "per_unit": 0.25}}
        ]"#,
    )
    .unwrap();
    let storage = MemoryStorage::new();
    let mut engine = TamerEngine::open_with_catalog(
        storage.clone(),
        EngineConfig::default(),
        catalog.clone(),
        21,
    )
    .unwrap();
    for _ in 0..8 {
        engine.request_bond();
    }
    assert!(engine.request_purchase(UpgradeId(11)).is_purchased());
    engine.close().unwrap();

    let reopened =
        TamerEngine::open_with_catalog(storage.clone(), EngineConfig::default(), catalog, 22)
            .unwrap();
    assert_eq!(reopened.state().upgrades.owned(UpgradeId(11)), 1);
    assert_eq!(reopened.state().upgrades.len(), 2);
    assert!(storage.read_slot(SLOT).unwrap().is_some());
}

#[test]
fn fractional_bond_boosts_survive_repeated_reloads() {
    let catalog = UpgradeStore::from_json(
        r#"[{"id": 1, "name": "Charm", "baseCost": 1, "effect": {"kind": "bond_boost", "per_unit": 0.1}}]"#,
    )
    .unwrap();
    let storage = MemoryStorage::new();
    let mut engine = TamerEngine::open_with_catalog(
        storage.clone(),
        EngineConfig::default(),
        catalog.clone(),
        31,
    )
    .unwrap();

    for round in 0..300_u64 {
        engine.request_bond();
        engine.request_purchase(UpgradeId(1));
        let expected = engine.snapshot();
        engine.close().unwrap();

        engine = TamerEngine::open_with_catalog(
            storage.clone(),
            EngineConfig::default(),
            catalog.clone(),
            round,
        )
        .unwrap();
        assert!(engine.load_report().is_clean(), "round {round}");
        assert_eq!(engine.snapshot(), expected, "round {round}");
    }
}
