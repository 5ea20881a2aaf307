use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::actions::{self, BondOutcome, FeedOutcome};
use crate::config::{ConfigError, EngineConfig};
use crate::constants::MAX_PENDING_EVENTS;
use crate::event::EngineEvent;
use crate::evolution;
use crate::needs::{self, NeedsReport};
use crate::snapshot::{self, LoadReport, Snapshot};
use crate::state::{CreatureType, EconomyState};
use crate::storage::SaveStorage;
use crate::upgrades::{PurchaseOutcome, UpgradeId, UpgradeStore};

/// Failure to write the current state to its slot.
#[derive(Debug, Error)]
pub enum PersistError<E: std::error::Error + 'static> {
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage write failed: {0}")]
    Storage(#[source] E),
}

/// Engine handle for hosts that deliver ticks and input from several threads.
/// Every entry point goes through the one lock. Hosts should drain events
/// regularly; past [`MAX_PENDING_EVENTS`] the oldest are discarded.
pub type SharedEngine<S> = Arc<Mutex<TamerEngine<S>>>;

/// Owns the economy state and is the only writer to it.
///
/// Every entry point runs mutate, evolve, persist, emit in that order and
/// completes before returning.
#[derive(Debug)]
pub struct TamerEngine<S>
where
    S: SaveStorage,
{
    state: EconomyState,
    catalog: UpgradeStore,
    storage: S,
    config: EngineConfig,
    rng: ChaCha20Rng,
    events: VecDeque<EngineEvent>,
    load_report: LoadReport,
    persist_failures: u32,
}

impl<S> TamerEngine<S>
where
    S: SaveStorage,
{
    /// Restore from the configured slot, or hatch a fresh creature if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid. Storage and payload
    /// problems never fail the open.
    pub fn open(storage: S, config: EngineConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::open_with_catalog(storage, config, UpgradeStore::standard(), seed)
    }

    /// [`Self::open`] over a custom upgrade catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn open_with_catalog(
        storage: S,
        config: EngineConfig,
        catalog: UpgradeStore,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = ChaCha20Rng::seed_from_u64(seed);

        let payload = match storage.read_slot(&config.save_key) {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("could not read save slot {}: {err}", config.save_key);
                None
            }
        };

        let (state, load_report, fresh) = match payload {
            Some(payload) => {
                let (state, report) = snapshot::restore(&payload, &catalog, &mut rng);
                if report.unreadable {
                    log::warn!("save slot {} is unreadable; starting over", config.save_key);
                } else if !report.defaulted.is_empty() {
                    log::warn!(
                        "save slot {} restored with defaults for: {}",
                        config.save_key,
                        report.defaulted.join(", ")
                    );
                }
                (state, report, false)
            }
            None => {
                let state = EconomyState::with_catalog(CreatureType::roll(&mut rng), catalog.clone());
                log::info!("hatched a new {} egg", state.creature_type());
                (state, LoadReport::default(), true)
            }
        };

        let mut engine = Self {
            state,
            catalog,
            storage,
            config,
            rng,
            events: VecDeque::new(),
            load_report,
            persist_failures: 0,
        };
        if fresh {
            engine.persist();
        }
        Ok(engine)
    }

    /// Take over an explicitly built state, overwriting the configured slot.
    /// The state is normalized before it is first written.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_state(
        mut state: EconomyState,
        storage: S,
        config: EngineConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        state.normalize();
        let mut catalog = state.upgrades.clone();
        catalog.reset();
        let mut engine = Self {
            state,
            catalog,
            storage,
            config,
            rng: ChaCha20Rng::seed_from_u64(seed),
            events: VecDeque::new(),
            load_report: LoadReport::default(),
            persist_failures: 0,
        };
        engine.persist();
        Ok(engine)
    }

    /// Clock entry point: one needs-decay step.
    pub fn tick(&mut self) -> NeedsReport {
        let report = needs::apply_needs_tick(&mut self.state);
        self.evolve();
        self.persist();
        report
    }

    /// Player entry point: bond with the creature.
    pub fn request_bond(&mut self) -> BondOutcome {
        let outcome = actions::bond(&mut self.state);
        self.evolve();
        self.persist();
        self.emit(EngineEvent::AffinityGained { amount: outcome.gain });
        outcome
    }

    /// Player entry point: feed the creature. Declined feeds change nothing.
    pub fn request_feed(&mut self) -> FeedOutcome {
        let outcome = actions::feed(&mut self.state, self.config.require_feed_unlock);
        if outcome == FeedOutcome::Fed {
            self.persist();
            self.emit(EngineEvent::Fed);
        }
        outcome
    }

    /// Player entry point: buy one unit of an upgrade.
    pub fn request_purchase(&mut self, id: UpgradeId) -> PurchaseOutcome {
        let outcome = self.state.purchase(id);
        match outcome {
            PurchaseOutcome::Purchased { paid, owned, .. } => {
                log::info!("purchased upgrade {id} for {paid} (now owned {owned})");
                self.persist();
                self.emit(EngineEvent::UpgradePurchased { id });
            }
            PurchaseOutcome::Declined { reason, .. } => {
                log::debug!("purchase of upgrade {id} declined: {reason:?}");
                self.emit(EngineEvent::PurchaseDeclined { id });
            }
        }
        outcome
    }

    /// Discard the creature and hatch a new one.
    pub fn new_game(&mut self) {
        if let Err(err) = self.storage.clear_slot(&self.config.save_key) {
            log::warn!("could not clear save slot {}: {err}", self.config.save_key);
        }
        self.state = EconomyState::with_catalog(
            CreatureType::roll(&mut self.rng),
            self.catalog.clone(),
        );
        self.events.clear();
        log::info!("hatched a new {} egg", self.state.creature_type());
        self.persist();
    }

    /// Hand pending events to the presentation layer, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    /// Write the current state, surfacing any failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized or written.
    pub fn flush(&self) -> Result<(), PersistError<S::Error>> {
        let payload = Snapshot::capture(&self.state).to_json()?;
        self.storage
            .write_slot(&self.config.save_key, &payload)
            .map_err(PersistError::Storage)
    }

    /// Flush and give the storage back.
    ///
    /// # Errors
    ///
    /// Returns an error if the final write fails.
    pub fn close(self) -> Result<S, PersistError<S::Error>> {
        self.flush()?;
        Ok(self.storage)
    }

    #[must_use]
    pub fn into_shared(self) -> SharedEngine<S> {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub const fn state(&self) -> &EconomyState {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// What the last restore had to default.
    #[must_use]
    pub const fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// Writes that failed inside entry points since the engine was opened.
    #[must_use]
    pub const fn persist_failures(&self) -> u32 {
        self.persist_failures
    }

    fn evolve(&mut self) {
        if let Some(change) = evolution::advance(&mut self.state) {
            self.emit(change.into());
        }
    }

    fn emit(&mut self, event: EngineEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS
            && let Some(dropped) = self.events.pop_front()
        {
            log::debug!("event queue full; dropped {}", dropped.log_key());
        }
        self.events.push_back(event);
    }

    fn persist(&mut self) {
        if let Err(err) = self.flush() {
            self.persist_failures = self.persist_failures.saturating_add(1);
            log::warn!("autosave to {} failed: {err}", self.config.save_key);
        }
    }
}
