//! Interactive terminal session.
//!
//! The clock and stdin feed one task through `tokio::select!`, so ticks and
//! player commands reach the engine strictly one at a time.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt::Write as _;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, Instant, MissedTickBehavior};

use dragontamer_game::{
    DeclineReason, EconomyState, EngineEvent, FeedOutcome, PurchaseOutcome, SaveStorage,
    TamerEngine, UpgradeId,
};

const HELP: &str = "Commands: bond | feed | buy <id> | status | shop | new | help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Bond,
    Feed,
    Buy(UpgradeId),
    Status,
    Shop,
    New,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("type a command; try `help`")]
    Empty,
    #[error("unknown command {0:?}; try `help`")]
    Unknown(String),
    #[error("`buy` needs an upgrade id; see `shop`")]
    MissingId,
    #[error("{0:?} is not an upgrade id")]
    BadId(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?;
        match verb.to_ascii_lowercase().as_str() {
            "bond" | "b" => Ok(Self::Bond),
            "feed" | "f" => Ok(Self::Feed),
            "buy" => {
                let raw = words.next().ok_or(CommandError::MissingId)?;
                raw.parse::<u32>()
                    .map(|id| Self::Buy(UpgradeId(id)))
                    .map_err(|_| CommandError::BadId(raw.to_string()))
            }
            "status" | "s" => Ok(Self::Status),
            "shop" => Ok(Self::Shop),
            "new" => Ok(Self::New),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Run until `quit` or end of input, then flush the save.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or the final save fails.
pub async fn run<S: SaveStorage>(mut engine: TamerEngine<S>) -> Result<()> {
    let period = Duration::from_secs(engine.config().tick_interval_secs);
    let mut clock = time::interval_at(Instant::now() + period, period);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", status_text(engine.state()));
    println!("{}", HELP.dimmed());

    loop {
        tokio::select! {
            _ = clock.tick() => {
                engine.tick();
                print_events(&mut engine);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        let reply = apply(&mut engine, command);
                        print_events(&mut engine);
                        if let Some(reply) = reply {
                            println!("{reply}");
                        }
                    }
                    Err(err) => println!("{}", err.to_string().yellow()),
                }
            }
        }
    }

    engine.flush().context("saving before exit")?;
    println!("{}", "💾 Progress saved. Farewell, tamer.".green());
    Ok(())
}

fn print_events<S: SaveStorage>(engine: &mut TamerEngine<S>) {
    for event in engine.drain_events() {
        if let Some(line) = render_event(&event, engine.state()) {
            match event {
                EngineEvent::StageChanged { .. } => println!("{}", line.bright_magenta().bold()),
                EngineEvent::UpgradePurchased { .. } => println!("{}", line.bright_green()),
                _ => println!("{line}"),
            }
        }
    }
}

/// Dispatch one command; the return value is any reply beyond the events it emits.
pub fn apply<S: SaveStorage>(engine: &mut TamerEngine<S>, command: Command) -> Option<String> {
    match command {
        Command::Bond => {
            engine.request_bond();
            None
        }
        Command::Feed => match engine.request_feed() {
            FeedOutcome::Fed => None,
            FeedOutcome::NotHungry => Some("Your dragon is not hungry.".to_string()),
            FeedOutcome::Locked => {
                Some("Feeding is locked. Build the Feeding Trough first.".to_string())
            }
        },
        Command::Buy(id) => match engine.request_purchase(id) {
            PurchaseOutcome::Purchased { .. } => None,
            PurchaseOutcome::Declined { reason, .. } => {
                Some(decline_text(engine.state(), id, reason))
            }
        },
        Command::Status => Some(status_text(engine.state())),
        Command::Shop => Some(shop_text(engine.state())),
        Command::New => {
            engine.new_game();
            Some(format!(
                "A new {} egg appears. {}",
                engine.state().creature_type(),
                engine.state().creature_type().trait_label()
            ))
        }
        Command::Help => Some(HELP.to_string()),
        Command::Quit => None,
    }
}

fn upgrade_name(state: &EconomyState, id: UpgradeId) -> String {
    state
        .upgrades
        .get(id)
        .map_or_else(|| format!("upgrade {id}"), |upgrade| upgrade.name.clone())
}

#[must_use]
pub fn render_event(event: &EngineEvent, state: &EconomyState) -> Option<String> {
    match *event {
        EngineEvent::AffinityGained { amount } => Some(format!(
            "💞 +{amount:.1} affinity ({:.1} total)",
            state.affinity()
        )),
        EngineEvent::Fed => Some("🍖 Your dragon eats happily.".to_string()),
        EngineEvent::StageChanged { from, to } => {
            Some(format!("✨ Your dragon grew from {from} to {to}!"))
        }
        EngineEvent::UpgradePurchased { id } => {
            Some(format!("🏰 Built {}.", upgrade_name(state, id)))
        }
        EngineEvent::PurchaseDeclined { .. } => None,
    }
}

fn decline_text(state: &EconomyState, id: UpgradeId, reason: DeclineReason) -> String {
    match reason {
        DeclineReason::InsufficientAffinity { cost } => format!(
            "{} costs {cost} affinity; you have {:.1}.",
            upgrade_name(state, id),
            state.affinity()
        ),
        DeclineReason::AlreadyUnlocked => {
            format!("{} is already unlocked.", upgrade_name(state, id))
        }
        DeclineReason::UnknownUpgrade => format!("There is no upgrade {id}; see `shop`."),
    }
}

#[must_use]
pub fn status_text(state: &EconomyState) -> String {
    let creature = state.creature_type();
    let stats = state.stats;
    format!(
        "🐉 {} {} ({})\n   Affinity {:.1} | Bond strength {:.2}\n   Health {} | Hunger {} | Happiness {} | Energy {}",
        creature,
        state.stage,
        creature.trait_label(),
        state.affinity(),
        state.bond_strength(),
        stats.health,
        stats.hunger,
        stats.happiness,
        stats.energy
    )
}

#[must_use]
pub fn shop_text(state: &EconomyState) -> String {
    let mut text = String::from("🛒 Upgrades:");
    for upgrade in state.upgrades.iter() {
        let price = if upgrade.is_maxed() {
            "unlocked".to_string()
        } else {
            format!("{} affinity", upgrade.current_cost)
        };
        let _ = write!(
            text,
            "\n   [{}] {} - {} (owned {}) {}",
            upgrade.id,
            upgrade.name,
            price,
            upgrade.owned,
            upgrade.effect.describe()
        );
    }
    text
}
