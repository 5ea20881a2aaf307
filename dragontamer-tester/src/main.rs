mod common;
mod logic;
mod play;
mod storage;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::{parse_seeds, split_csv};
use dragontamer_game::{EngineConfig, TamerEngine, UpgradeStore};
use logic::{GameplayStrategy, SimulationPlan, SimulationRecord, run_matrix};
use storage::FileStorage;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RunMode {
    /// Headless strategy runs over in-memory saves (fast, scriptable)
    Simulate,
    /// Interactive terminal session with a real-time clock and file saves
    Play,
}

#[derive(Debug, Parser)]
#[command(name = "dragontamer-tester", version = "0.1.0")]
#[command(about = "Simulation harness and terminal host for the Dragon Tamer economy engine")]
struct Args {
    /// Run mode: simulate (strategies) or play (interactive)
    #[arg(long, value_enum, default_value_t = RunMode::Simulate)]
    mode: RunMode,

    /// Seeds to run (comma-separated); play mode uses the first
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Clock ticks per simulated run
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Bonds a simulated player makes after each tick
    #[arg(long, default_value_t = 3)]
    bonds_per_tick: u32,

    /// Strategies to simulate (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json", "markdown"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory holding play-mode save files
    #[arg(long, default_value = "target/dragontamer-saves")]
    save_dir: PathBuf,

    /// Engine configuration JSON (save key, tick interval, feed unlock rule)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Upgrade catalog JSON replacing the built-in five upgrades
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    let catalog = load_catalog(args.catalog.as_deref())?;
    let seeds = parse_seeds(&args.seeds)?;

    match args.mode {
        RunMode::Simulate => {
            let records = run_simulations(&args, &config, &catalog, &seeds)?;
            if records.iter().any(|r| !r.passed) {
                std::process::exit(1);
            }
        }
        RunMode::Play => {
            announce_banner();
            let storage = open_save_dir(&args.save_dir, &config.save_key)?;
            println!("💾 Saves live in {}", storage.dir().display());
            let engine = TamerEngine::open_with_catalog(storage, config, catalog, seeds[0])
                .context("starting engine")?;
            if !engine.load_report().is_clean() {
                eprintln!(
                    "⚠️  Save restored with defaults for: {}",
                    engine.load_report().defaulted.join(", ").yellow()
                );
            }
            play::run(engine).await?;
        }
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🐉 Dragon Tamer".bright_cyan().bold());
    println!("{}", "================".cyan());
}

fn open_save_dir(dir: &Path, save_key: &str) -> Result<FileStorage> {
    let storage = FileStorage::new(dir)
        .with_context(|| format!("opening save dir {}", dir.display()))?;
    storage
        .slot_path(save_key)
        .context("save key cannot be used as a file name")?;
    Ok(storage)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            EngineConfig::from_json(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    config.validate().context("invalid engine configuration")?;
    Ok(config)
}

fn load_catalog(path: Option<&Path>) -> Result<UpgradeStore> {
    let Some(path) = path else {
        return Ok(UpgradeStore::standard());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    UpgradeStore::from_json(&raw).with_context(|| format!("invalid catalog {}", path.display()))
}

fn expand_strategies(arg: &str) -> Result<Vec<GameplayStrategy>> {
    let keys = split_csv(arg);
    let strategies = GameplayStrategy::expand(&keys)
        .map_err(|key| anyhow::anyhow!("unknown strategy {key:?}; see --list-strategies"))?;
    anyhow::ensure!(!strategies.is_empty(), "no strategies selected");
    Ok(strategies)
}

fn run_simulations(
    args: &Args,
    config: &EngineConfig,
    catalog: &UpgradeStore,
    seeds: &[u64],
) -> Result<Vec<SimulationRecord>> {
    let console = args.report == "console";
    if console || args.output.is_some() {
        announce_banner();
    }

    let strategies = expand_strategies(&args.strategies)?;
    let plan = SimulationPlan {
        ticks: args.ticks,
        bonds_per_tick: args.bonds_per_tick,
    };
    let start_time = Instant::now();

    if args.verbose {
        println!(
            "🧪 {} strategies x {} seeds, {} ticks each",
            strategies.len(),
            seeds.len(),
            plan.ticks
        );
    }
    let records = run_matrix(config, catalog, &strategies, seeds, plan)?;
    if args.verbose {
        for record in &records {
            println!(
                "   {} seed {} -> {} in {:?}",
                record.strategy.bright_white(),
                record.seed,
                record.final_stage,
                record.duration
            );
        }
    }

    write_reports(args, plan, &records, start_time)?;
    Ok(records)
}

fn write_reports(
    args: &Args,
    plan: SimulationPlan,
    records: &[SimulationRecord],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, plan, records)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, plan, records)?,
        _ => {
            logic::reports::generate_console_report(
                &mut output_target,
                records,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
