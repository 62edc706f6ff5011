pub mod ai;
pub mod battle;
pub mod catalog;
pub mod damage;
pub mod error;
pub mod logger;
pub mod matchup;
pub mod matrix;
pub mod model;
pub mod simulator;
pub mod stats;
pub mod types;

pub use crate::ai::{ChargePolicy, ShieldStrategy};
pub use crate::battle::{BattleOptions, BattleResult, Outcome, Side, TimelineEvent};
pub use crate::catalog::{load_catalog, Catalog, MemoryCatalog};
pub use crate::error::{ErrorKind, SimError};
pub use crate::matchup::{MatchupReport, MatchupRequest};
pub use crate::simulator::{BattleRequest, CombatantRequest, Simulator};

use crate::logger::BattleLogger;
use crate::matrix::{compute_matrix, roster_requests, RosterFile};
use crate::model::StatTier;
use anyhow::Context;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BattleCommand {
    pub catalog_path: PathBuf,
    pub request_path: PathBuf,
    pub seed: u64,
    pub output_path: Option<PathBuf>,
    pub with_log: bool,
}

#[derive(Debug, Clone)]
pub struct MatrixCommand {
    pub catalog_path: PathBuf,
    pub roster_path: PathBuf,
    pub sims_per_cell: usize,
    pub seed: u64,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MatchupCommand {
    pub catalog_path: PathBuf,
    pub request: MatchupRequest,
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Battle(BattleCommand),
    Matrix(MatrixCommand),
    Matchup(MatchupCommand),
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file at {}", path.display()))?;
    let parsed = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    Ok(parsed)
}

pub fn load_request(path: &Path) -> anyhow::Result<BattleRequest> {
    load_json(path, "battle request")
}

pub fn load_roster(path: &Path) -> anyhow::Result<RosterFile> {
    load_json(path, "roster")
}

/// Runs one battle and renders it the way the battle endpoint reports it.
pub fn battle_report<C: Catalog + ?Sized>(
    catalog: &C,
    request: BattleRequest,
    seed: u64,
    with_log: bool,
) -> anyhow::Result<serde_json::Value> {
    let options = request.options;
    let (a, b, tier) = request.into_requests()?;
    let sim = Simulator::new(catalog).with_options(options);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut logger = BattleLogger::new_with_format(format!("pvp-{}", tier.key()));
    let result = sim
        .simulate_with_observer(&a, &b, tier, &mut rng, &mut logger)
        .with_context(|| format!("{} vs {}", a.species_id, b.species_id))?;

    let p1 = sim.species(&a.species_id)?;
    let p2 = sim.species(&b.species_id)?;
    let mut report = json!({
        "p1_name": p1.name,
        "p2_name": p2.name,
        "p1_species_id": p1.id,
        "p2_species_id": p2.id,
        "cp_cap": tier.cp_cap(),
        "result": result,
    });
    if with_log {
        report["log"] = logger.to_json();
    }
    Ok(report)
}

fn emit_json<T: serde::Serialize>(value: &T, output_path: Option<&Path>, what: &str) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match output_path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {what} to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

pub fn run_battle(opts: &BattleCommand) -> anyhow::Result<()> {
    let catalog = load_catalog(&opts.catalog_path)?;
    let request = load_request(&opts.request_path)?;
    let report = battle_report(&catalog, request, opts.seed, opts.with_log)?;
    emit_json(&report, opts.output_path.as_deref(), "battle result")
}

pub fn run_matchup(opts: &MatchupCommand) -> anyhow::Result<()> {
    let catalog = load_catalog(&opts.catalog_path)?;
    let sim = Simulator::new(&catalog);
    let report = sim
        .matchup(&opts.request.opponent, &opts.request.team)
        .with_context(|| format!("matchup for {}", opts.request.opponent))?;
    emit_json(&report, opts.output_path.as_deref(), "matchup report")
}

pub fn run_matrix(opts: &MatrixCommand) -> anyhow::Result<()> {
    if opts.sims_per_cell == 0 {
        anyhow::bail!("--sims-per-cell must be > 0");
    }
    let catalog = load_catalog(&opts.catalog_path)?;
    let roster = load_roster(&opts.roster_path)?;
    let tier = StatTier::from_cp_cap(roster.cp_cap)?;
    let roster_a = roster_requests(&roster.roster_a, &catalog)?;
    let roster_b = roster_requests(&roster.roster_b, &catalog)?;
    let sim = Simulator::new(&catalog).with_options(roster.options);
    let matrix = compute_matrix(&sim, &roster_a, &roster_b, tier, opts.sims_per_cell, opts.seed)?;

    let labels = |requests: &[CombatantRequest]| -> Vec<String> {
        requests.iter().map(|r| r.species_id.clone()).collect()
    };
    matrix::write_csv(&labels(&roster_a), &labels(&roster_b), &matrix, &opts.output_path)?;
    println!(
        "Wrote {}x{} matrix to {}",
        matrix.len(),
        matrix.first().map(|r| r.len()).unwrap_or(0),
        opts.output_path.display()
    );
    Ok(())
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Battle(opts) => run_battle(&opts),
        Command::Matrix(opts) => run_matrix(&opts),
        Command::Matchup(opts) => run_matchup(&opts),
    }
}
