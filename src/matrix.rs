use crate::ai::{ChargePolicy, ShieldStrategy};
use crate::battle::BattleOptions;
use crate::catalog::Catalog;
use crate::error::SimError;
use crate::model::{Moveset, StatTier};
use crate::simulator::{CombatantRequest, Simulator, DEFAULT_CP_CAP, DEFAULT_SHIELDS};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One roster slot. Without `moves` the catalog's best-known moveset is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub species_id: String,
    #[serde(default)]
    pub moves: Option<Moveset>,
    #[serde(default = "default_shields")]
    pub shields: u8,
    #[serde(default)]
    pub shield_ai: ShieldStrategy,
    #[serde(default)]
    pub charge_ai: ChargePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterFile {
    pub roster_a: Vec<RosterEntry>,
    pub roster_b: Vec<RosterEntry>,
    #[serde(default = "default_cp_cap")]
    pub cp_cap: u32,
    #[serde(default)]
    pub options: BattleOptions,
}

fn default_shields() -> u8 {
    DEFAULT_SHIELDS
}

fn default_cp_cap() -> u32 {
    DEFAULT_CP_CAP
}

impl RosterEntry {
    pub fn to_request<C: Catalog + ?Sized>(&self, catalog: &C) -> Result<CombatantRequest, SimError> {
        let moveset = match &self.moves {
            Some(moves) => moves.clone(),
            None => catalog
                .best_moveset(&self.species_id)
                .ok_or_else(|| SimError::SpeciesNotFound(self.species_id.clone()))?,
        };
        Ok(CombatantRequest::new(&self.species_id, moveset)
            .with_shields(self.shields, self.shield_ai)
            .with_charge_policy(self.charge_ai))
    }
}

pub fn roster_requests<C: Catalog + ?Sized>(
    entries: &[RosterEntry],
    catalog: &C,
) -> Result<Vec<CombatantRequest>, SimError> {
    entries.iter().map(|e| e.to_request(catalog)).collect()
}

struct CellResult {
    a_idx: usize,
    b_idx: usize,
    win_rate: f64,
}

/// Win rate of every `roster_a` entry against every `roster_b` entry, ties
/// counting half. Cells run in parallel; each has its own seeded RNG.
pub fn compute_matrix<C: Catalog + ?Sized>(
    sim: &Simulator<'_, C>,
    roster_a: &[CombatantRequest],
    roster_b: &[CombatantRequest],
    tier: StatTier,
    sims_per_cell: usize,
    seed: u64,
) -> Result<Vec<Vec<f64>>, SimError> {
    let tasks: Vec<(usize, usize)> = (0..roster_a.len())
        .flat_map(|a| (0..roster_b.len()).map(move |b| (a, b)))
        .collect();
    let cell_results: Vec<CellResult> = tasks
        .par_iter()
        .map(|&(a_idx, b_idx)| -> Result<CellResult, SimError> {
            let mut cell_rng = SmallRng::seed_from_u64(seed ^ ((a_idx as u64) << 32) ^ (b_idx as u64));
            let a = &roster_a[a_idx];
            let b = &roster_b[b_idx];
            let mut score = 0.0;
            for _ in 0..sims_per_cell {
                let mut battle_rng = SmallRng::seed_from_u64(cell_rng.gen());
                let result = sim.simulate(a, b, tier, &mut battle_rng)?;
                score += result.outcome.score_for_a();
            }
            Ok(CellResult {
                a_idx,
                b_idx,
                win_rate: score / sims_per_cell as f64,
            })
        })
        .collect::<Result<_, _>>()?;

    let mut matrix = vec![vec![0.0; roster_b.len()]; roster_a.len()];
    for cell in cell_results {
        matrix[cell.a_idx][cell.b_idx] = cell.win_rate;
    }
    Ok(matrix)
}

/// Header row of column labels, then one labelled row per roster-A entry.
pub fn format_csv(row_labels: &[String], col_labels: &[String], matrix: &[Vec<f64>]) -> String {
    let mut out = String::new();
    for label in col_labels {
        out.push(',');
        out.push_str(label);
    }
    for (row_idx, row) in matrix.iter().enumerate() {
        out.push('\n');
        out.push_str(row_labels.get(row_idx).map(String::as_str).unwrap_or(""));
        for value in row {
            out.push(',');
            out.push_str(&format!("{value:.4}"));
        }
    }
    out.push('\n');
    out
}

pub fn write_csv(
    row_labels: &[String],
    col_labels: &[String],
    matrix: &[Vec<f64>],
    path: &std::path::Path,
) -> anyhow::Result<()> {
    std::fs::write(path, format_csv(row_labels, col_labels, matrix))?;
    Ok(())
}
