use crate::ai::{ChargePolicy, ShieldStrategy};
use crate::battle::{BattleEngine, BattleOptions, BattleResult, CombatantSpec};
use crate::catalog::Catalog;
use crate::error::SimError;
use crate::logger::{BattleObserver, NoopObserver};
use crate::model::{MoveSpec, Moveset, SpeciesProfile, StatTier, StatTierProfile};
use crate::types::TypeChart;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SHIELDS: u8 = 2;
pub const DEFAULT_CP_CAP: u32 = 1500;

/// One side of a battle, by catalog id.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatantRequest {
    pub species_id: String,
    pub moveset: Moveset,
    pub shields: u8,
    pub shield_strategy: ShieldStrategy,
    pub charge_policy: ChargePolicy,
}

impl CombatantRequest {
    pub fn new(species_id: &str, moveset: Moveset) -> Self {
        Self {
            species_id: species_id.to_string(),
            moveset,
            shields: DEFAULT_SHIELDS,
            shield_strategy: ShieldStrategy::default(),
            charge_policy: ChargePolicy::default(),
        }
    }

    pub fn with_shields(mut self, shields: u8, strategy: ShieldStrategy) -> Self {
        self.shields = shields;
        self.shield_strategy = strategy;
        self
    }

    pub fn with_charge_policy(mut self, policy: ChargePolicy) -> Self {
        self.charge_policy = policy;
        self
    }
}

/// Battle payload as submitted by a client. Policy names stay strings until
/// [`BattleRequest::into_requests`] so a bad name reports the valid ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleRequest {
    pub p1_id: String,
    pub p2_id: String,
    pub p1_moves: Moveset,
    pub p2_moves: Moveset,
    #[serde(default = "default_shields")]
    pub p1_shields: u8,
    #[serde(default = "default_shields")]
    pub p2_shields: u8,
    #[serde(default = "default_shield_ai")]
    pub p1_shield_ai: String,
    #[serde(default = "default_shield_ai")]
    pub p2_shield_ai: String,
    #[serde(default = "default_charge_ai")]
    pub p1_charge_ai: String,
    #[serde(default = "default_charge_ai")]
    pub p2_charge_ai: String,
    #[serde(default = "default_cp_cap")]
    pub cp_cap: u32,
    #[serde(default)]
    pub options: BattleOptions,
}

fn default_shields() -> u8 {
    DEFAULT_SHIELDS
}

fn default_shield_ai() -> String {
    ShieldStrategy::default().name().to_string()
}

fn default_charge_ai() -> String {
    ChargePolicy::default().name().to_string()
}

fn default_cp_cap() -> u32 {
    DEFAULT_CP_CAP
}

impl BattleRequest {
    pub fn into_requests(self) -> Result<(CombatantRequest, CombatantRequest, StatTier), SimError> {
        let tier = StatTier::from_cp_cap(self.cp_cap)?;
        let a = CombatantRequest::new(&self.p1_id, self.p1_moves)
            .with_shields(self.p1_shields, self.p1_shield_ai.parse()?)
            .with_charge_policy(self.p1_charge_ai.parse()?);
        let b = CombatantRequest::new(&self.p2_id, self.p2_moves)
            .with_shields(self.p2_shields, self.p2_shield_ai.parse()?)
            .with_charge_policy(self.p2_charge_ai.parse()?);
        Ok((a, b, tier))
    }
}

/// A species' learnset resolved against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct MoveOverview<'c> {
    pub species: &'c SpeciesProfile,
    pub fast_moves: Vec<&'c MoveSpec>,
    /// Charged moves with their damage per energy.
    pub charged_moves: Vec<(&'c MoveSpec, Option<f64>)>,
    pub best_moveset: Moveset,
}

/// Resolves catalog ids into engine input and runs battles.
///
/// Holds only shared references; one simulator can serve many threads.
pub struct Simulator<'c, C: Catalog + ?Sized> {
    catalog: &'c C,
    chart: &'c TypeChart,
    options: BattleOptions,
}

impl<'c, C: Catalog + ?Sized> Simulator<'c, C> {
    pub fn new(catalog: &'c C) -> Self {
        Self {
            catalog,
            chart: TypeChart::standard(),
            options: BattleOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BattleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &'c C {
        self.catalog
    }

    pub fn chart(&self) -> &'c TypeChart {
        self.chart
    }

    pub fn species(&self, id: &str) -> Result<&'c SpeciesProfile, SimError> {
        self.catalog
            .species(id)
            .ok_or_else(|| SimError::SpeciesNotFound(id.to_string()))
    }

    fn move_spec(&self, id: &str) -> Result<&'c MoveSpec, SimError> {
        self.catalog
            .move_spec(id)
            .ok_or_else(|| SimError::MoveNotFound(id.to_string()))
    }

    /// Fast move present and learnable, at most two charged moves, all learnable.
    pub fn validate_moveset(&self, profile: &SpeciesProfile, moveset: &Moveset) -> Result<(), SimError> {
        let fast = moveset
            .fast
            .as_deref()
            .ok_or_else(|| SimError::invalid_moveset(&profile.id, "missing fast move"))?;
        if !profile.learns_fast(fast) {
            return Err(SimError::invalid_moveset(
                &profile.id,
                format!("{fast} is not one of its fast moves"),
            ));
        }
        if moveset.charged.len() > 2 {
            return Err(SimError::invalid_moveset(
                &profile.id,
                format!("at most two charged moves, got {}", moveset.charged.len()),
            ));
        }
        if let Some(bad) = moveset.charged.iter().find(|m| !profile.learns_charged(m)) {
            return Err(SimError::invalid_moveset(
                &profile.id,
                format!("{bad} is not one of its charged moves"),
            ));
        }
        Ok(())
    }

    fn tier_profile(&self, species_id: &str, tier: StatTier) -> StatTierProfile {
        match self.catalog.stat_tier_profile(species_id, tier) {
            Some(profile) => profile,
            None => {
                debug!(
                    "no {} spread for {species_id}, using level 40 15/15/15",
                    tier.key()
                );
                StatTierProfile::default()
            }
        }
    }

    fn resolve(&self, request: &CombatantRequest, tier: StatTier) -> Result<CombatantSpec<'c>, SimError> {
        let profile = self.species(&request.species_id)?;
        self.validate_moveset(profile, &request.moveset)?;
        let fast = match request.moveset.fast.as_deref() {
            Some(id) => Some(self.move_spec(id)?),
            None => None,
        };
        let charged = request
            .moveset
            .charged
            .iter()
            .map(|id| self.move_spec(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CombatantSpec {
            profile,
            fast,
            charged,
            stat_profile: self.tier_profile(&profile.id, tier),
            shields: request.shields,
            shield_strategy: request.shield_strategy,
            charge_policy: request.charge_policy,
        })
    }

    pub fn simulate<R: Rng>(
        &self,
        a: &CombatantRequest,
        b: &CombatantRequest,
        tier: StatTier,
        rng: &mut R,
    ) -> Result<BattleResult, SimError> {
        self.simulate_with_observer(a, b, tier, rng, &mut NoopObserver)
    }

    pub fn simulate_with_observer<R: Rng>(
        &self,
        a: &CombatantRequest,
        b: &CombatantRequest,
        tier: StatTier,
        rng: &mut R,
        observer: &mut dyn BattleObserver,
    ) -> Result<BattleResult, SimError> {
        let a = self.resolve(a, tier)?;
        let b = self.resolve(b, tier)?;
        BattleEngine::new(self.chart, a, b, self.options)?.run(rng, observer)
    }

    pub fn move_overview(&self, species_id: &str) -> Result<MoveOverview<'c>, SimError> {
        let species = self.species(species_id)?;
        let fast_moves = species
            .fast_moves
            .iter()
            .filter_map(|id| self.catalog.move_spec(id))
            .collect();
        let charged_moves = species
            .charged_moves
            .iter()
            .filter_map(|id| self.catalog.move_spec(id))
            .map(|m| (m, m.dpe()))
            .collect();
        let best_moveset = self.catalog.best_moveset(&species.id).unwrap_or_default();
        Ok(MoveOverview {
            species,
            fast_moves,
            charged_moves,
            best_moveset,
        })
    }
}
