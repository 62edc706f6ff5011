//! Read-only species and move data.
//!
//! Records are validated once when they enter a [`MemoryCatalog`]; lookups
//! after that never fail on malformed data.

use crate::error::SimError;
use crate::model::{BaseStats, BuffEffect, MoveSpec, Moveset, SpeciesProfile, StatTier, StatTierProfile};
use crate::types::Type;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub trait Catalog: Sync {
    /// Case-insensitive species lookup by id, then by display name.
    fn species(&self, id: &str) -> Option<&SpeciesProfile>;

    fn move_spec(&self, id: &str) -> Option<&MoveSpec>;

    fn stat_tier_profile(&self, species_id: &str, tier: StatTier) -> Option<StatTierProfile>;

    /// Best-known moveset: an explicit ranking entry if there is one, else the
    /// first fast move and the first two charged moves of the learnset.
    fn best_moveset(&self, species_id: &str) -> Option<Moveset> {
        self.species(species_id).map(learnset_moveset)
    }
}

fn learnset_moveset(profile: &SpeciesProfile) -> Moveset {
    Moveset {
        fast: profile.fast_moves.first().cloned(),
        charged: profile.charged_moves.iter().take(2).cloned().collect(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    species: HashMap<String, SpeciesProfile>,
    moves: HashMap<String, MoveSpec>,
    tiers: HashMap<(String, StatTier), StatTierProfile>,
    movesets: HashMap<String, Moveset>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_species(&mut self, profile: SpeciesProfile) {
        self.species.insert(profile.id.to_ascii_lowercase(), profile);
    }

    pub fn insert_move(&mut self, spec: MoveSpec) {
        self.moves.insert(spec.id.clone(), spec);
    }

    pub fn insert_stat_tier(&mut self, species_id: &str, tier: StatTier, profile: StatTierProfile) {
        self.tiers.insert((species_id.to_ascii_lowercase(), tier), profile);
    }

    pub fn insert_moveset(&mut self, species_id: &str, moveset: Moveset) {
        self.movesets.insert(species_id.to_ascii_lowercase(), moveset);
    }

    pub fn with_species(mut self, profile: SpeciesProfile) -> Self {
        self.insert_species(profile);
        self
    }

    pub fn with_move(mut self, spec: MoveSpec) -> Self {
        self.insert_move(spec);
        self
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Species with `t` among their types, sorted by id.
    pub fn species_by_type(&self, t: Type) -> Vec<&SpeciesProfile> {
        let mut found: Vec<&SpeciesProfile> =
            self.species.values().filter(|p| p.types.contains(&t)).collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    /// Species that can learn `move_id` as a fast or charged move, sorted by id.
    pub fn species_learning(&self, move_id: &str) -> Vec<&SpeciesProfile> {
        let mut found: Vec<&SpeciesProfile> = self
            .species
            .values()
            .filter(|p| p.learns_fast(move_id) || p.learns_charged(move_id))
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    /// Parses a gamemaster-style document:
    /// `{"pokemon": [..], "moves": [..], "movesets": {id: {fast, charged1, charged2}}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(json).context("catalog is not valid JSON")?;
        let mut catalog = MemoryCatalog::new();
        for record in raw.moves {
            let id = record.move_id.clone();
            let spec = record.into_spec().with_context(|| format!("move {id}"))?;
            catalog.insert_move(spec);
        }
        for record in raw.pokemon {
            let id = record.species_id.clone();
            let (profile, tiers) = record.into_profile().with_context(|| format!("species {id}"))?;
            for (tier, tier_profile) in tiers {
                catalog.insert_stat_tier(&profile.id, tier, tier_profile);
            }
            catalog.insert_species(profile);
        }
        for (species_id, moveset) in raw.movesets {
            catalog.insert_moveset(&species_id, moveset);
        }
        log::debug!(
            "catalog loaded: {} species, {} moves",
            catalog.species_count(),
            catalog.move_count()
        );
        Ok(catalog)
    }
}

impl Catalog for MemoryCatalog {
    fn species(&self, id: &str) -> Option<&SpeciesProfile> {
        if let Some(profile) = self.species.get(&id.to_ascii_lowercase()) {
            return Some(profile);
        }
        self.species
            .values()
            .filter(|p| p.name.eq_ignore_ascii_case(id.trim()))
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    fn move_spec(&self, id: &str) -> Option<&MoveSpec> {
        self.moves.get(id)
    }

    fn stat_tier_profile(&self, species_id: &str, tier: StatTier) -> Option<StatTierProfile> {
        let key = (species_id.to_ascii_lowercase(), tier);
        match self.tiers.get(&key) {
            Some(profile) => Some(*profile),
            None if tier == StatTier::Master && self.species.contains_key(&key.0) => {
                Some(StatTierProfile::master())
            }
            None => None,
        }
    }

    fn best_moveset(&self, species_id: &str) -> Option<Moveset> {
        let profile = self.species(species_id)?;
        match self.movesets.get(&profile.id.to_ascii_lowercase()) {
            Some(moveset) => Some(moveset.clone()),
            None => Some(learnset_moveset(profile)),
        }
    }
}

pub fn load_catalog(path: &Path) -> Result<MemoryCatalog> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    MemoryCatalog::from_json_str(&data)
        .with_context(|| format!("failed to parse catalog {}", path.display()))
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    pokemon: Vec<RawSpecies>,
    #[serde(default)]
    moves: Vec<RawMove>,
    #[serde(default)]
    movesets: HashMap<String, Moveset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSpecies {
    species_id: String,
    #[serde(default)]
    species_name: Option<String>,
    #[serde(default)]
    dex: Option<u32>,
    types: Vec<String>,
    base_stats: RawBaseStats,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    fast_moves: Vec<String>,
    #[serde(default)]
    charged_moves: Vec<String>,
    #[serde(default, rename = "defaultIVs")]
    default_ivs: HashMap<String, Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct RawBaseStats {
    atk: u32,
    def: u32,
    hp: u32,
}

impl RawSpecies {
    fn into_profile(self) -> Result<(SpeciesProfile, Vec<(StatTier, StatTierProfile)>), SimError> {
        let types = self
            .types
            .iter()
            .filter(|t| !t.eq_ignore_ascii_case("none"))
            .map(|t| t.parse::<Type>())
            .collect::<Result<Vec<_>, _>>()?;
        let base_stats = BaseStats {
            attack: self.base_stats.atk,
            defense: self.base_stats.def,
            stamina: self.base_stats.hp,
        };
        let mut profile = SpeciesProfile::new(&self.species_id, &types, base_stats)?;
        if let Some(name) = self.species_name {
            profile.name = name;
        }
        profile.dex = self.dex;
        profile.tags = self.tags;
        profile.fast_moves = self.fast_moves;
        profile.charged_moves = self.charged_moves;

        let mut tiers = Vec::new();
        for tier in [StatTier::Little, StatTier::Great, StatTier::Ultra, StatTier::Master] {
            let Some(entry) = self.default_ivs.get(tier.key()) else {
                continue;
            };
            tiers.push((tier, parse_tier_entry(&self.species_id, tier, entry)?));
        }
        Ok((profile, tiers))
    }
}

/// `[level, atk_iv, def_iv, sta_iv]`.
fn parse_tier_entry(id: &str, tier: StatTier, entry: &[f64]) -> Result<StatTierProfile, SimError> {
    let invalid = |reason: String| SimError::InvalidSpecies {
        id: id.to_string(),
        reason,
    };
    let [level, atk, def, sta] = entry else {
        return Err(invalid(format!(
            "{} entry needs 4 values, got {}",
            tier.key(),
            entry.len()
        )));
    };
    let iv = |value: f64| -> Result<u8, SimError> {
        if value.fract() != 0.0 || !(0.0..=15.0).contains(&value) {
            return Err(invalid(format!("{} has IV {value} outside 0..=15", tier.key())));
        }
        Ok(value as u8)
    };
    if *level <= 0.0 {
        return Err(invalid(format!("{} has level {level}", tier.key())));
    }
    Ok(StatTierProfile::new(*level, iv(*atk)?, iv(*def)?, iv(*sta)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMove {
    move_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    move_type: String,
    #[serde(default)]
    power: u32,
    #[serde(default)]
    energy: u32,
    #[serde(default)]
    energy_gain: u32,
    #[serde(default)]
    turns: Option<u32>,
    #[serde(default)]
    buffs: Option<Vec<i8>>,
    #[serde(default)]
    buff_target: Option<String>,
    #[serde(default)]
    buff_apply_chance: Option<ChanceValue>,
}

/// Gamemaster files write the chance either as `0.3` or `"0.3"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChanceValue {
    Number(f64),
    Text(String),
}

impl RawMove {
    fn into_spec(self) -> Result<MoveSpec> {
        let move_type: Type = self.move_type.parse()?;
        let mut spec = if self.energy_gain > 0 || self.energy == 0 {
            MoveSpec::fast(&self.move_id, move_type, self.power, self.energy_gain)
        } else {
            MoveSpec::charged(&self.move_id, move_type, self.power, self.energy)
        };
        spec.energy = self.energy;
        if let Some(name) = self.name {
            spec.name = name;
        }
        if let Some(turns) = self.turns {
            spec = spec.with_turns(turns);
        }
        if let Some(buffs) = self.buffs.filter(|b| !b.is_empty()) {
            let (attack_delta, defense_delta) = match buffs.as_slice() {
                [atk, def] => (*atk, *def),
                other => bail!("buffs needs [atk, def], got {} values", other.len()),
            };
            let apply_chance = match self.buff_apply_chance {
                None => 0.0,
                Some(ChanceValue::Number(n)) => n,
                Some(ChanceValue::Text(s)) => s
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("buffApplyChance {s:?} is not a number"))?,
            };
            if !(0.0..=1.0).contains(&apply_chance) {
                bail!("buffApplyChance {apply_chance} outside 0..=1");
            }
            spec = spec.with_buff(BuffEffect {
                attack_delta,
                defense_delta,
                target_self: self.buff_target.as_deref() == Some("self"),
                apply_chance,
            });
        }
        Ok(spec)
    }
}
