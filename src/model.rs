use crate::error::SimError;
use crate::types::Type;
use serde::{Deserialize, Serialize};

/// Stage change carried by a move, rolled each time the move lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuffEffect {
    pub attack_delta: i8,
    pub defense_delta: i8,
    /// `true` buffs the user, `false` the opponent.
    pub target_self: bool,
    pub apply_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveSpec {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: Type,
    pub power: u32,
    /// Energy consumed (charged moves).
    pub energy: u32,
    /// Energy generated (fast moves).
    pub energy_gain: u32,
    /// Declared duration in turns; the simultaneous-exchange engine does not schedule by it.
    pub turns: u32,
    pub buff: Option<BuffEffect>,
}

impl MoveSpec {
    pub fn fast(id: &str, move_type: Type, power: u32, energy_gain: u32) -> Self {
        Self {
            id: id.to_string(),
            name: display_name(id),
            move_type,
            power,
            energy: 0,
            energy_gain,
            turns: 1,
            buff: None,
        }
    }

    pub fn charged(id: &str, move_type: Type, power: u32, energy: u32) -> Self {
        Self {
            id: id.to_string(),
            name: display_name(id),
            move_type,
            power,
            energy,
            energy_gain: 0,
            turns: 1,
            buff: None,
        }
    }

    pub fn with_buff(mut self, buff: BuffEffect) -> Self {
        self.buff = Some(buff);
        self
    }

    pub fn with_turns(mut self, turns: u32) -> Self {
        self.turns = turns;
        self
    }

    /// Damage per energy, rounded to two decimals. `None` for moves without a cost.
    pub fn dpe(&self) -> Option<f64> {
        if self.energy == 0 {
            return None;
        }
        let raw = self.power as f64 / self.energy as f64;
        Some((raw * 100.0).round() / 100.0)
    }
}

/// `ICE_BEAM` -> `Ice Beam`.
pub(crate) fn display_name(id: &str) -> String {
    id.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub attack: u32,
    pub defense: u32,
    pub stamina: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesProfile {
    pub id: String,
    pub name: String,
    pub dex: Option<u32>,
    pub types: Vec<Type>,
    pub base_stats: BaseStats,
    pub tags: Vec<String>,
    pub fast_moves: Vec<String>,
    pub charged_moves: Vec<String>,
}

impl SpeciesProfile {
    pub fn new(id: &str, types: &[Type], base_stats: BaseStats) -> Result<Self, SimError> {
        if types.is_empty() || types.len() > 2 {
            return Err(SimError::InvalidSpecies {
                id: id.to_string(),
                reason: format!("expected one or two types, got {}", types.len()),
            });
        }
        Ok(Self {
            id: id.to_string(),
            name: display_name(id),
            dex: None,
            types: types.to_vec(),
            base_stats,
            tags: Vec::new(),
            fast_moves: Vec::new(),
            charged_moves: Vec::new(),
        })
    }

    pub fn with_fast_moves(mut self, ids: &[&str]) -> Self {
        self.fast_moves = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_charged_moves(mut self, ids: &[&str]) -> Self {
        self.charged_moves = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn is_shadow(&self) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case("shadow"))
    }

    pub fn learns_fast(&self, move_id: &str) -> bool {
        self.fast_moves.iter().any(|m| m == move_id)
    }

    pub fn learns_charged(&self, move_id: &str) -> bool {
        self.charged_moves.iter().any(|m| m == move_id)
    }
}

/// One fast move id and up to two charged move ids.
///
/// Serialized as `{"fast": .., "charged1": .., "charged2": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "MovesetRecord", into = "MovesetRecord")]
pub struct Moveset {
    pub fast: Option<String>,
    pub charged: Vec<String>,
}

impl Moveset {
    pub fn new(fast: &str, charged: &[&str]) -> Self {
        Self {
            fast: Some(fast.to_string()),
            charged: charged.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MovesetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charged1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charged2: Option<String>,
}

impl From<MovesetRecord> for Moveset {
    fn from(record: MovesetRecord) -> Self {
        let charged = [record.charged1, record.charged2]
            .into_iter()
            .flatten()
            .filter(|id| !id.is_empty() && !id.eq_ignore_ascii_case("none"))
            .collect();
        Moveset {
            fast: record.fast.filter(|id| !id.is_empty()),
            charged,
        }
    }
}

impl From<Moveset> for MovesetRecord {
    fn from(moveset: Moveset) -> Self {
        let mut charged = moveset.charged.into_iter();
        MovesetRecord {
            fast: moveset.fast,
            charged1: charged.next(),
            charged2: charged.next(),
        }
    }
}

/// Competitive bracket that fixes the level/IV spread of both combatants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatTier {
    Little,
    Great,
    Ultra,
    Master,
}

impl StatTier {
    pub fn from_cp_cap(cp_cap: u32) -> Result<Self, SimError> {
        match cp_cap {
            500 => Ok(StatTier::Little),
            1500 => Ok(StatTier::Great),
            2500 => Ok(StatTier::Ultra),
            0 | 10000 => Ok(StatTier::Master),
            other => Err(SimError::UnsupportedCpCap(other)),
        }
    }

    /// 0 means uncapped.
    pub fn cp_cap(self) -> u32 {
        match self {
            StatTier::Little => 500,
            StatTier::Great => 1500,
            StatTier::Ultra => 2500,
            StatTier::Master => 0,
        }
    }

    /// Key used by catalog `defaultIVs` records, e.g. `cp1500`.
    pub fn key(self) -> &'static str {
        match self {
            StatTier::Little => "cp500",
            StatTier::Great => "cp1500",
            StatTier::Ultra => "cp2500",
            StatTier::Master => "cp10000",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatTierProfile {
    pub level: f64,
    pub iv_attack: u8,
    pub iv_defense: u8,
    pub iv_stamina: u8,
}

impl StatTierProfile {
    pub fn new(level: f64, iv_attack: u8, iv_defense: u8, iv_stamina: u8) -> Self {
        Self {
            level,
            iv_attack,
            iv_defense,
            iv_stamina,
        }
    }

    /// Uncapped bracket: level 50, perfect IVs.
    pub fn master() -> Self {
        Self::new(50.0, 15, 15, 15)
    }
}

impl Default for StatTierProfile {
    fn default() -> Self {
        Self::new(40.0, 15, 15, 15)
    }
}
