use crate::damage::{DOUBLE_RESISTED, RESISTED, SUPER_EFFECTIVE};
use crate::error::SimError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Steel,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
    Dark,
    Fairy,
}

pub const TYPE_COUNT: usize = 18;

static TYPE_NAMES: phf::Map<&'static str, Type> = phf::phf_map! {
    "normal" => Type::Normal,
    "fighting" => Type::Fighting,
    "flying" => Type::Flying,
    "poison" => Type::Poison,
    "ground" => Type::Ground,
    "rock" => Type::Rock,
    "bug" => Type::Bug,
    "ghost" => Type::Ghost,
    "steel" => Type::Steel,
    "fire" => Type::Fire,
    "water" => Type::Water,
    "grass" => Type::Grass,
    "electric" => Type::Electric,
    "psychic" => Type::Psychic,
    "ice" => Type::Ice,
    "dragon" => Type::Dragon,
    "dark" => Type::Dark,
    "fairy" => Type::Fairy,
};

impl Type {
    pub const ALL: [Type; TYPE_COUNT] = [
        Type::Normal,
        Type::Fighting,
        Type::Flying,
        Type::Poison,
        Type::Ground,
        Type::Rock,
        Type::Bug,
        Type::Ghost,
        Type::Steel,
        Type::Fire,
        Type::Water,
        Type::Grass,
        Type::Electric,
        Type::Psychic,
        Type::Ice,
        Type::Dragon,
        Type::Dark,
        Type::Fairy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Type::Normal => "normal",
            Type::Fighting => "fighting",
            Type::Flying => "flying",
            Type::Poison => "poison",
            Type::Ground => "ground",
            Type::Rock => "rock",
            Type::Bug => "bug",
            Type::Ghost => "ghost",
            Type::Steel => "steel",
            Type::Fire => "fire",
            Type::Water => "water",
            Type::Grass => "grass",
            Type::Electric => "electric",
            Type::Psychic => "psychic",
            Type::Ice => "ice",
            Type::Dragon => "dragon",
            Type::Dark => "dark",
            Type::Fairy => "fairy",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// How this type reacts when it is the defending type.
    pub fn traits(self) -> TypeTraits {
        use Type::*;
        let (weaknesses, resistances, immunities): (&[Type], &[Type], &[Type]) = match self {
            Normal => (&[Fighting], &[], &[Ghost]),
            Fighting => (&[Flying, Psychic, Fairy], &[Rock, Bug, Dark], &[]),
            Flying => (&[Rock, Electric, Ice], &[Fighting, Bug, Grass], &[Ground]),
            Poison => (&[Ground, Psychic], &[Fighting, Poison, Bug, Fairy, Grass], &[]),
            Ground => (&[Water, Grass, Ice], &[Poison, Rock], &[Electric]),
            Rock => (
                &[Fighting, Ground, Steel, Water, Grass],
                &[Normal, Flying, Poison, Fire],
                &[],
            ),
            Bug => (&[Flying, Rock, Fire], &[Fighting, Ground, Grass], &[]),
            Ghost => (&[Ghost, Dark], &[Poison, Bug], &[Normal, Fighting]),
            Steel => (
                &[Fighting, Ground, Fire],
                &[
                    Normal, Flying, Rock, Bug, Steel, Grass, Psychic, Ice, Dragon, Fairy,
                ],
                &[Poison],
            ),
            Fire => (
                &[Ground, Rock, Water],
                &[Bug, Steel, Fire, Grass, Ice, Fairy],
                &[],
            ),
            Water => (&[Grass, Electric], &[Steel, Fire, Water, Ice], &[]),
            Grass => (
                &[Flying, Poison, Bug, Fire, Ice],
                &[Ground, Water, Grass, Electric],
                &[],
            ),
            Electric => (&[Ground], &[Flying, Steel, Electric], &[]),
            Psychic => (&[Bug, Ghost, Dark], &[Fighting, Psychic], &[]),
            Ice => (&[Fighting, Fire, Steel, Rock], &[Ice], &[]),
            Dragon => (&[Dragon, Ice, Fairy], &[Fire, Water, Grass, Electric], &[]),
            Dark => (&[Fighting, Fairy, Bug], &[Ghost, Dark], &[Psychic]),
            Fairy => (&[Poison, Steel], &[Fighting, Bug, Dark], &[Dragon]),
        };
        TypeTraits {
            weaknesses,
            resistances,
            immunities,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Type {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        TYPE_NAMES
            .get(key.as_str())
            .copied()
            .ok_or_else(|| SimError::UnknownType(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TypeTraits {
    pub weaknesses: &'static [Type],
    pub resistances: &'static [Type],
    /// No attack is fully blocked; these take the double-resisted multiplier.
    pub immunities: &'static [Type],
}

impl TypeTraits {
    fn multiplier_against(&self, attacking: Type) -> f64 {
        match self.rank_against(attacking) {
            1 => SUPER_EFFECTIVE,
            -1 => RESISTED,
            -2 => DOUBLE_RESISTED,
            _ => 1.0,
        }
    }

    /// +1 weak, -1 resisted, -2 immune, 0 otherwise.
    fn rank_against(&self, attacking: Type) -> i8 {
        if self.weaknesses.contains(&attacking) {
            1
        } else if self.resistances.contains(&attacking) {
            -1
        } else if self.immunities.contains(&attacking) {
            -2
        } else {
            0
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Effectiveness {
    #[serde(rename = "Super Effective")]
    SuperEffective,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Not Very Effective")]
    NotVeryEffective,
}

impl Effectiveness {
    /// Classifies a net weakness count. The float product is not used here:
    /// one weakness times one resistance is 1.0000000149, not 1.0.
    pub fn from_rank(rank: i8) -> Self {
        match rank {
            r if r > 0 => Effectiveness::SuperEffective,
            0 => Effectiveness::Neutral,
            _ => Effectiveness::NotVeryEffective,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Effectiveness::SuperEffective => "Super Effective",
            Effectiveness::Neutral => "Neutral",
            Effectiveness::NotVeryEffective => "Not Very Effective",
        }
    }
}

/// Multiplier of one attack against a type set, with its label.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TypeMatchup {
    pub multiplier: f64,
    pub label: Effectiveness,
}

/// Precomputed single-type multipliers, indexed `[attacking][defending]`.
///
/// Built once and shared read-only between simulations; see [`TypeChart::standard`].
#[derive(Clone, Debug)]
pub struct TypeChart {
    single: [[f64; TYPE_COUNT]; TYPE_COUNT],
    rank: [[i8; TYPE_COUNT]; TYPE_COUNT],
}

static STANDARD_CHART: Lazy<TypeChart> = Lazy::new(TypeChart::build);

impl TypeChart {
    pub fn standard() -> &'static TypeChart {
        &STANDARD_CHART
    }

    fn build() -> Self {
        let mut single = [[1.0; TYPE_COUNT]; TYPE_COUNT];
        let mut rank = [[0; TYPE_COUNT]; TYPE_COUNT];
        for defending in Type::ALL {
            let traits = defending.traits();
            for attacking in Type::ALL {
                single[attacking.index()][defending.index()] = traits.multiplier_against(attacking);
                rank[attacking.index()][defending.index()] = traits.rank_against(attacking);
            }
        }
        TypeChart { single, rank }
    }

    pub fn single(&self, attacking: Type, defending: Type) -> f64 {
        self.single[attacking.index()][defending.index()]
    }

    /// Combined multiplier of `attacking` against one or two defending types.
    pub fn effectiveness(&self, attacking: Type, defending: &[Type]) -> f64 {
        let mut multiplier = 1.0;
        for &t in defending {
            multiplier *= self.single(attacking, t);
        }
        multiplier
    }

    /// Net weakness count of `attacking` against the whole type set.
    pub fn rank(&self, attacking: Type, defending: &[Type]) -> i8 {
        defending
            .iter()
            .map(|&t| self.rank[attacking.index()][t.index()])
            .sum()
    }

    pub fn matchup(&self, attacking: Type, defending: &[Type]) -> TypeMatchup {
        TypeMatchup {
            multiplier: self.effectiveness(attacking, defending),
            label: Effectiveness::from_rank(self.rank(attacking, defending)),
        }
    }

    /// Multiplier of every attacking type against `defending`, in [`Type::ALL`] order.
    pub fn defensive_profile(&self, defending: &[Type]) -> Vec<(Type, f64)> {
        Type::ALL
            .iter()
            .map(|&attacking| (attacking, self.effectiveness(attacking, defending)))
            .collect()
    }

    pub fn weaknesses(&self, defending: &[Type]) -> Vec<(Type, f64)> {
        self.defensive_profile(defending)
            .into_iter()
            .filter(|&(t, _)| self.rank(t, defending) > 0)
            .collect()
    }

    /// Resisted and double-resisted attacking types.
    pub fn resistances(&self, defending: &[Type]) -> Vec<(Type, f64)> {
        self.defensive_profile(defending)
            .into_iter()
            .filter(|&(t, _)| self.rank(t, defending) < 0)
            .collect()
    }
}
