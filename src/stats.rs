use crate::model::{SpeciesProfile, StatTierProfile};
use serde::Serialize;

pub const SHADOW_ATK: f64 = 1.2;
pub const SHADOW_DEF: f64 = 0.83333331;

pub const MIN_STAGE: i8 = -4;
pub const MAX_STAGE: i8 = 4;

/// Stats fixed for the whole battle. Shadow multipliers are already applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DerivedStats {
    pub attack: f64,
    pub defense: f64,
    pub max_hp: u32,
}

pub fn level_multiplier(level: f64) -> f64 {
    0.5 + level * 0.01
}

pub fn calc_stat(base: u32, iv: u8, level: f64) -> f64 {
    (base + iv as u32) as f64 * level_multiplier(level)
}

pub fn calc_hp(base: u32, iv: u8, level: f64) -> u32 {
    calc_stat(base, iv, level).floor() as u32
}

pub fn derive_stats(profile: &SpeciesProfile, tier: &StatTierProfile) -> DerivedStats {
    let base = profile.base_stats;
    let mut attack = calc_stat(base.attack, tier.iv_attack, tier.level);
    let mut defense = calc_stat(base.defense, tier.iv_defense, tier.level);
    if profile.is_shadow() {
        attack *= SHADOW_ATK;
        defense *= SHADOW_DEF;
    }
    DerivedStats {
        attack,
        defense,
        max_hp: calc_hp(base.stamina, tier.iv_stamina, tier.level),
    }
}

/// `(2 + s) / 2` for non-negative stages, `2 / (2 - s)` below zero.
pub fn buff_multiplier(stage: i8) -> f64 {
    let stage = clamp_stage(stage) as f64;
    if stage >= 0.0 {
        (2.0 + stage) / 2.0
    } else {
        2.0 / (2.0 - stage)
    }
}

pub fn clamp_stage(stage: i8) -> i8 {
    stage.clamp(MIN_STAGE, MAX_STAGE)
}

/// Adds `delta` to `stage`, saturating at the stage bounds.
pub fn shift_stage(stage: i8, delta: i8) -> i8 {
    clamp_stage(stage.saturating_add(delta))
}
