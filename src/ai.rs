//! Charged-move selection and shield decisions.
//!
//! Both policies are pure functions of the state they are handed, so they are
//! evaluated the same way for either side.

use crate::damage::stab_multiplier;
use crate::error::SimError;
use crate::model::MoveSpec;
use crate::types::{Type, TypeChart};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HP fraction under which neither side is worth waiting on.
pub const LOW_HP_FRACTION: f64 = 0.30;
/// Cost of the best move relative to current energy above which waiting is pointless.
pub const ENERGY_OVERSHOOT: f64 = 1.5;
/// Energy shortfall small enough to just fire the best affordable move.
pub const ENERGY_GAP: u32 = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargePolicy {
    /// Rank every learned charged move by effective damage per energy and save up for the best.
    #[default]
    DpeWait,
    /// Fire the most expensive affordable move as soon as there is one.
    Greedy,
}

static CHARGE_POLICIES: phf::OrderedMap<&'static str, ChargePolicy> = phf::phf_ordered_map! {
    "dpe_wait" => ChargePolicy::DpeWait,
    "greedy" => ChargePolicy::Greedy,
};

/// What the attacker does with its charged-move opportunity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChargeDecision {
    /// Use the learned charged move at this index.
    Use(usize),
    /// Hold energy for the move at this index.
    Wait(usize),
    /// Nothing affordable.
    Pass,
}

/// State visible to the charged-move policy.
#[derive(Clone, Copy, Debug)]
pub struct ChargeContext<'a> {
    pub moves: &'a [&'a MoveSpec],
    pub energy: u32,
    pub attacker_hp: u32,
    pub attacker_max_hp: u32,
    pub defender_hp: u32,
    pub defender_max_hp: u32,
    pub attacker_types: &'a [Type],
    pub defender_types: &'a [Type],
}

/// `(power * effectiveness * stab) / cost`, with a zero cost treated as 1.
pub fn effective_dpe(chart: &TypeChart, move_spec: &MoveSpec, attacker_types: &[Type], defender_types: &[Type]) -> f64 {
    let effectiveness = chart.effectiveness(move_spec.move_type, defender_types);
    let stab = stab_multiplier(move_spec.move_type, attacker_types);
    (move_spec.power as f64 * effectiveness * stab) / move_spec.energy.max(1) as f64
}

fn below_fraction(hp: u32, max_hp: u32, fraction: f64) -> bool {
    (hp as f64) < fraction * max_hp as f64
}

impl ChargePolicy {
    pub fn names() -> Vec<&'static str> {
        CHARGE_POLICIES.keys().copied().collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            ChargePolicy::DpeWait => "dpe_wait",
            ChargePolicy::Greedy => "greedy",
        }
    }

    pub fn decide(self, chart: &TypeChart, ctx: &ChargeContext<'_>) -> ChargeDecision {
        match self {
            ChargePolicy::DpeWait => decide_dpe_wait(chart, ctx),
            ChargePolicy::Greedy => decide_greedy(ctx),
        }
    }
}

fn decide_greedy(ctx: &ChargeContext<'_>) -> ChargeDecision {
    let mut best: Option<(usize, u32)> = None;
    for (idx, m) in ctx.moves.iter().enumerate() {
        if m.energy > ctx.energy {
            continue;
        }
        if best.map_or(true, |(_, cost)| m.energy > cost) {
            best = Some((idx, m.energy));
        }
    }
    best.map_or(ChargeDecision::Pass, |(idx, _)| ChargeDecision::Use(idx))
}

fn decide_dpe_wait(chart: &TypeChart, ctx: &ChargeContext<'_>) -> ChargeDecision {
    let scored: Vec<f64> = ctx
        .moves
        .iter()
        .map(|m| effective_dpe(chart, m, ctx.attacker_types, ctx.defender_types))
        .collect();

    let mut best: Option<usize> = None;
    for (idx, score) in scored.iter().enumerate() {
        if best.map_or(true, |b| *score > scored[b]) {
            best = Some(idx);
        }
    }
    let Some(best) = best else {
        return ChargeDecision::Pass;
    };

    let best_cost = ctx.moves[best].energy;
    if ctx.energy >= best_cost {
        return ChargeDecision::Use(best);
    }

    let fire_now = below_fraction(ctx.defender_hp, ctx.defender_max_hp, LOW_HP_FRACTION)
        || below_fraction(ctx.attacker_hp, ctx.attacker_max_hp, LOW_HP_FRACTION)
        || best_cost as f64 > ENERGY_OVERSHOOT * ctx.energy as f64
        || best_cost - ctx.energy <= ENERGY_GAP;
    if !fire_now {
        return ChargeDecision::Wait(best);
    }

    let mut affordable: Option<usize> = None;
    for (idx, m) in ctx.moves.iter().enumerate() {
        if m.energy > ctx.energy {
            continue;
        }
        if affordable.map_or(true, |a| scored[idx] > scored[a]) {
            affordable = Some(idx);
        }
    }
    affordable.map_or(ChargeDecision::Pass, ChargeDecision::Use)
}

impl FromStr for ChargePolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CHARGE_POLICIES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| SimError::UnknownChargePolicy {
                name: s.to_string(),
                valid: ChargePolicy::names().join(", "),
            })
    }
}

impl fmt::Display for ChargePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldStrategy {
    Never,
    Always,
    #[serde(rename = "smart_20")]
    Smart20,
    #[default]
    #[serde(rename = "smart_30")]
    Smart30,
    #[serde(rename = "smart_50")]
    Smart50,
    Conservative,
    Aggressive,
    Balanced,
}

static SHIELD_STRATEGIES: phf::OrderedMap<&'static str, ShieldStrategy> = phf::phf_ordered_map! {
    "never" => ShieldStrategy::Never,
    "always" => ShieldStrategy::Always,
    "smart_20" => ShieldStrategy::Smart20,
    "smart_30" => ShieldStrategy::Smart30,
    "smart_50" => ShieldStrategy::Smart50,
    "conservative" => ShieldStrategy::Conservative,
    "aggressive" => ShieldStrategy::Aggressive,
    "balanced" => ShieldStrategy::Balanced,
};

/// Incoming charged hit as seen by the defender.
#[derive(Clone, Copy, Debug)]
pub struct ShieldContext {
    pub incoming_damage: u32,
    pub defender_hp: u32,
    pub defender_max_hp: u32,
    pub effectiveness: f64,
    pub remaining_shields: u8,
}

impl ShieldContext {
    /// Incoming damage as a percentage of current HP.
    pub fn damage_percent(&self) -> f64 {
        if self.defender_hp == 0 {
            return f64::INFINITY;
        }
        self.incoming_damage as f64 / self.defender_hp as f64 * 100.0
    }

    pub fn hp_percent(&self) -> f64 {
        if self.defender_max_hp == 0 {
            return 0.0;
        }
        self.defender_hp as f64 / self.defender_max_hp as f64 * 100.0
    }

    pub fn super_effective(&self) -> bool {
        self.effectiveness > 1.0
    }
}

impl ShieldStrategy {
    pub fn names() -> Vec<&'static str> {
        SHIELD_STRATEGIES.keys().copied().collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            ShieldStrategy::Never => "never",
            ShieldStrategy::Always => "always",
            ShieldStrategy::Smart20 => "smart_20",
            ShieldStrategy::Smart30 => "smart_30",
            ShieldStrategy::Smart50 => "smart_50",
            ShieldStrategy::Conservative => "conservative",
            ShieldStrategy::Aggressive => "aggressive",
            ShieldStrategy::Balanced => "balanced",
        }
    }

    pub fn should_shield(self, ctx: &ShieldContext) -> bool {
        if ctx.remaining_shields == 0 {
            return false;
        }
        let dmg = ctx.damage_percent();
        let hp = ctx.hp_percent();
        let se = ctx.super_effective();
        match self {
            ShieldStrategy::Never => false,
            ShieldStrategy::Always => true,
            ShieldStrategy::Smart20 => dmg > 20.0,
            ShieldStrategy::Smart30 => dmg > 30.0,
            ShieldStrategy::Smart50 => dmg > 50.0,
            ShieldStrategy::Conservative => dmg > 40.0 || (hp < 30.0 && dmg > 20.0),
            ShieldStrategy::Aggressive => dmg > 25.0 || (se && dmg > 15.0),
            ShieldStrategy::Balanced => dmg > 35.0 || (se && dmg > 20.0),
        }
    }
}

impl FromStr for ShieldStrategy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SHIELD_STRATEGIES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| SimError::UnknownShieldStrategy {
                name: s.to_string(),
                valid: ShieldStrategy::names().join(", "),
            })
    }
}

impl fmt::Display for ShieldStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(moves: &'a [&'a MoveSpec], energy: u32) -> ChargeContext<'a> {
        ChargeContext {
            moves,
            energy,
            attacker_hp: 100,
            attacker_max_hp: 100,
            defender_hp: 100,
            defender_max_hp: 100,
            attacker_types: &[Type::Normal],
            defender_types: &[Type::Normal],
        }
    }

    fn shield_ctx(damage: u32, hp: u32, effectiveness: f64) -> ShieldContext {
        ShieldContext {
            incoming_damage: damage,
            defender_hp: hp,
            defender_max_hp: 100,
            effectiveness,
            remaining_shields: 2,
        }
    }

    #[test]
    fn uses_best_move_when_affordable() {
        let cheap = MoveSpec::charged("CHEAP", Type::Fire, 40, 35);
        let nuke = MoveSpec::charged("NUKE", Type::Fire, 130, 60);
        let moves = [&cheap, &nuke];
        let chart = TypeChart::standard();
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &ctx(&moves, 60)), ChargeDecision::Use(1));
    }

    #[test]
    fn waits_for_best_move_when_healthy() {
        let cheap = MoveSpec::charged("CHEAP", Type::Fire, 40, 35);
        let nuke = MoveSpec::charged("NUKE", Type::Fire, 130, 60);
        let moves = [&cheap, &nuke];
        let chart = TypeChart::standard();
        // 45 energy: gap 15, 60 <= 67.5
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &ctx(&moves, 45)), ChargeDecision::Wait(1));
    }

    #[test]
    fn fires_affordable_move_when_gap_is_small() {
        let cheap = MoveSpec::charged("CHEAP", Type::Fire, 40, 35);
        let nuke = MoveSpec::charged("NUKE", Type::Fire, 130, 60);
        let moves = [&cheap, &nuke];
        let chart = TypeChart::standard();
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &ctx(&moves, 57)), ChargeDecision::Use(0));
    }

    #[test]
    fn fires_when_energy_far_short() {
        let cheap = MoveSpec::charged("CHEAP", Type::Fire, 40, 35);
        let nuke = MoveSpec::charged("NUKE", Type::Fire, 130, 60);
        let moves = [&cheap, &nuke];
        let chart = TypeChart::standard();
        // 60 > 1.5 * 39
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &ctx(&moves, 39)), ChargeDecision::Use(0));
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &ctx(&moves, 20)), ChargeDecision::Pass);
    }

    #[test]
    fn low_hp_on_either_side_stops_waiting() {
        let cheap = MoveSpec::charged("CHEAP", Type::Fire, 40, 35);
        let nuke = MoveSpec::charged("NUKE", Type::Fire, 130, 60);
        let moves = [&cheap, &nuke];
        let chart = TypeChart::standard();
        let mut low_defender = ctx(&moves, 45);
        low_defender.defender_hp = 29;
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &low_defender), ChargeDecision::Use(0));
        let mut low_attacker = ctx(&moves, 45);
        low_attacker.attacker_hp = 29;
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &low_attacker), ChargeDecision::Use(0));
        let mut boundary = ctx(&moves, 45);
        boundary.defender_hp = 30;
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &boundary), ChargeDecision::Wait(1));
    }

    #[test]
    fn type_matchup_changes_the_best_move() {
        let ice = MoveSpec::charged("ICE_BEAM", Type::Ice, 90, 55);
        let water = MoveSpec::charged("HYDRO_PUMP", Type::Water, 130, 75);
        let moves = [&ice, &water];
        let chart = TypeChart::standard();
        let mut c = ctx(&moves, 55);
        c.attacker_types = &[Type::Water, Type::Fairy];
        c.defender_types = &[Type::Dragon, Type::Flying];
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &c), ChargeDecision::Use(0));
    }

    #[test]
    fn no_charged_moves_passes() {
        let chart = TypeChart::standard();
        assert_eq!(ChargePolicy::DpeWait.decide(chart, &ctx(&[], 100)), ChargeDecision::Pass);
        assert_eq!(ChargePolicy::Greedy.decide(chart, &ctx(&[], 100)), ChargeDecision::Pass);
    }

    #[test]
    fn greedy_takes_most_expensive_affordable() {
        let cheap = MoveSpec::charged("CHEAP", Type::Fire, 40, 35);
        let mid = MoveSpec::charged("MID", Type::Fire, 60, 45);
        let nuke = MoveSpec::charged("NUKE", Type::Fire, 130, 60);
        let moves = [&cheap, &mid, &nuke];
        let chart = TypeChart::standard();
        assert_eq!(ChargePolicy::Greedy.decide(chart, &ctx(&moves, 50)), ChargeDecision::Use(1));
        assert_eq!(ChargePolicy::Greedy.decide(chart, &ctx(&moves, 10)), ChargeDecision::Pass);
    }

    #[test]
    fn zero_cost_move_is_not_a_division_by_zero() {
        let free = MoveSpec::charged("FREE", Type::Fire, 10, 0);
        let dpe = effective_dpe(TypeChart::standard(), &free, &[Type::Water], &[Type::Water]);
        assert!(dpe.is_finite());
    }

    #[test]
    fn shield_strategy_table() {
        let neutral = shield_ctx(25, 100, 1.0);
        assert!(!ShieldStrategy::Never.should_shield(&neutral));
        assert!(ShieldStrategy::Always.should_shield(&shield_ctx(1, 100, 1.0)));
        assert!(ShieldStrategy::Smart20.should_shield(&neutral));
        assert!(!ShieldStrategy::Smart30.should_shield(&neutral));
        assert!(!ShieldStrategy::Smart50.should_shield(&shield_ctx(50, 100, 1.0)));
        assert!(ShieldStrategy::Conservative.should_shield(&shield_ctx(41, 100, 1.0)));
        assert!(ShieldStrategy::Conservative.should_shield(&shield_ctx(6, 25, 1.0)));
        assert!(!ShieldStrategy::Conservative.should_shield(&neutral));
        assert!(ShieldStrategy::Aggressive.should_shield(&shield_ctx(16, 100, 1.6)));
        assert!(!ShieldStrategy::Aggressive.should_shield(&shield_ctx(16, 100, 1.0)));
        assert!(ShieldStrategy::Balanced.should_shield(&shield_ctx(21, 100, 1.6)));
        assert!(!ShieldStrategy::Balanced.should_shield(&shield_ctx(21, 100, 1.0)));
    }

    #[test]
    fn damage_percent_is_relative_to_current_hp() {
        // 30 of 50 current HP is 60%, even though it is 30% of max.
        assert!(ShieldStrategy::Smart50.should_shield(&shield_ctx(30, 50, 1.0)));
    }

    #[test]
    fn no_shields_means_no_shield() {
        let mut empty = shield_ctx(90, 100, 1.6);
        empty.remaining_shields = 0;
        assert!(!ShieldStrategy::Always.should_shield(&empty));
    }

    #[test]
    fn unknown_names_list_valid_ones() {
        assert_eq!("SMART_20".parse::<ShieldStrategy>(), Ok(ShieldStrategy::Smart20));
        match "sometimes".parse::<ShieldStrategy>() {
            Err(SimError::UnknownShieldStrategy { valid, .. }) => {
                assert_eq!(
                    valid,
                    "never, always, smart_20, smart_30, smart_50, conservative, aggressive, balanced"
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            "random".parse::<ChargePolicy>(),
            Err(SimError::UnknownChargePolicy { .. })
        ));
        assert_eq!(ShieldStrategy::default(), ShieldStrategy::Smart30);
    }

    #[test]
    fn serde_names_match_parse_names() {
        for name in ShieldStrategy::names() {
            let parsed: ShieldStrategy = name.parse().expect("known name");
            let json = serde_json::to_string(&parsed).expect("serialize");
            assert_eq!(json, format!("\"{name}\""));
        }
    }
}
