//! Damage formula.
//!
//! The multipliers are single-precision values widened to `f64`. They must stay
//! bit-for-bit identical: the formula floors its result, so the last digits
//! decide the integer that comes out.

use crate::model::MoveSpec;
use crate::types::{Type, TypeChart};

pub const BONUS: f64 = 1.2999999523162841796875;
pub const SUPER_EFFECTIVE: f64 = 1.60000002384185791015625;
pub const RESISTED: f64 = 0.625;
pub const DOUBLE_RESISTED: f64 = 0.390625;
pub const STAB: f64 = 1.2000000476837158203125;

pub fn stab_multiplier(move_type: Type, attacker_types: &[Type]) -> f64 {
    if attacker_types.contains(&move_type) {
        STAB
    } else {
        1.0
    }
}

/// `floor(power * stab * (attack / defense) * effectiveness * 0.5 * BONUS) + 1`,
/// never below 1.
///
/// Multiplication runs strictly left to right.
pub fn damage_from_parts(power: u32, stab: f64, attack: f64, defense: f64, effectiveness: f64) -> u32 {
    let raw = power as f64 * stab * (attack / defense) * effectiveness * 0.5 * BONUS;
    // NaN (0 * inf) collapses to the floor of 1 via f64::max.
    let damage = (raw.floor() + 1.0).max(1.0);
    damage as u32
}

pub fn calculate_damage(
    chart: &TypeChart,
    attack: f64,
    defense: f64,
    move_spec: &MoveSpec,
    attacker_types: &[Type],
    defender_types: &[Type],
) -> u32 {
    let stab = stab_multiplier(move_spec.move_type, attacker_types);
    let effectiveness = chart.effectiveness(move_spec.move_type, defender_types);
    damage_from_parts(move_spec.power, stab, attack, defense, effectiveness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MoveSpec;

    fn make_move(id: &str, move_type: Type, power: u32) -> MoveSpec {
        MoveSpec::charged(id, move_type, power, 50)
    }

    #[test]
    fn bonus_precision_decides_the_floor() {
        // 20 * 0.5 * 1.2999999523... = 12.9999995..., a rounded 1.3 would give 14.
        assert_eq!(damage_from_parts(20, 1.0, 100.0, 100.0, 1.0), 13);
        assert_eq!(damage_from_parts(10, 1.0, 100.0, 100.0, 1.0), 7);
    }

    #[test]
    fn super_effective_precision_decides_the_floor() {
        assert_eq!(damage_from_parts(10, 1.0, 125.0, 100.0, SUPER_EFFECTIVE), 13);
        assert_eq!(damage_from_parts(25, 1.0, 150.0, 100.0, SUPER_EFFECTIVE), 39);
    }

    #[test]
    fn stab_precision_decides_the_floor() {
        assert_eq!(damage_from_parts(25, 1.0, 160.0, 100.0, 1.0), 26);
    }

    #[test]
    fn ice_beam_into_dragon_flying() {
        // Level 40, 15/15/15 spreads: 114.3 attack into 194.4 defense.
        let chart = TypeChart::standard();
        let ice_beam = make_move("ICE_BEAM", Type::Ice, 90);
        let damage = calculate_damage(
            chart,
            114.3,
            194.4,
            &ice_beam,
            &[Type::Water, Type::Fairy],
            &[Type::Dragon, Type::Flying],
        );
        assert_eq!(damage, 89);
    }

    #[test]
    fn stab_applies_on_matching_type() {
        let chart = TypeChart::standard();
        let bubble = MoveSpec::fast("BUBBLE", Type::Water, 7, 11);
        let damage = calculate_damage(
            chart,
            114.3,
            194.4,
            &bubble,
            &[Type::Water, Type::Fairy],
            &[Type::Dragon, Type::Flying],
        );
        assert_eq!(damage, 3);
        assert_eq!(stab_multiplier(Type::Water, &[Type::Water, Type::Fairy]), STAB);
        assert_eq!(stab_multiplier(Type::Ice, &[Type::Water, Type::Fairy]), 1.0);
    }

    #[test]
    fn zero_power_still_deals_one() {
        assert_eq!(damage_from_parts(0, 1.0, 100.0, 100.0, 1.0), 1);
        assert_eq!(damage_from_parts(0, 1.0, 100.0, 0.0, 1.0), 1);
        assert_eq!(damage_from_parts(1, 1.0, 1.0, 500.0, DOUBLE_RESISTED), 1);
    }
}
