use proptest::prelude::*;
use pvp_battle_sim::ai::{ChargePolicy, ShieldStrategy};
use pvp_battle_sim::battle::{simulate_battle, BattleOptions, CombatantSpec, Side, MAX_ENERGY};
use pvp_battle_sim::damage::{damage_from_parts, DOUBLE_RESISTED, RESISTED, STAB, SUPER_EFFECTIVE};
use pvp_battle_sim::model::{BaseStats, BuffEffect, MoveSpec, SpeciesProfile};
use pvp_battle_sim::stats::{buff_multiplier, shift_stage, MAX_STAGE, MIN_STAGE};
use pvp_battle_sim::types::{Type, TypeChart};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const SHIELD_STRATEGIES: [ShieldStrategy; 8] = [
    ShieldStrategy::Never,
    ShieldStrategy::Always,
    ShieldStrategy::Smart20,
    ShieldStrategy::Smart30,
    ShieldStrategy::Smart50,
    ShieldStrategy::Conservative,
    ShieldStrategy::Aggressive,
    ShieldStrategy::Balanced,
];

fn any_type() -> impl Strategy<Value = Type> {
    (0..Type::ALL.len()).prop_map(|i| Type::ALL[i])
}

fn make_species(id: &str, t: Type, attack: u32, defense: u32, stamina: u32) -> SpeciesProfile {
    SpeciesProfile::new(
        id,
        &[t],
        BaseStats {
            attack,
            defense,
            stamina,
        },
    )
    .expect("valid species")
}

#[derive(Debug, Clone)]
struct SideConfig {
    t: Type,
    attack: u32,
    defense: u32,
    stamina: u32,
    fast_power: u32,
    fast_gain: u32,
    charged_power: u32,
    charged_cost: u32,
    buff: i8,
    shields: u8,
    strategy: usize,
    greedy: bool,
}

fn any_side() -> impl Strategy<Value = SideConfig> {
    (
        (any_type(), 50u32..300, 50u32..300, 50u32..300),
        (1u32..20, 1u32..20, 0u32..200, 0u32..110),
        (-2i8..=2, 0u8..4, 0usize..SHIELD_STRATEGIES.len(), any::<bool>()),
    )
        .prop_map(
            |(
                (t, attack, defense, stamina),
                (fast_power, fast_gain, charged_power, charged_cost),
                (buff, shields, strategy, greedy),
            )| SideConfig {
                t,
                attack,
                defense,
                stamina,
                fast_power,
                fast_gain,
                charged_power,
                charged_cost,
                buff,
                shields,
                strategy,
                greedy,
            },
        )
}

proptest! {
    #[test]
    fn damage_is_at_least_one(
        power in 0u32..400,
        attack in 0.01f64..600.0,
        defense in 0.01f64..600.0,
        eff_idx in 0usize..6,
        stab in prop::bool::ANY,
    ) {
        let effs = [
            1.0,
            SUPER_EFFECTIVE,
            SUPER_EFFECTIVE * SUPER_EFFECTIVE,
            RESISTED,
            RESISTED * DOUBLE_RESISTED,
            DOUBLE_RESISTED * DOUBLE_RESISTED,
        ];
        let stab = if stab { STAB } else { 1.0 };
        prop_assert!(damage_from_parts(power, stab, attack, defense, effs[eff_idx]) >= 1);
    }

    #[test]
    fn stages_stay_in_bounds(start in MIN_STAGE..=MAX_STAGE, delta in any::<i8>()) {
        let shifted = shift_stage(start, delta);
        prop_assert!((MIN_STAGE..=MAX_STAGE).contains(&shifted));
        prop_assert!(buff_multiplier(shifted) > 0.0);
    }

    #[test]
    fn effectiveness_ignores_type_order(a in any_type(), d1 in any_type(), d2 in any_type()) {
        let chart = TypeChart::standard();
        let forward = chart.effectiveness(a, &[d1, d2]);
        prop_assert_eq!(forward, chart.effectiveness(a, &[d2, d1]));
        prop_assert!(forward > 0.0);
    }

    #[test]
    fn battle_invariants_hold(left in any_side(), right in any_side(), seed in any::<u64>()) {
        let mons = [
            make_species("left", left.t, left.attack, left.defense, left.stamina),
            make_species("right", right.t, right.attack, right.defense, right.stamina),
        ];
        let moves: Vec<(MoveSpec, MoveSpec)> = [&left, &right]
            .iter()
            .map(|s| {
                let fast = MoveSpec::fast("FAST", s.t, s.fast_power, s.fast_gain);
                let mut charged = MoveSpec::charged("CHARGED", s.t, s.charged_power, s.charged_cost);
                if s.buff != 0 {
                    charged = charged.with_buff(BuffEffect {
                        attack_delta: s.buff,
                        defense_delta: -s.buff,
                        target_self: s.buff > 0,
                        apply_chance: 0.5,
                    });
                }
                (fast, charged)
            })
            .collect();
        let spec = |i: usize, s: &SideConfig| {
            let policy = if s.greedy { ChargePolicy::Greedy } else { ChargePolicy::DpeWait };
            CombatantSpec::new(&mons[i], &moves[i].0, &[&moves[i].1])
                .with_shields(s.shields, SHIELD_STRATEGIES[s.strategy])
                .with_charge_policy(policy)
        };

        let mut rng = SmallRng::seed_from_u64(seed);
        let result = simulate_battle(
            TypeChart::standard(),
            spec(0, &left),
            spec(1, &right),
            BattleOptions::default(),
            &mut rng,
        );
        let result = match result {
            Ok(result) => result,
            Err(err) => return Err(TestCaseError::fail(format!("{err}"))),
        };

        prop_assert!((0.0..=1.0).contains(&result.battle_rating));
        let mut shields = [left.shields, right.shields];
        for event in &result.timeline {
            prop_assert!(event.attacker_energy <= MAX_ENERGY);
            let defender = match event.attacker {
                Side::A => 1,
                Side::B => 0,
            };
            prop_assert!(event.defender_shields <= shields[defender]);
            if event.shield_used {
                prop_assert_eq!(event.defender_shields + 1, shields[defender]);
                prop_assert_eq!(event.damage, 0);
            }
            shields[defender] = event.defender_shields;
        }
        for (side, cfg) in [(1usize, &right), (0usize, &left)] {
            let shield_events = result
                .timeline
                .iter()
                .filter(|e| e.shield_used && (e.attacker == Side::A) == (side == 1))
                .count();
            if cfg.shields == 0 || SHIELD_STRATEGIES[cfg.strategy] == ShieldStrategy::Never {
                prop_assert_eq!(shield_events, 0);
            }
        }
    }
}

#[test]
fn buff_multiplier_is_monotonic() {
    let values: Vec<f64> = (MIN_STAGE..=MAX_STAGE).map(buff_multiplier).collect();
    assert!(values.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(values[4], 1.0);
}
