use crate::ai::{ChargeContext, ChargeDecision, ChargePolicy, ShieldContext, ShieldStrategy};
use crate::damage::calculate_damage;
use crate::error::SimError;
use crate::logger::{BattleObserver, NoopObserver};
use crate::model::{MoveSpec, SpeciesProfile, StatTierProfile};
use crate::stats::{buff_multiplier, derive_stats, shift_stage, DerivedStats};
use crate::types::{Type, TypeChart};
use log::{debug, trace, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MAX_ENERGY: u32 = 100;
pub const DEFAULT_MAX_TURNS: u32 = 500;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    AWins,
    BWins,
    Tie,
}

impl Outcome {
    pub fn winner_side(self) -> Option<Side> {
        match self {
            Outcome::AWins => Some(Side::A),
            Outcome::BWins => Some(Side::B),
            Outcome::Tie => None,
        }
    }

    /// 1 for an A win, 0 for a B win, 0.5 for a tie.
    pub fn score_for_a(self) -> f64 {
        match self {
            Outcome::AWins => 1.0,
            Outcome::BWins => 0.0,
            Outcome::Tie => 0.5,
        }
    }
}

/// Engine knobs that are not part of either combatant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleOptions {
    /// Turns allowed before the battle is reported as an anomaly.
    pub max_turns: u32,
    pub starting_energy: u32,
}

impl Default for BattleOptions {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            starting_energy: 0,
        }
    }
}

/// Everything the engine needs to build one side. Moves are already resolved.
#[derive(Clone, Debug)]
pub struct CombatantSpec<'a> {
    pub profile: &'a SpeciesProfile,
    pub fast: Option<&'a MoveSpec>,
    pub charged: Vec<&'a MoveSpec>,
    pub stat_profile: StatTierProfile,
    pub shields: u8,
    pub shield_strategy: ShieldStrategy,
    pub charge_policy: ChargePolicy,
}

impl<'a> CombatantSpec<'a> {
    pub fn new(profile: &'a SpeciesProfile, fast: &'a MoveSpec, charged: &[&'a MoveSpec]) -> Self {
        Self {
            profile,
            fast: Some(fast),
            charged: charged.to_vec(),
            stat_profile: StatTierProfile::default(),
            shields: 2,
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

    pub fn with_stat_profile(mut self, stat_profile: StatTierProfile) -> Self {
        self.stat_profile = stat_profile;
        self
    }
}

/// Point-in-time view of one combatant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CombatantSnapshot {
    pub id: String,
    pub hp: u32,
    pub max_hp: u32,
    pub energy: u32,
    pub shields: u8,
    pub attack_stage: i8,
    pub defense_stage: i8,
}

/// Stage change that actually landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedBuff {
    pub target: Side,
    pub attack_delta: i8,
    pub defense_delta: i8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fast,
    Charged,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    pub turn: u32,
    pub kind: ActionKind,
    pub attacker: Side,
    pub attacker_id: String,
    pub defender_id: String,
    pub move_id: String,
    pub move_name: String,
    pub damage: u32,
    /// Change in the attacker's energy: gained after the [`MAX_ENERGY`] cap
    /// (not the move's nominal gain), or spent as a negative value.
    pub energy_delta: i32,
    pub attacker_energy: u32,
    pub shield_used: bool,
    /// Defender's shields left after this event.
    pub defender_shields: u8,
    pub buff_applied: bool,
    pub buff: Option<AppliedBuff>,
    pub defender_hp: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BattleResult {
    pub outcome: Outcome,
    /// Winner's species id, or `"tie"`.
    pub winner: String,
    pub battle_rating: f64,
    pub turns: u32,
    pub final_a: CombatantSnapshot,
    pub final_b: CombatantSnapshot,
    pub timeline: Vec<TimelineEvent>,
}

#[derive(Clone, Debug)]
pub struct CombatantState<'a> {
    profile: &'a SpeciesProfile,
    fast: &'a MoveSpec,
    charged: Vec<&'a MoveSpec>,
    stats: DerivedStats,
    hp: u32,
    energy: u32,
    attack_stage: i8,
    defense_stage: i8,
    shields: u8,
    shield_strategy: ShieldStrategy,
    charge_policy: ChargePolicy,
}

impl<'a> CombatantState<'a> {
    pub fn new(spec: CombatantSpec<'a>, starting_energy: u32) -> Result<Self, SimError> {
        let fast = spec
            .fast
            .ok_or_else(|| SimError::invalid_moveset(&spec.profile.id, "missing fast move"))?;
        let stats = derive_stats(spec.profile, &spec.stat_profile);
        Ok(Self {
            profile: spec.profile,
            fast,
            charged: spec.charged,
            stats,
            hp: stats.max_hp,
            energy: starting_energy.min(MAX_ENERGY),
            attack_stage: 0,
            defense_stage: 0,
            shields: spec.shields,
            shield_strategy: spec.shield_strategy,
            charge_policy: spec.charge_policy,
        })
    }

    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn types(&self) -> &[Type] {
        &self.profile.types
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.stats.max_hp
    }

    pub fn energy(&self) -> u32 {
        self.energy
    }

    pub fn shields(&self) -> u8 {
        self.shields
    }

    pub fn stages(&self) -> (i8, i8) {
        (self.attack_stage, self.defense_stage)
    }

    pub fn effective_attack(&self) -> f64 {
        self.stats.attack * buff_multiplier(self.attack_stage)
    }

    pub fn effective_defense(&self) -> f64 {
        self.stats.defense * buff_multiplier(self.defense_stage)
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
    }

    /// Returns the energy actually gained after capping at [`MAX_ENERGY`].
    pub fn gain_energy(&mut self, amount: u32) -> u32 {
        let before = self.energy;
        self.energy = self.energy.saturating_add(amount).min(MAX_ENERGY);
        self.energy - before
    }

    /// Returns the energy actually spent.
    pub fn spend_energy(&mut self, amount: u32) -> u32 {
        let before = self.energy;
        self.energy = self.energy.saturating_sub(amount);
        before - self.energy
    }

    pub fn apply_stage_change(&mut self, attack_delta: i8, defense_delta: i8) {
        self.attack_stage = shift_stage(self.attack_stage, attack_delta);
        self.defense_stage = shift_stage(self.defense_stage, defense_delta);
    }

    /// Consumes a shield if one is left.
    pub fn use_shield(&mut self) -> bool {
        if self.shields == 0 {
            return false;
        }
        self.shields -= 1;
        true
    }

    pub fn snapshot(&self) -> CombatantSnapshot {
        CombatantSnapshot {
            id: self.profile.id.clone(),
            hp: self.hp,
            max_hp: self.stats.max_hp,
            energy: self.energy,
            shields: self.shields,
            attack_stage: self.attack_stage,
            defense_stage: self.defense_stage,
        }
    }
}

pub struct BattleEngine<'a> {
    chart: &'a TypeChart,
    a: CombatantState<'a>,
    b: CombatantState<'a>,
    options: BattleOptions,
    turn: u32,
    timeline: Vec<TimelineEvent>,
}

impl<'a> BattleEngine<'a> {
    pub fn new(
        chart: &'a TypeChart,
        a: CombatantSpec<'a>,
        b: CombatantSpec<'a>,
        options: BattleOptions,
    ) -> Result<Self, SimError> {
        let a = CombatantState::new(a, options.starting_energy)?;
        let b = CombatantState::new(b, options.starting_energy)?;
        Ok(Self {
            chart,
            a,
            b,
            options,
            turn: 0,
            timeline: Vec::new(),
        })
    }

    pub fn combatant(&self, side: Side) -> &CombatantState<'a> {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    /// Attacker first, defender second.
    fn pair_mut(&mut self, side: Side) -> (&mut CombatantState<'a>, &mut CombatantState<'a>) {
        match side {
            Side::A => (&mut self.a, &mut self.b),
            Side::B => (&mut self.b, &mut self.a),
        }
    }

    fn outcome(&self) -> Option<Outcome> {
        match (self.a.is_fainted(), self.b.is_fainted()) {
            (true, true) => Some(Outcome::Tie),
            (false, true) => Some(Outcome::AWins),
            (true, false) => Some(Outcome::BWins),
            (false, false) => None,
        }
    }

    pub fn run<R: Rng>(
        mut self,
        rng: &mut R,
        observer: &mut dyn BattleObserver,
    ) -> Result<BattleResult, SimError> {
        debug!(
            "battle start: {} ({} hp) vs {} ({} hp)",
            self.a.id(),
            self.a.max_hp(),
            self.b.id(),
            self.b.max_hp()
        );
        observer.on_battle_start(&self.a.snapshot(), &self.b.snapshot());

        let outcome = loop {
            if let Some(outcome) = self.outcome() {
                break outcome;
            }
            if self.turn >= self.options.max_turns {
                warn!(
                    "{} vs {} still running after {} turns",
                    self.a.id(),
                    self.b.id(),
                    self.turn
                );
                return Err(SimError::TurnLimitExceeded(self.options.max_turns));
            }
            self.turn += 1;
            observer.on_turn_start(self.turn);

            self.fast_action(Side::A, rng, observer);
            self.fast_action(Side::B, rng, observer);
            if self.outcome().is_some() {
                continue;
            }

            // Both opportunities resolve before the faint check.
            self.charged_opportunity(Side::A, rng, observer);
            self.charged_opportunity(Side::B, rng, observer);
        };

        let result = self.finish(outcome);
        debug!(
            "battle over after {} turns: {} ({:.3})",
            result.turns, result.winner, result.battle_rating
        );
        observer.on_finish(&result);
        Ok(result)
    }

    fn finish(self, outcome: Outcome) -> BattleResult {
        let (winner, battle_rating) = match outcome.winner_side() {
            Some(side) => {
                let w = self.combatant(side);
                let rating = (w.hp() as f64 / w.max_hp() as f64).min(1.0);
                (w.id().to_string(), rating)
            }
            None => ("tie".to_string(), 0.5),
        };
        BattleResult {
            outcome,
            winner,
            battle_rating,
            turns: self.turn,
            final_a: self.a.snapshot(),
            final_b: self.b.snapshot(),
            timeline: self.timeline,
        }
    }

    fn fast_action<R: Rng>(
        &mut self,
        side: Side,
        rng: &mut R,
        observer: &mut dyn BattleObserver,
    ) {
        let chart = self.chart;
        let turn = self.turn;
        let (attacker, defender) = self.pair_mut(side);
        let mv = attacker.fast;
        let damage = calculate_damage(
            chart,
            attacker.effective_attack(),
            defender.effective_defense(),
            mv,
            attacker.types(),
            defender.types(),
        );
        defender.take_damage(damage);
        let gained = attacker.gain_energy(mv.energy_gain);
        let buff = roll_buff(mv, side, attacker, defender, rng);

        let event = TimelineEvent {
            turn,
            kind: ActionKind::Fast,
            attacker: side,
            attacker_id: attacker.id().to_string(),
            defender_id: defender.id().to_string(),
            move_id: mv.id.clone(),
            move_name: mv.name.clone(),
            damage,
            energy_delta: gained as i32,
            attacker_energy: attacker.energy(),
            shield_used: false,
            defender_shields: defender.shields(),
            buff_applied: buff.is_some(),
            buff,
            defender_hp: defender.hp(),
        };
        self.record(event, observer);
    }

    fn charged_opportunity<R: Rng>(
        &mut self,
        side: Side,
        rng: &mut R,
        observer: &mut dyn BattleObserver,
    ) {
        let chart = self.chart;
        let turn = self.turn;
        let (attacker, defender) = self.pair_mut(side);
        if attacker.charged.is_empty() {
            return;
        }

        let ctx = ChargeContext {
            moves: &attacker.charged,
            energy: attacker.energy(),
            attacker_hp: attacker.hp(),
            attacker_max_hp: attacker.max_hp(),
            defender_hp: defender.hp(),
            defender_max_hp: defender.max_hp(),
            attacker_types: attacker.types(),
            defender_types: defender.types(),
        };
        let idx = match attacker.charge_policy.decide(chart, &ctx) {
            ChargeDecision::Use(idx) => idx,
            ChargeDecision::Pass => return,
            ChargeDecision::Wait(idx) => {
                let held = attacker.charged[idx];
                trace!(
                    "turn {turn}: {} holds {} energy for {}",
                    attacker.id(),
                    attacker.energy(),
                    held.id
                );
                observer.on_charge_held(turn, side, &held.id, attacker.energy());
                return;
            }
        };

        let mv = attacker.charged[idx];
        let damage = calculate_damage(
            chart,
            attacker.effective_attack(),
            defender.effective_defense(),
            mv,
            attacker.types(),
            defender.types(),
        );
        let spent = attacker.spend_energy(mv.energy);

        let shield_ctx = ShieldContext {
            incoming_damage: damage,
            defender_hp: defender.hp(),
            defender_max_hp: defender.max_hp(),
            effectiveness: chart.effectiveness(mv.move_type, defender.types()),
            remaining_shields: defender.shields(),
        };
        let shield_used =
            defender.shield_strategy.should_shield(&shield_ctx) && defender.use_shield();
        let dealt = if shield_used { 0 } else { damage };
        defender.take_damage(dealt);
        let buff = roll_buff(mv, side, attacker, defender, rng);

        let event = TimelineEvent {
            turn,
            kind: ActionKind::Charged,
            attacker: side,
            attacker_id: attacker.id().to_string(),
            defender_id: defender.id().to_string(),
            move_id: mv.id.clone(),
            move_name: mv.name.clone(),
            damage: dealt,
            energy_delta: -(spent as i32),
            attacker_energy: attacker.energy(),
            shield_used,
            defender_shields: defender.shields(),
            buff_applied: buff.is_some(),
            buff,
            defender_hp: defender.hp(),
        };
        self.record(event, observer);
    }

    fn record(&mut self, event: TimelineEvent, observer: &mut dyn BattleObserver) {
        trace!(
            "turn {}: {} {} -> {} for {}{} ({} hp left)",
            event.turn,
            event.attacker_id,
            event.move_id,
            event.defender_id,
            event.damage,
            if event.shield_used { " (shielded)" } else { "" },
            event.defender_hp
        );
        observer.on_event(&event);
        self.timeline.push(event);
    }
}

/// Rolls the move's buff, if it has one, and applies it to its target.
fn roll_buff<'a, R: Rng>(
    mv: &MoveSpec,
    side: Side,
    attacker: &mut CombatantState<'a>,
    defender: &mut CombatantState<'a>,
    rng: &mut R,
) -> Option<AppliedBuff> {
    let buff = mv.buff?;
    if rng.gen::<f64>() >= buff.apply_chance {
        return None;
    }
    let (target, target_side) = if buff.target_self {
        (attacker, side)
    } else {
        (defender, side.opponent())
    };
    target.apply_stage_change(buff.attack_delta, buff.defense_delta);
    Some(AppliedBuff {
        target: target_side,
        attack_delta: buff.attack_delta,
        defense_delta: buff.defense_delta,
    })
}

/// Runs one battle to completion without an observer.
pub fn simulate_battle<R: Rng>(
    chart: &TypeChart,
    a: CombatantSpec<'_>,
    b: CombatantSpec<'_>,
    options: BattleOptions,
    rng: &mut R,
) -> Result<BattleResult, SimError> {
    BattleEngine::new(chart, a, b, options)?.run(rng, &mut NoopObserver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaseStats, BuffEffect};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn make_species(id: &str, types: &[Type], attack: u32, defense: u32, stamina: u32) -> SpeciesProfile {
        SpeciesProfile::new(
            id,
            types,
            BaseStats {
                attack,
                defense,
                stamina,
            },
        )
        .expect("valid species")
    }

    #[test]
    fn energy_is_capped_and_reported() {
        let mon = make_species("mon", &[Type::Normal], 100, 100, 100);
        let fast = MoveSpec::fast("TACKLE", Type::Normal, 5, 5);
        let mut state = CombatantState::new(CombatantSpec::new(&mon, &fast, &[]), 98).expect("state");
        assert_eq!(state.gain_energy(5), 2);
        assert_eq!(state.energy(), MAX_ENERGY);
        assert_eq!(state.spend_energy(150), 100);
        assert_eq!(state.energy(), 0);
    }

    #[test]
    fn starting_energy_is_clamped() {
        let mon = make_species("mon", &[Type::Normal], 100, 100, 100);
        let fast = MoveSpec::fast("TACKLE", Type::Normal, 5, 5);
        let state = CombatantState::new(CombatantSpec::new(&mon, &fast, &[]), 250).expect("state");
        assert_eq!(state.energy(), MAX_ENERGY);
    }

    #[test]
    fn hp_floors_at_zero() {
        let mon = make_species("mon", &[Type::Normal], 100, 100, 100);
        let fast = MoveSpec::fast("TACKLE", Type::Normal, 5, 5);
        let mut state = CombatantState::new(CombatantSpec::new(&mon, &fast, &[]), 0).expect("state");
        state.take_damage(10_000);
        assert_eq!(state.hp(), 0);
        assert!(state.is_fainted());
    }

    #[test]
    fn shields_only_go_down() {
        let mon = make_species("mon", &[Type::Normal], 100, 100, 100);
        let fast = MoveSpec::fast("TACKLE", Type::Normal, 5, 5);
        let spec = CombatantSpec::new(&mon, &fast, &[]).with_shields(1, ShieldStrategy::Always);
        let mut state = CombatantState::new(spec, 0).expect("state");
        assert!(state.use_shield());
        assert!(!state.use_shield());
        assert_eq!(state.shields(), 0);
    }

    #[test]
    fn stages_scale_effective_stats() {
        let mon = make_species("mon", &[Type::Normal], 100, 100, 100);
        let fast = MoveSpec::fast("TACKLE", Type::Normal, 5, 5);
        let mut state = CombatantState::new(CombatantSpec::new(&mon, &fast, &[]), 0).expect("state");
        let base_attack = state.effective_attack();
        state.apply_stage_change(2, -6);
        assert_eq!(state.stages(), (2, -4));
        assert_eq!(state.effective_attack(), base_attack * 2.0);
    }

    #[test]
    fn missing_fast_move_is_rejected() {
        let mon = make_species("mon", &[Type::Normal], 100, 100, 100);
        let fast = MoveSpec::fast("TACKLE", Type::Normal, 5, 5);
        let mut spec = CombatantSpec::new(&mon, &fast, &[]);
        spec.fast = None;
        let other = CombatantSpec::new(&mon, &fast, &[]);
        let err = BattleEngine::new(TypeChart::standard(), spec, other, BattleOptions::default())
            .err()
            .expect("missing fast move");
        assert!(matches!(err, SimError::InvalidMoveset { .. }));
    }

    #[test]
    fn self_buff_lands_on_attacker() {
        let mon = make_species("mon", &[Type::Fighting], 100, 100, 100);
        let target = make_species("target", &[Type::Normal], 100, 100, 100);
        let fast = MoveSpec::fast("COUNTER", Type::Fighting, 1, 10).with_buff(BuffEffect {
            attack_delta: 1,
            defense_delta: 0,
            target_self: true,
            apply_chance: 1.0,
        });
        let tackle = MoveSpec::fast("TACKLE", Type::Normal, 1, 1);
        let mut engine = BattleEngine::new(
            TypeChart::standard(),
            CombatantSpec::new(&mon, &fast, &[]),
            CombatantSpec::new(&target, &tackle, &[]),
            BattleOptions::default(),
        )
        .expect("engine");
        let mut rng = SmallRng::seed_from_u64(1);
        engine.turn = 1;
        engine.fast_action(Side::A, &mut rng, &mut NoopObserver);
        assert_eq!(engine.combatant(Side::A).stages(), (1, 0));
        assert_eq!(engine.combatant(Side::B).stages(), (0, 0));
        let event = &engine.timeline[0];
        assert!(event.buff_applied);
        assert_eq!(event.energy_delta, 10);
    }

    #[test]
    fn zero_chance_buff_never_lands() {
        let mon = make_species("mon", &[Type::Normal], 100, 100, 100);
        let fast = MoveSpec::fast("TACKLE", Type::Normal, 1, 1).with_buff(BuffEffect {
            attack_delta: 0,
            defense_delta: -1,
            target_self: false,
            apply_chance: 0.0,
        });
        let mut engine = BattleEngine::new(
            TypeChart::standard(),
            CombatantSpec::new(&mon, &fast, &[]),
            CombatantSpec::new(&mon, &fast, &[]),
            BattleOptions::default(),
        )
        .expect("engine");
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..20 {
            engine.fast_action(Side::A, &mut rng, &mut NoopObserver);
        }
        assert_eq!(engine.combatant(Side::B).stages(), (0, 0));
    }

    #[test]
    fn fast_event_reports_capped_gain() {
        let mon = make_species("mon", &[Type::Normal], 100, 100, 100);
        let fast = MoveSpec::fast("TACKLE", Type::Normal, 1, 5);
        let options = BattleOptions {
            starting_energy: 98,
            ..BattleOptions::default()
        };
        let mut engine = BattleEngine::new(
            TypeChart::standard(),
            CombatantSpec::new(&mon, &fast, &[]),
            CombatantSpec::new(&mon, &fast, &[]),
            options,
        )
        .expect("engine");
        let mut rng = SmallRng::seed_from_u64(3);
        engine.turn = 1;
        engine.fast_action(Side::A, &mut rng, &mut NoopObserver);
        engine.fast_action(Side::A, &mut rng, &mut NoopObserver);
        let deltas: Vec<i32> = engine.timeline.iter().map(|e| e.energy_delta).collect();
        assert_eq!(deltas, vec![2, 0]);
        assert_eq!(engine.timeline[1].attacker_energy, MAX_ENERGY);
    }

    #[test]
    fn outcome_scores() {
        assert_eq!(Outcome::AWins.score_for_a(), 1.0);
        assert_eq!(Outcome::Tie.score_for_a(), 0.5);
        assert_eq!(Outcome::BWins.winner_side(), Some(Side::B));
    }
}
