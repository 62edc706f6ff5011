use crate::battle::{ActionKind, BattleResult, CombatantSnapshot, Outcome, Side, TimelineEvent};
use serde_json::json;

/// Hook the engine reports to while a battle runs. Every method defaults to a no-op.
pub trait BattleObserver {
    fn on_battle_start(&mut self, _a: &CombatantSnapshot, _b: &CombatantSnapshot) {}

    fn on_turn_start(&mut self, _turn: u32) {}

    fn on_event(&mut self, _event: &TimelineEvent) {}

    /// A charged-move opportunity was skipped to save energy for `move_id`.
    fn on_charge_held(&mut self, _turn: u32, _side: Side, _move_id: &str, _energy: u32) {}

    fn on_finish(&mut self, _result: &BattleResult) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl BattleObserver for NoopObserver {}

/// Records a battle as protocol-style lines (`|turn|3`, `|move|..`, `|-damage|..`).
#[derive(Clone, Debug, Default)]
pub struct BattleLogger {
    formatid: String,
    log: Vec<String>,
    idents: [String; 2],
    max_hp: [u32; 2],
}

impl BattleLogger {
    pub fn new() -> Self {
        Self::new_with_format("pvp")
    }

    pub fn new_with_format(formatid: impl Into<String>) -> Self {
        Self {
            formatid: formatid.into(),
            ..Self::default()
        }
    }

    pub fn log_turn(&mut self, turn: u32) {
        self.log.push(format!("|turn|{turn}"));
    }

    pub fn log_switch(&mut self, side: Side, species: &str, hp: u32, max_hp: u32) {
        let ident = protocol_ident(side, species);
        self.log.push(format!("|switch|{ident}|{species}|{hp}/{max_hp}"));
        self.idents[side.index()] = ident;
        self.max_hp[side.index()] = max_hp;
    }

    pub fn log_move(&mut self, source: &str, move_id: &str, target: &str) {
        self.log.push(format!("|move|{source}|{move_id}|{target}"));
    }

    pub fn log_damage(&mut self, target: &str, hp: u32, max_hp: u32) {
        self.log.push(format!("|-damage|{target}|{hp}/{max_hp}"));
    }

    pub fn log_shield(&mut self, target: &str) {
        self.log.push(format!("|-shield|{target}"));
    }

    pub fn log_stage(&mut self, target: &str, stat: &str, delta: i8) {
        if delta > 0 {
            self.log.push(format!("|-boost|{target}|{stat}|{delta}"));
        } else if delta < 0 {
            self.log.push(format!("|-unboost|{target}|{stat}|{}", -(delta as i16)));
        }
    }

    pub fn log_win(&mut self, winner: &str) {
        self.log.push(format!("|win|{winner}"));
    }

    pub fn log_tie(&mut self) {
        self.log.push("|tie|".to_string());
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "formatid": self.formatid,
            "log": self.log,
        })
    }

    fn ident(&self, side: Side) -> String {
        self.idents[side.index()].clone()
    }
}

impl BattleObserver for BattleLogger {
    fn on_battle_start(&mut self, a: &CombatantSnapshot, b: &CombatantSnapshot) {
        self.log_switch(Side::A, &a.id, a.hp, a.max_hp);
        self.log_switch(Side::B, &b.id, b.hp, b.max_hp);
    }

    fn on_turn_start(&mut self, turn: u32) {
        self.log_turn(turn);
    }

    fn on_event(&mut self, event: &TimelineEvent) {
        let source = self.ident(event.attacker);
        let defender = event.attacker.opponent();
        let target = self.ident(defender);
        self.log_move(&source, &event.move_id, &target);
        if event.shield_used {
            self.log_shield(&target);
        }
        if event.kind == ActionKind::Fast || !event.shield_used {
            let max_hp = self.max_hp[defender.index()];
            self.log_damage(&target, event.defender_hp, max_hp);
        }
        if let Some(buff) = event.buff {
            let buffed = self.ident(buff.target);
            self.log_stage(&buffed, "atk", buff.attack_delta);
            self.log_stage(&buffed, "def", buff.defense_delta);
        }
    }

    fn on_finish(&mut self, result: &BattleResult) {
        match result.outcome {
            Outcome::Tie => self.log_tie(),
            Outcome::AWins | Outcome::BWins => self.log_win(&result.winner),
        }
    }
}

/// `p1a: azumarill` / `p2a: altaria`.
pub fn protocol_ident(side: Side, species: &str) -> String {
    let slot = match side {
        Side::A => "p1a",
        Side::B => "p2a",
    };
    format!("{slot}: {species}")
}
