//! Type matchup analysis between one opponent and a small team.

use crate::battle::ActionKind;
use crate::catalog::Catalog;
use crate::error::SimError;
use crate::model::{MoveSpec, SpeciesProfile};
use crate::simulator::Simulator;
use crate::types::{Type, TypeMatchup};
use log::debug;
use serde::{Deserialize, Serialize};

pub const MAX_TEAM_SIZE: usize = 3;

/// Matchup payload: an opponent and up to [`MAX_TEAM_SIZE`] team members,
/// each named by species id or display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupRequest {
    pub opponent: String,
    pub team: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnedMove<'c> {
    pub class: ActionKind,
    #[serde(rename = "move")]
    pub spec: &'c MoveSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberEffect {
    pub pokemon: String,
    pub effectiveness: TypeMatchup,
}

/// One opponent move against every team member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentMoveRow<'c> {
    pub attack: LearnedMove<'c>,
    pub vs_team: Vec<MemberEffect>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveEffect<'c> {
    pub attack: LearnedMove<'c>,
    pub effectiveness: TypeMatchup,
}

/// One team member's moves against the opponent. `found` is false when the
/// name matched nothing; such a member has no types and no moves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMemberRow<'c> {
    pub pokemon: String,
    pub found: bool,
    pub moves: Vec<MoveEffect<'c>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupReport<'c> {
    pub opponent: &'c SpeciesProfile,
    pub team: Vec<String>,
    pub opponent_weaknesses: Vec<(Type, f64)>,
    pub opponent_resistances: Vec<(Type, f64)>,
    pub opponent_moves_vs_team: Vec<OpponentMoveRow<'c>>,
    pub team_moves_vs_opponent: Vec<TeamMemberRow<'c>>,
}

struct Member<'c> {
    name: String,
    types: &'c [Type],
    profile: Option<&'c SpeciesProfile>,
}

impl<'c, C: Catalog + ?Sized> Simulator<'c, C> {
    /// Fast moves then charged moves, skipping ids the catalog has no data for.
    pub fn learned_moves(&self, profile: &SpeciesProfile) -> Vec<LearnedMove<'c>> {
        let catalog = self.catalog();
        let fast = profile.fast_moves.iter().map(|id| (ActionKind::Fast, id));
        let charged = profile.charged_moves.iter().map(|id| (ActionKind::Charged, id));
        fast.chain(charged)
            .filter_map(|(class, id)| match catalog.move_spec(id) {
                Some(spec) => Some(LearnedMove { class, spec }),
                None => {
                    debug!("{} learns {id}, which has no move data", profile.id);
                    None
                }
            })
            .collect()
    }

    /// Effectiveness of the opponent's moves against each team member and of
    /// each member's moves against the opponent.
    pub fn matchup(&self, opponent: &str, team: &[String]) -> Result<MatchupReport<'c>, SimError> {
        if team.is_empty() || team.len() > MAX_TEAM_SIZE {
            return Err(SimError::InvalidTeamSize {
                size: team.len(),
                max: MAX_TEAM_SIZE,
            });
        }
        let opponent = self.species(opponent)?;
        let chart = self.chart();

        let members: Vec<Member<'c>> = team
            .iter()
            .map(|query| match self.catalog().species(query) {
                Some(profile) => Member {
                    name: profile.name.clone(),
                    types: &profile.types,
                    profile: Some(profile),
                },
                None => {
                    debug!("matchup: no species named {query}");
                    Member {
                        name: query.clone(),
                        types: &[],
                        profile: None,
                    }
                }
            })
            .collect();

        let opponent_moves_vs_team = self
            .learned_moves(opponent)
            .into_iter()
            .map(|attack| {
                let vs_team = members
                    .iter()
                    .map(|m| MemberEffect {
                        pokemon: m.name.clone(),
                        effectiveness: chart.matchup(attack.spec.move_type, m.types),
                    })
                    .collect();
                OpponentMoveRow { attack, vs_team }
            })
            .collect();

        let team_moves_vs_opponent = members
            .iter()
            .map(|m| {
                let moves = m
                    .profile
                    .map(|p| self.learned_moves(p))
                    .unwrap_or_default()
                    .into_iter()
                    .map(|attack| MoveEffect {
                        effectiveness: chart.matchup(attack.spec.move_type, &opponent.types),
                        attack,
                    })
                    .collect();
                TeamMemberRow {
                    pokemon: m.name.clone(),
                    found: m.profile.is_some(),
                    moves,
                }
            })
            .collect();

        Ok(MatchupReport {
            opponent,
            team: team.to_vec(),
            opponent_weaknesses: chart.weaknesses(&opponent.types),
            opponent_resistances: chart.resistances(&opponent.types),
            opponent_moves_vs_team,
            team_moves_vs_opponent,
        })
    }
}
