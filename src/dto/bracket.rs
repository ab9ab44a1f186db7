use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    dao::models::{
        BracketEntity, EventId, MatchEntity, SeedEntity, Slot, TeamColor, TeamEntity, TeamId,
    },
    dto::format_system_time,
    state::{match_machine::MatchState, tree::round_count},
};

/// Bracket header without its matches.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BracketSummary {
    pub id: Uuid,
    pub event_id: EventId,
    pub game_kind: String,
    pub is_locked: bool,
    pub created_by: String,
    pub created_at: String,
}

impl From<&BracketEntity> for BracketSummary {
    fn from(bracket: &BracketEntity) -> Self {
        Self {
            id: bracket.id,
            event_id: bracket.event_id,
            game_kind: bracket.game_kind.clone(),
            is_locked: bracket.is_locked,
            created_by: bracket.created_by.clone(),
            created_at: format_system_time(bracket.created_at),
        }
    }
}

/// Optional filters for `GET /brackets`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BracketsQuery {
    pub event_id: Option<EventId>,
}

/// Team occupying a slot, with its display name resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EntrantView {
    pub team_id: TeamId,
    pub name: String,
    pub color: Option<TeamColor>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStateView {
    Pending,
    AwaitingResult,
    Resolved,
}

impl From<MatchState> for MatchStateView {
    fn from(state: MatchState) -> Self {
        match state {
            MatchState::Pending => Self::Pending,
            MatchState::AwaitingResult => Self::AwaitingResult,
            MatchState::Resolved => Self::Resolved,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchView {
    pub id: Uuid,
    pub round_number: u32,
    pub match_number: u32,
    pub slot_a: Option<EntrantView>,
    pub slot_b: Option<EntrantView>,
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Option<TeamId>,
    pub state: MatchStateView,
    /// First-round match whose lone entrant advanced without playing.
    pub is_bye: bool,
    pub next_match_id: Option<Uuid>,
    pub slot_in_next: Option<Slot>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundView {
    pub round_number: u32,
    /// `Round N`, `Semifinal` or `Final`.
    pub label: String,
    pub matches: Vec<MatchView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeedView {
    pub seed: u32,
    pub team_id: TeamId,
    pub name: String,
}

/// Whole bracket grouped by round, matches ordered by position within their round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BracketView {
    pub bracket: BracketSummary,
    pub seeds: Vec<SeedView>,
    pub rounds: Vec<RoundView>,
    /// Winner of the final once it is played.
    pub champion: Option<EntrantView>,
}

/// Display label for `round` in a bracket of `total` rounds.
pub fn round_label(round: u32, total: u32) -> String {
    match total.saturating_sub(round) {
        0 => "Final".to_owned(),
        1 => "Semifinal".to_owned(),
        _ => format!("Round {round}"),
    }
}

fn entrant(teams: &HashMap<TeamId, TeamEntity>, team_id: TeamId) -> EntrantView {
    match teams.get(&team_id) {
        Some(team) => EntrantView {
            team_id,
            name: team.name.clone(),
            color: Some(team.color),
        },
        None => EntrantView {
            team_id,
            name: format!("Team #{team_id}"),
            color: None,
        },
    }
}

impl MatchView {
    pub fn build(entity: &MatchEntity, teams: &HashMap<TeamId, TeamEntity>) -> Self {
        Self {
            id: entity.id,
            round_number: entity.round_number,
            match_number: entity.match_number,
            slot_a: entity.slot_a.map(|team| entrant(teams, team)),
            slot_b: entity.slot_b.map(|team| entrant(teams, team)),
            score_a: entity.score_a,
            score_b: entity.score_b,
            winner: entity.winner,
            state: entity.state().into(),
            is_bye: entity.bye_winner().is_some(),
            next_match_id: entity.next_match_id,
            slot_in_next: entity.slot_in_next,
        }
    }
}

impl BracketView {
    pub fn build(
        bracket: &BracketEntity,
        seeds: &[SeedEntity],
        matches: &[MatchEntity],
        teams: &HashMap<TeamId, TeamEntity>,
    ) -> Self {
        let mut by_round: IndexMap<u32, Vec<&MatchEntity>> = IndexMap::new();
        for entity in matches {
            by_round.entry(entity.round_number).or_default().push(entity);
        }
        by_round.sort_keys();

        let first_round = by_round.get(&1).map_or(0, Vec::len);
        let total = round_count(first_round).max(by_round.len() as u32);

        let rounds: Vec<RoundView> = by_round
            .into_iter()
            .map(|(round_number, mut entities)| {
                entities.sort_by_key(|entity| entity.match_number);
                RoundView {
                    round_number,
                    label: round_label(round_number, total),
                    matches: entities
                        .into_iter()
                        .map(|entity| MatchView::build(entity, teams))
                        .collect(),
                }
            })
            .collect();

        let champion = matches
            .iter()
            .find(|entity| entity.round_number == total && entity.next_match_id.is_none())
            .and_then(|final_match| final_match.winner)
            .map(|team| entrant(teams, team));

        let mut seeds: Vec<SeedView> = seeds
            .iter()
            .map(|seed| SeedView {
                seed: seed.seed,
                team_id: seed.team_id,
                name: entrant(teams, seed.team_id).name,
            })
            .collect();
        seeds.sort_by_key(|seed| seed.seed);

        Self {
            bracket: bracket.into(),
            seeds,
            rounds,
            champion,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::state::{
        match_machine::auto_advance_byes, seeding::seeds_from_standings, tree::generate_bracket,
    };

    #[test]
    fn labels_count_back_from_the_final() {
        assert_eq!(round_label(3, 3), "Final");
        assert_eq!(round_label(2, 3), "Semifinal");
        assert_eq!(round_label(1, 3), "Round 1");
        assert_eq!(round_label(1, 1), "Final");
    }

    #[test]
    fn view_groups_rounds_and_resolves_names() {
        let bracket = BracketEntity {
            id: Uuid::new_v4(),
            event_id: 7,
            game_kind: "cornhole".into(),
            is_locked: false,
            created_by: "admin".into(),
            created_at: SystemTime::now(),
        };
        let mut matches = generate_bracket(bracket.id, &seeds_from_standings(&[1, 2, 3]));
        auto_advance_byes(&mut matches);
        matches.reverse();

        let teams = HashMap::from([(
            1,
            TeamEntity {
                id: 1,
                name: "Red Rockets".into(),
                color: TeamColor::Red,
                created_at: SystemTime::now(),
            },
        )]);
        let view = BracketView::build(&bracket, &[], &matches, &teams);

        let labels: Vec<_> = view.rounds.iter().map(|round| round.label.as_str()).collect();
        assert_eq!(labels, vec!["Semifinal", "Final"]);
        let numbers: Vec<_> = view.rounds[0]
            .matches
            .iter()
            .map(|m| m.match_number)
            .collect();
        assert_eq!(numbers, vec![1, 2]);

        let bye = &view.rounds[0].matches[0];
        assert!(bye.is_bye);
        assert_eq!(bye.slot_a.as_ref().unwrap().name, "Red Rockets");
        assert_eq!(view.rounds[1].matches[0].slot_a.as_ref().unwrap().team_id, 1);
        assert_eq!(
            view.rounds[0].matches[1].slot_b.as_ref().unwrap().name,
            "Team #3"
        );
        assert!(view.champion.is_none());
    }
}
