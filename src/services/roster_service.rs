//! Teams, awarded points and the standings used to seed brackets.

use std::{collections::HashMap, time::SystemTime};

use rand::{rng, seq::SliceRandom};
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{NewTeamEntity, ScoreEntity, TeamEntity, TeamId},
    dto::{
        admin::{AwardScoreRequest, CreateTeamRequest, StandingsOrderKind},
        public::{LeaderboardEntry, ScoreSummary, TeamSummary},
    },
    error::ServiceError,
    services::sse_events,
    state::AppState,
};

pub async fn create_team(
    state: &AppState,
    request: CreateTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let name = request.name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("team name is blank".into()));
    }

    let store = state.require_store().await?;
    let team = store
        .create_team(NewTeamEntity {
            name,
            color: request.color,
        })
        .await?;
    info!(team_id = team.id, name = %team.name, "team created");
    Ok(team.into())
}

pub async fn list_teams(state: &AppState) -> Result<Vec<TeamSummary>, ServiceError> {
    let store = state.require_store().await?;
    let teams = store.list_teams().await?;
    Ok(teams.into_iter().map(Into::into).collect())
}

pub async fn get_team(state: &AppState, team_id: TeamId) -> Result<TeamSummary, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_team(team_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}`")))
}

/// Teams keyed by id, used to resolve names in bracket views.
pub async fn team_directory(
    state: &AppState,
) -> Result<HashMap<TeamId, TeamEntity>, ServiceError> {
    let store = state.require_store().await?;
    let teams = store.list_teams().await?;
    Ok(teams.into_iter().map(|team| (team.id, team)).collect())
}

/// Record points for a team at an event, defaulting to the event's base points.
pub async fn award_score(
    state: &AppState,
    request: AwardScoreRequest,
) -> Result<ScoreSummary, ServiceError> {
    let store = state.require_store().await?;
    let event = store
        .find_event(request.event_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("event `{}`", request.event_id)))?;
    let team = store
        .find_team(request.team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{}`", request.team_id)))?;

    let score = ScoreEntity {
        id: Uuid::new_v4(),
        event_id: event.id,
        team_id: team.id,
        points: request.points.unwrap_or(event.base_points),
        created_at: SystemTime::now(),
    };
    store.save_score(score.clone()).await?;

    info!(
        event_id = score.event_id,
        team_id = score.team_id,
        points = score.points,
        "points awarded"
    );
    sse_events::broadcast_score_awarded(state, &score);
    Ok(score.into())
}

/// Rank teams by total points, highest first, ties broken by name.
pub fn rank_teams(teams: &[TeamEntity], scores: &[ScoreEntity]) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<TeamId, i64> = HashMap::new();
    for score in scores {
        *totals.entry(score.team_id).or_default() += i64::from(score.points);
    }

    let mut rows: Vec<(&TeamEntity, i64)> = teams
        .iter()
        .map(|team| (team, totals.get(&team.id).copied().unwrap_or(0)))
        .collect();
    rows.sort_by(|(a, a_total), (b, b_total)| {
        b_total
            .cmp(a_total)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(rows.len());
    for (position, (team, total)) in rows.into_iter().enumerate() {
        let rank = match entries.last() {
            Some(previous) if previous.total == total => previous.rank,
            _ => position as u32 + 1,
        };
        entries.push(LeaderboardEntry {
            rank,
            team_id: team.id,
            name: team.name.clone(),
            color: team.color,
            total,
        });
    }
    entries
}

pub async fn leaderboard(state: &AppState) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let store = state.require_store().await?;
    let teams = store.list_teams().await?;
    let scores = store.list_scores().await?;
    Ok(rank_teams(&teams, &scores))
}

/// Team ids ordered strongest first according to `order`.
///
/// `explicit` must name known teams, each once.
pub async fn standings(
    state: &AppState,
    order: StandingsOrderKind,
    explicit: Option<Vec<TeamId>>,
) -> Result<Vec<TeamId>, ServiceError> {
    let store = state.require_store().await?;
    let mut teams = store.list_teams().await?;

    let ids = match order {
        StandingsOrderKind::Roster => {
            teams.sort_by_key(|team| team.id);
            teams.iter().map(|team| team.id).collect()
        }
        StandingsOrderKind::Alphabetical => {
            teams.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.id.cmp(&b.id))
            });
            teams.iter().map(|team| team.id).collect()
        }
        StandingsOrderKind::Leaderboard => {
            let scores = store.list_scores().await?;
            rank_teams(&teams, &scores)
                .into_iter()
                .map(|entry| entry.team_id)
                .collect()
        }
        StandingsOrderKind::Random => {
            let mut ids: Vec<TeamId> = teams.iter().map(|team| team.id).collect();
            ids.shuffle(&mut rng());
            ids
        }
        StandingsOrderKind::Explicit => {
            let ids = explicit.ok_or_else(|| {
                ServiceError::InvalidInput("`team_ids` is required for the explicit order".into())
            })?;
            check_explicit(&teams, &ids)?;
            ids
        }
    };
    Ok(ids)
}

fn check_explicit(teams: &[TeamEntity], ids: &[TeamId]) -> Result<(), ServiceError> {
    let mut seen = Vec::with_capacity(ids.len());
    for &id in ids {
        if !teams.iter().any(|team| team.id == id) {
            return Err(ServiceError::InvalidInput(format!("unknown team `{id}`")));
        }
        if seen.contains(&id) {
            return Err(ServiceError::InvalidInput(format!("team `{id}` listed twice")));
        }
        seen.push(id);
    }
    Ok(())
}
