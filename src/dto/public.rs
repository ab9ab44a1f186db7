//! Read models served by the public API.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};

use crate::dao::models::{
    EventEntity, EventId, EventKind, EventStatus, ScoreEntity, TeamColor, TeamEntity, TeamId,
};
use crate::dto::format_system_time;

/// Team as shown to every visitor.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamSummary {
    pub id: TeamId,
    pub name: String,
    pub color: TeamColor,
    pub created_at: String,
}

impl From<TeamEntity> for TeamSummary {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            color: team.color,
            created_at: format_system_time(team.created_at),
        }
    }
}

/// Entry of the festival schedule.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventSummary {
    pub id: EventId,
    pub title: String,
    pub day: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub kind: EventKind,
    pub base_points: i32,
    pub status: EventStatus,
}

impl From<EventEntity> for EventSummary {
    fn from(event: EventEntity) -> Self {
        Self {
            id: event.id,
            title: event.title,
            day: event.day,
            start_time: event.start_time,
            end_time: event.end_time,
            location: event.location,
            kind: event.kind,
            base_points: event.base_points,
            status: event.status,
        }
    }
}

/// Optional filters for `GET /events`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Only list events of this day (`YYYY-MM-DD`).
    pub day: Option<String>,
}

/// Live ticker: the event currently running and the next one scheduled.
#[derive(Debug, Serialize, ToSchema)]
pub struct TickerResponse {
    pub live: Option<EventSummary>,
    pub next: Option<EventSummary>,
}

/// Row of the leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based rank; tied totals share a rank.
    pub rank: u32,
    pub team_id: TeamId,
    pub name: String,
    pub color: TeamColor,
    pub total: i64,
}

/// Points recorded for a team at an event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreSummary {
    pub id: uuid::Uuid,
    pub event_id: EventId,
    pub team_id: TeamId,
    pub points: i32,
    pub created_at: String,
}

impl From<ScoreEntity> for ScoreSummary {
    fn from(score: ScoreEntity) -> Self {
        Self {
            id: score.id,
            event_id: score.event_id,
            team_id: score.team_id,
            points: score.points,
            created_at: format_system_time(score.created_at),
        }
    }
}
