use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{EventId, EventStatus, MatchEntity, TeamId};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    pub stream: String,
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a bracket is generated, locked, unlocked or repaired.
pub struct BracketUpdatedEvent {
    pub bracket_id: Uuid,
    pub event_id: EventId,
    pub game_kind: String,
    pub is_locked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast for every persisted change to a match.
pub struct MatchUpdatedEvent {
    pub bracket_id: Uuid,
    pub match_id: Uuid,
    pub round_number: u32,
    pub match_number: u32,
    pub slot_a: Option<TeamId>,
    pub slot_b: Option<TeamId>,
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Option<TeamId>,
}

impl From<&MatchEntity> for MatchUpdatedEvent {
    fn from(entity: &MatchEntity) -> Self {
        Self {
            bracket_id: entity.bracket_id,
            match_id: entity.id,
            round_number: entity.round_number,
            match_number: entity.match_number,
            slot_a: entity.slot_a,
            slot_b: entity.slot_b,
            score_a: entity.score_a,
            score_b: entity.score_b,
            winner: entity.winner,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when an event changes live status.
pub struct EventStatusEvent {
    pub event_id: EventId,
    pub status: EventStatus,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when points are awarded to a team.
pub struct ScoreAwardedEvent {
    pub event_id: EventId,
    pub team_id: TeamId,
    pub points: i32,
}
