use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::{BracketEntity, EventEntity, MatchEntity, ScoreEntity},
    dto::sse::{
        BracketUpdatedEvent, EventStatusEvent, MatchUpdatedEvent, ScoreAwardedEvent, ServerEvent,
        SystemStatus,
    },
    state::AppState,
};

const EVENT_SYSTEM_STATUS: &str = "system.status";
const EVENT_BRACKET_UPDATED: &str = "bracket.updated";
const EVENT_MATCH_UPDATED: &str = "match.updated";
const EVENT_EVENT_STATUS: &str = "event.status";
const EVENT_SCORE_AWARDED: &str = "score.awarded";

/// Broadcast that the backend entered or left degraded mode.
pub fn broadcast_system_status(state: &AppState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

pub fn broadcast_bracket_updated(state: &AppState, bracket: &BracketEntity) {
    let payload = BracketUpdatedEvent {
        bracket_id: bracket.id,
        event_id: bracket.event_id,
        game_kind: bracket.game_kind.clone(),
        is_locked: bracket.is_locked,
    };
    send_public_event(state, EVENT_BRACKET_UPDATED, &payload);
}

/// Broadcast one `match.updated` event per persisted match.
pub fn broadcast_matches_updated(state: &AppState, matches: &[MatchEntity]) {
    for entity in matches {
        send_public_event(state, EVENT_MATCH_UPDATED, &MatchUpdatedEvent::from(entity));
    }
}

pub fn broadcast_event_status(state: &AppState, event: &EventEntity) {
    let payload = EventStatusEvent {
        event_id: event.id,
        status: event.status,
    };
    send_public_event(state, EVENT_EVENT_STATUS, &payload);
}

pub fn broadcast_score_awarded(state: &AppState, score: &ScoreEntity) {
    let payload = ScoreAwardedEvent {
        event_id: score.event_id,
        team_id: score.team_id,
        points: score.points,
    };
    send_public_event(state, EVENT_SCORE_AWARDED, &payload);
}

fn send_public_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => {
            state.public_sse().broadcast(event);
        }
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
