//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{EventId, EventKind, EventStatus, Slot, TeamColor, TeamId},
    dto::validation::{validate_clock, validate_day, validate_game_kind, validate_not_blank},
    state::match_machine::ResultOutcome,
};

/// Shared secret exchanged for the admin cookie.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UnlockRequest {
    #[validate(length(min = 1))]
    pub key: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnlockResponse {
    pub unlocked: bool,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub name: String,
    pub color: TeamColor,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 120), custom(function = "validate_not_blank"))]
    pub title: String,
    /// `YYYY-MM-DD`
    #[validate(custom(function = "validate_day"))]
    pub day: String,
    /// `HH:MM`
    #[validate(custom(function = "validate_clock"))]
    pub start_time: Option<String>,
    #[validate(custom(function = "validate_clock"))]
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub kind: EventKind,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000))]
    pub base_points: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EventStatusRequest {
    pub status: EventStatus,
}

/// Award points to a team. Omitting `points` awards the event's base points.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AwardScoreRequest {
    pub event_id: EventId,
    pub team_id: TeamId,
    #[validate(range(min = -1000, max = 1000))]
    pub points: Option<i32>,
}

/// How teams are ranked before seeds are handed out.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StandingsOrderKind {
    /// Registration order.
    #[default]
    Roster,
    Alphabetical,
    /// Total points, highest first.
    Leaderboard,
    Random,
    /// The order given in `team_ids`.
    Explicit,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GenerateBracketRequest {
    pub event_id: EventId,
    #[validate(custom(function = "validate_game_kind"))]
    pub game_kind: String,
    #[serde(default)]
    pub order: StandingsOrderKind,
    /// Required for the `explicit` order, ignored otherwise.
    pub team_ids: Option<Vec<TeamId>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BracketLockRequest {
    pub locked: bool,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MatchScoreRequest {
    #[validate(range(max = 999))]
    pub score_a: u32,
    #[validate(range(max = 999))]
    pub score_b: u32,
}

/// One slot of a first-round match.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct SlotRef {
    pub match_id: Uuid,
    /// 1 or 2
    pub slot: Slot,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapEntrantsRequest {
    pub first: SlotRef,
    pub second: SlotRef,
}

/// Result of a score submission.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreSubmission {
    /// Out-of-range scores were replaced by these values; submit again.
    Corrected { score_a: u32, score_b: u32 },
    /// Scores stored, nobody has won yet.
    Recorded { score_a: u32, score_b: u32 },
    /// The match has a winner and it advanced.
    Resolved {
        score_a: u32,
        score_b: u32,
        winner: TeamId,
    },
}

impl ScoreSubmission {
    pub fn from_outcome(outcome: ResultOutcome, score_a: u32, score_b: u32) -> Self {
        match outcome {
            ResultOutcome::Corrected { score_a, score_b } => Self::Corrected { score_a, score_b },
            ResultOutcome::Recorded => Self::Recorded { score_a, score_b },
            ResultOutcome::Resolved { winner } => Self::Resolved {
                score_a,
                score_b,
                winner,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_request_checks_day_and_times() {
        let request: CreateEventRequest = serde_json::from_value(serde_json::json!({
            "title": "Cornhole finals",
            "day": "2025-10-04",
            "start_time": "14:00",
            "kind": "game",
            "base_points": 10
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let bad: CreateEventRequest = serde_json::from_value(serde_json::json!({
            "title": "Dinner",
            "day": "2025-10-04",
            "start_time": "7pm",
            "kind": "dinner"
        }))
        .unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn slot_numbers_outside_one_and_two_are_rejected() {
        let parsed = serde_json::from_value::<SlotRef>(serde_json::json!({
            "match_id": Uuid::nil(),
            "slot": 3
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn generate_request_defaults_to_roster_order() {
        let request: GenerateBracketRequest = serde_json::from_value(serde_json::json!({
            "event_id": 1,
            "game_kind": "cornhole"
        }))
        .unwrap();
        assert_eq!(request.order, StandingsOrderKind::Roster);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn submission_serialises_with_a_status_tag() {
        let value = serde_json::to_value(ScoreSubmission::Corrected {
            score_a: 11,
            score_b: 10,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "corrected", "score_a": 11, "score_b": 10})
        );
    }
}
