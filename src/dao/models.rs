use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Integer identifier of a team (the entrant of a bracket).
pub type TeamId = i64;
/// Integer identifier of a scheduled event (the subject of a bracket).
pub type EventId = i64;

/// Fixed set of team colors used across the festival.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

/// Representation of a team stored in persistence and shared across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team, assigned by the store.
    pub id: TeamId,
    /// Display name chosen for the team.
    pub name: String,
    /// Color the team plays under.
    pub color: TeamColor,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
}

/// Team fields supplied by callers before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewTeamEntity {
    /// Trimmed display name.
    pub name: String,
    /// Color the team plays under.
    pub color: TeamColor,
}

/// Kind of scheduled event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Competitive game, possibly with a bracket.
    Game,
    /// Shared meal.
    Dinner,
    /// Anything else on the schedule.
    Social,
}

/// Live status of a scheduled event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Not started yet.
    #[default]
    Scheduled,
    /// Happening now. At most one event is live.
    Live,
    /// Started, then interrupted.
    Paused,
    /// Over.
    Finished,
}

/// A slot in the festival schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEntity {
    /// Identifier assigned by the store.
    pub id: EventId,
    /// Name shown on the schedule.
    pub title: String,
    /// Calendar day formatted as `YYYY-MM-DD`.
    pub day: String,
    /// Start time formatted as `HH:MM`.
    pub start_time: Option<String>,
    /// End time formatted as `HH:MM`.
    pub end_time: Option<String>,
    /// Free-form place, e.g. `Backyard`.
    pub location: Option<String>,
    /// What kind of activity this is.
    pub kind: EventKind,
    /// Points awarded by default when an admin records a result for this event.
    pub base_points: i32,
    /// Current live status.
    pub status: EventStatus,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Event fields supplied by callers before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewEventEntity {
    /// See [`EventEntity::title`].
    pub title: String,
    /// See [`EventEntity::day`].
    pub day: String,
    /// See [`EventEntity::start_time`].
    pub start_time: Option<String>,
    /// See [`EventEntity::end_time`].
    pub end_time: Option<String>,
    /// See [`EventEntity::location`].
    pub location: Option<String>,
    /// See [`EventEntity::kind`].
    pub kind: EventKind,
    /// See [`EventEntity::base_points`].
    pub base_points: i32,
}

/// Points awarded to a team for an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Identifier of this award.
    pub id: Uuid,
    /// Event the points were earned at.
    pub event_id: EventId,
    /// Team receiving the points.
    pub team_id: TeamId,
    /// Awarded points; negative values are penalties.
    pub points: i32,
    /// When the points were recorded.
    pub created_at: SystemTime,
}

/// Single-elimination bracket attached to an event and a game kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BracketEntity {
    /// Identifier generated with the bracket.
    pub id: Uuid,
    /// Event the bracket belongs to.
    pub event_id: EventId,
    /// Game tag (e.g. `cornhole`) selecting the score rule.
    pub game_kind: String,
    /// When set, first-round seeding can no longer be rearranged.
    pub is_locked: bool,
    /// Who generated the bracket.
    pub created_by: String,
    /// Generation timestamp.
    pub created_at: SystemTime,
}

/// Seed assigned to a team when its bracket was generated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedEntity {
    /// Bracket the seed belongs to.
    pub bracket_id: Uuid,
    /// Seeded team.
    pub team_id: TeamId,
    /// 1 is the strongest seed.
    pub seed: u32,
}

/// Error raised when a slot number is neither 1 nor 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid slot `{0}`: expected 1 or 2")]
pub struct InvalidSlot(pub u8);

/// One of the two competitor positions of a match. Serialised as `1` / `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Slot {
    /// First slot, serialised as `1`.
    A,
    /// Second slot, serialised as `2`.
    B,
}

// `ToSchema` derive does not accept `value_type`/`minimum`/`maximum` on enums,
// so the schema (`u8`, 1..=2) is spelled out by hand.
impl utoipa::PartialSchema for Slot {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        use utoipa::openapi::schema::{KnownFormat, ObjectBuilder, SchemaFormat, Type};
        ObjectBuilder::new()
            .schema_type(Type::Integer)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int32)))
            .minimum(Some(1))
            .maximum(Some(2))
            .description(Some(
                "One of the two competitor positions of a match. Serialised as `1` / `2`.",
            ))
            .into()
    }
}

impl ToSchema for Slot {}

impl Slot {
    /// The opposite slot of the same match.
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::A => 1,
            Slot::B => 2,
        }
    }
}

impl TryFrom<u8> for Slot {
    type Error = InvalidSlot;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Slot::A),
            2 => Ok(Slot::B),
            other => Err(InvalidSlot(other)),
        }
    }
}

/// A match of a bracket. The only entity mutated after a bracket is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Identifier generated with the bracket.
    pub id: Uuid,
    /// Bracket this match is part of.
    pub bracket_id: Uuid,
    /// 1 for the first round, increasing toward the final.
    pub round_number: u32,
    /// 1-indexed position within the round.
    pub match_number: u32,
    /// Entrant in slot A, if known.
    pub slot_a: Option<TeamId>,
    /// Entrant in slot B, if known.
    pub slot_b: Option<TeamId>,
    /// Last stored score of slot A.
    pub score_a: u32,
    /// Last stored score of slot B.
    pub score_b: u32,
    /// Team that advanced out of this match.
    pub winner: Option<TeamId>,
    /// Match the winner advances to; `None` only for the final.
    pub next_match_id: Option<Uuid>,
    /// Slot of [`MatchEntity::next_match_id`] the winner occupies.
    pub slot_in_next: Option<Slot>,
}

impl MatchEntity {
    /// Build an empty match with no entrants, scores or links.
    pub fn empty(bracket_id: Uuid, round_number: u32, match_number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            bracket_id,
            round_number,
            match_number,
            slot_a: None,
            slot_b: None,
            score_a: 0,
            score_b: 0,
            winner: None,
            next_match_id: None,
            slot_in_next: None,
        }
    }

    /// Entrant currently occupying `slot`.
    pub fn entrant(&self, slot: Slot) -> Option<TeamId> {
        match slot {
            Slot::A => self.slot_a,
            Slot::B => self.slot_b,
        }
    }

    /// Replace the entrant occupying `slot`.
    pub fn set_entrant(&mut self, slot: Slot, team: Option<TeamId>) {
        match slot {
            Slot::A => self.slot_a = team,
            Slot::B => self.slot_b = team,
        }
    }
}
