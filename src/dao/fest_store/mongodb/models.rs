use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{
    BracketEntity, EventEntity, EventKind, EventStatus, MatchEntity, ScoreEntity, SeedEntity,
    Slot, TeamColor, TeamEntity,
};

pub const TEAM_COLLECTION: &str = "teams";
pub const EVENT_COLLECTION: &str = "events";
pub const SCORE_COLLECTION: &str = "scores";
pub const BRACKET_COLLECTION: &str = "brackets";
pub const SEED_COLLECTION: &str = "bracket_seeds";
pub const MATCH_COLLECTION: &str = "bracket_matches";
pub const COUNTER_COLLECTION: &str = "counters";

/// Filter selecting a document by its `_id`. Uuid keys are stored in their hyphenated form.
pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

fn parse_uuid(collection: &'static str, raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::Decode {
        collection,
        message: format!("invalid uuid `{raw}`: {err}"),
    })
}

fn narrow(collection: &'static str, field: &str, raw: i64) -> Result<u32, MongoDaoError> {
    u32::try_from(raw).map_err(|_| MongoDaoError::Decode {
        collection,
        message: format!("`{field}` out of range: {raw}"),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub seq: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: i64,
    name: String,
    color: TeamColor,
    created_at: DateTime,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            color: value.color,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoTeamDocument> for TeamEntity {
    fn from(value: MongoTeamDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            color: value.color,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDocument {
    #[serde(rename = "_id")]
    id: i64,
    title: String,
    day: String,
    start_time: Option<String>,
    end_time: Option<String>,
    location: Option<String>,
    kind: EventKind,
    base_points: i32,
    #[serde(default)]
    status: EventStatus,
    created_at: DateTime,
}

impl From<EventEntity> for MongoEventDocument {
    fn from(value: EventEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            day: value.day,
            start_time: value.start_time,
            end_time: value.end_time,
            location: value.location,
            kind: value.kind,
            base_points: value.base_points,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoEventDocument> for EventEntity {
    fn from(value: MongoEventDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            day: value.day,
            start_time: value.start_time,
            end_time: value.end_time,
            location: value.location,
            kind: value.kind,
            base_points: value.base_points,
            status: value.status,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    id: String,
    event_id: i64,
    team_id: i64,
    points: i32,
    created_at: DateTime,
}

impl From<ScoreEntity> for MongoScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            id: value.id.to_string(),
            event_id: value.event_id,
            team_id: value.team_id,
            points: value.points,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoScoreDocument> for ScoreEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoScoreDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(SCORE_COLLECTION, &value.id)?,
            event_id: value.event_id,
            team_id: value.team_id,
            points: value.points,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBracketDocument {
    #[serde(rename = "_id")]
    id: String,
    event_id: i64,
    game_kind: String,
    #[serde(default)]
    is_locked: bool,
    created_by: String,
    created_at: DateTime,
}

impl From<BracketEntity> for MongoBracketDocument {
    fn from(value: BracketEntity) -> Self {
        Self {
            id: value.id.to_string(),
            event_id: value.event_id,
            game_kind: value.game_kind,
            is_locked: value.is_locked,
            created_by: value.created_by,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoBracketDocument> for BracketEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoBracketDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(BRACKET_COLLECTION, &value.id)?,
            event_id: value.event_id,
            game_kind: value.game_kind,
            is_locked: value.is_locked,
            created_by: value.created_by,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSeedDocument {
    bracket_id: String,
    team_id: i64,
    seed: i64,
}

impl From<SeedEntity> for MongoSeedDocument {
    fn from(value: SeedEntity) -> Self {
        Self {
            bracket_id: value.bracket_id.to_string(),
            team_id: value.team_id,
            seed: i64::from(value.seed),
        }
    }
}

impl TryFrom<MongoSeedDocument> for SeedEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSeedDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            bracket_id: parse_uuid(SEED_COLLECTION, &value.bracket_id)?,
            team_id: value.team_id,
            seed: narrow(SEED_COLLECTION, "seed", value.seed)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: String,
    bracket_id: String,
    round_number: i64,
    match_number: i64,
    slot_a: Option<i64>,
    slot_b: Option<i64>,
    #[serde(default)]
    score_a: i64,
    #[serde(default)]
    score_b: i64,
    winner: Option<i64>,
    next_match_id: Option<String>,
    slot_in_next: Option<i32>,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            bracket_id: value.bracket_id.to_string(),
            round_number: i64::from(value.round_number),
            match_number: i64::from(value.match_number),
            slot_a: value.slot_a,
            slot_b: value.slot_b,
            score_a: i64::from(value.score_a),
            score_b: i64::from(value.score_b),
            winner: value.winner,
            next_match_id: value.next_match_id.map(|id| id.to_string()),
            slot_in_next: value.slot_in_next.map(|slot| i32::from(u8::from(slot))),
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchDocument) -> Result<Self, Self::Error> {
        let slot_in_next = value
            .slot_in_next
            .map(|raw| {
                u8::try_from(raw)
                    .ok()
                    .and_then(|raw| Slot::try_from(raw).ok())
                    .ok_or_else(|| MongoDaoError::Decode {
                        collection: MATCH_COLLECTION,
                        message: format!("invalid slot_in_next `{raw}`"),
                    })
            })
            .transpose()?;

        Ok(Self {
            id: parse_uuid(MATCH_COLLECTION, &value.id)?,
            bracket_id: parse_uuid(MATCH_COLLECTION, &value.bracket_id)?,
            round_number: narrow(MATCH_COLLECTION, "round_number", value.round_number)?,
            match_number: narrow(MATCH_COLLECTION, "match_number", value.match_number)?,
            slot_a: value.slot_a,
            slot_b: value.slot_b,
            score_a: narrow(MATCH_COLLECTION, "score_a", value.score_a)?,
            score_b: narrow(MATCH_COLLECTION, "score_b", value.score_b)?,
            winner: value.winner,
            next_match_id: value
                .next_match_id
                .as_deref()
                .map(|raw| parse_uuid(MATCH_COLLECTION, raw))
                .transpose()?,
            slot_in_next,
        })
    }
}
