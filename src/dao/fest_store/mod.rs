pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    BracketEntity, EventEntity, EventId, MatchEntity, NewEventEntity, NewTeamEntity, ScoreEntity,
    SeedEntity, TeamEntity, TeamId,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for teams, schedule, scores and brackets.
///
/// Backends only offer keyed reads and writes; every bracket rule lives above this trait.
pub trait FestStore: Send + Sync {
    fn create_team(&self, team: NewTeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>>;
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    fn find_team(&self, id: TeamId) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;

    fn create_event(&self, event: NewEventEntity)
    -> BoxFuture<'static, StorageResult<EventEntity>>;
    fn save_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_event(&self, id: EventId) -> BoxFuture<'static, StorageResult<Option<EventEntity>>>;
    fn list_events(&self) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>>;

    fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn list_scores(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;

    /// Insert or replace a bracket row.
    fn save_bracket(&self, bracket: BracketEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_bracket(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BracketEntity>>>;
    /// Fetch the bracket of a given event and game kind.
    fn find_bracket_for(
        &self,
        event_id: EventId,
        game_kind: String,
    ) -> BoxFuture<'static, StorageResult<Option<BracketEntity>>>;
    fn list_brackets(
        &self,
        event_id: Option<EventId>,
    ) -> BoxFuture<'static, StorageResult<Vec<BracketEntity>>>;

    fn save_seeds(&self, seeds: Vec<SeedEntity>) -> BoxFuture<'static, StorageResult<()>>;
    fn list_seeds(&self, bracket_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SeedEntity>>>;

    /// Batch insert the matches of a freshly generated bracket.
    fn insert_matches(&self, matches: Vec<MatchEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a single match row.
    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    fn list_matches(&self, bracket_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
