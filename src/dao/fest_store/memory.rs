//! In-process [`FestStore`] backed by concurrent maps. Used by tests and by
//! `STORAGE_BACKEND=memory` deployments where losing data on restart is fine.

use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::SystemTime,
};

use dashmap::DashMap;
use futures::future::{BoxFuture, ready};
use uuid::Uuid;

use crate::dao::{
    fest_store::FestStore,
    models::{
        BracketEntity, EventEntity, EventId, MatchEntity, NewEventEntity, NewTeamEntity,
        ScoreEntity, SeedEntity, TeamEntity, TeamId,
    },
    storage::StorageResult,
};

/// [`FestStore`] that keeps every row in process memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryFestStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    team_seq: AtomicI64,
    event_seq: AtomicI64,
    teams: DashMap<TeamId, TeamEntity>,
    events: DashMap<EventId, EventEntity>,
    scores: DashMap<Uuid, ScoreEntity>,
    brackets: DashMap<Uuid, BracketEntity>,
    seeds: DashMap<Uuid, Vec<SeedEntity>>,
    matches: DashMap<Uuid, MatchEntity>,
}

impl MemoryFestStore {
    /// Empty store with id sequences starting at 1.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resolve immediately; the memory store never waits on I/O.
fn done<T: Send + 'static>(value: T) -> BoxFuture<'static, StorageResult<T>> {
    Box::pin(ready(Ok(value)))
}

impl FestStore for MemoryFestStore {
    fn create_team(&self, team: NewTeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>> {
        let id = self.inner.team_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let entity = TeamEntity {
            id,
            name: team.name,
            color: team.color,
            created_at: SystemTime::now(),
        };
        self.inner.teams.insert(id, entity.clone());
        done(entity)
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let mut teams: Vec<TeamEntity> = self
            .inner
            .teams
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        teams.sort_by_key(|team| team.id);
        done(teams)
    }

    fn find_team(&self, id: TeamId) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        done(self.inner.teams.get(&id).map(|entry| entry.value().clone()))
    }

    fn create_event(
        &self,
        event: NewEventEntity,
    ) -> BoxFuture<'static, StorageResult<EventEntity>> {
        let id = self.inner.event_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let entity = EventEntity {
            id,
            title: event.title,
            day: event.day,
            start_time: event.start_time,
            end_time: event.end_time,
            location: event.location,
            kind: event.kind,
            base_points: event.base_points,
            status: Default::default(),
            created_at: SystemTime::now(),
        };
        self.inner.events.insert(id, entity.clone());
        done(entity)
    }

    fn save_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.events.insert(event.id, event);
        done(())
    }

    fn find_event(&self, id: EventId) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        done(self.inner.events.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_events(&self) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let mut events: Vec<EventEntity> = self
            .inner
            .events
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        events.sort_by_key(|event| event.id);
        done(events)
    }

    fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.scores.insert(score.id, score);
        done(())
    }

    fn list_scores(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let mut scores: Vec<ScoreEntity> = self
            .inner
            .scores
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        scores.sort_by_key(|score| score.created_at);
        done(scores)
    }

    fn save_bracket(&self, bracket: BracketEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.brackets.insert(bracket.id, bracket);
        done(())
    }

    fn find_bracket(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BracketEntity>>> {
        done(self.inner.brackets.get(&id).map(|entry| entry.value().clone()))
    }

    fn find_bracket_for(
        &self,
        event_id: EventId,
        game_kind: String,
    ) -> BoxFuture<'static, StorageResult<Option<BracketEntity>>> {
        let found = self
            .inner
            .brackets
            .iter()
            .find(|entry| entry.event_id == event_id && entry.game_kind == game_kind)
            .map(|entry| entry.value().clone());
        done(found)
    }

    fn list_brackets(
        &self,
        event_id: Option<EventId>,
    ) -> BoxFuture<'static, StorageResult<Vec<BracketEntity>>> {
        let mut brackets: Vec<BracketEntity> = self
            .inner
            .brackets
            .iter()
            .filter(|entry| event_id.is_none_or(|id| entry.event_id == id))
            .map(|entry| entry.value().clone())
            .collect();
        brackets.sort_by_key(|bracket| bracket.created_at);
        done(brackets)
    }

    fn save_seeds(&self, seeds: Vec<SeedEntity>) -> BoxFuture<'static, StorageResult<()>> {
        for seed in seeds {
            self.inner
                .seeds
                .entry(seed.bracket_id)
                .or_default()
                .push(seed);
        }
        done(())
    }

    fn list_seeds(&self, bracket_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SeedEntity>>> {
        let mut seeds = self
            .inner
            .seeds
            .get(&bracket_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        seeds.sort_by_key(|seed| seed.seed);
        done(seeds)
    }

    fn insert_matches(&self, matches: Vec<MatchEntity>) -> BoxFuture<'static, StorageResult<()>> {
        for entity in matches {
            self.inner.matches.insert(entity.id, entity);
        }
        done(())
    }

    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.matches.insert(entity.id, entity);
        done(())
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        done(self.inner.matches.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_matches(
        &self,
        bracket_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let mut matches: Vec<MatchEntity> = self
            .inner
            .matches
            .iter()
            .filter(|entry| entry.bracket_id == bracket_id)
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by_key(|entity| (entity.round_number, entity.match_number));
        done(matches)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        done(())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        done(())
    }
}
