use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{
        BRACKET_COLLECTION, COUNTER_COLLECTION, CounterDocument, EVENT_COLLECTION,
        MATCH_COLLECTION, MongoBracketDocument, MongoEventDocument, MongoMatchDocument,
        MongoScoreDocument, MongoSeedDocument, MongoTeamDocument, SCORE_COLLECTION,
        SEED_COLLECTION, TEAM_COLLECTION, doc_id,
    },
};
use crate::dao::{
    fest_store::FestStore,
    models::{
        BracketEntity, EventEntity, EventId, MatchEntity, NewEventEntity, NewTeamEntity,
        ScoreEntity, SeedEntity, TeamEntity, TeamId,
    },
    storage::StorageResult,
};

#[derive(Clone)]
pub struct MongoFestStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoState {
    /// Build a client and check that the database answers a single ping.
    ///
    /// Failures are returned as-is; the storage supervisor owns retries and backoff.
    async fn open(config: &MongoConfig) -> MongoResult<Self> {
        let client = Client::with_options(config.options.clone())
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(&config.database_name);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::InitialPing {
                database: config.database_name.clone(),
                source,
            })?;
        info!(database = %config.database_name, "MongoDB answered");
        Ok(Self { client, database })
    }
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let fresh = MongoState::open(&self.config).await?;
        *self.state.write().await = fresh;
        Ok(())
    }
}

/// Index definitions applied on connect: (collection, index name, keys, unique).
const INDEXES: &[(&str, &str, &str, bool)] = &[
    (BRACKET_COLLECTION, "bracket_event_kind_idx", "event_id,game_kind", true),
    (SEED_COLLECTION, "seed_bracket_idx", "bracket_id,seed", true),
    (MATCH_COLLECTION, "match_position_idx", "bracket_id,round_number,match_number", true),
    (SCORE_COLLECTION, "score_event_idx", "event_id,team_id", false),
];

impl MongoFestStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let state = MongoState::open(&config).await?;
        let inner = Arc::new(MongoInner {
            state: RwLock::new(state),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        for &(collection, name, fields, unique) in INDEXES {
            let mut keys = Document::new();
            for field in fields.split(',') {
                keys.insert(field, 1);
            }
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: fields,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    /// Atomically bump the counter named after `collection` and return the new value.
    async fn next_id(&self, collection: &'static str) -> MongoResult<i64> {
        let counters = self
            .collection::<CounterDocument>(COUNTER_COLLECTION)
            .await;
        let counter = counters
            .find_one_and_update(doc! {"_id": collection}, doc! {"$inc": {"seq": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextId {
                collection,
                source: Some(source),
            })?;

        counter
            .map(|counter| counter.seq)
            .ok_or(MongoDaoError::NextId {
                collection,
                source: None,
            })
    }

    async fn find_all<T>(
        &self,
        collection: &'static str,
        filter: Document,
        sort: Document,
    ) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.collection::<T>(collection)
            .await
            .find(filter)
            .sort(sort)
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })
    }

    async fn replace<T>(
        &self,
        collection: &'static str,
        filter: Document,
        document: T,
    ) -> MongoResult<()>
    where
        T: Serialize + Send + Sync,
    {
        self.collection::<T>(collection)
            .await
            .replace_one(filter, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write { collection, source })?;
        Ok(())
    }

    async fn create_team(&self, team: NewTeamEntity) -> MongoResult<TeamEntity> {
        let entity = TeamEntity {
            id: self.next_id(TEAM_COLLECTION).await?,
            name: team.name,
            color: team.color,
            created_at: SystemTime::now(),
        };
        let document = MongoTeamDocument::from(entity.clone());
        self.replace(TEAM_COLLECTION, doc! {"_id": entity.id}, document)
            .await?;
        Ok(entity)
    }

    async fn list_teams(&self) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<MongoTeamDocument> = self
            .find_all(TEAM_COLLECTION, doc! {}, doc! {"_id": 1})
            .await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_team(&self, id: TeamId) -> MongoResult<Option<TeamEntity>> {
        let document = self
            .collection::<MongoTeamDocument>(TEAM_COLLECTION)
            .await
            .find_one(doc! {"_id": id})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: TEAM_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn create_event(&self, event: NewEventEntity) -> MongoResult<EventEntity> {
        let entity = EventEntity {
            id: self.next_id(EVENT_COLLECTION).await?,
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
        self.save_event(entity.clone()).await?;
        Ok(entity)
    }

    async fn save_event(&self, event: EventEntity) -> MongoResult<()> {
        let filter = doc! {"_id": event.id};
        self.replace(EVENT_COLLECTION, filter, MongoEventDocument::from(event))
            .await
    }

    async fn find_event(&self, id: EventId) -> MongoResult<Option<EventEntity>> {
        let document = self
            .collection::<MongoEventDocument>(EVENT_COLLECTION)
            .await
            .find_one(doc! {"_id": id})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: EVENT_COLLECTION,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_events(&self) -> MongoResult<Vec<EventEntity>> {
        let documents: Vec<MongoEventDocument> = self
            .find_all(EVENT_COLLECTION, doc! {}, doc! {"_id": 1})
            .await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_score(&self, score: ScoreEntity) -> MongoResult<()> {
        let filter = doc_id(score.id);
        self.replace(SCORE_COLLECTION, filter, MongoScoreDocument::from(score))
            .await
    }

    async fn list_scores(&self) -> MongoResult<Vec<ScoreEntity>> {
        let documents: Vec<MongoScoreDocument> = self
            .find_all(SCORE_COLLECTION, doc! {}, doc! {"created_at": 1})
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn save_bracket(&self, bracket: BracketEntity) -> MongoResult<()> {
        let filter = doc_id(bracket.id);
        self.replace(BRACKET_COLLECTION, filter, MongoBracketDocument::from(bracket))
            .await
    }

    async fn find_bracket_by(&self, filter: Document) -> MongoResult<Option<BracketEntity>> {
        self.collection::<MongoBracketDocument>(BRACKET_COLLECTION)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: BRACKET_COLLECTION,
                source,
            })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_brackets(&self, event_id: Option<EventId>) -> MongoResult<Vec<BracketEntity>> {
        let filter = match event_id {
            Some(event_id) => doc! {"event_id": event_id},
            None => doc! {},
        };
        let documents: Vec<MongoBracketDocument> = self
            .find_all(BRACKET_COLLECTION, filter, doc! {"created_at": 1})
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn save_seeds(&self, seeds: Vec<SeedEntity>) -> MongoResult<()> {
        if seeds.is_empty() {
            return Ok(());
        }
        let documents: Vec<MongoSeedDocument> = seeds.into_iter().map(Into::into).collect();
        self.collection::<MongoSeedDocument>(SEED_COLLECTION)
            .await
            .insert_many(documents)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: SEED_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn list_seeds(&self, bracket_id: Uuid) -> MongoResult<Vec<SeedEntity>> {
        let documents: Vec<MongoSeedDocument> = self
            .find_all(
                SEED_COLLECTION,
                doc! {"bracket_id": bracket_id.to_string()},
                doc! {"seed": 1},
            )
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert_matches(&self, matches: Vec<MatchEntity>) -> MongoResult<()> {
        if matches.is_empty() {
            return Ok(());
        }
        let documents: Vec<MongoMatchDocument> = matches.into_iter().map(Into::into).collect();
        self.collection::<MongoMatchDocument>(MATCH_COLLECTION)
            .await
            .insert_many(documents)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: MATCH_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn save_match(&self, entity: MatchEntity) -> MongoResult<()> {
        let filter = doc_id(entity.id);
        self.replace(MATCH_COLLECTION, filter, MongoMatchDocument::from(entity))
            .await
    }

    async fn find_match(&self, id: Uuid) -> MongoResult<Option<MatchEntity>> {
        self.collection::<MongoMatchDocument>(MATCH_COLLECTION)
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: MATCH_COLLECTION,
                source,
            })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_matches(&self, bracket_id: Uuid) -> MongoResult<Vec<MatchEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .find_all(
                MATCH_COLLECTION,
                doc! {"bracket_id": bracket_id.to_string()},
                doc! {"round_number": 1, "match_number": 1},
            )
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }
}

impl FestStore for MongoFestStore {
    fn create_team(&self, team: NewTeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_team(team).await.map_err(Into::into) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams().await.map_err(Into::into) })
    }

    fn find_team(&self, id: TeamId) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(id).await.map_err(Into::into) })
    }

    fn create_event(
        &self,
        event: NewEventEntity,
    ) -> BoxFuture<'static, StorageResult<EventEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_event(event).await.map_err(Into::into) })
    }

    fn save_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_event(event).await.map_err(Into::into) })
    }

    fn find_event(&self, id: EventId) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_event(id).await.map_err(Into::into) })
    }

    fn list_events(&self) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_events().await.map_err(Into::into) })
    }

    fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_score(score).await.map_err(Into::into) })
    }

    fn list_scores(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_scores().await.map_err(Into::into) })
    }

    fn save_bracket(&self, bracket: BracketEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_bracket(bracket).await.map_err(Into::into) })
    }

    fn find_bracket(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BracketEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_bracket_by(doc_id(id)).await.map_err(Into::into) })
    }

    fn find_bracket_for(
        &self,
        event_id: EventId,
        game_kind: String,
    ) -> BoxFuture<'static, StorageResult<Option<BracketEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_bracket_by(doc! {"event_id": event_id, "game_kind": game_kind})
                .await
                .map_err(Into::into)
        })
    }

    fn list_brackets(
        &self,
        event_id: Option<EventId>,
    ) -> BoxFuture<'static, StorageResult<Vec<BracketEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_brackets(event_id).await.map_err(Into::into) })
    }

    fn save_seeds(&self, seeds: Vec<SeedEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_seeds(seeds).await.map_err(Into::into) })
    }

    fn list_seeds(&self, bracket_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SeedEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_seeds(bracket_id).await.map_err(Into::into) })
    }

    fn insert_matches(&self, matches: Vec<MatchEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_matches(matches).await.map_err(Into::into) })
    }

    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_match(entity).await.map_err(Into::into) })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn list_matches(
        &self,
        bracket_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches(bracket_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[tokio::test]
    async fn unreachable_server_fails_after_one_ping() {
        let config = MongoConfig::from_uri(
            "mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=200&connectTimeoutMS=200",
            Some("fest_unreachable"),
        )
        .await
        .unwrap();

        let started = Instant::now();
        let err = MongoFestStore::connect(config).await.err().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(
            err,
            MongoDaoError::InitialPing { ref database, .. } if database == "fest_unreachable"
        ));
    }
}
