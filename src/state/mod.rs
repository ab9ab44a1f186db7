/// Match results, bye advancement and first-round swaps.
pub mod match_machine;
/// Score rules per game kind.
pub mod scoring;
/// Seed placement and first-round pairing.
pub mod seeding;
mod sse;
/// Construction of the full bracket tree.
pub mod tree;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard, RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig, dao::fest_store::FestStore, error::ServiceError,
    services::sse_events,
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, configuration and broadcast hub.
pub struct AppState {
    store: RwLock<Option<Arc<dyn FestStore>>>,
    config: AppConfig,
    admin_key: Option<String>,
    sse: SseHub,
    bracket_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    generation_gate: Mutex<()>,
    event_status_gate: Mutex<()>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, admin_key: Option<String>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            sse: SseHub::new(config.sse_capacity()),
            config,
            admin_key: admin_key.filter(|key| !key.is_empty()),
            bracket_gates: DashMap::new(),
            generation_gate: Mutex::new(()),
            event_status_gate: Mutex::new(()),
            degraded: degraded_tx,
        })
    }

    /// Build a ready-to-use state around an already connected store.
    pub async fn with_store(
        config: AppConfig,
        admin_key: Option<String>,
        store: Arc<dyn FestStore>,
    ) -> SharedState {
        let state = Self::new(config, admin_key);
        state.set_store(store).await;
        state
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn FestStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Obtain the current store, or [`ServiceError::Degraded`] while none is usable.
    pub async fn require_store(&self) -> Result<Arc<dyn FestStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        let guard = self.store.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Store handle regardless of the degraded flag, used by health probes.
    pub async fn store(&self) -> Option<Arc<dyn FestStore>> {
        self.store.read().await.as_ref().cloned()
    }

    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag, broadcasting the new value when it changes.
    pub fn update_degraded(&self, value: bool) {
        if self.degraded.send_replace(value) != value {
            sse_events::broadcast_system_status(self, value);
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared secret guarding admin routes. `None` disables every admin route.
    pub fn admin_key(&self) -> Option<&str> {
        self.admin_key.as_deref()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Serialise work on one bracket. Hold the guard for the whole read-modify-write.
    pub async fn lock_bracket(&self, bracket_id: Uuid) -> OwnedMutexGuard<()> {
        let gate = self
            .bracket_gates
            .entry(bracket_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        gate.lock_owned().await
    }

    /// Serialise bracket generation so two requests cannot both pass the duplicate check.
    pub async fn lock_generation(&self) -> MutexGuard<'_, ()> {
        self.generation_gate.lock().await
    }

    /// Serialise event status changes so at most one event ends up live.
    pub async fn lock_event_status(&self) -> MutexGuard<'_, ()> {
        self.event_status_gate.lock().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dao::fest_store::memory::MemoryFestStore;

    #[tokio::test]
    async fn degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default(), None);
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        state.set_store(Arc::new(MemoryFestStore::new())).await;
        assert!(!state.is_degraded());
        assert!(state.require_store().await.is_ok());
    }

    #[tokio::test]
    async fn empty_admin_key_counts_as_unset() {
        let state = AppState::new(AppConfig::default(), Some(String::new()));
        assert!(state.admin_key().is_none());
    }

    #[tokio::test]
    async fn bracket_lock_is_exclusive_per_bracket() {
        let state = AppState::new(AppConfig::default(), None);
        let bracket = Uuid::new_v4();

        let guard = state.lock_bracket(bracket).await;
        let other = tokio::time::timeout(
            Duration::from_millis(50),
            state.lock_bracket(Uuid::new_v4()),
        )
        .await;
        assert!(other.is_ok());

        let same =
            tokio::time::timeout(Duration::from_millis(50), state.lock_bracket(bracket)).await;
        assert!(same.is_err());

        drop(guard);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), state.lock_bracket(bracket))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn event_status_gate_is_exclusive() {
        let state = AppState::new(AppConfig::default(), None);

        let guard = state.lock_event_status().await;
        let waiting =
            tokio::time::timeout(Duration::from_millis(50), state.lock_event_status()).await;
        assert!(waiting.is_err());

        drop(guard);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), state.lock_event_status())
                .await
                .is_ok()
        );
    }
}
