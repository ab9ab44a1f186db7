use tracing::warn;

use crate::{dto::health::HealthResponse, state::AppState};

/// Probe the storage backend and report the degraded flag.
pub async fn health_status(state: &AppState) -> HealthResponse {
    let reachable = match state.store().await {
        Some(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                false
            }
        },
        None => {
            warn!("storage unavailable (degraded mode)");
            false
        }
    };

    HealthResponse::new(state.is_degraded(), reachable)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::fest_store::memory::MemoryFestStore};

    #[tokio::test]
    async fn reports_degraded_without_store() {
        let state = AppState::new(AppConfig::default(), None);
        let health = health_status(&state).await;
        assert_eq!(health.status, "degraded");
        assert!(!health.storage_reachable);

        state.set_store(Arc::new(MemoryFestStore::new())).await;
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert!(health.storage_reachable);
    }
}
