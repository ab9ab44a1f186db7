use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: &'static str,
    /// Whether the storage backend answered its last probe.
    pub storage_reachable: bool,
}

impl HealthResponse {
    pub fn new(degraded: bool, storage_reachable: bool) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" },
            storage_reachable,
        }
    }
}
