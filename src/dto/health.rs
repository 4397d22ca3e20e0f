use serde::Serialize;
use utoipa::ToSchema;

/// Overall service condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Everything the service depends on answers.
    Ok,
    /// Queue operations work but the tournament manager cannot be read.
    Degraded,
}

/// Payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status (`ok` or `degraded`).
    pub status: HealthStatus,
    /// Whether the auto-dequeue engine was started.
    pub auto_dequeue_enabled: bool,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(auto_dequeue_enabled: bool) -> Self {
        Self {
            status: HealthStatus::Ok,
            auto_dequeue_enabled,
        }
    }

    /// Create a health response indicating the tournament manager is unreachable.
    pub fn degraded() -> Self {
        Self {
            status: HealthStatus::Degraded,
            auto_dequeue_enabled: true,
        }
    }
}
