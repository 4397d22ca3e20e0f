use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `degraded` while the enabled auto-dequeue engine cannot read the tournament manager.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let status = state.auto_dequeue().status().await;
    let scrape_failing = status.skills_state.last_fetch_timestamp.is_some()
        && !status.skills_state.last_fetch_success;

    if status.enabled && scrape_failing {
        warn!(
            last_fetch = ?status.skills_state.last_fetch_timestamp,
            "tournament manager unreachable (degraded mode)"
        );
        HealthResponse::degraded()
    } else {
        HealthResponse::ok(status.enabled)
    }
}
