use axum::{Json, Router, extract::State, routing::get};

use crate::{services::auto_dequeue::AutoDequeueStatus, state::SharedState};

/// Operational view of the auto-dequeue engine.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/auto-dequeue/status", get(status))
}

#[utoipa::path(
    get,
    path = "/api/auto-dequeue/status",
    tag = "auto-dequeue",
    responses((status = 200, description = "Engine status", body = AutoDequeueStatus))
)]
/// Whether polling runs, how often it ran, and what the tracker knows.
pub async fn status(State(state): State<SharedState>) -> Json<AutoDequeueStatus> {
    Json(state.auto_dequeue().status().await)
}
