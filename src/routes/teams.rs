use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dao::models::TeamInfo, error::AppError, services::roster_service, state::SharedState,
};

/// Roster endpoint feeding the kiosk team picker.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/teams", get(list_teams))
}

/// Teams registered for the event.
#[utoipa::path(
    get,
    path = "/api/teams",
    tag = "teams",
    responses(
        (status = 200, description = "Roster", body = [TeamInfo]),
        (status = 502, description = "Tournament manager unreachable")
    )
)]
pub async fn list_teams(State(state): State<SharedState>) -> Result<Json<Vec<TeamInfo>>, AppError> {
    Ok(Json(roster_service::list_teams(&state).await?))
}
