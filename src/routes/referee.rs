use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::referee::ViolationRequest, error::AppError, services::referee_service,
    state::SharedState,
};

/// Referee violation log endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/violations", get(list_violations))
        .route("/api/add_violation", post(add_violation))
        .route("/api/remove_violation", post(remove_violation))
}

/// Logged violations.
#[utoipa::path(
    get,
    path = "/api/violations",
    tag = "referee",
    responses((status = 200, description = "Violations", body = [ViolationRequest]))
)]
pub async fn list_violations(State(state): State<SharedState>) -> Json<Vec<ViolationRequest>> {
    let violations = referee_service::list_violations(&state).await;
    Json(violations.into_iter().map(Into::into).collect())
}

/// Log a rule violation against a team.
#[utoipa::path(
    post,
    path = "/api/add_violation",
    tag = "referee",
    request_body = ViolationRequest,
    responses((status = 200, description = "Violation logged", body = ViolationRequest))
)]
pub async fn add_violation(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ViolationRequest>>,
) -> Result<Json<ViolationRequest>, AppError> {
    let violation = referee_service::add_violation(&state, payload.into()).await?;
    Ok(Json(violation.into()))
}

/// Remove the first matching violation.
#[utoipa::path(
    post,
    path = "/api/remove_violation",
    tag = "referee",
    request_body = ViolationRequest,
    responses(
        (status = 200, description = "Violation removed", body = ViolationRequest),
        (status = 404, description = "No matching violation")
    )
)]
pub async fn remove_violation(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ViolationRequest>>,
) -> Result<Json<ViolationRequest>, AppError> {
    let violation = referee_service::remove_violation(&state, payload.into()).await?;
    Ok(Json(violation.into()))
}
