use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dao::models::{QueueLists, QueueSettings},
    dto::queue::{
        ServeRequest, ServedResponse, TeamRequest, TeamResponse, UnserveRequest,
        UpdateSettingsRequest,
    },
    error::AppError,
    services::{capacity::CapacityDecision, queue_service},
    state::SharedState,
};

/// Kiosk and operator endpoints mutating or reading the skills queue.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/add", post(add_team))
        .route("/api/serve", post(serve_next))
        .route("/api/unserve", post(unserve))
        .route("/api/remove", post(remove_team))
        .route("/api/queue", get(get_queue))
        .route("/api/queue/status", get(queue_status))
        .route(
            "/api/queue/settings",
            get(get_settings).post(update_settings),
        )
}

/// Register a team at the back of the queue.
#[utoipa::path(
    post,
    path = "/api/add",
    tag = "queue",
    request_body = TeamRequest,
    responses(
        (status = 200, description = "Team queued", body = TeamResponse),
        (status = 400, description = "Invalid team or already queued"),
        (status = 403, description = "Registration is closed")
    )
)]
pub async fn add_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<TeamRequest>>,
) -> Result<Json<TeamResponse>, AppError> {
    let entry = queue_service::add_team(&state, &payload.team).await?;
    Ok(Json(TeamResponse { team: entry.number }))
}

/// Call the next waiting team onto a field.
#[utoipa::path(
    post,
    path = "/api/serve",
    tag = "queue",
    request_body = ServeRequest,
    responses(
        (status = 200, description = "Team called", body = ServedResponse),
        (status = 409, description = "Queue is empty")
    )
)]
pub async fn serve_next(
    State(state): State<SharedState>,
    payload: Option<Json<ServeRequest>>,
) -> Result<Json<ServedResponse>, AppError> {
    let Json(request) = payload.unwrap_or_default();
    let entry = queue_service::serve_next(&state, request.field).await?;
    Ok(Json(ServedResponse { team: entry }))
}

/// Send a served team back into the queue.
#[utoipa::path(
    post,
    path = "/api/unserve",
    tag = "queue",
    request_body = UnserveRequest,
    responses(
        (status = 200, description = "Team sent back", body = TeamResponse),
        (status = 404, description = "Team is not being served"),
        (status = 409, description = "Nobody is being served")
    )
)]
pub async fn unserve(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UnserveRequest>>,
) -> Result<Json<TeamResponse>, AppError> {
    let entry = queue_service::unserve(&state, &payload.team, payload.amount).await?;
    Ok(Json(TeamResponse { team: entry.number }))
}

/// Remove a team from both lists.
#[utoipa::path(
    post,
    path = "/api/remove",
    tag = "queue",
    request_body = TeamRequest,
    responses((status = 200, description = "Team removed (or was absent)", body = TeamResponse))
)]
pub async fn remove_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<TeamRequest>>,
) -> Result<Json<TeamResponse>, AppError> {
    queue_service::remove_team(&state, &payload.team).await?;
    Ok(Json(TeamResponse { team: payload.team }))
}

/// Current `nowServing` and `queue` lists.
#[utoipa::path(
    get,
    path = "/api/queue",
    tag = "queue",
    responses((status = 200, description = "Queue lists", body = QueueLists))
)]
pub async fn get_queue(State(state): State<SharedState>) -> Json<QueueLists> {
    Json(queue_service::snapshot(&state).await)
}

/// Whether registration is open and how many slots remain.
#[utoipa::path(
    get,
    path = "/api/queue/status",
    tag = "queue",
    responses((status = 200, description = "Capacity decision", body = CapacityDecision))
)]
pub async fn queue_status(State(state): State<SharedState>) -> Json<CapacityDecision> {
    Json(queue_service::queue_status(&state).await)
}

/// Registration window settings.
#[utoipa::path(
    get,
    path = "/api/queue/settings",
    tag = "queue",
    responses((status = 200, description = "Current settings", body = QueueSettings))
)]
pub async fn get_settings(State(state): State<SharedState>) -> Json<QueueSettings> {
    Json(queue_service::get_settings(&state).await)
}

/// Shallow-merge new registration settings.
#[utoipa::path(
    post,
    path = "/api/queue/settings",
    tag = "queue",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = QueueSettings),
        (status = 400, description = "Turnover or field count below 1")
    )
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdateSettingsRequest>>,
) -> Result<Json<QueueSettings>, AppError> {
    Ok(Json(
        queue_service::update_settings(&state, payload.into()).await?,
    ))
}
