use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the skills queue backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::queue::add_team,
        crate::routes::queue::serve_next,
        crate::routes::queue::unserve,
        crate::routes::queue::remove_team,
        crate::routes::queue::get_queue,
        crate::routes::queue::queue_status,
        crate::routes::queue::get_settings,
        crate::routes::queue::update_settings,
        crate::routes::referee::list_violations,
        crate::routes::referee::add_violation,
        crate::routes::referee::remove_violation,
        crate::routes::teams::list_teams,
        crate::routes::auto_dequeue::status,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::queue::TeamRequest,
            crate::dto::queue::ServeRequest,
            crate::dto::queue::UnserveRequest,
            crate::dto::queue::TeamResponse,
            crate::dto::queue::ServedResponse,
            crate::dto::queue::UpdateSettingsRequest,
            crate::dto::referee::ViolationRequest,
            crate::dto::ws::QueueSnapshot,
            crate::dao::models::QueueEntry,
            crate::dao::models::QueueLists,
            crate::dao::models::QueueSettings,
            crate::dao::models::Violation,
            crate::dao::models::TeamInfo,
            crate::services::capacity::CapacityDecision,
            crate::services::capacity::CapacityReason,
            crate::services::auto_dequeue::AutoDequeueStatus,
            crate::services::auto_dequeue::DequeueConfig,
            crate::services::auto_dequeue::tracker::TrackerSummary,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "queue", description = "Skills queue registration and field calls"),
        (name = "referee", description = "Referee violation log"),
        (name = "teams", description = "Event roster"),
        (name = "auto-dequeue", description = "Automatic dequeue engine status"),
        (name = "websocket", description = "Live queue updates for display clients"),
    )
)]
pub struct ApiDoc;
