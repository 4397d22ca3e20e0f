/// Automatic dequeue driven by skills attempt counts.
pub mod auto_dequeue;
/// Registration capacity and cutoff decisions.
pub mod capacity;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Queue mutations shared by HTTP handlers and the engine.
pub mod queue_service;
/// Referee violation log.
pub mod referee_service;
/// Event roster lookup.
pub mod roster_service;
/// WebSocket fan-out to display clients.
pub mod websocket_service;
