use axum::Router;

use crate::state::SharedState;

pub mod auto_dequeue;
pub mod docs;
pub mod health;
pub mod queue;
pub mod referee;
pub mod teams;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(queue::router())
        .merge(referee::router())
        .merge(teams::router())
        .merge(auto_dequeue::router())
        .merge(websocket::router())
        .merge(docs::router());

    api_router.with_state(state)
}
