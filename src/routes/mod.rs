use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod extract;
pub mod games;
pub mod health;
pub mod players;
pub mod stats;

/// Compose all route trees under `/api`, plus the documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(players::router())
        .merge(games::router())
        .merge(stats::router());

    Router::new()
        .nest("/api", api_router)
        .merge(docs::router())
        .with_state(state)
}
