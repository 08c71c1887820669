use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::stats::LeaderboardEntry, error::AppError, services::stats_service, state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/stats/leaderboard", get(leaderboard))
}

/// Wins, losses and win rate per player over finished games.
#[utoipa::path(
    get,
    path = "/api/stats/leaderboard",
    tag = "stats",
    responses((status = 200, description = "Ranked player records", body = [LeaderboardEntry]))
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(stats_service::leaderboard(&state).await?))
}
