use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the CardScore API.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::players::create_player,
        crate::routes::players::list_players,
        crate::routes::players::get_player,
        crate::routes::players::delete_player,
        crate::routes::games::create_game,
        crate::routes::games::list_games,
        crate::routes::games::get_game,
        crate::routes::games::delete_game,
        crate::routes::games::submit_score,
        crate::routes::stats::leaderboard,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::player::CreatePlayerRequest,
            crate::dto::player::PlayerResponse,
            crate::dto::player::PlayerSummary,
            crate::dto::player::MessageResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::SubmitScoreRequest,
            crate::dto::game::GameStateResponse,
            crate::dto::game::SeatedPlayerDto,
            crate::dto::game::GameListItem,
            crate::dto::stats::LeaderboardEntry,
            crate::state::game::GameVariant,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "players", description = "Player registry"),
        (name = "games", description = "Game creation, scoring and history"),
        (name = "stats", description = "Cross-game statistics"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/health",
            "/api/players",
            "/api/players/{id}",
            "/api/games",
            "/api/games/{id}",
            "/api/games/{id}/score",
            "/api/stats/leaderboard",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
