/// OpenAPI documentation generation.
pub mod documentation;
/// Game creation, scoring and history.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Player registry operations.
pub mod player_service;
/// Leaderboard computation over finished games.
pub mod stats_service;
