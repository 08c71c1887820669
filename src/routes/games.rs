use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        game::{CreateGameRequest, GameListItem, GameListQuery, GameStateResponse, SubmitScoreRequest},
        player::MessageResponse,
    },
    error::AppError,
    routes::extract::{ApiPath, ValidatedJson},
    services::game_service,
    state::SharedState,
};

/// Game lifecycle endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games).post(create_game))
        .route("/games/{id}", get(get_game).delete(delete_game))
        .route("/games/{id}/score", post(submit_score))
}

/// Start a new game.
#[utoipa::path(
    post,
    path = "/api/games",
    tag = "games",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameStateResponse),
        (status = 400, description = "Unknown game type, bad roster or unknown player")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameStateResponse>), AppError> {
    let game = game_service::create_game(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Recent games, newest first.
#[utoipa::path(
    get,
    path = "/api/games",
    tag = "games",
    params(GameListQuery),
    responses((status = 200, description = "Recent games with their players", body = [GameListItem]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
    Query(query): Query<GameListQuery>,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    Ok(Json(game_service::list_games(&state, query).await?))
}

/// Full state of a game.
#[utoipa::path(
    get,
    path = "/api/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game state", body = GameStateResponse),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<GameStateResponse>, AppError> {
    Ok(Json(game_service::get_game(&state, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game deleted", body = MessageResponse),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(game_service::delete_game(&state, id).await?))
}

/// Record the scores of one round.
#[utoipa::path(
    post,
    path = "/api/games/{id}/score",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Updated game state", body = GameStateResponse),
        (status = 400, description = "Round rejected"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<SubmitScoreRequest>,
) -> Result<Json<GameStateResponse>, AppError> {
    Ok(Json(game_service::submit_score(&state, id, payload).await?))
}
