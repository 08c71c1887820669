use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::player::{CreatePlayerRequest, MessageResponse, PlayerResponse, PlayerSummary},
    error::AppError,
    routes::extract::{ApiPath, ValidatedJson},
    services::player_service,
    state::SharedState,
};

/// Player registry endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players", get(list_players).post(create_player))
        .route("/players/{id}", get(get_player).delete(delete_player))
}

/// Register a new player.
#[utoipa::path(
    post,
    path = "/api/players",
    tag = "players",
    request_body = CreatePlayerRequest,
    responses(
        (status = 201, description = "Player created", body = PlayerResponse),
        (status = 400, description = "Empty or invalid name"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_player(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<PlayerResponse>), AppError> {
    let player = player_service::create_player(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// List players with the number of games each took part in.
#[utoipa::path(
    get,
    path = "/api/players",
    tag = "players",
    responses((status = 200, description = "Registered players", body = [PlayerSummary]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PlayerSummary>>, AppError> {
    Ok(Json(player_service::list_players(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/players/{id}",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player", body = PlayerResponse),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_player(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PlayerResponse>, AppError> {
    Ok(Json(player_service::get_player(&state, id).await?))
}

/// Delete a player without game history.
#[utoipa::path(
    delete,
    path = "/api/players/{id}",
    tag = "players",
    params(("id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Player deleted", body = MessageResponse),
        (status = 400, description = "Player has game history"),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(player_service::delete_player(&state, id).await?))
}
