use std::{collections::HashSet, time::SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, GameFilter, ParticipantEntity, PlayerEntity},
    dto::{
        game::{CreateGameRequest, GameListItem, GameListQuery, GameStateResponse, SubmitScoreRequest},
        player::MessageResponse,
    },
    error::ServiceError,
    state::{
        SharedState,
        game::{GameVariant, MAX_PLAYERS, MIN_PLAYERS},
        projection::{self, SeatedPlayer},
        violation::RuleViolation,
    },
};

/// Start a game for 2 to 6 registered players, seated in the order given.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameStateResponse, ServiceError> {
    let CreateGameRequest {
        game_type,
        player_ids,
        target_score,
        going_out_bonus,
    } = request;

    let variant: GameVariant = game_type.parse()?;
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_ids.len()) {
        return Err(RuleViolation::InvalidPlayerCount {
            given: player_ids.len(),
        }
        .into());
    }
    let mut seen = HashSet::new();
    if let Some(repeat) = player_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(RuleViolation::DuplicateParticipant(*repeat).into());
    }

    let game = GameEntity {
        id: Uuid::new_v4(),
        variant,
        target_score: variant
            .uses_target_score()
            .then(|| target_score.unwrap_or(state.config().default_target_score)),
        going_out_bonus,
        is_active: true,
        played_at: SystemTime::now(),
    };
    let participants = player_ids
        .iter()
        .zip(0u8..)
        .map(|(player_id, seat_order)| ParticipantEntity {
            game_id: game.id,
            player_id: *player_id,
            seat_order,
        })
        .collect();

    state.store().create_game(game.clone(), participants).await?;
    info!(
        game_id = %game.id,
        variant = %game.variant,
        players = player_ids.len(),
        "game created"
    );

    load_state(state, game.id).await
}

/// Projected state of a single game.
pub async fn get_game(state: &SharedState, id: Uuid) -> Result<GameStateResponse, ServiceError> {
    load_state(state, id).await
}

/// Record one round and return the game as it stands afterwards.
pub async fn submit_score(
    state: &SharedState,
    id: Uuid,
    request: SubmitScoreRequest,
) -> Result<GameStateResponse, ServiceError> {
    let Some(round) = request.round else {
        // Unknown and finished games take precedence over the missing field.
        let game = find_game(state, id).await?;
        if !game.is_active {
            return Err(RuleViolation::GameInactive(id).into());
        }
        return Err(RuleViolation::MissingRound.into());
    };

    let updated = state
        .store()
        .record_round(id, request.into_submission(round))
        .await?;
    if updated.is_active {
        info!(game_id = %id, round, "round recorded");
    } else {
        info!(game_id = %id, round, "round recorded; game finished");
    }

    load_state(state, id).await
}

/// Most recent games, newest first, optionally restricted to active ones.
pub async fn list_games(
    state: &SharedState,
    query: GameListQuery,
) -> Result<Vec<GameListItem>, ServiceError> {
    let store = state.store();
    let filter = GameFilter::recent(query.active_only(), state.config().recent_games_limit);
    let games = store.list_games(filter).await?;

    let mut items = Vec::with_capacity(games.len());
    for game in games {
        let players = seated_players(state, game.id)
            .await?
            .into_iter()
            .map(|(player, _)| player)
            .collect();
        items.push(GameListItem::new(game, players));
    }
    Ok(items)
}

/// Delete a game together with its seats and scores.
pub async fn delete_game(state: &SharedState, id: Uuid) -> Result<MessageResponse, ServiceError> {
    if !state.store().delete_game(id).await? {
        return Err(RuleViolation::GameNotFound(id).into());
    }
    info!(game_id = %id, "game deleted");
    Ok(MessageResponse::new("Game deleted"))
}

async fn find_game(state: &SharedState, id: Uuid) -> Result<GameEntity, ServiceError> {
    state
        .store()
        .find_game(id)
        .await?
        .ok_or_else(|| RuleViolation::GameNotFound(id).into())
}

async fn load_state(state: &SharedState, id: Uuid) -> Result<GameStateResponse, ServiceError> {
    let game = find_game(state, id).await?;
    let players = seated_players(state, id)
        .await?
        .into_iter()
        .map(|(player, seat_order)| SeatedPlayer {
            player_id: player.id,
            name: player.name,
            seat_order,
        })
        .collect();
    let scores = state.store().list_scores(id).await?;

    Ok(projection::project_state(&game, players, &scores).into())
}

/// Players of a game in seat order with their seat.
async fn seated_players(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Vec<(PlayerEntity, u8)>, ServiceError> {
    let store = state.store();
    let seats = store.list_participants(game_id).await?;

    let mut players = Vec::with_capacity(seats.len());
    for seat in seats {
        match store.find_player(seat.player_id).await? {
            Some(player) => players.push((player, seat.seat_order)),
            None => warn!(
                %game_id,
                player_id = %seat.player_id,
                "seated player missing from the registry"
            ),
        }
    }
    Ok(players)
}
