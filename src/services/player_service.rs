use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::PlayerEntity,
    dto::player::{CreatePlayerRequest, MessageResponse, PlayerResponse, PlayerSummary},
    error::ServiceError,
    state::{SharedState, violation::RuleViolation},
};

/// Register a player under a trimmed, case-insensitively unique name.
pub async fn create_player(
    state: &SharedState,
    request: CreatePlayerRequest,
) -> Result<PlayerResponse, ServiceError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(RuleViolation::EmptyPlayerName.into());
    }

    let player = PlayerEntity {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        created_at: SystemTime::now(),
    };
    state.store().insert_player(player.clone()).await?;

    info!(player_id = %player.id, name = %player.name, "player registered");
    Ok(player.into())
}

/// Every player with the number of games they sat in, most active first.
pub async fn list_players(state: &SharedState) -> Result<Vec<PlayerSummary>, ServiceError> {
    let store = state.store();
    let players = store.list_players().await?;
    let counts = store.participation_counts().await?;

    let mut summaries: Vec<PlayerSummary> = players
        .into_iter()
        .map(|player| {
            let games_played = counts.get(&player.id).copied().unwrap_or(0);
            PlayerSummary::new(player, games_played)
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.games_played
            .cmp(&a.games_played)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    Ok(summaries)
}

pub async fn get_player(state: &SharedState, id: Uuid) -> Result<PlayerResponse, ServiceError> {
    state
        .store()
        .find_player(id)
        .await?
        .map(PlayerResponse::from)
        .ok_or_else(|| RuleViolation::PlayerNotFound(id).into())
}

/// Delete a player that never took part in a game.
pub async fn delete_player(state: &SharedState, id: Uuid) -> Result<MessageResponse, ServiceError> {
    state.store().delete_player(id).await?;
    info!(player_id = %id, "player deleted");
    Ok(MessageResponse::new("Player deleted"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{models::ParticipantEntity, score_store::MemoryScoreStore},
        state::{AppState, game::GameVariant},
    };

    fn state() -> SharedState {
        AppState::new(Arc::new(MemoryScoreStore::new()), AppConfig::default())
    }

    async fn register(state: &SharedState, name: &str) -> PlayerResponse {
        create_player(
            state,
            CreatePlayerRequest {
                name: name.to_owned(),
            },
        )
        .await
        .unwrap()
    }

    fn rule(err: ServiceError) -> RuleViolation {
        match err {
            ServiceError::Rule(violation) => violation,
            other => panic!("expected a rule violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn names_are_trimmed_and_unique_ignoring_case() {
        let state = state();
        let ada = register(&state, "  Ada ").await;
        assert_eq!(ada.name, "Ada");

        let err = create_player(
            &state,
            CreatePlayerRequest {
                name: "ADA".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(rule(err), RuleViolation::DuplicatePlayerName(_)));

        let err = create_player(&state, CreatePlayerRequest { name: "   ".into() })
            .await
            .unwrap_err();
        assert_eq!(rule(err), RuleViolation::EmptyPlayerName);
    }

    #[tokio::test]
    async fn listing_puts_most_active_players_first() {
        let state = state();
        let cy = register(&state, "cy").await;
        let ada = register(&state, "Ada").await;
        let bo = register(&state, "Bo").await;

        let game = crate::dao::models::GameEntity {
            id: Uuid::new_v4(),
            variant: GameVariant::FiveCrowns,
            target_score: None,
            going_out_bonus: None,
            is_active: true,
            played_at: SystemTime::now(),
        };
        let seats = [cy.id, bo.id]
            .into_iter()
            .enumerate()
            .map(|(seat, player_id)| ParticipantEntity {
                game_id: game.id,
                player_id,
                seat_order: seat as u8,
            })
            .collect();
        state.store().create_game(game, seats).await.unwrap();

        let listed = list_players(&state).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bo", "cy", "Ada"]);
        assert_eq!(listed[0].games_played, 1);
        assert_eq!(listed[2].id, ada.id);
        assert_eq!(listed[2].games_played, 0);
    }

    #[tokio::test]
    async fn unknown_players_are_not_found() {
        let state = state();
        let id = Uuid::new_v4();

        let err = get_player(&state, id).await.unwrap_err();
        assert_eq!(rule(err), RuleViolation::PlayerNotFound(id));

        let err = delete_player(&state, id).await.unwrap_err();
        assert_eq!(rule(err), RuleViolation::PlayerNotFound(id));
    }

    #[tokio::test]
    async fn players_without_games_can_be_deleted() {
        let state = state();
        let ada = register(&state, "Ada").await;

        let response = delete_player(&state, ada.id).await.unwrap();
        assert_eq!(response.message, "Player deleted");
        assert!(list_players(&state).await.unwrap().is_empty());
    }
}
