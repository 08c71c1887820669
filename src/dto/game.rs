use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, PlayerEntity},
    dto::{format_system_time, player::PlayerResponse},
    state::{
        game::GameVariant,
        ledger::RoundSubmission,
        projection::{GameProjection, SeatedPlayer},
    },
};

/// Payload used to start a new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    /// One of `five_crowns`, `500_rum` or `gin_rummy`.
    pub game_type: String,
    /// Players in turn order; 2 to 6 distinct registered players.
    pub player_ids: Vec<Uuid>,
    /// Score that ends a rum or gin game. Ignored for Five Crowns.
    #[validate(range(min = 1))]
    pub target_score: Option<i64>,
    /// Bonus for going out, recorded with the game.
    #[validate(range(min = 0))]
    pub going_out_bonus: Option<i64>,
}

/// Scores of one round for every participant.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitScoreRequest {
    pub round: Option<i64>,
    /// Points keyed by player id.
    #[serde(default)]
    #[schema(value_type = HashMap<String, i32>)]
    pub scores: HashMap<Uuid, i32>,
    /// Players who went out this round; omitted players did not.
    #[serde(default)]
    #[schema(value_type = HashMap<String, bool>)]
    pub went_out: HashMap<Uuid, bool>,
}

impl SubmitScoreRequest {
    /// Convert into a ledger submission once the round number is known.
    pub fn into_submission(self, round: i64) -> RoundSubmission {
        RoundSubmission {
            round,
            points: self.scores,
            went_out: self.went_out,
        }
    }
}

/// Query string of the game listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GameListQuery {
    /// `true` restricts the listing to games still in progress.
    pub active: Option<String>,
}

impl GameListQuery {
    pub fn active_only(&self) -> bool {
        self.active
            .as_deref()
            .is_some_and(|value| value.to_lowercase() == "true")
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeatedPlayerDto {
    pub id: Uuid,
    pub name: String,
    pub seat_order: u8,
}

impl From<SeatedPlayer> for SeatedPlayerDto {
    fn from(player: SeatedPlayer) -> Self {
        Self {
            id: player.player_id,
            name: player.name,
            seat_order: player.seat_order,
        }
    }
}

/// Full state of one game: roster, score grid, totals and round metadata.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameStateResponse {
    pub id: Uuid,
    pub game_type: GameVariant,
    pub target_score: Option<i64>,
    pub going_out_bonus: Option<i64>,
    pub is_active: bool,
    /// RFC 3339 start timestamp.
    pub date_played: String,
    /// Participants in seat order.
    pub players: Vec<SeatedPlayerDto>,
    /// Round number to points by player id, rounds ascending.
    #[schema(value_type = Object)]
    pub rounds: BTreeMap<u32, IndexMap<Uuid, i32>>,
    /// Running total by player id, in seat order.
    #[schema(value_type = Object)]
    pub totals: IndexMap<Uuid, i64>,
    pub current_round: u32,
    /// Wild rank of the current round; active Five Crowns games only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wild_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards_dealt: Option<u32>,
}

impl From<GameProjection> for GameStateResponse {
    fn from(projection: GameProjection) -> Self {
        let GameProjection {
            game,
            players,
            rounds,
            totals,
            current_round,
            wild_card,
            cards_dealt,
        } = projection;

        Self {
            id: game.id,
            game_type: game.variant,
            target_score: game.target_score,
            going_out_bonus: game.going_out_bonus,
            is_active: game.is_active,
            date_played: format_system_time(game.played_at),
            players: players.into_iter().map(SeatedPlayerDto::from).collect(),
            rounds,
            totals,
            current_round,
            wild_card,
            cards_dealt,
        }
    }
}

/// Row of the recent games listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameListItem {
    pub id: Uuid,
    pub game_type: GameVariant,
    pub target_score: Option<i64>,
    pub going_out_bonus: Option<i64>,
    pub is_active: bool,
    pub date_played: String,
    /// Participants in seat order.
    pub players: Vec<PlayerResponse>,
}

impl GameListItem {
    pub fn new(game: GameEntity, players: Vec<PlayerEntity>) -> Self {
        Self {
            id: game.id,
            game_type: game.variant,
            target_score: game.target_score,
            going_out_bonus: game.going_out_bonus,
            is_active: game.is_active,
            date_played: format_system_time(game.played_at),
            players: players.into_iter().map(PlayerResponse::from).collect(),
        }
    }
}
