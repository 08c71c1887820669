use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::PlayerEntity;
use crate::dto::format_system_time;

/// Payload used to register a new player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePlayerRequest {
    /// Display name; surrounding whitespace is dropped and case is ignored for uniqueness.
    #[validate(length(max = 100))]
    pub name: String,
}

/// Player as returned by the registry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerResponse {
    pub id: Uuid,
    pub name: String,
    /// RFC 3339 registration timestamp.
    pub created_at: String,
}

impl From<PlayerEntity> for PlayerResponse {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            name: player.name,
            created_at: format_system_time(player.created_at),
        }
    }
}

/// Player listing row, with the number of games the player took a seat in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
    pub games_played: usize,
}

impl PlayerSummary {
    pub fn new(player: PlayerEntity, games_played: usize) -> Self {
        let PlayerResponse {
            id,
            name,
            created_at,
        } = player.into();
        Self {
            id,
            name,
            created_at,
            games_played,
        }
    }
}

/// Acknowledgement returned by delete endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
