use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::game::GameVariant;

/// Registered player, shared by every game they take part in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Display name, unique regardless of case.
    pub name: String,
    /// Registration timestamp.
    pub created_at: SystemTime,
}

impl PlayerEntity {
    /// Key used to enforce case-insensitive name uniqueness.
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }
}

/// Normalise a player name into its uniqueness key.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Game instance persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Card game being played.
    pub variant: GameVariant,
    /// Score that ends rum and gin games; unused for Five Crowns.
    pub target_score: Option<i64>,
    /// Bonus announced for going out (500 Rum house rule), kept for display only.
    pub going_out_bonus: Option<i64>,
    /// True until the variant's game-over condition fires.
    pub is_active: bool,
    /// When the game was started.
    pub played_at: SystemTime,
}

/// Seat assignment linking a player to a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Game the seat belongs to.
    pub game_id: Uuid,
    /// Player occupying the seat.
    pub player_id: Uuid,
    /// Zero-based turn order.
    pub seat_order: u8,
}

/// Points scored by one player in one round of one game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Game the score belongs to.
    pub game_id: Uuid,
    /// Player who scored.
    pub player_id: Uuid,
    /// One-based round number.
    pub round_number: u32,
    /// Points for the round (may be negative in rum variants).
    pub points: i32,
    /// Whether the player went out this round.
    pub went_out: bool,
}

/// Selection applied when listing games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Restrict to active (`Some(true)`) or finished (`Some(false)`) games.
    pub active: Option<bool>,
    /// Maximum number of games returned, newest first.
    pub limit: Option<usize>,
}

impl GameFilter {
    /// Most recent games, optionally restricted to active ones.
    pub fn recent(active_only: bool, limit: usize) -> Self {
        Self {
            active: active_only.then_some(true),
            limit: Some(limit),
        }
    }

    /// Every finished game, regardless of age.
    pub fn completed() -> Self {
        Self {
            active: Some(false),
            limit: None,
        }
    }

    /// Whether `game` passes the activity filter.
    pub fn matches(&self, game: &GameEntity) -> bool {
        self.active.is_none_or(|active| game.is_active == active)
    }
}
