use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::leaderboard::PlayerRecord;

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub player_id: Uuid,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub games_played: u32,
    /// Percentage of games won, one decimal.
    pub win_rate: f64,
}

impl LeaderboardEntry {
    pub fn new(record: PlayerRecord, name: String) -> Self {
        Self {
            player_id: record.player_id,
            name,
            wins: record.wins,
            losses: record.losses,
            games_played: record.games_played,
            win_rate: record.win_rate,
        }
    }
}
