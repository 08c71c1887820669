use thiserror::Error;
use uuid::Uuid;

use crate::state::game::{MAX_PLAYERS, MIN_PLAYERS};

/// Rule violations detected by the scoring engine before anything is persisted.
///
/// Every variant is a client error; [`RuleViolation::kind`] gives the stable identifier
/// clients can match on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// The requested variant is not one of the supported games.
    #[error("invalid game_type `{given}`; expected one of five_crowns, 500_rum, gin_rummy")]
    InvalidGameType { given: String },
    /// Fewer than two or more than six players were requested.
    #[error("a game needs between {} and {} players, got {given}", MIN_PLAYERS, MAX_PLAYERS)]
    InvalidPlayerCount { given: usize },
    /// The same player was seated twice at one table.
    #[error("player `{0}` is listed more than once")]
    DuplicateParticipant(Uuid),
    /// A referenced player does not exist or is not seated in the game.
    #[error("unknown player `{0}`")]
    UnknownPlayer(Uuid),
    /// The game already ended; the ledger is closed.
    #[error("game `{0}` is already finished")]
    GameInactive(Uuid),
    /// The round already has recorded scores.
    #[error("scores for round {0} already submitted")]
    DuplicateRound(i64),
    /// The submitted player set differs from the game participants.
    #[error("scores must be submitted for every player in the game")]
    IncompletePlayerSet,
    /// The submission did not name a round.
    #[error("round number is required")]
    MissingRound,
    /// The round number is outside the range allowed by the variant.
    #[error("{}", describe_round(.round, .max))]
    InvalidRoundNumber { round: i64, max: Option<u32> },
    /// No game with this identifier exists.
    #[error("game `{0}` not found")]
    GameNotFound(Uuid),
    /// No player with this identifier exists.
    #[error("player `{0}` not found")]
    PlayerNotFound(Uuid),
    /// Another player already uses this name, ignoring case.
    #[error("player with name `{0}` already exists")]
    DuplicatePlayerName(String),
    /// The player name is blank once trimmed.
    #[error("player name cannot be empty")]
    EmptyPlayerName,
    /// The player took part in at least one game and must be kept.
    #[error("cannot delete player `{0}` with game history")]
    PlayerHasHistory(Uuid),
}

impl RuleViolation {
    /// Machine readable identifier of the violation.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleViolation::InvalidGameType { .. } => "invalid_game_type",
            RuleViolation::InvalidPlayerCount { .. } => "invalid_player_count",
            RuleViolation::DuplicateParticipant(_) => "duplicate_participant",
            RuleViolation::UnknownPlayer(_) => "unknown_player",
            RuleViolation::GameInactive(_) => "game_inactive",
            RuleViolation::DuplicateRound(_) => "duplicate_round",
            RuleViolation::IncompletePlayerSet => "incomplete_player_set",
            RuleViolation::MissingRound => "missing_round",
            RuleViolation::InvalidRoundNumber { .. } => "invalid_round_number",
            RuleViolation::GameNotFound(_) => "game_not_found",
            RuleViolation::PlayerNotFound(_) => "player_not_found",
            RuleViolation::DuplicatePlayerName(_) => "duplicate_player_name",
            RuleViolation::EmptyPlayerName => "empty_player_name",
            RuleViolation::PlayerHasHistory(_) => "player_has_history",
        }
    }
}

fn describe_round(round: &i64, max: &Option<u32>) -> String {
    match max {
        Some(max) => format!("round {round} is out of range; rounds must be 1-{max}"),
        None => format!("round {round} is out of range; rounds start at 1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_messages_mention_bounds() {
        let bounded = RuleViolation::InvalidRoundNumber {
            round: 12,
            max: Some(11),
        };
        assert_eq!(
            bounded.to_string(),
            "round 12 is out of range; rounds must be 1-11"
        );

        let open = RuleViolation::InvalidRoundNumber {
            round: 0,
            max: None,
        };
        assert_eq!(open.to_string(), "round 0 is out of range; rounds start at 1");
    }

    #[test]
    fn kinds_are_snake_case() {
        assert_eq!(RuleViolation::DuplicateRound(3).kind(), "duplicate_round");
        assert_eq!(
            RuleViolation::PlayerHasHistory(Uuid::nil()).kind(),
            "player_has_history"
        );
        assert_eq!(
            RuleViolation::InvalidPlayerCount { given: 7 }.to_string(),
            "a game needs between 2 and 6 players, got 7"
        );
    }
}
