use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::violation::RuleViolation;

/// Smallest table a game can be created with.
pub const MIN_PLAYERS: usize = 2;
/// Largest table a game can be created with.
pub const MAX_PLAYERS: usize = 6;
/// Five Crowns is always played over exactly this many rounds.
pub const FIVE_CROWNS_ROUNDS: u32 = 11;

/// Card game variants supported by the score keeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum GameVariant {
    /// Five Crowns: 11 rounds, lowest total wins.
    #[serde(rename = "five_crowns")]
    FiveCrowns,
    /// 500 Rum: played up to a target score, highest total wins.
    #[serde(rename = "500_rum")]
    FiveHundredRum,
    /// Gin Rummy: played up to a target score, highest total wins.
    #[serde(rename = "gin_rummy")]
    GinRummy,
}

/// Direction in which final totals are compared to pick a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinPolicy {
    /// The smallest total takes the game.
    LowScoreWins,
    /// The largest total takes the game.
    HighScoreWins,
}

impl GameVariant {
    /// Every supported variant, in the order they are advertised to clients.
    pub const ALL: [GameVariant; 3] = [
        GameVariant::FiveCrowns,
        GameVariant::FiveHundredRum,
        GameVariant::GinRummy,
    ];

    /// Wire identifier of the variant.
    pub fn as_str(self) -> &'static str {
        match self {
            GameVariant::FiveCrowns => "five_crowns",
            GameVariant::FiveHundredRum => "500_rum",
            GameVariant::GinRummy => "gin_rummy",
        }
    }

    /// How the winner of a finished game of this variant is picked.
    pub fn win_policy(self) -> WinPolicy {
        match self {
            GameVariant::FiveCrowns => WinPolicy::LowScoreWins,
            GameVariant::FiveHundredRum | GameVariant::GinRummy => WinPolicy::HighScoreWins,
        }
    }

    /// Whether the game ends once a player reaches a target score.
    pub fn uses_target_score(self) -> bool {
        match self {
            GameVariant::FiveCrowns => false,
            GameVariant::FiveHundredRum | GameVariant::GinRummy => true,
        }
    }

    /// Upper bound on the round number, when the variant has one.
    pub fn max_rounds(self) -> Option<u32> {
        match self {
            GameVariant::FiveCrowns => Some(FIVE_CROWNS_ROUNDS),
            GameVariant::FiveHundredRum | GameVariant::GinRummy => None,
        }
    }
}

impl WinPolicy {
    /// Return true when `candidate` beats `incumbent` under this policy.
    ///
    /// Equal totals never beat each other, so the first contender seen keeps the lead.
    pub fn prefers(self, candidate: i64, incumbent: i64) -> bool {
        match self {
            WinPolicy::LowScoreWins => candidate < incumbent,
            WinPolicy::HighScoreWins => candidate > incumbent,
        }
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameVariant {
    type Err = RuleViolation;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GameVariant::ALL
            .into_iter()
            .find(|variant| variant.as_str() == value)
            .ok_or_else(|| RuleViolation::InvalidGameType {
                given: value.to_owned(),
            })
    }
}
