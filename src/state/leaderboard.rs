//! Cross-game win/loss aggregation.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, ParticipantEntity, ScoreEntity},
    state::{ledger, rules},
};

/// Ledger of a finished game, as needed to decide its winner.
#[derive(Debug, Clone)]
pub struct CompletedGame {
    /// The game record.
    pub game: GameEntity,
    /// Seats of the game.
    pub participants: Vec<ParticipantEntity>,
    /// Every recorded score of the game.
    pub scores: Vec<ScoreEntity>,
}

/// Win/loss record of a single player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    /// Player identifier.
    pub player_id: Uuid,
    /// Games won.
    pub wins: u32,
    /// Games lost.
    pub losses: u32,
    /// Finished games the player took part in.
    pub games_played: u32,
    /// Share of games won, in percent with one decimal.
    pub win_rate: f64,
}

/// Percentage of games won, rounded to one decimal; 0 when nothing was played.
///
/// Exact half-tenths round to the even neighbour (6.25 becomes 6.2).
pub fn win_rate(wins: u32, games_played: u32) -> f64 {
    if games_played == 0 {
        return 0.0;
    }
    let rate = f64::from(wins) / f64::from(games_played) * 100.0;
    (rate * 10.0).round_ties_even() / 10.0
}

/// Aggregate win/loss records over every finished game in `games`.
///
/// Active games and games without a single recorded score are ignored. Records are
/// sorted by wins then win rate, both descending; remaining ties keep the order in
/// which players first appear.
pub fn aggregate(games: &[CompletedGame]) -> Vec<PlayerRecord> {
    let mut tally: IndexMap<Uuid, (u32, u32)> = IndexMap::new();

    for completed in games.iter().filter(|completed| !completed.game.is_active) {
        if completed.scores.is_empty() {
            continue;
        }

        let totals = ledger::totals_for_game(&completed.participants, &completed.scores);
        let Some(winner) = rules::determine_winner(completed.game.variant.win_policy(), &totals)
        else {
            continue;
        };

        for player_id in totals.keys() {
            let (wins, played) = tally.entry(*player_id).or_insert((0, 0));
            *played += 1;
            if *player_id == winner {
                *wins += 1;
            }
        }
    }

    let mut records: Vec<PlayerRecord> = tally
        .into_iter()
        .map(|(player_id, (wins, games_played))| PlayerRecord {
            player_id,
            wins,
            losses: games_played - wins,
            games_played,
            win_rate: win_rate(wins, games_played),
        })
        .collect();

    records.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.win_rate.total_cmp(&a.win_rate))
    });
    records
}
