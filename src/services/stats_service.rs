use std::collections::HashMap;

use tracing::debug;

use crate::{
    dao::models::GameFilter,
    dto::stats::LeaderboardEntry,
    error::ServiceError,
    state::{
        SharedState,
        leaderboard::{self, CompletedGame},
    },
};

/// Win/loss records over every finished game, best players first.
pub async fn leaderboard(state: &SharedState) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let store = state.store();
    let games = store.list_games(GameFilter::completed()).await?;

    let mut completed = Vec::with_capacity(games.len());
    for game in games {
        let participants = store.list_participants(game.id).await?;
        let scores = store.list_scores(game.id).await?;
        completed.push(CompletedGame {
            game,
            participants,
            scores,
        });
    }

    let names: HashMap<_, _> = store
        .list_players()
        .await?
        .into_iter()
        .map(|player| (player.id, player.name))
        .collect();

    let records = leaderboard::aggregate(&completed);
    debug!(games = completed.len(), players = records.len(), "leaderboard computed");

    Ok(records
        .into_iter()
        .filter_map(|record| {
            let name = names.get(&record.player_id)?.clone();
            Some(LeaderboardEntry::new(record, name))
        })
        .collect())
}
