pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    config::{AppConfig, StorageBackend},
    dao::{
        models::{GameEntity, GameFilter, ParticipantEntity, PlayerEntity, ScoreEntity},
        storage::StorageResult,
    },
    state::ledger::RoundSubmission,
};

pub use memory::MemoryScoreStore;

/// Abstraction over the persistence layer for players, games, seats and scores.
///
/// Every mutating method is a single transaction: either all of its writes land or
/// none do. Rule violations discovered inside the transaction come back as
/// [`StorageError::Rejected`].
pub trait ScoreStore: Send + Sync {
    /// Register a player; fails with `DuplicatePlayerName` when the name is taken.
    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Remove a player that never took a seat.
    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// Number of seats held by each player across all games.
    fn participation_counts(&self) -> BoxFuture<'static, StorageResult<HashMap<Uuid, usize>>>;
    /// Persist a game together with its seats; every seated player must exist.
    fn create_game(
        &self,
        game: GameEntity,
        participants: Vec<ParticipantEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Games matching `filter`, newest first.
    fn list_games(&self, filter: GameFilter) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Remove a game with its seats and scores. Returns false when nothing matched.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Seats of a game in seat order.
    fn list_participants(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Scores of a game ordered by round.
    fn list_scores(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Append one round to the ledger and close the game when it is over.
    ///
    /// Returns the game as it stands after the write.
    fn record_round(
        &self,
        game_id: Uuid,
        submission: RoundSubmission,
    ) -> BoxFuture<'static, StorageResult<GameEntity>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Build the store selected by `config`.
pub async fn connect(config: &AppConfig) -> StorageResult<Arc<dyn ScoreStore>> {
    match config.storage {
        StorageBackend::Memory => Ok(Arc::new(MemoryScoreStore::new())),
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            let mongo_config =
                self::mongodb::MongoConfig::from_uri(&config.mongo_uri, Some(&config.mongo_db))
                    .await?;
            let store = self::mongodb::MongoScoreStore::connect(mongo_config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongo-store"))]
        StorageBackend::Mongo => Err(crate::dao::storage::StorageError::Unsupported {
            backend: "mongo",
        }),
    }
}
