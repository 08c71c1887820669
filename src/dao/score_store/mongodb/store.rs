use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database, IndexModel, SessionCursor,
    bson::{Document, doc},
    error::Error as MongoError,
    options::{IndexOptions, ReturnDocument},
};
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        GAMES, GameDocument, PARTICIPANTS, PLAYERS, ParticipantDocument, PlayerDocument, SCORES,
        ScoreDocument, claim_player, decode_all, doc_id, recent_games_order, uuid_as_binary,
    },
};
use crate::{
    dao::{
        models::{GameEntity, GameFilter, ParticipantEntity, PlayerEntity, ScoreEntity},
        score_store::ScoreStore,
        storage::StorageResult,
    },
    state::{
        ledger::{self, RoundSubmission},
        violation::RuleViolation,
    },
};

/// Attempts made for a transaction that keeps hitting write conflicts.
const MAX_TRANSACTION_ATTEMPTS: u32 = 3;

/// MongoDB-backed [`ScoreStore`]. Multi-document writes run in transactions,
/// so the server must be a replica set.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    client: Client,
    database: Database,
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner { client, database }),
        };
        store.ensure_indexes().await?;
        info!(database = %config.database_name, "MongoDB score store ready");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        self.ensure_index(PLAYERS, "player_name_key_idx", doc! {"name_key": 1}, true)
            .await?;
        self.ensure_index(GAMES, "game_recent_idx", recent_games_order(), false)
            .await?;
        self.ensure_index(
            PARTICIPANTS,
            "participant_seat_idx",
            doc! {"game_id": 1, "player_id": 1},
            true,
        )
        .await?;
        self.ensure_index(
            SCORES,
            "score_round_idx",
            doc! {"game_id": 1, "player_id": 1, "round_number": 1},
            true,
        )
        .await
    }

    async fn ensure_index(
        &self,
        collection: &'static str,
        index: &'static str,
        keys: Document,
        unique: bool,
    ) -> MongoResult<()> {
        let model = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(Some(index.to_owned()))
                    .unique(Some(unique))
                    .build(),
            )
            .build();

        self.inner
            .database
            .collection::<Document>(collection)
            .create_index(model)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection,
                index,
                source,
            })?;
        Ok(())
    }

    fn players(&self) -> Collection<PlayerDocument> {
        self.inner.database.collection(PLAYERS)
    }

    fn games(&self) -> Collection<GameDocument> {
        self.inner.database.collection(GAMES)
    }

    fn participants(&self) -> Collection<ParticipantDocument> {
        self.inner.database.collection(PARTICIPANTS)
    }

    fn scores(&self) -> Collection<ScoreDocument> {
        self.inner.database.collection(SCORES)
    }

    async fn begin(&self, operation: &'static str) -> MongoResult<ClientSession> {
        let mut session = self
            .inner
            .client
            .start_session()
            .await
            .map_err(|source| MongoDaoError::Transaction { operation, source })?;
        session
            .start_transaction()
            .await
            .map_err(|source| MongoDaoError::Transaction { operation, source })?;
        Ok(session)
    }

    /// Commit on success, abort otherwise.
    async fn finish<T>(
        mut session: ClientSession,
        operation: &'static str,
        outcome: MongoResult<T>,
    ) -> MongoResult<T> {
        match outcome {
            Ok(value) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|source| MongoDaoError::Transaction { operation, source })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    warn!(operation, error = %abort_err, "failed to abort transaction");
                }
                Err(err)
            }
        }
    }

    async fn drain<T>(
        session: &mut ClientSession,
        collection: &'static str,
        mut cursor: SessionCursor<T>,
    ) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        cursor
            .stream(session)
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })
    }

    async fn insert_player(&self, player: PlayerEntity) -> MongoResult<()> {
        let name = player.name.clone();
        self.players()
            .insert_one(PlayerDocument::from(player))
            .await
            .map_err(|source| {
                MongoDaoError::on_write(PLAYERS, RuleViolation::DuplicatePlayerName(name), source)
            })?;
        Ok(())
    }

    async fn find_player(&self, id: Uuid) -> MongoResult<Option<PlayerEntity>> {
        self.players()
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PLAYERS,
                source,
            })?
            .map(PlayerEntity::try_from)
            .transpose()
    }

    async fn list_players(&self) -> MongoResult<Vec<PlayerEntity>> {
        let read_error = |source: MongoError| MongoDaoError::Read {
            collection: PLAYERS,
            source,
        };
        let documents: Vec<PlayerDocument> = self
            .players()
            .find(doc! {})
            .await
            .map_err(read_error)?
            .try_collect()
            .await
            .map_err(read_error)?;
        decode_all(documents)
    }

    async fn delete_player(&self, id: Uuid) -> MongoResult<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut session = self.begin("delete_player").await?;
            let outcome = self.delete_player_in(&mut session, id).await;
            match Self::finish(session, "delete_player", outcome).await {
                Err(err) if err.is_transient() && attempt < MAX_TRANSACTION_ATTEMPTS => {
                    warn!(player_id = %id, attempt, error = %err, "player delete conflicted; retrying");
                }
                result => return result,
            }
        }
    }

    async fn delete_player_in(&self, session: &mut ClientSession, id: Uuid) -> MongoResult<()> {
        // Claiming the player first makes a concurrent game creation seating it conflict.
        let claimed = self
            .players()
            .update_one(doc_id(id), claim_player())
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PLAYERS,
                source,
            })?;
        if claimed.matched_count == 0 {
            return Err(RuleViolation::PlayerNotFound(id).into());
        }

        let seats = self
            .participants()
            .count_documents(doc! {"player_id": uuid_as_binary(id)})
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PARTICIPANTS,
                source,
            })?;
        if seats > 0 {
            return Err(RuleViolation::PlayerHasHistory(id).into());
        }

        self.players()
            .delete_one(doc_id(id))
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PLAYERS,
                source,
            })?;
        Ok(())
    }

    async fn participation_counts(&self) -> MongoResult<HashMap<Uuid, usize>> {
        let read_error = |source: MongoError| MongoDaoError::Read {
            collection: PARTICIPANTS,
            source,
        };
        let documents: Vec<ParticipantDocument> = self
            .participants()
            .find(doc! {})
            .await
            .map_err(read_error)?
            .try_collect()
            .await
            .map_err(read_error)?;

        let mut counts = HashMap::new();
        for seat in decode_all::<_, ParticipantEntity>(documents)? {
            *counts.entry(seat.player_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn create_game(
        &self,
        game: GameEntity,
        participants: Vec<ParticipantEntity>,
    ) -> MongoResult<()> {
        let mut seen = HashSet::new();
        if let Some(repeat) = participants
            .iter()
            .find(|seat| !seen.insert(seat.player_id))
        {
            return Err(RuleViolation::DuplicateParticipant(repeat.player_id).into());
        }

        let game_id = game.id;
        let document = GameDocument::from(game);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut session = self.begin("create_game").await?;
            let outcome = self
                .create_game_in(&mut session, &document, &participants)
                .await;
            match Self::finish(session, "create_game", outcome).await {
                Err(err) if err.is_transient() && attempt < MAX_TRANSACTION_ATTEMPTS => {
                    warn!(%game_id, attempt, error = %err, "game creation conflicted; retrying");
                }
                result => return result,
            }
        }
    }

    async fn create_game_in(
        &self,
        session: &mut ClientSession,
        game: &GameDocument,
        participants: &[ParticipantEntity],
    ) -> MongoResult<()> {
        // Each seated player is claimed so a concurrent delete of that player conflicts.
        for seat in participants {
            let claimed = self
                .players()
                .update_one(doc_id(seat.player_id), claim_player())
                .session(&mut *session)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: PLAYERS,
                    source,
                })?;
            if claimed.matched_count == 0 {
                return Err(RuleViolation::UnknownPlayer(seat.player_id).into());
            }
        }

        self.games()
            .insert_one(game)
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: GAMES,
                source,
            })?;

        for seat in participants.iter().copied() {
            self.participants()
                .insert_one(ParticipantDocument::from(seat))
                .session(&mut *session)
                .await
                .map_err(|source| {
                    MongoDaoError::on_write(
                        PARTICIPANTS,
                        RuleViolation::DuplicateParticipant(seat.player_id),
                        source,
                    )
                })?;
        }
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        self.games()
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: GAMES,
                source,
            })?
            .map(GameEntity::try_from)
            .transpose()
    }

    async fn list_games(&self, filter: GameFilter) -> MongoResult<Vec<GameEntity>> {
        let read_error = |source: MongoError| MongoDaoError::Read {
            collection: GAMES,
            source,
        };
        let selector = match filter.active {
            Some(active) => doc! {"is_active": active},
            None => doc! {},
        };

        let games = self.games();
        let mut find = games.find(selector).sort(recent_games_order());
        if let Some(limit) = filter.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let documents: Vec<GameDocument> = find
            .await
            .map_err(read_error)?
            .try_collect()
            .await
            .map_err(read_error)?;
        decode_all(documents)
    }

    async fn delete_game(&self, id: Uuid) -> MongoResult<bool> {
        let mut session = self.begin("delete_game").await?;
        let outcome = self.delete_game_in(&mut session, id).await;
        Self::finish(session, "delete_game", outcome).await
    }

    async fn delete_game_in(&self, session: &mut ClientSession, id: Uuid) -> MongoResult<bool> {
        let deleted = self
            .games()
            .delete_one(doc_id(id))
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: GAMES,
                source,
            })?;
        if deleted.deleted_count == 0 {
            return Ok(false);
        }

        let by_game = doc! {"game_id": uuid_as_binary(id)};
        self.participants()
            .delete_many(by_game.clone())
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PARTICIPANTS,
                source,
            })?;
        self.scores()
            .delete_many(by_game)
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: SCORES,
                source,
            })?;
        Ok(true)
    }

    async fn list_participants(&self, game_id: Uuid) -> MongoResult<Vec<ParticipantEntity>> {
        let read_error = |source: MongoError| MongoDaoError::Read {
            collection: PARTICIPANTS,
            source,
        };
        let documents: Vec<ParticipantDocument> = self
            .participants()
            .find(doc! {"game_id": uuid_as_binary(game_id)})
            .sort(doc! {"seat_order": 1})
            .await
            .map_err(read_error)?
            .try_collect()
            .await
            .map_err(read_error)?;
        decode_all(documents)
    }

    async fn list_scores(&self, game_id: Uuid) -> MongoResult<Vec<ScoreEntity>> {
        let read_error = |source: MongoError| MongoDaoError::Read {
            collection: SCORES,
            source,
        };
        let documents: Vec<ScoreDocument> = self
            .scores()
            .find(doc! {"game_id": uuid_as_binary(game_id)})
            .sort(doc! {"round_number": 1})
            .await
            .map_err(read_error)?
            .try_collect()
            .await
            .map_err(read_error)?;
        decode_all(documents)
    }

    async fn record_round(
        &self,
        game_id: Uuid,
        submission: RoundSubmission,
    ) -> MongoResult<GameEntity> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut session = self.begin("record_round").await?;
            let outcome = self
                .record_round_in(&mut session, game_id, &submission)
                .await;
            match Self::finish(session, "record_round", outcome).await {
                Err(err) if err.is_transient() && attempt < MAX_TRANSACTION_ATTEMPTS => {
                    warn!(
                        %game_id,
                        attempt,
                        error = %err,
                        "round write conflicted with another transaction; retrying"
                    );
                }
                result => return result,
            }
        }
    }

    async fn record_round_in(
        &self,
        session: &mut ClientSession,
        game_id: Uuid,
        submission: &RoundSubmission,
    ) -> MongoResult<GameEntity> {
        // Touching the game document first makes concurrent writers on one game conflict.
        let document = self
            .games()
            .find_one_and_update(doc_id(game_id), doc! {"$inc": {"ledger_version": 1}})
            .return_document(ReturnDocument::After)
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: GAMES,
                source,
            })?;
        let Some(document) = document else {
            return Err(RuleViolation::GameNotFound(game_id).into());
        };
        let mut game = GameEntity::try_from(document)?;

        let by_game = doc! {"game_id": uuid_as_binary(game_id)};
        let cursor = self
            .participants()
            .find(by_game.clone())
            .sort(doc! {"seat_order": 1})
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PARTICIPANTS,
                source,
            })?;
        let participants: Vec<ParticipantEntity> =
            decode_all(Self::drain(session, PARTICIPANTS, cursor).await?)?;

        let cursor = self
            .scores()
            .find(by_game)
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: SCORES,
                source,
            })?;
        let recorded: Vec<ScoreEntity> = decode_all(Self::drain(session, SCORES, cursor).await?)?;

        let planned = ledger::plan_round(&game, &participants, &recorded, submission)?;

        for entry in planned.entries {
            self.scores()
                .insert_one(ScoreDocument::from(entry))
                .session(&mut *session)
                .await
                .map_err(|source| {
                    MongoDaoError::on_write(
                        SCORES,
                        RuleViolation::DuplicateRound(submission.round),
                        source,
                    )
                })?;
        }

        if planned.closes_game {
            self.games()
                .update_one(doc_id(game_id), doc! {"$set": {"is_active": false}})
                .session(&mut *session)
                .await
                .map_err(|source| MongoDaoError::Write {
                    collection: GAMES,
                    source,
                })?;
            game.is_active = false;
            info!(%game_id, "game finished");
        }
        Ok(game)
    }

    async fn ping(&self) -> MongoResult<()> {
        self.inner
            .database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }
}

impl ScoreStore for MongoScoreStore {
    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_player(player).await.map_err(Into::into) })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_player(id).await.map_err(Into::into) })
    }

    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_players().await.map_err(Into::into) })
    }

    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete_player(id).await.map_err(Into::into) })
    }

    fn participation_counts(&self) -> BoxFuture<'static, StorageResult<HashMap<Uuid, usize>>> {
        let store = self.clone();
        Box::pin(async move { store.participation_counts().await.map_err(Into::into) })
    }

    fn create_game(
        &self,
        game: GameEntity,
        participants: Vec<ParticipantEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .create_game(game, participants)
                .await
                .map_err(Into::into)
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn list_games(&self, filter: GameFilter) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games(filter).await.map_err(Into::into) })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn list_participants(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_participants(game_id).await.map_err(Into::into) })
    }

    fn list_scores(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_scores(game_id).await.map_err(Into::into) })
    }

    fn record_round(
        &self,
        game_id: Uuid,
        submission: RoundSubmission,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .record_round(game_id, submission)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
