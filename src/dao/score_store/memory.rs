//! Process-local store keeping every record in arena tables behind one lock.
//!
//! Link records are keyed by their natural composite keys, so the uniqueness
//! constraints a relational schema would declare are enforced by the map keys
//! themselves. Holding the write lock for a whole operation gives each mutation
//! transactional isolation.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

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

/// In-memory [`ScoreStore`], used for local runs and tests.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    inner: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    players: HashMap<Uuid, PlayerEntity>,
    /// Unique index on the normalised player name.
    player_names: HashMap<String, Uuid>,
    /// Games with their insertion sequence, used to order games started at the same instant.
    games: HashMap<Uuid, (u64, GameEntity)>,
    next_sequence: u64,
    /// Unique per (game, player).
    participants: BTreeMap<(Uuid, Uuid), ParticipantEntity>,
    /// Unique per (game, round, player).
    scores: BTreeMap<(Uuid, u32, Uuid), ScoreEntity>,
}

impl Tables {
    fn participants_of(&self, game_id: Uuid) -> Vec<ParticipantEntity> {
        let mut seats: Vec<ParticipantEntity> = self
            .participants
            .range((game_id, Uuid::nil())..)
            .take_while(|((game, _), _)| *game == game_id)
            .map(|(_, seat)| *seat)
            .collect();
        seats.sort_by_key(|seat| seat.seat_order);
        seats
    }

    fn scores_of(&self, game_id: Uuid) -> Vec<ScoreEntity> {
        self.scores
            .range((game_id, 0, Uuid::nil())..)
            .take_while(|((game, _, _), _)| *game == game_id)
            .map(|(_, score)| *score)
            .collect()
    }

    fn insert_player(&mut self, player: PlayerEntity) -> StorageResult<()> {
        let key = player.name_key();
        if self.player_names.contains_key(&key) {
            return Err(RuleViolation::DuplicatePlayerName(player.name).into());
        }
        self.player_names.insert(key, player.id);
        self.players.insert(player.id, player);
        Ok(())
    }

    fn delete_player(&mut self, id: Uuid) -> StorageResult<()> {
        let Some(player) = self.players.get(&id) else {
            return Err(RuleViolation::PlayerNotFound(id).into());
        };
        if self.participants.values().any(|seat| seat.player_id == id) {
            return Err(RuleViolation::PlayerHasHistory(id).into());
        }
        let key = player.name_key();
        self.player_names.remove(&key);
        self.players.remove(&id);
        Ok(())
    }

    fn create_game(
        &mut self,
        game: GameEntity,
        participants: Vec<ParticipantEntity>,
    ) -> StorageResult<()> {
        let mut seats = BTreeMap::new();
        for seat in participants {
            if !self.players.contains_key(&seat.player_id) {
                return Err(RuleViolation::UnknownPlayer(seat.player_id).into());
            }
            if seats.insert((game.id, seat.player_id), seat).is_some() {
                return Err(RuleViolation::DuplicateParticipant(seat.player_id).into());
            }
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.games.insert(game.id, (sequence, game));
        self.participants.append(&mut seats);
        Ok(())
    }

    fn list_games(&self, filter: GameFilter) -> Vec<GameEntity> {
        let mut games: Vec<&(u64, GameEntity)> = self
            .games
            .values()
            .filter(|(_, game)| filter.matches(game))
            .collect();
        games.sort_by(|(seq_a, a), (seq_b, b)| {
            b.played_at
                .cmp(&a.played_at)
                .then_with(|| seq_b.cmp(seq_a))
        });

        games
            .into_iter()
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|(_, game)| game.clone())
            .collect()
    }

    fn delete_game(&mut self, id: Uuid) -> bool {
        if self.games.remove(&id).is_none() {
            return false;
        }
        self.participants.retain(|(game, _), _| *game != id);
        self.scores.retain(|(game, _, _), _| *game != id);
        true
    }

    fn record_round(
        &mut self,
        game_id: Uuid,
        submission: &RoundSubmission,
    ) -> StorageResult<GameEntity> {
        let Some((_, game)) = self.games.get(&game_id) else {
            return Err(RuleViolation::GameNotFound(game_id).into());
        };
        let mut game = game.clone();

        let participants = self.participants_of(game_id);
        let recorded = self.scores_of(game_id);
        let planned = ledger::plan_round(&game, &participants, &recorded, submission)?;

        for entry in &planned.entries {
            let key = (game_id, entry.round_number, entry.player_id);
            if self.scores.contains_key(&key) {
                return Err(RuleViolation::DuplicateRound(submission.round).into());
            }
        }
        for entry in planned.entries {
            self.scores
                .insert((game_id, entry.round_number, entry.player_id), entry);
        }

        if planned.closes_game {
            game.is_active = false;
            if let Some((_, stored)) = self.games.get_mut(&game_id) {
                stored.is_active = false;
            }
        }
        Ok(game)
    }
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.write().await.insert_player(player) })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.players.get(&id).cloned()) })
    }

    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.players.values().cloned().collect()) })
    }

    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.write().await.delete_player(id) })
    }

    fn participation_counts(&self) -> BoxFuture<'static, StorageResult<HashMap<Uuid, usize>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.read().await;
            let mut counts = HashMap::new();
            for seat in tables.participants.values() {
                *counts.entry(seat.player_id).or_insert(0) += 1;
            }
            Ok(counts)
        })
    }

    fn create_game(
        &self,
        game: GameEntity,
        participants: Vec<ParticipantEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.write().await.create_game(game, participants) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .games
                .get(&id)
                .map(|(_, game)| game.clone()))
        })
    }

    fn list_games(&self, filter: GameFilter) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.list_games(filter)) })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.delete_game(id)) })
    }

    fn list_participants(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.participants_of(game_id)) })
    }

    fn list_scores(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.scores_of(game_id)) })
    }

    fn record_round(
        &self,
        game_id: Uuid,
        submission: RoundSubmission,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.write().await.record_round(game_id, &submission) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::{dao::storage::StorageError, state::game::GameVariant};

    fn player(name: &str) -> PlayerEntity {
        PlayerEntity {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            created_at: SystemTime::now(),
        }
    }

    fn game(variant: GameVariant, target_score: Option<i64>) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            variant,
            target_score,
            going_out_bonus: None,
            is_active: true,
            played_at: SystemTime::now(),
        }
    }

    fn seats(game: &GameEntity, players: &[&PlayerEntity]) -> Vec<ParticipantEntity> {
        players
            .iter()
            .enumerate()
            .map(|(seat, player)| ParticipantEntity {
                game_id: game.id,
                player_id: player.id,
                seat_order: seat as u8,
            })
            .collect()
    }

    fn round(round: i64, points: &[(&PlayerEntity, i32)]) -> RoundSubmission {
        RoundSubmission {
            round,
            points: points.iter().map(|(p, pts)| (p.id, *pts)).collect(),
            went_out: HashMap::new(),
        }
    }

    fn rejection(err: StorageError) -> RuleViolation {
        match err {
            StorageError::Rejected(violation) => violation,
            other => panic!("expected a rule violation, got {other:?}"),
        }
    }

    async fn seeded(
        variant: GameVariant,
        target: Option<i64>,
    ) -> (MemoryScoreStore, GameEntity, PlayerEntity, PlayerEntity) {
        let store = MemoryScoreStore::new();
        let (ada, bo) = (player("Ada"), player("Bo"));
        store.insert_player(ada.clone()).await.unwrap();
        store.insert_player(bo.clone()).await.unwrap();
        let game = game(variant, target);
        store
            .create_game(game.clone(), seats(&game, &[&ada, &bo]))
            .await
            .unwrap();
        (store, game, ada, bo)
    }

    #[tokio::test]
    async fn player_names_are_unique_ignoring_case() {
        let store = MemoryScoreStore::new();
        store.insert_player(player("Ada")).await.unwrap();

        let err = store.insert_player(player("  aDA ")).await.unwrap_err();
        assert!(matches!(
            rejection(err),
            RuleViolation::DuplicatePlayerName(_)
        ));
        assert_eq!(store.list_players().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn game_creation_is_all_or_nothing() {
        let store = MemoryScoreStore::new();
        let ada = player("Ada");
        store.insert_player(ada.clone()).await.unwrap();
        let ghost = player("Ghost");

        let game = game(GameVariant::FiveCrowns, None);
        let err = store
            .create_game(game.clone(), seats(&game, &[&ada, &ghost]))
            .await
            .unwrap_err();

        assert_eq!(rejection(err), RuleViolation::UnknownPlayer(ghost.id));
        assert!(store.find_game(game.id).await.unwrap().is_none());
        assert!(store.list_participants(game.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seating_a_player_twice_is_rejected() {
        let store = MemoryScoreStore::new();
        let ada = player("Ada");
        store.insert_player(ada.clone()).await.unwrap();

        let game = game(GameVariant::GinRummy, Some(100));
        let mut twice = seats(&game, &[&ada, &ada]);
        twice[1].seat_order = 1;
        let err = store.create_game(game.clone(), twice).await.unwrap_err();

        assert_eq!(rejection(err), RuleViolation::DuplicateParticipant(ada.id));
        assert!(store.find_game(game.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recorded_rounds_are_listed_in_order() {
        let (store, game, ada, bo) = seeded(GameVariant::FiveCrowns, None).await;

        store
            .record_round(game.id, round(2, &[(&ada, 4), (&bo, 6)]))
            .await
            .unwrap();
        store
            .record_round(game.id, round(1, &[(&ada, 10), (&bo, 0)]))
            .await
            .unwrap();

        let rounds: Vec<u32> = store
            .list_scores(game.id)
            .await
            .unwrap()
            .iter()
            .map(|score| score.round_number)
            .collect();
        assert_eq!(rounds, vec![1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn rejected_round_leaves_ledger_untouched() {
        let (store, game, ada, bo) = seeded(GameVariant::FiveCrowns, None).await;
        store
            .record_round(game.id, round(1, &[(&ada, 10), (&bo, 0)]))
            .await
            .unwrap();
        let before = store.list_scores(game.id).await.unwrap();

        let err = store
            .record_round(game.id, round(2, &[(&ada, 5)]))
            .await
            .unwrap_err();
        assert_eq!(rejection(err), RuleViolation::IncompletePlayerSet);

        let err = store
            .record_round(game.id, round(1, &[(&ada, 1), (&bo, 1)]))
            .await
            .unwrap_err();
        assert_eq!(rejection(err), RuleViolation::DuplicateRound(1));

        assert_eq!(store.list_scores(game.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn concurrent_submissions_of_one_round_accept_exactly_one() {
        let (store, game, ada, bo) = seeded(GameVariant::GinRummy, Some(1_000)).await;
        let game_id = game.id;

        let tasks: Vec<_> = (0..8)
            .map(|attempt| {
                let store = store.clone();
                let submission = round(1, &[(&ada, attempt), (&bo, 0)]);
                tokio::spawn(async move { store.record_round(game_id, submission).await })
            })
            .collect();

        let mut accepted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert_eq!(rejection(err), RuleViolation::DuplicateRound(1)),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.list_scores(game.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reaching_target_closes_game_and_ledger() {
        let (store, game, ada, bo) = seeded(GameVariant::FiveHundredRum, Some(500)).await;

        let updated = store
            .record_round(game.id, round(1, &[(&ada, 300), (&bo, 120)]))
            .await
            .unwrap();
        assert!(updated.is_active);

        let updated = store
            .record_round(game.id, round(2, &[(&ada, 200), (&bo, 50)]))
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert!(!store.find_game(game.id).await.unwrap().unwrap().is_active);

        let err = store
            .record_round(game.id, round(3, &[(&ada, 1), (&bo, 1)]))
            .await
            .unwrap_err();
        assert_eq!(rejection(err), RuleViolation::GameInactive(game.id));
    }

    #[tokio::test]
    async fn unknown_game_is_reported() {
        let store = MemoryScoreStore::new();
        let id = Uuid::new_v4();
        let err = store
            .record_round(id, RoundSubmission::default())
            .await
            .unwrap_err();
        assert_eq!(rejection(err), RuleViolation::GameNotFound(id));
    }

    #[tokio::test]
    async fn players_with_history_cannot_be_deleted() {
        let (store, _game, ada, _bo) = seeded(GameVariant::FiveCrowns, None).await;
        let loner = player("Loner");
        store.insert_player(loner.clone()).await.unwrap();

        let err = store.delete_player(ada.id).await.unwrap_err();
        assert_eq!(rejection(err), RuleViolation::PlayerHasHistory(ada.id));
        assert!(store.find_player(ada.id).await.unwrap().is_some());

        store.delete_player(loner.id).await.unwrap();
        assert!(store.find_player(loner.id).await.unwrap().is_none());
        // The name is free again once the player is gone.
        store.insert_player(player("loner")).await.unwrap();

        let err = store.delete_player(loner.id).await.unwrap_err();
        assert_eq!(rejection(err), RuleViolation::PlayerNotFound(loner.id));
    }

    #[tokio::test]
    async fn games_are_listed_newest_first_with_filters() {
        let store = MemoryScoreStore::new();
        let (ada, bo) = (player("Ada"), player("Bo"));
        store.insert_player(ada.clone()).await.unwrap();
        store.insert_player(bo.clone()).await.unwrap();

        let base = SystemTime::now();
        let mut ids = Vec::new();
        for offset in 0..4u64 {
            let mut game = game(GameVariant::GinRummy, Some(100));
            game.played_at = base + Duration::from_secs(offset);
            game.is_active = offset % 2 == 0;
            store
                .create_game(game.clone(), seats(&game, &[&ada, &bo]))
                .await
                .unwrap();
            ids.push(game.id);
        }

        let all: Vec<Uuid> = store
            .list_games(GameFilter::default())
            .await
            .unwrap()
            .iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(all, vec![ids[3], ids[2], ids[1], ids[0]]);

        let active: Vec<Uuid> = store
            .list_games(GameFilter::recent(true, 1))
            .await
            .unwrap()
            .iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(active, vec![ids[2]]);

        let done = store.list_games(GameFilter::completed()).await.unwrap();
        assert_eq!(done.len(), 2);
        assert!(done.iter().all(|g| !g.is_active));
    }

    #[tokio::test]
    async fn deleting_a_game_cascades_to_its_records() {
        let (store, game, ada, bo) = seeded(GameVariant::FiveCrowns, None).await;
        store
            .record_round(game.id, round(1, &[(&ada, 3), (&bo, 9)]))
            .await
            .unwrap();

        assert!(store.delete_game(game.id).await.unwrap());
        assert!(!store.delete_game(game.id).await.unwrap());
        assert!(store.list_participants(game.id).await.unwrap().is_empty());
        assert!(store.list_scores(game.id).await.unwrap().is_empty());
        assert!(store.participation_counts().await.unwrap().is_empty());
        store.delete_player(ada.id).await.unwrap();
    }
}
