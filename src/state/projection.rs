//! Read model of a single game, derived from its ledger.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, ParticipantEntity, ScoreEntity},
    state::{game::GameVariant, ledger, rules},
};

/// Participant with the display data needed by clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatedPlayer {
    /// Player identifier.
    pub player_id: Uuid,
    /// Player display name.
    pub name: String,
    /// Zero-based turn order.
    pub seat_order: u8,
}

/// Everything a client needs to render a game in progress or a finished one.
#[derive(Debug, Clone, PartialEq)]
pub struct GameProjection {
    /// The game record itself.
    pub game: GameEntity,
    /// Participants ordered by seat.
    pub players: Vec<SeatedPlayer>,
    /// Points per round, rounds ascending, players in seat order.
    pub rounds: BTreeMap<u32, IndexMap<Uuid, i32>>,
    /// Running totals in seat order.
    pub totals: IndexMap<Uuid, i64>,
    /// Next round to be played.
    pub current_round: u32,
    /// Wild rank of the current round (active Five Crowns games only).
    pub wild_card: Option<String>,
    /// Cards dealt in the current round (active Five Crowns games only).
    pub cards_dealt: Option<u32>,
}

/// Derive the state of `game` from its seats and recorded scores.
pub fn project_state(
    game: &GameEntity,
    mut players: Vec<SeatedPlayer>,
    scores: &[ScoreEntity],
) -> GameProjection {
    players.sort_by_key(|player| player.seat_order);

    let seat_of: IndexMap<Uuid, u8> = players
        .iter()
        .map(|player| (player.player_id, player.seat_order))
        .collect();

    let mut ordered = scores.to_vec();
    ordered.sort_by_key(|score| {
        (
            score.round_number,
            seat_of.get(&score.player_id).copied().unwrap_or(u8::MAX),
        )
    });

    let mut rounds: BTreeMap<u32, IndexMap<Uuid, i32>> = BTreeMap::new();
    for score in &ordered {
        rounds
            .entry(score.round_number)
            .or_default()
            .insert(score.player_id, score.points);
    }

    let participants: Vec<ParticipantEntity> = players
        .iter()
        .map(|player| ParticipantEntity {
            game_id: game.id,
            player_id: player.player_id,
            seat_order: player.seat_order,
        })
        .collect();
    let totals = ledger::totals_for_game(&participants, scores);

    let current_round = rounds
        .keys()
        .next_back()
        .map_or(1, |last| last.saturating_add(1));

    let (wild_card, cards_dealt) = match game.variant {
        GameVariant::FiveCrowns if game.is_active => (
            Some(
                rules::wild_card_for_round(current_round)
                    .unwrap_or_else(|| rules::UNKNOWN_WILD_CARD.to_owned()),
            ),
            Some(rules::cards_dealt(current_round)),
        ),
        _ => (None, None),
    };

    GameProjection {
        game: game.clone(),
        players,
        rounds,
        totals,
        current_round,
        wild_card,
        cards_dealt,
    }
}
