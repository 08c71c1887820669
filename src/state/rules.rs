//! Variant-specific rules: wild cards, game-over detection, winner selection and
//! round-number validity.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, ScoreEntity},
    state::{
        game::{FIVE_CROWNS_ROUNDS, GameVariant, WinPolicy},
        ledger,
        violation::RuleViolation,
    },
};

/// Label used when a round has no wild card (never reached for rounds 1-11).
pub const UNKNOWN_WILD_CARD: &str = "Unknown";

/// Number of cards dealt to each player in a Five Crowns round.
pub fn cards_dealt(round: u32) -> u32 {
    round.saturating_add(2)
}

/// Rank that is wild in the given Five Crowns round.
///
/// Rounds deal from 3 up to 13 cards and the wild rank follows the dealt count: numeric
/// ranks up to 10, then Jack, Queen and King. Counts past 13 have no wild rank.
pub fn wild_card_for_round(round: u32) -> Option<String> {
    match cards_dealt(round) {
        dealt @ ..=10 => Some(dealt.to_string()),
        11 => Some("Jack".to_owned()),
        12 => Some("Queen".to_owned()),
        13 => Some("King".to_owned()),
        _ => None,
    }
}

/// Whether the recorded scores end the game.
///
/// Five Crowns ends once round 11 is on the books. Rum and gin end as soon as any
/// player's running total reaches the target; without a target they never end.
pub fn is_game_over(game: &GameEntity, scores: &[ScoreEntity]) -> bool {
    match game.variant {
        GameVariant::FiveCrowns => scores
            .iter()
            .any(|score| score.round_number >= FIVE_CROWNS_ROUNDS),
        GameVariant::FiveHundredRum | GameVariant::GinRummy => {
            let Some(target) = game.target_score else {
                return false;
            };
            ledger::sum_points(scores)
                .values()
                .any(|total| *total >= target)
        }
    }
}

/// Pick the winner among `totals` according to `policy`.
///
/// Ties go to the entry that comes first, which is the lowest seat when totals are in
/// seat order. Returns `None` for an empty table.
pub fn determine_winner(policy: WinPolicy, totals: &IndexMap<Uuid, i64>) -> Option<Uuid> {
    totals
        .iter()
        .fold(None, |best: Option<(Uuid, i64)>, (player_id, total)| match best {
            Some((_, leading)) if !policy.prefers(*total, leading) => best,
            _ => Some((*player_id, *total)),
        })
        .map(|(player_id, _)| player_id)
}

/// Check that `round` is a legal round number for `variant`.
pub fn validate_round_number(variant: GameVariant, round: i64) -> Result<u32, RuleViolation> {
    let max = variant.max_rounds();
    let out_of_range = || RuleViolation::InvalidRoundNumber { round, max };

    let round = u32::try_from(round).map_err(|_| out_of_range())?;
    if round == 0 {
        return Err(out_of_range());
    }
    match max {
        Some(max) if round > max => Err(out_of_range()),
        _ => Ok(round),
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

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

    fn score(game: &GameEntity, player_id: Uuid, round_number: u32, points: i32) -> ScoreEntity {
        ScoreEntity {
            game_id: game.id,
            player_id,
            round_number,
            points,
            went_out: false,
        }
    }

    #[test]
    fn wild_cards_follow_dealt_count() {
        assert_eq!(wild_card_for_round(1).as_deref(), Some("3"));
        assert_eq!(wild_card_for_round(8).as_deref(), Some("10"));
        assert_eq!(wild_card_for_round(9).as_deref(), Some("Jack"));
        assert_eq!(wild_card_for_round(10).as_deref(), Some("Queen"));
        assert_eq!(wild_card_for_round(11).as_deref(), Some("King"));
        assert_eq!(wild_card_for_round(12), None);
        assert_eq!(wild_card_for_round(u32::MAX), None);
    }

    #[test]
    fn cards_dealt_is_round_plus_two() {
        assert_eq!(cards_dealt(1), 3);
        assert_eq!(cards_dealt(11), 13);
    }

    #[test]
    fn five_crowns_ends_on_round_eleven() {
        let game = game(GameVariant::FiveCrowns, None);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let mut scores: Vec<ScoreEntity> = (1..=10)
            .flat_map(|round| [score(&game, a, round, 5), score(&game, b, round, 7)])
            .collect();
        assert!(!is_game_over(&game, &scores));

        scores.push(score(&game, a, 11, 0));
        scores.push(score(&game, b, 11, 3));
        assert!(is_game_over(&game, &scores));
    }

    #[test]
    fn rum_ends_when_target_reached() {
        let game = game(GameVariant::FiveHundredRum, Some(500));
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let mut scores = vec![score(&game, a, 1, 250), score(&game, b, 1, 100)];
        assert!(!is_game_over(&game, &scores));

        scores.push(score(&game, a, 2, 249));
        scores.push(score(&game, b, 2, 10));
        assert!(!is_game_over(&game, &scores));

        scores.push(score(&game, a, 3, 1));
        scores.push(score(&game, b, 3, 0));
        assert!(is_game_over(&game, &scores));
    }

    #[test]
    fn rum_without_target_never_ends() {
        let game = game(GameVariant::GinRummy, None);
        let scores = vec![score(&game, Uuid::new_v4(), 1, 10_000)];
        assert!(!is_game_over(&game, &scores));
    }

    #[test]
    fn winner_direction_depends_on_policy() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let totals = IndexMap::from([(a, 40), (b, 55), (c, 47)]);

        assert_eq!(determine_winner(WinPolicy::LowScoreWins, &totals), Some(a));
        assert_eq!(determine_winner(WinPolicy::HighScoreWins, &totals), Some(b));
    }

    #[test]
    fn winner_ties_go_to_first_seat() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let totals = IndexMap::from([(a, 30), (b, 30)]);

        assert_eq!(determine_winner(WinPolicy::LowScoreWins, &totals), Some(a));
        assert_eq!(determine_winner(WinPolicy::HighScoreWins, &totals), Some(a));
    }

    #[test]
    fn winner_of_empty_table_is_none() {
        assert_eq!(
            determine_winner(WinPolicy::HighScoreWins, &IndexMap::new()),
            None
        );
    }

    #[test]
    fn round_numbers_are_checked_per_variant() {
        assert_eq!(validate_round_number(GameVariant::FiveCrowns, 1), Ok(1));
        assert_eq!(validate_round_number(GameVariant::FiveCrowns, 11), Ok(11));
        assert_eq!(
            validate_round_number(GameVariant::FiveCrowns, 12),
            Err(RuleViolation::InvalidRoundNumber {
                round: 12,
                max: Some(11)
            })
        );
        assert_eq!(
            validate_round_number(GameVariant::GinRummy, 0),
            Err(RuleViolation::InvalidRoundNumber {
                round: 0,
                max: None
            })
        );
        assert!(validate_round_number(GameVariant::FiveHundredRum, -3).is_err());
        assert_eq!(
            validate_round_number(GameVariant::FiveHundredRum, 42),
            Ok(42)
        );
    }
}
