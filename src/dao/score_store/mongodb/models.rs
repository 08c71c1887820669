//! BSON documents stored in the score collections and their conversions.

use mongodb::bson::{Binary, DateTime, Document, doc, oid::ObjectId, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::{
    dao::models::{GameEntity, ParticipantEntity, PlayerEntity, ScoreEntity},
    state::game::GameVariant,
};

pub const PLAYERS: &str = "players";
pub const GAMES: &str = "games";
pub const PARTICIPANTS: &str = "participants";
pub const SCORES: &str = "scores";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDocument {
    #[serde(rename = "_id")]
    id: Binary,
    name: String,
    name_key: String,
    created_at: DateTime,
    /// Bumped when a seat is claimed or the player is deleted, so the two conflict.
    #[serde(default)]
    seat_version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDocument {
    #[serde(rename = "_id")]
    id: Binary,
    variant: GameVariant,
    target_score: Option<i64>,
    going_out_bonus: Option<i64>,
    is_active: bool,
    played_at: DateTime,
    /// Bumped by every round write so concurrent submissions conflict.
    #[serde(default)]
    ledger_version: i64,
    /// Generated at insertion; orders games sharing the same `played_at`.
    #[serde(default = "ObjectId::new")]
    inserted: ObjectId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDocument {
    game_id: Binary,
    player_id: Binary,
    seat_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDocument {
    game_id: Binary,
    player_id: Binary,
    round_number: i64,
    points: i32,
    went_out: bool,
}

impl From<PlayerEntity> for PlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: uuid_as_binary(value.id),
            name_key: value.name_key(),
            name: value.name,
            created_at: DateTime::from_system_time(value.created_at),
            seat_version: 0,
        }
    }
}

impl TryFrom<PlayerDocument> for PlayerEntity {
    type Error = MongoDaoError;

    fn try_from(value: PlayerDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: binary_as_uuid(PLAYERS, &value.id)?,
            name: value.name,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl From<GameEntity> for GameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: uuid_as_binary(value.id),
            variant: value.variant,
            target_score: value.target_score,
            going_out_bonus: value.going_out_bonus,
            is_active: value.is_active,
            played_at: DateTime::from_system_time(value.played_at),
            ledger_version: 0,
            inserted: ObjectId::new(),
        }
    }
}

impl TryFrom<GameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: GameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: binary_as_uuid(GAMES, &value.id)?,
            variant: value.variant,
            target_score: value.target_score,
            going_out_bonus: value.going_out_bonus,
            is_active: value.is_active,
            played_at: value.played_at.to_system_time(),
        })
    }
}

impl From<ParticipantEntity> for ParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            game_id: uuid_as_binary(value.game_id),
            player_id: uuid_as_binary(value.player_id),
            seat_order: i32::from(value.seat_order),
        }
    }
}

impl TryFrom<ParticipantDocument> for ParticipantEntity {
    type Error = MongoDaoError;

    fn try_from(value: ParticipantDocument) -> Result<Self, Self::Error> {
        let seat_order =
            u8::try_from(value.seat_order).map_err(|_| MongoDaoError::Corrupted {
                collection: PARTICIPANTS,
                message: format!("seat order {} out of range", value.seat_order),
            })?;
        Ok(Self {
            game_id: binary_as_uuid(PARTICIPANTS, &value.game_id)?,
            player_id: binary_as_uuid(PARTICIPANTS, &value.player_id)?,
            seat_order,
        })
    }
}

impl From<ScoreEntity> for ScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            game_id: uuid_as_binary(value.game_id),
            player_id: uuid_as_binary(value.player_id),
            round_number: i64::from(value.round_number),
            points: value.points,
            went_out: value.went_out,
        }
    }
}

impl TryFrom<ScoreDocument> for ScoreEntity {
    type Error = MongoDaoError;

    fn try_from(value: ScoreDocument) -> Result<Self, Self::Error> {
        let round_number =
            u32::try_from(value.round_number).map_err(|_| MongoDaoError::Corrupted {
                collection: SCORES,
                message: format!("round number {} out of range", value.round_number),
            })?;
        Ok(Self {
            game_id: binary_as_uuid(SCORES, &value.game_id)?,
            player_id: binary_as_uuid(SCORES, &value.player_id)?,
            round_number,
            points: value.points,
            went_out: value.went_out,
        })
    }
}

/// Convert every document of a result set, stopping at the first invalid one.
pub fn decode_all<D, E>(documents: Vec<D>) -> Result<Vec<E>, MongoDaoError>
where
    E: TryFrom<D, Error = MongoDaoError>,
{
    documents.into_iter().map(E::try_from).collect()
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

fn binary_as_uuid(collection: &'static str, binary: &Binary) -> Result<Uuid, MongoDaoError> {
    Uuid::from_slice(&binary.bytes).map_err(|err| MongoDaoError::Corrupted {
        collection,
        message: err.to_string(),
    })
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

/// Update touching a player document inside a transaction.
///
/// Seating a player and deleting it both apply this first, so overlapping
/// transactions hit a write conflict instead of both committing.
pub fn claim_player() -> Document {
    doc! {"$inc": {"seat_version": 1}}
}

/// Newest games first; insertion order breaks `played_at` ties.
pub fn recent_games_order() -> Document {
    doc! {"played_at": -1, "inserted": -1}
}
