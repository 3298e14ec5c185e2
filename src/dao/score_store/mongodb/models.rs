use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{MatchScoreEntity, SetRecordEntity};
use crate::score::engine::{MatchStatus, Team};

/// BSON document persisted in the `match_scores` collection.
///
/// Counters are widened to `i64` because BSON has no unsigned integers; the
/// `version` filter in the compare-and-commit path relies on this exact
/// representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    status: MatchStatus,
    team_a_points: i64,
    team_b_points: i64,
    team_a_sets: i64,
    team_b_sets: i64,
    current_set: i64,
    sets_history: Vec<MongoSetRecord>,
    winner: Option<Team>,
    version: i64,
    started_at: Option<DateTime>,
    finished_at: Option<DateTime>,
}

/// Embedded document for one finalized set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSetRecord {
    set_number: i64,
    team_a_points: i64,
    team_b_points: i64,
    winner: Team,
}

impl From<SetRecordEntity> for MongoSetRecord {
    fn from(value: SetRecordEntity) -> Self {
        Self {
            set_number: i64::from(value.set_number),
            team_a_points: i64::from(value.team_a_points),
            team_b_points: i64::from(value.team_b_points),
            winner: value.winner,
        }
    }
}

impl From<MongoSetRecord> for SetRecordEntity {
    fn from(value: MongoSetRecord) -> Self {
        Self {
            set_number: clamp_u32(value.set_number),
            team_a_points: clamp_u32(value.team_a_points),
            team_b_points: clamp_u32(value.team_b_points),
            winner: value.winner,
        }
    }
}

impl From<MatchScoreEntity> for MongoScoreDocument {
    fn from(value: MatchScoreEntity) -> Self {
        Self {
            id: value.match_id,
            status: value.status,
            team_a_points: i64::from(value.team_a_points),
            team_b_points: i64::from(value.team_b_points),
            team_a_sets: i64::from(value.team_a_sets),
            team_b_sets: i64::from(value.team_b_sets),
            current_set: i64::from(value.current_set),
            sets_history: value.sets_history.into_iter().map(Into::into).collect(),
            winner: value.winner,
            version: version_to_bson(value.version),
            started_at: value.started_at.map(DateTime::from_system_time),
            finished_at: value.finished_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoScoreDocument> for MatchScoreEntity {
    fn from(value: MongoScoreDocument) -> Self {
        Self {
            match_id: value.id,
            status: value.status,
            team_a_points: clamp_u32(value.team_a_points),
            team_b_points: clamp_u32(value.team_b_points),
            team_a_sets: clamp_u32(value.team_a_sets),
            team_b_sets: clamp_u32(value.team_b_sets),
            current_set: clamp_u32(value.current_set),
            sets_history: value.sets_history.into_iter().map(Into::into).collect(),
            winner: value.winner,
            version: value.version.max(0) as u64,
            started_at: value.started_at.map(DateTime::to_system_time),
            finished_at: value.finished_at.map(DateTime::to_system_time),
        }
    }
}

/// Version as stored in BSON; values beyond `i64::MAX` cannot occur in
/// practice since versions start at 0 and grow by 1 per commit.
pub fn version_to_bson(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

/// Filter selecting one score row by match id.
pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

/// Filter selecting one score row only while it still carries
/// `expected_version`; the heart of the optimistic-concurrency gate.
pub fn doc_id_at_version(id: Uuid, expected_version: u64) -> Document {
    doc! {"_id": uuid_as_binary(id), "version": version_to_bson(expected_version)}
}
