use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::error::Error;

use super::db::RegistrationDb;

/// Status every round and assignment starts in. Transitions happen outside
/// this service; the field is stored and echoed back as-is.
pub const STATUS_PENDING: &str = "pending";

/// A competition stage participants can be assigned to
#[derive(PartialEq, Eq, Debug, FromRow, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub created_at: i64,
}

/// Join-record placing one participant in one round
#[derive(PartialEq, Eq, Debug, FromRow, Clone, Serialize, Deserialize)]
pub struct ParticipantRound {
    pub id: i64,
    pub participant_id: i64,
    pub round_id: i64,
    pub status: String,
    pub created_at: i64,
}

pub async fn create_round(db: &RegistrationDb, name: &str) -> Result<Round, Error> {
    if name.trim().is_empty() {
        return Err(Error::Validation("Round name is required".to_string()));
    }
    db.insert_round(name, STATUS_PENDING).await
}

/// Places a participant in a round, verifying that both exist first.
pub async fn assign_participant(
    db: &RegistrationDb,
    round_id: i64,
    participant_id: i64,
) -> Result<ParticipantRound, Error> {
    db.get_participant(participant_id).await?;
    db.get_round(round_id).await?;
    db.insert_participant_round(participant_id, round_id, STATUS_PENDING)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_rounds_start_pending() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let round = create_round(&db, "Qualifiers").await.unwrap();
        assert_eq!(round.status, STATUS_PENDING);
        assert_eq!(round.name, "Qualifiers");
    }

    #[tokio::test]
    async fn round_name_is_required() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let err = create_round(&db, "  ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn assignment_requires_both_records() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let participant = db
            .insert_participant("Ada", "ada@example.com", None, None, "AAAAAAA1")
            .await
            .unwrap();
        let round = create_round(&db, "Qualifiers").await.unwrap();

        let err = assign_participant(&db, round.id, 999).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = assign_participant(&db, 999, participant.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let joined = assign_participant(&db, round.id, participant.id)
            .await
            .unwrap();
        assert_eq!(joined.participant_id, participant.id);
        assert_eq!(joined.round_id, round.id);
        assert_eq!(joined.status, STATUS_PENDING);
    }
}
