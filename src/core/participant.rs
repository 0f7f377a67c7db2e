use std::path::Path;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::error::Error;
use crate::qr::{self, QrPayload};

use super::{code, db::RegistrationDb};

/// A registered event participant
#[derive(PartialEq, Eq, Debug, FromRow, Clone, Serialize, Deserialize, Default)]
pub struct Participant {
    /// Unique participant ID, assigned by the store
    pub id: i64,

    /// The participant's display name
    pub name: String,

    /// Contact email, unique per participant
    pub email: String,

    /// Optional contact phone number
    pub phone: Option<String>,

    /// Optional affiliation (college/institution)
    pub college: Option<String>,

    /// The short public code used for lookup and scanning.
    /// Issued once at registration and never changed.
    pub code: String,

    /// Serving path of the stored QR artifact, attached after creation
    #[serde(skip)]
    pub qr_path: String,

    /// Registration time in unix seconds
    pub created_at: i64,
}

/// Json struct for a registration request
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub college: Option<String>,
}

/// Json struct for a scan request: either a raw code or the serialized
/// payload read out of a QR image.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ScanRequest {
    pub code: Option<String>,
    pub payload: Option<String>,
}

/// Registers a participant: validates the request, issues a unique code,
/// persists the record, and renders both QR forms. Returns the stored
/// participant along with the inline data URL.
pub async fn register(
    db: &RegistrationDb,
    artifact_dir: &Path,
    request: RegistrationRequest,
) -> Result<(Participant, String), Error> {
    if request.name.trim().is_empty() || request.email.trim().is_empty() {
        return Err(Error::Validation("Name and email are required".to_string()));
    }

    if db.find_participant_by_email(&request.email).await?.is_some() {
        return Err(Error::Conflict("Email already registered".to_string()));
    }

    let mut participant = loop {
        let issued = code::generate_unique_code(db).await?;
        match db
            .insert_participant(
                &request.name,
                &request.email,
                request.phone.as_deref(),
                request.college.as_deref(),
                &issued,
            )
            .await
        {
            Ok(participant) => break participant,
            // Lost the insert race on the code index; redraw and try again.
            Err(Error::CodeCollision) => {
                log::warn!("Code {} collided on insert, regenerating", issued);
            }
            Err(e) => return Err(e),
        }
    };
    log::info!(
        "Registered participant {} ({}) with code {}",
        participant.name,
        participant.id,
        participant.code
    );

    let payload = QrPayload::for_participant(&participant);
    let qr_data_url = qr::to_data_url(&payload)?;
    let qr_path = qr::to_file(&payload, artifact_dir)?;

    db.set_participant_qr_path(participant.id, &qr_path).await?;
    participant.qr_path = qr_path;

    Ok((participant, qr_data_url))
}

/// Resolves a scan to the stored participant. A directly supplied code is
/// used verbatim; otherwise the payload is parsed as JSON and its `code`
/// field extracted.
pub async fn resolve_scan(
    db: &RegistrationDb,
    request: ScanRequest,
) -> Result<Participant, Error> {
    let code = match (request.code, request.payload) {
        (Some(code), _) => code,
        (None, Some(payload)) => {
            let value: serde_json::Value = serde_json::from_str(&payload)
                .map_err(|_| Error::Validation("Invalid payload format".to_string()))?;
            value
                .get("code")
                .and_then(|c| c.as_str())
                .map(str::to_owned)
                .ok_or_else(|| Error::Validation("Invalid payload format".to_string()))?
        }
        (None, None) => {
            return Err(Error::Validation(
                "Either code or payload is required".to_string(),
            ))
        }
    };

    db.find_participant_by_code(&code).await
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::core::code::{CODE_ALPHABET, CODE_LENGTH};

    fn request(name: &str, email: &str) -> RegistrationRequest {
        RegistrationRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone: Some("5550100".to_string()),
            college: Some("State University".to_string()),
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("regdesk-reg-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn register_issues_code_and_artifacts() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let dir = temp_dir("issue");

        let (participant, qr_data_url) = register(&db, &dir, request("Ada", "ada@example.com"))
            .await
            .unwrap();

        assert_eq!(participant.code.len(), CODE_LENGTH);
        assert!(participant.code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert!(qr_data_url.starts_with("data:image/png;base64,"));
        assert_eq!(
            participant.qr_path,
            format!("/qrcodes/{}.png", participant.code)
        );
        assert!(dir.join(format!("{}.png", participant.code)).exists());

        // The attached path is persisted too.
        let stored = db.get_participant(participant.id).await.unwrap();
        assert_eq!(stored.qr_path, participant.qr_path);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let dir = temp_dir("missing");

        let err = register(&db, &dir, request("", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = register(&db, &dir, request("Ada", " ")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let dir = temp_dir("dup");

        register(&db, &dir, request("Ada", "ada@example.com"))
            .await
            .unwrap();
        let err = register(&db, &dir, request("Ada Again", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(db.get_participants().await.unwrap().len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn scan_prefers_direct_code() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let dir = temp_dir("direct");
        let (registered, _) = register(&db, &dir, request("Ada", "ada@example.com"))
            .await
            .unwrap();

        let found = resolve_scan(
            &db,
            ScanRequest {
                code: Some(registered.code.clone()),
                payload: Some("ignored".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(found.id, registered.id);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn scan_extracts_code_from_payload() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let dir = temp_dir("payload");
        let (registered, _) = register(&db, &dir, request("Ada", "ada@example.com"))
            .await
            .unwrap();

        let payload = serde_json::to_string(&QrPayload::for_participant(&registered)).unwrap();
        let found = resolve_scan(
            &db,
            ScanRequest {
                code: None,
                payload: Some(payload),
            },
        )
        .await
        .unwrap();
        assert_eq!(found.id, registered.id);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn scan_rejects_malformed_payload() {
        let db = RegistrationDb::init_in_memory().await.unwrap();

        let err = resolve_scan(
            &db,
            ScanRequest {
                code: None,
                payload: Some("not json".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Valid JSON but no usable code field.
        let err = resolve_scan(
            &db,
            ScanRequest {
                code: None,
                payload: Some("{\"id\": 3}".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn scan_requires_code_or_payload() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let err = resolve_scan(&db, ScanRequest::default()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn scan_of_unknown_code_is_not_found() {
        let db = RegistrationDb::init_in_memory().await.unwrap();
        let err = resolve_scan(
            &db,
            ScanRequest {
                code: Some("ZZZZZZZ9".to_string()),
                payload: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
