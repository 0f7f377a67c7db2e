use std::{convert::Infallible, sync::Arc};

use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::Reply;

use crate::{
    auth,
    core::{
        db::RegistrationDb,
        participant::{self, Participant, RegistrationRequest, ScanRequest},
        round,
        settings::Settings,
    },
    error::Error,
    qr::{self, QrPayload},
};

/// A Json struct for an admin login request
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

/// A Json struct carrying an issued bearer token
#[derive(Serialize, Deserialize, Debug)]
pub struct TokenReply {
    pub token: String,
}

/// A Json struct for a round creation request
#[derive(Serialize, Deserialize, Debug)]
pub struct NewRound {
    #[serde(default)]
    pub name: String,
}

/// A Json struct naming the participant to place in a round
#[derive(Serialize, Deserialize, Debug)]
pub struct AssignRequest {
    pub participant_id: Option<i64>,
}

/// A Json struct returned from a successful registration
#[derive(Serialize, Deserialize, Debug)]
pub struct RegistrationReply {
    pub participant: Participant,
    pub qr_data_url: String,
}

fn to_http_status<T: Serialize>(
    result: Result<T, Error>,
    ok: StatusCode,
) -> Result<impl warp::Reply, Infallible> {
    match result {
        Ok(data) => Ok(warp::reply::with_status(
            serde_json::to_string::<T>(&data).unwrap(),
            ok,
        )),
        Err(e) => {
            log::warn!("{}", e);
            Ok(warp::reply::with_status(e.to_string(), e.status()))
        }
    }
}

pub fn to_http_output<T: Serialize>(result: Result<T, Error>) -> Result<impl warp::Reply, Infallible> {
    to_http_status(result, StatusCode::OK)
}

pub fn to_http_created<T: Serialize>(
    result: Result<T, Error>,
) -> Result<impl warp::Reply, Infallible> {
    to_http_status(result, StatusCode::CREATED)
}

pub async fn register_participant(
    request: RegistrationRequest,
    db: Arc<RegistrationDb>,
    settings: Arc<Settings>,
) -> Result<impl warp::Reply, Infallible> {
    to_http_created(
        participant::register(&db, &settings.artifact_dir(), request)
            .await
            .map(|(participant, qr_data_url)| RegistrationReply {
                participant,
                qr_data_url,
            }),
    )
}

pub async fn get_participant(
    code: String,
    db: Arc<RegistrationDb>,
) -> Result<impl warp::Reply, Infallible> {
    to_http_output(db.find_participant_by_code(&code).await)
}

pub async fn scan_participant(
    request: ScanRequest,
    db: Arc<RegistrationDb>,
) -> Result<impl warp::Reply, Infallible> {
    to_http_output(participant::resolve_scan(&db, request).await)
}

/// Re-renders the artifact for a known code and serves the PNG bytes.
pub async fn serve_qr(
    code: String,
    db: Arc<RegistrationDb>,
    settings: Arc<Settings>,
) -> Result<warp::reply::Response, Infallible> {
    let dir = settings.artifact_dir();
    let result = async {
        let participant = db.find_participant_by_code(&code).await?;
        let payload = QrPayload::for_participant(&participant);
        qr::to_file(&payload, &dir)?;
        Ok::<Vec<u8>, Error>(std::fs::read(qr::artifact_path(&dir, &participant.code))?)
    }
    .await;

    match result {
        Ok(png) => Ok(warp::http::Response::builder()
            .status(StatusCode::OK)
            .header(warp::http::header::CONTENT_TYPE, "image/png")
            .body(png.into())
            .unwrap()),
        Err(e) => {
            log::warn!("{}", e);
            Ok(warp::reply::with_status(e.to_string(), e.status()).into_response())
        }
    }
}

pub async fn admin_login(
    request: LoginRequest,
    settings: Arc<Settings>,
) -> Result<impl warp::Reply, Infallible> {
    let result = if !request.password.is_empty() && request.password == settings.admin_password {
        auth::issue_admin_token(&settings.token_secret).map(|token| TokenReply { token })
    } else {
        log::warn!("Rejected admin login attempt");
        Err(Error::invalid_credentials())
    };
    to_http_output(result)
}

pub async fn list_participants(db: Arc<RegistrationDb>) -> Result<impl warp::Reply, Infallible> {
    to_http_output(db.get_participants().await)
}

pub async fn create_round(
    request: NewRound,
    db: Arc<RegistrationDb>,
) -> Result<impl warp::Reply, Infallible> {
    to_http_created(round::create_round(&db, &request.name).await)
}

pub async fn assign_to_round(
    round_id: i64,
    request: AssignRequest,
    db: Arc<RegistrationDb>,
) -> Result<impl warp::Reply, Infallible> {
    let result = match request.participant_id {
        Some(participant_id) => round::assign_participant(&db, round_id, participant_id).await,
        None => Err(Error::Validation("Participant ID is required".to_string())),
    };
    to_http_created(result)
}
