use std::{convert::Infallible, sync::Arc};

use warp::{reject::Rejection, Filter};

use crate::{
    auth,
    core::{db::RegistrationDb, settings::Settings},
};

use super::handlers::{
    admin_login, assign_to_round, create_round, get_participant, list_participants,
    register_participant, scan_participant, serve_qr,
};

/// Rejection raised by the admin guard; mapped to 401 at the boundary.
#[derive(Debug)]
pub struct Unauthorized;

impl warp::reject::Reject for Unauthorized {}

pub fn with_db(
    db: Arc<RegistrationDb>,
) -> impl Filter<Extract = (Arc<RegistrationDb>,), Error = Infallible> + Clone {
    warp::any().map(move || db.clone())
}

pub fn with_settings(
    settings: Arc<Settings>,
) -> impl Filter<Extract = (Arc<Settings>,), Error = Infallible> + Clone {
    warp::any().map(move || settings.clone())
}

/// Requires a valid admin bearer token on the request.
fn with_admin_auth(
    settings: Arc<Settings>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and_then(move |header: Option<String>| {
            let settings = settings.clone();
            async move {
                let verified = header
                    .as_deref()
                    .and_then(|h| h.strip_prefix("Bearer "))
                    .map(|token| auth::verify_admin_token(token, &settings.token_secret));
                match verified {
                    Some(Ok(_)) => Ok(()),
                    _ => Err(warp::reject::custom(Unauthorized)),
                }
            }
        })
        .untuple_one()
}

fn registration_filters(
    db: Arc<RegistrationDb>,
    settings: Arc<Settings>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let register = warp::path!("api" / "register")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and(with_settings(settings.clone()))
        .and_then(register_participant);

    let scan = warp::path!("api" / "register" / "scan")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(scan_participant);

    let qr_image = warp::path!("api" / "register" / "qr" / String)
        .and(warp::get())
        .and(with_db(db.clone()))
        .and(with_settings(settings))
        .and_then(serve_qr);

    let lookup = warp::path!("api" / "register" / String)
        .and(warp::get())
        .and(with_db(db))
        .and_then(get_participant);

    register.or(scan).or(qr_image).or(lookup)
}

fn admin_filters(
    db: Arc<RegistrationDb>,
    settings: Arc<Settings>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let login = warp::path!("api" / "admin" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_settings(settings.clone()))
        .and_then(admin_login);

    let participants = warp::path!("api" / "admin" / "participants")
        .and(warp::get())
        .and(with_admin_auth(settings.clone()))
        .and(with_db(db.clone()))
        .and_then(list_participants);

    let new_round = warp::path!("api" / "admin" / "rounds")
        .and(warp::post())
        .and(with_admin_auth(settings.clone()))
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(create_round);

    let assign = warp::path!("api" / "admin" / "rounds" / i64 / "assign")
        .and(warp::post())
        .and(with_admin_auth(settings))
        .and(warp::body::json())
        .and(with_db(db))
        .and_then(assign_to_round);

    login.or(participants).or(new_round).or(assign)
}

pub fn api_filters(
    db: Arc<RegistrationDb>,
    settings: Arc<Settings>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    // Stored artifacts are served straight out of the artifact directory.
    let artifacts = warp::path("qrcodes").and(warp::fs::dir(settings.artifact_dir()));

    registration_filters(db.clone(), settings.clone())
        .or(admin_filters(db, settings))
        .or(artifacts)
}
