use std::{convert::Infallible, sync::Arc};

use filters::{api_filters, Unauthorized};
use warp::{http::Method, http::StatusCode, reject::Rejection, Filter};

use crate::core::{db::RegistrationDb, settings::Settings};

pub mod filters;
pub mod handlers;

pub const DEFAULT_PORT: u16 = 3000;

async fn handle_rejection(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, msg) = if err.find::<Unauthorized>().is_some() {
        (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
    } else if let Some(err) = err.find::<warp::filters::body::BodyDeserializeError>() {
        log::error!("{}", err);
        (StatusCode::BAD_REQUEST, err.to_string())
    } else if let Some(err) = err.find::<warp::reject::MethodNotAllowed>() {
        log::error!("Method Not Allowed: {}", err);
        (StatusCode::METHOD_NOT_ALLOWED, err.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else {
        log::error!("Unhandled Rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&msg), code))
}

pub async fn run_http_server(
    db: Arc<RegistrationDb>,
    settings: Arc<Settings>,
) -> anyhow::Result<()> {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec![
            "User-Agent",
            "Sec-Fetch-Mode",
            "Referer",
            "Origin",
            "Content-Type",
            "Authorization",
            "Access-Control-Allow-Origin",
            "Access-Control-Request-Method",
            "Access-Control-Request-Headers",
            "Access-Control-Allow-Headers",
        ])
        .allow_methods(&[Method::GET, Method::POST, Method::OPTIONS]);

    let routes = api_filters(db, settings.clone()).recover(handle_rejection);

    warp::serve(routes.with(cors))
        .run(([0, 0, 0, 0], settings.web_port.unwrap_or(DEFAULT_PORT)))
        .await;

    Ok(())
}
