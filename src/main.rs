use std::{fs::read_to_string, path::PathBuf, sync::Arc};

use clap::Parser;

use crate::core::{db::RegistrationDb, settings::Settings};

mod auth;
mod core;
mod error;
mod qr;
mod web;

#[derive(Parser, Debug)]
#[command(name = "RegDesk")]
#[command(version = "0.1")]
#[command(about = "An event registration and check-in service.", long_about = None)]
struct Args {
    /// Location of the JSON settings file.
    #[arg(short, long)]
    settings_file: PathBuf,

    /// Location of the registration database. Created if it does not exist.
    #[arg(short, long, default_value = "registration.db")]
    db_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings: Settings = serde_json::from_str(&read_to_string(&args.settings_file)?)?;
    let settings = Arc::new(settings);

    // No store, no service: a failed open here is fatal.
    let db = if args.db_file.exists() {
        log::info!("Loading database {}", args.db_file.display());
        RegistrationDb::load(&args.db_file).await?
    } else {
        log::info!("Creating database {}", args.db_file.display());
        RegistrationDb::init(&args.db_file).await?
    };
    let db = Arc::new(db);

    log::info!(
        "RegDesk initialized, serving on port {}",
        settings.web_port.unwrap_or(web::DEFAULT_PORT)
    );
    web::run_http_server(db, settings).await
}
