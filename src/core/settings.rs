use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Json struct for service settings
#[derive(Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Port the HTTP server binds to, 3000 if unset
    pub web_port: Option<u16>,

    /// Shared secret admins log in with
    pub admin_password: String,

    /// Signing secret for admin bearer tokens
    pub token_secret: String,

    /// Directory QR artifacts are written to, `qrcodes/` if unset
    pub qr_dir: Option<PathBuf>,
}

impl Settings {
    pub fn artifact_dir(&self) -> PathBuf {
        self.qr_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("qrcodes"))
    }
}
