use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use image::Luma;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};

use crate::core::participant::Participant;
use crate::error::Error;

/// The payload encoded into every participant credential. Fixed shape,
/// constructed at the boundary before any rendering happens.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QrPayload {
    pub id: i64,
    pub code: String,
    pub name: String,
}

impl QrPayload {
    pub fn for_participant(participant: &Participant) -> Self {
        QrPayload {
            id: participant.id,
            code: participant.code.clone(),
            name: participant.name.clone(),
        }
    }
}

fn payload_json(payload: &QrPayload) -> Result<String, Error> {
    serde_json::to_string(payload).map_err(|e| Error::Render(e.to_string()))
}

/// Renders the payload's JSON form as a QR PNG.
pub fn render_png(payload: &QrPayload) -> Result<Vec<u8>, Error> {
    let json = payload_json(payload)?;
    let code = QrCode::new(json.as_bytes()).map_err(|e| Error::Render(e.to_string()))?;

    let image = code.render::<Luma<u8>>().build();
    let mut png = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png);
    image::ImageEncoder::write_image(
        encoder,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::L8,
    )
    .map_err(|e| Error::Render(e.to_string()))?;

    Ok(png)
}

/// Inline transport form, returned directly from a registration response.
pub fn to_data_url(payload: &QrPayload) -> Result<String, Error> {
    let png = render_png(payload)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

/// File name of the stored artifact for a code.
pub fn artifact_file_name(code: &str) -> String {
    format!("{}.png", code)
}

/// Durable form: writes `<dir>/<code>.png`, creating the directory if
/// absent, and returns the path the file is served under. Re-rendering the
/// same code overwrites the previous file.
pub fn to_file(payload: &QrPayload, dir: &Path) -> Result<String, Error> {
    fs::create_dir_all(dir)?;

    let file_name = artifact_file_name(&payload.code);
    fs::write(dir.join(&file_name), render_png(payload)?)?;
    Ok(format!("/qrcodes/{}", file_name))
}

/// Location of the stored artifact for a code.
pub fn artifact_path(dir: &Path, code: &str) -> PathBuf {
    dir.join(artifact_file_name(code))
}
