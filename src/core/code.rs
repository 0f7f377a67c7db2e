use rand::Rng;

use crate::error::Error;

use super::db::RegistrationDb;

/// The 62 symbols a participant code is drawn from.
pub const CODE_ALPHABET: &[u8] = b"1234567890abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of every issued code.
pub const CODE_LENGTH: usize = 8;

/// Draws a single random code. Makes no uniqueness guarantee on its own.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Draws codes until one matches no persisted participant.
///
/// The check is advisory: two concurrent issuances can both pass it before
/// either inserts. The unique index on `participants.code` is the
/// authoritative guard, and inserts that trip it regenerate via
/// [`Error::CodeCollision`].
pub async fn generate_unique_code(db: &RegistrationDb) -> Result<String, Error> {
    loop {
        let code = generate_code();
        if !db.code_exists(&code).await? {
            return Ok(code);
        }
        log::debug!("Code {} already issued, redrawing", code);
    }
}
