use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::types::time;

use crate::error::Error;

/// Admin tokens expire 24 hours after issue.
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub role: String,
    pub exp: usize,
}

/// Signs a 24h admin token with the configured shared secret.
pub fn issue_admin_token(secret: &str) -> Result<String, Error> {
    let exp = time::OffsetDateTime::now_utc().unix_timestamp() + TOKEN_LIFETIME_SECS;
    let claims = AdminClaims {
        role: ADMIN_ROLE.to_string(),
        exp: exp as usize,
    };
    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Checks a bearer token. Any failure, expired, tampered, wrong role,
/// collapses to the same invalid-token error.
pub fn verify_admin_token(token: &str, secret: &str) -> Result<AdminClaims, Error> {
    let data = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| Error::invalid_token())?;

    if data.claims.role != ADMIN_ROLE {
        return Err(Error::invalid_token());
    }
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let token = issue_admin_token("secret").unwrap();
        let claims = verify_admin_token(&token, "secret").unwrap();
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn token_expiry_is_24h_out() {
        let token = issue_admin_token("secret").unwrap();
        let claims = verify_admin_token(&token, "secret").unwrap();

        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let remaining = claims.exp as i64 - now;
        assert!(remaining > TOKEN_LIFETIME_SECS - 60);
        assert!(remaining <= TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_admin_token("secret").unwrap();
        let err = verify_admin_token(&token, "other-secret").unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let err = verify_admin_token("not-a-token", "secret").unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
