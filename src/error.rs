use warp::http::StatusCode;

/// Service-wide error type.
///
/// Every error that can escape a request handler is one of these variants,
/// and each variant has a fixed HTTP status. Auth failures deliberately
/// carry no detail beyond their display message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed client input
    #[error("{0}")]
    Validation(String),

    /// A unique field (email) is already taken
    #[error("{0}")]
    Conflict(String),

    /// Unknown code or record ID
    #[error("{0}")]
    NotFound(String),

    /// An insert lost the race on the code's unique index.
    /// Never surfaced to clients; registration regenerates the code instead.
    #[error("Issued code is already in use")]
    CodeCollision,

    /// Bad password or bearer token
    #[error("{0}")]
    Auth(&'static str),

    /// QR encoding or artifact write failure
    #[error("Failed to render QR artifact: {0}")]
    Render(String),

    /// Token signing failure; verification failures map to [`Error::Auth`]
    #[error("Failed to issue token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_credentials() -> Self {
        Error::Auth("Invalid credentials")
    }

    pub fn invalid_token() -> Self {
        Error::Auth("Invalid token")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::CodeCollision
            | Error::Render(_)
            | Error::Token(_)
            | Error::Database(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
