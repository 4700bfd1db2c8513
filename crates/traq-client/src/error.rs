//! traQ client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraqError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid access token")]
    InvalidToken,
}
