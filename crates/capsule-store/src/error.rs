//! Capsule store errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CapsuleError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
