//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("traQ error: {0}")]
    Traq(#[from] traq_client::TraqError),

    #[error("Storage error: {0}")]
    Capsule(#[from] capsule_store::CapsuleError),

    #[error("Command registration error: {0}")]
    Registration(#[from] qourier_core::RegistrationError),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
