//! Small JSON document persistence for bot configuration.

mod error;
mod store;

pub use error::CapsuleError;
pub use store::Capsule;
