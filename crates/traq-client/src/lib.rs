//! traQ REST API client.

mod client;
mod directory;
mod error;
mod receiver;
mod types;

pub use client::TraqClient;
pub use directory::{channel_paths, Directory, NameIndex};
pub use error::TraqError;
pub use receiver::MessageReceiver;
pub use types::*;
