//! Command-syntax matching and dispatch for a traQ-style chat bot.
//!
//! The pipeline per incoming message: [`embed::scan`] recovers plain text
//! and embed spans, [`Router::dispatch`] decides between command
//! invocation and plain message, and a matched command's
//! [`SyntaxTemplate`] turns the raw option text into typed arguments for
//! its handler. Handler shapes are validated against templates once, at
//! [`Registry::register`] time.

pub mod command;
pub mod embed;
pub mod error;
pub mod router;
pub mod syntax;

pub use command::{Command, FromArg, IntoCommandHandler, Registry};
pub use embed::{scan, Embed};
pub use error::{CommandError, RegistrationError};
pub use router::{Dispatch, Router};
pub use syntax::{ArgKind, ArgValue, Specifier, SyntaxTemplate};
