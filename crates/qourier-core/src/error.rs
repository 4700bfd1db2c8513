//! Core error types.

use thiserror::Error;

/// Failure while matching or running a single command invocation.
///
/// These are local to one message: they reach the failure callback and
/// never abort the process.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The option text ran out before every divider in the template was
    /// found.
    #[error("too few arguments")]
    ArgumentCount,

    /// A `%d` specifier matched text that does not parse as an integer.
    #[error("%d matched non-numeric text {text:?}")]
    ArgumentType {
        text: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// The handler itself failed.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

/// Handler/template shape mismatch, detected once at registration.
///
/// Typed parameters are numbered from 2; argument 1 is always the message.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("'{command}' does not have enough arguments for its template")]
    MissingParameter { command: String },

    #[error("'{command}' has more arguments than its template provides")]
    ExtraParameter { command: String },

    #[error("argument {index} of '{command}' must be {expected}")]
    ParameterType {
        command: String,
        index: usize,
        expected: &'static str,
    },
}
