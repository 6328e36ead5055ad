//! Error types for the terminal front end.

use openanimal_client::ConfigError;

/// Errors that stop the binary from starting or reject a typed command.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The typed line is not a known command.
    #[error("unknown command: {0} (try `help`)")]
    UnknownCommand(String),

    /// A known command with bad arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
}
