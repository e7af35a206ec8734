use std::path::PathBuf;
use thiserror::Error;

/// A JSON config file could not be read, parsed, or written.
///
/// Aborts only the operation that triggered the load or save.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A call to the chat platform failed.
#[derive(Error, Debug)]
pub enum RemoteCallError {
    #[error("invalid {kind} id {value:?}")]
    InvalidId { kind: &'static str, value: String },

    #[error("invalid emoji {0:?}")]
    InvalidEmoji(String),

    #[error(transparent)]
    Discord(#[from] serenity::Error),

    /// Raised by in-memory gateways that do not talk to Discord.
    #[error("{0}")]
    Other(String),
}

/// Fatal errors raised before the gateway session is running.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("No token provided. Please set DISCORD_TOKEN environment variable.")]
    MissingToken,

    #[error("error creating Discord session: {0}")]
    Session(#[source] serenity::Error),
}
