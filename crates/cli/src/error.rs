//! Command error type.

use std::path::PathBuf;

use donation_desk_core::storage::StorageError;
use donation_desk_core::{EmailError, LedgerError, RoleParseError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Flat files could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The ledger refused the operation.
    #[error("{0}")]
    Ledger(#[from] LedgerError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid role.
    #[error("{0}")]
    InvalidRole(#[from] RoleParseError),

    /// The command only makes sense with persistence.
    #[error("This command needs a data directory (set DONATION_DATA_DIR or pass --data-dir)")]
    MissingDataDir,

    /// An input file could not be read.
    #[error("Could not read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A seed file is not valid YAML for the expected shape.
    #[error("Invalid seed file: {0}")]
    SeedFormat(#[from] serde_yaml::Error),

    /// A seed file parsed but contains records that cannot be loaded.
    #[error("{0} validation errors found in seed file")]
    InvalidSeed(usize),

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Terminal output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// The line editor failed.
    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// Input ended (Ctrl-D / Ctrl-C). The shell treats this as a normal exit.
    #[error("end of input")]
    EndOfInput,
}
