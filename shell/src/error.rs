//! Console error types.

use cmdshell_core::SchemaError;
use cmdshell_parser::PopulateError;
use thiserror::Error;

use crate::command::CommandError;

/// Errors raised while registering, completing or executing commands.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The first word of a segment names no registered command.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// A schema failed structural validation at registration.
    #[error("invalid schema for '{command}': {source}")]
    InvalidSchema {
        command: String,
        #[source]
        source: SchemaError,
    },

    /// The line did not parse, or a value failed conversion or validation.
    #[error("{source}")]
    Populate {
        command: String,
        #[source]
        source: PopulateError,
    },

    /// The command itself reported an error.
    #[error("{source}")]
    Command {
        command: String,
        #[source]
        source: CommandError,
    },

    /// Redirection or output failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Misplaced control operator or unterminated quote.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A control operator with no command on one side.
    #[error("syntax error: empty command")]
    EmptyPipeline,

    /// The executor worker is gone.
    #[error("executor has stopped")]
    ExecutorStopped,
}

/// Convenience alias for results with [`ConsoleError`].
pub type Result<T> = std::result::Result<T, ConsoleError>;
