//! Parse and populate errors.

use cmdshell_core::ValidationError;
use thiserror::Error;

/// Terminal error of a parse. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Option name not declared by the command.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// Value-bearing option given without a value and without defaults.
    #[error("option {0} requires a value")]
    MissingValue(String),

    /// Value-bearing short option inside a group such as `-abc`.
    #[error("option {0} takes a value and cannot be grouped")]
    GroupedOptionNeedsValue(String),

    /// Property option not of the form `name=value`.
    #[error("option {0} expects name=value")]
    MalformedProperty(String),

    /// Positional value given to a command that declares no argument.
    #[error("argument given to a command that does not support it: {0}")]
    UnsupportedArgument(String),

    /// Second value for a single-valued argument.
    #[error("command '{command}' accepts one argument, got extra value '{value}'")]
    TooManyArguments { command: String, value: String },

    /// Required option absent and no override option present.
    #[error("option {0} is required")]
    MissingRequiredOption(String),

    /// Required argument absent and no override option present.
    #[error("argument '{0}' is required")]
    MissingRequiredArgument(String),
}

/// Errors raised while assigning a parsed line to [`CommandValues`].
///
/// [`CommandValues`]: cmdshell_core::CommandValues
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A value does not match the declared value type.
    #[error("invalid value '{value}' for {name}: expected {expected}")]
    Conversion {
        name: String,
        value: String,
        expected: String,
    },

    /// A validator rejected the populated value.
    #[error("invalid {name}: {source}")]
    Validation {
        name: String,
        #[source]
        source: ValidationError,
    },
}

/// Convenience alias for results with [`PopulateError`].
pub type Result<T> = std::result::Result<T, PopulateError>;
