//! Schema validation.
//!
//! Validates structural invariants of command schemas, catching errors such
//! as duplicate option names, malformed names and duplicate child commands
//! before they cause confusing parse results.
//!
//! # Examples
//!
//! ```
//! use cmdshell_core::*;
//!
//! let schema = CommandSchema::new("git")
//!     .with_option(OptionSpec::boolean(Some('v'), Some("verbose")));
//! assert!(validate_schema(&schema).is_empty());
//!
//! // Invalid: long name carrying its own dashes
//! let bad = CommandSchema::new("git")
//!     .with_option(OptionSpec::boolean(None, Some("--verbose")));
//! assert!(!validate_schema(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{CommandRegistry, CommandSchema, OptionSpec};

/// Structural schema errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Command name is empty, whitespace-only or contains whitespace.
    #[error("invalid command name: '{0}'")]
    InvalidCommandName(String),
    /// Short name is a dash or whitespace.
    #[error("invalid short option name: '{0}'")]
    InvalidShortName(char),
    /// Long name is empty, starts with a dash or contains `=`/whitespace.
    #[error("invalid long option name: '{0}'")]
    InvalidLongName(String),
    /// An option has neither a short nor a long name.
    #[error("option must define a short or long name")]
    MissingOptionName,
    /// Two options in the same schema share a name.
    #[error("duplicate option in '{command}': {name}")]
    DuplicateOption { command: String, name: String },
    /// List or group separator is whitespace.
    #[error("option {0} uses a whitespace separator")]
    InvalidSeparator(String),
    /// Two children of a group share a name or alias.
    #[error("duplicate child command in '{command}': {name}")]
    DuplicateChild { command: String, name: String },
}

/// Validates a schema and, recursively, its children.
///
/// Errors are reported per schema in declaration order; validation of a
/// schema stops at its first error.
pub fn validate_schema(schema: &CommandSchema) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    validate_into(schema, &mut errors);
    errors
}

/// Validates every schema of a registry.
pub fn validate_registry(registry: &CommandRegistry) -> Vec<SchemaError> {
    registry
        .schemas()
        .flat_map(|schema| validate_schema(schema))
        .collect()
}

fn validate_into(schema: &CommandSchema, errors: &mut Vec<SchemaError>) {
    let name = schema.name.as_str();
    if name.trim().is_empty() || name.contains(char::is_whitespace) {
        errors.push(SchemaError::InvalidCommandName(name.to_string()));
        return;
    }

    if let Err(err) = validate_options(name, &schema.options) {
        errors.push(err);
        return;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for child in &schema.children {
        for child_name in std::iter::once(&child.name).chain(&child.aliases) {
            if !seen.insert(child_name.as_str()) {
                errors.push(SchemaError::DuplicateChild {
                    command: name.to_string(),
                    name: child_name.clone(),
                });
                return;
            }
        }
    }

    for child in &schema.children {
        validate_into(child, errors);
    }
}

fn validate_options(command: &str, options: &[OptionSpec]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    let duplicate = |name: String| SchemaError::DuplicateOption {
        command: command.to_string(),
        name,
    };

    for option in options {
        if option.short.is_none() && option.long.is_none() {
            return Err(SchemaError::MissingOptionName);
        }

        if let Some(short) = option.short {
            if short == '-' || short == '=' || short.is_whitespace() {
                return Err(SchemaError::InvalidShortName(short));
            }
            if !seen.insert(format!("-{short}")) {
                return Err(duplicate(format!("-{short}")));
            }
        }

        if let Some(long) = &option.long {
            if long.is_empty()
                || long.starts_with('-')
                || long.contains('=')
                || long.contains(char::is_whitespace)
            {
                return Err(SchemaError::InvalidLongName(long.clone()));
            }
            if !seen.insert(format!("--{long}")) {
                return Err(duplicate(format!("--{long}")));
            }
        }

        if option.kind.is_separated() && option.separator.is_whitespace() {
            return Err(SchemaError::InvalidSeparator(option.display_name()));
        }
    }

    Ok(())
}
