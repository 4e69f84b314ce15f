//! Core schema types and shared primitives for the cmdshell framework.
//!
//! This crate defines the normalized model every other layer consumes:
//!
//! - [`CommandSchema`]: a command with options, an optional positional
//!   argument and, for groups, child commands.
//! - [`OptionSpec`]: an option with short/long names, a value arity
//!   ([`OptionKind`]) and its plugins.
//! - [`ArgumentSpec`]: the trailing positional values of a command.
//! - [`Completer`], [`Activator`], [`Validator`]: single-method plugin
//!   traits attached to options and arguments.
//! - [`CommandValues`]: the populated command instance.
//! - [`CompletionCandidates`]: the candidate set handed to the edit buffer.
//! - [`CommandRegistry`]: name/alias lookup over shared schemas.
//! - [`SchemaPackage`]: declarative schema files in JSON or YAML.
//!
//! Validation ([`validate_schema`], [`validate_registry`]) catches structural
//! errors such as duplicate option names or malformed long names.
//!
//! # Example
//!
//! ```
//! use cmdshell_core::*;
//!
//! let schema = CommandSchema::new("deploy")
//!     .with_option(OptionSpec::boolean(Some('f'), Some("force")))
//!     .with_option(
//!         OptionSpec::with_value(Some('e'), Some("env"), ValueType::String)
//!             .with_default(["dev"]),
//!     )
//!     .with_argument(ArgumentSpec::list("targets", ValueType::String));
//!
//! assert!(validate_schema(&schema).is_empty());
//!
//! let mut registry = CommandRegistry::new();
//! registry.insert(schema);
//! assert_eq!(registry.get("deploy").unwrap().options.len(), 2);
//! ```

mod candidates;
mod package;
mod plugin;
mod registry;
mod types;
mod validate;
mod values;

pub use candidates::{Candidate, CompletionCandidates};
pub use package::{PackageError, Result, SCHEMA_CONTRACT_VERSION, SchemaPackage};
pub use plugin::{
    Activator, Completer, CompleterContext, ValidationError, Validator, ValidatorContext,
};
pub use registry::CommandRegistry;
pub use types::*;
pub use validate::{SchemaError, validate_registry, validate_schema};
pub use values::{CommandValues, OptionValue, ValueSource};
