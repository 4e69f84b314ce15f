//! Plugin traits attached to options and arguments.
//!
//! Each plugin is a single-method trait resolved when the schema is built:
//!
//! - [`Completer`] produces completion candidates for a value.
//! - [`Activator`] decides whether an option is currently eligible.
//! - [`Validator`] checks a populated value at execution time.
//!
//! Closures implement all three traits, which keeps small schemas terse:
//!
//! ```
//! use cmdshell_core::*;
//!
//! let option = OptionSpec::with_value(None, Some("tag"), ValueType::String)
//!     .with_activator(|values: &CommandValues| values.flag("release"));
//!
//! let mut values = CommandValues::default();
//! assert!(!option.is_activated(&values));
//! values.set_option("release", vec!["true".into()], ValueSource::Line);
//! assert!(option.is_activated(&values));
//! ```

use thiserror::Error;

use crate::CommandValues;

/// Produces completion candidates for an option or argument value.
pub trait Completer: Send + Sync {
    fn complete(&self, context: &mut CompleterContext<'_>);
}

impl<F> Completer for F
where
    F: Fn(&mut CompleterContext<'_>) + Send + Sync,
{
    fn complete(&self, context: &mut CompleterContext<'_>) {
        self(context)
    }
}

/// Decides whether an option is eligible given the values parsed so far.
pub trait Activator: Send + Sync {
    fn is_activated(&self, values: &CommandValues) -> bool;
}

impl<F> Activator for F
where
    F: Fn(&CommandValues) -> bool + Send + Sync,
{
    fn is_activated(&self, values: &CommandValues) -> bool {
        self(values)
    }
}

/// Checks a populated value. Only invoked at populate time, never during
/// completion.
pub trait Validator: Send + Sync {
    fn validate(&self, context: &ValidatorContext<'_>) -> Result<(), ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&ValidatorContext<'_>) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, context: &ValidatorContext<'_>) -> Result<(), ValidationError> {
        self(context)
    }
}

/// Failure reported by a [`Validator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// State handed to a [`Completer`].
///
/// The completer reads the partial value and the populated command values,
/// adds candidates, and may adjust how they are applied:
///
/// - [`set_offset`](Self::set_offset): candidates replace only the last `n`
///   bytes of the partial value instead of all of it.
/// - [`set_ignore_offset`](Self::set_ignore_offset): candidates are inserted
///   at the cursor without replacing anything.
/// - [`set_ignore_starts_with`](Self::set_ignore_starts_with): candidates are
///   kept even if they do not start with the partial value.
/// - [`set_append_separator`](Self::set_append_separator): controls whether
///   a single candidate is followed by a separator.
#[derive(Debug)]
pub struct CompleterContext<'a> {
    partial: &'a str,
    values: &'a CommandValues,
    candidates: Vec<String>,
    offset: Option<usize>,
    append_separator: bool,
    ignore_offset: bool,
    ignore_starts_with: bool,
}

impl<'a> CompleterContext<'a> {
    pub fn new(partial: &'a str, values: &'a CommandValues) -> Self {
        Self {
            partial,
            values,
            candidates: Vec::new(),
            offset: None,
            append_separator: true,
            ignore_offset: false,
            ignore_starts_with: false,
        }
    }

    /// The value typed so far, unescaped and unquoted.
    pub fn partial(&self) -> &'a str {
        self.partial
    }

    /// Values populated from the line being completed.
    pub fn values(&self) -> &'a CommandValues {
        self.values
    }

    pub fn add(&mut self, candidate: impl Into<String>) {
        self.candidates.push(candidate.into());
    }

    pub fn add_all<I, S>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates.extend(candidates.into_iter().map(Into::into));
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn take_candidates(&mut self) -> Vec<String> {
        std::mem::take(&mut self.candidates)
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = Some(offset);
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn set_append_separator(&mut self, append: bool) {
        self.append_separator = append;
    }

    pub fn append_separator(&self) -> bool {
        self.append_separator
    }

    pub fn set_ignore_offset(&mut self, ignore: bool) {
        self.ignore_offset = ignore;
    }

    pub fn ignore_offset(&self) -> bool {
        self.ignore_offset
    }

    pub fn set_ignore_starts_with(&mut self, ignore: bool) {
        self.ignore_starts_with = ignore;
    }

    pub fn ignore_starts_with(&self) -> bool {
        self.ignore_starts_with
    }
}

/// State handed to a [`Validator`].
#[derive(Debug, Clone, Copy)]
pub struct ValidatorContext<'a> {
    /// Display name of the option, or the argument name.
    pub name: &'a str,
    /// Values assigned to the option or argument.
    pub values: &'a [String],
    /// Every populated value of the command.
    pub command: &'a CommandValues,
}

impl ValidatorContext<'_> {
    /// First assigned value, if any.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}
