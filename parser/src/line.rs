//! The result of parsing one command line.
//!
//! A [`ParsedLine`] borrows the schema it was parsed against and records the
//! options and argument values found on the line. Option specs are compared
//! by identity, never by name, so two equally named specs in different
//! schemas are never confused.

use std::collections::BTreeMap;
use std::ptr;

use cmdshell_core::{ArgumentSpec, CommandSchema, OptionSpec};

use crate::ParseError;

/// An option occurrence on the line.
#[derive(Debug, Clone)]
pub struct ParsedOption<'s> {
    pub spec: &'s OptionSpec,
    /// Values in line order. Boolean options hold `"true"` once parsing
    /// finishes.
    pub values: Vec<String>,
    /// `key=value` pairs of group and property options.
    pub properties: BTreeMap<String, String>,
    /// The long form was used at least once.
    pub long_name_used: bool,
    /// The last list or group value ended with the separator.
    pub ends_with_separator: bool,
    /// The last value is the word under the cursor.
    pub cursor_value: bool,
}

impl<'s> ParsedOption<'s> {
    pub fn new(spec: &'s OptionSpec) -> Self {
        Self {
            spec,
            values: Vec::new(),
            properties: BTreeMap::new(),
            long_name_used: false,
            ends_with_separator: false,
            cursor_value: false,
        }
    }

    pub fn is(&self, spec: &OptionSpec) -> bool {
        ptr::eq(self.spec, spec)
    }

    pub fn has_value(&self) -> bool {
        !self.values.is_empty() || !self.properties.is_empty()
    }
}

/// Argument values on the line.
#[derive(Debug, Clone)]
pub struct ParsedArgument<'s> {
    pub spec: &'s ArgumentSpec,
    pub values: Vec<String>,
    pub cursor_value: bool,
}

impl<'s> ParsedArgument<'s> {
    pub fn new(spec: &'s ArgumentSpec) -> Self {
        Self {
            spec,
            values: Vec::new(),
            cursor_value: false,
        }
    }
}

/// What the last consumed word belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastTouched {
    /// Index into [`ParsedLine::options`].
    Option(usize),
    Argument,
}

/// A parsed command line.
#[derive(Debug, Clone)]
pub struct ParsedLine<'s> {
    /// Schema the options were matched against (the innermost child).
    pub schema: &'s CommandSchema,
    /// Names from the root command down to [`ParsedLine::schema`].
    pub command_path: Vec<String>,
    /// Options in order of first appearance.
    pub options: Vec<ParsedOption<'s>>,
    pub argument: Option<ParsedArgument<'s>>,
    pub error: Option<ParseError>,
    pub last_touched: Option<LastTouched>,
    /// Index of a value-bearing option still waiting for its value when the
    /// words ran out.
    pub awaiting_value: Option<usize>,
}

impl<'s> ParsedLine<'s> {
    pub fn new(schema: &'s CommandSchema, command_path: Vec<String>) -> Self {
        Self {
            schema,
            command_path,
            options: Vec::new(),
            argument: None,
            error: None,
            last_touched: None,
            awaiting_value: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Finds the occurrence of `spec`.
    pub fn find(&self, spec: &OptionSpec) -> Option<&ParsedOption<'s>> {
        self.options.iter().find(|o| o.is(spec))
    }

    pub fn contains(&self, spec: &OptionSpec) -> bool {
        self.find(spec).is_some()
    }

    /// Finds an occurrence by long name, or by short name for single-char
    /// names.
    pub fn find_by_name(&self, name: &str) -> Option<&ParsedOption<'s>> {
        let mut chars = name.chars();
        let short = match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        };
        self.options
            .iter()
            .find(|o| o.spec.matches_long(name) || short.is_some_and(|c| o.spec.matches_short(c)))
    }

    /// Returns `true` if an `override_required` option is present.
    pub fn has_override(&self) -> bool {
        self.options.iter().any(|o| o.spec.override_required)
    }

    /// Required options of the schema that are not on the line.
    pub fn missing_required(&self) -> impl Iterator<Item = &'s OptionSpec> + '_ {
        self.schema
            .options
            .iter()
            .filter(move |spec| spec.required && !self.contains(spec))
    }

    pub fn argument_values(&self) -> &[String] {
        self.argument
            .as_ref()
            .map(|a| a.values.as_slice())
            .unwrap_or_default()
    }

    /// The option touched by the last consumed word.
    pub fn last_option(&self) -> Option<&ParsedOption<'s>> {
        match self.last_touched {
            Some(LastTouched::Option(index)) => self.options.get(index),
            _ => None,
        }
    }
}
