//! Populated command values.
//!
//! [`CommandValues`] is the command instance that parsed values are injected
//! into. It is meant to be reused across parses: every populate starts with a
//! [`reset`](CommandValues::reset), so values from a previous line never leak
//! into activator or completer decisions made against the current one.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

/// Where a populated value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Not given and no defaults.
    #[default]
    Unset,
    /// Taken from the declared default values.
    Default,
    /// Given on the command line.
    Line,
}

/// Values of a single option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptionValue {
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    pub source: ValueSource,
}

/// The populated state of one command invocation.
///
/// Options are keyed by their long name, or by their short name when they
/// have no long one (see [`OptionSpec::key`](crate::OptionSpec::key)).
///
/// # Examples
///
/// ```
/// use cmdshell_core::{CommandValues, ValueSource};
///
/// let mut values = CommandValues::default();
/// values.set_option("name", vec!["world".into()], ValueSource::Line);
/// values.set_argument(vec!["a.txt".into(), "b.txt".into()]);
///
/// assert_eq!(values.get("name"), Some("world"));
/// assert!(values.is_present("name"));
/// assert_eq!(values.argument().len(), 2);
///
/// values.reset();
/// assert_eq!(values.get("name"), None);
/// assert!(values.argument().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandValues {
    command: Vec<String>,
    options: BTreeMap<String, OptionValue>,
    argument: Vec<String>,
    argument_source: ValueSource,
}

impl CommandValues {
    /// Clears every option, the argument and the command path.
    pub fn reset(&mut self) {
        self.command.clear();
        self.options.clear();
        self.argument.clear();
        self.argument_source = ValueSource::Unset;
    }

    /// Sets the command path (e.g. `["git", "commit"]`).
    pub fn set_command_path(&mut self, path: Vec<String>) {
        self.command = path;
    }

    pub fn command_path(&self) -> &[String] {
        &self.command
    }

    /// Assigns plain values to an option.
    pub fn set_option(&mut self, key: &str, values: Vec<String>, source: ValueSource) {
        self.options.insert(
            key.to_string(),
            OptionValue {
                values,
                properties: BTreeMap::new(),
                source,
            },
        );
    }

    /// Assigns `key=value` properties to an option.
    pub fn set_properties(
        &mut self,
        key: &str,
        properties: BTreeMap<String, String>,
        source: ValueSource,
    ) {
        self.options.insert(
            key.to_string(),
            OptionValue {
                values: Vec::new(),
                properties,
                source,
            },
        );
    }

    /// Resets an option to its empty state.
    pub fn clear_option(&mut self, key: &str) {
        self.options.insert(key.to_string(), OptionValue::default());
    }

    pub fn set_argument(&mut self, values: Vec<String>) {
        self.set_argument_with_source(values, ValueSource::Line);
    }

    pub fn set_argument_with_source(&mut self, values: Vec<String>, source: ValueSource) {
        self.argument = values;
        self.argument_source = source;
    }

    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    /// First value of an option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options
            .get(key)
            .and_then(|o| o.values.first())
            .map(String::as_str)
    }

    /// All values of an option (empty when unset).
    pub fn get_all(&self, key: &str) -> &[String] {
        self.options
            .get(key)
            .map(|o| o.values.as_slice())
            .unwrap_or_default()
    }

    /// Parses the first value of an option.
    ///
    /// Returns `None` if the option is unset or the value does not parse.
    pub fn get_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Returns `true` if a boolean option holds `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    /// Returns `true` if the option was given on the command line.
    pub fn is_present(&self, key: &str) -> bool {
        self.options
            .get(key)
            .is_some_and(|o| o.source == ValueSource::Line)
    }

    pub fn properties(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        self.options.get(key).map(|o| &o.properties)
    }

    pub fn property(&self, key: &str, name: &str) -> Option<&str> {
        self.properties(key)
            .and_then(|p| p.get(name))
            .map(String::as_str)
    }

    pub fn argument(&self) -> &[String] {
        &self.argument
    }

    pub fn argument_source(&self) -> ValueSource {
        self.argument_source
    }

    /// Iterates over every option slot in key order.
    pub fn options(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }
}
