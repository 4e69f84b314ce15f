//! Schema type definitions for command structure modeling.
//!
//! This module defines the normalized data model consumed by the parser and
//! the completion engine. The types serialize with [`serde`] so schemas can be
//! described declaratively in JSON or YAML; plugin references (completers,
//! activators, validators) are attached in code and skipped by serde.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::plugin::{Activator, Completer, Validator};

/// Separator used by [`OptionKind::List`] and [`OptionKind::Group`] options
/// when none is declared.
pub const DEFAULT_SEPARATOR: char = ',';

fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

/// Value arity of an option.
///
/// # Examples
///
/// ```
/// use cmdshell_core::OptionKind;
///
/// assert!(!OptionKind::Boolean.takes_value());
/// assert!(OptionKind::List.takes_value());
/// assert!(OptionKind::Property.is_repeatable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// Flag without a value (the default).
    #[default]
    Boolean,
    /// Exactly one value (`--name value` or `--name=value`).
    Normal,
    /// Several values split on the option's separator (`-v 1,2,3`).
    List,
    /// `key=value` pairs split on the option's separator.
    Group,
    /// `name=value` appended to the option name (`-Dname=value`).
    Property,
}

impl OptionKind {
    /// Returns `true` for every kind except [`OptionKind::Boolean`].
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::Boolean)
    }

    /// Kinds that may appear several times on one line.
    pub fn is_repeatable(self) -> bool {
        matches!(self, Self::List | Self::Group | Self::Property)
    }

    /// Kinds whose values are split on a separator.
    pub fn is_separated(self) -> bool {
        matches!(self, Self::List | Self::Group)
    }
}

/// Value type for options and arguments.
///
/// Drives populate-time conversion checks and the built-in completers used
/// when an option declares neither a completer nor default values.
///
/// # Examples
///
/// ```
/// use cmdshell_core::ValueType;
///
/// assert_eq!(ValueType::default(), ValueType::Any);
/// let choices = ValueType::Choice(vec!["json".into(), "yaml".into()]);
/// assert!(matches!(choices, ValueType::Choice(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// `true` or `false`.
    Bool,
    /// Free-form string.
    String,
    /// Integer or decimal number.
    Number,
    /// File path.
    File,
    /// Directory path.
    Directory,
    /// One of a fixed set of values.
    Choice(Vec<String>),
    /// Unknown/any type (the default).
    #[default]
    Any,
}

/// Schema for a command option.
///
/// An option has an optional short name (`-v`) and/or long name
/// (`--verbose`), stored without their leading dashes. Use the constructors
/// [`boolean`](OptionSpec::boolean), [`with_value`](OptionSpec::with_value),
/// [`list`](OptionSpec::list), [`group`](OptionSpec::group) and
/// [`property`](OptionSpec::property), then chain the builder methods.
///
/// # Examples
///
/// ```
/// use cmdshell_core::{OptionKind, OptionSpec, ValueType};
///
/// let verbose = OptionSpec::boolean(Some('v'), Some("verbose"))
///     .with_description("Enable verbose output");
/// assert_eq!(verbose.display_name(), "--verbose");
/// assert!(!verbose.takes_value());
///
/// let values = OptionSpec::list(Some('v'), Some("values"), ValueType::Number)
///     .with_separator(';');
/// assert_eq!(values.kind, OptionKind::List);
/// assert_eq!(values.separator, ';');
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Short name without the dash (e.g. `'v'`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Long name without the dashes (e.g. `"verbose"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    /// Value arity.
    #[serde(default)]
    pub kind: OptionKind,
    /// Type of the value(s).
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Must be given unless an `override_required` option is present.
    #[serde(default)]
    pub required: bool,
    /// Presence satisfies every requiredness check (e.g. `--help`).
    #[serde(default)]
    pub override_required: bool,
    /// Separator for list and group values.
    #[serde(default = "default_separator")]
    pub separator: char,
    /// Values used when the option is absent or given without a value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_values: Vec<String>,
    #[serde(skip)]
    pub completer: Option<Arc<dyn Completer>>,
    #[serde(skip)]
    pub activator: Option<Arc<dyn Activator>>,
    #[serde(skip)]
    pub validator: Option<Arc<dyn Validator>>,
}

impl OptionSpec {
    fn new(short: Option<char>, long: Option<&str>, kind: OptionKind, value_type: ValueType) -> Self {
        Self {
            short,
            long: long.map(String::from),
            kind,
            value_type,
            description: None,
            required: false,
            override_required: false,
            separator: DEFAULT_SEPARATOR,
            default_values: Vec::new(),
            completer: None,
            activator: None,
            validator: None,
        }
    }

    /// Creates a boolean option (no value).
    pub fn boolean(short: Option<char>, long: Option<&str>) -> Self {
        Self::new(short, long, OptionKind::Boolean, ValueType::Bool)
    }

    /// Creates an option taking exactly one value.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdshell_core::{OptionSpec, ValueType};
    ///
    /// let name = OptionSpec::with_value(Some('n'), Some("name"), ValueType::String);
    /// assert!(name.takes_value());
    /// assert!(name.matches_short('n'));
    /// assert!(name.matches_long("name"));
    /// ```
    pub fn with_value(short: Option<char>, long: Option<&str>, value_type: ValueType) -> Self {
        Self::new(short, long, OptionKind::Normal, value_type)
    }

    /// Creates a list option split on `,` unless another separator is set.
    pub fn list(short: Option<char>, long: Option<&str>, value_type: ValueType) -> Self {
        Self::new(short, long, OptionKind::List, value_type)
    }

    /// Creates a `key=value` map option split on `,` unless another separator
    /// is set.
    pub fn group(short: Option<char>, long: Option<&str>) -> Self {
        Self::new(short, long, OptionKind::Group, ValueType::String)
    }

    /// Creates a property option (`-Dname=value`).
    pub fn property(short: Option<char>, long: Option<&str>) -> Self {
        Self::new(short, long, OptionKind::Property, ValueType::String)
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Overrides the value type.
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Marks the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the option as satisfying all requiredness checks when present.
    pub fn override_required(mut self) -> Self {
        self.override_required = true;
        self
    }

    /// Sets the default values, replacing any previous ones.
    pub fn with_default<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the list/group separator.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.completer = Some(Arc::new(completer));
        self
    }

    pub fn with_activator(mut self, activator: impl Activator + 'static) -> Self {
        self.activator = Some(Arc::new(activator));
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Returns `true` if the option expects a value.
    pub fn takes_value(&self) -> bool {
        self.kind.takes_value()
    }

    /// Returns the name used on the command line, long form preferred.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdshell_core::OptionSpec;
    ///
    /// assert_eq!(OptionSpec::boolean(Some('v'), Some("verbose")).display_name(), "--verbose");
    /// assert_eq!(OptionSpec::boolean(Some('v'), None).display_name(), "-v");
    /// ```
    pub fn display_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => "--unknown".to_string(),
        }
    }

    /// Returns the key under which populated values are stored: the long
    /// name, or the short name when there is no long one.
    pub fn key(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => long.clone(),
            (None, Some(short)) => short.to_string(),
            (None, None) => String::new(),
        }
    }

    pub fn matches_short(&self, c: char) -> bool {
        self.short == Some(c)
    }

    pub fn matches_long(&self, name: &str) -> bool {
        self.long.as_deref() == Some(name)
    }

    /// Evaluates the activator, treating a missing activator as active.
    pub fn is_activated(&self, values: &crate::CommandValues) -> bool {
        self.activator
            .as_ref()
            .is_none_or(|activator| activator.is_activated(values))
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("short", &self.short)
            .field("long", &self.long)
            .field("kind", &self.kind)
            .field("value_type", &self.value_type)
            .field("required", &self.required)
            .field("override_required", &self.override_required)
            .field("separator", &self.separator)
            .field("default_values", &self.default_values)
            .field("completer", &self.completer.is_some())
            .field("activator", &self.activator.is_some())
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

/// Schema for the trailing positional values of a command.
///
/// # Examples
///
/// ```
/// use cmdshell_core::{ArgumentSpec, ValueType};
///
/// let files = ArgumentSpec::list("files", ValueType::File).required();
/// assert!(files.multiple);
/// assert!(files.required);
///
/// let target = ArgumentSpec::single("target", ValueType::String);
/// assert!(!target.multiple);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ArgumentSpec {
    /// Name used in help output and as the populated argument label.
    pub name: String,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Accepts any number of values instead of exactly one.
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_values: Vec<String>,
    #[serde(skip)]
    pub completer: Option<Arc<dyn Completer>>,
    #[serde(skip)]
    pub activator: Option<Arc<dyn Activator>>,
    #[serde(skip)]
    pub validator: Option<Arc<dyn Validator>>,
}

impl ArgumentSpec {
    fn new(name: &str, value_type: ValueType, multiple: bool) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            description: None,
            required: false,
            multiple,
            default_values: Vec::new(),
            completer: None,
            activator: None,
            validator: None,
        }
    }

    /// Creates an argument accepting a single value.
    pub fn single(name: &str, value_type: ValueType) -> Self {
        Self::new(name, value_type, false)
    }

    /// Creates an argument accepting any number of values.
    pub fn list(name: &str, value_type: ValueType) -> Self {
        Self::new(name, value_type, true)
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.completer = Some(Arc::new(completer));
        self
    }

    pub fn with_activator(mut self, activator: impl Activator + 'static) -> Self {
        self.activator = Some(Arc::new(activator));
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Evaluates the activator, treating a missing activator as active.
    pub fn is_activated(&self, values: &crate::CommandValues) -> bool {
        self.activator
            .as_ref()
            .is_none_or(|activator| activator.is_activated(values))
    }
}

impl fmt::Debug for ArgumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentSpec")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("required", &self.required)
            .field("multiple", &self.multiple)
            .field("default_values", &self.default_values)
            .field("completer", &self.completer.is_some())
            .field("activator", &self.activator.is_some())
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

/// Complete schema for a command.
///
/// A schema with children is a *group* (e.g. `git` with `commit`, `push`);
/// groups may still declare their own options such as `--help`.
///
/// # Examples
///
/// ```
/// use cmdshell_core::*;
///
/// let schema = CommandSchema::new("git")
///     .with_option(OptionSpec::boolean(Some('v'), Some("verbose")))
///     .with_child(
///         CommandSchema::new("commit")
///             .with_alias("ci")
///             .with_option(OptionSpec::with_value(Some('m'), Some("message"), ValueType::String)),
///     );
///
/// assert!(schema.is_group());
/// assert_eq!(schema.find_child("ci").unwrap().name, "commit");
/// assert!(schema.find_long("verbose").is_some());
/// assert!(schema.find_short('x').is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandSchema {
    /// Command name, unique within its scope.
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Options in declaration order.
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    /// Trailing positional values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<ArgumentSpec>,
    /// Child commands of a group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommandSchema>,
}

impl CommandSchema {
    /// Creates an empty schema with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Sets the argument, replacing any previous one.
    pub fn with_argument(mut self, argument: ArgumentSpec) -> Self {
        self.argument = Some(argument);
        self
    }

    pub fn with_child(mut self, child: CommandSchema) -> Self {
        self.children.push(child);
        self
    }

    /// Returns `true` if the schema has child commands.
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    /// Checks the name and the aliases.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Finds a child command by name or alias.
    pub fn find_child(&self, name: &str) -> Option<&CommandSchema> {
        self.children.iter().find(|c| c.matches_name(name))
    }

    /// Finds an option by its short name.
    pub fn find_short(&self, c: char) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.matches_short(c))
    }

    /// Finds an option by its exact long name.
    pub fn find_long(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.matches_long(name))
    }

    /// Finds an option by exact long name, falling back to the single long
    /// name starting with `prefix`.
    ///
    /// Returns `None` when the prefix is empty or ambiguous.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdshell_core::*;
    ///
    /// let schema = CommandSchema::new("ls")
    ///     .with_option(OptionSpec::boolean(None, Some("all")))
    ///     .with_option(OptionSpec::boolean(None, Some("almost-all")))
    ///     .with_option(OptionSpec::boolean(None, Some("color")));
    ///
    /// assert_eq!(schema.find_long_prefix("all").unwrap().display_name(), "--all");
    /// assert_eq!(schema.find_long_prefix("co").unwrap().display_name(), "--color");
    /// assert!(schema.find_long_prefix("al").is_none());
    /// ```
    pub fn find_long_prefix(&self, prefix: &str) -> Option<&OptionSpec> {
        if prefix.is_empty() {
            return None;
        }
        if let Some(exact) = self.find_long(prefix) {
            return Some(exact);
        }
        let mut matches = self
            .options
            .iter()
            .filter(|o| o.long.as_deref().is_some_and(|l| l.starts_with(prefix)));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Returns `true` if any option is required.
    pub fn has_required_options(&self) -> bool {
        self.options.iter().any(|o| o.required)
    }

    /// Gets all child command names.
    pub fn child_names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_spec_creation() {
        let option = OptionSpec::boolean(Some('v'), Some("verbose"))
            .with_description("Enable verbose output");

        assert_eq!(option.short, Some('v'));
        assert_eq!(option.long.as_deref(), Some("verbose"));
        assert!(!option.takes_value());
        assert_eq!(option.display_name(), "--verbose");
        assert_eq!(option.key(), "verbose");
    }

    #[test]
    fn test_short_only_option_key() {
        let option = OptionSpec::property(Some('D'), None);
        assert_eq!(option.key(), "D");
        assert_eq!(option.display_name(), "-D");
        assert_eq!(option.kind, OptionKind::Property);
    }

    #[test]
    fn test_default_values_builder() {
        let option = OptionSpec::with_value(None, Some("level"), ValueType::String)
            .with_default(["info"]);
        assert_eq!(option.default_values, vec!["info".to_string()]);
    }

    #[test]
    fn test_find_child_by_alias() {
        let schema = CommandSchema::new("git")
            .with_child(CommandSchema::new("commit").with_alias("ci"))
            .with_child(CommandSchema::new("push"));

        assert_eq!(schema.find_child("ci").map(|c| c.name.as_str()), Some("commit"));
        assert!(schema.find_child("pull").is_none());
        assert_eq!(schema.child_names(), vec!["commit", "push"]);
    }

    #[test]
    fn test_missing_activator_is_active() {
        let option = OptionSpec::boolean(Some('a'), None);
        assert!(option.is_activated(&crate::CommandValues::default()));
    }

    #[test]
    fn test_schema_deserializes_with_defaults() {
        let json = r#"{
            "name": "deploy",
            "options": [
                {"long": "env", "kind": "normal", "value_type": {"choice": ["dev", "prod"]}},
                {"short": "f", "long": "force"}
            ],
            "argument": {"name": "targets", "multiple": true}
        }"#;
        let schema: CommandSchema = serde_json::from_str(json).unwrap();

        assert_eq!(schema.options.len(), 2);
        assert_eq!(schema.options[0].kind, OptionKind::Normal);
        assert_eq!(schema.options[0].separator, DEFAULT_SEPARATOR);
        assert_eq!(schema.options[1].kind, OptionKind::Boolean);
        assert!(schema.argument.as_ref().unwrap().multiple);
        assert!(schema.options[0].completer.is_none());
    }
}
