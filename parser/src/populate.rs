//! Assigns a parsed line to a [`CommandValues`] instance.
//!
//! Every option slot of the schema ends up in one of three states: the values
//! given on the line, the declared defaults, or empty. The same instance is
//! reused across parses, so nothing from a previous line survives.
//!
//! With `validate` set, values are checked against their [`ValueType`] and
//! validators run after every slot has been assigned, so a validator can look
//! at any other option.

use cmdshell_core::{
    CommandValues, OptionKind, OptionSpec, ValidatorContext, ValueSource, ValueType, Validator,
};
use tracing::debug;

use crate::line::ParsedLine;
use crate::parser::default_properties;
use crate::{PopulateError, Result};

/// Assigns `parsed` to `values`.
///
/// # Errors
///
/// Returns the parser's terminal error if there is one, leaving `values`
/// reset. With `validate` set, returns the first conversion or validator
/// failure.
///
/// # Examples
///
/// ```
/// use cmdshell_core::*;
/// use cmdshell_parser::{parse_line, populate, ParseMode};
///
/// let schema = CommandSchema::new("cmd")
///     .with_option(OptionSpec::with_value(None, Some("level"), ValueType::Number).with_default(["1"]))
///     .with_option(OptionSpec::boolean(Some('q'), Some("quiet")));
///
/// let mut values = CommandValues::default();
/// let parsed = parse_line(&schema, "cmd -q", ParseMode::strict());
/// populate(&mut values, &parsed, true).unwrap();
///
/// assert!(values.flag("quiet"));
/// assert_eq!(values.get_as::<u32>("level"), Some(1));
/// assert_eq!(values.option("level").unwrap().source, ValueSource::Default);
/// ```
pub fn populate(values: &mut CommandValues, parsed: &ParsedLine<'_>, validate: bool) -> Result<()> {
    if let Some(error) = &parsed.error {
        values.reset();
        return Err(error.clone().into());
    }

    assign(values, parsed);

    if validate {
        check_types(values, parsed)?;
        run_validators(values, parsed)?;
    }
    debug!(command = ?parsed.command_path, "Populated command values");
    Ok(())
}

/// Assigns whatever the line holds, ignoring any parse error.
///
/// Completion uses this so activators and completers see the values typed
/// so far even on an incomplete line.
pub fn assign(values: &mut CommandValues, parsed: &ParsedLine<'_>) {
    values.reset();
    values.set_command_path(parsed.command_path.clone());

    for spec in &parsed.schema.options {
        let key = spec.key();
        let is_map = matches!(spec.kind, OptionKind::Group | OptionKind::Property);
        match parsed.find(spec) {
            Some(option) if is_map => {
                values.set_properties(&key, option.properties.clone(), ValueSource::Line);
            }
            Some(option) => values.set_option(&key, option.values.clone(), ValueSource::Line),
            None if spec.default_values.is_empty() => values.clear_option(&key),
            None if is_map => {
                values.set_properties(&key, default_properties(spec), ValueSource::Default);
            }
            None => values.set_option(&key, spec.default_values.clone(), ValueSource::Default),
        }
    }

    let given = parsed.argument_values();
    match &parsed.schema.argument {
        _ if !given.is_empty() => values.set_argument(given.to_vec()),
        Some(spec) if !spec.default_values.is_empty() => {
            values.set_argument_with_source(spec.default_values.clone(), ValueSource::Default);
        }
        _ => values.set_argument_with_source(Vec::new(), ValueSource::Unset),
    }
}

fn check_types(values: &CommandValues, parsed: &ParsedLine<'_>) -> Result<()> {
    for spec in &parsed.schema.options {
        let name = spec.display_name();
        for value in values.get_all(&spec.key()) {
            check_value(&name, &spec.value_type, value)?;
        }
    }
    if let Some(spec) = &parsed.schema.argument {
        for value in values.argument() {
            check_value(&spec.name, &spec.value_type, value)?;
        }
    }
    Ok(())
}

fn check_value(name: &str, value_type: &ValueType, value: &str) -> Result<()> {
    let expected = match value_type {
        ValueType::Number if value.parse::<f64>().is_err() => "a number".to_string(),
        ValueType::Bool if value != "true" && value != "false" => "true or false".to_string(),
        ValueType::Choice(choices) if !choices.iter().any(|c| c == value) => {
            format!("one of: {}", choices.join(", "))
        }
        _ => return Ok(()),
    };
    Err(PopulateError::Conversion {
        name: name.to_string(),
        value: value.to_string(),
        expected,
    })
}

fn run_validators(values: &CommandValues, parsed: &ParsedLine<'_>) -> Result<()> {
    for spec in &parsed.schema.options {
        let Some(validator) = &spec.validator else {
            continue;
        };
        let key = spec.key();
        if values.option(&key).is_none_or(|o| o.source == ValueSource::Unset) {
            continue;
        }
        let given = option_values(values, spec);
        validate_one(validator.as_ref(), &spec.display_name(), &given, values)?;
    }

    if let Some(spec) = &parsed.schema.argument {
        if let Some(validator) = &spec.validator {
            if values.argument_source() != ValueSource::Unset {
                validate_one(validator.as_ref(), &spec.name, values.argument(), values)?;
            }
        }
    }
    Ok(())
}

/// Plain values, or `key=value` entries for group and property options.
fn option_values(values: &CommandValues, spec: &OptionSpec) -> Vec<String> {
    let key = spec.key();
    match values.properties(&key) {
        Some(properties) if !properties.is_empty() => properties
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect(),
        _ => values.get_all(&key).to_vec(),
    }
}

fn validate_one(
    validator: &dyn Validator,
    name: &str,
    given: &[String],
    command: &CommandValues,
) -> Result<()> {
    let context = ValidatorContext {
        name,
        values: given,
        command,
    };
    validator
        .validate(&context)
        .map_err(|source| PopulateError::Validation {
            name: name.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParseError, ParseMode, parse_line};
    use cmdshell_core::{ArgumentSpec, CommandSchema, ValidationError};

    struct Positive;

    impl Validator for Positive {
        fn validate(&self, context: &ValidatorContext<'_>) -> std::result::Result<(), ValidationError> {
            match context.value().and_then(|v| v.parse::<i64>().ok()) {
                Some(n) if n > 0 => Ok(()),
                _ => Err(ValidationError::new("must be positive")),
            }
        }
    }

    fn schema() -> CommandSchema {
        CommandSchema::new("cmd")
            .with_option(OptionSpec::boolean(Some('b'), Some("bool")))
            .with_option(
                OptionSpec::with_value(Some('c'), Some("count"), ValueType::Number)
                    .with_validator(Positive),
            )
            .with_option(
                OptionSpec::with_value(None, Some("format"), ValueType::Choice(vec![
                    "json".into(),
                    "yaml".into(),
                ]))
                .with_default(["json"]),
            )
            .with_option(OptionSpec::group(Some('g'), Some("env")).with_default(["mode=dev"]))
            .with_argument(ArgumentSpec::list("files", ValueType::String).with_default(["-"]))
    }

    #[test]
    fn test_three_states() {
        let schema = schema();
        let mut values = CommandValues::default();
        let parsed = parse_line(&schema, "cmd -c 2", ParseMode::strict());
        populate(&mut values, &parsed, true).unwrap();

        assert_eq!(values.option("count").unwrap().source, ValueSource::Line);
        assert_eq!(values.get("format"), Some("json"));
        assert_eq!(values.option("format").unwrap().source, ValueSource::Default);
        assert_eq!(values.option("bool").unwrap().source, ValueSource::Unset);
        assert_eq!(values.property("env", "mode"), Some("dev"));
        assert_eq!(values.argument(), ["-"]);
        assert_eq!(values.argument_source(), ValueSource::Default);
    }

    #[test]
    fn test_reuse_does_not_leak() {
        let schema = schema();
        let mut values = CommandValues::default();

        let parsed = parse_line(&schema, "cmd -b -c 5 a b", ParseMode::strict());
        populate(&mut values, &parsed, true).unwrap();
        assert!(values.flag("bool"));

        let parsed = parse_line(&schema, "cmd", ParseMode::strict());
        populate(&mut values, &parsed, true).unwrap();
        assert!(!values.flag("bool"));
        assert_eq!(values.get("count"), None);
        assert_eq!(values.argument(), ["-"]);
    }

    #[test]
    fn test_parse_error_propagates() {
        let schema = schema();
        let mut values = CommandValues::default();
        values.set_option("bool", vec!["true".into()], ValueSource::Line);

        let parsed = parse_line(&schema, "cmd --nope", ParseMode::strict());
        let err = populate(&mut values, &parsed, true).unwrap_err();
        assert_eq!(err, PopulateError::Parse(ParseError::UnknownOption("--nope".into())));
        assert!(!values.flag("bool"));
    }

    #[test]
    fn test_conversion_errors() {
        let schema = schema();
        let mut values = CommandValues::default();

        let parsed = parse_line(&schema, "cmd -c many", ParseMode::strict());
        let err = populate(&mut values, &parsed, true).unwrap_err();
        assert!(matches!(err, PopulateError::Conversion { ref value, .. } if value == "many"));

        let parsed = parse_line(&schema, "cmd --format toml", ParseMode::strict());
        let err = populate(&mut values, &parsed, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'toml' for --format: expected one of: json, yaml"
        );

        // no checks without validate
        assert!(populate(&mut values, &parsed, false).is_ok());
    }

    #[test]
    fn test_validator_runs() {
        let schema = schema();
        let mut values = CommandValues::default();
        let parsed = parse_line(&schema, "cmd -c -3", ParseMode::strict());
        let err = populate(&mut values, &parsed, true).unwrap_err();
        assert_eq!(err.to_string(), "invalid --count: must be positive");
    }

    #[test]
    fn test_assign_tolerates_errors() {
        let schema = schema();
        let mut values = CommandValues::default();
        let parsed = parse_line(&schema, "cmd -b --nope", ParseMode::relaxed());
        assert!(!parsed.is_ok());

        assign(&mut values, &parsed);
        assert!(values.flag("bool"));
    }
}
