//! Generated help text.

use std::fmt::Write;

use cmdshell_core::{CommandSchema, OptionKind, OptionSpec};

/// Renders usage, options, argument and child commands of a schema.
///
/// `path` is the command path printed in the usage line (e.g.
/// `["git", "commit"]`); when empty, the schema name is used.
///
/// # Examples
///
/// ```
/// use cmdshell_core::*;
/// use cmdshell_parser::render_help;
///
/// let schema = CommandSchema::new("greet")
///     .with_description("Print a greeting")
///     .with_option(OptionSpec::with_value(Some('n'), Some("name"), ValueType::String).required())
///     .with_argument(ArgumentSpec::list("words", ValueType::String));
///
/// let help = render_help(&schema, &[]);
/// assert!(help.starts_with("Usage: greet [OPTIONS] [words...]"));
/// assert!(help.contains("-n, --name <VALUE>"));
/// assert!(help.contains("(required)"));
/// ```
pub fn render_help(schema: &CommandSchema, path: &[String]) -> String {
    let mut out = String::new();
    let command = if path.is_empty() {
        schema.name.clone()
    } else {
        path.join(" ")
    };

    let _ = write!(out, "Usage: {command}");
    if schema.is_group() {
        out.push_str(" <COMMAND>");
    }
    if !schema.options.is_empty() {
        out.push_str(" [OPTIONS]");
    }
    if let Some(argument) = &schema.argument {
        let dots = if argument.multiple { "..." } else { "" };
        if argument.required {
            let _ = write!(out, " <{}{dots}>", argument.name);
        } else {
            let _ = write!(out, " [{}{dots}]", argument.name);
        }
    }
    out.push('\n');

    if let Some(description) = &schema.description {
        let _ = write!(out, "\n{description}\n");
    }

    if !schema.children.is_empty() {
        out.push_str("\nCommands:\n");
        let rows: Vec<(String, &str)> = schema
            .children
            .iter()
            .map(|c| (c.name.clone(), c.description.as_deref().unwrap_or_default()))
            .collect();
        write_rows(&mut out, &rows);
    }

    if !schema.options.is_empty() {
        out.push_str("\nOptions:\n");
        let rows: Vec<(String, String)> = schema
            .options
            .iter()
            .map(|o| (option_usage(o), option_description(o)))
            .collect();
        let rows: Vec<(String, &str)> = rows.iter().map(|(u, d)| (u.clone(), d.as_str())).collect();
        write_rows(&mut out, &rows);
    }

    if let Some(argument) = &schema.argument {
        if let Some(description) = &argument.description {
            out.push_str("\nArguments:\n");
            write_rows(&mut out, &[(argument.name.clone(), description.as_str())]);
        }
    }

    out
}

fn option_usage(option: &OptionSpec) -> String {
    let short = option.short.map(|c| format!("-{c}"));
    let long = option.long.as_ref().map(|l| format!("--{l}"));
    let names = match (short, long) {
        (Some(short), Some(long)) => format!("{short}, {long}"),
        (Some(name), None) => name,
        (None, Some(long)) => format!("    {long}"),
        (None, None) => String::new(),
    };
    let separator = option.separator;
    match option.kind {
        OptionKind::Boolean => names,
        OptionKind::Normal => format!("{names} <VALUE>"),
        OptionKind::List => format!("{names} <VALUE>[{separator}<VALUE>...]"),
        OptionKind::Group => format!("{names} <KEY=VALUE>[{separator}...]"),
        OptionKind::Property => format!("{names}<KEY>=<VALUE>"),
    }
}

fn option_description(option: &OptionSpec) -> String {
    let mut text = option.description.clone().unwrap_or_default();
    if !option.default_values.is_empty() {
        let _ = write!(text, " [default: {}]", option.default_values.join(","));
    }
    if option.required {
        text.push_str(" (required)");
    }
    text.trim_start().to_string()
}

fn write_rows(out: &mut String, rows: &[(String, &str)]) {
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, description) in rows {
        if description.is_empty() {
            let _ = writeln!(out, "  {name}");
        } else {
            let _ = writeln!(out, "  {name:width$}  {description}");
        }
    }
}
