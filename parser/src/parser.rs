//! Command-line parser.
//!
//! Turns the words of one command into a fresh [`ParsedLine`]. The schema is
//! only read; every piece of per-line state lives in the returned value.
//!
//! Two modes exist. [`ParseMode::strict`] is used before execution: a
//! value-bearing option without a value fails unless it has defaults, and
//! required options and arguments are enforced. [`ParseMode::relaxed`] and
//! [`ParseMode::completion`] tolerate incomplete lines so completion can see
//! everything typed so far.
//!
//! # Examples
//!
//! ```
//! use cmdshell_core::*;
//! use cmdshell_parser::{parse_line, ParseMode};
//!
//! let schema = CommandSchema::new("cmd")
//!     .with_option(OptionSpec::boolean(Some('b'), Some("bool")))
//!     .with_option(OptionSpec::list(Some('v'), Some("values"), ValueType::Number));
//!
//! let parsed = parse_line(&schema, "cmd -b -v 1,2,3", ParseMode::strict());
//! assert!(parsed.is_ok());
//! assert_eq!(parsed.find_by_name("values").unwrap().values, ["1", "2", "3"]);
//! assert_eq!(parsed.find_by_name("bool").unwrap().values, ["true"]);
//! ```

use std::collections::BTreeMap;

use cmdshell_core::{CommandSchema, OptionKind, OptionSpec};
use tracing::debug;

use crate::line::{LastTouched, ParsedArgument, ParsedLine, ParsedOption};
use crate::tokenizer::{self, Word};
use crate::ParseError;

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseMode {
    /// Skip missing-value and requiredness checks.
    pub ignore_requirements: bool,
    /// The last word is still being typed.
    pub last_word_open: bool,
}

impl ParseMode {
    /// Full checks, used before execution.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Incomplete lines are accepted.
    pub fn relaxed() -> Self {
        Self {
            ignore_requirements: true,
            last_word_open: false,
        }
    }

    /// Relaxed parsing of a line whose last word may be under the cursor.
    pub fn completion(last_word_open: bool) -> Self {
        Self {
            ignore_requirements: true,
            last_word_open,
        }
    }
}

/// Descends from `schema` into child commands named by the leading words.
///
/// `words[0]` names `schema` itself. A child is entered when the next word is
/// not option-like, names a child, and is not the word still being typed.
/// Returns the innermost schema, the command path and the number of words
/// consumed beyond `words[0]`.
pub fn resolve_child<'s>(
    schema: &'s CommandSchema,
    words: &[Word],
    last_word_open: bool,
) -> (&'s CommandSchema, Vec<String>, usize) {
    let mut current = schema;
    let mut path = vec![schema.name.clone()];
    let mut depth = 0;

    while current.is_group() {
        let Some(next) = words.get(depth + 1) else {
            break;
        };
        let is_open = last_word_open && depth + 2 == words.len();
        if is_open || next.is_option_like() {
            break;
        }
        match current.find_child(&next.text) {
            Some(child) => {
                current = child;
                path.push(child.name.clone());
                depth += 1;
            }
            None => break,
        }
    }

    (current, path, depth)
}

/// Parses pre-tokenized words. `words[0]` is the command name.
pub fn parse<'s>(schema: &'s CommandSchema, words: &[Word], mode: ParseMode) -> ParsedLine<'s> {
    let (schema, path, depth) = resolve_child(schema, words, mode.last_word_open);
    let rest = words.get(depth + 1..).unwrap_or_default();

    let mut parser = LineParser {
        line: ParsedLine::new(schema, path),
        mode,
        pending: None,
    };
    parser.scan(rest);
    parser.finish()
}

/// Tokenizes the whole line (operators disabled) and parses it.
pub fn parse_line<'s>(schema: &'s CommandSchema, line: &str, mode: ParseMode) -> ParsedLine<'s> {
    let tokens = tokenizer::Tokenizer { operators: false }.tokenize(line);
    let words: Vec<Word> = tokens.words().cloned().collect();
    parse(schema, &words, mode)
}

struct LineParser<'s> {
    line: ParsedLine<'s>,
    mode: ParseMode,
    /// Option waiting for a value in the next word.
    pending: Option<usize>,
}

impl<'s> LineParser<'s> {
    fn schema(&self) -> &'s CommandSchema {
        self.line.schema
    }

    fn fail(&mut self, error: ParseError) {
        if self.line.error.is_none() {
            debug!(command = %self.line.schema.name, error = %error, "Parse stopped");
            self.line.error = Some(error);
        }
    }

    fn scan(&mut self, words: &[Word]) {
        for (index, word) in words.iter().enumerate() {
            if self.line.error.is_some() {
                return;
            }
            let open = self.mode.last_word_open && index + 1 == words.len();
            if word.is_option_like() && !self.takes_as_value(word) {
                self.close_pending();
                if self.line.error.is_none() {
                    self.option_word(&word.text, open);
                }
            } else {
                self.value_word(&word.text, open);
            }
        }
    }

    /// Negative numbers are values when an option is waiting for one, or
    /// when no short option has the digit as its name.
    fn takes_as_value(&self, word: &Word) -> bool {
        if word.text.parse::<f64>().is_err() {
            return false;
        }
        let waiting = self
            .pending
            .is_some_and(|index| !self.line.options[index].has_value());
        let digit = word.text.chars().nth(1);
        waiting || digit.is_some_and(|c| self.schema().find_short(c).is_none())
    }

    fn option_word(&mut self, text: &str, open: bool) {
        match text.strip_prefix("--") {
            Some(body) => self.long_option(body, open),
            None => self.short_option(&text[1..], open),
        }
    }

    fn long_option(&mut self, body: &str, open: bool) {
        let schema = self.schema();
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        if let Some(spec) = schema.find_long(name) {
            return self.apply(spec, true, inline, open);
        }

        let property = schema.options.iter().find(|o| {
            o.kind == OptionKind::Property
                && o.long.as_deref().is_some_and(|long| body.starts_with(long))
        });
        if let Some((spec, long)) = property.and_then(|o| o.long.as_deref().map(|l| (o, l))) {
            return self.apply(spec, true, Some(&body[long.len()..]), open);
        }

        match schema.find_long_prefix(name) {
            Some(spec) => self.apply(spec, true, inline, open),
            None => self.fail(ParseError::UnknownOption(format!("--{name}"))),
        }
    }

    fn short_option(&mut self, rest: &str, open: bool) {
        let schema = self.schema();
        let mut chars = rest.chars();
        let Some(first) = chars.next() else {
            return;
        };
        let tail = chars.as_str();
        let Some(spec) = schema.find_short(first) else {
            return self.fail(ParseError::UnknownOption(format!("-{first}")));
        };

        if tail.is_empty() {
            return self.apply(spec, false, None, open);
        }
        if spec.kind == OptionKind::Property {
            return self.apply(spec, false, Some(tail), open);
        }
        if let Some(value) = tail.strip_prefix('=') {
            return self.apply(spec, false, Some(value), open);
        }
        if spec.takes_value() {
            return self.apply(spec, false, Some(tail), open);
        }

        // grouped booleans: -abc
        self.apply(spec, false, None, open);
        for c in tail.chars() {
            match schema.find_short(c) {
                None => return self.fail(ParseError::UnknownOption(format!("-{c}"))),
                Some(grouped) if grouped.takes_value() => {
                    return self.fail(ParseError::GroupedOptionNeedsValue(grouped.display_name()));
                }
                Some(grouped) => self.apply(grouped, false, None, open),
            }
        }
    }

    /// Index of the occurrence of `spec`, created on first use.
    fn entry(&mut self, spec: &'s OptionSpec, long_name_used: bool) -> usize {
        let index = match self.line.options.iter().position(|o| o.is(spec)) {
            Some(index) => index,
            None => {
                self.line.options.push(ParsedOption::new(spec));
                self.line.options.len() - 1
            }
        };
        let option = &mut self.line.options[index];
        option.long_name_used |= long_name_used;
        option.cursor_value = false;
        index
    }

    fn apply(&mut self, spec: &'s OptionSpec, long_name_used: bool, inline: Option<&str>, open: bool) {
        let index = self.entry(spec, long_name_used);
        self.line.last_touched = Some(LastTouched::Option(index));
        self.pending = None;

        match spec.kind {
            OptionKind::Boolean => {
                if let Some(value) = inline {
                    self.line.options[index].values = vec![value.to_string()];
                }
            }
            OptionKind::Property => self.property(index, inline.unwrap_or_default(), open),
            OptionKind::Normal | OptionKind::List | OptionKind::Group => match inline {
                Some(value) => self.assign(index, value, open),
                None => self.pending = Some(index),
            },
        }
    }

    fn property(&mut self, index: usize, text: &str, open: bool) {
        let option = &mut self.line.options[index];
        option.cursor_value = open;
        match text.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                option.properties.insert(key.to_string(), value.to_string());
            }
            _ if open => {}
            _ => {
                let name = option.spec.display_name();
                self.fail(ParseError::MalformedProperty(name));
            }
        }
    }

    fn assign(&mut self, index: usize, text: &str, open: bool) {
        let option = &mut self.line.options[index];
        option.cursor_value = open;
        let separator = option.spec.separator;

        match option.spec.kind {
            OptionKind::Normal | OptionKind::Boolean => option.values = vec![text.to_string()],
            OptionKind::List => {
                option.ends_with_separator = text.ends_with(separator);
                option.values.extend(
                    text.split(separator)
                        .filter(|v| !v.is_empty())
                        .map(String::from),
                );
            }
            OptionKind::Group => {
                option.ends_with_separator = text.ends_with(separator);
                let inner = text
                    .strip_prefix('{')
                    .map(|t| t.strip_suffix('}').unwrap_or(t))
                    .unwrap_or(text);
                let mut malformed = false;
                for pair in inner.split(separator).map(str::trim).filter(|p| !p.is_empty()) {
                    match pair.split_once('=') {
                        Some((key, value)) if !key.trim().is_empty() => {
                            option
                                .properties
                                .insert(key.trim().to_string(), value.trim().to_string());
                        }
                        _ => malformed = !open,
                    }
                }
                if malformed {
                    let name = option.spec.display_name();
                    self.fail(ParseError::MalformedProperty(name));
                }
            }
            OptionKind::Property => self.property(index, text, open),
        }
    }

    fn value_word(&mut self, text: &str, open: bool) {
        if let Some(index) = self.pending.take() {
            self.assign(index, text, open);
            self.line.last_touched = Some(LastTouched::Option(index));
            return;
        }

        let schema = self.schema();
        let Some(spec) = schema.argument.as_ref() else {
            return self.fail(ParseError::UnsupportedArgument(text.to_string()));
        };
        let argument = self
            .line
            .argument
            .get_or_insert_with(|| ParsedArgument::new(spec));
        if !spec.multiple && !argument.values.is_empty() {
            return self.fail(ParseError::TooManyArguments {
                command: schema.name.clone(),
                value: text.to_string(),
            });
        }
        argument.values.push(text.to_string());
        argument.cursor_value = open;
        self.line.last_touched = Some(LastTouched::Argument);
    }

    /// Closes an option that never received its value: defaults are applied,
    /// otherwise strict mode fails.
    fn close_pending(&mut self) {
        let Some(index) = self.pending.take() else {
            return;
        };
        let option = &mut self.line.options[index];
        if option.has_value() {
            return;
        }
        if !option.spec.default_values.is_empty() {
            option.values = option.spec.default_values.clone();
        } else if !self.mode.ignore_requirements {
            let name = option.spec.display_name();
            self.fail(ParseError::MissingValue(name));
        }
    }

    fn finish(mut self) -> ParsedLine<'s> {
        if self.line.error.is_none() {
            let awaiting = self
                .pending
                .filter(|index| !self.line.options[*index].has_value());
            self.line.awaiting_value = awaiting;
            self.close_pending();
        }

        for option in &mut self.line.options {
            if option.spec.kind == OptionKind::Boolean && option.values.is_empty() {
                option.values.push("true".to_string());
            }
        }

        if self.line.error.is_none() && !self.mode.ignore_requirements {
            self.check_required();
        }

        self.line
    }

    fn check_required(&mut self) {
        if self.line.has_override() {
            return;
        }
        let missing = self.line.missing_required().next().map(OptionSpec::display_name);
        if let Some(name) = missing {
            return self.fail(ParseError::MissingRequiredOption(name));
        }
        let schema = self.schema();
        if let Some(argument) = &schema.argument {
            if argument.required
                && argument.default_values.is_empty()
                && self.line.argument_values().is_empty()
            {
                self.fail(ParseError::MissingRequiredArgument(argument.name.clone()));
            }
        }
    }
}

/// Splits a property or group entry `key=value`.
pub(crate) fn split_pair(entry: &str) -> Option<(String, String)> {
    let (key, value) = entry.split_once('=')?;
    Some((key.trim().to_string(), value.trim().to_string()))
}

/// Parses `key=value` defaults of group and property options.
pub(crate) fn default_properties(spec: &OptionSpec) -> BTreeMap<String, String> {
    spec.default_values
        .iter()
        .filter_map(|entry| split_pair(entry))
        .collect()
}
