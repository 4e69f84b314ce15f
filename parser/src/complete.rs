//! Completion target resolution and candidate generation.
//!
//! Completion runs in two steps. [`resolve`] looks at the text before the
//! cursor and decides what is being completed: option names, the value of a
//! specific option, the argument, or a child command. [`complete`] then asks
//! the right source for candidates (the option's completer, its default
//! values, or a built-in completer for its value type), filters and escapes
//! them, and records where in the line they apply.
//!
//! # Examples
//!
//! ```
//! use cmdshell_core::*;
//! use cmdshell_parser::complete;
//!
//! let schema = CommandSchema::new("cmd")
//!     .with_option(OptionSpec::boolean(Some('b'), Some("bool")))
//!     .with_option(OptionSpec::with_value(None, Some("format"), ValueType::Choice(vec![
//!         "json".into(),
//!         "yaml".into(),
//!     ])));
//!
//! let completion = complete(&schema, "cmd --fo", 8);
//! assert_eq!(completion.values(), ["--format="]);
//! assert_eq!(completion.apply("cmd --fo", 8).0, "cmd --format=");
//!
//! let completion = complete(&schema, "cmd --format=y", 14);
//! assert_eq!(completion.apply("cmd --format=y", 14).0, "cmd --format=yaml ");
//! ```

use cmdshell_core::{
    ArgumentSpec, Candidate, CommandSchema, CommandValues, Completer, CompleterContext,
    CompletionCandidates, OptionKind, OptionSpec,
};
use serde::Serialize;
use tracing::debug;

use crate::completers;
use crate::line::{LastTouched, ParsedLine};
use crate::parser::{ParseMode, parse, resolve_child};
use crate::populate;
use crate::tokenizer::{
    QuoteKind, TokenizedLine, Word, escape, floor_char_boundary, tokenize_to_cursor,
};

/// What the word under the cursor completes to.
#[derive(Debug, Clone)]
pub enum CompletionTarget<'s> {
    /// Nothing sensible can be offered.
    NoTarget,
    /// Option names starting with `prefix`, replacing from `offset`.
    DisplayOptionNames { prefix: String, offset: usize },
    /// A value of `option`.
    CompleteOptionValue {
        option: &'s OptionSpec,
        partial: String,
        offset: usize,
        /// Text inserted before every candidate (e.g. `"-v "` when completing
        /// right after a bare short option).
        insert_prefix: String,
    },
    /// A value of the command's argument.
    CompleteArgument {
        argument: &'s ArgumentSpec,
        partial: String,
        offset: usize,
    },
    /// Child command names of a group.
    ChildCommandNames {
        group: &'s CommandSchema,
        prefix: String,
        offset: usize,
    },
    /// The word is already a complete option; only a separator is due.
    FinishOption { text: String, offset: usize },
}

/// Kind of a [`CompletionTarget`], without borrowed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    NoTarget,
    DisplayOptionNames,
    CompleteOptionValue,
    CompleteArgument,
    ChildCommandNames,
    FinishOption,
    /// Registered command names, completed above a single schema.
    CommandNames,
    /// File path after a redirection operator.
    RedirectPath,
}

/// Owned description of a target, for logging and callers that outlive the
/// schema borrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSummary {
    pub kind: TargetKind,
    /// Option display name, argument name or group name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Partial value or name prefix.
    pub partial: String,
    pub offset: usize,
}

impl CompletionTarget<'_> {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::NoTarget => TargetKind::NoTarget,
            Self::DisplayOptionNames { .. } => TargetKind::DisplayOptionNames,
            Self::CompleteOptionValue { .. } => TargetKind::CompleteOptionValue,
            Self::CompleteArgument { .. } => TargetKind::CompleteArgument,
            Self::ChildCommandNames { .. } => TargetKind::ChildCommandNames,
            Self::FinishOption { .. } => TargetKind::FinishOption,
        }
    }

    pub fn summary(&self) -> TargetSummary {
        let (name, partial, offset) = match self {
            Self::NoTarget => (None, "", 0),
            Self::DisplayOptionNames { prefix, offset } => (None, prefix.as_str(), *offset),
            Self::CompleteOptionValue {
                option,
                partial,
                offset,
                ..
            } => (Some(option.display_name()), partial.as_str(), *offset),
            Self::CompleteArgument {
                argument,
                partial,
                offset,
            } => (Some(argument.name.clone()), partial.as_str(), *offset),
            Self::ChildCommandNames {
                group,
                prefix,
                offset,
            } => (Some(group.name.clone()), prefix.as_str(), *offset),
            Self::FinishOption { text, offset } => (None, text.as_str(), *offset),
        };
        TargetSummary {
            kind: self.kind(),
            name,
            partial: partial.to_string(),
            offset,
        }
    }
}

/// A resolved target together with the parse of the words before it.
#[derive(Debug, Clone)]
pub struct Resolution<'s> {
    pub target: CompletionTarget<'s>,
    /// Parse of the segment, used to populate values for activators and
    /// completers.
    pub parsed: ParsedLine<'s>,
    /// Quote left open before the cursor.
    pub open_quote: Option<QuoteKind>,
    pub cursor: usize,
}

/// Candidates for one completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub target: TargetSummary,
    pub candidates: CompletionCandidates,
}

impl Completion {
    /// An empty completion.
    pub fn none() -> Self {
        Self {
            target: CompletionTarget::NoTarget.summary(),
            candidates: CompletionCandidates::default(),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        self.candidates.values()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Applies the candidates to the edit buffer, see
    /// [`CompletionCandidates::apply`].
    pub fn apply(&self, line: &str, cursor: usize) -> (String, usize) {
        self.candidates.apply(line, cursor)
    }
}

/// Decides what the text before `cursor` completes to.
///
/// Only the words after the last control operator are considered; their
/// first word must name `schema`.
pub fn resolve<'s>(schema: &'s CommandSchema, line: &str, cursor: usize) -> Resolution<'s> {
    let cursor = floor_char_boundary(line, cursor);
    resolve_tokens(schema, &tokenize_to_cursor(line, cursor), cursor)
}

/// Like [`resolve`], for a line already tokenized up to `cursor`.
pub fn resolve_tokens<'s>(
    schema: &'s CommandSchema,
    tokens: &TokenizedLine,
    cursor: usize,
) -> Resolution<'s> {
    let words = tokens.last_segment_words();
    let open = tokens.last_word_open();

    let (target, parsed) = resolve_words(schema, &words, open, cursor);
    debug!(resolved = ?target.summary(), "Resolved completion target");
    Resolution {
        target,
        parsed,
        open_quote: tokens.open_quote,
        cursor,
    }
}

fn resolve_words<'s>(
    schema: &'s CommandSchema,
    words: &[Word],
    open: bool,
    cursor: usize,
) -> (CompletionTarget<'s>, ParsedLine<'s>) {
    let closed = ParseMode::completion(false);
    if words.is_empty() || (words.len() == 1 && open) {
        let parsed = ParsedLine::new(schema, vec![schema.name.clone()]);
        return (CompletionTarget::NoTarget, parsed);
    }

    let (current, _, depth) = resolve_child(schema, words, open);
    let rest = &words[depth..];
    if current.is_group() {
        let child = match (rest, open) {
            ([_], false) => Some((String::new(), cursor)),
            ([_, word], true) if !word.raw.starts_with('-') => {
                Some((word.text.clone(), word.content_start()))
            }
            _ => None,
        };
        if let Some((prefix, offset)) = child {
            let target = CompletionTarget::ChildCommandNames {
                group: current,
                prefix,
                offset,
            };
            let parsed = parse(schema, &words[..=depth], closed);
            return (target, parsed);
        }
        // A word that names no child ends completion for the group.
        if rest.get(1).is_some_and(|word| !word.is_option_like()) {
            let parsed = parse(schema, &words[..=depth], closed);
            return (CompletionTarget::NoTarget, parsed);
        }
    }

    if !open {
        let parsed = parse(schema, words, closed);
        let target = if parsed.error.is_some() {
            CompletionTarget::DisplayOptionNames {
                prefix: String::new(),
                offset: cursor,
            }
        } else if let Some(index) = parsed.awaiting_value {
            CompletionTarget::CompleteOptionValue {
                option: parsed.options[index].spec,
                partial: String::new(),
                offset: cursor,
                insert_prefix: String::new(),
            }
        } else {
            next_target(&parsed, cursor)
        };
        return (target, parsed);
    }

    let (last, before) = match words.split_last() {
        Some(split) => split,
        None => return (CompletionTarget::NoTarget, ParsedLine::new(schema, Vec::new())),
    };
    if last.raw.starts_with('-') {
        let parsed = parse(schema, before, closed);
        let negative_value = parsed.awaiting_value.is_some() && last.text.parse::<f64>().is_ok();
        if !negative_value {
            let target = option_target(parsed.schema, last);
            return (target, parsed);
        }
    }

    let parsed = parse(schema, words, ParseMode::completion(true));
    let target = value_target(&parsed, last);
    (target, parsed)
}

/// Target after a closed word: the argument while it can take values and no
/// required option is missing, otherwise option names.
fn next_target<'s>(parsed: &ParsedLine<'s>, cursor: usize) -> CompletionTarget<'s> {
    if let Some(argument) = &parsed.schema.argument {
        let filled = !argument.multiple && !parsed.argument_values().is_empty();
        let required_pending = !parsed.has_override() && parsed.missing_required().next().is_some();
        if !filled && !required_pending {
            return CompletionTarget::CompleteArgument {
                argument,
                partial: String::new(),
                offset: cursor,
            };
        }
    }
    CompletionTarget::DisplayOptionNames {
        prefix: String::new(),
        offset: cursor,
    }
}

/// Target for an option-like word under the cursor.
fn option_target<'s>(schema: &'s CommandSchema, word: &Word) -> CompletionTarget<'s> {
    let text = word.text.as_str();
    if text == "-" || text == "--" {
        return CompletionTarget::DisplayOptionNames {
            prefix: String::new(),
            offset: word.start,
        };
    }

    if let Some(body) = text.strip_prefix("--") {
        let Some((name, _)) = body.split_once('=') else {
            return CompletionTarget::DisplayOptionNames {
                prefix: body.to_string(),
                offset: word.start,
            };
        };
        return match schema.find_long_prefix(name) {
            Some(spec) if spec.takes_value() && spec.kind != OptionKind::Property => {
                value_in_word(spec, word, "--=".len() + name.len())
            }
            _ => CompletionTarget::NoTarget,
        };
    }

    let mut chars = text[1..].chars();
    let Some((short, spec)) = chars
        .next()
        .and_then(|c| schema.find_short(c).map(|spec| (c, spec)))
    else {
        return CompletionTarget::NoTarget;
    };
    let tail = chars.as_str();
    let finish = CompletionTarget::FinishOption {
        text: word.raw.clone(),
        offset: word.start,
    };

    match spec.kind {
        OptionKind::Property => CompletionTarget::NoTarget,
        OptionKind::Boolean => {
            let grouped = tail
                .chars()
                .all(|c| schema.find_short(c).is_some_and(|o| !o.takes_value()));
            if grouped {
                finish
            } else {
                CompletionTarget::NoTarget
            }
        }
        _ if tail.is_empty() => CompletionTarget::CompleteOptionValue {
            option: spec,
            partial: String::new(),
            offset: word.start,
            insert_prefix: format!("{} ", word.raw),
        },
        _ => {
            let mut start = '-'.len_utf8() + short.len_utf8();
            if tail.starts_with('=') {
                start += '='.len_utf8();
            }
            value_in_word(spec, word, start)
        }
    }
}

/// Target for the value of the option the last word was assigned to.
fn value_target<'s>(parsed: &ParsedLine<'s>, word: &Word) -> CompletionTarget<'s> {
    if parsed.error.is_some() {
        return CompletionTarget::NoTarget;
    }
    match parsed.last_touched {
        Some(LastTouched::Option(index)) => {
            let option = &parsed.options[index];
            if !option.cursor_value || option.spec.kind == OptionKind::Property {
                return CompletionTarget::NoTarget;
            }
            if option.ends_with_separator {
                return CompletionTarget::CompleteOptionValue {
                    option: option.spec,
                    partial: String::new(),
                    offset: word.line_offset(word.text.len()),
                    insert_prefix: String::new(),
                };
            }
            value_in_word(option.spec, word, 0)
        }
        Some(LastTouched::Argument) => match &parsed.argument {
            Some(argument) if argument.cursor_value => CompletionTarget::CompleteArgument {
                argument: argument.spec,
                partial: word.text.clone(),
                offset: word.content_start(),
            },
            _ => CompletionTarget::NoTarget,
        },
        None => CompletionTarget::NoTarget,
    }
}

/// Option value starting at `value_start` in the word's cooked text. List and
/// group values complete only the part after the last separator; group
/// entries skip leading blanks the way the parser trims them.
fn value_in_word<'s>(spec: &'s OptionSpec, word: &Word, value_start: usize) -> CompletionTarget<'s> {
    let text = word.text.as_str();
    let value_start = value_start.min(text.len());
    let value = &text[value_start..];

    let mut start = value_start;
    if spec.kind.is_separated() {
        if let Some(index) = value.rfind(spec.separator) {
            start = value_start + index + spec.separator.len_utf8();
        } else if spec.kind == OptionKind::Group && value.starts_with('{') {
            start += 1;
        }
        if spec.kind == OptionKind::Group {
            let rest = &text[start..];
            start += rest.len() - rest.trim_start().len();
        }
    }

    CompletionTarget::CompleteOptionValue {
        option: spec,
        partial: text[start..].to_string(),
        offset: word.line_offset(start),
        insert_prefix: String::new(),
    }
}

/// Completes `line` at `cursor` against `schema` with fresh values.
pub fn complete(schema: &CommandSchema, line: &str, cursor: usize) -> Completion {
    let mut values = CommandValues::default();
    complete_with(schema, line, cursor, &mut values)
}

/// Completes `line` at `cursor`, populating `values` from the line first so
/// activators and completers see what was typed.
pub fn complete_with(
    schema: &CommandSchema,
    line: &str,
    cursor: usize,
    values: &mut CommandValues,
) -> Completion {
    let cursor = floor_char_boundary(line, cursor);
    complete_tokens(schema, &tokenize_to_cursor(line, cursor), cursor, values)
}

/// Like [`complete_with`], for a line already tokenized up to `cursor`.
pub fn complete_tokens(
    schema: &CommandSchema,
    tokens: &TokenizedLine,
    cursor: usize,
    values: &mut CommandValues,
) -> Completion {
    let resolution = resolve_tokens(schema, tokens, cursor);
    populate::assign(values, &resolution.parsed);
    let candidates = candidates_for(&resolution, values);
    debug!(
        kind = ?resolution.target.kind(),
        candidates = candidates.len(),
        "Completed line"
    );
    Completion {
        target: resolution.target.summary(),
        candidates,
    }
}

fn candidates_for(resolution: &Resolution<'_>, values: &CommandValues) -> CompletionCandidates {
    let parsed = &resolution.parsed;
    match &resolution.target {
        CompletionTarget::NoTarget => CompletionCandidates::default(),
        CompletionTarget::DisplayOptionNames { prefix, offset } => {
            option_names(parsed, values, prefix, *offset)
        }
        CompletionTarget::ChildCommandNames {
            group,
            prefix,
            offset,
        } => {
            let mut set = CompletionCandidates::default();
            for child in group.children.iter().filter(|c| c.name.starts_with(prefix.as_str())) {
                set.push(Candidate::new(render(&child.name, resolution.open_quote), *offset));
            }
            set
        }
        CompletionTarget::FinishOption { text, offset } => {
            let mut set = CompletionCandidates::default();
            set.push(Candidate::new(text.clone(), *offset));
            set
        }
        CompletionTarget::CompleteOptionValue {
            option,
            partial,
            offset,
            insert_prefix,
            ..
        } => {
            if !option.is_activated(values) {
                return CompletionCandidates::default();
            }
            let builtin = completers::for_value_type(&option.value_type);
            let source = CandidateSource::pick(
                option.completer.as_deref(),
                &option.default_values,
                builtin.as_deref(),
            );
            let request = ValueRequest {
                partial,
                offset: *offset,
                cursor: resolution.cursor,
                quote: resolution.open_quote,
                insert_prefix,
            };
            value_candidates(&source, &request, values)
        }
        CompletionTarget::CompleteArgument {
            argument,
            partial,
            offset,
        } => {
            if !argument.is_activated(values) {
                return CompletionCandidates::default();
            }
            let builtin = completers::for_value_type(&argument.value_type);
            let source = CandidateSource::pick(
                argument.completer.as_deref(),
                &argument.default_values,
                builtin.as_deref(),
            );
            let request = ValueRequest {
                partial,
                offset: *offset,
                cursor: resolution.cursor,
                quote: resolution.open_quote,
                insert_prefix: "",
            };
            value_candidates(&source, &request, values)
        }
    }
}

/// Option names matching `prefix`: `--long=` for value-bearing options,
/// `--long` for flags and properties, `-s` for options without a long name.
/// Inactive options and single-use options already on the line are skipped.
fn option_names(
    parsed: &ParsedLine<'_>,
    values: &CommandValues,
    prefix: &str,
    offset: usize,
) -> CompletionCandidates {
    let mut names: Vec<(String, bool)> = Vec::new();
    for spec in &parsed.schema.options {
        if !spec.is_activated(values) || (!spec.kind.is_repeatable() && parsed.contains(spec)) {
            continue;
        }
        let is_flag = spec.kind == OptionKind::Boolean;
        match (&spec.long, spec.short) {
            (Some(long), _) if long.starts_with(prefix) => {
                let assign = if spec.takes_value() && spec.kind != OptionKind::Property {
                    "="
                } else {
                    ""
                };
                names.push((format!("--{long}{assign}"), is_flag));
            }
            (None, Some(short)) if prefix.is_empty() => names.push((format!("-{short}"), is_flag)),
            _ => {}
        }
    }

    let mut set = CompletionCandidates {
        append_separator: names.len() == 1 && names[0].1,
        ..Default::default()
    };
    for (name, _) in names {
        set.push(Candidate::new(name, offset));
    }
    set
}

enum CandidateSource<'a> {
    Plugin(&'a dyn Completer),
    Defaults(&'a [String]),
    Nothing,
}

impl<'a> CandidateSource<'a> {
    /// Completer first, then default values, then the value type's built-in.
    fn pick(
        completer: Option<&'a dyn Completer>,
        defaults: &'a [String],
        builtin: Option<&'a dyn Completer>,
    ) -> Self {
        match (completer, builtin) {
            (Some(completer), _) => Self::Plugin(completer),
            (None, _) if !defaults.is_empty() => Self::Defaults(defaults),
            (None, Some(builtin)) => Self::Plugin(builtin),
            (None, None) => Self::Nothing,
        }
    }

    fn gather<'v>(&self, partial: &'v str, values: &'v CommandValues) -> CompleterContext<'v> {
        let mut context = CompleterContext::new(partial, values);
        match self {
            Self::Plugin(completer) => completer.complete(&mut context),
            Self::Defaults(defaults) => context.add_all(defaults.iter().cloned()),
            Self::Nothing => {}
        }
        context
    }

    /// Returns `true` if the source offers a longer value continuing
    /// `value` past a space, so `value` itself is not final yet.
    fn extends(&self, value: &str, values: &CommandValues) -> bool {
        let probe = format!("{value} ");
        self.gather(&probe, values)
            .take_candidates()
            .iter()
            .any(|c| c.len() > probe.len() && c.starts_with(&probe))
    }
}

struct ValueRequest<'r> {
    partial: &'r str,
    offset: usize,
    cursor: usize,
    quote: Option<QuoteKind>,
    insert_prefix: &'r str,
}

fn value_candidates(
    source: &CandidateSource<'_>,
    request: &ValueRequest<'_>,
    values: &CommandValues,
) -> CompletionCandidates {
    let mut context = source.gather(request.partial, values);

    let replaced = match context.offset() {
        Some(n) => {
            let from = floor_char_boundary(request.partial, request.partial.len().saturating_sub(n));
            &request.partial[from..]
        }
        None => request.partial,
    };
    let start = if context.ignore_offset() {
        request.cursor
    } else if context.offset().is_some() {
        let raw_len = match request.quote {
            Some(_) => replaced.len(),
            None => escape(replaced).len(),
        };
        request.cursor.saturating_sub(raw_len)
    } else {
        request.offset
    };

    let mut found: Vec<String> = Vec::new();
    for candidate in context.take_candidates() {
        let keep = context.ignore_starts_with() || candidate.starts_with(replaced);
        if keep && !found.contains(&candidate) {
            found.push(candidate);
        }
    }

    let mut set = CompletionCandidates {
        ignore_offset: context.ignore_offset(),
        ignore_starts_with: context.ignore_starts_with(),
        ..Default::default()
    };

    if let [value] = found.as_slice() {
        let (text, append) = match request.quote {
            Some(quote @ (QuoteKind::Single | QuoteKind::Double)) => {
                (format!("{value}{}", quote.closing()), context.append_separator())
            }
            Some(QuoteKind::Brace) => (value.clone(), false),
            None if value.contains(' ') && source.extends(value, values) => {
                (escape(&format!("{value} ")), false)
            }
            None => (escape(value), context.append_separator()),
        };
        set.append_separator = append;
        set.push(Candidate::new(format!("{}{text}", request.insert_prefix), start));
    } else {
        for value in &found {
            let text = render(value, request.quote);
            set.push(Candidate::new(format!("{}{text}", request.insert_prefix), start));
        }
    }
    set
}

fn render(value: &str, quote: Option<QuoteKind>) -> String {
    match quote {
        Some(_) => value.to_string(),
        None => escape(value),
    }
}
