//! The embeddable console.
//!
//! A [`Console`] owns the registered schemas and their commands, one reused
//! [`CommandValues`] per command, and the writer that receives command
//! output. Hosts call [`complete`](Console::complete) from their line editor
//! and [`execute`](Console::execute) on enter.

use std::collections::HashMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cmdshell_core::{
    Candidate, CommandRegistry, CommandSchema, CommandValues, Completer, CompleterContext,
    CompletionCandidates, DEFAULT_SEPARATOR, OptionSpec, validate_schema,
};
use cmdshell_parser::{
    Completion, FileCompleter, Operator, ParseMode, TargetKind, TargetSummary, TokenizedLine,
    Tokenizer, Word, complete_tokens, escape, floor_char_boundary, parse, populate, render_help,
};
use tracing::{debug, info};

use crate::command::{Command, CommandInvocation, CommandResult};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::pipeline::{self, Connector, Pipeline, Redirect, Segment};

/// A set of commands behind one prompt.
///
/// # Examples
///
/// ```
/// use cmdshell_core::*;
/// use cmdshell_shell::*;
///
/// let mut console = Console::new(ConsoleConfig::default()).with_output(std::io::sink());
/// console
///     .register(
///         CommandSchema::new("greet")
///             .with_option(OptionSpec::with_value(Some('n'), Some("name"), ValueType::String)),
///         FnCommand::new(|invocation: &mut CommandInvocation<'_>| {
///             let name = invocation.values().get("name").unwrap_or("world").to_string();
///             invocation.println(&format!("hello {name}"));
///             Ok(CommandResult::Success)
///         }),
///     )
///     .unwrap();
///
/// let completion = console.complete("gr", 2);
/// assert_eq!(completion.apply("gr", 2).0, "greet ");
///
/// assert!(console.execute("greet --name=you").unwrap().is_success());
/// assert!(console.execute("greet --nope").is_err());
/// ```
pub struct Console {
    registry: CommandRegistry,
    commands: HashMap<String, Arc<dyn Command>>,
    values: HashMap<String, CommandValues>,
    config: ConsoleConfig,
    base_dir: PathBuf,
    output: Box<dyn Write + Send>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new(ConsoleConfig::default())
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("commands", &self.registry.names())
            .field("config", &self.config)
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl Console {
    /// Creates a console writing to stdout.
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            registry: CommandRegistry::new(),
            commands: HashMap::new(),
            values: HashMap::new(),
            config,
            base_dir: PathBuf::from("."),
            output: Box::new(io::stdout()),
        }
    }

    /// Replaces the writer receiving the output of the last pipeline stage.
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Directory that relative redirect targets and completed file names are
    /// resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn prompt(&self) -> &str {
        &self.config.prompt
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Values populated by the last completion or execution of a command.
    pub fn values(&self, command: &str) -> Option<&CommandValues> {
        let schema = self.registry.get(command)?;
        self.values.get(&schema.name)
    }

    /// Registers a command, replacing any command of the same name.
    ///
    /// With `generate_help` on, every schema level without a `--help` option
    /// gets one. List and group options that kept the default separator take
    /// the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidSchema`] with the first structural error
    /// found by [`validate_schema`].
    pub fn register(&mut self, schema: CommandSchema, command: impl Command + 'static) -> Result<()> {
        self.register_arc(schema, Arc::new(command))
    }

    /// Like [`register`](Self::register), for a command shared elsewhere.
    pub fn register_arc(&mut self, mut schema: CommandSchema, command: Arc<dyn Command>) -> Result<()> {
        if let Some(source) = validate_schema(&schema).into_iter().next() {
            return Err(ConsoleError::InvalidSchema {
                command: schema.name.clone(),
                source,
            });
        }
        prepare_schema(&mut schema, &self.config);

        let name = schema.name.clone();
        self.values.remove(&name);
        self.commands.insert(name.clone(), command);
        if self.registry.insert(schema).is_some() {
            info!(command = %name, "Replaced command");
        } else {
            debug!(command = %name, "Registered command");
        }
        Ok(())
    }

    fn tokenizer(&self) -> Tokenizer {
        Tokenizer {
            operators: self.config.operators,
        }
    }

    /// Completes `line` at byte `cursor`.
    ///
    /// The first word completes to command names, a word after `>`, `>>` or
    /// `<` to file paths, and anything else against the schema of the last
    /// segment's command.
    pub fn complete(&mut self, line: &str, cursor: usize) -> Completion {
        let cursor = floor_char_boundary(line, cursor);
        let tokens = self.tokenizer().tokenize_to_cursor(line, cursor);
        let words = tokens.last_segment_words();
        let open = tokens.last_word_open();
        let current = if open { words.last() } else { None };

        let mut completion = if tokens.last_operator().is_some_and(Operator::takes_file) {
            if words.len() > usize::from(open) {
                Completion::none()
            } else {
                self.complete_path(current, cursor)
            }
        } else if words.len() <= usize::from(open) {
            self.complete_command_name(current, cursor)
        } else {
            self.complete_arguments(&tokens, &words[0], cursor)
        };

        if !self.config.completion.append_space {
            completion.candidates.append_separator = false;
        }
        completion
    }

    fn complete_command_name(&self, current: Option<&Word>, cursor: usize) -> Completion {
        let (prefix, offset) = current.map_or(("", cursor), |w| (w.text.as_str(), w.start));
        let mut candidates = CompletionCandidates::default();
        for name in self.registry.complete_name(prefix) {
            candidates.push(Candidate::new(escape(name), offset));
        }
        Completion {
            target: TargetSummary {
                kind: TargetKind::CommandNames,
                name: None,
                partial: prefix.to_string(),
                offset,
            },
            candidates,
        }
    }

    fn complete_path(&self, current: Option<&Word>, cursor: usize) -> Completion {
        let (partial, offset) = current.map_or(("", cursor), |w| (w.text.as_str(), w.start));
        let empty = CommandValues::default();
        let mut context = CompleterContext::new(partial, &empty);
        FileCompleter::files()
            .with_base(&self.base_dir)
            .complete(&mut context);

        let mut candidates = CompletionCandidates {
            append_separator: context.append_separator(),
            ..Default::default()
        };
        for value in context.take_candidates() {
            candidates.push(Candidate::new(escape(&value), offset));
        }
        Completion {
            target: TargetSummary {
                kind: TargetKind::RedirectPath,
                name: None,
                partial: partial.to_string(),
                offset,
            },
            candidates,
        }
    }

    fn complete_arguments(&mut self, tokens: &TokenizedLine, first: &Word, cursor: usize) -> Completion {
        let Some(schema) = self.registry.get(&first.text) else {
            debug!(command = %first.text, "No schema to complete against");
            return Completion::none();
        };
        let values = self.values.entry(schema.name.clone()).or_default();
        complete_tokens(&schema, tokens, cursor, values)
    }

    /// Executes a line.
    ///
    /// Pipelines joined by `;` always run, after `&&` only when the last one
    /// succeeded, after `||` only when it failed. Within a pipeline each
    /// command's output is the next one's input; the last stage writes to the
    /// console output unless redirected. Returns the status of the last
    /// command that ran.
    ///
    /// # Errors
    ///
    /// The first error aborts the rest of the line: an unknown command, a
    /// parse, conversion or validation failure, an error returned by the
    /// command, or an I/O failure on a redirect.
    pub fn execute(&mut self, line: &str) -> Result<CommandResult> {
        let tokens = self.tokenizer().tokenize(line);
        if let Some(quote) = tokens.open_quote {
            return Err(ConsoleError::Syntax(format!(
                "missing closing '{}'",
                quote.closing()
            )));
        }

        let mut status = CommandResult::Success;
        for pipeline in pipeline::split(&tokens)? {
            let run = match pipeline.connector {
                Connector::Always => true,
                Connector::OnSuccess => status.is_success(),
                Connector::OnFailure => !status.is_success(),
            };
            if run {
                status = self.run_pipeline(&pipeline)?;
            }
        }
        self.output.flush()?;
        Ok(status)
    }

    fn run_pipeline(&mut self, pipeline: &Pipeline) -> Result<CommandResult> {
        let mut status = CommandResult::Success;
        let mut piped: Option<String> = None;
        let last = pipeline.segments.len().saturating_sub(1);

        for (index, segment) in pipeline.segments.iter().enumerate() {
            let input = match &segment.input {
                Some(path) => Some(std::fs::read_to_string(self.resolve_path(path))?),
                None => piped.take(),
            };
            let (result, output) = self.run_segment(segment, input.as_deref())?;
            status = result;

            match &segment.redirect {
                Some(redirect) => self.write_redirect(redirect, &output)?,
                None if index == last => self.output.write_all(output.as_bytes())?,
                None => piped = Some(output),
            }
        }
        Ok(status)
    }

    fn run_segment(&mut self, segment: &Segment, input: Option<&str>) -> Result<(CommandResult, String)> {
        let name = segment.name().ok_or(ConsoleError::EmptyPipeline)?;
        let schema = self
            .registry
            .get(name)
            .ok_or_else(|| ConsoleError::CommandNotFound(name.to_string()))?;
        let command = self
            .commands
            .get(&schema.name)
            .cloned()
            .ok_or_else(|| ConsoleError::CommandNotFound(name.to_string()))?;

        let parsed = parse(&schema, &segment.words, ParseMode::strict());
        if self.config.generate_help && parsed.find_by_name("help").is_some() {
            debug!(command = %name, "Printing help");
            return Ok((
                CommandResult::Success,
                render_help(parsed.schema, &parsed.command_path),
            ));
        }

        let values = self.values.entry(schema.name.clone()).or_default();
        populate(values, &parsed, true).map_err(|source| ConsoleError::Populate {
            command: name.to_string(),
            source,
        })?;

        let mut invocation = CommandInvocation::new(values, input);
        let result = command
            .execute(&mut invocation)
            .map_err(|source| ConsoleError::Command {
                command: name.to_string(),
                source,
            })?;
        debug!(command = %name, status = result.code(), "Executed command");
        Ok((result, invocation.into_output()))
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    fn write_redirect(&self, redirect: &Redirect, output: &str) -> Result<()> {
        let mut options = OpenOptions::new();
        options.create(true);
        let path = match redirect {
            Redirect::Overwrite(path) => {
                options.write(true).truncate(true);
                path
            }
            Redirect::Append(path) => {
                options.append(true);
                path
            }
        };
        let mut file = options.open(self.resolve_path(path))?;
        file.write_all(output.as_bytes())?;
        Ok(())
    }
}

fn prepare_schema(schema: &mut CommandSchema, config: &ConsoleConfig) {
    let separator = config.completion.list_separator;
    for option in &mut schema.options {
        if option.kind.is_separated() && option.separator == DEFAULT_SEPARATOR {
            option.separator = separator;
        }
    }
    if config.generate_help && schema.find_long("help").is_none() {
        let short = schema.find_short('h').is_none().then_some('h');
        schema.options.push(
            OptionSpec::boolean(short, Some("help"))
                .with_description("Print help")
                .override_required(),
        );
    }
    for child in &mut schema.children {
        prepare_schema(child, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdshell_core::{OptionKind, ValueType};

    struct Noop;

    impl Command for Noop {
        fn execute(
            &self,
            _: &mut CommandInvocation<'_>,
        ) -> std::result::Result<CommandResult, crate::CommandError> {
            Ok(CommandResult::Success)
        }
    }

    #[test]
    fn test_prepare_adds_help_everywhere() {
        let mut schema = CommandSchema::new("git")
            .with_option(OptionSpec::boolean(Some('h'), Some("host")))
            .with_child(CommandSchema::new("commit"));
        prepare_schema(&mut schema, &ConsoleConfig::default());

        let help = schema.find_long("help").unwrap();
        assert!(help.override_required);
        assert_eq!(help.short, None);
        assert_eq!(schema.children[0].find_long("help").unwrap().short, Some('h'));
    }

    #[test]
    fn test_prepare_applies_list_separator() {
        let mut config = ConsoleConfig::default();
        config.completion.list_separator = ':';
        config.generate_help = false;
        let mut schema = CommandSchema::new("cmd")
            .with_option(OptionSpec::list(None, Some("paths"), ValueType::String))
            .with_option(OptionSpec::list(None, Some("ids"), ValueType::Number).with_separator(';'));
        prepare_schema(&mut schema, &config);

        assert_eq!(schema.options.len(), 2);
        assert_eq!(schema.options[0].kind, OptionKind::List);
        assert_eq!(schema.options[0].separator, ':');
        assert_eq!(schema.options[1].separator, ';');
    }

    #[test]
    fn test_register_rejects_invalid_schema() {
        let mut console = Console::default().with_output(io::sink());
        let schema = CommandSchema::new("bad").with_option(OptionSpec::boolean(None, Some("--x")));
        let result = console.register(schema, Noop);
        assert!(matches!(result, Err(ConsoleError::InvalidSchema { .. })));
        assert!(console.registry().is_empty());
    }

    #[test]
    fn test_command_name_completion() {
        let mut console = Console::default().with_output(io::sink());
        console.register(CommandSchema::new("status"), Noop).unwrap();
        console
            .register(CommandSchema::new("stash").with_alias("st"), Noop)
            .unwrap();

        let completion = console.complete("s", 1);
        assert_eq!(completion.target.kind, TargetKind::CommandNames);
        assert_eq!(completion.values(), ["st", "stash", "status"]);
        assert_eq!(console.complete("", 0).values().len(), 3);
        assert!(console.complete("x", 1).is_empty());
    }

    #[test]
    fn test_cursor_inside_multibyte_char() {
        let mut console = Console::default().with_output(io::sink());
        console.register(CommandSchema::new("status"), Noop).unwrap();

        let completion = console.complete("sé", 2);
        assert_eq!(completion.values(), ["status"]);
        assert_eq!(completion.apply("sé", 1).0, "status é");
    }

    #[test]
    fn test_unknown_command() {
        let mut console = Console::default().with_output(io::sink());
        let error = console.execute("nope --x").unwrap_err();
        assert_eq!(error.to_string(), "command not found: nope");
        assert!(console.complete("nope -", 6).is_empty());
    }
}
