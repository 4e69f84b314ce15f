use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use cmdshell_core::{ArgumentSpec, CommandSchema, OptionSpec, ValueType};
use cmdshell_parser::TargetKind;
use cmdshell_shell::{
    CommandError, CommandInvocation, CommandResult, Console, ConsoleConfig, ConsoleError,
    FnCommand,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Console output shared with the test.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn console_with(config: ConsoleConfig) -> (Console, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let mut console = Console::new(config).with_output(buffer.clone());

    console
        .register(
            CommandSchema::new("echo")
                .with_option(OptionSpec::boolean(Some('n'), None))
                .with_argument(ArgumentSpec::list("words", ValueType::String)),
            FnCommand::new(|invocation: &mut CommandInvocation<'_>| {
                let values = invocation.values();
                let text = values.argument().join(" ");
                if values.flag("n") {
                    invocation.print(&text);
                } else {
                    invocation.println(&text);
                }
                Ok(CommandResult::Success)
            }),
        )
        .unwrap();

    console
        .register(
            CommandSchema::new("upper"),
            FnCommand::new(|invocation: &mut CommandInvocation<'_>| {
                let text = invocation.input().unwrap_or_default().to_uppercase();
                invocation.print(&text);
                Ok(CommandResult::Success)
            }),
        )
        .unwrap();

    console
        .register(
            CommandSchema::new("fail"),
            FnCommand::new(|_: &mut CommandInvocation<'_>| Ok(CommandResult::Failure(1))),
        )
        .unwrap();

    console
        .register(
            CommandSchema::new("boom"),
            FnCommand::new(|_: &mut CommandInvocation<'_>| Err(CommandError::new("exploded"))),
        )
        .unwrap();

    console
        .register(
            CommandSchema::new("deploy")
                .with_option(
                    OptionSpec::with_value(
                        Some('e'),
                        Some("env"),
                        ValueType::Choice(vec!["dev".into(), "prod".into()]),
                    )
                    .required(),
                )
                .with_option(OptionSpec::list(None, Some("hosts"), ValueType::String)),
            FnCommand::new(|invocation: &mut CommandInvocation<'_>| {
                let values = invocation.values();
                let line = format!(
                    "{} {}",
                    values.get("env").unwrap_or_default(),
                    values.get_all("hosts").join("+")
                );
                invocation.println(line.trim_end());
                Ok(CommandResult::Success)
            }),
        )
        .unwrap();

    console
        .register(
            CommandSchema::new("server")
                .with_child(
                    CommandSchema::new("start")
                        .with_option(OptionSpec::with_value(Some('p'), Some("port"), ValueType::Number)),
                )
                .with_child(CommandSchema::new("stop")),
            FnCommand::new(|invocation: &mut CommandInvocation<'_>| {
                let values = invocation.values();
                let line = format!(
                    "{} {}",
                    values.command_path().join("/"),
                    values.get("port").unwrap_or("-")
                );
                invocation.println(&line);
                Ok(CommandResult::Success)
            }),
        )
        .unwrap();

    (console, buffer)
}

fn default_console() -> (Console, SharedBuffer) {
    console_with(ConsoleConfig::default())
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[test]
fn test_execute_writes_output() {
    let (mut console, buffer) = default_console();
    let status = console.execute("echo hello 'big world'").unwrap();
    assert!(status.is_success());
    assert_eq!(buffer.contents(), "hello big world\n");
}

#[test]
fn test_pipe_feeds_next_command() {
    let (mut console, buffer) = default_console();
    console.execute("echo abc | upper").unwrap();
    assert_eq!(buffer.contents(), "ABC\n");
}

#[test]
fn test_sequence_operators() {
    let (mut console, buffer) = default_console();
    console.execute("echo a && echo b").unwrap();
    assert_eq!(buffer.contents(), "a\nb\n");

    let (mut console, buffer) = default_console();
    let status = console.execute("fail && echo no || echo yes").unwrap();
    assert!(status.is_success());
    assert_eq!(buffer.contents(), "yes\n");

    let (mut console, buffer) = default_console();
    let status = console.execute("echo x; fail").unwrap();
    assert_eq!(status, CommandResult::Failure(1));
    assert_eq!(buffer.contents(), "x\n");
}

#[test]
fn test_error_aborts_line() {
    let (mut console, buffer) = default_console();
    let error = console.execute("echo first; boom; echo never").unwrap_err();
    assert!(matches!(error, ConsoleError::Command { ref command, .. } if command == "boom"));
    assert_eq!(error.to_string(), "exploded");
    assert_eq!(buffer.contents(), "first\n");
}

#[test]
fn test_redirections() {
    let dir = tempfile::tempdir().unwrap();
    let (console, buffer) = default_console();
    let mut console = console.with_base_dir(dir.path());

    console.execute("echo one > out.txt; echo two >> out.txt").unwrap();
    let written = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
    assert_eq!(written, "one\ntwo\n");
    assert_eq!(buffer.contents(), "");

    console.execute("upper < out.txt").unwrap();
    assert_eq!(buffer.contents(), "ONE\nTWO\n");

    let error = console.execute("upper < missing.txt").unwrap_err();
    assert!(matches!(error, ConsoleError::Io(_)));
}

#[test]
fn test_syntax_errors() {
    let (mut console, _) = default_console();
    assert!(matches!(
        console.execute("echo a |"),
        Err(ConsoleError::EmptyPipeline)
    ));
    assert!(matches!(
        console.execute("echo >"),
        Err(ConsoleError::Syntax(_))
    ));
    assert!(matches!(
        console.execute("echo 'open"),
        Err(ConsoleError::Syntax(_))
    ));
    assert!(console.execute("").unwrap().is_success());
}

#[test]
fn test_operators_disabled() {
    let config = ConsoleConfig {
        operators: false,
        ..Default::default()
    };
    let (mut console, buffer) = console_with(config);
    console.execute("echo a | b && c").unwrap();
    assert_eq!(buffer.contents(), "a | b && c\n");
}

// ---------------------------------------------------------------------------
// Populate, validation and help
// ---------------------------------------------------------------------------

#[test]
fn test_required_option_and_conversion() {
    let (mut console, buffer) = default_console();

    let error = console.execute("deploy").unwrap_err();
    assert!(matches!(error, ConsoleError::Populate { .. }));
    assert_eq!(error.to_string(), "option --env is required");

    let error = console.execute("deploy --env=staging").unwrap_err();
    assert!(error.to_string().contains("one of: dev, prod"));

    console.execute("deploy -e prod --hosts a,b").unwrap();
    assert_eq!(buffer.contents(), "prod a+b\n");
    let values = console.values("deploy").unwrap();
    assert_eq!(values.get_all("hosts"), ["a", "b"]);
}

#[test]
fn test_generated_help() {
    let (mut console, buffer) = default_console();
    console.execute("deploy --help").unwrap();
    let help = buffer.contents();
    assert!(help.starts_with("Usage: deploy [OPTIONS]\n"));
    assert!(help.contains("-e, --env <VALUE>"));
    assert!(help.contains("-h, --help"));
}

#[test]
fn test_group_help_and_dispatch() {
    let (mut console, buffer) = default_console();
    console.execute("server start -p 8080").unwrap();
    console.execute("server stop").unwrap();
    assert_eq!(buffer.contents(), "server/start 8080\nserver/stop -\n");

    let (mut console, buffer) = default_console();
    console.execute("server start --help").unwrap();
    assert!(buffer.contents().starts_with("Usage: server start [OPTIONS]\n"));

    let error = console.execute("server start -p many").unwrap_err();
    assert!(error.to_string().contains("expected a number"));
}

#[test]
fn test_help_disabled() {
    let config = ConsoleConfig {
        generate_help: false,
        ..Default::default()
    };
    let (mut console, _) = console_with(config);
    let error = console.execute("deploy --help").unwrap_err();
    assert_eq!(error.to_string(), "unknown option: --help");
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

fn apply(console: &mut Console, line: &str) -> String {
    console.complete(line, line.len()).apply(line, line.len()).0
}

#[test]
fn test_complete_command_names() {
    let (mut console, _) = default_console();
    assert_eq!(apply(&mut console, "up"), "upper ");
    assert_eq!(apply(&mut console, "echo abc | up"), "echo abc | upper ");
    assert_eq!(apply(&mut console, "fail && de"), "fail && deploy ");

    let completion = console.complete("", 0);
    assert_eq!(completion.target.kind, TargetKind::CommandNames);
    assert_eq!(completion.values().len(), 6);
}

#[test]
fn test_complete_options_and_values() {
    let (mut console, _) = default_console();
    assert_eq!(apply(&mut console, "deploy --e"), "deploy --env=");
    assert_eq!(apply(&mut console, "deploy --env=p"), "deploy --env=prod ");

    let completion = console.complete("deploy --env ", 13);
    assert_eq!(completion.target.kind, TargetKind::CompleteOptionValue);
    assert_eq!(completion.values(), ["dev", "prod"]);

    assert_eq!(apply(&mut console, "server st"), "server st");
    assert_eq!(apply(&mut console, "server sta"), "server start ");
    assert_eq!(apply(&mut console, "server start --po"), "server start --port=");
}

#[test]
fn test_complete_redirect_target() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "").unwrap();
    std::fs::write(dir.path().join("numbers.txt"), "").unwrap();
    let (console, _) = default_console();
    let mut console = console.with_base_dir(dir.path());

    let completion = console.complete("echo x > ", 9);
    assert_eq!(completion.target.kind, TargetKind::RedirectPath);
    assert_eq!(completion.values(), ["notes.txt", "numbers.txt"]);
    assert_eq!(apply(&mut console, "upper < no"), "upper < notes.txt ");
    assert!(console.complete("echo x > notes.txt y", 20).is_empty());
}

#[test]
fn test_complete_without_append_space() {
    let mut config = ConsoleConfig::default();
    config.completion.append_space = false;
    let (mut console, _) = console_with(config);
    assert_eq!(apply(&mut console, "deploy --env=d"), "deploy --env=dev");
    assert_eq!(apply(&mut console, "ech"), "echo");
}

#[test]
fn test_completion_keeps_values_per_command() {
    let (mut console, _) = default_console();
    console.complete("deploy --hosts a,b --e", 22);
    let values = console.values("deploy").unwrap();
    assert_eq!(values.get_all("hosts"), ["a", "b"]);

    console.execute("deploy -e dev").unwrap();
    let values = console.values("deploy").unwrap();
    assert!(values.get_all("hosts").is_empty());
    assert_eq!(values.get("env"), Some("dev"));
}
