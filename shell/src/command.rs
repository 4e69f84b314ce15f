//! The command trait implemented by console commands.
//!
//! A command receives a [`CommandInvocation`]: the populated values of its
//! schema, the piped input when it sits behind a `|` or `<`, and an output
//! buffer. Output is buffered so the console can route it to the next
//! command, a redirect target or its own writer.
//!
//! # Examples
//!
//! ```
//! use cmdshell_core::CommandValues;
//! use cmdshell_shell::{Command, CommandInvocation, CommandResult, FnCommand};
//!
//! let echo = FnCommand::new(|invocation: &mut CommandInvocation<'_>| {
//!     let words = invocation.values().argument().join(" ");
//!     invocation.println(&words);
//!     Ok(CommandResult::Success)
//! });
//!
//! let mut values = CommandValues::default();
//! values.set_argument(vec!["hello".into(), "world".into()]);
//! let mut invocation = CommandInvocation::new(&values, None);
//! assert!(echo.execute(&mut invocation).unwrap().is_success());
//! assert_eq!(invocation.output(), "hello world\n");
//! ```

use std::fmt;

use cmdshell_core::CommandValues;
use thiserror::Error;

/// Exit status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandResult {
    #[default]
    Success,
    /// Non-zero status; `&&` skips and `||` runs the next pipeline.
    Failure(i32),
}

impl CommandResult {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Status code, `0` for success.
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure(code) => code,
        }
    }
}

/// Error reported by a command. Aborts the rest of the line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for CommandError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// One call of a command.
pub struct CommandInvocation<'a> {
    values: &'a CommandValues,
    input: Option<&'a str>,
    output: String,
}

impl<'a> CommandInvocation<'a> {
    pub fn new(values: &'a CommandValues, input: Option<&'a str>) -> Self {
        Self {
            values,
            input,
            output: String::new(),
        }
    }

    /// Populated values of the invoked command.
    pub fn values(&self) -> &'a CommandValues {
        self.values
    }

    /// Output of the previous pipeline stage or contents of the `<` file.
    pub fn input(&self) -> Option<&'a str> {
        self.input
    }

    pub fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn println(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl fmt::Write for CommandInvocation<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

/// A console command.
pub trait Command: Send + Sync {
    fn execute(
        &self,
        invocation: &mut CommandInvocation<'_>,
    ) -> Result<CommandResult, CommandError>;
}

/// Adapts a closure into a [`Command`].
pub struct FnCommand<F> {
    f: F,
}

impl<F> FnCommand<F>
where
    F: Fn(&mut CommandInvocation<'_>) -> Result<CommandResult, CommandError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Command for FnCommand<F>
where
    F: Fn(&mut CommandInvocation<'_>) -> Result<CommandResult, CommandError> + Send + Sync,
{
    fn execute(
        &self,
        invocation: &mut CommandInvocation<'_>,
    ) -> Result<CommandResult, CommandError> {
        (self.f)(invocation)
    }
}

impl<F> fmt::Debug for FnCommand<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCommand")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_invocation_collects_output() {
        let values = CommandValues::default();
        let mut invocation = CommandInvocation::new(&values, Some("piped"));
        invocation.print("a");
        write!(invocation, "{}", 1).unwrap();
        invocation.println("");
        assert_eq!(invocation.input(), Some("piped"));
        assert_eq!(invocation.into_output(), "a1\n");
    }

    #[test]
    fn test_fn_command_failure() {
        let fail = FnCommand::new(|_: &mut CommandInvocation<'_>| Ok(CommandResult::Failure(2)));
        let values = CommandValues::default();
        let mut invocation = CommandInvocation::new(&values, None);
        let result = fail.execute(&mut invocation).unwrap();
        assert!(!result.is_success());
        assert_eq!(result.code(), 2);
    }

    #[test]
    fn test_command_error_message() {
        let error = CommandError::from("disk full");
        assert_eq!(error.to_string(), "disk full");
        assert_eq!(error.message(), "disk full");
    }
}
