//! An embeddable command console for cmdshell schemas.
//!
//! Register a [`CommandSchema`](cmdshell_core::CommandSchema) together with a
//! [`Command`] and the [`Console`] takes care of the rest of a line session:
//!
//! - completing command names, options, option values, arguments, child
//!   commands and redirect targets ([`Console::complete`]);
//! - splitting lines at `;`, `&&`, `||`, `|`, `>`, `>>` and `<`
//!   ([`pipeline`]);
//! - parsing, populating and validating each command's values before it
//!   runs, and printing generated help for `--help` ([`Console::execute`]).
//!
//! [`Executor`] moves a console onto a worker thread fed by a channel.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use cmdshell_core::*;
//! use cmdshell_shell::*;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let log = Arc::clone(&seen);
//!
//! let mut console = Console::new(ConsoleConfig::default()).with_output(std::io::sink());
//! console
//!     .register(
//!         CommandSchema::new("add")
//!             .with_argument(ArgumentSpec::list("numbers", ValueType::Number).required()),
//!         FnCommand::new(move |invocation: &mut CommandInvocation<'_>| {
//!             let sum: i64 = invocation
//!                 .values()
//!                 .argument()
//!                 .iter()
//!                 .filter_map(|n| n.parse::<i64>().ok())
//!                 .sum();
//!             log.lock().unwrap().push(sum);
//!             Ok(CommandResult::Success)
//!         }),
//!     )
//!     .unwrap();
//!
//! console.execute("add 1 2 3; add 10").unwrap();
//! assert_eq!(*seen.lock().unwrap(), [6, 10]);
//! assert!(console.execute("add one").is_err());
//! ```

mod command;
mod config;
mod console;
mod error;
mod executor;
pub mod pipeline;

pub use command::{Command, CommandError, CommandInvocation, CommandResult, FnCommand};
pub use config::{CompletionConfig, ConsoleConfig};
pub use console::Console;
pub use error::{ConsoleError, Result};
pub use executor::{Executor, Outcome};
