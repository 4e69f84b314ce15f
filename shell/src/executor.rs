//! Running a console on a worker thread.
//!
//! The host thread keeps its line editor responsive while commands run: it
//! submits lines over a channel and collects one [`Outcome`] per line from a
//! reply channel, in submission order.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

use crate::command::CommandResult;
use crate::console::Console;
use crate::error::{ConsoleError, Result};

/// Result of one executed line.
#[derive(Debug)]
pub struct Outcome {
    pub line: String,
    pub result: Result<CommandResult>,
}

/// A console owned by a worker thread.
///
/// # Examples
///
/// ```
/// use cmdshell_core::CommandSchema;
/// use cmdshell_shell::*;
///
/// let mut console = Console::default().with_output(std::io::sink());
/// console
///     .register(
///         CommandSchema::new("ping"),
///         FnCommand::new(|_: &mut CommandInvocation<'_>| Ok(CommandResult::Success)),
///     )
///     .unwrap();
///
/// let executor = Executor::spawn(console).unwrap();
/// executor.submit("ping").unwrap();
/// executor.submit("pong").unwrap();
/// assert!(executor.recv().unwrap().result.is_ok());
/// assert!(executor.recv().unwrap().result.is_err());
/// let console = executor.shutdown().unwrap();
/// assert!(console.registry().contains("ping"));
/// ```
#[derive(Debug)]
pub struct Executor {
    lines: Option<Sender<String>>,
    outcomes: Receiver<Outcome>,
    worker: Option<JoinHandle<Console>>,
}

impl Executor {
    /// Moves `console` onto a new worker thread.
    pub fn spawn(mut console: Console) -> Result<Self> {
        let (lines, line_rx) = crossbeam_channel::unbounded::<String>();
        let (outcome_tx, outcomes) = crossbeam_channel::unbounded();

        let worker = thread::Builder::new()
            .name("cmdshell-executor".to_string())
            .spawn(move || {
                for line in line_rx {
                    let result = console.execute(&line);
                    if outcome_tx.send(Outcome { line, result }).is_err() {
                        break;
                    }
                }
                debug!("Executor worker finished");
                console
            })?;

        Ok(Self {
            lines: Some(lines),
            outcomes,
            worker: Some(worker),
        })
    }

    /// Queues a line for execution.
    pub fn submit(&self, line: impl Into<String>) -> Result<()> {
        let sender = self.lines.as_ref().ok_or(ConsoleError::ExecutorStopped)?;
        sender
            .send(line.into())
            .map_err(|_| ConsoleError::ExecutorStopped)
    }

    /// Blocks until the next line has run.
    pub fn recv(&self) -> Result<Outcome> {
        self.outcomes.recv().map_err(|_| ConsoleError::ExecutorStopped)
    }

    /// Returns the next outcome if one is ready.
    pub fn try_recv(&self) -> Option<Outcome> {
        self.outcomes.try_recv().ok()
    }

    /// Stops accepting lines, waits for the queued ones and returns the
    /// console.
    pub fn shutdown(mut self) -> Result<Console> {
        self.lines.take();
        let worker = self.worker.take().ok_or(ConsoleError::ExecutorStopped)?;
        worker.join().map_err(|_| {
            warn!("Executor worker panicked");
            ConsoleError::ExecutorStopped
        })
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.lines.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Executor worker panicked");
            }
        }
    }
}
