//! Line parsing and completion for cmdshell.
//!
//! The pipeline for one command line:
//!
//! 1. [`tokenizer`] splits the line into words and control operators,
//!    honouring quotes and backslash-escaped spaces.
//! 2. [`parse`] matches the words of one command against its
//!    [`CommandSchema`](cmdshell_core::CommandSchema), descending into child
//!    commands, and returns a fresh [`ParsedLine`].
//! 3. [`populate`] assigns the parsed line to a reusable
//!    [`CommandValues`](cmdshell_core::CommandValues), applying defaults and,
//!    before execution, type checks and validators.
//!
//! Completion reuses the first two steps: [`resolve`] decides what the word
//! under the cursor is, and [`complete`] produces the candidates.
//!
//! # Examples
//!
//! ```
//! use cmdshell_core::*;
//! use cmdshell_parser::*;
//!
//! let schema = CommandSchema::new("greet")
//!     .with_option(OptionSpec::with_value(Some('n'), Some("name"), ValueType::String))
//!     .with_option(OptionSpec::boolean(Some('l'), Some("loud")));
//!
//! let parsed = parse_line(&schema, "greet -l --name=World", ParseMode::strict());
//! let mut values = CommandValues::default();
//! populate(&mut values, &parsed, true).unwrap();
//! assert_eq!(values.get("name"), Some("World"));
//! assert!(values.flag("loud"));
//!
//! let completion = complete(&schema, "greet --lo", 10);
//! assert_eq!(completion.apply("greet --lo", 10).0, "greet --loud ");
//! ```

pub mod complete;
pub mod completers;
mod error;
mod help;
pub mod line;
pub mod parser;
mod populate;
pub mod tokenizer;

pub use complete::{
    Completion, CompletionTarget, Resolution, TargetKind, TargetSummary, complete, complete_tokens,
    complete_with, resolve, resolve_tokens,
};
pub use completers::{BoolCompleter, ChoiceCompleter, FileCompleter};
pub use error::{ParseError, PopulateError, Result};
pub use help::render_help;
pub use line::{LastTouched, ParsedArgument, ParsedLine, ParsedOption};
pub use parser::{ParseMode, parse, parse_line, resolve_child};
pub use populate::{assign, populate};
pub use tokenizer::{
    Operator, QuoteKind, Token, TokenizedLine, Tokenizer, Word, escape, floor_char_boundary,
    tokenize, tokenize_to_cursor, unescape,
};
