//! Shell-style tokenizer.
//!
//! Splits a line into [`Word`]s and control [`Operator`]s. Words keep both
//! their cooked text (quotes and escapes removed) and the byte range of their
//! raw form, so completion can map a position in the cooked text back to a
//! position in the edit buffer.
//!
//! Quoting rules:
//!
//! - `\x` outside quotes yields `x`; a backslash-escaped space does not split.
//! - `'...'` is literal.
//! - `"..."` honours `\"` and `\\`.
//! - `{...}` is kept verbatim (braces included) and may nest, so a group
//!   value such as `{a=1, b=2}` stays one word.
//!
//! # Examples
//!
//! ```
//! use cmdshell_parser::tokenizer::{tokenize, Operator, Token};
//!
//! let line = tokenize(r#"grep "two words" foo\ bar | wc -l"#);
//! let words: Vec<_> = line.words().map(|w| w.text.as_str()).collect();
//! assert_eq!(words, ["grep", "two words", "foo bar", "wc", "-l"]);
//! assert!(matches!(line.tokens[3], Token::Operator { op: Operator::Pipe, .. }));
//! ```

use std::fmt;

use serde::Serialize;

/// Quote style left open at the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteKind {
    Single,
    Double,
    Brace,
}

impl QuoteKind {
    /// Character that closes the quote.
    pub fn closing(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
            Self::Brace => '}',
        }
    }
}

/// Control operator between commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `|`
    Pipe,
    /// `>`
    Redirect,
    /// `>>`
    Append,
    /// `<`
    Input,
    /// `;`
    Sequence,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pipe => "|",
            Self::Redirect => ">",
            Self::Append => ">>",
            Self::Input => "<",
            Self::Sequence => ";",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Operators whose right-hand side is a file name rather than a command.
    pub fn takes_file(self) -> bool {
        matches!(self, Self::Redirect | Self::Append | Self::Input)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A word of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Cooked text: quotes removed, escapes resolved.
    pub text: String,
    /// Raw text as typed.
    pub raw: String,
    /// Byte offset of the raw word in the line.
    pub start: usize,
    /// Byte offset just past the raw word.
    pub end: usize,
    /// `(text index, line offset)` of every cooked char.
    positions: Vec<(usize, usize)>,
}

impl Word {
    /// Returns `true` if the raw word starts with a dash and is more than a
    /// bare `-`. Quoted words such as `"-x"` are plain values.
    pub fn is_option_like(&self) -> bool {
        self.raw.starts_with('-') && self.text.len() > 1
    }

    /// Line offset of the cooked byte at `text_index`, or [`Word::end`] when
    /// the index is past the cooked text.
    pub fn line_offset(&self, text_index: usize) -> usize {
        self.positions
            .iter()
            .find(|(t, _)| *t >= text_index)
            .map_or(self.end, |(_, line)| *line)
    }

    /// Line offset of the first cooked char (after an opening quote).
    pub fn content_start(&self) -> usize {
        self.line_offset(0)
    }
}

/// A token of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(Word),
    Operator {
        op: Operator,
        start: usize,
        end: usize,
    },
}

/// The tokenized form of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedLine {
    pub tokens: Vec<Token>,
    /// The line ends with an unquoted, unescaped blank.
    pub ends_with_space: bool,
    /// Quote left open at the end of the line.
    pub open_quote: Option<QuoteKind>,
    /// The line ends with a lone backslash.
    pub ends_with_escape: bool,
}

impl TokenizedLine {
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Word(word) => Some(word),
            Token::Operator { .. } => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Words after the last operator.
    pub fn last_segment(&self) -> &[Token] {
        let start = self
            .tokens
            .iter()
            .rposition(|t| matches!(t, Token::Operator { .. }))
            .map_or(0, |i| i + 1);
        &self.tokens[start..]
    }

    /// Operator preceding the last segment, if any.
    pub fn last_operator(&self) -> Option<Operator> {
        self.tokens.iter().rev().find_map(|t| match t {
            Token::Operator { op, .. } => Some(*op),
            Token::Word(_) => None,
        })
    }

    /// Cloned words of the last segment.
    pub fn last_segment_words(&self) -> Vec<Word> {
        self.last_segment()
            .iter()
            .filter_map(|t| match t {
                Token::Word(word) => Some(word.clone()),
                Token::Operator { .. } => None,
            })
            .collect()
    }

    /// Returns `true` if the last word is still being typed.
    pub fn last_word_open(&self) -> bool {
        matches!(self.tokens.last(), Some(Token::Word(_))) && !self.ends_with_space
    }
}

/// Tokenizer settings.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    /// Recognise `| > >> < ; && ||`. When off, those chars are plain text.
    pub operators: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self { operators: true }
    }
}

#[derive(Default)]
struct WordBuilder {
    text: String,
    start: usize,
    positions: Vec<(usize, usize)>,
}

impl WordBuilder {
    fn push(&mut self, c: char, at: usize) {
        self.positions.push((self.text.len(), at));
        self.text.push(c);
    }

    fn finish(self, line: &str, end: usize) -> Word {
        Word {
            text: self.text,
            raw: line[self.start..end].to_string(),
            start: self.start,
            end,
            positions: self.positions,
        }
    }
}

impl Tokenizer {
    /// Tokenizes the text before `cursor`.
    pub fn tokenize_to_cursor(&self, line: &str, cursor: usize) -> TokenizedLine {
        self.tokenize(&line[..floor_char_boundary(line, cursor)])
    }

    pub fn tokenize(&self, line: &str) -> TokenizedLine {
        let mut tokens = Vec::new();
        let mut current: Option<WordBuilder> = None;
        let mut quote: Option<QuoteKind> = None;
        let mut depth = 0usize;
        let mut trailing_space = false;
        let mut ends_with_escape = false;
        let mut chars = line.char_indices().peekable();

        macro_rules! word {
            ($at:expr) => {
                current.get_or_insert_with(|| WordBuilder {
                    start: $at,
                    ..Default::default()
                })
            };
        }

        while let Some((i, c)) = chars.next() {
            trailing_space = false;
            match quote {
                Some(QuoteKind::Single) => {
                    if c == '\'' {
                        quote = None;
                    } else {
                        word!(i).push(c, i);
                    }
                }
                Some(QuoteKind::Double) => match c {
                    '"' => quote = None,
                    '\\' if matches!(chars.peek(), Some((_, '"' | '\\'))) => {
                        if let Some((_, next)) = chars.next() {
                            word!(i).push(next, i);
                        }
                    }
                    _ => word!(i).push(c, i),
                },
                Some(QuoteKind::Brace) => {
                    word!(i).push(c, i);
                    if c == '{' {
                        depth += 1;
                    } else if c == '}' {
                        depth -= 1;
                        if depth == 0 {
                            quote = None;
                        }
                    }
                }
                None => match c {
                    '\\' => match chars.next() {
                        Some((_, next)) => word!(i).push(next, i),
                        None => {
                            word!(i);
                            ends_with_escape = true;
                        }
                    },
                    ' ' | '\t' => {
                        if let Some(builder) = current.take() {
                            tokens.push(Token::Word(builder.finish(line, i)));
                        }
                        trailing_space = true;
                    }
                    '\'' => {
                        word!(i);
                        quote = Some(QuoteKind::Single);
                    }
                    '"' => {
                        word!(i);
                        quote = Some(QuoteKind::Double);
                    }
                    '{' => {
                        word!(i).push(c, i);
                        quote = Some(QuoteKind::Brace);
                        depth = 1;
                    }
                    '|' | '>' | '<' | ';' | '&' if self.operators => {
                        let next = chars.peek().map(|(_, n)| *n);
                        let (op, len) = match (c, next) {
                            ('|', Some('|')) => (Operator::Or, 2),
                            ('|', _) => (Operator::Pipe, 1),
                            ('>', Some('>')) => (Operator::Append, 2),
                            ('>', _) => (Operator::Redirect, 1),
                            ('<', _) => (Operator::Input, 1),
                            (';', _) => (Operator::Sequence, 1),
                            ('&', Some('&')) => (Operator::And, 2),
                            _ => {
                                word!(i).push(c, i);
                                continue;
                            }
                        };
                        if len == 2 {
                            chars.next();
                        }
                        if let Some(builder) = current.take() {
                            tokens.push(Token::Word(builder.finish(line, i)));
                        }
                        tokens.push(Token::Operator {
                            op,
                            start: i,
                            end: i + len,
                        });
                    }
                    _ => word!(i).push(c, i),
                },
            }
        }

        if let Some(builder) = current.take() {
            tokens.push(Token::Word(builder.finish(line, line.len())));
        }

        TokenizedLine {
            tokens,
            ends_with_space: trailing_space && quote.is_none(),
            open_quote: quote,
            ends_with_escape,
        }
    }
}

/// Tokenizes a line with operators enabled.
pub fn tokenize(line: &str) -> TokenizedLine {
    Tokenizer::default().tokenize(line)
}

/// Tokenizes the text before `cursor`, clamped to the line and moved back to
/// a char boundary.
pub fn tokenize_to_cursor(line: &str, cursor: usize) -> TokenizedLine {
    Tokenizer::default().tokenize_to_cursor(line, cursor)
}

/// Largest char boundary of `line` at or before `index`.
pub fn floor_char_boundary(line: &str, index: usize) -> usize {
    let mut index = index.min(line.len());
    while !line.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn needs_escape(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\\' | '\'' | '"' | '{' | '|' | '>' | '<' | ';' | '&'
    )
}

/// Escapes a value so the tokenizer reads it back as one word.
///
/// # Examples
///
/// ```
/// use cmdshell_parser::tokenizer::{escape, unescape};
///
/// assert_eq!(escape("bar 2"), r"bar\ 2");
/// assert_eq!(unescape(r"bar\ 2"), "bar 2");
/// ```
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Resolves backslash escapes.
pub fn unescape(value: &str) -> String {
    let mut chars = value.chars();
    let mut unescaped = String::with_capacity(value.len());
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                unescaped.push(next);
            }
        } else {
            unescaped.push(c);
        }
    }
    unescaped
}
