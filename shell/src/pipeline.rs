//! Splitting a tokenized line at its control operators.
//!
//! `;`, `&&` and `||` separate pipelines; `|` separates the segments of one
//! pipeline; `>`, `>>` and `<` attach a file to the segment they follow.
//!
//! # Examples
//!
//! ```
//! use cmdshell_parser::tokenize;
//! use cmdshell_shell::pipeline::{Connector, Redirect, split};
//!
//! let pipelines = split(&tokenize("ls | sort > out.txt && echo done")).unwrap();
//! assert_eq!(pipelines.len(), 2);
//! assert_eq!(pipelines[0].segments.len(), 2);
//! assert_eq!(
//!     pipelines[0].segments[1].redirect,
//!     Some(Redirect::Overwrite("out.txt".into()))
//! );
//! assert_eq!(pipelines[1].connector, Connector::OnSuccess);
//! ```

use std::path::PathBuf;

use cmdshell_parser::{Operator, Token, TokenizedLine, Word};

use crate::error::{ConsoleError, Result};

/// Where a segment's output goes instead of the next stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// `>`
    Overwrite(PathBuf),
    /// `>>`
    Append(PathBuf),
}

/// One command of a pipeline with its redirections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    pub words: Vec<Word>,
    /// File read as input (`<`).
    pub input: Option<PathBuf>,
    pub redirect: Option<Redirect>,
}

impl Segment {
    pub fn name(&self) -> Option<&str> {
        self.words.first().map(|w| w.text.as_str())
    }
}

/// Condition under which a pipeline runs, relative to the status of the
/// last pipeline that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connector {
    /// First pipeline or after `;`.
    #[default]
    Always,
    /// After `&&`.
    OnSuccess,
    /// After `||`.
    OnFailure,
}

/// Segments joined by `|`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub connector: Connector,
    pub segments: Vec<Segment>,
}

#[derive(Default)]
struct Splitter {
    pipelines: Vec<Pipeline>,
    current: Pipeline,
    segment: Segment,
    pending_file: Option<Operator>,
}

impl Splitter {
    fn word(&mut self, word: &Word) {
        let Some(op) = self.pending_file.take() else {
            self.segment.words.push(word.clone());
            return;
        };
        let path = PathBuf::from(&word.text);
        match op {
            Operator::Input => self.segment.input = Some(path),
            Operator::Append => self.segment.redirect = Some(Redirect::Append(path)),
            _ => self.segment.redirect = Some(Redirect::Overwrite(path)),
        }
    }

    fn operator(&mut self, op: Operator) -> Result<()> {
        if let Some(pending) = self.pending_file {
            return Err(missing_file(pending));
        }
        match op {
            Operator::Redirect | Operator::Append | Operator::Input => {
                self.pending_file = Some(op);
            }
            Operator::Pipe => self.end_segment()?,
            Operator::Sequence => self.end_pipeline(Connector::Always)?,
            Operator::And => self.end_pipeline(Connector::OnSuccess)?,
            Operator::Or => self.end_pipeline(Connector::OnFailure)?,
        }
        Ok(())
    }

    fn end_segment(&mut self) -> Result<()> {
        if self.segment.words.is_empty() {
            return Err(ConsoleError::EmptyPipeline);
        }
        self.current.segments.push(std::mem::take(&mut self.segment));
        Ok(())
    }

    fn end_pipeline(&mut self, next: Connector) -> Result<()> {
        self.end_segment()?;
        let finished = std::mem::replace(
            &mut self.current,
            Pipeline {
                connector: next,
                segments: Vec::new(),
            },
        );
        self.pipelines.push(finished);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Pipeline>> {
        if let Some(pending) = self.pending_file {
            return Err(missing_file(pending));
        }
        let trailing = self.segment.words.is_empty()
            && self.segment.redirect.is_none()
            && self.segment.input.is_none()
            && self.current.segments.is_empty();
        // A trailing `;` ends the line; `&&`, `||` and `|` need a command.
        if trailing && self.current.connector == Connector::Always {
            return Ok(self.pipelines);
        }
        self.end_segment()?;
        self.pipelines.push(self.current);
        Ok(self.pipelines)
    }
}

fn missing_file(op: Operator) -> ConsoleError {
    ConsoleError::Syntax(format!("missing file name after '{op}'"))
}

/// Splits a tokenized line into pipelines.
///
/// An empty line yields no pipelines. An operator without a command on
/// both sides is [`ConsoleError::EmptyPipeline`]; a redirection without a
/// file name is [`ConsoleError::Syntax`].
pub fn split(line: &TokenizedLine) -> Result<Vec<Pipeline>> {
    let mut splitter = Splitter::default();
    for token in &line.tokens {
        match token {
            Token::Word(word) => splitter.word(word),
            Token::Operator { op, .. } => splitter.operator(*op)?,
        }
    }
    splitter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdshell_parser::tokenize;

    fn names(pipeline: &Pipeline) -> Vec<&str> {
        pipeline.segments.iter().filter_map(Segment::name).collect()
    }

    #[test]
    fn test_sequence_connectors() {
        let pipelines = split(&tokenize("a; b && c || d")).unwrap();
        let connectors: Vec<Connector> = pipelines.iter().map(|p| p.connector).collect();
        assert_eq!(
            connectors,
            [
                Connector::Always,
                Connector::Always,
                Connector::OnSuccess,
                Connector::OnFailure
            ]
        );
        assert_eq!(names(&pipelines[3]), ["d"]);
    }

    #[test]
    fn test_redirections() {
        let pipelines = split(&tokenize("sort < in.txt >> log.txt -r")).unwrap();
        let segment = &pipelines[0].segments[0];
        assert_eq!(segment.input, Some(PathBuf::from("in.txt")));
        assert_eq!(segment.redirect, Some(Redirect::Append("log.txt".into())));
        let words: Vec<&str> = segment.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, ["sort", "-r"]);
    }

    #[test]
    fn test_quoted_operators_are_words() {
        let pipelines = split(&tokenize("echo 'a | b' \\; c")).unwrap();
        assert_eq!(pipelines.len(), 1);
        let words: Vec<&str> = pipelines[0].segments[0]
            .words
            .iter()
            .map(|w| w.text.as_str())
            .collect();
        assert_eq!(words, ["echo", "a | b", ";", "c"]);
    }

    #[test]
    fn test_empty_and_trailing() {
        assert!(split(&tokenize("")).unwrap().is_empty());
        assert_eq!(split(&tokenize("a ;")).unwrap().len(), 1);
        assert!(matches!(
            split(&tokenize("a |")),
            Err(ConsoleError::EmptyPipeline)
        ));
        assert!(matches!(
            split(&tokenize("a &&")),
            Err(ConsoleError::EmptyPipeline)
        ));
        assert!(matches!(
            split(&tokenize("; a")),
            Err(ConsoleError::EmptyPipeline)
        ));
        assert!(matches!(
            split(&tokenize("a >")),
            Err(ConsoleError::Syntax(_))
        ));
        assert!(matches!(
            split(&tokenize("a > | b")),
            Err(ConsoleError::Syntax(_))
        ));
    }
}
