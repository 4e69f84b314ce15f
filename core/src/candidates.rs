//! Completion candidate sets.
//!
//! A [`CompletionCandidates`] value is the hand-off between the completion
//! engine and whatever owns the edit buffer. Every [`Candidate`] carries the
//! byte offset where its replacement starts; the replaced region always ends
//! at the cursor.

use serde::Serialize;

/// A single completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Text to insert, already escaped for the command line.
    pub value: String,
    /// Byte offset in the line where the replacement starts.
    pub offset: usize,
    /// Whether the unescaped value contains spaces.
    pub contains_spaces: bool,
}

impl Candidate {
    pub fn new(value: impl Into<String>, offset: usize) -> Self {
        let value = value.into();
        let contains_spaces = value.contains(' ');
        Self {
            value,
            offset,
            contains_spaces,
        }
    }
}

/// Ordered candidates plus the rules for applying them.
///
/// # Examples
///
/// ```
/// use cmdshell_core::{Candidate, CompletionCandidates};
///
/// let mut set = CompletionCandidates::default();
/// set.push(Candidate::new("--verbose", 4));
///
/// let (line, cursor) = set.apply("cmd --ve", 8);
/// assert_eq!(line, "cmd --verbose ");
/// assert_eq!(cursor, 14);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionCandidates {
    pub candidates: Vec<Candidate>,
    /// Appended after a single candidate when `append_separator` holds.
    pub separator: char,
    /// Candidates were inserted at the cursor instead of replacing text.
    pub ignore_offset: bool,
    /// Candidates were not filtered against the partial value.
    pub ignore_starts_with: bool,
    /// Append `separator` when exactly one candidate remains.
    pub append_separator: bool,
}

impl Default for CompletionCandidates {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            separator: ' ',
            ignore_offset: false,
            ignore_starts_with: false,
            append_separator: true,
        }
    }
}

impl CompletionCandidates {
    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate values in order.
    pub fn values(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.value.as_str()).collect()
    }

    /// Longest common prefix of every candidate value, in whole chars.
    pub fn common_prefix(&self) -> String {
        let Some(first) = self.candidates.first() else {
            return String::new();
        };
        let mut end = first.value.len();
        for candidate in &self.candidates[1..] {
            end = first
                .value
                .char_indices()
                .zip(candidate.value.chars())
                .find(|((_, a), b)| a != b)
                .map_or(end.min(candidate.value.len()), |((i, _), _)| i)
                .min(end);
        }
        first.value[..end].to_string()
    }

    /// Applies the candidates to `line` with the cursor at byte `cursor`.
    ///
    /// A single candidate replaces `offset..cursor` and gets the separator
    /// appended when `append_separator` holds. Several candidates sharing an
    /// offset insert their longest common prefix when it extends the text
    /// already typed. Returns the new line and cursor.
    pub fn apply(&self, line: &str, cursor: usize) -> (String, usize) {
        let unchanged = (line.to_string(), cursor);
        let Some(first) = self.candidates.first() else {
            return unchanged;
        };
        if first.offset > cursor || cursor > line.len() {
            return unchanged;
        }

        let replacement = if self.candidates.len() == 1 {
            let mut value = first.value.clone();
            if self.append_separator {
                value.push(self.separator);
            }
            value
        } else {
            if self.candidates.iter().any(|c| c.offset != first.offset) {
                return unchanged;
            }
            let prefix = self.common_prefix();
            let typed = &line[first.offset..cursor];
            if prefix.len() <= typed.len() || !prefix.starts_with(typed) {
                return unchanged;
            }
            prefix
        };

        let mut result = String::with_capacity(line.len() + replacement.len());
        result.push_str(&line[..first.offset]);
        result.push_str(&replacement);
        let new_cursor = result.len();
        result.push_str(&line[cursor..]);
        (result, new_cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str], offset: usize) -> CompletionCandidates {
        let mut set = CompletionCandidates::default();
        for v in values {
            set.push(Candidate::new(*v, offset));
        }
        set
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(set(&["--value", "--values", "--verbose"], 0).common_prefix(), "--v");
        assert_eq!(set(&["abc", "ab"], 0).common_prefix(), "ab");
        assert_eq!(set(&[], 0).common_prefix(), "");
    }

    #[test]
    fn test_apply_multiple_inserts_common_prefix() {
        let candidates = set(&["--value=", "--values="], 4);
        let (line, cursor) = candidates.apply("cmd --v", 7);
        assert_eq!(line, "cmd --value");
        assert_eq!(cursor, 11);
    }

    #[test]
    fn test_apply_multiple_without_progress_is_noop() {
        let candidates = set(&["--all", "--bar"], 4);
        assert_eq!(candidates.apply("cmd --", 6), ("cmd --".to_string(), 6));
    }

    #[test]
    fn test_apply_single_without_separator() {
        let mut candidates = set(&["--name="], 4);
        candidates.append_separator = false;
        assert_eq!(candidates.apply("cmd --na", 8), ("cmd --name=".to_string(), 11));
    }

    #[test]
    fn test_apply_keeps_text_after_cursor() {
        let candidates = set(&["foo"], 4);
        assert_eq!(candidates.apply("cmd f bar", 5), ("cmd foo  bar".to_string(), 8));
    }

    #[test]
    fn test_contains_spaces() {
        assert!(Candidate::new("bar 2", 0).contains_spaces);
        assert!(!Candidate::new("bar", 0).contains_spaces);
    }
}
