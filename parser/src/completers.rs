//! Built-in completers used when an option or argument declares neither a
//! completer nor default values.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use cmdshell_core::{Completer, CompleterContext, ValueType};

/// Completes one of a fixed set of values.
#[derive(Debug, Clone)]
pub struct ChoiceCompleter {
    choices: Vec<String>,
}

impl ChoiceCompleter {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

impl Completer for ChoiceCompleter {
    fn complete(&self, context: &mut CompleterContext<'_>) {
        context.add_all(self.choices.iter().cloned());
    }
}

/// Completes `true` and `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCompleter;

impl Completer for BoolCompleter {
    fn complete(&self, context: &mut CompleterContext<'_>) {
        context.add_all(["true", "false"]);
    }
}

/// Completes paths relative to a base directory.
///
/// Candidates are the partial's directory part followed by each matching
/// entry name; directories end with the path separator and do not get a
/// trailing space, so completion can continue into them.
#[derive(Debug, Clone)]
pub struct FileCompleter {
    base: PathBuf,
    directories_only: bool,
}

impl FileCompleter {
    /// Files and directories under the current directory.
    pub fn files() -> Self {
        Self {
            base: PathBuf::from("."),
            directories_only: false,
        }
    }

    /// Directories only.
    pub fn directories() -> Self {
        Self {
            directories_only: true,
            ..Self::files()
        }
    }

    /// Resolves relative partials against `base` instead of the current
    /// directory.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = base.into();
        self
    }
}

impl Completer for FileCompleter {
    fn complete(&self, context: &mut CompleterContext<'_>) {
        let partial = context.partial();
        let (dir_part, name_part) = match partial.rfind(['/', MAIN_SEPARATOR]) {
            Some(index) => partial.split_at(index + 1),
            None => ("", partial),
        };

        let dir = if Path::new(dir_part).is_absolute() {
            PathBuf::from(dir_part)
        } else {
            self.base.join(dir_part)
        };
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return;
        };

        let mut found: Vec<(String, bool)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let is_dir = entry.file_type().ok()?.is_dir();
                Some((name, is_dir))
            })
            .filter(|(name, is_dir)| {
                name.starts_with(name_part)
                    && (!name.starts_with('.') || name_part.starts_with('.'))
                    && (*is_dir || !self.directories_only)
            })
            .collect();
        found.sort();

        let single_dir = found.len() == 1 && found[0].1;
        let dir_part = dir_part.to_string();
        for (name, is_dir) in found {
            let suffix = if is_dir { "/" } else { "" };
            context.add(format!("{dir_part}{name}{suffix}"));
        }
        if single_dir {
            context.set_append_separator(false);
        }
    }
}

/// Built-in completer for a value type, if there is one.
pub fn for_value_type(value_type: &ValueType) -> Option<Box<dyn Completer>> {
    match value_type {
        ValueType::Bool => Some(Box::new(BoolCompleter)),
        ValueType::Choice(choices) => Some(Box::new(ChoiceCompleter::new(choices.iter().cloned()))),
        ValueType::File => Some(Box::new(FileCompleter::files())),
        ValueType::Directory => Some(Box::new(FileCompleter::directories())),
        ValueType::String | ValueType::Number | ValueType::Any => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdshell_core::CommandValues;

    fn run(completer: &dyn Completer, partial: &str) -> (Vec<String>, bool) {
        let values = CommandValues::default();
        let mut context = CompleterContext::new(partial, &values);
        completer.complete(&mut context);
        let append = context.append_separator();
        (context.take_candidates(), append)
    }

    #[test]
    fn test_file_completer_lists_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "").unwrap();
        std::fs::write(dir.path().join("lib.rs"), "").unwrap();
        std::fs::write(dir.path().join(".hidden"), "").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src").join("mod.rs"), "").unwrap();

        let files = FileCompleter::files().with_base(dir.path());
        let (all, _) = run(&files, "");
        assert_eq!(all, ["lib.rs", "main.rs", "src/"]);

        let (nested, append) = run(&files, "src/m");
        assert_eq!(nested, ["src/mod.rs"]);
        assert!(append);

        let dirs = FileCompleter::directories().with_base(dir.path());
        let (only, append) = run(&dirs, "");
        assert_eq!(only, ["src/"]);
        assert!(!append);
    }

    #[test]
    fn test_file_completer_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileCompleter::files().with_base(dir.path());
        assert!(run(&files, "nope/x").0.is_empty());
    }

    #[test]
    fn test_value_type_completers() {
        let bool_completer = for_value_type(&ValueType::Bool).unwrap();
        assert_eq!(run(bool_completer.as_ref(), "").0, ["true", "false"]);
        assert!(for_value_type(&ValueType::String).is_none());
    }
}
