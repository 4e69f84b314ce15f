//! Console configuration.
//!
//! Loaded from YAML or JSON; every field has a default, so a partial file
//! (or none at all) is valid.
//!
//! # Example YAML
//!
//! ```yaml
//! prompt: "app> "
//! operators: true
//! generate_help: true
//! completion:
//!   append_space: true
//!   list_separator: ","
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Completion behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Append a space after a single remaining candidate.
    pub append_space: bool,
    /// Separator used by list and group options that keep the default `,`.
    pub list_separator: char,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            append_space: true,
            list_separator: ',',
        }
    }
}

/// Settings of a [`Console`](crate::Console).
///
/// # Examples
///
/// ```
/// use cmdshell_shell::ConsoleConfig;
///
/// let config = ConsoleConfig::default();
/// assert_eq!(config.prompt, "$ ");
/// assert!(config.operators);
/// assert!(config.completion.append_space);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub prompt: String,
    /// Recognise `| > >> < ; && ||` as control operators.
    pub operators: bool,
    /// Add a `--help` option to registered schemas that lack one.
    pub generate_help: bool,
    pub completion: CompletionConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: "$ ".to_string(),
            operators: true,
            generate_help: true,
            completion: CompletionConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// Loads a configuration file, JSON when the extension is `.json` and
    /// YAML otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::ConsoleError::Io) if the file cannot be read and
    /// [`Json`](crate::ConsoleError::Json) or [`Yaml`](crate::ConsoleError::Yaml)
    /// if it does not deserialize.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let config = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(config)
    }

    /// Saves the configuration, choosing the format like [`load`](Self::load).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(std::fs::File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: ConsoleConfig = serde_yaml::from_str("prompt: \"app> \"\n").unwrap();
        assert_eq!(config.prompt, "app> ");
        assert!(config.generate_help);
        assert_eq!(config.completion.list_separator, ',');
    }

    #[test]
    fn test_save_and_load_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsoleConfig {
            operators: false,
            completion: CompletionConfig {
                append_space: false,
                list_separator: ':',
            },
            ..Default::default()
        };

        for name in ["console.yaml", "console.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(ConsoleConfig::load(&path).unwrap(), config);
        }

        let json = std::fs::read_to_string(dir.path().join("console.json")).unwrap();
        assert!(json.contains("\"list_separator\": \":\""));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConsoleConfig::load(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(crate::ConsoleError::Io(_))));
    }
}
