//! Declarative schema files.
//!
//! A [`SchemaPackage`] groups command schemas with version metadata and can be
//! stored as JSON or YAML. Plugin references cannot be serialized; they are
//! attached to the loaded schemas in code.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! schemas:
//!   - name: deploy
//!     options:
//!       - long: env
//!         kind: normal
//!         value_type:
//!           choice: [dev, prod]
//!       - short: f
//!         long: force
//!     argument:
//!       name: targets
//!       multiple: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CommandSchema;

/// Version of the schema file contract (semver).
pub const SCHEMA_CONTRACT_VERSION: &str = "1.0.0";

/// Errors raised while loading or saving schema files.
#[derive(Debug, Error)]
pub enum PackageError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A loaded schema failed structural validation.
    #[error("invalid schema '{command}': {source}")]
    InvalidSchema {
        command: String,
        source: crate::SchemaError,
    },
}

/// Convenience alias for results with [`PackageError`].
pub type Result<T> = std::result::Result<T, PackageError>;

/// Serializable bundle of command schemas.
///
/// # Examples
///
/// ```
/// use cmdshell_core::*;
///
/// let mut package = SchemaPackage::new("1.0.0");
/// package.schemas.push(CommandSchema::new("git"));
/// package.schemas.push(CommandSchema::new("docker"));
///
/// assert_eq!(package.schema_count(), 2);
/// assert_eq!(package.schema_version.as_deref(), Some(SCHEMA_CONTRACT_VERSION));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Package format version.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schemas: Vec<CommandSchema>,
}

/// Contents of a schema file: a full package or a single schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SchemaFile {
    Package(SchemaPackage),
    Schema(CommandSchema),
}

impl SchemaPackage {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            schema_version: Some(SCHEMA_CONTRACT_VERSION.to_string()),
            version: version.into(),
            name: None,
            description: None,
            schemas: Vec::new(),
        }
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Loads a package from a JSON or YAML file (chosen by extension).
    ///
    /// A file holding a single [`CommandSchema`] is accepted and wrapped in a
    /// package. Every schema is validated with
    /// [`validate_schema`](crate::validate_schema).
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::IoError`] if the file cannot be read, a
    /// JSON/YAML error if parsing fails, or [`PackageError::InvalidSchema`]
    /// for the first schema that fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let file: SchemaFile = if is_yaml(path) {
            serde_yaml::from_reader(reader)?
        } else {
            serde_json::from_reader(reader)?
        };

        let package = match file {
            SchemaFile::Package(package) => package,
            SchemaFile::Schema(schema) => {
                let mut package = Self::new(SCHEMA_CONTRACT_VERSION);
                package.schemas.push(schema);
                package
            }
        };
        package.validate()?;
        Ok(package)
    }

    /// Saves the package as JSON or YAML (chosen by extension).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(std::fs::File::create(path)?);
        if is_yaml(path) {
            serde_yaml::to_writer(writer, self)?;
        } else {
            serde_json::to_writer_pretty(writer, self)?;
        }
        Ok(())
    }

    /// Validates every schema, stopping at the first failure.
    pub fn validate(&self) -> Result<()> {
        for schema in &self.schemas {
            if let Some(source) = crate::validate_schema(schema).into_iter().next() {
                return Err(PackageError::InvalidSchema {
                    command: schema.name.clone(),
                    source,
                });
            }
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OptionKind, OptionSpec, ValueType};

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemas.yaml");

        let mut package = SchemaPackage::new("1.0");
        package.schemas.push(
            CommandSchema::new("deploy")
                .with_option(OptionSpec::list(Some('t'), Some("tags"), ValueType::String)),
        );
        package.save(&path).unwrap();

        let loaded = SchemaPackage::load(&path).unwrap();
        assert_eq!(loaded.schema_count(), 1);
        assert_eq!(loaded.schemas[0].options[0].kind, OptionKind::List);
    }

    #[test]
    fn test_single_schema_file_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.json");
        std::fs::write(&path, r#"{"name": "echo", "argument": {"name": "words", "multiple": true}}"#)
            .unwrap();

        let loaded = SchemaPackage::load(&path).unwrap();
        assert_eq!(loaded.schemas[0].name, "echo");
        assert_eq!(loaded.version, SCHEMA_CONTRACT_VERSION);
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"name": "bad", "options": [{"long": "x"}, {"long": "x"}]}"#,
        )
        .unwrap();

        let err = SchemaPackage::load(&path).unwrap_err();
        assert!(matches!(err, PackageError::InvalidSchema { .. }));
    }
}
