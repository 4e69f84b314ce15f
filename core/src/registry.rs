//! Command registry with O(1) lookup by name or alias.
//!
//! Schemas are stored behind [`Arc`] so one catalog can be shared by several
//! line sessions; parsing never mutates a schema.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{CommandSchema, SchemaPackage};

/// In-memory collection of command schemas.
///
/// # Examples
///
/// ```
/// use cmdshell_core::{CommandRegistry, CommandSchema};
///
/// let mut registry = CommandRegistry::new();
/// registry.insert(CommandSchema::new("list").with_alias("ls"));
///
/// assert!(registry.get("ls").is_some());
/// assert_eq!(registry.find_for_line("  ls -l").unwrap().name, "list");
/// assert_eq!(registry.complete_name("l"), vec!["list", "ls"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    schemas: HashMap<String, Arc<CommandSchema>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from every schema of a package.
    pub fn from_package(package: SchemaPackage) -> Self {
        let mut registry = Self::new();
        for schema in package.schemas {
            registry.insert(schema);
        }
        registry
    }

    /// Inserts a schema, replacing any existing entry with the same name.
    ///
    /// Returns the replaced schema.
    pub fn insert(&mut self, schema: CommandSchema) -> Option<Arc<CommandSchema>> {
        let name = schema.name.clone();
        if let Some(previous) = self.schemas.get(&name) {
            for alias in &previous.aliases {
                self.aliases.remove(alias);
            }
        }
        for alias in &schema.aliases {
            self.aliases.insert(alias.clone(), name.clone());
        }
        self.schemas.insert(name, Arc::new(schema))
    }

    /// Removes a schema by name.
    pub fn remove(&mut self, name: &str) -> Option<Arc<CommandSchema>> {
        let removed = self.schemas.remove(name)?;
        for alias in &removed.aliases {
            self.aliases.remove(alias);
        }
        Some(removed)
    }

    /// Looks up a schema by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<CommandSchema>> {
        let canonical = self.aliases.get(name).map_or(name, String::as_str);
        self.schemas.get(canonical).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Looks up the schema named by the first word of `line`.
    pub fn find_for_line(&self, line: &str) -> Option<Arc<CommandSchema>> {
        let first = line.split_whitespace().next()?;
        self.get(first)
    }

    /// Command names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names and aliases starting with `prefix`, sorted.
    pub fn complete_name(&self, prefix: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .schemas
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str)
            .filter(|n| n.starts_with(prefix))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<CommandSchema>> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_aliases() {
        let mut registry = CommandRegistry::new();
        registry.insert(CommandSchema::new("list").with_alias("ls"));
        let previous = registry.insert(CommandSchema::new("list").with_alias("dir"));

        assert!(previous.is_some());
        assert!(registry.get("ls").is_none());
        assert!(registry.get("dir").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_drops_aliases() {
        let mut registry = CommandRegistry::new();
        registry.insert(CommandSchema::new("list").with_alias("ls"));
        registry.remove("list");

        assert!(registry.is_empty());
        assert!(!registry.contains("ls"));
    }

    #[test]
    fn test_find_for_line_on_blank_line() {
        let registry = CommandRegistry::new();
        assert!(registry.find_for_line("   ").is_none());
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = CommandRegistry::new();
        registry.insert(CommandSchema::new("zip"));
        registry.insert(CommandSchema::new("cat"));
        assert_eq!(registry.names(), vec!["cat", "zip"]);
    }
}
