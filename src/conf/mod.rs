//! Scope configuration: directives, inheritance and binding.
//!
//! Each configuration scope accepts `lookup_key <pattern>` and
//! `lookup_table <path>` at most once. A scope that sets neither inherits
//! its parent's compiled key and table through shared `Arc`s.

mod document;

pub use document::{ConfigBinder, ScopeDocument, ScopeNode, ScopeTree};

use std::sync::Arc;

use crate::error::ConfigError;
use crate::table::{LookupTable, TableLoader};
use crate::template::{self, CompiledTemplate};

/// Directive setting the key pattern.
pub const LOOKUP_KEY: &str = "lookup_key";

/// Directive naming the table source.
pub const LOOKUP_TABLE: &str = "lookup_table";

/// Key of a pattern without variables.
///
/// The stored length accounts for one terminator unit after the bytes, the
/// same reservation an evaluated key gets. Only `bytes` take part in lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralKey {
    bytes: Box<[u8]>,
}

impl LiteralKey {
    fn new(pattern: &str) -> Self {
        Self {
            bytes: pattern.as_bytes().into(),
        }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the stored length, terminator included.
    ///
    /// Mirrors [`KeyBytes::reserved`](crate::KeyBytes::reserved); lookups do
    /// not read it.
    pub fn reserved_len(&self) -> usize {
        self.bytes.len() + 1
    }
}

/// Where a scope's lookup key comes from.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Pattern without variables, used as is
    Literal(LiteralKey),
    /// Compiled pattern, evaluated per request
    Template(Arc<CompiledTemplate>),
}

impl KeySource {
    /// Build the key source for a pattern.
    ///
    /// Patterns without `$` skip compilation entirely.
    pub fn from_pattern(pattern: &str) -> Result<Self, ConfigError> {
        if template::variables_count(pattern) == 0 {
            return Ok(KeySource::Literal(LiteralKey::new(pattern)));
        }

        let compiled = template::compile(pattern)?;
        Ok(KeySource::Template(Arc::new(compiled)))
    }

    /// Check if the key is evaluated per request.
    pub fn is_template(&self) -> bool {
        matches!(self, KeySource::Template(_))
    }
}

/// Configuration of one scope.
#[derive(Debug, Clone, Default)]
pub struct ScopeConf {
    key: Option<KeySource>,
    table: Option<Arc<LookupTable>>,
    table_path: Option<String>,
}

impl ScopeConf {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle `lookup_key <pattern>`.
    pub fn set_key(&mut self, pattern: &str) -> Result<(), ConfigError> {
        if self.key.is_some() {
            return Err(ConfigError::DuplicateDirective {
                directive: LOOKUP_KEY,
            });
        }

        if pattern.is_empty() {
            return Err(ConfigError::InvalidPattern {
                directive: LOOKUP_KEY,
                value: pattern.to_string(),
            });
        }

        self.key = Some(KeySource::from_pattern(pattern)?);
        Ok(())
    }

    /// Handle `lookup_table <path>`, building the table with `loader`.
    pub fn set_table<L>(&mut self, path: &str, loader: &L) -> Result<(), ConfigError>
    where
        L: TableLoader + ?Sized,
    {
        self.check_table_directive(path)?;
        let table = loader.load(path)?;
        self.table = Some(Arc::new(table));
        self.table_path = Some(path.to_string());
        Ok(())
    }

    /// Handle `lookup_table <path>` with a table that is already built.
    pub fn set_table_handle(
        &mut self,
        path: &str,
        table: Arc<LookupTable>,
    ) -> Result<(), ConfigError> {
        self.check_table_directive(path)?;
        self.table = Some(table);
        self.table_path = Some(path.to_string());
        Ok(())
    }

    fn check_table_directive(&self, path: &str) -> Result<(), ConfigError> {
        if self.table_path.is_some() {
            return Err(ConfigError::DuplicateDirective {
                directive: LOOKUP_TABLE,
            });
        }

        if path.is_empty() {
            return Err(ConfigError::InvalidPattern {
                directive: LOOKUP_TABLE,
                value: path.to_string(),
            });
        }

        Ok(())
    }

    /// Dispatch a directive by name.
    pub fn apply<L>(&mut self, directive: &str, arg: &str, loader: &L) -> Result<(), ConfigError>
    where
        L: TableLoader + ?Sized,
    {
        match directive {
            LOOKUP_KEY => self.set_key(arg),
            LOOKUP_TABLE => self.set_table(arg, loader),
            other => Err(ConfigError::UnknownDirective(other.to_string())),
        }
    }

    /// Inherit whatever this scope does not set itself.
    ///
    /// Shares the parent's template and table; nothing is copied.
    pub fn merge(&mut self, parent: &ScopeConf) {
        if self.key.is_none() {
            self.key = parent.key.clone();
        }

        if self.table_path.is_none() {
            self.table = parent.table.clone();
            self.table_path = parent.table_path.clone();
        }
    }

    /// Get the key source.
    pub fn key(&self) -> Option<&KeySource> {
        self.key.as_ref()
    }

    /// Get the table.
    pub fn table(&self) -> Option<&Arc<LookupTable>> {
        self.table.as_ref()
    }

    /// Get the path the table was loaded from.
    pub fn table_path(&self) -> Option<&str> {
        self.table_path.as_deref()
    }
}
