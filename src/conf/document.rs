//! YAML configuration documents and the scope tree they bind to.
//!
//! ```yaml
//! lookup_key: "$http_user_agent"
//! lookup_table: bots
//! scopes:
//!   api:
//!     lookup_key: "api:$http_user_agent"
//!   legacy:
//!     directives:
//!       - [lookup_table, legacy_bots]
//! ```

use ahash::AHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::{ScopeConf, LOOKUP_KEY, LOOKUP_TABLE};
use crate::error::{ConfigError, Result};
use crate::table::{LookupTable, TableLoader};

/// One scope as written in a configuration document.
///
/// `lookup_key` and `lookup_table` are applied first, then `directives` in
/// order, so setting a directive both ways is a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeDocument {
    /// Key pattern
    pub lookup_key: Option<String>,
    /// Table source
    pub lookup_table: Option<String>,
    /// Raw `(directive, argument)` pairs
    pub directives: Vec<(String, String)>,
    /// Nested scopes by name
    pub scopes: BTreeMap<String, ScopeDocument>,
}

impl ScopeDocument {
    /// Parse a document from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    fn directive_list(&self) -> impl Iterator<Item = (&str, &str)> {
        let key = self.lookup_key.as_deref().map(|v| (LOOKUP_KEY, v));
        let table = self.lookup_table.as_deref().map(|v| (LOOKUP_TABLE, v));
        key.into_iter().chain(table).chain(
            self.directives
                .iter()
                .map(|(d, v)| (d.as_str(), v.as_str())),
        )
    }
}

/// Bound scope with its merged configuration.
#[derive(Debug, Clone)]
pub struct ScopeNode {
    conf: ScopeConf,
    children: BTreeMap<String, ScopeNode>,
}

impl ScopeNode {
    /// Get the merged configuration of this scope.
    pub fn conf(&self) -> &ScopeConf {
        &self.conf
    }

    /// Get a direct child scope.
    pub fn child(&self, name: &str) -> Option<&ScopeNode> {
        self.children.get(name)
    }

    /// Iterate over the direct child scopes.
    pub fn children(&self) -> impl Iterator<Item = (&str, &ScopeNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn count(&self) -> usize {
        1 + self.children.values().map(ScopeNode::count).sum::<usize>()
    }
}

/// Fully bound and merged configuration.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    root: ScopeNode,
}

impl ScopeTree {
    /// Get the root scope.
    pub fn root(&self) -> &ScopeNode {
        &self.root
    }

    /// Look up a scope by `/`-separated path. The empty path is the root.
    pub fn get(&self, path: &str) -> Option<&ScopeConf> {
        let mut node = &self.root;
        for name in path.split('/').filter(|s| !s.is_empty()) {
            node = node.child(name)?;
        }
        Some(&node.conf)
    }

    /// Get the total number of scopes.
    pub fn scope_count(&self) -> usize {
        self.root.count()
    }
}

/// Applies configuration documents, loading each table source once.
pub struct ConfigBinder<'a, L: TableLoader + ?Sized> {
    loader: &'a L,
    tables: AHashMap<String, Arc<LookupTable>>,
}

impl<'a, L: TableLoader + ?Sized> ConfigBinder<'a, L> {
    /// Create a binder building tables with `loader`.
    pub fn new(loader: &'a L) -> Self {
        Self {
            loader,
            tables: AHashMap::new(),
        }
    }

    /// Bind a YAML document.
    pub fn bind_str(&mut self, yaml: &str) -> Result<ScopeTree> {
        let document = ScopeDocument::from_yaml(yaml)?;
        Ok(self.bind(&document)?)
    }

    /// Bind a YAML file.
    pub fn bind_file(&mut self, path: &Path) -> Result<ScopeTree> {
        let yaml = std::fs::read_to_string(path)?;
        self.bind_str(&yaml)
    }

    /// Bind a parsed document.
    pub fn bind(
        &mut self,
        document: &ScopeDocument,
    ) -> std::result::Result<ScopeTree, ConfigError> {
        let root = self.bind_scope(document, None)?;
        let tree = ScopeTree { root };

        log::info!(
            "Bound configuration: {} scopes, {} tables",
            tree.scope_count(),
            self.tables.len()
        );

        Ok(tree)
    }

    /// Get the number of distinct tables loaded so far.
    pub fn tables_loaded(&self) -> usize {
        self.tables.len()
    }

    fn bind_scope(
        &mut self,
        document: &ScopeDocument,
        parent: Option<&ScopeConf>,
    ) -> std::result::Result<ScopeNode, ConfigError> {
        let mut conf = ScopeConf::new();

        for (directive, arg) in document.directive_list() {
            match directive {
                LOOKUP_TABLE => {
                    // Reject a duplicate before the loader runs
                    conf.check_table_directive(arg)?;
                    let table = self.table(arg)?;
                    conf.set_table_handle(arg, table)?;
                }
                _ => conf.apply(directive, arg, self.loader)?,
            }
        }

        if let Some(parent) = parent {
            conf.merge(parent);
        }

        let mut children = BTreeMap::new();
        for (name, child) in &document.scopes {
            let node = self.bind_scope(child, Some(&conf))?;
            children.insert(name.clone(), node);
        }

        Ok(ScopeNode { conf, children })
    }

    /// Get the shared table for `path`, loading it on first use.
    fn table(&mut self, path: &str) -> std::result::Result<Arc<LookupTable>, ConfigError> {
        if let Some(table) = self.tables.get(path) {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(self.loader.load(path)?);
        self.tables.insert(path.to_string(), Arc::clone(&table));
        Ok(table)
    }
}
