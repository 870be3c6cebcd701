//! K2Bot - request classification by templated key lookup.
//!
//! This crate classifies a request by building a lookup key from request
//! data and looking it up in a preloaded, read-only table. The matched value
//! (for example `search-engine` for a crawler user agent) is exposed as the
//! `is_bot` variable.
//!
//! # Features
//!
//! - **Key templates**: `prefix-$http_user_agent` style patterns, compiled once
//! - **Two-pass evaluation**: key buffers are sized before they are written
//! - **Immutable tables**: hash-over-tree lookup, shared without locks
//! - **Per-request memoization**: at most one evaluation per request
//! - **Scoped configuration**: nested scopes inherit key and table
//!
//! # Quick Start
//!
//! ```
//! use k2bot::{LookupTable, Outcome, RequestLookup, RequestPool, RequestVariables, ScopeConf};
//! use std::sync::Arc;
//!
//! // Configuration time
//! let table = LookupTable::from_entries([("Googlebot", "search-engine")]);
//! let mut conf = ScopeConf::new();
//! conf.set_key("$http_user_agent").unwrap();
//! conf.set_table_handle("bots", Arc::new(table)).unwrap();
//!
//! // Request time
//! let mut vars = RequestVariables::new();
//! vars.set("http_user_agent", "Googlebot");
//! let pool = RequestPool::unbounded();
//!
//! let lookup = RequestLookup::new(&conf);
//! let is_bot = lookup.variable(&vars, &pool).unwrap();
//! assert_eq!(is_bot.as_str(), Some("search-engine"));
//! ```
//!
//! # Outcomes
//!
//! - **Found**: the key is in the table; the stored value is returned
//! - **NotFound**: the key is not in the table
//! - **NotApplicable**: no table, or an empty one

mod error;
mod pool;
mod request;
mod resolver;
mod variable;

pub mod conf;
pub mod table;
pub mod template;

// Re-export core types
pub use error::{BuildError, CompileError, ConfigError, Error, EvalError, Result};
pub use pool::{RequestPool, ScopedAllocator};
pub use request::{Outcome, RequestLookup};
pub use resolver::{FnResolver, RequestVariables, VariableResolver};
pub use variable::{VariableFlags, VariableValue, IS_BOT_VARIABLE};

// Re-export configuration types
pub use conf::{ConfigBinder, KeySource, ScopeConf, ScopeDocument, ScopeTree};

// Re-export table types
pub use table::{LookupTable, MemoryLoader, TableBuilder, TableLoader};

// Re-export template types
pub use template::{CompiledTemplate, KeyBytes, Segment};
