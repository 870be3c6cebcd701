//! Error types for k2bot.

use thiserror::Error;

/// Error type for k2bot operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Key template compilation error
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Configuration directive error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lookup table build error
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Per-request evaluation error
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for k2bot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for key template compilation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// `$` at the end of the pattern or followed by an empty name
    #[error("invalid variable name in \"{pattern}\"")]
    InvalidVariableName { pattern: String },

    /// `${name` without a closing bracket
    #[error("the closing bracket in \"{name}\" variable is missing")]
    MissingClosingBracket { name: String },
}

/// Error type for configuration directives.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The directive was already set in this scope
    #[error("\"{directive}\" directive is duplicate")]
    DuplicateDirective { directive: &'static str },

    /// Empty pattern or path argument
    #[error("value \"{value}\" in \"{directive}\" directive is invalid")]
    InvalidPattern {
        directive: &'static str,
        value: String,
    },

    /// Directive name not handled by this module
    #[error("unknown directive \"{0}\"")]
    UnknownDirective(String),

    /// Pattern failed to compile
    #[error("invalid \"lookup_key\" pattern: {0}")]
    Compile(#[from] CompileError),

    /// Table named by `lookup_table` failed to build
    #[error("cannot load \"lookup_table\": {0}")]
    Build(#[from] BuildError),
}

/// Error type for lookup table construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The data source does not exist
    #[error("table source not found: {0}")]
    NotFound(String),

    /// The data source exists but cannot be turned into a table
    #[error("malformed table source {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },
}

/// Error type for per-request key evaluation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    /// The request pool cannot hold the key buffer
    #[error("request pool cannot allocate {requested} bytes ({available} available)")]
    AllocationFailed { requested: usize, available: usize },
}
