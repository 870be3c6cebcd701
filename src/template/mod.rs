//! Key templates: compiled once per configuration scope, evaluated per request.
//!
//! A pattern such as `prefix-$http_user_agent-suffix` is compiled into an
//! ordered list of [`Segment`]s. Evaluation walks the list twice: once to
//! size the key buffer, once to fill it.
//!
//! # Example
//!
//! ```
//! use k2bot::template::{compile, evaluate};
//! use k2bot::{RequestPool, RequestVariables};
//!
//! let template = compile("prefix-$ua-suffix").unwrap();
//!
//! let mut vars = RequestVariables::new();
//! vars.set("ua", "Googlebot");
//!
//! let pool = RequestPool::unbounded();
//! let key = evaluate(&template, &vars, &pool).unwrap();
//! assert_eq!(key.as_bytes(), b"prefix-Googlebot-suffix");
//! ```

mod compiler;
mod evaluator;

pub use compiler::{compile, variables_count};
pub use evaluator::{evaluate, KeyBytes};

use std::fmt;

/// One unit of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Bytes copied verbatim into the key
    Literal(Box<[u8]>),
    /// Request variable resolved at evaluation time (lowercase name)
    Variable(String),
}

impl Segment {
    /// Get the variable name, if this segment is a reference.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Variable(name) => Some(name),
        }
    }
}

/// Immutable, ordered sequence of segments produced by [`compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    segments: Vec<Segment>,
}

impl CompiledTemplate {
    pub(crate) fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Get the segments in evaluation order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Get the number of variable references.
    pub fn variable_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Variable(_)))
            .count()
    }

    /// Get the total byte length of all literal segments.
    pub fn literal_len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(bytes) => bytes.len(),
                Segment::Variable(_) => 0,
            })
            .sum()
    }
}

impl fmt::Display for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes))?,
                Segment::Variable(name) => write!(f, "${{{}}}", name)?,
            }
        }
        Ok(())
    }
}
