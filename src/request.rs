//! Per-request classification cache.
//!
//! A [`RequestLookup`] is created for each request against the scope that
//! handles it. The first read evaluates the key and queries the table; every
//! later read in the same request returns the memoized [`Outcome`].

use once_cell::unsync::OnceCell;
use std::cell::Cell;

use crate::conf::{KeySource, ScopeConf};
use crate::error::EvalError;
use crate::pool::ScopedAllocator;
use crate::resolver::VariableResolver;
use crate::table::LookupTable;
use crate::template::{self, KeyBytes};
use crate::variable::VariableValue;

/// Terminal classification of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    /// The key is in the table; holds the stored value
    Found(&'a [u8]),
    /// The key is not in the table
    NotFound,
    /// No table, or an empty one: classification is inert
    NotApplicable,
}

impl<'a> Outcome<'a> {
    /// Get the value and its length, if found.
    pub fn value(&self) -> Option<(&'a [u8], usize)> {
        match *self {
            Outcome::Found(data) => Some((data, data.len())),
            _ => None,
        }
    }

    /// Check if the key was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    /// Convert to the exposed variable value.
    ///
    /// `NotFound` and `NotApplicable` both read as "not found".
    pub fn to_variable(&self) -> VariableValue<'a> {
        match *self {
            Outcome::Found(data) => VariableValue::found(data),
            _ => VariableValue::not_found(),
        }
    }

    /// Get a short name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Found(_) => "found",
            Outcome::NotFound => "not_found",
            Outcome::NotApplicable => "not_applicable",
        }
    }
}

/// Memoized lookup for one request.
///
/// # Example
///
/// ```
/// use k2bot::{MemoryLoader, Outcome, RequestLookup, RequestPool, RequestVariables, ScopeConf};
///
/// let mut loader = MemoryLoader::new();
/// loader.add("bots", [("prefix-Googlebot-suffix", "search-engine")]);
///
/// let mut conf = ScopeConf::new();
/// conf.set_key("prefix-$ua-suffix").unwrap();
/// conf.set_table("bots", &loader).unwrap();
///
/// // Per request
/// let mut vars = RequestVariables::new();
/// vars.set("ua", "Googlebot");
/// let pool = RequestPool::unbounded();
/// let lookup = RequestLookup::new(&conf);
///
/// let outcome = lookup.outcome(&vars, &pool).unwrap();
/// assert_eq!(outcome, Outcome::Found(b"search-engine"));
/// ```
#[derive(Debug)]
pub struct RequestLookup<'a> {
    conf: &'a ScopeConf,
    key: OnceCell<KeyBytes>,
    outcome: OnceCell<Outcome<'a>>,
    evaluations: Cell<usize>,
}

impl<'a> RequestLookup<'a> {
    /// Create the (uninitialized) lookup for a request handled by `conf`.
    pub fn new(conf: &'a ScopeConf) -> Self {
        Self {
            conf,
            key: OnceCell::new(),
            outcome: OnceCell::new(),
            evaluations: Cell::new(0),
        }
    }

    /// Get the classification, computing it on first call.
    ///
    /// An allocation failure is returned as is and leaves the lookup
    /// uninitialized.
    pub fn outcome<R, A>(&self, resolver: &R, pool: &A) -> Result<Outcome<'a>, EvalError>
    where
        R: VariableResolver + ?Sized,
        A: ScopedAllocator + ?Sized,
    {
        self.outcome
            .get_or_try_init(|| self.compute(resolver, pool))
            .copied()
    }

    /// Get the exposed `is_bot` value.
    pub fn variable<R, A>(&self, resolver: &R, pool: &A) -> Result<VariableValue<'a>, EvalError>
    where
        R: VariableResolver + ?Sized,
        A: ScopedAllocator + ?Sized,
    {
        Ok(self.outcome(resolver, pool)?.to_variable())
    }

    /// Get the memoized outcome without computing it.
    pub fn cached(&self) -> Option<Outcome<'a>> {
        self.outcome.get().copied()
    }

    /// Get the key used for the lookup, once computed.
    pub fn key(&self) -> Option<&[u8]> {
        if let Some(key) = self.key.get() {
            return Some(key.as_bytes());
        }

        // A literal key is only taken once a table was consulted
        match (self.outcome.get(), self.conf.key()) {
            (
                Some(Outcome::Found(_) | Outcome::NotFound),
                Some(KeySource::Literal(key)),
            ) => Some(key.as_bytes()),
            _ => None,
        }
    }

    /// Get the number of times the outcome was computed.
    pub fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    fn compute<R, A>(&self, resolver: &R, pool: &A) -> Result<Outcome<'a>, EvalError>
    where
        R: VariableResolver + ?Sized,
        A: ScopedAllocator + ?Sized,
    {
        self.evaluations.set(self.evaluations.get() + 1);

        let conf: &'a ScopeConf = self.conf;

        let table: &'a LookupTable = match conf.table() {
            Some(table) if !table.is_empty() => &**table,
            _ => {
                log::trace!("Classification not applicable: no table");
                return Ok(Outcome::NotApplicable);
            }
        };

        let key = match conf.key() {
            None => {
                log::trace!("Classification not found: no key configured");
                return Ok(Outcome::NotFound);
            }
            Some(KeySource::Literal(key)) => key.as_bytes(),
            Some(KeySource::Template(compiled)) => {
                let key = template::evaluate(compiled, resolver, pool)?;
                self.key.get_or_init(|| key).as_bytes()
            }
        };

        let outcome = match table.find(key) {
            Some((value, _)) => Outcome::Found(value),
            None => Outcome::NotFound,
        };

        log::trace!(
            "Classified key {:?}: {}",
            String::from_utf8_lossy(key),
            outcome.as_str()
        );

        Ok(outcome)
    }
}
