//! Request variable resolution.
//!
//! The host owns the real variables (headers, client address, ...). The key
//! evaluator only needs the current bytes of a variable by name, which is
//! what [`VariableResolver`] provides.

use ahash::AHashMap;
use std::borrow::Cow;

/// Capability to read request-scoped variables by name.
///
/// Names arrive lowercase. A variable that is unknown or unset resolves to
/// `None` and contributes zero bytes to a key.
pub trait VariableResolver {
    /// Get the current bytes of a variable.
    fn resolve(&self, name: &str) -> Option<Cow<'_, [u8]>>;

    /// Get the current byte length of a variable (zero if absent).
    fn value_len(&self, name: &str) -> usize {
        self.resolve(name).map_or(0, |v| v.len())
    }
}

impl<T: VariableResolver + ?Sized> VariableResolver for &T {
    fn resolve(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        (**self).resolve(name)
    }

    fn value_len(&self, name: &str) -> usize {
        (**self).value_len(name)
    }
}

/// Map-backed variables for one request.
///
/// # Examples
/// ```
/// use k2bot::{RequestVariables, VariableResolver};
///
/// let mut vars = RequestVariables::new();
/// vars.set("HTTP_USER_AGENT", "curl/8.0");
/// assert_eq!(vars.value_len("http_user_agent"), 8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestVariables {
    values: AHashMap<String, Vec<u8>>,
}

impl RequestVariables {
    /// Create an empty variable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl AsRef<[u8]>) -> &mut Self {
        self.values
            .insert(name.to_ascii_lowercase(), value.as_ref().to_vec());
        self
    }

    /// Remove a variable.
    pub fn unset(&mut self, name: &str) -> Option<Vec<u8>> {
        self.values.remove(&name.to_ascii_lowercase())
    }

    /// Get the number of set variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no variable is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl VariableResolver for RequestVariables {
    fn resolve(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        self.values.get(name).map(|v| Cow::Borrowed(v.as_slice()))
    }
}

impl<S: AsRef<str>, V: AsRef<[u8]>> FromIterator<(S, V)> for RequestVariables {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (name, value) in iter {
            vars.set(name.as_ref(), value);
        }
        vars
    }
}

/// Resolver backed by a closure, for hosts that compute variables on demand.
pub struct FnResolver<F> {
    f: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&str) -> Option<Vec<u8>>,
{
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> VariableResolver for FnResolver<F>
where
    F: Fn(&str) -> Option<Vec<u8>>,
{
    fn resolve(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        (self.f)(name).map(Cow::Owned)
    }
}
