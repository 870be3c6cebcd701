//! Request-scoped allocation.
//!
//! Key buffers live exactly as long as the request that computed them. The
//! host hands the evaluator a [`ScopedAllocator`]; buffers it returns are
//! owned by the request context and released when that context drops, so
//! there is no explicit free.

use std::cell::Cell;

use crate::error::EvalError;

/// Allocator whose buffers are valid until the end of the current request.
pub trait ScopedAllocator {
    /// Allocate an empty buffer with room for exactly `len` bytes.
    fn alloc(&self, len: usize) -> Result<Vec<u8>, EvalError>;
}

impl<T: ScopedAllocator + ?Sized> ScopedAllocator for &T {
    fn alloc(&self, len: usize) -> Result<Vec<u8>, EvalError> {
        (**self).alloc(len)
    }
}

/// Per-request byte pool with an optional budget.
///
/// The pool only accounts for bytes; each buffer is an ordinary `Vec<u8>`.
/// A request that exhausts its budget gets [`EvalError::AllocationFailed`]
/// for every further allocation, since nothing is returned to the pool
/// before the request ends.
///
/// # Examples
/// ```
/// use k2bot::{RequestPool, ScopedAllocator};
///
/// let pool = RequestPool::with_budget(16);
/// let buf = pool.alloc(10).unwrap();
/// assert!(buf.capacity() >= 10);
/// assert_eq!(pool.available(), 6);
/// assert!(pool.alloc(7).is_err());
/// ```
#[derive(Debug)]
pub struct RequestPool {
    budget: Option<usize>,
    used: Cell<usize>,
    allocations: Cell<usize>,
}

impl RequestPool {
    /// Create a pool limited to `bytes` in total.
    pub fn with_budget(bytes: usize) -> Self {
        Self {
            budget: Some(bytes),
            used: Cell::new(0),
            allocations: Cell::new(0),
        }
    }

    /// Create a pool limited only by the system allocator.
    pub fn unbounded() -> Self {
        Self {
            budget: None,
            used: Cell::new(0),
            allocations: Cell::new(0),
        }
    }

    /// Get the number of bytes handed out so far.
    pub fn used(&self) -> usize {
        self.used.get()
    }

    /// Get the number of bytes still available.
    pub fn available(&self) -> usize {
        match self.budget {
            Some(budget) => budget.saturating_sub(self.used.get()),
            None => usize::MAX - self.used.get(),
        }
    }

    /// Get the number of successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }
}

impl Default for RequestPool {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl ScopedAllocator for RequestPool {
    fn alloc(&self, len: usize) -> Result<Vec<u8>, EvalError> {
        let available = self.available();
        let failed = EvalError::AllocationFailed {
            requested: len,
            available,
        };

        if len > available {
            return Err(failed);
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(|_| failed)?;

        self.used.set(self.used.get() + len);
        self.allocations.set(self.allocations.get() + 1);

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_accounting() {
        let pool = RequestPool::with_budget(32);
        assert_eq!(pool.available(), 32);

        let a = pool.alloc(20).unwrap();
        assert!(a.capacity() >= 20);
        assert!(a.is_empty());
        assert_eq!(pool.used(), 20);
        assert_eq!(pool.allocations(), 1);

        assert_eq!(
            pool.alloc(13),
            Err(EvalError::AllocationFailed {
                requested: 13,
                available: 12
            })
        );
        assert_eq!(pool.allocations(), 1);

        assert!(pool.alloc(12).is_ok());
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_zero_budget() {
        let pool = RequestPool::with_budget(0);
        assert!(pool.alloc(1).is_err());
        assert!(pool.alloc(0).is_ok());
    }

    #[test]
    fn test_unbounded_rejects_impossible_sizes() {
        let pool = RequestPool::unbounded();
        assert!(pool.alloc(64).is_ok());
        assert!(pool.alloc(usize::MAX - 64).is_err());
    }
}
