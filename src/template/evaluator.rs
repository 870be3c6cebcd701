//! Two-pass template evaluation.

use super::{CompiledTemplate, Segment};
use crate::error::EvalError;
use crate::pool::ScopedAllocator;
use crate::resolver::VariableResolver;

/// Lookup key materialized for one request.
///
/// `reserved` is the size computed by the length pass, including one
/// terminator unit; the key itself is only the bytes written by the fill
/// pass, which never exceed `reserved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBytes {
    buf: Vec<u8>,
    reserved: usize,
}

impl KeyBytes {
    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Get the number of key bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the key is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Get the size reserved by the length pass (terminator included).
    pub fn reserved(&self) -> usize {
        self.reserved
    }
}

impl AsRef<[u8]> for KeyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

/// Evaluate a template against request variables.
///
/// 1. Length pass: literal lengths plus current variable lengths, plus one
///    terminator unit.
/// 2. The buffer is allocated from `pool` once, at that size.
/// 3. Fill pass: same segment order, bytes copied verbatim.
///
/// A variable may resolve to different bytes in the two passes. Shorter
/// values leave unused slack; longer values are cut at the reserved size.
pub fn evaluate<R, A>(
    template: &CompiledTemplate,
    resolver: &R,
    pool: &A,
) -> Result<KeyBytes, EvalError>
where
    R: VariableResolver + ?Sized,
    A: ScopedAllocator + ?Sized,
{
    // 1 byte for the terminator
    let mut reserved = 1;

    for segment in template.segments() {
        reserved += match segment {
            Segment::Literal(bytes) => bytes.len(),
            Segment::Variable(name) => resolver.value_len(name),
        };
    }

    let mut buf = pool.alloc(reserved)?;

    for segment in template.segments() {
        match segment {
            Segment::Literal(bytes) => {
                copy_bounded(&mut buf, bytes, reserved);
            }
            Segment::Variable(name) => {
                if let Some(value) = resolver.resolve(name) {
                    if !copy_bounded(&mut buf, &value, reserved) {
                        log::warn!(
                            "Variable ${} grew between length and fill passes, key truncated to {} bytes",
                            name,
                            reserved
                        );
                    }
                }
            }
        }
    }

    Ok(KeyBytes { buf, reserved })
}

/// Append as much of `bytes` as fits below `limit`. Returns false when cut.
fn copy_bounded(buf: &mut Vec<u8>, bytes: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(buf.len());
    let n = bytes.len().min(room);
    buf.extend_from_slice(&bytes[..n]);
    n == bytes.len()
}
