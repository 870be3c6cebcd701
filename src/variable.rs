//! Exposed classification variable.

use bitflags::bitflags;
use std::fmt;

/// Name under which the classification is exposed to the host.
pub const IS_BOT_VARIABLE: &str = "is_bot";

bitflags! {
    /// State flags of an exposed variable value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VariableFlags: u8 {
        /// The value holds data.
        const VALID = 0b0000_0001;
        /// The variable has no value for this request.
        const NOT_FOUND = 0b0000_0010;
    }
}

/// Value of the `is_bot` variable for one request.
///
/// Data borrows the bytes stored in the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableValue<'a> {
    data: &'a [u8],
    flags: VariableFlags,
}

impl<'a> VariableValue<'a> {
    /// A found value.
    pub fn found(data: &'a [u8]) -> Self {
        Self {
            data,
            flags: VariableFlags::VALID,
        }
    }

    /// The "no value" marker.
    pub fn not_found() -> Self {
        Self {
            data: &[],
            flags: VariableFlags::NOT_FOUND,
        }
    }

    /// Get the value bytes (empty when not found).
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Get the value length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the value has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the flags.
    pub fn flags(&self) -> VariableFlags {
        self.flags
    }

    /// Check if the variable has no value.
    pub fn is_not_found(&self) -> bool {
        self.flags.contains(VariableFlags::NOT_FOUND)
    }

    /// Check if the value holds data.
    pub fn is_valid(&self) -> bool {
        self.flags.contains(VariableFlags::VALID)
    }

    /// Get the value as a string, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        if self.is_not_found() {
            return None;
        }
        std::str::from_utf8(self.data).ok()
    }
}

impl fmt::Display for VariableValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_not_found() {
            return Ok(());
        }
        write!(f, "{}", String::from_utf8_lossy(self.data))
    }
}
