//! Per-operation behavior and the shared error-or-substitute policy

use serde::{Deserialize, Deserializer, Serialize};

use crate::surrogate::{is_surrogate, REPLACEMENT_CHARACTER};
use crate::{Error, Result};

/// Behavior for a single one-shot call or a single stream
///
/// Options are copied into streams on creation and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Fail on the first invalid, incomplete or unmappable sequence instead of substituting
    pub error_fatal: bool,
    /// Code unit written in place of undecodable input, and encoded in place of
    /// invalid surrogates by the UTF encoders. Must not be a surrogate; a
    /// surrogate here is rejected on deserialization and read as U+FFFD.
    #[serde(deserialize_with = "deserialize_replacement")]
    pub replacement_char: u16,
    /// Byte written by US-ASCII and code page encoders for characters they cannot represent
    pub substitute_byte: u8,
    /// Emit a byte order mark before the first byte (UTF-8 and UTF-16 only)
    pub output_byte_order_mark: bool,
    /// Suppress a leading U+FEFF in decoded output
    pub drop_byte_order_mark: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            error_fatal: false,
            replacement_char: REPLACEMENT_CHARACTER,
            substitute_byte: b'?',
            output_byte_order_mark: false,
            drop_byte_order_mark: false,
        }
    }
}

impl Options {
    /// Default options with `error_fatal` set
    pub fn strict() -> Self {
        Self {
            error_fatal: true,
            ..Self::default()
        }
    }

    /// Set whether failures abort the operation
    pub fn with_error_fatal(mut self, error_fatal: bool) -> Self {
        self.error_fatal = error_fatal;
        self
    }

    /// Set the decode-side replacement code unit
    pub fn with_replacement_char(mut self, unit: u16) -> Self {
        self.replacement_char = unit;
        self
    }

    /// Set the encode-side substitute byte
    pub fn with_substitute_byte(mut self, byte: u8) -> Self {
        self.substitute_byte = byte;
        self
    }

    /// Set whether encoders emit a byte order mark
    pub fn with_output_byte_order_mark(mut self, enabled: bool) -> Self {
        self.output_byte_order_mark = enabled;
        self
    }

    /// Set whether decoders drop a leading byte order mark
    pub fn with_drop_byte_order_mark(mut self, enabled: bool) -> Self {
        self.drop_byte_order_mark = enabled;
        self
    }

    /// The replacement code unit actually written, U+FFFD if `replacement_char` is a surrogate
    #[inline]
    pub fn replacement(&self) -> u16 {
        if is_surrogate(self.replacement_char) {
            REPLACEMENT_CHARACTER
        } else {
            self.replacement_char
        }
    }

    /// Either fail with `failure` or hand back `substitute`
    ///
    /// Every encode and decode path funnels its failures through here.
    #[inline]
    pub fn resolve<T>(&self, failure: Error, substitute: T) -> Result<T> {
        if self.error_fatal {
            return Err(failure);
        }
        tracing::trace!(%failure, "substituting");
        Ok(substitute)
    }
}

fn deserialize_replacement<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let unit = u16::deserialize(deserializer)?;
    if is_surrogate(unit) {
        return Err(serde::de::Error::custom(format_args!(
            "replacementChar 0x{unit:04X} is a surrogate"
        )));
    }
    Ok(unit)
}
