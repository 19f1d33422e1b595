//! Shared error type for every decoding stage.

use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::Version;

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/// Errors raised while reading a pyc file, its marshal stream or its side tables.
///
/// Every variant is terminal: once one is returned the cursor that produced
/// it is in an unspecified position and the input must be treated as
/// unparseable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum CoreError {
    /// The 2-byte header magic maps to no supported version.
    #[error("unknown magic number: 0x{magic:04X}")]
    UnknownMagicNumber {
        /// Raw little-endian magic value.
        magic: u16,
    },

    /// A version outside the supported generations was requested.
    #[error("unsupported python version {version}")]
    UnsupportedVersion {
        /// The requested version.
        version: Version,
    },

    /// The pyc header is malformed (missing `\r\n`, short, ...).
    #[error("invalid pyc header: {0}")]
    InvalidHeader(Cow<'static, str>),

    /// Unrecognised marshal type tag.
    #[error("bad marshal data: unknown type code 0x{tag:02X} at offset {at}")]
    MarshalFormat {
        /// Tag byte with the reference flag stripped.
        tag: u8,
        /// Offset of the tag byte.
        at: u64,
    },

    /// The buffer ended in the middle of a value.
    #[error("unexpected EOF: need {needed} bytes at {at}")]
    MarshalTruncated {
        /// Number of bytes the read asked for.
        needed: u64,
        /// Offset where the read started.
        at: u64,
    },

    /// Bytes remain after the top-level value.
    #[error("trailing data: {remaining} bytes left after the top-level value")]
    MarshalTrailingData {
        /// Number of unconsumed bytes.
        remaining: u64,
    },

    /// A backreference names a slot that was never reserved.
    #[error("bad marshal data: invalid reference {index}")]
    InvalidReference {
        /// Requested slot.
        index: u32,
    },

    /// A backreference names a slot whose value is still being built and
    /// cannot be shared while incomplete.
    #[error("bad marshal data: reference {index} to an incomplete value")]
    IncompleteReference {
        /// Requested slot.
        index: u32,
    },

    /// Nesting went deeper than the reader allows.
    #[error("bad marshal data: nesting deeper than {limit} levels at offset {at}")]
    RecursionLimit {
        /// Maximum accepted depth.
        limit: usize,
        /// Offset of the value that crossed the limit.
        at: u64,
    },

    /// A structurally valid value has the wrong shape for a code unit field.
    #[error("malformed code object field `{field}`: {reason}")]
    MalformedCode {
        /// Field being decoded.
        field: &'static str,
        /// What was wrong with it.
        reason: Cow<'static, str>,
    },

    /// The numeric opcode does not exist for the unit's version.
    #[error("unknown opcode {opcode} for python {version} at offset {offset}")]
    UnknownOpcode {
        /// Numeric opcode.
        opcode: u8,
        /// Version whose table was consulted.
        version: Version,
        /// Byte offset of the instruction.
        offset: usize,
    },

    /// A position cursor was asked to go backwards.
    #[error("position table queried at offset {requested} after offset {current}")]
    PositionRewind {
        /// Offset asked for.
        requested: usize,
        /// Last offset served.
        current: usize,
    },

    /// I/O failure while reading input bytes.
    #[error("io error: {0}")]
    Io(String),
}

impl CoreError {
    /// Construit une erreur « champ de code malformé ».
    pub fn malformed(field: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        CoreError::MalformedCode { field, reason: reason.into() }
    }

    /// Construit une erreur d'en-tête.
    pub fn header(reason: impl Into<Cow<'static, str>>) -> Self {
        CoreError::InvalidHeader(reason.into())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_stable() {
        let e = CoreError::MarshalFormat { tag: 0x07, at: 0 };
        assert_eq!(e.to_string(), "bad marshal data: unknown type code 0x07 at offset 0");

        let e = CoreError::UnknownOpcode { opcode: 6, version: Version::new(3, 11), offset: 4 };
        assert_eq!(e.to_string(), "unknown opcode 6 for python 3.11 at offset 4");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(CoreError::from(io), CoreError::Io(msg) if msg.contains("gone")));
    }
}
