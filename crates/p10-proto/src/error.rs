//! Error types for the P10 protocol library.
//!
//! [`NumericError`] covers the numeric codec (range violations on encode,
//! malformed wire strings on decode). [`MessageParseError`] covers P10 line
//! parsing and wraps numeric errors found inside a line.

use std::fmt;

use thiserror::Error;

/// Convenience type alias for Results using [`MessageParseError`].
pub type Result<T, E = MessageParseError> = std::result::Result<T, E>;

/// Which numeric field a codec error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    /// 2-character server numeric.
    Server,
    /// 3-character user numeric.
    User,
    /// 5-character server + user numeric.
    Full,
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Server => "server",
            Self::User => "user",
            Self::Full => "full",
        })
    }
}

/// Errors produced by the numeric codec.
///
/// `Range` is a caller bug (numeric allocation ran past the field width).
/// `InvalidLength` and `InvalidSymbol` mean the remote side sent a malformed
/// numeric and should be treated as a protocol violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum NumericError {
    /// Value does not fit in the field width.
    #[error("{kind} numeric {value} out of range (max {max})")]
    Range {
        /// Field being encoded.
        kind: NumericKind,
        /// Offending value.
        value: u64,
        /// Largest encodable value for the field.
        max: u32,
    },

    /// Wire string has the wrong number of characters.
    #[error("{kind} numeric must be {expected} characters, got {actual}")]
    InvalidLength {
        /// Field being decoded.
        kind: NumericKind,
        /// Required length.
        expected: usize,
        /// Length received.
        actual: usize,
    },

    /// Wire string contains a character outside the numeric alphabet.
    #[error("invalid symbol {symbol:?} at position {index} in {kind} numeric")]
    InvalidSymbol {
        /// Field being decoded.
        kind: NumericKind,
        /// Offending character.
        symbol: char,
        /// Character position within the field.
        index: usize,
    },
}

impl NumericError {
    /// True for decode failures (wrong length or unknown symbol).
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, Self::InvalidLength { .. } | Self::InvalidSymbol { .. })
    }

    /// True when an encode was attempted with an out-of-range value.
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }
}

/// Errors encountered when parsing P10 lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty or whitespace only.
    #[error("empty message")]
    EmptyMessage,

    /// Line had an origin but no token after it.
    #[error("missing command token")]
    MissingToken,

    /// Token was present but not all required parameters were.
    #[error("{token}: expected at least {expected} parameters, got {actual}")]
    NotEnoughParams {
        /// Command token.
        token: String,
        /// Minimum parameter count.
        expected: usize,
        /// Parameters received.
        actual: usize,
    },

    /// Line must carry an origin numeric but did not.
    #[error("{token}: missing origin")]
    MissingOrigin {
        /// Command token.
        token: String,
    },

    /// A numeric-valued parameter (hopcount, timestamp) did not parse.
    #[error("{field}: invalid integer {value:?}")]
    InvalidInteger {
        /// Field name.
        field: &'static str,
        /// Raw value.
        value: String,
    },

    /// Tokenizer rejected the line.
    #[error("malformed line at byte {position}")]
    Malformed {
        /// Byte offset where parsing stopped.
        position: usize,
    },

    /// A numeric inside the line failed to decode.
    #[error(transparent)]
    Numeric(#[from] NumericError),
}
