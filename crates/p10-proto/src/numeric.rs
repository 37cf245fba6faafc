//! P10 numerics.
//!
//! Every server on a P10 network has a 2-character numeric and every client a
//! 3-character numeric scoped to its home server. Concatenated they form the
//! 5-character full numeric used as the source and target of S2S commands.
//!
//! Each character is one base-64 digit taken from [`ALPHABET`], most
//! significant digit first:
//!
//! ```
//! use p10_proto::numeric::{decode_server_numeric, encode_server_numeric};
//!
//! assert_eq!(encode_server_numeric(64).unwrap(), "BA");
//! assert_eq!(decode_server_numeric("]]").unwrap(), 4095);
//! ```
//!
//! The alphabet mixes upper and lower case as distinct digits, so every
//! comparison in this module is case-sensitive.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use crate::error::{NumericError, NumericKind};

/// The 64 numeric digits in value order.
pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789[]";

/// Characters in a server numeric.
pub const SERVER_NUMERIC_LEN: usize = 2;
/// Characters in a user numeric.
pub const USER_NUMERIC_LEN: usize = 3;
/// Characters in a full (server + user) numeric.
pub const FULL_NUMERIC_LEN: usize = SERVER_NUMERIC_LEN + USER_NUMERIC_LEN;

/// Largest server numeric (`]]`).
pub const MAX_SERVER_NUMERIC: u16 = 4095;
/// Largest user numeric (`]]]`).
pub const MAX_USER_NUMERIC: u32 = 262_143;

const BITS_PER_CHAR: u32 = 6;
const DIGIT_MASK: u32 = 0x3F;
const USER_BITS: u32 = BITS_PER_CHAR * USER_NUMERIC_LEN as u32;
const NO_VALUE: u8 = 255;

/// Symbol to digit value, `NO_VALUE` for bytes outside the alphabet.
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        lut[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    lut
};

#[inline]
fn digit_value(symbol: char) -> Option<u8> {
    if !symbol.is_ascii() {
        return None;
    }
    match LOOKUP[symbol as usize] {
        NO_VALUE => None,
        value => Some(value),
    }
}

/// Write `value` as `N` big-endian base-64 digits.
///
/// Callers range-check first; bits above `N * 6` are discarded.
#[inline]
fn encode_digits<const N: usize>(mut value: u32) -> [u8; N] {
    let mut out = [ALPHABET[0]; N];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value & DIGIT_MASK) as usize];
        value >>= BITS_PER_CHAR;
    }
    out
}

fn decode_digits(input: &str, kind: NumericKind, width: usize) -> Result<u32, NumericError> {
    let actual = input.chars().count();
    if actual != width {
        return Err(NumericError::InvalidLength {
            kind,
            expected: width,
            actual,
        });
    }

    input
        .chars()
        .enumerate()
        .try_fold(0u32, |acc, (index, symbol)| {
            let digit = digit_value(symbol).ok_or(NumericError::InvalidSymbol {
                kind,
                symbol,
                index,
            })?;
            Ok((acc << BITS_PER_CHAR) | u32::from(digit))
        })
}

fn write_digits(f: &mut fmt::Formatter<'_>, digits: &[u8]) -> fmt::Result {
    for &digit in digits {
        f.write_char(char::from(digit))?;
    }
    Ok(())
}

// ============================================================================
// ServerNumeric
// ============================================================================

/// A server numeric in `0..=4095`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct ServerNumeric(u16);

impl ServerNumeric {
    /// Create a server numeric, rejecting values above [`MAX_SERVER_NUMERIC`].
    pub fn new(value: u32) -> Result<Self, NumericError> {
        if value > u32::from(MAX_SERVER_NUMERIC) {
            return Err(NumericError::Range {
                kind: NumericKind::Server,
                value: u64::from(value),
                max: u32::from(MAX_SERVER_NUMERIC),
            });
        }
        Ok(Self(value as u16))
    }

    /// The integer value.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Wire form as two ASCII bytes.
    #[inline]
    pub fn to_wire(self) -> [u8; SERVER_NUMERIC_LEN] {
        encode_digits(u32::from(self.0))
    }

    /// Split the 5-character numeric field of a server introduction into the
    /// server numeric and its capacity mask.
    ///
    /// The mask is the highest user numeric the server will hand out, so
    /// `AB]]]` is server 1 with the full 262144-client space.
    pub fn split_capacity(field: &str) -> Result<(Self, u32), NumericError> {
        let value = decode_digits(field, NumericKind::Full, FULL_NUMERIC_LEN)?;
        Ok((Self((value >> USER_BITS) as u16), value & MAX_USER_NUMERIC))
    }

    /// Whether `numeric` belongs to a client of this server.
    #[inline]
    pub fn owns(self, numeric: FullNumeric) -> bool {
        numeric.server == self
    }
}

impl fmt::Display for ServerNumeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_digits(f, &self.to_wire())
    }
}

impl FromStr for ServerNumeric {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_digits(s, NumericKind::Server, SERVER_NUMERIC_LEN).map(|v| Self(v as u16))
    }
}

impl TryFrom<&str> for ServerNumeric {
    type Error = NumericError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for ServerNumeric {
    type Error = NumericError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ServerNumeric> for String {
    fn from(n: ServerNumeric) -> Self {
        n.to_string()
    }
}

// ============================================================================
// UserNumeric
// ============================================================================

/// A client numeric in `0..=262143`, scoped to its home server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct UserNumeric(u32);

impl UserNumeric {
    /// Create a user numeric, rejecting values above [`MAX_USER_NUMERIC`].
    pub fn new(value: u32) -> Result<Self, NumericError> {
        if value > MAX_USER_NUMERIC {
            return Err(NumericError::Range {
                kind: NumericKind::User,
                value: u64::from(value),
                max: MAX_USER_NUMERIC,
            });
        }
        Ok(Self(value))
    }

    /// The integer value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Wire form as three ASCII bytes.
    #[inline]
    pub fn to_wire(self) -> [u8; USER_NUMERIC_LEN] {
        encode_digits(self.0)
    }
}

impl fmt::Display for UserNumeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_digits(f, &self.to_wire())
    }
}

impl FromStr for UserNumeric {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_digits(s, NumericKind::User, USER_NUMERIC_LEN).map(Self)
    }
}

impl TryFrom<&str> for UserNumeric {
    type Error = NumericError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for UserNumeric {
    type Error = NumericError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<UserNumeric> for String {
    fn from(n: UserNumeric) -> Self {
        n.to_string()
    }
}

// ============================================================================
// FullNumeric
// ============================================================================

/// A client's network-wide identity: home server numeric + user numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct FullNumeric {
    server: ServerNumeric,
    user: UserNumeric,
}

impl FullNumeric {
    /// Combine a server and user numeric.
    #[inline]
    pub const fn new(server: ServerNumeric, user: UserNumeric) -> Self {
        Self { server, user }
    }

    /// The owning server.
    #[inline]
    pub const fn server(self) -> ServerNumeric {
        self.server
    }

    /// The client's numeric within its server.
    #[inline]
    pub const fn user(self) -> UserNumeric {
        self.user
    }
}

impl fmt::Display for FullNumeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_digits(f, &self.server.to_wire())?;
        write_digits(f, &self.user.to_wire())
    }
}

impl FromStr for FullNumeric {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = decode_digits(s, NumericKind::Full, FULL_NUMERIC_LEN)?;
        Ok(Self {
            server: ServerNumeric((value >> USER_BITS) as u16),
            user: UserNumeric(value & MAX_USER_NUMERIC),
        })
    }
}

impl TryFrom<&str> for FullNumeric {
    type Error = NumericError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for FullNumeric {
    type Error = NumericError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FullNumeric> for String {
    fn from(n: FullNumeric) -> Self {
        n.to_string()
    }
}

// ============================================================================
// String-level codec
// ============================================================================

/// Encode a server numeric (`0..=4095`) as 2 characters.
pub fn encode_server_numeric(value: u32) -> Result<String, NumericError> {
    ServerNumeric::new(value).map(|n| n.to_string())
}

/// Decode a 2-character server numeric.
pub fn decode_server_numeric(s: &str) -> Result<u16, NumericError> {
    s.parse::<ServerNumeric>().map(ServerNumeric::value)
}

/// Encode a user numeric (`0..=262143`) as 3 characters.
pub fn encode_user_numeric(value: u32) -> Result<String, NumericError> {
    UserNumeric::new(value).map(|n| n.to_string())
}

/// Decode a 3-character user numeric.
pub fn decode_user_numeric(s: &str) -> Result<u32, NumericError> {
    s.parse::<UserNumeric>().map(UserNumeric::value)
}

/// The first two characters of a full numeric, undecoded.
///
/// Lets a line be attributed to its server without decoding the user part.
/// Fails only when fewer than two characters are present.
pub fn server_from_numeric(full: &str) -> Result<&str, NumericError> {
    let mut chars = full.char_indices();
    match (chars.next(), chars.next()) {
        (Some(_), Some((idx, second))) => Ok(&full[..idx + second.len_utf8()]),
        _ => Err(NumericError::InvalidLength {
            kind: NumericKind::Full,
            expected: SERVER_NUMERIC_LEN,
            actual: full.chars().count(),
        }),
    }
}

/// Whether `full` was issued by the server whose numeric is `server`.
///
/// Exact comparison: `AA` and `aa` are different servers.
pub fn is_from_server(full: &str, server: &str) -> bool {
    server_from_numeric(full).is_ok_and(|prefix| prefix == server)
}
