//! Zero-copy P10 line tokenizer.
//!
//! P10 lines have the shape:
//!
//! ```text
//! [origin] <token> [params...] [:trailing]
//! ```
//!
//! Every line a linked server sends carries its origin (a server or user
//! numeric) except the handshake lines `PASS` and `SERVER`, which arrive
//! before the peer's numeric is known. Unlike client IRC there is no `:`
//! before the origin, although one is tolerated.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0, space1},
    combinator::opt,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::{MessageParseError, Result};

/// Maximum number of parameters kept per line.
pub const MAX_PARAMS: usize = 15;

/// Tokens that are sent without an origin.
const ORIGINLESS_TOKENS: &[&str] = &["PASS", "SERVER", "ERROR"];

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != ' ' && c != '\r' && c != '\n')(input)
}

/// `[:]origin` or a bare handshake token.
fn head(input: &str) -> IResult<&str, (Option<&str>, Option<&str>)> {
    let (input, _) = space0(input)?;
    let (input, _) = opt(char(':'))(input)?;
    let (input, first) = word(input)?;
    if ORIGINLESS_TOKENS.contains(&first) {
        return Ok((input, (None, Some(first))));
    }
    let (input, token) = opt(preceded(space1, word))(input)?;
    Ok((input, (Some(first), token)))
}

fn params(mut rest: &str) -> SmallVec<[&str; MAX_PARAMS]> {
    let mut out = SmallVec::new();
    while out.len() < MAX_PARAMS {
        let trimmed = rest.trim_start_matches(' ');
        if trimmed.is_empty() {
            break;
        }
        if let Some(trailing) = trimmed.strip_prefix(':') {
            out.push(trailing);
            break;
        }
        let end = trimmed.find(' ').unwrap_or(trimmed.len());
        out.push(&trimmed[..end]);
        rest = &trimmed[end..];
    }
    out
}

/// A tokenized P10 line borrowing from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P10Line<'a> {
    /// Origin numeric (or name), absent on handshake lines.
    pub origin: Option<&'a str>,
    /// Command token (`N`, `D`, `SERVER`, ...).
    pub token: &'a str,
    /// Parameters, trailing parameter last without its `:`.
    pub params: SmallVec<[&'a str; MAX_PARAMS]>,
}

impl<'a> P10Line<'a> {
    /// Tokenize one line. A trailing CR/LF is ignored.
    pub fn parse(input: &'a str) -> Result<Self> {
        let line = input.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let (rest, (origin, token)) = head(line).map_err(|e| match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => MessageParseError::Malformed {
                position: line.len() - e.input.len(),
            },
            nom::Err::Incomplete(_) => MessageParseError::Malformed {
                position: line.len(),
            },
        })?;
        let token = token.ok_or(MessageParseError::MissingToken)?;

        Ok(Self {
            origin,
            token,
            params: params(rest),
        })
    }

    /// Parameter `n`, if present.
    #[inline]
    pub fn arg(&self, n: usize) -> Option<&'a str> {
        self.params.get(n).copied()
    }

    /// Fail unless at least `count` parameters are present.
    pub fn require(&self, count: usize) -> Result<()> {
        if self.params.len() < count {
            return Err(MessageParseError::NotEnoughParams {
                token: self.token.to_string(),
                expected: count,
                actual: self.params.len(),
            });
        }
        Ok(())
    }

    /// The origin, or an error naming this line's token.
    pub fn require_origin(&self) -> Result<&'a str> {
        self.origin.ok_or_else(|| MessageParseError::MissingOrigin {
            token: self.token.to_string(),
        })
    }
}
