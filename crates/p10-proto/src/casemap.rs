//! RFC 1459 case mapping for nicknames.
//!
//! P10 networks treat `[]\~` as the uppercase forms of `{}|^` when comparing
//! nicknames. This only applies to nicknames: numerics are compared exactly
//! and `user@host` uses plain ASCII folding (see [`crate::collision`]).

/// Fold one byte to its RFC 1459 lowercase form.
#[inline]
pub const fn irc_lower_byte(b: u8) -> u8 {
    match b {
        b'A'..=b'Z' => b + (b'a' - b'A'),
        b'[' => b'{',
        b']' => b'}',
        b'\\' => b'|',
        b'~' => b'^',
        _ => b,
    }
}

/// Key under which a nickname is indexed.
///
/// Non-ASCII characters are kept as-is.
pub fn irc_to_lower(nick: &str) -> String {
    nick.chars()
        .map(|c| {
            if c.is_ascii() {
                char::from(irc_lower_byte(c as u8))
            } else {
                c
            }
        })
        .collect()
}

/// Compare two nicknames under RFC 1459 case mapping.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .all(|(x, y)| irc_lower_byte(x) == irc_lower_byte(y))
}
