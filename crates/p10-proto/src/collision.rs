//! Nickname collision resolution.
//!
//! When two clients claim the same nickname, every server that sees the pair
//! must pick the same survivor without talking to the others. The decision is
//! therefore a pure function of each side's connection timestamp and
//! `user@host`:
//!
//! | Timestamps | `user@host`          | Survivor        |
//! |------------|----------------------|-----------------|
//! | equal      | any                  | neither         |
//! | differ     | different identities | older (smaller) |
//! | differ     | same identity        | newer (larger)  |
//!
//! `user@host` is compared ASCII case-insensitively. Nothing else (server
//! numerics, arrival order) takes part in the decision.

use std::fmt;

/// One side of a nickname collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityClaim<'a> {
    /// Connection (or last nick change) timestamp.
    pub timestamp: u64,
    /// `user@host` as introduced on the network.
    pub user_at_host: &'a str,
}

impl<'a> IdentityClaim<'a> {
    /// Create a claim.
    pub const fn new(timestamp: u64, user_at_host: &'a str) -> Self {
        Self {
            timestamp,
            user_at_host,
        }
    }

    /// Whether both claims come from the same `user@host`.
    #[inline]
    pub fn same_identity(&self, other: &IdentityClaim<'_>) -> bool {
        self.user_at_host.eq_ignore_ascii_case(other.user_at_host)
    }
}

/// Outcome of [`resolve_collision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionVerdict {
    /// The first claim keeps the nickname; the second is killed.
    FirstWins,
    /// The second claim keeps the nickname; the first is killed.
    SecondWins,
    /// Both claims are killed and the nickname is left free.
    BothLose,
}

impl CollisionVerdict {
    /// The verdict with the two claims swapped.
    #[inline]
    pub const fn mirrored(self) -> Self {
        match self {
            Self::FirstWins => Self::SecondWins,
            Self::SecondWins => Self::FirstWins,
            Self::BothLose => Self::BothLose,
        }
    }

    /// Whether the first claim keeps the nickname.
    #[inline]
    pub const fn first_survives(self) -> bool {
        matches!(self, Self::FirstWins)
    }

    /// Whether the second claim keeps the nickname.
    #[inline]
    pub const fn second_survives(self) -> bool {
        matches!(self, Self::SecondWins)
    }

    /// Stable lowercase label, suitable for logs and metric labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstWins => "first_wins",
            Self::SecondWins => "second_wins",
            Self::BothLose => "both_lose",
        }
    }
}

impl fmt::Display for CollisionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide which of two claims to the same nickname survive.
pub fn resolve_collision(first: &IdentityClaim<'_>, second: &IdentityClaim<'_>) -> CollisionVerdict {
    if first.timestamp == second.timestamp {
        return CollisionVerdict::BothLose;
    }

    let first_is_older = first.timestamp < second.timestamp;
    // Different identities keep the older claim, a reconnect keeps the newer one.
    let first_wins = if first.same_identity(second) {
        !first_is_older
    } else {
        first_is_older
    };

    if first_wins {
        CollisionVerdict::FirstWins
    } else {
        CollisionVerdict::SecondWins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(ts: u64, uah: &str) -> IdentityClaim<'_> {
        IdentityClaim::new(ts, uah)
    }

    #[test]
    fn test_different_identity_first_older() {
        assert_eq!(
            resolve_collision(&claim(1000, "user1@host1"), &claim(2000, "user2@host2")),
            CollisionVerdict::FirstWins
        );
    }

    #[test]
    fn test_different_identity_second_older() {
        assert_eq!(
            resolve_collision(&claim(2000, "user1@host1"), &claim(1000, "user2@host2")),
            CollisionVerdict::SecondWins
        );
    }

    #[test]
    fn test_same_identity_newer_wins() {
        assert_eq!(
            resolve_collision(&claim(2000, "user@host"), &claim(1000, "user@host")),
            CollisionVerdict::FirstWins
        );
        assert_eq!(
            resolve_collision(&claim(1000, "user@host"), &claim(2000, "user@host")),
            CollisionVerdict::SecondWins
        );
    }

    #[test]
    fn test_identity_match_ignores_case() {
        assert_eq!(
            resolve_collision(
                &claim(2000, "User@Host.EXAMPLE.com"),
                &claim(1000, "user@host.example.com")
            ),
            CollisionVerdict::FirstWins
        );
    }

    #[test]
    fn test_equal_timestamps_both_lose() {
        assert_eq!(
            resolve_collision(&claim(1500, "a@b"), &claim(1500, "c@d")),
            CollisionVerdict::BothLose
        );
        assert_eq!(
            resolve_collision(&claim(1500, "a@b"), &claim(1500, "A@B")),
            CollisionVerdict::BothLose
        );
    }

    #[test]
    fn test_swapping_claims_mirrors_verdict() {
        let pairs = [
            (claim(1, "x@y"), claim(2, "z@w")),
            (claim(2, "x@y"), claim(1, "X@Y")),
            (claim(7, "x@y"), claim(7, "z@w")),
        ];
        for (a, b) in pairs {
            assert_eq!(resolve_collision(&b, &a), resolve_collision(&a, &b).mirrored());
        }
    }

    #[test]
    fn test_verdict_helpers() {
        assert!(CollisionVerdict::FirstWins.first_survives());
        assert!(!CollisionVerdict::FirstWins.second_survives());
        assert!(!CollisionVerdict::BothLose.first_survives());
        assert!(!CollisionVerdict::BothLose.second_survives());
        assert_eq!(CollisionVerdict::BothLose.mirrored(), CollisionVerdict::BothLose);
        assert_eq!(CollisionVerdict::SecondWins.to_string(), "second_wins");
    }
}
