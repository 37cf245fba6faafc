//! Known numeric and collision vectors that other P10 servers agree on.

use p10_proto::{
    decode_server_numeric, decode_user_numeric, encode_server_numeric, encode_user_numeric,
    is_from_server, resolve_collision, server_from_numeric, CollisionVerdict, IdentityClaim,
    NumericError,
};

#[test]
fn test_server_numeric_vectors() {
    assert_eq!(encode_server_numeric(0).unwrap(), "AA");
    assert_eq!(encode_server_numeric(1).unwrap(), "AB");
    assert_eq!(encode_server_numeric(64).unwrap(), "BA");
    assert_eq!(encode_server_numeric(4095).unwrap(), "]]");
    assert_eq!(decode_server_numeric("BA").unwrap(), 64);
}

#[test]
fn test_user_numeric_vectors() {
    assert_eq!(encode_user_numeric(0).unwrap(), "AAA");
    assert_eq!(encode_user_numeric(262_143).unwrap(), "]]]");
    assert_eq!(decode_user_numeric("]]]").unwrap(), 262_143);
}

#[test]
fn test_boundaries_reject_one_past() {
    assert!(matches!(
        encode_server_numeric(4096),
        Err(NumericError::Range { .. })
    ));
    assert!(matches!(
        encode_user_numeric(262_144),
        Err(NumericError::Range { .. })
    ));
}

#[test]
fn test_extraction_vectors() {
    assert_eq!(server_from_numeric("AAAAB").unwrap(), "AA");
    assert!(!is_from_server("ABAAB", "AA"));
    assert!(is_from_server("ABAAB", "AB"));
}

#[test]
fn test_collision_vectors() {
    let c = IdentityClaim::new;
    assert_eq!(
        resolve_collision(&c(1000, "user1@host1"), &c(2000, "user2@host2")),
        CollisionVerdict::FirstWins
    );
    assert_eq!(
        resolve_collision(&c(2000, "user1@host1"), &c(1000, "user2@host2")),
        CollisionVerdict::SecondWins
    );
    assert_eq!(
        resolve_collision(&c(2000, "user@host"), &c(1000, "user@host")),
        CollisionVerdict::FirstWins
    );
    assert_eq!(
        resolve_collision(&c(1000, "user@host"), &c(2000, "user@host")),
        CollisionVerdict::SecondWins
    );
    assert_eq!(
        resolve_collision(&c(2000, "User@Host.EXAMPLE.com"), &c(1000, "user@host.example.com")),
        CollisionVerdict::FirstWins
    );
    assert_eq!(
        resolve_collision(&c(1000, "user@host"), &c(1000, "user@host")),
        CollisionVerdict::BothLose
    );
    assert_eq!(
        resolve_collision(&c(1000, "user1@host1"), &c(1000, "user2@host2")),
        CollisionVerdict::BothLose
    );
}
