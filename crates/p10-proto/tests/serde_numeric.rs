//! Numerics serialize as their wire form.
//!
//! Run with: `cargo test --features serde`

#![cfg(feature = "serde")]

use p10_proto::{FullNumeric, ServerNumeric};

#[test]
fn test_server_numeric_as_json_string() {
    let n: ServerNumeric = serde_json::from_str("\"AB\"").unwrap();
    assert_eq!(n.value(), 1);
    assert_eq!(serde_json::to_string(&n).unwrap(), "\"AB\"");
}

#[test]
fn test_invalid_numeric_fails_to_deserialize() {
    assert!(serde_json::from_str::<ServerNumeric>("\"A\"").is_err());
    assert!(serde_json::from_str::<FullNumeric>("\"AB{AA\"").is_err());
}
