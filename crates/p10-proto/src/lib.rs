//! # p10-proto
//!
//! Building blocks for the P10 server-to-server protocol used by ircu-family
//! IRC daemons.
//!
//! ## Features
//!
//! - Server, user and full numeric codec ([`numeric`])
//! - Deterministic nickname collision resolution ([`collision`])
//! - Zero-copy line tokenizer and typed commands for the S2S tokens that
//!   carry numerics (`SERVER`/`S`, `N`, `D`, `Q`, `SQ`, `EB`, `EA`)
//! - Optional `serde` support for numerics (serialized as their wire form)
//!
//! ## Quick Start
//!
//! ```rust
//! use p10_proto::{resolve_collision, CollisionVerdict, FullNumeric, IdentityClaim};
//!
//! let numeric: FullNumeric = "ABAAB".parse().unwrap();
//! assert_eq!(numeric.server().to_string(), "AB");
//!
//! let existing = IdentityClaim::new(1000, "alice@wonderland.example");
//! let incoming = IdentityClaim::new(2000, "mallory@evil.example");
//! assert_eq!(resolve_collision(&existing, &incoming), CollisionVerdict::FirstWins);
//! ```
//!
//! ### Parsing P10 lines
//!
//! ```rust
//! use p10_proto::{Command, P10Message};
//!
//! let msg: P10Message = "AB N Alice 1 1000 alice host +i B]AAAB ABAAA :Alice"
//!     .parse()
//!     .expect("valid N line");
//! assert!(matches!(msg.command, Command::Nick(_)));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod collision;
pub mod command;
pub mod error;
pub mod line;
pub mod numeric;

pub use self::casemap::{irc_eq, irc_lower_byte, irc_to_lower};
pub use self::collision::{resolve_collision, CollisionVerdict, IdentityClaim};
pub use self::command::{Command, NickIntro, P10Message, ServerIntro};
pub use self::error::{MessageParseError, NumericError, NumericKind};
pub use self::line::{P10Line, MAX_PARAMS};
pub use self::numeric::{
    decode_server_numeric, decode_user_numeric, encode_server_numeric, encode_user_numeric,
    is_from_server, server_from_numeric, FullNumeric, ServerNumeric, UserNumeric, ALPHABET,
    MAX_SERVER_NUMERIC, MAX_USER_NUMERIC,
};
