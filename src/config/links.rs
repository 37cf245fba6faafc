//! Server-to-server link configuration.

use p10_proto::ServerNumeric;
use serde::Deserialize;

/// Link block for a peer server.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkBlock {
    /// Remote server name (e.g., "leaf.example.net").
    pub name: String,
    /// Numeric the peer must introduce itself with.
    pub numeric: ServerNumeric,
    /// Password the peer must send in `PASS`. Unchecked when absent.
    #[serde(default)]
    pub password: Option<String>,
}

impl LinkBlock {
    /// Whether `presented` satisfies this block's password.
    pub fn accepts_password(&self, presented: Option<&str>) -> bool {
        match &self.password {
            Some(expected) => presented == Some(expected.as_str()),
            None => true,
        }
    }
}
