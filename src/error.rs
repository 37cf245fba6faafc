//! Unified error handling for p10d.
//!
//! Registry errors come from the client table; handler errors wrap them
//! together with parse failures and protocol violations, and carry a static
//! code used as a metric label.

use p10_proto::{FullNumeric, MessageParseError, NumericError, P10Message, ServerNumeric};
use thiserror::Error;
use tokio::sync::mpsc;

// ============================================================================
// Registry Errors (client table operations)
// ============================================================================

/// Errors returned by the client registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no free user numeric (capacity {capacity})")]
    NumericSpaceExhausted { capacity: u32 },

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("numeric {0} is already registered")]
    NumericInUse(FullNumeric),

    #[error("no such client: {0}")]
    NoSuchClient(FullNumeric),

    #[error("server {0} is already linked")]
    ServerExists(ServerNumeric),

    #[error(transparent)]
    Numeric(#[from] NumericError),
}

impl RegistryError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NumericSpaceExhausted { .. } => "numeric_space_exhausted",
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::NumericInUse(_) => "numeric_in_use",
            Self::NoSuchClient(_) => "no_such_client",
            Self::ServerExists(_) => "server_exists",
            Self::Numeric(_) => "invalid_numeric",
        }
    }
}

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur while handling a line from a peer.
#[derive(Debug, Error)]
#[allow(clippy::large_enum_variant)] // Send variant is large but rarely constructed
pub enum HandlerError {
    #[error("parse error: {0}")]
    Parse(#[from] MessageParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("unknown server: {0}")]
    UnknownServer(String),

    /// Link credentials rejected during the handshake.
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("command {0} received before the link handshake")]
    NotLinked(String),

    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<P10Message>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(MessageParseError::Numeric(_)) => "invalid_numeric",
            Self::Parse(_) => "parse_error",
            Self::Registry(e) => e.error_code(),
            Self::Protocol(_) => "protocol_violation",
            Self::UnknownServer(_) => "unknown_server",
            Self::AccessDenied(_) => "access_denied",
            Self::NotLinked(_) => "not_linked",
            Self::Send(_) => "send_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the link should be dropped after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AccessDenied(_) | Self::Send(_))
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
