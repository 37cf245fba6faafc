//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use p10_proto::{MAX_USER_NUMERIC, ServerNumeric};
use std::collections::HashMap;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("server.max_clients must be between 1 and {max}, got {0}", max = MAX_USER_NUMERIC + 1)]
    MaxClientsOutOfRange(u32),
    #[error("links[{0}].name is required")]
    MissingLinkName(usize),
    #[error("link {0} uses the local server numeric")]
    LinkNumericIsLocal(String),
    #[error("links {first} and {second} share numeric {numeric}")]
    DuplicateLinkNumeric {
        numeric: ServerNumeric,
        first: String,
        second: String,
    },
    #[error("link {0} is defined more than once")]
    DuplicateLinkName(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    let max = config.server.max_clients;
    if max == 0 || max > MAX_USER_NUMERIC + 1 {
        errors.push(ValidationError::MaxClientsOutOfRange(max));
    }

    let mut by_numeric: HashMap<ServerNumeric, &str> = HashMap::new();
    let mut names: HashMap<String, usize> = HashMap::new();
    for (idx, link) in config.links.iter().enumerate() {
        if link.name.is_empty() {
            errors.push(ValidationError::MissingLinkName(idx));
            continue;
        }
        if link.numeric == config.server.numeric {
            errors.push(ValidationError::LinkNumericIsLocal(link.name.clone()));
        }
        if let Some(first) = by_numeric.insert(link.numeric, &link.name) {
            errors.push(ValidationError::DuplicateLinkNumeric {
                numeric: link.numeric,
                first: first.to_string(),
                second: link.name.clone(),
            });
        }
        if names.insert(link.name.to_ascii_lowercase(), idx).is_some() {
            errors.push(ValidationError::DuplicateLinkName(link.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
