//! Integration test common infrastructure.
//!
//! Provides utilities for running the p10d binary against a scripted link.

pub mod server;

#[allow(unused_imports)]
pub use server::{LinkRun, TestServer};
