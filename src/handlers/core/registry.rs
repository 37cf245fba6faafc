//! Command handler registry and dispatch.
//!
//! The `Registry` maps P10 tokens to handlers, tokenizes each inbound line
//! once, and records per-token usage, latency and error metrics.

use super::context::Context;
use super::traits::ServerHandler;
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::server::{
    EndOfBurstHandler, KillHandler, NickHandler, PassHandler, QuitHandler, ServerIntroHandler,
    SquitHandler,
};
use crate::telemetry::{CommandTimer, spans};
use p10_proto::{Command, P10Line, P10Message};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Instrument, debug};

/// Tokens accepted before the `SERVER` handshake completes.
const HANDSHAKE_TOKENS: &[&str] = &["PASS", "SERVER"];

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn ServerHandler>>,
    /// Per-token usage counters for the shutdown summary.
    command_counts: HashMap<&'static str, AtomicU64>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn ServerHandler>> = HashMap::new();

        // Handshake
        handlers.insert("PASS", Box::new(PassHandler));
        handlers.insert("SERVER", Box::new(ServerIntroHandler));
        handlers.insert("S", Box::new(ServerIntroHandler));

        // Clients
        handlers.insert("N", Box::new(NickHandler));
        handlers.insert("D", Box::new(KillHandler));
        handlers.insert("Q", Box::new(QuitHandler));

        // Topology
        handlers.insert("SQ", Box::new(SquitHandler));
        handlers.insert("EB", Box::new(EndOfBurstHandler));
        handlers.insert("EA", Box::new(EndOfBurstHandler));

        let command_counts = handlers
            .keys()
            .map(|&token| (token, AtomicU64::new(0)))
            .collect();

        Self {
            handlers,
            command_counts,
        }
    }

    /// Get command usage statistics, most used first.
    pub fn get_command_stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .command_counts
            .iter()
            .map(|(token, count)| (*token, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        stats
    }

    /// Dispatch one raw line from the peer.
    ///
    /// Unknown tokens are ignored. Errors are recorded under the line's token
    /// and returned; they never leave the registry in a state that prevents
    /// the next line from being dispatched.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, raw: &str) -> HandlerResult {
        ctx.link.lines += 1;

        let line = match P10Line::parse(raw) {
            Ok(line) => line,
            Err(e) => {
                let err = HandlerError::from(e);
                crate::metrics::record_command_error("-", err.error_code());
                return Err(err);
            }
        };

        let Some((&token, handler)) = self.handlers.get_key_value(line.token) else {
            debug!(token = %line.token, origin = ?line.origin, "Ignoring unknown command");
            return Ok(());
        };

        if let Some(counter) = self.command_counts.get(token) {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let span = spans::command(token, line.origin, ctx.link.lines);
        let _timer = CommandTimer::new(token);

        let result = Self::run(handler.as_ref(), ctx, token, &line)
            .instrument(span)
            .await;

        if let Err(ref e) = result {
            crate::metrics::record_command_error(token, e.error_code());
            debug!(token, error = %e, "Command error");
        }
        result
    }

    async fn run(
        handler: &dyn ServerHandler,
        ctx: &mut Context<'_>,
        token: &'static str,
        line: &P10Line<'_>,
    ) -> HandlerResult {
        if ctx.link.peer.is_none() && !HANDSHAKE_TOKENS.contains(&token) {
            return Err(HandlerError::NotLinked(token.to_string()));
        }

        let msg = P10Message {
            origin: line.origin.map(str::to_string),
            command: Command::from_line(line)?,
        };
        handler.handle(ctx, &msg).await
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
