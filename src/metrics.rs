//! Prometheus metrics collection for p10d.
//!
//! Tracks link traffic, collision outcomes and the size of the client
//! table. Metrics are registered once by [`init`]; the recording helpers
//! are no-ops until then so library code and tests can call them freely.
//!
//! - `p10_commands_total{token}` - Inbound P10 commands by token
//! - `p10_command_duration_seconds{token}` - Handler latency by token
//! - `p10_command_errors_total{token,error}` - Handler failures
//! - `p10_collisions_total{resolution}` - Nick collisions by verdict
//! - `p10_kills_total{origin}` - Clients removed by KILL (`collision`, `remote`)

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Commands processed by token (N, D, SQ, ...).
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command processing latency by token.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Command errors by token and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Nick collisions by resolution (`first_wins`, `second_wins`, `both_lose`).
pub static COLLISIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Clients killed, by where the kill was decided.
pub static KILLS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Clients currently known to the network view.
pub static CLIENTS: OnceLock<IntGauge> = OnceLock::new();

/// Servers currently linked (directly or behind a hub).
pub static SERVERS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("p10_commands_total", "P10 commands processed by token"), &["token"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("p10_command_duration_seconds", "P10 command latency by token")
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
        &["token"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("p10_command_errors_total", "P10 command errors by token"), &["token", "error"]));
    register!(COLLISIONS, IntCounterVec::new(Opts::new("p10_collisions_total", "Nick collisions by resolution"), &["resolution"]));
    register!(KILLS, IntCounterVec::new(Opts::new("p10_kills_total", "Clients killed"), &["origin"]));
    register!(CLIENTS, IntGauge::new("p10_clients", "Clients in the network view"));
    register!(SERVERS, IntGauge::new("p10_servers", "Servers in the network view"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

/// Record a command execution with latency.
#[inline]
pub fn record_command(token: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[token]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[token]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(token: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[token, error]).inc();
    }
}

/// Record a resolved nick collision.
#[inline]
pub fn record_collision(resolution: &str) {
    if let Some(c) = COLLISIONS.get() {
        c.with_label_values(&[resolution]).inc();
    }
}

/// Record a client removed by KILL.
#[inline]
pub fn record_kill(origin: &str) {
    if let Some(c) = KILLS.get() {
        c.with_label_values(&[origin]).inc();
    }
}

/// Set the current client count.
#[inline]
pub fn set_clients(count: usize) {
    if let Some(g) = CLIENTS.get() {
        g.set(count as i64);
    }
}

/// Set the current server count.
#[inline]
pub fn set_servers(count: usize) {
    if let Some(g) = SERVERS.get() {
        g.set(count as i64);
    }
}
