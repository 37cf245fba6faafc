//! p10d - P10 link-state daemon.
//!
//! Replays the lines a linked server sends (a burst followed by live
//! traffic) against this server's view of the network, allocating and
//! validating numerics and resolving nick collisions deterministically.
//! Lines this server would send back over the link (collision KILLs, `EA`)
//! are written to stdout; logs go to stderr.
//!
//! The binary serves no local clients. `UserManager::register_local` is
//! library API for embedders that accept client connections.

use anyhow::Context as _;
use p10_proto::{Command, P10Message};
use p10d::config::{self, Config};
use p10d::error::HandlerError;
use p10d::handlers::{Context, LinkState, Registry};
use p10d::state::Matrix;
use p10d::{metrics, telemetry};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (stdout carries the link)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "p10d.toml".to_string());
    let burst_path = args.next();

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    info!(
        server = %config.server.name,
        numeric = %config.server.numeric,
        max_clients = config.server.max_clients,
        links = config.links.len(),
        "Starting p10d"
    );
    debug!(description = %config.server.description, "Server description");

    metrics::init();

    let matrix = Arc::new(Matrix::new(&config));
    let registry = Registry::new();

    // Outbound queue for the link, drained to stdout
    let (tx, mut rx) = mpsc::unbounded_channel::<P10Message>();
    let writer = tokio::spawn(async move {
        let mut out = BufWriter::new(tokio::io::stdout());
        while let Some(msg) = rx.recv().await {
            out.write_all(format!("{msg}\r\n").as_bytes()).await?;
        }
        out.flush().await
    });

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &burst_path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {path}"))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let source = burst_path.as_deref().unwrap_or("stdin");
    let mut link = LinkState::default();
    let outcome = replay(reader, &matrix, &config, &registry, &mut link, &tx)
        .instrument(telemetry::spans::peer(source))
        .await;

    if let Err(ref e) = outcome {
        send_closing(&tx, e);
    }

    if link.peer.is_none() {
        warn!("Link never completed the handshake");
    }
    info!(
        lines = link.lines,
        peer = link.peer.as_ref().map(|p| p.name.as_str()).unwrap_or("-"),
        burst_received = link.burst_received,
        burst_acked = link.burst_acked,
        uptime_secs = chrono::Utc::now().timestamp() - matrix.server.created,
        servers = matrix.servers.len(),
        clients = matrix.user_manager.client_count(),
        local_clients = matrix.user_manager.local_count(),
        "Link closed"
    );
    for (token, count) in registry.get_command_stats() {
        debug!(token, count, "Command usage");
    }
    debug!(metrics = %metrics::gather_metrics(), "Final metrics");

    // Drop every sender so the writer drains and exits
    matrix.links.clear();
    drop(tx);
    writer.await.context("writer task panicked")??;

    outcome.map_err(Into::into)
}

/// Queue `ERROR :Closing Link: <reason>` for the peer.
///
/// Returns whether the line was queued; the writer may already be gone.
fn send_closing(tx: &mpsc::UnboundedSender<P10Message>, reason: &HandlerError) -> bool {
    let closing = P10Message::originless(Command::Other {
        token: "ERROR".to_string(),
        params: vec![format!("Closing Link: {reason}")],
    });
    match tx.send(closing) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Writer gone, ERROR not sent");
            false
        }
    }
}

/// Dispatch every line of the link in order until EOF or a fatal error.
async fn replay(
    mut reader: Box<dyn AsyncBufRead + Unpin + Send>,
    matrix: &Arc<Matrix>,
    config: &Config,
    registry: &Registry,
    link: &mut LinkState,
    tx: &mpsc::UnboundedSender<P10Message>,
) -> Result<(), HandlerError> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Read error, closing link");
                return Ok(());
            }
        }

        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }

        let mut ctx = Context::new(matrix, config, link, tx);
        match registry.dispatch(&mut ctx, &line).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Dropping link");
                return Err(e);
            }
            Err(e) => warn!(error = %e, line = %line.trim_end(), "Rejected line"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_line_is_queued() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let err = HandlerError::AccessDenied("bad password from leaf.example.net".into());
        assert!(send_closing(&tx, &err));
        let line = rx.try_recv().unwrap().to_string();
        assert!(line.starts_with("ERROR :Closing Link: "), "{line}");
    }

    #[test]
    fn closing_line_after_writer_exit_is_not_fatal() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let err = HandlerError::AccessDenied("bad password".into());
        assert!(!send_closing(&tx, &err));
    }
}
