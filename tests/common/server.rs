//! Test server management.
//!
//! Runs p10d with a throwaway config and feeds it a scripted link on stdin.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Config used by most tests: hub `AB`, one leaf link `AC` with a password.
pub const HUB_CONFIG: &str = r#"
[server]
name = "hub.example.net"
numeric = "AB"
description = "Test hub"
max_clients = 64

[[links]]
name = "leaf.example.net"
numeric = "AC"
password = "secret"
"#;

/// Handshake lines for the leaf described in [`HUB_CONFIG`].
pub const HANDSHAKE: [&str; 2] = [
    "PASS :secret",
    "SERVER leaf.example.net 1 100 200 J10 ACAA] +h :Leaf",
];

/// A test server instance with its config on disk.
pub struct TestServer {
    config_path: PathBuf,
    _dir: TempDir,
}

/// Outcome of replaying one link through the binary.
#[derive(Debug)]
pub struct LinkRun {
    pub success: bool,
    /// Lines written back to the peer, without `\r\n`.
    pub sent: Vec<String>,
    pub stderr: String,
}

impl TestServer {
    /// Write `config` to a temporary directory.
    pub fn with_config(config: &str) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("p10d.toml");
        std::fs::write(&config_path, config)?;
        Ok(Self {
            config_path,
            _dir: dir,
        })
    }

    /// The default hub configuration.
    pub fn hub() -> anyhow::Result<Self> {
        Self::with_config(HUB_CONFIG)
    }

    /// Run the binary, feed `lines` on stdin, and collect what it sends back.
    pub async fn replay(&self, lines: &[&str]) -> anyhow::Result<LinkRun> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_p10d"))
            .arg(&self.config_path)
            .env("RUST_LOG", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("stdin not piped"))?;
        let mut input = String::new();
        for line in lines {
            input.push_str(line);
            input.push_str("\r\n");
        }
        // The binary may exit early on a fatal line; a broken pipe is expected then.
        let _ = stdin.write_all(input.as_bytes()).await;
        drop(stdin);

        let output =
            tokio::time::timeout(Duration::from_secs(10), child.wait_with_output()).await??;

        let sent = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .filter(|l| !l.is_empty())
            .collect();

        Ok(LinkRun {
            success: output.status.success(),
            sent,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Replay the handshake followed by `lines`.
    pub async fn replay_linked(&self, lines: &[&str]) -> anyhow::Result<LinkRun> {
        let mut all: Vec<&str> = HANDSHAKE.to_vec();
        all.extend_from_slice(lines);
        self.replay(&all).await
    }
}
