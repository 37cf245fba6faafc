//! Handlers for lines received from a linked server.

mod burst;
mod kill;
mod nick;
mod pass;
mod quit;
mod server_intro;
mod squit;

pub use burst::EndOfBurstHandler;
pub use kill::KillHandler;
pub use nick::NickHandler;
pub use pass::PassHandler;
pub use quit::QuitHandler;
pub use server_intro::ServerIntroHandler;
pub use squit::SquitHandler;

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for handler tests.

    use crate::config::Config;
    use crate::handlers::{Context, HandlerResult, LinkState, Registry};
    use crate::state::Matrix;
    use p10_proto::{FullNumeric, P10Message};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    pub const CONFIG: &str = r#"
[server]
name = "hub.example.net"
numeric = "AB"
max_clients = 64

[[links]]
name = "leaf.example.net"
numeric = "AC"
password = "secret"
"#;

    /// One link to a freshly started hub.
    pub struct Harness {
        pub config: Config,
        pub matrix: Arc<Matrix>,
        pub registry: Registry,
        pub link: LinkState,
        pub tx: mpsc::UnboundedSender<P10Message>,
        pub rx: mpsc::UnboundedReceiver<P10Message>,
    }

    impl Harness {
        pub fn new() -> Self {
            let config: Config = toml::from_str(CONFIG).unwrap();
            let matrix = Arc::new(Matrix::new(&config));
            let (tx, rx) = mpsc::unbounded_channel();
            Self {
                config,
                matrix,
                registry: Registry::new(),
                link: LinkState::default(),
                tx,
                rx,
            }
        }

        /// A harness whose peer `leaf.example.net` (`AC`) completed the handshake.
        pub async fn linked() -> Self {
            let mut h = Self::new();
            h.feed("PASS :secret").await.unwrap();
            h.feed("SERVER leaf.example.net 1 100 200 J10 ACAA] +h :Leaf")
                .await
                .unwrap();
            h
        }

        pub async fn feed(&mut self, line: &str) -> HandlerResult {
            let mut ctx = Context::new(&self.matrix, &self.config, &mut self.link, &self.tx);
            self.registry.dispatch(&mut ctx, line).await
        }

        /// Attach a second link so relays away from the peer can be observed.
        pub fn attach_other(&self) -> mpsc::UnboundedReceiver<P10Message> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.matrix.links.attach("other.example.net", tx);
            rx
        }

        /// Register a client on this server.
        pub fn local_client(&self, nick: &str) -> FullNumeric {
            let (tx, _rx) = mpsc::channel(8);
            self.matrix
                .user_manager
                .register_local(nick, "local", "hub.example.net", 1000, tx)
                .unwrap()
        }

        /// Everything queued to the peer so far, in wire form.
        pub fn sent(&mut self) -> Vec<String> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                out.push(msg.to_string());
            }
            out
        }
    }
}
