//! SSH server lifecycle.
//!
//! [`Server`] binds the listener and runs the accept loop. Every accepted
//! connection becomes one session task in a [`SessionRegistry`]. When the
//! stop signal fires the listener is closed, every session is told to shut
//! down through a `watch` channel, and the registry is drained.

use std::{
    future::Future,
    io,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use russh::keys::{self, Algorithm, PrivateKey, ssh_key::LineEnding};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::watch,
};
use tracing::{info, warn};

use crate::{
    Services, SessionId,
    error::ServerError,
    registry::{SessionRegistry, ShutdownReport},
    ssh,
    storage::Store,
};

/// Pause after a failed accept. Errors such as `EMFILE` persist until
/// sessions release descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:23234")
    pub bind: String,
    /// Ed25519 host key in OpenSSH format. Generated when missing.
    pub host_key: PathBuf,
    /// How long sessions get to finish once shutdown starts
    pub grace: Duration,
    /// Connections idle this long are closed
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:23234".to_string(),
            host_key: PathBuf::from(".ssh/lair_ed25519"),
            grace: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// One accepted connection, handed to the session task.
#[derive(Debug)]
pub struct Connection {
    /// Session id assigned on accept
    pub id: SessionId,
    /// Remote address
    pub peer: SocketAddr,
    /// The accepted stream
    pub stream: TcpStream,
    /// Turns true when the server is shutting down
    pub shutdown: watch::Receiver<bool>,
}

/// Multi-session SSH server.
pub struct Server {
    listener: TcpListener,
    ssh: Arc<russh::server::Config>,
    services: Services,
    store: Option<Arc<Store>>,
    grace: Duration,
}

impl Server {
    /// Load the host key and bind the listener.
    ///
    /// # Errors
    ///
    /// - `ServerError::Config` if the host key cannot be read or created
    /// - `ServerError::Bind` if the address cannot be bound
    pub async fn bind(config: ServerConfig, services: Services) -> Result<Self, ServerError> {
        let key = load_host_key(&config.host_key)?;

        let ssh = russh::server::Config {
            inactivity_timeout: Some(config.idle_timeout),
            auth_rejection_time: Duration::from_secs(1),
            auth_rejection_time_initial: Some(Duration::ZERO),
            keys: vec![key],
            ..Default::default()
        };

        let listener = TcpListener::bind(&config.bind)
            .await
            .map_err(|source| ServerError::Bind { addr: config.bind.clone(), source })?;

        info!(addr = %listener.local_addr()?, "listening");

        Ok(Self { listener, ssh: Arc::new(ssh), services, store: None, grace: config.grace })
    }

    /// Record each login in `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `stop` resolves, then shut down.
    pub async fn run(self, stop: impl Future<Output = ()>) -> ShutdownReport {
        let Self { listener, ssh, services, store, grace } = self;
        serve_connections(listener, grace, stop, move |connection| {
            ssh::serve_connection(connection, Arc::clone(&ssh), services.clone(), store.clone())
        })
        .await
    }
}

/// Source of incoming connections.
pub trait Acceptor: Send + Sync {
    /// Wait for the next connection.
    fn accept(&self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send;
}

impl Acceptor for TcpListener {
    fn accept(&self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        TcpListener::accept(self)
    }
}

/// Next step of the accept loop.
enum Step {
    Accepted(TcpStream, SocketAddr),
    Stop,
    Reaped,
    Backoff,
}

/// Accept loop shared by every transport.
///
/// Runs `serve` for each accepted connection as its own session task until
/// `stop` resolves. Then stops accepting, signals shutdown to every session
/// and waits up to `grace` for them before aborting the rest.
pub async fn serve_connections<L, F, Fut>(
    listener: L,
    grace: Duration,
    stop: impl Future<Output = ()>,
    mut serve: F,
) -> ShutdownReport
where
    L: Acceptor,
    F: FnMut(Connection) -> Fut,
    Fut: Future<Output = Result<(), ServerError>> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut registry = SessionRegistry::new();
    tokio::pin!(stop);

    loop {
        let step = tokio::select! {
            biased;

            () = &mut stop => Step::Stop,

            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => Step::Accepted(stream, peer),
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    Step::Backoff
                },
            },

            Some(_) = registry.join_next(), if !registry.is_empty() => Step::Reaped,
        };

        match step {
            Step::Accepted(stream, peer) => {
                let id = registry.next_id();
                let connection = Connection { id, peer, stream, shutdown: shutdown_rx.clone() };
                registry.spawn(id, peer, serve(connection));
            },
            Step::Backoff => {
                let stopped = tokio::select! {
                    () = &mut stop => true,
                    () = tokio::time::sleep(ACCEPT_BACKOFF) => false,
                };
                if stopped {
                    break;
                }
            },
            Step::Stop => break,
            Step::Reaped => {},
        }
    }

    info!(live = registry.len(), "stop requested, no longer accepting connections");
    drop(listener);
    // Receivers outlive the send: `shutdown_rx` is still held here
    let _ = shutdown_tx.send(true);

    registry.drain(grace).await
}

/// Read the host key at `path`, generating and saving one if it is missing.
fn load_host_key(path: &Path) -> Result<PrivateKey, ServerError> {
    if path.exists() {
        return keys::load_secret_key(path, None).map_err(|e| {
            ServerError::Config(format!("cannot read host key {}: {e}", path.display()))
        });
    }

    let key = PrivateKey::random(&mut rand::rngs::OsRng, Algorithm::Ed25519)
        .map_err(|e| ServerError::Config(format!("cannot generate host key: {e}")))?;
    let encoded = key
        .to_openssh(LineEnding::LF)
        .map_err(|e| ServerError::Config(format!("cannot encode host key: {e}")))?;

    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, encoded.as_bytes())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    info!(path = %path.display(), "generated host key");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::ServicesConfig;

    /// Fails every accept, like a process out of file descriptors.
    struct Exhausted {
        attempts: Arc<AtomicUsize>,
    }

    impl Acceptor for Exhausted {
        async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(io::Error::other("too many open files"))
        }
    }

    #[tokio::test]
    async fn failed_accepts_back_off() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let acceptor = Exhausted { attempts: Arc::clone(&attempts) };
        let stop = tokio::time::sleep(Duration::from_millis(350));

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            serve_connections(acceptor, Duration::from_secs(1), stop, |_connection| async {
                Ok::<(), ServerError>(())
            }),
        )
        .await
        .unwrap();

        assert_eq!(report, ShutdownReport::default());
        let attempts = attempts.load(Ordering::SeqCst);
        assert!((1..=5).contains(&attempts), "accepted {attempts} times in 350ms");
    }

    #[test]
    fn host_key_is_generated_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("host_ed25519");

        let generated = load_host_key(&path).unwrap();
        assert!(path.exists());

        let loaded = load_host_key(&path).unwrap();
        assert_eq!(generated.public_key(), loaded.public_key());
        assert_eq!(loaded.algorithm(), Algorithm::Ed25519);
    }

    #[test]
    fn unreadable_host_key_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host_ed25519");
        std::fs::write(&path, b"not a key").unwrap();

        assert!(matches!(load_host_key(&path), Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            bind: taken.local_addr().unwrap().to_string(),
            host_key: dir.path().join("host_ed25519"),
            ..Default::default()
        };

        let services = Services::from_config(ServicesConfig::default()).unwrap();
        let result = Server::bind(config, services).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}
