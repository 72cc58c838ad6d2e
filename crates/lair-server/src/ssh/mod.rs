//! SSH transport.
//!
//! Each accepted TCP connection runs a russh session and a [`SessionHost`]
//! side by side. The handler turns protocol callbacks into
//! [`TransportEvent`]s; the host consumes them through [`SshTerminal`].

mod handler;
mod keys;
mod terminal;

use std::sync::Arc;

use lair_app::{KeyInput, Router};
use russh::{
    ChannelId, Disconnect,
    server::{self, Handle},
};
use tokio::sync::{mpsc, watch};
use tracing::debug;

pub use handler::SshHandler;
pub use keys::KeyDecoder;
pub use terminal::{ChannelWriter, SshTerminal};

use crate::{
    Services, SessionEnd, SessionHost, SessionId, Store,
    error::{ServerError, SshError},
    server::Connection,
};

/// What the handler reports to the session host.
pub enum TransportEvent {
    /// The client started a shell.
    Open {
        /// Shell channel
        channel: ChannelId,
        /// Handle for writing to the connection
        handle: Handle,
        /// Size from the pty request, if one was made
        size: Option<(u16, u16)>,
        /// Client `TERM`, empty without a pty
        term: String,
    },
    /// Decoded keystrokes.
    Input(Vec<KeyInput>),
    /// The client window changed size.
    Resize {
        /// Columns
        width: u16,
        /// Rows
        height: u16,
    },
    /// The shell channel was closed by the client.
    Closed,
}

/// Serve one connection until its session ends.
///
/// # Errors
///
/// Returns an error if the SSH handshake fails or the session's terminal
/// fails. Errors from the transport after the session ended are only logged.
pub async fn serve_connection(
    connection: Connection,
    config: Arc<server::Config>,
    services: Services,
    store: Option<Arc<Store>>,
) -> Result<(), ServerError> {
    let Connection { id, peer, stream, mut shutdown } = connection;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let handler = SshHandler::new(id, peer, events_tx, store);
    let running = tokio::select! {
        running = server::run_stream(config, stream, handler) => running?,
        Ok(_) = shutdown.wait_for(|stop| *stop) => {
            debug!(session = id, "shutdown during handshake");
            return Ok(());
        },
    };
    let handle = running.handle();

    let hosted = async move {
        let result = host_session(id, events_rx, shutdown, services).await;
        let reason = match result {
            Ok(Some(SessionEnd::Shutdown)) => "server shutting down",
            _ => "bye",
        };
        let _ = handle
            .disconnect(Disconnect::ByApplication, reason.to_string(), String::new())
            .await;
        result
    };

    let (transport, hosted) = tokio::join!(running, hosted);
    if let Err(e) = transport {
        debug!(session = id, error = %e, "transport closed with error");
    }
    hosted?;
    Ok(())
}

/// Wait for a shell, then run the session on it.
///
/// Returns `None` if the connection closed or the server stopped before a
/// shell was requested.
async fn host_session(
    id: SessionId,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    mut shutdown: watch::Receiver<bool>,
    services: Services,
) -> Result<Option<SessionEnd>, SshError> {
    let (channel, handle, size, term) = loop {
        let event = tokio::select! {
            // Disabled for this round if the sender is gone
            Ok(_) = shutdown.wait_for(|stop| *stop) => return Ok(None),
            event = events.recv() => event,
        };
        match event {
            Some(TransportEvent::Open { channel, handle, size, term }) => {
                break (channel, handle, size, term);
            },
            Some(_) => {},
            None => return Ok(None),
        }
    };

    let terminal = SshTerminal::new(handle, channel, size, events)?;
    let term = if term.is_empty() { "unknown".to_string() } else { term };
    let mut host = SessionHost::new(id, terminal, Router::new(term), services).with_shutdown(shutdown);

    let end = host.run().await;
    host.into_driver().close().await;
    end.map(Some)
}
