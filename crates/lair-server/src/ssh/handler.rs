//! russh server handler.
//!
//! One handler per TCP connection. It does no rendering itself: everything
//! the client sends is translated into [`TransportEvent`]s for the session
//! host running alongside the russh session.

use std::{net::SocketAddr, sync::Arc};

use russh::{
    Channel, ChannelId, Pty,
    keys::{PublicKey, ssh_key::HashAlg},
    server::{self, Auth, Msg, Session},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{KeyDecoder, TransportEvent};
use crate::{SessionId, Store, error::SshError};

/// Handler for one SSH connection.
pub struct SshHandler {
    id: SessionId,
    peer: SocketAddr,
    events: mpsc::UnboundedSender<TransportEvent>,
    /// Where logins are recorded, if anywhere.
    store: Option<Arc<Store>>,
    decoder: KeyDecoder,
    /// Size from the pty request, if any.
    size: Option<(u16, u16)>,
    term: String,
    /// The channel running the shell. Only one per connection.
    shell: Option<ChannelId>,
}

impl SshHandler {
    /// Create a handler posting into `events`.
    pub fn new(
        id: SessionId,
        peer: SocketAddr,
        events: mpsc::UnboundedSender<TransportEvent>,
        store: Option<Arc<Store>>,
    ) -> Self {
        Self {
            id,
            peer,
            events,
            store,
            decoder: KeyDecoder::new(),
            size: None,
            term: String::new(),
            shell: None,
        }
    }

    fn is_shell(&self, channel: ChannelId) -> bool {
        self.shell == Some(channel)
    }

    fn remember(&self, user: &str, key_fingerprint: Option<String>) {
        let Some(store) = &self.store else {
            return;
        };
        match store.record_visit(user, key_fingerprint) {
            Ok(Some(record)) => {
                debug!(session = self.id, user, since = record.created_at_secs, "returning user");
            },
            Ok(None) => info!(session = self.id, user, "first login"),
            Err(e) => warn!(session = self.id, user, error = %e, "cannot record login"),
        }
    }

    fn post(&self, event: TransportEvent) {
        // Receiver is gone once the session host has finished
        let _ = self.events.send(event);
    }
}

fn dimension(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

impl server::Handler for SshHandler {
    type Error = SshError;

    async fn auth_none(&mut self, user: &str) -> Result<Auth, Self::Error> {
        info!(session = self.id, peer = %self.peer, user, "authenticated (none)");
        self.remember(user, None);
        Ok(Auth::Accept)
    }

    async fn auth_publickey(&mut self, user: &str, key: &PublicKey) -> Result<Auth, Self::Error> {
        info!(
            session = self.id,
            peer = %self.peer,
            user,
            algorithm = %key.algorithm(),
            "authenticated (public key)"
        );
        self.remember(user, Some(key.fingerprint(HashAlg::Sha256).to_string()));
        Ok(Auth::Accept)
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        debug!(session = self.id, channel = ?channel.id(), "session channel opened");
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        term: &str,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        debug!(session = self.id, term, col_width, row_height, "pty requested");
        self.size = Some((dimension(col_width), dimension(row_height)));
        self.term = term.to_string();
        let _ = session.channel_success(channel);
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        if self.shell.is_some() {
            let _ = session.channel_failure(channel);
            return Ok(());
        }
        let _ = session.channel_success(channel);

        self.shell = Some(channel);
        let term = std::mem::take(&mut self.term);
        self.post(TransportEvent::Open { channel, handle: session.handle(), size: self.size, term });
        Ok(())
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        if !self.is_shell(channel) {
            return Ok(());
        }
        let keys = self.decoder.feed(data);
        if !keys.is_empty() {
            self.post(TransportEvent::Input(keys));
        }
        Ok(())
    }

    async fn window_change_request(
        &mut self,
        channel: ChannelId,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        let (width, height) = (dimension(col_width), dimension(row_height));
        self.size = Some((width, height));
        if self.is_shell(channel) {
            self.post(TransportEvent::Resize { width, height });
        }
        Ok(())
    }

    async fn channel_eof(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        if self.is_shell(channel) {
            self.post(TransportEvent::Closed);
        }
        Ok(())
    }

    async fn channel_close(
        &mut self,
        channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        if self.is_shell(channel) {
            self.post(TransportEvent::Closed);
        }
        Ok(())
    }
}
