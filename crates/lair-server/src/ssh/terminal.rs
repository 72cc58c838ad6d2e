//! Session driver over an SSH channel.
//!
//! ratatui renders into a [`ChannelWriter`]; every flush hands the frame's
//! bytes to a forwarding task that writes them to the channel. Input arrives
//! as [`TransportEvent`]s from the handler.

use std::{
    collections::VecDeque,
    io::{self, Write},
    mem,
};

use crossterm::{
    ExecutableCommand,
    cursor::{Hide, Show},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use lair_app::{Event, KeyInput, Router};
use ratatui::{Terminal, TerminalOptions, Viewport, backend::CrosstermBackend, layout::Rect};
use russh::{ChannelId, CryptoVec, server::Handle};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

use super::TransportEvent;
use crate::{Driver, error::SshError};

/// Buffers terminal output and sends it on flush.
pub struct ChannelWriter {
    buffer: Vec<u8>,
    output: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelWriter {
    /// Create a writer sending flushed bytes to `output`.
    pub fn new(output: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { buffer: Vec::new(), output }
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.output
            .send(mem::take(&mut self.buffer))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel closed"))
    }
}

/// Writes output to the channel until the writer is dropped, then closes it.
async fn forward(handle: Handle, channel: ChannelId, mut output: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = output.recv().await {
        if handle.data(channel, CryptoVec::from(bytes)).await.is_err() {
            debug!(?channel, "channel closed while writing");
            return;
        }
    }
    let _ = handle.eof(channel).await;
    let _ = handle.close(channel).await;
}

/// [`Driver`] for one SSH shell channel.
pub struct SshTerminal {
    terminal: Terminal<CrosstermBackend<ChannelWriter>>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    /// Keys decoded from one packet, delivered one event at a time.
    pending: VecDeque<KeyInput>,
    initial_size: Option<(u16, u16)>,
    forwarder: JoinHandle<()>,
    stopped: bool,
}

impl SshTerminal {
    /// Take over `channel`, switching the client to the alternate screen.
    ///
    /// Must be called inside a tokio runtime; the forwarding task is spawned
    /// immediately.
    pub fn new(
        handle: Handle,
        channel: ChannelId,
        size: Option<(u16, u16)>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Result<Self, SshError> {
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let forwarder = tokio::spawn(forward(handle, channel, output_rx));

        let (width, height) = size.unwrap_or_default();
        let backend = CrosstermBackend::new(ChannelWriter::new(output_tx));
        let mut terminal = Terminal::with_options(backend, TerminalOptions {
            viewport: Viewport::Fixed(Rect::new(0, 0, width, height)),
        })?;
        terminal.backend_mut().execute(EnterAlternateScreen)?.execute(Hide)?;

        Ok(Self {
            terminal,
            events,
            pending: VecDeque::new(),
            initial_size: size,
            forwarder,
            stopped: false,
        })
    }

    /// Release the channel: the client gets EOF and a channel close once all
    /// output has been written.
    pub async fn close(self) {
        let Self { terminal, events, forwarder, .. } = self;
        drop(terminal);
        drop(events);
        let _ = forwarder.await;
    }
}

impl Driver for SshTerminal {
    type Error = SshError;

    fn initial_size(&self) -> Option<(u16, u16)> {
        self.initial_size
    }

    async fn poll_event(&mut self) -> Result<Option<Event>, Self::Error> {
        loop {
            if let Some(key) = self.pending.pop_front() {
                return Ok(Some(Event::Key(key)));
            }
            match self.events.recv().await {
                Some(TransportEvent::Input(keys)) => self.pending.extend(keys),
                Some(TransportEvent::Resize { width, height }) => {
                    self.terminal.resize(Rect::new(0, 0, width, height))?;
                    return Ok(Some(Event::Resize { width, height }));
                },
                Some(TransportEvent::Open { .. }) => {},
                Some(TransportEvent::Closed) | None => return Ok(None),
            }
        }
    }

    fn render(&mut self, router: &Router) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| router.render(frame))?;
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<(), Self::Error> {
        self.terminal.backend_mut().execute(SetTitle(title))?;
        Ok(())
    }

    fn stop(&mut self) {
        if mem::replace(&mut self.stopped, true) {
            return;
        }
        let backend = self.terminal.backend_mut();
        let _ = backend.execute(Show).and_then(|b| b.execute(LeaveAlternateScreen));
    }
}
