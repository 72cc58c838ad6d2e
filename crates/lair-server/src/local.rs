//! Local terminal driver.
//!
//! Implements the [`Driver`] trait for the process's own terminal using
//! crossterm for keyboard events and ratatui for rendering.

use std::io::{self, Stdout, stdout};

use crossterm::{
    ExecutableCommand,
    cursor::Show,
    event::{Event as TermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
        size,
    },
};
use futures::StreamExt;
use lair_app::{Event, KeyInput, Router};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;

use crate::Driver;

/// Local terminal errors.
#[derive(Debug, Error)]
pub enum LocalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The process could not be stopped for job control.
    #[error("suspend failed: {0}")]
    Suspend(String),
}

/// Terminal driver for single-user local runs.
///
/// Enables raw mode and the alternate screen on creation and restores the
/// terminal on [`Driver::stop`] or drop.
pub struct LocalTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    initial_size: Option<(u16, u16)>,
    active: bool,
}

impl LocalTerminal {
    /// Take over the terminal.
    pub fn new() -> Result<Self, LocalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            initial_size: size().ok(),
            active: true,
        })
    }

    /// Convert a crossterm key event to `KeyInput`.
    pub fn convert_key(event: KeyEvent) -> Option<KeyInput> {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Char(c) if ctrl => Some(KeyInput::Ctrl(c.to_ascii_lowercase())),
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::BackTab => Some(KeyInput::BackTab),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            KeyCode::PageUp => Some(KeyInput::PageUp),
            KeyCode::PageDown => Some(KeyInput::PageDown),
            _ => None,
        }
    }

    fn enter(&mut self) -> Result<(), LocalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;
        self.terminal.clear()?;
        self.active = true;
        Ok(())
    }

    fn leave(&mut self) {
        if !self.active {
            return;
        }
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
        let _ = stdout().execute(Show);
        self.active = false;
    }
}

impl Driver for LocalTerminal {
    type Error = LocalError;

    fn initial_size(&self) -> Option<(u16, u16)> {
        self.initial_size
    }

    async fn poll_event(&mut self) -> Result<Option<Event>, Self::Error> {
        loop {
            match self.event_stream.next().await {
                Some(Ok(TermEvent::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                    if let Some(key) = Self::convert_key(key_event) {
                        return Ok(Some(Event::Key(key)));
                    }
                },
                Some(Ok(TermEvent::Resize(width, height))) => {
                    return Ok(Some(Event::Resize { width, height }));
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => return Err(LocalError::Io(e)),
                None => return Ok(None),
            }
        }
    }

    fn render(&mut self, router: &Router) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| router.render(frame))?;
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<(), Self::Error> {
        stdout().execute(SetTitle(title))?;
        Ok(())
    }

    #[cfg(unix)]
    fn suspend(&mut self) -> Result<(), Self::Error> {
        use nix::sys::signal::{Signal, raise};

        self.leave();
        // Returns once the shell resumes the job (SIGCONT)
        raise(Signal::SIGTSTP).map_err(|e| LocalError::Suspend(e.to_string()))?;
        self.enter()
    }

    fn stop(&mut self) {
        self.leave();
    }
}

impl Drop for LocalTerminal {
    fn drop(&mut self) {
        self.leave();
    }
}
