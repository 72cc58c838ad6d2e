//! Driver trait for abstracting terminal I/O.
//!
//! The [`Driver`] trait decouples the session host from a specific
//! transport. Each transport implements the trait, while the generic
//! [`crate::SessionHost`] handles routing, effects and rendering.

use std::future::Future;

use lair_app::{Event, Router};

/// One connection's terminal.
///
/// # Implementations
///
/// - [`crate::LocalTerminal`]: crossterm on the process's own terminal
/// - [`crate::ssh::SshTerminal`]: ratatui over an SSH channel
/// - Tests: scripted events over ratatui's `TestBackend`
pub trait Driver: Send {
    /// Transport-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Terminal size known when the session starts. `None` if the
    /// transport reports it later as a resize event.
    fn initial_size(&self) -> Option<(u16, u16)>;

    /// Wait for the next terminal event.
    ///
    /// Returns `None` once the connection has closed.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send;

    /// Draw the router's active page.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    fn render(&mut self, router: &Router) -> Result<(), Self::Error>;

    /// Set the terminal window title.
    fn set_title(&mut self, title: &str) -> Result<(), Self::Error>;

    /// Background the terminal until the user resumes it.
    ///
    /// Transports without job control ignore the request.
    fn suspend(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Restore the terminal and release resources.
    fn stop(&mut self);
}
