//! Page side-effects and intents.
//!
//! This module defines the [`Effect`] enum, which represents instructions
//! produced by pages for the session host to execute. Pages never perform
//! I/O themselves; every effect stays an inspectable value until the host
//! interprets it.

use std::time::Duration;

use crate::Timer;

/// Effects produced by pages and the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Set the terminal window title.
    SetTitle(String),

    /// Run a request in the background and deliver its
    /// [`crate::Response`] as an [`crate::Event::Fetched`].
    Fetch(Request),

    /// Deliver [`crate::Event::Tick`] once `after` has elapsed.
    Schedule {
        /// Timer to fire.
        timer: Timer,
        /// Delay before firing.
        after: Duration,
    },

    /// Suspend the terminal (backgrounding). Not a page state.
    Suspend,

    /// Terminate the session.
    Quit,
}

impl Effect {
    /// Whether this effect terminates the session.
    pub fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }
}

/// Background work a page can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Look up the current weather.
    Weather,

    /// Load a named document.
    Document {
        /// Document name (for example `about`).
        name: String,
    },

    /// Send a message from the contact form.
    SendMessage(ContactMessage),
}

/// A validated message from the contact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    /// Sender's full name.
    pub name: String,
    /// Sender's email address.
    pub email: String,
    /// Message body.
    pub message: String,
}
