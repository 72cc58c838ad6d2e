//! Session input events.
//!
//! This module defines [`Event`], the complete set of inputs that drive a
//! [`crate::Router`] and the pages it hosts.
//!
//! Events originate from three distinct sources, merged by the session host
//! into one ordered stream:
//! - The terminal: key presses and size changes.
//! - Timers requested by pages through [`crate::Effect::Schedule`].
//! - Background requests started through [`crate::Effect::Fetch`], which post
//!   exactly one [`Response`] each.

use crate::{KeyInput, PageKind};

/// Events processed by the router and its pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Terminal resize (columns, rows).
    Resize {
        /// Terminal width in columns.
        width: u16,
        /// Terminal height in rows.
        height: u16,
    },

    /// Keyboard input.
    Key(KeyInput),

    /// A timer requested by a page fired.
    Tick(Timer),

    /// A background request completed.
    Fetched(Response),
}

impl Event {
    /// Page that owns this event, if it is not addressed to the active page.
    ///
    /// Timer ticks and background results belong to the page that requested
    /// them. Key presses and resizes always go to the active page.
    pub fn owner(&self) -> Option<PageKind> {
        match self {
            Self::Tick(timer) => Some(timer.owner()),
            Self::Fetched(response) => Some(response.owner()),
            Self::Resize { .. } | Self::Key(_) => None,
        }
    }
}

/// Named timers a page can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Menu spinner animation while the weather lookup is in flight.
    Spinner,
}

impl Timer {
    /// Page that scheduled this timer.
    pub fn owner(self) -> PageKind {
        match self {
            Self::Spinner => PageKind::Menu,
        }
    }
}

/// Result of one background request.
///
/// Failures carry a human-readable message; the receiving page renders it
/// and stays interactive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Current weather summary.
    Weather(Result<String, String>),

    /// A document finished loading.
    Document {
        /// Document name as requested.
        name: String,
        /// Document text, or the reason it could not be loaded.
        result: Result<String, String>,
    },

    /// The contact message was handed to the mailer.
    MessageSent(Result<(), String>),
}

impl Response {
    /// Page that issued the matching request.
    pub fn owner(&self) -> PageKind {
        match self {
            Self::Weather(_) => PageKind::Menu,
            Self::Document { .. } => PageKind::About,
            Self::MessageSent(_) => PageKind::Contact,
        }
    }
}
