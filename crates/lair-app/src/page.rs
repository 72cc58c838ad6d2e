//! The page contract.
//!
//! Every screen of the application implements [`Page`]: it is initialized
//! when it becomes active, consumes one [`Event`] at a time and produces an
//! [`Update`], and renders its current state without mutating it.
//!
//! # Invariants
//!
//! - A page never renders content before its first resize; until then
//!   [`Viewport::is_ready`] is false and it draws a loading placeholder.
//! - `init` may run many times (once per activation) and must not reset state
//!   restored from the page cache.
//! - `update` never blocks. Anything slow is requested as an
//!   [`crate::Effect`].

use std::fmt;

use ratatui::Frame;

use crate::{Effect, Event};

/// Identifies one kind of page. At most one page per kind lives in a
/// session's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageKind {
    /// Landing menu.
    Menu,
    /// About document viewer.
    About,
    /// Contact form.
    Contact,
}

impl PageKind {
    /// All page kinds, in menu order.
    pub const ALL: [Self; 3] = [Self::Menu, Self::About, Self::Contact];
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Menu => "menu",
            Self::About => "about",
            Self::Contact => "contact",
        };
        f.write_str(name)
    }
}

/// Dimensions a page lays itself out in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    ready: bool,
}

impl Viewport {
    /// Viewport with known (but not yet delivered) dimensions.
    ///
    /// Pages built from the cache start with the session's last size but stay
    /// not-ready until a resize is actually delivered to them.
    pub fn new(size: Option<(u16, u16)>) -> Self {
        let (width, height) = size.unwrap_or_default();
        Self { width, height, ready: false }
    }

    /// Apply a resize. The viewport is ready from now on.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.ready = true;
    }

    /// Width in columns.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Dimensions (columns, rows).
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Whether at least one resize has been delivered.
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Outcome of [`Page::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Update {
    /// Page to navigate to. `None` keeps the current page.
    pub next: Option<PageKind>,
    /// Effects for the host to run.
    pub effects: Vec<Effect>,
}

impl Update {
    /// Stay on the current page with no effects.
    pub fn none() -> Self {
        Self::default()
    }

    /// Stay on the current page and run `effects`.
    pub fn stay(effects: Vec<Effect>) -> Self {
        Self { next: None, effects }
    }

    /// Navigate to `kind`.
    pub fn navigate(kind: PageKind) -> Self {
        Self { next: Some(kind), effects: Vec::new() }
    }

    /// Terminate the session.
    pub fn quit() -> Self {
        Self::stay(vec![Effect::Quit])
    }

    /// Request suspension of the terminal.
    pub fn suspend() -> Self {
        Self::stay(vec![Effect::Suspend])
    }
}

/// A screen of the application.
pub trait Page {
    /// Which kind of page this is.
    fn kind(&self) -> PageKind;

    /// Current layout dimensions.
    fn viewport(&self) -> Viewport;

    /// Called every time the page becomes active, including re-activation
    /// from the cache.
    fn init(&mut self) -> Vec<Effect>;

    /// Apply one event.
    fn update(&mut self, event: &Event) -> Update;

    /// Draw the current state. Never fails: unavailable content renders as
    /// an error frame.
    fn render(&self, frame: &mut Frame);
}
