//! Session router.
//!
//! This module defines the [`Router`], the top-level state machine of one
//! session. It owns the session's [`PageCache`], tracks which page is active,
//! forwards each [`Event`] to the right page and performs navigation.
//!
//! Like the pages it hosts, the router is pure: it consumes events and
//! produces [`Effect`]s for the session host to execute.
//!
//! # Responsibilities
//!
//! - Caches the last terminal size and replays it to the destination page on
//!   every navigation, so the new page lays out without waiting for a
//!   physical resize.
//! - Routes timer ticks and background results to the page that requested
//!   them, even if the user has navigated elsewhere since.
//! - Moves to the absorbing Terminated state on the first `Quit` effect.

use ratatui::{Frame, widgets::Paragraph};
use tracing::{debug, info};

use crate::{Effect, Event, Page, PageCache, PageKind, Screen, Update};

/// Per-session page router.
#[derive(Debug)]
pub struct Router {
    /// One page per kind, built on first visit.
    cache: PageCache,
    /// Active page. `None` once the session has terminated.
    active: Option<PageKind>,
    /// Last terminal size seen (columns, rows). `None` before the first
    /// resize.
    last_size: Option<(u16, u16)>,
    /// Terminal identifier of the connection (`TERM`).
    terminal: String,
}

impl Router {
    /// Create a router with the menu as the active page.
    pub fn new(terminal: impl Into<String>) -> Self {
        let mut cache = PageCache::new();
        cache.get_or_create(PageKind::Menu, None);
        Self { cache, active: Some(PageKind::Menu), last_size: None, terminal: terminal.into() }
    }

    /// Activate the initial page. Returns its init effects.
    pub fn start(&mut self) -> Vec<Effect> {
        let Some(kind) = self.active else {
            return vec![Effect::Quit];
        };
        self.cache.get_or_create(kind, self.last_size).init()
    }

    /// Process one event and return the effects to run.
    ///
    /// Once terminated, every dispatch yields `[Quit]`.
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let Some(active) = self.active else {
            return vec![Effect::Quit];
        };

        if let Event::Resize { width, height } = event {
            self.last_size = Some((width, height));
        }

        let target = event.owner().unwrap_or(active);
        let Some(page) = self.cache.get_mut(target) else {
            debug!(page = %target, "dropping event for page that was never built");
            return Vec::new();
        };

        let Update { next, mut effects } = page.update(&event);

        if effects.iter().any(Effect::is_quit) {
            info!(terminal = %self.terminal, page = %active, "session terminated");
            self.active = None;
            return effects;
        }

        // Background results never move the user
        if target != active {
            return effects;
        }

        if let Some(next) = next.filter(|next| *next != active) {
            effects.extend(self.navigate(active, next));
        }
        effects
    }

    fn navigate(&mut self, from: PageKind, to: PageKind) -> Vec<Effect> {
        debug!(%from, %to, size = ?self.last_size, "navigating");

        let size = self.last_size;
        let page = self.cache.get_or_create(to, size);
        let mut effects = page.init();
        if let Some((width, height)) = size {
            effects.extend(page.update(&Event::Resize { width, height }).effects);
        }
        self.active = Some(to);
        effects
    }

    /// Draw the active page, or a farewell once terminated.
    pub fn render(&self, frame: &mut Frame) {
        match self.active_page() {
            Some(page) => page.render(frame),
            None => frame.render_widget(Paragraph::new("Bye!"), frame.area()),
        }
    }

    /// Kind of the active page. `None` once terminated.
    pub fn active(&self) -> Option<PageKind> {
        self.active
    }

    /// The active page. `None` once terminated.
    pub fn active_page(&self) -> Option<&Screen> {
        self.active.and_then(|kind| self.cache.get(kind))
    }

    /// Cached page of `kind`, active or not.
    pub fn page(&self, kind: PageKind) -> Option<&Screen> {
        self.cache.get(kind)
    }

    /// Last terminal size seen.
    pub fn last_size(&self) -> Option<(u16, u16)> {
        self.last_size
    }

    /// Terminal identifier of the connection.
    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    /// Whether the session has terminated.
    pub fn is_terminated(&self) -> bool {
        self.active.is_none()
    }
}
