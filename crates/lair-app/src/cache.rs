//! Page cache
//!
//! Lazily builds one page per [`PageKind`] and hands the same instance back
//! on every later request, so scroll positions and half-filled forms survive
//! navigating away and back.
//!
//! The cache is owned by a single session's [`crate::Router`]. Concurrent
//! sessions each own their own cache and never share page state.

use std::collections::HashMap;

use tracing::debug;

use crate::{PageKind, Screen};

/// At most one live page per kind.
#[derive(Debug, Default)]
pub struct PageCache {
    /// Page kind → the single instance of that kind
    pages: HashMap<PageKind, Screen>,
}

impl PageCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The page of `kind`, built with `size` if this is the first request.
    ///
    /// Later requests return the existing instance untouched; `size` is then
    /// ignored.
    pub fn get_or_create(&mut self, kind: PageKind, size: Option<(u16, u16)>) -> &mut Screen {
        self.pages.entry(kind).or_insert_with(|| {
            debug!(page = %kind, "building page");
            Screen::new(kind, size)
        })
    }

    /// Cached page of `kind`. `None` if never built.
    pub fn get(&self, kind: PageKind) -> Option<&Screen> {
        self.pages.get(&kind)
    }

    /// Mutable cached page of `kind`. `None` if never built.
    pub fn get_mut(&mut self, kind: PageKind) -> Option<&mut Screen> {
        self.pages.get_mut(&kind)
    }

    /// Whether a page of `kind` has been built.
    pub fn contains(&self, kind: PageKind) -> bool {
        self.pages.contains_key(&kind)
    }

    /// Number of built pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page has been built.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Drop every page.
    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
