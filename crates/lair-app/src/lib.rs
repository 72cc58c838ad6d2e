//! Page state machine for Lair
//!
//! Pure, I/O-free state machines for a small terminal site: a menu, an about
//! page and a contact form. The same code runs behind a local terminal and
//! behind every SSH session, and is driven deterministically in tests.
//!
//! # Components
//!
//! - [`Page`]: contract every screen implements (init, update, render)
//! - [`Screen`]: tagged union over the concrete pages
//! - [`PageCache`]: one lazily built page per [`PageKind`]
//! - [`Router`]: per-session state machine (routing, navigation, resize replay)
//! - [`Effect`]: side effects requested by pages, executed by the session host

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cache;
mod effect;
mod event;
pub mod form;
mod input;
mod page;
pub mod pages;
mod router;
pub mod ui;

pub use cache::PageCache;
pub use effect::{ContactMessage, Effect, Request};
pub use event::{Event, Response, Timer};
pub use form::{ContactForm, Focus};
pub use input::KeyInput;
pub use page::{Page, PageKind, Update, Viewport};
pub use pages::Screen;
pub use router::Router;
