//! Concrete pages
//!
//! [`Screen`] is the tagged union the cache and router hold. Dispatch to the
//! concrete page is a plain `match`.

pub mod about;
pub mod contact;
pub mod menu;

use ratatui::Frame;

pub use about::AboutPage;
pub use contact::ContactPage;
pub use menu::MenuPage;

use crate::{Effect, Event, Page, PageKind, Update, Viewport};

/// One page of any kind.
#[derive(Debug, Clone)]
pub enum Screen {
    /// Landing menu.
    Menu(MenuPage),
    /// About document viewer.
    About(AboutPage),
    /// Contact form.
    Contact(ContactPage),
}

impl Screen {
    /// Build a page of `kind`. Never fails; slow work is deferred to
    /// [`Page::init`] effects.
    pub fn new(kind: PageKind, size: Option<(u16, u16)>) -> Self {
        match kind {
            PageKind::Menu => Self::Menu(MenuPage::new(size)),
            PageKind::About => Self::About(AboutPage::new(size)),
            PageKind::Contact => Self::Contact(ContactPage::new(size)),
        }
    }

    /// The menu, if this is one.
    pub fn as_menu(&self) -> Option<&MenuPage> {
        match self {
            Self::Menu(page) => Some(page),
            _ => None,
        }
    }

    /// The contact page, if this is one.
    pub fn as_contact(&self) -> Option<&ContactPage> {
        match self {
            Self::Contact(page) => Some(page),
            _ => None,
        }
    }

    fn page(&self) -> &dyn Page {
        match self {
            Self::Menu(page) => page,
            Self::About(page) => page,
            Self::Contact(page) => page,
        }
    }

    fn page_mut(&mut self) -> &mut dyn Page {
        match self {
            Self::Menu(page) => page,
            Self::About(page) => page,
            Self::Contact(page) => page,
        }
    }
}

impl Page for Screen {
    fn kind(&self) -> PageKind {
        self.page().kind()
    }

    fn viewport(&self) -> Viewport {
        self.page().viewport()
    }

    fn init(&mut self) -> Vec<Effect> {
        self.page_mut().init()
    }

    fn update(&mut self, event: &Event) -> Update {
        self.page_mut().update(event)
    }

    fn render(&self, frame: &mut Frame) {
        self.page().render(frame);
    }
}
