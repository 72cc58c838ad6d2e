//! About page
//!
//! Scrollable viewer for the `about` document. The document is requested in
//! the background on first activation; a failed load renders as an error
//! frame and the page stays usable.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{Effect, Event, KeyInput, Page, PageKind, Request, Response, Update, Viewport, ui};

/// Window title while the page is active.
pub const TITLE: &str = "About Me";

/// Name of the document shown by this page.
pub const DOCUMENT: &str = "about";

/// Header and footer rows.
const CHROME_HEIGHT: u16 = 2;

/// Loading progress of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    /// Not requested yet.
    NotLoaded,
    /// Request in flight.
    Loading,
    /// Document lines.
    Loaded(Vec<String>),
    /// Load failed with this message.
    Failed(String),
}

/// Document viewer.
#[derive(Debug, Clone)]
pub struct AboutPage {
    viewport: Viewport,
    document: DocumentState,
    scroll: usize,
}

impl AboutPage {
    /// Viewer with nothing loaded.
    pub fn new(size: Option<(u16, u16)>) -> Self {
        Self { viewport: Viewport::new(size), document: DocumentState::NotLoaded, scroll: 0 }
    }

    /// Document progress.
    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    /// First visible line.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Scroll position as a percentage of the scrollable range.
    pub fn scroll_percent(&self) -> usize {
        let max = self.max_scroll();
        if max == 0 { 100 } else { self.scroll * 100 / max }
    }

    fn body_height(&self) -> usize {
        usize::from(self.viewport.height().saturating_sub(CHROME_HEIGHT))
    }

    fn line_count(&self) -> usize {
        match &self.document {
            DocumentState::Loaded(lines) => lines.len(),
            _ => 0,
        }
    }

    fn max_scroll(&self) -> usize {
        self.line_count().saturating_sub(self.body_height())
    }

    fn scroll_to(&mut self, line: usize) {
        self.scroll = line.min(self.max_scroll());
    }

    fn handle_key(&mut self, key: KeyInput) -> Update {
        let page = self.body_height().max(1);
        match key {
            KeyInput::QUIT | KeyInput::Char('q') => return Update::quit(),
            KeyInput::SUSPEND => return Update::suspend(),
            KeyInput::Esc | KeyInput::Backspace | KeyInput::Char('b') => {
                return Update::navigate(PageKind::Menu);
            },
            KeyInput::Up | KeyInput::Char('k') => self.scroll_to(self.scroll.saturating_sub(1)),
            KeyInput::Down | KeyInput::Char('j') => self.scroll_to(self.scroll + 1),
            KeyInput::PageUp => self.scroll_to(self.scroll.saturating_sub(page)),
            KeyInput::PageDown | KeyInput::Char(' ') => self.scroll_to(self.scroll + page),
            KeyInput::Home | KeyInput::Char('g') => self.scroll_to(0),
            KeyInput::End | KeyInput::Char('G') => self.scroll_to(usize::MAX),
            _ => {},
        }
        Update::none()
    }
}

impl Page for AboutPage {
    fn kind(&self) -> PageKind {
        PageKind::About
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn init(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::SetTitle(TITLE.to_string())];
        if matches!(self.document, DocumentState::NotLoaded | DocumentState::Failed(_)) {
            self.document = DocumentState::Loading;
            effects.push(Effect::Fetch(Request::Document { name: DOCUMENT.to_string() }));
        }
        effects
    }

    fn update(&mut self, event: &Event) -> Update {
        match event {
            Event::Resize { width, height } => {
                self.viewport.resize(*width, *height);
                self.scroll_to(self.scroll);
                Update::none()
            },
            Event::Key(key) => self.handle_key(*key),
            Event::Fetched(Response::Document { name, result }) if name == DOCUMENT => {
                self.document = match result {
                    Ok(text) => DocumentState::Loaded(text.lines().map(str::to_string).collect()),
                    Err(message) => DocumentState::Failed(message.clone()),
                };
                self.scroll_to(self.scroll);
                Update::none()
            },
            Event::Tick(_) | Event::Fetched(_) => Update::none(),
        }
    }

    fn render(&self, frame: &mut Frame) {
        if !self.viewport.is_ready() {
            ui::placeholder(frame);
            return;
        }

        let [header_area, body_area, footer_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
                .areas(frame.area());

        let title = format!(" {TITLE} ");
        let rule = "─".repeat(usize::from(header_area.width).saturating_sub(title.chars().count()));
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(rule, Style::default().fg(Color::Red)),
            ])),
            header_area,
        );

        match &self.document {
            DocumentState::Loaded(lines) => {
                let visible: Vec<Line> = lines
                    .iter()
                    .skip(self.scroll)
                    .take(usize::from(body_area.height))
                    .map(|line| Line::raw(line.as_str()))
                    .collect();
                frame.render_widget(Paragraph::new(visible), body_area);
            },
            DocumentState::Failed(message) => {
                ui::error_frame(frame, body_area, TITLE, message);
            },
            DocumentState::NotLoaded | DocumentState::Loading => {
                frame.render_widget(
                    Paragraph::new("Loading document...")
                        .alignment(Alignment::Center)
                        .style(Style::default().fg(Color::DarkGray)),
                    body_area,
                );
            },
        }

        let [help_area, percent_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(6)]).areas(footer_area);
        ui::help_line(frame, help_area, &[("↑/↓", "scroll"), ("esc", "back"), ("q", "quit")]);
        frame.render_widget(
            Paragraph::new(format!("{:>3}%", self.scroll_percent())).alignment(Alignment::Right),
            percent_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(lines: usize, height: u16) -> AboutPage {
        let mut about = AboutPage::new(None);
        about.init();
        about.update(&Event::Resize { width: 80, height });
        let text: Vec<String> = (0..lines).map(|i| format!("line {i}")).collect();
        about.update(&Event::Fetched(Response::Document {
            name: DOCUMENT.into(),
            result: Ok(text.join("\n")),
        }));
        about
    }

    #[test]
    fn init_requests_document_once() {
        let mut about = AboutPage::new(None);
        let effects = about.init();
        assert!(effects.contains(&Effect::Fetch(Request::Document { name: DOCUMENT.into() })));
        assert_eq!(about.init(), vec![Effect::SetTitle(TITLE.into())]);
    }

    #[test]
    fn reinit_keeps_scroll_position() {
        let mut about = loaded(100, 12);
        about.update(&Event::Key(KeyInput::PageDown));
        let scroll = about.scroll();
        assert_eq!(scroll, 10);
        assert_eq!(about.init(), vec![Effect::SetTitle(TITLE.into())]);
        assert_eq!(about.scroll(), scroll);
    }

    #[test]
    fn scroll_is_clamped() {
        let mut about = loaded(30, 12);
        about.update(&Event::Key(KeyInput::Up));
        assert_eq!(about.scroll(), 0);
        about.update(&Event::Key(KeyInput::End));
        assert_eq!(about.scroll(), 20);
        assert_eq!(about.scroll_percent(), 100);
        about.update(&Event::Key(KeyInput::Down));
        assert_eq!(about.scroll(), 20);
        about.update(&Event::Key(KeyInput::Home));
        assert_eq!(about.scroll_percent(), 0);
    }

    #[test]
    fn back_keys_navigate_to_menu() {
        for key in [KeyInput::Esc, KeyInput::Backspace, KeyInput::Char('b')] {
            let mut about = loaded(5, 12);
            assert_eq!(about.update(&Event::Key(key)).next, Some(PageKind::Menu));
        }
    }

    #[test]
    fn failed_load_renders_error_frame() {
        let mut about = AboutPage::new(None);
        about.init();
        about.update(&Event::Resize { width: 80, height: 24 });
        about.update(&Event::Fetched(Response::Document {
            name: DOCUMENT.into(),
            result: Err("about.md: not found".into()),
        }));
        let text = ui::render_text(80, 24, |frame| about.render(frame));
        assert!(text.contains("Something went wrong"));
        assert!(text.contains("about.md: not found"));

        let update = about.update(&Event::Key(KeyInput::Esc));
        assert_eq!(update.next, Some(PageKind::Menu));
        assert!(about.init().contains(&Effect::Fetch(Request::Document { name: DOCUMENT.into() })));
    }

    #[test]
    fn renders_visible_window() {
        let mut about = loaded(50, 12);
        about.update(&Event::Key(KeyInput::Down));
        let text = ui::render_text(80, 12, |frame| about.render(frame));
        assert!(text.contains(TITLE));
        assert!(!text.contains("line 0\n"));
        assert!(text.contains("line 1"));
        assert!(text.contains("line 10"));
        assert!(!text.contains("line 11"));
    }
}
