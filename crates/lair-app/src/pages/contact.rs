//! Contact page
//!
//! A mail form. Submitting a valid form hands the message to the mailer in
//! the background; the page shows a confirmation once the send completes.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{
    ContactForm, Effect, Event, Focus, KeyInput, Page, PageKind, Request, Response, Update,
    Viewport, form::MESSAGE_LIMIT, ui,
};

/// Window title while the page is active.
pub const TITLE: &str = "Contact Me";

const FORM_WIDTH: u16 = 64;
const FORM_HEIGHT: u16 = 20;

/// Where the page is in the send cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Filling in the form.
    Editing,
    /// Waiting for the mailer.
    Sending,
    /// Message delivered on behalf of `name`.
    Sent {
        /// Sender name, for the confirmation.
        name: String,
    },
}

/// Contact form page.
#[derive(Debug, Clone)]
pub struct ContactPage {
    viewport: Viewport,
    form: ContactForm,
    phase: Phase,
    last_error: Option<String>,
}

impl ContactPage {
    /// Empty form.
    pub fn new(size: Option<(u16, u16)>) -> Self {
        Self {
            viewport: Viewport::new(size),
            form: ContactForm::new(),
            phase: Phase::Editing,
            last_error: None,
        }
    }

    /// Form fields and validation state.
    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    /// Send cycle phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Error from the last failed send.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn handle_key(&mut self, key: KeyInput) -> Update {
        match key {
            KeyInput::QUIT => return Update::quit(),
            KeyInput::SUSPEND => return Update::suspend(),
            _ => {},
        }

        match self.phase {
            Phase::Sent { .. } => {
                if matches!(key, KeyInput::Enter | KeyInput::Esc) {
                    self.phase = Phase::Editing;
                    return Update::navigate(PageKind::Menu);
                }
                Update::none()
            },
            Phase::Sending => {
                if key == KeyInput::Esc {
                    return Update::navigate(PageKind::Menu);
                }
                Update::none()
            },
            Phase::Editing => self.edit(key),
        }
    }

    fn edit(&mut self, key: KeyInput) -> Update {
        match key {
            KeyInput::Esc => return Update::navigate(PageKind::Menu),
            KeyInput::Tab | KeyInput::Down => self.form.focus = self.form.focus.next(),
            KeyInput::BackTab | KeyInput::Up => self.form.focus = self.form.focus.prev(),
            KeyInput::Enter if self.form.focus == Focus::Send => return self.submit(),
            KeyInput::Enter => self.form.focus = self.form.focus.next(),
            other => {
                self.form.edit(other);
            },
        }
        Update::none()
    }

    fn submit(&mut self) -> Update {
        self.last_error = None;
        if !self.form.validate() {
            return Update::none();
        }
        self.phase = Phase::Sending;
        Update::stay(vec![Effect::Fetch(Request::SendMessage(self.form.message()))])
    }

    fn on_sent(&mut self, result: &Result<(), String>) {
        if self.phase != Phase::Sending {
            return;
        }
        match result {
            Ok(()) => {
                self.phase = Phase::Sent { name: self.form.name.trim().to_string() };
                self.form.reset();
            },
            Err(message) => {
                self.phase = Phase::Editing;
                self.last_error = Some(message.clone());
            },
        }
    }

    fn render_field(
        &self,
        frame: &mut Frame,
        area: Rect,
        label: &str,
        value: &str,
        focus: Focus,
        error: Option<&str>,
    ) {
        let focused = self.form.focus == focus && self.phase == Phase::Editing;
        let border = if focused { Color::Magenta } else { Color::DarkGray };
        let cursor = if focused { "▌" } else { "" };
        let title = match error {
            Some(error) => Line::from(vec![
                Span::raw(format!(" {label} ")),
                Span::styled(format!("{error} "), Style::default().fg(Color::Red)),
            ]),
            None => Line::raw(format!(" {label} ")),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title);
        frame.render_widget(
            Paragraph::new(format!("{value}{cursor}")).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_form(&self, frame: &mut Frame) {
        let area = ui::centered(frame.area(), FORM_WIDTH, FORM_HEIGHT);
        let [title_area, name_area, email_area, message_area, send_area, status_area, help_area] =
            Layout::vertical([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(Line::styled(
                "Lair Mailer",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )),
            title_area,
        );
        let errors = &self.form.errors;
        self.render_field(frame, name_area, "Name", &self.form.name, Focus::Name, errors.name);
        self.render_field(frame, email_area, "Email", &self.form.email, Focus::Email, errors.email);
        let message_label =
            format!("Message ({}/{MESSAGE_LIMIT})", self.form.message.chars().count());
        self.render_field(
            frame,
            message_area,
            &message_label,
            &self.form.message,
            Focus::Message,
            errors.message,
        );

        let send_style = if self.form.focus == Focus::Send {
            Style::default().fg(Color::White).bg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        frame.render_widget(
            Paragraph::new(Line::styled("[ Send ]", send_style)).alignment(Alignment::Center),
            send_area,
        );

        let status = match (&self.phase, &self.last_error) {
            (Phase::Sending, _) => {
                Line::styled("Sending...", Style::default().fg(Color::Yellow))
            },
            (_, Some(error)) => {
                Line::styled(format!("Could not send: {error}"), Style::default().fg(Color::Red))
            },
            _ => Line::raw(""),
        };
        frame.render_widget(Paragraph::new(status).alignment(Alignment::Center), status_area);

        ui::help_line(frame, help_area, &[("tab", "next"), ("enter", "confirm"), ("esc", "back")]);
    }

    fn render_sent(frame: &mut Frame, name: &str) {
        let area = ui::centered(frame.area(), FORM_WIDTH, 4);
        let lines = vec![
            Line::styled(
                format!("Hey {name}, message was delivered"),
                Style::default().add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ),
            Line::raw(""),
            Line::styled("press enter to return to the menu", Style::default().fg(Color::DarkGray)),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }
}

impl Page for ContactPage {
    fn kind(&self) -> PageKind {
        PageKind::Contact
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn init(&mut self) -> Vec<Effect> {
        vec![Effect::SetTitle(TITLE.to_string())]
    }

    fn update(&mut self, event: &Event) -> Update {
        match event {
            Event::Resize { width, height } => {
                self.viewport.resize(*width, *height);
                Update::none()
            },
            Event::Key(key) => self.handle_key(*key),
            Event::Fetched(Response::MessageSent(result)) => {
                self.on_sent(result);
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
        match &self.phase {
            Phase::Sent { name } => Self::render_sent(frame, name),
            Phase::Editing | Phase::Sending => self.render_form(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContactMessage;

    fn type_text(page: &mut ContactPage, text: &str) {
        for c in text.chars() {
            page.update(&Event::Key(KeyInput::Char(c)));
        }
    }

    fn filled(email: &str) -> ContactPage {
        let mut page = ContactPage::new(None);
        page.update(&Event::Resize { width: 100, height: 40 });
        type_text(&mut page, "Ada");
        page.update(&Event::Key(KeyInput::Tab));
        type_text(&mut page, email);
        page.update(&Event::Key(KeyInput::Tab));
        type_text(&mut page, "quit being so quiet");
        page.update(&Event::Key(KeyInput::Tab));
        page
    }

    #[test]
    fn q_is_text_not_quit() {
        let mut page = ContactPage::new(None);
        let update = page.update(&Event::Key(KeyInput::Char('q')));
        assert_eq!(update, Update::none());
        assert_eq!(page.form().name, "q");
    }

    #[test]
    fn placeholder_quit_hint_works_before_sizing() {
        let mut page = ContactPage::new(None);
        let text = ui::render_text(100, 40, |frame| page.render(frame));
        assert!(text.contains(ui::PLACEHOLDER));
        assert!(ui::PLACEHOLDER.contains("ctrl+c"));
        assert_eq!(page.update(&Event::Key(KeyInput::QUIT)), Update::quit());
    }

    #[test]
    fn invalid_submit_records_error_and_stays() {
        let mut page = filled("ada-at-example");
        let update = page.update(&Event::Key(KeyInput::Enter));
        assert_eq!(update, Update::none());
        assert_eq!(page.phase(), &Phase::Editing);
        assert_eq!(page.form().errors.email, Some("Invalid Email, try again"));
        assert_eq!(page.form().name, "Ada");
    }

    #[test]
    fn valid_submit_sends_message() {
        let mut page = filled("ada@example.com");
        let update = page.update(&Event::Key(KeyInput::Enter));
        assert_eq!(update.next, None);
        assert_eq!(update.effects, vec![Effect::Fetch(Request::SendMessage(ContactMessage {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            message: "quit being so quiet".into(),
        }))]);
        assert_eq!(page.phase(), &Phase::Sending);

        page.update(&Event::Fetched(Response::MessageSent(Ok(()))));
        assert_eq!(page.phase(), &Phase::Sent { name: "Ada".into() });
        assert_eq!(page.form(), &ContactForm::new());

        let text = ui::render_text(100, 40, |frame| page.render(frame));
        assert!(text.contains("Hey Ada, message was delivered"));

        let update = page.update(&Event::Key(KeyInput::Enter));
        assert_eq!(update.next, Some(PageKind::Menu));
        assert_eq!(page.phase(), &Phase::Editing);
    }

    #[test]
    fn failed_send_keeps_form_and_shows_error() {
        let mut page = filled("ada@example.com");
        page.update(&Event::Key(KeyInput::Enter));
        page.update(&Event::Fetched(Response::MessageSent(Err("mailer offline".into()))));
        assert_eq!(page.phase(), &Phase::Editing);
        assert_eq!(page.last_error(), Some("mailer offline"));
        assert_eq!(page.form().email, "ada@example.com");

        let text = ui::render_text(100, 40, |frame| page.render(frame));
        assert!(text.contains("Could not send: mailer offline"));
    }

    #[test]
    fn stray_result_is_ignored() {
        let mut page = ContactPage::new(None);
        page.update(&Event::Fetched(Response::MessageSent(Ok(()))));
        assert_eq!(page.phase(), &Phase::Editing);
    }

    #[test]
    fn escape_goes_back_from_every_phase() {
        let mut page = filled("ada@example.com");
        assert_eq!(page.update(&Event::Key(KeyInput::Esc)).next, Some(PageKind::Menu));
        page.update(&Event::Key(KeyInput::Enter));
        assert_eq!(page.phase(), &Phase::Sending);
        assert_eq!(page.update(&Event::Key(KeyInput::Esc)).next, Some(PageKind::Menu));
    }

    #[test]
    fn enter_advances_focus() {
        let mut page = ContactPage::new(None);
        page.update(&Event::Key(KeyInput::Enter));
        assert_eq!(page.form().focus, Focus::Email);
        page.update(&Event::Key(KeyInput::BackTab));
        assert_eq!(page.form().focus, Focus::Name);
    }
}
