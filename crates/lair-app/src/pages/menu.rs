//! Landing menu
//!
//! Lists the site's sections and shows the current weather, fetched in the
//! background the first time the menu is shown.

use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};

use crate::{Effect, Event, KeyInput, Page, PageKind, Request, Response, Timer, Update, Viewport, ui};

/// Window title while the menu is active.
pub const TITLE: &str = "Dragon's Lair";

/// Repository link shown by the Source item.
pub const SOURCE_URL: &str = env!("CARGO_PKG_REPOSITORY");

const LIST_TITLE_HEIGHT: u16 = 2;
const LIST_HEIGHT: u16 = 6;
const SPINNER_INTERVAL: Duration = Duration::from_millis(100);
const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const LOGO: [&str; 5] = [
    r" ___                        _        _        _       ",
    r"|   \ _ _ __ _ __ _ ___ _ _( )___   | |   __ _(_)_ _  ",
    r"| |) | '_/ _` / _` / _ \ ' \|/(_-<  | |__/ _` | | '_| ",
    r"|___/|_| \__,_\__, \___/_||_| /__/  |____\__,_|_|_|   ",
    r"              |___/                                   ",
];

/// Entries of the menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    /// Opens the About page.
    About,
    /// Opens the Contact page.
    Contact,
    /// Shows the repository link.
    Source,
}

impl MenuItem {
    /// Every item, in display order.
    pub const ALL: [Self; 3] = [Self::About, Self::Contact, Self::Source];

    /// Display title.
    pub fn title(self) -> &'static str {
        match self {
            Self::About => "About",
            Self::Contact => "Contact Me",
            Self::Source => "Source",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            Self::About => "Find out more about my skills and experience",
            Self::Contact => "Send me an email",
            Self::Source => "Explore the code behind this site",
        }
    }
}

/// Weather lookup progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherState {
    /// Never requested.
    Idle,
    /// Request in flight.
    Loading,
    /// Last lookup succeeded.
    Ready(String),
    /// Last lookup failed.
    Failed(String),
}

/// The landing menu.
#[derive(Debug, Clone)]
pub struct MenuPage {
    viewport: Viewport,
    selected: usize,
    weather: WeatherState,
    spinner: usize,
    // A spinner tick is scheduled and not yet delivered
    ticking: bool,
    status: Option<String>,
}

impl MenuPage {
    /// Menu with the first item selected.
    pub fn new(size: Option<(u16, u16)>) -> Self {
        Self {
            viewport: Viewport::new(size),
            selected: 0,
            weather: WeatherState::Idle,
            spinner: 0,
            ticking: false,
            status: None,
        }
    }

    /// Index of the selected item.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Selected item.
    pub fn selected_item(&self) -> MenuItem {
        MenuItem::ALL[self.selected]
    }

    /// Weather lookup progress.
    pub fn weather(&self) -> &WeatherState {
        &self.weather
    }

    /// Transient status line, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn handle_key(&mut self, key: KeyInput) -> Update {
        match key {
            KeyInput::QUIT | KeyInput::Char('q') | KeyInput::Esc => Update::quit(),
            KeyInput::SUSPEND => Update::suspend(),
            KeyInput::Up | KeyInput::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Update::none()
            },
            KeyInput::Down | KeyInput::Char('j') => {
                self.selected = (self.selected + 1).min(MenuItem::ALL.len() - 1);
                Update::none()
            },
            KeyInput::Enter => self.activate(self.selected_item()),
            KeyInput::Char('a') => self.select(MenuItem::About),
            KeyInput::Char('c') => self.select(MenuItem::Contact),
            KeyInput::Char('g') => self.select(MenuItem::Source),
            _ => Update::none(),
        }
    }

    fn select(&mut self, item: MenuItem) -> Update {
        if let Some(index) = MenuItem::ALL.iter().position(|i| *i == item) {
            self.selected = index;
        }
        self.activate(item)
    }

    fn activate(&mut self, item: MenuItem) -> Update {
        self.status = None;
        match item {
            MenuItem::About => Update::navigate(PageKind::About),
            MenuItem::Contact => Update::navigate(PageKind::Contact),
            MenuItem::Source => {
                self.status = Some(if SOURCE_URL.is_empty() {
                    "Source link not configured".to_string()
                } else {
                    format!("Source: {SOURCE_URL}")
                });
                Update::none()
            },
        }
    }

    fn weather_line(&self) -> Line<'static> {
        match &self.weather {
            WeatherState::Idle => Line::raw(""),
            WeatherState::Loading => Line::from(vec![
                Span::styled(SPINNER_FRAMES[self.spinner], Style::default().fg(Color::Yellow)),
                Span::raw(" checking the weather"),
            ]),
            WeatherState::Ready(summary) => {
                Line::styled(summary.clone(), Style::default().fg(Color::Cyan))
            },
            WeatherState::Failed(message) => Line::styled(
                format!("Weather unavailable: {message}"),
                Style::default().fg(Color::Red),
            ),
        }
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = MenuItem::ALL
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let (marker, style) = if i == self.selected {
                    ("> ", Style::default().fg(Color::White).bg(Color::Magenta).add_modifier(Modifier::BOLD))
                } else {
                    ("  ", Style::default())
                };
                ListItem::new(vec![
                    Line::from(Span::styled(format!("{marker}{}", item.title()), style)),
                    Line::styled(
                        format!("  {}", item.description()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect();
        frame.render_widget(List::new(items), area);
    }
}

impl Page for MenuPage {
    fn kind(&self) -> PageKind {
        PageKind::Menu
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn init(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::SetTitle(TITLE.to_string())];
        if matches!(self.weather, WeatherState::Idle | WeatherState::Failed(_)) {
            self.weather = WeatherState::Loading;
            self.spinner = 0;
            effects.push(Effect::Fetch(Request::Weather));
            if !self.ticking {
                self.ticking = true;
                effects.push(Effect::Schedule { timer: Timer::Spinner, after: SPINNER_INTERVAL });
            }
        }
        effects
    }

    fn update(&mut self, event: &Event) -> Update {
        match event {
            Event::Resize { width, height } => {
                self.viewport.resize(*width, *height);
                Update::none()
            },
            Event::Key(key) => self.handle_key(*key),
            Event::Tick(Timer::Spinner) => {
                self.ticking = self.weather == WeatherState::Loading;
                if !self.ticking {
                    return Update::none();
                }
                self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
                Update::stay(vec![Effect::Schedule { timer: Timer::Spinner, after: SPINNER_INTERVAL }])
            },
            Event::Fetched(Response::Weather(result)) => {
                self.weather = match result {
                    Ok(summary) => WeatherState::Ready(summary.trim().to_string()),
                    Err(message) => WeatherState::Failed(message.clone()),
                };
                Update::none()
            },
            Event::Fetched(_) => Update::none(),
        }
    }

    fn render(&self, frame: &mut Frame) {
        if !self.viewport.is_ready() {
            ui::placeholder(frame);
            return;
        }

        let logo_height = LOGO.len() as u16;
        let content_height = logo_height + LIST_TITLE_HEIGHT + LIST_HEIGHT + 4;
        let area = ui::centered(frame.area(), 60, content_height);

        let [logo_area, title_area, list_area, weather_area, status_area, _, help_area] =
            Layout::vertical([
                Constraint::Length(logo_height),
                Constraint::Length(LIST_TITLE_HEIGHT),
                Constraint::Length(LIST_HEIGHT),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

        let logo: Vec<Line> = LOGO
            .iter()
            .map(|row| Line::styled(*row, Style::default().fg(Color::Magenta)))
            .collect();
        frame.render_widget(Paragraph::new(logo), logo_area);
        frame.render_widget(
            Paragraph::new(Line::styled(
                "Learn more about me",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            title_area,
        );
        self.render_list(frame, list_area);
        frame.render_widget(Paragraph::new(self.weather_line()), weather_area);
        if let Some(status) = &self.status {
            frame.render_widget(
                Paragraph::new(Line::styled(status.clone(), Style::default().fg(Color::Green))),
                status_area,
            );
        }
        ui::help_line(frame, help_area, &[
            ("↑/k", "move up"),
            ("enter", "select"),
            ("↓/j", "move down"),
            ("esc", "exit"),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized_menu() -> MenuPage {
        let mut menu = MenuPage::new(None);
        menu.update(&Event::Resize { width: 100, height: 40 });
        menu
    }

    #[test]
    fn init_starts_weather_lookup_once() {
        let mut menu = MenuPage::new(None);
        let effects = menu.init();
        assert_eq!(effects[0], Effect::SetTitle(TITLE.into()));
        assert!(effects.contains(&Effect::Fetch(Request::Weather)));
        assert_eq!(menu.weather(), &WeatherState::Loading);

        let again = menu.init();
        assert_eq!(again, vec![Effect::SetTitle(TITLE.into())]);
    }

    #[test]
    fn failed_lookup_is_retried_on_next_init() {
        let mut menu = MenuPage::new(None);
        menu.init();
        menu.update(&Event::Fetched(Response::Weather(Err("timeout".into()))));
        assert_eq!(menu.weather(), &WeatherState::Failed("timeout".into()));
        assert!(menu.init().contains(&Effect::Fetch(Request::Weather)));
    }

    #[test]
    fn spinner_stops_after_result() {
        let mut menu = MenuPage::new(None);
        menu.init();
        let tick = menu.update(&Event::Tick(Timer::Spinner));
        assert_eq!(tick.effects.len(), 1);

        menu.update(&Event::Fetched(Response::Weather(Ok("Pretoria: +21°C".into()))));
        assert_eq!(menu.update(&Event::Tick(Timer::Spinner)), Update::none());
    }

    #[test]
    fn retry_reuses_the_outstanding_tick() {
        let mut menu = MenuPage::new(None);
        menu.init();
        menu.update(&Event::Fetched(Response::Weather(Err("timeout".into()))));

        // The first tick is still in flight when the menu is entered again
        let retry = menu.init();
        assert!(retry.contains(&Effect::Fetch(Request::Weather)));
        assert!(!retry.iter().any(|effect| matches!(effect, Effect::Schedule { .. })));

        let tick = menu.update(&Event::Tick(Timer::Spinner));
        assert_eq!(tick.effects, vec![Effect::Schedule { timer: Timer::Spinner, after: SPINNER_INTERVAL }]);
    }

    #[test]
    fn spinner_restarts_after_chain_ended() {
        let mut menu = MenuPage::new(None);
        menu.init();
        menu.update(&Event::Fetched(Response::Weather(Err("timeout".into()))));
        assert_eq!(menu.update(&Event::Tick(Timer::Spinner)), Update::none());

        let retry = menu.init();
        assert!(retry.contains(&Effect::Schedule { timer: Timer::Spinner, after: SPINNER_INTERVAL }));
    }

    #[test]
    fn selection_is_clamped() {
        let mut menu = sized_menu();
        menu.update(&Event::Key(KeyInput::Up));
        assert_eq!(menu.selected(), 0);
        for _ in 0..5 {
            menu.update(&Event::Key(KeyInput::Char('j')));
        }
        assert_eq!(menu.selected(), MenuItem::ALL.len() - 1);
    }

    #[test]
    fn enter_navigates_to_selected_page() {
        let mut menu = sized_menu();
        assert_eq!(menu.update(&Event::Key(KeyInput::Enter)).next, Some(PageKind::About));
        menu.update(&Event::Key(KeyInput::Down));
        assert_eq!(menu.update(&Event::Key(KeyInput::Enter)).next, Some(PageKind::Contact));
    }

    #[test]
    fn shortcuts_select_and_navigate() {
        let mut menu = sized_menu();
        let update = menu.update(&Event::Key(KeyInput::Char('c')));
        assert_eq!(update.next, Some(PageKind::Contact));
        assert_eq!(menu.selected_item(), MenuItem::Contact);

        let update = menu.update(&Event::Key(KeyInput::Char('g')));
        assert_eq!(update.next, None);
        assert!(menu.status().is_some());
    }

    #[test]
    fn quit_keys_do_not_mutate() {
        for key in [KeyInput::QUIT, KeyInput::Char('q'), KeyInput::Esc] {
            let mut menu = sized_menu();
            menu.update(&Event::Key(KeyInput::Down));
            let update = menu.update(&Event::Key(key));
            assert_eq!(update.effects, vec![Effect::Quit]);
            assert_eq!(menu.selected(), 1);
        }
    }

    #[test]
    fn renders_placeholder_until_sized() {
        let menu = MenuPage::new(Some((100, 40)));
        let text = ui::render_text(100, 40, |frame| menu.render(frame));
        assert!(text.contains(ui::PLACEHOLDER));

        let menu = sized_menu();
        let text = ui::render_text(100, 40, |frame| menu.render(frame));
        assert!(text.contains("Learn more about me"));
        assert!(text.contains("Contact Me"));
    }

    #[test]
    fn failed_weather_is_visible() {
        let mut menu = sized_menu();
        menu.update(&Event::Fetched(Response::Weather(Err("no route to host".into()))));
        let text = ui::render_text(100, 40, |frame| menu.render(frame));
        assert!(text.contains("Weather unavailable: no route to host"));
    }
}
