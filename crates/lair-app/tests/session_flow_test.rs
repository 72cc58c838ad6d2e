//! End-to-end tests for a single session.
//!
//! # Oracle Pattern
//!
//! Tests drive a [`Router`] with the events a session host would deliver and
//! end with oracle checks on:
//! - The active page and its reported size
//! - Effects requested from the host
//! - Rendered text

use lair_app::{
    ContactMessage, Effect, Event, KeyInput, Page, PageKind, Request, Response, Router, Screen,
    pages::contact::Phase, ui,
};

const WIDTH: u16 = 100;
const HEIGHT: u16 = 40;

fn press(router: &mut Router, key: KeyInput) -> Vec<Effect> {
    router.dispatch(Event::Key(key))
}

fn type_text(router: &mut Router, text: &str) {
    for c in text.chars() {
        press(router, KeyInput::Char(c));
    }
}

fn screen(router: &Router) -> String {
    ui::render_text(WIDTH, HEIGHT, |frame| router.render(frame))
}

/// Move focus to `field` (0 = name, 1 = email, 2 = message, 3 = send) from
/// the name field.
fn focus_from_name(router: &mut Router, field: usize) {
    for _ in 0..field {
        press(router, KeyInput::Tab);
    }
}

fn contact_phase(router: &Router) -> Option<Phase> {
    router.page(PageKind::Contact).and_then(Screen::as_contact).map(|page| page.phase().clone())
}

#[test]
fn menu_contact_round_trip() {
    let mut router = Router::new("xterm-256color");
    router.start();

    // Unsized: loading placeholder
    assert!(screen(&router).contains(ui::PLACEHOLDER));

    router.dispatch(Event::Resize { width: WIDTH, height: HEIGHT });
    let menu = screen(&router);
    assert!(menu.contains("Learn more about me"));
    assert!(!menu.contains(ui::PLACEHOLDER));

    // Select Contact
    press(&mut router, KeyInput::Down);
    let effects = press(&mut router, KeyInput::Enter);
    assert_eq!(router.active(), Some(PageKind::Contact));
    assert!(effects.contains(&Effect::SetTitle("Contact Me".into())));
    let viewport = router.active_page().map(Page::viewport);
    assert_eq!(viewport.map(|v| v.size()), Some((WIDTH, HEIGHT)));

    // Invalid email stays on the same page with an error recorded
    type_text(&mut router, "Ada Lovelace");
    press(&mut router, KeyInput::Tab);
    type_text(&mut router, "ada.example.com");
    press(&mut router, KeyInput::Tab);
    type_text(&mut router, "Hello from the engine room");
    press(&mut router, KeyInput::Tab);
    let effects = press(&mut router, KeyInput::Enter);
    assert!(effects.is_empty());
    assert_eq!(router.active(), Some(PageKind::Contact));
    let error = router
        .active_page()
        .and_then(Screen::as_contact)
        .and_then(|page| page.form().errors.email);
    assert_eq!(error, Some("Invalid Email, try again"));
    assert!(screen(&router).contains("Invalid Email, try again"));

    // Fix the email and submit
    press(&mut router, KeyInput::BackTab);
    press(&mut router, KeyInput::BackTab);
    for _ in 0.."ada.example.com".len() {
        press(&mut router, KeyInput::Backspace);
    }
    type_text(&mut router, "ada@example.com");
    press(&mut router, KeyInput::Tab);
    press(&mut router, KeyInput::Tab);
    let effects = press(&mut router, KeyInput::Enter);
    assert_eq!(effects, vec![Effect::Fetch(Request::SendMessage(ContactMessage {
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        message: "Hello from the engine room".into(),
    }))]);
    assert_eq!(contact_phase(&router), Some(Phase::Sending));

    router.dispatch(Event::Fetched(Response::MessageSent(Ok(()))));
    assert!(screen(&router).contains("Hey Ada Lovelace, message was delivered"));

    // Back to the menu with the selection preserved
    press(&mut router, KeyInput::Enter);
    assert_eq!(router.active(), Some(PageKind::Menu));
    let selected = router.active_page().and_then(Screen::as_menu).map(|menu| menu.selected());
    assert_eq!(selected, Some(1));
}

#[test]
fn half_filled_form_survives_excursion() {
    let mut router = Router::new("xterm");
    router.start();
    router.dispatch(Event::Resize { width: WIDTH, height: HEIGHT });

    press(&mut router, KeyInput::Char('c'));
    type_text(&mut router, "Grace");
    press(&mut router, KeyInput::Esc);
    assert_eq!(router.active(), Some(PageKind::Menu));

    press(&mut router, KeyInput::Char('c'));
    let name = router
        .active_page()
        .and_then(Screen::as_contact)
        .map(|page| page.form().name.clone());
    assert_eq!(name.as_deref(), Some("Grace"));
}

#[test]
fn send_result_lands_after_navigating_away() {
    let mut router = Router::new("xterm");
    router.start();
    router.dispatch(Event::Resize { width: WIDTH, height: HEIGHT });

    press(&mut router, KeyInput::Char('c'));
    type_text(&mut router, "Ada");
    focus_from_name(&mut router, 1);
    type_text(&mut router, "ada@example.com");
    press(&mut router, KeyInput::Tab);
    type_text(&mut router, "hi");
    press(&mut router, KeyInput::Tab);
    press(&mut router, KeyInput::Enter);
    press(&mut router, KeyInput::Esc);
    assert_eq!(router.active(), Some(PageKind::Menu));

    router.dispatch(Event::Fetched(Response::MessageSent(Ok(()))));
    assert_eq!(router.active(), Some(PageKind::Menu));
    assert_eq!(contact_phase(&router), Some(Phase::Sent { name: "Ada".into() }));
}

#[test]
fn about_resizes_while_away_and_back() {
    let mut router = Router::new("xterm");
    router.start();
    router.dispatch(Event::Resize { width: WIDTH, height: HEIGHT });

    let effects = press(&mut router, KeyInput::Char('a'));
    assert!(effects.contains(&Effect::Fetch(Request::Document { name: "about".into() })));
    router.dispatch(Event::Fetched(Response::Document {
        name: "about".into(),
        result: Ok("# About\n\nHello there.".into()),
    }));
    assert!(screen(&router).contains("Hello there."));

    press(&mut router, KeyInput::Esc);
    router.dispatch(Event::Resize { width: 120, height: 50 });
    let effects = press(&mut router, KeyInput::Char('a'));
    assert_eq!(effects, vec![Effect::SetTitle("About Me".into())]);
    let viewport = router.active_page().map(Page::viewport);
    assert_eq!(viewport.map(|v| v.size()), Some((120, 50)));
}

#[test]
fn quit_from_every_page() {
    for shortcut in [None, Some('a'), Some('c')] {
        let mut router = Router::new("xterm");
        router.start();
        router.dispatch(Event::Resize { width: WIDTH, height: HEIGHT });
        if let Some(c) = shortcut {
            press(&mut router, KeyInput::Char(c));
        }
        assert_eq!(press(&mut router, KeyInput::QUIT), vec![Effect::Quit]);
        assert!(router.is_terminated());
        assert_eq!(press(&mut router, KeyInput::Enter), vec![Effect::Quit]);
    }
}

#[test]
fn escape_on_menu_ends_session_without_replay() {
    let mut router = Router::new("xterm");
    router.start();
    router.dispatch(Event::Resize { width: 1, height: 1 });

    assert_eq!(press(&mut router, KeyInput::Esc), vec![Effect::Quit]);

    // Oracle: no page is left active, the cached size is kept
    assert_eq!(router.active(), None);
    assert!(router.active_page().is_none());
    assert_eq!(router.last_size(), Some((1, 1)));
}
