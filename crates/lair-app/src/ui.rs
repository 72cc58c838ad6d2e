//! Shared rendering helpers
//!
//! Layout and framing used by every page. All functions are pure: they draw
//! into a [`Frame`] and never touch the terminal.

use ratatui::{
    Frame, Terminal,
    backend::TestBackend,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Text shown by a page before it has been sized.
pub const PLACEHOLDER: &str = "Loading App...press ctrl+c to quit";

/// Rect of at most `width` x `height`, centered in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}

/// Render the loading placeholder.
pub fn placeholder(frame: &mut Frame) {
    let paragraph = Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, frame.area());
}

/// Render a bordered error frame with `title` and `message`.
pub fn error_frame(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    const BORDER_SIZE: u16 = 2;

    let width = area.width.min(60);
    let lines = vec![
        Line::from(Span::styled(
            "Something went wrong",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(message.to_string()),
    ];
    let inner_width = usize::from(width.saturating_sub(BORDER_SIZE)).max(1);
    let wrapped = message.chars().count().div_ceil(inner_width);
    let height = (2 + wrapped as u16).saturating_add(BORDER_SIZE);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(format!(" {title} "));
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, centered(area, width, height));
}

/// Render a one-line help bar of `(key, action)` pairs.
pub fn help_line(frame: &mut Frame, area: Rect, bindings: &[(&str, &str)]) {
    let mut spans = Vec::with_capacity(bindings.len() * 3);
    for (i, (key, action)) in bindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" • ", Style::default().fg(Color::Blue)));
        }
        spans.push(Span::styled(*key, Style::default().add_modifier(Modifier::ITALIC)));
        spans.push(Span::styled(format!(" {action}"), Style::default().fg(Color::DarkGray)));
    }
    let paragraph = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Draw into an off-screen buffer and return its text.
///
/// Rows are joined with `\n` and trailing spaces are trimmed. Styling is
/// discarded.
pub fn render_text(width: u16, height: u16, draw: impl FnOnce(&mut Frame)) -> String {
    let Ok(mut terminal) = Terminal::new(TestBackend::new(width, height));
    let Ok(_) = terminal.draw(draw);
    buffer_text(terminal.backend().buffer())
}

/// Plain text of a rendered buffer, one line per row.
pub fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let area = buffer.area;
    let mut rows = Vec::with_capacity(usize::from(area.height));
    for y in area.top()..area.bottom() {
        let mut row = String::with_capacity(usize::from(area.width));
        for x in area.left()..area.right() {
            row.push_str(buffer[(x, y)].symbol());
        }
        rows.push(row.trim_end().to_string());
    }
    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered(area, 20, 10);
        assert_eq!(rect, Rect::new(40, 15, 20, 10));

        let clipped = centered(Rect::new(0, 0, 10, 5), 20, 10);
        assert_eq!(clipped, Rect::new(0, 0, 10, 5));
    }

    #[test]
    fn render_text_trims_rows() {
        let text = render_text(20, 2, |frame| {
            frame.render_widget(Paragraph::new("hello"), frame.area());
        });
        assert_eq!(text, "hello\n");
    }

    #[test]
    fn error_frame_shows_message() {
        let text = render_text(80, 20, |frame| {
            error_frame(frame, frame.area(), "About", "document not found");
        });
        assert!(text.contains("Something went wrong"));
        assert!(text.contains("document not found"));
    }
}
