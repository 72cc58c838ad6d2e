//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples page logic from terminal libraries (crossterm for the local
/// terminal, raw SSH channel bytes for remote sessions) so every page can be
/// driven deterministically in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Control chord, lowercase letter (`Ctrl('c')` is the quit token).
    Ctrl(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key.
    Delete,
    /// Tab key (next field).
    Tab,
    /// Shift+Tab (previous field).
    BackTab,
    /// Escape key (back, or quit from the menu).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page Up key.
    PageUp,
    /// Page Down key.
    PageDown,
}

impl KeyInput {
    /// The quit token. Terminates the session from every page.
    pub const QUIT: Self = Self::Ctrl('c');

    /// The suspend token.
    pub const SUSPEND: Self = Self::Ctrl('z');

    /// Whether this key is the quit token.
    pub fn is_quit(self) -> bool {
        self == Self::QUIT
    }
}
