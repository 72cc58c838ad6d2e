//! Contact form state and validation.

use crate::{ContactMessage, KeyInput};

/// Maximum characters accepted in the message field.
pub const MESSAGE_LIMIT: usize = 300;

/// Focusable elements of the contact form, in tab order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    /// Full name field.
    #[default]
    Name,
    /// Email field.
    Email,
    /// Message field.
    Message,
    /// Send button.
    Send,
}

impl Focus {
    /// Next element, wrapping to the first.
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Email,
            Self::Email => Self::Message,
            Self::Message => Self::Send,
            Self::Send => Self::Name,
        }
    }

    /// Previous element, wrapping to the last.
    pub fn prev(self) -> Self {
        match self {
            Self::Name => Self::Send,
            Self::Email => Self::Name,
            Self::Message => Self::Email,
            Self::Send => Self::Message,
        }
    }
}

/// Validation errors recorded on the last submit, one slot per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    /// Name field error.
    pub name: Option<&'static str>,
    /// Email field error.
    pub email: Option<&'static str>,
    /// Message field error.
    pub message: Option<&'static str>,
}

impl FormErrors {
    /// Whether no field has an error.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.message.is_none()
    }
}

/// Field values, focus and validation state of the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    /// Sender's full name.
    pub name: String,
    /// Sender's email.
    pub email: String,
    /// Message body.
    pub message: String,
    /// Focused element.
    pub focus: Focus,
    /// Errors from the last validation.
    pub errors: FormErrors,
}

impl ContactForm {
    /// Empty form focused on the name field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an editing key to the focused field.
    ///
    /// Returns `false` if the key is not an editing key for the current focus.
    pub fn edit(&mut self, key: KeyInput) -> bool {
        let focus = self.focus;
        let field = match focus {
            Focus::Name => &mut self.name,
            Focus::Email => &mut self.email,
            Focus::Message => &mut self.message,
            Focus::Send => return false,
        };
        match key {
            KeyInput::Char(c) => {
                if focus == Focus::Message && field.chars().count() >= MESSAGE_LIMIT {
                    return true;
                }
                field.push(c);
                true
            },
            KeyInput::Backspace => {
                field.pop();
                true
            },
            _ => false,
        }
    }

    /// Validate every field, recording the errors.
    ///
    /// Returns `true` if the form can be sent.
    pub fn validate(&mut self) -> bool {
        self.errors = FormErrors {
            name: self.name.trim().is_empty().then_some("Name required, try again"),
            email: if self.email.trim().is_empty() {
                Some("Email Required, try again")
            } else if !is_valid_email(self.email.trim()) {
                Some("Invalid Email, try again")
            } else {
                None
            },
            message: self.message.trim().is_empty().then_some("Message required, try again"),
        };
        self.errors.is_empty()
    }

    /// Message built from the current field values.
    pub fn message(&self) -> ContactMessage {
        ContactMessage {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }

    /// Clear fields and errors and focus the first field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Check `local@domain.tld` syntax.
///
/// Local part is `[A-Za-z0-9._%+-]+`, domain is `[A-Za-z0-9.-]+` and must end
/// in a dot followed by at least two ASCII letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local.chars().all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let domain_ok = !domain.is_empty()
        && domain.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    local_ok
        && domain_ok
        && !host.is_empty()
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}
