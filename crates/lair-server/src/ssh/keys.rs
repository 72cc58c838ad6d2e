//! Raw channel bytes to key tokens.
//!
//! SSH clients send what the remote terminal would have read: printable
//! UTF-8, control bytes and ANSI escape sequences. [`KeyDecoder`] is
//! stateful so sequences split across packets decode the same as whole ones.

use lair_app::KeyInput;

const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;

/// Longest escape sequence accepted before the bytes are discarded.
const MAX_SEQUENCE: usize = 16;

/// Result of decoding at one position.
enum Decoded {
    /// Bytes consumed, and the key they produced (if any).
    Key(Option<KeyInput>, usize),
    /// More bytes are needed.
    Incomplete,
}

/// Incremental decoder for one channel.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Vec<u8>,
    /// Last key was a carriage return, so a following `\n` is swallowed.
    after_cr: bool,
}

impl KeyDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one packet.
    ///
    /// Incomplete trailing sequences are kept for the next call, except a
    /// lone ESC, which is reported as [`KeyInput::Esc`].
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyInput> {
        self.pending.extend_from_slice(bytes);

        let mut keys = Vec::new();
        let mut pos = 0;
        while pos < self.pending.len() {
            let byte = self.pending[pos];
            let swallow = byte == b'\n' && self.after_cr;
            self.after_cr = byte == b'\r';
            if swallow {
                pos += 1;
                continue;
            }

            match decode(&self.pending[pos..]) {
                Decoded::Key(key, len) => {
                    keys.extend(key);
                    pos += len;
                },
                Decoded::Incomplete => break,
            }
        }
        self.pending.drain(..pos);

        if self.pending == [ESC] {
            self.pending.clear();
            keys.push(KeyInput::Esc);
        }
        keys
    }

    /// Whether bytes are buffered awaiting the rest of a sequence.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn decode(bytes: &[u8]) -> Decoded {
    let first = bytes[0];
    match first {
        ESC => decode_escape(bytes),
        b'\r' | b'\n' => Decoded::Key(Some(KeyInput::Enter), 1),
        b'\t' => Decoded::Key(Some(KeyInput::Tab), 1),
        DEL | 0x08 => Decoded::Key(Some(KeyInput::Backspace), 1),
        0x01..=0x1a => Decoded::Key(Some(KeyInput::Ctrl(char::from(b'a' + first - 1))), 1),
        0x00 | 0x1c..=0x1f => Decoded::Key(None, 1),
        0x20..=0x7e => Decoded::Key(Some(KeyInput::Char(char::from(first))), 1),
        _ => decode_utf8(bytes),
    }
}

fn decode_escape(bytes: &[u8]) -> Decoded {
    let Some(&intro) = bytes.get(1) else {
        return Decoded::Incomplete;
    };
    if intro != b'[' && intro != b'O' {
        // Alt chords are not used; report the ESC and decode the rest normally
        return Decoded::Key(Some(KeyInput::Esc), 1);
    }

    for (offset, &byte) in bytes.iter().enumerate().skip(2) {
        if offset >= MAX_SEQUENCE {
            return Decoded::Key(None, offset);
        }
        if (0x40..=0x7e).contains(&byte) {
            let params = &bytes[2..offset];
            return Decoded::Key(escape_key(byte, params), offset + 1);
        }
    }
    if bytes.len() >= MAX_SEQUENCE {
        return Decoded::Key(None, bytes.len());
    }
    Decoded::Incomplete
}

fn escape_key(final_byte: u8, params: &[u8]) -> Option<KeyInput> {
    match final_byte {
        b'A' => Some(KeyInput::Up),
        b'B' => Some(KeyInput::Down),
        b'C' => Some(KeyInput::Right),
        b'D' => Some(KeyInput::Left),
        b'H' => Some(KeyInput::Home),
        b'F' => Some(KeyInput::End),
        b'Z' => Some(KeyInput::BackTab),
        b'~' => {
            let code = params.split(|&b| b == b';').next()?;
            match code {
                b"1" | b"7" => Some(KeyInput::Home),
                b"4" | b"8" => Some(KeyInput::End),
                b"3" => Some(KeyInput::Delete),
                b"5" => Some(KeyInput::PageUp),
                b"6" => Some(KeyInput::PageDown),
                _ => None,
            }
        },
        _ => None,
    }
}

fn decode_utf8(bytes: &[u8]) -> Decoded {
    let width = match bytes[0] {
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        // Stray continuation or invalid lead byte
        _ => return Decoded::Key(None, 1),
    };
    if bytes.len() < width {
        return Decoded::Incomplete;
    }
    match std::str::from_utf8(&bytes[..width]) {
        Ok(s) => Decoded::Key(s.chars().next().map(KeyInput::Char), width),
        Err(_) => Decoded::Key(None, 1),
    }
}
