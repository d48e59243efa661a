//! Key names and chords
//!
//! ydotool speaks Linux input event codes (see
//! /usr/include/linux/input-event-codes.h), so every name is resolved to one
//! of those before anything is sent.

use std::fmt;

use crate::error::{Error, Result};

/// Resolve a key name (case-insensitive) or a raw numeric code
pub fn key_code(name: &str) -> Option<u16> {
    let name = name.to_lowercase();
    let code = match name.as_str() {
        "return" | "enter" => 28,
        "escape" | "esc" => 1,
        "tab" => 15,
        "backspace" => 14,
        "space" => 57,
        "delete" => 111,
        "insert" => 110,
        "home" => 102,
        "end" => 107,
        "pageup" => 104,
        "pagedown" => 109,

        "up" => 103,
        "down" => 108,
        "left" => 105,
        "right" => 106,

        "ctrl" | "control" => 29,
        "alt" => 56,
        "shift" => 42,
        "super" | "meta" | "win" => 125,

        "f1" => 59,
        "f2" => 60,
        "f3" => 61,
        "f4" => 62,
        "f5" => 63,
        "f6" => 64,
        "f7" => 65,
        "f8" => 66,
        "f9" => 67,
        "f10" => 68,
        "f11" => 87,
        "f12" => 88,

        other => return letter_or_digit(other).or_else(|| other.parse().ok()),
    };
    Some(code)
}

fn letter_or_digit(name: &str) -> Option<u16> {
    const LETTERS: [u16; 26] = [
        30, 48, 46, 32, 18, 33, 34, 35, 23, 36, 37, 38, 50, // a..m
        49, 24, 25, 16, 19, 31, 20, 22, 47, 17, 45, 21, 44, // n..z
    ];

    let mut chars = name.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };

    match c {
        'a'..='z' => Some(LETTERS[(c as u8 - b'a') as usize]),
        '0' => Some(11),
        '1'..='9' => Some((c as u8 - b'0') as u16 + 1),
        _ => None,
    }
}

/// A key plus the modifiers held while it is pressed, e.g. `ctrl+shift+t`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: Vec<String>,
    pub key: String,
}

impl KeyChord {
    /// Parse `+`-separated names. The last part is the key, the rest are
    /// modifiers. Every part must resolve to a key code.
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split('+').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(Error::InvalidStep(format!("malformed key chord {:?}", spec)));
        }
        if let Some(unknown) = parts.iter().find(|p| key_code(p).is_none()) {
            return Err(Error::InvalidStep(format!("unknown key {:?}", unknown)));
        }

        let Some((key, modifiers)) = parts.split_last() else {
            return Err(Error::InvalidStep("empty key chord".to_string()));
        };
        Ok(Self {
            modifiers: modifiers.iter().map(|m| m.to_lowercase()).collect(),
            key: key.to_lowercase(),
        })
    }

    pub fn ctrl(key: &str) -> Self {
        Self {
            modifiers: vec!["ctrl".to_string()],
            key: key.to_string(),
        }
    }

    /// ydotool `key` arguments: modifiers down, key down, 50ms, key up,
    /// modifiers up in reverse order
    pub fn ydotool_args(&self) -> Result<Vec<String>> {
        let code = |name: &str| {
            key_code(name).ok_or_else(|| Error::InvalidStep(format!("unknown key {:?}", name)))
        };

        let mut args = vec!["key".to_string()];
        for m in &self.modifiers {
            args.push(format!("{}:1", code(m)?));
        }
        let key = code(&self.key)?;
        args.push(format!("{}:1", key));
        // ydotool treats a bare number that is not code:state as a delay
        args.push("50".to_string());
        args.push(format!("{}:0", key));
        for m in self.modifiers.iter().rev() {
            args.push(format!("{}:0", code(m)?));
        }
        Ok(args)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{}+", m)?;
        }
        write!(f, "{}", self.key)
    }
}
