//! Key binding table: trigger strings from the config (`"ctrl+r"`, `"esc"`,
//! `"f2"`) turned into crossterm key matches.

use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::config::{BindingAction, ConfigError, KeyBinding};

/// A key plus the modifiers that must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyTrigger {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyTrigger {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Folds the spellings terminals use for the same key press into one.
    fn normalized(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let mut modifiers = modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT);
        let code = match code {
            KeyCode::BackTab => {
                modifiers |= KeyModifiers::SHIFT;
                KeyCode::Tab
            }
            KeyCode::Char(c) if c.is_ascii_uppercase() => {
                modifiers |= KeyModifiers::SHIFT;
                KeyCode::Char(c.to_ascii_lowercase())
            }
            other => other,
        };
        Self { code, modifiers }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        Self::normalized(event.code, event.modifiers) == *self
    }
}

impl FromStr for KeyTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err("empty key".to_string());
        }
        // "ctrl++" style: a literal plus as the key
        let (mods, key) = match normalized.strip_suffix("++") {
            Some(prefix) => (prefix, "+"),
            None => normalized.rsplit_once('+').unwrap_or(("", normalized.as_str())),
        };

        let mut modifiers = KeyModifiers::NONE;
        for part in mods.split('+').filter(|p| !p.is_empty()) {
            modifiers |= match part {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" | "meta" | "option" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                other => return Err(format!("unknown modifier `{other}` in `{s}`")),
            };
        }

        let code = match key {
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "space" => KeyCode::Char(' '),
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            f if f.len() > 1 && f.starts_with('f') => match f[1..].parse::<u8>() {
                Ok(n @ 1..=12) => KeyCode::F(n),
                _ => return Err(format!("unknown key `{key}` in `{s}`")),
            },
            single => {
                let mut chars = single.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return Err(format!("unknown key `{key}` in `{s}`")),
                }
            }
        };

        Ok(Self::normalized(code, modifiers))
    }
}

impl fmt::Display for KeyTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "Alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            write!(f, "Shift+")?;
        }
        match self.code {
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Esc => write!(f, "Esc"),
            KeyCode::Tab => write!(f, "Tab"),
            KeyCode::Backspace => write!(f, "Backspace"),
            KeyCode::Delete => write!(f, "Del"),
            KeyCode::Char(' ') => write!(f, "Space"),
            KeyCode::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            KeyCode::F(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// One row of the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterHint {
    pub key: String,
    pub description: String,
}

/// Resolved trigger → action table.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    entries: Vec<(KeyTrigger, BindingAction)>,
    hints: Vec<FooterHint>,
}

impl Keymap {
    /// Builds the table, rejecting unparsable triggers and triggers bound to
    /// two different actions.
    pub fn from_bindings(bindings: &[KeyBinding]) -> Result<Self, ConfigError> {
        let mut keymap = Keymap::default();
        for binding in bindings {
            let trigger: KeyTrigger = binding.key.parse().map_err(ConfigError::KeyBinding)?;
            if let Some((_, existing)) = keymap.entries.iter().find(|(t, _)| *t == trigger) {
                if *existing != binding.action {
                    return Err(ConfigError::KeyBinding(format!(
                        "`{}` is bound to both `{}` and `{}`",
                        binding.key,
                        existing.name(),
                        binding.action.name()
                    )));
                }
                continue;
            }
            keymap.entries.push((trigger, binding.action));
            if binding.show {
                keymap.hints.push(FooterHint {
                    key: trigger.to_string(),
                    description: binding.description.clone(),
                });
            }
        }
        Ok(keymap)
    }

    pub fn lookup(&self, event: &KeyEvent) -> Option<BindingAction> {
        self.entries
            .iter()
            .find(|(trigger, _)| trigger.matches(event))
            .map(|(_, action)| *action)
    }

    /// Visible bindings in config order.
    pub fn hints(&self) -> &[FooterHint] {
        &self.hints
    }
}
