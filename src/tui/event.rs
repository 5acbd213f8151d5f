use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use log::{debug, warn};

use crate::core::config::BindingAction;
use crate::tui::keymap::Keymap;

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    /// A configured key binding fired.
    Binding(BindingAction),

    // Text editing
    InputChar(char),
    Paste(String), // Bracketed paste - preserves newlines
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    CursorHome,
    CursorEnd,
    WordLeft,
    WordRight,

    // Transcript scrolling
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollToBottom, // Ctrl+End - also re-enables stick-to-bottom

    MouseMove(u16, u16),
    MouseClick(u16, u16),
    Resize,
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate(keymap: &Keymap) -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO, keymap)
}

/// Poll for an event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: Duration, keymap: &Keymap) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            warn!("Event poll failed: {}", e);
            return None;
        }
    }
    match event::read() {
        Ok(raw) => translate(raw, keymap),
        Err(e) => {
            warn!("Event read failed: {}", e);
            None
        }
    }
}

/// Maps a terminal event to a [`TuiEvent`]. Configured bindings win over the
/// built-in editing keys.
pub fn translate(raw: Event, keymap: &Keymap) -> Option<TuiEvent> {
    match raw {
        Event::Key(key_event) => {
            // Keyboard enhancement reports releases too
            if key_event.kind == KeyEventKind::Release {
                return None;
            }
            debug!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
            if let Some(action) = keymap.lookup(&key_event) {
                return Some(TuiEvent::Binding(action));
            }
            let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
            let alt = key_event.modifiers.contains(KeyModifiers::ALT);
            match key_event.code {
                // Ctrl+J inserts newline (ASCII LF; Ctrl+Enter sends this in most terminals)
                KeyCode::Char('j') if ctrl => Some(TuiEvent::InputChar('\n')),
                KeyCode::Char(_) if ctrl || alt => None,
                KeyCode::Char(c) => Some(TuiEvent::InputChar(c)),
                KeyCode::Backspace => Some(TuiEvent::Backspace),
                KeyCode::Delete => Some(TuiEvent::Delete),
                KeyCode::Left if ctrl || alt => Some(TuiEvent::WordLeft),
                KeyCode::Right if ctrl || alt => Some(TuiEvent::WordRight),
                KeyCode::Left => Some(TuiEvent::CursorLeft),
                KeyCode::Right => Some(TuiEvent::CursorRight),
                KeyCode::Up => Some(TuiEvent::CursorUp),
                KeyCode::Down => Some(TuiEvent::CursorDown),
                KeyCode::Home => Some(TuiEvent::CursorHome),
                KeyCode::End if ctrl => Some(TuiEvent::ScrollToBottom),
                KeyCode::End => Some(TuiEvent::CursorEnd),
                KeyCode::PageUp => Some(TuiEvent::ScrollPageUp),
                KeyCode::PageDown => Some(TuiEvent::ScrollPageDown),
                _ => None,
            }
        }
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::Moved => Some(TuiEvent::MouseMove(mouse_event.column, mouse_event.row)),
            MouseEventKind::Down(MouseButton::Left) => {
                Some(TuiEvent::MouseClick(mouse_event.column, mouse_event.row))
            }
            MouseEventKind::ScrollUp => Some(TuiEvent::ScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::ScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::default_keybindings;
    use crossterm::event::{KeyEvent, KeyEventState, MouseEvent};

    fn keymap() -> Keymap {
        Keymap::from_bindings(&default_keybindings()).unwrap()
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn bindings_take_priority() {
        let keymap = keymap();
        assert_eq!(
            translate(press(KeyCode::Enter, KeyModifiers::NONE), &keymap),
            Some(TuiEvent::Binding(BindingAction::Submit))
        );
        assert_eq!(
            translate(press(KeyCode::Esc, KeyModifiers::NONE), &keymap),
            Some(TuiEvent::Binding(BindingAction::Cancel))
        );
    }

    #[test]
    fn plain_characters_are_input() {
        let keymap = keymap();
        assert_eq!(
            translate(press(KeyCode::Char('x'), KeyModifiers::NONE), &keymap),
            Some(TuiEvent::InputChar('x'))
        );
        assert_eq!(
            translate(press(KeyCode::Char('X'), KeyModifiers::SHIFT), &keymap),
            Some(TuiEvent::InputChar('X'))
        );
        // Unbound control chords are swallowed rather than typed
        assert_eq!(translate(press(KeyCode::Char('k'), KeyModifiers::CONTROL), &keymap), None);
    }

    #[test]
    fn key_releases_are_ignored() {
        let release = Event::Key(KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(translate(release, &keymap()), None);
    }

    #[test]
    fn mouse_clicks_and_wheel() {
        let keymap = keymap();
        let mouse = |kind| {
            Event::Mouse(MouseEvent {
                kind,
                column: 4,
                row: 7,
                modifiers: KeyModifiers::NONE,
            })
        };
        assert_eq!(
            translate(mouse(MouseEventKind::Down(MouseButton::Left)), &keymap),
            Some(TuiEvent::MouseClick(4, 7))
        );
        assert_eq!(translate(mouse(MouseEventKind::ScrollDown), &keymap), Some(TuiEvent::ScrollDown));
        assert_eq!(translate(mouse(MouseEventKind::Down(MouseButton::Right)), &keymap), None);
    }
}
