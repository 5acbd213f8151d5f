//! # InputBox Component
//!
//! The prompt editor at the bottom of the screen.
//!
//! ## Responsibilities
//!
//! - Capture text input and paste
//! - Handle editing (backspace, delete, cursor and word movement)
//! - Emit a submission when the submit binding fires
//! - Grow with its content, up to a collapsed or expanded line limit
//!
//! ## State Management
//!
//! The buffer and the expanded flag are internal state; whether the box has
//! focus is a prop set by the parent. Cursor position and scroll state are
//! encapsulated in `CursorState`.

mod cursor;
mod text_wrap;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::core::config::BindingAction;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use cursor::CursorState;
use text_wrap::{
    COLLAPSED_LINES, EXPANDED_LINES, VERTICAL_OVERHEAD, inner_width, next_char_boundary,
    next_word_boundary, prev_char_boundary, prev_word_boundary, wrap_line_count, wrapped_lines,
};

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the text
    Submit(String),
    /// Text, cursor or size changed
    ContentChanged,
}

/// Text input component.
///
/// # Props
///
/// - `focused`: whether keystrokes go here (draws the cursor, bright border)
///
/// # State
///
/// - `buffer`: Current text being typed
/// - `expanded`: taller editor, toggled by the `toggle_input` binding
/// - `cursor`: Cursor position, scroll offset, and cached width
pub struct InputBox {
    pub buffer: String,
    pub focused: bool,
    expanded: bool,
    cursor: CursorState,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            focused: true,
            expanded: false,
            cursor: CursorState::new(),
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    fn visible_lines(&self) -> u16 {
        if self.expanded { EXPANDED_LINES } else { COLLAPSED_LINES }
    }

    /// Height needed for the current buffer, clamped to the visible line limit.
    /// Expanded mode always takes its full height.
    pub fn calculate_height(&self, content_width: u16) -> u16 {
        let content_lines = if self.expanded {
            EXPANDED_LINES
        } else {
            wrap_line_count(&self.buffer, inner_width(content_width)).min(COLLAPSED_LINES)
        };
        content_lines + VERTICAL_OVERHEAD
    }

    fn visible_text(&self, content_width: u16) -> String {
        let lines = wrapped_lines(&self.buffer, inner_width(content_width));
        let start = usize::from(self.cursor.scroll_offset).min(lines.len());
        let end = (start + usize::from(self.visible_lines())).min(lines.len());
        lines[start..end].join("\n")
    }

    fn insert(&mut self, text: &str) -> Option<InputEvent> {
        self.buffer.insert_str(self.cursor.pos, text);
        self.cursor.pos += text.len();
        Some(InputEvent::ContentChanged)
    }

    /// Moves the cursor to `pos`, reporting a change only if it moved.
    fn move_to(&mut self, pos: usize) -> Option<InputEvent> {
        (self.cursor.pos != pos).then(|| {
            self.cursor.pos = pos;
            InputEvent::ContentChanged
        })
    }

    fn render_scrollbar(&self, frame: &mut Frame, area: Rect) {
        use ratatui::widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState};

        let total_lines = wrap_line_count(&self.buffer, inner_width(area.width));
        let visible = self.visible_lines();
        if total_lines <= visible {
            return;
        }

        // content_length is the max scroll position, not the line count
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(usize::from(total_lines - visible))
            .position(usize::from(self.cursor.scroll_offset));

        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 1,
            width: 1,
            height: area.height.saturating_sub(2),
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.cursor.last_content_width = area.width;
        self.cursor
            .update_scroll_offset(&self.buffer, area.width, self.visible_lines());

        let title = if self.is_expanded() { "Message (expanded)" } else { "Message" };
        let border_style = if self.focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Green).add_modifier(Modifier::DIM)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(title)
            .padding(Padding::horizontal(1));

        let input = Paragraph::new(self.visible_text(area.width))
            .block(block)
            .style(Style::default().fg(Color::Green));
        frame.render_widget(input, area);
        self.render_scrollbar(frame, area);

        if self.focused {
            frame.set_cursor_position(self.cursor.screen_pos(&self.buffer, area));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => self.insert(c.encode_utf8(&mut [0; 4])),
            TuiEvent::Paste(text) => self.insert(text),
            TuiEvent::Binding(BindingAction::Newline) => self.insert("\n"),
            TuiEvent::Binding(BindingAction::Submit) => {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.cursor.reset();
                Some(InputEvent::Submit(text))
            }
            TuiEvent::Binding(BindingAction::ToggleInput) => {
                self.toggle_expanded();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace if self.cursor.pos > 0 => {
                let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(prev..self.cursor.pos);
                self.cursor.pos = prev;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete if self.cursor.pos < self.buffer.len() => {
                let next = next_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(self.cursor.pos..next);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft if self.cursor.pos > 0 => {
                self.move_to(prev_char_boundary(&self.buffer, self.cursor.pos))
            }
            TuiEvent::CursorRight if self.cursor.pos < self.buffer.len() => {
                self.move_to(next_char_boundary(&self.buffer, self.cursor.pos))
            }
            TuiEvent::WordLeft => self.move_to(prev_word_boundary(&self.buffer, self.cursor.pos)),
            TuiEvent::WordRight => self.move_to(next_word_boundary(&self.buffer, self.cursor.pos)),
            TuiEvent::CursorHome => {
                let line_start = self.buffer[..self.cursor.pos]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                self.move_to(line_start)
            }
            TuiEvent::CursorEnd => {
                let line_end = self.buffer[self.cursor.pos..]
                    .find('\n')
                    .map(|i| self.cursor.pos + i)
                    .unwrap_or(self.buffer.len());
                self.move_to(line_end)
            }
            TuiEvent::CursorUp => self
                .cursor
                .move_vertically(&self.buffer, -1, self.cursor.last_content_width)
                .then_some(InputEvent::ContentChanged),
            TuiEvent::CursorDown => self
                .cursor
                .move_vertically(&self.buffer, 1, self.cursor.last_content_width)
                .then_some(InputEvent::ContentChanged),
            _ => None,
        }
    }
}
