//! Cursor position tracking and navigation for the InputBox.
//!
//! `CursorState` owns the cursor byte offset, scroll offset, and cached width.
//! Navigation methods take `buffer: &str` explicitly; the text itself is
//! owned by `InputBox`.

use super::text_wrap::{
    TEXT_OFFSET_X, TEXT_OFFSET_Y, inner_width, wrap_options, wrapped_lines,
};
use ratatui::layout::Rect;

pub(super) struct CursorState {
    /// Byte offset in the buffer (0..=buffer.len())
    pub pos: usize,
    /// First visible wrapped line
    pub scroll_offset: u16,
    /// Width from the last render (used for vertical movement)
    pub last_content_width: u16,
}

impl CursorState {
    const DEFAULT_WIDTH: u16 = 80;

    pub fn new() -> Self {
        Self {
            pos: 0,
            scroll_offset: 0,
            last_content_width: Self::DEFAULT_WIDTH,
        }
    }

    pub fn reset(&mut self) {
        self.pos = 0;
        self.scroll_offset = 0;
    }

    /// Moves to the wrapped line above (`direction < 0`) or below, keeping
    /// the column where possible. Returns `false` at the first/last line.
    pub fn move_vertically(&mut self, buffer: &str, direction: i16, content_width: u16) -> bool {
        let width = inner_width(content_width);
        if width == 0 || buffer.is_empty() {
            return false;
        }
        let lines = textwrap::wrap(buffer, wrap_options(width));

        // Byte length of a wrapped line plus the newline that ends it, if any
        let span = |line: &str, offset: usize| -> usize {
            let end = offset + line.len();
            line.len() + usize::from(buffer.as_bytes().get(end) == Some(&b'\n'))
        };

        let mut offset = 0;
        let mut current = lines.len().saturating_sub(1);
        let mut column = 0;
        for (idx, line) in lines.iter().enumerate() {
            if offset + line.len() >= self.pos {
                current = idx;
                column = self.pos.saturating_sub(offset);
                break;
            }
            offset += span(line, offset);
        }

        let target = match direction {
            d if d < 0 && current == 0 => return false,
            d if d < 0 => current - 1,
            _ if current + 1 >= lines.len() => return false,
            _ => current + 1,
        };

        let target_start: usize = lines
            .iter()
            .take(target)
            .fold(0, |start, line| start + span(line, start));
        let target_line = &lines[target];
        let mut pos = target_start + column.min(target_line.len());
        while !buffer.is_char_boundary(pos) {
            pos -= 1;
        }
        self.pos = pos;
        true
    }

    /// Wrapped line (0-based) the cursor is on.
    pub fn calculate_line(&self, buffer: &str, content_width: u16) -> u16 {
        let width = inner_width(content_width);
        if width == 0 {
            return 0;
        }
        let lines = wrapped_lines(&buffer[..self.pos], width);
        u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX)
    }

    /// Keeps the cursor line inside a window of `visible_lines`.
    pub fn update_scroll_offset(&mut self, buffer: &str, content_width: u16, visible_lines: u16) {
        let total = wrapped_lines(buffer, inner_width(content_width)).len();
        if total <= usize::from(visible_lines) {
            self.scroll_offset = 0;
            return;
        }

        let cursor_line = self.calculate_line(buffer, content_width);
        if cursor_line < self.scroll_offset {
            self.scroll_offset = cursor_line;
        } else if cursor_line >= self.scroll_offset + visible_lines {
            self.scroll_offset = cursor_line.saturating_sub(visible_lines.saturating_sub(1));
        }
    }

    /// Screen (column, row) of the cursor inside `area`.
    pub fn screen_pos(&self, buffer: &str, area: Rect) -> (u16, u16) {
        let width = inner_width(area.width);
        if width == 0 {
            return (area.x + TEXT_OFFSET_X.min(area.width), area.y + TEXT_OFFSET_Y);
        }

        let before = &buffer[..self.pos];
        let cursor_line = self.calculate_line(buffer, area.width);

        // Column from the logical line start; textwrap trims trailing spaces
        // so the wrapped segment lengths cannot be used directly.
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let logical = &before[line_start..];
        let segments = textwrap::wrap(logical, wrap_options(width));
        let earlier: usize = segments
            .iter()
            .take(segments.len().saturating_sub(1))
            .map(|seg| seg.chars().count())
            .sum();
        let column = logical.chars().count().saturating_sub(earlier);
        let column = u16::try_from(column).unwrap_or(u16::MAX).min(width);

        let row = cursor_line.saturating_sub(self.scroll_offset);
        (area.x + TEXT_OFFSET_X + column, area.y + TEXT_OFFSET_Y + row)
    }
}
