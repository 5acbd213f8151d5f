//! # Footer Component
//!
//! One line listing the visible key bindings, e.g.
//! `Enter Send · Alt+Enter Newline · Ctrl+R New chat`. Hints that do not fit
//! the width are dropped from the end.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::Component;
use crate::tui::keymap::FooterHint;

const SEPARATOR: &str = " · ";

pub struct Footer<'a> {
    pub hints: &'a [FooterHint],
}

impl<'a> Footer<'a> {
    pub fn new(hints: &'a [FooterHint]) -> Self {
        Self { hints }
    }

    fn line(&self, width: u16) -> Line<'static> {
        let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(Color::DarkGray);

        let mut spans = Vec::new();
        let mut used = 0usize;
        for hint in self.hints {
            let separator = if spans.is_empty() { "" } else { SEPARATOR };
            let needed = separator.width() + hint.key.width() + 1 + hint.description.width();
            if used + needed > usize::from(width) {
                break;
            }
            if !separator.is_empty() {
                spans.push(Span::styled(separator, text_style));
            }
            spans.push(Span::styled(hint.key.clone(), key_style));
            spans.push(Span::styled(format!(" {}", hint.description), text_style));
            used += needed;
        }
        Line::from(spans)
    }
}

impl<'a> Component for Footer<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(area.width), area);
    }
}
