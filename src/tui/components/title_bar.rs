//! # TitleBar Component
//!
//! Top status bar: model name, status line, a spinner while a response is
//! streaming, and "↓ New" when there is content below the viewport.
//!
//! Stateless; every field is a prop supplied by the parent each frame:
//! - `model_name` and `status_message` come from the core `App`
//! - `is_streaming` comes from the session
//! - `has_unseen_content` and `spinner_frame` are TUI state

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct TitleBar {
    pub model_name: String,
    pub status_message: String,
    pub is_streaming: bool,
    pub has_unseen_content: bool,
    pub spinner_frame: usize,
}

impl TitleBar {
    pub fn new(model_name: String, status_message: String) -> Self {
        Self {
            model_name,
            status_message,
            is_streaming: false,
            has_unseen_content: false,
            spinner_frame: 0,
        }
    }

    fn title_text(&self) -> String {
        let mut text = format!("Parley (model: {})", self.model_name);
        if !self.status_message.is_empty() {
            text.push_str(" | ");
            text.push_str(&self.status_message);
        }
        if self.has_unseen_content {
            text.push_str(" | ↓ New");
        }
        text
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::with_capacity(2);
        if self.is_streaming {
            spans.push(Span::styled(
                format!("{} ", SPINNER[self.spinner_frame % SPINNER.len()]),
                Style::default().fg(Color::Cyan),
            ));
        }
        spans.push(Span::raw(self.title_text()));
        frame.render_widget(Line::from(spans), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(title_bar: &mut TitleBar) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
        terminal.draw(|f| title_bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn shows_model_and_status() {
        let mut title_bar = TitleBar::new("gpt-4o".to_string(), "Receiving...".to_string());
        let text = render(&mut title_bar);
        assert!(text.contains("Parley (model: gpt-4o) | Receiving..."));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn empty_status_has_no_separator() {
        let mut title_bar = TitleBar::new("gpt-4o".to_string(), String::new());
        let text = render(&mut title_bar);
        assert!(text.contains("Parley (model: gpt-4o)"));
        assert!(!text.contains('|'));
    }

    #[test]
    fn unseen_content_indicator() {
        let mut title_bar = TitleBar::new("m".to_string(), "Ready".to_string());
        title_bar.has_unseen_content = true;
        assert!(render(&mut title_bar).contains("Ready | ↓ New"));
    }

    #[test]
    fn spinner_only_while_streaming() {
        let mut title_bar = TitleBar::new("m".to_string(), "Ready".to_string());
        assert!(!render(&mut title_bar).contains(SPINNER[0]));

        title_bar.is_streaming = true;
        title_bar.spinner_frame = 12;
        assert!(render(&mut title_bar).starts_with(SPINNER[2]));
    }
}
