use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{BlockList, Footer, TitleBar};

/// Screen regions, top to bottom.
pub struct ScreenLayout {
    pub title: Rect,
    pub transcript: Rect,
    pub input: Rect,
    pub footer: Rect,
}

impl ScreenLayout {
    pub fn new(area: Rect, input_height: u16) -> Self {
        use Constraint::{Length, Min};
        let [title, transcript, input, footer] =
            Layout::vertical([Length(1), Min(0), Length(input_height), Length(1)]).areas(area);
        Self {
            title,
            transcript,
            input,
            footer,
        }
    }
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let input_height = tui.input_box.calculate_height(frame.area().width);
    let layout = ScreenLayout::new(frame.area(), input_height);

    if tui.transcript.is_empty() {
        let hint = Paragraph::new("Type a message and press Enter")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        let middle = Rect {
            y: layout.transcript.y + layout.transcript.height / 2,
            height: layout.transcript.height.min(1),
            ..layout.transcript
        };
        frame.render_widget(hint, middle);
        tui.block_list.viewport_height = layout.transcript.height;
    } else {
        BlockList::new(
            &mut tui.block_list,
            &tui.transcript,
            app.show_line_numbers,
            Instant::now(),
        )
        .render(frame, layout.transcript);
    }

    let mut title_bar = TitleBar::new(app.model_name().to_string(), app.status_message.clone());
    title_bar.is_streaming = app.is_loading();
    title_bar.has_unseen_content = tui.block_list.has_unseen_content;
    title_bar.spinner_frame = spinner_frame;
    title_bar.render(frame, layout.title);

    tui.input_box.render(frame, layout.input);
    Footer::new(tui.keymap.hints()).render(frame, layout.footer);
}

/// Which block (if any) is under screen row `row`.
pub fn hit_test_block(row: u16, frame_area: Rect, tui: &TuiState) -> Option<usize> {
    let input_height = tui.input_box.calculate_height(frame_area.width);
    let transcript = ScreenLayout::new(frame_area, input_height).transcript;
    if row < transcript.y || row >= transcript.y + transcript.height {
        return None;
    }
    tui.block_list.block_at(row - transcript.y)
}
