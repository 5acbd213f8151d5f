use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{self, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::tui::component::Component;
use crate::tui::highlight;
use crate::tui::markdown;
use crate::tui::transcript::{Block, BlockKind};

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

const PROSE_FG: Color = Color::Blue;

/// A stateless component that renders one transcript block.
///
/// # Styling
///
/// - **Prompt** (green, titled `you`): text the user submitted
/// - **Prose** (blue, titled `parley`): markdown rendered from the raw text
/// - **Code** (yellow, titled with the fence language): syntax highlighted,
///   with an optional line-number gutter
///
/// Selected blocks get a cyan border. A block that was just copied shows a
/// bold white border and a `copied` badge.
///
/// # Height Calculation
///
/// [`calculate_height`](Self::calculate_height) builds the same `Paragraph`
/// the widget renders and asks it for its wrapped line count, so the parent
/// list can lay out blocks without rendering them.
#[derive(Clone, Copy)]
pub struct BlockView<'a> {
    pub block: &'a Block,
    pub is_selected: bool,
    pub is_flashing: bool,
    pub show_line_numbers: bool,
}

impl<'a> BlockView<'a> {
    pub fn new(block: &'a Block, is_selected: bool, is_flashing: bool, show_line_numbers: bool) -> Self {
        Self {
            block,
            is_selected,
            is_flashing,
            show_line_numbers,
        }
    }

    /// Rendered height of `block` at `width`, borders included.
    pub fn calculate_height(block: &Block, width: u16, show_line_numbers: bool) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Terminal too narrow for borders + padding
            return 1;
        }
        let lines = content_paragraph(block, show_line_numbers).line_count(content_width);
        let lines = u16::try_from(lines).unwrap_or(u16::MAX);
        lines.max(1).saturating_add(VERTICAL_OVERHEAD)
    }

    fn title(&self) -> String {
        match self.block.kind {
            BlockKind::Prompt => "you".to_string(),
            BlockKind::Prose => "parley".to_string(),
            BlockKind::Code => self.block.language.clone().unwrap_or_else(|| "code".to_string()),
        }
    }
}

fn base_style(kind: BlockKind) -> Style {
    match kind {
        BlockKind::Prompt => Style::default().fg(Color::Green),
        BlockKind::Prose => Style::default().fg(PROSE_FG),
        BlockKind::Code => Style::default().fg(Color::Yellow),
    }
}

fn content_paragraph(block: &Block, show_line_numbers: bool) -> Paragraph<'static> {
    let text = match block.kind {
        BlockKind::Prompt => Text::styled(block.display.clone(), base_style(BlockKind::Prompt)),
        BlockKind::Prose => markdown::render(&block.raw, PROSE_FG),
        BlockKind::Code => Text::from(highlight::highlight(
            &block.display,
            block.language.as_deref(),
            show_line_numbers,
        )),
    };
    Paragraph::new(text).wrap(Wrap { trim: false })
}

impl<'a> Widget for BlockView<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let border_style = if self.is_flashing {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            base_style(self.block.kind).add_modifier(Modifier::DIM)
        };

        let mut border = widgets::Block::bordered()
            .title(self.title())
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        if self.is_flashing {
            border = border.title_top(Line::from("copied").right_aligned());
        }

        let inner_area = border.inner(area);
        border.render(area, buf);
        content_paragraph(self.block, self.show_line_numbers).render(inner_area, buf);
    }
}

impl<'a> Component for BlockView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
