//! # BlockList Component
//!
//! Scrollable view of the transcript.
//!
//! ## Responsibilities
//!
//! - Display the transcript blocks
//! - Manage scrolling, including stick-to-bottom while a response streams
//! - Hit testing for click-to-copy
//! - Layout caching (block heights)
//!
//! ## Architecture
//!
//! `BlockList` is a transient component (created each frame) that wraps
//! `&'a mut BlockListState` (persistent state) and the `Transcript` (props).
//! Since `Component::render` takes `&mut self`, the layout cache and scroll
//! state are updated during the render pass, as with Ratatui's
//! `StatefulWidget`.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::tui::component::{Component, EventHandler};
use crate::tui::components::block::BlockView;
use crate::tui::event::TuiEvent;
use crate::tui::transcript::{Block, Transcript};

/// Layout and scroll state for the block list.
/// Must be persisted in the parent TuiState.
pub struct BlockListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Block highlighted by keyboard navigation
    pub selected_index: Option<usize>,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    /// Content exists below the viewport (drives the "↓ New" indicator)
    pub has_unseen_content: bool,
}

impl Default for BlockListState {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            selected_index: None,
            viewport_height: 0,
            has_unseen_content: false,
        }
    }

    /// Forget everything; used when the chat session is reset.
    pub fn clear(&mut self) {
        *self = Self {
            viewport_height: self.viewport_height,
            ..Self::new()
        };
    }

    fn max_scroll(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Scroll the viewport so the selected block is fully visible.
    /// If the block is taller than the viewport, align its top edge.
    pub fn scroll_to_selected(&mut self) {
        let Some(idx) = self.selected_index else {
            return;
        };
        let Some(&item_bottom) = self.layout.prefix_heights.get(idx) else {
            return;
        };
        let item_top = self.layout.top_of(idx);
        let offset_y = self.scroll_state.offset().y;

        if item_top < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: item_top });
            self.stick_to_bottom = false;
        } else if item_bottom > offset_y + self.viewport_height {
            let new_y = item_bottom.saturating_sub(self.viewport_height);
            self.scroll_state.set_offset(Position { x: 0, y: new_y });
            // Re-pin if we've landed at the absolute bottom
            self.stick_to_bottom = new_y >= self.max_scroll();
        }
    }

    /// Clamp scroll and re-engage auto-scroll if the user has reached the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    pub fn select_previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected_index = Some(match self.selected_index {
            Some(idx) => idx.saturating_sub(1).min(len - 1),
            None => len - 1,
        });
        self.scroll_to_selected();
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected_index = Some(match self.selected_index {
            Some(idx) => (idx + 1).min(len - 1),
            None => len - 1,
        });
        self.scroll_to_selected();
    }

    /// Block at row `row` of the viewport, using the last frame's layout.
    pub fn block_at(&self, row: u16) -> Option<usize> {
        if row >= self.viewport_height {
            return None;
        }
        let content_y = row.saturating_add(self.scroll_state.offset().y);
        let idx = self.layout.prefix_heights.partition_point(|&end| end <= content_y);
        (idx < self.layout.prefix_heights.len()).then_some(idx)
    }
}

/// Scrollable transcript view.
/// Created fresh each frame with references to state and data.
pub struct BlockList<'a> {
    pub state: &'a mut BlockListState,
    pub transcript: &'a Transcript,
    pub show_line_numbers: bool,
    pub now: Instant,
}

impl<'a> BlockList<'a> {
    pub fn new(
        state: &'a mut BlockListState,
        transcript: &'a Transcript,
        show_line_numbers: bool,
        now: Instant,
    ) -> Self {
        Self {
            state,
            transcript,
            show_line_numbers,
            now,
        }
    }
}

impl<'a> Component for BlockList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        let blocks = self.transcript.blocks();

        // 1. Update layout cache
        self.state
            .layout
            .update(blocks, content_width, self.show_line_numbers);
        let total_height = self.state.layout.total_height();

        // 2. Pin to the bottom or clamp the scroll offset
        self.state.viewport_height = area.height;
        if self.state.stick_to_bottom {
            let bottom = self.state.max_scroll();
            self.state.scroll_state.set_offset(Position { x: 0, y: bottom });
        } else {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible blocks into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        for i in visible_range {
            let block = &blocks[i];
            let rect = Rect::new(
                0,
                self.state.layout.top_of(i),
                content_width,
                self.state.layout.heights[i],
            );
            let view = BlockView::new(
                block,
                self.state.selected_index == Some(i),
                block.is_flashing(self.now),
                self.show_line_numbers,
            );
            scroll_view.render_widget(view, rect);
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);

        let current_offset = self.state.scroll_state.offset().y;
        self.state.has_unseen_content =
            total_height > area.height && current_offset < total_height.saturating_sub(area.height);
    }
}

/// Implemented on the state because the list itself is rebuilt every frame.
impl EventHandler for BlockListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => {
                self.stick_to_bottom = true;
                let bottom = self.max_scroll();
                self.scroll_state.set_offset(Position { x: 0, y: bottom });
            }
            _ => {}
        }
        None
    }
}

/// Cached block heights. A height is recomputed only when its block's
/// revision changes or the width / gutter setting does.
#[derive(Debug, Default)]
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    revisions: Vec<u64>,
    content_width: u16,
    show_line_numbers: bool,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leading cached heights still valid for `blocks`.
    pub fn reusable_count(&self, blocks: &[Block], content_width: u16, show_line_numbers: bool) -> usize {
        if self.content_width != content_width || self.show_line_numbers != show_line_numbers {
            return 0;
        }
        self.revisions
            .iter()
            .zip(blocks)
            .take_while(|(revision, block)| **revision == block.revision)
            .count()
    }

    pub fn update(&mut self, blocks: &[Block], content_width: u16, show_line_numbers: bool) {
        let reusable = self.reusable_count(blocks, content_width, show_line_numbers);
        self.heights.truncate(reusable);
        self.revisions.truncate(reusable);
        for block in &blocks[reusable..] {
            self.heights
                .push(BlockView::calculate_height(block, content_width, show_line_numbers));
            self.revisions.push(block.revision);
        }
        self.content_width = content_width;
        self.show_line_numbers = show_line_numbers;
        self.rebuild_prefix_heights();
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn top_of(&self, idx: usize) -> u16 {
        match idx {
            0 => 0,
            _ => self.prefix_heights.get(idx - 1).copied().unwrap_or(0),
        }
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::{WidgetId, WidgetSink};
    use crate::core::segment::SegmentKind;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn prose_transcript(count: usize) -> Transcript {
        let mut transcript = Transcript::new();
        for n in 0..count {
            let id = transcript.create_widget(SegmentKind::Prose);
            let text = format!("block {n}");
            transcript.set_widget_content(id, &text, &text);
        }
        transcript
    }

    fn layout_state(heights: Vec<u16>, viewport_height: u16) -> BlockListState {
        let mut state = BlockListState::new();
        state.layout.heights = heights;
        state.layout.rebuild_prefix_heights();
        state.viewport_height = viewport_height;
        state
    }

    #[test]
    fn cache_reuses_unchanged_blocks() {
        let mut transcript = prose_transcript(3);
        let mut cache = LayoutCache::new();
        cache.update(transcript.blocks(), 40, false);
        assert_eq!(cache.reusable_count(transcript.blocks(), 40, false), 3);

        // Only the tail block changed
        transcript.set_widget_content(WidgetId(2), "grown", "grown");
        assert_eq!(cache.reusable_count(transcript.blocks(), 40, false), 2);

        // Width or gutter change invalidates everything
        assert_eq!(cache.reusable_count(transcript.blocks(), 30, false), 0);
        assert_eq!(cache.reusable_count(transcript.blocks(), 40, true), 0);
    }

    #[test]
    fn cache_invalidated_after_clear() {
        let mut transcript = prose_transcript(2);
        let mut cache = LayoutCache::new();
        cache.update(transcript.blocks(), 40, false);

        transcript.clear();
        transcript.push_prompt("fresh");
        assert_eq!(cache.reusable_count(transcript.blocks(), 40, false), 0);

        cache.update(transcript.blocks(), 40, false);
        assert_eq!(cache.heights.len(), 1);
    }

    #[test]
    fn visible_range_covers_viewport() {
        let state = layout_state(vec![3; 10], 6);
        let range = state.layout.visible_range(9, 6);
        assert!(range.contains(&3) && range.contains(&4));
        assert!(range.end <= 10);
    }

    #[test]
    fn block_at_maps_rows_through_scroll() {
        let mut state = layout_state(vec![3, 4, 5], 6);
        assert_eq!(state.block_at(0), Some(0));
        assert_eq!(state.block_at(3), Some(1));
        assert_eq!(state.block_at(6), None);

        state.scroll_state.set_offset(Position { x: 0, y: 5 });
        assert_eq!(state.block_at(0), Some(1));
        assert_eq!(state.block_at(2), Some(2));
    }

    #[test]
    fn selection_moves_and_clamps() {
        let mut state = layout_state(vec![3, 3, 3], 10);
        state.select_previous(3);
        assert_eq!(state.selected_index, Some(2));
        state.select_previous(3);
        state.select_previous(3);
        state.select_previous(3);
        assert_eq!(state.selected_index, Some(0));
        state.select_next(3);
        assert_eq!(state.selected_index, Some(1));

        state.select_next(0);
        assert_eq!(state.selected_index, Some(1));
    }

    #[test]
    fn selecting_above_viewport_unpins() {
        let mut state = layout_state(vec![5; 4], 5);
        state.scroll_state.set_offset(Position { x: 0, y: 15 });
        state.selected_index = Some(0);
        state.scroll_to_selected();
        assert_eq!(state.scroll_state.offset().y, 0);
        assert!(!state.stick_to_bottom);
    }

    #[test]
    fn scrolling_up_unpins_and_to_bottom_repins() {
        let mut state = layout_state(vec![5; 4], 5);
        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);
        state.handle_event(&TuiEvent::ScrollToBottom);
        assert!(state.stick_to_bottom);
    }

    #[test]
    fn clear_keeps_viewport_height() {
        let mut state = layout_state(vec![5; 4], 7);
        state.selected_index = Some(2);
        state.stick_to_bottom = false;
        state.clear();
        assert_eq!(state.viewport_height, 7);
        assert_eq!(state.selected_index, None);
        assert!(state.stick_to_bottom);
        assert!(state.layout.heights.is_empty());
    }

    #[test]
    fn renders_blocks_and_sticks_to_bottom() {
        let transcript = prose_transcript(6);
        let mut state = BlockListState::new();
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        terminal
            .draw(|f| {
                BlockList::new(&mut state, &transcript, false, Instant::now()).render(f, f.area());
            })
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("block 5"), "last block visible: {text}");
        assert!(!text.contains("block 0"));
        assert_eq!(state.layout.heights, vec![3; 6]);
        assert!(!state.has_unseen_content);
    }
}
