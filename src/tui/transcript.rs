//! # Transcript
//!
//! The blocks shown in the conversation view: echoed prompts plus the prose
//! and code widgets created by the render driver. `Transcript` is the TUI's
//! [`WidgetSink`]; widget ids are block indices.

use std::time::{Duration, Instant};

use log::debug;

use crate::core::render::{CopySink, WidgetId, WidgetSink};
use crate::core::segment::{self, SegmentKind};

/// How long a block stays highlighted after being copied.
pub const FLASH_DURATION: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A prompt the user submitted.
    Prompt,
    Prose,
    Code,
}

impl From<SegmentKind> for BlockKind {
    fn from(kind: SegmentKind) -> Self {
        match kind {
            SegmentKind::Prose => BlockKind::Prose,
            SegmentKind::Code => BlockKind::Code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// Source text. Prose and prompts are displayed from this.
    pub raw: String,
    /// Code body for code blocks, trimmed text for prose.
    pub display: String,
    /// Language tag of a code block's fence.
    pub language: Option<String>,
    /// Changes whenever the content does. Unique across the transcript's
    /// lifetime, so layout caches can key on it.
    pub revision: u64,
    flashed_at: Option<Instant>,
}

impl Block {
    /// The text click-to-copy puts on the clipboard.
    pub fn copy_text(&self) -> &str {
        match self.kind {
            BlockKind::Code => &self.display,
            BlockKind::Prose => self.display.trim(),
            BlockKind::Prompt => &self.raw,
        }
    }

    pub fn is_flashing(&self, now: Instant) -> bool {
        self.flashed_at
            .is_some_and(|at| now.saturating_duration_since(at) < FLASH_DURATION)
    }
}

#[derive(Debug, Default)]
pub struct Transcript {
    blocks: Vec<Block>,
    next_revision: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Echo a submitted prompt.
    pub fn push_prompt(&mut self, text: &str) {
        let revision = self.bump();
        self.blocks.push(Block {
            kind: BlockKind::Prompt,
            raw: text.to_string(),
            display: text.trim().to_string(),
            language: None,
            revision,
            flashed_at: None,
        });
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Copies block `index` and flashes it on success.
    pub fn copy_block(&mut self, index: usize, clipboard: &mut dyn CopySink, now: Instant) -> bool {
        let Some(block) = self.blocks.get_mut(index) else {
            return false;
        };
        if !clipboard.copy_to_system_clipboard(block.copy_text()) {
            return false;
        }
        block.flashed_at = Some(now);
        true
    }

    /// True while any block is mid-flash (the view must keep redrawing).
    pub fn is_flashing(&self, now: Instant) -> bool {
        self.blocks.iter().any(|block| block.is_flashing(now))
    }

    fn bump(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }
}

impl WidgetSink for Transcript {
    fn create_widget(&mut self, kind: SegmentKind) -> WidgetId {
        let revision = self.bump();
        self.blocks.push(Block {
            kind: kind.into(),
            raw: String::new(),
            display: String::new(),
            language: None,
            revision,
            flashed_at: None,
        });
        WidgetId(self.blocks.len() - 1)
    }

    fn set_widget_content(&mut self, id: WidgetId, raw: &str, display: &str) {
        let revision = self.bump();
        let Some(block) = self.blocks.get_mut(id.0) else {
            debug!("Content for unknown widget {:?} dropped", id);
            return;
        };
        if block.raw == raw && block.display == display {
            return;
        }
        block.raw.clear();
        block.raw.push_str(raw);
        block.display.clear();
        block.display.push_str(display);
        if block.kind == BlockKind::Code {
            block.language = segment::fence_language(raw).map(str::to_string);
        }
        block.revision = revision;
    }
}
