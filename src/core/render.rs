//! # Incremental Render Driver
//!
//! Turns successive parses of a growing response buffer into widget
//! operations on a [`WidgetSink`].
//!
//! ```text
//! tick 1  "Here"                      → create Prose#0, set
//! tick 2  "Here is"                   → set Prose#0
//! tick 9  "Here is\n```sh\nls\n```"   → set Prose#0, create Code#1, set
//! tick 10 "...```\nDone"              → set Code#1, create Prose#2, set
//! ```
//!
//! Only the most recently created widget is "open". Every earlier widget was
//! superseded by a later segment and is never written to again.

use log::debug;

use crate::core::segment::{self, Segment, SegmentKind};

/// Handle to a widget owned by a [`WidgetSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub usize);

/// Receives rendered segments.
pub trait WidgetSink {
    /// Create an empty widget for a segment of `kind`.
    fn create_widget(&mut self, kind: SegmentKind) -> WidgetId;

    /// Replace a widget's content. `raw` is the exact source text, `display`
    /// is the text shown and copied for code.
    fn set_widget_content(&mut self, id: WidgetId, raw: &str, display: &str);
}

/// Places text on the system clipboard.
pub trait CopySink {
    /// Returns `true` if the text was copied.
    fn copy_to_system_clipboard(&mut self, text: &str) -> bool;
}

/// Per-response render bookkeeping.
#[derive(Debug, Default)]
pub struct RenderState {
    /// The open widget and the kind of segment it tracks.
    current: Option<(WidgetId, SegmentKind)>,
    /// Number of parsed segments that already have a widget.
    rendered: usize,
    last_raw_tail: String,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-parse the whole `buffer` (still streaming) and update the sink.
    pub fn tick(&mut self, buffer: &str, sink: &mut dyn WidgetSink) {
        let segments = segment::parse(buffer);
        self.apply(&segments, sink);
    }

    /// Final pass once the stream has ended: open fences become code.
    pub fn finish(&mut self, buffer: &str, sink: &mut dyn WidgetSink) {
        let segments = segment::parse_final(buffer);
        self.apply(&segments, sink);
    }

    pub fn current_widget(&self) -> Option<WidgetId> {
        self.current.map(|(id, _)| id)
    }

    /// Number of widgets created for this response.
    pub fn widget_count(&self) -> usize {
        self.rendered
    }

    /// Raw text of the last segment seen.
    pub fn last_raw_tail(&self) -> &str {
        &self.last_raw_tail
    }

    fn apply(&mut self, segments: &[Segment<'_>], sink: &mut dyn WidgetSink) {
        let Some(last) = segments.last() else {
            return;
        };

        // Segments before the open one belong to frozen widgets.
        let open = self.rendered.saturating_sub(1);
        for (index, segment) in segments.iter().enumerate().skip(open) {
            let id = match self.current {
                Some((id, kind)) if index < self.rendered && kind == segment.kind => id,
                _ => {
                    let id = sink.create_widget(segment.kind);
                    debug!(
                        "Created {:?} widget {:?} for segment {} ({}..{})",
                        segment.kind, id, index, segment.span.start, segment.span.end
                    );
                    self.current = Some((id, segment.kind));
                    self.rendered = index + 1;
                    id
                }
            };
            sink.set_widget_content(id, segment.raw, &segment.display);
        }

        self.last_raw_tail.clear();
        self.last_raw_tail.push_str(last.raw);
    }
}
