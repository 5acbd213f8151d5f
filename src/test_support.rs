//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::core::render::{CopySink, WidgetId, WidgetSink};
use crate::core::segment::SegmentKind;
use crate::inference::{
    CompletionProvider, CompletionRequest, History, StreamChunk, TransportError,
};

/// A no-op provider for tests that don't need real API calls.
pub struct NoopProvider;

#[async_trait]
impl CompletionProvider for NoopProvider {
    fn name(&self) -> &str {
        "noop"
    }

    async fn stream_completion(
        &self,
        _request: CompletionRequest<'_>,
        _sender: Sender<StreamChunk>,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Replays a fixed list of deltas, then completes or fails.
pub struct ScriptedProvider {
    deltas: Vec<String>,
    error: Option<TransportError>,
}

impl ScriptedProvider {
    pub fn new<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deltas: deltas.into_iter().map(Into::into).collect(),
            error: None,
        }
    }

    /// Fail with `error` after the deltas instead of completing.
    pub fn failing_with(mut self, error: TransportError) -> Self {
        self.error = Some(error);
        self
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_completion(
        &self,
        _request: CompletionRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), TransportError> {
        for delta in &self.deltas {
            sender
                .send(StreamChunk::Content(delta.clone()))
                .await
                .map_err(|_| TransportError::ChannelClosed)?;
        }
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        sender
            .send(StreamChunk::Completed)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// What a [`RecordingSink`] knows about one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWidget {
    pub kind: SegmentKind,
    pub raw: String,
    pub display: String,
    /// Number of `set_widget_content` calls.
    pub updates: usize,
}

/// Widget sink that keeps every widget in creation order. Ids are indices.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub widgets: Vec<RecordedWidget>,
}

impl WidgetSink for RecordingSink {
    fn create_widget(&mut self, kind: SegmentKind) -> WidgetId {
        self.widgets.push(RecordedWidget {
            kind,
            raw: String::new(),
            display: String::new(),
            updates: 0,
        });
        WidgetId(self.widgets.len() - 1)
    }

    fn set_widget_content(&mut self, id: WidgetId, raw: &str, display: &str) {
        let widget = &mut self.widgets[id.0];
        widget.raw = raw.to_string();
        widget.display = display.to_string();
        widget.updates += 1;
    }
}

/// Clipboard that records copies, or refuses them.
#[derive(Debug, Default)]
pub struct FakeClipboard {
    pub copied: Vec<String>,
    pub broken: bool,
}

impl CopySink for FakeClipboard {
    fn copy_to_system_clipboard(&mut self, text: &str) -> bool {
        if self.broken {
            return false;
        }
        self.copied.push(text.to_string());
        true
    }
}

/// Creates a test App with a NoopProvider.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(
        Arc::new(NoopProvider),
        "test-model".to_string(),
        History::new("test system prompt"),
    )
}
