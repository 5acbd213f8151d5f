//! # Session Controller
//!
//! Owns the conversation history and the (at most one) exchange in flight.
//!
//! ```text
//!            submit(text)
//!   Idle ─────────────────► Streaming(id) ──finish(id)──► Idle
//!    ▲                        │    │
//!    │        cancel()        │    │ submit(text): old exchange cancelled,
//!    └────────────────────────┘    ▼ partial reply committed, new id
//!                              Streaming(id+1)
//! ```
//!
//! Whatever ends an exchange (completion, transport error, cancel, resubmit),
//! the raw text received so far is committed as the assistant turn, so the
//! history always alternates user / assistant after the system prompt.
//! Only [`Session::reset`] discards an exchange without committing it.

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::core::exchange::{ExchangeId, ExchangeTicket};
use crate::core::render::{RenderState, WidgetSink};
use crate::inference::History;

/// The exchange currently streaming.
#[derive(Debug)]
struct Exchange {
    id: ExchangeId,
    buffer: String,
    render: RenderState,
    token: CancellationToken,
}

#[derive(Debug)]
pub struct Session {
    history: History,
    model: String,
    active: Option<Exchange>,
    next_id: u64,
}

impl Session {
    pub fn new(model: impl Into<String>, history: History) -> Self {
        Self {
            history,
            model: model.into(),
            active: None,
            next_id: 1,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_id(&self) -> Option<ExchangeId> {
        self.active.as_ref().map(|exchange| exchange.id)
    }

    /// Text received so far for the exchange in flight.
    pub fn pending_response(&self) -> Option<&str> {
        self.active.as_ref().map(|exchange| exchange.buffer.as_str())
    }

    /// Starts a new exchange for `text`.
    ///
    /// Returns `None` for empty or whitespace-only input. An exchange still in
    /// flight is cancelled first and its partial reply committed.
    pub fn submit(&mut self, text: &str) -> Option<ExchangeTicket> {
        if text.trim().is_empty() {
            debug!("Ignoring blank submission");
            return None;
        }

        if self.interrupt() {
            info!("Previous exchange superseded by new submission");
        }

        self.history.push_user(text);

        let id = ExchangeId(self.next_id);
        self.next_id += 1;
        let token = CancellationToken::new();
        self.active = Some(Exchange {
            id,
            buffer: String::new(),
            render: RenderState::new(),
            token: token.clone(),
        });

        info!("Exchange {} submitted ({} history messages)", id, self.history.len());
        Some(ExchangeTicket {
            id,
            messages: self.history.messages().to_vec(),
            model: self.model.clone(),
            token,
        })
    }

    /// Appends a delta to exchange `id` and re-renders it.
    ///
    /// Returns `false` if the delta was dropped (stale exchange or empty text).
    pub fn apply_delta(&mut self, id: ExchangeId, text: &str, sink: &mut dyn WidgetSink) -> bool {
        let Some(exchange) = self.active.as_mut().filter(|exchange| exchange.id == id) else {
            debug!("Dropping delta for stale exchange {}", id);
            return false;
        };
        if text.is_empty() {
            return false;
        }
        exchange.buffer.push_str(text);
        exchange.render.tick(&exchange.buffer, sink);
        true
    }

    /// Ends exchange `id`: final render pass, then the raw reply goes into
    /// history.
    ///
    /// Returns `false` if `id` is not the exchange in flight.
    pub fn finish(&mut self, id: ExchangeId, sink: &mut dyn WidgetSink) -> bool {
        let Some(mut exchange) = self.active.take_if(|exchange| exchange.id == id) else {
            debug!("Ignoring completion of stale exchange {}", id);
            return false;
        };
        exchange.render.finish(&exchange.buffer, sink);
        info!(
            "Exchange {} complete: {} bytes in {} widgets",
            id,
            exchange.buffer.len(),
            exchange.render.widget_count()
        );
        self.history.push_assistant(exchange.buffer);
        true
    }

    /// Cancels the exchange in flight, keeping its partial reply.
    ///
    /// Widgets stay as they were last rendered.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.interrupt();
        if cancelled {
            info!("Exchange cancelled by user");
        }
        cancelled
    }

    /// Clears the conversation back to the system prompt. Any exchange in
    /// flight is cancelled and its partial reply discarded.
    pub fn reset(&mut self) {
        if let Some(exchange) = self.active.take() {
            exchange.token.cancel();
            debug!("Exchange {} discarded by reset", exchange.id);
        }
        self.history.reset();
        info!("Chat session reset");
    }

    fn interrupt(&mut self) -> bool {
        let Some(exchange) = self.active.take() else {
            return false;
        };
        exchange.token.cancel();
        debug!(
            "Exchange {} interrupted after {} bytes",
            exchange.id,
            exchange.buffer.len()
        );
        self.history.push_assistant(exchange.buffer);
        true
    }
}
