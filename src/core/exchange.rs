//! # Exchanges
//!
//! One exchange = one request to the model and the streamed reply.
//!
//! ```text
//! Session::submit ──► ExchangeTicket ──► run_exchange (tokio task)
//!                                           │
//!                     Action::Delta ◄───────┤  per content chunk
//!                     Action::ExchangeFinished ◄┘  once, unless cancelled
//! ```
//!
//! Every action carries the [`ExchangeId`] it belongs to, so the event loop
//! can drop deltas from an exchange that has already been superseded.

use std::fmt;
use std::sync::{Arc, mpsc};

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::core::action::Action;
use crate::inference::{CompletionProvider, CompletionRequest, Message, StreamChunk};

/// Identifies one exchange within a session. Strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExchangeId(pub u64);

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the background task needs, detached from session state.
#[derive(Debug, Clone)]
pub struct ExchangeTicket {
    pub id: ExchangeId,
    pub messages: Vec<Message>,
    pub model: String,
    pub token: CancellationToken,
}

/// Streams one completion and forwards it to the event loop as actions.
///
/// Returns without sending `ExchangeFinished` when the ticket's token is
/// cancelled; whoever cancelled it has already closed the exchange.
pub async fn run_exchange(
    provider: Arc<dyn CompletionProvider>,
    ticket: ExchangeTicket,
    tx: mpsc::Sender<Action>,
) {
    let id = ticket.id;
    info!(
        "Exchange {} starting: provider={}, model={}, messages={}",
        id,
        provider.name(),
        ticket.model,
        ticket.messages.len()
    );

    let (chunk_tx, mut chunk_rx) = tokio::sync::mpsc::channel::<StreamChunk>(100);
    let request = CompletionRequest {
        messages: &ticket.messages,
        model: &ticket.model,
    };
    let stream = provider.stream_completion(request, chunk_tx);

    let forward = async {
        let mut forwarded = 0usize;
        while let Some(chunk) = chunk_rx.recv().await {
            match chunk {
                StreamChunk::Content(text) => {
                    forwarded += 1;
                    if tx.send(Action::Delta { exchange: id, text }).is_err() {
                        warn!("Exchange {}: event loop gone, dropping stream", id);
                        return forwarded;
                    }
                }
                StreamChunk::Completed => debug!("Exchange {}: end-of-stream marker", id),
            }
        }
        forwarded
    };

    let (result, forwarded) = tokio::select! {
        biased;
        _ = ticket.token.cancelled() => {
            info!("Exchange {} cancelled", id);
            return;
        }
        joined = async { tokio::join!(stream, forward) } => joined,
    };

    let error = match result {
        Ok(()) => {
            info!("Exchange {} finished: {} deltas", id, forwarded);
            None
        }
        Err(e) => {
            warn!("Exchange {} failed after {} deltas: {}", id, forwarded, e);
            Some(e.to_string())
        }
    };

    if tx.send(Action::ExchangeFinished { exchange: id, error }).is_err() {
        warn!("Exchange {}: failed to report completion, receiver dropped", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{Role, TransportError};
    use crate::test_support::ScriptedProvider;

    fn ticket(id: u64) -> ExchangeTicket {
        ExchangeTicket {
            id: ExchangeId(id),
            messages: vec![Message::new(Role::User, "hi")],
            model: "test-model".to_string(),
            token: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn forwards_deltas_then_finishes() {
        let provider = Arc::new(ScriptedProvider::new(["Hel", "", "lo"]));
        let (tx, rx) = mpsc::channel();

        run_exchange(provider, ticket(3), tx).await;

        let actions: Vec<Action> = rx.try_iter().collect();
        assert_eq!(actions.len(), 4);
        assert!(matches!(&actions[0], Action::Delta { exchange: ExchangeId(3), text } if text == "Hel"));
        assert!(matches!(&actions[1], Action::Delta { text, .. } if text.is_empty()));
        assert!(matches!(&actions[2], Action::Delta { text, .. } if text == "lo"));
        assert!(matches!(
            &actions[3],
            Action::ExchangeFinished { exchange: ExchangeId(3), error: None }
        ));
    }

    #[tokio::test]
    async fn transport_error_is_reported_after_partial_output() {
        let provider = Arc::new(
            ScriptedProvider::new(["partial"]).failing_with(TransportError::Network("reset".into())),
        );
        let (tx, rx) = mpsc::channel();

        run_exchange(provider, ticket(1), tx).await;

        let actions: Vec<Action> = rx.try_iter().collect();
        assert_eq!(actions.len(), 2);
        match &actions[1] {
            Action::ExchangeFinished { error: Some(msg), .. } => assert!(msg.contains("reset")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_exchange_sends_nothing() {
        let provider = Arc::new(ScriptedProvider::new(["never"]));
        let ticket = ticket(2);
        ticket.token.cancel();
        let (tx, rx) = mpsc::channel();

        run_exchange(provider, ticket, tx).await;

        assert_eq!(rx.try_iter().count(), 0);
    }
}
