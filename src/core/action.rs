//! # Actions
//!
//! Everything that can happen in Parley becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! A token arrives from the model? That's `Action::Delta { .. }`.
//!
//! `update()` applies an action to the [`App`] and returns an [`Effect`]
//! describing any I/O the adapter has to perform. The only output `update()`
//! produces itself is widget operations on the [`WidgetSink`] it is handed.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::debug;

use crate::core::exchange::{ExchangeId, ExchangeTicket};
use crate::core::render::WidgetSink;
use crate::core::state::App;

#[derive(Debug, Clone)]
pub enum Action {
    /// The user submitted the input box.
    Submit(String),
    /// A content delta for an exchange.
    Delta { exchange: ExchangeId, text: String },
    /// The transport is done with an exchange. `error` is set if it failed.
    ExchangeFinished {
        exchange: ExchangeId,
        error: Option<String>,
    },
    /// Stop the exchange in flight.
    Cancel,
    /// Start a fresh chat session.
    Reset,
    Quit,
}

/// Side effects requested by [`update`].
#[derive(Debug)]
pub enum Effect {
    None,
    /// Run this exchange on the transport.
    SpawnExchange(ExchangeTicket),
    /// Drop every block from the transcript.
    ClearTranscript,
    Quit,
}

pub fn update(app: &mut App, action: Action, sink: &mut dyn WidgetSink) -> Effect {
    match action {
        Action::Submit(text) => match app.session.submit(&text) {
            Some(ticket) => {
                app.status_message = String::from("Waiting for response...");
                Effect::SpawnExchange(ticket)
            }
            None => Effect::None,
        },
        Action::Delta { exchange, text } => {
            if app.session.apply_delta(exchange, &text, sink) {
                app.status_message = String::from("Receiving...");
            }
            Effect::None
        }
        Action::ExchangeFinished { exchange, error } => {
            if app.session.finish(exchange, sink) {
                app.status_message = match error {
                    Some(e) => format!("Error: {e}"),
                    None => String::from("Ready"),
                };
            } else {
                debug!("Finish for stale exchange {} ignored", exchange);
            }
            Effect::None
        }
        Action::Cancel => {
            if app.session.cancel() {
                app.status_message = String::from("Cancelled");
            }
            Effect::None
        }
        Action::Reset => {
            app.session.reset();
            app.status_message = String::from("New chat session");
            Effect::ClearTranscript
        }
        Action::Quit => Effect::Quit,
    }
}
