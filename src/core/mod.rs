//! # Core Application Logic
//!
//! Parley's business logic. It knows nothing about any specific UI technology;
//! the TUI talks to it through [`render::WidgetSink`] and [`action::update`].
//!
//! ```text
//!   deltas ──► segment::parse ──► render::RenderState ──► WidgetSink
//!                     ▲                                     (tui::Transcript)
//!                     │
//!   session::Session ─┴─ owns History + the exchange in flight
//! ```
//!
//! ## Modules
//!
//! - [`segment`]: splits a response buffer into prose and fenced code
//! - [`render`]: maps successive parses onto widget create/update calls
//! - [`session`]: conversation history and exchange lifecycle
//! - [`exchange`]: runs one streamed request on a background task
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`state`]: the `App` struct
//! - [`config`]: config file, environment and CLI resolution

pub mod action;
pub mod config;
pub mod exchange;
pub mod render;
pub mod segment;
pub mod session;
pub mod state;
