//! # Application State
//!
//! Core business state for Parley. Presentation state (blocks, scroll
//! position, input text) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── provider: Arc<dyn CompletionProvider>  // LLM transport
//! ├── session: Session                       // history + exchange in flight
//! ├── status_message: String                 // title bar text
//! └── show_line_numbers: bool                // gutter on code blocks
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::core::config::ResolvedConfig;
use crate::core::session::Session;
use crate::inference::{CompletionProvider, History};

pub struct App {
    pub provider: Arc<dyn CompletionProvider>,
    pub session: Session,
    pub status_message: String,
    pub show_line_numbers: bool,
}

impl App {
    pub fn new(provider: Arc<dyn CompletionProvider>, model_name: String, history: History) -> Self {
        Self {
            provider,
            session: Session::new(model_name, history),
            status_message: String::from("Welcome to Parley!"),
            show_line_numbers: false,
        }
    }

    pub fn from_config(provider: Arc<dyn CompletionProvider>, config: &ResolvedConfig) -> Self {
        let mut app = Self::new(
            provider,
            config.model_name.clone(),
            History::new(config.system_prompt.clone()),
        );
        app.show_line_numbers = config.show_line_numbers;
        app
    }

    pub fn model_name(&self) -> &str {
        self.session.model()
    }

    /// True while a response is streaming.
    pub fn is_loading(&self) -> bool {
        self.session.is_streaming()
    }
}
