pub mod provider;
pub mod providers;
pub mod types;

pub use provider::{CompletionProvider, CompletionRequest, TransportError};
pub use providers::OpenAiProvider;
pub use types::{History, Message, Role, StreamChunk};
