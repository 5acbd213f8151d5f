//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as props:
//! - `TitleBar`: model name, status, streaming spinner
//! - `BlockView`: one transcript block (prompt, prose or code)
//! - `Footer`: visible key bindings
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: prompt editor, collapsible
//! - `BlockList`: scrollable transcript with layout caching
//!
//! ## Props-Based Data Flow
//!
//! Components receive external data as props, never by reaching into the
//! `App`. This keeps dependencies explicit and components testable with
//! ratatui's `TestBackend`:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new(app.model_name().to_string(), app.status_message.clone());
//! title_bar.render(frame, area);
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs          (this file)
//! ├── title_bar.rs    (top status bar)
//! ├── block.rs        (single block renderer)
//! ├── block_list.rs   (scrollable block container)
//! ├── footer.rs       (key binding hints)
//! └── input_box/      (text input)
//! ```

pub mod block;
pub mod block_list;
mod footer;
pub mod input_box;
mod title_bar;

pub use block_list::{BlockList, BlockListState};
pub use footer::Footer;
pub use input_box::{InputBox, InputEvent};
pub use title_bar::TitleBar;
