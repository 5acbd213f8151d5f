//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates terminal events into core `Action` values.
//!
//! This is the only module that knows about ratatui and crossterm. It is
//! also the session's widget sink: `Transcript` receives the blocks the
//! render driver creates.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (response streaming, copy flash): draws every ~80ms.
//! - **Idle**: sleeps up to 500ms, only redraws on events or resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod clipboard;
mod component;
mod components;
mod event;
pub mod highlight;
pub mod keymap;
pub mod markdown;
pub mod transcript;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::layout::Rect;

use crate::core::action::{Action, Effect, update};
use crate::core::config::{BindingAction, ResolvedConfig};
use crate::core::exchange::run_exchange;
use crate::core::render::CopySink;
use crate::core::state::App;
use crate::inference::{CompletionProvider, OpenAiProvider};
use crate::tui::clipboard::SystemClipboard;
use crate::tui::component::EventHandler;
use crate::tui::components::{BlockListState, InputBox, InputEvent};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::keymap::Keymap;
use crate::tui::transcript::Transcript;

/// Where keystrokes go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Text editing in the input box.
    Input,
    /// Up/Down select blocks for copying. Typing switches back to Input.
    Transcript,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub transcript: Transcript,
    pub block_list: BlockListState,
    pub input_box: InputBox,
    pub focus: Focus,
    pub keymap: Keymap,
}

impl TuiState {
    pub fn new(keymap: Keymap) -> Self {
        Self {
            transcript: Transcript::new(),
            block_list: BlockListState::new(),
            input_box: InputBox::new(),
            focus: Focus::Input, // User expects to type immediately
            keymap,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        let bindings = crate::core::config::default_keybindings();
        match Keymap::from_bindings(&bindings) {
            Ok(keymap) => Self::new(keymap),
            Err(e) => panic!("default bindings must build: {e}"),
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.input_box.focused = focus == Focus::Input;
        match focus {
            Focus::Input => self.block_list.selected_index = None,
            Focus::Transcript => {
                self.block_list.selected_index = self.transcript.len().checked_sub(1);
                self.block_list.scroll_to_selected();
            }
        }
    }

    fn clear(&mut self) {
        self.transcript.clear();
        self.block_list.clear();
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // The Kitty keyboard protocol lets Shift+Enter be told apart from
        // Enter; terminals without it ignore the request.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn build_provider(config: &ResolvedConfig) -> Arc<dyn CompletionProvider> {
    Arc::new(OpenAiProvider::new(
        config.api_key.clone(),
        Some(config.base_url.clone()),
    ))
}

/// Applies a binding or editing event. Returns the effect the loop must
/// carry out, if any.
fn handle_event(
    app: &mut App,
    tui: &mut TuiState,
    event: TuiEvent,
    frame_area: Rect,
    clipboard: &mut dyn CopySink,
) -> Option<Effect> {
    match event {
        TuiEvent::Resize => None,
        TuiEvent::Binding(BindingAction::Quit) => Some(update(app, Action::Quit, &mut tui.transcript)),
        TuiEvent::Binding(BindingAction::ResetChatSession) => {
            Some(update(app, Action::Reset, &mut tui.transcript))
        }
        TuiEvent::Binding(BindingAction::Cancel) => {
            if app.is_loading() {
                update(app, Action::Cancel, &mut tui.transcript);
            } else if tui.focus == Focus::Transcript {
                tui.set_focus(Focus::Input);
            }
            None
        }
        TuiEvent::Binding(BindingAction::FocusInput) => {
            let next = match tui.focus {
                Focus::Input => Focus::Transcript,
                Focus::Transcript => Focus::Input,
            };
            tui.set_focus(next);
            None
        }
        TuiEvent::Binding(BindingAction::ToggleInput) => {
            tui.input_box.toggle_expanded();
            None
        }
        TuiEvent::Binding(BindingAction::CopySelected) => {
            if let Some(idx) = tui.block_list.selected_index {
                copy_block(app, tui, idx, clipboard);
            }
            None
        }
        TuiEvent::MouseMove(_, row) => {
            if tui.focus == Focus::Input {
                tui.block_list.selected_index = ui::hit_test_block(row, frame_area, tui);
            }
            None
        }
        TuiEvent::MouseClick(_, row) => {
            if let Some(idx) = ui::hit_test_block(row, frame_area, tui) {
                copy_block(app, tui, idx, clipboard);
            }
            None
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.block_list.handle_event(&event);
            None
        }
        TuiEvent::CursorUp if tui.focus == Focus::Transcript => {
            tui.block_list.select_previous(tui.transcript.len());
            None
        }
        TuiEvent::CursorDown if tui.focus == Focus::Transcript => {
            tui.block_list.select_next(tui.transcript.len());
            None
        }
        TuiEvent::Binding(BindingAction::Submit) if tui.focus == Focus::Transcript => {
            tui.set_focus(Focus::Input);
            None
        }
        _ => {
            if tui.focus == Focus::Transcript {
                if !matches!(event, TuiEvent::InputChar(_) | TuiEvent::Paste(_)) {
                    return None;
                }
                tui.set_focus(Focus::Input);
            }
            match tui.input_box.handle_event(&event)? {
                InputEvent::Submit(text) => submit(app, tui, text),
                InputEvent::ContentChanged => None,
            }
        }
    }
}

fn submit(app: &mut App, tui: &mut TuiState, text: String) -> Option<Effect> {
    let effect = update(app, Action::Submit(text.clone()), &mut tui.transcript);
    if matches!(effect, Effect::SpawnExchange(_)) {
        tui.transcript.push_prompt(&text);
        tui.block_list.stick_to_bottom = true;
    }
    Some(effect)
}

fn copy_block(app: &mut App, tui: &mut TuiState, idx: usize, clipboard: &mut dyn CopySink) {
    if tui.transcript.copy_block(idx, clipboard, Instant::now()) {
        app.status_message = String::from("Copied to clipboard");
    }
}

/// Carries out an effect. Returns true when the app should quit.
fn apply_effect(effect: Effect, app: &App, tui: &mut TuiState, tx: &mpsc::Sender<Action>) -> bool {
    match effect {
        Effect::None => false,
        Effect::SpawnExchange(ticket) => {
            info!("Spawning exchange {}", ticket.id);
            tokio::spawn(run_exchange(app.provider.clone(), ticket, tx.clone()));
            false
        }
        Effect::ClearTranscript => {
            tui.clear();
            false
        }
        Effect::Quit => true,
    }
}

pub fn run(config: ResolvedConfig, keymap: Keymap) -> std::io::Result<()> {
    let provider = build_provider(&config);
    let mut app = App::from_config(provider, &config);
    let mut tui = TuiState::new(keymap);
    let mut clipboard = SystemClipboard;

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Actions from exchange tasks
    let (tx, rx) = mpsc::channel();

    let start_time = Instant::now();
    let mut needs_redraw = true;

    'main: loop {
        let animating = app.is_loading() || tui.transcript.is_flashing(Instant::now());
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout, &tui.keymap);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process the first event and drain everything pending before the next draw
        let pending = std::iter::from_fn(|| poll_event_immediate(&tui.keymap)).collect::<Vec<_>>();
        for event in first_event.into_iter().chain(pending) {
            let frame_area = terminal.get_frame().area();
            if let Some(effect) = handle_event(&mut app, &mut tui, event, frame_area, &mut clipboard)
                && apply_effect(effect, &app, &mut tui, &tx)
            {
                break 'main;
            }
        }

        // Deltas are rendered one at a time, in arrival order
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            let effect = update(&mut app, action, &mut tui.transcript);
            if apply_effect(effect, &app, &mut tui, &tx) {
                break 'main;
            }
        }
    }

    if app.session.cancel() {
        warn!("Quit with a response still streaming; partial reply kept in history");
    }
    ratatui::restore();
    info!("Parley shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exchange::ExchangeId;
    use crate::test_support::{FakeClipboard, test_app};
    use crate::tui::transcript::BlockKind;

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 80,
        height: 24,
    };

    fn send(app: &mut App, tui: &mut TuiState, event: TuiEvent) -> Option<Effect> {
        handle_event(app, tui, event, AREA, &mut FakeClipboard::default())
    }

    fn type_text(app: &mut App, tui: &mut TuiState, text: &str) {
        for c in text.chars() {
            send(app, tui, TuiEvent::InputChar(c));
        }
    }

    fn stream(app: &mut App, tui: &mut TuiState, id: ExchangeId, deltas: &[&str]) {
        for text in deltas {
            let delta = Action::Delta {
                exchange: id,
                text: text.to_string(),
            };
            update(app, delta, &mut tui.transcript);
        }
    }

    #[test]
    fn submit_echoes_prompt_and_spawns_exchange() {
        let mut app = test_app();
        let mut tui = TuiState::for_tests();
        type_text(&mut app, &mut tui, "hi there");

        let effect = send(&mut app, &mut tui, TuiEvent::Binding(BindingAction::Submit));
        assert!(matches!(effect, Some(Effect::SpawnExchange(_))));
        assert_eq!(tui.transcript.len(), 1);
        assert_eq!(tui.transcript.get(0).unwrap().kind, BlockKind::Prompt);
        assert!(tui.input_box.buffer.is_empty());
        assert!(app.is_loading());
    }

    #[test]
    fn streamed_reply_lands_after_prompt() {
        let mut app = test_app();
        let mut tui = TuiState::for_tests();
        type_text(&mut app, &mut tui, "code please");
        let Some(Effect::SpawnExchange(ticket)) =
            send(&mut app, &mut tui, TuiEvent::Binding(BindingAction::Submit))
        else {
            panic!("expected an exchange");
        };

        stream(&mut app, &mut tui, ticket.id, &["Sure:\n```py\n", "print(1)\n", "```\n"]);
        let finished = Action::ExchangeFinished {
            exchange: ticket.id,
            error: None,
        };
        update(&mut app, finished, &mut tui.transcript);

        let kinds: Vec<_> = tui.transcript.blocks().iter().map(|b| b.kind).collect();
        assert_eq!(kinds, [BlockKind::Prompt, BlockKind::Prose, BlockKind::Code]);
        assert_eq!(tui.transcript.get(2).unwrap().display, "print(1)\n");
        assert_eq!(app.status_message, "Ready");
    }

    #[test]
    fn reset_clears_transcript() {
        let mut app = test_app();
        let mut tui = TuiState::for_tests();
        tui.transcript.push_prompt("old");
        let effect = send(&mut app, &mut tui, TuiEvent::Binding(BindingAction::ResetChatSession))
            .unwrap();
        let (tx, _rx) = mpsc::channel();
        assert!(!apply_effect(effect, &app, &mut tui, &tx));
        assert!(tui.transcript.is_empty());
        assert_eq!(app.session.history().len(), 1);
    }

    #[test]
    fn quit_binding_quits() {
        let mut app = test_app();
        let mut tui = TuiState::for_tests();
        let effect = send(&mut app, &mut tui, TuiEvent::Binding(BindingAction::Quit)).unwrap();
        let (tx, _rx) = mpsc::channel();
        assert!(apply_effect(effect, &app, &mut tui, &tx));
    }

    #[test]
    fn cancel_stops_streaming() {
        let mut app = test_app();
        let mut tui = TuiState::for_tests();
        type_text(&mut app, &mut tui, "q");
        send(&mut app, &mut tui, TuiEvent::Binding(BindingAction::Submit));
        assert!(app.is_loading());

        send(&mut app, &mut tui, TuiEvent::Binding(BindingAction::Cancel));
        assert!(!app.is_loading());
        assert_eq!(app.status_message, "Cancelled");
    }

    #[test]
    fn transcript_focus_selects_and_copies() {
        let mut app = test_app();
        let mut tui = TuiState::for_tests();
        tui.transcript.push_prompt("first");
        tui.transcript.push_prompt("second");
        let mut clipboard = FakeClipboard::default();

        handle_event(&mut app, &mut tui, TuiEvent::Binding(BindingAction::FocusInput), AREA, &mut clipboard);
        assert_eq!(tui.focus, Focus::Transcript);
        assert_eq!(tui.block_list.selected_index, Some(1));

        handle_event(&mut app, &mut tui, TuiEvent::CursorUp, AREA, &mut clipboard);
        handle_event(&mut app, &mut tui, TuiEvent::Binding(BindingAction::CopySelected), AREA, &mut clipboard);
        assert_eq!(clipboard.copied, ["first"]);
        assert_eq!(app.status_message, "Copied to clipboard");

        // Typing goes back to the input box
        handle_event(&mut app, &mut tui, TuiEvent::InputChar('x'), AREA, &mut clipboard);
        assert_eq!(tui.focus, Focus::Input);
        assert_eq!(tui.input_box.buffer, "x");
        assert_eq!(tui.block_list.selected_index, None);
    }

    #[test]
    fn failed_copy_leaves_status() {
        let mut app = test_app();
        let mut tui = TuiState::for_tests();
        tui.transcript.push_prompt("text");
        tui.block_list.selected_index = Some(0);
        let mut clipboard = FakeClipboard {
            broken: true,
            ..Default::default()
        };
        handle_event(&mut app, &mut tui, TuiEvent::Binding(BindingAction::CopySelected), AREA, &mut clipboard);
        assert_eq!(app.status_message, "Welcome to Parley!");
    }
}
