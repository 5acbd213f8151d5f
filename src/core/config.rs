//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.parley/config.toml` (or wherever `--config` points).
//! If the default file is missing on first run, a commented-out default is
//! generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::inference::providers::openai::DEFAULT_BASE_URL;
use crate::inference::types::DEFAULT_SYSTEM_PROMPT;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub keybindings: Vec<KeyBindingEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub show_line_numbers: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// One `[[keybindings]]` table: trigger, action name, footer text.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyBindingEntry {
    pub key: String,
    pub action: String,
    pub description: Option<String>,
}

// ============================================================================
// Key Binding Actions
// ============================================================================

/// Things a key binding can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingAction {
    Submit,
    Newline,
    ResetChatSession,
    ToggleInput,
    FocusInput,
    Cancel,
    CopySelected,
    Quit,
}

impl BindingAction {
    pub const ALL: [BindingAction; 8] = [
        BindingAction::Submit,
        BindingAction::Newline,
        BindingAction::ResetChatSession,
        BindingAction::ToggleInput,
        BindingAction::FocusInput,
        BindingAction::Cancel,
        BindingAction::CopySelected,
        BindingAction::Quit,
    ];

    /// Name used in the config file.
    pub fn name(self) -> &'static str {
        match self {
            BindingAction::Submit => "submit",
            BindingAction::Newline => "newline",
            BindingAction::ResetChatSession => "reset_chat_session",
            BindingAction::ToggleInput => "toggle_input",
            BindingAction::FocusInput => "focus_input",
            BindingAction::Cancel => "cancel",
            BindingAction::CopySelected => "copy_selected",
            BindingAction::Quit => "quit",
        }
    }

    /// Footer text when the config gives none.
    pub fn default_description(self) -> &'static str {
        match self {
            BindingAction::Submit => "Send",
            BindingAction::Newline => "Newline",
            BindingAction::ResetChatSession => "New chat",
            BindingAction::ToggleInput => "Expand input",
            BindingAction::FocusInput => "Focus",
            BindingAction::Cancel => "Stop",
            BindingAction::CopySelected => "Copy",
            BindingAction::Quit => "Quit",
        }
    }
}

impl FromStr for BindingAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BindingAction::ALL
            .into_iter()
            .find(|action| action.name() == s.trim())
            .ok_or_else(|| ConfigError::KeyBinding(format!("unknown action `{s}`")))
    }
}

/// A resolved binding. `key` is still the trigger string from the config;
/// the TUI turns it into key events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: String,
    pub action: BindingAction,
    pub description: String,
    /// Listed in the footer.
    pub show: bool,
}

impl KeyBinding {
    fn new(key: &str, action: BindingAction) -> Self {
        Self {
            key: key.to_string(),
            action,
            description: action.default_description().to_string(),
            show: true,
        }
    }

    fn hidden(mut self) -> Self {
        self.show = false;
        self
    }
}

/// Built-in bindings, in footer order.
pub fn default_keybindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding::new("enter", BindingAction::Submit),
        KeyBinding::new("alt+enter", BindingAction::Newline),
        KeyBinding::new("shift+enter", BindingAction::Newline).hidden(),
        KeyBinding::new("ctrl+r", BindingAction::ResetChatSession),
        KeyBinding::new("ctrl+e", BindingAction::ToggleInput),
        KeyBinding::new("tab", BindingAction::FocusInput),
        KeyBinding::new("esc", BindingAction::Cancel),
        KeyBinding::new("ctrl+y", BindingAction::CopySelected),
        KeyBinding::new("ctrl+q", BindingAction::Quit),
    ]
}

/// The interrupt binding. Always present, never listed.
const FORCE_QUIT_KEY: &str = "ctrl+c";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub model_name: String,
    pub system_prompt: String,
    pub show_line_numbers: bool,
    pub api_key: String,
    pub base_url: String,
    pub keybindings: Vec<KeyBinding>,
}

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    MissingApiKey,
    KeyBinding(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::MissingApiKey => write!(
                f,
                "no API key: set PARLEY_API_KEY or OPENAI_API_KEY, or `api_key` under [api] in the config file"
            ),
            ConfigError::KeyBinding(msg) => write!(f, "invalid key binding: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.parley/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".parley").join("config.toml"))
}

/// Load config from `explicit` or `~/.parley/config.toml`.
///
/// A missing default file is generated and yields `ParleyConfig::default()`.
/// A missing explicit file is an error, as is a malformed one.
pub fn load_config(explicit: Option<&Path>) -> Result<ParleyConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine home directory, using default config");
                return Ok(ParleyConfig::default());
            }
        },
    };

    if explicit.is_none() && !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ParleyConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: ParleyConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config.general);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Parley Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# model = "gpt-4o-mini"              # Or set PARLEY_MODEL, or pass --model
# system_prompt = "You are a helpful assistant."
# show_line_numbers = false

# [api]
# api_key = "sk-..."                 # Or set PARLEY_API_KEY / OPENAI_API_KEY
# base_url = "https://api.openai.com/v1"

# Key bindings replace the built-in ones for the same action.
# Actions: submit, newline, reset_chat_session, toggle_input,
#          focus_input, cancel, copy_selected, quit
#
# [[keybindings]]
# key = "ctrl+r"
# action = "reset_chat_session"
# description = "New chat"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve against the process environment.
pub fn resolve(config: &ParleyConfig, cli_model: Option<&str>) -> Result<ResolvedConfig, ConfigError> {
    resolve_with_env(config, cli_model, |key| std::env::var(key).ok())
}

/// Collapse defaults → config file → env vars → CLI into a [`ResolvedConfig`].
///
/// `env` looks up an environment variable. Empty values count as unset.
pub fn resolve_with_env<F>(
    config: &ParleyConfig,
    cli_model: Option<&str>,
    env: F,
) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    // Model: CLI → env → config → default
    let model_name = cli_model
        .map(|s| s.to_string())
        .or_else(|| env("PARLEY_MODEL"))
        .or_else(|| config.general.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    // API key: env (ours, then OpenAI's) → config
    let api_key = env("PARLEY_API_KEY")
        .or_else(|| env("OPENAI_API_KEY"))
        .or_else(|| config.api.api_key.clone().filter(|k| !k.trim().is_empty()))
        .ok_or(ConfigError::MissingApiKey)?;

    // Base URL: env → config → default
    let base_url = env("PARLEY_BASE_URL")
        .or_else(|| config.api.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let system_prompt = config
        .general
        .system_prompt
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    Ok(ResolvedConfig {
        model_name,
        system_prompt,
        show_line_numbers: config.general.show_line_numbers.unwrap_or(false),
        api_key,
        base_url,
        keybindings: resolve_keybindings(&config.keybindings)?,
    })
}

/// Merges configured bindings over the defaults. Configuring any binding for
/// an action replaces all built-in bindings for that action.
fn resolve_keybindings(entries: &[KeyBindingEntry]) -> Result<Vec<KeyBinding>, ConfigError> {
    let mut configured = Vec::with_capacity(entries.len());
    for entry in entries {
        let action: BindingAction = entry.action.parse()?;
        let key = entry.key.trim();
        if key.is_empty() {
            return Err(ConfigError::KeyBinding(format!(
                "empty key for action `{}`",
                action.name()
            )));
        }
        if key.eq_ignore_ascii_case(FORCE_QUIT_KEY) {
            return Err(ConfigError::KeyBinding(format!(
                "`{FORCE_QUIT_KEY}` is reserved for quitting"
            )));
        }
        configured.push(KeyBinding {
            key: key.to_string(),
            action,
            description: entry
                .description
                .clone()
                .unwrap_or_else(|| action.default_description().to_string()),
            show: true,
        });
    }

    let mut bindings: Vec<KeyBinding> = default_keybindings()
        .into_iter()
        .filter(|default| !configured.iter().any(|c| c.action == default.action))
        .collect();
    bindings.extend(configured);
    bindings.push(KeyBinding::new(FORCE_QUIT_KEY, BindingAction::Quit).hidden());
    Ok(bindings)
}
