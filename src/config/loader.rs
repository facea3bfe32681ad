//! Configuration file loading with precedence handling.

use crate::model::AppState;
use crate::state::{keys, Patch};
use crate::view_state::conversation::ConversationSettings;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TRANSCRIPT_LAYOUT_CONFIG";
/// Environment variable overriding `conversation.trust_weighted`.
pub const TRUST_WEIGHTED_ENV: &str = "TRANSCRIPT_LAYOUT_TRUST_WEIGHTED";
/// Environment variable overriding `conversation.idle_interval_ms`.
pub const IDLE_INTERVAL_ENV: &str = "TRANSCRIPT_LAYOUT_IDLE_INTERVAL_MS";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional; anything not specified keeps its default.
/// Corresponds to `~/.config/transcript-layout/config.toml`:
///
/// ```toml
/// log_file_path = "/tmp/transcript-layout.log"
/// max_input_length = 128
///
/// [layout]
/// padding = 0.1
/// num_lines = 18
///
/// [conversation]
/// idle_interval_ms = 1500
/// trust_weighted = true
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Maximum number of characters accepted by the input.
    #[serde(default)]
    pub max_input_length: Option<usize>,

    /// Layout ratios.
    #[serde(default)]
    pub layout: Option<LayoutSection>,

    /// Pagination policy.
    #[serde(default)]
    pub conversation: Option<ConversationSection>,
}

/// `[layout]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutSection {
    /// Padding around the content box.
    pub padding: Option<f32>,
    /// Lines that fit the content height.
    pub num_lines: Option<f32>,
    /// Gap between messages, in lines.
    pub num_lines_spacing: Option<f32>,
    /// Input width as a fraction of the usable width.
    pub message_width_ratio: Option<f32>,
    /// Response offset as a fraction of the usable width.
    pub counterpart_offset_ratio: Option<f32>,
    /// Cursor width as a fraction of the line height.
    pub cursor_width_ratio: Option<f32>,
    /// Font line height relative to font size.
    pub font_line_height_ratio: Option<f32>,
    /// Font family handed to the shaper.
    pub font: Option<String>,
}

/// `[conversation]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConversationSection {
    /// History messages allowed to wait off-screen.
    pub buffer_cap: Option<usize>,
    /// Milliseconds between idle ticks.
    pub idle_interval_ms: Option<u64>,
    /// Pages skipped past the visible messages when idle starts.
    pub greeting_slots: Option<u64>,
    /// Clear the screen when the history cursor wraps.
    pub clear_on_wrap: Option<bool>,
    /// Lowest page id the history backend serves.
    pub first_page: Option<u64>,
    /// Shift responses left by their trust score.
    pub trust_weighted: Option<bool>,
}

/// Resolved layout ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Padding around the content box.
    pub padding: f32,
    /// Lines that fit the content height.
    pub num_lines: f32,
    /// Gap between messages, in lines.
    pub num_lines_spacing: f32,
    /// Input width as a fraction of the usable width.
    pub message_width_ratio: f32,
    /// Response offset as a fraction of the usable width.
    pub counterpart_offset_ratio: f32,
    /// Cursor width as a fraction of the line height.
    pub cursor_width_ratio: f32,
    /// Font line height relative to font size.
    pub font_line_height_ratio: f32,
    /// Font family handed to the shaper.
    pub font: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding: 0.1,
            num_lines: 18.0,
            num_lines_spacing: 0.1,
            message_width_ratio: 0.7,
            counterpart_offset_ratio: 0.3,
            cursor_width_ratio: 0.5,
            font_line_height_ratio: 1.2,
            font: crate::view_state::input::DEFAULT_FONT.to_string(),
        }
    }
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Layout ratios.
    pub layout: LayoutConfig,
    /// Pagination policy.
    pub conversation: ConversationSettings,
    /// Maximum input length.
    pub max_input_length: usize,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            conversation: ConversationSettings::default(),
            max_input_length: 128,
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Initial store snapshot for a viewport of `width` x `height`.
    pub fn initial_state(&self, width: f32, height: f32) -> Patch {
        let layout = &self.layout;
        Patch::new()
            .with(keys::APP_STATE, AppState::Loading)
            .with(keys::VIEWPORT_WIDTH, width)
            .with(keys::VIEWPORT_HEIGHT, height)
            .with(keys::PADDING, layout.padding)
            .with(keys::NUM_LINES, layout.num_lines)
            .with(keys::NUM_LINES_SPACING, layout.num_lines_spacing)
            .with(keys::MESSAGE_WIDTH_RATIO, layout.message_width_ratio)
            .with(keys::COUNTERPART_OFFSET_RATIO, layout.counterpart_offset_ratio)
            .with(keys::CURSOR_WIDTH_RATIO, layout.cursor_width_ratio)
            .with(keys::FONT_LINE_HEIGHT_RATIO, layout.font_line_height_ratio)
            .with(keys::FONT, layout.font.as_str())
            .with(keys::TRUST_WEIGHTED, self.conversation.trust_weighted)
            .with(keys::MAX_INPUT_LENGTH, self.max_input_length)
            .with(keys::INPUT, "")
            .with(keys::CURSOR_POS, 0usize)
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/transcript-layout/transcript-layout.log` on Linux,
/// or the platform state directory elsewhere. Falls back to the current
/// directory when no state directory exists.
pub fn default_log_path() -> PathBuf {
    match dirs::state_dir() {
        Some(state_dir) => state_dir
            .join("transcript-layout")
            .join("transcript-layout.log"),
        None => PathBuf::from("transcript-layout.log"),
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/transcript-layout/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("transcript-layout").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `TRANSCRIPT_LAYOUT_CONFIG` environment variable
/// 3. Default path `~/.config/transcript-layout/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    match default_config_path() {
        Some(default_path) => load_config_file(default_path),
        None => Ok(None),
    }
}

/// Merge config file into defaults to create resolved config.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    let layout = config.layout.unwrap_or_default();
    let conversation = config.conversation.unwrap_or_default();
    let d = defaults.layout;
    let c = defaults.conversation;

    ResolvedConfig {
        layout: LayoutConfig {
            padding: layout.padding.unwrap_or(d.padding),
            num_lines: layout.num_lines.unwrap_or(d.num_lines),
            num_lines_spacing: layout.num_lines_spacing.unwrap_or(d.num_lines_spacing),
            message_width_ratio: layout.message_width_ratio.unwrap_or(d.message_width_ratio),
            counterpart_offset_ratio: layout
                .counterpart_offset_ratio
                .unwrap_or(d.counterpart_offset_ratio),
            cursor_width_ratio: layout.cursor_width_ratio.unwrap_or(d.cursor_width_ratio),
            font_line_height_ratio: layout
                .font_line_height_ratio
                .unwrap_or(d.font_line_height_ratio),
            font: layout.font.unwrap_or(d.font),
        },
        conversation: ConversationSettings {
            buffer_cap: conversation.buffer_cap.unwrap_or(c.buffer_cap),
            idle_interval: conversation
                .idle_interval_ms
                .map_or(c.idle_interval, Duration::from_millis),
            greeting_slots: conversation.greeting_slots.unwrap_or(c.greeting_slots),
            clear_on_wrap: conversation.clear_on_wrap.unwrap_or(c.clear_on_wrap),
            first_page: conversation.first_page.unwrap_or(c.first_page),
            trust_weighted: conversation.trust_weighted.unwrap_or(c.trust_weighted),
        },
        max_input_length: config.max_input_length.unwrap_or(defaults.max_input_length),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `TRANSCRIPT_LAYOUT_TRUST_WEIGHTED`: `true`/`false`/`1`/`0`
/// - `TRANSCRIPT_LAYOUT_IDLE_INTERVAL_MS`: milliseconds
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Some(flag) = std::env::var(TRUST_WEIGHTED_ENV).ok().and_then(|v| parse_flag(&v)) {
        config.conversation.trust_weighted = flag;
    }

    if let Some(ms) = std::env::var(IDLE_INTERVAL_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        config.conversation.idle_interval = Duration::from_millis(ms);
    }

    config
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest).
/// Only flags the user actually set are applied.
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    trust_weighted_override: Option<bool>,
    idle_interval_override: Option<u64>,
) -> ResolvedConfig {
    if let Some(flag) = trust_weighted_override {
        config.conversation.trust_weighted = flag;
    }

    if let Some(ms) = idle_interval_override {
        config.conversation.idle_interval = Duration::from_millis(ms);
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
