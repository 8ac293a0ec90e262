//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.chatbubble/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ThemeMode;
use crate::core::formatter::DEFAULT_MENTION_CLASS;
use crate::core::flag::FlagDialog;
use crate::core::mentions::{
    DEFAULT_MENTION_ALL_LABEL, Group, MemberListType, MentionList, MentionSelection, mention_markup,
};
use crate::core::sanitizer::{
    DEFAULT_ALLOWED_ATTRIBUTES, DEFAULT_MAX_DEPTH, SanitizerOptions, clamp_depth,
};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BubbleConfig {
    #[serde(default)]
    pub sanitizer: SanitizerConfig,
    #[serde(default)]
    pub mentions: MentionsConfig,
    #[serde(default)]
    pub flag: FlagConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SanitizerConfig {
    pub max_depth: Option<usize>,
    pub max_input_bytes: Option<usize>,
    pub allowed_attributes: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MentionsConfig {
    pub class_name: Option<String>,
    pub mention_all_label: Option<String>,
    pub disable_mention_all: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FlagConfig {
    pub hide_remark_field: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub theme: Option<ThemeMode>,
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub max_depth: usize,
    pub max_input_bytes: Option<usize>,
    pub allowed_attributes: Vec<String>,
    pub mention_class: String,
    pub mention_all_label: String,
    pub disable_mention_all: bool,
    pub hide_remark_field: bool,
    pub theme: ThemeMode,
}

impl ResolvedConfig {
    pub fn sanitizer_options(&self) -> SanitizerOptions {
        SanitizerOptions {
            allowed_attributes: self.allowed_attributes.clone(),
            max_depth: self.max_depth,
            max_input_bytes: self.max_input_bytes,
        }
    }

    /// A mention picker honoring the `[mentions]` settings.
    pub fn mention_list(&self, list_type: MemberListType, group: Option<Group>) -> MentionList {
        MentionList {
            list_type,
            group,
            disable_mention_all: self.disable_mention_all,
            mention_all_label: self.mention_all_label.clone(),
            ..Default::default()
        }
    }

    /// Markup for a picked mention, using the configured class and label.
    pub fn mention_markup(&self, selection: &MentionSelection) -> String {
        mention_markup(selection, &self.mention_all_label, &self.mention_class)
    }

    /// A flag dialog honoring the `[flag]` settings.
    pub fn flag_dialog(&self, message_id: impl Into<String>) -> FlagDialog {
        let mut dialog = FlagDialog::new(message_id);
        dialog.hide_remark_field = self.hide_remark_field;
        dialog
    }
}

/// Values given on the command line. `None` = not specified.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub max_depth: Option<usize>,
    pub theme: Option<ThemeMode>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.chatbubble/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatbubble").join("config.toml"))
}

/// Load config from `~/.chatbubble/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `BubbleConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<BubbleConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(BubbleConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<BubbleConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(BubbleConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: BubbleConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# chatbubble configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [sanitizer]
# max_depth = 20                     # Or set CHATBUBBLE_MAX_DEPTH
# max_input_bytes = 65536            # Larger messages are shown as plain text
# allowed_attributes = ["class", "style", "data-uid", "data-entity-type", "data-entity-id"]

# [mentions]
# class_name = "mention"
# mention_all_label = "all"
# disable_mention_all = false

# [flag]
# hide_remark_field = false

# [display]
# theme = "dark"                     # "dark" or "light"; or set CHATBUBBLE_THEME
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

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &BubbleConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// [`resolve`] with an injectable environment lookup.
pub fn resolve_with_env(
    config: &BubbleConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Depth: CLI → env → config → default
    let max_depth = cli
        .max_depth
        .or_else(|| parse_env(&env, "CHATBUBBLE_MAX_DEPTH"))
        .or(config.sanitizer.max_depth)
        .map(clamp_depth)
        .unwrap_or(DEFAULT_MAX_DEPTH);

    // Theme: CLI → env → config → default
    let theme = cli
        .theme
        .or_else(|| env("CHATBUBBLE_THEME").and_then(|v| ThemeMode::from_name(&v)))
        .or(config.display.theme)
        .unwrap_or_default();

    ResolvedConfig {
        max_depth,
        max_input_bytes: config.sanitizer.max_input_bytes,
        allowed_attributes: config.sanitizer.allowed_attributes.clone().unwrap_or_else(|| {
            DEFAULT_ALLOWED_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect()
        }),
        mention_class: config
            .mentions
            .class_name
            .clone()
            .unwrap_or_else(|| DEFAULT_MENTION_CLASS.to_string()),
        mention_all_label: config
            .mentions
            .mention_all_label
            .clone()
            .unwrap_or_else(|| DEFAULT_MENTION_ALL_LABEL.to_string()),
        disable_mention_all: config.mentions.disable_mention_all.unwrap_or(false),
        hide_remark_field: config.flag.hide_remark_field.unwrap_or(false),
        theme,
    }
}

fn parse_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {key}={raw:?}: {e}");
            None
        }
    }
}
