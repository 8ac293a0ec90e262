//! Chat bubble rendering: sanitizer, formatters, dialogs and terminal adapters.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub mod core;
pub mod tui;

#[cfg(test)]
pub mod test_support;

/// How the CLI prints a rebuilt message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Serialized markup of the rebuilt fragment.
    #[default]
    Html,
    /// The fragment tree, including attached listeners.
    Json,
    /// What the reader sees: text content only.
    Text,
}

/// Terminal color theme. Drives markdown code highlighting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(ThemeMode::Dark),
            "light" => Some(ThemeMode::Light),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_names_are_case_insensitive() {
        assert_eq!(ThemeMode::from_name("Light"), Some(ThemeMode::Light));
        assert_eq!(ThemeMode::from_name(" DARK "), Some(ThemeMode::Dark));
        assert_eq!(ThemeMode::from_name("sepia"), None);
    }
}
