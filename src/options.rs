//! User-configurable behavior flags.
//!
//! Settings live in the `[narrow]` table of a TOML file. Each key is read on
//! its own with a default, so a missing or mistyped key never makes the
//! others unusable:
//!
//! ```toml
//! [narrow]
//! sortOrder = "default"
//! useWordUnderCursorAsInitialSearchTerm = true
//! cursorLocationAfterAccept = "startOfMatch"
//! activeLineViewportRevealType = "InCenterIfOutsideViewport"
//! ```

use error_set::error_set;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::host::RevealType;

/// Table holding the settings namespace
pub const NAMESPACE: &str = "narrow";

error_set! {
    /// Errors from loading the settings file
    ConfigError := {
        #[display("Failed to read settings {path}: {message}")]
        Read { path: String, message: String },
        #[display("Invalid settings file {path}: {message}")]
        Parse { path: String, message: String },
    }
}

/// Where the cursor lands inside the chosen line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CursorLocation {
    #[default]
    StartOfLine,
    StartOfLineIgnoreWhitespace,
    StartOfMatch,
}

/// Order the surface shows items in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Keep the order the source produced
    #[default]
    Source,
    /// Let the surface sort matches by label
    Label,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub sort_order: SortOrder,
    pub use_word_under_cursor_as_initial_search_term: bool,
    pub cursor_location_after_accept: CursorLocation,
    pub active_line_viewport_reveal_type: RevealType,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            sort_order: SortOrder::Source,
            use_word_under_cursor_as_initial_search_term: true,
            cursor_location_after_accept: CursorLocation::StartOfLine,
            active_line_viewport_reveal_type: RevealType::InCenter,
        }
    }
}

impl Options {
    /// Resolve every option from `settings`, falling back per key.
    pub fn read(settings: &Settings) -> Self {
        let defaults = Options::default();
        let sort_order = match settings.get::<String>("sortOrder") {
            None => defaults.sort_order,
            Some(order) if order == "default" => SortOrder::Source,
            Some(_) => SortOrder::Label,
        };

        Options {
            sort_order,
            use_word_under_cursor_as_initial_search_term: settings
                .get("useWordUnderCursorAsInitialSearchTerm")
                .unwrap_or(defaults.use_word_under_cursor_as_initial_search_term),
            cursor_location_after_accept: settings
                .get("cursorLocationAfterAccept")
                .unwrap_or(defaults.cursor_location_after_accept),
            active_line_viewport_reveal_type: settings
                .get("activeLineViewportRevealType")
                .unwrap_or(defaults.active_line_viewport_reveal_type),
        }
    }
}

/// Key-value view of the settings namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: toml::Table,
}

impl Settings {
    pub fn new(values: toml::Table) -> Self {
        Settings { values }
    }

    /// Load the `[narrow]` table of a TOML file. A missing file yields empty
    /// settings.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        };
        Self::parse(&text).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse TOML text and keep its `[narrow]` table
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut document: toml::Table = toml::from_str(text).map_err(|e| e.to_string())?;
        let values = match document.remove(NAMESPACE) {
            Some(toml::Value::Table(table)) => table,
            Some(_) => return Err(format!("`{NAMESPACE}` must be a table")),
            None => toml::Table::new(),
        };
        Ok(Settings { values })
    }

    /// Typed value of `key`, or `None` when absent or of the wrong shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?.clone();
        match value.try_into() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring invalid setting");
                None
            }
        }
    }
}
