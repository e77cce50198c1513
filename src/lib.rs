//! Narrow a document, its git changes or its diagnostics down to a single
//! line and jump there.
//!
//! Every command is one [`Source`] driven through the same loop,
//! [`narrow::run`], against a [`Host`] that supplies the editor, the
//! filter surface and the settings. [`headless::HeadlessHost`] is a host
//! backed by the filesystem.
//!
//! ```no_run
//! use narrow::{Command, headless::{Buffer, HeadlessHost, Step}};
//!
//! let buffer = Buffer::open("src/lib.rs".as_ref()).unwrap();
//! let mut host = HeadlessHost::new(vec![".".into()])
//!     .with_editor(buffer)
//!     .with_script([Step::Type("error".into()), Step::Accept]);
//! Command::NarrowFile.run(&mut host);
//! ```

use error_set::error_set;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod commands;
pub mod diff;
pub mod git;
pub mod headless;
pub mod host;
pub mod item;
pub mod narrow;
pub mod options;
pub mod source;

pub use commands::Command;
pub use git::GitError;
pub use host::{Diagnostic, Editor, FilterSurface, Host, HostError};
pub use item::{Icon, Item, Target};
pub use narrow::Outcome;
pub use options::{ConfigError, Options, Settings};
pub use source::{Setup, Source, SourceError};

error_set! {
    /// Top-level error for the narrow binary
    NarrowError := {
        #[display("Failed to read diagnostics {path}: {message}")]
        DiagnosticsRead { path: String, message: String },
        #[display("Invalid diagnostics {path}: {message}")]
        DiagnosticsParse { path: String, message: String },
        #[display("Line {line} is past the end of {path}")]
        LineOutOfRange { path: String, line: u32 },
        #[display("Failed to write output: {message}")]
        Output { message: String },
        ConfigError(ConfigError),
        GitError(GitError),
        HostError(HostError),
    }
}

/// Settings file looked up in the workspace root
pub const SETTINGS_FILE: &str = ".narrow.toml";

/// Read diagnostics from a JSON object keyed by file path.
///
/// Relative keys are resolved against `root`:
///
/// ```json
/// { "src/main.rs": [ { "range": { "start": { "line": 3, "character": 4 },
///                                  "end": { "line": 3, "character": 9 } },
///                      "severity": "error", "message": "cannot find value" } ] }
/// ```
pub fn load_diagnostics(
    path: &Path,
    root: &Path,
) -> Result<HashMap<PathBuf, Vec<Diagnostic>>, NarrowError> {
    let text = std::fs::read_to_string(path).map_err(|e| NarrowError::DiagnosticsRead {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let by_file: HashMap<PathBuf, Vec<Diagnostic>> =
        serde_json::from_str(&text).map_err(|e| NarrowError::DiagnosticsParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    Ok(by_file
        .into_iter()
        .map(|(file, diagnostics)| (root.join(file), diagnostics))
        .collect())
}
