//! The editor surface the narrowing loop drives.
//!
//! A host supplies documents, selection and viewport control, diagnostics and
//! an incremental filter surface. The loop never talks to a concrete UI; see
//! [`crate::headless`] for the in-process implementation.

use error_set::error_set;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::item::Item;
use crate::options::Settings;

error_set! {
    /// Errors a host reports back to the loop
    HostError := {
        #[display("Failed to open {path}: {message}")]
        OpenFailed { path: String, message: String },
    }
}

/// Zero-based line and column (columns count characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    /// The whole of line `line`, `len` characters long
    pub fn line(line: u32, len: u32) -> Self {
        Range::new(Position::new(line, 0), Position::new(line, len))
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Cursor state: `anchor` stays put, `active` is where the caret is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Selection {
            anchor: position,
            active: position,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    pub fn range(&self) -> Range {
        Range::new(
            self.anchor.min(self.active),
            self.anchor.max(self.active),
        )
    }
}

/// Line terminator of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eol {
    #[default]
    Lf,
    CrLf,
}

impl Eol {
    pub fn as_str(self) -> &'static str {
        match self {
            Eol::Lf => "\n",
            Eol::CrLf => "\r\n",
        }
    }

    /// The terminator most lines end with; ties and unterminated text are `Lf`
    pub fn detect(text: &str) -> Self {
        let crlf = text.matches("\r\n").count();
        let lf = text.matches('\n').count() - crlf;
        if crlf > lf { Eol::CrLf } else { Eol::Lf }
    }

    /// Rewrite every line ending in `text` to this terminator
    pub fn normalize(self, text: &str) -> String {
        let lf = text.replace("\r\n", "\n");
        match self {
            Eol::Lf => lf,
            Eol::CrLf => lf.replace('\n', "\r\n"),
        }
    }
}

/// Viewport scrolling policy for a reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RevealType {
    Default,
    #[default]
    InCenter,
    InCenterIfOutsideViewport,
    AtTop,
}

/// Diagnostic severity; lower is more severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Handle of a line decoration style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecorationId(pub u64);

/// How a document is shown when opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Transient tab that keeps focus on the filter surface
    Preview,
    /// Regular tab that takes focus
    Pinned,
}

/// A text document shown in the editor.
pub trait Editor {
    fn path(&self) -> Option<&Path>;
    fn text(&self) -> &str;
    fn eol(&self) -> Eol;
    fn selection(&self) -> Selection;
    fn set_selection(&mut self, selection: Selection);
    fn reveal(&mut self, range: Range, reveal: RevealType);
    /// Replace the ranges painted with `decoration`; empty clears them
    fn set_decorations(&mut self, decoration: DecorationId, ranges: &[Range]);

    /// Text of zero-based line `index`
    fn line(&self, index: u32) -> Option<&str> {
        self.text().split(self.eol().as_str()).nth(index as usize)
    }

    /// Range of the word (alphanumerics and `_`) touching `position`
    fn word_range_at(&self, position: Position) -> Option<Range> {
        let chars: Vec<char> = self.line(position.line)?.chars().collect();
        let is_word = |c: &char| c.is_alphanumeric() || *c == '_';
        let at = position.character as usize;
        let touches = |i: usize| chars.get(i).is_some_and(is_word);
        if !touches(at) && !(at > 0 && touches(at - 1)) {
            return None;
        }
        let mut start = at.min(chars.len());
        while start > 0 && touches(start - 1) {
            start -= 1;
        }
        let mut end = at;
        while touches(end) {
            end += 1;
        }
        Some(Range::line(position.line, end as u32).with_start(start as u32))
    }

    /// Text covered by `range`, joined with the document's terminator
    fn text_in(&self, range: Range) -> String {
        let eol = self.eol().as_str();
        (range.start.line..=range.end.line)
            .filter_map(|line| {
                let text = self.line(line)?;
                let from = if line == range.start.line { range.start.character } else { 0 };
                let to = if line == range.end.line { Some(range.end.character) } else { None };
                Some(slice_chars(text, from, to))
            })
            .collect::<Vec<_>>()
            .join(eol)
    }
}

impl Range {
    fn with_start(mut self, character: u32) -> Self {
        self.start.character = character;
        self
    }
}

fn slice_chars(text: &str, from: u32, to: Option<u32>) -> String {
    let chars = text.chars().skip(from as usize);
    match to {
        Some(to) => chars.take(to.saturating_sub(from) as usize).collect(),
        None => chars.collect(),
    }
}

/// Events a filter surface reports, in the order they happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The highlighted item changed; the index is into the items last set
    ActiveChanged(Option<usize>),
    /// The user confirmed the highlighted item
    Accepted(Option<usize>),
    /// The surface was dismissed, by the user or by `hide`
    Hidden,
}

/// An incremental filter-and-select widget.
pub trait FilterSurface {
    fn set_placeholder(&mut self, placeholder: &str);
    fn set_value(&mut self, value: &str);
    /// Current filter text
    fn value(&self) -> String;
    fn set_busy(&mut self, busy: bool);
    /// Whether the surface may reorder matches alphabetically
    fn set_sort_by_label(&mut self, sort: bool);
    fn set_match_on_description(&mut self, enabled: bool);
    fn set_items(&mut self, items: &[Item]);
    fn set_active(&mut self, index: usize);
    fn show(&mut self);
    fn hide(&mut self);
    fn dispose(&mut self);
    /// Next user or surface event; `None` once the surface has nothing left
    /// to report
    fn next_event(&mut self) -> Option<SurfaceEvent>;
}

/// Everything the narrowing loop needs from the editor.
pub trait Host {
    /// Settings as they are right now
    fn settings(&self) -> Settings;
    fn active_editor(&mut self) -> Option<&mut dyn Editor>;
    fn workspace_folders(&self) -> &[PathBuf];
    fn diagnostics(&self, path: &Path) -> Vec<Diagnostic>;
    /// Open `path` and make it the active editor
    fn open_document(&mut self, path: &Path, mode: OpenMode) -> Result<&mut dyn Editor, HostError>;
    fn show_error(&mut self, message: &str);
    fn create_surface(&mut self) -> Box<dyn FilterSurface>;
    fn create_decoration(&mut self) -> DecorationId;
    /// Clear `decoration` from every editor and forget it
    fn release_decoration(&mut self, decoration: DecorationId);

    /// Workspace folder containing `path`
    fn workspace_folder_for(&self, path: &Path) -> Option<PathBuf> {
        self.workspace_folders()
            .iter()
            .filter(|folder| path.starts_with(folder))
            .max_by_key(|folder| folder.components().count())
            .cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::headless::Buffer;

    #[test]
    fn eol_detection() {
        assert_eq!(Eol::detect("a\nb\n"), Eol::Lf);
        assert_eq!(Eol::detect("a\r\nb\r\n"), Eol::CrLf);
        assert_eq!(Eol::detect(""), Eol::Lf);
    }

    #[test]
    fn mixed_endings_follow_the_majority() {
        assert_eq!(Eol::detect("a\r\nb\nc\r\n"), Eol::CrLf);
        assert_eq!(Eol::detect("a\r\nb\nc\n"), Eol::Lf);
        assert_eq!(Eol::detect("a\r\nb\n"), Eol::Lf);
        assert_eq!(Eol::CrLf.normalize("a\r\nb\nc\r\n"), "a\r\nb\r\nc\r\n");
        assert_eq!(Eol::Lf.normalize("a\r\nb\nc"), "a\nb\nc");
    }

    #[test]
    fn severity_orders_errors_first() {
        assert!(Severity::Error < Severity::Warning);
        assert!(Severity::Warning < Severity::Information);
    }

    #[test]
    fn word_under_cursor() {
        let buffer = Buffer::new(None, "let some_value = 1;\n");
        let range = buffer.word_range_at(Position::new(0, 6)).unwrap();
        assert_eq!(buffer.text_in(range), "some_value");
        // right after the word still counts
        let range = buffer.word_range_at(Position::new(0, 14)).unwrap();
        assert_eq!(buffer.text_in(range), "some_value");
        assert_eq!(buffer.word_range_at(Position::new(0, 15)), None);
    }

    #[test]
    fn text_across_lines() {
        let buffer = Buffer::new(None, "alpha\r\nbeta\r\ngamma");
        let range = Range::new(Position::new(0, 2), Position::new(2, 3));
        assert_eq!(buffer.text_in(range), "pha\r\nbeta\r\ngam");
        assert_eq!(buffer.line(1), Some("beta"));
    }

    #[test]
    fn selection_range_is_ordered() {
        let selection = Selection {
            anchor: Position::new(4, 2),
            active: Position::new(1, 0),
        };
        assert_eq!(selection.range().start, Position::new(1, 0));
        assert!(!selection.is_empty());
    }
}
