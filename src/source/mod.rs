//! Item sources: pluggable strategies that feed the narrowing loop.
//!
//! A [`Source`] checks whether it applies, gathers a context, builds the
//! candidate list and decides what previewing and accepting an item does.
//! The defaults cover line items in the active editor.

mod file;
mod git;
mod git_files;
mod problems;

pub use file::FileLines;
pub use git::GitLines;
pub use git_files::{GitFiles, status_items};
pub use problems::Problems;

use error_set::error_set;

use crate::host::{DecorationId, Editor, Host, Position, Range, RevealType, Selection};
use crate::item::{Item, Target};
use crate::options::{CursorLocation, Options};

error_set! {
    /// Failures while previewing or accepting an item
    SourceError := {
        #[display("Could not open file: {label}")]
        OpenFile { label: String },
        #[display("No active editor")]
        NoEditor,
    }
}

/// Outcome of [`Source::setup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setup<C> {
    /// Preconditions failed; the command silently does nothing
    NotApplicable,
    Ready(C),
}

/// What a preview may paint and how it scrolls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preview {
    /// Decoration owned by the running invocation
    pub decoration: DecorationId,
    pub reveal: RevealType,
}

pub trait Source {
    /// State gathered by [`Source::setup`] and kept for one invocation
    type Context;

    fn placeholder(&self) -> &str {
        "Type to narrow"
    }

    fn setup(&self, host: &mut dyn Host) -> Setup<Self::Context>;

    /// Full candidate list, in the order it should be shown
    fn prepare_items(&self, host: &mut dyn Host, context: &Self::Context) -> Vec<Item>;

    fn initial_search_term(
        &self,
        _host: &mut dyn Host,
        _context: &Self::Context,
        _options: &Options,
    ) -> String {
        String::new()
    }

    /// Called when the highlighted item changes, never for the first
    /// highlight after the list is populated
    fn on_preview(
        &self,
        host: &mut dyn Host,
        item: &Item,
        _context: &Self::Context,
        preview: &Preview,
    ) -> Result<(), SourceError> {
        preview_line(host, item, preview)
    }

    /// Called once when the user confirms `item`
    fn on_accept(
        &self,
        host: &mut dyn Host,
        item: &Item,
        _context: &Self::Context,
        search: &str,
        options: &Options,
    ) -> Result<(), SourceError> {
        let Target::Line { index, .. } = item.target else {
            return Ok(());
        };
        let column = cursor_column(&item.label, search, options.cursor_location_after_accept);
        jump_to(host, index, column, options.active_line_viewport_reveal_type)
    }
}

/// Column the cursor lands on inside `label`.
///
/// `StartOfMatch` finds `search` case-insensitively and falls back to 0 when
/// it does not occur in the label.
pub fn cursor_column(label: &str, search: &str, location: CursorLocation) -> u32 {
    match location {
        CursorLocation::StartOfLine => 0,
        CursorLocation::StartOfLineIgnoreWhitespace => {
            label.chars().take_while(|c| c.is_whitespace()).count() as u32
        }
        CursorLocation::StartOfMatch => label
            .char_indices()
            .position(|(at, _)| starts_with_folded(&label[at..], search))
            .unwrap_or(0) as u32,
    }
}

/// Case-insensitive prefix test that folds each character on its own, so a
/// match position stays a position in the original text
fn starts_with_folded(haystack: &str, needle: &str) -> bool {
    let mut folded = haystack.chars().flat_map(char::to_lowercase);
    needle
        .chars()
        .flat_map(char::to_lowercase)
        .all(|c| folded.next() == Some(c))
}

/// Initial filter text: the word under an empty cursor when enabled,
/// otherwise the selected text.
pub fn word_or_selection(editor: &dyn Editor, options: &Options) -> String {
    let selection = editor.selection();
    if selection.is_empty() && options.use_word_under_cursor_as_initial_search_term {
        editor
            .word_range_at(selection.active)
            .map(|range| editor.text_in(range))
            .unwrap_or_default()
    } else {
        editor.text_in(selection.range())
    }
}

/// Highlight the item's line and scroll it into view without moving the
/// cursor.
pub fn preview_line(host: &mut dyn Host, item: &Item, preview: &Preview) -> Result<(), SourceError> {
    let Some(index) = item.line_index() else {
        return Ok(());
    };
    let editor = host.active_editor().ok_or(SourceError::NoEditor)?;
    let range = Range::line(index, item.label.chars().count() as u32);
    editor.set_decorations(preview.decoration, &[range]);
    editor.reveal(range, preview.reveal);
    Ok(())
}

/// Put the caret at `line`:`character` of the active editor and reveal it.
pub fn jump_to(
    host: &mut dyn Host,
    line: u32,
    character: u32,
    reveal: RevealType,
) -> Result<(), SourceError> {
    let editor = host.active_editor().ok_or(SourceError::NoEditor)?;
    jump_editor(editor, line, character, reveal);
    Ok(())
}

pub(crate) fn jump_editor(editor: &mut dyn Editor, line: u32, character: u32, reveal: RevealType) {
    let selection = Selection::caret(Position::new(line, character));
    editor.set_selection(selection);
    editor.reveal(selection.range(), reveal);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::Buffer;
    use crate::host::Position;

    #[test]
    fn start_of_line() {
        assert_eq!(cursor_column("    return x", "ret", CursorLocation::StartOfLine), 0);
    }

    #[test]
    fn start_of_line_ignoring_whitespace() {
        assert_eq!(
            cursor_column("    return x", "", CursorLocation::StartOfLineIgnoreWhitespace),
            4
        );
        assert_eq!(
            cursor_column("\t\tx", "", CursorLocation::StartOfLineIgnoreWhitespace),
            2
        );
    }

    #[test]
    fn start_of_match() {
        assert_eq!(
            cursor_column("  const value = 1", "value", CursorLocation::StartOfMatch),
            8
        );
        assert_eq!(
            cursor_column("  const VALUE = 1", "Value", CursorLocation::StartOfMatch),
            8
        );
    }

    #[test]
    fn start_of_match_falls_back_to_zero() {
        assert_eq!(
            cursor_column("  const value = 1", "missing", CursorLocation::StartOfMatch),
            0
        );
    }

    #[test]
    fn start_of_match_counts_characters() {
        assert_eq!(cursor_column("é = café", "café", CursorLocation::StartOfMatch), 4);
    }

    #[test]
    fn start_of_match_when_lowercasing_changes_length() {
        assert_eq!(cursor_column("İx = 1", "x", CursorLocation::StartOfMatch), 1);
        assert_eq!(cursor_column("İx = İ", "i\u{307}", CursorLocation::StartOfMatch), 0);
    }

    #[test]
    fn initial_term_from_word_under_cursor() {
        let mut buffer = Buffer::new(None, "fn narrow_file() {}\n");
        buffer.set_selection(Selection::caret(Position::new(0, 5)));
        assert_eq!(word_or_selection(&buffer, &Options::default()), "narrow_file");
    }

    #[test]
    fn initial_term_disabled_uses_empty_selection() {
        let mut buffer = Buffer::new(None, "fn narrow_file() {}\n");
        buffer.set_selection(Selection::caret(Position::new(0, 5)));
        let options = Options {
            use_word_under_cursor_as_initial_search_term: false,
            ..Options::default()
        };
        assert_eq!(word_or_selection(&buffer, &options), "");
    }

    #[test]
    fn initial_term_from_selection() {
        let mut buffer = Buffer::new(None, "fn narrow_file() {}\n");
        buffer.set_selection(Selection {
            anchor: Position::new(0, 3),
            active: Position::new(0, 9),
        });
        assert_eq!(word_or_selection(&buffer, &Options::default()), "narrow");
    }
}
