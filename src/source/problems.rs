use super::{Setup, Source, SourceError, jump_to};
use crate::host::{Diagnostic, Editor, Host, Severity};
use crate::item::{Icon, Item, Target};
use crate::options::Options;

/// Errors and warnings reported for the active document
pub struct Problems;

pub struct ProblemsContext {
    diagnostics: Vec<Diagnostic>,
}

impl Source for Problems {
    type Context = ProblemsContext;

    fn placeholder(&self) -> &str {
        "Type to narrow problems"
    }

    fn setup(&self, host: &mut dyn Host) -> Setup<ProblemsContext> {
        let Some(path) = host
            .active_editor()
            .and_then(|editor| editor.path().map(|p| p.to_path_buf()))
        else {
            return Setup::NotApplicable;
        };
        let diagnostics: Vec<_> = host
            .diagnostics(&path)
            .into_iter()
            .filter(|d| d.severity <= Severity::Warning)
            .collect();
        if diagnostics.is_empty() {
            return Setup::NotApplicable;
        }
        Setup::Ready(ProblemsContext { diagnostics })
    }

    fn prepare_items(&self, host: &mut dyn Host, context: &ProblemsContext) -> Vec<Item> {
        match host.active_editor() {
            Some(editor) => diagnostic_items(editor, &context.diagnostics),
            None => Vec::new(),
        }
    }

    fn on_accept(
        &self,
        host: &mut dyn Host,
        item: &Item,
        _context: &ProblemsContext,
        _search: &str,
        options: &Options,
    ) -> Result<(), SourceError> {
        let Target::Line { index, character } = item.target else {
            return Ok(());
        };
        jump_to(
            host,
            index,
            character.unwrap_or(0),
            options.active_line_viewport_reveal_type,
        )
    }
}

/// One item per diagnostic: the trimmed source line, the message as
/// description, positioned at the diagnostic's start.
pub fn diagnostic_items(editor: &dyn Editor, diagnostics: &[Diagnostic]) -> Vec<Item> {
    diagnostics
        .iter()
        .map(|diagnostic| {
            let start = diagnostic.range.start;
            let icon = if diagnostic.severity == Severity::Error {
                Icon::Error
            } else {
                Icon::Warning
            };
            Item::line(editor.line(start.line).unwrap_or_default().trim(), start.line)
                .with_character(start.character)
                .with_description(&diagnostic.message)
                .with_icon(icon)
        })
        .collect()
}
