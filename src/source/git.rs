use std::path::PathBuf;

use super::{Setup, Source, SourceError, jump_to};
use crate::diff;
use crate::git::Git;
use crate::host::Host;
use crate::item::{Icon, Item};
use crate::options::Options;

/// Lines the active document adds relative to `HEAD`, including unsaved
/// edits
pub struct GitLines;

pub struct GitLinesContext {
    path: PathBuf,
    relative: String,
    head: String,
}

impl Source for GitLines {
    type Context = GitLinesContext;

    fn placeholder(&self) -> &str {
        "Type to narrow changed lines"
    }

    fn setup(&self, host: &mut dyn Host) -> Setup<GitLinesContext> {
        let Some(path) = host.active_editor().and_then(|e| e.path().map(PathBuf::from)) else {
            return Setup::NotApplicable;
        };
        let Some(folder) = host.workspace_folder_for(&path) else {
            tracing::debug!(path = %path.display(), "file is outside of the workspace");
            return Setup::NotApplicable;
        };
        let git = match Git::open(&folder) {
            Ok(git) => git,
            Err(e) => {
                tracing::debug!(error = %e, "workspace is not a git repository");
                return Setup::NotApplicable;
            }
        };
        let Ok(relative) = git.relative(&path) else {
            return Setup::NotApplicable;
        };
        if !git.is_tracked(&relative) {
            tracing::debug!(%relative, "file is not tracked");
            return Setup::NotApplicable;
        }

        // no history yet reads as an empty file
        let head = git.show(&format!("HEAD:{relative}")).unwrap_or_default();
        let unchanged = host
            .active_editor()
            .is_none_or(|editor| editor.text() == head);
        if unchanged {
            tracing::debug!(%relative, "file has no changes");
            return Setup::NotApplicable;
        }

        Setup::Ready(GitLinesContext {
            path,
            relative,
            head,
        })
    }

    fn prepare_items(&self, host: &mut dyn Host, context: &GitLinesContext) -> Vec<Item> {
        let Some(editor) = host.active_editor() else {
            return Vec::new();
        };
        if editor.path() != Some(context.path.as_path()) {
            return Vec::new();
        }
        added_line_items(&diff::unified(&context.relative, &context.head, editor.text()))
    }

    fn on_accept(
        &self,
        host: &mut dyn Host,
        item: &Item,
        _context: &GitLinesContext,
        _search: &str,
        options: &Options,
    ) -> Result<(), SourceError> {
        let Some(index) = item.line_index() else {
            return Ok(());
        };
        jump_to(host, index, 0, options.active_line_viewport_reveal_type)
    }
}

/// A separator before every chunk, then one item per added line.
pub fn added_line_items(patch: &str) -> Vec<Item> {
    let mut items = Vec::new();
    for file in diff::parse(patch) {
        for chunk in &file.chunks {
            items.push(Item::separator(""));
            items.extend(chunk.additions().map(|change| {
                Item::line(&change.content, change.line_number.saturating_sub(1))
                    .with_icon(Icon::Inserted)
            }));
        }
    }
    items
}
