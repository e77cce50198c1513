use std::path::Path;

use super::{Preview, Setup, Source, SourceError, jump_editor};
use crate::diff;
use crate::git::{Git, Status};
use crate::host::{Editor, Host, OpenMode, RevealType};
use crate::item::{Icon, Item, Target};
use crate::options::Options;

/// Every modified, added or renamed file in the workspace
pub struct GitFiles;

pub struct GitFilesContext {
    git: Git,
    status: Status,
}

impl Source for GitFiles {
    type Context = GitFilesContext;

    fn placeholder(&self) -> &str {
        "Type to narrow git changed files"
    }

    fn setup(&self, host: &mut dyn Host) -> Setup<GitFilesContext> {
        let Some(folder) = host.workspace_folders().first().cloned() else {
            return Setup::NotApplicable;
        };
        let status = Git::open(&folder).and_then(|git| Ok((git.status()?, git)));
        match status {
            Ok((status, git)) => {
                tracing::debug!(
                    clean = status.is_empty(),
                    root = %git.root().display(),
                    "workspace status"
                );
                Setup::Ready(GitFilesContext { git, status })
            }
            Err(e) => {
                tracing::debug!(error = %e, "no git status for workspace");
                Setup::NotApplicable
            }
        }
    }

    fn prepare_items(&self, _host: &mut dyn Host, context: &GitFilesContext) -> Vec<Item> {
        status_items(&context.status, context.git.root())
    }

    fn on_preview(
        &self,
        host: &mut dyn Host,
        item: &Item,
        context: &GitFilesContext,
        _preview: &Preview,
    ) -> Result<(), SourceError> {
        let Target::File { path } = &item.target else {
            return Ok(());
        };
        // the file may be gone by now; previewing it is best effort
        match host.open_document(path, OpenMode::Preview) {
            Ok(editor) => jump_to_first_change(editor, &item.label, &context.git),
            Err(e) => tracing::debug!(error = %e, "preview skipped"),
        }
        Ok(())
    }

    fn on_accept(
        &self,
        host: &mut dyn Host,
        item: &Item,
        context: &GitFilesContext,
        _search: &str,
        _options: &Options,
    ) -> Result<(), SourceError> {
        let Target::File { path } = &item.target else {
            return Ok(());
        };
        let editor = host
            .open_document(path, OpenMode::Pinned)
            .map_err(|e| {
                tracing::warn!(error = %e, "could not open changed file");
                SourceError::OpenFile {
                    label: item.label.clone(),
                }
            })?;
        jump_to_first_change(editor, &item.label, &context.git);
        Ok(())
    }
}

/// Group separators in the fixed order Modified, Added, Renamed, each
/// followed by its files. Empty groups are left out.
pub fn status_items(status: &Status, root: &Path) -> Vec<Item> {
    let mut items = Vec::new();

    if !status.modified.is_empty() {
        items.push(Item::separator("Modified"));
        items.extend(
            status
                .modified
                .iter()
                .map(|file| Item::file(file, root.join(file)).with_icon(Icon::Modified)),
        );
    }

    if !status.created.is_empty() {
        items.push(Item::separator("Added"));
        items.extend(
            status
                .created
                .iter()
                .map(|file| Item::file(file, root.join(file)).with_icon(Icon::Added)),
        );
    }

    if !status.renamed.is_empty() {
        items.push(Item::separator("Renamed"));
        items.extend(status.renamed.iter().map(|rename| {
            let item = Item::file(&rename.to, root.join(&rename.to)).with_icon(Icon::Renamed);
            if rename.from != rename.to {
                item.with_description(format!("from {}", rename.from))
            } else {
                item
            }
        }));
    }

    items
}

/// Move the caret to the first line `editor` adds relative to `HEAD`.
/// Files without history or without additions keep their cursor.
fn jump_to_first_change(editor: &mut dyn Editor, relative: &str, git: &Git) {
    let Ok(head) = git.show(&format!("HEAD:{relative}")) else {
        return;
    };
    let first = diff::parse(&diff::unified(relative, &head, editor.text()))
        .iter()
        .flat_map(|file| file.additions())
        .map(|change| change.line_number.saturating_sub(1))
        .next();
    if let Some(line) = first {
        jump_editor(editor, line, 0, RevealType::InCenterIfOutsideViewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Rename;
    use std::path::PathBuf;

    fn rows(items: &[Item]) -> String {
        items
            .iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn groups_in_fixed_order_skipping_empty_ones() {
        let status = Status {
            modified: vec!["a.ts".into()],
            created: vec![],
            renamed: vec![Rename {
                from: "x.ts".into(),
                to: "y.ts".into(),
            }],
        };
        let items = status_items(&status, Path::new("/repo"));
        insta::assert_snapshot!(rows(&items), @r"
        ── Modified
        a.ts
        ── Renamed
        y.ts  (from x.ts)
        ");
        assert_eq!(
            items[3].target,
            Target::File {
                path: PathBuf::from("/repo/y.ts")
            }
        );
        assert_eq!(items[1].icon, Some(Icon::Modified));
    }

    #[test]
    fn rename_to_same_path_has_no_description() {
        let status = Status {
            renamed: vec![Rename {
                from: "same.rs".into(),
                to: "same.rs".into(),
            }],
            ..Status::default()
        };
        let items = status_items(&status, Path::new("/repo"));
        assert_eq!(items[1].description, None);
    }

    #[test]
    fn clean_status_has_no_items() {
        assert!(status_items(&Status::default(), Path::new("/repo")).is_empty());
    }
}
