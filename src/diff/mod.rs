//! Unified diff parsing.
//!
//! [`parse`] turns unified-diff text into one [`FileDiff`] per file, each with
//! its [`Chunk`]s and per-line [`Change`]s. It accepts `git diff` output as
//! well as bare `---`/`+++` patches such as the ones [`unified`] produces.
//!
//! ```
//! use narrow::diff::{self, ChangeKind};
//!
//! let files = diff::parse("--- /dev/null\n+++ b/new.txt\n@@ -0,0 +1 @@\n+hello\n");
//! assert_eq!(files[0].from, None);
//! assert_eq!(files[0].to.as_deref(), Some("new.txt"));
//! assert_eq!(files[0].chunks[0].changes[0].kind, ChangeKind::Add);
//! ```

pub mod chunk;
pub mod file;

pub use chunk::{Change, ChangeKind, Chunk};
pub use file::FileDiff;

use chunk::ChunkCursor;
use file::normalize_path;
use similar::TextDiff;

/// Parse unified-diff text into per-file records.
///
/// Lines outside of any file or chunk (`index ...`, mode lines, `Index:`
/// banners) are ignored.
pub fn parse(text: &str) -> Vec<FileDiff> {
    let mut files = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut open: Option<(Chunk, ChunkCursor)> = None;

    for line in text.lines() {
        if let Some((chunk, cursor)) = open.as_mut() {
            if !cursor.is_complete() && is_body_line(line) {
                cursor.push(chunk, line);
                continue;
            }
            if line.starts_with('\\') {
                continue;
            }
        }

        if line.starts_with("diff --git ") {
            close_chunk(&mut current, &mut open);
            files.extend(current.take());
            current = Some(FileDiff::from_git_header(line));
        } else if let Some(path) = line.strip_prefix("--- ") {
            close_chunk(&mut current, &mut open);
            // a `---` after chunks starts the next bare patch
            if current.as_ref().is_none_or(|file| !file.chunks.is_empty()) {
                files.extend(current.take());
                current = Some(FileDiff::default());
            }
            if let Some(file) = current.as_mut() {
                file.from = normalize_path(path);
            }
        } else if let Some(path) = line.strip_prefix("+++ ") {
            if let Some(file) = current.as_mut() {
                file.to = normalize_path(path);
            }
        } else if line.starts_with("@@ ") {
            let Some(chunk) = Chunk::from_header(line) else {
                continue;
            };
            close_chunk(&mut current, &mut open);
            if current.is_none() {
                current = Some(FileDiff::default());
            }
            let cursor = chunk.cursor();
            open = Some((chunk, cursor));
        }
    }

    close_chunk(&mut current, &mut open);
    files.extend(current);
    files
}

/// Zero-context unified diff of `old` against `new` for `path`.
///
/// The result parses back with [`parse`]; identical texts yield an empty
/// string.
pub fn unified(path: &str, old: &str, new: &str) -> String {
    let from = format!("a/{path}\tHEAD");
    let to = format!("b/{path}\tcurrent");
    let diff = TextDiff::from_lines(old, new);
    diff.unified_diff()
        .context_radius(0)
        .header(&from, &to)
        .to_string()
}

fn is_body_line(line: &str) -> bool {
    line.is_empty() || line.starts_with(['+', '-', ' '])
}

fn close_chunk(current: &mut Option<FileDiff>, open: &mut Option<(Chunk, ChunkCursor)>) {
    if let Some((chunk, _)) = open.take()
        && let Some(file) = current.as_mut()
    {
        file.chunks.push(chunk);
    }
}
