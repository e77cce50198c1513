use super::chunk::Chunk;

/// All chunks of one file from a unified diff.
///
/// `from` and `to` are `None` when that side of the diff does not exist
/// (`/dev/null`), i.e. for created and deleted files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileDiff {
    pub from: Option<String>,
    pub to: Option<String>,
    pub chunks: Vec<Chunk>,
}

impl FileDiff {
    /// Start a file from a `diff --git a/x b/y` line
    pub(crate) fn from_git_header(line: &str) -> Self {
        let paths = line.strip_prefix("diff --git ").unwrap_or_default();
        let (from, to) = match paths.split_once(" b/") {
            Some((from, to)) => (normalize_path(from), normalize_path(&format!("b/{to}"))),
            None => (None, None),
        };
        FileDiff {
            from,
            to,
            chunks: Vec::new(),
        }
    }

    /// Added lines across all chunks, in diff order
    pub fn additions(&self) -> impl Iterator<Item = &super::Change> {
        self.chunks.iter().flat_map(|chunk| chunk.additions())
    }

    /// The path that exists after the change, falling back to the old one
    pub fn path(&self) -> Option<&str> {
        self.to.as_deref().or(self.from.as_deref())
    }
}

/// Normalize a header path: strip a trailing `\tlabel`, the `a/` or `b/`
/// prefix, and map the "no such file" sentinels to `None`.
pub(crate) fn normalize_path(raw: &str) -> Option<String> {
    let path = raw.split('\t').next().unwrap_or_default().trim();
    if path.is_empty() || path == "/dev/null" {
        return None;
    }
    let path = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    Some(path.to_string())
}
