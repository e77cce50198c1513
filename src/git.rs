use error_set::error_set;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

error_set! {
    /// Errors from git command execution
    GitError := {
        #[display("Failed to run git {command}: {message}")]
        SpawnFailed { command: String, message: String },
        #[display("git {command} failed: {stderr}")]
        ExitError { command: String, stderr: String },
        #[display("Invalid UTF-8 in git {command} output: {message}")]
        InvalidUtf8 { command: String, message: String },
        #[display("{path} is outside of the work tree {root}")]
        OutsideWorkTree { path: String, root: String },
    }
}

/// A file moved from one path to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// Working tree status, grouped the way the changed-files list shows it.
///
/// Paths are relative to the work tree root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub modified: Vec<String>,
    pub created: Vec<String>,
    pub renamed: Vec<Rename>,
}

impl Status {
    /// Parse `git status --porcelain=v1 -z` output
    pub fn parse(output: &str) -> Self {
        let mut status = Status::default();
        let mut entries = output.split('\0').filter(|entry| !entry.is_empty());

        while let Some(entry) = entries.next() {
            let Some((code, path)) = entry.split_at_checked(3) else {
                continue;
            };
            let mut code = code.chars();
            let (index, worktree) = (code.next().unwrap_or(' '), code.next().unwrap_or(' '));

            match (index, worktree) {
                ('R', _) => {
                    // renames carry the original path as the next entry
                    let from = entries.next().unwrap_or(path);
                    status.renamed.push(Rename {
                        from: from.to_string(),
                        to: path.to_string(),
                    });
                }
                ('C', _) => {
                    entries.next();
                    status.created.push(path.to_string());
                }
                ('A', _) => status.created.push(path.to_string()),
                ('M', _) | (_, 'M') => status.modified.push(path.to_string()),
                _ => {}
            }
        }

        status
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.created.is_empty() && self.renamed.is_empty()
    }
}

/// A git work tree driven through the `git` binary
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Open the work tree containing `dir`
    pub fn open(dir: &Path) -> Result<Self, GitError> {
        let root = run(dir, ["rev-parse", "--show-toplevel"])?;
        Ok(Git {
            root: PathBuf::from(root.trim_end_matches(['\n', '\r'])),
        })
    }

    /// Work tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `path` relative to the work tree root, with `/` separators
    pub fn relative(&self, path: &Path) -> Result<String, GitError> {
        let relative = match path.strip_prefix(&self.root) {
            Ok(relative) => relative.to_path_buf(),
            // the work tree root comes back with symlinks resolved
            Err(_) => path
                .canonicalize()
                .ok()
                .and_then(|canonical| canonical.strip_prefix(&self.root).ok().map(Path::to_path_buf))
                .ok_or_else(|| GitError::OutsideWorkTree {
                    path: path.display().to_string(),
                    root: self.root.display().to_string(),
                })?,
        };
        Ok(relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }

    pub fn status(&self) -> Result<Status, GitError> {
        self.raw(["status", "--porcelain=v1", "-z", "--untracked-files=no"])
            .map(|output| Status::parse(&output))
    }

    /// Content of `spec` (`<rev>:<path>`), as `git show` prints it
    pub fn show(&self, spec: &str) -> Result<String, GitError> {
        self.raw(["show", spec])
    }

    /// Whether `relative` is tracked in the index
    pub fn is_tracked(&self, relative: &str) -> bool {
        self.raw(["ls-files", "--error-unmatch", "--", relative]).is_ok()
    }

    /// Run any git subcommand in the work tree and return its stdout
    pub fn raw<I, S>(&self, args: I) -> Result<String, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        run(&self.root, args)
    }
}

fn run<I, S>(dir: &Path, args: I) -> Result<String, GitError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let command = args
        .first()
        .map(|arg| arg.as_ref().to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(dir = %dir.display(), %command, "running git");
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(&args)
        .output()
        .map_err(|e| GitError::SpawnFailed {
            command: command.clone(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::ExitError {
            command,
            stderr: stderr.trim().to_string(),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| GitError::InvalidUtf8 {
        command,
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn parse_empty_status() {
        assert!(Status::parse("").is_empty());
    }

    #[test]
    fn parse_categories() {
        let output = " M src/lib.rs\0M  staged.rs\0MM both.rs\0A  new.rs\0R  y.ts\0x.ts\0D  gone.rs\0";
        let status = Status::parse(output);
        assert_eq!(
            status,
            Status {
                modified: vec!["src/lib.rs".into(), "staged.rs".into(), "both.rs".into()],
                created: vec!["new.rs".into()],
                renamed: vec![Rename {
                    from: "x.ts".into(),
                    to: "y.ts".into()
                }],
            }
        );
    }

    #[test]
    fn parse_paths_with_spaces() {
        let status = Status::parse(" M docs/read me.md\0");
        assert_eq!(status.modified, vec!["docs/read me.md".to_string()]);
    }

    #[test]
    fn open_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Git::open(dir.path()).is_err());
    }
}
