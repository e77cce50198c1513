//! The four registered commands and their host ids.

use crate::host::Host;
use crate::item::Item;
use crate::narrow::{self, Outcome};
use crate::options::NAMESPACE;
use crate::source::{FileLines, GitFiles, GitLines, Problems, Setup, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    NarrowFile,
    NarrowGit,
    NarrowGitFiles,
    NarrowProblems,
}

impl Command {
    pub const ALL: [Command; 4] = [
        Command::NarrowFile,
        Command::NarrowGit,
        Command::NarrowGitFiles,
        Command::NarrowProblems,
    ];

    fn name(self) -> &'static str {
        match self {
            Command::NarrowFile => "narrow-file",
            Command::NarrowGit => "narrow-git",
            Command::NarrowGitFiles => "narrow-git-files",
            Command::NarrowProblems => "narrow-problems",
        }
    }

    /// Id the host binds the command to, e.g. `narrow.narrow-file`
    pub fn id(self) -> String {
        format!("{NAMESPACE}.{}", self.name())
    }

    pub fn from_id(id: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|command| command.id() == id)
    }

    /// Run one full interaction
    pub fn run(self, host: &mut dyn Host) -> Outcome {
        tracing::debug!(command = %self.id(), "invoked");
        match self {
            Command::NarrowFile => narrow::run(host, &FileLines),
            Command::NarrowGit => narrow::run(host, &GitLines),
            Command::NarrowGitFiles => narrow::run(host, &GitFiles),
            Command::NarrowProblems => narrow::run(host, &Problems),
        }
    }

    /// The candidate list without showing any UI; `None` when the command
    /// does not apply
    pub fn items(self, host: &mut dyn Host) -> Option<Vec<Item>> {
        match self {
            Command::NarrowFile => prepare(host, &FileLines),
            Command::NarrowGit => prepare(host, &GitLines),
            Command::NarrowGitFiles => prepare(host, &GitFiles),
            Command::NarrowProblems => prepare(host, &Problems),
        }
    }
}

fn prepare<S: Source>(host: &mut dyn Host, source: &S) -> Option<Vec<Item>> {
    match source.setup(host) {
        Setup::Ready(context) => Some(source.prepare_items(host, &context)),
        Setup::NotApplicable => None,
    }
}
