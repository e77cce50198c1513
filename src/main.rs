use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use narrow::headless::{Buffer, HeadlessHost, Step};
use narrow::host::{Position, Selection};
use narrow::{Command, Editor, NarrowError, Outcome, SETTINGS_FILE, Settings};

#[derive(Parser)]
#[command(name = "narrow")]
#[command(about = "Narrow a file, its git changes or its problems down to one line")]
#[command(version)]
struct Cli {
    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Settings file (defaults to <root>/.narrow.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Narrow the non-blank lines of a file
    File(Narrowing),
    /// Narrow the lines a file adds since HEAD
    Git(Narrowing),
    /// Narrow the modified, added and renamed files of the workspace
    GitFiles(Narrowing),
    /// Narrow the errors and warnings of a file
    Problems {
        #[command(flatten)]
        narrowing: Narrowing,

        /// JSON diagnostics keyed by file path
        #[arg(long)]
        diagnostics: PathBuf,
    },
    /// Print shell completions
    Completions { shell: Shell },
    /// Print the man page
    Man,
}

#[derive(Args)]
struct Narrowing {
    /// Document to open as the active editor
    path: Option<PathBuf>,

    /// Cursor line, 1-based
    #[arg(long, default_value_t = 1)]
    line: u32,

    /// Cursor column, 1-based
    #[arg(long, default_value_t = 1)]
    column: u32,

    /// Filter text typed into the surface
    #[arg(long, short)]
    query: Option<String>,

    /// Accept the Nth match counting from the highlighted one
    #[arg(long, default_value_t = 1)]
    pick: usize,

    /// Print the candidates instead of picking one
    #[arg(long)]
    list: bool,
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, NarrowError> {
    let (command, narrowing, diagnostics) = match cli.command {
        Commands::File(narrowing) => (Command::NarrowFile, narrowing, None),
        Commands::Git(narrowing) => (Command::NarrowGit, narrowing, None),
        Commands::GitFiles(narrowing) => (Command::NarrowGitFiles, narrowing, None),
        Commands::Problems {
            narrowing,
            diagnostics,
        } => (Command::NarrowProblems, narrowing, Some(diagnostics)),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "narrow", &mut std::io::stdout());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command())
                .render(&mut std::io::stdout())
                .map_err(|e| NarrowError::Output {
                    message: e.to_string(),
                })?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().map_err(|e| NarrowError::Output {
            message: e.to_string(),
        })?,
    };
    let root = root.canonicalize().unwrap_or(root);
    let settings_path = cli.config.unwrap_or_else(|| root.join(SETTINGS_FILE));
    // surface a broken settings file instead of silently using defaults
    Settings::load(&settings_path)?;

    let mut host = HeadlessHost::new(vec![root.clone()]).with_script(script(&narrowing));
    host.settings_path = Some(settings_path);
    if let Some(path) = &narrowing.path {
        host.editor = Some(open_at(&root.join(path), narrowing.line, narrowing.column)?);
    }
    if let Some(diagnostics) = diagnostics {
        host.diagnostics = narrow::load_diagnostics(&diagnostics, &root)?;
    }

    if narrowing.list {
        return Ok(list(command, &mut host));
    }

    let outcome = command.run(&mut host);
    tracing::info!(command = %command.id(), ?outcome, "done");
    for error in &host.errors {
        eprintln!("error: {error}");
    }
    match outcome {
        Outcome::Accepted if host.errors.is_empty() => {
            if let Some(editor) = &host.editor {
                println!("{}", location(editor));
            }
            Ok(ExitCode::SUCCESS)
        }
        Outcome::NotApplicable => {
            eprintln!("nothing to narrow");
            Ok(ExitCode::from(2))
        }
        Outcome::Accepted | Outcome::Cancelled => Ok(ExitCode::FAILURE),
    }
}

/// Steps that type the query, walk to the requested match and accept it
fn script(narrowing: &Narrowing) -> Vec<Step> {
    let mut steps = Vec::new();
    if let Some(query) = &narrowing.query {
        steps.push(Step::Type(query.clone()));
    }
    steps.extend(std::iter::repeat_n(Step::Down, narrowing.pick.saturating_sub(1)));
    steps.push(Step::Accept);
    steps
}

fn open_at(path: &Path, line: u32, column: u32) -> Result<Buffer, NarrowError> {
    let mut buffer = Buffer::open(path)?;
    let line = line.saturating_sub(1);
    if buffer.line(line).is_none() {
        return Err(NarrowError::LineOutOfRange {
            path: path.display().to_string(),
            line: line + 1,
        });
    }
    buffer.set_selection(Selection::caret(Position::new(line, column.saturating_sub(1))));
    Ok(buffer)
}

fn list(command: Command, host: &mut HeadlessHost) -> ExitCode {
    let Some(items) = command.items(host) else {
        eprintln!("nothing to narrow");
        return ExitCode::from(2);
    };
    let mut stdout = std::io::stdout().lock();
    for item in items {
        if writeln!(stdout, "{item}").is_err() {
            break;
        }
    }
    ExitCode::SUCCESS
}

fn location(editor: &Buffer) -> String {
    let position = editor.selection().active;
    let line = position.line + 1;
    let column = position.character + 1;
    match editor.path() {
        Some(path) => format!("{}:{line}:{column}", path.display()),
        None => format!("{line}:{column}"),
    }
}
