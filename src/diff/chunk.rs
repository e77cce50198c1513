use nom::IResult;
use nom::Parser;
use nom::bytes::complete::tag;
use nom::character::complete::{char, u32 as line_number};
use nom::combinator::opt;
use nom::sequence::preceded;

/// Kind of a single line inside a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Remove,
    Context,
}

/// One line of a chunk with its diff marker stripped.
///
/// `line_number` is 1-based: the new-side line for additions and context,
/// the old-side line for removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub content: String,
    pub line_number: u32,
}

/// A contiguous block of changed lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub changes: Vec<Change>,
}

impl Chunk {
    /// Start an empty chunk from its `@@ -a,b +c,d @@` header.
    ///
    /// Returns `None` if the line is not a chunk header.
    pub fn from_header(line: &str) -> Option<Self> {
        let (_, (old, new)) = header(line).ok()?;
        Some(Chunk {
            old_start: old.0,
            old_lines: old.1.unwrap_or(1),
            new_start: new.0,
            new_lines: new.1.unwrap_or(1),
            changes: Vec::new(),
        })
    }

    /// Parse a chunk from diff text (header + content lines)
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines();
        let mut chunk = Self::from_header(lines.next()?)?;
        let mut cursor = chunk.cursor();
        for line in lines {
            cursor.push(&mut chunk, line);
        }
        Some(chunk)
    }

    /// Line counters used while the chunk body is being read.
    pub(crate) fn cursor(&self) -> ChunkCursor {
        ChunkCursor {
            old_line: self.old_start,
            new_line: self.new_start,
            old_remaining: self.old_lines,
            new_remaining: self.new_lines,
        }
    }

    /// Changes of kind `Add`, in diff order
    pub fn additions(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(|c| c.kind == ChangeKind::Add)
    }
}

/// Tracks the next old/new line numbers and how many body lines the header
/// still promises. Numbers saturate at `u32::MAX`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChunkCursor {
    old_line: u32,
    new_line: u32,
    old_remaining: u32,
    new_remaining: u32,
}

impl ChunkCursor {
    /// The header's line counts have all been consumed
    pub(crate) fn is_complete(&self) -> bool {
        self.old_remaining == 0 && self.new_remaining == 0
    }

    /// Feed one body line into `chunk`. Lines that are not part of a chunk
    /// body (including `\ No newline at end of file`) are ignored.
    pub(crate) fn push(&mut self, chunk: &mut Chunk, line: &str) {
        let (kind, content) = if let Some(content) = line.strip_prefix('+') {
            (ChangeKind::Add, content)
        } else if let Some(content) = line.strip_prefix('-') {
            (ChangeKind::Remove, content)
        } else if let Some(content) = line.strip_prefix(' ') {
            (ChangeKind::Context, content)
        } else if line.is_empty() && !self.is_complete() {
            // some producers drop the space of an empty context line
            (ChangeKind::Context, line)
        } else {
            return;
        };

        let line_number = match kind {
            ChangeKind::Add => {
                let n = self.new_line;
                self.new_line = self.new_line.saturating_add(1);
                self.new_remaining = self.new_remaining.saturating_sub(1);
                n
            }
            ChangeKind::Remove => {
                let n = self.old_line;
                self.old_line = self.old_line.saturating_add(1);
                self.old_remaining = self.old_remaining.saturating_sub(1);
                n
            }
            ChangeKind::Context => {
                let n = self.new_line;
                self.old_line = self.old_line.saturating_add(1);
                self.new_line = self.new_line.saturating_add(1);
                self.old_remaining = self.old_remaining.saturating_sub(1);
                self.new_remaining = self.new_remaining.saturating_sub(1);
                n
            }
        };

        chunk.changes.push(Change {
            kind,
            content: content.to_string(),
            line_number,
        });
    }
}

type LineRange = (u32, Option<u32>);

/// `start` or `start,count`
fn range(input: &str) -> IResult<&str, LineRange> {
    (line_number, opt(preceded(char(','), line_number))).parse(input)
}

/// `@@ -old +new @@` followed by optional section text
fn header(input: &str) -> IResult<&str, (LineRange, LineRange)> {
    let (rest, (_, old, _, new, _)) =
        (tag("@@ -"), range, tag(" +"), range, tag(" @@")).parse(input)?;
    Ok((rest, (old, new)))
}
