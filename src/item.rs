use std::path::PathBuf;

/// Symbolic decoration shown next to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Inserted,
    Added,
    Modified,
    Renamed,
    Error,
    Warning,
}

/// What picking an item jumps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Non-selectable group header; the item's label is the group name
    Separator,
    /// Zero-based line (and optional column) in the active document
    Line { index: u32, character: Option<u32> },
    /// Absolute path of a file to open
    File { path: PathBuf },
}

/// One row the user can narrow down to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub label: String,
    pub description: Option<String>,
    pub icon: Option<Icon>,
    pub target: Target,
}

impl Item {
    /// A line item with no column
    pub fn line(label: impl Into<String>, index: u32) -> Self {
        Item {
            label: label.into(),
            description: None,
            icon: None,
            target: Target::Line {
                index,
                character: None,
            },
        }
    }

    pub fn file(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Item {
            label: label.into(),
            description: None,
            icon: None,
            target: Target::File { path: path.into() },
        }
    }

    pub fn separator(group: impl Into<String>) -> Self {
        Item {
            label: group.into(),
            description: None,
            icon: None,
            target: Target::Separator,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_character(mut self, column: u32) -> Self {
        if let Target::Line { character, .. } = &mut self.target {
            *character = Some(column);
        }
        self
    }

    pub fn is_separator(&self) -> bool {
        self.target == Target::Separator
    }

    /// Zero-based line index for line items
    pub fn line_index(&self) -> Option<u32> {
        match self.target {
            Target::Line { index, .. } => Some(index),
            _ => None,
        }
    }
}

impl std::fmt::Display for Item {
    /// Render as a single listing row: `12: label  (description)`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Target::Separator => write!(f, "── {}", self.label)?,
            Target::Line { index, .. } => write!(f, "{}:\t{}", index + 1, self.label)?,
            Target::File { .. } => write!(f, "{}", self.label)?,
        }
        if let Some(description) = &self.description {
            write!(f, "  ({description})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_separators_lack_a_target() {
        assert!(Item::separator("Modified").is_separator());
        assert!(!Item::line("x", 0).is_separator());
        assert!(!Item::file("a.rs", "/repo/a.rs").is_separator());
    }

    #[test]
    fn character_only_applies_to_lines() {
        let line = Item::line("x", 3).with_character(7);
        assert_eq!(
            line.target,
            Target::Line {
                index: 3,
                character: Some(7)
            }
        );
        let file = Item::file("a.rs", "/repo/a.rs").with_character(7);
        assert_eq!(file.line_index(), None);
    }

    #[test]
    fn display_rows() {
        assert_eq!(Item::line("    return x", 41).to_string(), "42:\t    return x");
        insta::assert_snapshot!(
            Item::file("y.rs", "/r/y.rs").with_description("from x.rs").to_string(),
            @"y.rs  (from x.rs)"
        );
    }
}
