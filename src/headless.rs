//! An in-process host: documents loaded from disk, a scripted filter
//! surface, and a record of everything the loop did to the view.
//!
//! The `narrow` binary runs commands against it, and the tests use it to
//! observe previews, reveals and decorations.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::host::{
    DecorationId, Diagnostic, Editor, Eol, FilterSurface, Host, HostError, OpenMode, Range,
    RevealType, Selection, SurfaceEvent,
};
use crate::item::Item;
use crate::options::Settings;

/// A document held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    path: Option<PathBuf>,
    text: String,
    eol: Eol,
    selection: Selection,
    /// Every reveal, oldest first
    pub reveals: Vec<(Range, RevealType)>,
    pub decorations: HashMap<DecorationId, Vec<Range>>,
    pub mode: Option<OpenMode>,
}

impl Buffer {
    /// Line endings are normalized to the dominant terminator, as an editor
    /// does on load.
    pub fn new(path: Option<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let eol = Eol::detect(&text);
        Buffer {
            path,
            eol,
            text: eol.normalize(&text),
            selection: Selection::default(),
            reveals: Vec::new(),
            decorations: HashMap::new(),
            mode: None,
        }
    }

    pub fn open(path: &Path) -> Result<Self, HostError> {
        let text = std::fs::read_to_string(path).map_err(|e| HostError::OpenFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Buffer::new(Some(path.to_path_buf()), text))
    }

    /// Ranges currently painted by `decoration`
    pub fn decorated(&self, decoration: DecorationId) -> &[Range] {
        self.decorations
            .get(&decoration)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Replace the content, as an unsaved edit would
    pub fn edit(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.eol = Eol::detect(&text);
        self.text = self.eol.normalize(&text);
    }
}

impl Editor for Buffer {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn eol(&self) -> Eol {
        self.eol
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    fn reveal(&mut self, range: Range, reveal: RevealType) {
        self.reveals.push((range, reveal));
    }

    fn set_decorations(&mut self, decoration: DecorationId, ranges: &[Range]) {
        if ranges.is_empty() {
            self.decorations.remove(&decoration);
        } else {
            self.decorations.insert(decoration, ranges.to_vec());
        }
    }
}

/// One scripted user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Replace the filter text
    Type(String),
    /// Move the highlight to the next visible item
    Down,
    Up,
    /// Confirm the highlighted item
    Accept,
    /// Dismiss the surface
    Cancel,
}

/// A filter surface that plays back a fixed list of [`Step`]s.
///
/// Matching is a case-insensitive substring test on the label (and the
/// description when enabled). Separators are listed only while the filter
/// is empty. Pending active-item changes coalesce into one event, the way a
/// UI reports them after a batch of updates. Running out of steps dismisses
/// the surface.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    steps: VecDeque<Step>,
    items: Vec<Item>,
    visible: Vec<usize>,
    value: String,
    active: Option<usize>,
    pending: VecDeque<SurfaceEvent>,
    sort_by_label: bool,
    match_on_description: bool,
    shown: bool,
    hidden: bool,
    disposed: bool,
}

impl ScriptedSurface {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        ScriptedSurface {
            steps: steps.into_iter().collect(),
            ..ScriptedSurface::default()
        }
    }

    /// Indexes of the items currently listed, in display order
    pub fn visible(&self) -> impl Iterator<Item = &Item> {
        self.visible.iter().filter_map(|&i| self.items.get(i))
    }

    fn matches(&self, item: &Item, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        if item.is_separator() {
            return false;
        }
        item.label.to_lowercase().contains(needle)
            || (self.match_on_description
                && item
                    .description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(needle)))
    }

    fn refilter(&mut self) {
        let needle = self.value.to_lowercase();
        let mut visible: Vec<usize> = (0..self.items.len())
            .filter(|&i| self.matches(&self.items[i], &needle))
            .collect();
        if self.sort_by_label && !needle.is_empty() {
            visible.sort_by(|&a, &b| self.items[a].label.cmp(&self.items[b].label));
        }
        self.visible = visible;

        let still_visible = self.active.is_some_and(|a| self.visible.contains(&a));
        if !still_visible {
            let first = self.selectable().next();
            self.activate(first);
        }
    }

    fn selectable(&self) -> impl Iterator<Item = usize> + '_ {
        self.visible
            .iter()
            .copied()
            .filter(|&i| !self.items[i].is_separator())
    }

    fn activate(&mut self, index: Option<usize>) {
        self.active = index;
        self.pending
            .retain(|event| !matches!(event, SurfaceEvent::ActiveChanged(_)));
        self.pending.push_back(SurfaceEvent::ActiveChanged(index));
    }

    fn step(&mut self, forward: bool) {
        let order: Vec<usize> = self.selectable().collect();
        let at = self.active.and_then(|a| order.iter().position(|&i| i == a));
        let next = match (at, forward) {
            (None, _) => order.first().copied(),
            (Some(at), true) => order.get(at + 1).or(order.last()).copied(),
            (Some(at), false) => order.get(at.saturating_sub(1)).copied(),
        };
        if next != self.active {
            self.activate(next);
        }
    }
}

impl FilterSurface for ScriptedSurface {
    // nothing is rendered, so hints and spinners have no effect
    fn set_placeholder(&mut self, _placeholder: &str) {}

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        if !self.items.is_empty() {
            self.refilter();
        }
    }

    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_busy(&mut self, _busy: bool) {}

    fn set_sort_by_label(&mut self, sort: bool) {
        self.sort_by_label = sort;
    }

    fn set_match_on_description(&mut self, enabled: bool) {
        self.match_on_description = enabled;
    }

    fn set_items(&mut self, items: &[Item]) {
        self.items = items.to_vec();
        self.active = None;
        self.refilter();
    }

    fn set_active(&mut self, index: usize) {
        if self.visible.contains(&index) && !self.items[index].is_separator() {
            self.activate(Some(index));
        }
    }

    fn show(&mut self) {
        self.shown = true;
    }

    fn hide(&mut self) {
        if self.shown && !self.hidden {
            self.hidden = true;
            self.pending.push_back(SurfaceEvent::Hidden);
        }
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.items.clear();
        self.visible.clear();
    }

    fn next_event(&mut self) -> Option<SurfaceEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.hidden || self.disposed {
                return None;
            }
            match self.steps.pop_front() {
                Some(Step::Type(text)) => {
                    self.value = text;
                    self.refilter();
                }
                Some(Step::Down) => self.step(true),
                Some(Step::Up) => self.step(false),
                Some(Step::Accept) => self.pending.push_back(SurfaceEvent::Accepted(self.active)),
                Some(Step::Cancel) | None => self.hide(),
            }
            if !self.shown && self.pending.is_empty() {
                return None;
            }
        }
    }
}

/// A host with a single editor slot, backed by the filesystem.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    pub editor: Option<Buffer>,
    pub folders: Vec<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub diagnostics: HashMap<PathBuf, Vec<Diagnostic>>,
    pub script: Vec<Step>,
    /// Messages passed to [`Host::show_error`]
    pub errors: Vec<String>,
    next_decoration: u64,
    live_decorations: Vec<DecorationId>,
}

impl HeadlessHost {
    pub fn new(folders: Vec<PathBuf>) -> Self {
        HeadlessHost {
            folders,
            ..HeadlessHost::default()
        }
    }

    #[must_use]
    pub fn with_editor(mut self, buffer: Buffer) -> Self {
        self.editor = Some(buffer);
        self
    }

    #[must_use]
    pub fn with_script(mut self, script: impl IntoIterator<Item = Step>) -> Self {
        self.script = script.into_iter().collect();
        self
    }

    /// Decorations created and not yet released
    pub fn live_decorations(&self) -> &[DecorationId] {
        &self.live_decorations
    }
}

impl Host for HeadlessHost {
    fn settings(&self) -> Settings {
        let Some(path) = &self.settings_path else {
            return Settings::default();
        };
        Settings::load(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default settings");
            Settings::default()
        })
    }

    fn active_editor(&mut self) -> Option<&mut dyn Editor> {
        self.editor.as_mut().map(|buffer| buffer as &mut dyn Editor)
    }

    fn workspace_folders(&self) -> &[PathBuf] {
        &self.folders
    }

    fn diagnostics(&self, path: &Path) -> Vec<Diagnostic> {
        self.diagnostics.get(path).cloned().unwrap_or_default()
    }

    fn open_document(&mut self, path: &Path, mode: OpenMode) -> Result<&mut dyn Editor, HostError> {
        let already_open = self
            .editor
            .as_ref()
            .is_some_and(|buffer| buffer.path() == Some(path));
        if !already_open {
            self.editor = Some(Buffer::open(path)?);
        }
        let buffer = self.editor.get_or_insert_with(|| Buffer::new(None, ""));
        buffer.mode = Some(mode);
        Ok(buffer as &mut dyn Editor)
    }

    fn show_error(&mut self, message: &str) {
        tracing::error!("{message}");
        self.errors.push(message.to_string());
    }

    fn create_surface(&mut self) -> Box<dyn FilterSurface> {
        Box::new(ScriptedSurface::new(self.script.clone()))
    }

    fn create_decoration(&mut self) -> DecorationId {
        self.next_decoration += 1;
        let decoration = DecorationId(self.next_decoration);
        self.live_decorations.push(decoration);
        decoration
    }

    fn release_decoration(&mut self, decoration: DecorationId) {
        if let Some(buffer) = self.editor.as_mut() {
            buffer.set_decorations(decoration, &[]);
        }
        self.live_decorations.retain(|d| *d != decoration);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn items() -> Vec<Item> {
        vec![
            Item::separator("Group"),
            Item::line("let alpha = 1;", 0),
            Item::line("let beta = 2;", 1),
            Item::line("Alphabet()", 2).with_description("beta"),
        ]
    }

    fn drain(surface: &mut ScriptedSurface) -> Vec<SurfaceEvent> {
        std::iter::from_fn(|| surface.next_event()).collect()
    }

    #[test]
    fn setting_items_activates_first_selectable() {
        let mut surface = ScriptedSurface::new([]);
        surface.show();
        surface.set_items(&items());
        assert_eq!(
            drain(&mut surface),
            vec![SurfaceEvent::ActiveChanged(Some(1)), SurfaceEvent::Hidden]
        );
    }

    #[test]
    fn active_changes_coalesce() {
        let mut surface = ScriptedSurface::new([Step::Accept]);
        surface.show();
        surface.set_items(&items());
        surface.set_active(2);
        assert_eq!(
            drain(&mut surface),
            vec![
                SurfaceEvent::ActiveChanged(Some(2)),
                SurfaceEvent::Accepted(Some(2)),
                SurfaceEvent::Hidden
            ]
        );
    }

    #[test]
    fn filter_is_case_insensitive_on_label_only() {
        let mut surface = ScriptedSurface::new([]);
        surface.set_items(&items());
        surface.set_value("ALPHA");
        let labels: Vec<_> = surface.visible().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["let alpha = 1;", "Alphabet()"]);

        surface.set_value("beta");
        let labels: Vec<_> = surface.visible().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["let beta = 2;"]);
    }

    #[test]
    fn description_matching_when_enabled() {
        let mut surface = ScriptedSurface::new([]);
        surface.set_match_on_description(true);
        surface.set_items(&items());
        surface.set_value("beta");
        assert_eq!(surface.visible().count(), 2);
    }

    #[test]
    fn label_sort_only_while_filtering() {
        let mut surface = ScriptedSurface::new([]);
        surface.set_sort_by_label(true);
        surface.set_items(&items());
        assert_eq!(surface.visible().count(), 4);
        surface.set_value("alpha");
        let labels: Vec<_> = surface.visible().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Alphabet()", "let alpha = 1;"]);
    }

    #[test]
    fn moving_skips_separators() {
        let mut surface = ScriptedSurface::new([Step::Down, Step::Down, Step::Down, Step::Up]);
        surface.show();
        surface.set_items(&items());
        assert_eq!(
            drain(&mut surface),
            vec![
                SurfaceEvent::ActiveChanged(Some(1)),
                SurfaceEvent::ActiveChanged(Some(2)),
                SurfaceEvent::ActiveChanged(Some(3)),
                SurfaceEvent::ActiveChanged(Some(2)),
                SurfaceEvent::Hidden,
            ]
        );
    }

    #[test]
    fn typing_with_no_match_clears_active() {
        let mut surface = ScriptedSurface::new([Step::Type("zzz".into()), Step::Accept]);
        surface.show();
        surface.set_items(&items());
        assert_eq!(
            drain(&mut surface),
            vec![
                SurfaceEvent::ActiveChanged(Some(1)),
                SurfaceEvent::ActiveChanged(None),
                SurfaceEvent::Accepted(None),
                SurfaceEvent::Hidden,
            ]
        );
    }

    #[test]
    fn release_clears_decoration() {
        let mut host = HeadlessHost::default().with_editor(Buffer::new(None, "x\n"));
        let decoration = host.create_decoration();
        host.active_editor()
            .unwrap()
            .set_decorations(decoration, &[Range::line(0, 1)]);
        host.release_decoration(decoration);
        assert!(host.editor.as_ref().unwrap().decorated(decoration).is_empty());
        assert!(host.live_decorations().is_empty());
    }

    #[test]
    fn open_missing_document_fails() {
        let mut host = HeadlessHost::default();
        let result = host.open_document(Path::new("/definitely/not/here.rs"), OpenMode::Pinned);
        assert!(matches!(result, Err(HostError::OpenFailed { .. })));
    }
}
