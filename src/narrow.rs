//! The narrowing control loop.
//!
//! One call to [`run`] is one invocation of a command:
//!
//! ```text
//! Idle -> SettingUp -> Populating -> Filtering <-> Previewing -> Accepted | Cancelled -> Disposed
//! ```
//!
//! A source that is not applicable goes straight from `SettingUp` to
//! `Disposed` without any UI. Whatever way the surface closes, `Disposed`
//! releases the surface and the preview decoration and, when the user left
//! the selection untouched, scrolls the original selection back into view.

use std::path::{Path, PathBuf};

use crate::host::{FilterSurface, Host, Selection, SurfaceEvent};
use crate::item::Item;
use crate::options::{Options, SortOrder};
use crate::source::{Preview, Setup, Source};

/// How an invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Setup declined; no surface was shown
    NotApplicable,
    Accepted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    SettingUp,
    Populating,
    Filtering,
    Previewing,
    Accepted,
    Cancelled,
    Disposed,
}

struct Machine {
    state: State,
}

impl Machine {
    fn to(&mut self, next: State) {
        tracing::trace!(from = ?self.state, to = ?next, "narrowing state");
        self.state = next;
    }
}

/// Run `source` through one full narrowing interaction on `host`.
pub fn run<S: Source>(host: &mut dyn Host, source: &S) -> Outcome {
    let mut machine = Machine { state: State::Idle };
    let activation = host.active_editor().map(|editor| Activation {
        path: editor.path().map(Path::to_path_buf),
        selection: editor.selection(),
    });

    machine.to(State::SettingUp);
    let context = match source.setup(host) {
        Setup::Ready(context) => context,
        Setup::NotApplicable => {
            tracing::debug!(placeholder = source.placeholder(), "source not applicable");
            machine.to(State::Disposed);
            return Outcome::NotApplicable;
        }
    };

    let options = Options::read(&host.settings());
    let preview = Preview {
        decoration: host.create_decoration(),
        reveal: options.active_line_viewport_reveal_type,
    };

    machine.to(State::Populating);
    let mut surface = host.create_surface();
    let initial = source.initial_search_term(host, &context, &options);
    surface.set_placeholder(source.placeholder());
    surface.set_value(&initial);
    surface.set_match_on_description(false);
    surface.set_sort_by_label(options.sort_order == SortOrder::Label);
    surface.set_busy(true);
    surface.show();

    let items = source.prepare_items(host, &context);
    tracing::debug!(count = items.len(), initial = %initial, "items ready");
    surface.set_items(&items);
    if let Some(line) = activation.as_ref().map(|a| a.selection.active.line)
        && let Some(position) = items.iter().position(|item| item.line_index() == Some(line))
    {
        surface.set_active(position);
    }
    surface.set_busy(false);

    machine.to(State::Filtering);
    let mut first_active_change = true;
    let mut outcome = Outcome::Cancelled;

    while let Some(event) = surface.next_event() {
        match event {
            SurfaceEvent::ActiveChanged(active) => {
                // the first change only reflects the initial highlight
                if std::mem::replace(&mut first_active_change, false) {
                    continue;
                }
                let Some(item) = selectable(&items, active) else {
                    continue;
                };
                machine.to(State::Previewing);
                if let Err(e) = source.on_preview(host, item, &context, &preview) {
                    tracing::debug!(error = %e, label = %item.label, "preview failed");
                }
                machine.to(State::Filtering);
            }
            SurfaceEvent::Accepted(active) => {
                if outcome == Outcome::Accepted {
                    continue;
                }
                let Some(item) = selectable(&items, active) else {
                    continue;
                };
                let search = surface.value();
                tracing::info!(label = %item.label, %search, "accepted");
                if let Err(e) = source.on_accept(host, item, &context, &search, &options) {
                    tracing::warn!(error = %e, "accept failed");
                    host.show_error(&e.to_string());
                }
                machine.to(State::Accepted);
                outcome = Outcome::Accepted;
                surface.hide();
            }
            SurfaceEvent::Hidden => break,
        }
    }

    if outcome == Outcome::Cancelled {
        machine.to(State::Cancelled);
    }
    dispose(host, surface, &preview, activation, &options);
    machine.to(State::Disposed);
    outcome
}

/// The document and selection active when the command started
struct Activation {
    path: Option<PathBuf>,
    selection: Selection,
}

fn selectable(items: &[Item], active: Option<usize>) -> Option<&Item> {
    active
        .and_then(|index| items.get(index))
        .filter(|item| !item.is_separator())
}

fn dispose(
    host: &mut dyn Host,
    mut surface: Box<dyn FilterSurface>,
    preview: &Preview,
    activation: Option<Activation>,
    options: &Options,
) {
    surface.dispose();
    host.release_decoration(preview.decoration);

    // only restore when the same document is still showing, untouched
    if let Some(original) = activation
        && let Some(editor) = host.active_editor()
        && editor.path() == original.path.as_deref()
        && editor.selection() == original.selection
    {
        editor.reveal(
            original.selection.range(),
            options.active_line_viewport_reveal_type,
        );
    }
}
