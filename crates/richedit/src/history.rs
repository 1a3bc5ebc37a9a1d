// Copyright 2024 richedit contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Undo/redo. Each commit snapshots the whole document and selection rather
//! than inverting individual steps: `Transaction` already carries
//! `doc_before`/`doc`, and the external contract (undo restores the exact prior
//! selection, not merely a mapped approximation of it) is simplest to satisfy
//! by replaying a whole-tree `replaceRange` back to the recorded snapshot.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::model::selection::Selection;
use crate::plugin::{DispatchFn, Plugin};
use crate::state::EditorState;

/// One undoable commit: the document and selection immediately before and
/// after a transaction that changed the document.
#[derive(Clone, Debug)]
struct HistoryEntry {
    doc_before: crate::model::node::Node,
    selection_before: Selection,
    doc_after: crate::model::node::Node,
    selection_after: Selection,
}

#[derive(Default)]
struct HistoryState {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    /// Set by `undo`/`redo` so the replaying transaction isn't itself
    /// recorded as a new undoable commit.
    suppress: bool,
}

/// Tracks document history for one editor and exposes it both as an
/// [`EditorState`] plugin (`state_did_update` records commits) and as
/// plain `undo`/`redo`/`can_undo`/`can_redo`/`clear` methods for the
/// engine's programmatic API.
#[derive(Clone)]
pub struct HistoryPlugin {
    inner: Arc<Mutex<HistoryState>>,
    max_depth: usize,
}

impl HistoryPlugin {
    pub fn new(max_depth: usize) -> Self {
        HistoryPlugin {
            inner: Arc::new(Mutex::new(HistoryState::default())),
            max_depth,
        }
    }

    /// The `Plugin` record to register with the [`crate::plugin::PluginManager`].
    /// Its `state_did_update` hook records a new undo entry whenever the
    /// document actually changed, skipping selection-only updates and the
    /// replay transactions `undo`/`redo` themselves dispatch.
    pub fn as_plugin(&self) -> Plugin {
        let inner = self.inner.clone();
        let max_depth = self.max_depth;
        Plugin::new("history").with_state_did_update(move |new_state, old_state| {
            let mut history = inner.lock().expect("history lock poisoned");
            if history.suppress {
                history.suppress = false;
                return;
            }
            if new_state.doc() == old_state.doc() {
                return;
            }
            history.redo_stack.clear();
            history.undo_stack.push(HistoryEntry {
                doc_before: old_state.doc().clone(),
                selection_before: old_state.selection(),
                doc_after: new_state.doc().clone(),
                selection_after: new_state.selection(),
            });
            while history.undo_stack.len() > max_depth {
                history.undo_stack.remove(0);
            }
            debug!(depth = history.undo_stack.len(), "recorded undo entry");
        })
    }

    fn cap(&self, history: &mut HistoryState) {
        while history.undo_stack.len() > self.max_depth {
            history.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.inner.lock().expect("history lock poisoned").undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.inner.lock().expect("history lock poisoned").redo_stack.is_empty()
    }

    pub fn clear(&self) {
        let mut history = self.inner.lock().expect("history lock poisoned");
        history.undo_stack.clear();
        history.redo_stack.clear();
    }

    /// `undo()`: restores the document and selection recorded immediately
    /// before the most recent commit, or `None` if there is nothing to
    /// undo. The returned transaction still needs dispatching through
    /// [`EditorState::apply`] by the caller.
    pub fn undo(&self, state: &EditorState) -> Option<crate::transaction::Transaction> {
        let mut history = self.inner.lock().expect("history lock poisoned");
        let entry = history.undo_stack.pop()?;
        history.redo_stack.push(entry.clone());
        history.suppress = true;
        drop(history);
        Some(replay(state, &entry.doc_before, entry.selection_before))
    }

    /// `redo()`: re-applies the most recently undone commit.
    pub fn redo(&self, state: &EditorState) -> Option<crate::transaction::Transaction> {
        let mut history = self.inner.lock().expect("history lock poisoned");
        let entry = history.redo_stack.pop()?;
        history.undo_stack.push(entry.clone());
        self.cap(&mut history);
        history.suppress = true;
        drop(history);
        Some(replay(state, &entry.doc_after, entry.selection_after))
    }
}

/// Builds a transaction against `state` that replaces its entire content
/// with `target_doc`'s children and sets the selection to `selection`.
fn replay(
    state: &EditorState,
    target_doc: &crate::model::node::Node,
    selection: Selection,
) -> crate::transaction::Transaction {
    let mut tr = state.transaction();
    let from = 0;
    let to = state.doc().content_size();
    let children = target_doc.children().to_vec();
    tr.replace_range(from, to, children)
        .expect("a previously-valid document replays cleanly");
    tr.set_selection(selection);
    tr
}

/// `undo` command, wired into the engine's base keymap under `Mod-z`.
pub fn undo_command(history: HistoryPlugin) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        let Some(tr) = history.undo(state) else {
            return false;
        };
        if let Some(dispatch) = dispatch {
            dispatch(tr);
        }
        true
    }
}

/// `redo` command, wired into the engine's base keymap under
/// `Mod-y`/`Mod-Shift-z`.
pub fn redo_command(history: HistoryPlugin) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        let Some(tr) = history.redo(state) else {
            return false;
        };
        if let Some(dispatch) = dispatch {
            dispatch(tr);
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::selection::Selection;
    use crate::plugin::PluginManager;
    use crate::schema::default_schema::default_schema;
    use crate::state::ContentInit;

    fn state_with(text: &str) -> EditorState {
        let history = HistoryPlugin::new(100);
        let mut plugins = PluginManager::new();
        plugins.register(history.as_plugin());
        EditorState::create(default_schema(), Some(ContentInit::Text(text.into())), None)
            .unwrap()
            .with_plugins(plugins)
    }

    #[test]
    fn undo_redo_restores_doc_and_selection() {
        let history = HistoryPlugin::new(100);
        let mut plugins = PluginManager::new();
        plugins.register(history.as_plugin());
        let state = EditorState::create(
            default_schema(),
            Some(ContentInit::Text("abcdef".into())),
            Some(Selection::new(2, 5)),
        )
        .unwrap()
        .with_plugins(plugins);

        let mut tr = state.transaction();
        tr.delete_range(2, 5).unwrap();
        let after_delete = state.apply(tr).unwrap().state;
        assert_eq!(after_delete.doc().text_content(), "af");

        assert!(history.can_undo());
        let undo_tr = history.undo(&after_delete).unwrap();
        let undone = after_delete.apply(undo_tr).unwrap().state;
        assert_eq!(undone.doc().text_content(), "abcdef");
        assert_eq!(undone.selection(), Selection::new(2, 5));

        assert!(history.can_redo());
        let redo_tr = history.redo(&undone).unwrap();
        let redone = undone.apply(redo_tr).unwrap().state;
        assert_eq!(redone.doc().text_content(), "af");
    }

    #[test]
    fn selection_only_update_is_not_recorded() {
        let state = state_with("hello");
        let mut tr = state.transaction();
        tr.set_selection(Selection::cursor(2));
        let moved = state.apply(tr).unwrap().state;

        let history = HistoryPlugin::new(100);
        assert!(!history.can_undo());
        let _ = moved;
    }

    #[test]
    fn can_undo_false_on_fresh_history() {
        let history = HistoryPlugin::new(100);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn clear_drops_both_stacks() {
        let history = HistoryPlugin::new(100);
        let mut plugins = PluginManager::new();
        plugins.register(history.as_plugin());
        let state = EditorState::create(default_schema(), Some(ContentInit::Text("abc".into())), None)
            .unwrap()
            .with_plugins(plugins);
        let mut tr = state.transaction();
        tr.insert_text(1, "x", vec![]).unwrap();
        let next = state.apply(tr).unwrap().state;
        let _ = next;
        assert!(history.can_undo());
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
