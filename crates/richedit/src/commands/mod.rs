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

//! State→(Transaction?) commands. Every command has the shape `(state,
//! dispatch?) -> bool`: called with `dispatch = None` it must perform no
//! observable side effect and only report whether it would apply; called with
//! `dispatch = Some(f)` it builds the transaction and, if non-empty, passes it
//! to `f` before returning `true`. [`run`] centralizes that contract so
//! individual commands only need to describe how to build the transaction.

pub mod blocks;
pub mod lists;
pub mod marks;
pub mod media;
pub mod nav;
pub mod tables;
pub mod text;

use crate::error::EngineError;
use crate::model::node::Node;
use crate::model::position::{resolve, ResolvedPos};
use crate::model::selection::Selection;
use crate::plugin::DispatchFn;
use crate::state::EditorState;
use crate::transaction::Transaction;

/// Runs the dry-run/dispatch contract around a transaction-building
/// closure. `build` returns `Err` for a command that cannot apply at all
/// (e.g. out-of-range selection); it returns `Ok(tr)` with an empty
/// transaction for a command that legitimately does nothing (e.g.
/// deleting backward at position 0).
pub fn run(
    state: &EditorState,
    dispatch: Option<DispatchFn>,
    build: impl FnOnce(&EditorState, &mut Transaction) -> Result<(), EngineError>,
) -> bool {
    let mut tr = state.transaction();
    match build(state, &mut tr) {
        Ok(()) if !tr.is_empty() || tr.selection().is_some() || tr.stored_marks().is_some() => {
            if let Some(dispatch) = dispatch {
                dispatch(tr);
            }
            true
        }
        _ => false,
    }
}

/// Resolves the selection's `head`, the common entry point for commands
/// that act relative to the caret.
pub fn resolve_head(state: &EditorState) -> ResolvedPos<'_> {
    resolve(state.doc(), state.selection().head).expect("selection is always kept in range")
}

/// The absolute position of the innermost container directly surrounding
/// `resolved` — i.e. the block/cell/list-item that holds the text or inline
/// content at this position. `None` at the document root itself.
pub fn innermost_container_pos(resolved: &ResolvedPos) -> Option<usize> {
    if resolved.depth() == 0 {
        None
    } else {
        Some(resolved.path()[resolved.depth() - 1].offset)
    }
}

/// Node size of the block at `pos` (needed to compute its covering
/// range `[pos, pos + size)` for range-based steps).
pub fn node_size_at(doc: &Node, pos: usize) -> usize {
    resolve(doc, pos)
        .ok()
        .and_then(|r| r.parent().children().get(r.index()).map(Node::node_size))
        .unwrap_or(0)
}

/// Higher-order command adapter: runs `base`, then — if it produced a
/// transaction — overrides the resulting selection so `anchor` stays fixed and
/// only `head` moves, the way Shift+motion should behave.
pub fn extend_selection(
    base: impl Fn(&EditorState, Option<DispatchFn>) -> bool + Send + Sync + 'static,
) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool + Send + Sync + 'static {
    move |state, dispatch| {
        let anchor = state.selection().anchor;
        let mut captured: Option<Transaction> = None;
        let applied = base(state, Some(&mut |tr| captured = Some(tr)));
        if !applied {
            return false;
        }
        let Some(mut tr) = captured else { return false };
        let new_head = tr.selection().map(|s| s.head).unwrap_or_else(|| {
            state.selection().map(tr.mapping()).head
        });
        tr.set_selection(Selection::new(anchor, new_head));
        if let Some(dispatch) = dispatch {
            dispatch(tr);
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::default_schema::default_schema;
    use crate::state::ContentInit;

    #[test]
    fn run_reports_false_without_mutation() {
        let state = EditorState::create(default_schema(), None, None).unwrap();
        let applied = run(&state, None, |_, _| Ok(()));
        assert!(!applied);
    }

    #[test]
    fn run_dispatches_when_transaction_nonempty() {
        let state = EditorState::create(default_schema(), None, None).unwrap();
        let mut dispatched = None;
        let applied = run(&state, Some(&mut |tr| dispatched = Some(tr)), |_, tr| {
            tr.insert_text(1, "hi", vec![])?;
            Ok(())
        });
        assert!(applied);
        assert!(dispatched.is_some());
    }

    #[test]
    fn dry_run_builds_but_does_not_dispatch() {
        let state = EditorState::create(default_schema(), None, None).unwrap();
        let applied = run(&state, None, |_, tr| {
            tr.insert_text(1, "hi", vec![])?;
            Ok(())
        });
        assert!(applied);
    }

    #[test]
    fn extend_selection_keeps_anchor_fixed() {
        let state = EditorState::create(
            default_schema(),
            Some(ContentInit::Text("hello".into())),
            Some(Selection::new(3, 3)),
        )
        .unwrap();
        let move_right = |s: &EditorState, dispatch: Option<DispatchFn>| {
            run(s, dispatch, |s, tr| {
                tr.set_selection(Selection::cursor(s.selection().head + 1));
                Ok(())
            })
        };
        let extended = extend_selection(move_right);
        let mut dispatched = None;
        let applied = extended(&state, Some(&mut |tr| dispatched = Some(tr)));
        assert!(applied);
        let tr = dispatched.unwrap();
        assert_eq!(tr.selection(), Some(Selection::new(3, 4)));
    }
}
