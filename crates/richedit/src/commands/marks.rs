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

//! Mark (inline formatting) commands: `toggleMark`, `setMark`,
//! `clearFormatting`, `markActive`, `getActiveMarks`.

use crate::model::mark::{Attrs, Mark};
use crate::model::node::Node;
use crate::plugin::DispatchFn;
use crate::state::EditorState;

use super::run;

/// `toggleMark(markType, attrs?)`: over a non-empty selection, removes the mark
/// if every text node in range already carries it, otherwise adds it to the
/// whole range; over a collapsed selection, toggles the mark in `storedMarks`
/// instead.
pub fn toggle_mark(
    mark_type: impl Into<String>,
    attrs: Attrs,
) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    let mark_type = mark_type.into();
    move |state, dispatch| {
        let mark_type = mark_type.clone();
        let attrs = attrs.clone();
        run(state, dispatch, |state, tr| {
            let sel = state.selection();
            let mark = Mark::with_attrs(mark_type.clone(), attrs.clone());
            if sel.empty() {
                let mut stored = state.stored_marks().to_vec();
                if stored.iter().any(|m| m.mark_type == mark_type) {
                    stored.retain(|m| m.mark_type != mark_type);
                } else {
                    stored.push(mark.clone());
                }
                tr.set_stored_marks(Some(stored));
                return Ok(());
            }
            if range_fully_marked(state.doc(), sel.from(), sel.to(), &mark_type) {
                tr.remove_mark(sel.from(), sel.to(), mark)?;
            } else {
                tr.add_mark(sel.from(), sel.to(), mark)?;
            }
            Ok(())
        })
    }
}

/// `setMark(markType, attrs)`: unconditionally applies the mark (unlike
/// `toggleMark`, never removes it) — used for link-style marks whose
/// attrs matter more than presence/absence.
pub fn set_mark(mark_type: impl Into<String>, attrs: Attrs) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    let mark_type = mark_type.into();
    move |state, dispatch| {
        let mark = Mark::with_attrs(mark_type.clone(), attrs.clone());
        run(state, dispatch, |state, tr| {
            let sel = state.selection();
            if sel.empty() {
                let mut stored = state.stored_marks().to_vec();
                stored.retain(|m| m.mark_type != mark.mark_type);
                stored.push(mark.clone());
                tr.set_stored_marks(Some(stored));
            } else {
                tr.add_mark(sel.from(), sel.to(), mark.clone())?;
            }
            Ok(())
        })
    }
}

/// `clearFormatting`: removes every mark type present anywhere in the
/// selection (or clears `storedMarks` for a collapsed caret).
pub fn clear_formatting(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let sel = state.selection();
        if sel.empty() {
            if !state.stored_marks().is_empty() {
                tr.set_stored_marks(Some(vec![]));
            }
            return Ok(());
        }
        for mark_type in marks_in_range(state.doc(), sel.from(), sel.to()) {
            tr.remove_mark(sel.from(), sel.to(), Mark::new(mark_type))?;
        }
        Ok(())
    })
}

/// `markActive(state, markType)`: true if every text position in a
/// non-empty selection carries the mark, or if a collapsed caret's
/// `storedMarks` (falling back to the marks right before the caret)
/// include it.
pub fn mark_active(state: &EditorState, mark_type: &str) -> bool {
    let sel = state.selection();
    if sel.empty() {
        if !state.stored_marks().is_empty() {
            return state.stored_marks().iter().any(|m| m.mark_type == mark_type);
        }
        return marks_before_cursor(state.doc(), sel.head)
            .iter()
            .any(|m| m.mark_type == mark_type);
    }
    range_fully_marked(state.doc(), sel.from(), sel.to(), mark_type)
}

/// `getActiveMarks(state)`: the set of mark types active at the current
/// selection, by the same rule as [`mark_active`].
pub fn get_active_marks(state: &EditorState) -> Vec<String> {
    let sel = state.selection();
    let candidates: Vec<String> = if sel.empty() {
        if !state.stored_marks().is_empty() {
            state.stored_marks().iter().map(|m| m.mark_type.clone()).collect()
        } else {
            marks_before_cursor(state.doc(), sel.head)
                .iter()
                .map(|m| m.mark_type.clone())
                .collect()
        }
    } else {
        marks_in_range(state.doc(), sel.from(), sel.to())
    };
    candidates
        .into_iter()
        .filter(|mt| sel.empty() || range_fully_marked(state.doc(), sel.from(), sel.to(), mt))
        .collect()
}

fn marks_before_cursor(doc: &Node, pos: usize) -> Vec<Mark> {
    if pos == 0 {
        return vec![];
    }
    crate::model::position::resolve(doc, pos)
        .ok()
        .and_then(|r| r.node_before().map(|n| n.marks().to_vec()))
        .unwrap_or_default()
}

/// All distinct mark types carried by any text node overlapping
/// `[from, to)`.
fn marks_in_range(doc: &Node, from: usize, to: usize) -> Vec<String> {
    let mut found = Vec::new();
    doc.nodes_between(from, to, 0, &mut |node, _pos, _parent, _idx| {
        if let Node::Text(t) = node {
            for m in &t.marks {
                if !found.contains(&m.mark_type) {
                    found.push(m.mark_type.clone());
                }
            }
        }
        true
    });
    found
}

/// True if every text node overlapping `[from, to)` carries `mark_type`.
/// A range with no text nodes at all is considered unmarked.
fn range_fully_marked(doc: &Node, from: usize, to: usize, mark_type: &str) -> bool {
    let mut any_text = false;
    let mut all_marked = true;
    doc.nodes_between(from, to, 0, &mut |node, _pos, _parent, _idx| {
        if let Node::Text(t) = node {
            any_text = true;
            if !t.marks.iter().any(|m| m.mark_type == mark_type) {
                all_marked = false;
            }
        }
        true
    });
    any_text && all_marked
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::selection::Selection;
    use crate::schema::default_schema::default_schema;
    use crate::state::ContentInit;

    fn state_with(text: &str, from: usize, to: usize) -> EditorState {
        EditorState::create(
            default_schema(),
            Some(ContentInit::Text(text.into())),
            Some(Selection::new(from, to)),
        )
        .unwrap()
    }

    #[test]
    fn toggle_mark_adds_over_unmarked_range() {
        let state = state_with("hello", 1, 6);
        let mut dispatched = None;
        let cmd = toggle_mark("strong", Attrs::new());
        assert!(cmd(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert!(range_fully_marked(tr.doc(), 1, 6, "strong"));
    }

    #[test]
    fn toggle_mark_removes_when_fully_marked() {
        let state = state_with("hello", 1, 6);
        let mut dispatched = None;
        let add = toggle_mark("strong", Attrs::new());
        assert!(add(&state, Some(&mut |tr| dispatched = Some(tr))));
        let outcome = state.apply(dispatched.unwrap()).unwrap();
        let marked_state = outcome.state;

        let mut dispatched2 = None;
        let toggle_again = toggle_mark("strong", Attrs::new());
        assert!(toggle_again(&marked_state, Some(&mut |tr| dispatched2 = Some(tr))));
        let tr2 = dispatched2.unwrap();
        assert!(!range_fully_marked(tr2.doc(), 1, 6, "strong"));
    }

    #[test]
    fn toggle_mark_on_collapsed_caret_sets_stored_marks() {
        let state = state_with("hello", 3, 3);
        let mut dispatched = None;
        let cmd = toggle_mark("em", Attrs::new());
        assert!(cmd(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert!(tr.stored_marks().unwrap().iter().any(|m| m.mark_type == "em"));
    }

    #[test]
    fn mark_active_reports_collapsed_caret_from_stored_marks() {
        let mut state = state_with("hello", 3, 3);
        let mut dispatched = None;
        let cmd = toggle_mark("em", Attrs::new());
        assert!(cmd(&state, Some(&mut |tr| dispatched = Some(tr))));
        state = state.apply(dispatched.unwrap()).unwrap().state;
        assert!(mark_active(&state, "em"));
    }
}
