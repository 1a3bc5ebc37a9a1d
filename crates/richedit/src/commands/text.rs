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

//! Text-editing commands: `insertText`, `deleteBackward`, `deleteForward`,
//! `splitBlock`, `insertHardBreak`.

use crate::model::mark::Attrs;
use crate::model::node::Node;
use crate::model::position::{resolve, ResolvedPos};
use crate::model::selection::Selection;
use crate::plugin::DispatchFn;
use crate::state::EditorState;

use super::{innermost_container_pos, run};

/// `insertText(text)`: replaces the current selection (if any) with `text`,
/// wrapped in the state's current `storedMarks` — clearing them afterwards.
pub fn insert_text(text: impl Into<String>) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    let text: String = text.into();
    move |state, dispatch| {
        let text = text.clone();
        run(state, dispatch, |state, tr| {
            let sel = state.selection();
            let marks = state.stored_marks().to_vec();
            if !sel.empty() {
                tr.delete_range(sel.from(), sel.to())?;
            }
            let pos = sel.from();
            let len = text.chars().count();
            tr.insert_text(pos, text.clone(), marks)?;
            tr.set_selection(Selection::cursor(pos + len));
            if !state.stored_marks().is_empty() {
                tr.set_stored_marks(None);
            }
            Ok(())
        })
    }
}

/// `deleteBackward`: deletes the selection if non-empty; otherwise deletes one
/// position backward, joining with the previous sibling block when the cursor
/// sits at the very start of a block's content and the merge is structurally
/// valid.
pub fn delete_backward(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let sel = state.selection();
        if !sel.empty() {
            tr.delete_range(sel.from(), sel.to())?;
            return Ok(());
        }
        let head = sel.head;
        if head == 0 {
            return Ok(());
        }
        let resolved = resolve(state.doc(), head).expect("selection kept in range");
        if resolved.parent_offset() == 0 && resolved.depth() > 0 {
            if let Some((prev_pos, merged, cursor_at)) = try_join_with_previous(state, &resolved) {
                let cur_pos = innermost_container_pos(&resolved).unwrap();
                let cur_size = resolved.parent().node_size();
                tr.replace_range(prev_pos, cur_pos + cur_size, vec![merged])?;
                tr.set_selection(Selection::cursor(cursor_at));
                return Ok(());
            }
        }
        tr.delete_range(head - 1, head)?;
        Ok(())
    })
}

/// `deleteForward`: mirror of [`delete_backward`] towards the end of the
/// document; a full block-join on the forward side is left unimplemented
/// (falls back to a plain single-position delete), matching the scope
/// noted for `delete_backward`'s own cross-level joins.
pub fn delete_forward(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let sel = state.selection();
        if !sel.empty() {
            tr.delete_range(sel.from(), sel.to())?;
            return Ok(());
        }
        let head = sel.head;
        let max = state.doc().content_size();
        if head >= max {
            return Ok(());
        }
        tr.delete_range(head, head + 1)?;
        Ok(())
    })
}

/// Attempts to merge the block surrounding `resolved` with its previous sibling
/// under the same immediate parent, returning `(prev_block_pos, merged_node,
/// cursor_pos)` when the merge is structurally valid — same node type, and the
/// combined children still satisfy the parent's content expression.
fn try_join_with_previous(state: &EditorState, resolved: &ResolvedPos) -> Option<(usize, Node, usize)> {
    let depth = resolved.depth();
    if depth == 0 {
        return None;
    }
    // path[depth-1]: the container one level above the block (its
    // immediate parent), with `.index`/`.offset` describing the block's
    // own slot and absolute position within that parent.
    let entry = &resolved.path()[depth - 1];
    if entry.index == 0 {
        return None;
    }
    let parent_node = entry.node;
    let block_pos = entry.offset;
    let prev_sibling = &parent_node.children()[entry.index - 1];
    let current_block = resolved.parent();
    if prev_sibling.node_type() != current_block.node_type() || !prev_sibling.is_container() {
        return None;
    }
    let merged_children: Vec<Node> = prev_sibling
        .children()
        .iter()
        .chain(current_block.children().iter())
        .cloned()
        .collect();
    if !state.schema().valid_content(prev_sibling.node_type(), &merged_children) {
        return None;
    }
    let merged = state
        .schema()
        .node(
            prev_sibling.node_type(),
            prev_sibling.attrs().cloned().unwrap_or_default(),
            merged_children,
            vec![],
        )
        .ok()?;
    let prev_pos = block_pos - prev_sibling.node_size();
    let cursor_at = prev_pos + 1 + prev_sibling.content_size();
    Some((prev_pos, merged, cursor_at))
}

/// Splits the innermost block at the cursor into two siblings of the same type
/// . When the block's immediate parent is a `listItem` holding only that block,
/// the list item itself is split so each half keeps its own item; splitting an
/// empty item this way lifts it out of the list instead, turning it into a
/// trailing paragraph.
pub fn split_block(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let sel = state.selection();
        if !sel.empty() {
            tr.delete_range(sel.from(), sel.to())?;
        }
        let doc_after_delete = tr.doc().clone();
        let resolved = resolve(&doc_after_delete, sel.from()).expect("in range");
        let depth = resolved.depth();
        if depth == 0 {
            return Ok(());
        }

        let block = resolved.parent();
        let block_parent_entry = &resolved.path()[depth - 1];
        let block_pos = block_parent_entry.offset;

        if block_parent_entry.node.node_type() == "listItem"
            && depth >= 2
            && block_parent_entry.node.children().len() == 1
        {
            let list_item = block_parent_entry.node;
            let grandparent_entry = &resolved.path()[depth - 2];
            let list_item_pos = grandparent_entry.offset;

            if block.content_size() == 0 && resolved.parent_offset() == 0 {
                let new_para = state.schema().node("paragraph", Attrs::new(), vec![], vec![])?;
                tr.replace_range(list_item_pos, list_item_pos + list_item.node_size(), vec![new_para])?;
                tr.set_selection(Selection::cursor(list_item_pos + 1));
                return Ok(());
            }

            let (before_block, after_block) = split_block_node(state, block, resolved.parent_offset())?;
            let before_item = state.schema().node(
                "listItem",
                list_item.attrs().cloned().unwrap_or_default(),
                vec![before_block],
                vec![],
            )?;
            let after_item = state.schema().node(
                "listItem",
                list_item.attrs().cloned().unwrap_or_default(),
                vec![after_block],
                vec![],
            )?;
            let cursor_at = list_item_pos + before_item.node_size() + 1;
            tr.replace_range(
                list_item_pos,
                list_item_pos + list_item.node_size(),
                vec![before_item, after_item],
            )?;
            tr.set_selection(Selection::cursor(cursor_at));
            return Ok(());
        }

        let (before, after) = split_block_node(state, block, resolved.parent_offset())?;
        let cursor_at = block_pos + before.node_size() + 1;
        tr.replace_range(block_pos, block_pos + block.node_size(), vec![before, after])?;
        tr.set_selection(Selection::cursor(cursor_at));
        Ok(())
    })
}

/// Splits `block`'s children at local content offset `at`, rebuilding
/// two nodes of the same type/attrs through the schema.
fn split_block_node(
    state: &EditorState,
    block: &Node,
    at: usize,
) -> Result<(Node, Node), crate::error::EngineError> {
    let (before_children, after_children) = split_children_at(block.children(), at);
    let before = state.schema().node(
        block.node_type(),
        block.attrs().cloned().unwrap_or_default(),
        before_children,
        vec![],
    )?;
    let after = state.schema().node(
        block.node_type(),
        block.attrs().cloned().unwrap_or_default(),
        after_children,
        vec![],
    )?;
    Ok((before, after))
}

/// Splits a flat child list at local content offset `at`, cutting a text
/// node's string when `at` falls inside one.
fn split_children_at(children: &[Node], at: usize) -> (Vec<Node>, Vec<Node>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0usize;
    for child in children {
        let size = child.node_size();
        if pos + size <= at {
            before.push(child.clone());
        } else if pos >= at {
            after.push(child.clone());
        } else if let Node::Text(t) = child {
            let local = at - pos;
            let chars: Vec<char> = t.text.chars().collect();
            let lo: String = chars[..local].iter().collect();
            let hi: String = chars[local..].iter().collect();
            if !lo.is_empty() {
                before.push(Node::new_text_unchecked(lo, t.marks.clone()));
            }
            if !hi.is_empty() {
                after.push(Node::new_text_unchecked(hi, t.marks.clone()));
            }
        } else {
            before.push(child.clone());
        }
        pos += size;
    }
    (before, after)
}

/// `insertHardBreak` (Shift-Enter): inserts a `hardBreak` leaf at the
/// cursor, replacing a non-empty selection first.
pub fn insert_hard_break(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let sel = state.selection();
        if !sel.empty() {
            tr.delete_range(sel.from(), sel.to())?;
        }
        let pos = sel.from();
        let br = state.schema().node("hardBreak", Attrs::new(), vec![], vec![])?;
        tr.replace_range(pos, pos, vec![br])?;
        tr.set_selection(Selection::cursor(pos + 1));
        Ok(())
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::default_schema::default_schema;
    use crate::state::ContentInit;

    fn state_with(text: &str, pos: usize) -> EditorState {
        EditorState::create(
            default_schema(),
            Some(ContentInit::Text(text.into())),
            Some(Selection::cursor(pos)),
        )
        .unwrap()
    }

    #[test]
    fn insert_text_into_fresh_doc() {
        let state = EditorState::create(default_schema(), None, None).unwrap();
        let mut dispatched = None;
        let cmd = insert_text("hello".to_string());
        assert!(cmd(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert_eq!(tr.doc().text_content(), "hello");
        assert_eq!(tr.selection(), Some(Selection::cursor(6)));
    }

    #[test]
    fn enter_splits_block_at_cursor() {
        let state = state_with("abcdef", 4);
        let mut dispatched = None;
        assert!(split_block(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        let children: Vec<_> = tr.doc().children().iter().map(Node::text_content).collect();
        assert_eq!(children, vec!["abc".to_string(), "def".to_string()]);
        assert_eq!(tr.selection(), Some(Selection::cursor(6)));
    }

    #[test]
    fn backspace_at_char_deletes_one() {
        let state = state_with("hello", 3);
        let mut dispatched = None;
        assert!(delete_backward(&state, Some(&mut |tr| dispatched = Some(tr))));
        assert_eq!(dispatched.unwrap().doc().text_content(), "helo");
    }

    #[test]
    fn backspace_at_doc_start_is_noop() {
        let state = state_with("hi", 1);
        assert!(!delete_backward(&state, None));
    }

    #[test]
    fn backspace_at_block_start_joins_with_previous() {
        let schema = default_schema();
        let p1 = schema
            .node("paragraph", Attrs::new(), vec![schema.text("abc", vec![]).unwrap()], vec![])
            .unwrap();
        let p2 = schema
            .node("paragraph", Attrs::new(), vec![schema.text("def", vec![]).unwrap()], vec![])
            .unwrap();
        let doc = schema.node("document", Attrs::new(), vec![p1, p2], vec![]).unwrap();
        // "abc" paragraph has nodeSize 5 (1 + 3 + 1), so position 6 is the
        // start of the second paragraph's content.
        let state = EditorState::from_json(
            default_schema(),
            crate::state::EditorStateJson {
                doc,
                selection: crate::state::SelectionJson { anchor: 6, head: 6 },
                marks: vec![],
            },
        )
        .unwrap();
        let mut dispatched = None;
        assert!(delete_backward(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert_eq!(tr.doc().text_content(), "abcdef");
        assert_eq!(tr.doc().children().len(), 1);
    }

    #[test]
    fn shift_enter_inserts_hard_break() {
        let state = state_with("ab", 2);
        let mut dispatched = None;
        assert!(insert_hard_break(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert_eq!(tr.doc().children()[0].children().len(), 2);
    }
}
