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

//! List commands: `toggleBulletList`, `toggleOrderedList`, `toggleChecklist`,
//! `listIndent`, `listOutdent`.

use crate::model::mark::{AttrValue, Attrs};
use crate::model::node::Node;
use crate::model::position::ResolvedPos;
use crate::plugin::DispatchFn;
use crate::state::EditorState;

use super::{resolve_head, run};

/// Finds the nearest `bulletList`/`orderedList` ancestor of `resolved`,
/// returning `(depth_of_list, list_node, list_pos)`.
fn enclosing_list<'a>(resolved: &ResolvedPos<'a>) -> Option<(usize, &'a Node, usize)> {
    for depth in (0..=resolved.depth()).rev() {
        let node = resolved.path()[depth].node;
        if node.node_type() == "bulletList" || node.node_type() == "orderedList" {
            // `path[depth]` is the list itself; its own absolute position
            // is recorded one level up, at `path[depth-1].offset` — or 0
            // if the list is a direct child of the document root's own
            // content (depth == 0 meaning no entry further up exists).
            let pos = if depth == 0 {
                0
            } else {
                resolved.path()[depth - 1].offset
            };
            return Some((depth, node, pos));
        }
    }
    None
}

/// Wraps the current block in `listItem` then `bulletList`/`orderedList` if not
/// already inside a list of that kind; unwraps out of both wrappers if it is.
fn toggle_list(list_type: &'static str) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        run(state, dispatch, |state, tr| {
            let resolved = resolve_head(state);
            if resolved.depth() == 0 {
                return Ok(());
            }
            if let Some((_, list_node, list_pos)) = enclosing_list(&resolved) {
                if list_node.node_type() == list_type {
                    tr.unwrap(list_pos, list_node.node_size())?;
                    return Ok(());
                }
                // Inside the other list type: change it in place.
                tr.set_block_type(list_pos, list_type, list_node.attrs().cloned().unwrap_or_default())?;
                return Ok(());
            }
            let block_entry = &resolved.path()[resolved.depth() - 1];
            let block = resolved.parent();
            let block_pos = block_entry.offset;
            tr.wrap_in(block_pos, block_pos + block.node_size(), "listItem", Attrs::new())?;
            // Re-resolve: the listItem now wraps the block at the same
            // `block_pos` (wrapping doesn't shift the start boundary).
            let list_item_size = block.node_size() + 2;
            tr.wrap_in(block_pos, block_pos + list_item_size, list_type, Attrs::new())?;
            Ok(())
        })
    }
}

pub fn toggle_bullet_list(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    toggle_list("bulletList")(state, dispatch)
}

pub fn toggle_ordered_list(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    toggle_list("orderedList")(state, dispatch)
}

/// `toggleChecklist`: toggles the `checklist` attr on the enclosing
/// `bulletList` (wrapping in one first if not already inside a list),
/// and flips the current `listItem`'s own `checked` attr.
pub fn toggle_checklist(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        if resolved.depth() == 0 {
            return Ok(());
        }
        match enclosing_list(&resolved) {
            Some((_, list_node, list_pos)) if list_node.node_type() == "bulletList" => {
                let mut attrs = list_node.attrs().cloned().unwrap_or_default();
                let was = attrs.get("checklist").and_then(AttrValue::as_bool).unwrap_or(false);
                attrs.insert("checklist".to_string(), AttrValue::Bool(!was));
                tr.set_node_attrs(list_pos, attrs)?;
            }
            Some((_, list_node, list_pos)) => {
                // Inside an orderedList: convert it to a checklist bulletList.
                let mut attrs = Attrs::new();
                attrs.insert("checklist".to_string(), AttrValue::Bool(true));
                tr.set_block_type(list_pos, "bulletList", attrs)?;
                let _ = list_node;
            }
            None => {
                let block_entry = &resolved.path()[resolved.depth() - 1];
                let block = resolved.parent();
                let block_pos = block_entry.offset;
                tr.wrap_in(block_pos, block_pos + block.node_size(), "listItem", Attrs::new())?;
                let list_item_size = block.node_size() + 2;
                let mut attrs = Attrs::new();
                attrs.insert("checklist".to_string(), AttrValue::Bool(true));
                tr.wrap_in(block_pos, block_pos + list_item_size, "bulletList", attrs)?;
            }
        }
        Ok(())
    })
}

/// Finds the nearest enclosing `listItem`'s own absolute position.
fn enclosing_list_item<'a>(resolved: &ResolvedPos<'a>) -> Option<usize> {
    for depth in (0..=resolved.depth()).rev() {
        let node = resolved.path()[depth].node;
        if node.node_type() == "listItem" {
            return Some(if depth == 0 { 0 } else { resolved.path()[depth - 1].offset });
        }
    }
    None
}

/// `Tab`: indents the enclosing `listItem` when the cursor sits right after its
/// opening boundary, otherwise inserts two spaces.
pub fn tab_or_indent(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    let sel = state.selection();
    if sel.empty() {
        let resolved = resolve_head(state);
        if let Some(list_item_pos) = enclosing_list_item(&resolved) {
            if sel.head == list_item_pos + 1 {
                return list_indent(state, dispatch);
            }
        }
    }
    super::text::insert_text("  ")(state, dispatch)
}

/// `listIndent`: nests the current `listItem` under its previous
/// sibling as a new sub-list, mirroring common editors' Tab-to-indent
/// behavior. A no-op when there's no previous sibling to nest under.
pub fn list_indent(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some((list_depth, list_node, _list_pos)) = enclosing_list(&resolved) else {
            return Ok(());
        };
        // `path[list_depth]` is the list itself; its `.index`/`.offset`
        // describe the current listItem's slot within it.
        let list_entry = &resolved.path()[list_depth];
        let item_index = list_entry.index;
        if item_index == 0 {
            return Ok(());
        }
        let item_pos = list_entry.offset;
        let item = &list_node.children()[item_index];
        let prev_item = &list_node.children()[item_index - 1];
        let prev_item_pos = item_pos - prev_item.node_size();

        let nested_list = state
            .schema()
            .node(list_node.node_type(), list_node.attrs().cloned().unwrap_or_default(), vec![item.clone()], vec![])?;
        let merged_children: Vec<Node> = prev_item
            .children()
            .iter()
            .cloned()
            .chain(std::iter::once(nested_list))
            .collect();
        let merged_prev = state.schema().node(
            "listItem",
            prev_item.attrs().cloned().unwrap_or_default(),
            merged_children,
            vec![],
        )?;
        let cursor_at = prev_item_pos + 1 + prev_item.content_size() + 3;
        tr.replace_range(prev_item_pos, item_pos + item.node_size(), vec![merged_prev])?;
        tr.set_selection(crate::model::selection::Selection::cursor(cursor_at));
        Ok(())
    })
}

/// `listOutdent`: lifts the current `listItem` out of its enclosing
/// list. A sole item takes the whole list with it (becoming a plain
/// paragraph); an item at either end is sliced off with the list
/// shrinking around it; a middle item splits the list into two,
/// inserting the lifted item's block between them. A no-op outside a
/// list.
pub fn list_outdent(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some((list_depth, list_node, list_pos)) = enclosing_list(&resolved) else {
            return Ok(());
        };
        let list_entry = &resolved.path()[list_depth];
        let item_index = list_entry.index;
        let item = &list_node.children()[item_index];
        let n = list_node.children().len();

        if n == 1 {
            tr.unwrap(list_pos, list_node.node_size())?;
            tr.unwrap(list_pos, item.node_size())?;
            return Ok(());
        }

        let before: Vec<Node> = list_node.children()[..item_index].to_vec();
        let after: Vec<Node> = list_node.children()[item_index + 1..].to_vec();
        let mut replacement = Vec::new();
        if !before.is_empty() {
            replacement.push(state.schema().node(
                list_node.node_type(),
                list_node.attrs().cloned().unwrap_or_default(),
                before,
                vec![],
            )?);
        }
        replacement.extend(item.children().iter().cloned());
        if !after.is_empty() {
            replacement.push(state.schema().node(
                list_node.node_type(),
                list_node.attrs().cloned().unwrap_or_default(),
                after,
                vec![],
            )?);
        }
        tr.replace_range(list_pos, list_pos + list_node.node_size(), replacement)?;
        Ok(())
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::selection::Selection;
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
    fn toggle_bullet_list_wraps_block() {
        let state = state_with("item", 1);
        let mut dispatched = None;
        assert!(toggle_bullet_list(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        let list = &tr.doc().children()[0];
        assert_eq!(list.node_type(), "bulletList");
        assert_eq!(list.children()[0].node_type(), "listItem");
    }

    #[test]
    fn toggle_bullet_list_twice_unwraps() {
        let state = state_with("item", 1);
        let mut dispatched = None;
        assert!(toggle_bullet_list(&state, Some(&mut |tr| dispatched = Some(tr))));
        let wrapped = state.apply(dispatched.unwrap()).unwrap().state;
        let mut dispatched2 = None;
        assert!(toggle_bullet_list(&wrapped, Some(&mut |tr| dispatched2 = Some(tr))));
        let tr2 = dispatched2.unwrap();
        assert_eq!(tr2.doc().children()[0].node_type(), "paragraph");
    }

    #[test]
    fn toggle_checklist_marks_list_as_checklist() {
        let state = state_with("item", 1);
        let mut dispatched = None;
        assert!(toggle_checklist(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        let list = &tr.doc().children()[0];
        assert_eq!(
            list.attrs().unwrap().get("checklist"),
            Some(&AttrValue::Bool(true))
        );
    }
}
