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

//! Block-type and block-attribute commands: `setBlockType`, `heading`,
//! `paragraph`, `wrapInBlockquote`, `toggleCodeBlock`, `insertHorizontalRule`,
//! `setAlignment`, `increaseIndent`/`decreaseIndent`, `setLineHeight`.

use crate::model::mark::{AttrValue, Attrs};
use crate::model::node::Node;
use crate::plugin::DispatchFn;
use crate::state::EditorState;

use super::{innermost_container_pos, resolve_head, run};

/// `setBlockType(type, attrs?)`: rewrites the innermost block's own type and
/// attrs in place. A block switching to `codeBlock` drops any non-text children
/// (and their marks) since `codeBlock`'s content expression only accepts plain
/// text.
pub fn set_block_type(
    new_type: impl Into<String>,
    new_attrs: Attrs,
) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    let new_type = new_type.into();
    move |state, dispatch| {
        let new_type = new_type.clone();
        let new_attrs = new_attrs.clone();
        run(state, dispatch, |state, tr| {
            let resolved = resolve_head(state);
            let Some(pos) = innermost_container_pos(&resolved) else {
                return Ok(());
            };
            let block = resolved.parent();
            if new_type == "codeBlock" {
                let text = block.text_content();
                let replacement = if text.is_empty() {
                    vec![]
                } else {
                    vec![state.schema().text(text, vec![])?]
                };
                tr.replace_range(pos + 1, pos + 1 + block.content_size(), replacement)?;
            }
            tr.set_block_type(pos, new_type.clone(), new_attrs.clone())?;
            Ok(())
        })
    }
}

/// `heading(level)`.
pub fn heading(level: i64) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    let mut attrs = Attrs::new();
    attrs.insert("level".to_string(), AttrValue::Int(level));
    set_block_type("heading", attrs)
}

/// `paragraph`.
pub fn paragraph(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    set_block_type("paragraph", Attrs::new())(state, dispatch)
}

/// `wrapInBlockquote`: wraps the innermost block in a `blockquote`.
pub fn wrap_in_blockquote(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let Some(pos) = innermost_container_pos(&resolved) else {
            return Ok(());
        };
        let block = resolved.parent();
        tr.wrap_in(pos, pos + block.node_size(), "blockquote", Attrs::new())?;
        Ok(())
    })
}

/// `toggleCodeBlock(language?)`: converts the current block to a
/// `codeBlock` if it isn't one already (clearing inline structure per
/// [`set_block_type`]'s rule); converts a `codeBlock` back to a
/// `paragraph` otherwise.
pub fn toggle_code_block(language: Option<String>) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        let language = language.clone();
        let resolved = resolve_head(state);
        if resolved.depth() == 0 {
            return false;
        }
        if resolved.parent().node_type() == "codeBlock" {
            set_block_type("paragraph", Attrs::new())(state, dispatch)
        } else {
            let mut attrs = Attrs::new();
            if let Some(lang) = language {
                attrs.insert("language".to_string(), AttrValue::Str(lang));
            }
            set_block_type("codeBlock", attrs)(state, dispatch)
        }
    }
}

/// `insertHorizontalRule`: inserts a `horizontalRule` leaf at the
/// cursor, splitting the surrounding block if the cursor sits inside
/// text (so the rule becomes a sibling block, not inline content).
pub fn insert_horizontal_rule(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let hr = state.schema().node("horizontalRule", Attrs::new(), vec![], vec![])?;
        let insert_pos = innermost_container_pos(&resolved)
            .map(|p| p + resolved.parent().node_size())
            .unwrap_or(state.selection().head);
        tr.replace_range(insert_pos, insert_pos, vec![hr])?;
        Ok(())
    })
}

/// `setAlignment(value | null)`: sets (or clears, with `None`) the
/// innermost block's `align` attribute.
pub fn set_alignment(value: Option<String>) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        let value = value.clone();
        run(state, dispatch, |state, tr| {
            let resolved = resolve_head(state);
            let Some(pos) = innermost_container_pos(&resolved) else {
                return Ok(());
            };
            let mut attrs = resolved.parent().attrs().cloned().unwrap_or_default();
            match &value {
                Some(v) => {
                    attrs.insert("align".to_string(), AttrValue::Str(v.clone()));
                }
                None => {
                    attrs.insert("align".to_string(), AttrValue::Null);
                }
            }
            tr.set_node_attrs(pos, attrs)?;
            Ok(())
        })
    }
}

/// `setLineHeight(value | null)`: mirrors [`set_alignment`] for the
/// `lineHeight` attribute (paragraphs/headings only).
pub fn set_line_height(value: Option<String>) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        let value = value.clone();
        run(state, dispatch, |state, tr| {
            let resolved = resolve_head(state);
            let Some(pos) = innermost_container_pos(&resolved) else {
                return Ok(());
            };
            let mut attrs = resolved.parent().attrs().cloned().unwrap_or_default();
            attrs.insert(
                "lineHeight".to_string(),
                value.clone().map(AttrValue::Str).unwrap_or(AttrValue::Null),
            );
            tr.set_node_attrs(pos, attrs)?;
            Ok(())
        })
    }
}

/// `increaseIndent`: wraps the current block one level deeper in a
/// `blockquote`, the engine's only indent container.
pub fn increase_indent(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    wrap_in_blockquote(state, dispatch)
}

/// `decreaseIndent`: unwraps the current block out of its enclosing
/// `blockquote`, if any.
pub fn decrease_indent(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve_head(state);
        let depth = resolved.depth();
        if depth < 2 {
            return Ok(());
        }
        let grandparent_entry = &resolved.path()[depth - 2];
        if grandparent_entry.node.node_type() != "blockquote" {
            return Ok(());
        }
        // `path[depth-2]`'s offset is the blockquote's own absolute start
        // position (it is the child selected at that level).
        let wrapper_pos = grandparent_entry.offset;
        let wrapper_size = find_child_at(grandparent_entry.node, grandparent_entry.index)
            .map(Node::node_size)
            .unwrap_or(0);
        tr.unwrap(wrapper_pos, wrapper_size)?;
        Ok(())
    })
}

fn find_child_at(node: &Node, index: usize) -> Option<&Node> {
    node.children().get(index)
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
    fn heading_sets_block_type_and_level() {
        let state = state_with("title", 2);
        let mut dispatched = None;
        let cmd = heading(2);
        assert!(cmd(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        let block = &tr.doc().children()[0];
        assert_eq!(block.node_type(), "heading");
        assert_eq!(block.attrs().unwrap().get("level"), Some(&AttrValue::Int(2)));
    }

    #[test]
    fn wrap_in_blockquote_then_decrease_indent_unwraps() {
        let state = state_with("hi", 1);
        let mut dispatched = None;
        assert!(wrap_in_blockquote(&state, Some(&mut |tr| dispatched = Some(tr))));
        let wrapped = state.apply(dispatched.unwrap()).unwrap().state;
        assert_eq!(wrapped.doc().children()[0].node_type(), "blockquote");

        let mut dispatched2 = None;
        assert!(decrease_indent(&wrapped, Some(&mut |tr| dispatched2 = Some(tr))));
        let tr2 = dispatched2.unwrap();
        assert_eq!(tr2.doc().children()[0].node_type(), "paragraph");
    }

    #[test]
    fn insert_horizontal_rule_adds_leaf_block() {
        let state = state_with("hi", 1);
        let mut dispatched = None;
        assert!(insert_horizontal_rule(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert_eq!(tr.doc().children().len(), 2);
        assert_eq!(tr.doc().children()[1].node_type(), "horizontalRule");
    }

    #[test]
    fn set_alignment_updates_attr() {
        let state = state_with("hi", 1);
        let mut dispatched = None;
        let cmd = set_alignment(Some("center".to_string()));
        assert!(cmd(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert_eq!(
            tr.doc().children()[0].attrs().unwrap().get("align"),
            Some(&AttrValue::Str("center".to_string()))
        );
    }
}
