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

//! Media commands: `insertImage`, `insertVideo`, `insertEmbed`,
//! `setMediaAlignment`, `setImageAlt`, `setImageCaption`, `updateMediaAttrs`,
//! `deleteMedia`, `getSelectedMedia`.

use crate::model::mark::{AttrValue, Attrs};
use crate::model::node::Node;
use crate::model::position::resolve;
use crate::plugin::DispatchFn;
use crate::state::EditorState;

use super::{innermost_container_pos, resolve_head, run};

const MEDIA_TYPES: [&str; 3] = ["image", "video", "embed"];

fn is_media(node: &Node) -> bool {
    MEDIA_TYPES.contains(&node.node_type())
}

/// Finds the media leaf immediately at or before the caret, returning
/// its absolute position. `image` is inline (can sit inside a
/// paragraph's content), `video`/`embed` are block-level siblings — both
/// are reached the same way: check the node right before `head`, then
/// the innermost block itself if that block is itself a leaf media node.
fn selected_media(state: &EditorState) -> Option<usize> {
    let head = state.selection().head;
    if head > 0 {
        if let Ok(resolved) = resolve(state.doc(), head) {
            if let Some(before) = resolved.node_before() {
                if is_media(before) {
                    return Some(head - before.node_size());
                }
            }
        }
    }
    let resolved = resolve_head(state);
    let pos = innermost_container_pos(&resolved)?;
    if is_media(resolved.parent()) {
        Some(pos)
    } else {
        None
    }
}

/// The media leaf currently under the caret, as returned by
/// [`get_selected_media`].
pub struct SelectedMedia {
    pub node_type: String,
    pub node: Node,
    pub pos: usize,
}

/// `getSelectedMedia(state)`: the `{type, node, pos}` of the media leaf at the
/// caret, or `None` if the caret isn't on one.
pub fn get_selected_media(state: &EditorState) -> Option<SelectedMedia> {
    let pos = selected_media(state)?;
    let node = resolve(state.doc(), pos).ok().and_then(|r| r.node_after())?;
    Some(SelectedMedia {
        node_type: node.node_type().to_string(),
        node: node.clone(),
        pos,
    })
}

/// `insertImage(src, attrs?)`: inserts an inline `image` leaf at the
/// caret (replacing the selection first, if any).
pub fn insert_image(src: impl Into<String>, attrs: Attrs) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    let src = src.into();
    move |state, dispatch| {
        let src = src.clone();
        let mut attrs = attrs.clone();
        run(state, dispatch, move |state, tr| {
            attrs.insert("src".to_string(), AttrValue::Str(src.clone()));
            let sel = state.selection();
            if !sel.empty() {
                tr.delete_range(sel.from(), sel.to())?;
            }
            let pos = tr.selection().map(|s| s.head).unwrap_or(sel.from());
            let image = state.schema().node("image", attrs.clone(), vec![], vec![])?;
            tr.replace_range(pos, pos, vec![image])?;
            Ok(())
        })
    }
}

/// `insertVideo(src, attrs?)`: inserts a `video` leaf as a sibling block
/// after the current block (video is block-level, not inline).
pub fn insert_video(src: impl Into<String>, attrs: Attrs) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    insert_block_media("video", src.into(), attrs)
}

/// `insertEmbed(src, attrs?)`: mirrors [`insert_video`] for `embed`.
pub fn insert_embed(src: impl Into<String>, attrs: Attrs) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    insert_block_media("embed", src.into(), attrs)
}

fn insert_block_media(
    node_type: &'static str,
    src: String,
    attrs: Attrs,
) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        let src = src.clone();
        let mut attrs = attrs.clone();
        run(state, dispatch, move |state, tr| {
            attrs.insert("src".to_string(), AttrValue::Str(src.clone()));
            let resolved = resolve_head(state);
            let insert_pos = innermost_container_pos(&resolved)
                .map(|p| p + resolved.parent().node_size())
                .unwrap_or(state.selection().head);
            let media = state.schema().node(node_type, attrs.clone(), vec![], vec![])?;
            tr.replace_range(insert_pos, insert_pos, vec![media])?;
            Ok(())
        })
    }
}

/// `setMediaAlignment(value | null)`: sets the `align` attr on the
/// media leaf at the caret, if any.
pub fn set_media_alignment(value: Option<String>) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        let value = value.clone();
        run(state, dispatch, |state, tr| {
            let Some(pos) = selected_media(state) else {
                return Ok(());
            };
            let node = resolve(state.doc(), pos).ok().and_then(|r| r.node_after());
            let mut attrs = node.and_then(|n| n.attrs()).cloned().unwrap_or_default();
            attrs.insert("align".to_string(), value.clone().map(AttrValue::Str).unwrap_or(AttrValue::Null));
            tr.set_node_attrs(pos, attrs)?;
            Ok(())
        })
    }
}

/// `setImageAlt(text)`: sets the `alt` attr on the `image` leaf at the
/// caret. A no-op on any other media type.
pub fn set_image_alt(text: impl Into<String>) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    let text = text.into();
    move |state, dispatch| {
        let text = text.clone();
        run(state, dispatch, move |state, tr| {
            let Some(pos) = selected_media(state) else {
                return Ok(());
            };
            let Some(node) = resolve(state.doc(), pos).ok().and_then(|r| r.node_after()) else {
                return Ok(());
            };
            if node.node_type() != "image" {
                return Ok(());
            }
            let mut attrs = node.attrs().cloned().unwrap_or_default();
            attrs.insert("alt".to_string(), AttrValue::Str(text.clone()));
            tr.set_node_attrs(pos, attrs)?;
            Ok(())
        })
    }
}

/// `setImageCaption(text | null)`: sets (or clears) the `caption` attr
/// on the `image` leaf at the caret.
pub fn set_image_caption(text: Option<String>) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        let text = text.clone();
        run(state, dispatch, move |state, tr| {
            let Some(pos) = selected_media(state) else {
                return Ok(());
            };
            let Some(node) = resolve(state.doc(), pos).ok().and_then(|r| r.node_after()) else {
                return Ok(());
            };
            if node.node_type() != "image" {
                return Ok(());
            }
            let mut attrs = node.attrs().cloned().unwrap_or_default();
            attrs.insert("caption".to_string(), text.clone().map(AttrValue::Str).unwrap_or(AttrValue::Null));
            tr.set_node_attrs(pos, attrs)?;
            Ok(())
        })
    }
}

/// `updateMediaAttrs(attrs)`: merges `attrs` into whichever media leaf
/// sits at the caret, leaving unspecified keys untouched.
pub fn update_media_attrs(attrs: Attrs) -> impl Fn(&EditorState, Option<DispatchFn>) -> bool {
    move |state, dispatch| {
        let attrs = attrs.clone();
        run(state, dispatch, move |state, tr| {
            let Some(pos) = selected_media(state) else {
                return Ok(());
            };
            let Some(node) = resolve(state.doc(), pos).ok().and_then(|r| r.node_after()) else {
                return Ok(());
            };
            let mut merged = node.attrs().cloned().unwrap_or_default();
            for (k, v) in &attrs {
                merged.insert(k.clone(), v.clone());
            }
            tr.set_node_attrs(pos, merged)?;
            Ok(())
        })
    }
}

/// `deleteMedia`: removes the media leaf at the caret.
pub fn delete_media(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let Some(pos) = selected_media(state) else {
            return Ok(());
        };
        let Some(node) = resolve(state.doc(), pos).ok().and_then(|r| r.node_after()) else {
            return Ok(());
        };
        tr.delete_range(pos, pos + node.node_size())?;
        Ok(())
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::default_schema::default_schema;
    use crate::state::ContentInit;

    fn empty_state() -> EditorState {
        EditorState::create(default_schema(), None, None).unwrap()
    }

    #[test]
    fn insert_image_places_leaf_at_cursor() {
        let state = empty_state();
        let mut dispatched = None;
        let cmd = insert_image("https://example.com/a.png", Attrs::new());
        assert!(cmd(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        let para = &tr.doc().children()[0];
        assert_eq!(para.children()[0].node_type(), "image");
    }

    #[test]
    fn insert_video_adds_sibling_block() {
        let state = empty_state();
        let mut dispatched = None;
        let cmd = insert_video("https://example.com/a.mp4", Attrs::new());
        assert!(cmd(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        assert_eq!(tr.doc().children().len(), 2);
        assert_eq!(tr.doc().children()[1].node_type(), "video");
    }

    #[test]
    fn delete_media_removes_image_at_cursor() {
        let state = empty_state();
        let mut dispatched = None;
        let insert = insert_image("https://example.com/a.png", Attrs::new());
        assert!(insert(&state, Some(&mut |tr| dispatched = Some(tr))));
        let with_image = state.apply(dispatched.unwrap()).unwrap().state;

        let mut dispatched2 = None;
        assert!(delete_media(&with_image, Some(&mut |tr| dispatched2 = Some(tr))));
        let tr2 = dispatched2.unwrap();
        assert!(!tr2.doc().children()[0].children().iter().any(|c| c.node_type() == "image"));
    }

    #[test]
    fn get_selected_media_reports_type_and_pos() {
        let state = empty_state();
        let mut dispatched = None;
        let insert = insert_image("https://example.com/a.png", Attrs::new());
        assert!(insert(&state, Some(&mut |tr| dispatched = Some(tr))));
        let with_image = state.apply(dispatched.unwrap()).unwrap().state;

        let found = get_selected_media(&with_image).unwrap();
        assert_eq!(found.node_type, "image");
        assert_eq!(found.node.attrs().unwrap().get("src"), Some(&AttrValue::Str("https://example.com/a.png".to_string())));
    }

    #[test]
    fn get_selected_media_none_without_media() {
        let state = empty_state();
        assert!(get_selected_media(&state).is_none());
    }

    #[test]
    fn set_image_caption_updates_attr() {
        let state = empty_state();
        let mut dispatched = None;
        let insert = insert_image("https://example.com/a.png", Attrs::new());
        assert!(insert(&state, Some(&mut |tr| dispatched = Some(tr))));
        let with_image = state.apply(dispatched.unwrap()).unwrap().state;

        let mut dispatched2 = None;
        let cmd = set_image_caption(Some("a caption".to_string()));
        assert!(cmd(&with_image, Some(&mut |tr| dispatched2 = Some(tr))));
        let tr2 = dispatched2.unwrap();
        let image = &tr2.doc().children()[0].children()[0];
        assert_eq!(
            image.attrs().unwrap().get("caption"),
            Some(&AttrValue::Str("a caption".to_string()))
        );
    }
}
