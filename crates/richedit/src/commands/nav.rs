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

//! Caret motion commands: arrow keys, Home/End, and word motion. Shift-variants
//! are built by wrapping these with [`super::extend_selection`] in the keymap
//! that registers them.

use unicode_segmentation::UnicodeSegmentation;

use crate::model::position::resolve;
use crate::plugin::DispatchFn;
use crate::model::selection::Selection;
use crate::state::EditorState;

use super::run;

/// Moves the caret one position left (collapsing a non-empty selection
/// to its start first, like native text inputs).
pub fn move_left(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let sel = state.selection();
        let new_head = if !sel.empty() { sel.from() } else { sel.head.saturating_sub(1) };
        tr.set_selection(Selection::cursor(new_head));
        Ok(())
    })
}

/// Moves the caret one position right.
pub fn move_right(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let sel = state.selection();
        let max = state.doc().content_size();
        let new_head = if !sel.empty() { sel.to() } else { (sel.head + 1).min(max) };
        tr.set_selection(Selection::cursor(new_head));
        Ok(())
    })
}

/// Moves to the start of the current line of text: here (no line-wrap
/// model in the engine) that means the start of the innermost block's
/// content.
pub fn move_home(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve(state.doc(), state.selection().head).expect("in range");
        let target = if resolved.depth() == 0 {
            0
        } else {
            super::innermost_container_pos(&resolved).unwrap() + 1
        };
        tr.set_selection(Selection::cursor(target));
        Ok(())
    })
}

/// Moves to the end of the innermost block's content.
pub fn move_end(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let resolved = resolve(state.doc(), state.selection().head).expect("in range");
        let target = if resolved.depth() == 0 {
            state.doc().content_size()
        } else {
            let block_pos = super::innermost_container_pos(&resolved).unwrap();
            block_pos + 1 + resolved.parent().content_size()
        };
        tr.set_selection(Selection::cursor(target));
        Ok(())
    })
}

/// Moves the caret to the next word boundary to the right, using Unicode word
/// segmentation over the innermost block's text content.
pub fn move_word_right(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let head = state.selection().head;
        let resolved = resolve(state.doc(), head).expect("in range");
        let Some(block_pos) = super::innermost_container_pos(&resolved) else {
            tr.set_selection(Selection::cursor(head));
            return Ok(());
        };
        let block = resolved.parent();
        let text = block.text_content();
        let local = resolved.parent_offset().min(text.chars().count());
        let byte_local = char_to_byte(&text, local);
        let mut target_byte = text.len();
        for (start, _) in text.unicode_word_indices() {
            if start > byte_local {
                target_byte = start;
                break;
            }
        }
        let target_chars = text[..target_byte].chars().count();
        let max = state.doc().content_size();
        tr.set_selection(Selection::cursor((block_pos + 1 + target_chars).min(max)));
        Ok(())
    })
}

/// Mirror of [`move_word_right`] towards the start of the block's text.
pub fn move_word_left(state: &EditorState, dispatch: Option<DispatchFn>) -> bool {
    run(state, dispatch, |state, tr| {
        let head = state.selection().head;
        let resolved = resolve(state.doc(), head).expect("in range");
        let Some(block_pos) = super::innermost_container_pos(&resolved) else {
            tr.set_selection(Selection::cursor(head));
            return Ok(());
        };
        let block = resolved.parent();
        let text = block.text_content();
        let local = resolved.parent_offset().min(text.chars().count());
        let byte_local = char_to_byte(&text, local);
        let mut target_byte = 0;
        for (start, _) in text.unicode_word_indices() {
            if start >= byte_local {
                break;
            }
            target_byte = start;
        }
        let target_chars = text[..target_byte].chars().count();
        tr.set_selection(Selection::cursor(block_pos + 1 + target_chars));
        Ok(())
    })
}

fn char_to_byte(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map(|(b, _)| b).unwrap_or(s.len())
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
    fn move_right_advances_one() {
        let state = state_with("abc", 1);
        let mut dispatched = None;
        assert!(move_right(&state, Some(&mut |tr| dispatched = Some(tr))));
        assert_eq!(dispatched.unwrap().selection(), Some(Selection::cursor(2)));
    }

    #[test]
    fn move_right_clamps_at_end() {
        let state = state_with("abc", 4);
        let mut dispatched = None;
        assert!(move_right(&state, Some(&mut |tr| dispatched = Some(tr))));
        assert_eq!(dispatched.unwrap().selection(), Some(Selection::cursor(4)));
    }

    #[test]
    fn move_left_collapses_non_empty_selection_to_start() {
        let state = EditorState::create(
            default_schema(),
            Some(ContentInit::Text("abcdef".into())),
            Some(Selection::new(2, 5)),
        )
        .unwrap();
        let mut dispatched = None;
        assert!(move_left(&state, Some(&mut |tr| dispatched = Some(tr))));
        assert_eq!(dispatched.unwrap().selection(), Some(Selection::cursor(2)));
    }

    #[test]
    fn move_home_and_end_bracket_block_content() {
        let state = state_with("hello", 3);
        let mut dispatched = None;
        assert!(move_home(&state, Some(&mut |tr| dispatched = Some(tr))));
        assert_eq!(dispatched.unwrap().selection(), Some(Selection::cursor(1)));
        let mut dispatched = None;
        assert!(move_end(&state, Some(&mut |tr| dispatched = Some(tr))));
        assert_eq!(dispatched.unwrap().selection(), Some(Selection::cursor(6)));
    }

    #[test]
    fn move_word_right_skips_to_next_word() {
        let state = state_with("hello world", 1);
        let mut dispatched = None;
        assert!(move_word_right(&state, Some(&mut |tr| dispatched = Some(tr))));
        let tr = dispatched.unwrap();
        // "hello" occupies local chars 0..5, next word "world" starts at local 6
        assert_eq!(tr.selection(), Some(Selection::cursor(1 + 6)));
    }

    #[test]
    fn extend_selection_wraps_move_right() {
        let state = state_with("hello", 1);
        let extended = super::super::extend_selection(move_right);
        let mut dispatched = None;
        assert!(extended(&state, Some(&mut |tr| dispatched = Some(tr))));
        assert_eq!(dispatched.unwrap().selection(), Some(Selection::new(1, 2)));
    }
}
