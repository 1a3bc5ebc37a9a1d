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

//! The caret/highlight overlay and pointer/touch selection gestures. Unlike the
//! native browser selection, this editor renders its own caret and highlight
//! rectangles from [`crate::view::View::coords_at_pos`] so their appearance
//! stays independent of the hidden focus sink's own (invisible) selection.
//! [`SelectionManager`] also owns the click-count and touch-gesture state
//! machines that turn raw pointer/touch events into `cursor` / `word` /
//! `paragraph` selections.

use once_cell::sync::OnceCell;
use regex::Regex;
use web_sys::{Element, MouseEvent, Touch, TouchEvent};

use crate::model::node::Node;
use crate::model::position::resolve;
use crate::model::selection::Selection;
use crate::view::{ClientPoint, Rect, View};

/// Mouse clicks or taps within this many pixels of the previous one count
/// toward the same click-count run.
const CLICK_DISTANCE_PX: f64 = 5.0;
/// Mouse clicks within this many milliseconds of the previous one count
/// toward the same click-count run.
const CLICK_INTERVAL_MS: f64 = 500.0;
/// Taps within this many pixels of the previous one count toward the
/// same tap-count run (touch targets are coarser than a mouse pointer).
const TAP_DISTANCE_PX: f64 = 20.0;
/// A touch held this long without moving beyond [`DRAG_THRESHOLD_PX`] is
/// treated as a long-press.
const LONG_PRESS_MS: f64 = 500.0;
/// Touch movement beyond this many pixels from the start point is a
/// drag, not a tap.
const DRAG_THRESHOLD_PX: f64 = 10.0;

fn word_pattern() -> &'static Regex {
    static WORD: OnceCell<Regex> = OnceCell::new();
    WORD.get_or_init(|| Regex::new(r"\w+").expect("static word pattern is valid"))
}

/// A timestamped pointer sample, used to decide whether the next
/// click/tap continues the current click-count run.
#[derive(Clone, Copy, Debug)]
struct Sample {
    left: f64,
    top: f64,
    time_stamp: f64,
}

impl Sample {
    fn near(&self, other: &Sample, max_distance: f64, max_interval: f64) -> bool {
        let dx = self.left - other.left;
        let dy = self.top - other.top;
        (dx * dx + dy * dy).sqrt() <= max_distance && (self.time_stamp - other.time_stamp).abs() <= max_interval
    }
}

/// Renders the caret/highlight overlay and turns pointer/touch input into
/// [`Selection`] updates.
pub struct SelectionManager {
    caret: Element,
    highlights: Element,
    last_click: Option<Sample>,
    click_count: u32,
    dragging: bool,
    anchor: usize,
    touch_start: Option<Sample>,
    last_tap: Option<Sample>,
    tap_count: u32,
}

impl SelectionManager {
    /// Mounts the caret and highlight-container overlay elements into
    /// `container`.
    pub fn new(container: &Element) -> Self {
        let document = container.owner_document().expect("element attached to a document");

        let caret = document.create_element("div").expect("creating a div never fails");
        caret
            .set_attribute(
                "style",
                "position:fixed;width:1px;pointer-events:none;background:currentColor;",
            )
            .ok();
        caret.set_attribute("hidden", "true").ok();
        container.append_child(&caret).ok();

        let highlights = document.create_element("div").expect("creating a div never fails");
        highlights.set_attribute("style", "position:fixed;pointer-events:none;").ok();
        container.append_child(&highlights).ok();

        SelectionManager {
            caret,
            highlights,
            last_click: None,
            click_count: 0,
            dragging: false,
            anchor: 0,
            touch_start: None,
            last_tap: None,
            tap_count: 0,
        }
    }

    /// Re-renders the caret/highlight overlay from `selection`.
    pub fn render(&self, selection: Selection, view: &View) {
        self.highlights.set_inner_html("");
        if selection.empty() {
            self.caret.remove_attribute("hidden").ok();
            if let Some(rect) = view.coords_at_pos(selection.head) {
                self.position_caret(&rect);
            }
            return;
        }
        self.caret.set_attribute("hidden", "true").ok();
        let (Some(start), Some(end)) = (view.coords_at_pos(selection.from()), view.coords_at_pos(selection.to()))
        else {
            return;
        };
        if (start.top - end.top).abs() < 2.0 {
            self.append_highlight(start.left, start.top, end.left, end.bottom);
            return;
        }
        let bounds = self.highlights.get_bounding_client_rect();
        self.append_highlight(start.left, start.top, bounds.right(), start.bottom);
        if end.top - start.bottom > 1.0 {
            self.append_highlight(bounds.left(), start.bottom, bounds.right(), end.top);
        }
        self.append_highlight(bounds.left(), end.top, end.left, end.bottom);
    }

    fn position_caret(&self, rect: &Rect) {
        let style = format!(
            "position:fixed;width:1px;pointer-events:none;background:currentColor;left:{}px;top:{}px;height:{}px;",
            rect.left,
            rect.top,
            (rect.bottom - rect.top).max(1.0)
        );
        self.caret.set_attribute("style", &style).ok();
    }

    fn append_highlight(&self, left: f64, top: f64, right: f64, bottom: f64) {
        let Some(document) = self.highlights.owner_document() else { return };
        let Ok(div) = document.create_element("div") else { return };
        let style = format!(
            "position:fixed;pointer-events:none;background:Highlight;opacity:0.4;left:{}px;top:{}px;width:{}px;height:{}px;",
            left,
            top,
            (right - left).max(0.0),
            (bottom - top).max(0.0)
        );
        div.set_attribute("style", &style).ok();
        self.highlights.append_child(&div).ok();
    }

    /// `mousedown`. Returns the selection to dispatch, tracking click count for
    /// word/paragraph select-on-click.
    pub fn handle_pointer_down(&mut self, event: &MouseEvent, doc: &Node, view: &View) -> Option<Selection> {
        let sample = Sample { left: event.client_x() as f64, top: event.client_y() as f64, time_stamp: event.time_stamp() };
        self.click_count = match self.last_click {
            Some(prev) if sample.near(&prev, CLICK_DISTANCE_PX, CLICK_INTERVAL_MS) => (self.click_count % 3) + 1,
            _ => 1,
        };
        self.last_click = Some(sample);
        self.dragging = true;

        let point = ClientPoint { left: sample.left, top: sample.top };
        let pos = view.pos_at_coords(point)?;
        let selection = match self.click_count {
            1 => Selection::cursor(pos),
            2 => select_word(doc, pos),
            _ => select_paragraph(doc, pos),
        };
        self.anchor = selection.from().min(selection.to());
        if self.click_count == 1 {
            self.anchor = pos;
        }
        Some(selection)
    }

    /// `mousemove` while a drag is in progress.
    pub fn handle_pointer_move(&self, event: &MouseEvent, view: &View) -> Option<Selection> {
        if !self.dragging {
            return None;
        }
        let point = ClientPoint { left: event.client_x() as f64, top: event.client_y() as f64 };
        let pos = view.pos_at_coords(point)?;
        Some(Selection::between(self.anchor, pos))
    }

    /// `mouseup`/`mouseleave`: ends the drag.
    pub fn handle_pointer_up(&mut self) {
        self.dragging = false;
    }

    /// `touchstart`. Records the start sample for later tap/drag/long-press
    /// classification; returns a cursor selection immediately the way a tap
    /// would on mouseup.
    pub fn handle_touch_start(&mut self, event: &TouchEvent) {
        let Some(touch) = first_touch(event) else { return };
        self.touch_start =
            Some(Sample { left: touch.client_x() as f64, top: touch.client_y() as f64, time_stamp: event.time_stamp() });
    }

    /// `touchmove`: a touch that has moved beyond the drag threshold is
    /// treated as a range-selection drag, mirroring mouse drag.
    pub fn handle_touch_move(&self, event: &TouchEvent, view: &View) -> Option<Selection> {
        let start = self.touch_start?;
        let touch = first_touch(event)?;
        let now = Sample { left: touch.client_x() as f64, top: touch.client_y() as f64, time_stamp: event.time_stamp() };
        if start.near(&now, DRAG_THRESHOLD_PX, f64::INFINITY) {
            return None;
        }
        let start_pos = view.pos_at_coords(ClientPoint { left: start.left, top: start.top })?;
        let pos = view.pos_at_coords(ClientPoint { left: now.left, top: now.top })?;
        Some(Selection::between(start_pos, pos))
    }

    /// `touchend`. A long-press is detected here, retroactively, by comparing
    /// the touch's start and end timestamps rather than firing a live timer
    /// mid-touch.
    pub fn handle_touch_end(&mut self, event: &TouchEvent, doc: &Node, view: &View) -> Option<Selection> {
        let start = self.touch_start.take()?;
        let end_time = event.time_stamp();
        let point = ClientPoint { left: start.left, top: start.top };
        let pos = view.pos_at_coords(point)?;

        let end_sample = Sample { left: start.left, top: start.top, time_stamp: end_time };
        self.tap_count = match self.last_tap {
            Some(prev) if end_sample.near(&prev, TAP_DISTANCE_PX, CLICK_INTERVAL_MS) => (self.tap_count % 3) + 1,
            _ => 1,
        };
        self.last_tap = Some(end_sample);

        if end_time - start.time_stamp >= LONG_PRESS_MS {
            return Some(select_word(doc, pos));
        }
        match self.tap_count {
            1 => Some(Selection::cursor(pos)),
            2 => Some(select_word(doc, pos)),
            _ => Some(select_paragraph(doc, pos)),
        }
    }

    /// Removes the overlay elements from the DOM.
    pub fn destroy(&mut self) {
        if let Some(parent) = self.caret.parent_element() {
            parent.remove_child(&self.caret).ok();
        }
        if let Some(parent) = self.highlights.parent_element() {
            parent.remove_child(&self.highlights).ok();
        }
    }
}

fn first_touch(event: &TouchEvent) -> Option<Touch> {
    event.touches().item(0)
}

/// Walks `doc`'s full text content alongside each character's absolute
/// position, so a regex match over the text can be mapped straight back to
/// model positions. Walks children directly rather than `doc` itself through
/// [`Node::nodes_between`], since the document's own root boundary isn't
/// addressable — only the boundaries of the containers nested inside it are.
fn text_with_positions(doc: &Node) -> (String, Vec<usize>) {
    fn walk(node: &Node, pos: &mut usize, text: &mut String, positions: &mut Vec<usize>) {
        match node {
            Node::Text(_) => {
                if let Some(s) = node.text() {
                    for ch in s.chars() {
                        text.push(ch);
                        positions.push(*pos);
                        *pos += 1;
                    }
                }
            }
            Node::Leaf(_) => *pos += 1,
            Node::Container(_) => {
                *pos += 1;
                for child in node.children() {
                    walk(child, pos, text, positions);
                }
                *pos += 1;
            }
        }
    }

    let mut text = String::new();
    let mut positions = Vec::new();
    let mut pos = 0usize;
    for child in doc.children() {
        walk(child, &mut pos, &mut text, &mut positions);
    }
    (text, positions)
}

/// `\w+` word selection around `pos`, falling back to the single non-word
/// character under the cursor.
fn select_word(doc: &Node, pos: usize) -> Selection {
    let (text, positions) = text_with_positions(doc);
    let Some(idx) = positions.iter().position(|&p| p >= pos) else {
        return Selection::cursor(pos);
    };
    // `find_iter` reports byte offsets; `positions` is indexed per char.
    for m in word_pattern().find_iter(&text) {
        let char_start = text[..m.start()].chars().count();
        let char_end = text[..m.end()].chars().count();
        if char_start <= idx && idx < char_end {
            return Selection::new(positions[char_start], positions[char_end - 1] + 1);
        }
    }
    if idx < positions.len() {
        Selection::new(positions[idx], positions[idx] + 1)
    } else {
        Selection::cursor(pos)
    }
}

/// Triple click: selects the content of the nearest block-level ancestor of
/// `pos`.
fn select_paragraph(doc: &Node, pos: usize) -> Selection {
    let Ok(resolved) = resolve(doc, pos) else {
        return Selection::cursor(pos);
    };
    if resolved.depth() == 0 {
        return Selection::new(0, doc.content_size());
    }
    let block_entry = &resolved.path()[resolved.depth() - 1];
    let block = resolved.parent();
    Selection::new(block_entry.offset + 1, block_entry.offset + 1 + block.content_size())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_test {
    use super::*;
    use crate::schema::default_schema::default_schema;
    use crate::state::ContentInit;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fresh_container() -> Element {
        let document = web_sys::window().unwrap().document().unwrap();
        let el = document.create_element("div").unwrap();
        document.body().unwrap().append_child(&el).unwrap();
        el
    }

    #[wasm_bindgen_test]
    fn mounts_caret_and_highlight_elements() {
        let container = fresh_container();
        let manager = SelectionManager::new(&container);
        assert_eq!(container.children().length(), 2);
        drop(manager);
    }

    #[wasm_bindgen_test]
    fn destroy_removes_overlay_elements() {
        let container = fresh_container();
        let mut manager = SelectionManager::new(&container);
        manager.destroy();
        assert_eq!(container.children().length(), 0);
    }

    #[wasm_bindgen_test]
    fn select_word_picks_the_word_under_the_cursor() {
        let schema = default_schema();
        let state =
            crate::state::EditorState::create(schema, Some(ContentInit::Text("hello world".into())), None).unwrap();
        let selection = select_word(state.doc(), 3);
        assert_eq!(&state.doc().text_content()[selection.from() - 1..selection.to() - 1], "hello");
    }
}
