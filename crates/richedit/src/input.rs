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

//! The hidden-sink input handler: key normalization, IME composition, and the
//! `insertText`/`splitBlock` dispatch pipeline.

use tracing::trace;
use wasm_bindgen::JsCast;
use web_sys::{CompositionEvent, Document, Element, HtmlInputElement, KeyboardEvent};

use crate::commands::extend_selection;
use crate::engine::Engine;
use crate::plugin::{Command, Keymap};
use crate::view::ClientPoint;

const NAV_KEYS: &[&str] = &["ArrowLeft", "ArrowRight", "ArrowUp", "ArrowDown", "Home", "End"];

/// A hidden single-line `<input>` that acts as the native focus/IME sink.
pub struct InputHandler {
    sink: HtmlInputElement,
    keymap: Keymap,
    is_mac: bool,
    composing: bool,
}

impl InputHandler {
    /// Mounts the hidden sink into `container` and installs the initial
    /// keymap.
    pub fn new(container: &Element, keymap: Keymap) -> Self {
        let document: Document = container.owner_document().expect("element attached to a document");
        let sink: HtmlInputElement = document
            .create_element("input")
            .expect("creating the focus-sink input never fails")
            .dyn_into()
            .expect("created element is an <input>");
        sink.set_attribute("aria-hidden", "true").ok();
        sink.set_attribute(
            "style",
            "position:absolute;opacity:0;width:1px;height:1px;padding:0;border:0;pointer-events:none;",
        )
        .ok();
        container.append_child(&sink).ok();

        let is_mac = document
            .default_view()
            .and_then(|w| w.navigator().user_agent().ok())
            .map(|ua| ua.to_lowercase().contains("mac"))
            .unwrap_or(false);

        InputHandler { sink, keymap, is_mac, composing: false }
    }

    /// `updateKeymap(newMap)`: swaps the active map, e.g. after a plugin
    /// registers/unregisters.
    pub fn update_keymap(&mut self, new_map: Keymap) {
        self.keymap = new_map;
    }

    /// `updatePosition({left, top})`: positions the sink near the caret
    /// so native IME candidate UI aligns with the visible cursor.
    pub fn update_position(&self, point: ClientPoint) {
        let style = format!(
            "position:absolute;opacity:0;width:1px;height:1px;padding:0;border:0;pointer-events:none;left:{}px;top:{}px;",
            point.left, point.top
        );
        self.sink.set_attribute("style", &style).ok();
    }

    pub fn focus(&self) {
        self.sink.focus().ok();
    }

    pub fn blur(&self) {
        self.sink.blur().ok();
    }

    pub fn has_focus(&self) -> bool {
        self.sink
            .owner_document()
            .and_then(|d| d.active_element())
            .map(|active| active.is_same_node(self.sink.dyn_ref::<web_sys::Node>()))
            .unwrap_or(false)
    }

    /// Normalizes a `keydown` event to `"Mod-"`/`"Alt-"`/`"Shift-"` plus the
    /// key name, modifier order `Ctrl/Mod → Alt → Shift → key`.
    fn normalize_key(&self, event: &KeyboardEvent) -> String {
        let mod_pressed = if self.is_mac { event.meta_key() } else { event.ctrl_key() };
        let mut parts = Vec::new();
        if mod_pressed {
            parts.push("Mod".to_string());
        }
        if event.alt_key() {
            parts.push("Alt".to_string());
        }
        if event.shift_key() {
            parts.push("Shift".to_string());
        }
        let key = event.key();
        let key = if key.chars().count() == 1 { key.to_lowercase() } else { key };
        parts.push(key);
        parts.join("-")
    }

    /// Looks up `normalized` directly, falling back to the Shift-less variant
    /// wrapped in `extendSelection` for navigation keys.
    fn resolve_command(&self, normalized: &str) -> Option<Command> {
        if let Some(cmd) = self.keymap.get(normalized) {
            return Some(cmd.clone());
        }
        let key = normalized.rsplit('-').next().unwrap_or(normalized);
        if !NAV_KEYS.contains(&key) || !normalized.contains("Shift-") {
            return None;
        }
        let base_key = normalized.replacen("Shift-", "", 1);
        let base_cmd = self.keymap.get(&base_key)?.clone();
        let wrapped: Command =
            std::sync::Arc::new(extend_selection(move |state, dispatch| base_cmd(state, dispatch)));
        Some(wrapped)
    }

    /// `keydown`. Returns whether the event was consumed (the caller should
    /// call `preventDefault`). Navigation/selection commands stay active in
    /// read-only/disabled mode; every other binding is dropped.
    pub fn handle_keydown(&mut self, event: &KeyboardEvent, engine: &mut Engine) -> bool {
        let normalized = self.normalize_key(event);
        let Some(command) = self.resolve_command(&normalized) else {
            return false;
        };
        let key = normalized.rsplit('-').next().unwrap_or(&normalized);
        let is_navigation = NAV_KEYS.contains(&key);
        if (engine.options().disabled || engine.options().read_only) && !is_navigation {
            return false;
        }
        let handled = engine.dispatch_command(&command);
        if handled {
            event.prevent_default();
        }
        handled
    }

    /// `input`. While composing, input events are ignored — the buffered IME
    /// text is committed on `compositionend` instead.
    pub fn handle_input(&mut self, engine: &mut Engine) -> bool {
        if self.composing {
            return false;
        }
        let content = self.sink.value();
        self.sink.set_value("");
        if content.is_empty() {
            return false;
        }
        if engine.options().disabled || engine.options().read_only {
            return false;
        }
        engine.insert_text(&content)
    }

    /// `compositionstart`: begins buffering.
    pub fn handle_composition_start(&mut self, event: &CompositionEvent) {
        trace!(data = %event.data().unwrap_or_default(), "compositionstart");
        self.composing = true;
    }

    /// `compositionupdate`: no document mutation happens mid-composition
    /// — the browser owns the sink's content until `compositionend`.
    pub fn handle_composition_update(&mut self, event: &CompositionEvent) {
        trace!(data = %event.data().unwrap_or_default(), "compositionupdate");
    }

    /// `compositionend`: dispatches the finalized IME text as a single
    /// `insertText`.
    pub fn handle_composition_end(&mut self, event: &CompositionEvent, engine: &mut Engine) -> bool {
        self.composing = false;
        let text = event.data().unwrap_or_default();
        self.sink.set_value("");
        trace!(data = %text, "compositionend");
        if text.is_empty() {
            return false;
        }
        if engine.options().disabled || engine.options().read_only {
            return false;
        }
        engine.insert_text(&text)
    }

    /// Removes the sink from the DOM.
    pub fn destroy(&mut self) {
        if let Some(parent) = self.sink.parent_element() {
            parent.remove_child(&self.sink).ok();
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_test {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fresh_container() -> Element {
        let document = web_sys::window().unwrap().document().unwrap();
        let el = document.create_element("div").unwrap();
        document.body().unwrap().append_child(&el).unwrap();
        el
    }

    #[wasm_bindgen_test]
    fn mounts_a_hidden_sink_into_the_container() {
        let container = fresh_container();
        let handler = InputHandler::new(&container, Keymap::new());
        assert_eq!(container.query_selector("input").unwrap().is_some(), true);
        drop(handler);
    }

    #[wasm_bindgen_test]
    fn destroy_removes_the_sink() {
        let container = fresh_container();
        let mut handler = InputHandler::new(&container, Keymap::new());
        handler.destroy();
        assert!(container.query_selector("input").unwrap().is_none());
    }
}
