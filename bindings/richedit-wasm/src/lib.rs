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

//! Thin `wasm-bindgen` surface over [`richedit::Engine`]: one [`RichEditor`]
//! per editable surface, owning the engine plus its
//! `View`/`InputHandler`/`SelectionManager` once mounted into a container
//! element. Table/media commands and plugin/toolbar registration aren't exposed
//! here: they take `Attrs`/descriptor types with no natural JS representation,
//! and are Rust-side extension points rather than part of the host-facing
//! editing surface (see `DESIGN.md`).

use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;
use web_sys::{CompositionEvent, Element, KeyboardEvent, MouseEvent, TouchEvent};

use richedit::engine::{Engine, EditorOptions};
use richedit::input::InputHandler;
use richedit::schema::default_schema::default_schema;
use richedit::selection::SelectionManager;
use richedit::view::View;
use richedit::Attrs;

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn rect_to_js(rect: Option<richedit::view::Rect>) -> JsValue {
    let Some(rect) = rect else { return JsValue::NULL };
    let obj = Object::new();
    Reflect::set(&obj, &"left".into(), &rect.left.into()).ok();
    Reflect::set(&obj, &"top".into(), &rect.top.into()).ok();
    Reflect::set(&obj, &"bottom".into(), &rect.bottom.into()).ok();
    obj.into()
}

/// One editable surface: an [`Engine`] plus, once [`RichEditor::mount`]
/// has been called, the browser-facing view/input/selection layers.
#[wasm_bindgen]
pub struct RichEditor {
    engine: Engine,
    view: Option<View>,
    input: Option<InputHandler>,
    selection: Option<SelectionManager>,
}

#[wasm_bindgen]
impl RichEditor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> RichEditor {
        RichEditor {
            engine: Engine::new(EditorOptions::default()),
            view: None,
            input: None,
            selection: None,
        }
    }

    /// Registers a `(type: string, detail: object) => void` callback invoked
    /// for every engine event.
    pub fn set_listener(&mut self, callback: js_sys::Function) {
        self.engine.set_listener(move |event| {
            let (kind, detail) = describe_event(&event);
            let this = JsValue::NULL;
            callback.call2(&this, &kind.into(), &detail).ok();
        });
    }

    /// Mounts the view/input/selection layers into `container` and renders the
    /// current state into it.
    pub fn mount(&mut self, container: Element) {
        let schema = default_schema();
        self.view = Some(View::new(container.clone(), self.engine.state(), schema));
        self.input = Some(InputHandler::new(&container, self.engine.keymap()));
        self.selection = Some(SelectionManager::new(&container));
        self.render();
    }

    /// Tears down the mounted layers, in view → input → selection → engine
    /// order.
    pub fn destroy(&mut self) {
        if let Some(mut view) = self.view.take() {
            view.destroy();
        }
        if let Some(mut input) = self.input.take() {
            input.destroy();
        }
        if let Some(mut selection) = self.selection.take() {
            selection.destroy();
        }
        self.engine.destroy();
    }

    fn render(&mut self) {
        if let Some(view) = self.view.as_mut() {
            view.update_state(self.engine.state());
        }
        if let (Some(view), Some(selection)) = (self.view.as_ref(), self.selection.as_ref()) {
            selection.render(self.engine.state().selection(), view);
        }
        if let Some(input) = self.input.as_mut() {
            input.update_keymap(self.engine.keymap());
        }
    }

    // -- Content --------------------------------------------------

    pub fn value(&self) -> String {
        self.engine.value()
    }

    pub fn set_value(&mut self, html: &str) {
        self.engine.set_value(html);
        self.render();
    }

    pub fn insert_html(&mut self, html: &str) -> bool {
        let applied = self.engine.insert_html(html);
        if applied {
            self.render();
        }
        applied
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        let applied = self.engine.insert_text(text);
        if applied {
            self.render();
        }
        applied
    }

    pub fn length(&self) -> usize {
        self.engine.length()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    pub fn check_validity(&self) -> bool {
        self.engine.check_validity()
    }

    // -- Focus ------------------------------------------------------

    pub fn focus(&mut self) {
        self.engine.focus();
        if let Some(input) = self.input.as_ref() {
            input.focus();
        }
    }

    pub fn blur(&mut self) {
        self.engine.blur();
        if let Some(input) = self.input.as_ref() {
            input.blur();
        }
    }

    // -- History ------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let applied = self.engine.undo();
        if applied {
            self.render();
        }
        applied
    }

    pub fn redo(&mut self) -> bool {
        let applied = self.engine.redo();
        if applied {
            self.render();
        }
        applied
    }

    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.engine.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.engine.clear_history();
    }

    // -- Marks ------------------------------------------------------

    pub fn toggle_bold(&mut self) -> bool {
        self.apply(|e| e.format_text("strong", Attrs::new()))
    }

    pub fn toggle_italic(&mut self) -> bool {
        self.apply(|e| e.format_text("em", Attrs::new()))
    }

    pub fn toggle_underline(&mut self) -> bool {
        self.apply(|e| e.format_text("underline", Attrs::new()))
    }

    pub fn toggle_strike_through(&mut self) -> bool {
        self.apply(|e| e.format_text("strikethrough", Attrs::new()))
    }

    pub fn remove_format(&mut self) -> bool {
        self.apply(|e| e.remove_format())
    }

    pub fn is_mark_active(&self, mark_type: &str) -> bool {
        self.engine.is_mark_active(mark_type)
    }

    pub fn active_marks(&self) -> Vec<String> {
        self.engine.active_marks()
    }

    // -- Blocks ------------------------------------------------------

    pub fn set_block_type(&mut self, new_type: &str) -> bool {
        self.apply(|e| e.set_block_type(new_type, Attrs::new()))
    }

    pub fn block_type(&self) -> Option<String> {
        self.engine.block_type()
    }

    pub fn toggle_blockquote(&mut self) -> bool {
        self.apply(|e| e.toggle_blockquote())
    }

    pub fn toggle_code_block(&mut self) -> bool {
        self.apply(|e| e.toggle_code_block(None))
    }

    pub fn insert_horizontal_rule(&mut self) -> bool {
        self.apply(|e| e.insert_horizontal_rule())
    }

    pub fn set_alignment(&mut self, value: Option<String>) -> bool {
        self.apply(|e| e.set_alignment(value))
    }

    pub fn alignment(&self) -> Option<String> {
        self.engine.alignment()
    }

    pub fn increase_indent(&mut self) -> bool {
        self.apply(|e| e.increase_indent())
    }

    pub fn decrease_indent(&mut self) -> bool {
        self.apply(|e| e.decrease_indent())
    }

    pub fn indent(&self) -> i64 {
        self.engine.indent()
    }

    pub fn set_line_height(&mut self, value: Option<String>) -> bool {
        self.apply(|e| e.set_line_height(value))
    }

    pub fn line_height(&self) -> Option<String> {
        self.engine.line_height()
    }

    // -- Lists ------------------------------------------------------

    pub fn toggle_bullet_list(&mut self) -> bool {
        self.apply(|e| e.toggle_bullet_list())
    }

    pub fn toggle_ordered_list(&mut self) -> bool {
        self.apply(|e| e.toggle_ordered_list())
    }

    pub fn toggle_checklist(&mut self) -> bool {
        self.apply(|e| e.toggle_checklist())
    }

    pub fn indent_list_item(&mut self) -> bool {
        self.apply(|e| e.indent_list_item())
    }

    pub fn outdent_list_item(&mut self) -> bool {
        self.apply(|e| e.outdent_list_item())
    }

    // -- Find/replace -------------------------------------------------

    pub fn open_find_panel(&mut self) {
        self.engine.open_find_panel();
    }

    pub fn open_replace_panel(&mut self) {
        self.engine.open_replace_panel();
    }

    pub fn close_find_panel(&mut self) {
        self.engine.close_find_panel();
    }

    pub fn find_text(&mut self, query: &str) -> bool {
        self.engine.find_text(query)
    }

    pub fn replace_text(&mut self, query: &str, replacement: &str) -> bool {
        let applied = self.engine.replace_text(query, replacement);
        if applied {
            self.render();
        }
        applied
    }

    // -- Clipboard/selection ------------------------------------------

    pub fn selected_text(&self) -> String {
        self.engine.selected_text()
    }

    pub fn selected_html(&self) -> String {
        self.engine.selected_html()
    }

    pub fn copy(&self) -> String {
        self.engine.copy()
    }

    pub fn cut(&mut self) -> String {
        let html = self.engine.cut();
        self.render();
        html
    }

    pub fn paste(&mut self, html: &str) -> bool {
        let applied = self.engine.paste(html);
        if applied {
            self.render();
        }
        applied
    }

    pub fn paste_text(&mut self, text: &str) -> bool {
        let applied = self.engine.paste_text(text);
        if applied {
            self.render();
        }
        applied
    }

    /// The pixel rectangle of `pos` in the current viewport, or `null` if the
    /// view isn't mounted or `pos` isn't rendered.
    pub fn coords_at_pos(&self, pos: usize) -> JsValue {
        let Some(view) = self.view.as_ref() else { return JsValue::NULL };
        rect_to_js(view.coords_at_pos(pos))
    }

    fn apply(&mut self, command: impl FnOnce(&mut Engine) -> bool) -> bool {
        let applied = command(&mut self.engine);
        if applied {
            self.render();
        }
        applied
    }

    // -- DOM event handlers --------------------------------------------

    pub fn handle_keydown(&mut self, event: KeyboardEvent) -> bool {
        let Some(input) = self.input.as_mut() else { return false };
        let handled = input.handle_keydown(&event, &mut self.engine);
        if handled {
            self.render();
        }
        handled
    }

    pub fn handle_input(&mut self) -> bool {
        let Some(input) = self.input.as_mut() else { return false };
        let handled = input.handle_input(&mut self.engine);
        if handled {
            self.render();
        }
        handled
    }

    pub fn handle_composition_start(&mut self, event: CompositionEvent) {
        if let Some(input) = self.input.as_mut() {
            input.handle_composition_start(&event);
        }
    }

    pub fn handle_composition_update(&mut self, event: CompositionEvent) {
        if let Some(input) = self.input.as_mut() {
            input.handle_composition_update(&event);
        }
    }

    pub fn handle_composition_end(&mut self, event: CompositionEvent) -> bool {
        let Some(input) = self.input.as_mut() else { return false };
        let handled = input.handle_composition_end(&event, &mut self.engine);
        if handled {
            self.render();
        }
        handled
    }

    pub fn handle_mouse_down(&mut self, event: MouseEvent) -> bool {
        let (Some(view), Some(selection)) = (self.view.as_ref(), self.selection.as_mut()) else {
            return false;
        };
        let Some(sel) = selection.handle_pointer_down(&event, self.engine.state().doc(), view) else {
            return false;
        };
        let changed = self.engine.set_selection(sel);
        if changed {
            self.render();
        }
        changed
    }

    pub fn handle_mouse_move(&mut self, event: MouseEvent) -> bool {
        let (Some(view), Some(selection)) = (self.view.as_ref(), self.selection.as_ref()) else {
            return false;
        };
        let Some(sel) = selection.handle_pointer_move(&event, view) else {
            return false;
        };
        let changed = self.engine.set_selection(sel);
        if changed {
            self.render();
        }
        changed
    }

    pub fn handle_mouse_up(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.handle_pointer_up();
        }
    }

    pub fn handle_touch_start(&mut self, event: TouchEvent) {
        if let Some(selection) = self.selection.as_mut() {
            selection.handle_touch_start(&event);
        }
    }

    pub fn handle_touch_move(&mut self, event: TouchEvent) -> bool {
        let (Some(view), Some(selection)) = (self.view.as_ref(), self.selection.as_ref()) else {
            return false;
        };
        let Some(sel) = selection.handle_touch_move(&event, view) else {
            return false;
        };
        let changed = self.engine.set_selection(sel);
        if changed {
            self.render();
        }
        changed
    }

    pub fn handle_touch_end(&mut self, event: TouchEvent) -> bool {
        let (Some(view), Some(selection)) = (self.view.as_ref(), self.selection.as_mut()) else {
            return false;
        };
        let Some(sel) = selection.handle_touch_end(&event, self.engine.state().doc(), view) else {
            return false;
        };
        let changed = self.engine.set_selection(sel);
        if changed {
            self.render();
        }
        changed
    }
}

impl Default for RichEditor {
    fn default() -> Self {
        Self::new()
    }
}

/// Flattens an [`richedit::engine::EngineEvent`] into a `(type, detail)`
/// pair the JS callback can consume without any Rust types crossing the
/// boundary.
fn describe_event(event: &richedit::engine::EngineEvent) -> (&'static str, JsValue) {
    use richedit::engine::EngineEvent::*;

    let detail = Object::new();
    let kind = match event {
        Ready { value } => {
            set(&detail, "value", value);
            "ready"
        }
        Destroy { value } => {
            set(&detail, "value", value);
            "destroy"
        }
        ContentSet { value, previous_value } => {
            set(&detail, "value", value);
            set(&detail, "previousValue", previous_value);
            "contentSet"
        }
        ModelChanged { value } => {
            set(&detail, "value", value);
            "modelChanged"
        }
        Input { value } => {
            set(&detail, "value", value);
            "input"
        }
        Change { value, previous_value } => {
            set(&detail, "value", value);
            set(&detail, "previousValue", previous_value);
            "change"
        }
        Focus { value } => {
            set(&detail, "value", value);
            "focus"
        }
        Blur { value } => {
            set(&detail, "value", value);
            "blur"
        }
        TextCursorMove(cursor) => {
            set(&detail, "value", &cursor.value);
            Reflect::set(&detail, &"anchor".into(), &(cursor.anchor as f64).into()).ok();
            Reflect::set(&detail, &"head".into(), &(cursor.head as f64).into()).ok();
            if let Some(block_type) = &cursor.block_type {
                set(&detail, "blockType", block_type);
            }
            "textCursorMove"
        }
        PasteStart => "pasteStart",
        PasteEnd => "pasteEnd",
        SearchFound { matches } => {
            Reflect::set(&detail, &"matches".into(), &(*matches as f64).into()).ok();
            "searchFound"
        }
        SearchNotFound => "searchNotFound",
        ReplaceDone { count } => {
            Reflect::set(&detail, &"count".into(), &(*count as f64).into()).ok();
            "replaceDone"
        }
        Highlight { from, to } => {
            Reflect::set(&detail, &"from".into(), &(*from as f64).into()).ok();
            Reflect::set(&detail, &"to".into(), &(*to as f64).into()).ok();
            "highlight"
        }
        Unhighlight => "unhighlight",
        PluginLoaded { name } => {
            set(&detail, "name", name);
            "pluginLoaded"
        }
        PluginError { name, error } => {
            set(&detail, "name", name);
            set(&detail, "error", error);
            "pluginError"
        }
        ModeChange { air_mode } => {
            Reflect::set(&detail, &"airMode".into(), &JsValue::from_bool(*air_mode)).ok();
            "modeChange"
        }
    };
    (kind, detail.into())
}

fn set(obj: &Object, key: &str, value: &str) {
    Reflect::set(obj, &key.into(), &value.into()).ok();
}
