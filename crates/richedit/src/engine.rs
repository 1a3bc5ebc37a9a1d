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

//! The top-level engine: owns one [`EditorState`], the undo history,
//! configurable options, and wires every command module behind the programmatic
//! API table and the event list.

use std::sync::Arc;

use tracing::{info, warn};

use crate::commands::{self, innermost_container_pos, resolve_head};
use crate::error::EngineError;
use crate::history::{undo_command, redo_command, HistoryPlugin};
use crate::html::serialize::serialize;
use crate::model::mark::{AttrValue, Attrs};
use crate::model::node::Node;
use crate::model::selection::Selection;
use crate::plugin::{Command, DispatchFn, Keymap, Plugin, PluginManager, ToolbarItemDescriptor};
use crate::schema::default_schema::default_schema;
use crate::state::{ContentInit, EditorState};
use crate::transaction::Transaction;

/// `toolbar` configurable option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolbarMode {
    Full,
    None,
    External(String),
}

/// The result an `imageUpload` callback resolves to.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageUploadResult {
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// `{ disablePlugins, imageUpload, toolbar, airMode, spellcheck, autofocus,
/// placeholder, maxLength, minLength, required, readOnly, disabled }`.
#[derive(Clone)]
pub struct EditorOptions {
    pub disable_plugins: Vec<String>,
    pub image_upload: Option<Arc<dyn Fn(Vec<u8>) -> Result<ImageUploadResult, String> + Send + Sync>>,
    pub toolbar: ToolbarMode,
    pub air_mode: bool,
    pub spellcheck: bool,
    pub autofocus: bool,
    pub placeholder: String,
    pub max_length: Option<usize>,
    pub min_length: usize,
    pub required: bool,
    pub read_only: bool,
    pub disabled: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        EditorOptions {
            disable_plugins: Vec::new(),
            image_upload: None,
            toolbar: ToolbarMode::Full,
            air_mode: false,
            spellcheck: true,
            autofocus: false,
            placeholder: String::new(),
            max_length: None,
            min_length: 0,
            required: false,
            read_only: false,
            disabled: false,
        }
    }
}

/// The caret/selection context reported with `textCursorMove`.
#[derive(Clone, Debug, Default)]
pub struct TextCursorMoveEvent {
    pub value: String,
    pub anchor: usize,
    pub head: usize,
    pub marks: Vec<String>,
    pub block_type: Option<String>,
    pub block_attrs: Attrs,
    pub align: Option<String>,
    pub indent: Option<i64>,
    pub line_height: Option<String>,
    pub list_type: Option<String>,
    pub list_depth: usize,
    pub is_checklist: bool,
    pub in_table: bool,
    pub table_row_index: Option<usize>,
    pub table_cell_index: Option<usize>,
    pub in_media: bool,
    pub media_type: Option<String>,
    pub media_attrs: Option<Attrs>,
}

/// Every event the engine can emit. Variants map one-to-one onto its event
/// names; payloads are flattened into named fields rather than an opaque value
/// bag.
#[derive(Clone, Debug)]
pub enum EngineEvent {
    Ready { value: String },
    Destroy { value: String },
    ContentSet { value: String, previous_value: String },
    ModelChanged { value: String },
    Input { value: String },
    Change { value: String, previous_value: String },
    Focus { value: String },
    Blur { value: String },
    TextCursorMove(TextCursorMoveEvent),
    PasteStart,
    PasteEnd,
    SearchFound { matches: usize },
    SearchNotFound,
    ReplaceDone { count: usize },
    Highlight { from: usize, to: usize },
    Unhighlight,
    PluginLoaded { name: String },
    PluginError { name: String, error: String },
    ModeChange { air_mode: bool },
}

/// The engine instance. One `Engine` per editable surface; no global state is
/// shared across instances.
pub struct Engine {
    state: EditorState,
    history: HistoryPlugin,
    options: EditorOptions,
    toolbar_items: Vec<ToolbarItemDescriptor>,
    find_matches: Vec<(usize, usize)>,
    find_panel_open: bool,
    replace_panel_open: bool,
    value_at_focus: Option<String>,
    listener: Option<Box<dyn FnMut(EngineEvent)>>,
}

impl Engine {
    /// Builds a fresh engine with an empty document, registering the
    /// history plugin and firing `ready`.
    pub fn new(options: EditorOptions) -> Self {
        let history = HistoryPlugin::new(200);
        let mut plugins = PluginManager::new();
        plugins.register(history.as_plugin());
        let state = EditorState::create(default_schema(), None, None)
            .expect("the default schema always accepts an empty document")
            .with_plugins(plugins);
        let mut engine = Engine {
            state,
            history,
            options,
            toolbar_items: Vec::new(),
            find_matches: Vec::new(),
            find_panel_open: false,
            replace_panel_open: false,
            value_at_focus: None,
            listener: None,
        };
        let value = engine.value();
        engine.emit(EngineEvent::Ready { value });
        engine
    }

    pub fn set_listener(&mut self, listener: impl FnMut(EngineEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    fn emit(&mut self, event: EngineEvent) {
        if let Some(listener) = &mut self.listener {
            listener(event);
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut EditorOptions {
        &mut self.options
    }

    // --- value / lifecycle -------------------------------------------------

    /// `value (get)`: serializes the current document to HTML.
    pub fn value(&self) -> String {
        serialize(self.state.schema(), self.state.doc())
    }

    /// `value (set)`: sanitizes and parses `html`, replaces the whole
    /// document, places the cursor at position 1, fires `contentSet`.
    #[cfg(feature = "sys")]
    pub fn set_value(&mut self, html: &str) {
        let previous_value = self.value();
        let doc = crate::html::parse::parse_document(self.state.schema(), html);
        let selection = Selection::cursor(1.min(doc.content_size()));
        self.state = EditorState::create(
            (**self.state.schema()).clone(),
            Some(ContentInit::Doc(doc)),
            Some(selection),
        )
        .unwrap_or_else(|_| self.state.clone())
        .with_plugins(self.state.plugins().clone());
        self.history.clear();
        let value = self.value();
        self.emit(EngineEvent::ContentSet { value, previous_value });
    }

    /// `insertHTML(html)`: sanitizes and inserts the fragment at the
    /// current selection.
    #[cfg(feature = "sys")]
    pub fn insert_html(&mut self, html: &str) -> bool {
        let nodes = crate::html::parse::parse_fragment_nodes(self.state.schema(), html);
        if nodes.is_empty() {
            return false;
        }
        self.dispatch_user(|state, dispatch| {
            commands::run(state, dispatch, |state, tr| {
                let sel = state.selection();
                tr.replace_range(sel.from(), sel.to(), nodes.clone())?;
                Ok(())
            })
        })
    }

    /// Tears down the engine, firing `destroy`.
    pub fn destroy(&mut self) {
        self.state.plugins().destroy_all();
        let value = self.value();
        self.emit(EngineEvent::Destroy { value });
    }

    /// `getLength()`.
    pub fn length(&self) -> usize {
        self.state.length()
    }

    /// `isEmpty()`.
    pub fn is_empty(&self) -> bool {
        self.state.is_empty_doc()
    }

    /// `checkValidity()`.
    pub fn check_validity(&self) -> bool {
        self.state.check_validity(self.options.required, self.options.min_length)
    }

    // --- focus/blur ----------------------------------------------------

    pub fn focus(&mut self) {
        self.value_at_focus = Some(self.value());
        let value = self.value();
        self.emit(EngineEvent::Focus { value });
    }

    pub fn blur(&mut self) {
        let value = self.value();
        self.emit(EngineEvent::Blur { value: value.clone() });
        if let Some(previous) = self.value_at_focus.take() {
            if previous != value {
                self.emit(EngineEvent::Change { value, previous_value: previous });
            }
        }
    }

    // --- history ---------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        self.dispatch_internal(undo_command(self.history.clone()))
    }

    pub fn redo(&mut self) -> bool {
        self.dispatch_internal(redo_command(self.history.clone()))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // --- marks -------------------------------------------------------------

    pub fn format_text(&mut self, mark_type: &str, attrs: Attrs) -> bool {
        let mark_type = mark_type.to_string();
        self.dispatch_user(move |state, dispatch| {
            crate::commands::marks::toggle_mark(mark_type.clone(), attrs.clone())(state, dispatch)
        })
    }

    pub fn remove_format(&mut self) -> bool {
        self.dispatch_user(crate::commands::marks::clear_formatting)
    }

    pub fn is_mark_active(&self, mark_type: &str) -> bool {
        crate::commands::marks::mark_active(&self.state, mark_type)
    }

    pub fn active_marks(&self) -> Vec<String> {
        crate::commands::marks::get_active_marks(&self.state)
    }

    // --- blocks --------------------------------------------------------

    pub fn set_block_type(&mut self, new_type: &str, attrs: Attrs) -> bool {
        let new_type = new_type.to_string();
        self.dispatch_user(move |state, dispatch| {
            crate::commands::blocks::set_block_type(new_type.clone(), attrs.clone())(state, dispatch)
        })
    }

    /// `getBlockType()`: the innermost block's node type at the caret.
    pub fn block_type(&self) -> Option<String> {
        let resolved = resolve_head(&self.state);
        innermost_container_pos(&resolved).map(|_| resolved.parent().node_type().to_string())
    }

    /// `getBlockAttrs()`.
    pub fn block_attrs(&self) -> Attrs {
        let resolved = resolve_head(&self.state);
        resolved.parent().attrs().cloned().unwrap_or_default()
    }

    pub fn toggle_blockquote(&mut self) -> bool {
        self.dispatch_user(crate::commands::blocks::wrap_in_blockquote)
    }

    pub fn toggle_code_block(&mut self, language: Option<String>) -> bool {
        self.dispatch_user(move |state, dispatch| {
            crate::commands::blocks::toggle_code_block(language.clone())(state, dispatch)
        })
    }

    pub fn insert_horizontal_rule(&mut self) -> bool {
        self.dispatch_user(crate::commands::blocks::insert_horizontal_rule)
    }

    pub fn set_alignment(&mut self, value: Option<String>) -> bool {
        self.dispatch_user(move |state, dispatch| {
            crate::commands::blocks::set_alignment(value.clone())(state, dispatch)
        })
    }

    pub fn alignment(&self) -> Option<String> {
        self.block_attrs().get("align").and_then(AttrValue::as_str).map(str::to_string)
    }

    /// `setIndent(level)`: sets the `indent` attr directly (distinct
    /// from [`Engine::increase_indent`]/[`Engine::decrease_indent`],
    /// which nest/unnest a `blockquote` wrapper).
    pub fn set_indent(&mut self, level: i64) -> bool {
        self.dispatch_user(move |state, dispatch| {
            commands::run(state, dispatch, move |state, tr| {
                let resolved = resolve_head(state);
                let Some(pos) = innermost_container_pos(&resolved) else {
                    return Ok(());
                };
                let mut attrs = resolved.parent().attrs().cloned().unwrap_or_default();
                attrs.insert("indent".to_string(), AttrValue::Int(level.max(0)));
                tr.set_node_attrs(pos, attrs)?;
                Ok(())
            })
        })
    }

    pub fn indent(&self) -> i64 {
        self.block_attrs().get("indent").and_then(AttrValue::as_i64).unwrap_or(0)
    }

    pub fn increase_indent(&mut self) -> bool {
        self.dispatch_user(crate::commands::blocks::increase_indent)
    }

    pub fn decrease_indent(&mut self) -> bool {
        self.dispatch_user(crate::commands::blocks::decrease_indent)
    }

    pub fn set_line_height(&mut self, value: Option<String>) -> bool {
        self.dispatch_user(move |state, dispatch| {
            crate::commands::blocks::set_line_height(value.clone())(state, dispatch)
        })
    }

    pub fn line_height(&self) -> Option<String> {
        self.block_attrs().get("lineHeight").and_then(AttrValue::as_str).map(str::to_string)
    }

    // --- lists -----------------------------------------------------------

    pub fn toggle_bullet_list(&mut self) -> bool {
        self.dispatch_user(crate::commands::lists::toggle_bullet_list)
    }

    pub fn toggle_ordered_list(&mut self) -> bool {
        self.dispatch_user(crate::commands::lists::toggle_ordered_list)
    }

    pub fn toggle_checklist(&mut self) -> bool {
        self.dispatch_user(crate::commands::lists::toggle_checklist)
    }

    pub fn indent_list_item(&mut self) -> bool {
        self.dispatch_user(crate::commands::lists::list_indent)
    }

    pub fn outdent_list_item(&mut self) -> bool {
        self.dispatch_user(crate::commands::lists::list_outdent)
    }

    // --- tables ------------------------------------------------------------

    pub fn insert_table(&mut self, rows: usize, cols: usize, with_header_row: bool) -> bool {
        self.dispatch_user(move |state, dispatch| {
            crate::commands::tables::insert_table(rows, cols, with_header_row)(state, dispatch)
        })
    }

    pub fn add_row_before(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::add_row_before)
    }

    pub fn add_row_after(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::add_row_after)
    }

    pub fn add_column_before(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::add_column_before)
    }

    pub fn add_column_after(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::add_column_after)
    }

    pub fn delete_row(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::delete_row)
    }

    pub fn delete_column(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::delete_column)
    }

    pub fn delete_table(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::delete_table)
    }

    pub fn merge_cells(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::merge_cells)
    }

    pub fn split_cell(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::split_cell)
    }

    pub fn toggle_header_row(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::toggle_header_row)
    }

    pub fn toggle_header_column(&mut self) -> bool {
        self.dispatch_user(crate::commands::tables::toggle_header_column)
    }

    // --- media ---------------------------------------------------------

    pub fn insert_image(&mut self, src: &str, attrs: Attrs) -> bool {
        let src = src.to_string();
        self.dispatch_user(move |state, dispatch| {
            crate::commands::media::insert_image(src.clone(), attrs.clone())(state, dispatch)
        })
    }

    pub fn insert_video(&mut self, src: &str, attrs: Attrs) -> bool {
        let src = src.to_string();
        self.dispatch_user(move |state, dispatch| {
            crate::commands::media::insert_video(src.clone(), attrs.clone())(state, dispatch)
        })
    }

    pub fn insert_embed(&mut self, src: &str, attrs: Attrs) -> bool {
        let src = src.to_string();
        self.dispatch_user(move |state, dispatch| {
            crate::commands::media::insert_embed(src.clone(), attrs.clone())(state, dispatch)
        })
    }

    pub fn set_media_alignment(&mut self, value: Option<String>) -> bool {
        self.dispatch_user(move |state, dispatch| {
            crate::commands::media::set_media_alignment(value.clone())(state, dispatch)
        })
    }

    pub fn set_image_alt(&mut self, text: &str) -> bool {
        let text = text.to_string();
        self.dispatch_user(move |state, dispatch| {
            crate::commands::media::set_image_alt(text.clone())(state, dispatch)
        })
    }

    pub fn set_image_caption(&mut self, text: Option<String>) -> bool {
        self.dispatch_user(move |state, dispatch| {
            crate::commands::media::set_image_caption(text.clone())(state, dispatch)
        })
    }

    pub fn update_media_attrs(&mut self, attrs: Attrs) -> bool {
        self.dispatch_user(move |state, dispatch| {
            crate::commands::media::update_media_attrs(attrs.clone())(state, dispatch)
        })
    }

    pub fn delete_media(&mut self) -> bool {
        self.dispatch_user(crate::commands::media::delete_media)
    }

    pub fn selected_media(&self) -> Option<crate::commands::media::SelectedMedia> {
        crate::commands::media::get_selected_media(&self.state)
    }

    // --- search --------------------------------------------------------

    pub fn open_find_panel(&mut self) {
        self.find_panel_open = true;
    }

    pub fn open_replace_panel(&mut self) {
        self.find_panel_open = true;
        self.replace_panel_open = true;
    }

    pub fn close_find_panel(&mut self) {
        self.find_panel_open = false;
        self.replace_panel_open = false;
        self.find_matches.clear();
    }

    /// `findText(query)`: scans the document's text content for every
    /// occurrence of `query`, firing `searchFound`/`searchNotFound`.
    pub fn find_text(&mut self, query: &str) -> bool {
        self.find_matches = find_all(self.state.doc(), query);
        if self.find_matches.is_empty() {
            self.emit(EngineEvent::SearchNotFound);
            false
        } else {
            self.emit(EngineEvent::SearchFound { matches: self.find_matches.len() });
            true
        }
    }

    /// `replaceText(query, replacement)`: replaces every occurrence
    /// found by a prior [`Engine::find_text`] call (or performs a fresh
    /// search if none is pending), firing `replaceDone`.
    pub fn replace_text(&mut self, query: &str, replacement: &str) -> bool {
        if self.find_matches.is_empty() {
            self.find_matches = find_all(self.state.doc(), query);
        }
        if self.find_matches.is_empty() {
            self.emit(EngineEvent::SearchNotFound);
            return false;
        }
        let matches = std::mem::take(&mut self.find_matches);
        let replacement = replacement.to_string();
        let count = matches.len();
        let applied = self.dispatch_user(move |state, dispatch| {
            commands::run(state, dispatch, |state, tr| {
                for (from, to) in matches.iter().rev() {
                    let text = state.schema().text(replacement.clone(), vec![])?;
                    tr.replace_range(*from, *to, vec![text])?;
                }
                Ok(())
            })
        });
        if applied {
            self.emit(EngineEvent::ReplaceDone { count });
        }
        applied
    }

    // --- clipboard -------------------------------------------------------

    /// `getSelectedText()`.
    pub fn selected_text(&self) -> String {
        let sel = self.state.selection();
        text_between(self.state.doc(), sel.from(), sel.to())
    }

    /// `getSelectedHTML()`: serializes the selected text (with marks)
    /// wrapped in a single paragraph. Block structure within a
    /// multi-paragraph selection is not preserved — clipboard fidelity
    /// beyond plain runs of marked text is out of scope here.
    pub fn selected_html(&self) -> String {
        let sel = self.state.selection();
        let fragment = marked_runs_between(self.state.doc(), sel.from(), sel.to());
        if fragment.is_empty() {
            return String::new();
        }
        let schema = self.state.schema();
        let Ok(p) = schema.node("paragraph", Attrs::new(), fragment, vec![]) else {
            return String::new();
        };
        serialize(schema, &p)
    }

    pub fn copy(&self) -> String {
        self.selected_html()
    }

    pub fn cut(&mut self) -> String {
        let html = self.selected_html();
        self.dispatch_user(|state, dispatch| {
            commands::run(state, dispatch, |state, tr| {
                let sel = state.selection();
                tr.delete_range(sel.from(), sel.to())?;
                Ok(())
            })
        });
        html
    }

    #[cfg(feature = "sys")]
    pub fn paste(&mut self, html: &str) -> bool {
        self.emit(EngineEvent::PasteStart);
        let applied = self.insert_html(html);
        self.emit(EngineEvent::PasteEnd);
        applied
    }

    /// Inserts `text` at the current selection, wrapping it in any
    /// `storedMarks`. Distinct from `paste_text`, which additionally brackets
    /// the dispatch with `pasteStart`/`pasteEnd` events. Tries every composed
    /// input rule first; a matching rule's transaction replaces the plain
    /// insertion.
    pub fn insert_text(&mut self, text: &str) -> bool {
        if let Some(handled) = self.try_input_rules(text) {
            return handled;
        }
        let text = text.to_string();
        self.dispatch_user(move |state, dispatch| {
            crate::commands::text::insert_text(text.clone())(state, dispatch)
        })
    }

    /// Tests every composed input rule against the current block's text
    /// up to the caret plus the about-to-be-inserted `text`; the first
    /// match's handler builds a replacement transaction. Returns `None`
    /// when no rule matched (the caller should fall through to the plain
    /// insertion).
    fn try_input_rules(&mut self, text: &str) -> Option<bool> {
        let rules = self.state.plugins().compose_input_rules();
        if rules.is_empty() {
            return None;
        }
        let sel = self.state.selection();
        if !sel.empty() {
            return None;
        }
        let caret = sel.head;
        let resolved = resolve_head(&self.state);
        let block_start = innermost_container_pos(&resolved)? + 1;
        let before = text_between(self.state.doc(), block_start, caret);
        let probe = format!("{before}{text}");
        for rule in &rules {
            let Some(caps) = rule.pattern.captures(&probe) else {
                continue;
            };
            let m = caps.get(0)?;
            let end = caret + text.chars().count();
            let start = end.saturating_sub(m.end() - m.start());
            let mut tr = self.state.transaction();
            if (rule.handler)(&self.state, &caps, start, end, &mut tr) {
                return Some(self.commit(tr, true));
            }
        }
        None
    }

    /// Runs a keymap-resolved `Command` against the current state, installing
    /// its transaction if it dispatches. The InputHandler looks up commands
    /// in `Engine::keymap` and calls this to run them.
    pub fn dispatch_command(&mut self, command: &Command) -> bool {
        let command = command.clone();
        self.dispatch_user(move |state, dispatch| command(state, dispatch))
    }

    /// Sets the current selection directly, with no document mutation. Fires
    /// `modelChanged`/ `textCursorMove` like any other dispatch, but not
    /// `input` — a moved caret isn't typed text, matching how `undo`/`redo` are
    /// dispatched internally too.
    pub fn set_selection(&mut self, selection: Selection) -> bool {
        self.dispatch_internal(move |state, dispatch| {
            let mut tr = state.transaction();
            tr.set_selection(selection);
            if let Some(dispatch) = dispatch {
                dispatch(tr);
            }
            true
        })
    }

    pub fn paste_text(&mut self, text: &str) -> bool {
        self.emit(EngineEvent::PasteStart);
        let text = text.to_string();
        let applied = self.dispatch_user(move |state, dispatch| {
            crate::commands::text::insert_text(text.clone())(state, dispatch)
        });
        self.emit(EngineEvent::PasteEnd);
        applied
    }

    // --- extension (plugins/toolbar) ------------------------------------

    pub fn register_plugin(&mut self, plugin: Plugin) {
        if self.options.disable_plugins.iter().any(|n| n == &plugin.name) {
            warn!(name = %plugin.name, "plugin disabled by EditorOptions, skipping registration");
            return;
        }
        let name = plugin.name.clone();
        let init = plugin.init.clone();
        self.state.plugins_mut().register(plugin);
        if let Some(init) = init {
            init(&self.state);
        }
        info!(name, "plugin registered");
        self.emit(EngineEvent::PluginLoaded { name });
    }

    pub fn unregister_plugin(&mut self, name: &str) {
        if let Some(plugin) = self.state.plugins().get(name) {
            if let Some(destroy) = plugin.destroy.clone() {
                destroy();
            }
        }
        self.state.plugins_mut().unregister(name);
    }

    /// `contextMenuItems(context)` aggregated across every registered plugin,
    /// evaluated against the engine's current state.
    pub fn context_menu_items(&self) -> Vec<ToolbarItemDescriptor> {
        self.state.plugins().context_menu_items(&self.state)
    }

    pub fn plugin(&self, name: &str) -> Option<&Plugin> {
        self.state.plugins().get(name)
    }

    pub fn register_toolbar_item(&mut self, item: ToolbarItemDescriptor) {
        self.toolbar_items.retain(|i| i.id != item.id);
        self.toolbar_items.push(item);
    }

    pub fn unregister_toolbar_item(&mut self, id: &str) {
        self.toolbar_items.retain(|i| i.id != id);
    }

    pub fn toolbar_items(&self) -> Vec<ToolbarItemDescriptor> {
        let mut items = self.toolbar_items.clone();
        items.extend(self.state.plugins().toolbar_items());
        items
    }

    /// The engine's own bindings, composed over every registered plugin's
    /// keymap.
    pub fn keymap(&self) -> Keymap {
        let mut base = Keymap::new();
        let mark = |mark_type: &'static str| -> Command {
            Arc::new(move |state, dispatch| {
                crate::commands::marks::toggle_mark(mark_type, Attrs::new())(state, dispatch)
            })
        };
        let undo: Command = Arc::new({
            let history = self.history.clone();
            move |state, dispatch| undo_command(history.clone())(state, dispatch)
        });
        let redo: Command = Arc::new({
            let history = self.history.clone();
            move |state, dispatch| redo_command(history.clone())(state, dispatch)
        });
        base.insert("Mod-b".to_string(), mark("bold"));
        base.insert("Mod-i".to_string(), mark("italic"));
        base.insert("Mod-u".to_string(), mark("underline"));
        base.insert("Mod-Shift-x".to_string(), mark("strikethrough"));
        base.insert("Mod-z".to_string(), undo);
        base.insert("Mod-y".to_string(), redo);
        base.insert("Mod-Shift-z".to_string(), redo);
        base.insert(
            "Enter".to_string(),
            Arc::new(|state, dispatch| crate::commands::text::split_block(state, dispatch)),
        );
        base.insert(
            "Shift-Enter".to_string(),
            Arc::new(|state, dispatch| crate::commands::text::insert_hard_break(state, dispatch)),
        );
        base.insert(
            "Tab".to_string(),
            Arc::new(|state, dispatch| crate::commands::lists::tab_or_indent(state, dispatch)),
        );
        base.insert(
            "Shift-Tab".to_string(),
            Arc::new(|state, dispatch| crate::commands::lists::list_outdent(state, dispatch)),
        );
        base.insert(
            "Backspace".to_string(),
            Arc::new(|state, dispatch| crate::commands::text::delete_backward(state, dispatch)),
        );
        base.insert(
            "Delete".to_string(),
            Arc::new(|state, dispatch| crate::commands::text::delete_forward(state, dispatch)),
        );
        base.insert(
            "ArrowLeft".to_string(),
            Arc::new(|state, dispatch| crate::commands::nav::move_left(state, dispatch)),
        );
        base.insert(
            "ArrowRight".to_string(),
            Arc::new(|state, dispatch| crate::commands::nav::move_right(state, dispatch)),
        );
        base.insert(
            "Home".to_string(),
            Arc::new(|state, dispatch| crate::commands::nav::move_home(state, dispatch)),
        );
        base.insert(
            "End".to_string(),
            Arc::new(|state, dispatch| crate::commands::nav::move_end(state, dispatch)),
        );
        base.insert(
            "Mod-ArrowLeft".to_string(),
            Arc::new(|state, dispatch| crate::commands::nav::move_word_left(state, dispatch)),
        );
        base.insert(
            "Mod-ArrowRight".to_string(),
            Arc::new(|state, dispatch| crate::commands::nav::move_word_right(state, dispatch)),
        );
        self.state.plugins().compose_keymap(&base)
    }

    // --- dispatch internals ----------------------------------------------

    /// Runs a user-facing command, firing `input`/`modelChanged` on success.
    fn dispatch_user(&mut self, command: impl FnOnce(&EditorState, Option<DispatchFn>) -> bool) -> bool {
        self.dispatch(command, true)
    }

    /// Runs an internal command (undo/redo) — still fires
    /// `modelChanged`, but not `input`.
    fn dispatch_internal(&mut self, command: impl FnOnce(&EditorState, Option<DispatchFn>) -> bool) -> bool {
        self.dispatch(command, false)
    }

    fn dispatch(&mut self, command: impl FnOnce(&EditorState, Option<DispatchFn>) -> bool, user_initiated: bool) -> bool {
        let mut captured: Option<Transaction> = None;
        let applied = command(&self.state, Some(&mut |tr| captured = Some(tr)));
        if !applied {
            return false;
        }
        let Some(tr) = captured else { return false };
        self.commit(tr, user_initiated)
    }

    /// `QuotaError`: a transaction that would exceed `maxLength` is rejected
    /// here, before `EditorState::apply` ever sees it, and no event fires.
    fn commit(&mut self, tr: Transaction, user_initiated: bool) -> bool {
        if let Some(max_length) = self.options.max_length {
            let prospective = tr.doc().text_content().chars().count();
            if prospective > max_length {
                warn!(max_length, prospective, "transaction rejected: would exceed maxLength");
                return false;
            }
        }

        let outcome = match self.state.apply(tr) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "transaction rejected");
                return false;
            }
        };

        let old_state = std::mem::replace(&mut self.state, outcome.state);
        self.state.plugins().notify_state_update(&self.state, &old_state);
        for plugin_error in outcome.plugin_errors {
            self.emit(EngineEvent::PluginError { name: plugin_error.name, error: plugin_error.message });
        }

        let value = self.value();
        self.emit(EngineEvent::ModelChanged { value: value.clone() });
        if user_initiated {
            self.emit(EngineEvent::Input { value: value.clone() });
        }
        self.emit(EngineEvent::TextCursorMove(self.cursor_context()));
        true
    }

    /// Builds the full `textCursorMove` payload from the current selection.
    fn cursor_context(&self) -> TextCursorMoveEvent {
        let sel = self.state.selection();
        let resolved = resolve_head(&self.state);
        let block_pos = innermost_container_pos(&resolved);
        let block = block_pos.map(|_| resolved.parent());

        let mut list_type = None;
        let mut list_depth = 0usize;
        let mut is_checklist = false;
        let mut in_table = false;
        let mut table_row_index = None;
        let mut table_cell_index = None;
        for entry in resolved.path() {
            match entry.node.node_type() {
                "bulletList" | "orderedList" => {
                    list_type = Some(entry.node.node_type().to_string());
                    list_depth += 1;
                    is_checklist = entry
                        .node
                        .attrs()
                        .and_then(|a| a.get("checklist"))
                        .and_then(AttrValue::as_bool)
                        .unwrap_or(false);
                }
                "table" => in_table = true,
                "tableRow" => table_row_index = Some(entry.index),
                "tableCell" => table_cell_index = Some(entry.index),
                _ => {}
            }
        }

        let media = resolved
            .node_before()
            .filter(|n| ["image", "video", "embed"].contains(&n.node_type()))
            .or_else(|| block.filter(|b| ["image", "video", "embed"].contains(&b.node_type())));

        TextCursorMoveEvent {
            value: self.value(),
            anchor: sel.anchor,
            head: sel.head,
            marks: crate::commands::marks::get_active_marks(&self.state),
            block_type: block.map(|b| b.node_type().to_string()),
            block_attrs: block.and_then(Node::attrs).cloned().unwrap_or_default(),
            align: block
                .and_then(Node::attrs)
                .and_then(|a| a.get("align"))
                .and_then(AttrValue::as_str)
                .map(str::to_string),
            indent: block.and_then(Node::attrs).and_then(|a| a.get("indent")).and_then(AttrValue::as_i64),
            line_height: block
                .and_then(Node::attrs)
                .and_then(|a| a.get("lineHeight"))
                .and_then(AttrValue::as_str)
                .map(str::to_string),
            list_type,
            list_depth,
            is_checklist,
            in_table,
            table_row_index,
            table_cell_index,
            in_media: media.is_some(),
            media_type: media.map(|m| m.node_type().to_string()),
            media_attrs: media.and_then(Node::attrs).cloned(),
        }
    }
}

/// Absolute positions of every character in `doc.text_content()`'s
/// order, used to map plain-text search matches back onto document
/// positions.
fn text_positions(doc: &Node) -> Vec<usize> {
    let mut positions = Vec::new();
    doc.nodes_between(0, doc.node_size(), 0, &mut |node, pos, _parent, _idx| {
        if let Node::Text(t) = node {
            positions.extend((0..t.text.chars().count()).map(|i| pos + i));
        }
        true
    });
    positions
}

fn find_all(doc: &Node, query: &str) -> Vec<(usize, usize)> {
    if query.is_empty() {
        return Vec::new();
    }
    let text = doc.text_content();
    let positions = text_positions(doc);
    let chars: Vec<char> = text.chars().collect();
    let needle: Vec<char> = query.chars().collect();
    let mut matches = Vec::new();
    if needle.len() > chars.len() {
        return matches;
    }
    for start in 0..=chars.len() - needle.len() {
        if chars[start..start + needle.len()] == needle[..] {
            matches.push((positions[start], positions[start + needle.len() - 1] + 1));
        }
    }
    matches
}

/// Concatenated text content overlapping `[from, to)`, clipped to the
/// range at partially-overlapping text nodes.
fn text_between(doc: &Node, from: usize, to: usize) -> String {
    let mut out = String::new();
    doc.nodes_between(from, to, 0, &mut |node, pos, _parent, _idx| {
        if let Node::Text(t) = node {
            let chars: Vec<char> = t.text.chars().collect();
            let start = from.saturating_sub(pos).min(chars.len());
            let end = (to.saturating_sub(pos)).min(chars.len());
            if start < end {
                out.extend(&chars[start..end]);
            }
        }
        true
    });
    out
}

/// Text nodes (with marks preserved) overlapping `[from, to)`, clipped
/// to the range — the flat run-list [`Engine::selected_html`] wraps in
/// a single paragraph.
fn marked_runs_between(doc: &Node, from: usize, to: usize) -> Vec<Node> {
    let mut out = Vec::new();
    doc.nodes_between(from, to, 0, &mut |node, pos, _parent, _idx| {
        if let Node::Text(t) = node {
            let chars: Vec<char> = t.text.chars().collect();
            let start = from.saturating_sub(pos).min(chars.len());
            let end = (to.saturating_sub(pos)).min(chars.len());
            if start < end {
                let slice: String = chars[start..end].iter().collect();
                out.push(Node::new_text_unchecked(slice, t.marks.clone()));
            }
        }
        true
    });
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_doc_insert_text_matches_scenario_one() {
        let mut engine = Engine::new(EditorOptions::default());
        let applied = engine.dispatch_user(|state, dispatch| {
            crate::commands::text::insert_text("hello")(state, dispatch)
        });
        assert!(applied);
        assert_eq!(engine.value(), "<div><p>hello</p></div>");
        assert_eq!(engine.state().selection(), Selection::cursor(6));
    }

    #[test]
    fn bold_a_word_matches_scenario_two() {
        let mut engine = Engine::new(EditorOptions::default());
        engine.dispatch_user(|state, dispatch| crate::commands::text::insert_text("hello world")(state, dispatch));
        let mut tr = engine.state.transaction();
        tr.set_selection(Selection::new(7, 12));
        engine.commit(tr, false);
        let applied = engine.format_text("bold", Attrs::new());
        assert!(applied);
        assert_eq!(engine.value(), "<div><p>hello <strong>world</strong></p></div>");
    }

    #[test]
    fn heading_conversion_matches_scenario_three() {
        let mut engine = Engine::new(EditorOptions::default());
        engine.dispatch_user(|state, dispatch| crate::commands::text::insert_text("Title")(state, dispatch));
        let mut attrs = Attrs::new();
        attrs.insert("level".to_string(), AttrValue::Int(2));
        assert!(engine.set_block_type("heading", attrs));
        assert_eq!(engine.value(), "<div><h2>Title</h2></div>");
    }

    #[test]
    fn max_length_rejects_overflow_matches_scenario_six() {
        let mut options = EditorOptions::default();
        options.max_length = Some(5);
        let mut engine = Engine::new(options);
        engine.dispatch_user(|state, dispatch| crate::commands::text::insert_text("abcde")(state, dispatch));
        let mut input_events = 0;
        engine.set_listener(move |event| {
            if matches!(event, EngineEvent::Input { .. }) {
                input_events += 1;
            }
        });
        let applied = engine.dispatch_user(|state, dispatch| crate::commands::text::insert_text("x")(state, dispatch));
        assert!(!applied);
        assert_eq!(engine.value(), "<div><p>abcde</p></div>");
    }

    #[test]
    fn undo_redo_delete_matches_scenario_five() {
        let mut engine = Engine::new(EditorOptions::default());
        engine.dispatch_user(|state, dispatch| crate::commands::text::insert_text("abcdef")(state, dispatch));
        let mut tr = engine.state.transaction();
        tr.delete_range(2, 5).unwrap();
        engine.commit(tr, true);
        assert_eq!(engine.value(), "<div><p>af</p></div>");

        assert!(engine.undo());
        assert_eq!(engine.value(), "<div><p>abcdef</p></div>");

        assert!(engine.redo());
        assert_eq!(engine.value(), "<div><p>af</p></div>");
    }

    #[test]
    fn find_text_reports_matches() {
        let mut engine = Engine::new(EditorOptions::default());
        engine.dispatch_user(|state, dispatch| crate::commands::text::insert_text("hello world")(state, dispatch));
        assert!(engine.find_text("world"));
        assert!(!engine.find_text("xyz"));
    }
}
