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

//! Plugin lifecycle and composition. A plugin is a record of optional
//! capability callbacks rather than a trait object hierarchy: the manager
//! dispatches by feature presence, matching its "plugins as capability records"
//! design note.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use crate::model::mark::Mark;
use crate::state::EditorState;
use crate::transaction::Transaction;

/// A single keymap binding: a normalized key string to a command function.
/// Mirrors its `(state, dispatch?) -> boolean` contract: called with `dispatch
/// = None` the command must be side-effect-free and only report whether it
/// *would* apply; called with `Some(dispatch)` it builds a transaction and
/// hands it to `dispatch` before returning `true`.
pub type DispatchFn<'a> = &'a mut dyn FnMut(Transaction);
pub type Command = Arc<dyn Fn(&EditorState, Option<DispatchFn>) -> bool + Send + Sync>;
pub type Keymap = BTreeMap<String, Command>;

/// One `toolbarItems` / `contextMenuItems` descriptor. Intentionally opaque
/// beyond an id/label pair — the surrounding toolbar chrome interprets
/// `command_id` against its own registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolbarItemDescriptor {
    pub id: String,
    pub label: String,
    pub command_id: String,
}

/// A compiled input rule: a pattern tested against the text of the
/// current block up to the caret, and a handler invoked on a match.
#[derive(Clone)]
pub struct InputRule {
    pub pattern: Regex,
    pub handler: Arc<dyn Fn(&EditorState, &regex::Captures, usize, usize, &mut Transaction) -> bool + Send + Sync>,
}

/// A record of optional plugin hooks. Every field beyond `name` is optional;
/// the manager checks for presence rather than requiring a full trait
/// implementation, so a plugin that only wants to contribute a keymap need not
/// stub out the rest.
#[derive(Clone)]
pub struct Plugin {
    pub name: String,
    /// Runs once at registration. Takes `&EditorState` rather than a
    /// back-pointer to the engine itself to avoid a dependency cycle between
    /// this module and `engine`; the engine calls it at the point it registers
    /// the plugin.
    pub init: Option<Arc<dyn Fn(&EditorState) + Send + Sync>>,
    pub destroy: Option<Arc<dyn Fn() + Send + Sync>>,
    pub keymap: Option<Arc<dyn Fn() -> Keymap + Send + Sync>>,
    pub toolbar_items: Option<Arc<dyn Fn() -> Vec<ToolbarItemDescriptor> + Send + Sync>>,
    pub input_rules: Option<Arc<dyn Fn() -> Vec<InputRule> + Send + Sync>>,
    pub context_menu_items: Option<Arc<dyn Fn(&EditorState) -> Vec<ToolbarItemDescriptor> + Send + Sync>>,
    pub filter_transaction:
        Option<Arc<dyn Fn(Transaction, &EditorState) -> Transaction + Send + Sync>>,
    pub state_did_update: Option<Arc<dyn Fn(&EditorState, &EditorState) + Send + Sync>>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Plugin {
            name: name.into(),
            init: None,
            destroy: None,
            keymap: None,
            toolbar_items: None,
            input_rules: None,
            context_menu_items: None,
            filter_transaction: None,
            state_did_update: None,
        }
    }

    pub fn with_init(mut self, f: impl Fn(&EditorState) + Send + Sync + 'static) -> Self {
        self.init = Some(Arc::new(f));
        self
    }

    pub fn with_destroy(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.destroy = Some(Arc::new(f));
        self
    }

    pub fn with_context_menu_items(
        mut self,
        f: impl Fn(&EditorState) -> Vec<ToolbarItemDescriptor> + Send + Sync + 'static,
    ) -> Self {
        self.context_menu_items = Some(Arc::new(f));
        self
    }

    pub fn with_keymap(mut self, f: impl Fn() -> Keymap + Send + Sync + 'static) -> Self {
        self.keymap = Some(Arc::new(f));
        self
    }

    pub fn with_input_rules(mut self, f: impl Fn() -> Vec<InputRule> + Send + Sync + 'static) -> Self {
        self.input_rules = Some(Arc::new(f));
        self
    }

    pub fn with_filter_transaction(
        mut self,
        f: impl Fn(Transaction, &EditorState) -> Transaction + Send + Sync + 'static,
    ) -> Self {
        self.filter_transaction = Some(Arc::new(f));
        self
    }

    pub fn with_state_did_update(
        mut self,
        f: impl Fn(&EditorState, &EditorState) + Send + Sync + 'static,
    ) -> Self {
        self.state_did_update = Some(Arc::new(f));
        self
    }
}

/// `pluginError{name, error}` payload, emitted instead of propagating a
/// panic/hook failure out of the manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginErrorEvent {
    pub name: String,
    pub message: String,
}

/// Maintains plugin load order, composes keymaps and input rules, and
/// drives the transaction-filter and state-update hooks.
#[derive(Clone, Default)]
pub struct PluginManager {
    plugins: Vec<Plugin>,
    /// Plugins quarantined for the remainder of the current hook cycle after a
    /// hook failure.
    quarantined: Vec<String>,
}

impl PluginManager {
    pub fn new() -> Self {
        PluginManager::default()
    }

    pub fn register(&mut self, plugin: Plugin) {
        self.plugins.retain(|p| p.name != plugin.name);
        self.plugins.push(plugin);
    }

    pub fn unregister(&mut self, name: &str) {
        self.plugins.retain(|p| p.name != name);
    }

    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Composes every registered plugin's keymap over `base`, in load order, so
    /// a later plugin's binding for the same key wins over an earlier one.
    /// `base` (the engine's own bindings) is applied last and always wins.
    pub fn compose_keymap(&self, base: &Keymap) -> Keymap {
        let mut composed = Keymap::new();
        for plugin in &self.plugins {
            if let Some(f) = &plugin.keymap {
                for (key, cmd) in f() {
                    composed.insert(key, cmd);
                }
            }
        }
        for (key, cmd) in base {
            composed.insert(key.clone(), cmd.clone());
        }
        composed
    }

    pub fn compose_input_rules(&self) -> Vec<InputRule> {
        self.plugins
            .iter()
            .filter_map(|p| p.input_rules.as_ref())
            .flat_map(|f| f())
            .collect()
    }

    pub fn toolbar_items(&self) -> Vec<ToolbarItemDescriptor> {
        self.plugins
            .iter()
            .filter_map(|p| p.toolbar_items.as_ref())
            .flat_map(|f| f())
            .collect()
    }

    /// `contextMenuItems(context)` aggregated across every plugin; `context` is
    /// the state the menu was opened against.
    pub fn context_menu_items(&self, context: &EditorState) -> Vec<ToolbarItemDescriptor> {
        self.plugins
            .iter()
            .filter_map(|p| p.context_menu_items.as_ref())
            .flat_map(|f| f(context))
            .collect()
    }

    /// Runs `destroy` on every plugin in load order.
    pub fn destroy_all(&self) {
        for plugin in &self.plugins {
            if let Some(f) = &plugin.destroy {
                f();
            }
        }
    }

    /// Runs every plugin's `filterTransaction` in load order. A plugin
    /// whose filter panics (surfaced here as `Err`, since Rust plugins
    /// can't literally throw) is demoted to identity for this commit and
    /// quarantined; the caller should surface `errors` as
    /// `pluginError` events.
    pub fn filter_transaction(
        &mut self,
        mut tr: Transaction,
        state: &EditorState,
    ) -> (Transaction, Vec<PluginErrorEvent>) {
        self.quarantined.clear();
        let mut errors = Vec::new();
        for plugin in self.plugins.clone() {
            let Some(filter) = &plugin.filter_transaction else {
                continue;
            };
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                filter(tr.clone(), state)
            }));
            match result {
                Ok(filtered) => tr = filtered,
                Err(_) => {
                    warn!(plugin = %plugin.name, "filterTransaction panicked; demoted to identity");
                    self.quarantined.push(plugin.name.clone());
                    errors.push(PluginErrorEvent {
                        name: plugin.name.clone(),
                        message: "filterTransaction panicked".to_string(),
                    });
                }
            }
        }
        (tr, errors)
    }

    /// Runs `stateDidUpdate` on every plugin in load order, after the new state
    /// has been installed.
    pub fn notify_state_update(&self, new_state: &EditorState, old_state: &EditorState) {
        for plugin in &self.plugins {
            if self.quarantined.contains(&plugin.name) {
                continue;
            }
            if let Some(f) = &plugin.state_did_update {
                f(new_state, old_state);
            }
        }
    }

    pub fn is_quarantined(&self, name: &str) -> bool {
        self.quarantined.iter().any(|n| n == name)
    }
}

/// Applies `storedMarks` to freshly-inserted text: wraps `[from, to)` with each
/// stored mark. Shared by the InputHandler insert path and any plugin/command
/// that inserts text directly.
pub fn apply_stored_marks(
    tr: &mut Transaction,
    from: usize,
    to: usize,
    stored: &[Mark],
) -> Result<(), crate::error::EngineError> {
    for mark in stored {
        tr.add_mark(from, to, mark.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn later_plugin_keymap_overrides_earlier() {
        let mut manager = PluginManager::new();
        manager.register(Plugin::new("a").with_keymap(|| {
            let mut m = Keymap::new();
            m.insert("Mod-b".to_string(), Arc::new(|_, _| false));
            m
        }));
        manager.register(Plugin::new("b").with_keymap(|| {
            let mut m = Keymap::new();
            m.insert("Mod-b".to_string(), Arc::new(|_, _| true));
            m
        }));
        let composed = manager.compose_keymap(&Keymap::new());
        let cmd = composed.get("Mod-b").unwrap();
        let state = EditorState::new_empty(crate::schema::default_schema::default_schema());
        assert!(cmd(&state, None));
    }

    #[test]
    fn base_keymap_always_wins() {
        let mut manager = PluginManager::new();
        manager.register(Plugin::new("a").with_keymap(|| {
            let mut m = Keymap::new();
            m.insert("Mod-b".to_string(), Arc::new(|_, _| false));
            m
        }));
        let mut base = Keymap::new();
        base.insert("Mod-b".to_string(), Arc::new(|_, _| true));
        let composed = manager.compose_keymap(&base);
        let state = EditorState::new_empty(crate::schema::default_schema::default_schema());
        assert!((composed.get("Mod-b").unwrap())(&state, None));
    }

    #[test]
    fn unregister_drops_plugin_keymap() {
        let mut manager = PluginManager::new();
        manager.register(Plugin::new("a").with_keymap(|| {
            let mut m = Keymap::new();
            m.insert("Mod-b".to_string(), Arc::new(|_, _| true));
            m
        }));
        manager.unregister("a");
        let composed = manager.compose_keymap(&Keymap::new());
        assert!(composed.is_empty());
    }
}
