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

//! The immutable editor snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, SchemaError};
use crate::model::mark::Mark;
use crate::model::node::Node;
use crate::model::selection::Selection;
use crate::plugin::{PluginErrorEvent, PluginManager};
use crate::schema::Schema;
use crate::transaction::Transaction;

/// The frozen tuple `(doc, selection, storedMarks, plugins, schemaRef)`. Every
/// `apply` produces a new `EditorState`; nothing here is mutated in place once
/// built.
#[derive(Clone)]
pub struct EditorState {
    schema: Arc<Schema>,
    doc: Node,
    selection: Selection,
    stored_marks: Vec<Mark>,
    plugins: PluginManager,
}

/// `{doc, selection:{anchor,head}, marks:[{type,attrs?}]}`.
#[derive(Serialize, Deserialize)]
pub struct EditorStateJson {
    pub doc: Node,
    pub selection: SelectionJson,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

#[derive(Serialize, Deserialize)]
pub struct SelectionJson {
    pub anchor: usize,
    pub head: usize,
}

/// The result of applying a transaction: the new state plus any plugin hook
/// failures surfaced for the caller to turn into `pluginError` events.
pub struct ApplyOutcome {
    pub state: EditorState,
    pub plugin_errors: Vec<PluginErrorEvent>,
}

impl EditorState {
    /// `create(schema, content?, selection?)`. `content` may be a ready-made
    /// document `Node`, a non-empty string (wrapped in a single paragraph), or
    /// `None` (a document with one empty paragraph).
    pub fn create(
        schema: Schema,
        content: Option<ContentInit>,
        selection: Option<Selection>,
    ) -> Result<Self, SchemaError> {
        let schema = Arc::new(schema);
        let doc = match content {
            Some(ContentInit::Doc(doc)) => doc,
            Some(ContentInit::Text(text)) if !text.is_empty() => {
                let text_node = schema.text(text, vec![])?;
                schema.node("paragraph", Default::default(), vec![text_node], vec![])?
            }
            _ => schema.node("paragraph", Default::default(), vec![], vec![])
                .and_then(|p| schema.node("document", Default::default(), vec![p], vec![]))?,
        };
        let doc = if doc.node_type() == "document" {
            doc
        } else {
            schema.node("document", Default::default(), vec![doc], vec![])?
        };
        let max = doc.content_size();
        let selection = selection.unwrap_or(Selection::cursor(max.min(1))).clamp(max);
        Ok(EditorState {
            schema,
            doc,
            selection,
            stored_marks: Vec::new(),
            plugins: PluginManager::new(),
        })
    }

    /// A document with a single empty paragraph, no plugins — a
    /// convenience for tests and `PluginManager` doctests.
    pub fn new_empty(schema: Schema) -> Self {
        Self::create(schema, None, None).expect("built-in schema always accepts an empty paragraph")
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> &[Mark] {
        &self.stored_marks
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginManager {
        &mut self.plugins
    }

    pub fn with_plugins(mut self, plugins: PluginManager) -> Self {
        self.plugins = plugins;
        self
    }

    /// Starts a transaction builder against this state's current `doc`.
    pub fn transaction(&self) -> Transaction {
        Transaction::new(self.doc.clone())
    }

    /// `apply(tr)`: runs every plugin's `filterTransaction` in load order, then
    /// computes the new state — `doc` from the (possibly filtered) transaction,
    /// `selection` from the transaction's override or the old selection mapped
    /// through the transaction's mapping and clamped, `storedMarks` likewise.
    pub fn apply(&self, tr: Transaction) -> Result<ApplyOutcome, EngineError> {
        let mut plugins = self.plugins.clone();
        let (tr, plugin_errors) = plugins.filter_transaction(tr, self);

        let new_doc = tr.doc().clone();
        let max = new_doc.content_size();
        let new_selection = match tr.selection() {
            Some(sel) => sel.clamp(max),
            None => self.selection.map(tr.mapping()).clamp(max),
        };
        let new_stored_marks = match tr.stored_marks() {
            Some(marks) => marks.to_vec(),
            None => self.stored_marks.clone(),
        };

        debug!(steps = tr.steps().len(), "committed transaction");

        let new_state = EditorState {
            schema: self.schema.clone(),
            doc: new_doc,
            selection: new_selection,
            stored_marks: new_stored_marks,
            plugins,
        };
        Ok(ApplyOutcome {
            state: new_state,
            plugin_errors,
        })
    }

    pub fn to_json(&self) -> EditorStateJson {
        EditorStateJson {
            doc: self.doc.clone(),
            selection: SelectionJson {
                anchor: self.selection.anchor,
                head: self.selection.head,
            },
            marks: self.stored_marks.clone(),
        }
    }

    /// `fromJSON(schema, json)`: reconstructs through the schema and validates.
    /// Reconstruction happens one node at a time via the schema factories so an
    /// invalid tree is rejected rather than silently accepted.
    pub fn from_json(schema: Schema, json: EditorStateJson) -> Result<Self, SchemaError> {
        let doc = revalidate(&schema, json.doc)?;
        let max = doc.content_size();
        let selection = Selection::new(json.selection.anchor, json.selection.head).clamp(max);
        Ok(EditorState {
            schema: Arc::new(schema),
            doc,
            selection,
            stored_marks: json.marks,
            plugins: PluginManager::new(),
        })
    }

    /// Total text character count, excluding markup (`getLength`).
    pub fn length(&self) -> usize {
        self.doc.text_content().chars().count()
    }

    /// `isEmpty`: true if `doc` is one empty paragraph or `contentSize <= 2`.
    pub fn is_empty_doc(&self) -> bool {
        self.doc.content_size() <= 2
    }

    /// `checkValidity`: false if required-and-empty, or shorter than
    /// `minLength`.
    pub fn check_validity(&self, required: bool, min_length: usize) -> bool {
        if required && self.is_empty_doc() {
            return false;
        }
        self.length() >= min_length
    }
}

pub enum ContentInit {
    Doc(Node),
    Text(String),
}

/// Walks `node` and rebuilds it through `schema`, validating every
/// level — used by [`EditorState::from_json`] so a tampered or
/// hand-edited payload can't bypass content-expression or attribute
/// validation.
fn revalidate(schema: &Schema, node: Node) -> Result<Node, SchemaError> {
    match node {
        Node::Text(t) => schema.text(t.text, t.marks),
        Node::Leaf(l) => schema.node(&l.node_type, l.attrs, vec![], vec![]),
        Node::Container(c) => {
            let children = c
                .children
                .into_iter()
                .map(|child| revalidate(schema, child))
                .collect::<Result<Vec<_>, _>>()?;
            schema.node(&c.node_type, c.attrs, children, vec![])
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::default_schema::default_schema;

    #[test]
    fn create_with_no_content_is_one_empty_paragraph() {
        let state = EditorState::create(default_schema(), None, None).unwrap();
        assert_eq!(state.doc().children().len(), 1);
        assert_eq!(state.doc().children()[0].node_type(), "paragraph");
        assert_eq!(state.selection(), Selection::cursor(1));
    }

    #[test]
    fn create_with_text_wraps_in_paragraph() {
        let state = EditorState::create(default_schema(), Some(ContentInit::Text("hi".into())), None).unwrap();
        assert_eq!(state.doc().text_content(), "hi");
    }

    #[test]
    fn apply_advances_doc_and_maps_selection() {
        let state = EditorState::create(default_schema(), None, None).unwrap();
        let mut tr = state.transaction();
        tr.insert_text(1, "hello", vec![]).unwrap();
        let outcome = state.apply(tr).unwrap();
        assert_eq!(outcome.state.doc().text_content(), "hello");
        assert_eq!(outcome.state.selection(), Selection::cursor(6));
    }

    #[test]
    fn apply_explicit_selection_overrides_mapping() {
        let state = EditorState::create(default_schema(), Some(ContentInit::Text("hello".into())), None).unwrap();
        let mut tr = state.transaction();
        tr.set_selection(Selection::cursor(3));
        let outcome = state.apply(tr).unwrap();
        assert_eq!(outcome.state.selection(), Selection::cursor(3));
    }

    #[test]
    fn selection_clamps_after_delete() {
        let state = EditorState::create(default_schema(), Some(ContentInit::Text("hello".into())), Some(Selection::cursor(6))).unwrap();
        let mut tr = state.transaction();
        tr.delete_range(1, 6).unwrap();
        let outcome = state.apply(tr).unwrap();
        assert!(outcome.state.selection().anchor <= outcome.state.doc().content_size());
    }

    #[test]
    fn json_round_trip() {
        let state = EditorState::create(default_schema(), Some(ContentInit::Text("hi".into())), None).unwrap();
        let json = state.to_json();
        let restored = EditorState::from_json(default_schema(), json).unwrap();
        assert_eq!(restored.doc(), state.doc());
        assert_eq!(restored.selection(), state.selection());
    }

    #[test]
    fn is_empty_doc_true_for_fresh_state() {
        let state = EditorState::create(default_schema(), None, None).unwrap();
        assert!(state.is_empty_doc());
    }

    #[test]
    fn check_validity_rejects_empty_when_required() {
        let state = EditorState::create(default_schema(), None, None).unwrap();
        assert!(!state.check_validity(true, 0));
        assert!(state.check_validity(false, 0));
    }
}
