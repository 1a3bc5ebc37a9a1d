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

//! The step accumulator. A [`Transaction`] starts from an
//! [`crate::state::EditorState`]'s `doc` and grows by appending steps; each
//! structural method applies its step immediately so a failure aborts the whole
//! transaction build before anything is committed to the state.

use crate::error::{EngineError, StepError};
use crate::model::mark::{Attrs, Mark};
use crate::model::node::Node;
use crate::model::selection::Selection;
use crate::step::{Mapping, Step, StepMap};

/// An in-progress, append-only batch of steps against a starting `doc`.
///
/// Built by [`crate::state::EditorState::transaction`]; consumed by
/// [`crate::state::EditorState::apply`].
#[derive(Clone, Debug)]
pub struct Transaction {
    doc_before: Node,
    doc: Node,
    steps: Vec<Step>,
    mapping: Mapping,
    selection: Option<Selection>,
    stored_marks: Option<Vec<Mark>>,
}

impl Transaction {
    pub fn new(doc: Node) -> Self {
        Transaction {
            doc_before: doc.clone(),
            doc,
            steps: Vec::new(),
            mapping: Mapping::new(),
            selection: None,
            stored_marks: None,
        }
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn doc_before(&self) -> &Node {
        &self.doc_before
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The composed [`Mapping`] of every step appended so far.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    /// Appends `step`, applying it to the current `doc`. On failure the
    /// transaction is left as it was before the call — the caller's command
    /// should propagate the error and discard the transaction.
    fn push(&mut self, step: Step) -> Result<&mut Self, EngineError> {
        let new_doc = step.apply(&self.doc).map_err(EngineError::Step)?;
        self.mapping.append(step.get_map());
        self.doc = new_doc;
        self.steps.push(step);
        Ok(self)
    }

    pub fn insert_text(
        &mut self,
        pos: usize,
        text: impl Into<String>,
        marks: Vec<Mark>,
    ) -> Result<&mut Self, EngineError> {
        self.push(Step::InsertText {
            pos,
            text: text.into(),
            marks,
        })
    }

    pub fn delete_range(&mut self, from: usize, to: usize) -> Result<&mut Self, EngineError> {
        if from == to {
            return Ok(self);
        }
        self.push(Step::DeleteRange { from, to })
    }

    pub fn replace_range(
        &mut self,
        from: usize,
        to: usize,
        nodes: Vec<Node>,
    ) -> Result<&mut Self, EngineError> {
        self.push(Step::ReplaceRange { from, to, nodes })
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<&mut Self, EngineError> {
        self.push(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<&mut Self, EngineError> {
        self.push(Step::RemoveMark { from, to, mark })
    }

    pub fn set_node_attrs(&mut self, pos: usize, attrs: Attrs) -> Result<&mut Self, EngineError> {
        self.push(Step::SetNodeAttrs { pos, attrs })
    }

    pub fn wrap_in(
        &mut self,
        from: usize,
        to: usize,
        node_type: impl Into<String>,
        attrs: Attrs,
    ) -> Result<&mut Self, EngineError> {
        self.push(Step::WrapIn {
            from,
            to,
            node_type: node_type.into(),
            attrs,
        })
    }

    pub fn unwrap(&mut self, pos: usize, wrapper_size: usize) -> Result<&mut Self, EngineError> {
        self.push(Step::Unwrap { pos, wrapper_size })
    }

    pub fn set_block_type(
        &mut self,
        pos: usize,
        new_type: impl Into<String>,
        new_attrs: Attrs,
    ) -> Result<&mut Self, EngineError> {
        self.push(Step::SetBlockType {
            pos,
            new_type: new_type.into(),
            new_attrs,
        })
    }

    /// Overrides the selection the committed state will use instead of
    /// mapping the old selection through this transaction's steps.
    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = Some(selection);
        self
    }

    pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
        self.stored_marks = Some(marks.unwrap_or_default());
        self
    }

    /// Appends an already-built step without re-deriving it from a
    /// convenience method — used by commands that construct a step
    /// directly (e.g. replayed/mapped steps from history).
    pub fn apply_step(&mut self, step: Step) -> Result<&mut Self, StepError> {
        let new_doc = step.apply(&self.doc)?;
        self.mapping.append(step.get_map());
        self.doc = new_doc;
        self.steps.push(step);
        Ok(self)
    }

    /// The net effect of every step, as a single [`StepMap`] sequence — an
    /// alias for [`Transaction::mapping`], kept for call sites that think in
    /// terms of "the transaction's map".
    pub fn step_maps(&self) -> &[StepMap] {
        self.mapping.maps()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::mark::Attrs as AttrsMap;

    fn text(s: &str) -> Node {
        Node::new_text_unchecked(s.to_string(), vec![])
    }
    fn para(children: Vec<Node>) -> Node {
        Node::new_container_unchecked("paragraph".to_string(), AttrsMap::new(), children)
    }
    fn doc(children: Vec<Node>) -> Node {
        Node::new_container_unchecked("document".to_string(), AttrsMap::new(), children)
    }

    #[test]
    fn chained_steps_advance_doc_and_mapping() {
        let d = doc(vec![para(vec![])]);
        let mut tr = Transaction::new(d);
        tr.insert_text(1, "hello", vec![]).unwrap();
        assert_eq!(tr.doc().text_content(), "hello");
        assert_eq!(tr.steps().len(), 1);
        assert_eq!(tr.mapping().map_pos(1, 1), 6);
    }

    #[test]
    fn failing_step_propagates_error() {
        let d = doc(vec![para(vec![text("abc")])]);
        let mut tr = Transaction::new(d);
        let err = tr.delete_range(0, 999);
        assert!(err.is_err());
    }

    #[test]
    fn explicit_selection_override_is_recorded() {
        let d = doc(vec![para(vec![])]);
        let mut tr = Transaction::new(d);
        tr.set_selection(Selection::cursor(1));
        assert_eq!(tr.selection(), Some(Selection::cursor(1)));
    }
}
