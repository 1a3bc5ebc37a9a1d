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

//! The engine's error taxonomy: schema validation, position range, step
//! application, HTML parsing, quota, and plugin failures.

use thiserror::Error;

/// Errors produced by the node/mark/schema/step/transaction layers.
///
/// `SchemaError`, `RangeError` and `StepError` are returned from fallible
/// constructors and propagate out of the command that triggered them,
/// aborting the in-progress transaction build. `ParseError` is caught per
/// element during HTML import and never escapes the parser. `QuotaError`
/// is raised by [`crate::transaction::Transaction::commit`] and rejects the
/// whole transaction. `PluginError` is surfaced as an event and does not
/// abort anything.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("range error: {0}")]
    Range(#[from] RangeError),

    #[error("step error: {0}")]
    Step(#[from] StepError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("quota exceeded: {0}")]
    Quota(#[from] QuotaError),

    #[error("plugin '{name}' failed: {message}")]
    Plugin { name: String, message: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("content of '{parent}' does not match expression '{expr}'")]
    ContentMismatch { parent: String, expr: String },

    #[error("missing required attribute '{attr}' for '{node_type}'")]
    MissingAttribute { node_type: String, attr: String },

    #[error("text nodes cannot have children")]
    TextNodeWithChildren,

    #[error("container nodes cannot carry text")]
    ContainerNodeWithText,

    #[error("text construction requires a non-empty string")]
    EmptyText,

    #[error("schema must declare exactly one top node named 'document'")]
    MissingDocumentNode,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("position {pos} out of range [0, {max}]")]
    PositionOutOfRange { pos: usize, max: usize },

    #[error("invalid path: {0:?}")]
    InvalidPath(Vec<usize>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("invalid insertion point at {0}")]
    InvalidInsertionPoint(usize),

    #[error("range [{from}, {to}) is not a valid target for this step")]
    InvalidRange { from: usize, to: usize },

    #[error("no node found at position {0}")]
    NoNodeAt(usize),

    #[error("wrapping [{from}, {to}) in '{node_type}' would violate content rules")]
    InvalidWrap {
        from: usize,
        to: usize,
        node_type: String,
    },

    #[error("node at {0} cannot be unwrapped (no container parent)")]
    InvalidUnwrap(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("element <{tag}> is not accepted in this context and was {action}")]
    RejectedElement { tag: String, action: String },

    #[error("malformed HTML: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuotaError {
    #[error("resulting length {new_len} would exceed maxLength {max}")]
    MaxLengthExceeded { new_len: usize, max: usize },
}

pub type EngineResult<T> = Result<T, EngineError>;
