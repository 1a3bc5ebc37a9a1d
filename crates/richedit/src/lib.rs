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

//! A model-driven rich-text editor engine: an immutable document model,
//! a schema that validates content shape, a transactional mutation
//! system (`Step`/`StepMap`/`Mapping`/`Transaction`), `EditorState`,
//! a commands surface, an HTML import/export boundary, and (under the
//! `js` feature) a DOM view, input handling, and on-screen selection.

pub mod commands;
pub mod engine;
pub mod error;
pub mod history;
pub mod html;
pub mod model;
pub mod plugin;
pub mod schema;
pub mod state;
pub mod step;
pub mod transaction;

#[cfg(feature = "js")]
pub mod input;
#[cfg(feature = "js")]
pub mod selection;
#[cfg(feature = "js")]
pub mod view;

pub use crate::engine::{Engine, EditorOptions};
pub use crate::error::{EngineError, ParseError, QuotaError, RangeError, SchemaError, StepError};
pub use crate::history::HistoryPlugin;
pub use crate::model::{AttrValue, Attrs, ContainerNode, LeafNode, Mark, Node, Selection, TextNode};
pub use crate::plugin::{Command, DispatchFn, Keymap, Plugin, PluginManager};
pub use crate::schema::default_schema::default_schema;
pub use crate::schema::Schema;
pub use crate::state::{ApplyOutcome, ContentInit, EditorState};
pub use crate::step::{Mapping, Step, StepMap};
pub use crate::transaction::Transaction;
