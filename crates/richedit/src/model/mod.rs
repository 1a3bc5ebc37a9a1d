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

//! The immutable document model: nodes, marks, positions, and selection.

pub mod mark;
pub mod node;
pub mod position;
pub mod selection;

pub use mark::{AttrValue, Attrs, Mark};
pub use node::{ContainerNode, LeafNode, Node, TextNode};
pub use position::{resolve, path_at_pos, pos_at_path, PathEntry, ResolvedPos};
pub use selection::Selection;
