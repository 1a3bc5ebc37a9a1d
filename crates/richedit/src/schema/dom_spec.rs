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

//! The `toDOM` spec form: a small recursive value describing how a node or
//! mark factory expands into DOM elements. A node/mark spec names a tag, a
//! flat attribute map, and nested child specs; a [`DomSpec::Hole`] marks
//! where the node's own content (its children, or a mark's wrapped text) is
//! attached. Both the view (live DOM mount/patch) and the HTML serializer
//! walk the same tree, so a `toDOM` factory is written once and drives both.

use std::collections::BTreeMap;

/// One node of a `toDOM` expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomSpec {
    /// The content insertion point: a node's children or a mark's wrapped
    /// text is attached here.
    Hole,
    /// An element with a tag name, attributes, and nested specs. A leaf with
    /// no content model (e.g. `<hr>`, `<img>`) has no `Hole` among its
    /// `children`; everything else has exactly one, somewhere in its tree.
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        children: Vec<DomSpec>,
    },
}

impl DomSpec {
    /// A bare element that takes its content directly: `tag { 0 }`.
    pub fn elem(tag: impl Into<String>) -> DomSpec {
        DomSpec::Element {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: vec![DomSpec::Hole],
        }
    }

    /// An element with attributes that takes its content directly:
    /// `tag(attrs) { 0 }`.
    pub fn elem_with_attrs(tag: impl Into<String>, attrs: BTreeMap<String, String>) -> DomSpec {
        DomSpec::Element {
            tag: tag.into(),
            attrs,
            children: vec![DomSpec::Hole],
        }
    }

    /// A void element with no content hole at all: `tag(attrs)`, e.g.
    /// `<img>`/`<hr>`/`<br>`.
    pub fn elem_no_content(tag: impl Into<String>, attrs: BTreeMap<String, String>) -> DomSpec {
        DomSpec::Element {
            tag: tag.into(),
            attrs,
            children: Vec::new(),
        }
    }
}

/// A one-entry attribute map, for the common case of a `toDOM` factory that
/// only ever sets a single attribute.
pub fn attrs1(key: impl Into<String>, value: impl Into<String>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(key.into(), value.into());
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elem_wraps_a_single_hole() {
        match DomSpec::elem("p") {
            DomSpec::Element { tag, attrs, children } => {
                assert_eq!(tag, "p");
                assert!(attrs.is_empty());
                assert_eq!(children, vec![DomSpec::Hole]);
            }
            DomSpec::Hole => panic!("expected an element"),
        }
    }

    #[test]
    fn elem_no_content_has_no_hole() {
        match DomSpec::elem_no_content("hr", BTreeMap::new()) {
            DomSpec::Element { children, .. } => assert!(children.is_empty()),
            DomSpec::Hole => panic!("expected an element"),
        }
    }

    #[test]
    fn attrs1_builds_a_single_entry_map() {
        let attrs = attrs1("href", "https://example.invalid");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("href").map(String::as_str), Some("https://example.invalid"));
    }
}
