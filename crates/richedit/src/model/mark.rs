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

//! Inline formatting marks.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A frozen attribute map, ordered for deterministic equality and
/// serialization.
pub type Attrs = BTreeMap<String, AttrValue>;

/// An attribute value. Schema attribute descriptors only ever produce
/// strings, numbers, or booleans; this is richer than the DOM but kept
/// small deliberately (no nested maps — attrs are a flat bag).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{s}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Null => write!(f, ""),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// A single inline formatting annotation on a run of text.
///
/// Marks are frozen and compared by `(type, attrs)`. A text node carries a
/// *set* of marks, kept sorted by type name so two text nodes with the
/// same semantic formatting compare equal regardless of the order marks
/// were applied in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attrs(mark_type: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            mark_type: mark_type.into(),
            attrs,
        }
    }
}

impl PartialEq for Mark {
    fn eq(&self, other: &Self) -> bool {
        self.mark_type == other.mark_type && self.attrs == other.attrs
    }
}
impl Eq for Mark {}

impl PartialOrd for Mark {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mark {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.mark_type.cmp(&other.mark_type)
    }
}

/// Insert `mark` into a sorted mark set, returning a new sorted set. A no-op
/// (returns a clone) if an equal mark is already present — adding a mark is
/// idempotent.
pub fn add_mark(marks: &[Mark], mark: &Mark) -> Vec<Mark> {
    if marks.contains(mark) {
        return marks.to_vec();
    }
    let mut out = marks.to_vec();
    out.push(mark.clone());
    out.sort();
    out
}

/// Remove any mark with the same type as `mark_type` from a sorted mark set. A
/// no-op if absent.
pub fn remove_mark(marks: &[Mark], mark_type: &str) -> Vec<Mark> {
    marks.iter().filter(|m| m.mark_type != mark_type).cloned().collect()
}

/// True if `marks` contains a mark of the given type.
pub fn has_mark_type(marks: &[Mark], mark_type: &str) -> bool {
    marks.iter().any(|m| m.mark_type == mark_type)
}

/// Marks are rendered innermost-to-outermost in reverse-sorted order, so the
/// outermost wrapping element is the alphabetically smallest mark type.
pub fn marks_outermost_first(marks: &[Mark]) -> Vec<&Mark> {
    let mut refs: Vec<&Mark> = marks.iter().collect();
    refs.sort_by(|a, b| b.mark_type.cmp(&a.mark_type));
    refs
}

#[cfg(test)]
mod test {
    use super::*;

    fn bold() -> Mark {
        Mark::new("bold")
    }
    fn italic() -> Mark {
        Mark::new("italic")
    }

    #[test]
    fn marks_equal_by_type_and_attrs() {
        assert_eq!(bold(), bold());
        assert_ne!(bold(), italic());
    }

    #[test]
    fn add_mark_is_idempotent() {
        let marks = vec![bold()];
        let once = add_mark(&marks, &bold());
        assert_eq!(once, marks);
    }

    #[test]
    fn add_mark_keeps_set_sorted() {
        let marks = add_mark(&[], &italic());
        let marks = add_mark(&marks, &bold());
        assert_eq!(marks, vec![bold(), italic()]);
    }

    #[test]
    fn remove_mark_absent_is_noop() {
        let marks = vec![bold()];
        assert_eq!(remove_mark(&marks, "italic"), marks);
    }

    #[test]
    fn remove_mark_present_drops_it() {
        let marks = vec![bold(), italic()];
        assert_eq!(remove_mark(&marks, "bold"), vec![italic()]);
    }

    #[test]
    fn outermost_first_is_reverse_sorted() {
        let marks = vec![bold(), italic()];
        let ordered: Vec<&str> =
            marks_outermost_first(&marks).iter().map(|m| m.mark_type.as_str()).collect();
        assert_eq!(ordered, vec!["italic", "bold"]);
    }
}
