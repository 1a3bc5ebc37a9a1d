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

//! Atomic, reversible document mutations. A [`Step`] never consults the schema:
//! it performs raw tree surgery and trusts the caller (the
//! [`crate::transaction::Transaction`] builder, which does hold a schema
//! reference) to have validated the edit in context. This mirrors the split the
//! reference implementation draws between its handle based mutation helpers and
//! the `ComposerModel` that owns schema-shaped invariants.

pub mod mapping;

pub use mapping::{Mapping, StepMap};

use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::model::mark::{add_mark, remove_mark, Attrs, Mark};
use crate::model::node::Node;

/// An atomic, reversible mutation of a document tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Step {
    #[serde(rename = "insertText")]
    InsertText {
        pos: usize,
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
    #[serde(rename = "deleteRange")]
    DeleteRange { from: usize, to: usize },
    #[serde(rename = "replaceRange")]
    ReplaceRange {
        from: usize,
        to: usize,
        nodes: Vec<Node>,
    },
    #[serde(rename = "addMark")]
    AddMark { from: usize, to: usize, mark: Mark },
    #[serde(rename = "removeMark")]
    RemoveMark { from: usize, to: usize, mark: Mark },
    #[serde(rename = "setNodeAttrs")]
    SetNodeAttrs { pos: usize, attrs: Attrs },
    #[serde(rename = "wrapIn")]
    WrapIn {
        from: usize,
        to: usize,
        #[serde(rename = "nodeType")]
        node_type: String,
        attrs: Attrs,
    },
    #[serde(rename = "unwrap")]
    Unwrap {
        pos: usize,
        #[serde(rename = "wrapperSize")]
        wrapper_size: usize,
    },
    #[serde(rename = "setBlockType")]
    SetBlockType {
        pos: usize,
        #[serde(rename = "newType")]
        new_type: String,
        #[serde(rename = "newAttrs")]
        new_attrs: Attrs,
    },
}

impl Step {
    /// Applies this step to `doc`, producing the resulting document.
    pub fn apply(&self, doc: &Node) -> Result<Node, StepError> {
        match self {
            Step::InsertText { pos, text, marks } => {
                let insert = if text.is_empty() {
                    vec![]
                } else {
                    vec![Node::new_text_unchecked(text.clone(), marks.clone())]
                };
                replace_range(doc, *pos, *pos, insert)
            }
            Step::DeleteRange { from, to } => replace_range(doc, *from, *to, vec![]),
            Step::ReplaceRange { from, to, nodes } => {
                replace_range(doc, *from, *to, nodes.clone())
            }
            Step::AddMark { from, to, mark } => {
                let children =
                    map_text_marks(doc.children(), *from, *to, &|marks| add_mark(marks, mark));
                Ok(doc.copy_with_children(children))
            }
            Step::RemoveMark { from, to, mark } => {
                let children = map_text_marks(doc.children(), *from, *to, &|marks| {
                    remove_mark(marks, &mark.mark_type)
                });
                Ok(doc.copy_with_children(children))
            }
            Step::SetNodeAttrs { pos, attrs } => {
                let children = splice_node_at(doc.children(), *pos, &|n| {
                    let mut merged = n.attrs().cloned().unwrap_or_default();
                    for (k, v) in attrs {
                        merged.insert(k.clone(), v.clone());
                    }
                    Ok(vec![n.copy_with_attrs(merged)])
                })?;
                Ok(doc.copy_with_children(children))
            }
            Step::WrapIn {
                from,
                to,
                node_type,
                attrs,
            } => wrap_in_rec(doc, *from, *to, node_type, attrs),
            Step::Unwrap { pos, .. } => {
                let children = splice_node_at(doc.children(), *pos, &|n| Ok(n.children().to_vec()))?;
                Ok(doc.copy_with_children(children))
            }
            Step::SetBlockType {
                pos,
                new_type,
                new_attrs,
            } => {
                let children = splice_node_at(doc.children(), *pos, &|n| {
                    Ok(vec![Node::new_container_unchecked(
                        new_type.clone(),
                        new_attrs.clone(),
                        n.children().to_vec(),
                    )])
                })?;
                Ok(doc.copy_with_children(children))
            }
        }
    }

    /// Computes the inverse of this step against its pre-image `doc`
    /// (the document the step has *not yet* been applied to).
    pub fn invert(&self, doc: &Node) -> Result<Step, StepError> {
        match self {
            Step::InsertText { pos, text, .. } => Ok(Step::DeleteRange {
                from: *pos,
                to: *pos + text.chars().count(),
            }),
            Step::DeleteRange { from, to } => Ok(Step::ReplaceRange {
                from: *from,
                to: *from,
                nodes: extract_range(doc.children(), *from, *to),
            }),
            Step::ReplaceRange { from, to, nodes } => {
                let inserted_size: usize = nodes.iter().map(Node::node_size).sum();
                Ok(Step::ReplaceRange {
                    from: *from,
                    to: *from + inserted_size,
                    nodes: extract_range(doc.children(), *from, *to),
                })
            }
            Step::AddMark { from, to, mark } => Ok(Step::RemoveMark {
                from: *from,
                to: *to,
                mark: mark.clone(),
            }),
            Step::RemoveMark { from, to, mark } => Ok(Step::AddMark {
                from: *from,
                to: *to,
                mark: mark.clone(),
            }),
            Step::SetNodeAttrs { pos, attrs } => {
                let before = node_at_pos(doc, *pos)?;
                let before_attrs = before.attrs().cloned().unwrap_or_default();
                let mut restored = Attrs::new();
                for key in attrs.keys() {
                    if let Some(v) = before_attrs.get(key) {
                        restored.insert(key.clone(), v.clone());
                    }
                }
                Ok(Step::SetNodeAttrs {
                    pos: *pos,
                    attrs: restored,
                })
            }
            Step::WrapIn { from, to, .. } => Ok(Step::Unwrap {
                pos: *from,
                wrapper_size: (to - from) + 2,
            }),
            Step::Unwrap { pos, wrapper_size } => {
                let before = node_at_pos(doc, *pos)?;
                Ok(Step::WrapIn {
                    from: *pos,
                    to: pos + wrapper_size - 2,
                    node_type: before.node_type().to_string(),
                    attrs: before.attrs().cloned().unwrap_or_default(),
                })
            }
            Step::SetBlockType { pos, .. } => {
                let before = node_at_pos(doc, *pos)?;
                Ok(Step::SetBlockType {
                    pos: *pos,
                    new_type: before.node_type().to_string(),
                    new_attrs: before.attrs().cloned().unwrap_or_default(),
                })
            }
        }
    }

    /// The [`StepMap`] describing this step's effect on positions.
    pub fn get_map(&self) -> StepMap {
        match self {
            Step::InsertText { pos, text, .. } => {
                StepMap::new(vec![(*pos, 0, text.chars().count())])
            }
            Step::DeleteRange { from, to } => StepMap::new(vec![(*from, to - from, 0)]),
            Step::ReplaceRange { from, to, nodes } => {
                let new_size: usize = nodes.iter().map(Node::node_size).sum();
                StepMap::new(vec![(*from, to - from, new_size)])
            }
            Step::AddMark { .. } | Step::RemoveMark { .. } => StepMap::empty(),
            Step::SetNodeAttrs { .. } => StepMap::empty(),
            Step::WrapIn { from, to, .. } => StepMap::new(vec![(*from, to - from, (to - from) + 2)]),
            Step::Unwrap { pos, wrapper_size } => {
                StepMap::new(vec![(*pos, *wrapper_size, wrapper_size - 2)])
            }
            Step::SetBlockType { .. } => StepMap::empty(),
        }
    }

    /// Remaps this step through `mapping`, or returns `None` if its
    /// target range has been collapsed away by an intervening edit.
    pub fn map(&self, mapping: &Mapping) -> Option<Step> {
        match self {
            Step::InsertText { pos, text, marks } => Some(Step::InsertText {
                pos: mapping.map_pos(*pos, 1),
                text: text.clone(),
                marks: marks.clone(),
            }),
            Step::DeleteRange { from, to } => {
                let nf = mapping.map_pos(*from, -1);
                let nt = mapping.map_pos(*to, 1);
                (nf < nt).then_some(Step::DeleteRange { from: nf, to: nt })
            }
            Step::ReplaceRange { from, to, nodes } => {
                let nf = mapping.map_pos(*from, -1);
                let nt = mapping.map_pos(*to, 1);
                (nf <= nt).then_some(Step::ReplaceRange {
                    from: nf,
                    to: nt,
                    nodes: nodes.clone(),
                })
            }
            Step::AddMark { from, to, mark } => {
                let nf = mapping.map_pos(*from, -1);
                let nt = mapping.map_pos(*to, 1);
                (nf < nt).then_some(Step::AddMark {
                    from: nf,
                    to: nt,
                    mark: mark.clone(),
                })
            }
            Step::RemoveMark { from, to, mark } => {
                let nf = mapping.map_pos(*from, -1);
                let nt = mapping.map_pos(*to, 1);
                (nf < nt).then_some(Step::RemoveMark {
                    from: nf,
                    to: nt,
                    mark: mark.clone(),
                })
            }
            Step::SetNodeAttrs { pos, attrs } => Some(Step::SetNodeAttrs {
                pos: mapping.map_pos(*pos, 1),
                attrs: attrs.clone(),
            }),
            Step::WrapIn {
                from,
                to,
                node_type,
                attrs,
            } => {
                let nf = mapping.map_pos(*from, -1);
                let nt = mapping.map_pos(*to, 1);
                (nf < nt).then_some(Step::WrapIn {
                    from: nf,
                    to: nt,
                    node_type: node_type.clone(),
                    attrs: attrs.clone(),
                })
            }
            Step::Unwrap { pos, wrapper_size } => Some(Step::Unwrap {
                pos: mapping.map_pos(*pos, 1),
                wrapper_size: *wrapper_size,
            }),
            Step::SetBlockType {
                pos,
                new_type,
                new_attrs,
            } => Some(Step::SetBlockType {
                pos: mapping.map_pos(*pos, 1),
                new_type: new_type.clone(),
                new_attrs: new_attrs.clone(),
            }),
        }
    }
}

/// Deletes `[from, to)` from `children` and splices `insert` in at `from`,
/// splitting text nodes at the boundaries and recursing into a single container
/// child whose content is only partially covered.
fn replace_children(
    children: &[Node],
    from: usize,
    to: usize,
    insert: Vec<Node>,
) -> Result<Vec<Node>, StepError> {
    let mut result = Vec::new();
    let mut pos = 0usize;
    let mut i = 0;
    let mut inserted = false;
    while i < children.len() {
        let child = &children[i];
        let size = child.node_size();
        let child_start = pos;
        let child_end = pos + size;
        if child_end <= from {
            result.push(child.clone());
            pos = child_end;
            i += 1;
            continue;
        }
        if child_start >= to {
            break;
        }
        if child_start >= from && child_end <= to {
            if !inserted {
                result.extend(insert.iter().cloned());
                inserted = true;
            }
            pos = child_end;
            i += 1;
            continue;
        }
        match child {
            Node::Text(t) => {
                let chars: Vec<char> = t.text.chars().collect();
                let lo = from.saturating_sub(child_start).min(chars.len());
                let hi = to.saturating_sub(child_start).min(chars.len());
                if lo > 0 {
                    let before: String = chars[..lo].iter().collect();
                    result.push(Node::new_text_unchecked(before, t.marks.clone()));
                }
                if !inserted {
                    result.extend(insert.iter().cloned());
                    inserted = true;
                }
                if hi < chars.len() {
                    let after: String = chars[hi..].iter().collect();
                    result.push(Node::new_text_unchecked(after, t.marks.clone()));
                }
            }
            Node::Container(c) => {
                let content_start = child_start + 1;
                let inner_size = child.content_size();
                let rel_from = from.saturating_sub(content_start).min(inner_size);
                let rel_to = to.saturating_sub(content_start).min(inner_size);
                let carried = if inserted { vec![] } else { insert.clone() };
                let new_children = replace_children(&c.children, rel_from, rel_to, carried)?;
                inserted = true;
                result.push(child.copy_with_children(new_children));
            }
            Node::Leaf(_) => {
                if !inserted {
                    result.extend(insert.iter().cloned());
                    inserted = true;
                }
            }
        }
        pos = child_end;
        i += 1;
    }
    if !inserted {
        result.extend(insert);
    }
    result.extend(children[i..].iter().cloned());
    Ok(normalize_adjacent_text(result))
}

/// Merges adjacent text nodes carrying identical marks. `InsertText` and the
/// range/mark steps may leave a run split at an old boundary that no longer
/// needs to exist; folding those back together keeps `apply` then `invert` able
/// to reconstruct the exact pre-image tree.
fn normalize_adjacent_text(children: Vec<Node>) -> Vec<Node> {
    let mut result: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        let merged = if let (Some(Node::Text(prev)), Node::Text(cur)) = (result.last_mut(), &child) {
            if prev.marks == cur.marks {
                prev.text.push_str(&cur.text);
                true
            } else {
                false
            }
        } else {
            false
        };
        if !merged {
            result.push(child);
        }
    }
    result
}

fn replace_range(doc: &Node, from: usize, to: usize, insert: Vec<Node>) -> Result<Node, StepError> {
    if from > to || to > doc.content_size() {
        return Err(StepError::InvalidRange { from, to });
    }
    let children = replace_children(doc.children(), from, to, insert)?;
    Ok(doc.copy_with_children(children))
}

/// Extracts a structural copy of `[from, to)` without modifying
/// `children` — used to build the inverse of DeleteRange/ReplaceRange.
fn extract_range(children: &[Node], from: usize, to: usize) -> Vec<Node> {
    let mut result = Vec::new();
    let mut pos = 0usize;
    for child in children {
        let size = child.node_size();
        let child_start = pos;
        let child_end = pos + size;
        if child_end <= from || child_start >= to {
            pos = child_end;
            continue;
        }
        if child_start >= from && child_end <= to {
            result.push(child.clone());
            pos = child_end;
            continue;
        }
        match child {
            Node::Text(t) => {
                let chars: Vec<char> = t.text.chars().collect();
                let lo = from.saturating_sub(child_start).min(chars.len());
                let hi = to.saturating_sub(child_start).min(chars.len());
                let mid: String = chars[lo..hi].iter().collect();
                if !mid.is_empty() {
                    result.push(Node::new_text_unchecked(mid, t.marks.clone()));
                }
            }
            Node::Container(c) => {
                // This container survives (only part of it is covered),
                // so its own wrapper isn't part of the extracted
                // fragment — only the matched inner content is, flattened
                // into the same position space `replace_range` will
                // later splice it back into.
                let content_start = child_start + 1;
                let inner_size = child.content_size();
                let rel_from = from.saturating_sub(content_start).min(inner_size);
                let rel_to = to.saturating_sub(content_start).min(inner_size);
                result.extend(extract_range(&c.children, rel_from, rel_to));
            }
            Node::Leaf(_) => result.push(child.clone()),
        }
        pos = child_end;
    }
    normalize_adjacent_text(result)
}

/// Applies `f` to the marks of every text run overlapping `[from, to)`,
/// splitting text nodes at the boundaries.
fn map_text_marks(
    children: &[Node],
    from: usize,
    to: usize,
    f: &dyn Fn(&[Mark]) -> Vec<Mark>,
) -> Vec<Node> {
    let mut result = Vec::with_capacity(children.len());
    let mut pos = 0usize;
    for child in children {
        let size = child.node_size();
        let child_start = pos;
        let child_end = pos + size;
        if child_end <= from || child_start >= to {
            result.push(child.clone());
            pos = child_end;
            continue;
        }
        match child {
            Node::Text(t) => {
                let chars: Vec<char> = t.text.chars().collect();
                let lo = from.saturating_sub(child_start).min(chars.len());
                let hi = to.saturating_sub(child_start).min(chars.len());
                if lo > 0 {
                    let before: String = chars[..lo].iter().collect();
                    result.push(Node::new_text_unchecked(before, t.marks.clone()));
                }
                if hi > lo {
                    let mid: String = chars[lo..hi].iter().collect();
                    result.push(Node::new_text_unchecked(mid, f(&t.marks)));
                }
                if hi < chars.len() {
                    let after: String = chars[hi..].iter().collect();
                    result.push(Node::new_text_unchecked(after, t.marks.clone()));
                }
            }
            Node::Container(c) => {
                let content_start = child_start + 1;
                let inner_size = child.content_size();
                let rel_from = from.saturating_sub(content_start).min(inner_size);
                let rel_to = to.saturating_sub(content_start).min(inner_size);
                let new_children = map_text_marks(&c.children, rel_from, rel_to, f);
                result.push(child.copy_with_children(new_children));
            }
            Node::Leaf(_) => result.push(child.clone()),
        }
        pos = child_end;
    }
    normalize_adjacent_text(result)
}

/// Replaces the single node whose opening boundary sits at `pos` with zero or
/// more nodes returned by `f`.
fn splice_node_at(
    children: &[Node],
    pos: usize,
    f: &dyn Fn(&Node) -> Result<Vec<Node>, StepError>,
) -> Result<Vec<Node>, StepError> {
    let mut result = Vec::with_capacity(children.len());
    let mut cur = 0usize;
    let mut found = false;
    for child in children {
        let size = child.node_size();
        if !found && cur == pos {
            result.extend(f(child)?);
            found = true;
        } else if !found && cur < pos && pos < cur + size {
            match child {
                Node::Container(c) => {
                    let rel = pos - cur - 1;
                    let new_children = splice_node_at(&c.children, rel, f)?;
                    result.push(child.copy_with_children(new_children));
                    found = true;
                }
                _ => return Err(StepError::NoNodeAt(pos)),
            }
        } else {
            result.push(child.clone());
        }
        cur += size;
    }
    if !found {
        return Err(StepError::NoNodeAt(pos));
    }
    Ok(result)
}

fn node_at<'a>(children: &'a [Node], pos: usize) -> Option<&'a Node> {
    let mut cur = 0usize;
    for child in children {
        let size = child.node_size();
        if cur == pos {
            return Some(child);
        }
        if cur < pos && pos < cur + size {
            if let Node::Container(c) = child {
                return node_at(&c.children, pos - cur - 1);
            }
            return None;
        }
        cur += size;
    }
    None
}

fn node_at_pos<'a>(doc: &'a Node, pos: usize) -> Result<&'a Node, StepError> {
    node_at(doc.children(), pos).ok_or(StepError::NoNodeAt(pos))
}

/// Wraps the children fully covering `[from, to)` — recursing into a single
/// container child when the range is nested inside one — in a new node of
/// `node_type`.
fn wrap_in_rec(
    node: &Node,
    from: usize,
    to: usize,
    node_type: &str,
    attrs: &Attrs,
) -> Result<Node, StepError> {
    let children = node.children();
    let mut pos = 0usize;
    for (idx, child) in children.iter().enumerate() {
        let size = child.node_size();
        let content_start = pos + 1;
        let content_end = pos + size - 1;
        if child.is_container() && from >= content_start && to <= content_end {
            let new_child = wrap_in_rec(child, from - content_start, to - content_start, node_type, attrs)?;
            let mut new_children = children.to_vec();
            new_children[idx] = new_child;
            return Ok(node.copy_with_children(new_children));
        }
        pos += size;
    }
    let wrapped = wrap_children_flat(children, from, to, node_type, attrs)?;
    Ok(node.copy_with_children(wrapped))
}

fn wrap_children_flat(
    children: &[Node],
    from: usize,
    to: usize,
    node_type: &str,
    attrs: &Attrs,
) -> Result<Vec<Node>, StepError> {
    let mut result = Vec::new();
    let mut pos = 0usize;
    let mut group: Vec<Node> = Vec::new();
    let mut wrapped_any = false;
    for child in children {
        let size = child.node_size();
        let child_start = pos;
        let child_end = pos + size;
        if child_start >= from && child_end <= to {
            group.push(child.clone());
            wrapped_any = true;
        } else {
            if child_start < to && child_end > from {
                return Err(StepError::InvalidWrap {
                    from,
                    to,
                    node_type: node_type.to_string(),
                });
            }
            if !group.is_empty() {
                result.push(Node::new_container_unchecked(
                    node_type.to_string(),
                    attrs.clone(),
                    std::mem::take(&mut group),
                ));
            }
            result.push(child.clone());
        }
        pos = child_end;
    }
    if !group.is_empty() {
        result.push(Node::new_container_unchecked(node_type.to_string(), attrs.clone(), group));
    }
    if !wrapped_any {
        return Err(StepError::InvalidWrap {
            from,
            to,
            node_type: node_type.to_string(),
        });
    }
    Ok(result)
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
    fn insert_text_into_fresh_paragraph() {
        let d = doc(vec![para(vec![])]);
        let step = Step::InsertText {
            pos: 1,
            text: "hello".to_string(),
            marks: vec![],
        };
        let result = step.apply(&d).unwrap();
        assert_eq!(result.text_content(), "hello");
    }

    #[test]
    fn delete_range_trims_text_node() {
        let d = doc(vec![para(vec![text("abcdef")])]);
        let step = Step::DeleteRange { from: 2, to: 6 };
        let result = step.apply(&d).unwrap();
        assert_eq!(result.text_content(), "af");
    }

    #[test]
    fn delete_invert_restores_original() {
        let d = doc(vec![para(vec![text("abcdef")])]);
        let step = Step::DeleteRange { from: 2, to: 5 };
        let inverse = step.invert(&d).unwrap();
        let after = step.apply(&d).unwrap();
        let restored = inverse.apply(&after).unwrap();
        assert_eq!(restored, d);
    }

    #[test]
    fn add_mark_then_remove_is_identity() {
        let d = doc(vec![para(vec![text("hello world")])]);
        let bold = Mark::new("bold");
        let added = Step::AddMark {
            from: 7,
            to: 12,
            mark: bold.clone(),
        }
        .apply(&d)
        .unwrap();
        let removed = Step::RemoveMark {
            from: 7,
            to: 12,
            mark: bold,
        }
        .apply(&added)
        .unwrap();
        assert_eq!(removed, d);
    }

    #[test]
    fn wrap_in_then_unwrap_round_trips() {
        let d = doc(vec![para(vec![text("abc")])]);
        let wrapped = Step::WrapIn {
            from: 0,
            to: 5,
            node_type: "blockquote".to_string(),
            attrs: AttrsMap::new(),
        }
        .apply(&d)
        .unwrap();
        assert_eq!(wrapped.children()[0].node_type(), "blockquote");

        let unwrapped = Step::Unwrap { pos: 0, wrapper_size: 7 }.apply(&wrapped).unwrap();
        assert_eq!(unwrapped, d);
    }

    #[test]
    fn set_node_attrs_merges_shallow() {
        let mut attrs = AttrsMap::new();
        attrs.insert("align".to_string(), "left".into());
        let d = doc(vec![Node::new_container_unchecked(
            "paragraph".to_string(),
            attrs,
            vec![text("x")],
        )]);
        let mut new_attrs = AttrsMap::new();
        new_attrs.insert("indent".to_string(), 1i64.into());
        let result = Step::SetNodeAttrs { pos: 0, attrs: new_attrs }.apply(&d).unwrap();
        let p_attrs = result.children()[0].attrs().unwrap();
        assert_eq!(p_attrs.get("align").unwrap().as_str(), Some("left"));
        assert_eq!(p_attrs.get("indent").unwrap().as_i64(), Some(1));
    }

    #[test]
    fn step_map_round_trips_through_mapping() {
        let step = Step::InsertText {
            pos: 3,
            text: "xy".to_string(),
            marks: vec![],
        };
        let mapping = Mapping::from_maps(vec![step.get_map()]);
        assert_eq!(mapping.map_pos(3, 1), 5);
    }
}
