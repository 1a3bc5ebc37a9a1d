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

//! Integer position resolution. Positions are counted the same way everywhere
//! in the engine: the document's own root boundary is not addressable (its
//! content starts at absolute position 0); every other container contributes
//! one position for its opening boundary and one for its closing boundary; each
//! text character and each leaf contributes one position.

use crate::error::RangeError;
use crate::model::node::Node;

/// One level of the ancestor chain for a resolved position: the
/// container `node`, the `index` of the child at or before the target
/// position within that container, and the absolute `offset` — the
/// position immediately before that child, measured in the same space as
/// the resolved position itself.
#[derive(Debug)]
pub struct PathEntry<'a> {
    pub node: &'a Node,
    pub index: usize,
    pub offset: usize,
    /// Start offset of `index`'s child, relative to this node's content.
    rel_child_start: usize,
}

/// A resolved view over a position: the ancestor chain, the immediate
/// parent, and precomputed neighbours.
#[derive(Debug)]
pub struct ResolvedPos<'a> {
    pos: usize,
    path: Vec<PathEntry<'a>>,
    parent_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// The nearest container ancestor (the node whose content directly
    /// surrounds this position).
    pub fn parent(&self) -> &'a Node {
        self.path.last().expect("path always has a root entry").node
    }

    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn index(&self) -> usize {
        self.path.last().expect("path always has a root entry").index
    }

    /// The node immediately before this position at this depth, or
    /// `None` at the start of the parent's content or mid-text.
    pub fn node_before(&self) -> Option<&'a Node> {
        if self.node_after_is_text_mid() {
            return None;
        }
        let idx = self.index();
        if idx == 0 {
            None
        } else {
            self.parent().children().get(idx - 1)
        }
    }

    pub fn node_after(&self) -> Option<&'a Node> {
        self.parent().children().get(self.index())
    }

    fn node_after_is_text_mid(&self) -> bool {
        matches!(self.node_after(), Some(Node::Text(_))) && self.text_offset() != 0
    }

    /// If the position falls strictly inside a text node, the offset
    /// within that text node's string; 0 at a clean boundary.
    pub fn text_offset(&self) -> usize {
        let entry = self.path.last().unwrap();
        self.parent_offset - entry.rel_child_start
    }

    pub fn path(&self) -> &[PathEntry<'a>] {
        &self.path
    }
}

impl<'a> PathEntry<'a> {
    fn new(node: &'a Node, index: usize, offset: usize, rel_child_start: usize) -> Self {
        PathEntry {
            node,
            index,
            offset,
            rel_child_start,
        }
    }
}

/// Finds the child index and relative start offset of the child whose
/// span covers `offset` within `children`'s combined size. Mirrors
/// ProseMirror's `Fragment.findIndex`: if `offset` lands exactly at a
/// child boundary, the returned index points *after* that child.
fn find_index(children: &[Node], offset: usize) -> (usize, usize) {
    let mut cur = 0;
    for (i, child) in children.iter().enumerate() {
        let end = cur + child.node_size();
        if end >= offset {
            if end == offset {
                return (i + 1, end);
            }
            return (i, cur);
        }
        cur = end;
    }
    (children.len(), cur)
}

/// Resolve `pos` against `doc` (the document root), producing the ancestor
/// path, parent, and neighbour nodes.
pub fn resolve(doc: &Node, pos: usize) -> Result<ResolvedPos<'_>, RangeError> {
    let max = doc.content_size();
    if pos > max {
        return Err(RangeError::PositionOutOfRange { pos, max });
    }

    let mut path: Vec<PathEntry<'_>> = Vec::new();
    let mut node = doc;
    let mut start = 0usize;
    let mut parent_offset = pos;

    loop {
        let (index, offset_before) = find_index(node.children(), parent_offset);
        let rem = parent_offset - offset_before;
        path.push(PathEntry::new(node, index, start + offset_before, offset_before));

        if rem == 0 {
            break;
        }
        let child = &node.children()[index];
        if !child.is_container() {
            break;
        }
        start += offset_before + 1;
        parent_offset = rem - 1;
        node = child;
    }

    Ok(ResolvedPos { pos, path, parent_offset })
}

/// `posAtPath`: walk a sequence of child indices from the root, returning
/// the absolute position immediately before the node the path addresses.
pub fn pos_at_path(doc: &Node, path: &[usize]) -> Result<usize, RangeError> {
    let mut node = doc;
    let mut start = 0usize;
    for (depth, &idx) in path.iter().enumerate() {
        let children = node.children();
        if idx > children.len() {
            return Err(RangeError::InvalidPath(path.to_vec()));
        }
        let offset_before: usize = children.iter().take(idx).map(Node::node_size).sum();
        let abs = start + offset_before;
        if depth == path.len() - 1 {
            return Ok(abs);
        }
        if idx >= children.len() {
            return Err(RangeError::InvalidPath(path.to_vec()));
        }
        let child = &children[idx];
        if !child.is_container() {
            return Err(RangeError::InvalidPath(path.to_vec()));
        }
        start = abs + 1;
        node = child;
    }
    // empty path => position 0 (start of document content)
    Ok(start)
}

/// `pathAtPos`: the inverse of [`pos_at_path`] — the sequence of child
/// indices leading from the root to the node that begins at `pos`.
///
/// Only meaningful for positions that land exactly at a node boundary
/// (not mid-text); callers resolving an arbitrary position should use
/// [`resolve`] instead.
pub fn path_at_pos(doc: &Node, pos: usize) -> Result<Vec<usize>, RangeError> {
    let resolved = resolve(doc, pos)?;
    Ok(resolved.path().iter().map(|e| e.index).collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::mark::Attrs;

    fn text(s: &str) -> Node {
        Node::new_text_unchecked(s.to_string(), vec![])
    }
    fn para(children: Vec<Node>) -> Node {
        Node::new_container_unchecked("paragraph".to_string(), Attrs::new(), children)
    }
    fn doc(children: Vec<Node>) -> Node {
        Node::new_container_unchecked("document".to_string(), Attrs::new(), children)
    }

    #[test]
    fn resolve_empty_paragraph_at_pos_zero() {
        let d = doc(vec![para(vec![])]);
        let r = resolve(&d, 0).unwrap();
        assert_eq!(r.pos(), 0);
        assert_eq!(r.depth(), 0);
        assert_eq!(r.parent().node_type(), "document");
        assert_eq!(r.index(), 0);
    }

    #[test]
    fn resolve_inside_empty_paragraph_at_pos_one() {
        let d = doc(vec![para(vec![])]);
        let r = resolve(&d, 1).unwrap();
        assert_eq!(r.depth(), 1);
        assert_eq!(r.parent().node_type(), "paragraph");
        assert_eq!(r.index(), 0);
        assert_eq!(r.parent_offset(), 0);
    }

    #[test]
    fn resolve_mid_text() {
        let d = doc(vec![para(vec![text("hello")])]);
        // pos 1 = start of text content; pos 4 = between 'l' and 'l'.
        let r = resolve(&d, 4).unwrap();
        assert_eq!(r.depth(), 1);
        assert_eq!(r.parent().node_type(), "paragraph");
        assert_eq!(r.text_offset(), 3);
        assert!(matches!(r.node_after(), Some(Node::Text(_))));
    }

    #[test]
    fn resolve_rejects_out_of_range() {
        let d = doc(vec![para(vec![text("hi")])]);
        assert!(resolve(&d, 999).is_err());
    }

    #[test]
    fn resolve_end_of_document() {
        let d = doc(vec![para(vec![text("hi")])]);
        let max = d.content_size();
        let r = resolve(&d, max).unwrap();
        assert_eq!(r.pos(), max);
    }

    #[test]
    fn pos_at_path_round_trips_with_path_at_pos() {
        let d = doc(vec![para(vec![text("ab")]), para(vec![text("cde")])]);
        for path in [vec![0usize], vec![1]] {
            let pos = pos_at_path(&d, &path).unwrap();
            let back = path_at_pos(&d, pos).unwrap();
            assert_eq!(back, path, "path {:?} -> pos {} -> path {:?}", path, pos, back);
        }
    }

    #[test]
    fn pos_at_path_second_paragraph() {
        let d = doc(vec![para(vec![text("ab")]), para(vec![text("cde")])]);
        // first paragraph nodeSize = 2+2=4, so second paragraph starts at pos 4
        let pos = pos_at_path(&d, &[1]).unwrap();
        assert_eq!(pos, 4);
    }

    #[test]
    fn every_position_resolves_to_itself() {
        let d = doc(vec![para(vec![text("ab")]), para(vec![text("cde")])]);
        for p in 0..=d.content_size() {
            let r = resolve(&d, p).unwrap();
            assert_eq!(r.pos(), p);
        }
    }
}
