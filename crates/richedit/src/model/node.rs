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

//! The immutable document tree. A [`Node`] is one of three categories: a text
//! run carrying marks, a leaf with no children (horizontal rule, hard break,
//! image...), or a container with ordered children. Nodes are never mutated in
//! place — every edit replaces a node wholesale via
//! [`Node::copy_with_children`] or by building a new node through the schema.

use serde::{Deserialize, Serialize};

use super::mark::{Attrs, Mark};

/// An immutable node in the document tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(TextNode),
    Leaf(LeafNode),
    Container(ContainerNode),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeafNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContainerNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Internal constructor, bypassing schema validation. Only the
    /// [`crate::schema::Schema`] factory methods and the step-apply code
    /// that already proved validity should call these directly.
    pub(crate) fn new_text_unchecked(text: String, marks: Vec<Mark>) -> Self {
        let mut marks = marks;
        marks.sort();
        Node::Text(TextNode { text, marks })
    }

    pub(crate) fn new_leaf_unchecked(node_type: String, attrs: Attrs) -> Self {
        Node::Leaf(LeafNode { node_type, attrs })
    }

    pub(crate) fn new_container_unchecked(
        node_type: String,
        attrs: Attrs,
        children: Vec<Node>,
    ) -> Self {
        Node::Container(ContainerNode {
            node_type,
            attrs,
            children,
        })
    }

    pub fn node_type(&self) -> &str {
        match self {
            Node::Text(_) => "text",
            Node::Leaf(l) => &l.node_type,
            Node::Container(c) => &c.node_type,
        }
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            Node::Text(_) => None,
            Node::Leaf(l) => Some(&l.attrs),
            Node::Container(c) => Some(&c.attrs),
        }
    }

    pub fn marks(&self) -> &[Mark] {
        match self {
            Node::Text(t) => &t.marks,
            _ => &[],
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Container(c) => &c.children,
            _ => &[],
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Node::Container(_))
    }

    /// `nodeSize`: for text the string length (in UTF-16-agnostic char
    /// count — positions are counted in `char`s, not bytes, throughout
    /// this engine); for a leaf, 1; for a container, the sum of children
    /// `nodeSize` plus 2 (the opening and closing boundary positions).
    pub fn node_size(&self) -> usize {
        match self {
            Node::Text(t) => t.text.chars().count(),
            Node::Leaf(_) => 1,
            Node::Container(c) => {
                2 + c.children.iter().map(Node::node_size).sum::<usize>()
            }
        }
    }

    /// `contentSize`: for text, the text length; otherwise the sum of
    /// children `nodeSize` (excludes this node's own opening/closing
    /// boundary, unlike `node_size`).
    pub fn content_size(&self) -> usize {
        match self {
            Node::Text(t) => t.text.chars().count(),
            Node::Leaf(_) => 0,
            Node::Container(c) => {
                c.children.iter().map(Node::node_size).sum()
            }
        }
    }

    /// Concatenate the text of every descendant text node, depth-first.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            Node::Leaf(_) => String::new(),
            Node::Container(c) => {
                c.children.iter().map(Node::text_content).collect()
            }
        }
    }

    /// Replace this node's children, keeping type/attrs/marks. Panics if
    /// called on a non-container node — callers should only invoke this
    /// once a node is known to be a container.
    pub fn copy_with_children(&self, children: Vec<Node>) -> Node {
        match self {
            Node::Container(c) => Node::Container(ContainerNode {
                node_type: c.node_type.clone(),
                attrs: c.attrs.clone(),
                children,
            }),
            _ => panic!("copy_with_children called on a non-container node"),
        }
    }

    pub fn copy_with_attrs(&self, attrs: Attrs) -> Node {
        match self {
            Node::Container(c) => Node::Container(ContainerNode {
                node_type: c.node_type.clone(),
                attrs,
                children: c.children.clone(),
            }),
            Node::Leaf(l) => Node::Leaf(LeafNode {
                node_type: l.node_type.clone(),
                attrs,
            }),
            Node::Text(_) => panic!("text nodes have no attrs"),
        }
    }

    pub fn copy_with_marks(&self, marks: Vec<Mark>) -> Node {
        match self {
            Node::Text(t) => {
                let mut marks = marks;
                marks.sort();
                Node::Text(TextNode {
                    text: t.text.clone(),
                    marks,
                })
            }
            _ => panic!("only text nodes carry marks"),
        }
    }

    /// Visit every node overlapping the half-open range `[from, to)`, calling
    /// `cb(node, pos, parent, index)` where `pos` is the node's starting
    /// position relative to `start_pos`. Returning `false` from `cb` skips
    /// descent into that node's children.
    pub fn nodes_between<F>(&self, from: usize, to: usize, start_pos: usize, cb: &mut F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.nodes_between_inner(from, to, start_pos, None, 0, cb);
    }

    fn nodes_between_inner<F>(
        &self,
        from: usize,
        to: usize,
        pos: usize,
        parent: Option<&Node>,
        index: usize,
        cb: &mut F,
    ) where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        let size = self.node_size();
        if pos >= to || pos + size <= from {
            return;
        }
        let descend = cb(self, pos, parent, index);
        if !descend {
            return;
        }
        if let Node::Container(c) = self {
            let mut child_pos = pos + 1;
            for (i, child) in c.children.iter().enumerate() {
                child.nodes_between_inner(from, to, child_pos, Some(self), i, cb);
                child_pos += child.node_size();
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Text(a), Node::Text(b)) => a.text == b.text && a.marks == b.marks,
            (Node::Leaf(a), Node::Leaf(b)) => {
                a.node_type == b.node_type && a.attrs == b.attrs
            }
            (Node::Container(a), Node::Container(b)) => {
                a.node_type == b.node_type
                    && a.attrs == b.attrs
                    && a.children == b.children
            }
            _ => false,
        }
    }
}
impl Eq for Node {}

#[cfg(test)]
mod test {
    use super::*;

    fn text(s: &str) -> Node {
        Node::new_text_unchecked(s.to_string(), vec![])
    }

    fn para(children: Vec<Node>) -> Node {
        Node::new_container_unchecked("paragraph".to_string(), Attrs::new(), children)
    }

    #[test]
    fn text_node_size_is_char_count() {
        assert_eq!(text("hello").node_size(), 5);
    }

    #[test]
    fn leaf_node_size_is_one() {
        let hr = Node::new_leaf_unchecked("horizontalRule".to_string(), Attrs::new());
        assert_eq!(hr.node_size(), 1);
        assert_eq!(hr.content_size(), 0);
    }

    #[test]
    fn container_node_size_includes_boundaries() {
        let p = para(vec![text("abc")]);
        // 1 (open) + 3 (text) + 1 (close)
        assert_eq!(p.node_size(), 5);
        assert_eq!(p.content_size(), 3);
    }

    #[test]
    fn nested_container_node_size() {
        let doc = Node::new_container_unchecked(
            "document".to_string(),
            Attrs::new(),
            vec![para(vec![text("ab")]), para(vec![text("cde")])],
        );
        // doc: 1 + (1+2+1) + (1+3+1) + 1 = 1+4+5+1 = 11
        assert_eq!(doc.node_size(), 11);
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let doc = Node::new_container_unchecked(
            "document".to_string(),
            Attrs::new(),
            vec![para(vec![text("ab")]), para(vec![text("cd")])],
        );
        assert_eq!(doc.text_content(), "abcd");
    }

    #[test]
    fn structural_equality_ignores_identity() {
        assert_eq!(para(vec![text("x")]), para(vec![text("x")]));
        assert_ne!(para(vec![text("x")]), para(vec![text("y")]));
    }

    #[test]
    fn nodes_between_visits_overlapping_nodes() {
        let doc = Node::new_container_unchecked(
            "document".to_string(),
            Attrs::new(),
            vec![para(vec![text("ab")]), para(vec![text("cde")])],
        );
        let mut seen = vec![];
        doc.nodes_between(0, doc.node_size(), 0, &mut |n, pos, _parent, _idx| {
            seen.push((n.node_type().to_string(), pos));
            true
        });
        // document, paragraph@0, text@1, paragraph@4, text@5
        assert_eq!(
            seen,
            vec![
                ("document".to_string(), 0),
                ("paragraph".to_string(), 0),
                ("text".to_string(), 1),
                ("paragraph".to_string(), 4),
                ("text".to_string(), 5),
            ]
        );
    }

    #[test]
    fn nodes_between_skips_descent_when_cb_returns_false() {
        let doc = Node::new_container_unchecked(
            "document".to_string(),
            Attrs::new(),
            vec![para(vec![text("ab")])],
        );
        let mut seen = vec![];
        doc.nodes_between(0, doc.node_size(), 0, &mut |n, pos, _parent, _idx| {
            seen.push(n.node_type().to_string());
            n.node_type() != "paragraph"
        });
        assert_eq!(seen, vec!["document", "paragraph"]);
    }
}
