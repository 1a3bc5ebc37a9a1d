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

//! Node/mark type registry and content validation.

pub mod content_expr;
pub mod default_schema;
pub mod dom_spec;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::model::mark::{AttrValue, Attrs, Mark};
use crate::model::node::Node;

use content_expr::ContentExpr;
use dom_spec::DomSpec;

/// An attribute descriptor: a default value, or `None` meaning the
/// attribute is required on every construction.
#[derive(Clone, Debug)]
pub struct AttrSpec {
    pub default: Option<AttrValue>,
}

impl AttrSpec {
    pub fn required() -> Self {
        AttrSpec { default: None }
    }
    pub fn with_default(v: impl Into<AttrValue>) -> Self {
        AttrSpec {
            default: Some(v.into()),
        }
    }
}

pub type ToDomNode = Arc<dyn Fn(&Node) -> DomSpec + Send + Sync>;
pub type ToDomMark = Arc<dyn Fn(&Mark) -> DomSpec + Send + Sync>;

#[derive(Clone)]
pub struct NodeSpec {
    pub name: String,
    pub group: Option<String>,
    pub content: Option<ContentExpr>,
    pub attrs: BTreeMap<String, AttrSpec>,
    pub is_leaf: bool,
    pub is_text: bool,
    pub to_dom: ToDomNode,
}

#[derive(Clone)]
pub struct MarkSpec {
    pub name: String,
    pub attrs: BTreeMap<String, AttrSpec>,
    pub to_dom: ToDomMark,
}

/// A registry of node and mark types, built once and shared by every
/// component that needs to validate or construct document content.
#[derive(Clone)]
pub struct Schema {
    nodes: BTreeMap<String, NodeSpec>,
    marks: BTreeMap<String, MarkSpec>,
}

impl Schema {
    /// Build a schema from node/mark specs. Fails if there isn't exactly one
    /// top node type named `document`.
    pub fn new(
        nodes: BTreeMap<String, NodeSpec>,
        marks: BTreeMap<String, MarkSpec>,
    ) -> Result<Self, SchemaError> {
        if !nodes.contains_key("document") {
            return Err(SchemaError::MissingDocumentNode);
        }
        Ok(Schema { nodes, marks })
    }

    pub fn node_spec(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.get(name)
    }

    pub fn mark_spec(&self, name: &str) -> Option<&MarkSpec> {
        self.marks.get(name)
    }

    pub fn node_specs(&self) -> impl Iterator<Item = &NodeSpec> {
        self.nodes.values()
    }

    pub fn mark_specs(&self) -> impl Iterator<Item = &MarkSpec> {
        self.marks.values()
    }

    fn type_in_group(&self, node_type: &str, group: &str) -> bool {
        self.nodes
            .get(node_type)
            .and_then(|s| s.group.as_deref())
            .map(|g| g == group)
            .unwrap_or(false)
    }

    fn matches_term(&self, matcher: &str, node_type: &str) -> bool {
        matcher == node_type || self.type_in_group(node_type, matcher)
    }

    /// `validContent`: does `children` satisfy `parentType`'s content
    /// expression? A parent with no declared content expression accepts
    /// no children at all (leaves and other childless types).
    pub fn valid_content(&self, parent_type: &str, children: &[Node]) -> bool {
        let Some(spec) = self.nodes.get(parent_type) else {
            return false;
        };
        match &spec.content {
            Some(expr) => {
                let types: Vec<&str> = children.iter().map(Node::node_type).collect();
                expr.validate(&types, |m, t| self.matches_term(m, t))
            }
            None => children.is_empty(),
        }
    }

    fn resolve_attrs(
        &self,
        node_type: &str,
        spec_attrs: &BTreeMap<String, AttrSpec>,
        given: Attrs,
    ) -> Result<Attrs, SchemaError> {
        let mut resolved = given;
        for (name, attr_spec) in spec_attrs {
            if !resolved.contains_key(name) {
                match &attr_spec.default {
                    Some(default) => {
                        resolved.insert(name.clone(), default.clone());
                    }
                    None => {
                        return Err(SchemaError::MissingAttribute {
                            node_type: node_type.to_string(),
                            attr: name.clone(),
                        })
                    }
                }
            }
        }
        Ok(resolved)
    }

    /// Construct a node through the schema: resolves attribute defaults, then
    /// validates `children` against the node's content expression (`node(type,
    /// attrs, children, marks)`).
    pub fn node(
        &self,
        node_type: &str,
        attrs: Attrs,
        children: Vec<Node>,
        marks: Vec<Mark>,
    ) -> Result<Node, SchemaError> {
        let spec = self
            .nodes
            .get(node_type)
            .ok_or_else(|| SchemaError::UnknownNodeType(node_type.to_string()))?
            .clone();

        if spec.is_text {
            return Err(SchemaError::ContainerNodeWithText);
        }

        let resolved_attrs = self.resolve_attrs(node_type, &spec.attrs, attrs)?;

        if spec.is_leaf {
            if !children.is_empty() {
                return Err(SchemaError::TextNodeWithChildren);
            }
            return Ok(Node::new_leaf_unchecked(node_type.to_string(), resolved_attrs));
        }

        if !self.valid_content(node_type, &children) {
            let expr_src = spec
                .content
                .as_ref()
                .map(|e| e.source().to_string())
                .unwrap_or_default();
            return Err(SchemaError::ContentMismatch {
                parent: node_type.to_string(),
                expr: expr_src,
            });
        }

        for m in &marks {
            if !self.marks.contains_key(&m.mark_type) {
                return Err(SchemaError::UnknownMarkType(m.mark_type.clone()));
            }
        }

        let node = Node::new_container_unchecked(node_type.to_string(), resolved_attrs, children);
        Ok(if marks.is_empty() {
            node
        } else {
            node.copy_with_marks(marks)
        })
    }

    /// `text(s, marks?)`: build a text node, validating every mark type exists.
    /// Requires a non-empty string.
    pub fn text(&self, s: impl Into<String>, marks: Vec<Mark>) -> Result<Node, SchemaError> {
        let s = s.into();
        if s.is_empty() {
            return Err(SchemaError::EmptyText);
        }
        for m in &marks {
            if !self.marks.contains_key(&m.mark_type) {
                return Err(SchemaError::UnknownMarkType(m.mark_type.clone()));
            }
        }
        Ok(Node::new_text_unchecked(s, marks))
    }
}

#[cfg(test)]
mod test {
    use super::default_schema::default_schema;
    use super::*;

    #[test]
    fn document_requires_block_children() {
        let schema = default_schema();
        let p = schema.node("paragraph", Attrs::new(), vec![], vec![]).unwrap();
        assert!(schema.valid_content("document", &[p]));
        assert!(!schema.valid_content("document", &[]));
    }

    #[test]
    fn unknown_node_type_errors() {
        let schema = default_schema();
        assert!(matches!(
            schema.node("nonsense", Attrs::new(), vec![], vec![]),
            Err(SchemaError::UnknownNodeType(_))
        ));
    }

    #[test]
    fn missing_required_attr_errors() {
        let schema = default_schema();
        assert!(matches!(
            schema.node("heading", Attrs::new(), vec![], vec![]),
            Err(SchemaError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn attrs_fall_back_to_defaults() {
        let schema = default_schema();
        let p = schema.node("paragraph", Attrs::new(), vec![], vec![]).unwrap();
        assert_eq!(p.attrs().unwrap().get("align"), Some(&AttrValue::Null));
    }

    #[test]
    fn unknown_mark_type_errors() {
        let schema = default_schema();
        assert!(matches!(
            schema.text("hi", vec![Mark::new("glow")]),
            Err(SchemaError::UnknownMarkType(_))
        ));
    }

    #[test]
    fn empty_text_errors() {
        let schema = default_schema();
        assert!(matches!(schema.text("", vec![]), Err(SchemaError::EmptyText)));
    }

    #[test]
    fn code_block_rejects_non_text_children() {
        let schema = default_schema();
        let p = schema.node("paragraph", Attrs::new(), vec![], vec![]).unwrap();
        assert!(!schema.valid_content("codeBlock", &[p]));
        let t = schema.text("code", vec![]).unwrap();
        assert!(schema.valid_content("codeBlock", &[t]));
    }
}
