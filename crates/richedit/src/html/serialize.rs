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

//! Node → HTML serialization. Every node type emits its schema `toDOM` spec
//! literally; marks wrap their text run innermost-to-outermost in
//! reverse-sorted order. Output sanitization (lighter than input) is applied to
//! every emitted attribute.

use crate::html::sanitize::sanitize_attrs_output;
use crate::model::mark::marks_outermost_first;
use crate::model::node::Node;
use crate::schema::dom_spec::DomSpec;
use crate::schema::Schema;

/// HTML elements with no closing tag and no content model.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "source", "track"];

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

/// Serialize the whole document to an HTML string (`value (get)`).
pub fn serialize(schema: &Schema, doc: &Node) -> String {
    render_node(schema, doc)
}

fn render_node(schema: &Schema, node: &Node) -> String {
    match node {
        Node::Text(_) => render_text_with_marks(schema, node),
        Node::Leaf(l) => {
            let Some(spec) = schema.node_spec(&l.node_type) else {
                return String::new();
            };
            render_dom(&(spec.to_dom)(node), "")
        }
        Node::Container(c) => {
            let Some(spec) = schema.node_spec(&c.node_type) else {
                return String::new();
            };
            let inner: String = c.children.iter().map(|child| render_node(schema, child)).collect();
            render_dom(&(spec.to_dom)(node), &inner)
        }
    }
}

fn render_dom(spec: &DomSpec, content: &str) -> String {
    match spec {
        DomSpec::Hole => content.to_string(),
        DomSpec::Element { tag, attrs, children } => {
            let sanitized = sanitize_attrs_output(
                tag,
                attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            );
            let attr_str: String = sanitized
                .iter()
                .map(|(k, v)| format!(" {k}=\"{}\"", escape_attr(v)))
                .collect();
            if children.is_empty() && VOID_ELEMENTS.contains(&tag.as_str()) {
                return format!("<{tag}{attr_str}/>");
            }
            let inner: String = children.iter().map(|child| render_dom(child, content)).collect();
            format!("<{tag}{attr_str}>{inner}</{tag}>")
        }
    }
}

/// Renders a text node's escaped content wrapped by its marks' `toDOM`
/// specs, innermost mark applied first.
pub(crate) fn render_text_with_marks(schema: &Schema, node: &Node) -> String {
    let text = escape_text(node.text().unwrap_or_default());
    marks_outermost_first(node.marks()).into_iter().rev().fold(text, |inner, mark| {
        match schema.mark_spec(&mark.mark_type) {
            Some(spec) => render_dom(&(spec.to_dom)(mark), &inner),
            None => inner,
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::mark::{AttrValue, Attrs, Mark};
    use crate::schema::default_schema::default_schema;

    #[test]
    fn plain_paragraph_round_trips_to_p_tag() {
        let schema = default_schema();
        let text = schema.text("hello", vec![]).unwrap();
        let p = schema.node("paragraph", Attrs::new(), vec![text], vec![]).unwrap();
        let doc = schema.node("document", Attrs::new(), vec![p], vec![]).unwrap();
        assert_eq!(serialize(&schema, &doc), "<div><p>hello</p></div>");
    }

    #[test]
    fn heading_emits_h_tag_for_level() {
        let schema = default_schema();
        let mut attrs = Attrs::new();
        attrs.insert("level".to_string(), AttrValue::Int(2));
        let text = schema.text("Title", vec![]).unwrap();
        let h = schema.node("heading", attrs, vec![text], vec![]).unwrap();
        let doc = schema.node("document", Attrs::new(), vec![h], vec![]).unwrap();
        assert_eq!(serialize(&schema, &doc), "<div><h2>Title</h2></div>");
    }

    #[test]
    fn horizontal_rule_is_self_closing() {
        let schema = default_schema();
        let hr = schema.node("horizontalRule", Attrs::new(), vec![], vec![]).unwrap();
        let doc = schema.node("document", Attrs::new(), vec![hr], vec![]).unwrap();
        assert_eq!(serialize(&schema, &doc), "<div><hr/></div>");
    }

    #[test]
    fn bold_mark_wraps_text_in_strong() {
        let schema = default_schema();
        let text = schema.text("world", vec![Mark::new("bold")]).unwrap();
        assert_eq!(render_text_with_marks(&schema, &text), "<strong>world</strong>");
    }

    #[test]
    fn link_with_blank_target_emits_rel() {
        let schema = default_schema();
        let mut link_attrs = Attrs::new();
        link_attrs.insert("href".to_string(), AttrValue::Str("https://example.com".to_string()));
        link_attrs.insert("target".to_string(), AttrValue::Str("_blank".to_string()));
        let text = schema.text("go", vec![Mark::with_attrs("link", link_attrs)]).unwrap();
        let rendered = render_text_with_marks(&schema, &text);
        assert!(rendered.contains("rel=\"noopener noreferrer\""));
    }
}
