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

//! The fixed default schema: every node and mark type a host document is built
//! from, with their content expressions, attribute defaults, and `toDOM`
//! factories.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::mark::{AttrValue, Mark};
use crate::model::node::Node;

use super::content_expr::ContentExpr;
use super::dom_spec::{attrs1, DomSpec};
use super::{AttrSpec, MarkSpec, NodeSpec, Schema};

fn attrs_map(pairs: &[(&str, AttrSpec)]) -> BTreeMap<String, AttrSpec> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn block_style(node: &Node) -> Option<String> {
    let attrs = node.attrs()?;
    let mut parts = Vec::new();
    if let Some(align) = attrs.get("align").and_then(AttrValue::as_str) {
        parts.push(format!("text-align:{align}"));
    }
    if let Some(indent) = attrs.get("indent").and_then(AttrValue::as_i64) {
        if indent > 0 {
            parts.push(format!("margin-left:{}px", indent * 40));
        }
    }
    if let Some(lh) = attrs.get("lineHeight").and_then(AttrValue::as_str) {
        parts.push(format!("line-height:{lh}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(";"))
    }
}

fn styled_elem(tag: &str, node: &Node) -> DomSpec {
    match block_style(node) {
        Some(style) => DomSpec::elem_with_attrs(tag, attrs1("style", style)),
        None => DomSpec::elem(tag),
    }
}

fn node_spec(
    name: &str,
    group: Option<&str>,
    content: Option<&str>,
    attrs: &[(&str, AttrSpec)],
    to_dom: impl Fn(&Node) -> DomSpec + Send + Sync + 'static,
) -> NodeSpec {
    NodeSpec {
        name: name.to_string(),
        group: group.map(str::to_string),
        content: content.map(ContentExpr::parse),
        attrs: attrs_map(attrs),
        is_leaf: false,
        is_text: false,
        to_dom: Arc::new(to_dom),
    }
}

fn leaf_spec(
    name: &str,
    group: Option<&str>,
    attrs: &[(&str, AttrSpec)],
    to_dom: impl Fn(&Node) -> DomSpec + Send + Sync + 'static,
) -> NodeSpec {
    NodeSpec {
        name: name.to_string(),
        group: group.map(str::to_string),
        content: None,
        attrs: attrs_map(attrs),
        is_leaf: true,
        is_text: false,
        to_dom: Arc::new(to_dom),
    }
}

fn mark_spec(
    name: &str,
    attrs: &[(&str, AttrSpec)],
    to_dom: impl Fn(&Mark) -> DomSpec + Send + Sync + 'static,
) -> MarkSpec {
    MarkSpec {
        name: name.to_string(),
        attrs: attrs_map(attrs),
        to_dom: Arc::new(to_dom),
    }
}

/// The engine's one and only built-in schema. Host applications do not
/// customize node/mark types; `EditorOptions` only toggles which
/// commands and toolbar surfaces are exposed over it.
pub fn default_schema() -> Schema {
    let block_attrs = [
        ("align", AttrSpec::with_default(AttrValue::Null)),
        ("indent", AttrSpec::with_default(0i64)),
        ("lineHeight", AttrSpec::with_default(AttrValue::Null)),
    ];

    let mut nodes = BTreeMap::new();

    nodes.insert(
        "document".to_string(),
        node_spec("document", None, Some("block+"), &[], |_| DomSpec::elem("div")),
    );

    nodes.insert(
        "paragraph".to_string(),
        node_spec("paragraph", Some("block"), Some("inline*"), &block_attrs, |n| {
            styled_elem("p", n)
        }),
    );

    nodes.insert("heading".to_string(), {
        let mut attrs = block_attrs.to_vec();
        attrs.push(("level", AttrSpec::required()));
        node_spec("heading", Some("block"), Some("inline*"), &attrs, |n| {
            let level = n
                .attrs()
                .and_then(|a| a.get("level"))
                .and_then(AttrValue::as_i64)
                .unwrap_or(1)
                .clamp(1, 6);
            styled_elem(&format!("h{level}"), n)
        })
    });

    nodes.insert(
        "blockquote".to_string(),
        node_spec("blockquote", Some("block"), Some("block+"), &[], |_| {
            DomSpec::elem("blockquote")
        }),
    );

    nodes.insert("bulletList".to_string(), {
        let attrs = [("checklist", AttrSpec::with_default(false))];
        node_spec("bulletList", Some("block"), Some("listItem+"), &attrs, |n| {
            let checklist = n
                .attrs()
                .and_then(|a| a.get("checklist"))
                .and_then(AttrValue::as_bool)
                .unwrap_or(false);
            if checklist {
                DomSpec::elem_with_attrs("ul", attrs1("data-checklist", "true"))
            } else {
                DomSpec::elem("ul")
            }
        })
    });

    nodes.insert("orderedList".to_string(), {
        let attrs = [("start", AttrSpec::with_default(1i64))];
        node_spec("orderedList", Some("block"), Some("listItem+"), &attrs, |n| {
            let start = n
                .attrs()
                .and_then(|a| a.get("start"))
                .and_then(AttrValue::as_i64)
                .unwrap_or(1);
            DomSpec::elem_with_attrs("ol", attrs1("start", start.to_string()))
        })
    });

    nodes.insert("listItem".to_string(), {
        let mut attrs = block_attrs[..2].to_vec();
        attrs.push(("checked", AttrSpec::with_default(false)));
        node_spec("listItem", None, Some("block+"), &attrs, |n| {
            let checked = n
                .attrs()
                .and_then(|a| a.get("checked"))
                .and_then(AttrValue::as_bool)
                .unwrap_or(false);
            let mut dom_attrs = BTreeMap::new();
            if let Some(style) = block_style(n) {
                dom_attrs.insert("style".to_string(), style);
            }
            if checked {
                dom_attrs.insert("data-checked".to_string(), "true".to_string());
            }
            DomSpec::elem_with_attrs("li", dom_attrs)
        })
    });

    nodes.insert("codeBlock".to_string(), {
        let attrs = [("language", AttrSpec::with_default(AttrValue::Null))];
        node_spec("codeBlock", Some("block"), Some("text*"), &attrs, |n| {
            let lang = n.attrs().and_then(|a| a.get("language")).and_then(AttrValue::as_str);
            let code = match lang {
                Some(lang) if !lang.is_empty() => {
                    DomSpec::elem_with_attrs("code", attrs1("class", format!("language-{lang}")))
                }
                _ => DomSpec::elem("code"),
            };
            DomSpec::Element {
                tag: "pre".to_string(),
                attrs: BTreeMap::new(),
                children: vec![code],
            }
        })
    });

    nodes.insert(
        "horizontalRule".to_string(),
        leaf_spec("horizontalRule", Some("block"), &[], |_| {
            DomSpec::elem_no_content("hr", BTreeMap::new())
        }),
    );

    nodes.insert(
        "table".to_string(),
        node_spec("table", Some("block"), Some("tableRow+"), &[], |_| DomSpec::Element {
            tag: "table".to_string(),
            attrs: BTreeMap::new(),
            children: vec![DomSpec::elem("tbody")],
        }),
    );

    nodes.insert(
        "tableRow".to_string(),
        node_spec("tableRow", None, Some("tableCell+"), &[], |_| DomSpec::elem("tr")),
    );

    nodes.insert("tableCell".to_string(), {
        let attrs = [
            ("colspan", AttrSpec::with_default(1i64)),
            ("rowspan", AttrSpec::with_default(1i64)),
            ("header", AttrSpec::with_default(false)),
        ];
        node_spec("tableCell", None, Some("block+"), &attrs, |n| {
            let a = n.attrs();
            let is_header = a
                .and_then(|a| a.get("header"))
                .and_then(AttrValue::as_bool)
                .unwrap_or(false);
            let mut dom_attrs = BTreeMap::new();
            if let Some(span) = a.and_then(|a| a.get("colspan")).and_then(AttrValue::as_i64) {
                if span > 1 {
                    dom_attrs.insert("colspan".to_string(), span.to_string());
                }
            }
            if let Some(span) = a.and_then(|a| a.get("rowspan")).and_then(AttrValue::as_i64) {
                if span > 1 {
                    dom_attrs.insert("rowspan".to_string(), span.to_string());
                }
            }
            DomSpec::elem_with_attrs(if is_header { "th" } else { "td" }, dom_attrs)
        })
    });

    nodes.insert("image".to_string(), {
        let attrs = [
            ("src", AttrSpec::required()),
            ("alt", AttrSpec::with_default(AttrValue::Str(String::new()))),
            ("title", AttrSpec::with_default(AttrValue::Null)),
            ("width", AttrSpec::with_default(AttrValue::Null)),
            ("height", AttrSpec::with_default(AttrValue::Null)),
            ("caption", AttrSpec::with_default(AttrValue::Null)),
            ("align", AttrSpec::with_default(AttrValue::Null)),
        ];
        leaf_spec("image", Some("inline"), &attrs, |n| {
            let a = n.attrs();
            let mut dom_attrs = BTreeMap::new();
            for key in ["src", "alt", "title", "width", "height"] {
                if let Some(v) = a.and_then(|a| a.get(key)) {
                    if !matches!(v, AttrValue::Null) {
                        dom_attrs.insert(key.to_string(), v.to_string());
                    }
                }
            }
            if let Some(align) = a.and_then(|a| a.get("align")).and_then(AttrValue::as_str) {
                dom_attrs.insert("style".to_string(), format!("float:{align}"));
            }
            DomSpec::elem_no_content("img", dom_attrs)
        })
    });

    // Block-level media node types backing `insertVideo`/`insertEmbed`,
    // alongside the `image` leaf above.
    nodes.insert("video".to_string(), {
        let attrs = [
            ("src", AttrSpec::required()),
            ("width", AttrSpec::with_default(AttrValue::Null)),
            ("height", AttrSpec::with_default(AttrValue::Null)),
            ("title", AttrSpec::with_default(AttrValue::Null)),
            ("align", AttrSpec::with_default(AttrValue::Null)),
        ];
        leaf_spec("video", Some("block"), &attrs, |n| {
            let a = n.attrs();
            let mut dom_attrs = attrs1("controls", "true");
            for key in ["src", "width", "height", "title"] {
                if let Some(v) = a.and_then(|a| a.get(key)) {
                    if !matches!(v, AttrValue::Null) {
                        dom_attrs.insert(key.to_string(), v.to_string());
                    }
                }
            }
            DomSpec::elem_no_content("video", dom_attrs)
        })
    });

    nodes.insert("embed".to_string(), {
        let attrs = [
            ("src", AttrSpec::required()),
            ("width", AttrSpec::with_default(AttrValue::Null)),
            ("height", AttrSpec::with_default(AttrValue::Null)),
            ("title", AttrSpec::with_default(AttrValue::Null)),
        ];
        leaf_spec("embed", Some("block"), &attrs, |n| {
            let a = n.attrs();
            let mut dom_attrs = BTreeMap::new();
            for key in ["src", "width", "height", "title"] {
                if let Some(v) = a.and_then(|a| a.get(key)) {
                    if !matches!(v, AttrValue::Null) {
                        dom_attrs.insert(key.to_string(), v.to_string());
                    }
                }
            }
            DomSpec::elem_no_content("iframe", dom_attrs)
        })
    });

    nodes.insert(
        "hardBreak".to_string(),
        leaf_spec("hardBreak", Some("inline"), &[], |_| {
            DomSpec::elem_no_content("br", BTreeMap::new())
        }),
    );

    // Registered for group membership only — the View renders text nodes
    // directly as DOM text nodes rather than through `toDOM`.
    nodes.insert("text".to_string(), NodeSpec {
        name: "text".to_string(),
        group: Some("inline".to_string()),
        content: None,
        attrs: BTreeMap::new(),
        is_leaf: false,
        is_text: true,
        to_dom: Arc::new(|_| DomSpec::Hole),
    });

    let mut marks = BTreeMap::new();

    marks.insert("bold".to_string(), mark_spec("bold", &[], |_| DomSpec::elem("strong")));
    marks.insert("italic".to_string(), mark_spec("italic", &[], |_| DomSpec::elem("em")));
    marks.insert("underline".to_string(), mark_spec("underline", &[], |_| DomSpec::elem("u")));
    marks.insert(
        "strikethrough".to_string(),
        mark_spec("strikethrough", &[], |_| DomSpec::elem("s")),
    );
    marks.insert("code".to_string(), mark_spec("code", &[], |_| DomSpec::elem("code")));
    marks.insert("subscript".to_string(), mark_spec("subscript", &[], |_| DomSpec::elem("sub")));
    marks.insert(
        "superscript".to_string(),
        mark_spec("superscript", &[], |_| DomSpec::elem("sup")),
    );

    marks.insert("link".to_string(), {
        let attrs = [
            ("href", AttrSpec::required()),
            ("title", AttrSpec::with_default(AttrValue::Null)),
            ("target", AttrSpec::with_default(AttrValue::Null)),
        ];
        mark_spec("link", &attrs, |m| {
            let href = m.attrs.get("href").map(ToString::to_string).unwrap_or_default();
            let mut dom_attrs = attrs1("href", href);
            if let Some(title) = m.attrs.get("title").and_then(AttrValue::as_str) {
                dom_attrs.insert("title".to_string(), title.to_string());
            }
            if let Some(target) = m.attrs.get("target").and_then(AttrValue::as_str) {
                dom_attrs.insert("target".to_string(), target.to_string());
                if target == "_blank" {
                    dom_attrs.insert("rel".to_string(), "noopener noreferrer".to_string());
                }
            }
            DomSpec::elem_with_attrs("a", dom_attrs)
        })
    });

    marks.insert("textColor".to_string(), {
        let attrs = [("color", AttrSpec::required())];
        mark_spec("textColor", &attrs, |m| {
            let color = m.attrs.get("color").map(ToString::to_string).unwrap_or_default();
            DomSpec::elem_with_attrs("span", attrs1("style", format!("color:{color}")))
        })
    });

    marks.insert("backgroundColor".to_string(), {
        let attrs = [("color", AttrSpec::required())];
        mark_spec("backgroundColor", &attrs, |m| {
            let color = m.attrs.get("color").map(ToString::to_string).unwrap_or_default();
            DomSpec::elem_with_attrs("span", attrs1("style", format!("background-color:{color}")))
        })
    });

    marks.insert("fontSize".to_string(), {
        let attrs = [("size", AttrSpec::required())];
        mark_spec("fontSize", &attrs, |m| {
            let size = m.attrs.get("size").map(ToString::to_string).unwrap_or_default();
            DomSpec::elem_with_attrs("span", attrs1("style", format!("font-size:{size}")))
        })
    });

    marks.insert("fontFamily".to_string(), {
        let attrs = [("family", AttrSpec::required())];
        mark_spec("fontFamily", &attrs, |m| {
            let family = m.attrs.get("family").map(ToString::to_string).unwrap_or_default();
            DomSpec::elem_with_attrs("span", attrs1("style", format!("font-family:{family}")))
        })
    });

    Schema::new(nodes, marks).expect("built-in schema always declares a document node")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::mark::Attrs;

    #[test]
    fn default_schema_builds() {
        let schema = default_schema();
        assert!(schema.node_spec("document").is_some());
        assert!(schema.mark_spec("bold").is_some());
    }

    #[test]
    fn heading_level_clamped_in_dom() {
        let schema = default_schema();
        let mut attrs = Attrs::new();
        attrs.insert("level".to_string(), AttrValue::Int(9));
        let h = schema.node("heading", attrs, vec![], vec![]).unwrap();
        let spec = schema.node_spec("heading").unwrap();
        match (spec.to_dom)(&h) {
            DomSpec::Element { tag, .. } => assert_eq!(tag, "h6"),
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn table_cell_omits_span_when_one() {
        let schema = default_schema();
        let p = schema.node("paragraph", Attrs::new(), vec![], vec![]).unwrap();
        let cell = schema.node("tableCell", Attrs::new(), vec![p], vec![]).unwrap();
        let spec = schema.node_spec("tableCell").unwrap();
        match (spec.to_dom)(&cell) {
            DomSpec::Element { tag, attrs, .. } => {
                assert_eq!(tag, "td");
                assert!(!attrs.contains_key("colspan"));
            }
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn link_with_blank_target_gets_rel() {
        let mark = Mark::with_attrs("link", {
            let mut a = Attrs::new();
            a.insert("href".to_string(), AttrValue::Str("https://example.com".to_string()));
            a.insert("target".to_string(), AttrValue::Str("_blank".to_string()));
            a
        });
        let schema = default_schema();
        let spec = schema.mark_spec("link").unwrap();
        match (spec.to_dom)(&mark) {
            DomSpec::Element { attrs, .. } => {
                assert_eq!(attrs.get("rel").map(String::as_str), Some("noopener noreferrer"));
            }
            _ => panic!("expected element"),
        }
    }
}
