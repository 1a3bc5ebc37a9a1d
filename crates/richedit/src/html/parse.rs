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

//! HTML → document parsing. Parsing happens in two stages:
//! [`RawDomSink`] drives html5ever's fragment tokenizer into a small arena tree
//! (mirroring the shape of a real DOM but holding only tag/attrs/text), then
//! [`to_nodes`] walks that arena converting each element into the schema's
//! `Node` tree. Elements the schema can't place at their context are caught per
//! element: they're either unwrapped (their children spliced into the parent)
//! or wrapped in a fresh paragraph, and the rest of the document still parses.

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;

use html5ever::interface::NextParserState;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_fragment, Attribute, QualName};
use tracing::warn;

use crate::html::sanitize::{is_dangerous_url, is_event_handler_attr, is_forbidden_element, sanitize_style};
use crate::model::mark::{AttrValue, Attrs, Mark};
use crate::model::node::Node;
use crate::schema::Schema;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RawHandle(usize);

#[derive(Clone, Debug)]
enum RawNode {
    Document { children: Vec<RawHandle> },
    Element { name: QualName, attrs: Vec<(String, String)>, children: Vec<RawHandle> },
    Text { content: String },
}

struct RawDom {
    nodes: Vec<RawNode>,
    document: RawHandle,
}

impl RawDom {
    fn new() -> Self {
        RawDom {
            nodes: vec![RawNode::Document { children: Vec::new() }],
            document: RawHandle(0),
        }
    }

    fn get(&self, h: &RawHandle) -> &RawNode {
        &self.nodes[h.0]
    }

    fn get_mut(&mut self, h: &RawHandle) -> &mut RawNode {
        &mut self.nodes[h.0]
    }

    fn add(&mut self, node: RawNode) -> RawHandle {
        let h = RawHandle(self.nodes.len());
        self.nodes.push(node);
        h
    }

    fn children_of(&self, h: &RawHandle) -> &[RawHandle] {
        match self.get(h) {
            RawNode::Document { children } | RawNode::Element { children, .. } => children,
            RawNode::Text { .. } => &[],
        }
    }
}

struct RawDomSink {
    dom: RefCell<RawDom>,
}

impl TreeSink for RawDomSink {
    type Handle = RawHandle;
    type Output = RawDom;
    type ElemName<'a> = Ref<'a, QualName>;

    fn finish(self) -> Self::Output {
        self.dom.into_inner()
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        warn!(%msg, "HTML parse error");
    }

    fn get_document(&self) -> Self::Handle {
        self.dom.borrow().document
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        Ref::map(self.dom.borrow(), |dom| match dom.get(target) {
            RawNode::Element { name, .. } => name,
            _ => panic!("elem_name called on a non-element handle"),
        })
    }

    fn create_element(&self, name: QualName, attrs: Vec<Attribute>, _flags: ElementFlags) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| (a.name.local.as_ref().to_string(), a.value.as_ref().to_string()))
            .collect();
        self.dom.borrow_mut().add(RawNode::Element {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.dom.borrow_mut().add(RawNode::Text { content: String::new() })
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.dom.borrow_mut().add(RawNode::Text { content: String::new() })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(handle) => match dom.get_mut(parent) {
                RawNode::Document { children } | RawNode::Element { children, .. } => children.push(handle),
                RawNode::Text { .. } => {}
            },
            NodeOrText::AppendText(tendril) => {
                let last_text = dom
                    .children_of(parent)
                    .last()
                    .copied()
                    .filter(|h| matches!(dom.get(h), RawNode::Text { .. }));
                if let Some(h) = last_text {
                    if let RawNode::Text { content } = dom.get_mut(&h) {
                        content.push_str(tendril.as_ref());
                    }
                } else {
                    let handle = dom.add(RawNode::Text { content: tendril.as_ref().to_string() });
                    match dom.get_mut(parent) {
                        RawNode::Document { children } | RawNode::Element { children, .. } => children.push(handle),
                        RawNode::Text { .. } => {}
                    }
                }
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        // Only reached for foster-parented table content; our sanitized
        // input is well-formed enough in practice that appending to the
        // element (rather than its sibling) is an acceptable fallback.
        let _ = prev_element;
        self.append(element, child);
    }

    fn append_doctype_to_document(&self, _name: StrTendril, _public_id: StrTendril, _system_id: StrTendril) {}

    fn mark_script_already_started(&self, _node: &Self::Handle) {}

    fn pop(&self, _node: &Self::Handle) {}

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        // No parent-pointer tracking in this arena; appending after the
        // sibling (rather than strictly before) only matters for malformed
        // fragments outside this engine's editor-generated input.
        self.append(sibling, new_node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut dom = self.dom.borrow_mut();
        if let RawNode::Element { attrs: existing, .. } = dom.get_mut(target) {
            for attr in attrs {
                let name = attr.name.local.as_ref().to_string();
                if !existing.iter().any(|(n, _)| *n == name) {
                    existing.push((name, attr.value.as_ref().to_string()));
                }
            }
        }
    }

    fn associate_with_form(
        &self,
        _target: &Self::Handle,
        _form: &Self::Handle,
        _nodes: (&Self::Handle, Option<&Self::Handle>),
    ) {
    }

    fn remove_from_parent(&self, _target: &Self::Handle) {}

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut dom = self.dom.borrow_mut();
        let moved = match dom.get_mut(node) {
            RawNode::Document { children } | RawNode::Element { children, .. } => std::mem::take(children),
            RawNode::Text { .. } => Vec::new(),
        };
        match dom.get_mut(new_parent) {
            RawNode::Document { children } | RawNode::Element { children, .. } => children.extend(moved),
            RawNode::Text { .. } => {}
        }
    }

    fn is_mathml_annotation_xml_integration_point(&self, _handle: &Self::Handle) -> bool {
        false
    }

    fn set_current_line(&self, _line_number: u64) {}

    fn complete_script(&self, _node: &Self::Handle) -> NextParserState {
        NextParserState::Continue
    }

    fn allow_declarative_shadow_roots(&self, _intended_parent: &Self::Handle) -> bool {
        false
    }

    fn attach_declarative_shadow(
        &self,
        _location: &Self::Handle,
        _template: &Self::Handle,
        _attrs: Vec<Attribute>,
    ) -> Result<(), String> {
        Ok(())
    }
}

fn parse_raw(html: &str) -> RawDom {
    let sink = RawDomSink { dom: RefCell::new(RawDom::new()) };
    let context = QualName::new(None, "".into(), "div".into());
    parse_fragment(sink, Default::default(), context, vec![])
        .from_utf8()
        .one(html.as_bytes())
}

/// Tags that contribute no node of their own; their children are parsed
/// as if they were direct children of this element's parent.
const TRANSPARENT_TAGS: &[&str] = &["html", "head", "body", "div", "span"];

fn attr_get<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
}

/// Applies the input sanitizer to one element's attribute list, given its tag
/// name.
fn sanitized_attrs(tag: &str, attrs: &[(String, String)]) -> BTreeMap<String, String> {
    attrs
        .iter()
        .filter_map(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            if is_event_handler_attr(&lower) || is_dangerous_url(tag, &lower, value) {
                return None;
            }
            if lower == "style" {
                return sanitize_style(value).map(|v| (lower, v));
            }
            Some((lower, value.clone()))
        })
        .collect()
}

fn style_map(attrs: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let Some(style) = attrs.get("style") else {
        return BTreeMap::new();
    };
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            Some((k.trim().to_ascii_lowercase(), v.trim().to_string()))
        })
        .collect()
}

fn block_attrs_from_style(style: &BTreeMap<String, String>) -> Attrs {
    let mut attrs = Attrs::new();
    if let Some(align) = style.get("text-align") {
        attrs.insert("align".to_string(), AttrValue::Str(align.clone()));
    }
    if let Some(margin) = style.get("margin-left") {
        if let Some(px) = margin.strip_suffix("px") {
            if let Ok(px) = px.trim().parse::<i64>() {
                attrs.insert("indent".to_string(), AttrValue::Int(px / 40));
            }
        }
    }
    if let Some(lh) = style.get("line-height") {
        attrs.insert("lineHeight".to_string(), AttrValue::Str(lh.clone()));
    }
    attrs
}

/// A mark contributed by one inline wrapper tag, found while walking
/// down into a block's inline content.
fn mark_for_tag(tag: &str, attrs: &BTreeMap<String, String>) -> Option<Mark> {
    let style = style_map(attrs);
    match tag {
        "strong" | "b" => Some(Mark::new("bold")),
        "em" | "i" => Some(Mark::new("italic")),
        "u" => Some(Mark::new("underline")),
        "s" | "strike" | "del" => Some(Mark::new("strikethrough")),
        "code" => Some(Mark::new("code")),
        "sub" => Some(Mark::new("subscript")),
        "sup" => Some(Mark::new("superscript")),
        "a" => {
            let mut mark_attrs = Attrs::new();
            mark_attrs.insert(
                "href".to_string(),
                AttrValue::Str(attr_get_map(attrs, "href").unwrap_or_default()),
            );
            if let Some(title) = attr_get_map(attrs, "title") {
                mark_attrs.insert("title".to_string(), AttrValue::Str(title));
            }
            if let Some(target) = attr_get_map(attrs, "target") {
                mark_attrs.insert("target".to_string(), AttrValue::Str(target));
            }
            Some(Mark::with_attrs("link", mark_attrs))
        }
        "span" => {
            if let Some(color) = style.get("color") {
                let mut a = Attrs::new();
                a.insert("color".to_string(), AttrValue::Str(color.clone()));
                Some(Mark::with_attrs("textColor", a))
            } else if let Some(color) = style.get("background-color") {
                let mut a = Attrs::new();
                a.insert("color".to_string(), AttrValue::Str(color.clone()));
                Some(Mark::with_attrs("backgroundColor", a))
            } else if let Some(size) = style.get("font-size") {
                let mut a = Attrs::new();
                a.insert("size".to_string(), AttrValue::Str(size.clone()));
                Some(Mark::with_attrs("fontSize", a))
            } else if let Some(family) = style.get("font-family") {
                let mut a = Attrs::new();
                a.insert("family".to_string(), AttrValue::Str(family.clone()));
                Some(Mark::with_attrs("fontFamily", a))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn attr_get_map(attrs: &BTreeMap<String, String>, name: &str) -> Option<String> {
    attrs.get(name).cloned()
}

fn tag_of(dom: &RawDom, h: &RawHandle) -> Option<String> {
    match dom.get(h) {
        RawNode::Element { name, .. } => Some(name.local.as_ref().to_string()),
        _ => None,
    }
}

/// Converts one element's children into inline content (text runs and
/// inline leaves), accumulating `marks` as wrapper tags are descended
/// into.
fn collect_inline(schema: &Schema, dom: &RawDom, h: &RawHandle, marks: &[Mark], out: &mut Vec<Node>) {
    match dom.get(h) {
        RawNode::Text { content } => {
            if !content.is_empty() {
                if let Ok(text) = schema.text(content.clone(), marks.to_vec()) {
                    out.push(text);
                }
            }
        }
        RawNode::Element { name, attrs, children } => {
            let tag = name.local.as_ref();
            let sanitized = sanitized_attrs(tag, attrs);
            match tag {
                "br" => {
                    if let Ok(leaf) = schema.node("hardBreak", Attrs::new(), vec![], vec![]) {
                        out.push(leaf);
                    }
                }
                "img" => {
                    let mut img_attrs = Attrs::new();
                    if let Some(src) = sanitized.get("src") {
                        img_attrs.insert("src".to_string(), AttrValue::Str(src.clone()));
                    }
                    if let Some(alt) = sanitized.get("alt") {
                        img_attrs.insert("alt".to_string(), AttrValue::Str(alt.clone()));
                    }
                    if let Ok(leaf) = schema.node("image", img_attrs, vec![], vec![]) {
                        out.push(leaf);
                    }
                }
                _ => {
                    if let Some(mark) = mark_for_tag(tag, &sanitized) {
                        let mut next_marks = marks.to_vec();
                        next_marks.push(mark);
                        for child in children {
                            collect_inline(schema, dom, child, &next_marks, out);
                        }
                    } else {
                        for child in children {
                            collect_inline(schema, dom, child, marks, out);
                        }
                    }
                }
            }
        }
        RawNode::Document { children } => {
            for child in children {
                collect_inline(schema, dom, child, marks, out);
            }
        }
    }
}

/// Converts one element into zero or more block-level nodes.
fn collect_blocks(schema: &Schema, dom: &RawDom, h: &RawHandle, out: &mut Vec<Node>) {
    match dom.get(h) {
        RawNode::Document { children } => {
            for child in children {
                collect_blocks(schema, dom, child, out);
            }
        }
        RawNode::Text { content } => {
            if !content.trim().is_empty() {
                if let Ok(text) = schema.text(content.clone(), vec![]) {
                    if let Ok(p) = schema.node("paragraph", Attrs::new(), vec![text], vec![]) {
                        out.push(p);
                    }
                }
            }
        }
        RawNode::Element { name, attrs, children } => {
            let tag = name.local.as_ref();
            if is_forbidden_element(tag) {
                return;
            }
            let sanitized = sanitized_attrs(tag, attrs);
            let style = style_map(&sanitized);
            let block_attrs = block_attrs_from_style(&style);

            match tag {
                "p" => push_inline_block(schema, dom, h, children, "paragraph", block_attrs, out),
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    let level: i64 = tag[1..].parse().unwrap_or(1);
                    let mut attrs = block_attrs;
                    attrs.insert("level".to_string(), AttrValue::Int(level));
                    push_inline_block(schema, dom, h, children, "heading", attrs, out);
                }
                "blockquote" => {
                    let mut inner = Vec::new();
                    for child in children {
                        collect_blocks(schema, dom, child, &mut inner);
                    }
                    if inner.is_empty() {
                        inner.push(empty_paragraph(schema));
                    }
                    if let Ok(node) = schema.node("blockquote", Attrs::new(), inner, vec![]) {
                        out.push(node);
                    }
                }
                "hr" => {
                    if let Ok(node) = schema.node("horizontalRule", Attrs::new(), vec![], vec![]) {
                        out.push(node);
                    }
                }
                "ul" | "ol" => {
                    let mut attrs = Attrs::new();
                    let is_checklist = sanitized.get("data-checklist").map(|v| v == "true").unwrap_or(false);
                    if tag == "ul" {
                        attrs.insert("checklist".to_string(), AttrValue::Bool(is_checklist));
                    } else if let Some(start) = sanitized.get("start").and_then(|s| s.parse::<i64>().ok()) {
                        attrs.insert("start".to_string(), AttrValue::Int(start));
                    }
                    let items: Vec<Node> = children
                        .iter()
                        .filter(|c| tag_of(dom, c).as_deref() == Some("li"))
                        .filter_map(|c| convert_list_item(schema, dom, c))
                        .collect();
                    if items.is_empty() {
                        return;
                    }
                    let list_type = if tag == "ul" { "bulletList" } else { "orderedList" };
                    if let Ok(node) = schema.node(list_type, attrs, items, vec![]) {
                        out.push(node);
                    }
                }
                "pre" => {
                    let code_child = children.iter().find(|c| tag_of(dom, c).as_deref() == Some("code"));
                    let (text, language) = match code_child {
                        Some(c) => {
                            let lang = match dom.get(c) {
                                RawNode::Element { attrs, .. } => attr_get(attrs, "class")
                                    .and_then(|c| c.strip_prefix("language-"))
                                    .map(str::to_string),
                                _ => None,
                            };
                            (plain_text(dom, c), lang)
                        }
                        None => (plain_text(dom, h), None),
                    };
                    let mut attrs = Attrs::new();
                    attrs.insert("language".to_string(), language.map(AttrValue::Str).unwrap_or(AttrValue::Null));
                    let children = if text.is_empty() {
                        vec![]
                    } else {
                        schema.text(text, vec![]).into_iter().collect()
                    };
                    if let Ok(node) = schema.node("codeBlock", attrs, children, vec![]) {
                        out.push(node);
                    }
                }
                "table" => {
                    let rows: Vec<Node> = dom
                        .children_of(h)
                        .iter()
                        .flat_map(|c| match tag_of(dom, c) {
                            Some(t) if t == "tbody" || t == "thead" => dom.children_of(c).to_vec(),
                            _ => vec![*c],
                        })
                        .filter(|c| tag_of(dom, c).as_deref() == Some("tr"))
                        .filter_map(|c| convert_table_row(schema, dom, &c))
                        .collect();
                    if !rows.is_empty() {
                        if let Ok(node) = schema.node("table", Attrs::new(), rows, vec![]) {
                            out.push(node);
                        }
                    }
                }
                "video" => {
                    let mut attrs = Attrs::new();
                    if let Some(src) = sanitized.get("src") {
                        attrs.insert("src".to_string(), AttrValue::Str(src.clone()));
                    }
                    if let Ok(node) = schema.node("video", attrs, vec![], vec![]) {
                        out.push(node);
                    }
                }
                _ if TRANSPARENT_TAGS.contains(&tag) => {
                    for child in children {
                        collect_blocks(schema, dom, child, out);
                    }
                }
                _ => {
                    warn!(tag, "unknown element during parse, wrapping content in a paragraph");
                    push_inline_block(schema, dom, h, children, "paragraph", Attrs::new(), out);
                }
            }
        }
    }
}

fn push_inline_block(
    schema: &Schema,
    dom: &RawDom,
    _self_handle: &RawHandle,
    children: &[RawHandle],
    block_type: &str,
    attrs: Attrs,
    out: &mut Vec<Node>,
) {
    let mut inline = Vec::new();
    for child in children {
        collect_inline(schema, dom, child, &[], &mut inline);
    }
    if let Ok(node) = schema.node(block_type, attrs, inline, vec![]) {
        out.push(node);
    }
}

fn empty_paragraph(schema: &Schema) -> Node {
    schema
        .node("paragraph", Attrs::new(), vec![], vec![])
        .expect("empty paragraph always validates")
}

fn plain_text(dom: &RawDom, h: &RawHandle) -> String {
    match dom.get(h) {
        RawNode::Text { content } => content.clone(),
        RawNode::Element { children, .. } | RawNode::Document { children } => {
            children.iter().map(|c| plain_text(dom, c)).collect()
        }
    }
}

fn convert_list_item(schema: &Schema, dom: &RawDom, h: &RawHandle) -> Option<Node> {
    let RawNode::Element { attrs, children, .. } = dom.get(h) else {
        return None;
    };
    let sanitized = sanitized_attrs("li", attrs);
    let checked = sanitized.get("data-checked").map(|v| v == "true").unwrap_or(false);
    let mut item_attrs = Attrs::new();
    item_attrs.insert("checked".to_string(), AttrValue::Bool(checked));

    let mut blocks = Vec::new();
    let mut inline_buffer = Vec::new();
    for child in children {
        match tag_of(dom, child) {
            Some(t) if t == "ul" || t == "ol" || t == "p" => {
                if !inline_buffer.is_empty() {
                    if let Ok(p) = schema.node("paragraph", Attrs::new(), std::mem::take(&mut inline_buffer), vec![]) {
                        blocks.push(p);
                    }
                }
                collect_blocks(schema, dom, child, &mut blocks);
            }
            _ => collect_inline(schema, dom, child, &[], &mut inline_buffer),
        }
    }
    if !inline_buffer.is_empty() || blocks.is_empty() {
        if let Ok(p) = schema.node("paragraph", Attrs::new(), inline_buffer, vec![]) {
            blocks.insert(0, p);
        }
    }
    schema.node("listItem", item_attrs, blocks, vec![]).ok()
}

fn convert_table_row(schema: &Schema, dom: &RawDom, h: &RawHandle) -> Option<Node> {
    let cells: Vec<Node> = dom
        .children_of(h)
        .iter()
        .filter(|c| matches!(tag_of(dom, c).as_deref(), Some("td") | Some("th")))
        .filter_map(|c| convert_table_cell(schema, dom, c))
        .collect();
    if cells.is_empty() {
        return None;
    }
    schema.node("tableRow", Attrs::new(), cells, vec![]).ok()
}

fn convert_table_cell(schema: &Schema, dom: &RawDom, h: &RawHandle) -> Option<Node> {
    let (tag, attrs, children) = match dom.get(h) {
        RawNode::Element { name, attrs, children } => (name.local.as_ref().to_string(), attrs.clone(), children.clone()),
        _ => return None,
    };
    let sanitized = sanitized_attrs(&tag, &attrs);
    let mut cell_attrs = Attrs::new();
    cell_attrs.insert("header".to_string(), AttrValue::Bool(tag == "th"));
    if let Some(span) = sanitized.get("colspan").and_then(|s| s.parse::<i64>().ok()) {
        cell_attrs.insert("colspan".to_string(), AttrValue::Int(span));
    }
    if let Some(span) = sanitized.get("rowspan").and_then(|s| s.parse::<i64>().ok()) {
        cell_attrs.insert("rowspan".to_string(), AttrValue::Int(span));
    }
    let mut blocks = Vec::new();
    for child in &children {
        collect_blocks(schema, dom, child, &mut blocks);
    }
    if blocks.is_empty() {
        blocks.push(empty_paragraph(schema));
    }
    schema.node("tableCell", cell_attrs, blocks, vec![]).ok()
}

/// Parses `html` into the list of top-level block nodes it contains
/// (`insertHTML(html)`), after input sanitization.
pub fn parse_fragment_nodes(schema: &Schema, html: &str) -> Vec<Node> {
    let dom = parse_raw(html);
    let mut blocks = Vec::new();
    collect_blocks(schema, &dom, &dom.document, &mut blocks);
    blocks
}

/// Parses `html` into a whole `document` node (`value (set)`). Falls back to a
/// single empty paragraph if sanitization left nothing parseable.
pub fn parse_document(schema: &Schema, html: &str) -> Node {
    let blocks = parse_fragment_nodes(schema, html);
    let blocks = if blocks.is_empty() { vec![empty_paragraph(schema)] } else { blocks };
    schema
        .node("document", Attrs::new(), blocks, vec![])
        .unwrap_or_else(|_| {
            schema
                .node("document", Attrs::new(), vec![empty_paragraph(schema)], vec![])
                .expect("a single empty paragraph always satisfies document's content expression")
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::default_schema::default_schema;

    #[test]
    fn parses_plain_paragraph() {
        let schema = default_schema();
        let doc = parse_document(&schema, "<p>hello</p>");
        assert_eq!(doc.text_content(), "hello");
        assert_eq!(doc.children()[0].node_type(), "paragraph");
    }

    #[test]
    fn parses_bold_text_into_mark() {
        let schema = default_schema();
        let doc = parse_document(&schema, "<p>hello <strong>world</strong></p>");
        let para = &doc.children()[0];
        let bold_run = para.children().iter().find(|n| n.text() == Some("world")).unwrap();
        assert!(bold_run.marks().iter().any(|m| m.mark_type == "bold"));
    }

    #[test]
    fn parses_heading_level() {
        let schema = default_schema();
        let doc = parse_document(&schema, "<h2>Title</h2>");
        let h = &doc.children()[0];
        assert_eq!(h.node_type(), "heading");
        assert_eq!(h.attrs().unwrap().get("level"), Some(&AttrValue::Int(2)));
    }

    #[test]
    fn drops_forbidden_script_element() {
        let schema = default_schema();
        let doc = parse_document(&schema, "<p>safe</p><script>alert(1)</script>");
        assert!(!doc.text_content().contains("alert"));
    }

    #[test]
    fn unknown_tag_falls_back_to_paragraph() {
        let schema = default_schema();
        let doc = parse_document(&schema, "<marquee>hi</marquee>");
        assert_eq!(doc.children()[0].node_type(), "paragraph");
        assert_eq!(doc.text_content(), "hi");
    }

    #[test]
    fn br_becomes_hard_break() {
        let schema = default_schema();
        let doc = parse_document(&schema, "<p>a<br>b</p>");
        let para = &doc.children()[0];
        assert!(para.children().iter().any(|n| n.node_type() == "hardBreak"));
    }

    #[test]
    fn empty_input_falls_back_to_empty_paragraph() {
        let schema = default_schema();
        let doc = parse_document(&schema, "");
        assert_eq!(doc.children().len(), 1);
        assert_eq!(doc.children()[0].node_type(), "paragraph");
    }
}
