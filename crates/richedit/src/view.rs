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

//! The model→DOM view and model position ↔ screen coordinate mapping. [`View`]
//! renders an [`crate::model::node::Node`] tree by expanding each node's schema
//! `toDOM` spec, keeps a parallel [`ViewDesc`] tree mirroring the document so
//! every mounted DOM node can be traced back to the model position it renders,
//! and incrementally diffs/patches that tree against a new document on every
//! [`View::update_state`]. A document [`Node`] is a plain value with no stable
//! identity across edits, unlike a ProseMirror DOM node's backing JS object.
//! Where its diff/patch algorithm says "same reference: skip", this view treats
//! *structurally equal* subtrees as equivalent and skips them — an adaptation
//! forced by Rust's value semantics, not a behavior change (see `DESIGN.md`).

use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Node as DomNode, Range, Text as DomText};

use crate::model::mark::marks_outermost_first;
use crate::model::node::Node;
use crate::schema::dom_spec::DomSpec;
use crate::schema::Schema;
use crate::state::EditorState;

/// A pixel rectangle in the viewport coordinate system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Client coordinates, as delivered by a mouse/touch event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClientPoint {
    pub left: f64,
    pub top: f64,
}

/// Reflected property name used to tag every mounted DOM node with the
/// absolute model position it starts at (ProseMirror tags DOM nodes
/// with a `pmViewDesc` object; this engine tags with the bare integer
/// since that's all `posAtCoords` needs back).
const POS_PROP: &str = "__richeditPos";

fn tag_pos(dom: &DomNode, pos: usize) {
    let _ = Reflect::set(dom, &JsValue::from_str(POS_PROP), &JsValue::from_f64(pos as f64));
}

fn read_pos(dom: &DomNode) -> Option<usize> {
    Reflect::get(dom, &JsValue::from_str(POS_PROP))
        .ok()
        .and_then(|v| v.as_f64())
        .map(|f| f as usize)
}

/// One node of the parallel view-descriptor tree: the model snapshot
/// that produced `mount`, the mounted DOM node, and (for containers)
/// child descriptors in the same order as `node.children()`.
struct ViewDesc {
    node: Node,
    mount: DomNode,
    /// For a text node, the innermost `Text` DOM node carrying its
    /// characters (distinct from `mount` when the text is wrapped in
    /// mark elements).
    text_dom: Option<DomText>,
    pos: usize,
    children: Vec<ViewDesc>,
}

impl ViewDesc {
    fn size(&self) -> usize {
        self.node.node_size()
    }
}

/// Renders one model node into a fresh DOM subtree, tagging every
/// mounted node with its absolute position, and returns the descriptor.
fn mount_node(document: &Document, schema: &Schema, node: &Node, pos: usize) -> ViewDesc {
    match node {
        Node::Text(_) => {
            let text_dom = document.create_text_node(node.text().unwrap_or_default());
            tag_pos(text_dom.as_ref(), pos);
            let wrapped: DomNode = marks_outermost_first(node.marks())
                .into_iter()
                .rev()
                .fold(text_dom.clone().unchecked_into::<DomNode>(), |inner, mark| {
                    match schema.mark_spec(&mark.mark_type) {
                        Some(spec) => mount_dom_spec(document, &(spec.to_dom)(mark), &inner)
                            .unchecked_into::<DomNode>(),
                        None => inner,
                    }
                });
            ViewDesc {
                node: node.clone(),
                mount: wrapped,
                text_dom: Some(text_dom),
                pos,
                children: Vec::new(),
            }
        }
        Node::Leaf(l) => {
            let Some(spec) = schema.node_spec(&l.node_type) else {
                let placeholder = document.create_comment("unknown leaf");
                return ViewDesc { node: node.clone(), mount: placeholder.into(), text_dom: None, pos, children: Vec::new() };
            };
            let fragment = document.create_document_fragment();
            let elem = mount_dom_spec(document, &(spec.to_dom)(node), fragment.unchecked_ref::<DomNode>());
            tag_pos(&elem, pos);
            ViewDesc { node: node.clone(), mount: elem, text_dom: None, pos, children: Vec::new() }
        }
        Node::Container(c) => {
            let Some(spec) = schema.node_spec(&c.node_type) else {
                let placeholder = document.create_comment("unknown node");
                return ViewDesc { node: node.clone(), mount: placeholder.into(), text_dom: None, pos, children: Vec::new() };
            };
            let hole = find_content_hole(document, &(spec.to_dom)(node));
            let mut children = Vec::with_capacity(c.children.len());
            let mut child_pos = pos + 1;
            for child in &c.children {
                let child_desc = mount_node(document, schema, child, child_pos);
                hole.append_child(&child_desc.mount).ok();
                child_pos += child_desc.size();
            }
            let root_elem = hole
                .ancestor_root_element()
                .unwrap_or_else(|| hole.clone());
            tag_pos(&root_elem, pos);
            tag_pos(&root_elem, pos); // content-start tag overwritten below
            Reflect::set(&root_elem, &JsValue::from_str("__richeditEnd"), &JsValue::from_f64((pos + node.node_size()) as f64)).ok();
            ViewDesc { node: node.clone(), mount: root_elem, text_dom: None, pos, children }
        }
    }
}

/// A thin helper trait used only to find the element a content hole's ancestor
/// chain bottoms out at, since `mount_dom_spec` returns the innermost hole
/// element rather than the root.
trait AncestorRoot {
    fn ancestor_root_element(&self) -> Option<Element>;
}

impl AncestorRoot for Element {
    fn ancestor_root_element(&self) -> Option<Element> {
        let mut cur = self.clone();
        while let Some(parent) = cur.parent_element() {
            cur = parent;
        }
        Some(cur)
    }
}

/// Expands a `toDOM` spec into live DOM elements, attaching `content` wherever
/// its `0` hole marker appears, and returns the innermost element that is (or
/// contains) the hole — the node this node's own children should be appended
/// into.
fn mount_dom_spec(document: &Document, spec: &DomSpec, content: &DomNode) -> Element {
    match spec {
        DomSpec::Hole => content
            .clone()
            .dyn_into::<Element>()
            .unwrap_or_else(|_| document.create_element("span").unwrap()),
        DomSpec::Element { tag, attrs, children } => {
            let elem = document.create_element(tag).unwrap_or_else(|_| document.create_element("span").unwrap());
            for (k, v) in attrs {
                let _ = elem.set_attribute(k, v);
            }
            let mut hole = elem.clone();
            for child_spec in children {
                match child_spec {
                    DomSpec::Hole => {
                        elem.append_child(content).ok();
                        hole = elem.clone();
                    }
                    other => {
                        let child_elem = mount_dom_spec(document, other, content);
                        if !elem.contains(Some(child_elem.as_ref())) {
                            elem.append_child(&child_elem).ok();
                        }
                        hole = child_elem;
                    }
                }
            }
            hole
        }
    }
}

/// Finds the hole element a container node's own children should be
/// mounted into, building the wrapper chain above it but leaving the
/// hole itself empty (unlike [`mount_dom_spec`], which is also used for
/// leaf/mark specs that have no further children to attach).
fn find_content_hole(document: &Document, spec: &DomSpec) -> Element {
    let empty = document.create_document_fragment();
    mount_dom_spec(document, spec, empty.unchecked_ref::<DomNode>())
}

/// The model→DOM renderer: owns the container's rendered subtree and the
/// view-descriptor tree used for diff/patch and position↔coordinate mapping.
pub struct View {
    document: Document,
    container: Element,
    schema: Schema,
    children: Vec<ViewDesc>,
}

impl View {
    /// `new(container, state, schema)`: performs the initial render into
    /// `container`.
    pub fn new(container: Element, state: &EditorState, schema: Schema) -> Self {
        let document = container.owner_document().expect("element attached to a document");
        container.set_inner_html("");
        let mut children = Vec::new();
        let mut pos = 0usize;
        for child in state.doc().children() {
            let desc = mount_node(&document, &schema, child, pos);
            container.append_child(&desc.mount).ok();
            pos += desc.size();
        }
        View { document, container, schema, children }
    }

    /// `updateState(newState)`: diffs the old and new docs and patches the live
    /// DOM incrementally.
    pub fn update_state(&mut self, new_state: &EditorState) {
        let new_children: Vec<Node> = new_state.doc().children().to_vec();
        self.children = diff_patch_children(
            &self.document,
            &self.schema,
            &self.container,
            std::mem::take(&mut self.children),
            &new_children,
            0,
        );
    }

    /// `coordsAtPos(pos)`: the pixel rectangle for `pos`, or `None` if it is
    /// not rendered.
    pub fn coords_at_pos(&self, pos: usize) -> Option<Rect> {
        let (dom, offset) = dom_at_pos(&self.children, 0, pos)?;
        let range: Range = self.document.create_range().ok()?;
        range.set_start(&dom, offset).ok()?;
        range.set_end(&dom, offset).ok()?;
        let rect = range.get_bounding_client_rect();
        if rect.width() == 0.0 && rect.height() == 0.0 {
            let fallback = dom
                .dyn_ref::<Element>()
                .cloned()
                .or_else(|| dom.parent_element())?;
            let r = fallback.get_bounding_client_rect();
            return Some(Rect { left: r.left(), top: r.top(), bottom: r.bottom() });
        }
        Some(Rect { left: rect.left(), top: rect.top(), bottom: rect.bottom() })
    }

    /// `posAtCoords({left, top})`: resolves client coordinates to a model
    /// position using the platform's caret-from-point primitive.
    pub fn pos_at_coords(&self, point: ClientPoint) -> Option<usize> {
        let range = self.document.caret_range_from_point(point.left as f32, point.top as f32)?;
        let container: DomNode = range.start_container().ok()?;
        let offset = range.start_offset().ok()? as usize;

        if container.node_type() == DomNode::TEXT_NODE {
            return read_pos(&container).map(|p| p + offset);
        }

        let children = container.child_nodes();
        if (offset as u32) < children.length() {
            if let Some(child) = children.item(offset as u32) {
                if let Some(p) = read_pos(&child) {
                    return Some(p);
                }
            }
        }
        // Past the last child (or an empty container): use the
        // container's own registered content-end position.
        Reflect::get(&container, &JsValue::from_str("__richeditEnd"))
            .ok()
            .and_then(|v| v.as_f64())
            .map(|f| (f as usize).saturating_sub(1))
            .or_else(|| read_pos(&container))
    }

    /// The cached DOM node for a model node, found by structural equality in
    /// the descriptor tree.
    pub fn node_dom(&self, node: &Node) -> Option<DomNode> {
        find_dom(&self.children, node)
    }

    /// Clears the container and drops the descriptor tree.
    pub fn destroy(&mut self) {
        self.container.set_inner_html("");
        self.children.clear();
    }
}

fn find_dom(descs: &[ViewDesc], target: &Node) -> Option<DomNode> {
    for d in descs {
        if &d.node == target {
            return Some(d.mount.clone());
        }
        if let Some(found) = find_dom(&d.children, target) {
            return Some(found);
        }
    }
    None
}

/// Walks the view-descriptor tree to find the `(domNode, offset)` pair a Range
/// should be anchored at for `pos`, using the same position rule as
/// [`crate::model::position::resolve`].
fn dom_at_pos(descs: &[ViewDesc], start: usize, pos: usize) -> Option<(DomNode, u32)> {
    let mut cur = start;
    for d in descs {
        let size = d.size();
        if pos >= cur && pos <= cur + size {
            if d.node.is_text() {
                let text = d.text_dom.clone()?;
                return Some((text.into(), (pos - cur) as u32));
            }
            if d.node.is_leaf() {
                return Some((d.mount.clone(), 0));
            }
            // Container: pos == cur is the opening boundary (before
            // the first child); pos == cur + size is the closing
            // boundary (after the last child).
            if pos == cur {
                return Some((d.mount.clone(), 0));
            }
            if pos == cur + size {
                return Some((d.mount.clone(), d.children.len() as u32));
            }
            return dom_at_pos(&d.children, cur + 1, pos);
        }
        cur += size;
    }
    None
}

/// Diffs `old` against `new_nodes` and patches `parent`'s live children to
/// match, returning the refreshed descriptor list.
fn diff_patch_children(
    document: &Document,
    schema: &Schema,
    parent: &Element,
    mut old: Vec<ViewDesc>,
    new_nodes: &[Node],
    start_pos: usize,
) -> Vec<ViewDesc> {
    let mut result = Vec::with_capacity(new_nodes.len());
    let mut pos = start_pos;

    for (i, new_node) in new_nodes.iter().enumerate() {
        if i < old.len() {
            let old_desc = std::mem::replace(
                &mut old[i],
                ViewDesc { node: new_node.clone(), mount: parent.clone().into(), text_dom: None, pos, children: Vec::new() },
            );
            let patched = patch_one(document, schema, parent, old_desc, new_node, pos);
            pos += patched.size();
            result.push(patched);
        } else {
            let desc = mount_node(document, schema, new_node, pos);
            parent.append_child(&desc.mount).ok();
            pos += desc.size();
            result.push(desc);
        }
    }

    // Remove extra trailing old children.
    for extra in old.into_iter().skip(new_nodes.len()) {
        parent.remove_child(&extra.mount).ok();
    }

    result
}

fn patch_one(
    document: &Document,
    schema: &Schema,
    parent: &Element,
    old: ViewDesc,
    new_node: &Node,
    pos: usize,
) -> ViewDesc {
    // 1. Structurally equal subtrees render identically; skip (the
    //    value-type analogue of a same-reference check).
    if &old.node == new_node {
        return retag(old, pos);
    }

    // 2. Different node type: replace wholesale.
    if old.node.node_type() != new_node.node_type() || old.node.is_text() != new_node.is_text() {
        let fresh = mount_node(document, schema, new_node, pos);
        parent.replace_child(&fresh.mount, &old.mount).ok();
        return fresh;
    }

    // 3. Same type, text node.
    if let (Node::Text(_), Node::Text(new_text)) = (&old.node, new_node) {
        if old.node.marks() == new_node.marks() {
            // Marks equal, text differs: mutate in place.
            if let Some(text_dom) = &old.text_dom {
                text_dom.set_data(&new_text.text);
            }
            tag_pos(old.text_dom.as_ref().map(|t| t.as_ref()).unwrap_or(&old.mount), pos);
            return ViewDesc { node: new_node.clone(), mount: old.mount, text_dom: old.text_dom, pos, children: Vec::new() };
        }
        // Marks differ: full replace.
        let fresh = mount_node(document, schema, new_node, pos);
        parent.replace_child(&fresh.mount, &old.mount).ok();
        return fresh;
    }

    // 4. Same type, non-text (leaf or container).
    if old.node.attrs() != new_node.attrs() {
        let fresh = mount_node(document, schema, new_node, pos);
        parent.replace_child(&fresh.mount, &old.mount).ok();
        return fresh;
    }

    if new_node.is_leaf() {
        tag_pos(&old.mount, pos);
        return ViewDesc { node: new_node.clone(), mount: old.mount, text_dom: None, pos, children: Vec::new() };
    }

    // Container with matching type/attrs: reuse the element, recurse.
    let hole = content_hole_of(&old.mount);
    let new_children = diff_patch_children(document, schema, &hole, old.children, new_node.children(), pos + 1);
    tag_pos(&old.mount, pos);
    Reflect::set(&old.mount, &JsValue::from_str("__richeditEnd"), &JsValue::from_f64((pos + new_node.node_size()) as f64)).ok();
    ViewDesc { node: new_node.clone(), mount: old.mount, text_dom: None, pos, children: new_children }
}

fn retag(desc: ViewDesc, pos: usize) -> ViewDesc {
    tag_pos(desc.text_dom.as_ref().map(|t| t.as_ref()).unwrap_or(&desc.mount), pos);
    if desc.node.is_container() {
        Reflect::set(&desc.mount, &JsValue::from_str("__richeditEnd"), &JsValue::from_f64((pos + desc.node.node_size()) as f64)).ok();
    }
    ViewDesc { pos, ..desc }
}

/// The element a reused container's children live directly under —
/// since `toDOM` specs nest content under a fixed wrapper chain, this
/// is just the mount element itself for every node type in the default
/// schema (none nest the hole under a second static wrapper of its
/// own), save for `table`, whose hole is the `<tbody>`.
fn content_hole_of(mount: &DomNode) -> Element {
    let elem = mount.clone().dyn_into::<Element>().expect("container mount is always an element");
    if elem.tag_name().eq_ignore_ascii_case("table") {
        if let Some(tbody) = elem.query_selector("tbody").ok().flatten() {
            return tbody;
        }
    }
    elem
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_test {
    use super::*;
    use crate::schema::default_schema::default_schema;
    use crate::state::{ContentInit, EditorState};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fresh_container() -> Element {
        let document = web_sys::window().unwrap().document().unwrap();
        let el = document.create_element("div").unwrap();
        document.body().unwrap().append_child(&el).unwrap();
        el
    }

    #[wasm_bindgen_test]
    fn renders_a_paragraph_of_text() {
        let container = fresh_container();
        let state = EditorState::create(default_schema(), Some(ContentInit::Text("hello".into())), None).unwrap();
        let view = View::new(container.clone(), &state, default_schema());
        assert_eq!(container.inner_html(), "<p>hello</p>");
        drop(view);
    }

    #[wasm_bindgen_test]
    fn update_state_mutates_text_in_place() {
        let container = fresh_container();
        let state = EditorState::create(default_schema(), Some(ContentInit::Text("hello".into())), None).unwrap();
        let mut view = View::new(container.clone(), &state, default_schema());
        let mut tr = state.transaction();
        tr.insert_text(6, "!", vec![]).unwrap();
        let outcome = state.apply(tr).unwrap();
        view.update_state(&outcome.state);
        assert_eq!(container.inner_html(), "<p>hello!</p>");
    }

    #[wasm_bindgen_test]
    fn coords_at_pos_returns_a_rect_inside_text() {
        let container = fresh_container();
        let state = EditorState::create(default_schema(), Some(ContentInit::Text("hello".into())), None).unwrap();
        let view = View::new(container, &state, default_schema());
        assert!(view.coords_at_pos(3).is_some());
    }

    #[wasm_bindgen_test]
    fn destroy_clears_the_container() {
        let container = fresh_container();
        let state = EditorState::create(default_schema(), Some(ContentInit::Text("hi".into())), None).unwrap();
        let mut view = View::new(container.clone(), &state, default_schema());
        view.destroy();
        assert_eq!(container.inner_html(), "");
    }
}
