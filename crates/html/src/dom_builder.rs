//! Arena-backed `TreeSink` for html5ever and conversion into the owned [`Node`] tree.
//!
//! The arena is index based: every node lives in one `Vec`, parents and children
//! refer to each other by index, and detaching a node never frees it (the
//! adoption agency algorithm re-inserts detached nodes). The `patch` backend
//! reuses the same arena for the structural queries html5ever makes.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{LocalName, QualName, local_name, ns};

use crate::backend::{BuiltTree, TreeBuilder};
use crate::diagnostics::Diagnostic;
use crate::parser::{ParseRequest, run_html5ever};
use crate::types::{Attribute, AttributeNamespace, Namespace, Node};

pub type NodeIndex = usize;

#[derive(Debug)]
pub(crate) enum ArenaData {
    Document,
    /// Template contents.
    Fragment,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element {
        name: QualName,
        attributes: Vec<Attribute>,
        template_contents: Option<NodeIndex>,
        integration_point: bool,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct ArenaNode {
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    data: ArenaData,
}

/// Result of an insertion, used by sinks that mirror mutations elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Inserted {
    Node {
        parent: NodeIndex,
        node: NodeIndex,
        before: Option<NodeIndex>,
    },
    NewText {
        parent: NodeIndex,
        node: NodeIndex,
        before: Option<NodeIndex>,
    },
    MergedText {
        node: NodeIndex,
    },
    /// The reference sibling had no parent; nothing was inserted.
    Detached,
}

#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<ArenaNode>,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn push(&mut self, data: ArenaData) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(ArenaNode {
            parent: None,
            children: Vec::new(),
            data,
        });
        index
    }

    pub(crate) fn data(&self, index: NodeIndex) -> &ArenaData {
        &self.nodes[index].data
    }

    pub(crate) fn data_mut(&mut self, index: NodeIndex) -> &mut ArenaData {
        &mut self.nodes[index].data
    }

    pub(crate) fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.nodes[index].parent
    }

    pub(crate) fn children(&self, index: NodeIndex) -> &[NodeIndex] {
        &self.nodes[index].children
    }

    pub(crate) fn is_ancestor_or_self(&self, ancestor: NodeIndex, mut node: NodeIndex) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes[node].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    pub(crate) fn detach(&mut self, child: NodeIndex) {
        let Some(parent) = self.nodes[child].parent.take() else {
            return;
        };
        self.nodes[parent].children.retain(|&c| c != child);
    }

    pub(crate) fn append(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.detach(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
    }

    /// Inserts `child` before `sibling`; returns the shared parent.
    pub(crate) fn insert_before(&mut self, sibling: NodeIndex, child: NodeIndex) -> Option<NodeIndex> {
        let parent = self.nodes[sibling].parent?;
        if child == sibling {
            return Some(parent);
        }
        self.detach(child);
        let position = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == sibling)?;
        self.nodes[parent].children.insert(position, child);
        self.nodes[child].parent = Some(parent);
        Some(parent)
    }

    fn previous_sibling(&self, node: NodeIndex) -> Option<NodeIndex> {
        let parent = self.nodes[node].parent?;
        let siblings = &self.nodes[parent].children;
        let position = siblings.iter().position(|&c| c == node)?;
        position.checked_sub(1).map(|prev| siblings[prev])
    }

    pub(crate) fn append_text(&mut self, parent: NodeIndex, text: &str) -> Inserted {
        if let Some(&last) = self.nodes[parent].children.last()
            && let ArenaData::Text(existing) = &mut self.nodes[last].data
        {
            existing.push_str(text);
            return Inserted::MergedText { node: last };
        }
        let node = self.push(ArenaData::Text(text.to_string()));
        self.append(parent, node);
        Inserted::NewText {
            parent,
            node,
            before: None,
        }
    }

    pub(crate) fn insert_text_before(&mut self, sibling: NodeIndex, text: &str) -> Inserted {
        let Some(parent) = self.nodes[sibling].parent else {
            return Inserted::Detached;
        };
        if let Some(prev) = self.previous_sibling(sibling)
            && let ArenaData::Text(existing) = &mut self.nodes[prev].data
        {
            existing.push_str(text);
            return Inserted::MergedText { node: prev };
        }
        let node = self.push(ArenaData::Text(text.to_string()));
        self.insert_before(sibling, node);
        Inserted::NewText {
            parent,
            node,
            before: Some(sibling),
        }
    }

    /// Converts the subtree at `root` into an owned [`Node`].
    ///
    /// With `namespace_html_elements == false`, HTML elements come out with no
    /// namespace, the way a non-namespacing parser would have created them.
    pub(crate) fn into_node(mut self, root: NodeIndex, namespace_html_elements: bool) -> Node {
        let mut built_nodes: Vec<Node> = Vec::with_capacity(self.nodes.len());

        fn take_children(n: usize, built: &mut Vec<Node>) -> Vec<Node> {
            let start = built.len() - n;
            built.split_off(start)
        }

        // Iterative postorder traversal, as deep documents must not overflow the
        // stack. An element's template contents are visited before its children so
        // that, once the element is built, its children are the last `child_count`
        // entries of `built_nodes` and the template contents sit right below them.
        let mut stack: Vec<(NodeIndex, bool)> = vec![(root, false)];

        while let Some((index, visited)) = stack.pop() {
            if !visited {
                stack.push((index, true));
                for &child in self.nodes[index].children.iter().rev() {
                    stack.push((child, false));
                }
                if let ArenaData::Element {
                    template_contents: Some(contents),
                    ..
                } = self.nodes[index].data
                {
                    stack.push((contents, false));
                }
                continue;
            }

            let child_count = self.nodes[index].children.len();
            let node = match &mut self.nodes[index].data {
                ArenaData::Document => Node::Document {
                    children: take_children(child_count, &mut built_nodes),
                },
                ArenaData::Fragment => Node::Fragment {
                    children: take_children(child_count, &mut built_nodes),
                },
                ArenaData::Doctype {
                    name,
                    public_id,
                    system_id,
                } => Node::Doctype {
                    name: std::mem::take(name),
                    public_id: std::mem::take(public_id),
                    system_id: std::mem::take(system_id),
                },
                ArenaData::Element {
                    name,
                    attributes,
                    template_contents,
                    ..
                } => {
                    let children = take_children(child_count, &mut built_nodes);
                    let template_contents = match template_contents {
                        Some(_) => match built_nodes.pop() {
                            Some(Node::Fragment { children }) => Some(children),
                            other => {
                                debug_assert!(false, "template contents built as {other:?}");
                                Some(Vec::new())
                            }
                        },
                        None => None,
                    };
                    let namespace = match Namespace::from_url(&name.ns) {
                        Some(Namespace::Html) if !namespace_html_elements => None,
                        other => other,
                    };
                    Node::Element {
                        name: name.local.to_string(),
                        namespace,
                        attributes: std::mem::take(attributes),
                        template_contents,
                        children,
                    }
                }
                ArenaData::Text(text) => Node::Text {
                    text: std::mem::take(text),
                },
                ArenaData::Comment(text) => Node::Comment {
                    text: std::mem::take(text),
                },
            };
            built_nodes.push(node);
        }

        debug_assert_eq!(
            built_nodes.len(),
            1,
            "arena conversion should build exactly one root node"
        );
        built_nodes.pop().unwrap_or(Node::Fragment {
            children: Vec::new(),
        })
    }
}

/// Re-roots a fragment parse: html5ever parses fragments under a synthetic
/// `<html>` element, whose children are the fragment's top-level nodes.
pub(crate) fn fragment_from_document(document: Node) -> Node {
    let Node::Document { children } = document else {
        return document;
    };
    let root = children
        .into_iter()
        .find(|node| matches!(node, Node::Element { .. }));
    match root {
        Some(Node::Element { children, .. }) => Node::Fragment { children },
        _ => Node::Fragment {
            children: Vec::new(),
        },
    }
}

pub(crate) fn convert_attribute(attribute: html5ever::Attribute) -> Attribute {
    Attribute {
        namespace: AttributeNamespace::from_url(&attribute.name.ns),
        name: attribute.name.local.to_string(),
        value: attribute.value.to_string(),
    }
}

pub(crate) fn qual_name(namespace: Namespace, local: &str) -> QualName {
    let ns = match namespace {
        Namespace::Html => ns!(html),
        Namespace::Svg => ns!(svg),
        Namespace::MathMl => ns!(mathml),
    };
    QualName::new(None, ns, LocalName::from(local))
}

/// Owned element name handed back to the tree builder.
#[derive(Debug, Clone)]
pub struct ElementName(QualName);

impl ElemName for ElementName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// Output of [`ArenaSink`] once html5ever is done with it.
pub struct ArenaOutput {
    pub(crate) arena: NodeArena,
    pub(crate) document: NodeIndex,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl ArenaOutput {
    pub(crate) fn into_document(self, fragment: bool, namespace_html_elements: bool) -> Node {
        let document = self.arena.into_node(self.document, namespace_html_elements);
        if fragment {
            fragment_from_document(document)
        } else {
            document
        }
    }
}

pub struct ArenaSink {
    arena: RefCell<NodeArena>,
    document: NodeIndex,
    line: Cell<u64>,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Default for ArenaSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaSink {
    pub fn new() -> Self {
        let mut arena = NodeArena::new();
        let document = arena.push(ArenaData::Document);
        Self {
            arena: RefCell::new(arena),
            document,
            line: Cell::new(1),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn document_index(&self) -> NodeIndex {
        self.document
    }

    pub(crate) fn with_arena<R>(&self, f: impl FnOnce(&NodeArena) -> R) -> R {
        f(&self.arena.borrow())
    }

    pub(crate) fn into_output(self) -> ArenaOutput {
        ArenaOutput {
            arena: self.arena.into_inner(),
            document: self.document,
            diagnostics: self.diagnostics.into_inner(),
        }
    }

    /// Creates an element; returns its index and the index of its template
    /// contents when the element is a `<template>`.
    pub(crate) fn create_element_node(
        &self,
        name: QualName,
        attributes: Vec<Attribute>,
        flags: &ElementFlags,
    ) -> (NodeIndex, Option<NodeIndex>) {
        let mut arena = self.arena.borrow_mut();
        let template_contents = flags.template.then(|| arena.push(ArenaData::Fragment));
        let node = arena.push(ArenaData::Element {
            name,
            attributes,
            template_contents,
            integration_point: flags.mathml_annotation_xml_integration_point,
        });
        log::trace!(target: "html.dom_builder", "create element #{node}");
        (node, template_contents)
    }

    pub(crate) fn create_leaf(&self, data: ArenaData) -> NodeIndex {
        self.arena.borrow_mut().push(data)
    }

    pub(crate) fn append_child(&self, parent: NodeIndex, child: NodeOrText<NodeIndex>) -> Inserted {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                arena.append(parent, node);
                Inserted::Node {
                    parent,
                    node,
                    before: None,
                }
            }
            NodeOrText::AppendText(text) => arena.append_text(parent, &text),
        }
    }

    pub(crate) fn insert_before_sibling(
        &self,
        sibling: NodeIndex,
        child: NodeOrText<NodeIndex>,
    ) -> Inserted {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => match arena.insert_before(sibling, node) {
                Some(parent) => Inserted::Node {
                    parent,
                    node,
                    before: Some(sibling),
                },
                None => Inserted::Detached,
            },
            NodeOrText::AppendText(text) => arena.insert_text_before(sibling, &text),
        }
    }

    pub(crate) fn has_parent(&self, node: NodeIndex) -> bool {
        self.arena.borrow().parent(node).is_some()
    }

    /// Adds the attributes `target` does not carry yet; returns whether any was added.
    pub(crate) fn add_missing_attributes(&self, target: NodeIndex, attrs: Vec<Attribute>) -> bool {
        let mut arena = self.arena.borrow_mut();
        let ArenaData::Element { attributes, .. } = arena.data_mut(target) else {
            return false;
        };
        let mut added = false;
        for attr in attrs {
            let present = attributes
                .iter()
                .any(|existing| existing.namespace == attr.namespace && existing.name == attr.name);
            if !present {
                attributes.push(attr);
                added = true;
            }
        }
        added
    }

    pub(crate) fn move_children(&self, node: NodeIndex, new_parent: NodeIndex) -> Vec<NodeIndex> {
        let mut arena = self.arena.borrow_mut();
        let children = arena.children(node).to_vec();
        for &child in &children {
            arena.append(new_parent, child);
        }
        children
    }

    pub(crate) fn detach_node(&self, target: NodeIndex) -> bool {
        let mut arena = self.arena.borrow_mut();
        let attached = arena.parent(target).is_some();
        arena.detach(target);
        attached
    }

    pub(crate) fn template_contents_of(&self, target: NodeIndex) -> NodeIndex {
        let mut arena = self.arena.borrow_mut();
        if let ArenaData::Element {
            template_contents: Some(contents),
            ..
        } = arena.data(target)
        {
            return *contents;
        }
        let contents = arena.push(ArenaData::Fragment);
        if let ArenaData::Element {
            template_contents, ..
        } = arena.data_mut(target)
        {
            *template_contents = Some(contents);
        }
        contents
    }

    pub(crate) fn record_error(&self, msg: Cow<'static, str>) {
        let line = self.line.get();
        log::trace!(target: "html.dom_builder", "parse error line={line}: {msg}");
        self.diagnostics
            .borrow_mut()
            .push(Diagnostic::new(line, 0, msg.into_owned()));
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeIndex;
    type Output = ArenaOutput;
    type ElemName<'a>
        = ElementName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.into_output()
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.record_error(msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> ElementName {
        match self.arena.borrow().data(*target) {
            ArenaData::Element { name, .. } => ElementName(name.clone()),
            _ => ElementName(QualName::new(None, ns!(html), local_name!(""))),
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle {
        let attributes = attrs.into_iter().map(convert_attribute).collect();
        self.create_element_node(name, attributes, &flags).0
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.create_leaf(ArenaData::Comment(text.to_string()))
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        self.create_leaf(ArenaData::Comment(format!("?{target} {data}")))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.append_child(*parent, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if self.has_parent(*element) {
            self.insert_before_sibling(*element, child);
        } else {
            self.append_child(*prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let doctype = self.create_leaf(ArenaData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
        self.arena.borrow_mut().append(self.document, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        self.template_contents_of(*target)
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        self.insert_before_sibling(*sibling, new_node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        let attrs = attrs.into_iter().map(convert_attribute).collect();
        self.add_missing_attributes(*target, attrs);
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.detach_node(*target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        self.move_children(*node, *new_parent);
    }

    fn is_mathml_annotation_xml_integration_point(&self, handle: &Self::Handle) -> bool {
        matches!(
            self.arena.borrow().data(*handle),
            ArenaData::Element {
                integration_point: true,
                ..
            }
        )
    }

    fn set_current_line(&self, line_number: u64) {
        self.line.set(line_number);
    }
}

/// The `dom` backend: html5ever into [`ArenaSink`], converted to an owned tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct DomTreeBuilder;

impl TreeBuilder for DomTreeBuilder {
    fn build(&self, request: &ParseRequest<'_>) -> BuiltTree {
        let output = run_html5ever(ArenaSink::new(), request);
        let diagnostics = output.diagnostics.clone();
        let document = output.into_document(
            request.context.is_some(),
            request.config.namespace_html_elements,
        );
        BuiltTree {
            document,
            diagnostics,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{FragmentContext, ParserConfig};

    fn build(input: &str) -> Node {
        let request = ParseRequest {
            input,
            context: None,
            config: ParserConfig::default(),
        };
        DomTreeBuilder.build(&request).document
    }

    fn find_element<'a>(node: &'a Node, wanted: &str) -> Option<&'a Node> {
        if let Node::Element { name, .. } = node
            && name == wanted
        {
            return Some(node);
        }
        node.children()
            .iter()
            .find_map(|child| find_element(child, wanted))
    }

    #[test]
    fn builds_implied_document_structure() {
        let dom = build("<p>One<p>Two");
        let Node::Document { children } = &dom else {
            panic!("expected document root, got {dom:?}");
        };
        assert_eq!(children.len(), 1);
        let body = find_element(&dom, "body").expect("body element");
        let paragraphs: Vec<_> = body.children().iter().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].children(), &[Node::text("One")]);
        assert_eq!(paragraphs[1].children(), &[Node::text("Two")]);
    }

    #[test]
    fn coalesces_adjacent_text() {
        let dom = build("<div>a&amp;b</div>");
        let div = find_element(&dom, "div").expect("div element");
        assert_eq!(div.children(), &[Node::text("a&b")]);
    }

    #[test]
    fn template_contents_are_kept_apart_from_children() {
        let dom = build("<template><b>x</b></template>");
        let Some(Node::Element {
            template_contents,
            children,
            ..
        }) = find_element(&dom, "template")
        else {
            panic!("template element missing");
        };
        assert!(children.is_empty());
        let contents = template_contents.as_ref().expect("template contents");
        assert_eq!(contents.len(), 1);
        assert!(matches!(&contents[0], Node::Element { name, .. } if name == "b"));
    }

    #[test]
    fn namespace_flag_controls_html_namespace_only() {
        let request = ParseRequest {
            input: "<svg><g/></svg>",
            context: None,
            config: ParserConfig {
                namespace_html_elements: false,
                ..ParserConfig::default()
            },
        };
        let dom = DomTreeBuilder.build(&request).document;
        assert!(matches!(
            find_element(&dom, "body"),
            Some(Node::Element { namespace: None, .. })
        ));
        assert!(matches!(
            find_element(&dom, "g"),
            Some(Node::Element {
                namespace: Some(Namespace::Svg),
                ..
            })
        ));
    }

    #[test]
    fn fragment_parse_returns_context_children() {
        let context = FragmentContext::html("div");
        let request = ParseRequest {
            input: "<b>x</b>y",
            context: Some(&context),
            config: ParserConfig::default(),
        };
        let document = DomTreeBuilder.build(&request).document;
        let Node::Fragment { children } = document else {
            panic!("expected fragment root");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[1], Node::text("y"));
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let request = ParseRequest {
            input: "\n\n</p>",
            context: None,
            config: ParserConfig::default(),
        };
        let built = DomTreeBuilder.build(&request);
        assert!(!built.diagnostics.is_empty());
        assert!(built.diagnostics.iter().all(|d| d.vars_are_mapping()));
        assert!(built.diagnostics.iter().any(|d| d.position.line == 3));
    }

    #[test]
    fn arena_conversion_handles_deep_nesting() {
        let depth: usize = 2_000;
        let mut arena = NodeArena::new();
        let root = arena.push(ArenaData::Document);
        let mut parent = root;
        for _ in 0..depth {
            let div = arena.push(ArenaData::Element {
                name: qual_name(Namespace::Html, "div"),
                attributes: Vec::new(),
                template_contents: None,
                integration_point: false,
            });
            arena.append(parent, div);
            parent = div;
        }

        let dom = arena.into_node(root, true);
        let mut current = &dom;
        let mut seen = 0usize;
        while let Some(child) = current.children().first() {
            seen += 1;
            current = child;
        }
        assert_eq!(seen, depth);
    }

    #[test]
    fn insert_before_moves_attached_nodes() {
        let mut arena = NodeArena::new();
        let root = arena.push(ArenaData::Document);
        let a = arena.push(ArenaData::Comment("a".to_string()));
        let b = arena.push(ArenaData::Comment("b".to_string()));
        arena.append(root, a);
        arena.append(root, b);
        assert_eq!(arena.insert_before(a, b), Some(root));
        assert_eq!(arena.children(root), &[b, a]);
        assert!(arena.is_ancestor_or_self(root, b));
    }
}
