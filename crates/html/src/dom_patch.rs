//! DOM patch protocol and the `patch` tree backend.
//!
//! The patch sink records every tree mutation html5ever performs as a
//! [`DomPatch`]; the tree handed to the caller is rebuilt from that stream by
//! [`materialize`], so anything the protocol cannot express is lost.
//!
//! Invariants:
//! - Patches are applied in order.
//! - References must point to existing keys at the time they are used (except
//!   the `key` in create operations).
//! - Child ordering is explicit and deterministic.
//! - The first patch of a stream is `CreateDocument`.
//! - Element and attribute names are canonical ASCII-lowercase. Names that are
//!   not are lowercased on record and reported as data loss.
//! - All `PatchKey` values used in patches must be non-zero (`PatchKey::INVALID`
//!   is never valid in a patch stream).
//! - Attribute order and duplicates are preserved; appliers must not dedupe.
//! - Operations must not create cycles; a node may have at most one parent.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::QualName;

use crate::backend::{BuiltTree, TreeBuilder};
use crate::diagnostics::ParseWarning;
use crate::dom_builder::{
    ArenaData, ArenaOutput, ArenaSink, ElementName, Inserted, NodeArena, NodeIndex,
    convert_attribute, fragment_from_document, qual_name,
};
use crate::parser::{ParseRequest, run_html5ever};
use crate::types::{Attribute, Namespace, Node};

/// Opaque patch-layer key for stable node identity within a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchKey(pub u32);

impl PatchKey {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: PatchKey = PatchKey(0);

    fn from_index(index: NodeIndex) -> Self {
        PatchKey(u32::try_from(index + 1).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for PatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tree mutation recorded by [`PatchSink`].
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomPatch {
    /// Create the document root node.
    CreateDocument { key: PatchKey },
    CreateDoctype {
        key: PatchKey,
        name: String,
        public_id: String,
        system_id: String,
    },
    /// Create an element node with initial attributes.
    CreateElement {
        key: PatchKey,
        name: Arc<str>,
        namespace: Namespace,
        attributes: Vec<Attribute>,
    },
    /// Create the contents fragment of a `<template>` element.
    CreateTemplateContents { key: PatchKey, template: PatchKey },
    /// Create a text node.
    CreateText { key: PatchKey, text: String },
    /// Create a comment node.
    CreateComment { key: PatchKey, text: String },
    /// Append a child to the end of a parent's children list, detaching it
    /// from its current parent first.
    AppendChild { parent: PatchKey, child: PatchKey },
    /// Insert a child before an existing sibling.
    InsertBefore {
        parent: PatchKey,
        child: PatchKey,
        before: PatchKey,
    },
    /// Detach a node from its parent. The node and its subtree stay valid and
    /// may be inserted again.
    DetachNode { key: PatchKey },
    /// Replace all attributes on an element node.
    ///
    /// Applying this to a non-element node is a deterministic error.
    SetAttributes {
        key: PatchKey,
        attributes: Vec<Attribute>,
    },
    /// Replace the text content of a text node.
    ///
    /// Applying this to a non-text node is a deterministic error.
    SetText { key: PatchKey, text: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchError {
    EmptyStream,
    MissingDocument,
    InvalidKey(PatchKey),
    DuplicateKey(PatchKey),
    UnknownKey(PatchKey),
    NotAnElement(PatchKey),
    NotAText(PatchKey),
    NotATemplate(PatchKey),
    NotAContainer(PatchKey),
    NotAChild { parent: PatchKey, child: PatchKey },
    Cycle { parent: PatchKey, child: PatchKey },
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::EmptyStream => write!(f, "empty patch stream"),
            PatchError::MissingDocument => write!(f, "patch stream does not start with CreateDocument"),
            PatchError::InvalidKey(key) => write!(f, "invalid patch key {key}"),
            PatchError::DuplicateKey(key) => write!(f, "patch key {key} created twice"),
            PatchError::UnknownKey(key) => write!(f, "unknown patch key {key}"),
            PatchError::NotAnElement(key) => write!(f, "{key} is not an element"),
            PatchError::NotAText(key) => write!(f, "{key} is not a text node"),
            PatchError::NotATemplate(key) => write!(f, "{key} is not a template element"),
            PatchError::NotAContainer(key) => write!(f, "{key} cannot have children"),
            PatchError::NotAChild { parent, child } => {
                write!(f, "{child} is not a child of {parent}")
            }
            PatchError::Cycle { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
        }
    }
}

impl std::error::Error for PatchError {}

fn is_canonical(name: &str) -> bool {
    name.bytes()
        .all(|b| b.is_ascii() && !b.is_ascii_uppercase())
}

/// Records tree mutations as patches on top of the arena sink, which still
/// answers html5ever's structural queries.
pub struct PatchSink {
    inner: ArenaSink,
    patches: RefCell<Vec<DomPatch>>,
    warnings: RefCell<Vec<ParseWarning>>,
}

pub struct PatchOutput {
    pub patches: Vec<DomPatch>,
    pub warnings: Vec<ParseWarning>,
    pub(crate) arena: ArenaOutput,
}

impl Default for PatchSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchSink {
    pub fn new() -> Self {
        let inner = ArenaSink::new();
        let document = PatchKey::from_index(inner.document_index());
        Self {
            inner,
            patches: RefCell::new(vec![DomPatch::CreateDocument { key: document }]),
            warnings: RefCell::new(Vec::new()),
        }
    }

    fn emit(&self, patch: DomPatch) {
        log::trace!(target: "html.dom_patch", "{patch:?}");
        self.patches.borrow_mut().push(patch);
    }

    fn canonical_name(&self, what: &str, name: &str) -> String {
        if is_canonical(name) {
            return name.to_string();
        }
        let lowered = name.to_lowercase();
        log::debug!(target: "html.dom_patch", "non-canonical {what} name '{name}' recorded as '{lowered}'");
        self.warnings.borrow_mut().push(ParseWarning::data_loss(format!(
            "{what} name '{name}' is not canonical lowercase"
        )));
        lowered
    }

    fn canonical_attributes(&self, attributes: &[Attribute]) -> Vec<Attribute> {
        attributes
            .iter()
            .map(|attr| Attribute {
                namespace: attr.namespace,
                name: self.canonical_name("attribute", &attr.name),
                value: attr.value.clone(),
            })
            .collect()
    }

    fn element_attributes(&self, index: NodeIndex) -> Vec<Attribute> {
        self.inner.with_arena(|arena| match arena.data(index) {
            ArenaData::Element { attributes, .. } => attributes.clone(),
            _ => Vec::new(),
        })
    }

    fn text_of(&self, index: NodeIndex) -> String {
        self.inner.with_arena(|arena| match arena.data(index) {
            ArenaData::Text(text) => text.clone(),
            _ => String::new(),
        })
    }

    fn record_insert(&self, inserted: Inserted) {
        match inserted {
            Inserted::Node {
                parent,
                node,
                before,
            } => self.emit_link(parent, node, before),
            Inserted::NewText {
                parent,
                node,
                before,
            } => {
                self.emit(DomPatch::CreateText {
                    key: PatchKey::from_index(node),
                    text: self.text_of(node),
                });
                self.emit_link(parent, node, before);
            }
            Inserted::MergedText { node } => self.emit(DomPatch::SetText {
                key: PatchKey::from_index(node),
                text: self.text_of(node),
            }),
            Inserted::Detached => {}
        }
    }

    fn emit_link(&self, parent: NodeIndex, child: NodeIndex, before: Option<NodeIndex>) {
        let parent = PatchKey::from_index(parent);
        let child = PatchKey::from_index(child);
        match before {
            Some(before) => self.emit(DomPatch::InsertBefore {
                parent,
                child,
                before: PatchKey::from_index(before),
            }),
            None => self.emit(DomPatch::AppendChild { parent, child }),
        }
    }
}

impl TreeSink for PatchSink {
    type Handle = NodeIndex;
    type Output = PatchOutput;
    type ElemName<'a>
        = ElementName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        PatchOutput {
            patches: self.patches.into_inner(),
            warnings: self.warnings.into_inner(),
            arena: self.inner.into_output(),
        }
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.inner.record_error(msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.inner.get_document()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> ElementName {
        self.inner.elem_name(target)
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle {
        let attributes: Vec<Attribute> = attrs.into_iter().map(convert_attribute).collect();
        let namespace = Namespace::from_url(&name.ns).unwrap_or(Namespace::Html);
        let recorded_name = self.canonical_name("element", &name.local);
        let recorded_attributes = self.canonical_attributes(&attributes);

        let (node, contents) = self.inner.create_element_node(name, attributes, &flags);
        let key = PatchKey::from_index(node);
        self.emit(DomPatch::CreateElement {
            key,
            name: Arc::from(recorded_name),
            namespace,
            attributes: recorded_attributes,
        });
        if let Some(contents) = contents {
            self.emit(DomPatch::CreateTemplateContents {
                key: PatchKey::from_index(contents),
                template: key,
            });
        }
        node
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        let node = self.inner.create_leaf(ArenaData::Comment(text.to_string()));
        self.emit(DomPatch::CreateComment {
            key: PatchKey::from_index(node),
            text: text.to_string(),
        });
        node
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        let text = format!("?{target} {data}");
        let node = self.inner.create_leaf(ArenaData::Comment(text.clone()));
        self.emit(DomPatch::CreateComment {
            key: PatchKey::from_index(node),
            text,
        });
        node
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let inserted = self.inner.append_child(*parent, child);
        self.record_insert(inserted);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if self.inner.has_parent(*element) {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let node = self.inner.create_leaf(ArenaData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
        self.emit(DomPatch::CreateDoctype {
            key: PatchKey::from_index(node),
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
        let document = self.inner.document_index();
        let inserted = self
            .inner
            .append_child(document, NodeOrText::AppendNode(node));
        self.record_insert(inserted);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        let existing = self.inner.with_arena(|arena| match arena.data(*target) {
            ArenaData::Element {
                template_contents, ..
            } => *template_contents,
            _ => None,
        });
        let contents = self.inner.template_contents_of(*target);
        if existing.is_none() {
            self.emit(DomPatch::CreateTemplateContents {
                key: PatchKey::from_index(contents),
                template: PatchKey::from_index(*target),
            });
        }
        contents
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.inner.set_quirks_mode(mode);
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let inserted = self.inner.insert_before_sibling(*sibling, new_node);
        self.record_insert(inserted);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        let attrs = attrs.into_iter().map(convert_attribute).collect();
        if self.inner.add_missing_attributes(*target, attrs) {
            let attributes = self.element_attributes(*target);
            self.emit(DomPatch::SetAttributes {
                key: PatchKey::from_index(*target),
                attributes: self.canonical_attributes(&attributes),
            });
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        if self.inner.detach_node(*target) {
            self.emit(DomPatch::DetachNode {
                key: PatchKey::from_index(*target),
            });
        }
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        for child in self.inner.move_children(*node, *new_parent) {
            self.emit_link(*new_parent, child, None);
        }
    }

    fn is_mathml_annotation_xml_integration_point(&self, handle: &Self::Handle) -> bool {
        self.inner.is_mathml_annotation_xml_integration_point(handle)
    }

    fn set_current_line(&self, line_number: u64) {
        self.inner.set_current_line(line_number);
    }
}

/// Rebuilds a document tree by replaying `patches` in order.
///
/// The stream must start with `CreateDocument`; its key is the returned root.
pub fn materialize(patches: &[DomPatch], namespace_html_elements: bool) -> Result<Node, PatchError> {
    let mut applier = PatchApplier::default();
    let document = match patches.first() {
        None => return Err(PatchError::EmptyStream),
        Some(DomPatch::CreateDocument { key }) => *key,
        Some(_) => return Err(PatchError::MissingDocument),
    };
    for patch in patches {
        applier.apply(patch)?;
    }
    let root = applier.resolve(document)?;
    Ok(applier.arena.into_node(root, namespace_html_elements))
}

#[derive(Default)]
struct PatchApplier {
    arena: NodeArena,
    keys: HashMap<PatchKey, NodeIndex>,
}

impl PatchApplier {
    fn resolve(&self, key: PatchKey) -> Result<NodeIndex, PatchError> {
        if key == PatchKey::INVALID {
            return Err(PatchError::InvalidKey(key));
        }
        self.keys
            .get(&key)
            .copied()
            .ok_or(PatchError::UnknownKey(key))
    }

    fn create(&mut self, key: PatchKey, data: ArenaData) -> Result<NodeIndex, PatchError> {
        if key == PatchKey::INVALID {
            return Err(PatchError::InvalidKey(key));
        }
        if self.keys.contains_key(&key) {
            return Err(PatchError::DuplicateKey(key));
        }
        let index = self.arena.push(data);
        self.keys.insert(key, index);
        Ok(index)
    }

    fn container(&self, key: PatchKey) -> Result<NodeIndex, PatchError> {
        let index = self.resolve(key)?;
        match self.arena.data(index) {
            ArenaData::Document | ArenaData::Fragment | ArenaData::Element { .. } => Ok(index),
            _ => Err(PatchError::NotAContainer(key)),
        }
    }

    fn check_acyclic(&self, parent: PatchKey, child: PatchKey) -> Result<(NodeIndex, NodeIndex), PatchError> {
        let parent_index = self.container(parent)?;
        let child_index = self.resolve(child)?;
        if self.arena.is_ancestor_or_self(child_index, parent_index) {
            return Err(PatchError::Cycle { parent, child });
        }
        Ok((parent_index, child_index))
    }

    fn apply(&mut self, patch: &DomPatch) -> Result<(), PatchError> {
        match patch {
            DomPatch::CreateDocument { key } => {
                self.create(*key, ArenaData::Document)?;
            }
            DomPatch::CreateDoctype {
                key,
                name,
                public_id,
                system_id,
            } => {
                self.create(
                    *key,
                    ArenaData::Doctype {
                        name: name.clone(),
                        public_id: public_id.clone(),
                        system_id: system_id.clone(),
                    },
                )?;
            }
            DomPatch::CreateElement {
                key,
                name,
                namespace,
                attributes,
            } => {
                self.create(
                    *key,
                    ArenaData::Element {
                        name: qual_name(*namespace, name),
                        attributes: attributes.clone(),
                        template_contents: None,
                        integration_point: false,
                    },
                )?;
            }
            DomPatch::CreateTemplateContents { key, template } => {
                let template_index = self.resolve(*template)?;
                if !matches!(self.arena.data(template_index), ArenaData::Element { .. }) {
                    return Err(PatchError::NotATemplate(*template));
                }
                let contents = self.create(*key, ArenaData::Fragment)?;
                if let ArenaData::Element {
                    template_contents, ..
                } = self.arena.data_mut(template_index)
                {
                    *template_contents = Some(contents);
                }
            }
            DomPatch::CreateText { key, text } => {
                self.create(*key, ArenaData::Text(text.clone()))?;
            }
            DomPatch::CreateComment { key, text } => {
                self.create(*key, ArenaData::Comment(text.clone()))?;
            }
            DomPatch::AppendChild { parent, child } => {
                let (parent, child) = self.check_acyclic(*parent, *child)?;
                self.arena.append(parent, child);
            }
            DomPatch::InsertBefore {
                parent,
                child,
                before,
            } => {
                let (parent_index, child_index) = self.check_acyclic(*parent, *child)?;
                let before_index = self.resolve(*before)?;
                if self.arena.parent(before_index) != Some(parent_index) {
                    return Err(PatchError::NotAChild {
                        parent: *parent,
                        child: *before,
                    });
                }
                self.arena.insert_before(before_index, child_index);
            }
            DomPatch::DetachNode { key } => {
                let index = self.resolve(*key)?;
                self.arena.detach(index);
            }
            DomPatch::SetAttributes { key, attributes } => {
                let index = self.resolve(*key)?;
                match self.arena.data_mut(index) {
                    ArenaData::Element {
                        attributes: current,
                        ..
                    } => *current = attributes.clone(),
                    _ => return Err(PatchError::NotAnElement(*key)),
                }
            }
            DomPatch::SetText { key, text } => {
                let index = self.resolve(*key)?;
                match self.arena.data_mut(index) {
                    ArenaData::Text(current) => *current = text.clone(),
                    _ => return Err(PatchError::NotAText(*key)),
                }
            }
        }
        Ok(())
    }
}

/// The `patch` backend: records a patch stream and materializes the tree from it.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatchTreeBuilder;

impl TreeBuilder for PatchTreeBuilder {
    fn build(&self, request: &ParseRequest<'_>) -> BuiltTree {
        let output = run_html5ever(PatchSink::new(), request);
        let namespace_html_elements = request.config.namespace_html_elements;
        let document = match materialize(&output.patches, namespace_html_elements) {
            Ok(document) => document,
            Err(err) => {
                log::error!(target: "html.dom_patch", "patch replay failed: {err}");
                let mut warnings = output.warnings;
                warnings.push(ParseWarning::unsupported(format!("patch replay failed: {err}")));
                let arena = output.arena;
                return BuiltTree {
                    diagnostics: arena.diagnostics.clone(),
                    document: finish(arena.into_document(false, namespace_html_elements), request),
                    warnings,
                };
            }
        };
        BuiltTree {
            document: finish(document, request),
            diagnostics: output.arena.diagnostics,
            warnings: output.warnings,
        }
    }
}

fn finish(document: Node, request: &ParseRequest<'_>) -> Node {
    if request.is_fragment() {
        fragment_from_document(document)
    } else {
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::WarningKind;
    use crate::dom_builder::DomTreeBuilder;
    use crate::parser::{FragmentContext, ParserConfig};

    fn request(input: &str) -> ParseRequest<'_> {
        ParseRequest {
            input,
            context: None,
            config: ParserConfig::default(),
        }
    }

    fn record(input: &str) -> PatchOutput {
        run_html5ever(PatchSink::new(), &request(input))
    }

    #[test]
    fn stream_starts_with_document_and_uses_valid_keys() {
        let output = record("<p>a</p>");
        assert_eq!(
            output.patches.first(),
            Some(&DomPatch::CreateDocument { key: PatchKey(1) })
        );
        for patch in &output.patches {
            if let DomPatch::AppendChild { parent, child } = patch {
                assert_ne!(*parent, PatchKey::INVALID);
                assert_ne!(*child, PatchKey::INVALID);
            }
        }
    }

    #[test]
    fn matches_dom_backend_on_plain_markup() {
        for input in [
            "<p>One<p>Two",
            "<table><tr><td>a</td></tr>b</table>",
            "<b><p>x</b>y",
            "<template><p>a</p></template>",
            "<!DOCTYPE html><!-- c --><html lang=en><body a=b><p>t</p>",
        ] {
            let patch = PatchTreeBuilder.build(&request(input));
            let dom = DomTreeBuilder.build(&request(input));
            assert_eq!(patch.document, dom.document, "input: {input}");
            assert!(patch.warnings.is_empty(), "input: {input}");
            assert_eq!(patch.diagnostics, dom.diagnostics, "input: {input}");
        }
    }

    #[test]
    fn mixed_case_names_are_lowercased_and_reported() {
        let built = PatchTreeBuilder.build(&request("<svg viewBox=\"0 0 1 1\"><foreignObject/></svg>"));
        assert!(!built.warnings.is_empty());
        assert!(built.warnings.iter().all(|w| w.kind == WarningKind::DataLoss));

        let dump = crate::test_serialize(&built.document);
        assert!(dump.contains("viewbox=\"0 0 1 1\""), "{dump}");
        assert!(dump.contains("<svg foreignobject>"), "{dump}");
    }

    #[test]
    fn fragment_is_rerooted() {
        let context = FragmentContext::html("div");
        let request = ParseRequest {
            input: "<b>x</b>y",
            context: Some(&context),
            config: ParserConfig::default(),
        };
        let built = PatchTreeBuilder.build(&request);
        assert_eq!(built.document, DomTreeBuilder.build(&request).document);
    }

    #[test]
    fn materialize_rejects_bad_streams() {
        assert_eq!(materialize(&[], true), Err(PatchError::EmptyStream));
        assert_eq!(
            materialize(&[DomPatch::CreateText { key: PatchKey(1), text: "x".into() }], true),
            Err(PatchError::MissingDocument)
        );

        let doc = PatchKey(1);
        let text = PatchKey(2);
        assert_eq!(
            materialize(
                &[
                    DomPatch::CreateDocument { key: doc },
                    DomPatch::CreateText { key: text, text: "x".into() },
                    DomPatch::AppendChild { parent: text, child: doc },
                ],
                true
            ),
            Err(PatchError::NotAContainer(text))
        );
        assert_eq!(
            materialize(
                &[
                    DomPatch::CreateDocument { key: doc },
                    DomPatch::SetText { key: doc, text: "x".into() },
                ],
                true
            ),
            Err(PatchError::NotAText(doc))
        );
        assert_eq!(
            materialize(
                &[
                    DomPatch::CreateDocument { key: doc },
                    DomPatch::AppendChild { parent: doc, child: doc },
                ],
                true
            ),
            Err(PatchError::Cycle { parent: doc, child: doc })
        );
        assert_eq!(
            materialize(
                &[
                    DomPatch::CreateDocument { key: doc },
                    DomPatch::CreateDocument { key: doc },
                ],
                true
            ),
            Err(PatchError::DuplicateKey(doc))
        );
    }

    #[test]
    fn detached_nodes_can_be_reinserted() {
        let doc = PatchKey(1);
        let a = PatchKey(2);
        let b = PatchKey(3);
        let patches = [
            DomPatch::CreateDocument { key: doc },
            DomPatch::CreateComment { key: a, text: "a".into() },
            DomPatch::CreateComment { key: b, text: "b".into() },
            DomPatch::AppendChild { parent: doc, child: a },
            DomPatch::AppendChild { parent: doc, child: b },
            DomPatch::DetachNode { key: b },
            DomPatch::InsertBefore { parent: doc, child: b, before: a },
        ];
        let node = materialize(&patches, true).expect("valid stream");
        assert_eq!(
            crate::test_serialize(&node),
            "#document\n| <!-- b -->\n| <!-- a -->"
        );
    }
}
