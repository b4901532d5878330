//! Enumerates (case, tree implementation, namespace mode) test items.

use std::fmt;

use html::{Capability, TreeImplementation, TreeRegistry};

use crate::case::{Corpus, TestCase};
use crate::runner::SkipReason;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamespaceMode {
    Namespaced,
    VoidNamespace,
}

impl NamespaceMode {
    pub const ALL: [NamespaceMode; 2] = [NamespaceMode::Namespaced, NamespaceMode::VoidNamespace];

    pub const fn as_str(self) -> &'static str {
        match self {
            NamespaceMode::Namespaced => "namespaced",
            NamespaceMode::VoidNamespace => "void-namespace",
        }
    }

    pub const fn namespace_html_elements(self) -> bool {
        matches!(self, NamespaceMode::Namespaced)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker<'a> {
    Implementation(&'a str),
    Parser,
    Namespaced,
}

impl Marker<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            Marker::Implementation(name) => name,
            Marker::Parser => "parser",
            Marker::Namespaced => "namespaced",
        }
    }
}

impl fmt::Display for Marker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct TestItem<'a> {
    pub corpus: &'a str,
    pub ordinal: usize,
    pub case: &'a TestCase,
    pub implementation: &'a TreeImplementation,
    pub mode: NamespaceMode,
    pub skip: Option<SkipReason>,
}

impl<'a> TestItem<'a> {
    /// `<implementation>::parser::<mode>`
    pub fn node_id(&self) -> String {
        format!(
            "{}::parser::{}",
            self.implementation.name(),
            self.mode.as_str()
        )
    }

    /// `<corpus>::<ordinal>::<node id>`
    pub fn id(&self) -> String {
        format!("{}::{}::{}", self.corpus, self.ordinal, self.node_id())
    }

    pub fn markers(&self) -> Vec<Marker<'a>> {
        let mut markers = vec![
            Marker::Implementation(self.implementation.name()),
            Marker::Parser,
        ];
        if self.mode == NamespaceMode::Namespaced {
            markers.push(Marker::Namespaced);
        }
        markers
    }
}

/// Items for one corpus: implementations by name (adapters left out), then
/// namespaced before void-namespace, then cases in file order.
pub fn generate<'a>(
    corpus: &'a Corpus,
    registry: &'a TreeRegistry,
) -> impl Iterator<Item = TestItem<'a>> + 'a {
    registry
        .iter()
        .filter(|implementation| !implementation.has_capability(Capability::Adapter))
        .flat_map(move |implementation| {
            let skip = (!implementation.has_capability(Capability::Builder))
                .then_some(SkipReason::BuilderNotLoaded);
            NamespaceMode::ALL.into_iter().flat_map(move |mode| {
                let skip = skip.clone();
                corpus
                    .cases
                    .iter()
                    .enumerate()
                    .map(move |(ordinal, case)| TestItem {
                        corpus: &corpus.name,
                        ordinal,
                        case,
                        implementation,
                        mode,
                        skip: skip.clone(),
                    })
            })
        })
}

pub fn generate_all<'a>(
    corpora: &'a [Corpus],
    registry: &'a TreeRegistry,
) -> impl Iterator<Item = TestItem<'a>> + 'a {
    corpora
        .iter()
        .flat_map(move |corpus| generate(corpus, registry))
}
