//! Tree backends and the registry the conformance harness enumerates.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::Node;
use crate::diagnostics::{Diagnostic, ParseWarning};
use crate::dom_builder::DomTreeBuilder;
use crate::dom_snapshot::test_serialize;
use crate::parser::ParseRequest;
use crate::traverse::{WalkEvent, walk};

/// Output of one [`TreeBuilder::build`] call.
#[derive(Debug)]
pub struct BuiltTree {
    pub document: Node,
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<ParseWarning>,
}

/// Builds a tree in some representation and serializes it to the fixture dump.
pub trait TreeBuilder: Send + Sync {
    fn build(&self, request: &ParseRequest<'_>) -> BuiltTree;

    fn serialize(&self, document: &Node) -> String {
        test_serialize(document)
    }
}

pub type TreeWalker = for<'a> fn(&'a Node) -> Vec<WalkEvent<'a>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Can be driven by the parser.
    Builder,
    /// Can only walk an existing tree.
    Adapter,
}

impl Capability {
    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::Builder => "builder",
            Capability::Adapter => "adapter",
        }
    }
}

#[derive(Clone)]
pub struct TreeImplementation {
    name: &'static str,
    builder: Option<Arc<dyn TreeBuilder>>,
    walker: Option<TreeWalker>,
}

impl TreeImplementation {
    pub fn builder(name: &'static str, builder: Arc<dyn TreeBuilder>) -> Self {
        Self {
            name,
            builder: Some(builder),
            walker: None,
        }
    }

    pub fn adapter(name: &'static str, walker: TreeWalker) -> Self {
        Self {
            name,
            builder: None,
            walker: Some(walker),
        }
    }

    /// A backend that exists but is not compiled in.
    pub fn unloaded(name: &'static str) -> Self {
        Self {
            name,
            builder: None,
            walker: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Builder => self.builder.is_some(),
            Capability::Adapter => self.walker.is_some(),
        }
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        [Capability::Builder, Capability::Adapter]
            .into_iter()
            .filter(|&capability| self.has_capability(capability))
            .collect()
    }

    pub fn tree_builder(&self) -> Option<&Arc<dyn TreeBuilder>> {
        self.builder.as_ref()
    }

    pub fn walker(&self) -> Option<TreeWalker> {
        self.walker
    }
}

impl fmt::Debug for TreeImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capabilities: Vec<&str> = self.capabilities().iter().map(|c| c.as_str()).collect();
        f.debug_struct("TreeImplementation")
            .field("name", &self.name)
            .field("capabilities", &capabilities)
            .finish()
    }
}

/// Tree implementations by name, iterated in name order.
#[derive(Clone, Debug, Default)]
pub struct TreeRegistry {
    entries: BTreeMap<&'static str, TreeImplementation>,
}

impl TreeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the backends compiled into this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(TreeImplementation::builder("dom", Arc::new(DomTreeBuilder)));
        #[cfg(feature = "patch-sink")]
        registry.register(TreeImplementation::builder(
            "patch",
            Arc::new(crate::dom_patch::PatchTreeBuilder),
        ));
        #[cfg(not(feature = "patch-sink"))]
        registry.register(TreeImplementation::unloaded("patch"));
        registry.register(TreeImplementation::adapter("walker", walk));
        registry
    }

    /// Adds `implementation`, replacing any entry with the same name.
    pub fn register(&mut self, implementation: TreeImplementation) -> Option<TreeImplementation> {
        self.entries.insert(implementation.name, implementation)
    }

    pub fn get(&self, name: &str) -> Option<&TreeImplementation> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeImplementation> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
