pub mod backend;
pub mod dom_snapshot;
pub mod traverse;

mod diagnostics;
mod dom_builder;
#[cfg(feature = "patch-sink")]
mod dom_patch;
mod parser;
mod types;

pub use crate::backend::{BuiltTree, Capability, TreeBuilder, TreeImplementation, TreeRegistry, TreeWalker};
pub use crate::diagnostics::{
    Diagnostic, Disposition, ParseFault, ParseWarning, Position, WarningKind, WarningPolicy,
};
pub use crate::dom_builder::{ArenaSink, DomTreeBuilder};
#[cfg(feature = "patch-sink")]
pub use crate::dom_patch::{DomPatch, PatchError, PatchKey, PatchSink, PatchTreeBuilder, materialize};
pub use crate::dom_snapshot::test_serialize;
pub use crate::parser::{FragmentContext, HtmlParser, ParseRequest, ParserConfig};
pub use crate::traverse::{WalkEvent, walk};
pub use crate::types::{Attribute, AttributeNamespace, Namespace, Node};
