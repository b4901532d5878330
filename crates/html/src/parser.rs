//! Parser facade: drives html5ever into a pluggable tree builder and applies
//! the per-call warning policy.

use std::sync::Arc;

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::{TreeBuilderOpts, TreeSink};
use html5ever::{ParseOpts, QualName, parse_document, parse_fragment};

use crate::backend::TreeBuilder;
use crate::diagnostics::{Diagnostic, Disposition, ParseFault, ParseWarning, WarningKind, WarningPolicy};
use crate::dom_builder::qual_name;
use crate::types::{Namespace, Node};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// Put HTML elements in the XHTML namespace.
    pub namespace_html_elements: bool,
    pub scripting: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            namespace_html_elements: true,
            scripting: false,
        }
    }
}

/// Context element of a fragment parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentContext {
    pub namespace: Namespace,
    pub local_name: String,
}

impl FragmentContext {
    pub fn html(local_name: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Html,
            local_name: local_name.into(),
        }
    }

    /// Parses a fixture context string: `td`, `svg path` or `math mi`.
    ///
    /// An unknown namespace prefix falls back to an HTML context of the same
    /// local name and reports an `Unsupported` warning.
    pub fn parse(raw: &str) -> (Self, Option<ParseWarning>) {
        let raw = raw.trim();
        match raw.split_once(' ') {
            Some(("svg", local)) => (
                Self {
                    namespace: Namespace::Svg,
                    local_name: local.to_string(),
                },
                None,
            ),
            Some(("math", local)) => (
                Self {
                    namespace: Namespace::MathMl,
                    local_name: local.to_string(),
                },
                None,
            ),
            Some((prefix, local)) => (
                Self::html(local),
                Some(ParseWarning::unsupported(format!(
                    "unknown fragment context namespace '{prefix}'"
                ))),
            ),
            None => (Self::html(raw), None),
        }
    }

    pub(crate) fn qual_name(&self) -> QualName {
        qual_name(self.namespace, &self.local_name)
    }
}

/// One parse call as seen by a [`TreeBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct ParseRequest<'a> {
    pub input: &'a str,
    /// Present for fragment parses.
    pub context: Option<&'a FragmentContext>,
    pub config: ParserConfig,
}

impl ParseRequest<'_> {
    pub fn is_fragment(&self) -> bool {
        self.context.is_some()
    }
}

/// Runs html5ever over the request input with `sink` as the tree sink.
pub(crate) fn run_html5ever<S: TreeSink>(sink: S, request: &ParseRequest<'_>) -> S::Output {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: request.config.scripting,
            ..Default::default()
        },
        ..Default::default()
    };
    match request.context {
        Some(context) => parse_fragment(
            sink,
            opts,
            context.qual_name(),
            Vec::new(),
            request.config.scripting,
        )
        .one(request.input),
        None => parse_document(sink, opts).one(request.input),
    }
}

/// HTML parser bound to one tree builder.
///
/// Errors and warnings of the most recent call are kept on the parser and
/// replaced by the next call.
pub struct HtmlParser {
    builder: Arc<dyn TreeBuilder>,
    config: ParserConfig,
    errors: Vec<Diagnostic>,
    warnings: Vec<ParseWarning>,
}

impl HtmlParser {
    pub fn new(builder: Arc<dyn TreeBuilder>, config: ParserConfig) -> Self {
        Self {
            builder,
            config,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn parse(&mut self, input: &str, policy: WarningPolicy) -> Result<Node, ParseFault> {
        self.run(input, None, Vec::new(), policy)
    }

    pub fn parse_fragment(
        &mut self,
        input: &str,
        context: &str,
        policy: WarningPolicy,
    ) -> Result<Node, ParseFault> {
        let (context, warning) = FragmentContext::parse(context);
        self.run(input, Some(&context), warning.into_iter().collect(), policy)
    }

    /// Parse errors of the most recent call, in order.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Warnings of the most recent call that the policy only recorded.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn serialize(&self, document: &Node) -> String {
        self.builder.serialize(document)
    }

    fn run(
        &mut self,
        input: &str,
        context: Option<&FragmentContext>,
        early_warnings: Vec<ParseWarning>,
        policy: WarningPolicy,
    ) -> Result<Node, ParseFault> {
        self.errors.clear();
        self.warnings.clear();

        for warning in early_warnings {
            self.admit(warning, policy)?;
        }

        let request = ParseRequest {
            input,
            context,
            config: self.config,
        };
        let built = self.builder.build(&request);
        log::debug!(
            target: "html.parser",
            "parsed input_len={} fragment={} errors={} warnings={}",
            input.len(),
            request.is_fragment(),
            built.diagnostics.len(),
            built.warnings.len()
        );
        self.errors = built.diagnostics;
        for warning in built.warnings {
            self.admit(warning, policy)?;
        }
        Ok(built.document)
    }

    fn admit(&mut self, warning: ParseWarning, policy: WarningPolicy) -> Result<(), ParseFault> {
        match policy.disposition(warning.kind) {
            Disposition::Record => {
                self.warnings.push(warning);
                Ok(())
            }
            Disposition::Fatal => {
                log::debug!(target: "html.parser", "fatal warning: {warning}");
                Err(match warning.kind {
                    WarningKind::DataLoss => ParseFault::DataLoss(warning),
                    WarningKind::Unsupported => ParseFault::Warning(warning),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BuiltTree;
    use crate::dom_builder::DomTreeBuilder;

    struct LossyBuilder;

    impl TreeBuilder for LossyBuilder {
        fn build(&self, _request: &ParseRequest<'_>) -> BuiltTree {
            BuiltTree {
                document: Node::Document {
                    children: Vec::new(),
                },
                diagnostics: vec![Diagnostic::new(1, 0, "expected-doctype-but-got-eof")],
                warnings: vec![ParseWarning::data_loss("dropped a name")],
            }
        }
    }

    #[test]
    fn fragment_context_strings() {
        assert_eq!(FragmentContext::parse("td"), (FragmentContext::html("td"), None));

        let (svg, warning) = FragmentContext::parse("svg path");
        assert_eq!(svg.namespace, Namespace::Svg);
        assert_eq!(svg.local_name, "path");
        assert!(warning.is_none());

        let (math, _) = FragmentContext::parse("math mi");
        assert_eq!(math.namespace, Namespace::MathMl);

        let (fallback, warning) = FragmentContext::parse("xul box");
        assert_eq!(fallback, FragmentContext::html("box"));
        assert_eq!(
            warning.map(|w| w.kind),
            Some(WarningKind::Unsupported)
        );
    }

    #[test]
    fn strict_policy_turns_data_loss_into_fault() {
        let mut parser = HtmlParser::new(Arc::new(LossyBuilder), ParserConfig::default());
        let fault = parser
            .parse("x", WarningPolicy::strict())
            .expect_err("data loss should be fatal");
        assert!(matches!(fault, ParseFault::DataLoss(_)));
        assert_eq!(parser.errors().len(), 1);
        assert!(parser.warnings().is_empty());
    }

    #[test]
    fn lenient_policy_records_warnings() {
        let mut parser = HtmlParser::new(Arc::new(LossyBuilder), ParserConfig::default());
        parser
            .parse("x", WarningPolicy::lenient())
            .expect("lenient parse");
        assert_eq!(parser.warnings().len(), 1);
    }

    #[test]
    fn unknown_context_namespace_fails_before_building() {
        let mut parser = HtmlParser::new(Arc::new(DomTreeBuilder), ParserConfig::default());
        let fault = parser
            .parse_fragment("x", "xul box", WarningPolicy::strict())
            .expect_err("unsupported context should be fatal");
        assert!(matches!(fault, ParseFault::Warning(_)));
        assert!(parser.errors().is_empty());
    }

    #[test]
    fn state_is_reset_between_calls() {
        let mut parser = HtmlParser::new(Arc::new(DomTreeBuilder), ParserConfig::default());
        parser
            .parse("</p>", WarningPolicy::strict())
            .expect("parse with errors");
        assert!(!parser.errors().is_empty());
        parser
            .parse("<!DOCTYPE html><html><head></head><body></body></html>", WarningPolicy::strict())
            .expect("clean parse");
        assert!(parser.errors().is_empty());
    }

    #[test]
    fn serialize_uses_builder_dump() {
        let mut parser = HtmlParser::new(Arc::new(DomTreeBuilder), ParserConfig::default());
        let document = parser
            .parse("<!DOCTYPE html>x", WarningPolicy::strict())
            .expect("parse");
        let dump = parser.serialize(&document);
        assert!(dump.starts_with("#document\n| <!DOCTYPE html>\n| <html html>"));
    }
}
