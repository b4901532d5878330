//! Parse-and-compare execution of test items.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use html::{Diagnostic, HtmlParser, ParseFault, ParseWarning, ParserConfig, WarningPolicy};

use crate::case::TestCase;
use crate::diff_lines;
use crate::dump::{normalize_dump, rewrite_for_namespace};
use crate::matrix::{NamespaceMode, TestItem};
use crate::messages::{ASSERT_PARSE_ERRORS, ErrorListCheck, render_diagnostic};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The implementation is registered without a tree builder.
    BuilderNotLoaded,
    /// The backend reported data loss; its dump cannot be compared.
    DataLoss(String),
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::BuilderNotLoaded => "tree builder not loaded",
            SkipReason::DataLoss(_) => "data loss warning",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BuilderNotLoaded => f.write_str(self.label()),
            SkipReason::DataLoss(detail) => write!(f, "{}: {detail}", self.label()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Failure {
    Mismatch {
        input: String,
        expected: String,
        actual: String,
    },
    MalformedDiagnostic {
        code: String,
        vars: serde_json::Value,
    },
    ParseWarning(ParseWarning),
    ErrorList(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Mismatch {
                input,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "\n\nInput:\n{input}\n\nExpected:\n{expected}\n\nReceived:\n{actual}"
                )?;
                let expected_lines: Vec<String> = expected.lines().map(str::to_string).collect();
                let actual_lines: Vec<String> = actual.lines().map(str::to_string).collect();
                write!(f, "\n\n{}", diff_lines(&expected_lines, &actual_lines))
            }
            Failure::MalformedDiagnostic { code, vars } => write!(f, "{code}, {vars}"),
            Failure::ParseWarning(warning) => write!(f, "unexpected parse warning: {warning}"),
            Failure::ErrorList(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for Failure {}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Pass,
    Fail(Vec<Failure>),
    Skip(SkipReason),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

/// Error lines the parser reported, rendered like the fixture's.
pub fn error_list_check(case: &TestCase, diagnostics: &[Diagnostic]) -> ErrorListCheck {
    let actual: Vec<String> = diagnostics
        .iter()
        .map(|diagnostic| render_diagnostic(diagnostic).unwrap_or_else(|err| err.to_string()))
        .collect();
    ErrorListCheck::new(&case.data, &case.errors, &actual)
}

/// Runs one item: parse, serialize, compare against the fixture dump.
pub fn execute(item: &TestItem<'_>) -> Outcome {
    if let Some(reason) = &item.skip {
        log::debug!(target: "tree_construction", "skip {}: {reason}", item.id());
        return Outcome::Skip(reason.clone());
    }
    let Some(builder) = item.implementation.tree_builder() else {
        return Outcome::Skip(SkipReason::BuilderNotLoaded);
    };

    let config = ParserConfig {
        namespace_html_elements: item.mode.namespace_html_elements(),
        ..ParserConfig::default()
    };
    let mut parser = HtmlParser::new(Arc::clone(builder), config);
    let case = item.case;
    let parsed = match &case.fragment_context {
        Some(context) => parser.parse_fragment(&case.data, context, WarningPolicy::strict()),
        None => parser.parse(&case.data, WarningPolicy::strict()),
    };
    let document = match parsed {
        Ok(document) => document,
        Err(fault) => {
            log::debug!(target: "tree_construction", "{}: {fault}", item.id());
            let warning = fault.warning().clone();
            return match fault {
                ParseFault::DataLoss(_) => Outcome::Skip(SkipReason::DataLoss(warning.detail)),
                ParseFault::Warning(_) => Outcome::Fail(vec![Failure::ParseWarning(warning)]),
            };
        }
    };

    let actual = normalize_dump(&parser.serialize(&document));
    let expected = match item.mode {
        NamespaceMode::Namespaced => normalize_dump(&rewrite_for_namespace(&case.document)),
        NamespaceMode::VoidNamespace => normalize_dump(&case.document),
    };

    let mut failures = Vec::new();
    if actual != expected {
        failures.push(Failure::Mismatch {
            input: case.data.clone(),
            expected,
            actual,
        });
    }
    if let Some(malformed) = parser.errors().iter().find(|d| !d.vars_are_mapping()) {
        failures.push(Failure::MalformedDiagnostic {
            code: malformed.code.clone(),
            vars: malformed.vars.clone(),
        });
    }

    let check = error_list_check(case, parser.errors());
    if ASSERT_PARSE_ERRORS && !check.counts_match() {
        failures.push(Failure::ErrorList(check.message));
    }

    if failures.is_empty() {
        Outcome::Pass
    } else {
        log::debug!(
            target: "tree_construction",
            "fail {}: {} failure(s)",
            item.id(),
            failures.len()
        );
        Outcome::Fail(failures)
    }
}

#[derive(Clone, Debug)]
pub struct ItemReport {
    pub id: String,
    pub markers: Vec<String>,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, Default)]
pub struct Report {
    pub items: Vec<ItemReport>,
}

/// Executes every item in order; a failing item never stops the run.
pub fn run<'a>(items: impl IntoIterator<Item = TestItem<'a>>) -> Report {
    let items = items
        .into_iter()
        .map(|item| ItemReport {
            id: item.id(),
            markers: item.markers().iter().map(|m| m.to_string()).collect(),
            outcome: execute(&item),
        })
        .collect();
    Report { items }
}

impl Report {
    pub fn passed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Pass))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Fail(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Skip(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &[Failure])> {
        self.items.iter().filter_map(|item| match &item.outcome {
            Outcome::Fail(failures) => Some((item.id.as_str(), failures.as_slice())),
            _ => None,
        })
    }

    pub fn render_failures(&self) -> String {
        let mut out = String::new();
        for (id, failures) in self.failures() {
            out.push_str(&format!("=== {id}\n"));
            for failure in failures {
                out.push_str(&format!("{failure}\n"));
            }
        }
        out
    }

    /// Skip count per reason label.
    pub fn skip_summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary = BTreeMap::new();
        for item in &self.items {
            if let Outcome::Skip(reason) = &item.outcome {
                *summary.entry(reason.label()).or_insert(0) += 1;
            }
        }
        summary
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tree construction: {} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::Corpus;
    use crate::matrix::generate;
    use html::{BuiltTree, ParseRequest, TreeBuilder, TreeImplementation, TreeRegistry};
    use std::path::PathBuf;

    const P_ONE_P_TWO: &str =
        "#document\n| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"One\"\n|     <p>\n|       \"Two\"";

    fn corpus(cases: Vec<TestCase>) -> Corpus {
        Corpus {
            name: "unit".to_string(),
            path: PathBuf::from("unit.toml"),
            cases,
        }
    }

    fn case(data: &str, document: &str) -> TestCase {
        TestCase {
            data: data.to_string(),
            fragment_context: None,
            document: document.to_string(),
            errors: Vec::new(),
        }
    }

    /// Parses with the arena backend, then reports a non-mapping payload.
    struct MalformedVarsBuilder;

    impl TreeBuilder for MalformedVarsBuilder {
        fn build(&self, request: &ParseRequest<'_>) -> BuiltTree {
            let mut built = html::DomTreeBuilder.build(request);
            built.diagnostics.push(
                Diagnostic::new(1, 0, "unexpected-end-tag")
                    .with_vars(serde_json::Value::String("bad".to_string())),
            );
            built
        }
    }

    fn registry_with(name: &'static str, builder: Arc<dyn TreeBuilder>) -> TreeRegistry {
        let mut registry = TreeRegistry::new();
        registry.register(TreeImplementation::builder(name, builder));
        registry
    }

    #[test]
    fn matching_dump_passes_in_both_modes() {
        let corpus = corpus(vec![case("<p>One<p>Two", P_ONE_P_TWO)]);
        let registry = TreeRegistry::builtin();
        let report = run(generate(&corpus, &registry));
        for item in &report.items {
            assert!(item.outcome.is_pass(), "{} -> {:?}", item.id, item.outcome);
        }
        assert_eq!(report.passed(), report.items.len());
    }

    #[test]
    fn unloaded_builder_skips_every_item() {
        let corpus = corpus(vec![case("a", "#document"), case("b", "#document")]);
        let mut registry = TreeRegistry::new();
        registry.register(TreeImplementation::unloaded("patch"));
        let report = run(generate(&corpus, &registry));
        assert_eq!(report.items.len(), 4);
        assert_eq!(report.skipped(), 4);
        assert_eq!(report.skip_summary().get("tree builder not loaded"), Some(&4));
    }

    #[test]
    fn mismatch_message_carries_input_and_both_dumps() {
        let corpus = corpus(vec![case("<p>One<p>Two", "#document\n| <html>")]);
        let registry = registry_with("dom", Arc::new(html::DomTreeBuilder));
        let item = generate(&corpus, &registry)
            .find(|item| item.mode == NamespaceMode::VoidNamespace)
            .expect("void-namespace item");
        let Outcome::Fail(failures) = execute(&item) else {
            panic!("expected a mismatch");
        };
        assert_eq!(failures.len(), 1);
        let message = failures[0].to_string();
        let head = format!(
            "\n\nInput:\n<p>One<p>Two\n\nExpected:\n| <html>\n\nReceived:\n{}",
            normalize_dump(P_ONE_P_TWO)
        );
        assert!(message.starts_with(&head), "{message}");
    }

    #[test]
    fn malformed_vars_fail_even_when_dump_matches() {
        let corpus = corpus(vec![case("<p>One<p>Two", P_ONE_P_TWO)]);
        let registry = registry_with("malformed", Arc::new(MalformedVarsBuilder));
        let report = run(generate(&corpus, &registry));
        assert_eq!(report.failed(), 2);
        for (_, failures) in report.failures() {
            assert_eq!(
                failures,
                [Failure::MalformedDiagnostic {
                    code: "unexpected-end-tag".to_string(),
                    vars: serde_json::Value::String("bad".to_string()),
                }]
            );
            assert_eq!(failures[0].to_string(), "unexpected-end-tag, \"bad\"");
        }
    }

    #[test]
    fn malformed_vars_reported_alongside_mismatch() {
        let corpus = corpus(vec![case("<p>x", "#document\n| <p>")]);
        let registry = registry_with("malformed", Arc::new(MalformedVarsBuilder));
        let report = run(generate(&corpus, &registry));
        for (_, failures) in report.failures() {
            assert_eq!(failures.len(), 2);
            assert!(matches!(failures[0], Failure::Mismatch { .. }));
            assert!(matches!(failures[1], Failure::MalformedDiagnostic { .. }));
        }
        assert!(report.render_failures().contains("=== unit::0::malformed::parser::namespaced"));
    }

    #[test]
    fn data_loss_skips_instead_of_comparing() {
        let corpus = corpus(vec![case("<svg viewBox=\"0 0 1 1\"></svg>", "#document")]);
        let registry = registry_with("patch", Arc::new(html::PatchTreeBuilder));
        let report = run(generate(&corpus, &registry));
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.skip_summary().get("data loss warning"), Some(&2));
    }

    #[test]
    fn items_execute_independently_across_threads() {
        let corpus = corpus(vec![
            case("<svg viewBox=\"0 0 1 1\"></svg>", "#document"),
            case("<p>One<p>Two", P_ONE_P_TWO),
        ]);
        let registry = registry_with("patch", Arc::new(html::PatchTreeBuilder));
        let items: Vec<TestItem<'_>> = generate(&corpus, &registry).collect();

        let outcomes: Vec<(String, Outcome)> = std::thread::scope(|scope| {
            let handles: Vec<_> = items
                .iter()
                .map(|item| scope.spawn(move || (item.id(), execute(item))))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("worker thread"))
                .collect()
        });

        assert_eq!(outcomes.len(), 4);
        for (id, outcome) in &outcomes {
            if id.starts_with("unit::0::") {
                assert!(
                    matches!(outcome, Outcome::Skip(SkipReason::DataLoss(_))),
                    "{id} -> {outcome:?}"
                );
            } else {
                assert!(outcome.is_pass(), "{id} -> {outcome:?}");
            }
        }
        let sequential: Vec<Outcome> = items.iter().map(|item| execute(item)).collect();
        let threaded: Vec<Outcome> = outcomes.into_iter().map(|(_, outcome)| outcome).collect();
        assert_eq!(threaded, sequential);
    }

    #[test]
    fn unsupported_warning_fails_the_item() {
        let mut fragment = case("x", "#document-fragment\n| \"x\"");
        fragment.fragment_context = Some("xul box".to_string());
        let corpus = corpus(vec![fragment]);
        let registry = registry_with("dom", Arc::new(html::DomTreeBuilder));
        let report = run(generate(&corpus, &registry));
        assert_eq!(report.failed(), 2);
        for (_, failures) in report.failures() {
            assert!(matches!(failures, [Failure::ParseWarning(_)]));
        }
    }

    #[test]
    fn error_list_check_is_computed_but_dormant() {
        let mut with_errors = case("<p>One<p>Two", P_ONE_P_TWO);
        with_errors.errors = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let check = error_list_check(&with_errors, &[Diagnostic::new(1, 0, "x")]);
        assert!(!check.counts_match());
        assert!(check.message.contains("Actual errors (1):\nLine: 1 Col: 0 x"));

        let corpus = corpus(vec![with_errors]);
        let registry = registry_with("dom", Arc::new(html::DomTreeBuilder));
        let report = run(generate(&corpus, &registry));
        assert_eq!(report.passed(), 2);
    }
}
