//! Shared helpers for the HTML tree-construction conformance suite.

pub mod case;
pub mod config;
pub mod dump;
pub mod messages;

#[cfg(feature = "html5")]
pub mod matrix;
#[cfg(feature = "html5")]
pub mod runner;

pub use case::{Corpus, TestCase, load_corpus, load_corpus_dir};
pub use config::HarnessConfig;
pub use dump::{normalize_dump, rewrite_for_namespace};
pub use messages::{ASSERT_PARSE_ERRORS, ErrorListCheck, MalformedVars};

#[cfg(feature = "html5")]
pub use matrix::{Marker, NamespaceMode, TestItem, generate, generate_all};
#[cfg(feature = "html5")]
pub use runner::{Failure, Outcome, Report, SkipReason, execute, run};

/// Line diff around the first differing line of two dumps.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let mut out = String::new();
    use std::fmt::Write;
    let mut mismatch = None;
    let missing = "<missing>";
    for i in 0..max {
        let left = expected.get(i).map(String::as_str).unwrap_or(missing);
        let right = actual.get(i).map(String::as_str).unwrap_or(missing);
        if left != right {
            mismatch = Some(i);
            break;
        }
    }
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for line_idx in start..end {
            let left = expected
                .get(line_idx)
                .map(String::as_str)
                .unwrap_or(missing);
            let right = actual.get(line_idx).map(String::as_str).unwrap_or(missing);
            let marker = if line_idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", line_idx + 1);
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", line_idx + 1);
        }
    }
    if expected.len() != actual.len() && mismatch.is_none() {
        let _ = writeln!(
            &mut out,
            "prefix matched but lengths differ (expected {} lines, actual {} lines)",
            expected.len(),
            actual.len()
        );
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}
