//! Human-readable parse error lines in the tree-construction fixture style.

use std::fmt;

#[cfg(feature = "html5")]
use html::Diagnostic;

/// Whether the executor fails items whose error count differs from the
/// fixture's. Kept off: the error lists are computed and carried along only.
pub const ASSERT_PARSE_ERRORS: bool = false;

/// Message template for an error code; `{name}` placeholders take the
/// diagnostic's vars. Only backends that report upstream error codes hit this
/// table. html5ever reports free-text messages, which render verbatim.
pub fn message_template(code: &str) -> Option<&'static str> {
    let template = match code {
        "null-character" => "Null character in input stream, replaced with U+FFFD.",
        "invalid-codepoint" => "Invalid codepoint in stream.",
        "incorrectly-placed-solidus" => "Solidus (/) incorrectly placed in tag.",
        "expected-tag-name" => "Expected tag name. Got something else instead",
        "expected-closing-tag-but-got-eof" => "Unexpected end of file. Expected end tag ({name}).",
        "expected-doctype-but-got-eof" => "Unexpected End of file. Expected DOCTYPE.",
        "expected-doctype-but-got-chars" => "Unexpected non-space characters. Expected DOCTYPE.",
        "expected-doctype-but-got-start-tag" => "Unexpected start tag ({name}). Expected DOCTYPE.",
        "expected-doctype-but-got-end-tag" => "Unexpected end tag ({name}). Expected DOCTYPE.",
        "unexpected-start-tag" => "Unexpected start tag ({name}).",
        "unexpected-end-tag" => "Unexpected end tag ({name}). Ignored.",
        "unexpected-end-tag-before-html" => "Unexpected end tag ({name}) before html.",
        "end-tag-too-early" => "End tag ({name}) seen too early. Expected other end tag.",
        "adoption-agency-1.3" => {
            "End tag ({name}) violates step 1, paragraph 3 of the adoption agency algorithm."
        }
        "unexpected-character-implies-table-voodoo" => {
            "Unexpected non-space characters in table context caused voodoo mode."
        }
        "unexpected-start-tag-implies-table-voodoo" => {
            "Unexpected start tag {name} in table context caused voodoo mode."
        }
        "expected-eof-but-got-char" => "Unexpected non-space characters. Expected end of file.",
        "expected-named-closing-tag-but-got-eof" => {
            "Unexpected end of file. Expected end tag ({name})."
        }
        "eof-in-template" => "Unexpected end of file in template. Expected end tag ({name}).",
        "unknown-doctype" => "Erroneous DOCTYPE.",
        _ => return None,
    };
    Some(template)
}

/// A diagnostic whose vars are not a key-value mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct MalformedVars {
    pub code: String,
    pub vars: serde_json::Value,
}

impl fmt::Display for MalformedVars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.code, self.vars)
    }
}

impl std::error::Error for MalformedVars {}

/// Formats one error line: `Line: <line> Col: <col> <message>`.
///
/// Unknown codes print the code itself; placeholders with no matching var are
/// left as they are.
pub fn render_error_line(
    line: u64,
    column: u64,
    code: &str,
    vars: &serde_json::Value,
) -> Result<String, MalformedVars> {
    let Some(vars) = vars.as_object() else {
        return Err(MalformedVars {
            code: code.to_string(),
            vars: vars.clone(),
        });
    };
    let message = match message_template(code) {
        Some(template) => {
            let mut message = template.to_string();
            for (name, value) in vars {
                let value = match value {
                    serde_json::Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                message = message.replace(&format!("{{{name}}}"), &value);
            }
            message
        }
        None => code.to_string(),
    };
    Ok(format!("Line: {line} Col: {column} {message}"))
}

#[cfg(feature = "html5")]
pub fn render_diagnostic(diagnostic: &Diagnostic) -> Result<String, MalformedVars> {
    render_error_line(
        diagnostic.position.line,
        diagnostic.position.column,
        &diagnostic.code,
        &diagnostic.vars,
    )
}

/// Expected versus actual error lines of one item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorListCheck {
    pub expected: usize,
    pub actual: usize,
    pub message: String,
}

impl ErrorListCheck {
    pub fn new(input: &str, expected: &[String], actual: &[String]) -> Self {
        let message = format!(
            "\n\nInput:\n{input}\n\nExpected errors ({}):\n{}\n\nActual errors ({}):\n{}",
            expected.len(),
            expected.join("\n"),
            actual.len(),
            actual.join("\n")
        );
        Self {
            expected: expected.len(),
            actual: actual.len(),
            message,
        }
    }

    pub fn counts_match(&self) -> bool {
        self.expected == self.actual
    }
}
