//! Parse errors and warnings reported while building a tree.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u64,
    /// The tree builder reports line granularity only; column is 0 for
    /// diagnostics coming from html5ever.
    pub column: u64,
}

/// One parse error: position, error code and its template variables.
///
/// `vars` is expected to be a JSON object; anything else is a contract violation
/// on the producer side and is surfaced by the conformance harness.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub position: Position,
    pub code: String,
    pub vars: serde_json::Value,
}

impl Diagnostic {
    pub fn new(line: u64, column: u64, code: impl Into<String>) -> Self {
        Self {
            position: Position { line, column },
            code: code.into(),
            vars: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_vars(mut self, vars: serde_json::Value) -> Self {
        self.vars = vars;
        self
    }

    pub fn vars_are_mapping(&self) -> bool {
        self.vars.is_object()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// The tree representation could not faithfully preserve an input construct.
    DataLoss,
    /// The request used something the backend or parser does not support.
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseWarning {
    pub kind: WarningKind,
    pub detail: String,
}

impl ParseWarning {
    pub fn data_loss(detail: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DataLoss,
            detail: detail.into(),
        }
    }

    pub fn unsupported(detail: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Unsupported,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::DataLoss => write!(f, "data loss: {}", self.detail),
            WarningKind::Unsupported => write!(f, "unsupported: {}", self.detail),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Disposition {
    #[default]
    Record,
    Fatal,
}

/// How warnings raised during one parse call are treated.
///
/// Passed to every parse call; there is no process-wide setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WarningPolicy {
    pub data_loss: Disposition,
    pub other: Disposition,
}

impl WarningPolicy {
    /// Every warning aborts the call.
    pub const fn strict() -> Self {
        Self {
            data_loss: Disposition::Fatal,
            other: Disposition::Fatal,
        }
    }

    pub const fn lenient() -> Self {
        Self {
            data_loss: Disposition::Record,
            other: Disposition::Record,
        }
    }

    pub fn disposition(&self, kind: WarningKind) -> Disposition {
        match kind {
            WarningKind::DataLoss => self.data_loss,
            WarningKind::Unsupported => self.other,
        }
    }
}

/// A warning promoted to a hard failure by the call's [`WarningPolicy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseFault {
    DataLoss(ParseWarning),
    Warning(ParseWarning),
}

impl ParseFault {
    pub fn warning(&self) -> &ParseWarning {
        match self {
            ParseFault::DataLoss(warning) | ParseFault::Warning(warning) => warning,
        }
    }
}

impl fmt::Display for ParseFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFault::DataLoss(warning) => write!(f, "fatal data-loss warning: {}", warning.detail),
            ParseFault::Warning(warning) => write!(f, "fatal warning: {warning}"),
        }
    }
}

impl std::error::Error for ParseFault {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_policy_makes_every_kind_fatal() {
        let policy = WarningPolicy::strict();
        assert_eq!(policy.disposition(WarningKind::DataLoss), Disposition::Fatal);
        assert_eq!(policy.disposition(WarningKind::Unsupported), Disposition::Fatal);
        assert_eq!(WarningPolicy::default(), WarningPolicy::lenient());
    }

    #[test]
    fn default_vars_are_an_empty_mapping() {
        let diagnostic = Diagnostic::new(3, 0, "unexpected-eof");
        assert!(diagnostic.vars_are_mapping());
        let bad = diagnostic.with_vars(serde_json::Value::String("bad".to_string()));
        assert!(!bad.vars_are_mapping());
    }
}
