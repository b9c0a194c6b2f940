use std::fmt;

use serde::Serialize;

use super::code::DiagnosticCode;
use crate::core::Span;

/// Severity level of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A message attached to a syntax node by the parser.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Diagnostic {
    severity: Severity,
    code: DiagnosticCode,
    message: String,
    span: Span,
    notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, span: Span) -> DiagnosticBuilder {
        DiagnosticBuilder::new(Severity::Error, code, span)
    }

    pub fn warning(code: DiagnosticCode, span: Span) -> DiagnosticBuilder {
        DiagnosticBuilder::new(Severity::Warning, code, span)
    }

    pub fn note(code: DiagnosticCode, span: Span) -> DiagnosticBuilder {
        DiagnosticBuilder::new(Severity::Note, code, span)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn code(&self) -> DiagnosticCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

/// Renders as `S100 at 4..9: unexpected token`, notes on following lines.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.code.as_str(), self.span, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

/// Builder for [`Diagnostic`].
pub struct DiagnosticBuilder {
    severity: Severity,
    code: DiagnosticCode,
    span: Span,
    message: Option<String>,
    notes: Vec<String>,
}

impl DiagnosticBuilder {
    fn new(severity: Severity, code: DiagnosticCode, span: Span) -> Self {
        Self {
            severity,
            code,
            span,
            message: None,
            notes: Vec::new(),
        }
    }

    /// Override the code's default message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        Diagnostic {
            severity: self.severity,
            code: self.code,
            message: self.message.unwrap_or_else(|| self.code.to_string()),
            span: self.span,
            notes: self.notes,
        }
    }
}
