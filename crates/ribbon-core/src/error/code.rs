use serde::Serialize;
use thiserror::Error;

/// Stable codes for diagnostics reported by the stylesheet parser.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Error, Serialize)]
pub enum DiagnosticCode {
    // Lexical (S001-S099)
    #[error("unrecognized character")]
    S001,
    #[error("unterminated string")]
    S002,
    #[error("malformed number")]
    S003,

    // Syntax (S100-S199)
    #[error("unexpected token")]
    S100,
    #[error("unclosed block")]
    S101,
    #[error("expected selector")]
    S102,
    #[error("expected property value")]
    S103,
    #[error("expected trigger action")]
    S104,
    #[error("expected keyframe")]
    S105,
}

impl DiagnosticCode {
    /// The code as written in messages, e.g. `"S100"`.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::S001 => "S001",
            DiagnosticCode::S002 => "S002",
            DiagnosticCode::S003 => "S003",
            DiagnosticCode::S100 => "S100",
            DiagnosticCode::S101 => "S101",
            DiagnosticCode::S102 => "S102",
            DiagnosticCode::S103 => "S103",
            DiagnosticCode::S104 => "S104",
            DiagnosticCode::S105 => "S105",
        }
    }
}
