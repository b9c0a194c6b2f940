//! Error types for stylesheet compilation.

use std::fmt;
use std::num::ParseFloatError;

use ribbon_core::Diagnostic;
use thiserror::Error;

use crate::syntax::{SyntaxKind, TokenKind};

/// Errors that can occur when compiling a syntax tree.
#[derive(Debug, Error)]
pub enum StyleError {
    /// The tree carries error diagnostics; nothing was compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The tree does not have the shape the compiler expects.
    #[error(transparent)]
    Internal(#[from] InternalError),

    #[error("invalid keyframe time '{text}': {source}")]
    InvalidTime {
        text: String,
        #[source]
        source: ParseFloatError,
    },
}

/// Every error-severity diagnostic found in the input tree.
#[derive(Clone, Debug, PartialEq)]
pub struct CompileError {
    diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// The parser produced a tree the compiler cannot read.
///
/// This is a grammar and compiler mismatch, never a problem with the
/// stylesheet being compiled.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("unexpected {found:?} node inside {parent:?}")]
    UnexpectedNode { parent: SyntaxKind, found: SyntaxKind },

    #[error("{node:?} node has no {token:?} token")]
    MissingToken { node: SyntaxKind, token: TokenKind },

    #[error("{node:?} node has no {child:?} child")]
    MissingNode { node: SyntaxKind, child: SyntaxKind },

    #[error("unknown comparison operator '{0}'")]
    UnknownOperator(String),

    #[error("unknown loop behavior '{0}'")]
    UnknownLoopBehavior(String),

    #[error("unknown child qualifier '{0}'")]
    UnknownQualifier(String),
}

/// Errors that can occur when loading compiler options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse compiler options: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use ribbon_core::{DiagnosticCode, Span};

    #[test]
    fn compile_error_joins_diagnostics_by_line() {
        let error = CompileError::new(vec![
            Diagnostic::error(DiagnosticCode::S102, Span::new(0, 1)).build(),
            Diagnostic::error(DiagnosticCode::S103, Span::new(4, 9))
                .message("expected a value after ':'")
                .build(),
        ]);
        assert_eq!(
            error.to_string(),
            "S102 at 0..1: expected selector\nS103 at 4..9: expected a value after ':'"
        );
    }

    #[test]
    fn style_error_is_transparent() {
        let error = StyleError::from(InternalError::UnknownOperator("=~".into()));
        assert_eq!(error.to_string(), "unknown comparison operator '=~'");
    }
}
