mod code;
mod diagnostic;

pub use code::DiagnosticCode;
pub use diagnostic::{Diagnostic, DiagnosticBuilder, Severity};
