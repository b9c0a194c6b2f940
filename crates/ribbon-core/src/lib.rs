//! Shared types for the ribbon stylesheet compiler and command stream.
//!
//! - [`Segment`]: zero-copy string slice usable as a hash key
//! - [`Registry`]: name-to-index interning for named resources
//! - [`Span`] and [`Diagnostic`]: source locations and parser diagnostics

pub mod core;
pub mod error;

pub use self::core::{Registry, ResourceIndex, Segment, Span};
pub use error::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Severity};
