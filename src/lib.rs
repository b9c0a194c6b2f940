//! # ribbon
//!
//! A two-stage text and style pipeline:
//!
//! - [`style`]: compiles stylesheet syntax trees into rule sets, triggers
//!   and storyboards
//! - [`stream`]: the command stream a text layout engine writes and a
//!   renderer reads
//! - [`core`]: string segments, registries and diagnostics shared by both

pub use ribbon_core as core;
pub use ribbon_stream as stream;
pub use ribbon_style as style;

pub use ribbon_core::{Diagnostic, Registry, ResourceIndex, Segment, Span};
pub use ribbon_stream::{Command, CommandKind, CommandStream, ResourceSet, StreamError};
pub use ribbon_style::{Document, StyleError, compile};
