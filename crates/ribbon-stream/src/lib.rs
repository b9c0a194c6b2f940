//! # ribbon-stream - laid-out text as a command stream
//!
//! A layout engine writes a compact sequence of tagged records describing a
//! block of text: lines, text runs, icons and the style changes between
//! them. A renderer reads the records back, seeking by record index or by
//! line, and resolves the indices they carry against the stream's
//! registries.
//!
//! ## Overview
//!
//! - **Writing**: [`CommandStream::write_text`], [`CommandStream::begin_line`]
//!   and friends, one method per [`CommandKind`]
//! - **Reading**: [`CommandStream::seek_line`], then the matching `read_*`
//!   method, or [`replay`] into a [`CommandSink`]
//! - **Resources**: styles, fonts, icons and glyph shaders are interned by
//!   name; source texts are interned by identity
//!
//! ## Example
//!
//! ```ignore
//! use ribbon_stream::{BlockInfo, CommandStream, LineInfo, TextRun};
//!
//! let mut stream: CommandStream<MyResources> = CommandStream::new();
//! stream.write_block_info(BlockInfo::default());
//! let line = stream.begin_line(LineInfo::default());
//! stream.write_text(TextRun { offset: 0, length: 5, ..TextRun::default() });
//! stream.end_line(line)?;
//!
//! stream.seek_line(0)?;
//! let run = stream.read_text()?;
//! ```

pub mod buffer;
pub mod command;
pub mod error;
pub mod geometry;
pub mod replay;
pub mod settings;
pub mod source;
pub mod stream;

pub use buffer::{CommandBuffer, Cursor, Records};
pub use command::{BlockInfo, Command, CommandKind, Hyphen, IconRun, LineInfo, TextRun};
pub use error::StreamError;
pub use geometry::{Color, Rect};
pub use replay::{CommandSink, replay};
pub use settings::{Alignment, ConfigError, LayoutSettings, ParserOptions, StreamConfig, Wrapping};
pub use source::{Source, SourceRef, SourceRegistry, TextBuilder};
pub use stream::{CommandStream, LayoutMetrics, LineMark, PinnedStream, ResourceSet};
