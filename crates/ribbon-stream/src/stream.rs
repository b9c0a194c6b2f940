//! The command stream facade.
//!
//! A layout engine writes records and registers resources in one pass, then
//! records the layout metrics. A renderer later seeks through the same
//! stream. The stream is its own cursor, so there is exactly one reader
//! position at a time.
//!
//! Record 0 is conventionally a [`BlockInfo`] header; lines start at record 1.

use std::ops::Deref;
use std::sync::Arc;

use log::trace;
use ribbon_core::{Registry, ResourceIndex, Segment};

use crate::buffer::{CommandBuffer, Cursor, Records};
use crate::command::{BlockInfo, Command, CommandKind, Hyphen, IconRun, LineInfo, TextRun};
use crate::error::StreamError;
use crate::geometry::{Color, Rect};
use crate::settings::{LayoutSettings, ParserOptions, StreamConfig};
use crate::source::{Source, SourceRegistry, TextBuilder};

/// The resource types a stream interns.
///
/// The stream never inspects these values; it only maps names to indices so
/// records can refer to them with a `u32`.
pub trait ResourceSet {
    type Style;
    type Font;
    type Icon;
    type GlyphShader;
}

/// Metrics the layout engine computes once it has finished writing.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct LayoutMetrics {
    pub bounds: Rect,
    pub width: f32,
    pub height: f32,
    /// Characters of source text covered by the layout.
    pub total_length: usize,
}

/// Position of a `LineInfo` written with [`CommandStream::begin_line`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[must_use = "pass the mark to end_line to record the line length"]
pub struct LineMark {
    at: Cursor,
    info: LineInfo,
    generation: u64,
}

impl LineMark {
    /// Record index of the `LineInfo`.
    pub fn index(&self) -> usize {
        self.at.index
    }
}

macro_rules! marker_commands {
    ($($write:ident, $read:ident => $variant:ident),* $(,)?) => {
        $(
            #[doc = concat!("Append a `", stringify!($variant), "` command.")]
            pub fn $write(&mut self) {
                self.write(Command::$variant);
            }

            #[doc = concat!("Read the `", stringify!($variant), "` command at the cursor and move past it.")]
            pub fn $read(&mut self) -> Result<(), StreamError> {
                self.take(CommandKind::$variant).map(|_| ())
            }
        )*
    };
}

macro_rules! payload_commands {
    ($($write:ident, $read:ident => $variant:ident($ty:ty)),* $(,)?) => {
        $(
            #[doc = concat!("Append a `", stringify!($variant), "` command.")]
            pub fn $write(&mut self, value: $ty) {
                self.write(Command::$variant(value));
            }

            #[doc = concat!("Read the `", stringify!($variant), "` command at the cursor and move past it.")]
            pub fn $read(&mut self) -> Result<$ty, StreamError> {
                let index = self.buffer.index();
                match self.take(CommandKind::$variant)? {
                    Command::$variant(value) => Ok(value),
                    other => Err(StreamError::KindMismatch {
                        expected: CommandKind::$variant,
                        found: other.kind(),
                        index,
                    }),
                }
            }
        )*
    };
}

macro_rules! resource_registry {
    ($($ty:ident: $field:ident, $register:ident, $get:ident, $by_name:ident, $all:ident);* $(;)?) => {
        $(
            /// Intern a value by name; the first value registered for a name wins.
            pub fn $register(&mut self, name: impl Into<Segment>, value: R::$ty) -> ResourceIndex {
                self.$field.register(name, value)
            }

            /// # Panics
            /// Panics if `index` was not registered on this stream.
            pub fn $get(&self, index: ResourceIndex) -> &R::$ty {
                self.$field.get_by_index(index)
            }

            pub fn $by_name(&self, name: &str) -> Option<&R::$ty> {
                self.$field.get_by_name(name)
            }

            pub fn $all(&self) -> &Registry<R::$ty> {
                &self.$field
            }
        )*
    };
}

/// Command records plus the resources and metadata they refer to.
pub struct CommandStream<R: ResourceSet> {
    buffer: CommandBuffer,
    line_count: usize,
    // bumped by `clear` so marks from before it are rejected
    generation: u64,
    styles: Registry<R::Style>,
    fonts: Registry<R::Font>,
    icons: Registry<R::Icon>,
    glyph_shaders: Registry<R::GlyphShader>,
    sources: SourceRegistry,
    settings: LayoutSettings,
    parser_options: ParserOptions,
    source_text: Option<Segment>,
    metrics: LayoutMetrics,
}

impl<R: ResourceSet> Default for CommandStream<R> {
    fn default() -> Self {
        Self {
            buffer: CommandBuffer::new(),
            line_count: 0,
            generation: 0,
            styles: Registry::new(),
            fonts: Registry::new(),
            icons: Registry::new(),
            glyph_shaders: Registry::new(),
            sources: SourceRegistry::new(),
            settings: LayoutSettings::default(),
            parser_options: ParserOptions::default(),
            source_text: None,
            metrics: LayoutMetrics::default(),
        }
    }
}

impl<R: ResourceSet> CommandStream<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StreamConfig) -> Self {
        let mut stream = Self {
            settings: config.layout,
            parser_options: config.parser,
            ..Self::default()
        };
        stream.buffer.reserve(config.initial_capacity);
        stream
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Append any record.
    pub fn write(&mut self, command: Command) {
        self.buffer.write(&command);
        if command.kind() == CommandKind::LineInfo {
            self.line_count += 1;
        }
    }

    payload_commands! {
        write_block_info, read_block_info => BlockInfo(BlockInfo),
        write_line_info, read_line_info => LineInfo(LineInfo),
        write_text, read_text => Text(TextRun),
        write_icon, read_icon => Icon(IconRun),
        write_push_style, read_push_style => PushStyle(ResourceIndex),
        write_push_font, read_push_font => PushFont(ResourceIndex),
        write_push_color, read_push_color => PushColor(Color),
        write_push_glyph_shader, read_push_glyph_shader => PushGlyphShader(ResourceIndex),
        write_change_source_string, read_change_source_string => ChangeSourceString(ResourceIndex),
        write_change_source_string_builder, read_change_source_string_builder => ChangeSourceStringBuilder(ResourceIndex),
        write_hyphen, read_hyphen => Hyphen(Hyphen),
    }

    marker_commands! {
        write_toggle_bold, read_toggle_bold => ToggleBold,
        write_toggle_italic, read_toggle_italic => ToggleItalic,
        write_pop_style, read_pop_style => PopStyle,
        write_pop_font, read_pop_font => PopFont,
        write_pop_color, read_pop_color => PopColor,
        write_pop_glyph_shader, read_pop_glyph_shader => PopGlyphShader,
    }

    /// Register `text` and switch subsequent text runs to it.
    pub fn change_source_string(&mut self, text: &Arc<str>) -> ResourceIndex {
        let index = self.sources.register_string(text);
        self.write_change_source_string(index);
        index
    }

    /// Register `builder` and switch subsequent text runs to it.
    pub fn change_source_string_builder(&mut self, builder: &TextBuilder) -> ResourceIndex {
        let index = self.sources.register_builder(builder);
        self.write_change_source_string_builder(index);
        index
    }

    /// Write a `LineInfo` whose command count is filled in by [`end_line`].
    ///
    /// [`end_line`]: CommandStream::end_line
    pub fn begin_line(&mut self, info: LineInfo) -> LineMark {
        let at = self.buffer.cursor_at_end();
        let info = LineInfo {
            length_in_commands: 0,
            ..info
        };
        self.write_line_info(info);
        LineMark {
            at,
            info,
            generation: self.generation,
        }
    }

    /// Patch the line's `length_in_commands` to cover everything written since
    /// [`begin_line`](CommandStream::begin_line).
    ///
    /// A mark taken before the last [`clear`](CommandStream::clear) is
    /// rejected with [`StreamError::StaleLineMark`].
    pub fn end_line(&mut self, mark: LineMark) -> Result<(), StreamError> {
        if mark.generation != self.generation {
            return Err(StreamError::StaleLineMark { index: mark.at.index });
        }
        let length = self
            .buffer
            .count()
            .checked_sub(mark.at.index + 1)
            .ok_or(StreamError::IndexOutOfRange {
                index: mark.at.index,
                count: self.buffer.count(),
            })?;
        let info = LineInfo {
            length_in_commands: length as u32,
            ..mark.info
        };
        self.buffer.overwrite(mark.at, &Command::LineInfo(info))
    }

    // ------------------------------------------------------------------
    // Reading and seeking
    // ------------------------------------------------------------------

    /// Number of records written.
    pub fn command_count(&self) -> usize {
        self.buffer.count()
    }

    /// Number of `LineInfo` records written.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Index of the record at the cursor.
    pub fn position(&self) -> usize {
        self.buffer.index()
    }

    /// Kind of the record at the cursor, `None` at the end.
    pub fn current_kind(&self) -> Result<Option<CommandKind>, StreamError> {
        self.buffer.peek_kind()
    }

    /// Decode the record at the cursor without moving.
    pub fn peek_command(&self) -> Result<Command, StreamError> {
        self.buffer.read_current()
    }

    /// Decode the record at the cursor and move past it.
    pub fn read_command(&mut self) -> Result<Command, StreamError> {
        let command = self.buffer.read_current()?;
        self.buffer.seek_next()?;
        Ok(command)
    }

    /// Move to record `index` and report its kind.
    ///
    /// `index == command_count()` is allowed and yields `None`.
    pub fn seek(&mut self, index: usize) -> Result<Option<CommandKind>, StreamError> {
        self.buffer.seek(index)?;
        self.buffer.peek_kind()
    }

    /// Move to the first record after line `line`'s `LineInfo`.
    ///
    /// Walks `LineInfo` records from record 1, skipping each line whole.
    /// On failure the cursor stays where it was.
    pub fn seek_line(&mut self, line: usize) -> Result<(), StreamError> {
        if line >= self.line_count {
            return Err(StreamError::LineOutOfRange {
                line,
                line_count: self.line_count,
            });
        }
        let start = self.buffer.cursor();
        let walked = self.walk_to_line(line);
        if walked.is_err() {
            self.buffer.restore(start);
        }
        walked
    }

    fn walk_to_line(&mut self, line: usize) -> Result<(), StreamError> {
        self.buffer.seek(1)?;
        for _ in 0..line {
            let info = self.line_info_at_cursor()?;
            self.buffer.skip(1 + info.length_in_commands as usize)?;
        }
        self.line_info_at_cursor()?;
        self.buffer.seek_next()?;
        Ok(())
    }

    /// Move past the record at the cursor. Returns `false` at the end.
    pub fn seek_next_command(&mut self) -> Result<bool, StreamError> {
        self.buffer.seek_next()
    }

    /// Move to the next `LineInfo`, or to the end of the stream.
    ///
    /// From a `LineInfo` this jumps over the whole line; from anywhere else it
    /// scans forward. Returns whether a record follows the landing position.
    pub fn seek_next_line(&mut self) -> Result<bool, StreamError> {
        match self.buffer.peek_kind()? {
            None => return Ok(false),
            Some(CommandKind::LineInfo) => {
                let info = self.line_info_at_cursor()?;
                self.buffer.skip(1 + info.length_in_commands as usize)?;
            }
            Some(_) => {
                while self.buffer.seek_next()? {
                    if self.buffer.peek_kind()? == Some(CommandKind::LineInfo) {
                        break;
                    }
                }
            }
        }
        Ok(self.buffer.index() + 1 < self.buffer.count())
    }

    /// Decode every record from the start without moving the cursor.
    pub fn commands(&self) -> Records<'_> {
        self.buffer.iter()
    }

    /// Pin the backing buffer for raw byte access.
    ///
    /// No record can be written while the returned guard is alive; dropping
    /// it releases the pin.
    pub fn acquire_pointers(&mut self) -> PinnedStream<'_, R> {
        trace!("pinned {} command bytes", self.buffer.len_bytes());
        PinnedStream { stream: self }
    }

    fn take(&mut self, expected: CommandKind) -> Result<Command, StreamError> {
        let index = self.buffer.index();
        let found = self.buffer.peek_kind()?.ok_or(StreamError::EndOfStream)?;
        if found != expected {
            return Err(StreamError::KindMismatch {
                expected,
                found,
                index,
            });
        }
        self.read_command()
    }

    fn line_info_at_cursor(&self) -> Result<LineInfo, StreamError> {
        let index = self.buffer.index();
        match self.buffer.read_current()? {
            Command::LineInfo(info) => Ok(info),
            other => Err(StreamError::KindMismatch {
                expected: CommandKind::LineInfo,
                found: other.kind(),
                index,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    resource_registry! {
        Style: styles, register_style, style, style_by_name, styles;
        Font: fonts, register_font, font, font_by_name, fonts;
        Icon: icons, register_icon, icon, icon_by_name, icons;
        GlyphShader: glyph_shaders, register_glyph_shader, glyph_shader, glyph_shader_by_name, glyph_shaders;
    }

    pub fn register_source_string(&mut self, text: &Arc<str>) -> ResourceIndex {
        self.sources.register_string(text)
    }

    pub fn register_source_builder(&mut self, builder: &TextBuilder) -> ResourceIndex {
        self.sources.register_builder(builder)
    }

    /// # Panics
    /// Panics if `index` was not registered on this stream.
    pub fn source(&self, index: ResourceIndex) -> &Source {
        self.sources.get(index)
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: LayoutSettings) {
        self.settings = settings;
    }

    pub fn parser_options(&self) -> ParserOptions {
        self.parser_options
    }

    pub fn set_parser_options(&mut self, options: ParserOptions) {
        self.parser_options = options;
    }

    /// The slice of source text this layout covers.
    pub fn source_text(&self) -> Option<&Segment> {
        self.source_text.as_ref()
    }

    pub fn set_source_text(&mut self, text: Segment) {
        self.source_text = Some(text);
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn set_metrics(&mut self, metrics: LayoutMetrics) {
        self.metrics = metrics;
    }

    pub fn bounds(&self) -> Rect {
        self.metrics.bounds
    }

    pub fn width(&self) -> f32 {
        self.metrics.width
    }

    pub fn height(&self) -> f32 {
        self.metrics.height
    }

    pub fn total_length(&self) -> usize {
        self.metrics.total_length
    }

    /// Reset to the freshly constructed state, keeping allocations for reuse.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.line_count = 0;
        self.generation += 1;
        self.styles.clear();
        self.fonts.clear();
        self.icons.clear();
        self.glyph_shaders.clear();
        self.sources.clear();
        self.settings = LayoutSettings::default();
        self.parser_options = ParserOptions::default();
        self.source_text = None;
        self.metrics = LayoutMetrics::default();
    }
}

/// A stream whose backing bytes are pinned for direct access.
///
/// Holding the guard borrows the stream mutably, so nothing can grow or move
/// the buffer until it is dropped. Seeking is still allowed.
pub struct PinnedStream<'a, R: ResourceSet> {
    stream: &'a mut CommandStream<R>,
}

impl<R: ResourceSet> PinnedStream<'_, R> {
    /// Every written record byte.
    pub fn as_bytes(&self) -> &[u8] {
        self.stream.buffer.as_bytes()
    }

    /// Bytes of the record at the cursor, `None` at the end.
    pub fn current_record(&self) -> Option<&[u8]> {
        self.stream.buffer.current_record()
    }

    /// Byte offset of the cursor within [`as_bytes`](PinnedStream::as_bytes).
    pub fn byte_offset(&self) -> usize {
        self.stream.buffer.cursor().offset
    }

    pub fn seek(&mut self, index: usize) -> Result<Option<CommandKind>, StreamError> {
        self.stream.seek(index)
    }

    pub fn seek_line(&mut self, line: usize) -> Result<(), StreamError> {
        self.stream.seek_line(line)
    }

    pub fn seek_next_command(&mut self) -> Result<bool, StreamError> {
        self.stream.seek_next_command()
    }

    pub fn seek_next_line(&mut self) -> Result<bool, StreamError> {
        self.stream.seek_next_line()
    }

    pub fn read_command(&mut self) -> Result<Command, StreamError> {
        self.stream.read_command()
    }

    /// Release the pin explicitly; dropping the guard does the same.
    pub fn release(self) {}
}

impl<R: ResourceSet> Deref for PinnedStream<'_, R> {
    type Target = CommandStream<R>;

    fn deref(&self) -> &CommandStream<R> {
        &*self.stream
    }
}

impl<R: ResourceSet> Drop for PinnedStream<'_, R> {
    fn drop(&mut self) {
        trace!("released pinned command bytes");
    }
}
