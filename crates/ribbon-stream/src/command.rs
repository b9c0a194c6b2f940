//! Command records and their binary encoding.
//!
//! # Record Layout
//!
//! Every record starts with a one-byte tag at offset 0, followed by the
//! payload fields for that kind packed little-endian with no padding:
//!
//! | Kind                        | Tag    | Payload                                       | Bytes |
//! |-----------------------------|--------|-----------------------------------------------|-------|
//! | `BlockInfo`                 | `0x01` | width, height: f32; lines, text length: u32   | 17    |
//! | `LineInfo`                  | `0x02` | commands, line: u32; x, y, w, h, baseline: f32| 29    |
//! | `Text`                      | `0x03` | offset, length: u32; x, y, w, h: f32          | 25    |
//! | `Icon`                      | `0x04` | icon: u32; x, y, w, h: f32                    | 21    |
//! | `ToggleBold`                | `0x05` | (none)                                        | 1     |
//! | `ToggleItalic`              | `0x06` | (none)                                        | 1     |
//! | `PushStyle`                 | `0x10` | style: u32                                    | 5     |
//! | `PushFont`                  | `0x11` | font: u32                                     | 5     |
//! | `PushColor`                 | `0x12` | rgba: u32                                     | 5     |
//! | `PushGlyphShader`           | `0x13` | shader: u32                                   | 5     |
//! | `PopStyle` .. `PopGlyphShader` | `0x18`-`0x1B` | (none)                             | 1     |
//! | `ChangeSourceString`        | `0x20` | source: u32                                   | 5     |
//! | `ChangeSourceStringBuilder` | `0x21` | source: u32                                   | 5     |
//! | `Hyphen`                    | `0x30` | x, y, w, h: f32                               | 17    |
//!
//! The layout is an in-process exchange format between a layout producer and
//! a renderer; it is not versioned for storage.

use ribbon_core::ResourceIndex;

use crate::error::StreamError;
use crate::geometry::{Color, Rect};

/// Discriminant stored in the first byte of every record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum CommandKind {
    BlockInfo = 0x01,
    LineInfo = 0x02,
    Text = 0x03,
    Icon = 0x04,
    ToggleBold = 0x05,
    ToggleItalic = 0x06,
    PushStyle = 0x10,
    PushFont = 0x11,
    PushColor = 0x12,
    PushGlyphShader = 0x13,
    PopStyle = 0x18,
    PopFont = 0x19,
    PopColor = 0x1A,
    PopGlyphShader = 0x1B,
    ChangeSourceString = 0x20,
    ChangeSourceStringBuilder = 0x21,
    Hyphen = 0x30,
}

impl CommandKind {
    pub const ALL: [CommandKind; 17] = [
        CommandKind::BlockInfo,
        CommandKind::LineInfo,
        CommandKind::Text,
        CommandKind::Icon,
        CommandKind::ToggleBold,
        CommandKind::ToggleItalic,
        CommandKind::PushStyle,
        CommandKind::PushFont,
        CommandKind::PushColor,
        CommandKind::PushGlyphShader,
        CommandKind::PopStyle,
        CommandKind::PopFont,
        CommandKind::PopColor,
        CommandKind::PopGlyphShader,
        CommandKind::ChangeSourceString,
        CommandKind::ChangeSourceStringBuilder,
        CommandKind::Hyphen,
    ];

    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Payload size in bytes, excluding the tag.
    pub const fn payload_len(self) -> usize {
        match self {
            CommandKind::BlockInfo => 16,
            CommandKind::LineInfo => 28,
            CommandKind::Text => 24,
            CommandKind::Icon => 20,
            CommandKind::Hyphen => 16,
            CommandKind::PushStyle
            | CommandKind::PushFont
            | CommandKind::PushColor
            | CommandKind::PushGlyphShader
            | CommandKind::ChangeSourceString
            | CommandKind::ChangeSourceStringBuilder => 4,
            CommandKind::ToggleBold
            | CommandKind::ToggleItalic
            | CommandKind::PopStyle
            | CommandKind::PopFont
            | CommandKind::PopColor
            | CommandKind::PopGlyphShader => 0,
        }
    }

    /// Full record size including the tag byte.
    pub const fn record_len(self) -> usize {
        1 + self.payload_len()
    }
}

impl TryFrom<u8> for CommandKind {
    type Error = StreamError;

    fn try_from(tag: u8) -> Result<Self, StreamError> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or(StreamError::InvalidCommand(tag))
    }
}

/// Header record describing the laid-out block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockInfo {
    pub width: f32,
    pub height: f32,
    pub line_count: u32,
    pub text_length: u32,
}

/// Start of a line.
///
/// `length_in_commands` counts the records belonging to the line, not
/// including this one, so a reader can skip the whole line at once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineInfo {
    pub length_in_commands: u32,
    pub line_number: u32,
    pub bounds: Rect,
    pub baseline: f32,
}

/// A run of text from the current source, `offset..offset + length` in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextRun {
    pub offset: u32,
    pub length: u32,
    pub bounds: Rect,
}

impl TextRun {
    /// Byte range of the run, `None` if `offset + length` overflows.
    pub fn range(&self) -> Option<std::ops::Range<usize>> {
        let end = self.offset.checked_add(self.length)?;
        Some(self.offset as usize..end as usize)
    }
}

/// An inline icon referenced by registry index.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IconRun {
    pub icon: ResourceIndex,
    pub bounds: Rect,
}

/// A hyphen inserted at a soft break.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hyphen {
    pub bounds: Rect,
}

/// One decoded record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    BlockInfo(BlockInfo),
    LineInfo(LineInfo),
    Text(TextRun),
    Icon(IconRun),
    ToggleBold,
    ToggleItalic,
    PushStyle(ResourceIndex),
    PushFont(ResourceIndex),
    PushColor(Color),
    PushGlyphShader(ResourceIndex),
    PopStyle,
    PopFont,
    PopColor,
    PopGlyphShader,
    ChangeSourceString(ResourceIndex),
    ChangeSourceStringBuilder(ResourceIndex),
    Hyphen(Hyphen),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::BlockInfo(_) => CommandKind::BlockInfo,
            Command::LineInfo(_) => CommandKind::LineInfo,
            Command::Text(_) => CommandKind::Text,
            Command::Icon(_) => CommandKind::Icon,
            Command::ToggleBold => CommandKind::ToggleBold,
            Command::ToggleItalic => CommandKind::ToggleItalic,
            Command::PushStyle(_) => CommandKind::PushStyle,
            Command::PushFont(_) => CommandKind::PushFont,
            Command::PushColor(_) => CommandKind::PushColor,
            Command::PushGlyphShader(_) => CommandKind::PushGlyphShader,
            Command::PopStyle => CommandKind::PopStyle,
            Command::PopFont => CommandKind::PopFont,
            Command::PopColor => CommandKind::PopColor,
            Command::PopGlyphShader => CommandKind::PopGlyphShader,
            Command::ChangeSourceString(_) => CommandKind::ChangeSourceString,
            Command::ChangeSourceStringBuilder(_) => CommandKind::ChangeSourceStringBuilder,
            Command::Hyphen(_) => CommandKind::Hyphen,
        }
    }

    /// Encode into `out`, which must be exactly `kind().record_len()` bytes.
    ///
    /// The payload is written first and the tag stamped last.
    pub fn encode_into(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.kind().record_len());

        let mut writer = RecordWriter::new(&mut out[1..]);
        match self {
            Command::BlockInfo(info) => {
                writer.f32(info.width);
                writer.f32(info.height);
                writer.u32(info.line_count);
                writer.u32(info.text_length);
            }
            Command::LineInfo(info) => {
                writer.u32(info.length_in_commands);
                writer.u32(info.line_number);
                writer.rect(info.bounds);
                writer.f32(info.baseline);
            }
            Command::Text(run) => {
                writer.u32(run.offset);
                writer.u32(run.length);
                writer.rect(run.bounds);
            }
            Command::Icon(icon) => {
                writer.u32(icon.icon.as_u32());
                writer.rect(icon.bounds);
            }
            Command::Hyphen(hyphen) => writer.rect(hyphen.bounds),
            Command::PushColor(color) => writer.u32(color.to_packed()),
            Command::PushStyle(index)
            | Command::PushFont(index)
            | Command::PushGlyphShader(index)
            | Command::ChangeSourceString(index)
            | Command::ChangeSourceStringBuilder(index) => writer.u32(index.as_u32()),
            Command::ToggleBold
            | Command::ToggleItalic
            | Command::PopStyle
            | Command::PopFont
            | Command::PopColor
            | Command::PopGlyphShader => {}
        }

        out[0] = self.kind().tag();
    }

    /// Encode into a freshly allocated record.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0; self.kind().record_len()];
        self.encode_into(&mut out);
        out
    }

    /// Decode the record at the start of `bytes`. Trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Command, StreamError> {
        let tag = *bytes.first().ok_or(StreamError::UnexpectedEnd)?;
        let kind = CommandKind::try_from(tag)?;
        let payload = bytes
            .get(1..kind.record_len())
            .ok_or(StreamError::UnexpectedEnd)?;
        let mut reader = RecordReader::new(payload);

        let command = match kind {
            CommandKind::BlockInfo => Command::BlockInfo(BlockInfo {
                width: reader.f32()?,
                height: reader.f32()?,
                line_count: reader.u32()?,
                text_length: reader.u32()?,
            }),
            CommandKind::LineInfo => Command::LineInfo(LineInfo {
                length_in_commands: reader.u32()?,
                line_number: reader.u32()?,
                bounds: reader.rect()?,
                baseline: reader.f32()?,
            }),
            CommandKind::Text => Command::Text(TextRun {
                offset: reader.u32()?,
                length: reader.u32()?,
                bounds: reader.rect()?,
            }),
            CommandKind::Icon => Command::Icon(IconRun {
                icon: reader.index()?,
                bounds: reader.rect()?,
            }),
            CommandKind::Hyphen => Command::Hyphen(Hyphen {
                bounds: reader.rect()?,
            }),
            CommandKind::ToggleBold => Command::ToggleBold,
            CommandKind::ToggleItalic => Command::ToggleItalic,
            CommandKind::PushStyle => Command::PushStyle(reader.index()?),
            CommandKind::PushFont => Command::PushFont(reader.index()?),
            CommandKind::PushColor => Command::PushColor(Color::from_packed(reader.u32()?)),
            CommandKind::PushGlyphShader => Command::PushGlyphShader(reader.index()?),
            CommandKind::PopStyle => Command::PopStyle,
            CommandKind::PopFont => Command::PopFont,
            CommandKind::PopColor => Command::PopColor,
            CommandKind::PopGlyphShader => Command::PopGlyphShader,
            CommandKind::ChangeSourceString => Command::ChangeSourceString(reader.index()?),
            CommandKind::ChangeSourceStringBuilder => {
                Command::ChangeSourceStringBuilder(reader.index()?)
            }
        };
        Ok(command)
    }
}

struct RecordWriter<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> RecordWriter<'a> {
    fn new(out: &'a mut [u8]) -> Self {
        Self { out, pos: 0 }
    }

    fn u32(&mut self, value: u32) {
        self.out[self.pos..self.pos + 4].copy_from_slice(&value.to_le_bytes());
        self.pos += 4;
    }

    fn f32(&mut self, value: f32) {
        self.u32(value.to_bits());
    }

    fn rect(&mut self, rect: Rect) {
        self.f32(rect.x);
        self.f32(rect.y);
        self.f32(rect.width);
        self.f32(rect.height);
    }
}

struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn u32(&mut self) -> Result<u32, StreamError> {
        let bytes: [u8; 4] = self
            .data
            .get(self.pos..self.pos + 4)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(StreamError::UnexpectedEnd)?;
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes))
    }

    fn f32(&mut self) -> Result<f32, StreamError> {
        self.u32().map(f32::from_bits)
    }

    fn index(&mut self) -> Result<ResourceIndex, StreamError> {
        self.u32().map(ResourceIndex::from_raw)
    }

    fn rect(&mut self) -> Result<Rect, StreamError> {
        Ok(Rect::new(self.f32()?, self.f32()?, self.f32()?, self.f32()?))
    }
}
