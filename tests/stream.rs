//! End-to-end command stream tests.
//!
//! These tests write streams the way a layout engine does and read them back
//! the way a renderer does.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use ribbon::Segment;
use ribbon::stream::{
    BlockInfo, Color, Command, CommandKind, CommandStream, Hyphen, IconRun, LayoutMetrics,
    LayoutSettings, LineInfo, Rect, ResourceSet, StreamConfig, StreamError, TextBuilder, TextRun,
    Wrapping,
};

struct Resources;

impl ResourceSet for Resources {
    type Style = String;
    type Font = (String, f32);
    type Icon = char;
    type GlyphShader = u32;
}

type Stream = CommandStream<Resources>;

fn text(offset: u32, length: u32) -> TextRun {
    TextRun {
        offset,
        length,
        bounds: Rect::new(offset as f32 * 7.0, 0.0, length as f32 * 7.0, 14.0),
    }
}

/// One command of every kind, in an order a layout engine could produce.
fn every_kind() -> Vec<Command> {
    let index = ribbon::ResourceIndex::from_raw;
    vec![
        Command::BlockInfo(BlockInfo {
            width: 120.0,
            height: 28.0,
            line_count: 2,
            text_length: 11,
        }),
        Command::LineInfo(LineInfo {
            length_in_commands: 9,
            line_number: 0,
            bounds: Rect::new(0.0, 0.0, 120.0, 14.0),
            baseline: 11.5,
        }),
        Command::ChangeSourceString(index(0)),
        Command::PushStyle(index(0)),
        Command::PushFont(index(1)),
        Command::PushColor(Color::new(0x12, 0x34, 0x56, 0x78)),
        Command::PushGlyphShader(index(2)),
        Command::ToggleBold,
        Command::Text(text(0, 5)),
        Command::ToggleItalic,
        Command::Hyphen(Hyphen {
            bounds: Rect::new(35.0, 0.0, 4.0, 14.0),
        }),
        Command::LineInfo(LineInfo {
            length_in_commands: 6,
            line_number: 1,
            bounds: Rect::new(0.0, 14.0, 120.0, 14.0),
            baseline: 25.5,
        }),
        Command::ChangeSourceStringBuilder(index(1)),
        Command::Icon(IconRun {
            icon: index(3),
            bounds: Rect::new(0.0, 14.0, 14.0, 14.0),
        }),
        Command::PopGlyphShader,
        Command::PopColor,
        Command::PopFont,
        Command::PopStyle,
    ]
}

fn write_all(stream: &mut Stream, commands: &[Command]) {
    for command in commands {
        match *command {
            Command::BlockInfo(info) => stream.write_block_info(info),
            Command::LineInfo(info) => stream.write_line_info(info),
            Command::Text(run) => stream.write_text(run),
            Command::Icon(run) => stream.write_icon(run),
            Command::ToggleBold => stream.write_toggle_bold(),
            Command::ToggleItalic => stream.write_toggle_italic(),
            Command::PushStyle(index) => stream.write_push_style(index),
            Command::PushFont(index) => stream.write_push_font(index),
            Command::PushColor(color) => stream.write_push_color(color),
            Command::PushGlyphShader(index) => stream.write_push_glyph_shader(index),
            Command::PopStyle => stream.write_pop_style(),
            Command::PopFont => stream.write_pop_font(),
            Command::PopColor => stream.write_pop_color(),
            Command::PopGlyphShader => stream.write_pop_glyph_shader(),
            Command::ChangeSourceString(index) => stream.write_change_source_string(index),
            Command::ChangeSourceStringBuilder(index) => {
                stream.write_change_source_string_builder(index)
            }
            Command::Hyphen(hyphen) => stream.write_hyphen(hyphen),
        }
    }
}

fn read_one(stream: &mut Stream, kind: CommandKind) -> Result<Command, StreamError> {
    Ok(match kind {
        CommandKind::BlockInfo => Command::BlockInfo(stream.read_block_info()?),
        CommandKind::LineInfo => Command::LineInfo(stream.read_line_info()?),
        CommandKind::Text => Command::Text(stream.read_text()?),
        CommandKind::Icon => Command::Icon(stream.read_icon()?),
        CommandKind::ToggleBold => stream.read_toggle_bold().map(|()| Command::ToggleBold)?,
        CommandKind::ToggleItalic => stream.read_toggle_italic().map(|()| Command::ToggleItalic)?,
        CommandKind::PushStyle => Command::PushStyle(stream.read_push_style()?),
        CommandKind::PushFont => Command::PushFont(stream.read_push_font()?),
        CommandKind::PushColor => Command::PushColor(stream.read_push_color()?),
        CommandKind::PushGlyphShader => {
            Command::PushGlyphShader(stream.read_push_glyph_shader()?)
        }
        CommandKind::PopStyle => stream.read_pop_style().map(|()| Command::PopStyle)?,
        CommandKind::PopFont => stream.read_pop_font().map(|()| Command::PopFont)?,
        CommandKind::PopColor => stream.read_pop_color().map(|()| Command::PopColor)?,
        CommandKind::PopGlyphShader => {
            stream.read_pop_glyph_shader().map(|()| Command::PopGlyphShader)?
        }
        CommandKind::ChangeSourceString => {
            Command::ChangeSourceString(stream.read_change_source_string()?)
        }
        CommandKind::ChangeSourceStringBuilder => {
            Command::ChangeSourceStringBuilder(stream.read_change_source_string_builder()?)
        }
        CommandKind::Hyphen => Command::Hyphen(stream.read_hyphen()?),
    })
}

// ============================================================================
// Writing and reading back
// ============================================================================

#[test]
fn every_kind_reads_back_as_written() {
    let commands = every_kind();
    let kinds: std::collections::HashSet<_> = commands.iter().map(Command::kind).collect();
    assert_eq!(kinds.len(), CommandKind::ALL.len());

    let mut stream = Stream::new();
    write_all(&mut stream, &commands);
    assert_eq!(stream.command_count(), commands.len());
    assert_eq!(stream.position(), commands.len());

    stream.seek(0).unwrap();
    let mut read = Vec::new();
    while let Some(kind) = stream.current_kind().unwrap() {
        read.push(read_one(&mut stream, kind).unwrap());
    }
    assert_eq!(read, commands);
}

#[test]
fn written_bytes_match_record_encoding() {
    let commands = every_kind();
    let mut stream = Stream::new();
    write_all(&mut stream, &commands);

    let expected: Vec<u8> = commands.iter().flat_map(Command::to_bytes).collect();
    let pinned = stream.acquire_pointers();
    assert_eq!(pinned.as_bytes(), expected.as_slice());
    assert_eq!(pinned.as_bytes()[0], CommandKind::BlockInfo.tag());
}

#[test]
fn commands_iterator_matches_writes() {
    let commands = every_kind();
    let mut stream = Stream::new();
    write_all(&mut stream, &commands);
    stream.seek(5).unwrap();

    let decoded: Vec<_> = stream.commands().collect::<Result<_, _>>().unwrap();
    assert_eq!(decoded, commands);
    assert_eq!(stream.position(), 5);
}

#[test]
fn read_of_wrong_kind_is_reported() {
    let mut stream = Stream::new();
    write_all(&mut stream, &every_kind());
    stream.seek(2).unwrap();
    assert_eq!(
        stream.read_text(),
        Err(StreamError::KindMismatch {
            expected: CommandKind::Text,
            found: CommandKind::ChangeSourceString,
            index: 2,
        })
    );
}

// ============================================================================
// Line navigation
// ============================================================================

/// Block header plus one line per entry, each with that many text runs.
fn lines(counts: &[u32]) -> Stream {
    let mut stream = Stream::new();
    stream.write_block_info(BlockInfo::default());
    for (number, &count) in counts.iter().enumerate() {
        let mark = stream.begin_line(LineInfo {
            line_number: number as u32,
            ..LineInfo::default()
        });
        for i in 0..count {
            stream.write_text(text(i, 1));
        }
        stream.end_line(mark).unwrap();
    }
    stream
}

#[test]
fn seek_to_first_line() {
    let mut stream = Stream::new();
    stream.write_block_info(BlockInfo::default());
    stream.write_line_info(LineInfo {
        length_in_commands: 2,
        ..LineInfo::default()
    });
    stream.write_text(text(0, 3));
    stream.write_text(text(3, 3));

    stream.seek_line(0).unwrap();
    assert_eq!(stream.position(), 2);
    assert_eq!(stream.current_kind().unwrap(), Some(CommandKind::Text));
    assert_eq!(stream.command_count(), 4);
}

#[test]
fn seek_line_lands_after_each_line_info() {
    let counts = [3, 0, 1, 4, 2];
    let mut stream = lines(&counts);
    assert_eq!(stream.line_count(), counts.len());

    let mut line_start = 1;
    for (line, &count) in counts.iter().enumerate() {
        stream.seek_line(line).unwrap();
        assert_eq!(stream.position(), line_start + 1, "line {line}");
        stream.seek(line_start).unwrap();
        let info = stream.read_line_info().unwrap();
        assert_eq!(info.line_number as usize, line);
        assert_eq!(info.length_in_commands, count);
        line_start += 1 + count as usize;
    }

    assert_eq!(
        stream.seek_line(counts.len()),
        Err(StreamError::LineOutOfRange {
            line: counts.len(),
            line_count: counts.len(),
        })
    );
}

#[test]
fn seek_next_line_visits_every_line() {
    let counts = [2, 1, 0, 3];
    let mut stream = lines(&counts);
    stream.seek(1).unwrap();

    let mut visited = vec![stream.position()];
    while stream.seek_next_line().unwrap() {
        assert_eq!(stream.current_kind().unwrap(), Some(CommandKind::LineInfo));
        visited.push(stream.position());
    }
    assert_eq!(visited, [1, 4, 6, 7]);
    assert_eq!(stream.position(), stream.command_count());
}

#[test]
fn seek_next_line_from_last_command_is_false() {
    let mut stream = lines(&[2, 2]);
    let last = stream.command_count() - 1;
    stream.seek(last).unwrap();
    assert!(!stream.seek_next_line().unwrap());
    assert_eq!(stream.current_kind().unwrap(), None);

    // anywhere before the last line has a next line
    stream.seek(2).unwrap();
    assert!(stream.seek_next_line().unwrap());
    assert_eq!(stream.current_kind().unwrap(), Some(CommandKind::LineInfo));
}

// ============================================================================
// Resources
// ============================================================================

#[test]
fn registration_is_idempotent_first_value_wins() {
    let mut stream = Stream::new();
    let first = stream.register_style("foo", "A".to_string());
    let second = stream.register_style("foo", "B".to_string());
    assert_eq!(first, second);
    assert_eq!(stream.style(first), "A");
    assert_eq!(stream.styles().len(), 1);

    // names are compared by content, including zero-copy slices
    let source: Arc<str> = Arc::from("header foo footer");
    let slice = Segment::new(source, 7..10).unwrap();
    assert_eq!(stream.register_style(slice, "C".to_string()), first);
}

#[test]
fn sources_are_registered_by_identity() {
    let mut stream = Stream::new();
    let a: Arc<str> = Arc::from("same");
    let b: Arc<str> = Arc::from("same");
    let builder: TextBuilder = Rc::new(RefCell::new(String::from("same")));

    let ia = stream.change_source_string(&a);
    let ib = stream.change_source_string(&b);
    let ic = stream.change_source_string_builder(&builder);
    assert_ne!(ia, ib);
    assert_eq!(stream.change_source_string(&a), ia);
    assert_eq!(stream.sources().len(), 3);
    assert!(stream.source(ic).is_builder());
    assert_eq!(&*stream.source(ib).text(), "same");
}

// ============================================================================
// Clearing and configuration
// ============================================================================

fn populate(stream: &mut Stream) {
    stream.register_font("body", ("Inter".to_string(), 14.0));
    stream.register_glyph_shader("outline", 7);
    stream.change_source_string(&Arc::from("hello"));
    write_all(stream, &every_kind());
    stream.set_source_text(Segment::from("hello"));
    stream.set_settings(LayoutSettings {
        wrapping: Wrapping::WholeWords,
        max_width: Some(120.0),
        ..LayoutSettings::default()
    });
    stream.set_metrics(LayoutMetrics {
        bounds: Rect::new(0.0, 0.0, 120.0, 28.0),
        width: 120.0,
        height: 28.0,
        total_length: 5,
    });
}

#[test]
fn cleared_stream_behaves_like_new() {
    let mut reused = Stream::new();
    populate(&mut reused);
    reused.clear();

    assert_eq!(reused.command_count(), 0);
    assert_eq!(reused.line_count(), 0);
    assert!(reused.fonts().is_empty());
    assert!(reused.glyph_shaders().is_empty());
    assert!(reused.sources().is_empty());
    assert!(reused.source_text().is_none());
    assert_eq!(reused.settings(), &LayoutSettings::default());
    assert_eq!(reused.bounds(), Rect::ZERO);
    assert_eq!(reused.width(), 0.0);
    assert_eq!(reused.height(), 0.0);
    assert_eq!(reused.total_length(), 0);

    let mut fresh = Stream::new();
    populate(&mut reused);
    populate(&mut fresh);
    assert_eq!(
        reused.acquire_pointers().as_bytes(),
        fresh.acquire_pointers().as_bytes()
    );
    assert_eq!(reused.line_count(), fresh.line_count());
    assert_eq!(reused.font_by_name("body"), fresh.font_by_name("body"));
    assert_eq!(reused.sources().len(), fresh.sources().len());
}

#[test]
fn stream_from_toml_config() {
    let config = StreamConfig::from_toml_str(
        r#"
        initial-capacity = 1024

        [layout]
        max-width = 200.0
        alignment = "justify"

        [parser]
        escapes = false
        "#,
    )
    .unwrap();

    let stream = Stream::with_config(config);
    assert_eq!(stream.settings().max_width, Some(200.0));
    assert!(!stream.parser_options().escapes);
    assert_eq!(stream.command_count(), 0);
}
