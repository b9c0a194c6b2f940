//! Replaying a stream into a renderer.
//!
//! [`replay`] decodes every record in order, resolves resource indices
//! against the stream's registries and slices text runs out of the current
//! source, then hands the results to a [`CommandSink`].
//!
//! Text runs resolve against the source selected by the most recent
//! `ChangeSource*` record. Before any such record they resolve against the
//! stream's [`source_text`](CommandStream::source_text).

use ribbon_core::{Registry, ResourceIndex};

use crate::command::{BlockInfo, Command, Hyphen, IconRun, LineInfo, TextRun};
use crate::error::StreamError;
use crate::geometry::Color;
use crate::source::Source;
use crate::stream::{CommandStream, ResourceSet};

/// Receives resolved commands from [`replay`].
///
/// Every method defaults to doing nothing, so a sink only implements what
/// it draws.
#[allow(unused_variables)]
pub trait CommandSink<R: ResourceSet> {
    fn block(&mut self, info: &BlockInfo) {}

    fn line(&mut self, info: &LineInfo) {}

    /// A run of text; `text` is the run's slice of the current source.
    fn text(&mut self, run: &TextRun, text: &str) {}

    fn icon(&mut self, run: &IconRun, icon: &R::Icon) {}

    fn hyphen(&mut self, hyphen: &Hyphen) {}

    fn toggle_bold(&mut self) {}

    fn toggle_italic(&mut self) {}

    fn push_style(&mut self, style: &R::Style) {}

    fn pop_style(&mut self) {}

    fn push_font(&mut self, font: &R::Font) {}

    fn pop_font(&mut self) {}

    fn push_color(&mut self, color: Color) {}

    fn pop_color(&mut self) {}

    fn push_glyph_shader(&mut self, shader: &R::GlyphShader) {}

    fn pop_glyph_shader(&mut self) {}

    fn source_changed(&mut self, source: &Source) {}
}

/// Replay every record of `stream` into `sink`.
///
/// Stops at the first record that fails to decode or refers to something the
/// stream never registered. The stream's cursor is not moved.
pub fn replay<R, S>(stream: &CommandStream<R>, sink: &mut S) -> Result<(), StreamError>
where
    R: ResourceSet,
    S: CommandSink<R>,
{
    let mut current: Option<&Source> = None;

    for command in stream.commands() {
        match command? {
            Command::BlockInfo(info) => sink.block(&info),
            Command::LineInfo(info) => sink.line(&info),
            Command::Text(run) => {
                let invalid = StreamError::InvalidTextRun {
                    offset: run.offset,
                    length: run.length,
                };
                let range = run.range();
                match current {
                    Some(source) => {
                        let text = source.text();
                        let slice = range.and_then(|r| text.get(r)).ok_or(invalid)?;
                        sink.text(&run, slice);
                    }
                    None => {
                        let text = stream.source_text().ok_or(invalid.clone())?;
                        let slice = range.and_then(|r| text.get(r)).ok_or(invalid)?;
                        sink.text(&run, slice);
                    }
                }
            }
            Command::Icon(run) => sink.icon(&run, lookup(stream.icons(), "icon", run.icon)?),
            Command::Hyphen(hyphen) => sink.hyphen(&hyphen),
            Command::ToggleBold => sink.toggle_bold(),
            Command::ToggleItalic => sink.toggle_italic(),
            Command::PushStyle(index) => sink.push_style(lookup(stream.styles(), "style", index)?),
            Command::PopStyle => sink.pop_style(),
            Command::PushFont(index) => sink.push_font(lookup(stream.fonts(), "font", index)?),
            Command::PopFont => sink.pop_font(),
            Command::PushColor(color) => sink.push_color(color),
            Command::PopColor => sink.pop_color(),
            Command::PushGlyphShader(index) => {
                sink.push_glyph_shader(lookup(stream.glyph_shaders(), "glyph shader", index)?)
            }
            Command::PopGlyphShader => sink.pop_glyph_shader(),
            Command::ChangeSourceString(index) | Command::ChangeSourceStringBuilder(index) => {
                let source = stream
                    .sources()
                    .try_get(index)
                    .ok_or(StreamError::UnknownResource {
                        kind: "source",
                        index: index.as_u32(),
                    })?;
                sink.source_changed(source);
                current = Some(source);
            }
        }
    }

    Ok(())
}

fn lookup<'a, T>(
    registry: &'a Registry<T>,
    kind: &'static str,
    index: ResourceIndex,
) -> Result<&'a T, StreamError> {
    registry.try_get(index).ok_or(StreamError::UnknownResource {
        kind,
        index: index.as_u32(),
    })
}
