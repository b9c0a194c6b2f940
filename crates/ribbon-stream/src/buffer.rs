//! Growable record buffer with a seekable cursor.
//!
//! Records differ in size by kind, so there is no O(1) random access by
//! index: seeking walks record boundaries, reading only each tag byte.

use log::trace;

use crate::command::{Command, CommandKind};
use crate::error::StreamError;

/// Cursor position: a record index and the byte offset where it starts.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Cursor {
    pub index: usize,
    pub offset: usize,
}

/// Append-only sequence of tagged records.
#[derive(Clone, Debug, Default)]
pub struct CommandBuffer {
    bytes: Vec<u8>,
    count: usize,
    cursor: Cursor,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Number of records written.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes written so far.
    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn index(&self) -> usize {
        self.cursor.index
    }

    /// Where the next written record will start.
    pub fn cursor_at_end(&self) -> Cursor {
        Cursor {
            index: self.count,
            offset: self.bytes.len(),
        }
    }

    pub fn at_end(&self) -> bool {
        self.cursor.index >= self.count
    }

    /// Make room for at least `additional` more bytes.
    pub fn reserve(&mut self, additional: usize) {
        let before = self.bytes.capacity();
        self.bytes.reserve(additional);
        if self.bytes.capacity() != before {
            trace!(
                "command buffer grew from {before} to {} bytes",
                self.bytes.capacity()
            );
        }
    }

    /// Append a record. The cursor ends up one past the new record.
    pub fn write(&mut self, command: &Command) {
        let len = command.kind().record_len();
        self.reserve(len);
        let start = self.bytes.len();
        self.bytes.resize(start + len, 0);
        command.encode_into(&mut self.bytes[start..]);
        self.count += 1;
        self.cursor = self.cursor_at_end();
    }

    /// Overwrite the record at `at` with one of the same kind.
    pub fn overwrite(&mut self, at: Cursor, command: &Command) -> Result<(), StreamError> {
        let found = self.kind_at(at)?;
        if found != command.kind() {
            return Err(StreamError::KindMismatch {
                expected: command.kind(),
                found,
                index: at.index,
            });
        }
        let end = at.offset + found.record_len();
        command.encode_into(&mut self.bytes[at.offset..end]);
        Ok(())
    }

    /// Kind of the record at the cursor, or `None` at the end.
    pub fn peek_kind(&self) -> Result<Option<CommandKind>, StreamError> {
        if self.at_end() {
            return Ok(None);
        }
        self.kind_at(self.cursor).map(Some)
    }

    /// Decode the record at the cursor without moving.
    pub fn read_current(&self) -> Result<Command, StreamError> {
        if self.at_end() {
            return Err(StreamError::EndOfStream);
        }
        Command::decode(&self.bytes[self.cursor.offset..])
    }

    /// Raw bytes of the record at the cursor.
    pub fn current_record(&self) -> Option<&[u8]> {
        let kind = self.peek_kind().ok().flatten()?;
        self.bytes
            .get(self.cursor.offset..self.cursor.offset + kind.record_len())
    }

    /// Put the cursor back at a position saved with [`cursor`](CommandBuffer::cursor).
    pub fn restore(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    pub fn seek_start(&mut self) {
        self.cursor = Cursor::default();
    }

    /// Move past the record at the cursor. Returns `false` at the end.
    pub fn seek_next(&mut self) -> Result<bool, StreamError> {
        let Some(kind) = self.peek_kind()? else {
            return Ok(false);
        };
        self.cursor.index += 1;
        self.cursor.offset += kind.record_len();
        Ok(true)
    }

    /// Move forward by `records`, failing if that passes the end.
    pub fn skip(&mut self, records: usize) -> Result<(), StreamError> {
        let target = self.cursor.index + records;
        if target > self.count {
            return Err(StreamError::IndexOutOfRange {
                index: target,
                count: self.count,
            });
        }
        while self.cursor.index < target {
            self.seek_next()?;
        }
        Ok(())
    }

    /// Move to record `index`; `count()` is a valid one-past-the-end target.
    pub fn seek(&mut self, index: usize) -> Result<(), StreamError> {
        if index > self.count {
            return Err(StreamError::IndexOutOfRange {
                index,
                count: self.count,
            });
        }
        if index < self.cursor.index {
            self.seek_start();
        }
        self.skip(index - self.cursor.index)
    }

    /// All written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode every record from the start, independent of the cursor.
    pub fn iter(&self) -> Records<'_> {
        Records {
            bytes: &self.bytes,
            offset: 0,
        }
    }

    /// Forget all records, keeping the allocation.
    pub fn clear(&mut self) {
        trace!(
            "clearing {} commands, retaining {} bytes",
            self.count,
            self.bytes.capacity()
        );
        self.bytes.clear();
        self.count = 0;
        self.cursor = Cursor::default();
    }

    fn kind_at(&self, at: Cursor) -> Result<CommandKind, StreamError> {
        let tag = *self
            .bytes
            .get(at.offset)
            .ok_or(StreamError::UnexpectedEnd)?;
        CommandKind::try_from(tag)
    }
}

/// Iterator over decoded records, see [`CommandBuffer::iter`].
pub struct Records<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl Iterator for Records<'_> {
    type Item = Result<Command, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.bytes.len() {
            return None;
        }
        let result = Command::decode(&self.bytes[self.offset..]);
        match &result {
            Ok(command) => self.offset += command.kind().record_len(),
            // Stop after the first fault.
            Err(_) => self.offset = self.bytes.len(),
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{LineInfo, TextRun};
    use ribbon_core::ResourceIndex;

    fn text(offset: u32) -> Command {
        Command::Text(TextRun {
            offset,
            length: 1,
            ..TextRun::default()
        })
    }

    #[test]
    fn write_advances_cursor_to_count() {
        let mut buffer = CommandBuffer::new();
        buffer.write(&Command::ToggleBold);
        buffer.write(&text(0));
        assert_eq!(buffer.count(), 2);
        assert_eq!(buffer.index(), 2);
        assert_eq!(
            buffer.len_bytes(),
            CommandKind::ToggleBold.record_len() + CommandKind::Text.record_len()
        );
    }

    #[test]
    fn seek_walks_mixed_sizes() {
        let mut buffer = CommandBuffer::new();
        buffer.write(&Command::PopFont);
        buffer.write(&text(4));
        buffer.write(&Command::PushStyle(ResourceIndex::from_raw(1)));
        buffer.write(&text(9));

        buffer.seek(3).unwrap();
        assert_eq!(buffer.read_current().unwrap(), text(9));
        buffer.seek(1).unwrap();
        assert_eq!(buffer.read_current().unwrap(), text(4));
        assert_eq!(buffer.cursor().offset, 1);

        buffer.seek(4).unwrap();
        assert!(buffer.at_end());
        assert_eq!(buffer.peek_kind(), Ok(None));
        assert_eq!(buffer.read_current(), Err(StreamError::EndOfStream));
    }

    #[test]
    fn seek_past_end_fails() {
        let mut buffer = CommandBuffer::new();
        buffer.write(&Command::PopStyle);
        assert_eq!(
            buffer.seek(2),
            Err(StreamError::IndexOutOfRange { index: 2, count: 1 })
        );
    }

    #[test]
    fn seek_next_reports_end() {
        let mut buffer = CommandBuffer::new();
        buffer.write(&Command::PopColor);
        buffer.seek_start();
        assert_eq!(buffer.seek_next(), Ok(true));
        assert_eq!(buffer.seek_next(), Ok(false));
        assert_eq!(buffer.index(), 1);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buffer = CommandBuffer::with_capacity(4);
        for i in 0..64 {
            buffer.write(&text(i));
        }
        let capacity = buffer.capacity();
        buffer.clear();
        assert_eq!(buffer.count(), 0);
        assert_eq!(buffer.len_bytes(), 0);
        assert_eq!(buffer.capacity(), capacity);
    }

    #[test]
    fn overwrite_same_kind_only() {
        let mut buffer = CommandBuffer::new();
        buffer.write(&Command::LineInfo(LineInfo::default()));
        buffer.write(&text(0));
        let line_at = Cursor::default();

        let patched = Command::LineInfo(LineInfo {
            length_in_commands: 1,
            ..LineInfo::default()
        });
        buffer.overwrite(line_at, &patched).unwrap();
        buffer.seek_start();
        assert_eq!(buffer.read_current().unwrap(), patched);

        let err = buffer.overwrite(line_at, &text(3)).unwrap_err();
        assert!(matches!(err, StreamError::KindMismatch { index: 0, .. }));
    }

    #[test]
    fn iter_decodes_everything() {
        let mut buffer = CommandBuffer::new();
        buffer.write(&Command::ToggleItalic);
        buffer.write(&text(2));
        buffer.seek(1).unwrap();
        let commands: Vec<_> = buffer.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(commands, vec![Command::ToggleItalic, text(2)]);
        // iteration does not move the cursor
        assert_eq!(buffer.index(), 1);
    }

    #[test]
    fn current_record_bytes() {
        let mut buffer = CommandBuffer::new();
        buffer.write(&Command::PushFont(ResourceIndex::from_raw(2)));
        buffer.seek_start();
        assert_eq!(buffer.current_record(), Some(&[0x11, 2, 0, 0, 0][..]));
    }
}
