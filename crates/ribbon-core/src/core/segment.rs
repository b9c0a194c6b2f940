use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, Range};
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// A borrowed-by-reference slice of a shared string buffer.
///
/// Equality, ordering and hashing look at the referenced characters only, so
/// two segments cut from different buffers compare equal when their text is
/// equal. `Segment` borrows as `str`, which lets a `HashMap<Segment, _>` be
/// probed with a plain `&str` without allocating a key.
#[derive(Clone)]
pub struct Segment {
    buffer: Arc<str>,
    start: u32,
    len: u32,
}

impl Segment {
    /// Slice `range` out of `buffer`.
    ///
    /// Returns `None` if the range is out of bounds or does not fall on
    /// char boundaries.
    pub fn new(buffer: Arc<str>, range: Range<usize>) -> Option<Self> {
        buffer.get(range.clone())?;
        Some(Self {
            buffer,
            start: u32::try_from(range.start).ok()?,
            len: u32::try_from(range.end - range.start).ok()?,
        })
    }

    /// A segment covering all of `buffer`.
    pub fn whole(buffer: Arc<str>) -> Self {
        let len = buffer.len() as u32;
        Self {
            buffer,
            start: 0,
            len,
        }
    }

    /// Re-slice relative to this segment, sharing the same buffer.
    pub fn slice(&self, range: Range<usize>) -> Option<Self> {
        if range.end > self.len as usize || range.start > range.end {
            return None;
        }
        let base = self.start as usize;
        Self::new(
            Arc::clone(&self.buffer),
            base + range.start..base + range.end,
        )
    }

    pub fn as_str(&self) -> &str {
        let start = self.start as usize;
        &self.buffer[start..start + self.len as usize]
    }

    /// Byte range of this segment within its buffer.
    pub fn range(&self) -> Range<usize> {
        let start = self.start as usize;
        start..start + self.len as usize
    }

    /// The buffer this segment points into.
    pub fn buffer(&self) -> &Arc<str> {
        &self.buffer
    }

    /// Whether both segments point into the same allocation.
    pub fn shares_buffer(&self, other: &Segment) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::whole(Arc::from(""))
    }
}

impl Deref for Segment {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Segment {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Segment {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Segment {}

impl PartialEq<str> for Segment {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Segment {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

// Must agree with `str`'s Hash for the `Borrow<str>` lookups to work.
impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Self::whole(Arc::from(s))
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Self::whole(Arc::from(s))
    }
}

impl From<Arc<str>> for Segment {
    fn from(buffer: Arc<str>) -> Self {
        Self::whole(buffer)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
