//! Source text objects referenced by `ChangeSource*` commands.
//!
//! Sources are registered by identity: two distinct allocations holding the
//! same characters get different indices, and registering the same
//! allocation again returns its existing index. Builders are mutable, so
//! their content can change after registration.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

use ribbon_core::ResourceIndex;

/// Shared, growable text buffer a layout engine may append to.
pub type TextBuilder = Rc<RefCell<String>>;

/// A registered source text object.
#[derive(Clone, Debug)]
pub enum Source {
    String(Arc<str>),
    Builder(TextBuilder),
}

impl Source {
    /// Borrow the current content.
    ///
    /// # Panics
    /// Panics if a builder source is mutably borrowed elsewhere.
    pub fn text(&self) -> SourceRef<'_> {
        match self {
            Source::String(text) => SourceRef::String(text),
            Source::Builder(builder) => SourceRef::Builder(builder.borrow()),
        }
    }

    pub fn is_builder(&self) -> bool {
        matches!(self, Source::Builder(_))
    }

    fn key(&self) -> SourceKey {
        match self {
            Source::String(text) => SourceKey::String(Arc::as_ptr(text) as *const u8 as usize),
            Source::Builder(builder) => SourceKey::Builder(Rc::as_ptr(builder) as usize),
        }
    }
}

/// Borrowed view of a [`Source`]'s text.
pub enum SourceRef<'a> {
    String(&'a str),
    Builder(Ref<'a, String>),
}

impl Deref for SourceRef<'_> {
    type Target = str;

    fn deref(&self) -> &str {
        match self {
            SourceRef::String(text) => text,
            SourceRef::Builder(text) => text.as_str(),
        }
    }
}

// Allocation addresses stay unique while the registry holds a clone.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum SourceKey {
    String(usize),
    Builder(usize),
}

/// Identity-keyed registry of source objects.
#[derive(Clone, Debug, Default)]
pub struct SourceRegistry {
    by_identity: HashMap<SourceKey, ResourceIndex>,
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_string(&mut self, text: &Arc<str>) -> ResourceIndex {
        self.register(Source::String(Arc::clone(text)))
    }

    pub fn register_builder(&mut self, builder: &TextBuilder) -> ResourceIndex {
        self.register(Source::Builder(Rc::clone(builder)))
    }

    fn register(&mut self, source: Source) -> ResourceIndex {
        let key = source.key();
        if let Some(&index) = self.by_identity.get(&key) {
            return index;
        }
        let index = ResourceIndex::from_raw(self.sources.len() as u32);
        self.by_identity.insert(key, index);
        self.sources.push(source);
        index
    }

    /// # Panics
    /// Panics if `index` was not handed out by this registry.
    pub fn get(&self, index: ResourceIndex) -> &Source {
        &self.sources[index.as_usize()]
    }

    pub fn try_get(&self, index: ResourceIndex) -> Option<&Source> {
        self.sources.get(index.as_usize())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_identity.clear();
        self.sources.clear();
    }
}
