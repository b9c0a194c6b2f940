use std::collections::HashMap;

use super::segment::Segment;

/// Dense index of a registered resource.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct ResourceIndex(u32);

impl ResourceIndex {
    /// Rebuild an index from the raw value stored in a command record.
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Name-to-index interning table.
///
/// Registering a name that already exists returns the existing index and
/// drops the new value, so the first value registered under a name wins.
/// Indices are dense and start at zero.
#[derive(Clone, Debug)]
pub struct Registry<T> {
    by_name: HashMap<Segment, ResourceIndex>,
    entries: Vec<(Segment, T)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `name`, returning its index.
    pub fn register(&mut self, name: impl Into<Segment>, value: T) -> ResourceIndex {
        let name = name.into();
        if let Some(&index) = self.by_name.get(name.as_str()) {
            return index;
        }

        let index = ResourceIndex(self.entries.len() as u32);
        self.by_name.insert(name.clone(), index);
        self.entries.push((name, value));
        index
    }

    /// Look up the index registered for `name`.
    pub fn index_of(&self, name: &str) -> Option<ResourceIndex> {
        self.by_name.get(name).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.index_of(name).map(|index| self.get_by_index(index))
    }

    /// Resolve an index to its value.
    ///
    /// # Panics
    /// Panics if `index` was not handed out by this registry.
    pub fn get_by_index(&self, index: ResourceIndex) -> &T {
        &self.entries[index.as_usize()].1
    }

    pub fn try_get(&self, index: ResourceIndex) -> Option<&T> {
        self.entries.get(index.as_usize()).map(|(_, value)| value)
    }

    /// The name an index was registered under.
    pub fn name_of(&self, index: ResourceIndex) -> Option<&Segment> {
        self.entries.get(index.as_usize()).map(|(name, _)| name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceIndex, &Segment, &T)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, (name, value))| (ResourceIndex(i as u32), name, value))
    }

    /// Drop all entries, keeping allocated capacity for reuse.
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.entries.clear();
    }
}
