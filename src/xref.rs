//! Cross-reference summaries.
//!
//! A cross-reference section records, for every object number defined in one
//! revision, whether that object is free, stored directly or packed inside an
//! object stream. Byte offsets are assigned by the serializer, so direct
//! entries only carry the generation number here.

use std::collections::BTreeMap;

/// Cross-reference table entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntryType {
    /// Entry for a free object
    Free,
    /// Entry for an object stored on its own
    Uncompressed,
    /// Entry for an object in an object stream (PDF 1.5+)
    Compressed,
}

/// Cross-reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XRefEntry {
    /// Type of entry
    pub entry_type: XRefEntryType,
    /// Object stream number for compressed entries, 0 otherwise
    pub container: u32,
    /// Generation number (free/uncompressed) or index within stream (compressed)
    pub generation: u32,
}

impl XRefEntry {
    /// Create a new uncompressed entry.
    pub fn uncompressed(generation: u16) -> Self {
        Self {
            entry_type: XRefEntryType::Uncompressed,
            container: 0,
            generation: u32::from(generation),
        }
    }

    /// Create a new compressed entry (object in object stream).
    pub fn compressed(stream_obj_num: u32, index_in_stream: u32) -> Self {
        Self {
            entry_type: XRefEntryType::Compressed,
            container: stream_obj_num,
            generation: index_in_stream,
        }
    }

    /// Create a new free entry.
    pub fn free(generation: u16) -> Self {
        Self {
            entry_type: XRefEntryType::Free,
            container: 0,
            generation: u32::from(generation),
        }
    }

    /// Whether the object is in use.
    pub fn in_use(&self) -> bool {
        self.entry_type != XRefEntryType::Free
    }
}

/// Cross-reference section of a single revision, ordered by object number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossRefSection {
    entries: BTreeMap<u32, XRefEntry>,
}

impl CrossRefSection {
    /// Create a new empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any previous entry for the object number.
    pub fn add_entry(&mut self, object_number: u32, entry: XRefEntry) {
        self.entries.insert(object_number, entry);
    }

    /// Get an entry by object number.
    pub fn get(&self, object_number: u32) -> Option<&XRefEntry> {
        self.entries.get(&object_number)
    }

    /// Entries in ascending object-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &XRefEntry)> + '_ {
        self.entries.iter().map(|(num, entry)| (*num, entry))
    }

    /// Number of entries that point into an object stream.
    pub fn compressed_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.entry_type == XRefEntryType::Compressed)
            .count()
    }

    /// Highest object number plus one (the `/Size` a serializer writes).
    pub fn size(&self) -> u32 {
        self.entries.keys().next_back().map_or(1, |last| last + 1)
    }

    /// Get the number of entries in the section.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the section is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
