//! Revisioned indirect-object store.
//!
//! A [`Document`] is an ordered list of [`Revision`]s, oldest first. Each
//! revision defines (or frees) a set of object numbers; the effective value
//! of a reference is the one from the newest revision that mentions it.
//! Lookups walk the revisions from newest to oldest, so history is kept
//! without copying and compaction only has to materialize that overlay.
//!
//! Object numbers come from a monotonic allocator. Freeing an object or
//! deleting a container never hands its number out again; only compaction
//! restarts the numbering.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use crate::xref::{CrossRefSection, XRefEntry};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Where an indirect object lives once serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// The object number is free as of this revision
    Free,
    /// Stored as a standalone indirect object
    Direct,
    /// Packed into an object stream at the given position
    Packed {
        /// The object stream holding this object
        container: ObjectRef,
        /// Position inside the object stream
        index: u32,
    },
}

/// Classification of an indirect object, derived from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Page tree node (`/Type /Pages`)
    Pages,
    /// Page tree leaf (`/Type /Page`)
    Page,
    /// Object stream container (`/Type /ObjStm`)
    ObjectStream,
    /// Cross-reference stream (`/Type /XRef`)
    XRefStream,
    /// Anything else, including free entries
    Other,
}

/// An indirect object record as stored in one revision.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    /// Identity of the object
    pub oref: ObjectRef,
    /// Object value (`Null` for free entries)
    pub value: Object,
    /// Declared type, overriding the value's `/Type` entry when set
    pub type_tag: Option<String>,
    /// Storage location status
    pub storage: Storage,
}

impl IndirectObject {
    /// Create a directly stored object.
    pub fn new(oref: ObjectRef, value: Object) -> Self {
        Self {
            oref,
            value,
            type_tag: None,
            storage: Storage::Direct,
        }
    }

    /// Create a free entry for `oref`.
    pub fn free(oref: ObjectRef) -> Self {
        Self {
            oref,
            value: Object::Null,
            type_tag: None,
            storage: Storage::Free,
        }
    }

    /// Attach a declared type.
    pub fn with_type(mut self, type_tag: impl Into<String>) -> Self {
        self.type_tag = Some(type_tag.into());
        self
    }

    /// Check if this record marks the object number as free.
    pub fn is_free(&self) -> bool {
        self.storage == Storage::Free
    }

    /// Declared type: the explicit tag, else the value's `/Type` name.
    pub fn object_type(&self) -> Option<&str> {
        self.type_tag.as_deref().or_else(|| self.value.dict_type())
    }

    /// Classify this object by its declared type.
    pub fn kind(&self) -> ObjectKind {
        if self.is_free() {
            return ObjectKind::Other;
        }
        match self.object_type() {
            Some("Pages") => ObjectKind::Pages,
            Some("Page") => ObjectKind::Page,
            Some("ObjStm") => ObjectKind::ObjectStream,
            Some("XRef") => ObjectKind::XRefStream,
            _ => ObjectKind::Other,
        }
    }
}

/// One layer of document history.
#[derive(Debug, Clone, Default)]
pub struct Revision {
    objects: IndexMap<u32, IndirectObject>,
    trailer: Dictionary,
}

impl Revision {
    /// Create a new empty revision.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for an object number.
    pub fn get(&self, id: u32) -> Option<&IndirectObject> {
        self.objects.get(&id)
    }

    /// Get the mutable record for an object number.
    pub fn get_mut(&mut self, id: u32) -> Option<&mut IndirectObject> {
        self.objects.get_mut(&id)
    }

    /// Check if this revision mentions the object number.
    pub fn contains(&self, id: u32) -> bool {
        self.objects.contains_key(&id)
    }

    /// Records in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &IndirectObject> + '_ {
        self.objects.values()
    }

    /// Mutable records in definition order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut IndirectObject> + '_ {
        self.objects.values_mut()
    }

    /// Add a record. A record with the same object number keeps its position.
    pub fn insert(&mut self, object: IndirectObject) {
        self.objects.insert(object.oref.id, object);
    }

    /// Remove a record, keeping the order of the others.
    pub fn remove(&mut self, id: u32) -> Option<IndirectObject> {
        self.objects.shift_remove(&id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the revision has no records.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Trailer dictionary of this revision.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Mutable trailer dictionary of this revision.
    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    /// Summarize every record's storage status.
    pub fn xref_section(&self) -> CrossRefSection {
        let mut section = CrossRefSection::new();
        for obj in self.objects.values() {
            let entry = match obj.storage {
                Storage::Free => XRefEntry::free(obj.oref.gen),
                Storage::Direct => XRefEntry::uncompressed(obj.oref.gen),
                Storage::Packed { container, index } => XRefEntry::compressed(container.id, index),
            };
            section.add_entry(obj.oref.id, entry);
        }
        section
    }
}

/// Revisioned store of indirect objects.
#[derive(Debug, Clone)]
pub struct Document {
    revisions: Vec<Revision>,
    next_oid: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with one empty revision.
    pub fn new() -> Self {
        Self {
            revisions: vec![Revision::new()],
            next_oid: 1,
        }
    }

    /// Number of revisions.
    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }

    /// All revisions, oldest first.
    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    /// Get a revision by index.
    pub fn revision(&self, index: usize) -> Option<&Revision> {
        self.revisions.get(index)
    }

    /// Get a mutable revision by index.
    pub fn revision_mut(&mut self, index: usize) -> Option<&mut Revision> {
        self.revisions.get_mut(index)
    }

    /// Index of the current (newest) revision.
    pub fn current_revision(&self) -> usize {
        self.revisions.len() - 1
    }

    /// Append a new empty revision and make it current.
    pub fn open_revision(&mut self) -> usize {
        self.revisions.push(Revision::new());
        log::debug!("Opened revision {}", self.revisions.len() - 1);
        self.current_revision()
    }

    /// The object number the next `add` will use.
    pub fn next_oid(&self) -> u32 {
        self.next_oid
    }

    fn allocate(&mut self) -> ObjectRef {
        let oref = ObjectRef::new(self.next_oid, 0);
        self.next_oid += 1;
        oref
    }

    /// Add a value to the current revision under a fresh object number.
    pub fn add(&mut self, value: Object) -> ObjectRef {
        let oref = self.allocate();
        let current = self.current_revision();
        self.revisions[current].insert(IndirectObject::new(oref, value));
        oref
    }

    /// Add a value with a declared type to the current revision.
    pub fn add_typed(&mut self, value: Object, type_tag: &str) -> ObjectRef {
        let oref = self.allocate();
        let current = self.current_revision();
        self.revisions[current].insert(IndirectObject::new(oref, value).with_type(type_tag));
        oref
    }

    /// Add a value to a specific revision under a fresh object number.
    pub fn add_to(&mut self, value: Object, revision: usize) -> Result<ObjectRef> {
        if revision >= self.revisions.len() {
            return Err(Error::RevisionNotFound(revision));
        }
        let oref = self.allocate();
        self.revisions[revision].insert(IndirectObject::new(oref, value));
        Ok(oref)
    }

    /// Insert a fully formed record, as a parser populating the store does.
    ///
    /// The allocator moves past the inserted object number.
    pub fn insert(&mut self, revision: usize, object: IndirectObject) -> Result<()> {
        let rev = self
            .revisions
            .get_mut(revision)
            .ok_or(Error::RevisionNotFound(revision))?;
        self.next_oid = self.next_oid.max(object.oref.id + 1);
        rev.insert(object);
        Ok(())
    }

    /// Index of the newest revision mentioning `id`.
    fn defining_revision(&self, id: u32) -> Option<usize> {
        self.revisions.iter().rposition(|rev| rev.contains(id))
    }

    /// The effective record for an object number, ignoring generations.
    fn effective(&self, id: u32) -> Option<&IndirectObject> {
        let index = self.defining_revision(id)?;
        self.revisions[index].get(id).filter(|obj| !obj.is_free())
    }

    /// Effective record for a reference; `None` if free or undefined.
    pub fn object(&self, oref: ObjectRef) -> Option<&IndirectObject> {
        self.effective(oref.id).filter(|obj| obj.oref.gen == oref.gen)
    }

    /// Mutable effective record for a reference.
    ///
    /// Edits apply to the record in whichever revision defines it.
    pub fn object_mut(&mut self, oref: ObjectRef) -> Option<&mut IndirectObject> {
        let index = self.defining_revision(oref.id)?;
        self.revisions[index]
            .get_mut(oref.id)
            .filter(|obj| !obj.is_free() && obj.oref.gen == oref.gen)
    }

    /// Effective value for a reference; `None` if free or undefined.
    pub fn resolve(&self, oref: ObjectRef) -> Option<&Object> {
        self.object(oref).map(|obj| &obj.value)
    }

    /// Mutable effective value for a reference.
    pub fn resolve_mut(&mut self, oref: ObjectRef) -> Option<&mut Object> {
        self.object_mut(oref).map(|obj| &mut obj.value)
    }

    /// Check if a reference has an effective value.
    pub fn contains(&self, oref: ObjectRef) -> bool {
        self.object(oref).is_some()
    }

    /// Replace the effective value of a reference, returning the old value.
    pub fn replace(&mut self, oref: ObjectRef, value: Object) -> Result<Object> {
        let obj = self
            .object_mut(oref)
            .ok_or(Error::ObjectNotFound(oref.id, oref.gen))?;
        Ok(std::mem::replace(&mut obj.value, value))
    }

    /// Dictionary of a dictionary or stream object.
    pub fn dict(&self, oref: ObjectRef) -> Result<&Dictionary> {
        let value = self
            .resolve(oref)
            .ok_or(Error::ObjectNotFound(oref.id, oref.gen))?;
        value
            .as_dict()
            .ok_or_else(|| Error::mismatch("Dictionary", value.type_name()))
    }

    /// Mutable dictionary of a dictionary or stream object.
    pub fn dict_mut(&mut self, oref: ObjectRef) -> Result<&mut Dictionary> {
        let value = self
            .resolve_mut(oref)
            .ok_or(Error::ObjectNotFound(oref.id, oref.gen))?;
        let found = value.type_name();
        value
            .as_dict_mut()
            .ok_or_else(|| Error::mismatch("Dictionary", found))
    }

    /// Mark an object number free as of the current revision.
    pub fn free(&mut self, oref: ObjectRef) {
        let current = self.current_revision();
        self.revisions[current].insert(IndirectObject::free(oref));
    }

    /// Mark an object number free as of a specific revision.
    ///
    /// Earlier revisions keep their records.
    pub fn free_in(&mut self, oref: ObjectRef, revision: usize) -> Result<()> {
        let rev = self
            .revisions
            .get_mut(revision)
            .ok_or(Error::RevisionNotFound(revision))?;
        rev.insert(IndirectObject::free(oref));
        Ok(())
    }

    /// Remove every record of an object number from all revisions.
    ///
    /// Returns how many records were removed. The object number stays
    /// allocated.
    pub fn delete(&mut self, oref: ObjectRef) -> usize {
        self.revisions
            .iter_mut()
            .filter_map(|rev| rev.remove(oref.id))
            .count()
    }

    /// Iterate objects.
    ///
    /// With `current_only` the effective set is produced: one record per
    /// object number, newest definition wins, free numbers skipped, ordered
    /// by first definition. Otherwise every stored record of every revision
    /// is produced, oldest revision first, free and superseded ones included.
    pub fn iter(&self, current_only: bool) -> Box<dyn Iterator<Item = &IndirectObject> + '_> {
        if current_only {
            let mut seen = HashSet::new();
            Box::new(
                self.revisions
                    .iter()
                    .flat_map(|rev| rev.objects.keys().copied())
                    .filter(move |id| seen.insert(*id))
                    .filter_map(move |id| self.effective(id)),
            )
        } else {
            Box::new(self.revisions.iter().flat_map(Revision::iter))
        }
    }

    /// Effective objects, see [`Document::iter`].
    pub fn objects(&self) -> Box<dyn Iterator<Item = &IndirectObject> + '_> {
        self.iter(true)
    }

    /// Trailer of the current revision.
    pub fn trailer(&self) -> &Dictionary {
        &self.revisions[self.current_revision()].trailer
    }

    /// Mutable trailer of the current revision.
    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        let current = self.current_revision();
        &mut self.revisions[current].trailer
    }

    /// Swap in a rebuilt history and allocator state.
    pub(crate) fn reset(&mut self, revisions: Vec<Revision>, next_oid: u32) {
        debug_assert!(!revisions.is_empty());
        self.revisions = revisions;
        self.next_oid = next_oid;
    }
}
