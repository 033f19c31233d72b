//! Object stream packing and unpacking.
//!
//! Object streams are rebuilt per revision from scratch: members are
//! regrouped in definition order, and the references of the revision's
//! existing containers are reused in order. Regenerating an already packed
//! revision therefore reproduces the same containers and groupings.

use super::xref_streams;
use crate::document::{Document, IndirectObject, ObjectKind, Storage};
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef};
use std::collections::HashSet;

/// Trailer keys whose direct targets must stay outside object streams.
const SENSITIVE_TRAILER_KEYS: &[&str] = &["Encrypt"];

fn sensitive_refs(doc: &Document) -> HashSet<ObjectRef> {
    doc.revisions()
        .iter()
        .flat_map(|rev| {
            SENSITIVE_TRAILER_KEYS
                .iter()
                .filter_map(move |key| rev.trailer().get(*key).and_then(Object::as_reference))
        })
        .collect()
}

/// Whether a record may be packed into an object stream.
fn is_packable(obj: &IndirectObject, sensitive: &HashSet<ObjectRef>) -> bool {
    !obj.is_free()
        && obj.oref.gen == 0
        && !obj.value.is_stream()
        && !obj.value.is_null()
        && !matches!(obj.kind(), ObjectKind::ObjectStream | ObjectKind::XRefStream)
        && !sensitive.contains(&obj.oref)
}

fn container_value(members: usize) -> Object {
    let mut dict = Dictionary::new();
    dict.insert("Type".to_string(), Object::Name("ObjStm".to_string()));
    dict.insert("N".to_string(), Object::Integer(members as i64));
    Object::stream(dict, bytes::Bytes::new())
}

fn containers_in(doc: &Document, revision: usize) -> Vec<ObjectRef> {
    doc.revision(revision)
        .map(|rev| {
            rev.iter()
                .filter(|obj| obj.kind() == ObjectKind::ObjectStream)
                .map(|obj| obj.oref)
                .collect()
        })
        .unwrap_or_default()
}

/// Pack one revision; returns the number of containers it ends up with.
fn pack_revision(
    doc: &mut Document,
    revision: usize,
    per_stream: usize,
    sensitive: &HashSet<ObjectRef>,
) -> Result<usize> {
    let existing = containers_in(doc, revision);

    let mut members = Vec::new();
    if let Some(rev) = doc.revision_mut(revision) {
        for obj in rev.iter_mut() {
            if matches!(obj.storage, Storage::Packed { .. }) {
                obj.storage = Storage::Direct;
            }
            if is_packable(obj, sensitive) {
                members.push(obj.oref.id);
            }
        }
    }

    let groups: Vec<&[u32]> = members.chunks(per_stream).collect();
    for surplus in existing.iter().skip(groups.len()) {
        doc.delete(*surplus);
    }

    for (i, group) in groups.iter().enumerate() {
        let value = container_value(group.len());
        let container = match existing.get(i) {
            Some(reused) => {
                doc.replace(*reused, value)?;
                *reused
            },
            None => doc.add_to(value, revision)?,
        };

        if let Some(rev) = doc.revision_mut(revision) {
            for (index, id) in group.iter().enumerate() {
                if let Some(obj) = rev.get_mut(*id) {
                    obj.storage = Storage::Packed {
                        container,
                        index: index as u32,
                    };
                }
            }
        }
    }

    if !groups.is_empty() {
        xref_streams::ensure(doc, revision)?;
    }

    log::debug!(
        "Revision {}: packed {} objects into {} object streams",
        revision,
        members.len(),
        groups.len()
    );
    Ok(groups.len())
}

/// Rebuild object streams in every revision.
///
/// Returns the total number of containers.
pub(crate) fn generate(doc: &mut Document, per_stream: usize) -> Result<usize> {
    let sensitive = sensitive_refs(doc);
    let mut total = 0;
    for revision in 0..doc.revision_count() {
        total += pack_revision(doc, revision, per_stream, &sensitive)?;
    }
    Ok(total)
}

/// Unpack every object stream; returns how many containers were removed.
pub(crate) fn delete(doc: &mut Document) -> usize {
    let mut containers = Vec::new();
    for revision in 0..doc.revision_count() {
        containers.extend(containers_in(doc, revision));
        if let Some(rev) = doc.revision_mut(revision) {
            for obj in rev.iter_mut() {
                if matches!(obj.storage, Storage::Packed { .. }) {
                    obj.storage = Storage::Direct;
                }
            }
        }
    }

    for oref in &containers {
        doc.delete(*oref);
    }
    if !containers.is_empty() {
        log::debug!("Unpacked {} object streams", containers.len());
    }
    containers.len()
}
