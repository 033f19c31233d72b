//! Cross-reference stream maintenance.

use crate::document::{Document, ObjectKind, Storage};
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef};

/// Cross-reference stream objects defined in one revision, in order.
fn xref_streams_in(doc: &Document, revision: usize) -> Vec<ObjectRef> {
    doc.revision(revision)
        .map(|rev| {
            rev.iter()
                .filter(|obj| obj.kind() == ObjectKind::XRefStream)
                .map(|obj| obj.oref)
                .collect()
        })
        .unwrap_or_default()
}

fn empty_xref_stream() -> Object {
    let mut dict = Dictionary::new();
    dict.insert("Type".to_string(), Object::Name("XRef".to_string()));
    Object::stream(dict, bytes::Bytes::new())
}

/// Make sure a revision has exactly one cross-reference stream.
///
/// The first existing one is kept; extra ones are purged.
pub(crate) fn ensure(doc: &mut Document, revision: usize) -> Result<ObjectRef> {
    let existing = xref_streams_in(doc, revision);
    if let Some((keep, extra)) = existing.split_first() {
        for oref in extra {
            doc.delete(*oref);
        }
        return Ok(*keep);
    }

    let oref = doc.add_to(empty_xref_stream(), revision)?;
    log::debug!("Added cross-reference stream {} to revision {}", oref, revision);
    Ok(oref)
}

/// One cross-reference stream per revision.
pub(crate) fn generate(doc: &mut Document) -> Result<usize> {
    for revision in 0..doc.revision_count() {
        ensure(doc, revision)?;
    }
    Ok(doc.revision_count())
}

/// Whether a revision stores any record inside an object stream.
fn has_packed(doc: &Document, revision: usize) -> bool {
    doc.revision(revision).is_some_and(|rev| {
        rev.iter()
            .any(|obj| matches!(obj.storage, Storage::Packed { .. }))
    })
}

/// Remove cross-reference streams; returns how many were removed.
///
/// A revision that still holds packed objects keeps exactly one stream,
/// since those objects cannot be located without it.
pub(crate) fn delete(doc: &mut Document) -> Result<usize> {
    let mut removed = 0;
    for revision in 0..doc.revision_count() {
        if has_packed(doc, revision) {
            log::warn!(
                "Keeping cross-reference stream of revision {}: it holds packed objects",
                revision
            );
            let before = xref_streams_in(doc, revision).len();
            ensure(doc, revision)?;
            removed += before.saturating_sub(1);
            continue;
        }

        let streams = xref_streams_in(doc, revision);
        if let Some(rev) = doc.revision_mut(revision) {
            for oref in &streams {
                rev.remove(oref.id);
            }
        }
        removed += streams.len();
    }
    if removed > 0 {
        log::debug!("Removed {} cross-reference streams", removed);
    }
    Ok(removed)
}
