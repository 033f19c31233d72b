//! Revision merging, dense renumbering and default stripping.

use crate::document::{Document, IndirectObject, Revision, Storage};
use crate::object::{Dictionary, Object, ObjectRef};
use crate::schema::FieldSchema;
use std::collections::{HashMap, HashSet};

/// Trailer entries that only describe the revision chain.
const HISTORY_KEYS: &[&str] = &["Prev"];

/// Trailer of the merged document; newer revisions win per key.
fn merged_trailer(doc: &Document) -> Dictionary {
    let mut trailer = Dictionary::new();
    for rev in doc.revisions() {
        for (key, value) in rev.trailer() {
            trailer.insert(key.clone(), value.clone());
        }
    }
    for key in HISTORY_KEYS {
        trailer.remove(*key);
    }
    trailer
}

/// Effective objects in the order their new numbers are handed out.
///
/// Objects reachable from the trailer come first, depth-first with
/// dictionary keys sorted. Unreachable objects follow in definition order
/// unless `prune_unreachable` drops them.
fn numbering_order(
    doc: &Document,
    trailer: &Dictionary,
    prune_unreachable: bool,
) -> Vec<ObjectRef> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();

    let mut stack: Vec<ObjectRef> = Object::Dictionary(trailer.clone()).references();
    stack.reverse();
    while let Some(oref) = stack.pop() {
        if !seen.insert(oref) {
            continue;
        }
        let Some(value) = doc.resolve(oref) else {
            continue;
        };
        order.push(oref);
        stack.extend(value.references().into_iter().rev());
    }

    if !prune_unreachable {
        for obj in doc.objects() {
            if seen.insert(obj.oref) {
                order.push(obj.oref);
            }
        }
    }

    order
}

/// Collapse all revisions into one and renumber objects from 1.
///
/// References to objects outside the new numbering become `null`.
/// Returns the number of objects kept.
pub(crate) fn compact(doc: &mut Document, prune_unreachable: bool) -> usize {
    let mut trailer = merged_trailer(doc);
    let order = numbering_order(doc, &trailer, prune_unreachable);

    let mapping: HashMap<ObjectRef, ObjectRef> = order
        .iter()
        .enumerate()
        .map(|(i, old)| (*old, ObjectRef::new(i as u32 + 1, 0)))
        .collect();
    let mut remap = |oref: ObjectRef| {
        mapping
            .get(&oref)
            .map_or(Object::Null, |new| Object::Reference(*new))
    };

    let mut revision = Revision::new();
    for old in &order {
        let Some(record) = doc.object(*old) else {
            continue;
        };
        let mut value = record.value.clone();
        value.map_references(&mut remap);

        let storage = match record.storage {
            Storage::Packed { container, index } => match mapping.get(&container) {
                Some(new) => Storage::Packed { container: *new, index },
                None => Storage::Direct,
            },
            other => other,
        };

        revision.insert(IndirectObject {
            oref: mapping[old],
            value,
            type_tag: record.type_tag.clone(),
            storage,
        });
    }

    let mut trailer_value = Object::Dictionary(std::mem::take(&mut trailer));
    trailer_value.map_references(&mut remap);
    if let Object::Dictionary(dict) = trailer_value {
        *revision.trailer_mut() = dict;
    }

    let dropped = doc.iter(false).count() - order.len();
    log::debug!(
        "Compacted {} revisions into {} objects ({} records dropped)",
        doc.revision_count(),
        order.len(),
        dropped
    );

    let kept = order.len();
    doc.reset(vec![revision], kept as u32 + 1);
    kept
}

/// Remove dictionary entries equal to their declared schema default.
///
/// Returns the number of entries removed.
pub(crate) fn strip_defaults(doc: &mut Document, schema: &dyn FieldSchema) -> usize {
    let typed: Vec<(ObjectRef, String)> = doc
        .objects()
        .filter_map(|obj| obj.object_type().map(|t| (obj.oref, t.to_string())))
        .collect();

    let mut removed = 0;
    for (oref, object_type) in typed {
        let Ok(dict) = doc.dict_mut(oref) else {
            continue;
        };
        let redundant: Vec<String> = dict
            .iter()
            .filter(|(field, value)| {
                schema
                    .default_of(&object_type, field)
                    .is_some_and(|default| default == **value)
            })
            .map(|(field, _)| field.clone())
            .collect();

        for field in redundant {
            dict.remove(&field);
            removed += 1;
        }
    }

    if removed > 0 {
        log::debug!("Stripped {} default-valued entries", removed);
    }
    removed
}
