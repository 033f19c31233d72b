//! Page content canonicalization.

use super::PageFailure;
use crate::content::canonicalize;
use crate::document::{Document, ObjectKind};
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};

/// Where a page keeps its content.
enum Contents {
    /// One or more content stream objects, concatenated in order
    Indirect(Vec<ObjectRef>),
    /// A stream embedded directly in the page dictionary
    Direct(Object),
}

fn page_contents(doc: &Document, page: ObjectRef) -> Result<Option<Contents>> {
    let contents = match doc.dict(page)?.get("Contents") {
        None | Some(Object::Null) => return Ok(None),
        Some(contents) => contents,
    };

    match contents {
        Object::Reference(r) => Ok(Some(Contents::Indirect(vec![*r]))),
        Object::Array(items) if items.is_empty() => Ok(None),
        Object::Array(items) => items
            .iter()
            .map(|item| {
                item.as_reference()
                    .ok_or_else(|| Error::mismatch("Reference", item.type_name()))
            })
            .collect::<Result<Vec<_>>>()
            .map(|refs| Some(Contents::Indirect(refs))),
        Object::Stream { .. } => Ok(Some(Contents::Direct(contents.clone()))),
        other => Err(Error::mismatch("Stream", other.type_name())),
    }
}

/// Stream holding already decoded data.
fn plain_stream(dict: &Dictionary, data: Vec<u8>) -> Object {
    let mut dict = dict.clone();
    dict.remove("Filter");
    dict.remove("DecodeParms");
    dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
    Object::stream(dict, data)
}

/// Canonicalize one page; nothing is written unless every step succeeds.
fn compress_page(doc: &mut Document, page: ObjectRef) -> Result<bool> {
    let Some(contents) = page_contents(doc, page)? else {
        return Ok(false);
    };

    match contents {
        Contents::Direct(stream) => {
            let data = canonicalize(&stream.decode_stream_data()?)?;
            let dict = stream.as_dict().cloned().unwrap_or_default();
            doc.dict_mut(page)?
                .insert("Contents".to_string(), plain_stream(&dict, data));
        },
        Contents::Indirect(refs) => {
            let mut decoded = Vec::new();
            for (i, oref) in refs.iter().enumerate() {
                let stream = doc
                    .resolve(*oref)
                    .ok_or(Error::ObjectNotFound(oref.id, oref.gen))?;
                if i > 0 {
                    decoded.push(b'\n');
                }
                decoded.extend_from_slice(&stream.decode_stream_data()?);
            }
            let data = canonicalize(&decoded)?;

            // Streams of a merged array may be shared with other pages
            let dict = doc.dict(refs[0])?.clone();
            if let [single] = refs[..] {
                doc.replace(single, plain_stream(&dict, data))?;
            } else {
                let merged = doc.add(plain_stream(&dict, data));
                doc.dict_mut(page)?
                    .insert("Contents".to_string(), Object::Reference(merged));
            }
        },
    }

    Ok(true)
}

/// Canonicalize the content of every page.
///
/// A page whose content cannot be decoded or tokenized is left unchanged
/// and reported; the remaining pages are still processed.
pub(crate) fn compress_pages(doc: &mut Document) -> (usize, Vec<PageFailure>) {
    let pages: Vec<ObjectRef> = doc
        .objects()
        .filter(|obj| obj.kind() == ObjectKind::Page)
        .map(|obj| obj.oref)
        .collect();

    let mut compressed = 0;
    let mut failures = Vec::new();
    for page in pages {
        match compress_page(doc, page) {
            Ok(true) => compressed += 1,
            Ok(false) => {},
            Err(e) => {
                log::warn!("Leaving content of page {} unchanged: {}", page, e);
                failures.push(PageFailure {
                    page,
                    message: e.to_string(),
                });
            },
        }
    }

    log::debug!("Compressed content of {} pages ({} failed)", compressed, failures.len());
    (compressed, failures)
}
