//! Document optimization.
//!
//! Passes run in a fixed order: compaction, default stripping, object
//! streams, cross-reference streams, then page content. Running the same
//! options twice leaves object numbers, object stream groupings and
//! cross-reference streams as the first run left them.

mod compact;
mod compress_pages;
mod object_streams;
pub mod options;
mod xref_streams;

pub use options::{OptimizeOptions, StreamMode, DEFAULT_OBJECTS_PER_STREAM};

use crate::document::{Document, ObjectKind};
use crate::error::Result;
use crate::object::ObjectRef;
use crate::schema::{FieldSchema, SchemaTable};

/// A page whose content was left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    /// The page object
    pub page: ObjectRef,
    /// Why its content could not be rewritten
    pub message: String,
}

/// Outcome of an optimization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    /// Objects kept and renumbered by compaction (0 without compaction)
    pub renumbered: usize,
    /// Dictionary entries removed because they held the default value
    pub defaults_stripped: usize,
    /// Object streams present afterwards
    pub containers: usize,
    /// Cross-reference streams present afterwards
    pub xref_streams: usize,
    /// Pages whose content was canonicalized
    pub pages_compressed: usize,
    /// Pages whose content could not be canonicalized
    pub page_failures: Vec<PageFailure>,
}

/// Optimize a document using the standard field schema.
pub fn optimize(doc: &mut Document, options: &OptimizeOptions) -> Result<OptimizeReport> {
    optimize_with_schema(doc, options, &SchemaTable::standard())
}

/// Optimize a document, stripping defaults declared by `schema`.
///
/// # Errors
///
/// [`crate::Error::InvalidOptions`] for inconsistent options. Per-page
/// content failures are not errors; they are listed in the report.
pub fn optimize_with_schema(
    doc: &mut Document,
    options: &OptimizeOptions,
    schema: &dyn FieldSchema,
) -> Result<OptimizeReport> {
    options.validate()?;
    let mut report = OptimizeReport::default();

    if options.compact {
        report.renumbered = compact::compact(doc, options.prune_unreachable);
    }
    if options.strips_defaults() {
        report.defaults_stripped = compact::strip_defaults(doc, schema);
    }

    match options.object_streams {
        StreamMode::Preserve => {},
        StreamMode::Generate => {
            object_streams::generate(doc, options.objects_per_stream)?;
        },
        StreamMode::Delete => {
            object_streams::delete(doc);
        },
    }

    match options.xref_streams {
        StreamMode::Preserve => {},
        StreamMode::Generate => {
            xref_streams::generate(doc)?;
        },
        StreamMode::Delete => {
            if options.object_streams == StreamMode::Generate {
                log::warn!("Object stream generation keeps the cross-reference streams it needs");
            }
            xref_streams::delete(doc)?;
        },
    }

    if options.compress_pages {
        let (compressed, failures) = compress_pages::compress_pages(doc);
        report.pages_compressed = compressed;
        report.page_failures = failures;
    }

    for obj in doc.objects() {
        match obj.kind() {
            ObjectKind::ObjectStream => report.containers += 1,
            ObjectKind::XRefStream => report.xref_streams += 1,
            _ => {},
        }
    }

    log::debug!(
        "Optimization finished: {} object streams, {} xref streams",
        report.containers,
        report.xref_streams
    );
    Ok(report)
}

impl Document {
    /// Optimize this document in place, see [`optimize`].
    pub fn optimize(&mut self, options: &OptimizeOptions) -> Result<OptimizeReport> {
        optimize(self, options)
    }
}
