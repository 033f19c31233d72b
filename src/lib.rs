// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::needless_range_loop)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::match_like_matches_macro)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Repack
//!
//! In-memory PDF object model with the restructuring operations an
//! optimizer needs.
//!
//! ## Core Features
//!
//! - **Revisioned store**: incremental updates kept as layered revisions,
//!   with an effective view where the newest definition of an object wins
//! - **Page tree editing**: index-based page lookup, insertion and deletion
//!   that keep the cached `/Count` values and `/Parent` links consistent,
//!   collapsing intermediate nodes that become degenerate
//! - **Optimization**: revision compaction with dense renumbering, schema
//!   default stripping, object stream and cross-reference stream
//!   generation or removal, page content canonicalization
//! - **Streaming filters**: chunked ASCII85 decoding and encoding with
//!   output that does not depend on chunk boundaries
//!
//! Parsing PDF bytes into a [`Document`] and serializing it back are left
//! to the caller; this crate only decides which objects exist and how they
//! reference each other.
//!
//! ## Quick Start
//!
//! ```
//! use pdf_repack::{dictionary, Document, Object, OptimizeOptions, StreamMode};
//!
//! # fn main() -> pdf_repack::Result<()> {
//! let mut doc = Document::new();
//! let pages = doc.add(dictionary! { "Type" => "Pages", "Kids" => Vec::<Object>::new(), "Count" => 0 });
//! let catalog = doc.add(dictionary! { "Type" => "Catalog", "Pages" => pages });
//! doc.trailer_mut().insert("Root".into(), Object::Reference(catalog));
//!
//! let mut tree = doc.page_tree(pages)?;
//! tree.add_page(None)?;
//! tree.insert_page(0, None)?;
//! assert_eq!(tree.page_count()?, 2);
//!
//! let options = OptimizeOptions::new()
//!     .with_compact(true)
//!     .with_object_streams(StreamMode::Generate);
//! let report = doc.optimize(&options)?;
//! assert_eq!(report.containers, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Object model
pub mod document;
pub mod object;
pub mod xref;

// Page tree
pub mod page_tree;

// Stream filters
pub mod decoders;

// Content streams
pub mod content;

// Optimization
pub mod optimize;
pub mod schema;

// Re-exports
pub use document::{Document, IndirectObject, ObjectKind, Revision, Storage};
pub use error::{Error, Result};
pub use object::{Dictionary, Object, ObjectRef};
pub use optimize::{optimize, OptimizeOptions, OptimizeReport, PageFailure, StreamMode};
pub use page_tree::PageTree;
pub use schema::{FieldSchema, NoDefaults, SchemaTable};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
