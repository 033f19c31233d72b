//! Optimization settings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Objects packed into one object stream unless configured otherwise.
pub const DEFAULT_OBJECTS_PER_STREAM: usize = 100;

/// What to do with engine-managed streams (object streams, xref streams).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// Leave existing streams as they are
    #[default]
    Preserve,
    /// Build the streams, replacing any existing ones
    Generate,
    /// Remove the streams
    Delete,
}

/// Optimization configuration.
///
/// Every field is optional in JSON; missing fields take the defaults, which
/// leave the document untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OptimizeOptions {
    /// Merge revisions, drop history and renumber densely
    pub compact: bool,
    /// Strip schema-default entries even when no layout pass runs
    pub strip_defaults: bool,
    /// During compaction, drop objects unreachable from the trailer
    pub prune_unreachable: bool,
    /// Object stream handling
    pub object_streams: StreamMode,
    /// Cross-reference stream handling
    pub xref_streams: StreamMode,
    /// Canonicalize page content streams
    pub compress_pages: bool,
    /// Maximum objects per object stream
    pub objects_per_stream: usize,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizeOptions {
    /// Create options that change nothing.
    pub fn new() -> Self {
        Self {
            compact: false,
            strip_defaults: false,
            prune_unreachable: false,
            object_streams: StreamMode::Preserve,
            xref_streams: StreamMode::Preserve,
            compress_pages: false,
            objects_per_stream: DEFAULT_OBJECTS_PER_STREAM,
        }
    }

    /// Enable compaction.
    pub fn with_compact(mut self, enable: bool) -> Self {
        self.compact = enable;
        self
    }

    /// Enable default stripping.
    pub fn with_strip_defaults(mut self, enable: bool) -> Self {
        self.strip_defaults = enable;
        self
    }

    /// Drop unreachable objects while compacting.
    pub fn with_prune_unreachable(mut self, enable: bool) -> Self {
        self.prune_unreachable = enable;
        self
    }

    /// Set object stream handling.
    pub fn with_object_streams(mut self, mode: StreamMode) -> Self {
        self.object_streams = mode;
        self
    }

    /// Set cross-reference stream handling.
    pub fn with_xref_streams(mut self, mode: StreamMode) -> Self {
        self.xref_streams = mode;
        self
    }

    /// Enable page content canonicalization.
    pub fn with_compress_pages(mut self, enable: bool) -> Self {
        self.compress_pages = enable;
        self
    }

    /// Set the object stream capacity.
    pub fn with_objects_per_stream(mut self, count: usize) -> Self {
        self.objects_per_stream = count;
        self
    }

    /// Check settings that the type system cannot.
    pub fn validate(&self) -> Result<()> {
        if self.objects_per_stream == 0 {
            return Err(Error::InvalidOptions(
                "objects_per_stream must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Whether default stripping runs.
    ///
    /// Any pass that rewrites the object layout strips defaults as well.
    pub(crate) fn strips_defaults(&self) -> bool {
        self.compact
            || self.strip_defaults
            || self.object_streams != StreamMode::Preserve
            || self.xref_streams != StreamMode::Preserve
    }
}
