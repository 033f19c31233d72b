//! Field-default schemas used when stripping redundant dictionary entries.
//!
//! Compaction removes an entry when its value equals the default the schema
//! declares for that object type and field. The schema is always passed in
//! explicitly; nothing here is global.

use crate::error::{Error, Result};
use crate::object::Object;
use std::collections::HashMap;

/// Source of declared field defaults.
pub trait FieldSchema {
    /// Default value of `field` in objects declared as `object_type`.
    fn default_of(&self, object_type: &str, field: &str) -> Option<Object>;
}

/// Schema that declares no defaults; stripping becomes a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefaults;

impl FieldSchema for NoDefaults {
    fn default_of(&self, _object_type: &str, _field: &str) -> Option<Object> {
        None
    }
}

/// In-memory schema: object types, their fields, and optional defaults.
#[derive(Debug, Clone, Default)]
pub struct SchemaTable {
    types: HashMap<String, HashMap<String, Option<Object>>>,
}

impl SchemaTable {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema with the document-level defaults that are safe to strip.
    ///
    /// Inheritable page attributes are deliberately absent: a default on a
    /// page can override a non-default value inherited from its parent.
    pub fn standard() -> Self {
        Self::new()
            .with_field("Catalog", "PageLayout", Some(Object::Name("SinglePage".into())))
            .with_field("Catalog", "PageMode", Some(Object::Name("UseNone".into())))
            .with_field("Catalog", "Pages", None)
            .with_field("Pages", "Kids", None)
            .with_field("Pages", "Count", None)
            .with_field("Pages", "Parent", None)
            .with_field("Page", "Parent", None)
            .with_field("Page", "Contents", None)
            .with_field("Annot", "F", Some(Object::Integer(0)))
            .with_field("Border", "W", Some(Object::Integer(1)))
            .with_field("Border", "S", Some(Object::Name("S".into())))
    }

    /// Declare a field, with or without a default.
    pub fn define(&mut self, object_type: &str, field: &str, default: Option<Object>) -> &mut Self {
        self.types
            .entry(object_type.to_string())
            .or_default()
            .insert(field.to_string(), default);
        self
    }

    /// Builder form of [`SchemaTable::define`].
    pub fn with_field(mut self, object_type: &str, field: &str, default: Option<Object>) -> Self {
        self.define(object_type, field, default);
        self
    }

    /// Declared default of a field.
    ///
    /// # Errors
    ///
    /// [`Error::StructuralMismatch`] if the type or the field is not declared.
    pub fn lookup(&self, object_type: &str, field: &str) -> Result<Option<&Object>> {
        let fields = self
            .types
            .get(object_type)
            .ok_or_else(|| Error::mismatch("declared type", object_type))?;
        fields
            .get(field)
            .map(Option::as_ref)
            .ok_or_else(|| Error::mismatch(format!("field of {}", object_type), field))
    }
}

impl FieldSchema for SchemaTable {
    fn default_of(&self, object_type: &str, field: &str) -> Option<Object> {
        self.lookup(object_type, field).ok().flatten().cloned()
    }
}
