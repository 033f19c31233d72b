//! PDF object types.
//!
//! Values stored in the document: scalars, arrays, dictionaries, streams and
//! references to other indirect objects.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Dictionary payload shared by [`Object::Dictionary`] and [`Object::Stream`].
pub type Dictionary = HashMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (starting with /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Stream (dictionary + data)
    Stream {
        /// Stream dictionary
        dict: Dictionary,
        /// Stream data, still encoded with the filters named in `dict`
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

/// Build an [`Object::Dictionary`] from `key => value` pairs.
///
/// Values go through `Into<Object>`, so string literals become names.
///
/// ```
/// use pdf_repack::dictionary;
/// use pdf_repack::object::Object;
///
/// let page = dictionary! { "Type" => "Page", "Rotate" => 90 };
/// assert_eq!(page.get("Type").and_then(|t| t.as_name()), Some("Page"));
/// ```
#[macro_export]
macro_rules! dictionary {
    () => {
        $crate::object::Object::Dictionary($crate::object::Dictionary::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut dict = $crate::object::Dictionary::new();
        $(
            dict.insert($key.to_string(), $crate::object::Object::from($value));
        )+
        $crate::object::Object::Dictionary(dict)
    }};
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Create a stream object with no filters.
    pub fn stream(dict: Dictionary, data: impl Into<bytes::Bytes>) -> Self {
        Object::Stream {
            dict,
            data: data.into(),
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Mutable dictionary access. Works for both Dictionary and Stream objects.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Check if object is a stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, Object::Stream { .. })
    }

    /// Look up a dictionary entry (dictionaries and stream dictionaries).
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.as_dict().and_then(|d| d.get(key))
    }

    /// The `/Type` entry of a dictionary or stream, if it is a name.
    pub fn dict_type(&self) -> Option<&str> {
        self.get("Type").and_then(Object::as_name)
    }

    /// Collect every reference embedded in this value, depth-first.
    ///
    /// Dictionary keys are visited in sorted order so the result is stable.
    pub fn references(&self) -> Vec<ObjectRef> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut Vec<ObjectRef>) {
        match self {
            Object::Reference(r) => refs.push(*r),
            Object::Array(arr) => arr.iter().for_each(|o| o.collect_references(refs)),
            Object::Dictionary(dict) | Object::Stream { dict, .. } => {
                let mut keys: Vec<&String> = dict.keys().collect();
                keys.sort();
                for key in keys {
                    dict[key].collect_references(refs);
                }
            },
            _ => {},
        }
    }

    /// Replace every embedded reference with the value `f` returns for it.
    pub fn map_references<F>(&mut self, f: &mut F)
    where
        F: FnMut(ObjectRef) -> Object,
    {
        match self {
            Object::Reference(r) => {
                let replacement = f(*r);
                *self = replacement;
            },
            Object::Array(arr) => arr.iter_mut().for_each(|o| o.map_references(f)),
            Object::Dictionary(dict) | Object::Stream { dict, .. } => {
                dict.values_mut().for_each(|o| o.map_references(f))
            },
            _ => {},
        }
    }

    /// Decode stream data using filters specified in the stream dictionary.
    ///
    /// # Returns
    ///
    /// The decoded stream data, or an error if this is not a stream object
    /// or if decoding fails.
    pub fn decode_stream_data(&self) -> Result<Vec<u8>> {
        match self {
            Object::Stream { dict, data } => {
                let filters = dict
                    .get("Filter")
                    .map(extract_filter_names)
                    .unwrap_or_default();

                if filters.is_empty() {
                    Ok(data.to_vec())
                } else {
                    crate::decoders::decode_stream(data, &filters)
                }
            },
            _ => Err(Error::mismatch("Stream", self.type_name())),
        }
    }
}

/// Extract filter names from a Filter object.
///
/// The Filter entry can be either:
/// - A single Name (e.g., /ASCII85Decode)
/// - An Array of Names (e.g., [/ASCII85Decode /ASCII85Decode])
pub(crate) fn extract_filter_names(filter_obj: &Object) -> Vec<String> {
    match filter_obj {
        Object::Name(name) => vec![name.clone()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|obj| obj.as_name().map(|s| s.to_string()))
            .collect(),
        _ => vec![],
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<f64> for Object {
    fn from(r: f64) -> Self {
        Object::Real(r)
    }
}

impl From<&str> for Object {
    fn from(name: &str) -> Self {
        Object::Name(name.to_string())
    }
}

impl From<String> for Object {
    fn from(name: String) -> Self {
        Object::Name(name)
    }
}

impl From<ObjectRef> for Object {
    fn from(r: ObjectRef) -> Self {
        Object::Reference(r)
    }
}

impl From<Vec<Object>> for Object {
    fn from(arr: Vec<Object>) -> Self {
        Object::Array(arr)
    }
}

impl From<Dictionary> for Object {
    fn from(dict: Dictionary) -> Self {
        Object::Dictionary(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_integer() {
        let obj = Object::Integer(42);
        assert_eq!(obj.as_integer(), Some(42));
        assert!(obj.as_name().is_none());
        assert!(!obj.is_null());
    }

    #[test]
    fn test_object_name() {
        let obj = Object::Name("Type".to_string());
        assert_eq!(obj.as_name(), Some("Type"));
        assert!(obj.as_integer().is_none());
    }

    #[test]
    fn test_dictionary_macro() {
        let obj = dictionary! { "Type" => "Pages", "Count" => 3, "Kids" => Vec::<Object>::new() };
        assert_eq!(obj.dict_type(), Some("Pages"));
        assert_eq!(obj.get("Count").and_then(Object::as_integer), Some(3));
        assert_eq!(obj.get("Kids").and_then(Object::as_array).map(Vec::len), Some(0));
    }

    #[test]
    fn test_object_stream_dict_access() {
        let mut dict = Dictionary::new();
        dict.insert("Length".to_string(), Object::Integer(100));
        let obj = Object::stream(dict, &b"stream data"[..]);

        // Stream objects should also be accessible as dictionaries
        assert_eq!(obj.get("Length").unwrap().as_integer(), Some(100));
        assert!(obj.is_stream());
    }

    #[test]
    fn test_object_ref_display() {
        let obj_ref = ObjectRef::new(10, 0);
        assert_eq!(format!("{}", obj_ref), "10 0 R");
    }

    #[test]
    fn test_references_sorted_by_key() {
        let obj = dictionary! {
            "Zed" => ObjectRef::new(3, 0),
            "Alpha" => vec![Object::from(ObjectRef::new(1, 0)), Object::Integer(4)],
            "Mid" => dictionary! { "Inner" => ObjectRef::new(2, 0) },
        };
        assert_eq!(
            obj.references(),
            vec![ObjectRef::new(1, 0), ObjectRef::new(2, 0), ObjectRef::new(3, 0)]
        );
    }

    #[test]
    fn test_map_references() {
        let mut obj = dictionary! {
            "Keep" => ObjectRef::new(1, 0),
            "Drop" => vec![Object::from(ObjectRef::new(2, 0))],
        };
        obj.map_references(&mut |r| {
            if r.id == 1 {
                Object::Reference(ObjectRef::new(7, 0))
            } else {
                Object::Null
            }
        });
        assert_eq!(obj.get("Keep").and_then(Object::as_reference), Some(ObjectRef::new(7, 0)));
        assert_eq!(obj.get("Drop").and_then(Object::as_array).unwrap()[0], Object::Null);
    }

    #[test]
    fn test_decode_stream_no_filter() {
        let obj = Object::stream(Dictionary::new(), &b"Hello"[..]);
        assert_eq!(obj.decode_stream_data().unwrap(), b"Hello");
    }

    #[test]
    fn test_decode_stream_ascii85_filter() {
        let mut dict = Dictionary::new();
        dict.insert("Filter".to_string(), Object::Name("ASCII85Decode".to_string()));
        let obj = Object::stream(dict, &b"<+U,m~>"[..]);
        assert_eq!(obj.decode_stream_data().unwrap(), b"Test");
    }

    #[test]
    fn test_decode_stream_not_a_stream() {
        let obj = Object::Integer(42);
        match obj.decode_stream_data() {
            Err(Error::StructuralMismatch { expected, found }) => {
                assert_eq!(expected, "Stream");
                assert_eq!(found, "Integer");
            },
            other => panic!("Expected StructuralMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_filter_names_array() {
        let filter = Object::Array(vec![
            Object::Name("ASCII85Decode".to_string()),
            Object::Name("FlateDecode".to_string()),
        ]);
        assert_eq!(extract_filter_names(&filter), vec!["ASCII85Decode", "FlateDecode"]);
        assert!(extract_filter_names(&Object::Integer(42)).is_empty());
    }
}
