//! Decoded field values.
//!
//! [`FieldValue`] is the untyped result of decoding one generated fragment;
//! [`ObjectValue`] is the ordered `{name -> value}` mapping handed to a
//! schema's constructor. [`FromFieldValue`] converts values into native Rust
//! types.

use std::collections::HashMap;
use std::hash::BuildHasher;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::errors::ValidationError;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// One member of an enumerated literal set.
    Literal(String),
    /// Ordered sequence of values.
    List(Vec<FieldValue>),
    /// Text keys mapped to values, in generation order.
    Map(IndexMap<String, FieldValue>),
    /// Nested object.
    Object(ObjectValue),
    /// Empty optional.
    Absent,
}

impl FieldValue {
    /// Short name of the value's variant, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Literal(_) => "literal",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Absent => "absent",
        }
    }

    /// Whether this is the empty optional.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// String content of text and literal values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// List items.
    #[must_use]
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Map content.
    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Nested object content.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Convert to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) | Self::Literal(s) => serializer.serialize_str(s),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Object(obj) => obj.serialize(serializer),
            Self::Absent => serializer.serialize_none(),
        }
    }
}

/// Ordered mapping of field names to decoded values for one schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    schema: String,
    fields: IndexMap<String, FieldValue>,
}

impl ObjectValue {
    /// Create an empty object for `schema`.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field value.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a field value, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Name of the schema this object was generated for.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterate fields in generation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in generation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the object has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Remove a field value.
    pub fn take(&mut self, name: &str) -> Result<FieldValue, ValidationError> {
        self.fields
            .shift_remove(name)
            .ok_or_else(|| ValidationError::missing_field(name).with_schema(self.schema.clone()))
    }

    /// Remove a field value and convert it.
    pub fn take_as<T: FromFieldValue>(&mut self, name: &str) -> Result<T, ValidationError> {
        let value = self.take(name)?;
        T::from_field_value(value).map_err(|e| e.or_field(name).or_schema(self.schema.clone()))
    }

    /// Convert to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for ObjectValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Conversion from a decoded value into a native type.
pub trait FromFieldValue: Sized {
    /// Convert, rejecting values of the wrong shape.
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError>;
}

fn mismatch(expected: &str, value: &FieldValue) -> ValidationError {
    ValidationError::new(format!(
        "expected {}, got {}",
        expected,
        value.kind_name()
    ))
}

impl FromFieldValue for FieldValue {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        Ok(value)
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        match value {
            FieldValue::Text(s) | FieldValue::Literal(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FromFieldValue for bool {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        match value {
            FieldValue::Boolean(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FromFieldValue for f64 {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        match value {
            FieldValue::Float(x) => Ok(x),
            FieldValue::Integer(n) => Ok(n as f64),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FromFieldValue for f32 {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        f64::from_field_value(value).map(|x| x as f32)
    }
}

macro_rules! impl_from_field_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromFieldValue for $ty {
                fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
                    match value {
                        FieldValue::Integer(n) => <$ty>::try_from(n).map_err(|_| {
                            ValidationError::new(format!(
                                "{} is out of range for {}",
                                n,
                                stringify!($ty)
                            ))
                        }),
                        other => Err(mismatch("integer", &other)),
                    }
                }
            }
        )*
    };
}

impl_from_field_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        match value {
            FieldValue::Absent => Ok(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

impl<T: FromFieldValue> FromFieldValue for Vec<T> {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        match value {
            FieldValue::List(items) => items.into_iter().map(T::from_field_value).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}

fn entries<T: FromFieldValue>(
    value: FieldValue,
) -> Result<impl Iterator<Item = Result<(String, T), ValidationError>>, ValidationError> {
    match value {
        FieldValue::Map(entries) => Ok(entries.into_iter().map(|(key, value)| {
            T::from_field_value(value)
                .map(|v| (key.clone(), v))
                .map_err(|e| ValidationError::new(format!("entry {:?}: {}", key, e.message)))
        })),
        other => Err(mismatch("map", &other)),
    }
}

impl<T: FromFieldValue, S: BuildHasher + Default> FromFieldValue for HashMap<String, T, S> {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        entries(value)?.collect()
    }
}

impl<T: FromFieldValue, S: BuildHasher + Default> FromFieldValue for IndexMap<String, T, S> {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        entries(value)?.collect()
    }
}

impl<T: FromFieldValue> FromFieldValue for Box<T> {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        T::from_field_value(value).map(Box::new)
    }
}

impl FromFieldValue for bytes::Bytes {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        Err(mismatch("raw bytes", &value))
    }
}

impl FromFieldValue for ObjectValue {
    fn from_field_value(value: FieldValue) -> Result<Self, ValidationError> {
        match value {
            FieldValue::Object(obj) => Ok(obj),
            other => Err(mismatch("object", &other)),
        }
    }
}
