//! Field decoder.
//!
//! Converts a raw fragment produced under a field's constraint into a
//! [`FieldValue`]. There is no coercion: a fragment that does not decode is
//! a [`DecodeError`], which means the compiler and the decoder disagree.

use structgen_core::{DecodeError, FieldValue, GenerationSettings};
use structgen_schema::{FieldDescriptor, FieldKind, ScalarKind};

use crate::compile::terminal;

/// Decode the fragment produced for a terminal field.
pub fn decode(
    field: &FieldDescriptor,
    raw: &str,
    settings: &GenerationSettings,
) -> Result<FieldValue, DecodeError> {
    decode_kind(&field.name, &field.kind, raw, settings)
}

/// Decode a quoted mapping key.
pub fn decode_key(field: &str, raw: &str) -> Result<String, DecodeError> {
    serde_json::from_str::<String>(raw)
        .map_err(|e| DecodeError::new(field, raw, format!("a quoted key ({})", e)))
}

/// Decode `raw` as a value of `kind`.
pub fn decode_kind(
    field: &str,
    kind: &FieldKind,
    raw: &str,
    settings: &GenerationSettings,
) -> Result<FieldValue, DecodeError> {
    let fail = |expected: String| DecodeError::new(field, raw, expected);

    match kind {
        FieldKind::Optional(_) if raw == settings.sentinel => Ok(FieldValue::Absent),
        FieldKind::Optional(inner) => decode_kind(field, inner, raw, settings),
        FieldKind::Union(members) => {
            // First member wins, so declaration order settles overlaps.
            let member = members.iter().find(|member| {
                terminal(member, settings).is_some_and(|constraint| constraint.is_satisfied_by(raw))
            });
            match member {
                Some(member) => decode_kind(field, member, raw, settings),
                None => Err(fail(format!("one of {}", kind))),
            }
        }
        FieldKind::Scalar(ScalarKind::Text) => serde_json::from_str::<String>(raw)
            .map(FieldValue::Text)
            .map_err(|e| fail(format!("quoted text ({})", e))),
        FieldKind::Scalar(ScalarKind::Integer) => raw
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|e| fail(format!("an integer ({})", e))),
        FieldKind::Scalar(ScalarKind::Float) => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(FieldValue::Float(value)),
            Ok(_) => Err(fail("a finite float".to_string())),
            Err(e) => Err(fail(format!("a float ({})", e))),
        },
        FieldKind::Scalar(ScalarKind::Boolean) => raw
            .parse::<bool>()
            .map(FieldValue::Boolean)
            .map_err(|_| fail("true or false".to_string())),
        FieldKind::Enum(literals) if literals.contains(raw) => {
            Ok(FieldValue::Literal(raw.to_string()))
        }
        FieldKind::Enum(literals) => Err(fail(format!("one of {:?}", literals.as_slice()))),
        FieldKind::Composite(schema) => Err(fail(format!(
            "nothing: {} values are built field by field",
            schema.name()
        ))),
        FieldKind::List(_) | FieldKind::Map(_) => Err(fail(
            "nothing: collections are built item by item".to_string(),
        )),
    }
}
