//! Object assembler.
//!
//! Hands the complete `{name -> value}` mapping to the schema. Dynamic
//! schemas are checked against their definition and validators; typed
//! schemas are additionally constructed through [`Schema::assemble`].
//! Rejections are returned verbatim and never retried.

use structgen_core::{ObjectValue, ValidationError};
use structgen_schema::{Schema, TypeDefinition};

/// Check `values` against `definition` and run its validators.
///
/// Every declared field must be present and no undeclared field may be.
pub fn assemble_value(
    definition: &TypeDefinition,
    values: ObjectValue,
) -> Result<ObjectValue, ValidationError> {
    for field in definition.fields() {
        if values.get(&field.name).is_none() {
            return Err(ValidationError::missing_field(&field.name).with_schema(definition.name()));
        }
    }
    if let Some(extra) = values
        .names()
        .find(|name| !definition.fields().iter().any(|f| f.name == *name))
    {
        return Err(ValidationError::new(format!("undeclared field '{}'", extra))
            .with_schema(definition.name())
            .with_field(extra));
    }

    definition.validate(&values)?;
    Ok(values)
}

/// Build a typed instance from assembled values.
pub fn assemble<T: Schema>(values: ObjectValue) -> Result<T, ValidationError> {
    T::assemble(values).map_err(|e| e.or_schema(T::schema_name()))
}
