//! Error types shared by every structgen crate.
//!
//! Each error is a small struct so that the crates producing it (schema
//! introspection, the decoder, the assembler) can raise it without pulling
//! in the orchestrator's umbrella error.

use thiserror::Error;

/// A field's declared type has no constrainable representation.
///
/// Raised during introspection or compilation, always before the first
/// generation request reaches the runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported field type for '{schema}.{field}': {reason}")]
pub struct UnsupportedFieldType {
    /// Name of the schema that declares the field.
    pub schema: String,
    /// Name of the offending field.
    pub field: String,
    /// Why the field cannot be constrained.
    pub reason: String,
}

impl UnsupportedFieldType {
    /// Create a new unsupported field type error.
    pub fn new(
        schema: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A produced fragment does not decode under its field's kind.
///
/// The runtime guarantees fragments satisfy their constraint, so this always
/// points at a mismatch between the constraint compiler and the decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to decode field '{field}': expected {expected}, got {fragment:?}")]
pub struct DecodeError {
    /// Field being decoded.
    pub field: String,
    /// The raw fragment that failed to decode.
    pub fragment: String,
    /// What the decoder expected.
    pub expected: String,
}

impl DecodeError {
    /// Create a new decode error.
    pub fn new(
        field: impl Into<String>,
        fragment: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            fragment: fragment.into(),
            expected: expected.into(),
        }
    }
}

/// The assembled field values were rejected by the schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed{}: {message}", location(.schema, .field))]
pub struct ValidationError {
    /// Schema that rejected the values, when known.
    pub schema: Option<String>,
    /// Field the rejection refers to, when it is field-specific.
    pub field: Option<String>,
    /// Validator message, surfaced verbatim.
    pub message: String,
}

fn location(schema: &Option<String>, field: &Option<String>) -> String {
    match (schema, field) {
        (Some(schema), Some(field)) => format!(" for '{}.{}'", schema, field),
        (Some(schema), None) => format!(" for '{}'", schema),
        (None, Some(field)) => format!(" for field '{}'", field),
        (None, None) => String::new(),
    }
}

impl ValidationError {
    /// Create a validation error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            schema: None,
            field: None,
            message: message.into(),
        }
    }

    /// Set the schema name.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the field name.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the schema name only if none is recorded yet.
    #[must_use]
    pub fn or_schema(mut self, schema: impl Into<String>) -> Self {
        if self.schema.is_none() {
            self.schema = Some(schema.into());
        }
        self
    }

    /// Set the field name only if none is recorded yet.
    #[must_use]
    pub fn or_field(mut self, field: impl Into<String>) -> Self {
        if self.field.is_none() {
            self.field = Some(field.into());
        }
        self
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(format!("missing value for field '{}'", field)).with_field(field)
    }
}

/// Invalid settings or misuse of the context API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error: {0}")]
pub struct ConfigurationError(pub String);

impl ConfigurationError {
    /// Create a new configuration error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
