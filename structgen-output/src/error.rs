//! Generation error types.

use structgen_core::{ConfigurationError, DecodeError, UnsupportedFieldType, ValidationError};
use structgen_models::RuntimeError;
use thiserror::Error;

/// Any failure of a top-level generation call.
///
/// Every variant aborts the call; partial context and partial field values
/// are dropped.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A field cannot be constrained. Raised before any runtime request.
    #[error(transparent)]
    UnsupportedFieldType(#[from] UnsupportedFieldType),

    /// A produced fragment did not decode under its field's kind.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The schema rejected the assembled values.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The runtime failed.
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// A required nested schema sits deeper than the configured limit.
    #[error("Nesting too deep: '{schema}' would be generated at depth {depth}, limit is {max_depth}")]
    NestingTooDeep {
        /// Schema that would exceed the limit.
        schema: String,
        /// Depth it would be generated at.
        depth: usize,
        /// Configured limit.
        max_depth: usize,
    },

    /// Invalid settings or role misuse.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl GenerationError {
    /// Create a nesting error.
    pub fn nesting_too_deep(schema: impl Into<String>, depth: usize, max_depth: usize) -> Self {
        Self::NestingTooDeep {
            schema: schema.into(),
            depth,
            max_depth,
        }
    }

    /// Whether the error was raised before any runtime request.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFieldType(_) | Self::NestingTooDeep { .. } | Self::Configuration(_)
        )
    }
}

/// Result type for generation.
pub type GenerationResult<T> = Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: GenerationError = UnsupportedFieldType::new("Upload", "payload", "raw bytes").into();
        assert_eq!(
            err.to_string(),
            "Unsupported field type for 'Upload.payload': raw bytes"
        );
        assert!(err.is_preflight());

        let err = GenerationError::nesting_too_deep("Node", 9, 8);
        assert!(err.to_string().contains("'Node'"));

        let err: GenerationError = RuntimeError::Exhausted(4).into();
        assert!(!err.is_preflight());
        assert!(err.to_string().starts_with("Runtime error:"));
    }
}
