//! # structgen-output
//!
//! Constraint compilation and sequential generation for structgen.
//!
//! ## Pipeline
//!
//! 1. [`compile_schema`]: introspect a type definition and compile each field
//!    into a [`FieldPlan`]
//! 2. [`Generator`]: walk the plans in declaration order, prompting the
//!    runtime with a labelled fragment per field
//! 3. [`decode`]: turn each produced fragment into a [`FieldValue`](structgen_core::FieldValue)
//! 4. [`assemble_value`] / [`assemble`]: hand the mapping to the schema
//!
//! Unsupported fields anywhere in the reachable schema tree are reported
//! before the first runtime request.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod assemble;
pub mod compile;
pub mod decode;
pub mod error;
pub mod orchestrator;
pub mod prompt;

pub use assemble::{assemble, assemble_value};
pub use compile::{
    compile, compile_schema, inline, key_constraint, terminal, CompiledField, FieldPlan, Inline, BLOCK_END,
    EMPTY_LIST, EMPTY_MAP, KEY_SEPARATOR, LIST_CLOSE, LIST_OPEN, MAP_CLOSE, MAP_OPEN, OBJECT_PRESENT,
    SEPARATOR,
};
pub use decode::{decode, decode_key, decode_kind};
pub use error::{GenerationError, GenerationResult};
pub use orchestrator::Generator;
pub use prompt::{field_label, field_prompt, instruction_lines, item_field_prompt, FENCE_CLOSE, FENCE_OPEN};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::error::{GenerationError, GenerationResult};
    pub use crate::orchestrator::Generator;
}
