//! # structgen-schema
//!
//! Schema definitions and introspection for structgen.
//!
//! ## Core Concepts
//!
//! - **[`TypeDefinition`]**: explicit description of a structured type
//! - **[`DeclaredType`]**: what a field declares, supported or not
//! - **[`FieldDescriptor`]** / **[`FieldKind`]**: the closed set of kinds the
//!   constraint compiler understands
//! - **[`introspect`]**: declared types to descriptors, failing on anything
//!   that cannot be constrained
//! - **[`Schema`]**, **[`FieldType`]**, **[`Literals`]**: the traits derived
//!   by `structgen-macros`
//!
//! Derived code refers to this crate by its absolute path, so crates using
//! `#[derive(Schema)]` depend on `structgen-schema` directly, even when the
//! derives are imported through the `structgen` facade.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod builder;
pub mod definition;
pub mod descriptor;
pub mod introspect;
pub mod traits;

pub use builder::SchemaBuilder;
pub use definition::{DeclaredType, FieldDeclaration, SchemaRef, TypeDefinition, Validator};
pub use descriptor::{FieldDescriptor, FieldKind, LiteralSet, ScalarKind};
pub use introspect::{introspect, kind_of, SCHEMA_LEVEL_FIELD};
pub use traits::{FieldType, Literals, Schema};

// Re-exported for derived code.
pub use structgen_core::{FieldValue, FromFieldValue, ObjectValue, ValidationError};
