//! # structgen - Typed Objects from Text-Only Language Models
//!
//! structgen turns a schema into a sequence of constrained generation
//! requests and assembles the constrained fragments back into a validated,
//! strongly-typed value. The model never emits a whole document in one
//! unconstrained pass: every field is generated under a pattern, a literal
//! alternation or a "value or `null`" choice, in declaration order.
//!
//! ## Quick Start
//!
//! ```ignore
//! use structgen::prelude::*;
//!
//! #[derive(Debug, Literals)]
//! #[literals(rename_all = "lowercase")]
//! enum Fruit {
//!     Pear,
//!     Banana,
//!     Apple,
//! }
//!
//! #[derive(Debug, Schema)]
//! struct SimpleClass {
//!     /// Provide a name.
//!     name: String,
//!     /// Provide an age in years.
//!     age: u32,
//!     favorite_fruit: Option<Fruit>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = Context::new().with_user(
//!         "Extract the following into an object: Jack is a 30 year old dude that loves apples.",
//!     )?;
//!     let runtime = LlamaCppRuntime::from_env("mistral")?.with_template(PromptTemplate::ChatMl);
//!
//!     let (_ctx, jack): (_, SimpleClass) =
//!         generate_object_in_role(runtime, ctx, Role::Assistant).await?;
//!     println!("{:?}", jack);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `llamacpp` | llama.cpp server runtime | ✅ |
//! | `macros` | `#[derive(Schema)]` and `#[derive(Literals)]` | ✅ |
//!
//! Derived code refers to `::structgen_schema`, so crates using the derives
//! also list `structgen-schema` as a dependency.
//!
//! ## Architecture
//!
//! - [`structgen_core`] - Context, constraints, field values, errors, settings
//! - [`structgen_schema`] - Type definitions and introspection
//! - [`structgen_models`] - Runtime trait and runtimes
//! - [`structgen_output`] - Compiler, decoder, assembler, orchestrator
//! - [`structgen_macros`] - Derive macros

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Direct generation functions.
pub mod direct;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Core types: context, constraints, values, errors and settings.
pub use structgen_core as core;

/// Type definitions and introspection.
pub use structgen_schema as schema;

/// Runtime trait and implementations.
pub use structgen_models as models;

/// Constraint compiler and orchestrator.
pub use structgen_output as output;

// ============================================================================
// Macro Re-exports
// ============================================================================

/// Derive macro for schemas.
#[cfg(feature = "macros")]
#[cfg_attr(docsrs, doc(cfg(feature = "macros")))]
pub use structgen_macros::Schema;

/// Derive macro for literal enums.
#[cfg(feature = "macros")]
#[cfg_attr(docsrs, doc(cfg(feature = "macros")))]
pub use structgen_macros::Literals;

// ============================================================================
// Flat Re-exports
// ============================================================================

pub use structgen_core::{
    ConfigurationError, Constraint, Context, DecodeError, FieldValue, GenerationSettings,
    ObjectValue, Role, Segment, UnsupportedFieldType, ValidationError,
};
pub use structgen_schema::{DeclaredType, FieldType, SchemaBuilder, SchemaRef, TypeDefinition};
pub use structgen_models::{
    BoxedRuntime, FunctionRuntime, GenerationRuntime, PromptTemplate, RuntimeError,
    ScriptedRuntime,
};
pub use structgen_output::{GenerationError, GenerationResult, Generator};

#[cfg(feature = "llamacpp")]
#[cfg_attr(docsrs, doc(cfg(feature = "llamacpp")))]
pub use structgen_models::LlamaCppRuntime;

pub use direct::{generate_object, generate_object_in_role, generate_value};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for common imports.
///
/// ```rust
/// use structgen::prelude::*;
/// ```
pub mod prelude {
    pub use crate::direct::{generate_object, generate_object_in_role, generate_value};
    pub use structgen_core::{Context, FieldValue, GenerationSettings, ObjectValue, Role};
    pub use structgen_models::{GenerationRuntime, PromptTemplate, ScriptedRuntime};
    pub use structgen_output::{GenerationError, GenerationResult, Generator};
    pub use structgen_schema::{DeclaredType, Literals as _, Schema as _, SchemaBuilder};

    #[cfg(feature = "llamacpp")]
    pub use structgen_models::LlamaCppRuntime;

    #[cfg(feature = "macros")]
    pub use structgen_macros::{Literals, Schema};
}
