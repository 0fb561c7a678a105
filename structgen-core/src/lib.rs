//! # structgen-core
//!
//! Core types shared across the structgen workspace.
//!
//! - **Context**: the append-only record of prompts, generated text and role turns
//! - **Constraints**: patterns, literal alternations and sentinel disjunctions
//! - **Values**: decoded field values and their conversion into native types
//! - **Errors**: the error structs raised by introspection, decoding and assembly
//! - **Settings**: layout and safety caps for a generation session
//!
//! ## Example
//!
//! ```rust
//! use structgen_core::{Constraint, Context, Pattern, Role};
//!
//! let ctx = Context::new()
//!     .with_user("Extract the following into an object: Jack is 30.")
//!     .unwrap();
//! assert_eq!(ctx.open_role(), None);
//!
//! let age = Constraint::Pattern(Pattern::integer());
//! assert!(age.is_satisfied_by("30"));
//! assert!(!age.is_satisfied_by("thirty"));
//! # let _ = Role::Assistant;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constraint;
pub mod context;
pub mod errors;
pub mod settings;
pub mod value;

pub use constraint::{gbnf_literal, Constraint, Pattern};
pub use context::{Context, Role, Segment};
pub use errors::{ConfigurationError, DecodeError, UnsupportedFieldType, ValidationError};
pub use settings::GenerationSettings;
pub use value::{FieldValue, FromFieldValue, ObjectValue};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::constraint::{Constraint, Pattern};
    pub use crate::context::{Context, Role, Segment};
    pub use crate::errors::{ConfigurationError, DecodeError, UnsupportedFieldType, ValidationError};
    pub use crate::settings::GenerationSettings;
    pub use crate::value::{FieldValue, FromFieldValue, ObjectValue};
}
