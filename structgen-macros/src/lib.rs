//! # structgen-macros
//!
//! Procedural macros for structgen.
//!
//! These derives turn ordinary Rust types into explicit type definitions
//! the constraint compiler can walk.
//!
//! ## Schema Macro
//!
//! ```ignore
//! #[derive(Schema)]
//! #[schema(validate = check_person)]
//! struct Person {
//!     /// Provide a name.
//!     name: String,
//!     #[schema(instruction = "Provide an age in years.")]
//!     age: u32,
//!     favorite_fruit: Option<Fruit>,
//! }
//! ```
//!
//! ## Literals Macro
//!
//! ```ignore
//! #[derive(Literals)]
//! #[literals(rename_all = "lowercase")]
//! enum Fruit {
//!     Pear,
//!     Banana,
//!     Apple,
//! }
//! ```

extern crate proc_macro;

mod literals;
mod schema;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for implementing the `Schema` trait.
///
/// Generates `Schema`, `FieldType` and `FromFieldValue` implementations so
/// the struct can be generated at the top level or nested in another schema.
/// Fields keep their declaration order.
///
/// # Attributes
///
/// - `#[schema(name = "...")]` on the struct - Override the schema name
/// - `#[schema(validate = path)]` on the struct - Cross-field check, a
///   `fn(&Self) -> Result<(), E>` where `E: Into<String>`
/// - `#[schema(instruction = "...")]` on a field - Instruction shown above
///   the field (default: the field's doc comment)
/// - `#[schema(rename = "...")]` on a field - Name used in the prompt
///
/// # Example
///
/// ```ignore
/// #[derive(Schema)]
/// struct SimpleClass {
///     /// Provide a name.
///     name: String,
///     age: u32,
/// }
/// ```
#[proc_macro_derive(Schema, attributes(schema))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    schema::derive_schema_impl(input)
}

/// Derive macro for implementing the `Literals` trait on a unit-only enum.
///
/// # Attributes
///
/// - `#[literals(rename_all = "...")]` on the enum - One of `lowercase`,
///   `UPPERCASE`, `snake_case`, `kebab-case`
/// - `#[literal(rename = "...")]` on a variant - Exact literal for the variant
///
/// Without attributes each variant's literal is its name.
#[proc_macro_derive(Literals, attributes(literals, literal))]
pub fn derive_literals(input: TokenStream) -> TokenStream {
    literals::derive_literals_impl(input)
}
