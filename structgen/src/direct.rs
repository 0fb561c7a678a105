//! Direct generation functions.
//!
//! One-call wrappers around [`Generator`] for the common cases. Use the
//! generator itself to reuse settings across calls.
//!
//! # Examples
//!
//! ```rust,ignore
//! use structgen::direct::generate_object_in_role;
//! use structgen::{Context, LlamaCppRuntime, Role};
//!
//! let ctx = Context::new()
//!     .with_user("Extract the following into an object: Jack is 30.")?;
//! let runtime = LlamaCppRuntime::from_env("mistral")?;
//! let (ctx, person): (_, Person) =
//!     generate_object_in_role(runtime, ctx, Role::Assistant).await?;
//! ```

use structgen_core::{Context, Role};
use structgen_models::GenerationRuntime;
use structgen_output::{GenerationResult, Generator};
use structgen_schema::{Schema, TypeDefinition};
use tracing::debug;

/// Generate an instance of `T` with default settings.
pub async fn generate_object<T, R>(runtime: R, context: Context) -> GenerationResult<(Context, T)>
where
    T: Schema,
    R: GenerationRuntime,
{
    Generator::new(runtime).generate_object(context).await
}

/// Generate the field values of a caller-built schema with default settings.
pub async fn generate_value<R: GenerationRuntime>(
    runtime: R,
    context: Context,
    definition: &TypeDefinition,
) -> GenerationResult<(Context, structgen_core::ObjectValue)> {
    Generator::new(runtime).generate_value(context, definition).await
}

/// Generate an instance of `T` inside a `role` turn.
///
/// The turn is closed once the object is complete. On failure the context
/// is dropped along with the half-open turn.
pub async fn generate_object_in_role<T, R>(
    runtime: R,
    context: Context,
    role: Role,
) -> GenerationResult<(Context, T)>
where
    T: Schema,
    R: GenerationRuntime,
{
    debug!(role = %role, schema = T::schema_name(), "generating inside role turn");
    let generator = Generator::new(runtime);
    context
        .in_role_async(role, |ctx| generator.generate_object::<T>(ctx))
        .await
}
