//! The generation runtime trait.
//!
//! A runtime receives the accumulated [`Context`] and one [`Constraint`] and
//! returns the context extended with the produced text, plus that text. It
//! must only ever produce text the constraint accepts; implementations that
//! cannot enforce this at sampling time verify it afterwards with
//! [`ensure_satisfied`].

use async_trait::async_trait;
use std::sync::Arc;
use structgen_core::{Constraint, Context};

use crate::error::RuntimeError;

/// Core runtime trait.
#[async_trait]
pub trait GenerationRuntime: Send + Sync {
    /// Get the runtime (model) name.
    fn name(&self) -> &str;

    /// Get the runtime system (llama.cpp, mock, ...).
    fn system(&self) -> &str;

    /// Get the full runtime identifier.
    fn identifier(&self) -> String {
        format!("{}:{}", self.system(), self.name())
    }

    /// Produce text satisfying `constraint`, continuing `context`.
    async fn request(
        &self,
        context: Context,
        constraint: &Constraint,
    ) -> Result<(Context, String), RuntimeError>;
}

/// Boxed runtime for dynamic dispatch.
pub type BoxedRuntime = Arc<dyn GenerationRuntime>;

#[async_trait]
impl<R: GenerationRuntime + ?Sized> GenerationRuntime for Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn system(&self) -> &str {
        (**self).system()
    }

    fn identifier(&self) -> String {
        (**self).identifier()
    }

    async fn request(
        &self,
        context: Context,
        constraint: &Constraint,
    ) -> Result<(Context, String), RuntimeError> {
        (**self).request(context, constraint).await
    }
}

/// Fail with [`RuntimeError::ConstraintViolation`] unless `text` satisfies
/// `constraint` in full.
pub fn ensure_satisfied(constraint: &Constraint, text: &str) -> Result<(), RuntimeError> {
    match constraint.matches(text) {
        Ok(true) => Ok(()),
        Ok(false) => Err(RuntimeError::constraint_violation(constraint, text)),
        Err(e) => Err(RuntimeError::invalid_constraint(constraint, e)),
    }
}
