//! Scripted and function-based runtimes for testing.
//!
//! This module provides testing utilities:
//!
//! - [`ScriptedRuntime`]: returns a queue of pre-configured fragments
//! - [`FunctionRuntime`]: computes each fragment with a closure
//!
//! Both record every request and reject fragments that do not satisfy the
//! requested constraint, exactly like a constrained sampler would never
//! produce them.
//!
//! # Examples
//!
//! ```rust
//! use structgen_models::ScriptedRuntime;
//!
//! let runtime = ScriptedRuntime::new("test")
//!     .with_response("\"Jack\"")
//!     .with_response("30");
//! assert_eq!(runtime.remaining(), 2);
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use structgen_core::{Constraint, Context};
use tracing::trace;

use crate::error::RuntimeError;
use crate::runtime::{ensure_satisfied, GenerationRuntime};

/// A request seen by a test runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Full context text at the time of the request.
    pub context: String,
    /// Requested constraint.
    pub constraint: Constraint,
}

// ============================================================================
// ScriptedRuntime - Pre-configured fragments
// ============================================================================

/// A runtime that replays pre-configured fragments in order.
///
/// Running out of fragments is an error ([`RuntimeError::Exhausted`]) so a
/// test notices when the orchestrator issues more requests than expected.
#[derive(Debug, Clone)]
pub struct ScriptedRuntime {
    name: String,
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ScriptedRuntime {
    /// Create a runtime with no responses.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a fragment to return.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.responses.lock().push_back(text.into());
        self
    }

    /// Add several fragments to return, in order.
    pub fn with_responses<I, S>(self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses
            .lock()
            .extend(texts.into_iter().map(Into::into));
        self
    }

    /// Get recorded requests.
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of fragments not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl GenerationRuntime for ScriptedRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn system(&self) -> &str {
        "scripted"
    }

    async fn request(
        &self,
        context: Context,
        constraint: &Constraint,
    ) -> Result<(Context, String), RuntimeError> {
        let index = {
            let mut requests = self.requests.lock();
            requests.push(RecordedRequest {
                context: context.text(),
                constraint: constraint.clone(),
            });
            requests.len()
        };

        let text = self
            .responses
            .lock()
            .pop_front()
            .ok_or(RuntimeError::Exhausted(index))?;
        trace!(runtime = %self.name, request = index, text = %text, "scripted fragment");

        ensure_satisfied(constraint, &text)?;
        Ok((context.with_generated(text.clone()), text))
    }
}

// ============================================================================
// FunctionRuntime - Closure-driven fragments
// ============================================================================

/// Type alias for function runtime callback.
///
/// The function receives the context so far and the constraint and returns
/// the fragment to produce.
pub type FunctionDef =
    dyn Fn(&Context, &Constraint) -> Result<String, RuntimeError> + Send + Sync;

/// A runtime controlled by a local function.
///
/// More flexible than [`ScriptedRuntime`]: the function sees the prompt and
/// can answer based on the field label at the end of it.
///
/// # Example
///
/// ```rust
/// use structgen_core::Constraint;
/// use structgen_models::FunctionRuntime;
///
/// // Always pick the first allowed literal.
/// let runtime = FunctionRuntime::new(|_ctx, constraint| {
///     Ok(constraint
///         .options()
///         .and_then(|o| o.first().cloned())
///         .unwrap_or_else(|| "0".to_string()))
/// });
/// ```
#[derive(Clone)]
pub struct FunctionRuntime {
    name: String,
    function: Arc<FunctionDef>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl std::fmt::Debug for FunctionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRuntime")
            .field("name", &self.name)
            .field("requests", &self.requests.lock().len())
            .finish()
    }
}

impl FunctionRuntime {
    /// Create a runtime from a function.
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&Context, &Constraint) -> Result<String, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            name: "function".to_string(),
            function: Arc::new(function),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a custom name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get recorded requests.
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl GenerationRuntime for FunctionRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn system(&self) -> &str {
        "function"
    }

    async fn request(
        &self,
        context: Context,
        constraint: &Constraint,
    ) -> Result<(Context, String), RuntimeError> {
        self.requests.lock().push(RecordedRequest {
            context: context.text(),
            constraint: constraint.clone(),
        });

        let text = (self.function)(&context, constraint)?;
        ensure_satisfied(constraint, &text)?;
        Ok((context.with_generated(text.clone()), text))
    }
}
