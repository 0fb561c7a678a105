//! # structgen-models
//!
//! Generation runtimes for structgen.
//!
//! A runtime takes the accumulated context and one constraint, and returns
//! the context extended with text that satisfies the constraint. The
//! orchestrator only ever talks to the [`GenerationRuntime`] trait.
//!
//! ## Runtimes
//!
//! - [`LlamaCppRuntime`]: llama.cpp HTTP server with GBNF grammars
//!   (feature `llamacpp`, on by default)
//! - [`ScriptedRuntime`] / [`FunctionRuntime`]: deterministic runtimes for tests
//!
//! ## Example
//!
//! ```rust
//! use structgen_core::{Constraint, Context};
//! use structgen_models::{GenerationRuntime, ScriptedRuntime};
//!
//! # tokio_test::block_on(async {
//! let runtime = ScriptedRuntime::new("test").with_response("apple");
//! let (ctx, text) = runtime
//!     .request(Context::from_prompt("fruit: "), &Constraint::choice(["pear", "apple"]))
//!     .await
//!     .unwrap();
//! assert_eq!(text, "apple");
//! assert_eq!(ctx.text(), "fruit: apple");
//! # });
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod mock;
pub mod runtime;
pub mod template;

#[cfg(feature = "llamacpp")]
pub mod llamacpp;

pub use error::{RuntimeError, RuntimeResult};
pub use mock::{FunctionRuntime, RecordedRequest, ScriptedRuntime};
pub use runtime::{ensure_satisfied, BoxedRuntime, GenerationRuntime};
pub use template::PromptTemplate;

#[cfg(feature = "llamacpp")]
pub use llamacpp::LlamaCppRuntime;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::error::{RuntimeError, RuntimeResult};
    pub use crate::mock::{FunctionRuntime, ScriptedRuntime};
    pub use crate::runtime::{BoxedRuntime, GenerationRuntime};
    pub use crate::template::PromptTemplate;

    #[cfg(feature = "llamacpp")]
    pub use crate::llamacpp::LlamaCppRuntime;
}
