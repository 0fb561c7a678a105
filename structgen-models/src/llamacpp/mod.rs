//! llama.cpp runtime.
//!
//! [llama.cpp](https://github.com/ggerganov/llama.cpp)'s HTTP server accepts
//! a GBNF grammar with every completion request and only samples tokens the
//! grammar allows. Each [`Constraint`] is compiled to such a grammar, so the
//! server enforces it at sampling time.
//!
//! ## Example
//!
//! ```ignore
//! use structgen_models::llamacpp::LlamaCppRuntime;
//! use structgen_models::PromptTemplate;
//!
//! // Connect to a local server
//! let runtime = LlamaCppRuntime::new("mistral-7b-instruct");
//!
//! // Custom host and chat markup
//! let runtime = LlamaCppRuntime::new("qwen2")
//!     .with_base_url("http://192.168.1.100:8080")
//!     .with_template(PromptTemplate::ChatMl);
//! ```

pub mod types;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use structgen_core::{Constraint, Context};
use tracing::{debug, warn};

use crate::error::RuntimeError;
use crate::runtime::GenerationRuntime;
use crate::template::PromptTemplate;

/// llama.cpp server client.
#[derive(Debug, Clone)]
pub struct LlamaCppRuntime {
    /// Model name, informational only.
    model_name: String,
    /// HTTP client.
    client: Client,
    /// Base URL.
    base_url: String,
    /// Prompt template.
    template: PromptTemplate,
    /// Sampling temperature.
    temperature: Option<f64>,
    /// Sampling seed.
    seed: Option<i64>,
    /// Reuse the KV cache across requests.
    cache_prompt: bool,
    /// Default timeout.
    default_timeout: Duration,
}

impl LlamaCppRuntime {
    /// Default llama.cpp server URL.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8080";

    /// Create a new runtime.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            client: Client::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            template: PromptTemplate::default(),
            temperature: None,
            seed: None,
            cache_prompt: true,
            default_timeout: Duration::from_secs(120),
        }
    }

    /// Create from environment variable `LLAMA_CPP_HOST`.
    pub fn from_env(model_name: impl Into<String>) -> Result<Self, RuntimeError> {
        let base_url = std::env::var("LLAMA_CPP_HOST")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());
        Ok(Self::new(model_name).with_base_url(base_url))
    }

    /// Set custom base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the prompt template.
    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the sampling seed.
    #[must_use]
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable prompt caching.
    #[must_use]
    pub fn with_cache_prompt(mut self, cache_prompt: bool) -> Self {
        self.cache_prompt = cache_prompt;
        self
    }

    /// Build the completion request.
    fn build_request(&self, context: &Context, constraint: &Constraint) -> types::CompletionRequest {
        let n_predict = constraint
            .max_tokens()
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(-1);

        types::CompletionRequest {
            prompt: self.template.render(context),
            grammar: constraint.to_gbnf(),
            n_predict,
            temperature: self.temperature,
            seed: self.seed,
            stream: false,
            cache_prompt: self.cache_prompt,
        }
    }

    /// Check the completion against the constraint.
    fn parse_response(
        &self,
        response: types::CompletionResponse,
        constraint: &Constraint,
    ) -> Result<String, RuntimeError> {
        let text = response.content;
        if !constraint
            .matches(&text)
            .map_err(|e| RuntimeError::invalid_constraint(constraint, e))?
        {
            warn!(
                runtime = %self.model_name,
                constraint = %constraint,
                produced = %text,
                stopped_limit = response.stopped_limit,
                "completion violates its constraint"
            );
            return Err(RuntimeError::constraint_violation(constraint, text));
        }
        Ok(text)
    }
}

#[async_trait]
impl GenerationRuntime for LlamaCppRuntime {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn system(&self) -> &str {
        "llamacpp"
    }

    async fn request(
        &self,
        context: Context,
        constraint: &Constraint,
    ) -> Result<(Context, String), RuntimeError> {
        let body = self.build_request(&context, constraint);
        debug!(
            runtime = %self.model_name,
            prompt_len = body.prompt.len(),
            n_predict = body.n_predict,
            "requesting completion"
        );

        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .header("Content-Type", "application/json")
            .timeout(self.default_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RuntimeError::Timeout(self.default_timeout)
                } else {
                    e.into()
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<types::ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(RuntimeError::http(status, message));
        }

        let text = response.text().await?;
        let completion: types::CompletionResponse = serde_json::from_str(&text)?;

        let text = self.parse_response(completion, constraint)?;
        Ok((context.with_generated(text.clone()), text))
    }
}
