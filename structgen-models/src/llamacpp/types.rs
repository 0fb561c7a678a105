//! llama.cpp server API types.

use serde::{Deserialize, Serialize};

/// Completion request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Rendered prompt.
    pub prompt: String,
    /// GBNF grammar restricting the output.
    pub grammar: String,
    /// Maximum tokens to predict, -1 for no limit.
    pub n_predict: i32,
    /// Temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Sampling seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Stream.
    pub stream: bool,
    /// Reuse the KV cache for the shared prompt prefix.
    pub cache_prompt: bool,
}

/// Completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,
    /// Whether generation stopped.
    #[serde(default)]
    pub stop: bool,
    /// Whether generation stopped on the token limit.
    #[serde(default)]
    pub stopped_limit: bool,
    /// Tokens predicted.
    #[serde(default)]
    pub tokens_predicted: Option<u64>,
    /// Prompt tokens evaluated.
    #[serde(default)]
    pub tokens_evaluated: Option<u64>,
}

/// Error body returned by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetail,
}

/// Error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    /// Error message.
    pub message: String,
}
