//! Generation settings.
//!
//! [`GenerationSettings`] controls how schemas are laid out in the context
//! and which safety caps apply while generating.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

/// Default absence sentinel.
pub const DEFAULT_SENTINEL: &str = "null";

/// Default token cap for free text fields.
pub const DEFAULT_TEXT_MAX_TOKENS: u32 = 256;

/// Default nesting cap for composite fields.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Settings for one generation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Literal the model emits for an empty optional.
    pub sentinel: String,

    /// Token cap for free text fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_max_tokens: Option<u32>,

    /// Maximum composite nesting depth.
    pub max_depth: usize,

    /// Spaces of indentation per nesting level.
    pub indent: usize,

    /// Wrap the generated object in a fenced yaml block.
    pub fence: bool,

    /// Cap on items per list or map. The collection is closed once reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_list_items: Option<usize>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            text_max_tokens: Some(DEFAULT_TEXT_MAX_TOKENS),
            max_depth: DEFAULT_MAX_DEPTH,
            indent: 2,
            fence: true,
            max_list_items: None,
        }
    }
}

impl GenerationSettings {
    /// Create default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the absence sentinel.
    #[must_use]
    pub fn sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Set the token cap for free text.
    #[must_use]
    pub fn text_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.text_max_tokens = max_tokens;
        self
    }

    /// Set the maximum nesting depth.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set indentation width.
    #[must_use]
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Enable or disable the yaml fence.
    #[must_use]
    pub fn fence(mut self, fence: bool) -> Self {
        self.fence = fence;
        self
    }

    /// Set the item cap for lists and maps.
    #[must_use]
    pub fn max_list_items(mut self, max: usize) -> Self {
        self.max_list_items = Some(max);
        self
    }

    /// Reject settings the orchestrator cannot work with.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.sentinel.is_empty() {
            return Err(ConfigurationError::new("sentinel must not be empty"));
        }
        if self.sentinel.chars().any(|c| c.is_whitespace() || c == '"') {
            return Err(ConfigurationError::new(format!(
                "sentinel {:?} must not contain whitespace or quotes",
                self.sentinel
            )));
        }
        if matches!(self.sentinel.as_str(), "[" | "]" | "{" | "}" | "-" | "true" | "false") {
            return Err(ConfigurationError::new(format!(
                "sentinel {:?} collides with a structural token",
                self.sentinel
            )));
        }
        if self.indent < 2 {
            return Err(ConfigurationError::new(
                "indent must be at least 2 to fit a sequence item marker",
            ));
        }
        if self.max_depth == 0 {
            return Err(ConfigurationError::new("max_depth must be at least 1"));
        }
        if self.text_max_tokens == Some(0) {
            return Err(ConfigurationError::new("text_max_tokens must be positive"));
        }
        Ok(())
    }

    /// Indentation prefix for `depth`.
    #[must_use]
    pub fn indentation(&self, depth: usize) -> String {
        " ".repeat(self.indent * depth)
    }

    /// Block sequence item marker at `depth`, padded so the item's fields
    /// line up with the next indentation level.
    #[must_use]
    pub fn item_marker(&self, depth: usize) -> String {
        format!("{}{:<width$}", self.indentation(depth), "-", width = self.indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.sentinel, "null");
        assert_eq!(settings.text_max_tokens, Some(256));
        assert!(settings.fence);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.item_marker(0), "- ");
    }

    #[test]
    fn test_builder() {
        let settings = GenerationSettings::new()
            .sentinel("none")
            .max_depth(3)
            .indent(4)
            .fence(false)
            .max_list_items(5)
            .text_max_tokens(None);
        assert_eq!(settings.sentinel, "none");
        assert_eq!(settings.indentation(2), " ".repeat(8));
        assert_eq!(settings.max_list_items, Some(5));
        assert_eq!(settings.item_marker(1), "    -   ");
        assert!(settings.validate().is_ok());
    }

    #[rstest]
    #[case(GenerationSettings::new().sentinel(""))]
    #[case(GenerationSettings::new().sentinel("no value"))]
    #[case(GenerationSettings::new().sentinel("]"))]
    #[case(GenerationSettings::new().indent(0))]
    #[case(GenerationSettings::new().indent(1))]
    #[case(GenerationSettings::new().sentinel("{"))]
    #[case(GenerationSettings::new().max_depth(0))]
    #[case(GenerationSettings::new().text_max_tokens(Some(0)))]
    fn test_invalid_settings(#[case] settings: GenerationSettings) {
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let settings: GenerationSettings =
            serde_json::from_str(r#"{"sentinel": "nil", "max_depth": 2}"#).unwrap();
        assert_eq!(settings.sentinel, "nil");
        assert_eq!(settings.max_depth, 2);
        assert_eq!(settings.indent, 2);
        assert!(settings.fence);
    }
}
