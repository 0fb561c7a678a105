//! Generation context.
//!
//! A [`Context`] is the ordered record of everything the model has seen so
//! far: caller prompts, orchestrator labels, generated text, and role
//! boundaries. It is a plain value. Every append consumes the context and
//! returns the extended one, so a caller holding a clone keeps an untouched
//! snapshot it can branch from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::errors::ConfigurationError;

/// Conversational role of a context segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// The end user.
    User,
    /// The model.
    Assistant,
}

impl Role {
    /// Lowercase role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Start of a role turn.
    RoleStart {
        /// Role being opened.
        role: Role,
    },
    /// End of a role turn.
    RoleEnd {
        /// Role being closed.
        role: Role,
    },
    /// Text supplied by the caller or the orchestrator.
    Prompt {
        /// The text.
        text: String,
    },
    /// Text produced by the generation runtime.
    Generated {
        /// The text.
        text: String,
    },
}

impl Segment {
    /// Text carried by this segment, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Prompt { text } | Self::Generated { text } => Some(text),
            Self::RoleStart { .. } | Self::RoleEnd { .. } => None,
        }
    }
}

/// Append-only sequence of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    segments: Vec<Segment>,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding a single prompt.
    #[must_use]
    pub fn from_prompt(text: impl Into<String>) -> Self {
        Self::new().with_prompt(text)
    }

    /// Append a segment.
    #[must_use]
    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Append prompt text. Empty text is dropped.
    #[must_use]
    pub fn with_prompt(self, text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        self.with_segment(Segment::Prompt { text })
    }

    /// Append text produced by a runtime.
    #[must_use]
    pub fn with_generated(self, text: impl Into<String>) -> Self {
        self.with_segment(Segment::Generated { text: text.into() })
    }

    /// Append a complete system turn.
    pub fn with_system(self, text: impl Into<String>) -> Result<Self, ConfigurationError> {
        let text = text.into();
        self.in_role(Role::System, |ctx| Ok(ctx.with_prompt(text)))
    }

    /// Append a complete user turn.
    pub fn with_user(self, text: impl Into<String>) -> Result<Self, ConfigurationError> {
        let text = text.into();
        self.in_role(Role::User, |ctx| Ok(ctx.with_prompt(text)))
    }

    /// All segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the context has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The role turn currently open, if any.
    #[must_use]
    pub fn open_role(&self) -> Option<Role> {
        let mut open = None;
        for segment in &self.segments {
            match segment {
                Segment::RoleStart { role } => open = Some(*role),
                Segment::RoleEnd { .. } => open = None,
                _ => {}
            }
        }
        open
    }

    /// Concatenated text of every segment, ignoring role boundaries.
    #[must_use]
    pub fn text(&self) -> String {
        self.segments.iter().filter_map(Segment::text).collect()
    }

    /// Concatenated text produced by the runtime.
    #[must_use]
    pub fn generated_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Generated { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether the accumulated text ends with `suffix`.
    #[must_use]
    pub fn ends_with(&self, suffix: &str) -> bool {
        let mut remaining = suffix;
        for segment in self.segments.iter().rev() {
            let Some(text) = segment.text() else {
                continue;
            };
            if remaining.len() <= text.len() {
                return text.ends_with(remaining);
            }
            match remaining.strip_suffix(text) {
                Some(rest) => remaining = rest,
                None => return false,
            }
        }
        remaining.is_empty()
    }

    fn begin_role(self, role: Role) -> Result<Self, ConfigurationError> {
        if let Some(open) = self.open_role() {
            return Err(ConfigurationError::new(format!(
                "cannot open a '{}' turn inside an open '{}' turn",
                role, open
            )));
        }
        Ok(self.with_segment(Segment::RoleStart { role }))
    }

    /// Run `f` inside a role turn.
    ///
    /// The turn is closed when `f` returns. When `f` fails the context is
    /// dropped together with the half-open turn and the error is returned.
    pub fn in_role<F, E>(self, role: Role, f: F) -> Result<Self, E>
    where
        F: FnOnce(Self) -> Result<Self, E>,
        E: From<ConfigurationError>,
    {
        let inner = f(self.begin_role(role)?)?;
        Ok(inner.with_segment(Segment::RoleEnd { role }))
    }

    /// Async counterpart of [`Context::in_role`] for steps that also return a value.
    pub async fn in_role_async<F, Fut, T, E>(self, role: Role, f: F) -> Result<(Self, T), E>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<(Self, T), E>>,
        E: From<ConfigurationError>,
    {
        let (inner, value) = f(self.begin_role(role)?).await?;
        Ok((inner.with_segment(Segment::RoleEnd { role }), value))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            if let Some(text) = segment.text() {
                f.write_str(text)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_appends_do_not_touch_snapshots() {
        let base = Context::from_prompt("Hello");
        let snapshot = base.clone();
        let extended = base.with_generated(" world");

        assert_eq!(snapshot.text(), "Hello");
        assert_eq!(extended.text(), "Hello world");
        assert_eq!(extended.generated_text(), " world");
    }

    #[test]
    fn test_empty_prompt_is_dropped() {
        let ctx = Context::new().with_prompt("");
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_in_role_closes_turn() {
        let ctx = Context::new().with_user("Say hi").unwrap();
        assert_eq!(
            ctx.segments(),
            &[
                Segment::RoleStart { role: Role::User },
                Segment::Prompt {
                    text: "Say hi".to_string()
                },
                Segment::RoleEnd { role: Role::User },
            ]
        );
        assert_eq!(ctx.open_role(), None);
    }

    #[test]
    fn test_in_role_rejects_nesting() {
        let result: Result<Context, ConfigurationError> =
            Context::new().in_role(Role::Assistant, |ctx| ctx.with_user("nested"));
        assert!(result.is_err());
    }

    #[test]
    fn test_in_role_propagates_failure() {
        let result: Result<Context, ConfigurationError> = Context::new()
            .in_role(Role::Assistant, |_| Err(ConfigurationError::new("boom")));
        assert_eq!(result.unwrap_err(), ConfigurationError::new("boom"));
    }

    #[tokio::test]
    async fn test_in_role_async_returns_value() {
        let (ctx, value) = Context::new()
            .in_role_async(Role::Assistant, |ctx| async move {
                assert_eq!(ctx.open_role(), Some(Role::Assistant));
                Ok::<_, ConfigurationError>((ctx.with_generated("42"), 42))
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(ctx.open_role(), None);
        assert_eq!(ctx.text(), "42");
    }

    #[test]
    fn test_ends_with_spans_segments() {
        let ctx = Context::from_prompt("name: ")
            .with_generated("\"Jack\"")
            .with_prompt("\n");
        assert!(ctx.ends_with("\"\n"));
        assert!(ctx.ends_with("name: \"Jack\"\n"));
        assert!(!ctx.ends_with("age"));
        assert!(!ctx.ends_with("xname: \"Jack\"\n"));
    }

    #[test]
    fn test_display_concatenates_text() {
        let ctx = Context::new()
            .with_system("Be terse.")
            .unwrap()
            .with_prompt("a")
            .with_generated("b");
        assert_eq!(ctx.to_string(), "Be terse.ab");
    }
}
