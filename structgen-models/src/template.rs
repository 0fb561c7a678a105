//! Prompt templates.
//!
//! Completion endpoints take a single prompt string, so role segments of a
//! [`Context`] have to be rendered into the model's chat markup first.

use serde::{Deserialize, Serialize};
use structgen_core::{Context, Segment};

/// How a context is rendered into a completion prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    /// Text only; role boundaries are dropped.
    #[default]
    Plain,
    /// ChatML markup (`<|im_start|>role` ... `<|im_end|>`).
    ChatMl,
}

impl PromptTemplate {
    /// Render `context` into a prompt string.
    #[must_use]
    pub fn render(&self, context: &Context) -> String {
        match self {
            Self::Plain => context.text(),
            Self::ChatMl => {
                let mut out = String::new();
                for segment in context.segments() {
                    match segment {
                        Segment::RoleStart { role } => {
                            out.push_str("<|im_start|>");
                            out.push_str(role.as_str());
                            out.push('\n');
                        }
                        Segment::RoleEnd { .. } => out.push_str("<|im_end|>\n"),
                        Segment::Prompt { text } | Segment::Generated { text } => {
                            out.push_str(text);
                        }
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use structgen_core::Role;

    fn conversation() -> Context {
        Context::new()
            .with_system("Extract objects.")
            .unwrap()
            .with_user("Jack is 30.")
            .unwrap()
            .with_segment(Segment::RoleStart {
                role: Role::Assistant,
            })
            .with_prompt("name: ")
    }

    #[test]
    fn test_plain_drops_roles() {
        assert_eq!(
            PromptTemplate::Plain.render(&conversation()),
            "Extract objects.Jack is 30.name: "
        );
    }

    #[test]
    fn test_chatml_leaves_open_turn_open() {
        assert_eq!(
            PromptTemplate::ChatMl.render(&conversation()),
            "<|im_start|>system\nExtract objects.<|im_end|>\n\
             <|im_start|>user\nJack is 30.<|im_end|>\n\
             <|im_start|>assistant\nname: "
        );
    }
}
