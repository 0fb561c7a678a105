//! Prompt fragments.
//!
//! The generated object is laid out as a YAML mapping. Each field is
//! preceded by its instruction as `#` comment lines, then a `name:` label
//! indented by nesting depth:
//!
//! ````text
//! ```yaml
//! # Provide a name.
//! name: "Jack"
//! age: 30
//! address:
//!   city: "Berlin"
//! tags: ["a", "b"]
//! counts: {"a": 1}
//! stories:
//! - summary: "Met Jill."
//!   events: []
//!
//! ```
//! ````

use structgen_core::GenerationSettings;

use crate::compile::{CompiledField, FieldPlan};

/// Opens the generated block.
pub const FENCE_OPEN: &str = "\n```yaml\n";

/// Closes the generated block. Every field ends with a newline already.
pub const FENCE_CLOSE: &str = "```";

/// Instruction as comment lines, one per non-blank line.
#[must_use]
pub fn instruction_lines(instruction: Option<&str>, indentation: &str) -> String {
    let Some(instruction) = instruction else {
        return String::new();
    };
    instruction
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{}# {}\n", indentation, line))
        .collect()
}

/// Label written before a field's value.
///
/// Required objects start on the next line. Optional objects and object
/// collections leave the rest of the line to their opening step. Everything
/// else gets its value on the same line.
#[must_use]
pub fn field_label(field: &CompiledField, indentation: &str) -> String {
    let name = &field.descriptor.name;
    match &field.plan {
        FieldPlan::Nested { presence: None, .. } => format!("{}{}:\n", indentation, name),
        FieldPlan::Nested { presence: Some(_), .. }
        | FieldPlan::ObjectList { .. }
        | FieldPlan::ObjectMap { .. } => format!("{}{}:", indentation, name),
        FieldPlan::Generate(_) | FieldPlan::Flow { .. } => format!("{}{}: ", indentation, name),
    }
}

/// Instruction lines followed by the label, for a field at `depth`.
#[must_use]
pub fn field_prompt(field: &CompiledField, settings: &GenerationSettings, depth: usize) -> String {
    let indentation = settings.indentation(depth);
    let mut prompt = instruction_lines(field.descriptor.instruction.as_deref(), &indentation);
    prompt.push_str(&field_label(field, &indentation));
    prompt
}

/// Prompt for the first field of a sequence item, written right after the
/// `- ` marker. Instruction comments stay on the marker's line.
#[must_use]
pub fn item_field_prompt(field: &CompiledField, settings: &GenerationSettings, depth: usize) -> String {
    let indentation = settings.indentation(depth);
    let mut prompt = instruction_lines(field.descriptor.instruction.as_deref(), &indentation);
    if prompt.is_empty() {
        return field_label(field, "");
    }
    prompt.replace_range(..indentation.len(), "");
    prompt.push_str(&field_label(field, &indentation));
    prompt
}
