//! Builder for hand-written type definitions.

use structgen_core::{ObjectValue, ValidationError};

use crate::definition::{DeclaredType, FieldDeclaration, SchemaRef, TypeDefinition};

/// Fluent API for describing a schema at runtime.
///
/// # Example
///
/// ```rust
/// use structgen_schema::{introspect, DeclaredType, SchemaBuilder};
///
/// let schema = SchemaBuilder::new("SimpleClass")
///     .text("name")
///     .instruction("Provide a name.")
///     .integer("age")
///     .instruction("Provide an age in years.")
///     .optional("favorite_fruit", DeclaredType::literals(["pear", "banana", "apple"]))
///     .build();
///
/// let fields = introspect(&schema).unwrap();
/// assert_eq!(fields.len(), 3);
/// assert_eq!(fields[1].instruction.as_deref(), Some("Provide an age in years."));
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    definition: TypeDefinition,
}

impl SchemaBuilder {
    /// Start a schema called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            definition: TypeDefinition::new(name),
        }
    }

    /// Add a field of any declared type.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: DeclaredType) -> Self {
        self.definition = self.definition.with_field(FieldDeclaration::new(name, ty));
        self
    }

    /// Add a text field.
    #[must_use]
    pub fn text(self, name: impl Into<String>) -> Self {
        self.field(name, DeclaredType::Text)
    }

    /// Add an integer field.
    #[must_use]
    pub fn integer(self, name: impl Into<String>) -> Self {
        self.field(name, DeclaredType::Integer)
    }

    /// Add a float field.
    #[must_use]
    pub fn float(self, name: impl Into<String>) -> Self {
        self.field(name, DeclaredType::Float)
    }

    /// Add a boolean field.
    #[must_use]
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.field(name, DeclaredType::Boolean)
    }

    /// Add an enum field.
    #[must_use]
    pub fn literals<I, S>(self, name: impl Into<String>, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field(name, DeclaredType::literals(literals))
    }

    /// Add a nested object field.
    #[must_use]
    pub fn object(self, name: impl Into<String>, schema: impl Into<SchemaRef>) -> Self {
        self.field(name, DeclaredType::Object(schema.into()))
    }

    /// Add an optional field.
    #[must_use]
    pub fn optional(self, name: impl Into<String>, inner: DeclaredType) -> Self {
        self.field(name, DeclaredType::optional(inner))
    }

    /// Add a list field.
    #[must_use]
    pub fn list(self, name: impl Into<String>, item: DeclaredType) -> Self {
        self.field(name, DeclaredType::list(item))
    }

    /// Add a map field with text keys.
    #[must_use]
    pub fn map(self, name: impl Into<String>, value: DeclaredType) -> Self {
        self.field(name, DeclaredType::map(value))
    }

    /// Add a union field.
    #[must_use]
    pub fn union<I>(self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = DeclaredType>,
    {
        self.field(name, DeclaredType::union(members))
    }

    /// Attach an instruction to the most recently added field.
    ///
    /// Does nothing when no field has been added yet.
    #[must_use]
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        if let Some(field) = self.definition.last_field_mut() {
            *field = field.clone().with_instruction(instruction);
        }
        self
    }

    /// Add a cross-field validator.
    #[must_use]
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ObjectValue) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.definition = self.definition.with_validator(validator);
        self
    }

    /// Finish the definition.
    #[must_use]
    pub fn build(self) -> TypeDefinition {
        self.definition
    }

    /// Finish the definition as a shareable nested-schema reference.
    #[must_use]
    pub fn build_ref(self) -> SchemaRef {
        SchemaRef::shared(self.definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use structgen_core::FieldValue;

    #[test]
    fn test_builder_fields() {
        let address = SchemaBuilder::new("Address").text("city").build_ref();
        let schema = SchemaBuilder::new("Person")
            .text("name")
            .float("height")
            .boolean("active")
            .literals("role", ["admin", "user"])
            .object("home", address)
            .list("tags", DeclaredType::Text)
            .map("scores", DeclaredType::Float)
            .union("id", [DeclaredType::Integer, DeclaredType::Text])
            .build();

        let types: Vec<_> = schema.fields().iter().map(|f| f.ty.describe()).collect();
        assert_eq!(
            types,
            vec![
                "text",
                "float",
                "boolean",
                "one of [\"admin\", \"user\"]",
                "Address",
                "list<text>",
                "map<float>",
                "union<integer | text>"
            ]
        );
    }

    #[test]
    fn test_instruction_before_any_field_is_ignored() {
        let schema = SchemaBuilder::new("Empty").instruction("ignored").text("a").build();
        assert_eq!(schema.fields()[0].instruction, None);
    }

    #[test]
    fn test_validator_is_attached() {
        let schema = SchemaBuilder::new("Person")
            .integer("age")
            .validator(|obj| match obj.get("age") {
                Some(FieldValue::Integer(n)) if *n > 0 => Ok(()),
                _ => Err(ValidationError::new("age must exceed zero")),
            })
            .build();
        assert_eq!(schema.validator_count(), 1);

        let zero = ObjectValue::new("Person").with_field("age", FieldValue::Integer(0));
        assert!(schema.validate(&zero).is_err());
    }
}
