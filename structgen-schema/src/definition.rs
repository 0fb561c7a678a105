//! Type definitions.
//!
//! A [`TypeDefinition`] is the explicit description of a structured type:
//! its name, its fields in declaration order, the type each field declares,
//! optional per-field instructions, and any cross-field validators.
//! Definitions are built by hand with [`SchemaBuilder`](crate::SchemaBuilder)
//! or derived with `#[derive(Schema)]`.

use std::fmt;
use std::sync::Arc;

use structgen_core::{ObjectValue, ValidationError};

use crate::traits::Schema;

/// Type a field declares, before introspection decides whether it can be
/// constrained.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    /// Free text.
    Text,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean.
    Boolean,
    /// Raw binary payload.
    Bytes,
    /// String-keyed map.
    Map(Box<DeclaredType>),
    /// Bounded set of string literals.
    Literals(Vec<String>),
    /// Another schema-bearing type.
    Object(SchemaRef),
    /// Value that may be absent.
    Optional(Box<DeclaredType>),
    /// Ordered sequence.
    List(Box<DeclaredType>),
    /// Exactly one of several member types.
    Union(Vec<DeclaredType>),
    /// Any other named type.
    Other(String),
}

impl DeclaredType {
    /// Literal set from any iterator of strings.
    pub fn literals<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Literals(literals.into_iter().map(Into::into).collect())
    }

    /// Optional wrapper.
    #[must_use]
    pub fn optional(inner: DeclaredType) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// List wrapper.
    #[must_use]
    pub fn list(inner: DeclaredType) -> Self {
        Self::List(Box::new(inner))
    }

    /// Map wrapper.
    #[must_use]
    pub fn map(value: DeclaredType) -> Self {
        Self::Map(Box::new(value))
    }

    /// Union of member types, tried in declaration order.
    pub fn union(members: impl IntoIterator<Item = DeclaredType>) -> Self {
        Self::Union(members.into_iter().collect())
    }

    /// Nested object from a derived schema.
    #[must_use]
    pub fn object<T: Schema>() -> Self {
        Self::Object(SchemaRef::of::<T>())
    }

    /// Human readable name used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Text => "text".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Float => "float".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Bytes => "bytes".to_string(),
            Self::Map(value) => format!("map<{}>", value.describe()),
            Self::Literals(literals) => format!("one of {:?}", literals),
            Self::Object(schema) => schema.name().to_string(),
            Self::Optional(inner) => format!("optional<{}>", inner.describe()),
            Self::List(inner) => format!("list<{}>", inner.describe()),
            Self::Union(members) => {
                let members: Vec<_> = members.iter().map(DeclaredType::describe).collect();
                format!("union<{}>", members.join(" | "))
            }
            Self::Other(name) => name.clone(),
        }
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    /// Field name, as it appears in the prompt and in the assembled value.
    pub name: String,
    /// Declared type.
    pub ty: DeclaredType,
    /// Natural-language instruction shown to the model above the field.
    pub instruction: Option<String>,
}

impl FieldDeclaration {
    /// Create a field without an instruction.
    pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
        Self {
            name: name.into(),
            ty,
            instruction: None,
        }
    }

    /// Attach an instruction. Blank instructions are ignored.
    #[must_use]
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        let trimmed = instruction.trim();
        self.instruction = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }
}

/// Cross-field validator run on the assembled value.
pub type Validator = Arc<dyn Fn(&ObjectValue) -> Result<(), ValidationError> + Send + Sync>;

/// Explicit description of a structured type.
#[derive(Clone)]
pub struct TypeDefinition {
    name: String,
    fields: Vec<FieldDeclaration>,
    validators: Vec<Validator>,
}

impl TypeDefinition {
    /// Create an empty definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// Append a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a validator.
    #[must_use]
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ObjectValue) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }

    /// Mutable access to the most recently added field.
    pub(crate) fn last_field_mut(&mut self) -> Option<&mut FieldDeclaration> {
        self.fields.last_mut()
    }

    /// Run every validator against `value`.
    pub fn validate(&self, value: &ObjectValue) -> Result<(), ValidationError> {
        for validator in &self.validators {
            validator(value).map_err(|e| e.or_schema(self.name.clone()))?;
        }
        Ok(())
    }

    /// Number of validators.
    #[must_use]
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }
}

impl fmt::Debug for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefinition")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl PartialEq for TypeDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

/// Reference to a nested schema.
///
/// Derived schemas are referenced through their definition function so that
/// self-referential types can be described without building an infinite
/// structure. Hand-built schemas are shared behind an `Arc`.
#[derive(Clone)]
pub enum SchemaRef {
    /// Schema resolved on demand from a derived type.
    Static {
        /// Schema name.
        name: &'static str,
        /// Definition function.
        definition: fn() -> TypeDefinition,
    },
    /// Already-built schema.
    Shared(Arc<TypeDefinition>),
}

impl SchemaRef {
    /// Reference a derived schema.
    #[must_use]
    pub fn of<T: Schema>() -> Self {
        Self::Static {
            name: T::schema_name(),
            definition: T::type_definition,
        }
    }

    /// Reference a hand-built schema.
    #[must_use]
    pub fn shared(definition: TypeDefinition) -> Self {
        Self::Shared(Arc::new(definition))
    }

    /// Name of the referenced schema.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Static { name, .. } => name,
            Self::Shared(def) => def.name(),
        }
    }

    /// Resolve the referenced definition.
    #[must_use]
    pub fn resolve(&self) -> Arc<TypeDefinition> {
        match self {
            Self::Static { definition, .. } => Arc::new(definition()),
            Self::Shared(def) => Arc::clone(def),
        }
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaRef").field(&self.name()).finish()
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl From<TypeDefinition> for SchemaRef {
    fn from(definition: TypeDefinition) -> Self {
        Self::shared(definition)
    }
}
