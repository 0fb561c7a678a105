//! Field descriptors.
//!
//! The closed set of field kinds the constraint compiler understands. A
//! [`FieldDescriptor`] is produced by [`introspect`](crate::introspect) and
//! is the only input the compiler and the decoder look at.

use std::fmt;

use crate::definition::SchemaRef;

/// Scalar kinds with a textual pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Quoted free text.
    Text,
    /// Signed integer.
    Integer,
    /// Signed decimal.
    Float,
    /// `true` / `false`.
    Boolean,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        })
    }
}

/// Non-empty, duplicate-free, ordered set of literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralSet(Vec<String>);

impl LiteralSet {
    /// Build a literal set, returning `None` when it would be empty or
    /// contain a duplicate or empty literal.
    pub fn new<I, S>(literals: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let literals: Vec<String> = literals.into_iter().map(Into::into).collect();
        if literals.is_empty() || literals.iter().any(String::is_empty) {
            return None;
        }
        for (i, literal) in literals.iter().enumerate() {
            if literals[..i].contains(literal) {
                return None;
            }
        }
        Some(Self(literals))
    }

    /// Literals in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether `text` is exactly one of the literals.
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.0.iter().any(|literal| literal == text)
    }

    /// Number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Kind of a field after introspection.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Scalar with a textual pattern.
    Scalar(ScalarKind),
    /// One of a fixed set of literals.
    Enum(LiteralSet),
    /// Nested schema generated recursively.
    Composite(SchemaRef),
    /// Value or absence marker.
    Optional(Box<FieldKind>),
    /// Sequence of inline values or of objects.
    List(Box<FieldKind>),
    /// Text keys mapped to inline values or to objects.
    Map(Box<FieldKind>),
    /// Exactly one of several scalar or enum members.
    Union(Vec<FieldKind>),
}

impl FieldKind {
    /// Kind with any optional wrapper removed.
    #[must_use]
    pub fn required(&self) -> &FieldKind {
        match self {
            Self::Optional(inner) => inner,
            other => other,
        }
    }

    /// Whether values of this kind are produced by one runtime request.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.required(), Self::Scalar(_) | Self::Enum(_) | Self::Union(_))
    }

    /// Whether values of this kind fit on one line: terminals, and lists or
    /// maps of inline values.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        match self {
            Self::Scalar(_) | Self::Enum(_) | Self::Union(_) => true,
            Self::List(item) | Self::Map(item) => item.is_inline(),
            Self::Composite(_) | Self::Optional(_) => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{}", kind),
            Self::Enum(literals) => write!(f, "enum{:?}", literals.as_slice()),
            Self::Composite(schema) => write!(f, "{}", schema.name()),
            Self::Optional(inner) => write!(f, "optional<{}>", inner),
            Self::List(inner) => write!(f, "list<{}>", inner),
            Self::Map(value) => write!(f, "map<{}>", value),
            Self::Union(members) => {
                write!(f, "union<")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Introspected field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Instruction shown above the field.
    pub instruction: Option<String>,
}

impl FieldDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            instruction: None,
        }
    }

    /// Attach an instruction.
    #[must_use]
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Whether the field may be absent.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self.kind, FieldKind::Optional(_))
    }

    /// Literal set of an enum (or optional enum) field.
    #[must_use]
    pub fn literal_set(&self) -> Option<&LiteralSet> {
        match self.kind.required() {
            FieldKind::Enum(literals) => Some(literals),
            _ => None,
        }
    }

    /// Nested schema of a composite (or optional composite) field.
    #[must_use]
    pub fn nested_schema(&self) -> Option<&SchemaRef> {
        match self.kind.required() {
            FieldKind::Composite(schema) => Some(schema),
            _ => None,
        }
    }
}
