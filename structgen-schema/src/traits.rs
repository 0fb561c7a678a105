//! Traits connecting Rust types to type definitions.
//!
//! - [`Schema`]: a struct with a [`TypeDefinition`] and a constructor
//! - [`FieldType`]: any type that can appear as a field
//! - [`Literals`]: a unit-only enum backed by a literal set
//!
//! All three are normally derived with `#[derive(Schema)]` and
//! `#[derive(Literals)]` from `structgen-macros`.

use std::collections::HashMap;
use std::hash::BuildHasher;

use indexmap::IndexMap;
use structgen_core::{FromFieldValue, ObjectValue, ValidationError};

use crate::definition::{DeclaredType, TypeDefinition};

/// A structured type that can be generated field by field.
pub trait Schema: Sized {
    /// Unique schema name.
    fn schema_name() -> &'static str;

    /// Explicit type definition.
    fn type_definition() -> TypeDefinition;

    /// Build an instance from decoded field values.
    fn construct(values: ObjectValue) -> Result<Self, ValidationError>;

    /// Cross-field validation run after construction.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Construct and validate in one step.
    fn assemble(values: ObjectValue) -> Result<Self, ValidationError> {
        let instance = Self::construct(values)?;
        instance
            .validate()
            .map_err(|e| e.or_schema(Self::schema_name()))?;
        Ok(instance)
    }
}

/// A type that can be declared as a field.
pub trait FieldType: FromFieldValue {
    /// The declared type for introspection.
    fn declared_type() -> DeclaredType;
}

/// A unit-only enum whose variants map onto literals.
pub trait Literals: Sized {
    /// Literals in variant order.
    const LITERALS: &'static [&'static str];

    /// Literal for this variant.
    fn as_literal(&self) -> &'static str;

    /// Variant for a literal, matched exactly.
    fn from_literal(literal: &str) -> Option<Self>;
}

impl FieldType for String {
    fn declared_type() -> DeclaredType {
        DeclaredType::Text
    }
}

impl FieldType for bool {
    fn declared_type() -> DeclaredType {
        DeclaredType::Boolean
    }
}

macro_rules! impl_field_type {
    ($declared:expr => $($ty:ty),*) => {
        $(
            impl FieldType for $ty {
                fn declared_type() -> DeclaredType {
                    $declared
                }
            }
        )*
    };
}

impl_field_type!(DeclaredType::Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_field_type!(DeclaredType::Float => f32, f64);

impl<T: FieldType> FieldType for Option<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::optional(T::declared_type())
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::list(T::declared_type())
    }
}

impl<T: FieldType, S: BuildHasher + Default> FieldType for HashMap<String, T, S> {
    fn declared_type() -> DeclaredType {
        DeclaredType::map(T::declared_type())
    }
}

impl<T: FieldType, S: BuildHasher + Default> FieldType for IndexMap<String, T, S> {
    fn declared_type() -> DeclaredType {
        DeclaredType::map(T::declared_type())
    }
}

impl<T: FieldType> FieldType for Box<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type()
    }
}

impl FieldType for bytes::Bytes {
    fn declared_type() -> DeclaredType {
        DeclaredType::Bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use structgen_core::FieldValue;

    #[test]
    fn test_primitive_declared_types() {
        assert_eq!(String::declared_type(), DeclaredType::Text);
        assert_eq!(u32::declared_type(), DeclaredType::Integer);
        assert_eq!(f64::declared_type(), DeclaredType::Float);
        assert_eq!(bool::declared_type(), DeclaredType::Boolean);
        assert_eq!(
            Option::<Vec<i64>>::declared_type(),
            DeclaredType::optional(DeclaredType::list(DeclaredType::Integer))
        );
        assert_eq!(bytes::Bytes::declared_type(), DeclaredType::Bytes);
        assert_eq!(
            HashMap::<String, Vec<f64>>::declared_type(),
            DeclaredType::map(DeclaredType::list(DeclaredType::Float))
        );
        assert_eq!(
            IndexMap::<String, bool>::declared_type(),
            DeclaredType::map(DeclaredType::Boolean)
        );
    }

    struct Point {
        x: i64,
        y: i64,
    }

    impl Schema for Point {
        fn schema_name() -> &'static str {
            "Point"
        }

        fn type_definition() -> TypeDefinition {
            TypeDefinition::new("Point")
        }

        fn construct(mut values: ObjectValue) -> Result<Self, ValidationError> {
            Ok(Self {
                x: values.take_as("x")?,
                y: values.take_as("y")?,
            })
        }

        fn validate(&self) -> Result<(), ValidationError> {
            if self.x == self.y {
                return Err(ValidationError::new("x and y must differ"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_assemble_runs_validation() {
        let ok = ObjectValue::new("Point")
            .with_field("x", FieldValue::Integer(1))
            .with_field("y", FieldValue::Integer(2));
        let point = Point::assemble(ok).unwrap();
        assert_eq!((point.x, point.y), (1, 2));

        let bad = ObjectValue::new("Point")
            .with_field("x", FieldValue::Integer(3))
            .with_field("y", FieldValue::Integer(3));
        let err = Point::assemble(bad).err().unwrap();
        assert_eq!(err.schema.as_deref(), Some("Point"));
        assert_eq!(err.message, "x and y must differ");
    }
}
