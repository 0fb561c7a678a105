//! Schema introspection.
//!
//! Maps every declared field of a [`TypeDefinition`] onto the closed set of
//! [`FieldKind`]s. Anything outside that set fails here, before a single
//! generation request is issued.

use tracing::debug;

use structgen_core::UnsupportedFieldType;

use crate::definition::{DeclaredType, TypeDefinition};
use crate::descriptor::{FieldDescriptor, FieldKind, LiteralSet, ScalarKind};

/// Field name used in errors about the schema as a whole.
pub const SCHEMA_LEVEL_FIELD: &str = "<schema>";

/// Produce the ordered field descriptors of `definition`.
///
/// Nested schemas are not resolved here; their fields are introspected when
/// the orchestrator (or a pre-flight walk) reaches them.
pub fn introspect(definition: &TypeDefinition) -> Result<Vec<FieldDescriptor>, UnsupportedFieldType> {
    let schema = definition.name();
    if definition.fields().is_empty() {
        return Err(UnsupportedFieldType::new(
            schema,
            SCHEMA_LEVEL_FIELD,
            "schema declares no fields",
        ));
    }

    let mut descriptors: Vec<FieldDescriptor> = Vec::with_capacity(definition.fields().len());
    for field in definition.fields() {
        check_field_name(schema, &field.name)?;
        if descriptors.iter().any(|d| d.name == field.name) {
            return Err(UnsupportedFieldType::new(
                schema,
                &field.name,
                "field name is declared twice",
            ));
        }

        let kind = kind_of(schema, &field.name, &field.ty)?;
        descriptors.push(FieldDescriptor {
            name: field.name.clone(),
            kind,
            instruction: field.instruction.clone(),
        });
    }

    debug!(schema, fields = descriptors.len(), "introspected schema");
    Ok(descriptors)
}

fn check_field_name(schema: &str, name: &str) -> Result<(), UnsupportedFieldType> {
    if name.is_empty() {
        return Err(UnsupportedFieldType::new(schema, name, "field name is empty"));
    }
    if name.contains(':') || name.contains('\n') || name.contains('#') || name.trim() != name {
        return Err(UnsupportedFieldType::new(
            schema,
            name,
            "field names must not contain ':', '#', line breaks or surrounding spaces",
        ));
    }
    Ok(())
}

/// Map a declared type onto a field kind.
pub fn kind_of(schema: &str, field: &str, ty: &DeclaredType) -> Result<FieldKind, UnsupportedFieldType> {
    let unsupported = |reason: String| UnsupportedFieldType::new(schema, field, reason);

    match ty {
        DeclaredType::Text => Ok(FieldKind::Scalar(ScalarKind::Text)),
        DeclaredType::Integer => Ok(FieldKind::Scalar(ScalarKind::Integer)),
        DeclaredType::Float => Ok(FieldKind::Scalar(ScalarKind::Float)),
        DeclaredType::Boolean => Ok(FieldKind::Scalar(ScalarKind::Boolean)),
        DeclaredType::Literals(literals) => LiteralSet::new(literals.iter().cloned())
            .map(FieldKind::Enum)
            .ok_or_else(|| {
                unsupported(format!(
                    "enum literals {:?} must be non-empty and distinct",
                    literals
                ))
            }),
        DeclaredType::Object(schema_ref) => Ok(FieldKind::Composite(schema_ref.clone())),
        DeclaredType::Optional(inner) => {
            if matches!(**inner, DeclaredType::Optional(_)) {
                return Err(unsupported(
                    "nested optionals cannot be told apart once generated".to_string(),
                ));
            }
            Ok(FieldKind::Optional(Box::new(kind_of(schema, field, inner)?)))
        }
        DeclaredType::List(inner) => {
            let item = kind_of(schema, field, inner)?;
            check_element(&item, "list items").map_err(unsupported)?;
            Ok(FieldKind::List(Box::new(item)))
        }
        DeclaredType::Map(inner) => {
            let value = kind_of(schema, field, inner)?;
            check_element(&value, "map values").map_err(unsupported)?;
            Ok(FieldKind::Map(Box::new(value)))
        }
        DeclaredType::Union(members) => {
            let mut kinds = Vec::with_capacity(members.len());
            for member in members {
                match kind_of(schema, field, member)? {
                    FieldKind::Union(nested) => kinds.extend(nested),
                    kind @ (FieldKind::Scalar(_) | FieldKind::Enum(_)) => kinds.push(kind),
                    FieldKind::Optional(_) => {
                        return Err(unsupported(
                            "union members cannot be optional; make the union optional instead"
                                .to_string(),
                        ))
                    }
                    other => {
                        return Err(unsupported(format!(
                            "union members must be scalars or enums, found {}",
                            other
                        )))
                    }
                }
            }
            match kinds.len() {
                0 => Err(unsupported("union declares no members".to_string())),
                1 => Ok(kinds.remove(0)),
                _ => Ok(FieldKind::Union(kinds)),
            }
        }
        DeclaredType::Bytes => Err(unsupported(
            "raw binary payloads have no constrainable representation".to_string(),
        )),
        DeclaredType::Other(name) => Err(unsupported(format!(
            "type '{}' is not a supported field type",
            name
        ))),
    }
}

/// Collections hold inline values or objects. Objects are laid out as
/// blocks, so they cannot sit inside a collection that is itself inline.
fn check_element(kind: &FieldKind, role: &str) -> Result<(), String> {
    match kind {
        FieldKind::Composite(_) => Ok(()),
        kind if kind.is_inline() => Ok(()),
        FieldKind::Optional(_) => Err(format!("{} cannot be optional", role)),
        other => Err(format!(
            "{} must be inline values or objects, found {}",
            role, other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{FieldDeclaration, SchemaRef};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn fruit() -> DeclaredType {
        DeclaredType::literals(["pear", "banana", "apple"])
    }

    fn simple_class() -> TypeDefinition {
        TypeDefinition::new("SimpleClass")
            .with_field(FieldDeclaration::new("name", DeclaredType::Text).with_instruction("Provide a name."))
            .with_field(FieldDeclaration::new("age", DeclaredType::Integer).with_instruction("Provide an age in years."))
            .with_field(FieldDeclaration::new("favorite_fruit", DeclaredType::optional(fruit())))
    }

    #[test]
    fn test_introspect_preserves_order_and_instructions() {
        let fields = introspect(&simple_class()).unwrap();

        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "favorite_fruit"]);
        assert_eq!(fields[0].kind, FieldKind::Scalar(ScalarKind::Text));
        assert_eq!(fields[0].instruction.as_deref(), Some("Provide a name."));
        assert_eq!(fields[1].kind, FieldKind::Scalar(ScalarKind::Integer));
        assert!(fields[2].is_optional());
        assert_eq!(fields[2].instruction, None);
        assert_eq!(
            fields[2].literal_set().unwrap().as_slice(),
            &["pear".to_string(), "banana".to_string(), "apple".to_string()]
        );
    }

    #[test]
    fn test_composite_keeps_reference() {
        let address = TypeDefinition::new("Address")
            .with_field(FieldDeclaration::new("city", DeclaredType::Text));
        let person = TypeDefinition::new("Person")
            .with_field(FieldDeclaration::new("home", DeclaredType::Object(SchemaRef::shared(address))));

        let fields = introspect(&person).unwrap();
        assert_eq!(fields[0].nested_schema().map(SchemaRef::name), Some("Address"));
    }

    #[rstest]
    #[case(DeclaredType::Bytes, "binary")]
    #[case(DeclaredType::Other("Duration".into()), "Duration")]
    #[case(DeclaredType::literals(Vec::<String>::new()), "non-empty")]
    #[case(DeclaredType::literals(["a", "a"]), "distinct")]
    #[case(DeclaredType::optional(DeclaredType::optional(DeclaredType::Text)), "nested optionals")]
    #[case(DeclaredType::list(DeclaredType::optional(DeclaredType::Text)), "list items cannot be optional")]
    #[case(DeclaredType::map(DeclaredType::optional(DeclaredType::Integer)), "map values cannot be optional")]
    #[case(DeclaredType::list(DeclaredType::list(address())), "list items must be inline values or objects")]
    #[case(DeclaredType::map(DeclaredType::list(address())), "map values must be inline values or objects")]
    #[case(DeclaredType::map(DeclaredType::Bytes), "binary")]
    #[case(DeclaredType::union([DeclaredType::Integer, address()]), "union members must be scalars or enums")]
    #[case(DeclaredType::union([DeclaredType::optional(DeclaredType::Text)]), "make the union optional")]
    #[case(DeclaredType::union([]), "no members")]
    #[case(DeclaredType::optional(DeclaredType::Bytes), "binary")]
    fn test_unsupported_types(#[case] ty: DeclaredType, #[case] reason: &str) {
        let def = TypeDefinition::new("Bad").with_field(FieldDeclaration::new("field", ty));
        let err = introspect(&def).unwrap_err();
        assert_eq!(err.schema, "Bad");
        assert_eq!(err.field, "field");
        assert!(err.reason.contains(reason), "{}", err.reason);
    }

    fn address() -> DeclaredType {
        DeclaredType::Object(SchemaRef::shared(
            TypeDefinition::new("Address").with_field(FieldDeclaration::new("city", DeclaredType::Text)),
        ))
    }

    #[rstest]
    #[case(DeclaredType::list(address()), "list<Address>")]
    #[case(DeclaredType::list(DeclaredType::list(DeclaredType::Integer)), "list<list<integer>>")]
    #[case(DeclaredType::map(DeclaredType::Integer), "map<integer>")]
    #[case(DeclaredType::map(address()), "map<Address>")]
    #[case(DeclaredType::map(DeclaredType::list(DeclaredType::Text)), "map<list<text>>")]
    #[case(DeclaredType::optional(DeclaredType::list(address())), "optional<list<Address>>")]
    #[case(DeclaredType::union([DeclaredType::Integer, DeclaredType::Text]), "union<integer | text>")]
    #[case(DeclaredType::union([DeclaredType::Integer]), "integer")]
    #[case(
        DeclaredType::union([DeclaredType::Boolean, DeclaredType::union([DeclaredType::Float, fruit()])]),
        "union<boolean | float | enum[\"pear\", \"banana\", \"apple\"]>"
    )]
    fn test_supported_collections_and_unions(#[case] ty: DeclaredType, #[case] kind: &str) {
        let def = TypeDefinition::new("Good").with_field(FieldDeclaration::new("field", ty));
        let fields = introspect(&def).unwrap();
        assert_eq!(fields[0].kind.to_string(), kind);
    }

    #[test]
    fn test_list_of_literals_is_supported() {
        let def = TypeDefinition::new("Basket")
            .with_field(FieldDeclaration::new("fruits", DeclaredType::list(fruit())));
        let fields = introspect(&def).unwrap();
        assert!(matches!(&fields[0].kind, FieldKind::List(item) if matches!(**item, FieldKind::Enum(_))));
    }

    #[rstest]
    #[case("")]
    #[case("first:name")]
    #[case("line\nbreak")]
    #[case(" padded")]
    fn test_bad_field_names(#[case] name: &str) {
        let def = TypeDefinition::new("Bad").with_field(FieldDeclaration::new(name, DeclaredType::Text));
        assert!(introspect(&def).is_err());
    }

    #[test]
    fn test_duplicate_field_name() {
        let def = TypeDefinition::new("Bad")
            .with_field(FieldDeclaration::new("name", DeclaredType::Text))
            .with_field(FieldDeclaration::new("name", DeclaredType::Integer));
        let err = introspect(&def).unwrap_err();
        assert!(err.reason.contains("twice"));
    }

    #[test]
    fn test_empty_schema_is_rejected() {
        let err = introspect(&TypeDefinition::new("Empty")).unwrap_err();
        assert_eq!(err.field, SCHEMA_LEVEL_FIELD);
    }
}
