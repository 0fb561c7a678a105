//! Constraint compiler.
//!
//! Turns each [`FieldDescriptor`] into a [`FieldPlan`]: a single terminal
//! [`Constraint`], or the steps needed for a nested object or a collection.
//!
//! | kind | plan |
//! |------|------|
//! | text | quoted text pattern, capped at `text_max_tokens` |
//! | integer / float / boolean | numeric or `true\|false` pattern |
//! | enum | exclusive alternation of the literals |
//! | union | disjunction of the member constraints |
//! | optional terminal | inner constraint or the sentinel |
//! | composite | recursion, optionally behind a presence step |
//! | list / map of inline values | flow collection, `[a, b]` or `{"k": v}` |
//! | list of objects | block sequence, one `- ` item per object |
//! | map of objects | block mapping of quoted keys |

use structgen_core::{Constraint, GenerationSettings, Pattern, UnsupportedFieldType};
use structgen_schema::{introspect, FieldDescriptor, FieldKind, ScalarKind, SchemaRef, TypeDefinition};

/// Opens a flow sequence.
pub const LIST_OPEN: &str = "[";

/// Closes a flow sequence.
pub const LIST_CLOSE: &str = "]";

/// Opens a flow mapping.
pub const MAP_OPEN: &str = "{";

/// Closes a flow mapping.
pub const MAP_CLOSE: &str = "}";

/// Separates flow collection items.
pub const SEPARATOR: &str = ", ";

/// Separates a flow mapping key from its value.
pub const KEY_SEPARATOR: &str = ": ";

/// Chosen when an optional nested object or a block collection continues
/// on the next line.
pub const OBJECT_PRESENT: &str = "\n";

/// Chosen for a block collection without items.
pub const EMPTY_LIST: &str = " []";

/// Chosen for a block mapping without entries.
pub const EMPTY_MAP: &str = " {}";

/// Ends a block collection with a blank line.
pub const BLOCK_END: &str = "\n";

/// A value written on the current line.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// One runtime request.
    Terminal {
        /// Kind used to decode the fragment.
        kind: FieldKind,
        /// Constraint for the request.
        constraint: Constraint,
    },
    /// Flow sequence of inline items.
    List(Box<Inline>),
    /// Flow mapping of quoted keys to inline values.
    Map(Box<Inline>),
}

impl Inline {
    /// Constraint for the step that starts this value.
    #[must_use]
    pub fn opener(&self) -> Constraint {
        match self {
            Self::Terminal { constraint, .. } => constraint.clone(),
            Self::List(_) => Constraint::choice([LIST_OPEN]),
            Self::Map(_) => Constraint::choice([MAP_OPEN]),
        }
    }

    /// Opening literal of a collection.
    #[must_use]
    pub fn open_literal(&self) -> Option<&'static str> {
        match self {
            Self::Terminal { .. } => None,
            Self::List(_) => Some(LIST_OPEN),
            Self::Map(_) => Some(MAP_OPEN),
        }
    }
}

/// How a field is generated.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPlan {
    /// One runtime request.
    Generate(Constraint),
    /// Recurse into a nested schema, sharing the context.
    Nested {
        /// Nested schema.
        schema: SchemaRef,
        /// Choice between absence and presence, for optional fields.
        presence: Option<Constraint>,
    },
    /// Flow list or map on the label's line.
    Flow {
        /// The collection.
        value: Inline,
        /// Choice between absence and the opening literal, for optional fields.
        presence: Option<Constraint>,
    },
    /// Block sequence of objects.
    ObjectList {
        /// Schema of every item.
        schema: SchemaRef,
        /// Absence (optional fields only), empty, or the first item.
        open: Constraint,
        /// Whether the field may be absent.
        optional: bool,
    },
    /// Block mapping of quoted keys to objects.
    ObjectMap {
        /// Schema of every value.
        schema: SchemaRef,
        /// Absence (optional fields only), empty, or the first entry.
        open: Constraint,
        /// Whether the field may be absent.
        optional: bool,
    },
}

impl FieldPlan {
    /// Whether the field takes exactly one runtime request.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Generate(_))
    }

    /// Nested schema reached from this field, with the depth it sits at
    /// relative to the field and whether it must be generated.
    #[must_use]
    pub fn nested_edge(&self) -> Option<(&SchemaRef, usize, bool)> {
        match self {
            Self::Nested { schema, presence } => Some((schema, 1, presence.is_none())),
            Self::ObjectList { schema, .. } => Some((schema, 1, false)),
            Self::ObjectMap { schema, .. } => Some((schema, 2, false)),
            Self::Generate(_) | Self::Flow { .. } => None,
        }
    }
}

/// A descriptor together with its plan.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledField {
    /// Introspected field.
    pub descriptor: FieldDescriptor,
    /// How to generate it.
    pub plan: FieldPlan,
}

/// Introspect `definition` and compile every field.
pub fn compile_schema(
    definition: &TypeDefinition,
    settings: &GenerationSettings,
) -> Result<Vec<CompiledField>, UnsupportedFieldType> {
    introspect(definition)?
        .into_iter()
        .map(|descriptor| {
            let plan = compile(definition.name(), &descriptor, settings)?;
            Ok(CompiledField { descriptor, plan })
        })
        .collect()
}

/// Compile one field of `schema`.
pub fn compile(
    schema: &str,
    field: &FieldDescriptor,
    settings: &GenerationSettings,
) -> Result<FieldPlan, UnsupportedFieldType> {
    let unsupported = |reason: String| UnsupportedFieldType::new(schema, &field.name, reason);

    match &field.kind {
        FieldKind::Scalar(_) | FieldKind::Enum(_) | FieldKind::Union(_) => terminal(&field.kind, settings)
            .map(FieldPlan::Generate)
            .ok_or_else(|| unsupported(format!("{} has no terminal pattern", field.kind))),
        FieldKind::Composite(nested) => Ok(FieldPlan::Nested {
            schema: nested.clone(),
            presence: None,
        }),
        FieldKind::List(_) | FieldKind::Map(_) => {
            collection(&field.kind, settings, None).map_err(unsupported)
        }
        FieldKind::Optional(inner) => match &**inner {
            FieldKind::Scalar(_) | FieldKind::Enum(_) | FieldKind::Union(_) => {
                let constraint = terminal(inner, settings)
                    .ok_or_else(|| unsupported(format!("{} has no terminal pattern", inner)))?;
                if constraint.is_satisfied_by(&settings.sentinel) {
                    return Err(unsupported(format!(
                        "the absence sentinel {:?} is also a valid {} value",
                        settings.sentinel, inner
                    )));
                }
                Ok(FieldPlan::Generate(Constraint::either(
                    constraint,
                    settings.sentinel.clone(),
                )))
            }
            FieldKind::Composite(nested) => Ok(FieldPlan::Nested {
                schema: nested.clone(),
                presence: Some(Constraint::choice([
                    format!(" {}", settings.sentinel),
                    OBJECT_PRESENT.to_string(),
                ])),
            }),
            FieldKind::List(_) | FieldKind::Map(_) => {
                collection(inner, settings, Some(&settings.sentinel)).map_err(unsupported)
            }
            FieldKind::Optional(_) => Err(unsupported(
                "nested optionals cannot be told apart once generated".to_string(),
            )),
        },
    }
}

fn collection(
    kind: &FieldKind,
    settings: &GenerationSettings,
    sentinel: Option<&str>,
) -> Result<FieldPlan, String> {
    let block_open = |empty: &str| {
        let mut options: Vec<String> = sentinel.map(|s| format!(" {}", s)).into_iter().collect();
        options.push(empty.to_string());
        options.push(OBJECT_PRESENT.to_string());
        Constraint::choice(options)
    };

    match kind {
        FieldKind::List(item) => {
            if let FieldKind::Composite(schema) = &**item {
                return Ok(FieldPlan::ObjectList {
                    schema: schema.clone(),
                    open: block_open(EMPTY_LIST),
                    optional: sentinel.is_some(),
                });
            }
        }
        FieldKind::Map(value) => {
            if let FieldKind::Composite(schema) = &**value {
                return Ok(FieldPlan::ObjectMap {
                    schema: schema.clone(),
                    open: block_open(EMPTY_MAP),
                    optional: sentinel.is_some(),
                });
            }
        }
        _ => {}
    }

    let value = inline(kind, settings)?;
    let presence = match (sentinel, value.open_literal()) {
        (Some(sentinel), Some(open)) => Some(Constraint::choice([sentinel, open])),
        _ => None,
    };
    Ok(FieldPlan::Flow { value, presence })
}

/// Plan for a value written on one line.
pub fn inline(kind: &FieldKind, settings: &GenerationSettings) -> Result<Inline, String> {
    match kind {
        FieldKind::Scalar(_) | FieldKind::Enum(_) | FieldKind::Union(_) => terminal(kind, settings)
            .map(|constraint| Inline::Terminal {
                kind: kind.clone(),
                constraint,
            })
            .ok_or_else(|| format!("{} has no terminal pattern", kind)),
        FieldKind::List(item) => {
            let item = inline(item, settings)?;
            if let Inline::Terminal { constraint, .. } = &item {
                if constraint.is_satisfied_by(LIST_CLOSE) {
                    return Err(format!("list items must not be the literal {:?}", LIST_CLOSE));
                }
            }
            Ok(Inline::List(Box::new(item)))
        }
        FieldKind::Map(value) => Ok(Inline::Map(Box::new(inline(value, settings)?))),
        FieldKind::Composite(schema) => Err(format!(
            "{} objects cannot be nested inside a one-line collection",
            schema.name()
        )),
        FieldKind::Optional(_) => Err("collection elements cannot be optional".to_string()),
    }
}

/// Constraint for a mapping key.
#[must_use]
pub fn key_constraint(settings: &GenerationSettings) -> Constraint {
    Constraint::Pattern(Pattern::quoted_text().with_max_tokens(settings.text_max_tokens))
}

/// Terminal constraint of a scalar, enum or union kind.
#[must_use]
pub fn terminal(kind: &FieldKind, settings: &GenerationSettings) -> Option<Constraint> {
    match kind {
        FieldKind::Scalar(ScalarKind::Text) => Some(Constraint::Pattern(
            Pattern::quoted_text().with_max_tokens(settings.text_max_tokens),
        )),
        FieldKind::Scalar(ScalarKind::Integer) => Some(Constraint::Pattern(Pattern::integer())),
        FieldKind::Scalar(ScalarKind::Float) => Some(Constraint::Pattern(Pattern::float())),
        FieldKind::Scalar(ScalarKind::Boolean) => Some(Constraint::Pattern(Pattern::boolean())),
        FieldKind::Enum(literals) => Some(Constraint::choice(literals.as_slice().iter().cloned())),
        FieldKind::Union(members) => members
            .iter()
            .map(|member| terminal(member, settings))
            .collect::<Option<Vec<_>>>()
            .map(Constraint::any_of),
        FieldKind::Composite(_) | FieldKind::Optional(_) | FieldKind::List(_) | FieldKind::Map(_) => None,
    }
}
