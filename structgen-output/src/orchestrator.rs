//! Generation orchestrator.
//!
//! Drives a [`GenerationRuntime`] through the fields of a schema in
//! declaration order. Each field appends its prompt fragment to the
//! context, issues one or more constrained requests, and decodes what the
//! runtime produced. Nested objects continue the same context at the next
//! indentation level. Lists and maps of inline values are written in flow
//! style on the label's line; lists and maps of objects are written as YAML
//! block collections ending with a blank line.
//!
//! Every nested schema reachable within the depth limit is compiled before
//! the first request, so unsupported fields and runaway nesting fail without
//! touching the runtime.

use std::collections::HashSet;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, debug_span, info, Instrument};

use indexmap::IndexMap;
use structgen_core::{Constraint, Context, DecodeError, FieldValue, GenerationSettings, ObjectValue};
use structgen_models::GenerationRuntime;
use structgen_schema::{Schema, SchemaRef, TypeDefinition};

use crate::assemble::{assemble, assemble_value};
use crate::compile::{
    compile_schema, key_constraint, CompiledField, FieldPlan, Inline, BLOCK_END, EMPTY_LIST, EMPTY_MAP,
    KEY_SEPARATOR, LIST_CLOSE, MAP_CLOSE, OBJECT_PRESENT, SEPARATOR,
};
use crate::decode::{decode, decode_key, decode_kind};
use crate::error::{GenerationError, GenerationResult};
use crate::prompt::{field_prompt, item_field_prompt, FENCE_CLOSE, FENCE_OPEN};

/// Generates schema instances with a runtime.
///
/// # Example
///
/// ```rust
/// use structgen_core::Context;
/// use structgen_models::ScriptedRuntime;
/// use structgen_output::Generator;
/// use structgen_schema::SchemaBuilder;
///
/// # tokio_test::block_on(async {
/// let schema = SchemaBuilder::new("Person").text("name").integer("age").build();
/// let runtime = ScriptedRuntime::new("test").with_responses(["\"Jack\"", "30"]);
///
/// let (ctx, person) = Generator::new(runtime)
///     .generate_value(Context::from_prompt("Jack is 30."), &schema)
///     .await
///     .unwrap();
/// assert_eq!(person.get("age").and_then(|v| v.as_i64()), Some(30));
/// assert!(ctx.text().ends_with("name: \"Jack\"\nage: 30\n```"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Generator<R> {
    runtime: R,
    settings: GenerationSettings,
}

impl<R: GenerationRuntime> Generator<R> {
    /// Create a generator with default settings.
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            settings: GenerationSettings::default(),
        }
    }

    /// Set generation settings.
    #[must_use]
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Get the runtime.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Get the settings.
    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Generate a typed instance of `T`.
    pub async fn generate_object<T: Schema>(&self, context: Context) -> GenerationResult<(Context, T)> {
        let definition = T::type_definition();
        let (context, values) = self.generate_value(context, &definition).await?;
        let instance = assemble::<T>(values)?;
        Ok((context, instance))
    }

    /// Generate the field values of a caller-built schema.
    pub async fn generate_value(
        &self,
        context: Context,
        definition: &TypeDefinition,
    ) -> GenerationResult<(Context, ObjectValue)> {
        self.settings.validate()?;
        let fields = self.preflight(definition)?;
        info!(
            schema = definition.name(),
            runtime = %self.runtime.identifier(),
            fields = fields.len(),
            "generating object"
        );

        let context = if self.settings.fence {
            context.with_prompt(FENCE_OPEN)
        } else {
            context
        };
        let (conte    /// Compile the top-level schema and every schema reachable from it.
    fn preflight(&self, definition: &TypeDefinition) -> GenerationResult<Vec<CompiledField>> {
        let fields = compile_schema(definition, &self.settings)?;
        let mut visited = HashSet::from([(definition.name().to_string(), 0)]);
        self.check_nested(&fields, 0, &mut visited)?;
        Ok(fields)
    }

    /// Walk nested schemas, once per schema and depth.
    ///
    /// A required object past `max_depth` is an error. Anything else past
    /// the limit is closed without a request at run time, so it is skipped.
    fn check_nested(
        &self,
        fields: &[CompiledField],
        depth: usize,
        visited: &mut HashSet<(String, usize)>,
    ) -> GenerationResult<()> {
        for field in fields {
            let Some((schema, offset, required)) = field.plan.nested_edge() else {
                continue;
            };
            let child_depth = depth + offset;

            if child_depth > self.settings.max_depth {
                if required {
                    return Err(GenerationError::nesting_too_deep(
                        schema.name(),
                        child_depth,
                        self.settings.max_depth,
                    ));
                }
                continue;
            }
            if !visited.insert((schema.name().to_string(), child_depth)) {
                continue;
            }

            let definition = schema.resolve();
            let nested = compile_schema(&definition, &self.settings)?;
            self.check_nested(&nested, child_depth, visited)?;
        }
        Ok(())
    }

    /// Generate every field of `definition` at `depth`.
    ///
    /// With `after_marker` the first label follows a sequence item marker
    /// instead of starting its own line.
    fn generate_fields<'a>(
        &'a self,
        context: Context,
        definition: &'a TypeDefinition,
        fields: Vec<CompiledField>,
        depth: usize,
        after_marker: bool,
    ) -> BoxFuture<'a, GenerationResult<(Context, ObjectValue)>> {
        async move {
            let mut context = context;
            let mut values = ObjectValue::new(definition.name());

            for (index, field) in fields.into_iter().enumerate() {
                let prompt = if after_marker && index == 0 {
                    item_field_prompt(&field, &self.settings, depth)
                } else {
                    field_prompt(&field, &self.settings, depth)
                };
                context = context.with_prompt(prompt);
                let (next, value) = self.generate_field(context, &field, depth).await?;
                debug!(
                    schema = definition.name(),
                    field = %field.descriptor.name,
                    depth,
                    value = value.kind_name(),
                    "generated field"
                );
                context = next;
                values.insert(field.descriptor.name.clone(), value);
            }

            let values = assemble_value(definition, values)?;
            Ok((context, values))
        }
        .boxed()
    }

    async fn generate_field(
        &self,
        context: Context,
        field: &CompiledField,
        depth: usize,
    ) -> GenerationResult<(Context, FieldValue)> {
        match &field.plan {
            FieldPlan::Generate(constraint) => {
                let (context, raw) = self.step(context, field, constraint).await?;
                let value = decode(&field.descriptor, &raw, &self.settings)?;
                Ok((context.with_prompt("\n"), value))
            }
            FieldPlan::Nested { schema, presence } => {
                let child_depth = depth + 1;
                let mut context = context;
                if let Some(presence) = presence {
                    if child_depth > self.settings.max_depth {
                        debug!(field = %field.descriptor.name, depth, "depth limit reached, closing optional object");
                        let closed = format!(" {}\n", self.settings.sentinel);
                        return Ok((context.with_prompt(closed), FieldValue::Absent));
                    }
                    let (next, choice) = self.step(context, field, presence).await?;
                    if choice != OBJECT_PRESENT {
                        return Ok((next.with_prompt("\n"), FieldValue::Absent));
                    }
                    context = next;
                } else if child_depth > self.settings.max_depth {
                    return Err(GenerationError::nesting_too_deep(
                        schema.name(),
                        child_depth,
                        self.settings.max_depth,
                    ));
                }

                let definition = schema.resolve();
                let fields = compile_schema(&definition, &self.settings)?;
                let span = debug_span!("nested", schema = definition.name(), depth = child_depth);
                let (context, values) = self
                    .generate_fields(context, &definition, fields, child_depth, false)
                    .instrument(span)
                    .await?;
                Ok((context, FieldValue::Object(values)))
            }
            FieldPlan::Flow { value, presence } => {
                let (context, opened) = match presence {
                    Some(presence) => {
                        let (context, choice) = self.step(context, field, presence).await?;
                        if choice == self.settings.sentinel {
                            return Ok((context.with_prompt("\n"), FieldValue::Absent));
                        }
                        (context, true)
                    }
                    None => (context, false),
                };
                let (context, value) = self.generate_inline(context, field, value, opened).await?;
                Ok((context.with_prompt("\n"), value))
            }
            FieldPlan::ObjectList { schema, open, optional } => {
                self.generate_object_list(context, field, schema, open, *optional, depth)
                    .await
            }
            FieldPlan::ObjectMap { schema, open, optional } => {
                self.generate_object_map(context, field, schema, open, *optional, depth)
                    .await
            }
        }
    }

    /// Generate a value on the current line. With `opened` the opening
    /// bracket of a collection is already in the context.
    fn generate_inline<'a>(
        &'a self,
        context: Context,
        field: &'a CompiledField,
        value: &'a Inline,
        opened: bool,
    ) -> BoxFuture<'a, GenerationResult<(Context, FieldValue)>> {
        async move {
            let context = match value.open_literal() {
                Some(open) if !opened => context.with_prompt(open),
                _ => context,
            };
            match value {
                Inline::Terminal { kind, constraint } => {
                    let (context, raw) = self.step(context, field, constraint).await?;
                    let value = decode_kind(&field.descriptor.name, kind, &raw, &self.settings)?;
                    Ok((context, value))
                }
                Inline::List(item) => self.generate_flow_list(context, field, item).await,
                Inline::Map(item) => self.generate_flow_map(context, field, item).await,
            }
        }
        .boxed()
    }

    /// Items of a flow list, up to and including `]`.
    async fn generate_flow_list(
        &self,
        context: Context,
        field: &CompiledField,
        item: &Inline,
    ) -> GenerationResult<(Context, FieldValue)> {
        let cap = self.settings.max_list_items;
        let mut items = Vec::new();

        if cap == Some(0) {
            return Ok((context.with_prompt(LIST_CLOSE), FieldValue::List(items)));
        }
        let first = Constraint::either(item.opener(), LIST_CLOSE);
        let (context, raw) = self.step(context, field, &first).await?;
        if raw == LIST_CLOSE {
            return Ok((context, FieldValue::List(items)));
        }
        let (mut context, value) = self.continue_inline(context, field, item, &raw).await?;
        items.push(value);

        let next = Constraint::choice([SEPARATOR, LIST_CLOSE]);
        loop {
            if cap.is_some_and(|cap| items.len() >= cap) {
                debug!(field = %field.descriptor.name, items = items.len(), "item cap reached");
                return Ok((context.with_prompt(LIST_CLOSE), FieldValue::List(items)));
            }
            let (after_separator, separator) = self.step(context, field, &next).await?;
            if separator == LIST_CLOSE {
                return Ok((after_separator, FieldValue::List(items)));
            }
            let (after_item, value) = self
                .generate_inline(after_separator, field, item, false)
                .await?;
            items.push(value);
            context = after_item;
        }
    }

    /// Entries of a flow map, up to and including `}`.
    async fn generate_flow_map(
        &self,
        context: Context,
        field: &CompiledField,
        value: &Inline,
    ) -> GenerationResult<(Context, FieldValue)> {
        let name = &field.descriptor.name;
        let cap = self.settings.max_list_items;
        let key = key_constraint(&self.settings);
        let mut entries = IndexMap::new();

        if cap == Some(0) {
            return Ok((context.with_prompt(MAP_CLOSE), FieldValue::Map(entries)));
        }
        let (mut context, mut raw) = self
            .step(context, field, &Constraint::either(key.clone(), MAP_CLOSE))
            .await?;
        if raw == MAP_CLOSE {
            return Ok((context, FieldValue::Map(entries)));
        }

        let next = Constraint::choice([SEPARATOR, MAP_CLOSE]);
        loop {
            let entry_key = self.fresh_key(name, &raw, &entries)?;
            let (after_value, entry) = self
                .generate_inline(context.with_prompt(KEY_SEPARATOR), field, value, false)
                .await?;
            entries.insert(entry_key, entry);

            if cap.is_some_and(|cap| entries.len() >= cap) {
                debug!(field = %name, entries = entries.len(), "item cap reached");
                return Ok((after_value.with_prompt(MAP_CLOSE), FieldValue::Map(entries)));
            }
            let (after_separator, separator) = self.step(after_value, field, &next).await?;
            if separator == MAP_CLOSE {
                return Ok((after_separator, FieldValue::Map(entries)));
            }
            (context, raw) = self.step(after_separator, field, &key).await?;
        }
    }

    /// Finish an inline value whose first step already produced `raw`.
    async fn continue_inline(
        &self,
        context: Context,
        field: &CompiledField,
        item: &Inline,
        raw: &str,
    ) -> GenerationResult<(Context, FieldValue)> {
        match item {
            Inline::Terminal { kind, .. } => {
                let value = decode_kind(&field.descriptor.name, kind, raw, &self.settings)?;
                Ok((context, value))
            }
            Inline::List(_) | Inline::Map(_) => self.generate_inline(context, field, item, true).await,
        }
    }

    fn fresh_key(
        &self,
        field: &str,
        raw: &str,
        entries: &IndexMap<String, FieldValue>,
    ) -> Result<String, DecodeError> {
        let key = decode_key(field, raw)?;
        if entries.contains_key(&key) {
            return Err(DecodeError::new(field, raw, "a key not used before in this map"));
        }
        Ok(key)
    }

    /// Block sequence of objects, one `- ` item each.
    async fn generate_object_list(
        &self,
        context: Context,
        field: &CompiledField,
        schema: &SchemaRef,
        open: &Constraint,
        optional: bool,
        depth: usize,
    ) -> GenerationResult<(Context, FieldValue)> {
        let item_depth = depth + 1;
        let cap = self.settings.max_list_items;
        if item_depth > self.settings.max_depth || cap == Some(0) {
            debug!(field = %field.descriptor.name, depth, "closing object list without items");
            return Ok(self.close_block(context, optional, EMPTY_LIST, FieldValue::List(Vec::new())));
        }

        let (context, choice) = self.step(context, field, open).await?;
        if choice == EMPTY_LIST {
            return Ok((context.with_prompt("\n"), FieldValue::List(Vec::new())));
        }
        if choice != OBJECT_PRESENT {
            return Ok((context.with_prompt("\n"), FieldValue::Absent));
        }

        let definition = schema.resolve();
        let fields = compile_schema(&definition, &self.settings)?;
        let marker = self.settings.item_marker(depth);
        let next = Constraint::choice([marker.clone(), BLOCK_END.to_string()]);
        let mut context = context.with_prompt(marker);
        let mut items = Vec::new();

        loop {
            let span = debug_span!("item", schema = definition.name(), index = items.len());
            let (after_item, values) = self
                .generate_fields(context, &definition, fields.clone(), item_depth, true)
                .instrument(span)
                .await?;
            items.push(FieldValue::Object(values));

            if cap.is_some_and(|cap| items.len() >= cap) {
                debug!(field = %field.descriptor.name, items = items.len(), "item cap reached");
                return Ok((after_item.with_prompt(BLOCK_END), FieldValue::List(items)));
            }
            let (after_choice, choice) = self.step(after_item, field, &next).await?;
            if choice == BLOCK_END {
                return Ok((after_choice, FieldValue::List(items)));
            }
            context = after_choice;
        }
    }

    /// Block mapping of quoted keys to objects.
    async fn generate_object_map(
        &self,
        context: Context,
        field: &CompiledField,
        schema: &SchemaRef,
        open: &Constraint,
        optional: bool,
        depth: usize,
    ) -> GenerationResult<(Context, FieldValue)> {
        let name = &field.descriptor.name;
        let value_depth = depth + 2;
        let cap = self.settings.max_list_items;
        if value_depth > self.settings.max_depth || cap == Some(0) {
            debug!(field = %name, depth, "closing object map without entries");
            return Ok(self.close_block(context, optional, EMPTY_MAP, FieldValue::Map(IndexMap::new())));
        }

        let (context, choice) = self.step(context, field, open).await?;
        if choice == EMPTY_MAP {
            return Ok((context.with_prompt("\n"), FieldValue::Map(IndexMap::new())));
        }
        if choice != OBJECT_PRESENT {
            return Ok((context.with_prompt("\n"), FieldValue::Absent));
        }

        let definition = schema.resolve();
        let fields = compile_schema(&definition, &self.settings)?;
        let key_indentation = self.settings.indentation(depth + 1);
        let key = key_constraint(&self.settings);
        let next = Constraint::choice([key_indentation.clone(), BLOCK_END.to_string()]);
        let mut context = context.with_prompt(key_indentation);
        let mut entries = IndexMap::new();

        loop {
            let (after_key, raw) = self.step(context, field, &key).await?;
            let entry_key = self.fresh_key(name, &raw, &entries)?;
            let span = debug_span!("entry", schema = definition.name(), key = %entry_key);
            let (after_value, values) = self
                .generate_fields(after_key.with_prompt(":\n"), &definition, fields.clone(), value_depth, false)
                .instrument(span)
                .await?;
            entries.insert(entry_key, FieldValue::Object(values));

            if cap.is_some_and(|cap| entries.len() >= cap) {
                debug!(field = %name, entries = entries.len(), "item cap reached");
                return Ok((after_value.with_prompt(BLOCK_END), FieldValue::Map(entries)));
            }
            let (after_choice, choice) = self.step(after_value, field, &next).await?;
            if choice == BLOCK_END {
                return Ok((after_choice, FieldValue::Map(entries)));
            }
            context = after_choice;
        }
    }

    /// Close a block collection that may not hold any items.
    fn close_block(&self, context: Context, optional: bool, empty: &str, value: FieldValue) -> (Context, FieldValue) {
        if optional {
            (context.with_prompt(format!(" {}\n", self.settings.sentinel)), FieldValue::Absent)
        } else {
            (context.with_prompt(format!("{}\n", empty)), value)
        }
    }

    async fn step(
        &self,
        context: Context,
        field: &CompiledField,
        constraint: &Constraint,
    ) -> GenerationResult<(Context, String)> {
        let (context, raw) = self.runtime.request(context, constraint).await?;
        debug!(field = %field.descriptor.name, constraint = %constraint, raw = %raw, "runtime step");
        Ok((context, raw))
    }
}

context: Context,
        field: &CompiledField,
        constraint: &Constraint,
    ) -> GenerationResult<(Context, String)> {
        let (context, raw) = self.runtime.request(context, constraint).await?;
        debug!(field = %field.descriptor.name, constraint = %constraint, raw = %raw, "runtime step");
        Ok((context, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use structgen_core::ValidationError;
    use structgen_models::{FunctionRuntime, RuntimeError, ScriptedRuntime};
    use structgen_schema::{DeclaredType, SchemaBuilder, SchemaRef};

    fn fruit() -> DeclaredType {
        DeclaredType::literals(["pear", "banana", "apple"])
    }

    fn simple_class() -> TypeDefinition {
        SchemaBuilder::new("SimpleClass")
            .text("name")
            .integer("age")
            .optional("favorite_fruit", fruit())
            .build()
    }

    fn unfenced() -> GenerationSettings {
        GenerationSettings::default().fence(false)
    }

    #[tokio::test]
    async fn test_fields_in_declaration_order() {
        let runtime = ScriptedRuntime::new("test").with_responses(["\"Jack\"", "30", "apple"]);
        let generator = Generator::new(runtime.clone());

        let (ctx, values) = generator
            .generate_value(Context::from_prompt("Jack is a 30 year old dude that loves apples."), &simple_class())
            .await
            .unwrap();

        assert_eq!(values.get("name"), Some(&FieldValue::Text("Jack".into())));
        assert_eq!(values.get("age"), Some(&FieldValue::Integer(30)));
        assert_eq!(values.get("favorite_fruit"), Some(&FieldValue::Literal("apple".into())));
        assert_eq!(
            ctx.text(),
            "Jack is a 30 year old dude that loves apples.\n```yaml\nname: \"Jack\"\nage: 30\nfavorite_fruit: apple\n```"
        );

        let requests = runtime.recorded_requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].context.ends_with("name: "));
        assert!(requests[1].context.ends_with("name: \"Jack\"\nage: "));
        assert!(requests[2].context.ends_with("age: 30\nfavorite_fruit: "));
        assert_eq!(
            requests[2].constraint,
            Constraint::either(Constraint::choice(["pear", "banana", "apple"]), "null")
        );
    }

    #[tokio::test]
    async fn test_instructions_precede_labels() {
        let schema = SchemaBuilder::new("Person")
            .text("name")
            .instruction("Provide a name.")
            .build();
        let runtime = ScriptedRuntime::new("test").with_response("\"Jack\"");
        let (ctx, _) = Generator::new(runtime)
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();
        assert_eq!(ctx.text(), "# Provide a name.\nname: \"Jack\"\n");
    }

    #[tokio::test]
    async fn test_nested_objects_take_one_request_per_leaf() {
        let address = SchemaBuilder::new("Address").text("city").integer("zip").build_ref();
        let schema = SchemaBuilder::new("Person")
            .text("name")
            .object("home", address)
            .boolean("active")
            .build();
        let runtime = ScriptedRuntime::new("test").with_responses(["\"Jack\"", "\"Berlin\"", "10115", "true"]);

        let (ctx, values) = Generator::new(runtime.clone())
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(runtime.request_count(), 4);
        assert_eq!(
            ctx.text(),
            "name: \"Jack\"\nhome:\n  city: \"Berlin\"\n  zip: 10115\nactive: true\n"
        );
        let home = values.get("home").and_then(FieldValue::as_object).unwrap();
        assert_eq!(home.schema(), "Address");
        assert_eq!(home.get("zip"), Some(&FieldValue::Integer(10115)));
    }

    #[tokio::test]
    async fn test_optional_object_presence_step() {
        let address = SchemaBuilder::new("Address").text("city").build_ref();
        let schema = SchemaBuilder::new("Person")
            .optional("work", DeclaredType::Object(address.clone()))
            .optional("home", DeclaredType::Object(address))
            .build();
        let runtime = ScriptedRuntime::new("test").with_responses([" null", "\n", "\"Berlin\""]);

        let (ctx, values) = Generator::new(runtime)
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(values.get("work"), Some(&FieldValue::Absent));
        assert!(values.get("home").and_then(FieldValue::as_object).is_some());
        assert_eq!(ctx.text(), "work: null\nhome:\n  city: \"Berlin\"\n");
    }

    #[tokio::test]
    async fn test_lists() {
        let schema = SchemaBuilder::new("Basket")
            .list("fruits", fruit())
            .list("counts", DeclaredType::Integer)
            .optional("notes", DeclaredType::list(DeclaredType::Text))
            .build();
        let runtime = ScriptedRuntime::new("test")
            .with_responses(["apple", ", ", "pear", "]", "]", "null"]);

        let (ctx, values) = Generator::new(runtime)
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(
            values.get("fruits"),
            Some(&FieldValue::List(vec![
                FieldValue::Literal("apple".into()),
                FieldValue::Literal("pear".into()),
            ]))
        );
        assert_eq!(values.get("counts"), Some(&FieldValue::List(vec![])));
        assert_eq!(values.get("notes"), Some(&FieldValue::Absent));
        assert_eq!(ctx.text(), "fruits: [apple, pear]\ncounts: []\nnotes: null\n");
    }

    #[tokio::test]
    async fn test_list_item_cap_closes_list() {
        let schema = SchemaBuilder::new("Basket").list("counts", DeclaredType::Integer).build();
        let runtime = ScriptedRuntime::new("test").with_responses(["1", ", ", "2"]);

        let (ctx, values) = Generator::new(runtime.clone())
            .with_settings(unfenced().max_list_items(2))
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(runtime.remaining(), 0);
        assert_eq!(ctx.text(), "counts: [1, 2]\n");
        assert_eq!(
            values.get("counts"),
            Some(&FieldValue::List(vec![FieldValue::Integer(1), FieldValue::Integer(2)]))
        );
    }

    fn story() -> SchemaRef {
        SchemaBuilder::new("Story")
            .text("summary")
            .list("events", DeclaredType::Text)
            .build_ref()
    }

    #[tokio::test]
    async fn test_object_list_is_block_sequence() {
        let schema = SchemaBuilder::new("Person")
            .text("name")
            .list("backstories", DeclaredType::Object(story()))
            .build();
        let runtime = ScriptedRuntime::new("test").with_responses([
            "\"Jack\"",
            "\n",
            "\"Met Jill\"",
            "\"hill\"",
            "]",
            "- ",
            "\"Fell\"",
            "]",
            "\n",
        ]);

        let (ctx, values) = Generator::new(runtime.clone())
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(runtime.remaining(), 0);
        assert_eq!(
            ctx.text(),
            "name: \"Jack\"\nbackstories:\n- summary: \"Met Jill\"\n  events: [\"hill\"]\n- summary: \"Fell\"\n  events: []\n\n"
        );
        let stories = values.get("backstories").and_then(FieldValue::as_list).unwrap();
        assert_eq!(stories.len(), 2);
        let first = stories[0].as_object().unwrap();
        assert_eq!(first.schema(), "Story");
        assert_eq!(first.get("summary"), Some(&FieldValue::Text("Met Jill".into())));
        assert_eq!(
            first.get("events"),
            Some(&FieldValue::List(vec![FieldValue::Text("hill".into())]))
        );

        let requests = runtime.recorded_requests();
        assert_eq!(requests[1].constraint, Constraint::choice([" []", "\n"]));
        assert_eq!(requests[5].constraint, Constraint::choice(["- ", "\n"]));
    }

    #[tokio::test]
    async fn test_object_list_items_are_capped() {
        let schema = SchemaBuilder::new("Person")
            .list("backstories", DeclaredType::Object(story()))
            .build();
        let runtime = ScriptedRuntime::new("test").with_responses(["\n", "\"Met Jill\"", "]"]);

        let (ctx, values) = Generator::new(runtime.clone())
            .with_settings(unfenced().max_list_items(1))
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(runtime.remaining(), 0);
        assert_eq!(ctx.text(), "backstories:\n- summary: \"Met Jill\"\n  events: []\n\n");
        assert_eq!(values.get("backstories").and_then(FieldValue::as_list).map(<[_]>::len), Some(1));
    }

    #[tokio::test]
    async fn test_empty_and_absent_object_collections() {
        let address = SchemaBuilder::new("Address").text("city").build_ref();
        let schema = SchemaBuilder::new("Person")
            .optional("past", DeclaredType::list(DeclaredType::Object(address.clone())))
            .list("homes", DeclaredType::Object(address.clone()))
            .map("owners", DeclaredType::Object(address))
            .build();
        let runtime = ScriptedRuntime::new("test").with_responses([" null", " []", " {}"]);

        let (ctx, values) = Generator::new(runtime)
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(ctx.text(), "past: null\nhomes: []\nowners: {}\n");
        assert_eq!(values.get("past"), Some(&FieldValue::Absent));
        assert_eq!(values.get("homes"), Some(&FieldValue::List(vec![])));
        assert_eq!(values.get("owners").and_then(FieldValue::as_map).map(|m| m.len()), Some(0));
    }

    #[tokio::test]
    async fn test_object_list_closed_at_depth_limit() {
        let inner = SchemaBuilder::new("Inner")
            .list("stories", DeclaredType::Object(story()))
            .build_ref();
        let schema = SchemaBuilder::new("Outer").object("inner", inner).build();
        let runtime = ScriptedRuntime::new("test");

        let (ctx, values) = Generator::new(runtime.clone())
            .with_settings(unfenced().max_depth(1))
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(runtime.request_count(), 0);
        assert_eq!(ctx.text(), "inner:\n  stories: []\n");
        let inner = values.get("inner").and_then(FieldValue::as_object).unwrap();
        assert_eq!(inner.get("stories"), Some(&FieldValue::List(vec![])));
    }

    #[tokio::test]
    async fn test_nested_flow_lists() {
        let schema = SchemaBuilder::new("Grid")
            .list("rows", DeclaredType::list(DeclaredType::Integer))
            .build();
        let runtime = ScriptedRuntime::new("test")
            .with_responses(["[", "1", ", ", "2", "]", ", ", "]", "]"]);

        let (ctx, values) = Generator::new(runtime.clone())
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(runtime.remaining(), 0);
        assert_eq!(ctx.text(), "rows: [[1, 2], []]\n");
        assert_eq!(
            values.get("rows"),
            Some(&FieldValue::List(vec![
                FieldValue::List(vec![FieldValue::Integer(1), FieldValue::Integer(2)]),
                FieldValue::List(vec![]),
            ]))
        );
    }

    #[tokio::test]
    async fn test_flow_map() {
        let schema = SchemaBuilder::new("Tally").map("counts", DeclaredType::Integer).build();
        let runtime = ScriptedRuntime::new("test")
            .with_responses(["\"a\"", "1", ", ", "\"b\"", "2", "}"]);

        let (ctx, values) = Generator::new(runtime)
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(ctx.text(), "counts: {\"a\": 1, \"b\": 2}\n");
        let counts = values.get("counts").and_then(FieldValue::as_map).unwrap();
        let entries: Vec<_> = counts.iter().map(|(k, v)| (k.as_str(), v.as_i64())).collect();
        assert_eq!(entries, vec![("a", Some(1)), ("b", Some(2))]);
    }

    #[tokio::test]
    async fn test_duplicate_map_key_is_decode_error() {
        let schema = SchemaBuilder::new("Tally").map("counts", DeclaredType::Integer).build();
        let runtime = ScriptedRuntime::new("test")
            .with_responses(["\"a\"", "1", ", ", "\"a\""]);

        let err = Generator::new(runtime)
            .generate_value(Context::new(), &schema)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Decode(ref e) if e.field == "counts" && e.fragment == "\"a\""));
    }

    #[tokio::test]
    async fn test_object_map_is_block_mapping() {
        let address = SchemaBuilder::new("Address").text("city").build_ref();
        let schema = SchemaBuilder::new("Registry").map("homes", DeclaredType::Object(address)).build();
        let runtime = ScriptedRuntime::new("test").with_responses([
            "\n",
            "\"jack\"",
            "\"Berlin\"",
            "  ",
            "\"jill\"",
            "\"Paris\"",
            "\n",
        ]);

        let (ctx, values) = Generator::new(runtime)
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(
            ctx.text(),
            "homes:\n  \"jack\":\n    city: \"Berlin\"\n  \"jill\":\n    city: \"Paris\"\n\n"
        );
        let homes = values.get("homes").and_then(FieldValue::as_map).unwrap();
        let jill = homes.get("jill").and_then(FieldValue::as_object).unwrap();
        assert_eq!(jill.get("city"), Some(&FieldValue::Text("Paris".into())));
    }

    #[tokio::test]
    async fn test_union_decodes_matching_member() {
        let schema = SchemaBuilder::new("Ticket")
            .union("id", [DeclaredType::Integer, DeclaredType::Text])
            .union("code", [DeclaredType::Integer, DeclaredType::Text])
            .build();
        let runtime = ScriptedRuntime::new("test").with_responses(["7", "\"A-7\""]);

        let (ctx, values) = Generator::new(runtime)
            .with_settings(unfenced())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(ctx.text(), "id: 7\ncode: \"A-7\"\n");
        assert_eq!(values.get("id"), Some(&FieldValue::Integer(7)));
        assert_eq!(values.get("code"), Some(&FieldValue::Text("A-7".into())));
    }

    #[rstest]
    #[case("app")]
    #[case("apple")]
    #[case("pear")]
    #[tokio::test]
    async fn test_function_runtime_picks_each_literal(#[case] literal: &'static str) {
        let schema = SchemaBuilder::new("Pick")
            .text("name")
            .field("fruit", DeclaredType::literals(["app", "apple", "pear"]))
            .build();
        let runtime = FunctionRuntime::new(move |_ctx, constraint| {
            Ok(match constraint.options() {
                Some(_) => literal.to_string(),
                None => "\"Jack\"".to_string(),
            })
        });

        let (_, values) = Generator::new(runtime.clone())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap();

        assert_eq!(values.get("fruit"), Some(&FieldValue::Literal(literal.to_string())));
        let contexts: Vec<String> = runtime
            .recorded_requests()
            .into_iter()
            .map(|request| request.context)
            .collect();
        assert_eq!(contexts, vec!["\n```yaml\nname: ", "\n```yaml\nname: \"Jack\"\nfruit: "]);
    }

    fn y_leaf() -> TypeDefinition {
        SchemaBuilder::new("Y").integer("value").build()
    }

    fn x() -> TypeDefinition {
        SchemaBuilder::new("X")
            .object("y", SchemaRef::Static { name: "Y", definition: y_leaf })
            .build()
    }

    #[tokio::test]
    async fn test_preflight_revisits_schema_at_greater_depth() {
        let x_ref = SchemaRef::Static { name: "X", definition: x };
        let q = SchemaBuilder::new("Q").optional("x", DeclaredType::Object(x_ref.clone())).build_ref();
        let p = SchemaBuilder::new("P").object("q", q).build_ref();
        let root = SchemaBuilder::new("Root")
            .optional("x", DeclaredType::Object(x_ref))
            .object("p", p)
            .build();
        let runtime = ScriptedRuntime::new("test");

        let err = Generator::new(runtime.clone())
            .with_settings(GenerationSettings::default().max_depth(3))
            .generate_value(Context::new(), &root)
            .await
            .unwrap_err();

        assert!(
            matches!(err, GenerationError::NestingTooDeep { ref schema, depth: 4, max_depth: 3 } if schema == "Y"),
            "{err:?}"
        );
        assert_eq!(runtime.request_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_nested_field_fails_before_any_request() {
        let upload = SchemaBuilder::new("Upload")
            .field("payload", DeclaredType::Bytes)
            .build_ref();
        let schema = SchemaBuilder::new("Message").text("subject").object("attachment", upload).build();
        let runtime = ScriptedRuntime::new("test").with_response("\"Hello\"");

        let err = Generator::new(runtime.clone())
            .generate_value(Context::new(), &schema)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::UnsupportedFieldType(ref e) if e.field == "payload"));
        assert_eq!(runtime.request_count(), 0);
    }

    fn node() -> TypeDefinition {
        SchemaBuilder::new("Node")
            .integer("value")
            .object("child", SchemaRef::Static { name: "Node", definition: node })
            .build()
    }

    fn list_node() -> TypeDefinition {
        SchemaBuilder::new("ListNode")
            .integer("value")
            .optional(
                "next",
                DeclaredType::Object(SchemaRef::Static { name: "ListNode", definition: list_node }),
            )
            .build()
    }

    #[tokio::test]
    async fn test_required_cycle_is_nesting_too_deep() {
        let runtime = ScriptedRuntime::new("test");
        let err = Generator::new(runtime.clone())
            .generate_value(Context::new(), &node())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::NestingTooDeep { ref schema, depth: 9, max_depth: 8 } if schema == "Node"));
        assert_eq!(runtime.request_count(), 0);
    }

    #[tokio::test]
    async fn test_optional_cycle_is_closed_at_depth_limit() {
        let runtime = FunctionRuntime::new(|_ctx, constraint| {
            Ok(match constraint.options() {
                Some(_) => OBJECT_PRESENT.to_string(),
                None => "1".to_string(),
            })
        });

        let (ctx, values) = Generator::new(runtime.clone())
            .with_settings(unfenced().max_depth(2))
            .generate_value(Context::new(), &list_node())
            .await
            .unwrap();

        // value, presence, value, presence, value; the third `next` is closed.
        assert_eq!(runtime.request_count(), 5);
        assert_eq!(
            ctx.text(),
            "value: 1\nnext:\n  value: 1\n  next:\n    value: 1\n    next: null\n"
        );
        let depth2 = values
            .get("next")
            .and_then(FieldValue::as_object)
            .and_then(|o| o.get("next"))
            .and_then(FieldValue::as_object)
            .unwrap();
        assert_eq!(depth2.get("next"), Some(&FieldValue::Absent));
    }

    #[tokio::test]
    async fn test_validator_rejection_is_verbatim() {
        let schema = SchemaBuilder::new("Person")
            .integer("age")
            .validator(|obj| match obj.get("age").and_then(FieldValue::as_i64) {
                Some(age) if age > 0 => Ok(()),
                _ => Err(ValidationError::new("age must exceed zero")),
            })
            .build();
        let runtime = ScriptedRuntime::new("test").with_response("0");

        let err = Generator::new(runtime)
            .generate_value(Context::new(), &schema)
            .await
            .unwrap_err();
        match err {
            GenerationError::Validation(e) => assert_eq!(e.message, "age must exceed zero"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_runtime_failure_propagates() {
        let runtime = ScriptedRuntime::new("test").with_response("\"Jack\"");
        let err = Generator::new(runtime)
            .generate_value(Context::new(), &simple_class())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Runtime(RuntimeError::Exhausted(2))));
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        let runtime = ScriptedRuntime::new("test");
        let err = Generator::new(runtime)
            .with_settings(GenerationSettings::default().sentinel(""))
            .generate_value(Context::new(), &simple_class())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }
}
