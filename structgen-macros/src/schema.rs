//! Schema derive macro implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Path};

use crate::utils::doc_lines;

/// Implementation for `#[derive(Schema)]`
pub fn derive_schema_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "`Schema` cannot be derived for generic types",
        ));
    }

    let mut schema_name = ident.unraw().to_string();
    let mut validate: Option<Path> = None;
    for attr in &input.attrs {
        if attr.path().is_ident("schema") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    schema_name = lit.value();
                } else if meta.path.is_ident("validate") {
                    validate = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("unknown `schema` attribute on a struct"));
                }
                Ok(())
            })?;
        }
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "`Schema` requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "`Schema` can only be derived for structs",
            ))
        }
    };

    let mut declarations = Vec::with_capacity(fields.len());
    let mut constructors = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "field has no name"));
        };
        let ty = &field.ty;

        let mut name = field_ident.unraw().to_string();
        let mut instruction: Option<String> = None;
        for attr in &field.attrs {
            if attr.path().is_ident("schema") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("instruction") {
                        let lit: LitStr = meta.value()?.parse()?;
                        instruction = Some(lit.value());
                    } else if meta.path.is_ident("rename") {
                        let lit: LitStr = meta.value()?.parse()?;
                        name = lit.value();
                    } else {
                        return Err(meta.error("unknown `schema` attribute on a field"));
                    }
                    Ok(())
                })?;
            }
        }

        // Fall back to the doc comment, one instruction line per doc line
        let instruction = instruction.or_else(|| {
            let lines = doc_lines(&field.attrs);
            (!lines.is_empty()).then(|| lines.join("\n"))
        });
        let with_instruction = instruction.map(|text| quote! { .with_instruction(#text) });

        declarations.push(quote! {
            ::structgen_schema::FieldDeclaration::new(
                #name,
                <#ty as ::structgen_schema::FieldType>::declared_type(),
            )
            #with_instruction
        });
        constructors.push(quote! {
            #field_ident: values.take_as::<#ty>(#name)?
        });
    }

    let validate_fn = validate.map(|path| {
        quote! {
            fn validate(&self) -> ::std::result::Result<(), ::structgen_schema::ValidationError> {
                #path(self).map_err(|e| ::structgen_schema::ValidationError::new(e))
            }
        }
    });

    Ok(quote! {
        impl ::structgen_schema::Schema for #ident {
            fn schema_name() -> &'static str {
                #schema_name
            }

            fn type_definition() -> ::structgen_schema::TypeDefinition {
                ::structgen_schema::TypeDefinition::new(#schema_name)
                    #(.with_field(#declarations))*
            }

            #[allow(unused_mut, unused_variables)]
            fn construct(
                mut values: ::structgen_schema::ObjectValue,
            ) -> ::std::result::Result<Self, ::structgen_schema::ValidationError> {
                ::std::result::Result::Ok(Self {
                    #(#constructors,)*
                })
            }

            #validate_fn
        }

        impl ::structgen_schema::FieldType for #ident {
            fn declared_type() -> ::structgen_schema::DeclaredType {
                ::structgen_schema::DeclaredType::object::<Self>()
            }
        }

        impl ::structgen_schema::FromFieldValue for #ident {
            fn from_field_value(
                value: ::structgen_schema::FieldValue,
            ) -> ::std::result::Result<Self, ::structgen_schema::ValidationError> {
                match value {
                    ::structgen_schema::FieldValue::Object(object) => {
                        <Self as ::structgen_schema::Schema>::assemble(object)
                    }
                    other => ::std::result::Result::Err(::structgen_schema::ValidationError::new(
                        ::std::format!("expected a {} object, got {}", #schema_name, other.kind_name()),
                    )),
                }
            }
        }
    })
}
