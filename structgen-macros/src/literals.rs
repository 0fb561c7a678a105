//! Literals derive macro implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

use crate::utils::rename;

/// Implementation for `#[derive(Literals)]`
pub fn derive_literals_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "`Literals` can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "`Literals` requires at least one variant",
        ));
    }

    let mut rename_all: Option<String> = None;
    for attr in &input.attrs {
        if attr.path().is_ident("literals") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    let lit: LitStr = meta.value()?.parse()?;
                    if rename(&lit.value(), "").is_none() {
                        return Err(syn::Error::new_spanned(
                            &lit,
                            "expected one of `lowercase`, `UPPERCASE`, `snake_case`, `kebab-case`",
                        ));
                    }
                    rename_all = Some(lit.value());
                } else {
                    return Err(meta.error("unknown `literals` attribute"));
                }
                Ok(())
            })?;
        }
    }

    let mut variants = Vec::with_capacity(data.variants.len());
    let mut literals: Vec<String> = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "`Literals` variants cannot carry data",
            ));
        }

        let variant_name = variant.ident.unraw().to_string();
        let mut literal = match &rename_all {
            Some(rule) => rename(rule, &variant_name).unwrap_or(variant_name),
            None => variant_name,
        };
        for attr in &variant.attrs {
            if attr.path().is_ident("literal") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        let lit: LitStr = meta.value()?.parse()?;
                        literal = lit.value();
                    } else {
                        return Err(meta.error("unknown `literal` attribute"));
                    }
                    Ok(())
                })?;
            }
        }

        if literal.is_empty() {
            return Err(syn::Error::new_spanned(variant, "literal must not be empty"));
        }
        if literals.contains(&literal) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("literal {:?} is used by more than one variant", literal),
            ));
        }
        literals.push(literal);
        variants.push(&variant.ident);
    }

    Ok(quote! {
        impl ::structgen_schema::Literals for #ident {
            const LITERALS: &'static [&'static str] = &[#(#literals),*];

            fn as_literal(&self) -> &'static str {
                match self {
                    #(Self::#variants => #literals,)*
                }
            }

            fn from_literal(literal: &str) -> ::std::option::Option<Self> {
                match literal {
                    #(#literals => ::std::option::Option::Some(Self::#variants),)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl ::structgen_schema::FieldType for #ident {
            fn declared_type() -> ::structgen_schema::DeclaredType {
                ::structgen_schema::DeclaredType::literals(
                    <Self as ::structgen_schema::Literals>::LITERALS.iter().copied(),
                )
            }
        }

        impl ::structgen_schema::FromFieldValue for #ident {
            fn from_field_value(
                value: ::structgen_schema::FieldValue,
            ) -> ::std::result::Result<Self, ::structgen_schema::ValidationError> {
                match value {
                    ::structgen_schema::FieldValue::Literal(text)
                    | ::structgen_schema::FieldValue::Text(text) => {
                        <Self as ::structgen_schema::Literals>::from_literal(&text).ok_or_else(|| {
                            ::structgen_schema::ValidationError::new(::std::format!(
                                "{:?} is not one of {:?}",
                                text,
                                <Self as ::structgen_schema::Literals>::LITERALS,
                            ))
                        })
                    }
                    other => ::std::result::Result::Err(::structgen_schema::ValidationError::new(
                        ::std::format!("expected a literal, got {}", other.kind_name()),
                    )),
                }
            }
        }
    })
}
