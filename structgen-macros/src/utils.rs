//! Utility functions for proc macro implementations.

use syn::{Attribute, Expr, Lit, Meta};

/// Collect the doc comment lines of an item, trimmed, blank lines dropped.
pub fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| {
            if let Meta::NameValue(nv) = &a.meta {
                if let Expr::Lit(lit) = &nv.value {
                    if let Lit::Str(s) = &lit.lit {
                        return Some(s.value().trim().to_string());
                    }
                }
            }
            None
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Convert a PascalCase identifier to snake_case.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Apply a `rename_all` rule to a variant name.
pub fn rename(rule: &str, name: &str) -> Option<String> {
    match rule {
        "lowercase" => Some(name.to_lowercase()),
        "UPPERCASE" => Some(name.to_uppercase()),
        "snake_case" => Some(to_snake_case(name)),
        "kebab-case" => Some(to_snake_case(name).replace('_', "-")),
        _ => None,
    }
}
