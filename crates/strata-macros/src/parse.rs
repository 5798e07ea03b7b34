//! Parsing utilities for the `Bind` derive.
//!
//! This module turns a `DeriveInput` into the list of fields the binder needs
//! to see, along with their `#[bind(...)]` attributes.

use proc_macro2::Span;
use syn::{
    punctuated::Punctuated, spanned::Spanned, Attribute, Data, DeriveInput, Expr, ExprLit,
    Fields, Generics, Ident, Lit, Meta, Token,
};

/// Parsed `#[bind(...)]` attributes of a single field.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FieldAttrs {
    /// Explicit external name (`env = "NAME"`).
    pub env: Option<String>,
    /// The field is itself a record (`nested`).
    pub nested: bool,
    /// The field is invisible to the binder (`skip`).
    pub skip: bool,
}

impl FieldAttrs {
    /// Collects all `#[bind(...)]` attributes on a field.
    pub fn from_attributes(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("bind")) {
            let meta_list =
                attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;

            for meta in meta_list {
                match meta {
                    Meta::Path(path) => {
                        let ident = path
                            .get_ident()
                            .ok_or_else(|| syn::Error::new(path.span(), "expected identifier"))?
                            .to_string();

                        match ident.as_str() {
                            "nested" => out.nested = true,
                            "skip" => out.skip = true,
                            _ => {
                                return Err(syn::Error::new(
                                    path.span(),
                                    format!("unknown bind attribute: {ident}"),
                                ))
                            }
                        }
                    }
                    Meta::NameValue(nv) => {
                        let ident = nv
                            .path
                            .get_ident()
                            .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                            .to_string();

                        let value = match &nv.value {
                            Expr::Lit(ExprLit {
                                lit: Lit::Str(s), ..
                            }) => s.value(),
                            _ => {
                                return Err(syn::Error::new(
                                    nv.value.span(),
                                    "expected string literal",
                                ))
                            }
                        };

                        match ident.as_str() {
                            "env" if value.is_empty() => {
                                return Err(syn::Error::new(
                                    nv.value.span(),
                                    "env name cannot be empty",
                                ))
                            }
                            "env" => out.env = Some(value),
                            _ => {
                                return Err(syn::Error::new(
                                    nv.path.span(),
                                    format!("unknown bind attribute: {ident}"),
                                ))
                            }
                        }
                    }
                    Meta::List(list) => {
                        return Err(syn::Error::new(
                            list.span(),
                            "expected `name = \"value\"` or a bare flag",
                        ))
                    }
                }
            }
        }

        if out.skip && (out.nested || out.env.is_some()) {
            return Err(syn::Error::new(
                Span::call_site(),
                "`skip` cannot be combined with other bind attributes",
            ));
        }

        Ok(out)
    }
}

/// A field that takes part in binding.
#[derive(Debug)]
pub struct BindField {
    /// The Rust field identifier.
    pub ident: Ident,
    /// The declared name handed to the key deriver (raw identifiers unescaped).
    pub name: String,
    /// Parsed attributes.
    pub attrs: FieldAttrs,
}

/// A struct the derive was applied to.
#[derive(Debug)]
pub struct RecordInput {
    /// The struct name.
    pub ident: Ident,
    /// Generics, re-emitted on the impl.
    pub generics: Generics,
    /// Bindable fields in declaration order; skipped fields are dropped.
    pub fields: Vec<BindField>,
}

impl RecordInput {
    /// Parses a `DeriveInput` into a `RecordInput`.
    pub fn parse(input: DeriveInput) -> syn::Result<Self> {
        let named = match input.data {
            Data::Struct(data) => match data.fields {
                Fields::Named(named) => named,
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "Bind can only be derived for structs with named fields",
                    ))
                }
            },
            Data::Enum(data) => {
                return Err(syn::Error::new(
                    data.enum_token.span,
                    "Bind can only be derived for structs",
                ))
            }
            Data::Union(data) => {
                return Err(syn::Error::new(
                    data.union_token.span,
                    "Bind can only be derived for structs",
                ))
            }
        };

        let mut fields = Vec::with_capacity(named.named.len());

        for field in named.named {
            let attrs = FieldAttrs::from_attributes(&field.attrs)?;
            if attrs.skip {
                continue;
            }

            let ident = field
                .ident
                .ok_or_else(|| syn::Error::new(Span::call_site(), "expected named field"))?;
            let name = ident.to_string().trim_start_matches("r#").to_string();

            fields.push(BindField { ident, name, attrs });
        }

        Ok(Self {
            ident: input.ident,
            generics: input.generics,
            fields,
        })
    }
}
