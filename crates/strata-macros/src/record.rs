//! `Bind` derive implementation.
//!
//! The derive emits a `strata::Record` impl made of two parts: a `'static`
//! descriptor table listing the bindable fields in declaration order, and an
//! index-based accessor handing out a mutable slot for each of them.

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::parse::{BindField, RecordInput};

/// Expands `#[derive(Bind)]`.
pub fn expand_bind(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let record = RecordInput::parse(input)?;

    Ok(generate_record_impl(&record))
}

fn generate_record_impl(record: &RecordInput) -> TokenStream {
    let ident = &record.ident;
    let (impl_generics, ty_generics, where_clause) = record.generics.split_for_impl();

    let descriptors = record.fields.iter().map(generate_descriptor);
    let slots = record
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| generate_slot_arm(index, field));

    quote! {
        impl #impl_generics ::strata::Record for #ident #ty_generics #where_clause {
            fn fields(&self) -> &'static [::strata::FieldDescriptor] {
                const FIELDS: &[::strata::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            fn field_mut(&mut self, index: usize) -> ::core::option::Option<::strata::FieldSlot<'_>> {
                match index {
                    #(#slots)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    }
}

fn generate_descriptor(field: &BindField) -> TokenStream {
    let name = &field.name;
    let env = field.attrs.env.as_ref().map_or_else(
        || quote! { ::core::option::Option::None },
        |env| quote! { ::core::option::Option::Some(#env) },
    );
    let shape = if field.attrs.nested {
        quote! { ::strata::FieldShape::Record }
    } else {
        quote! { ::strata::FieldShape::Value }
    };

    quote! {
        ::strata::FieldDescriptor {
            name: #name,
            env: #env,
            shape: #shape,
        }
    }
}

fn generate_slot_arm(index: usize, field: &BindField) -> TokenStream {
    let ident = &field.ident;

    if field.attrs.nested {
        quote! {
            #index => ::core::option::Option::Some(::strata::FieldSlot::Record(&mut self.#ident)),
        }
    } else {
        quote! {
            #index => ::core::option::Option::Some(::strata::FieldSlot::Value(&mut self.#ident)),
        }
    }
}
