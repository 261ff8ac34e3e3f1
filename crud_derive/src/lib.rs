//! Procedural macros for crudhaus entities and type lineage
//!
//! Generated code refers to `::crudhaus::...` paths.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod parsing;

use parsing::{parse_entity, parse_lineage};

/// Derive `store_object::Entity`
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
/// #[entity(table = "customers")]
/// pub struct Customer {
///     #[key]
///     pub id: i64,
///     pub name: String,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity, key))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let info = match parse_entity(&input) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let table = &info.table;
    let key_field = &info.key_field;
    let key_name = key_field.to_string();

    let expanded = quote! {
        impl #impl_generics ::crudhaus::store_object::Entity for #name #ty_generics #where_clause {
            fn table_name() -> &'static str {
                #table
            }

            fn primary_key_field() -> &'static str {
                #key_name
            }

            fn key_value(&self) -> ::crudhaus::store_object::KeyValue {
                ::crudhaus::store_object::HasKeyValue::key_value(&self.#key_field)
            }
        }
    };

    TokenStream::from(expanded)
}

/// Derive `hook_system::Lineage` from a flat ancestor list
///
/// Each entry is either a type `Self` coerces to (typically `dyn Trait`), or
/// `Type => field` for a base struct embedded in a field. List ancestors from
/// most general to most specific.
///
/// ```rust,ignore
/// #[derive(Lineage)]
/// #[lineage(dyn Auditable, BaseRequest => base)]
/// pub struct CreateUser {
///     base: BaseRequest,
///     name: String,
/// }
/// ```
#[proc_macro_derive(Lineage, attributes(lineage))]
pub fn derive_lineage(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let ancestors = match parse_lineage(&input.attrs) {
        Ok(ancestors) => ancestors,
        Err(e) => return e.to_compile_error().into(),
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let visits = ancestors.iter().map(|ancestor| {
        let ty = &ancestor.ty;
        match &ancestor.field {
            Some(field) => quote! {
                visitor.visit::<#ty>(|d| &d.#field, |d| &mut d.#field);
            },
            None => quote! {
                visitor.visit::<#ty>(|d| d, |d| d);
            },
        }
    });

    let expanded = quote! {
        impl #impl_generics ::crudhaus::hook_system::Lineage for #name #ty_generics #where_clause {
            fn ancestors<__V: ::crudhaus::hook_system::LineageVisitor<Self>>(visitor: &mut __V) {
                #(#visits)*
            }
        }
    };

    TokenStream::from(expanded)
}
