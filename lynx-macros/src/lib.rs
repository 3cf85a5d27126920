mod decode_entity;
mod decode_property;

use decode_entity::decode_entity;
use decode_property::PropertyMetadata;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Derives `Accessor` and `Entity`.
///
/// Struct attribute: `#[lynx(name = "TABLE")]`, the table defaults to the
/// snake case struct name. Field attributes: `#[lynx(name = "COLUMN")]`,
/// `#[lynx(exclude)]` and `#[lynx(primary_key)]`.
#[proc_macro_derive(Entity, attributes(lynx))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let ident = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    let entity = decode_entity(&item);
    let table = &entity.name;
    let names: Vec<_> = entity.properties.iter().map(|p| &p.name).collect();
    let fields: Vec<_> = entity.properties.iter().map(|p| &p.ident).collect();
    let types: Vec<_> = entity.properties.iter().map(|p| &p.ty).collect();
    let property_defs = entity.properties.iter().map(PropertyMetadata::property_def);
    quote! {
        impl #impl_generics ::lynx::Accessor for #ident #ty_generics #where_clause {
            fn describe(&self) -> ::std::vec::Vec<(&'static str, ::lynx::Value)> {
                ::std::vec![#((
                    #names,
                    ::lynx::AsValue::as_value(::std::clone::Clone::clone(&self.#fields)),
                )),*]
            }

            fn get_value(&self, property: &str) -> ::std::option::Option<::lynx::Value> {
                match property {
                    #(#names => ::std::option::Option::Some(
                        ::lynx::AsValue::as_value(::std::clone::Clone::clone(&self.#fields))
                    ),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set_value(&mut self, property: &str, value: ::lynx::Value) -> ::lynx::Result<()> {
                match property {
                    #(#names => {
                        self.#fields = <#types as ::lynx::AsValue>::try_from_value(value)
                            .map_err(|e| ::lynx::Error::coercion(property, ::std::format!("{:#}", e)))?;
                    })*
                    _ => {
                        return ::std::result::Result::Err(
                            ::lynx::Error::coercion(property, "No such property")
                        );
                    }
                }
                ::std::result::Result::Ok(())
            }

            fn get_type(&self, property: &str) -> ::std::option::Option<::lynx::SqlType> {
                match property {
                    #(#names => ::std::option::Option::Some(
                        <#types as ::lynx::AsValue>::as_empty_value().sql_type()
                    ),)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl #impl_generics ::lynx::Entity for #ident #ty_generics #where_clause {
            fn schema() -> &'static ::lynx::EntitySchema {
                static SCHEMA: ::lynx::EntitySchema = ::lynx::EntitySchema {
                    name: #table,
                    properties: &[#(#property_defs),*],
                };
                &SCHEMA
            }
        }
    }
    .into()
}
