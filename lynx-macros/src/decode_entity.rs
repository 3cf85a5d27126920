use crate::decode_property::{PropertyMetadata, decode_property};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{Fields, ItemStruct, LitStr, parse::ParseBuffer};

pub(crate) struct EntityMetadata {
    pub(crate) name: String,
    pub(crate) properties: Vec<PropertyMetadata>,
}

pub(crate) fn decode_entity(item: &ItemStruct) -> EntityMetadata {
    let Fields::Named(fields) = &item.fields else {
        panic!(
            "Entity can only be derived on structs with named fields, `{}` is not one",
            item.ident
        );
    };
    let properties = fields.named.iter().map(decode_property).collect();
    let mut name = item.ident.to_string().to_case(Case::Snake);
    if name.starts_with('_') {
        name.remove(0);
    }
    for attr in &item.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("lynx") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `lynx`, use it like: `#[lynx(attribute = value, ..)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `name`, use it like: `#[lynx(name = \"my_table\")]`"
                        );
                    };
                    name = value.value();
                } else {
                    panic!(
                        "Unknown attribute `{}` inside lynx macro",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
        }
    }
    EntityMetadata { name, properties }
}
