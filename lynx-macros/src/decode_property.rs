use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Field, Ident, LitStr, Type, ext::IdentExt, parse::ParseBuffer};

pub(crate) struct PropertyMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    /// Empty when the column is named after the property.
    pub(crate) column: String,
    pub(crate) exclude: bool,
    pub(crate) primary_key: bool,
}

impl PropertyMetadata {
    /// The `PropertyDef` entry of the generated schema.
    pub(crate) fn property_def(&self) -> TokenStream {
        let Self {
            name,
            column,
            exclude,
            primary_key,
            ..
        } = self;
        quote! {
            ::lynx::PropertyDef {
                name: #name,
                column: #column,
                exclude: #exclude,
                primary_key: #primary_key,
            }
        }
    }
}

pub(crate) fn decode_property(field: &Field) -> PropertyMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let mut metadata = PropertyMetadata {
        name: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        column: String::new(),
        exclude: false,
        primary_key: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("lynx") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `lynx`, use it like: `#[lynx(attribute = value, ..)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `name`, use it like: `#[lynx(name = \"my_column\")]`"
                        );
                    };
                    metadata.column = v.value();
                } else if arg.path.is_ident("exclude") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `exclude`, use it like: `#[lynx(exclude)]`");
                    };
                    metadata.exclude = true;
                } else if arg.path.is_ident("primary_key") {
                    let Err(..) = arg.value() else {
                        panic!(
                            "Error while parsing `primary_key`, use it like: `#[lynx(primary_key)]`"
                        );
                    };
                    metadata.primary_key = true;
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
    if metadata.exclude && metadata.primary_key {
        panic!(
            "Property `{}` cannot be both excluded and part of the primary key",
            metadata.name
        );
    }
    metadata
}
