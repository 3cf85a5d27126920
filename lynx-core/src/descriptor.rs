use crate::{EntitySchema, PropertyDef};
use std::{any, sync::Arc};

/// Resolved metadata of an entity type, shared read-only by every session.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub relation: &'static str,
    pub type_name: &'static str,
    pub properties: &'static [PropertyDef],
    /// Columns of the properties flagged as primary key, empty when the key comes from the database.
    pub explicit_primary_key: Arc<[String]>,
}

impl EntityDescriptor {
    pub fn new<E: 'static>(schema: &'static EntitySchema) -> Self {
        let explicit_primary_key = schema
            .properties
            .iter()
            .filter(|p| p.primary_key)
            .map(|p| p.column_name().to_string())
            .collect();
        Self {
            relation: schema.name,
            type_name: any::type_name::<E>(),
            properties: schema.properties,
            explicit_primary_key,
        }
    }

    pub fn property(&self, property: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == property)
    }

    /// Column name of `property`, the property name itself when not overridden.
    pub fn column_name<'a>(&self, property: &'a str) -> &'a str {
        match self.property(property) {
            Some(def) if !def.column.is_empty() => def.column,
            _ => property,
        }
    }

    /// Property mapped to `column`, matched ignoring case.
    pub fn property_for_column(&self, column: &str) -> Option<&'static str> {
        self.properties
            .iter()
            .find(|p| p.column_name().eq_ignore_ascii_case(column))
            .or_else(|| {
                self.properties
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(column))
            })
            .map(|p| p.name)
    }

    pub fn is_excluded(&self, property: &str) -> bool {
        self.property(property).is_some_and(|p| p.exclude)
    }

    pub fn is_key_property(&self, property: &str, primary_key: &[String]) -> bool {
        let column = self.column_name(property);
        primary_key
            .iter()
            .any(|pk| pk.eq_ignore_ascii_case(column) || pk.eq_ignore_ascii_case(property))
    }
}
