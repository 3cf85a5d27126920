use crate::{Result, SqlType, Value};

/// Named property access on an entity value.
///
/// This is implemented by `#[derive(Entity)]`, it can also be written by hand
/// for types that cannot use the derive. The trait is object safe so that
/// the statement writer and the session work on `&dyn Accessor`.
pub trait Accessor {
    /// Every property with its current value, in declaration order.
    fn describe(&self) -> Vec<(&'static str, Value)>;
    fn get_value(&self, property: &str) -> Option<Value>;
    /// Convert `value` into the property type and assign it.
    ///
    /// Fails with [`crate::Error::Coercion`] when the property does not exist
    /// or the value does not fit its type.
    fn set_value(&mut self, property: &str, value: Value) -> Result<()>;
    fn get_type(&self, property: &str) -> Option<SqlType>;
}

/// An accessor with static table metadata, the unit persisted by a [`crate::Session`].
pub trait Entity: Accessor + Default + 'static {
    fn schema() -> &'static EntitySchema;
}

/// Declared shape of an entity type.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    /// Relation (table) name.
    pub name: &'static str,
    pub properties: &'static [PropertyDef],
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyDef {
    pub name: &'static str,
    /// Column name override, empty when the column is named after the property.
    pub column: &'static str,
    /// Never written by INSERT or UPDATE, still populated from result rows.
    pub exclude: bool,
    /// Explicit primary key flag, used instead of the database metadata.
    pub primary_key: bool,
}

impl PropertyDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column: "",
            exclude: false,
            primary_key: false,
        }
    }

    pub fn column_name(&self) -> &'static str {
        if self.column.is_empty() {
            self.name
        } else {
            self.column
        }
    }
}
