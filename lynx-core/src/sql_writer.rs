use crate::{
    Accessor, EntityDescriptor, Error, Result, SqlType, Value, Vendor,
    coercion::{
        apply_null_policy, write_float, write_literal, write_quoted, write_timestamp,
        write_timestamp_with_timezone,
    },
    separated_by,
};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Builds the CRUD statements of an entity.
///
/// Every statement is produced from the entity descriptor, the current
/// property values and the primary key columns. Identifiers are written as
/// declared, columns follow the property order of the entity. Vendors adjust
/// the literal encoding by overriding the `write_value_*` methods.
pub trait SqlWriter {
    fn vendor(&self) -> Vendor;

    fn write_value(&self, out: &mut String, sql_type: &SqlType, value: &Value) {
        match value {
            v if v.is_null() => self.write_value_none(out),
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Float32(Some(v)) => self.write_value_float(out, *v as f64),
            Value::Float64(Some(v)) => self.write_value_float(out, *v),
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v),
            Value::Timestamp(Some(v)) => {
                let mut literal = String::new();
                self.write_value_timestamp(&mut literal, v);
                out.push_str(&self.vendor().wrap_date_literal(sql_type, &literal));
            }
            Value::TimestampWithTimezone(Some(v)) => {
                let mut literal = String::new();
                self.write_value_timestamp_with_timezone(&mut literal, v);
                out.push_str(&self.vendor().wrap_date_literal(sql_type, &literal));
            }
            Value::Date(..) => {
                let mut literal = String::new();
                write_literal(&mut literal, value);
                out.push_str(&self.vendor().wrap_date_literal(sql_type, &literal));
            }
            _ => write_literal(out, value),
        }
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(self.vendor().encode_boolean(value));
    }

    fn write_value_float(&self, out: &mut String, value: f64) {
        write_float(out, value);
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        write_quoted(out, value);
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str(&self.vendor().encode_binary(value));
    }

    fn write_value_timestamp(&self, out: &mut String, value: &PrimitiveDateTime) {
        out.push('\'');
        write_timestamp(out, value, true);
        out.push('\'');
    }

    fn write_value_timestamp_with_timezone(&self, out: &mut String, value: &OffsetDateTime) {
        out.push('\'');
        write_timestamp_with_timezone(out, value);
        out.push('\'');
    }

    /// Writable properties of the entity: excluded ones removed, nulls per policy.
    fn writable_values(
        &self,
        descriptor: &EntityDescriptor,
        entity: &dyn Accessor,
        keep_nulls: bool,
    ) -> Vec<(&'static str, SqlType, Value)> {
        entity
            .describe()
            .into_iter()
            .filter(|(name, _)| !descriptor.is_excluded(name))
            .filter_map(|(name, value)| {
                let sql_type = entity
                    .get_type(name)
                    .unwrap_or_else(|| value.sql_type());
                apply_null_policy(value, keep_nulls).map(|v| (name, sql_type, v))
            })
            .collect()
    }

    fn write_insert(
        &self,
        out: &mut String,
        descriptor: &EntityDescriptor,
        entity: &dyn Accessor,
        keep_nulls: bool,
    ) {
        let values = self.writable_values(descriptor, entity, keep_nulls);
        out.push_str("INSERT INTO ");
        out.push_str(descriptor.relation);
        if values.is_empty() {
            out.push_str(" DEFAULT VALUES");
            return;
        }
        out.push_str(" (");
        separated_by(
            out,
            &values,
            |out, (name, ..)| out.push_str(descriptor.column_name(name)),
            ",",
        );
        out.push_str(") VALUES (");
        separated_by(
            out,
            &values,
            |out, (_, sql_type, value)| self.write_value(out, sql_type, value),
            ",",
        );
        out.push(')');
    }

    /// Fails when no column is left to set once the key columns are removed.
    fn write_update(
        &self,
        out: &mut String,
        descriptor: &EntityDescriptor,
        entity: &dyn Accessor,
        primary_key: &[String],
        keep_nulls: bool,
    ) -> Result<()> {
        let values: Vec<_> = self
            .writable_values(descriptor, entity, keep_nulls)
            .into_iter()
            .filter(|(name, ..)| !descriptor.is_key_property(name, primary_key))
            .collect();
        if values.is_empty() {
            return Err(Error::Validation(format!(
                "No values to update for {}",
                descriptor.relation
            )));
        }
        let mut filter = String::new();
        self.write_filter(&mut filter, descriptor, entity, primary_key)?;
        out.push_str("UPDATE ");
        out.push_str(descriptor.relation);
        out.push_str(" SET ");
        separated_by(
            out,
            &values,
            |out, (name, sql_type, value)| {
                out.push_str(descriptor.column_name(name));
                out.push_str(" = ");
                self.write_value(out, sql_type, value);
            },
            ", ",
        );
        out.push_str(" WHERE ");
        out.push_str(&filter);
        Ok(())
    }

    fn write_select(
        &self,
        out: &mut String,
        descriptor: &EntityDescriptor,
        entity: &dyn Accessor,
        primary_key: &[String],
    ) -> Result<()> {
        let mut filter = String::new();
        self.write_filter(&mut filter, descriptor, entity, primary_key)?;
        out.push_str("SELECT * FROM ");
        out.push_str(descriptor.relation);
        out.push_str(" WHERE ");
        out.push_str(&filter);
        Ok(())
    }

    /// Selects the first key column of the row identified by the entity.
    fn write_exists(
        &self,
        out: &mut String,
        descriptor: &EntityDescriptor,
        entity: &dyn Accessor,
        primary_key: &[String],
    ) -> Result<()> {
        let mut filter = String::new();
        self.write_filter(&mut filter, descriptor, entity, primary_key)?;
        out.push_str("SELECT ");
        out.push_str(&primary_key[0]);
        out.push_str(" FROM ");
        out.push_str(descriptor.relation);
        out.push_str(" WHERE ");
        out.push_str(&filter);
        Ok(())
    }

    fn write_delete(
        &self,
        out: &mut String,
        descriptor: &EntityDescriptor,
        entity: &dyn Accessor,
        primary_key: &[String],
    ) -> Result<()> {
        let mut filter = String::new();
        self.write_filter(&mut filter, descriptor, entity, primary_key)?;
        out.push_str("DELETE FROM ");
        out.push_str(descriptor.relation);
        out.push_str(" WHERE ");
        out.push_str(&filter);
        Ok(())
    }

    /// `<column> = <literal>` for every key column, joined by `AND`.
    ///
    /// Every key column must map to a property holding a value.
    fn write_filter(
        &self,
        out: &mut String,
        descriptor: &EntityDescriptor,
        entity: &dyn Accessor,
        primary_key: &[String],
    ) -> Result<()> {
        if primary_key.is_empty() {
            return Err(Error::Validation(format!(
                "No primary key to identify a row of {}",
                descriptor.relation
            )));
        }
        let mut key_values = Vec::with_capacity(primary_key.len());
        for column in primary_key {
            let property = descriptor
                .property_for_column(column)
                .unwrap_or(column.as_str());
            let value = entity.get_value(property).unwrap_or_default();
            if value.is_null() {
                return Err(Error::Validation(format!(
                    "Primary key {} of {} has no value",
                    column, descriptor.relation
                )));
            }
            let sql_type = entity
                .get_type(property)
                .unwrap_or_else(|| value.sql_type());
            key_values.push((column, sql_type, value));
        }
        separated_by(
            out,
            key_values,
            |out, (column, sql_type, value)| {
                out.push_str(column);
                out.push_str(" = ");
                self.write_value(out, &sql_type, &value);
            },
            " AND ",
        );
        Ok(())
    }
}

/// Writer for the engines without dedicated quirks.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericSqlWriter {
    vendor: Vendor,
}

impl GenericSqlWriter {
    pub fn new(vendor: Vendor) -> Self {
        Self { vendor }
    }
}

impl SqlWriter for GenericSqlWriter {
    fn vendor(&self) -> Vendor {
        self.vendor
    }
}

/// `to_date` cannot read fractional seconds nor offsets.
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleSqlWriter;

impl SqlWriter for OracleSqlWriter {
    fn vendor(&self) -> Vendor {
        Vendor::Oracle
    }

    fn write_value_timestamp(&self, out: &mut String, value: &PrimitiveDateTime) {
        out.push('\'');
        write_timestamp(out, value, false);
        out.push('\'');
    }

    /// Written in UTC.
    fn write_value_timestamp_with_timezone(&self, out: &mut String, value: &OffsetDateTime) {
        let value = value.to_offset(UtcOffset::UTC);
        self.write_value_timestamp(out, &PrimitiveDateTime::new(value.date(), value.time()));
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlSqlWriter;

impl SqlWriter for MssqlSqlWriter {
    fn vendor(&self) -> Vendor {
        Vendor::Mssql
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        if !value.is_ascii() {
            out.push('N');
        }
        write_quoted(out, value);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresSqlWriter;

impl SqlWriter for PostgresSqlWriter {
    fn vendor(&self) -> Vendor {
        Vendor::Postgres
    }

    fn write_value_float(&self, out: &mut String, value: f64) {
        write_float(out, value);
        if !value.is_finite() {
            out.push_str("::FLOAT8");
        }
    }
}
