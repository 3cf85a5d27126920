use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value moved between entities, statements and result rows.
///
/// Every variant carries its type even when the payload is absent, so
/// `Value::Int32(None)` is a null integer while `Value::Null` is a null of
/// unknown type.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Char(Option<char>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Char(l), Self::Char(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// True for `Value::Null` and for every typed variant without a payload.
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Boolean(None)
                | Value::Int8(None)
                | Value::Int16(None)
                | Value::Int32(None)
                | Value::Int64(None)
                | Value::UInt8(None)
                | Value::UInt16(None)
                | Value::UInt32(None)
                | Value::UInt64(None)
                | Value::Float32(None)
                | Value::Float64(None)
                | Value::Decimal(None)
                | Value::Char(None)
                | Value::Varchar(None)
                | Value::Blob(None)
                | Value::Date(None)
                | Value::Time(None)
                | Value::Timestamp(None)
                | Value::TimestampWithTimezone(None)
                | Value::Uuid(None)
        )
    }

    /// Numbers are written unquoted, every other value is quoted.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int8(..)
                | Value::Int16(..)
                | Value::Int32(..)
                | Value::Int64(..)
                | Value::UInt8(..)
                | Value::UInt16(..)
                | Value::UInt32(..)
                | Value::UInt64(..)
                | Value::Float32(..)
                | Value::Float64(..)
                | Value::Decimal(..)
        )
    }

    /// Integer payload, if this value holds one.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::Int8(Some(v)) => *v as _,
            Value::Int16(Some(v)) => *v as _,
            Value::Int32(Some(v)) => *v as _,
            Value::Int64(Some(v)) => *v as _,
            Value::UInt8(Some(v)) => *v as _,
            Value::UInt16(Some(v)) => *v as _,
            Value::UInt32(Some(v)) => *v as _,
            Value::UInt64(Some(v)) => *v as _,
            _ => return None,
        })
    }

    pub fn sql_type(&self) -> SqlType {
        SqlType::of(self)
    }
}

/// Column type classification shared by the writer and the result decoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    Binary,
    Character,
    Timestamp,
    Date,
    Time,
    Integer,
    BigInt,
    Decimal,
    Float,
    Boolean,
    Uuid,
    Other(String),
}

impl SqlType {
    /// Classify a declared column type name (`VARCHAR(30)`, `DECIMAL(10,2)`, `INT`, ..).
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        let base = upper
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        match base {
            "BLOB" | "BINARY" | "VARBINARY" | "LONGVARBINARY" | "BYTEA" | "IMAGE" | "RAW"
            | "LONGBLOB" | "MEDIUMBLOB" | "TINYBLOB" => SqlType::Binary,
            "VARCHAR" | "CHAR" | "CHARACTER" | "NCHAR" | "NVARCHAR" | "VARCHAR2"
            | "NVARCHAR2" | "CLOB" | "NCLOB" | "TEXT" | "LONGVARCHAR" | "LONGNVARCHAR"
            | "STRING" | "NTEXT" => SqlType::Character,
            "TIMESTAMP" | "DATETIME" | "DATETIME2" | "SMALLDATETIME" | "TIMESTAMPTZ" => {
                SqlType::Timestamp
            }
            "DATE" => SqlType::Date,
            "TIME" | "TIMETZ" => SqlType::Time,
            "INT" | "INTEGER" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT2" | "INT4" => {
                SqlType::Integer
            }
            "BIGINT" | "INT8" => SqlType::BigInt,
            "NUMERIC" | "DECIMAL" | "NUMBER" | "MONEY" => SqlType::Decimal,
            "FLOAT" | "DOUBLE" | "REAL" | "FLOAT4" | "FLOAT8" => SqlType::Float,
            "BIT" | "BOOLEAN" | "BOOL" => SqlType::Boolean,
            "UUID" | "UNIQUEIDENTIFIER" => SqlType::Uuid,
            _ => SqlType::Other(upper),
        }
    }

    /// Classification of a host value, the same table read in the other direction.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => SqlType::Other("NULL".into()),
            Value::Boolean(..) => SqlType::Boolean,
            Value::Int8(..)
            | Value::Int16(..)
            | Value::Int32(..)
            | Value::UInt8(..)
            | Value::UInt16(..) => SqlType::Integer,
            Value::Int64(..) | Value::UInt32(..) | Value::UInt64(..) => SqlType::BigInt,
            Value::Float32(..) | Value::Float64(..) => SqlType::Float,
            Value::Decimal(..) => SqlType::Decimal,
            Value::Char(..) | Value::Varchar(..) => SqlType::Character,
            Value::Blob(..) => SqlType::Binary,
            Value::Date(..) => SqlType::Date,
            Value::Time(..) => SqlType::Time,
            Value::Timestamp(..) | Value::TimestampWithTimezone(..) => SqlType::Timestamp,
            Value::Uuid(..) => SqlType::Uuid,
        }
    }
}

impl Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Binary => f.write_str("BLOB"),
            SqlType::Character => f.write_str("VARCHAR"),
            SqlType::Timestamp => f.write_str("TIMESTAMP"),
            SqlType::Date => f.write_str("DATE"),
            SqlType::Time => f.write_str("TIME"),
            SqlType::Integer => f.write_str("INTEGER"),
            SqlType::BigInt => f.write_str("BIGINT"),
            SqlType::Decimal => f.write_str("DECIMAL"),
            SqlType::Float => f.write_str("DOUBLE"),
            SqlType::Boolean => f.write_str("BOOLEAN"),
            SqlType::Uuid => f.write_str("UUID"),
            SqlType::Other(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SqlType, Value};

    #[test]
    fn declared_types() {
        assert_eq!(SqlType::from_declared("varchar(30)"), SqlType::Character);
        assert_eq!(SqlType::from_declared("CLOB"), SqlType::Character);
        assert_eq!(SqlType::from_declared("DECIMAL(10,2)"), SqlType::Decimal);
        assert_eq!(SqlType::from_declared("INT"), SqlType::Integer);
        assert_eq!(SqlType::from_declared("BIGINT"), SqlType::BigInt);
        assert_eq!(SqlType::from_declared("TIMESTAMP"), SqlType::Timestamp);
        assert_eq!(SqlType::from_declared("DATE"), SqlType::Date);
        assert_eq!(SqlType::from_declared("BLOB"), SqlType::Binary);
        assert_eq!(SqlType::from_declared("double precision"), SqlType::Float);
        assert_eq!(SqlType::from_declared("BIT"), SqlType::Boolean);
        assert_eq!(
            SqlType::from_declared("geometry"),
            SqlType::Other("GEOMETRY".into())
        );
    }

    #[test]
    fn nulls_keep_their_type() {
        assert!(Value::Int32(None).is_null());
        assert!(Value::Null.is_null());
        assert!(!Value::Varchar(Some("".into())).is_null());
        assert_eq!(Value::Int32(None).sql_type(), SqlType::Integer);
        assert!(Value::Decimal(None).is_numeric());
        assert!(!Value::Boolean(Some(true)).is_numeric());
        assert_ne!(Value::Int32(Some(1)), Value::Int64(Some(1)));
        assert_eq!(Value::Int64(None), Value::Int64(None));
    }
}
