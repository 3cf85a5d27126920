use crate::{AsValue, SqlType, Value, Vendor};
use anyhow::Result;
use rust_decimal::Decimal;
use std::fmt::Write;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Append the SQL literal of `value`: numbers unquoted, nulls as `NULL`,
/// everything else single quoted with embedded quotes doubled.
///
/// This is the vendor neutral text. Statement writers route booleans,
/// binaries and temporal values through the [`Vendor`] quirks first.
pub fn write_literal(out: &mut String, value: &Value) {
    if value.is_null() {
        out.push_str("NULL");
        return;
    }
    match value {
        Value::Int8(Some(v)) => write_integer!(out, *v),
        Value::Int16(Some(v)) => write_integer!(out, *v),
        Value::Int32(Some(v)) => write_integer!(out, *v),
        Value::Int64(Some(v)) => write_integer!(out, *v),
        Value::UInt8(Some(v)) => write_integer!(out, *v),
        Value::UInt16(Some(v)) => write_integer!(out, *v),
        Value::UInt32(Some(v)) => write_integer!(out, *v),
        Value::UInt64(Some(v)) => write_integer!(out, *v),
        Value::Float32(Some(v)) => write_float(out, *v as f64),
        Value::Float64(Some(v)) => write_float(out, *v),
        Value::Decimal(Some(v)) => drop(write!(out, "{}", v)),
        Value::Boolean(Some(v)) => write_quoted(out, ["false", "true"][*v as usize]),
        Value::Char(Some(v)) => {
            let mut buffer = [0u8; 4];
            write_quoted(out, v.encode_utf8(&mut buffer));
        }
        Value::Varchar(Some(v)) => write_quoted(out, v),
        Value::Blob(Some(v)) => out.push_str(&Vendor::Generic.encode_binary(v)),
        Value::Date(Some(v)) => {
            out.push('\'');
            write_date(out, v);
            out.push('\'');
        }
        Value::Time(Some(v)) => {
            out.push('\'');
            write_time(out, v, true);
            out.push('\'');
        }
        Value::Timestamp(Some(v)) => {
            out.push('\'');
            write_timestamp(out, v, true);
            out.push('\'');
        }
        Value::TimestampWithTimezone(Some(v)) => {
            out.push('\'');
            write_timestamp_with_timezone(out, v);
            out.push('\'');
        }
        Value::Uuid(Some(v)) => drop(write!(out, "'{}'", v)),
        _ => out.push_str("NULL"),
    }
}

/// Single quoted, `'` doubled.
pub fn write_quoted(out: &mut String, value: &str) {
    out.push('\'');
    let mut position = 0;
    for (i, c) in value.char_indices() {
        if c == '\'' {
            out.push_str(&value[position..i]);
            out.push_str("''");
            position = i + 1;
        }
    }
    out.push_str(&value[position..]);
    out.push('\'');
}

pub fn write_float(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("'NaN'");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 {
            "'Infinity'"
        } else {
            "'-Infinity'"
        });
    } else {
        let mut buffer = ryu::Buffer::new();
        out.push_str(buffer.format_finite(value));
    }
}

pub fn write_date(out: &mut String, value: &Date) {
    let _ = write!(
        out,
        "{:04}-{:02}-{:02}",
        value.year(),
        value.month() as u8,
        value.day()
    );
}

/// `hh:mm:ss`, followed by the shortest fraction when `subsecond` is set and the time has one.
pub fn write_time(out: &mut String, value: &Time, subsecond: bool) {
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}",
        value.hour(),
        value.minute(),
        value.second(),
    );
    let mut fraction = value.nanosecond();
    if subsecond && fraction != 0 {
        let mut width = 9;
        while fraction % 10 == 0 {
            fraction /= 10;
            width -= 1;
        }
        let _ = write!(out, ".{:0width$}", fraction);
    }
}

pub fn write_timestamp(out: &mut String, value: &PrimitiveDateTime, subsecond: bool) {
    write_date(out, &value.date());
    out.push(' ');
    write_time(out, &value.time(), subsecond);
}

pub fn write_timestamp_with_timezone(out: &mut String, value: &OffsetDateTime) {
    write_date(out, &value.date());
    out.push(' ');
    write_time(out, &value.time(), true);
    let offset = value.offset();
    let _ = write!(
        out,
        "{}{:02}:{:02}",
        if offset.is_negative() { '-' } else { '+' },
        offset.whole_hours().unsigned_abs(),
        offset.minutes_past_hour().unsigned_abs()
    );
}

/// Normalize a value read from a result column of type `sql_type`.
///
/// Nulls become the typed null of the column, unknown types pass through unchanged.
pub fn from_result_column(sql_type: &SqlType, raw: Value) -> Result<Value> {
    if raw.is_null() {
        return Ok(match sql_type {
            SqlType::Binary => Value::Blob(None),
            SqlType::Character => Value::Varchar(None),
            SqlType::Timestamp => Value::Timestamp(None),
            SqlType::Date => Value::Date(None),
            SqlType::Time => Value::Time(None),
            SqlType::Integer => Value::Int32(None),
            SqlType::BigInt => Value::Int64(None),
            SqlType::Decimal => Value::Decimal(None),
            SqlType::Float => Value::Float64(None),
            SqlType::Boolean => Value::Boolean(None),
            SqlType::Uuid => Value::Uuid(None),
            SqlType::Other(..) => raw,
        });
    }
    Ok(match sql_type {
        SqlType::Binary => <Box<[u8]>>::try_from_value(raw)?.as_value(),
        SqlType::Character => match raw {
            Value::Varchar(..) => raw,
            v if v.is_numeric() => {
                let mut text = String::new();
                write_literal(&mut text, &v);
                Value::Varchar(Some(text))
            }
            v => String::try_from_value(v)?.as_value(),
        },
        SqlType::Timestamp => match raw {
            Value::TimestampWithTimezone(..) => raw,
            v => PrimitiveDateTime::try_from_value(v)?.as_value(),
        },
        SqlType::Date => Date::try_from_value(raw)?.as_value(),
        SqlType::Time => Time::try_from_value(raw)?.as_value(),
        SqlType::Integer => match i32::try_from_value(raw.clone()) {
            Ok(v) => v.as_value(),
            Err(..) => i64::try_from_value(raw)?.as_value(),
        },
        SqlType::BigInt => i64::try_from_value(raw)?.as_value(),
        SqlType::Decimal => Decimal::try_from_value(raw)?.as_value(),
        SqlType::Float => f64::try_from_value(raw)?.as_value(),
        SqlType::Boolean => bool::try_from_value(raw)?.as_value(),
        SqlType::Uuid => Uuid::try_from_value(raw)?.as_value(),
        SqlType::Other(..) => raw,
    })
}

/// The value to write for a property under the null policy, `None` when the property is left out.
///
/// Without `keep_nulls` null properties are skipped. With it they are written
/// as `NULL`, and so is the empty string.
pub fn apply_null_policy(value: Value, keep_nulls: bool) -> Option<Value> {
    if value.is_null() {
        return keep_nulls.then_some(value);
    }
    match value {
        Value::Varchar(Some(ref v)) if keep_nulls && v.is_empty() => Some(Value::Varchar(None)),
        _ => Some(value),
    }
}
