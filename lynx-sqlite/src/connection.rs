use crate::{
    CBox,
    driver::SqliteUrl,
    error_message_from_ptr,
    extract::{extract_name, extract_type, extract_value},
};
use anyhow::{Context, Error, Result};
use libsqlite3_sys::{
    SQLITE_DONE, SQLITE_OK, SQLITE_ROW, SQLITE_TRANSIENT, sqlite3, sqlite3_bind_blob,
    sqlite3_bind_double, sqlite3_bind_int, sqlite3_bind_int64, sqlite3_bind_null,
    sqlite3_bind_text, sqlite3_busy_timeout, sqlite3_changes64, sqlite3_close,
    sqlite3_column_count, sqlite3_db_handle, sqlite3_errmsg, sqlite3_finalize,
    sqlite3_get_autocommit, sqlite3_last_insert_rowid, sqlite3_open_v2, sqlite3_prepare_v2,
    sqlite3_step, sqlite3_stmt, sqlite3_stmt_readonly, sqlite3_total_changes64,
};
use lynx_core::{
    Connection, ConnectionMetadata, Executed, GeneratedKeys, Properties, ResultColumn, ResultSet,
    Row, SqlType, Value, as_c_string,
    coercion::{write_date, write_time, write_timestamp, write_timestamp_with_timezone},
    truncate_long,
};
use std::{
    ffi::{CStr, c_char, c_int},
    ptr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Distinguishes in-memory databases, each connection gets its own.
static MEMORY_DATABASES: AtomicU64 = AtomicU64::new(0);

const PRIMARY_KEYS: &str = "SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk";

pub struct SqliteConnection {
    pub(crate) connection: CBox<sqlite3>,
    metadata: ConnectionMetadata,
}

impl SqliteConnection {
    /// Open `sqlite://<path>[?mode=ro|rw|rwc|memory]`.
    ///
    /// The only property understood is `busy_timeout`, in milliseconds.
    pub fn open(url: &str, properties: &Properties) -> Result<Self> {
        let parsed = SqliteUrl::parse(url)?;
        let path = as_c_string(parsed.path.as_str())
            .with_context(|| format!("Error while decoding connection URL: `{}`", url))?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        unsafe {
            let rc = sqlite3_open_v2(path.as_ptr(), &mut *connection, parsed.flags, ptr::null());
            if rc != SQLITE_OK {
                let message = if connection.is_null() {
                    format!("Could not allocate the connection (code {})", rc)
                } else {
                    error_message_from_ptr(sqlite3_errmsg(*connection)).to_string()
                };
                let error =
                    Error::msg(message).context(format!("While opening the database `{}`", url));
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        if let Some(timeout) = properties.get("busy_timeout") {
            let timeout: c_int = timeout
                .trim()
                .parse()
                .with_context(|| format!("Invalid busy_timeout `{}`", timeout))?;
            unsafe {
                sqlite3_busy_timeout(*connection, timeout);
            }
        }
        let identity = if parsed.in_memory {
            format!(
                "{}#{}",
                url,
                MEMORY_DATABASES.fetch_add(1, Ordering::Relaxed)
            )
        } else {
            url.to_string()
        };
        log::debug!("Opened {}", identity);
        Ok(Self {
            connection,
            metadata: ConnectionMetadata {
                product_name: "SQLite".into(),
                identity,
                supports_generated_keys: true,
            },
        })
    }

    fn handle(&self) -> Result<*mut sqlite3> {
        if self.connection.is_null() {
            let error = Error::msg("The connection is closed");
            log::error!("{}", error);
            return Err(error);
        }
        Ok(*self.connection)
    }

    fn last_error(&self) -> Error {
        unsafe { Error::msg(error_message_from_ptr(sqlite3_errmsg(*self.connection)).to_string()) }
    }

    fn prepare(&mut self, sql: &str) -> Result<CBox<sqlite3_stmt>> {
        let connection = self.handle()?;
        let context = || format!("While preparing the query:\n{}", truncate_long!(sql));
        let query = as_c_string(sql).with_context(context)?;
        let mut statement = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_finalize(p);
        });
        let mut tail: *const c_char = ptr::null();
        unsafe {
            let rc = sqlite3_prepare_v2(
                connection,
                query.as_ptr(),
                -1,
                &mut *statement,
                &mut tail,
            );
            if rc != SQLITE_OK {
                let error = self.last_error().context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
            if statement.is_null() {
                let error = Error::msg("The query contains no statement").context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
            if !tail.is_null()
                && !CStr::from_ptr(tail)
                    .to_bytes()
                    .iter()
                    .all(u8::is_ascii_whitespace)
            {
                let error =
                    Error::msg("Cannot prepare more than one statement at a time").context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        Ok(statement)
    }

    fn bind(statement: &CBox<sqlite3_stmt>, params: &[Value]) -> Result<()> {
        for (i, value) in params.iter().enumerate() {
            let index = (i + 1) as c_int;
            let rc = unsafe { bind_value(**statement, index, value) }
                .with_context(|| format!("While binding parameter {}", index))?;
            if rc != SQLITE_OK {
                let error = unsafe {
                    Error::msg(
                        error_message_from_ptr(sqlite3_errmsg(sqlite3_db_handle(**statement)))
                            .to_string(),
                    )
                }
                .context(format!("While binding parameter {}", index));
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        Ok(())
    }

    /// Step `statement` to completion, calling `on_row` for every produced row.
    fn run(
        &self,
        sql: &str,
        statement: &CBox<sqlite3_stmt>,
        mut on_row: impl FnMut(*mut sqlite3_stmt) -> Result<()>,
    ) -> Result<()> {
        loop {
            match unsafe { sqlite3_step(**statement) } {
                SQLITE_DONE => return Ok(()),
                SQLITE_ROW => on_row(**statement)?,
                _ => {
                    let error = self.last_error().context(format!(
                        "While executing the query:\n{}",
                        truncate_long!(sql)
                    ));
                    log::error!("{:#}", error);
                    return Err(error);
                }
            }
        }
    }

    fn total_changes(&self) -> i64 {
        unsafe { sqlite3_total_changes64(*self.connection) }
    }

    /// Rows changed by `statement` itself, rows written by triggers are not counted.
    ///
    /// `sqlite3_changes64` keeps the count of the last data change, so statements
    /// that changed nothing at all (queries, DDL) report zero.
    fn changes(&self, statement: &CBox<sqlite3_stmt>, total_before: i64) -> u64 {
        unsafe {
            if sqlite3_stmt_readonly(**statement) != 0 || self.total_changes() == total_before {
                return 0;
            }
            sqlite3_changes64(*self.connection).max(0) as u64
        }
    }
}

impl Connection for SqliteConnection {
    fn metadata(&self) -> &ConnectionMetadata {
        &self.metadata
    }

    fn primary_keys(&mut self, table: &str) -> Result<Vec<String>> {
        let result = self.query(PRIMARY_KEYS, &[Value::Varchar(Some(table.into()))])?;
        result
            .rows
            .into_iter()
            .map(|row| match row.first() {
                Some(Value::Varchar(Some(name))) => Ok(name.clone()),
                v => Err(Error::msg(format!(
                    "Unexpected primary key column name {:?} for table `{}`",
                    v, table
                ))),
            })
            .collect()
    }

    fn execute(&mut self, sql: &str, keys: GeneratedKeys) -> Result<Executed> {
        let sql = match &keys {
            GeneratedKeys::Columns(columns) if !columns.is_empty() => format!(
                "{} RETURNING {}",
                sql.trim_end().trim_end_matches(';'),
                columns.join(", ")
            ),
            _ => sql.to_string(),
        };
        let statement = self.prepare(&sql)?;
        let before = self.total_changes();
        let mut returned = None;
        self.run(&sql, &statement, |statement| {
            if returned.is_none() {
                let value = extract_value(statement, 0)?;
                let sql_type = extract_type(statement, 0).unwrap_or_else(|| SqlType::of(&value));
                returned = Some((sql_type, value));
            }
            Ok(())
        })?;
        let rows_affected = self.changes(&statement, before);
        let generated_key = match keys {
            GeneratedKeys::None => None,
            GeneratedKeys::Columns(..) => returned,
            GeneratedKeys::Auto if rows_affected > 0 => Some((
                SqlType::BigInt,
                Value::Int64(Some(unsafe { sqlite3_last_insert_rowid(*self.connection) })),
            )),
            GeneratedKeys::Auto => None,
        };
        Ok(Executed {
            rows_affected,
            generated_key,
        })
    }

    fn execute_params(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let statement = self.prepare(sql)?;
        Self::bind(&statement, params)?;
        let before = self.total_changes();
        self.run(sql, &statement, |_| Ok(()))?;
        Ok(self.changes(&statement, before))
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        let statement = self.prepare(sql)?;
        Self::bind(&statement, params)?;
        let count = unsafe { sqlite3_column_count(*statement) };
        let columns = (0..count)
            .map(|i| {
                Ok(ResultColumn {
                    name: extract_name(*statement, i)?,
                    sql_type: extract_type(*statement, i)
                        .unwrap_or_else(|| SqlType::Other(String::new())),
                })
            })
            .collect::<Result<Arc<[_]>>>()?;
        let mut rows = Vec::new();
        self.run(sql, &statement, |statement| {
            rows.push(
                (0..count)
                    .map(|i| extract_value(statement, i))
                    .collect::<Result<Row>>()?,
            );
            Ok(())
        })?;
        Ok(ResultSet { columns, rows })
    }

    fn auto_commit(&self) -> bool {
        self.connection.is_null() || unsafe { sqlite3_get_autocommit(*self.connection) != 0 }
    }

    fn is_closed(&self) -> bool {
        self.connection.is_null()
    }

    fn close(&mut self) -> Result<()> {
        if self.connection.is_null() {
            return Ok(());
        }
        let rc = unsafe { sqlite3_close(*self.connection) };
        if rc != SQLITE_OK {
            // Still open, the handle stays owned
            let error = self
                .last_error()
                .context(format!("While closing {}", self.metadata.identity));
            log::error!("{:#}", error);
            return Err(error);
        }
        self.connection.take();
        log::debug!("Closed {}", self.metadata.identity);
        Ok(())
    }
}

unsafe fn bind_text(statement: *mut sqlite3_stmt, index: c_int, text: &str) -> c_int {
    unsafe {
        sqlite3_bind_text(
            statement,
            index,
            text.as_ptr() as *const c_char,
            text.len() as c_int,
            SQLITE_TRANSIENT(),
        )
    }
}

unsafe fn bind_value(statement: *mut sqlite3_stmt, index: c_int, value: &Value) -> Result<c_int> {
    let out_of_bounds = |v: &dyn std::fmt::Display| {
        Error::msg(format!(
            "Cannot bind `{}` into a sqlite integer because it's out of bounds",
            v
        ))
    };
    let mut text = String::new();
    unsafe {
        Ok(match value {
            v if v.is_null() => sqlite3_bind_null(statement, index),
            Value::Boolean(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int8(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int16(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int32(Some(v)) => sqlite3_bind_int(statement, index, *v),
            Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, *v),
            Value::UInt8(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::UInt16(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::UInt32(Some(v)) => sqlite3_bind_int64(statement, index, *v as i64),
            Value::UInt64(Some(v)) => {
                let v = i64::try_from(*v).map_err(|_| out_of_bounds(v))?;
                sqlite3_bind_int64(statement, index, v)
            }
            Value::Float32(Some(v)) => sqlite3_bind_double(statement, index, *v as f64),
            Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, *v),
            Value::Decimal(Some(v)) => bind_text(statement, index, &v.to_string()),
            Value::Char(Some(v)) => bind_text(statement, index, v.encode_utf8(&mut [0; 4])),
            Value::Varchar(Some(v)) => bind_text(statement, index, v),
            Value::Blob(Some(v)) => sqlite3_bind_blob(
                statement,
                index,
                v.as_ptr() as *const _,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            Value::Date(Some(v)) => {
                write_date(&mut text, v);
                bind_text(statement, index, &text)
            }
            Value::Time(Some(v)) => {
                write_time(&mut text, v, true);
                bind_text(statement, index, &text)
            }
            Value::Timestamp(Some(v)) => {
                write_timestamp(&mut text, v, true);
                bind_text(statement, index, &text)
            }
            Value::TimestampWithTimezone(Some(v)) => {
                write_timestamp_with_timezone(&mut text, v);
                bind_text(statement, index, &text)
            }
            Value::Uuid(Some(v)) => bind_text(statement, index, &v.to_string()),
            _ => sqlite3_bind_null(statement, index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteConnection;
    use lynx_core::{Connection, Properties};

    #[test]
    fn close_keeps_a_busy_handle() {
        let mut connection = SqliteConnection::open("sqlite://:memory:", &Properties::new())
            .expect("Could not open the database");
        let statement = connection
            .prepare("SELECT 1")
            .expect("Could not prepare the query");
        assert!(connection.close().is_err());
        assert!(!connection.is_closed());
        drop(statement);
        connection.close().expect("Could not close the database");
        assert!(connection.is_closed());
        connection.close().expect("Closing twice is fine");
    }
}
