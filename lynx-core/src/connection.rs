use crate::{SqlType, Value};
use std::{collections::BTreeMap, sync::Arc};

/// Driver properties passed when opening a connection (`user`, `password`, ..).
pub type Properties = BTreeMap<String, String>;

/// A live database connection as seen by the engine.
///
/// Every method is blocking. Errors are reported as `anyhow` errors carrying
/// the driver's message; the session wraps them together with the SQL text.
pub trait Connection: Send {
    fn metadata(&self) -> &ConnectionMetadata;

    /// Primary key column names of `table`, in key order.
    fn primary_keys(&mut self, table: &str) -> anyhow::Result<Vec<String>>;

    /// Run a statement without parameters, optionally reporting the generated key.
    fn execute(&mut self, sql: &str, keys: GeneratedKeys) -> anyhow::Result<Executed>;

    /// Run a statement binding `params` positionally, returns the affected rows.
    fn execute_params(&mut self, sql: &str, params: &[Value]) -> anyhow::Result<u64>;

    /// Run a query binding `params` positionally and collect every row.
    fn query(&mut self, sql: &str, params: &[Value]) -> anyhow::Result<ResultSet>;

    fn auto_commit(&self) -> bool;

    fn is_closed(&self) -> bool;

    fn close(&mut self) -> anyhow::Result<()>;
}

/// Opens connections for one URL scheme.
pub trait Driver: Send + Sync {
    /// URL scheme handled, `sqlite` for `sqlite://..`.
    fn name(&self) -> &'static str;

    fn connect(&self, url: &str, properties: &Properties) -> anyhow::Result<Box<dyn Connection>>;
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionMetadata {
    /// Database product name as reported by the driver, `SQLite`, `PostgreSQL`, ..
    pub product_name: String,
    /// Identifies the database the connection points at, used to key cached metadata.
    pub identity: String,
    pub supports_generated_keys: bool,
}

/// How the driver should report keys generated by an insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GeneratedKeys {
    #[default]
    None,
    /// Whatever the driver knows about the last inserted row.
    Auto,
    /// The values of these columns for the inserted row.
    Columns(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct Executed {
    pub rows_affected: u64,
    /// First generated key with the type of its column.
    pub generated_key: Option<(SqlType, Value)>,
}

#[derive(Debug, Clone)]
pub struct ResultColumn {
    pub name: String,
    pub sql_type: SqlType,
}

pub type Row = Box<[Value]>;

#[derive(Debug, Clone)]
pub struct ResultSet {
    pub columns: Arc<[ResultColumn]>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self {
            columns: Arc::new([]),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
