use lynx::{
    Connection, ConnectionMetadata, Executed, GeneratedKeys, ResultSet, Value, anyhow::Result,
};

/// Wraps a connection and counts what goes through it.
pub struct RecordingConnection<'a> {
    inner: &'a mut dyn Connection,
    /// Metadata lookups for primary keys.
    pub primary_key_queries: usize,
    /// Every statement and query, in order.
    pub statements: Vec<String>,
}

impl<'a> RecordingConnection<'a> {
    pub fn new(inner: &'a mut dyn Connection) -> Self {
        Self {
            inner,
            primary_key_queries: 0,
            statements: Vec::new(),
        }
    }
}

impl Connection for RecordingConnection<'_> {
    fn metadata(&self) -> &ConnectionMetadata {
        self.inner.metadata()
    }

    fn primary_keys(&mut self, table: &str) -> Result<Vec<String>> {
        self.primary_key_queries += 1;
        self.inner.primary_keys(table)
    }

    fn execute(&mut self, sql: &str, keys: GeneratedKeys) -> Result<Executed> {
        self.statements.push(sql.into());
        self.inner.execute(sql, keys)
    }

    fn execute_params(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.statements.push(sql.into());
        self.inner.execute_params(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        self.statements.push(sql.into());
        self.inner.query(sql, params)
    }

    fn auto_commit(&self) -> bool {
        self.inner.auto_commit()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}
