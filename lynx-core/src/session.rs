use crate::{
    Accessor, AsValue, Config, Connection, DataSource, Directory, Driver, Entity,
    EntityDescriptor, Error, GeneratedKeyStrategy, GeneratedKeys, Properties, Registry,
    ResultColumn, Result, Row, UrlDataSource, Value, Vendor, coercion::from_result_column,
    truncate_long,
};
use std::{collections::BTreeMap, sync::Arc};

/// Outcome of [`Session::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saved {
    Inserted(u64),
    Updated(u64),
}

impl Saved {
    pub fn rows_affected(&self) -> u64 {
        match self {
            Saved::Inserted(v) | Saved::Updated(v) => *v,
        }
    }
}

enum Slot<'c> {
    /// Borrowed from the caller, never closed here.
    Managed(&'c mut dyn Connection),
    Owned(Option<Box<dyn Connection>>),
}

enum Source {
    None,
    DataSource(Arc<dyn DataSource>),
    Named {
        name: String,
        directory: Arc<dyn Directory>,
    },
}

/// Runs entity statements on one connection.
///
/// A session either borrows a connection from the caller or opens its own
/// from a driver or a named data source. An owned connection in autocommit
/// mode is closed at the end of every public operation, successful or not,
/// and opened again by the next one. Transactions are left to the caller.
///
/// ```rust,ignore
/// let mut session = Session::open(driver, "sqlite://people.db", Properties::new());
/// let mut person = Person { id: Some(42), last_name: Some("Smith".into()), ..Default::default() };
/// session.insert(&mut person)?;
/// let mut found = Person { id: Some(42), ..Default::default() };
/// assert!(session.select(&mut found)?);
/// ```
pub struct Session<'c> {
    slot: Slot<'c>,
    source: Source,
    registry: Arc<Registry>,
    keep_nulls: bool,
    queries: BTreeMap<String, String>,
    vendor: Option<Vendor>,
}

impl<'c> Session<'c> {
    fn with_slot(slot: Slot<'c>, source: Source) -> Self {
        Self {
            slot,
            source,
            registry: Registry::global(),
            keep_nulls: false,
            queries: BTreeMap::new(),
            vendor: None,
        }
    }

    /// Work on a connection owned by the caller.
    pub fn managed(connection: &'c mut dyn Connection) -> Self {
        Self::with_slot(Slot::Managed(connection), Source::None)
    }

    /// Connections are opened through `driver` when needed.
    pub fn open(
        driver: Arc<dyn Driver>,
        url: impl Into<String>,
        properties: Properties,
    ) -> Session<'static> {
        Session::with_data_source(Arc::new(UrlDataSource::new(driver, url, properties)))
    }

    pub fn with_data_source(source: Arc<dyn DataSource>) -> Session<'static> {
        Session::with_slot(Slot::Owned(None), Source::DataSource(source))
    }

    /// The data source is looked up in `directory` by name at every connect.
    pub fn named(name: impl Into<String>, directory: Arc<dyn Directory>) -> Session<'static> {
        Session::with_slot(
            Slot::Owned(None),
            Source::Named {
                name: name.into(),
                directory,
            },
        )
    }

    /// Named session checked against the configuration, inheriting its null policy and queries.
    pub fn from_config(
        config: &Config,
        name: &str,
        directory: Arc<dyn Directory>,
    ) -> Result<Session<'static>> {
        config.connection(name)?;
        Ok(Session::named(name, directory)
            .save_nulls(config.keep_nulls)
            .with_queries(config.queries.clone()))
    }

    /// Write null properties as `NULL` instead of leaving them out.
    pub fn save_nulls(mut self, keep_nulls: bool) -> Self {
        self.keep_nulls = keep_nulls;
        self
    }

    /// Statements `execute` and `list_of` run in place of a matching name.
    pub fn with_queries(mut self, queries: BTreeMap<String, String>) -> Self {
        self.queries = queries;
        self
    }

    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn keep_nulls(&self) -> bool {
        self.keep_nulls
    }

    /// Vendor detected at the first connect.
    pub fn vendor(&self) -> Option<Vendor> {
        self.vendor
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn is_connected(&self) -> bool {
        match &self.slot {
            Slot::Managed(connection) => !connection.is_closed(),
            Slot::Owned(Some(connection)) => !connection.is_closed(),
            Slot::Owned(None) => false,
        }
    }

    /// Make sure a live connection is available, acquiring one from the source if needed.
    pub fn connect(&mut self) -> Result<()> {
        if !self.is_connected() {
            let Self { slot, source, .. } = &mut *self;
            match slot {
                Slot::Managed(..) => {
                    return Err(Error::Connection(
                        "The caller provided connection is closed".into(),
                    ));
                }
                Slot::Owned(slot) => {
                    let connection = match source {
                        Source::None => {
                            return Err(Error::Connection("No connection source".into()));
                        }
                        Source::DataSource(source) => source.connection()?,
                        Source::Named { name, directory } => directory
                            .lookup(name)
                            .ok_or_else(|| {
                                Error::Connection(format!(
                                    "Could not lookup connection by name: {}",
                                    name
                                ))
                            })?
                            .connection()?,
                    };
                    log::trace!("Connection acquired: {}", connection.metadata().identity);
                    *slot = Some(connection);
                }
            }
        }
        if self.vendor.is_none() {
            let vendor = Vendor::detect(&self.connection_ref()?.metadata().product_name);
            log::debug!("Session bound to the {} vendor profile", vendor);
            self.vendor = Some(vendor);
        }
        Ok(())
    }

    /// The live connection, connecting first if needed.
    pub fn connection(&mut self) -> Result<&mut dyn Connection> {
        self.connect()?;
        match &mut self.slot {
            Slot::Managed(connection) => Ok(&mut **connection),
            Slot::Owned(Some(connection)) => Ok(connection.as_mut()),
            Slot::Owned(None) => Err(Error::Connection("Not connected".into())),
        }
    }

    fn connection_ref(&self) -> Result<&dyn Connection> {
        match &self.slot {
            Slot::Managed(connection) => Ok(&**connection),
            Slot::Owned(Some(connection)) => Ok(connection.as_ref()),
            Slot::Owned(None) => Err(Error::Connection("Not connected".into())),
        }
    }

    /// Close an owned connection, even outside autocommit.
    pub fn close(&mut self) -> Result<()> {
        if let Slot::Owned(slot) = &mut self.slot
            && let Some(mut connection) = slot.take()
        {
            connection.close().map_err(Error::ConnectionFailed)?;
        }
        Ok(())
    }

    /// Drop an owned autocommit connection.
    fn release(&mut self) {
        let Slot::Owned(slot) = &mut self.slot else {
            return;
        };
        if slot
            .as_ref()
            .is_some_and(|c| c.auto_commit() || c.is_closed())
            && let Some(mut connection) = slot.take()
        {
            if !connection.is_closed()
                && let Err(e) = connection.close()
            {
                log::warn!("Error while closing the connection: {:#}", e);
            }
            log::trace!("Connection released: {}", connection.metadata().identity);
        }
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = f(self);
        self.release();
        result
    }

    /// Vendor and writer of the connected session.
    fn bound_vendor(&mut self) -> Result<Vendor> {
        self.connect()?;
        Ok(self.vendor.unwrap_or_default())
    }

    fn primary_key(&mut self, descriptor: &EntityDescriptor) -> Result<Arc<[String]>> {
        let registry = self.registry.clone();
        registry.resolve_primary_key(self.connection()?, descriptor)
    }

    /// Insert the entity, returns the rows affected.
    ///
    /// When the database generates the key it is written back into the
    /// property of the first key column.
    pub fn insert<E: Entity>(&mut self, entity: &mut E) -> Result<u64> {
        let descriptor = self.registry.resolve::<E>();
        self.scoped(|s| s.insert_entity(&descriptor, entity))
    }

    fn insert_entity(
        &mut self,
        descriptor: &EntityDescriptor,
        entity: &mut dyn Accessor,
    ) -> Result<u64> {
        let vendor = self.bound_vendor()?;
        let primary_key = match self.primary_key(descriptor) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!(
                    "Inserting into {} without a primary key: {:#}",
                    descriptor.relation,
                    e
                );
                None
            }
        };
        let mut sql = String::new();
        vendor
            .sql_writer()
            .write_insert(&mut sql, descriptor, entity, self.keep_nulls);
        let connection = self.connection()?;
        let keys = match (
            &primary_key,
            vendor.generated_key_strategy(connection.metadata().supports_generated_keys),
        ) {
            (Some(pk), GeneratedKeyStrategy::NamedColumnReturn) => {
                GeneratedKeys::Columns(vec![pk[0].clone()])
            }
            (Some(..), GeneratedKeyStrategy::ReturnGeneratedKeys) => GeneratedKeys::Auto,
            _ => GeneratedKeys::None,
        };
        log::debug!("{}", truncate_long!(sql));
        let executed = connection
            .execute(&sql, keys)
            .map_err(|e| Error::sql(sql, e))?;
        if let (Some(pk), Some((sql_type, value))) = (primary_key, executed.generated_key)
            && is_usable_key(&value)
        {
            let property = descriptor
                .property_for_column(&pk[0])
                .unwrap_or(pk[0].as_str());
            let result = from_result_column(&sql_type, value)
                .map_err(|e| Error::coercion(property, format!("{:#}", e)))
                .and_then(|v| entity.set_value(property, v));
            if let Err(e) = result {
                log::warn!("Generated key not written back: {:#}", e);
            }
        }
        Ok(executed.rows_affected)
    }

    /// Update the row identified by the entity key, returns the rows affected (zero is fine).
    pub fn update<E: Entity>(&mut self, entity: &mut E) -> Result<u64> {
        let descriptor = self.registry.resolve::<E>();
        self.scoped(|s| s.update_entity(&descriptor, entity))
    }

    fn update_entity(&mut self, descriptor: &EntityDescriptor, entity: &dyn Accessor) -> Result<u64> {
        let vendor = self.bound_vendor()?;
        let primary_key = self.primary_key(descriptor)?;
        let mut sql = String::new();
        vendor.sql_writer().write_update(
            &mut sql,
            descriptor,
            entity,
            &primary_key,
            self.keep_nulls,
        )?;
        self.execute_statement(sql)
    }

    /// Delete the row identified by the entity key, true when exactly one row went away.
    pub fn delete<E: Entity>(&mut self, entity: &mut E) -> Result<bool> {
        let descriptor = self.registry.resolve::<E>();
        self.scoped(|s| {
            let vendor = s.bound_vendor()?;
            let primary_key = s.primary_key(&descriptor)?;
            let mut sql = String::new();
            vendor
                .sql_writer()
                .write_delete(&mut sql, &descriptor, entity, &primary_key)?;
            Ok(s.execute_statement(sql)? == 1)
        })
    }

    /// Load the row identified by the entity key into the entity.
    ///
    /// Returns false and leaves the entity untouched when no row matches.
    pub fn select<E: Entity>(&mut self, entity: &mut E) -> Result<bool> {
        let descriptor = self.registry.resolve::<E>();
        self.scoped(|s| {
            let vendor = s.bound_vendor()?;
            let primary_key = s.primary_key(&descriptor)?;
            let mut sql = String::new();
            vendor
                .sql_writer()
                .write_select(&mut sql, &descriptor, entity, &primary_key)?;
            log::debug!("{}", truncate_long!(sql));
            let result = s
                .connection()?
                .query(&sql, &[])
                .map_err(|e| Error::sql(sql, e))?;
            let columns = result.columns;
            let Some(row) = result.rows.into_iter().next() else {
                return Ok(false);
            };
            populate(&descriptor, entity, &columns, row);
            Ok(true)
        })
    }

    /// Update the row when it exists, insert it otherwise.
    ///
    /// An entity with a null key value is always inserted. The existence
    /// check and the write are separate statements.
    pub fn save<E: Entity>(&mut self, entity: &mut E) -> Result<Saved> {
        let descriptor = self.registry.resolve::<E>();
        self.scoped(|s| {
            let vendor = s.bound_vendor()?;
            let primary_key = s.primary_key(&descriptor)?;
            let mut sql = String::new();
            match vendor
                .sql_writer()
                .write_exists(&mut sql, &descriptor, entity, &primary_key)
            {
                Ok(()) => {}
                Err(Error::Validation(..)) => {
                    return s.insert_entity(&descriptor, entity).map(Saved::Inserted);
                }
                Err(e) => return Err(e),
            }
            log::debug!("{}", truncate_long!(sql));
            let exists = !s
                .connection()?
                .query(&sql, &[])
                .map_err(|e| Error::sql(sql, e))?
                .is_empty();
            if exists {
                s.update_entity(&descriptor, entity).map(Saved::Updated)
            } else {
                s.insert_entity(&descriptor, entity).map(Saved::Inserted)
            }
        })
    }

    /// Run any statement with positional parameters, returns the rows affected.
    ///
    /// `sql` may also be the name of a configured query.
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let sql = self.query_text(sql);
        self.scoped(|s| {
            log::debug!("{}", truncate_long!(sql));
            s.connection()?
                .execute_params(&sql, params)
                .map_err(|e| Error::sql(sql.as_str(), e))
        })
    }

    /// Run a query and materialize every row into a new entity, in row order.
    ///
    /// `sql` may also be the name of a configured query.
    pub fn list_of<E: Entity>(&mut self, sql: &str, params: &[Value]) -> Result<Vec<E>> {
        let descriptor = self.registry.resolve::<E>();
        let sql = self.query_text(sql);
        self.scoped(|s| {
            log::debug!("{}", truncate_long!(sql));
            let result = s
                .connection()?
                .query(&sql, params)
                .map_err(|e| Error::sql(sql.as_str(), e))?;
            let columns = result.columns;
            Ok(result
                .rows
                .into_iter()
                .map(|row| {
                    let mut entity = E::default();
                    populate(&descriptor, &mut entity, &columns, row);
                    entity
                })
                .collect())
        })
    }

    /// Operations on one entity through this session.
    pub fn bind<'s, E: Entity>(&'s mut self, entity: &'s mut E) -> Bound<'s, 'c, E> {
        Bound {
            session: self,
            entity,
        }
    }

    fn query_text(&self, sql: &str) -> String {
        match self.queries.get(sql) {
            Some(query) => {
                log::trace!("Running the query named {}", sql);
                query.clone()
            }
            None => sql.to_string(),
        }
    }

    fn execute_statement(&mut self, sql: String) -> Result<u64> {
        log::debug!("{}", truncate_long!(sql));
        self.connection()?
            .execute(&sql, GeneratedKeys::None)
            .map(|v| v.rows_affected)
            .map_err(|e| Error::sql(sql, e))
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("{:#}", e);
        }
    }
}

/// An entity bound to a session.
pub struct Bound<'s, 'c, E: Entity> {
    session: &'s mut Session<'c>,
    entity: &'s mut E,
}

impl<E: Entity> Bound<'_, '_, E> {
    pub fn entity(&self) -> &E {
        &*self.entity
    }

    pub fn entity_mut(&mut self) -> &mut E {
        &mut *self.entity
    }

    pub fn insert(&mut self) -> Result<u64> {
        self.session.insert(self.entity)
    }

    pub fn update(&mut self) -> Result<u64> {
        self.session.update(self.entity)
    }

    pub fn delete(&mut self) -> Result<bool> {
        self.session.delete(self.entity)
    }

    pub fn select(&mut self) -> Result<bool> {
        self.session.select(self.entity)
    }

    pub fn save(&mut self) -> Result<Saved> {
        self.session.save(self.entity)
    }
}

/// Assign every mapped column of the row, values that do not fit are logged and skipped.
fn populate(
    descriptor: &EntityDescriptor,
    entity: &mut dyn Accessor,
    columns: &[ResultColumn],
    row: Row,
) {
    for (column, value) in columns.iter().zip(row.into_vec()) {
        let Some(property) = descriptor.property_for_column(&column.name) else {
            log::trace!(
                "Column {} has no property in {}",
                column.name,
                descriptor.type_name
            );
            continue;
        };
        let result = from_result_column(&column.sql_type, value)
            .map_err(|e| Error::coercion(property, format!("{:#}", e)))
            .and_then(|v| entity.set_value(property, v));
        if let Err(e) = result {
            log::warn!("{:#}", e);
        }
    }
}

/// Non null, and positive when numeric.
fn is_usable_key(value: &Value) -> bool {
    if value.is_null() {
        return false;
    }
    if value.is_numeric() {
        return f64::try_from_value(value.clone()).is_ok_and(|v| v > 0.0);
    }
    true
}
