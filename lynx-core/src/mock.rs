use crate::{
    Accessor, AsValue, Connection, ConnectionMetadata, Driver, Entity, EntitySchema, Error,
    Executed, GeneratedKeys, Properties, PropertyDef, ResultColumn, ResultSet, Result, SqlType,
    Value,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use time::PrimitiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    PrimaryKeys(String),
    Execute(String, GeneratedKeys),
    ExecuteParams(String, Vec<Value>),
    Query(String),
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn primary_key_queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::PrimaryKeys(..)))
            .count()
    }

    /// SQL of every statement and query, in order.
    pub fn statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Execute(sql, ..) | Call::ExecuteParams(sql, ..) | Call::Query(sql) => {
                    Some(sql)
                }
                Call::PrimaryKeys(..) => None,
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct MockConnection {
    pub metadata: ConnectionMetadata,
    pub log: CallLog,
    primary_keys: HashMap<String, Vec<String>>,
    results: Arc<Mutex<VecDeque<ResultSet>>>,
    rows_affected: Arc<Mutex<VecDeque<u64>>>,
    generated_key: Option<(SqlType, Value)>,
    failing: bool,
    auto_commit: bool,
    closed: bool,
    close_counter: Option<Arc<AtomicUsize>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            metadata: ConnectionMetadata {
                product_name: "MockDB".into(),
                identity: "mock://memory".into(),
                supports_generated_keys: true,
            },
            log: Default::default(),
            primary_keys: Default::default(),
            results: Default::default(),
            rows_affected: Default::default(),
            generated_key: None,
            failing: false,
            auto_commit: true,
            closed: false,
            close_counter: None,
        }
    }

    pub fn with_product(mut self, product_name: &str) -> Self {
        self.metadata.product_name = product_name.into();
        self
    }

    pub fn with_primary_key(mut self, table: &str, columns: &[&str]) -> Self {
        self.primary_keys.insert(
            table.into(),
            columns.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Queue the result of the next query.
    pub fn with_rows(self, columns: &[(&str, SqlType)], rows: Vec<Vec<Value>>) -> Self {
        self.results.lock().unwrap().push_back(ResultSet {
            columns: columns
                .iter()
                .map(|(name, sql_type)| ResultColumn {
                    name: name.to_string(),
                    sql_type: sql_type.clone(),
                })
                .collect(),
            rows: rows.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Queue the rows affected by the next statements, 1 once exhausted.
    pub fn with_rows_affected(self, rows: &[u64]) -> Self {
        self.rows_affected.lock().unwrap().extend(rows);
        self
    }

    pub fn with_generated_key(mut self, sql_type: SqlType, value: Value) -> Self {
        self.generated_key = Some((sql_type, value));
        self
    }

    /// Every statement and query fails.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.failing {
            anyhow::bail!("mock failure");
        }
        if self.closed {
            anyhow::bail!("connection closed");
        }
        Ok(())
    }

    fn next_rows_affected(&self) -> u64 {
        self.rows_affected.lock().unwrap().pop_front().unwrap_or(1)
    }
}

impl Connection for MockConnection {
    fn metadata(&self) -> &ConnectionMetadata {
        &self.metadata
    }

    fn primary_keys(&mut self, table: &str) -> anyhow::Result<Vec<String>> {
        self.log.push(Call::PrimaryKeys(table.into()));
        Ok(self.primary_keys.get(table).cloned().unwrap_or_default())
    }

    fn execute(&mut self, sql: &str, keys: GeneratedKeys) -> anyhow::Result<Executed> {
        let wants_key = keys != GeneratedKeys::None;
        self.log.push(Call::Execute(sql.into(), keys));
        self.check()?;
        Ok(Executed {
            rows_affected: self.next_rows_affected(),
            generated_key: if wants_key {
                self.generated_key.clone()
            } else {
                None
            },
        })
    }

    fn execute_params(&mut self, sql: &str, params: &[Value]) -> anyhow::Result<u64> {
        self.log.push(Call::ExecuteParams(sql.into(), params.to_vec()));
        self.check()?;
        Ok(self.next_rows_affected())
    }

    fn query(&mut self, sql: &str, _params: &[Value]) -> anyhow::Result<ResultSet> {
        self.log.push(Call::Query(sql.into()));
        self.check()?;
        Ok(self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(ResultSet::empty))
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.closed = true;
        if let Some(counter) = &self.close_counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// Accepts `mock://` urls, the url becomes the connection identity.
#[derive(Default)]
pub struct MockDriver {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    manual_commit: bool,
}

impl MockDriver {
    pub fn without_auto_commit(mut self) -> Self {
        self.manual_commit = true;
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::Relaxed)
    }
}

impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn connect(&self, url: &str, _properties: &Properties) -> anyhow::Result<Box<dyn Connection>> {
        if !url.starts_with("mock://") {
            anyhow::bail!("Unsupported url {}", url);
        }
        self.opened.fetch_add(1, Ordering::Relaxed);
        let mut connection = MockConnection::new();
        connection.metadata.identity = url.into();
        connection.auto_commit = !self.manual_commit;
        connection.close_counter = Some(self.closed.clone());
        Ok(Box::new(connection))
    }
}

macro_rules! accessor {
    ($entity:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        impl Accessor for $entity {
            fn describe(&self) -> Vec<(&'static str, Value)> {
                vec![$((stringify!($field), self.$field.clone().as_value())),*]
            }
            fn get_value(&self, property: &str) -> Option<Value> {
                match property {
                    $(stringify!($field) => Some(self.$field.clone().as_value()),)*
                    _ => None,
                }
            }
            fn set_value(&mut self, property: &str, value: Value) -> Result<()> {
                match property {
                    $(stringify!($field) => {
                        self.$field = <$ty as AsValue>::try_from_value(value)
                            .map_err(|e| Error::coercion(property, format!("{:#}", e)))?;
                    })*
                    _ => return Err(Error::coercion(property, "No such property")),
                }
                Ok(())
            }
            fn get_type(&self, property: &str) -> Option<SqlType> {
                match property {
                    $(stringify!($field) => Some(<$ty as AsValue>::as_empty_value().sql_type()),)*
                    _ => None,
                }
            }
        }
    };
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Person {
    pub id: Option<i32>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub active: Option<bool>,
    pub born: Option<PrimitiveDateTime>,
    pub photo: Option<Vec<u8>>,
    pub notes: Option<String>,
}

accessor!(Person {
    id: Option<i32>,
    last_name: Option<String>,
    age: Option<i32>,
    active: Option<bool>,
    born: Option<PrimitiveDateTime>,
    photo: Option<Vec<u8>>,
    notes: Option<String>,
});

impl Entity for Person {
    fn schema() -> &'static EntitySchema {
        static SCHEMA: EntitySchema = EntitySchema {
            name: "PERSON",
            properties: &[
                PropertyDef {
                    name: "id",
                    column: "ID",
                    exclude: false,
                    primary_key: false,
                },
                PropertyDef {
                    name: "last_name",
                    column: "LASTNAME",
                    exclude: false,
                    primary_key: false,
                },
                PropertyDef::new("age"),
                PropertyDef::new("active"),
                PropertyDef::new("born"),
                PropertyDef::new("photo"),
                PropertyDef {
                    name: "notes",
                    column: "",
                    exclude: true,
                    primary_key: false,
                },
            ],
        };
        &SCHEMA
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fruit {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
}

accessor!(Fruit {
    id: Option<i32>,
    name: Option<String>,
    description: Option<String>,
});

impl Entity for Fruit {
    fn schema() -> &'static EntitySchema {
        static SCHEMA: EntitySchema = EntitySchema {
            name: "FRUIT",
            properties: &[
                PropertyDef::new("id"),
                PropertyDef::new("name"),
                PropertyDef::new("description"),
            ],
        };
        &SCHEMA
    }
}

/// Key declared on the type.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tagged {
    pub tag_id: Option<i64>,
    pub label: Option<String>,
}

accessor!(Tagged {
    tag_id: Option<i64>,
    label: Option<String>,
});

impl Entity for Tagged {
    fn schema() -> &'static EntitySchema {
        static SCHEMA: EntitySchema = EntitySchema {
            name: "TAGGED",
            properties: &[
                PropertyDef {
                    name: "tag_id",
                    column: "TAG_ID",
                    exclude: false,
                    primary_key: true,
                },
                PropertyDef::new("label"),
            ],
        };
        &SCHEMA
    }
}
