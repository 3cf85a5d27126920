use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while persisting or loading an entity.
#[derive(ThisError, Debug)]
pub enum Error {
    /// No usable connection source was configured for the session.
    #[error("Connection not valid: {0}")]
    Connection(String),
    /// The driver could not hand out a connection.
    #[error("Could not acquire a connection: {0:#}")]
    ConnectionFailed(#[source] anyhow::Error),
    /// The relation has no discoverable primary key and the entity declares none.
    #[error("Primary key missing for table: {relation}")]
    Schema { relation: String },
    /// Raised while building a statement, before any SQL reaches the database.
    #[error("{0}")]
    Validation(String),
    /// The database rejected or failed a statement.
    #[error("Error while executing `{query}`: {source:#}")]
    SqlExecution {
        query: String,
        #[source]
        source: anyhow::Error,
    },
    /// A value could not be mapped into an entity property.
    #[error("Cannot set property `{property}`: {message}")]
    Coercion { property: String, message: String },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn sql(query: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::SqlExecution {
            query: query.into(),
            source: source.into(),
        }
    }

    pub fn coercion(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Coercion {
            property: property.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(..))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}
