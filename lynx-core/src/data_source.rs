use crate::{Connection, Driver, Error, Properties, Result};
use std::{collections::HashMap, fmt, sync::Arc};

/// Hands out connections to one database.
pub trait DataSource: Send + Sync {
    fn connection(&self) -> Result<Box<dyn Connection>>;
}

/// Resolves data sources by name.
pub trait Directory: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Arc<dyn DataSource>>;
}

/// Opens a new connection through a driver on every call.
pub struct UrlDataSource {
    pub driver: Arc<dyn Driver>,
    pub url: String,
    pub properties: Properties,
}

impl UrlDataSource {
    pub fn new(driver: Arc<dyn Driver>, url: impl Into<String>, properties: Properties) -> Self {
        Self {
            driver,
            url: url.into(),
            properties,
        }
    }
}

impl DataSource for UrlDataSource {
    fn connection(&self) -> Result<Box<dyn Connection>> {
        self.driver
            .connect(&self.url, &self.properties)
            .map_err(Error::ConnectionFailed)
    }
}

impl fmt::Debug for UrlDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlDataSource")
            .field("driver", &self.driver.name())
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// In memory directory of named data sources.
///
/// A name is looked up in the `env/` namespace first, then as given.
#[derive(Default)]
pub struct DataSourceRegistry {
    sources: HashMap<String, Arc<dyn DataSource>>,
}

impl DataSourceRegistry {
    pub const ENV_PREFIX: &'static str = "env/";

    pub fn new() -> Self {
        Default::default()
    }

    pub fn register(&mut self, name: impl Into<String>, source: Arc<dyn DataSource>) -> &mut Self {
        self.sources.insert(name.into(), source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Directory for DataSourceRegistry {
    fn lookup(&self, name: &str) -> Option<Arc<dyn DataSource>> {
        self.sources
            .get(&format!("{}{}", Self::ENV_PREFIX, name))
            .or_else(|| self.sources.get(name))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSource, DataSourceRegistry, Directory, UrlDataSource};
    use crate::{Error, Properties, mock::MockDriver};
    use std::sync::Arc;

    #[test]
    fn env_namespace_first() {
        let driver = Arc::new(MockDriver::default());
        let mut registry = DataSourceRegistry::new();
        registry
            .register(
                "main",
                Arc::new(UrlDataSource::new(driver.clone(), "mock://plain", Properties::new())),
            )
            .register(
                "env/main",
                Arc::new(UrlDataSource::new(driver.clone(), "mock://env", Properties::new())),
            )
            .register(
                "other",
                Arc::new(UrlDataSource::new(driver.clone(), "mock://other", Properties::new())),
            );
        let connection = registry.lookup("main").unwrap().connection().unwrap();
        assert_eq!(connection.metadata().identity, "mock://env");
        let connection = registry.lookup("other").unwrap().connection().unwrap();
        assert_eq!(connection.metadata().identity, "mock://other");
        assert!(registry.lookup("missing").is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn driver_failure() {
        let source = UrlDataSource::new(
            Arc::new(MockDriver::default()),
            "other://x",
            Properties::new(),
        );
        assert!(matches!(
            source.connection(),
            Err(Error::ConnectionFailed(..))
        ));
    }
}
