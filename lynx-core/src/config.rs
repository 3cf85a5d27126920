use crate::{DataSourceRegistry, Driver, Error, Properties, Result, UrlDataSource};
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path, str::FromStr, sync::Arc};

/// Connection settings loaded from a TOML file.
///
/// ```toml
/// keep-nulls = false
///
/// [connections.main]
/// url = "sqlite://app.db?mode=rwc"
/// user = "app"
/// password = "secret"
/// properties = { busy_timeout = "5000" }
///
/// [queries]
/// active-people = "SELECT * FROM PERSON WHERE active = 1"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Default null policy of sessions created from this configuration.
    #[serde(default)]
    pub keep_nulls: bool,
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
    /// Named SQL statements, available through [`Config::query`].
    #[serde(default)]
    pub queries: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConnectionConfig {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl ConnectionConfig {
    /// Driver properties with `user` and `password` folded in.
    pub fn all_properties(&self) -> Properties {
        let mut properties = self.properties.clone();
        if let Some(user) = &self.user {
            properties.insert("user".into(), user.clone());
        }
        if let Some(password) = &self.password {
            properties.insert("password".into(), password.clone());
        }
        properties
    }

    /// The part of the url before `://`.
    pub fn scheme(&self) -> Option<&str> {
        self.url.split_once("://").map(|(scheme, _)| scheme)
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        text.parse()
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    pub fn connection(&self, name: &str) -> Result<&ConnectionConfig> {
        self.connections
            .get(name)
            .ok_or_else(|| Error::Config(format!("No connection named `{}`", name)))
    }
}

impl DataSourceRegistry {
    /// One data source per configured connection, the driver chosen by the url scheme.
    pub fn from_config(config: &Config, drivers: &[Arc<dyn Driver>]) -> Result<Self> {
        let mut registry = DataSourceRegistry::new();
        for (name, connection) in &config.connections {
            let scheme = connection.scheme().ok_or_else(|| {
                Error::Config(format!(
                    "Connection `{}` has an invalid url `{}`",
                    name, connection.url
                ))
            })?;
            let driver = drivers
                .iter()
                .find(|d| d.name().eq_ignore_ascii_case(scheme))
                .ok_or_else(|| {
                    Error::Config(format!(
                        "No driver for scheme `{}` of connection `{}`",
                        scheme, name
                    ))
                })?;
            registry.register(
                name.clone(),
                Arc::new(UrlDataSource::new(
                    driver.clone(),
                    connection.url.clone(),
                    connection.all_properties(),
                )),
            );
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::{DataSourceRegistry, Directory, Driver, Error, mock::MockDriver};
    use std::sync::Arc;

    const CONFIG: &str = r#"
        keep-nulls = true

        [connections.main]
        url = "mock://main"
        user = "sa"
        password = "pw"
        properties = { busy_timeout = "100" }

        [connections.reporting]
        url = "mock://reporting"

        [queries]
        all-people = "SELECT * FROM PERSON"
    "#;

    #[test]
    fn parse() {
        let config: Config = CONFIG.parse().unwrap();
        assert!(config.keep_nulls);
        assert_eq!(config.connections.len(), 2);
        let main = config.connection("main").unwrap();
        assert_eq!(main.scheme(), Some("mock"));
        let properties = main.all_properties();
        assert_eq!(properties["user"], "sa");
        assert_eq!(properties["password"], "pw");
        assert_eq!(properties["busy_timeout"], "100");
        assert_eq!(config.query("all-people"), Some("SELECT * FROM PERSON"));
        assert_eq!(config.query("missing"), None);
        assert!(matches!(config.connection("missing"), Err(Error::Config(..))));
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            "keep-nulls = 3".parse::<Config>(),
            Err(Error::Config(..))
        ));
        assert!(matches!(
            "unknown = 1".parse::<Config>(),
            Err(Error::Config(..))
        ));
        assert!(matches!(
            Config::load("/nonexistent/lynx.toml"),
            Err(Error::Config(..))
        ));
    }

    #[test]
    fn registry_from_config() {
        let config: Config = CONFIG.parse().unwrap();
        let drivers: Vec<Arc<dyn Driver>> = vec![Arc::new(MockDriver::default())];
        let registry = DataSourceRegistry::from_config(&config, &drivers).unwrap();
        let connection = registry.lookup("reporting").unwrap().connection().unwrap();
        assert_eq!(connection.metadata().identity, "mock://reporting");

        let config: Config = "[connections.x]\nurl = \"pg://host/db\"".parse().unwrap();
        assert!(matches!(
            DataSourceRegistry::from_config(&config, &drivers),
            Err(Error::Config(..))
        ));
    }
}
