use crate::SqliteConnection;
use anyhow::{Context, Error, Result};
use libsqlite3_sys::{
    SQLITE_OPEN_CREATE, SQLITE_OPEN_MEMORY, SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE,
};
use lynx_core::{Connection, Driver, Properties};
use std::ffi::c_int;

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub const NAME: &'static str = "sqlite";

    pub const fn new() -> Self {
        Self
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn connect(&self, url: &str, properties: &Properties) -> Result<Box<dyn Connection>> {
        Ok(Box::new(SqliteConnection::open(url, properties)?))
    }
}

/// Decoded `sqlite://<path>?mode=..` url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SqliteUrl {
    pub(crate) path: String,
    pub(crate) flags: c_int,
    pub(crate) in_memory: bool,
}

impl SqliteUrl {
    pub(crate) fn parse(url: &str) -> Result<Self> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(rest) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let context = || format!("Error while decoding connection URL: `{}`", url);
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = urlencoding::decode(path).with_context(context)?.into_owned();
        let mut mode = "rwc".to_string();
        for pair in query.split('&').filter(|v| !v.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(value).with_context(context)?;
            match key {
                "mode" => mode = value.into_owned(),
                _ => {
                    let error = Error::msg(format!("Unknown parameter `{}`", key)).context(context());
                    log::error!("{:#}", error);
                    return Err(error);
                }
            }
        }
        let mut in_memory = path == ":memory:" || path.is_empty();
        let flags = match mode.as_str() {
            "ro" => SQLITE_OPEN_READONLY,
            "rw" => SQLITE_OPEN_READWRITE,
            "rwc" => SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE,
            "memory" => {
                in_memory = true;
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_MEMORY
            }
            _ => {
                let error = Error::msg(format!(
                    "Unknown mode `{}`, expected one of ro, rw, rwc, memory",
                    mode
                ))
                .context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
        };
        Ok(Self {
            path: if in_memory && path.is_empty() {
                ":memory:".into()
            } else {
                path
            },
            flags,
            in_memory,
        })
    }
}
