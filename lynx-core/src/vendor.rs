use crate::{
    GenericSqlWriter, MssqlSqlWriter, OracleSqlWriter, PostgresSqlWriter, SqlType, SqlWriter,
};
use std::fmt::{self, Display};

/// Database engine family, detected once per session from the product name.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    #[default]
    Generic,
    Oracle,
    Mssql,
    Mysql,
    Postgres,
    Sqlite,
}

/// How an insert asks the driver for the generated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKeyStrategy {
    /// The driver cannot report keys.
    None,
    /// Let the driver report whatever key it generated.
    ReturnGeneratedKeys,
    /// Name the key column up front.
    NamedColumnReturn,
}

impl Vendor {
    pub fn detect(product_name: &str) -> Self {
        let name = product_name.to_ascii_lowercase();
        if name.contains("microsoft") || name.contains("sql server") {
            Vendor::Mssql
        } else if name.contains("oracle") {
            Vendor::Oracle
        } else if name.contains("mysql") || name.contains("mariadb") {
            Vendor::Mysql
        } else if name.contains("postgres") {
            Vendor::Postgres
        } else if name.contains("sqlite") {
            Vendor::Sqlite
        } else {
            Vendor::Generic
        }
    }

    /// Wrap a quoted temporal literal in the conversion the engine needs to read it.
    pub fn wrap_date_literal(&self, sql_type: &SqlType, literal: &str) -> String {
        match (self, sql_type) {
            (Vendor::Oracle, SqlType::Timestamp) => {
                format!("to_date({literal},'yyyy-mm-dd hh24:mi:ss')")
            }
            (Vendor::Oracle, SqlType::Date) => format!("to_date({literal},'yyyy-mm-dd')"),
            _ => literal.to_string(),
        }
    }

    pub fn encode_boolean(&self, value: bool) -> &'static str {
        match (self, value) {
            (Vendor::Mssql, true) => "'1'",
            (Vendor::Mssql, false) => "'0'",
            (_, true) => "TRUE",
            (_, false) => "FALSE",
        }
    }

    pub fn encode_binary(&self, bytes: &[u8]) -> String {
        let hex = hex::encode(bytes);
        match self {
            Vendor::Postgres => format!("'\\x{hex}'"),
            Vendor::Mssql => format!("0x{hex}"),
            Vendor::Oracle => format!("hextoraw('{hex}')"),
            Vendor::Generic | Vendor::Mysql | Vendor::Sqlite => format!("X'{hex}'"),
        }
    }

    pub fn generated_key_strategy(&self, supports_generated_keys: bool) -> GeneratedKeyStrategy {
        if !supports_generated_keys {
            return GeneratedKeyStrategy::None;
        }
        match self {
            Vendor::Oracle | Vendor::Postgres | Vendor::Sqlite => {
                GeneratedKeyStrategy::NamedColumnReturn
            }
            Vendor::Generic | Vendor::Mssql | Vendor::Mysql => {
                GeneratedKeyStrategy::ReturnGeneratedKeys
            }
        }
    }

    /// Statement writer with this vendor's quirks.
    pub fn sql_writer(&self) -> Box<dyn SqlWriter + Send + Sync> {
        match self {
            Vendor::Oracle => Box::new(OracleSqlWriter),
            Vendor::Mssql => Box::new(MssqlSqlWriter),
            Vendor::Postgres => Box::new(PostgresSqlWriter),
            Vendor::Generic | Vendor::Mysql | Vendor::Sqlite => {
                Box::new(GenericSqlWriter::new(*self))
            }
        }
    }
}

impl Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Vendor::Generic => "generic",
            Vendor::Oracle => "oracle",
            Vendor::Mssql => "mssql",
            Vendor::Mysql => "mysql",
            Vendor::Postgres => "postgres",
            Vendor::Sqlite => "sqlite",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{GeneratedKeyStrategy, Vendor};
    use crate::SqlType;

    #[test]
    fn detect() {
        assert_eq!(Vendor::detect("Microsoft SQL Server"), Vendor::Mssql);
        assert_eq!(Vendor::detect("Oracle"), Vendor::Oracle);
        assert_eq!(Vendor::detect("MySQL"), Vendor::Mysql);
        assert_eq!(Vendor::detect("MariaDB"), Vendor::Mysql);
        assert_eq!(Vendor::detect("PostgreSQL"), Vendor::Postgres);
        assert_eq!(Vendor::detect("sqlite"), Vendor::Sqlite);
        assert_eq!(Vendor::detect("Apache Derby"), Vendor::Generic);
        assert_eq!(Vendor::detect(""), Vendor::Generic);
    }

    #[test]
    fn quirks() {
        assert_eq!(
            Vendor::Oracle.wrap_date_literal(&SqlType::Timestamp, "'2024-01-02 03:04:05'"),
            "to_date('2024-01-02 03:04:05','yyyy-mm-dd hh24:mi:ss')"
        );
        assert_eq!(
            Vendor::Oracle.wrap_date_literal(&SqlType::Date, "'2024-01-02'"),
            "to_date('2024-01-02','yyyy-mm-dd')"
        );
        assert_eq!(
            Vendor::Oracle.wrap_date_literal(&SqlType::Character, "'x'"),
            "'x'"
        );
        assert_eq!(
            Vendor::Mysql.wrap_date_literal(&SqlType::Timestamp, "'2024-01-02 03:04:05'"),
            "'2024-01-02 03:04:05'"
        );
        assert_eq!(Vendor::Mssql.encode_boolean(true), "'1'");
        assert_eq!(Vendor::Mssql.encode_boolean(false), "'0'");
        assert_eq!(Vendor::Postgres.encode_boolean(true), "TRUE");
        assert_eq!(Vendor::Sqlite.encode_binary(&[1, 255]), "X'01ff'");
        assert_eq!(Vendor::Postgres.encode_binary(&[1, 255]), "'\\x01ff'");
        assert_eq!(Vendor::Mssql.encode_binary(&[1, 255]), "0x01ff");
        assert_eq!(Vendor::Oracle.encode_binary(&[1, 255]), "hextoraw('01ff')");
    }

    #[test]
    fn generated_keys() {
        assert_eq!(
            Vendor::Postgres.generated_key_strategy(true),
            GeneratedKeyStrategy::NamedColumnReturn
        );
        assert_eq!(
            Vendor::Mysql.generated_key_strategy(true),
            GeneratedKeyStrategy::ReturnGeneratedKeys
        );
        assert_eq!(
            Vendor::Oracle.generated_key_strategy(false),
            GeneratedKeyStrategy::None
        );
    }
}
