use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, QuarryResult};
use crate::transpiler::sql::mssql::MssqlGenerator;
use crate::transpiler::sql::mysql::MysqlGenerator;
use crate::transpiler::sql::oracle::OracleGenerator;
use crate::transpiler::sql::postgres::PostgresGenerator;
use crate::transpiler::sql::sqlite::SqliteGenerator;
use crate::transpiler::traits::SqlGenerator;

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
    /// Compile only.
    MsSql,
    /// Compile only.
    Oracle,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::MsSql,
        Dialect::Oracle,
    ];

    pub fn generator(&self) -> &'static dyn SqlGenerator {
        match self {
            Dialect::Postgres => &PostgresGenerator,
            Dialect::MySql => &MysqlGenerator,
            Dialect::Sqlite => &SqliteGenerator,
            Dialect::MsSql => &MssqlGenerator,
            Dialect::Oracle => &OracleGenerator,
        }
    }

    pub fn name(&self) -> &'static str {
        self.generator().name()
    }

    /// Whether the bundled sqlx driver can execute queries of this dialect.
    pub fn has_driver(&self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::MySql | Dialect::Sqlite)
    }

    /// Infer the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> QuarryResult<Self> {
        let scheme = url.split(':').next().unwrap_or_default().to_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "mssql" | "sqlserver" => Ok(Dialect::MsSql),
            "oracle" => Ok(Dialect::Oracle),
            _ => Err(QuarryError::Config(format!(
                "cannot infer a dialect from database url scheme '{}'",
                scheme
            ))),
        }
    }
}

impl FromStr for Dialect {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "mssql" | "sqlserver" => Ok(Dialect::MsSql),
            "oracle" => Ok(Dialect::Oracle),
            other => Err(QuarryError::Config(format!("unknown dialect '{}'", other))),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(
            Dialect::from_url("postgres://localhost/app").unwrap(),
            Dialect::Postgres
        );
        assert_eq!(Dialect::from_url("sqlite::memory:").unwrap(), Dialect::Sqlite);
        assert_eq!(Dialect::from_url("mysql://root@db/app").unwrap(), Dialect::MySql);
        assert!(Dialect::from_url("redis://localhost").is_err());
    }

    #[test]
    fn test_parse_name() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.name().parse::<Dialect>().unwrap(), dialect);
        }
    }
}
