//! Target-specific execution quirks.
//!
//! The executor never generates dialect SQL. The dialect identity only picks
//! a [`QuirkHooks`] implementation: a session-setup statement to run before
//! execution and a per-fragment rewrite for the "execute" path.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DialectKind {
    #[default]
    Generic,
    Postgres,
    Oracle,
    MsSql,
    MySql,
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generic" | "" => Ok(Self::Generic),
            "postgres" | "postgresql" | "postgrustql" => Ok(Self::Postgres),
            "oracle" => Ok(Self::Oracle),
            "mssql" | "sqlserver" => Ok(Self::MsSql),
            "mysql" | "mariadb" => Ok(Self::MySql),
            other => Err(format!("Unknown dialect '{other}'")),
        }
    }
}

impl TryFrom<String> for DialectKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generic => "generic",
            Self::Postgres => "postgres",
            Self::Oracle => "oracle",
            Self::MsSql => "mssql",
            Self::MySql => "mysql",
        };
        f.write_str(name)
    }
}

/// Capability interface for connection-specific adjustments.
pub trait QuirkHooks {
    fn dialect(&self) -> DialectKind;

    /// Session setup SQL to run right before a statement executes
    fn pre_execute_hook(&self) -> Option<String> {
        None
    }

    /// Rewrites one fragment on the "execute" path (e.g. trailing terminators)
    fn rewrite_for_execute(&self, sql: &str) -> String {
        sql.to_string()
    }
}

/// Hooks for targets without quirks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQuirks(pub DialectKind);

impl QuirkHooks for NoQuirks {
    fn dialect(&self) -> DialectKind {
        self.0
    }
}

/// PostgreSQL: pins the session to the configured default schema.
#[derive(Debug, Clone, Default)]
pub struct PostgresQuirks {
    pub default_schema: Option<String>,
}

impl QuirkHooks for PostgresQuirks {
    fn dialect(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn pre_execute_hook(&self) -> Option<String> {
        self.default_schema
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|schema| format!("SET SCHEMA '{}'", schema.replace('\'', "''")))
    }
}

/// Oracle: a block closed by a doubled `/` terminator loses the pair before
/// it reaches the driver. A single trailing `/` is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleQuirks;

impl QuirkHooks for OracleQuirks {
    fn dialect(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn rewrite_for_execute(&self, sql: &str) -> String {
        sql.trim_end()
            .strip_suffix('/')
            .map(str::trim_end)
            .and_then(|rest| rest.strip_suffix('/'))
            .unwrap_or(sql)
            .to_string()
    }
}

/// Builds the hook set for a dialect.
pub fn quirks_for(kind: DialectKind, default_schema: Option<&str>) -> Box<dyn QuirkHooks> {
    match kind {
        DialectKind::Postgres => Box::new(PostgresQuirks {
            default_schema: default_schema.map(str::to_string),
        }),
        DialectKind::Oracle => Box::new(OracleQuirks),
        other => Box::new(NoQuirks(other)),
    }
}
