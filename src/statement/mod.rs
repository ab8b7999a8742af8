//! Statement model consumed by the executor.

pub mod prepared;
pub mod script;

pub use prepared::{ExecutablePreparedStatement, ParameterizedStatement, PreparedStatementFactory};
pub use script::{split_script, ScriptError};

use std::fmt;

use crate::core::VisitorError;
use crate::dialect::DialectKind;
use crate::visitor::{apply_visitors, SqlVisitor};

/// What the caller asks the executor to do with a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Execute,
    Query,
    Update,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Execute => "execute",
            Self::Query => "query",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text statement made of zero or more SQL fragments, run in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlainStatement {
    fragments: Vec<String>,
}

impl PlainStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            fragments: vec![sql.into()],
        }
    }

    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    /// One fragment per `;`-terminated statement of `script`
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        split_script(script).map(|fragments| Self { fragments })
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Stored-procedure call, e.g. `{call refresh_stats(?)}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableStatement {
    sql: String,
}

impl CallableStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Abstract description of one operation, built by the caller and never
/// modified by the executor.
#[derive(Debug)]
pub enum SqlStatement {
    Plain(PlainStatement),
    Prepared(Box<dyn ExecutablePreparedStatement>),
    Callable(CallableStatement),
}

impl SqlStatement {
    pub fn plain(sql: impl Into<String>) -> Self {
        Self::Plain(PlainStatement::new(sql))
    }

    pub fn callable(sql: impl Into<String>) -> Self {
        Self::Callable(CallableStatement::new(sql))
    }

    pub fn prepared(statement: impl ExecutablePreparedStatement + 'static) -> Self {
        Self::Prepared(Box::new(statement))
    }

    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Plain(_) => "PlainStatement",
            Self::Prepared(_) => "ExecutableParameterized",
            Self::Callable(_) => "CallableStatement",
        }
    }

    /// Fragments as supplied, before any visitor ran
    pub fn raw_fragments(&self) -> Vec<String> {
        match self {
            Self::Plain(plain) => plain.fragments().to_vec(),
            Self::Prepared(prepared) => prepared.sql(),
            Self::Callable(call) => vec![call.sql().to_string()],
        }
    }

    /// Final SQL texts. Prepared statements are already final and skip the
    /// visitor chain.
    pub fn render(
        &self,
        visitors: &[Box<dyn SqlVisitor>],
        dialect: DialectKind,
    ) -> Result<Vec<String>, VisitorError> {
        match self {
            Self::Prepared(prepared) => Ok(prepared.sql()),
            Self::Plain(_) | Self::Callable(_) => {
                apply_visitors(&self.raw_fragments(), visitors, dialect)
            }
        }
    }
}

impl From<PlainStatement> for SqlStatement {
    fn from(value: PlainStatement) -> Self {
        Self::Plain(value)
    }
}

impl From<CallableStatement> for SqlStatement {
    fn from(value: CallableStatement) -> Self {
        Self::Callable(value)
    }
}
