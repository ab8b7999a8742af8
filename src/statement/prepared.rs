use std::fmt;

use crate::connection::{Connection, PreparedHandle, Scoped};
use crate::core::{DriverError, ExecutionError, Value};
use crate::observer::ExecutionObserver;

/// A statement that binds its own parameters and runs itself.
///
/// The executor only hands it a factory bound to the live connection. Its SQL
/// is treated as final: visitors never touch it.
pub trait ExecutablePreparedStatement: fmt::Debug {
    /// SQL text(s) the statement will prepare, for diagnostics
    fn sql(&self) -> Vec<String>;

    fn execute(&self, factory: &PreparedStatementFactory<'_>) -> Result<(), ExecutionError>;
}

/// Hands out scoped prepared handles for one connection.
pub struct PreparedStatementFactory<'a> {
    connection: &'a dyn Connection,
    observer: &'a dyn ExecutionObserver,
}

impl<'a> PreparedStatementFactory<'a> {
    pub fn new(connection: &'a dyn Connection, observer: &'a dyn ExecutionObserver) -> Self {
        Self { connection, observer }
    }

    pub fn target(&self) -> &str {
        self.connection.target()
    }

    /// Prepares `sql`; the handle is closed when the returned guard drops.
    pub fn create(&self, sql: &str) -> Result<Scoped<'a, dyn PreparedHandle + 'a>, ExecutionError> {
        self.observer.on_command("PREPARE", sql);
        let handle = self
            .connection
            .prepare_statement(sql)
            .map_err(|e| self.wrap(e, sql))?;
        Ok(Scoped::new(handle, self.observer))
    }

    /// Wraps a driver failure with the statement text and target
    pub fn wrap(&self, cause: DriverError, sql: &str) -> ExecutionError {
        ExecutionError::driver(cause, &[sql.to_string()], self.target())
    }
}

/// SQL with positional parameters bound in order (`$1`, `$2`, ... or `?`).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl ParameterizedStatement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl ExecutablePreparedStatement for ParameterizedStatement {
    fn sql(&self) -> Vec<String> {
        vec![self.sql.clone()]
    }

    fn execute(&self, factory: &PreparedStatementFactory<'_>) -> Result<(), ExecutionError> {
        let mut handle = factory.create(&self.sql)?;
        for (i, value) in self.params.iter().enumerate() {
            handle
                .bind(i + 1, value)
                .map_err(|e| factory.wrap(e, &self.sql))?;
        }
        handle.execute().map_err(|e| factory.wrap(e, &self.sql))
    }
}
