//! Contracts the executor consumes from the database connectivity layer.
//!
//! A driver adapter implements [`Connection`] and hands out statement,
//! call and prepared handles plus result cursors. The executor never owns the
//! connection; it only borrows it for the duration of a call and wraps every
//! handle it acquires in a [`Scoped`] guard.

pub mod scoped;
pub mod vec_cursor;

pub use scoped::Scoped;
pub use vec_cursor::VecCursor;

use crate::core::{DriverError, Row, Value};

/// Anything the executor acquires and must release exactly once.
pub trait Closeable {
    /// Label used in release-failure diagnostics
    fn resource_name(&self) -> &'static str;

    fn close(&mut self) -> Result<(), DriverError>;
}

/// A live (or offline) database connection.
pub trait Connection {
    /// Identity of the target, typically its URL. Used in error context only.
    fn target(&self) -> &str;

    fn is_offline(&self) -> bool {
        false
    }

    /// Plain statement handle for text execution
    fn create_statement(&self) -> Result<Box<dyn StatementHandle + '_>, DriverError>;

    /// Stored-procedure call handle
    fn prepare_call(&self, sql: &str) -> Result<Box<dyn CallableHandle + '_>, DriverError>;

    /// Parameterized statement handle
    fn prepare_statement(&self, sql: &str) -> Result<Box<dyn PreparedHandle + '_>, DriverError>;
}

pub trait StatementHandle: Closeable {
    /// Drivers that rewrite escape syntax (`{fn ...}`, `{d ...}`) may turn it
    /// off for texts that carry literal `?` characters.
    fn set_escape_processing(&mut self, _enabled: bool) {}

    fn execute(&mut self, sql: &str) -> Result<(), DriverError>;

    fn execute_query(&mut self, sql: &str) -> Result<Box<dyn Cursor + '_>, DriverError>;

    /// Returns the number of affected rows
    fn execute_update(&mut self, sql: &str) -> Result<u64, DriverError>;
}

pub trait CallableHandle: Closeable {
    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>, DriverError>;
}

pub trait PreparedHandle: Closeable {
    /// Binds a parameter at 1-based `index`
    fn bind(&mut self, index: usize, value: &Value) -> Result<(), DriverError>;

    fn execute_update(&mut self) -> Result<u64, DriverError>;

    fn execute(&mut self) -> Result<(), DriverError> {
        self.execute_update().map(|_| ())
    }
}

/// Forward-only result cursor.
pub trait Cursor: Closeable {
    fn columns(&self) -> &[String];

    /// Advances the cursor; `None` once exhausted
    fn next_row(&mut self) -> Result<Option<Row>, DriverError>;
}

/// Connection used when no database is reachable (e.g. SQL-output runs).
/// Every executor operation against it fails with `ConnectionUnavailable`.
#[derive(Debug, Clone)]
pub struct OfflineConnection {
    url: String,
}

impl OfflineConnection {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Connection for OfflineConnection {
    fn target(&self) -> &str {
        &self.url
    }

    fn is_offline(&self) -> bool {
        true
    }

    fn create_statement(&self) -> Result<Box<dyn StatementHandle + '_>, DriverError> {
        Err(DriverError::Closed("offline connection"))
    }

    fn prepare_call(&self, _sql: &str) -> Result<Box<dyn CallableHandle + '_>, DriverError> {
        Err(DriverError::Closed("offline connection"))
    }

    fn prepare_statement(&self, _sql: &str) -> Result<Box<dyn PreparedHandle + '_>, DriverError> {
        Err(DriverError::Closed("offline connection"))
    }
}
