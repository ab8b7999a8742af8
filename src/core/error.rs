use std::fmt;

use thiserror::Error;

/// Low-level failure reported by a connection implementation.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error raised by the database itself, with its SQLSTATE when known
    #[error("{message}")]
    Database {
        sql_state: Option<String>,
        message: String,
    },
    #[error("{0} is already closed")]
    Closed(&'static str),
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            sql_state: None,
            message: message.into(),
        }
    }

    pub fn with_state(sql_state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            sql_state: Some(sql_state.into()),
            message: message.into(),
        }
    }
}

/// A visitor refused to rewrite a fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("SQL visitor '{visitor}' failed: {message}")]
pub struct VisitorError {
    pub visitor: String,
    pub message: String,
}

impl VisitorError {
    pub fn new(visitor: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            visitor: visitor.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConnectionUnavailable,
    AmbiguousFragmentCount,
    UnsupportedOperation,
    DriverFailure,
    EmptyResult,
    NonUniqueResult,
    VisitorFailure,
    TypeMismatch,
    IncorrectColumnCount,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionUnavailable => "connection unavailable",
            Self::AmbiguousFragmentCount => "ambiguous fragment count",
            Self::UnsupportedOperation => "unsupported operation",
            Self::DriverFailure => "driver failure",
            Self::EmptyResult => "empty result",
            Self::NonUniqueResult => "non-unique result",
            Self::VisitorFailure => "visitor failure",
            Self::TypeMismatch => "type mismatch",
            Self::IncorrectColumnCount => "incorrect column count",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only error type callers of the executor see.
///
/// Carries the failure kind, the SQL text(s) that were attempted and the
/// identity of the target connection. Driver and visitor failures are kept
/// as the error `source()`.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ExecutionError {
    kind: ErrorKind,
    message: String,
    sql: Vec<String>,
    target: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ExecutionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            sql: Vec::new(),
            target: None,
            source: None,
        }
    }

    pub fn connection_unavailable(target: &str) -> Self {
        let mut err = Self::new(
            ErrorKind::ConnectionUnavailable,
            format!("Cannot execute commands against an offline database ({target})"),
        );
        err.target = Some(target.to_string());
        err
    }

    /// The connection could not hand out a resource because the target is
    /// unreachable
    pub fn unreachable(cause: DriverError, sql: &[String], target: &str) -> Self {
        Self {
            kind: ErrorKind::ConnectionUnavailable,
            message: format!("Cannot reach {target}: {cause}"),
            sql: sql.to_vec(),
            target: Some(target.to_string()),
            source: Some(Box::new(cause)),
        }
    }

    pub fn ambiguous_fragment_count(operation: &str, sql: &[String]) -> Self {
        let message = match sql.len() {
            0 => format!("Cannot {operation} a statement that renders no SQL"),
            n => format!("Cannot {operation} a statement that renders {n} SQL fragments, exactly one is required"),
        };
        let mut err = Self::new(ErrorKind::AmbiguousFragmentCount, message);
        err.sql = sql.to_vec();
        err
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedOperation, message)
    }

    /// Translation point for driver failures: wraps `cause` with the SQL that
    /// was attempted and the target it was sent to.
    pub fn driver(cause: DriverError, sql: &[String], target: &str) -> Self {
        Self {
            kind: ErrorKind::DriverFailure,
            message: driver_message(sql, target, &cause),
            sql: sql.to_vec(),
            target: Some(target.to_string()),
            source: Some(Box::new(cause)),
        }
    }

    pub fn visitor(cause: VisitorError) -> Self {
        Self {
            kind: ErrorKind::VisitorFailure,
            message: cause.to_string(),
            sql: Vec::new(),
            target: None,
            source: Some(Box::new(cause)),
        }
    }

    pub fn empty_result() -> Self {
        Self::new(
            ErrorKind::EmptyResult,
            "Incorrect result size: expected 1, actual 0",
        )
    }

    pub fn non_unique_result(actual: usize) -> Self {
        Self::new(
            ErrorKind::NonUniqueResult,
            format!("Incorrect result size: expected 1, actual {actual}"),
        )
    }

    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("Cannot convert {found} value to {expected}"),
        )
    }

    pub fn incorrect_column_count(expected: usize, actual: usize) -> Self {
        Self::new(
            ErrorKind::IncorrectColumnCount,
            format!("Incorrect column count: expected {expected}, actual {actual}"),
        )
    }

    /// Attaches execution context to an error raised somewhere it was not
    /// known (extractors, mappers, prepared statements). Context already
    /// present is kept.
    #[must_use]
    pub fn with_context(mut self, sql: &[String], target: &str) -> Self {
        if self.sql.is_empty() {
            self.sql = sql.to_vec();
            if self.kind == ErrorKind::DriverFailure {
                if let Some(cause) = self.driver_error() {
                    self.message = driver_message(sql, target, cause);
                }
            }
        }
        if self.target.is_none() {
            self.target = Some(target.to_string());
        }
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn sql(&self) -> &[String] {
        &self.sql
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// The wrapped driver error, if this failure came from the connection
    pub fn driver_error(&self) -> Option<&DriverError> {
        self.source.as_deref().and_then(|e| e.downcast_ref::<DriverError>())
    }
}

impl From<DriverError> for ExecutionError {
    fn from(cause: DriverError) -> Self {
        Self {
            kind: ErrorKind::DriverFailure,
            message: cause.to_string(),
            sql: Vec::new(),
            target: None,
            source: Some(Box::new(cause)),
        }
    }
}

impl From<VisitorError> for ExecutionError {
    fn from(cause: VisitorError) -> Self {
        Self::visitor(cause)
    }
}

fn driver_message(sql: &[String], target: &str, cause: &DriverError) -> String {
    format!("Error executing SQL {} on {target}: {cause}", sql.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_driver_error_keeps_cause_and_context() {
        let sql = vec!["CREATE TABLE t (id INT)".to_string()];
        let err = ExecutionError::driver(
            DriverError::with_state("42P07", "relation \"t\" already exists"),
            &sql,
            "postgrustql://localhost:5432/app",
        );

        assert_eq!(err.kind(), ErrorKind::DriverFailure);
        assert_eq!(err.sql(), sql.as_slice());
        assert_eq!(err.target(), Some("postgrustql://localhost:5432/app"));
        assert_eq!(
            err.to_string(),
            "Error executing SQL CREATE TABLE t (id INT) on postgrustql://localhost:5432/app: relation \"t\" already exists"
        );
        assert!(matches!(
            err.driver_error(),
            Some(DriverError::Database { sql_state: Some(state), .. }) if state == "42P07"
        ));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_with_context_rewrites_bare_driver_failure() {
        let err: ExecutionError = DriverError::Closed("cursor").into();
        assert!(err.sql().is_empty());

        let sql = vec!["SELECT 1".to_string()];
        let err = err.with_context(&sql, "db");
        assert_eq!(err.sql(), sql.as_slice());
        assert_eq!(err.target(), Some("db"));
        assert_eq!(err.to_string(), "Error executing SQL SELECT 1 on db: cursor is already closed");
    }

    #[test]
    fn test_with_context_keeps_existing_context() {
        let first = vec!["SELECT 1".to_string()];
        let err = ExecutionError::driver(DriverError::database("boom"), &first, "a")
            .with_context(&["SELECT 2".to_string()], "b");
        assert_eq!(err.sql(), first.as_slice());
        assert_eq!(err.target(), Some("a"));
    }

    #[test]
    fn test_non_driver_errors_have_no_driver_cause() {
        let err = ExecutionError::non_unique_result(2);
        assert_eq!(err.kind(), ErrorKind::NonUniqueResult);
        assert!(err.driver_error().is_none());
        assert_eq!(err.to_string(), "Incorrect result size: expected 1, actual 2");
    }
}
