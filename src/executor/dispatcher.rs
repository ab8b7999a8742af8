use crate::core::ExecutionError;
use crate::statement::{Operation, SqlStatement};

/// Execution strategy chosen for a statement/operation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Plain text through a statement handle
    Direct,
    /// Self-executing parameterized statement, bypasses visitors
    Prepared,
    /// Stored-procedure call handle
    Callable,
}

/// Picks the strategy from the statement's variant tag.
///
/// | variant   | execute  | query    | update      |
/// |-----------|----------|----------|-------------|
/// | Plain     | Direct   | Direct   | Direct      |
/// | Prepared  | Prepared | rejected | rejected    |
/// | Callable  | rejected | Callable | rejected    |
///
/// Rejections happen before the connection is touched.
pub fn dispatch(statement: &SqlStatement, operation: Operation) -> Result<Route, ExecutionError> {
    match (statement, operation) {
        (SqlStatement::Plain(_), _) => Ok(Route::Direct),
        (SqlStatement::Prepared(_), Operation::Execute) => Ok(Route::Prepared),
        (SqlStatement::Callable(_), Operation::Query) => Ok(Route::Callable),
        (SqlStatement::Callable(_), Operation::Update) => Err(ExecutionError::unsupported(
            "Direct update using CallableStatement is not supported",
        )),
        (statement, operation) => Err(ExecutionError::unsupported(format!(
            "Cannot {operation} a {}",
            statement.variant_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorKind, Value};
    use crate::statement::ParameterizedStatement;

    fn prepared() -> SqlStatement {
        SqlStatement::prepared(ParameterizedStatement::new("DELETE FROM t WHERE id = $1", vec![Value::Integer(1)]))
    }

    #[test]
    fn test_plain_routes_direct_for_every_operation() {
        let stmt = SqlStatement::plain("SELECT 1");
        for op in [Operation::Execute, Operation::Query, Operation::Update] {
            assert_eq!(dispatch(&stmt, op).unwrap(), Route::Direct);
        }
    }

    #[test]
    fn test_prepared_only_executes() {
        assert_eq!(dispatch(&prepared(), Operation::Execute).unwrap(), Route::Prepared);
        for op in [Operation::Query, Operation::Update] {
            let err = dispatch(&prepared(), op).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        }
    }

    #[test]
    fn test_callable_only_queries() {
        let stmt = SqlStatement::callable("{call refresh()}");
        assert_eq!(dispatch(&stmt, Operation::Query).unwrap(), Route::Callable);

        let err = dispatch(&stmt, Operation::Update).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        assert!(err.to_string().contains("CallableStatement"));

        let err = dispatch(&stmt, Operation::Execute).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        assert_eq!(err.to_string(), "Cannot execute a CallableStatement");
    }
}
