// PostgrustSQL executor - statement execution and result mapping for migrations
// Runs caller-built statements over a borrowed connection, one strategy per statement shape

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::float_cmp)]
#![allow(clippy::option_if_let_else)]

// Values, rows and the error domain
pub mod core;

// Collaborator contracts: connection, handles, cursors, scoped release
pub mod connection;

// Statement model (plain, parameterized, callable) and script splitting
pub mod statement;

// SQL visitor pipeline
pub mod visitor;

// Dialect identity and quirk hooks
pub mod dialect;

// Dispatcher, execution strategies, result extraction
pub mod executor;

// Observability port
pub mod observer;

// Configuration loading
pub mod settings;

// Re-export commonly used types for convenience
pub use crate::core::{DriverError, ErrorKind, ExecutionError, Row, Value, VisitorError};
pub use crate::connection::{Connection, Cursor, OfflineConnection, VecCursor};
pub use crate::statement::{CallableStatement, Operation, ParameterizedStatement, PlainStatement, ScriptError, SqlStatement};
pub use crate::visitor::SqlVisitor;
pub use crate::dialect::{DialectKind, QuirkHooks};
pub use crate::executor::{ColumnMap, Executor, ResultSetExtractor, RowMapper};
pub use crate::observer::{ExecutionObserver, TracingObserver};
pub use crate::settings::ExecutorSettings;
