// Module declarations
pub mod error;
pub mod value;
pub mod row;

// Re-exports for convenience
pub use error::{DriverError, ErrorKind, ExecutionError, VisitorError};
pub use value::Value;
pub use row::Row;
