use std::collections::VecDeque;
use std::sync::Arc;

use super::{Closeable, Cursor};
use crate::core::{DriverError, Row, Value};

/// Cursor over rows already buffered in memory.
///
/// Drivers that fetch whole result sets up front can return this directly.
#[derive(Debug, Clone)]
pub struct VecCursor {
    columns: Arc<[String]>,
    rows: VecDeque<Vec<Value>>,
    closed: bool,
}

impl VecCursor {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: rows.into(),
            closed: false,
        }
    }

    /// Single-column cursor, handy for scalar results
    pub fn scalar(column: &str, values: Vec<Value>) -> Self {
        Self::new([column], values.into_iter().map(|v| vec![v]).collect())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Closeable for VecCursor {
    fn resource_name(&self) -> &'static str {
        "cursor"
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Closed("cursor"));
        }
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}

impl Cursor for VecCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>, DriverError> {
        if self.closed {
            return Err(DriverError::Closed("cursor"));
        }
        Ok(self
            .rows
            .pop_front()
            .map(|values| Row::new(Arc::clone(&self.columns), values)))
    }
}
