// Shared fixtures for executor integration tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use postgrustql_exec::connection::{
    CallableHandle, Closeable, Connection, Cursor, PreparedHandle, StatementHandle,
};
use postgrustql_exec::{DriverError, ExecutionObserver, Row, Value, VecCursor};

/// Everything the fake connection saw, in order.
#[derive(Debug, Default)]
pub struct Journal {
    pub acquired: usize,
    pub released: usize,
    /// SQL texts sent for execution (setup statements included)
    pub executed: Vec<String>,
    /// Texts executed while escape processing was off
    pub escape_off: Vec<String>,
    pub prepared: Vec<String>,
    pub calls: Vec<String>,
    pub bound: Vec<(usize, Value)>,
}

#[derive(Default)]
struct Script {
    results: VecDeque<VecCursor>,
    update_count: u64,
    fail_on: Vec<(String, String)>,
    refuse_acquire: bool,
    fail_close: bool,
}

/// In-memory connection that counts every acquire and release.
pub struct FakeConnection {
    target: String,
    offline: bool,
    journal: RefCell<Journal>,
    script: RefCell<Script>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self {
            target: "fake://test".to_string(),
            offline: false,
            journal: RefCell::new(Journal::default()),
            script: RefCell::new(Script::default()),
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new()
        }
    }

    /// Queues a result set for the next query or call
    pub fn returning(self, cursor: VecCursor) -> Self {
        self.script.borrow_mut().results.push_back(cursor);
        self
    }

    pub fn with_update_count(self, count: u64) -> Self {
        self.script.borrow_mut().update_count = count;
        self
    }

    /// Any SQL containing `needle` fails with a database error
    pub fn failing_on(self, needle: &str, message: &str) -> Self {
        self.script
            .borrow_mut()
            .fail_on
            .push((needle.to_string(), message.to_string()));
        self
    }

    /// Resource acquisition fails with an I/O error
    pub fn unreachable(self) -> Self {
        self.script.borrow_mut().refuse_acquire = true;
        self
    }

    /// Every close reports a failure
    pub fn failing_close(self) -> Self {
        self.script.borrow_mut().fail_close = true;
        self
    }

    pub fn journal(&self) -> std::cell::Ref<'_, Journal> {
        self.journal.borrow()
    }

    fn acquire(&self) -> Result<(), DriverError> {
        if self.script.borrow().refuse_acquire {
            return Err(DriverError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        self.journal.borrow_mut().acquired += 1;
        Ok(())
    }

    fn release(&self) -> Result<(), DriverError> {
        self.journal.borrow_mut().released += 1;
        if self.script.borrow().fail_close {
            return Err(DriverError::database("close failed"));
        }
        Ok(())
    }

    fn check(&self, sql: &str) -> Result<(), DriverError> {
        let script = self.script.borrow();
        match script.fail_on.iter().find(|(needle, _)| sql.contains(needle.as_str())) {
            Some((_, message)) => Err(DriverError::with_state("42000", message.clone())),
            None => Ok(()),
        }
    }

    fn next_cursor(&self) -> Result<Box<dyn Cursor + '_>, DriverError> {
        let inner = self
            .script
            .borrow_mut()
            .results
            .pop_front()
            .unwrap_or_else(|| VecCursor::new(Vec::<String>::new(), Vec::new()));
        self.acquire()?;
        Ok(Box::new(FakeCursor { conn: self, inner }))
    }
}

impl Connection for FakeConnection {
    fn target(&self) -> &str {
        &self.target
    }

    fn is_offline(&self) -> bool {
        self.offline
    }

    fn create_statement(&self) -> Result<Box<dyn StatementHandle + '_>, DriverError> {
        self.acquire()?;
        Ok(Box::new(FakeStatement {
            conn: self,
            escape_processing: true,
        }))
    }

    fn prepare_call(&self, sql: &str) -> Result<Box<dyn CallableHandle + '_>, DriverError> {
        self.acquire()?;
        Ok(Box::new(FakeCall {
            conn: self,
            sql: sql.to_string(),
        }))
    }

    fn prepare_statement(&self, sql: &str) -> Result<Box<dyn PreparedHandle + '_>, DriverError> {
        self.acquire()?;
        self.journal.borrow_mut().prepared.push(sql.to_string());
        Ok(Box::new(FakePrepared {
            conn: self,
            sql: sql.to_string(),
        }))
    }
}

struct FakeStatement<'c> {
    conn: &'c FakeConnection,
    escape_processing: bool,
}

impl FakeStatement<'_> {
    fn record(&self, sql: &str) -> Result<(), DriverError> {
        let mut journal = self.conn.journal.borrow_mut();
        journal.executed.push(sql.to_string());
        if !self.escape_processing {
            journal.escape_off.push(sql.to_string());
        }
        drop(journal);
        self.conn.check(sql)
    }
}

impl Closeable for FakeStatement<'_> {
    fn resource_name(&self) -> &'static str {
        "statement"
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.conn.release()
    }
}

impl StatementHandle for FakeStatement<'_> {
    fn set_escape_processing(&mut self, enabled: bool) {
        self.escape_processing = enabled;
    }

    fn execute(&mut self, sql: &str) -> Result<(), DriverError> {
        self.record(sql)
    }

    fn execute_query(&mut self, sql: &str) -> Result<Box<dyn Cursor + '_>, DriverError> {
        self.record(sql)?;
        self.conn.next_cursor()
    }

    fn execute_update(&mut self, sql: &str) -> Result<u64, DriverError> {
        self.record(sql)?;
        Ok(self.conn.script.borrow().update_count)
    }
}

struct FakeCall<'c> {
    conn: &'c FakeConnection,
    sql: String,
}

impl Closeable for FakeCall<'_> {
    fn resource_name(&self) -> &'static str {
        "call"
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.conn.release()
    }
}

impl CallableHandle for FakeCall<'_> {
    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>, DriverError> {
        self.conn.journal.borrow_mut().calls.push(self.sql.clone());
        self.conn.check(&self.sql)?;
        self.conn.next_cursor()
    }
}

struct FakePrepared<'c> {
    conn: &'c FakeConnection,
    sql: String,
}

impl Closeable for FakePrepared<'_> {
    fn resource_name(&self) -> &'static str {
        "prepared statement"
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.conn.release()
    }
}

impl PreparedHandle for FakePrepared<'_> {
    fn bind(&mut self, index: usize, value: &Value) -> Result<(), DriverError> {
        self.conn.journal.borrow_mut().bound.push((index, value.clone()));
        Ok(())
    }

    fn execute_update(&mut self) -> Result<u64, DriverError> {
        self.conn.journal.borrow_mut().executed.push(self.sql.clone());
        self.conn.check(&self.sql)?;
        Ok(self.conn.script.borrow().update_count)
    }
}

struct FakeCursor<'c> {
    conn: &'c FakeConnection,
    inner: VecCursor,
}

impl Closeable for FakeCursor<'_> {
    fn resource_name(&self) -> &'static str {
        "cursor"
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.inner.close()?;
        self.conn.release()
    }
}

impl Cursor for FakeCursor<'_> {
    fn columns(&self) -> &[String] {
        self.inner.columns()
    }

    fn next_row(&mut self) -> Result<Option<Row>, DriverError> {
        self.inner.next_row()
    }
}

/// Observer that keeps every event for later assertions.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    pub commands: Rc<RefCell<Vec<(String, String)>>>,
    pub comments: Rc<RefCell<Vec<String>>>,
    pub release_failures: Rc<RefCell<Vec<String>>>,
}

impl ExecutionObserver for RecordingObserver {
    fn on_command(&self, operation: &str, sql: &str) {
        self.commands
            .borrow_mut()
            .push((operation.to_string(), sql.to_string()));
    }

    fn on_comment(&self, message: &str) {
        self.comments.borrow_mut().push(message.to_string());
    }

    fn on_release_failure(&self, resource: &'static str, error: &DriverError) {
        self.release_failures
            .borrow_mut()
            .push(format!("{resource}: {error}"));
    }
}

pub fn int_rows(column: &str, values: &[i64]) -> VecCursor {
    VecCursor::scalar(column, values.iter().map(|v| Value::Integer(*v)).collect())
}
