/// Executor module - runs `SqlStatement`s against a borrowed connection
///
/// Structure:
/// - dispatcher: variant/operation → strategy routing
/// - strategy: direct, callable and prepared execution with scoped handles
/// - extract: result extractors, row mappers and scalar coercion
pub mod dispatcher;
pub mod extract;
pub mod strategy;

pub use dispatcher::{dispatch, Route};
pub use extract::{
    required_single_result, ColumnMap, ColumnMapRowMapper, FromValue, ResultSetExtractor,
    RowCallbackExtractor, RowCallbackHandler, RowMapper, RowMapperExtractor,
    SingleColumnRowMapper, SingleResultExtractor, TableExtractor,
};

use crate::connection::Connection;
use crate::core::ExecutionError;
use crate::dialect::{quirks_for, DialectKind, NoQuirks, QuirkHooks};
use crate::observer::{ExecutionObserver, TracingObserver};
use crate::settings::ExecutorSettings;
use crate::statement::{Operation, SqlStatement};
use crate::visitor::SqlVisitor;

use strategy::{CallableQuery, Context, DirectExecute, DirectQuery, DirectUpdate, PreparedExecute};

/// Synchronous statement executor bound to one caller-owned connection.
///
/// Holds no state between calls besides its configuration. Not meant to be
/// shared across threads; callers serialize access to a connection themselves.
pub struct Executor<'c> {
    connection: &'c dyn Connection,
    quirks: Box<dyn QuirkHooks>,
    observer: Box<dyn ExecutionObserver>,
    disable_escape_on_placeholder: bool,
}

impl<'c> Executor<'c> {
    pub fn new(connection: &'c dyn Connection) -> Self {
        Self {
            connection,
            quirks: Box::new(NoQuirks(DialectKind::Generic)),
            observer: Box::new(TracingObserver),
            disable_escape_on_placeholder: true,
        }
    }

    pub fn from_settings(connection: &'c dyn Connection, settings: &ExecutorSettings) -> Self {
        Self {
            connection,
            quirks: quirks_for(settings.dialect, settings.default_schema.as_deref()),
            observer: Box::new(TracingObserver),
            disable_escape_on_placeholder: settings.disable_escape_processing_on_placeholder,
        }
    }

    #[must_use]
    pub fn with_quirks(mut self, quirks: Box<dyn QuirkHooks>) -> Self {
        self.quirks = quirks;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn dialect(&self) -> DialectKind {
        self.quirks.dialect()
    }

    pub fn target(&self) -> &str {
        self.connection.target()
    }

    /// This executor writes to a live database
    pub const fn updates_database(&self) -> bool {
        true
    }

    pub fn comment(&self, message: &str) {
        self.observer.on_comment(message);
    }

    fn context(&self) -> Context<'_> {
        Context {
            connection: self.connection,
            quirks: self.quirks.as_ref(),
            observer: self.observer.as_ref(),
            disable_escape_on_placeholder: self.disable_escape_on_placeholder,
        }
    }

    fn route(&self, statement: &SqlStatement, operation: Operation) -> Result<Route, ExecutionError> {
        dispatch(statement, operation).map_err(|e| e.with_context(&statement.raw_fragments(), self.target()))
    }

    /// Runs every fragment of the statement; parameterized statements run
    /// themselves.
    pub fn execute(
        &self,
        statement: &SqlStatement,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<(), ExecutionError> {
        let ctx = self.context();
        match self.route(statement, Operation::Execute)? {
            Route::Prepared => PreparedExecute { statement }.run(&ctx),
            Route::Direct => DirectExecute { statement, visitors }.run(&ctx),
            Route::Callable => Err(ExecutionError::unsupported("Cannot execute a CallableStatement")
                .with_context(&statement.raw_fragments(), self.target())),
        }
    }

    pub fn query<T, E>(
        &self,
        statement: &SqlStatement,
        extractor: &E,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<T, ExecutionError>
    where
        E: ResultSetExtractor<T> + ?Sized,
    {
        let ctx = self.context();
        match self.route(statement, Operation::Query)? {
            Route::Direct => DirectQuery { statement, visitors, extractor }.run(&ctx),
            Route::Callable => CallableQuery { statement, visitors, extractor }.run(&ctx),
            Route::Prepared => Err(ExecutionError::unsupported("Cannot query an ExecutableParameterized")
                .with_context(&statement.raw_fragments(), self.target())),
        }
    }

    /// Maps every row; no rows gives an empty `Vec`
    pub fn query_rows<T, M>(
        &self,
        statement: &SqlStatement,
        mapper: &M,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<Vec<T>, ExecutionError>
    where
        M: RowMapper<T> + ?Sized,
    {
        self.query(statement, &RowMapperExtractor::new(mapper), visitors)
    }

    /// Streams rows into `handler`, returning how many it saw
    pub fn query_each<H>(
        &self,
        statement: &SqlStatement,
        handler: &mut H,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<usize, ExecutionError>
    where
        H: RowCallbackHandler + ?Sized,
    {
        self.query(statement, &RowCallbackExtractor::new(handler), visitors)
    }

    /// Exactly one mapped row, or `EmptyResult` / `NonUniqueResult`
    pub fn query_for_object<T, M>(
        &self,
        statement: &SqlStatement,
        mapper: &M,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<T, ExecutionError>
    where
        M: RowMapper<T> + ?Sized,
    {
        self.query(statement, &SingleResultExtractor::new(mapper), visitors)
    }

    /// Single-row, single-column result coerced to `T`. Use `Option<T>` to
    /// accept NULL.
    pub fn query_for_scalar<T: FromValue>(
        &self,
        statement: &SqlStatement,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<T, ExecutionError> {
        self.query_for_object(statement, &SingleColumnRowMapper::<T>::new(), visitors)
    }

    /// Count-style query. A NULL result reads as 0.
    pub fn query_for_long(
        &self,
        statement: &SqlStatement,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<i64, ExecutionError> {
        let value: Option<i64> = self.query_for_scalar(statement, visitors)?;
        Ok(value.unwrap_or(0))
    }

    /// Count-style query. A NULL result reads as 0.
    pub fn query_for_int(
        &self,
        statement: &SqlStatement,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<i32, ExecutionError> {
        let value: Option<i32> = self.query_for_scalar(statement, visitors)?;
        Ok(value.unwrap_or(0))
    }

    /// One coerced value per row of a single-column result
    pub fn query_for_list<T: FromValue>(
        &self,
        statement: &SqlStatement,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<Vec<T>, ExecutionError> {
        self.query_rows(statement, &SingleColumnRowMapper::<T>::new(), visitors)
    }

    pub fn query_for_maps(
        &self,
        statement: &SqlStatement,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<Vec<ColumnMap>, ExecutionError> {
        self.query_rows(statement, &ColumnMapRowMapper, visitors)
    }

    /// Returns the affected row count of a single-fragment statement
    pub fn update(
        &self,
        statement: &SqlStatement,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<u64, ExecutionError> {
        let ctx = self.context();
        match self.route(statement, Operation::Update)? {
            Route::Direct => DirectUpdate { statement, visitors }.run(&ctx),
            Route::Prepared | Route::Callable => Err(ExecutionError::unsupported(format!(
                "Cannot update a {}",
                statement.variant_name()
            ))
            .with_context(&statement.raw_fragments(), self.target())),
        }
    }
}
