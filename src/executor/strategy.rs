//! Execution strategies. Each one owns the lifecycle of the handles it
//! acquires: they are wrapped in [`Scoped`] guards immediately and released
//! on every exit path.

use crate::connection::{Connection, StatementHandle, Scoped};
use crate::core::{DriverError, ExecutionError};
use crate::dialect::QuirkHooks;
use crate::observer::ExecutionObserver;
use crate::statement::{Operation, PreparedStatementFactory, SqlStatement};
use crate::visitor::SqlVisitor;

use super::extract::ResultSetExtractor;

/// What every strategy needs from the executor for one call.
pub struct Context<'a> {
    pub connection: &'a dyn Connection,
    pub quirks: &'a dyn QuirkHooks,
    pub observer: &'a dyn ExecutionObserver,
    pub disable_escape_on_placeholder: bool,
}

impl<'a> Context<'a> {
    fn target(&self) -> &'a str {
        self.connection.target()
    }

    fn ensure_online(&self) -> Result<(), ExecutionError> {
        if self.connection.is_offline() {
            return Err(ExecutionError::connection_unavailable(self.target()));
        }
        Ok(())
    }

    fn render(
        &self,
        statement: &SqlStatement,
        visitors: &[Box<dyn SqlVisitor>],
    ) -> Result<Vec<String>, ExecutionError> {
        statement
            .render(visitors, self.quirks.dialect())
            .map_err(|e| ExecutionError::visitor(e).with_context(&statement.raw_fragments(), self.target()))
    }

    fn wrap(&self, cause: DriverError, sql: &[String]) -> ExecutionError {
        ExecutionError::driver(cause, sql, self.target())
    }

    fn acquire_error(&self, cause: DriverError, sql: &[String]) -> ExecutionError {
        match cause {
            DriverError::Io(_) => ExecutionError::unreachable(cause, sql, self.target()),
            other => self.wrap(other, sql),
        }
    }

    fn acquire_statement(&self, sql: &[String]) -> Result<Scoped<'a, dyn StatementHandle + 'a>, ExecutionError> {
        let handle = self
            .connection
            .create_statement()
            .map_err(|e| self.acquire_error(e, sql))?;
        Ok(Scoped::new(handle, self.observer))
    }

    /// Runs the dialect's session setup on `stmt`, if it has one
    fn run_setup<H: StatementHandle + ?Sized>(&self, stmt: &mut H, sql: &[String]) -> Result<(), ExecutionError> {
        if let Some(setup) = self.quirks.pre_execute_hook() {
            self.observer.on_command("SETUP", &setup);
            stmt.execute(&setup).map_err(|e| {
                let attempted: Vec<String> = std::iter::once(setup.clone()).chain(sql.iter().cloned()).collect();
                self.wrap(e, &attempted)
            })?;
        }
        Ok(())
    }
}

fn single_fragment<'s>(sql: &'s [String], operation: Operation, target: &str) -> Result<&'s str, ExecutionError> {
    match sql {
        [only] => Ok(only),
        _ => Err(ExecutionError::ambiguous_fragment_count(operation.as_str(), sql).with_context(sql, target)),
    }
}

/// Runs every rendered fragment, in order, through one statement handle.
pub struct DirectExecute<'s> {
    pub statement: &'s SqlStatement,
    pub visitors: &'s [Box<dyn SqlVisitor>],
}

impl DirectExecute<'_> {
    pub fn run(&self, ctx: &Context<'_>) -> Result<(), ExecutionError> {
        ctx.ensure_online()?;
        let sql = ctx.render(self.statement, self.visitors)?;
        let mut stmt = ctx.acquire_statement(&sql)?;

        for fragment in &sql {
            let fragment = ctx.quirks.rewrite_for_execute(fragment);
            ctx.observer.on_command("EXECUTE", &fragment);
            if ctx.disable_escape_on_placeholder && fragment.contains('?') {
                stmt.set_escape_processing(false);
            }
            ctx.run_setup(&mut *stmt, &sql)?;
            stmt.execute(&fragment).map_err(|e| ctx.wrap(e, &sql))?;
        }
        Ok(())
    }
}

/// Runs the single rendered fragment and hands its cursor to the extractor.
pub struct DirectQuery<'s, E: ?Sized> {
    pub statement: &'s SqlStatement,
    pub visitors: &'s [Box<dyn SqlVisitor>],
    pub extractor: &'s E,
}

impl<E: ?Sized> DirectQuery<'_, E> {
    pub fn run<T>(&self, ctx: &Context<'_>) -> Result<T, ExecutionError>
    where
        E: ResultSetExtractor<T>,
    {
        ctx.ensure_online()?;
        let sql = ctx.render(self.statement, self.visitors)?;
        let query = single_fragment(&sql, Operation::Query, ctx.target())?;
        let mut stmt = ctx.acquire_statement(&sql)?;

        ctx.run_setup(&mut *stmt, &sql)?;
        ctx.observer.on_command("QUERY", query);
        let cursor = stmt.execute_query(query).map_err(|e| ctx.wrap(e, &sql))?;
        let mut cursor = Scoped::new(cursor, ctx.observer);

        self.extractor
            .extract_data(&mut *cursor)
            .map_err(|e| e.with_context(&sql, ctx.target()))
    }
}

/// Runs the single rendered fragment and reports the affected row count.
pub struct DirectUpdate<'s> {
    pub statement: &'s SqlStatement,
    pub visitors: &'s [Box<dyn SqlVisitor>],
}

impl DirectUpdate<'_> {
    pub fn run(&self, ctx: &Context<'_>) -> Result<u64, ExecutionError> {
        ctx.ensure_online()?;
        let sql = ctx.render(self.statement, self.visitors)?;
        let update = single_fragment(&sql, Operation::Update, ctx.target())?;
        let mut stmt = ctx.acquire_statement(&sql)?;

        ctx.run_setup(&mut *stmt, &sql)?;
        ctx.observer.on_command("UPDATE", update);
        stmt.execute_update(update).map_err(|e| ctx.wrap(e, &sql))
    }
}

/// Calls a stored procedure and hands its cursor to the extractor.
pub struct CallableQuery<'s, E: ?Sized> {
    pub statement: &'s SqlStatement,
    pub visitors: &'s [Box<dyn SqlVisitor>],
    pub extractor: &'s E,
}

impl<E: ?Sized> CallableQuery<'_, E> {
    pub fn run<T>(&self, ctx: &Context<'_>) -> Result<T, ExecutionError>
    where
        E: ResultSetExtractor<T>,
    {
        ctx.ensure_online()?;
        let sql = ctx.render(self.statement, self.visitors)?;
        let call_sql = single_fragment(&sql, Operation::Query, ctx.target())?;

        let call = ctx
            .connection
            .prepare_call(call_sql)
            .map_err(|e| ctx.acquire_error(e, &sql))?;
        let mut call = Scoped::new(call, ctx.observer);

        if ctx.quirks.pre_execute_hook().is_some() {
            let mut setup = ctx.acquire_statement(&sql)?;
            ctx.run_setup(&mut *setup, &sql)?;
        }

        ctx.observer.on_command("CALL", call_sql);
        let cursor = call.execute_query().map_err(|e| ctx.wrap(e, &sql))?;
        let mut cursor = Scoped::new(cursor, ctx.observer);

        self.extractor
            .extract_data(&mut *cursor)
            .map_err(|e| e.with_context(&sql, ctx.target()))
    }
}

/// Delegates to a self-executing statement through a factory bound to the
/// connection. No visitors, no rendering.
pub struct PreparedExecute<'s> {
    pub statement: &'s SqlStatement,
}

impl PreparedExecute<'_> {
    pub fn run(&self, ctx: &Context<'_>) -> Result<(), ExecutionError> {
        let SqlStatement::Prepared(prepared) = self.statement else {
            return Err(ExecutionError::unsupported(format!(
                "{} cannot run through the prepared strategy",
                self.statement.variant_name()
            ))
            .with_context(&self.statement.raw_fragments(), ctx.target()));
        };

        ctx.ensure_online()?;
        let factory = PreparedStatementFactory::new(ctx.connection, ctx.observer);
        prepared
            .execute(&factory)
            .map_err(|e| e.with_context(&prepared.sql(), ctx.target()))
    }
}
