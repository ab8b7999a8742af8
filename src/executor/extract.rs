//! Result extraction: whole-cursor extractors and per-row mappers.

use std::cell::RefCell;
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Table as ComfyTable};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};
use uuid::Uuid;

use crate::connection::Cursor;
use crate::core::{ExecutionError, Row, Value};

/// Consumes an entire cursor and produces one value.
///
/// The only abstraction allowed to iterate the cursor. The executor closes
/// the cursor afterwards whether or not extraction succeeded.
pub trait ResultSetExtractor<T> {
    fn extract_data(&self, cursor: &mut dyn Cursor) -> Result<T, ExecutionError>;
}

impl<T, F> ResultSetExtractor<T> for F
where
    F: Fn(&mut dyn Cursor) -> Result<T, ExecutionError>,
{
    fn extract_data(&self, cursor: &mut dyn Cursor) -> Result<T, ExecutionError> {
        self(cursor)
    }
}

/// Maps one row to a value. `row_num` counts from 0 in cursor order.
pub trait RowMapper<T> {
    fn map_row(&self, row: &Row, row_num: usize) -> Result<T, ExecutionError>;
}

impl<T, F> RowMapper<T> for F
where
    F: Fn(&Row, usize) -> Result<T, ExecutionError>,
{
    fn map_row(&self, row: &Row, row_num: usize) -> Result<T, ExecutionError> {
        self(row, row_num)
    }
}

/// Processes rows for side effects only.
pub trait RowCallbackHandler {
    fn process_row(&mut self, row: &Row) -> Result<(), ExecutionError>;
}

impl<F> RowCallbackHandler for F
where
    F: FnMut(&Row) -> Result<(), ExecutionError>,
{
    fn process_row(&mut self, row: &Row) -> Result<(), ExecutionError> {
        self(row)
    }
}

/// Applies a [`RowMapper`] to every row, keeping cursor order.
/// An empty cursor yields an empty `Vec`.
pub struct RowMapperExtractor<'m, T, M: RowMapper<T> + ?Sized> {
    mapper: &'m M,
    _marker: PhantomData<fn() -> T>,
}

impl<'m, T, M: RowMapper<T> + ?Sized> RowMapperExtractor<'m, T, M> {
    pub const fn new(mapper: &'m M) -> Self {
        Self {
            mapper,
            _marker: PhantomData,
        }
    }
}

impl<T, M: RowMapper<T> + ?Sized> ResultSetExtractor<Vec<T>> for RowMapperExtractor<'_, T, M> {
    fn extract_data(&self, cursor: &mut dyn Cursor) -> Result<Vec<T>, ExecutionError> {
        let mut results = Vec::new();
        while let Some(row) = cursor.next_row()? {
            results.push(self.mapper.map_row(&row, results.len())?);
        }
        Ok(results)
    }
}

/// Maps every row and requires exactly one of them.
pub struct SingleResultExtractor<'m, T, M: RowMapper<T> + ?Sized> {
    rows: RowMapperExtractor<'m, T, M>,
}

impl<'m, T, M: RowMapper<T> + ?Sized> SingleResultExtractor<'m, T, M> {
    pub const fn new(mapper: &'m M) -> Self {
        Self {
            rows: RowMapperExtractor::new(mapper),
        }
    }
}

impl<T, M: RowMapper<T> + ?Sized> ResultSetExtractor<T> for SingleResultExtractor<'_, T, M> {
    fn extract_data(&self, cursor: &mut dyn Cursor) -> Result<T, ExecutionError> {
        required_single_result(self.rows.extract_data(cursor)?)
    }
}

/// Feeds every row to a [`RowCallbackHandler`].
pub struct RowCallbackExtractor<'h, H: RowCallbackHandler + ?Sized> {
    handler: RefCell<&'h mut H>,
}

impl<'h, H: RowCallbackHandler + ?Sized> RowCallbackExtractor<'h, H> {
    pub fn new(handler: &'h mut H) -> Self {
        Self {
            handler: RefCell::new(handler),
        }
    }
}

impl<H: RowCallbackHandler + ?Sized> ResultSetExtractor<usize> for RowCallbackExtractor<'_, H> {
    /// Returns the number of rows processed
    fn extract_data(&self, cursor: &mut dyn Cursor) -> Result<usize, ExecutionError> {
        let mut handler = self.handler.borrow_mut();
        let mut processed = 0;
        while let Some(row) = cursor.next_row()? {
            handler.process_row(&row)?;
            processed += 1;
        }
        Ok(processed)
    }
}

/// Renders the whole cursor as a text table, for diagnostics output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableExtractor;

impl ResultSetExtractor<String> for TableExtractor {
    fn extract_data(&self, cursor: &mut dyn Cursor) -> Result<String, ExecutionError> {
        let mut table = ComfyTable::new();
        table.load_preset(UTF8_FULL);
        table.set_header(cursor.columns().iter().map(Cell::new));

        let mut count = 0;
        while let Some(row) = cursor.next_row()? {
            table.add_row(row.values.iter().map(Cell::new));
            count += 1;
        }

        if count == 0 {
            return Ok("(0 rows)\n".to_string());
        }
        Ok(format!("{table}\n({count} rows)\n"))
    }
}

/// Requires exactly one element. Never picks the first of many.
pub fn required_single_result<T>(results: Vec<T>) -> Result<T, ExecutionError> {
    let count = results.len();
    let mut iter = results.into_iter();
    match (iter.next(), count) {
        (Some(single), 1) => Ok(single),
        (None, _) => Err(ExecutionError::empty_result()),
        (Some(_), n) => Err(ExecutionError::non_unique_result(n)),
    }
}

/// Scalar coercion from a column value, resolved per target type.
pub trait FromValue: Sized {
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Result<Self, ExecutionError>;
}

fn mismatch<T: FromValue>(value: &Value) -> ExecutionError {
    ExecutionError::type_mismatch(T::TYPE_NAME, value.type_name())
}

impl FromValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Integer(i) => Ok(*i),
            Value::SmallInt(i) => Ok(Self::from(*i)),
            Value::Numeric(d) if d.fract().is_zero() => d.to_i64().ok_or_else(|| mismatch::<Self>(value)),
            Value::Real(r) if r.fract() == 0.0 && r.abs() < 9.2e18 => Ok(*r as Self),
            Value::Text(s) | Value::Char(s) => s.trim().parse().map_err(|_| mismatch::<Self>(value)),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromValue for i32 {
    const TYPE_NAME: &'static str = "i32";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        let wide = i64::from_value(value).map_err(|_| mismatch::<Self>(value))?;
        Self::try_from(wide).map_err(|_| mismatch::<Self>(value))
    }
}

impl FromValue for i16 {
    const TYPE_NAME: &'static str = "i16";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        let wide = i64::from_value(value).map_err(|_| mismatch::<Self>(value))?;
        Self::try_from(wide).map_err(|_| mismatch::<Self>(value))
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Real(r) => Ok(*r),
            Value::Integer(i) => Ok(*i as Self),
            Value::SmallInt(i) => Ok(Self::from(*i)),
            Value::Numeric(d) => d.to_f64().ok_or_else(|| mismatch::<Self>(value)),
            Value::Text(s) | Value::Char(s) => s.trim().parse().map_err(|_| mismatch::<Self>(value)),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::Integer(0) | Value::SmallInt(0) => Ok(false),
            Value::Integer(1) | Value::SmallInt(1) => Ok(true),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Null => Err(mismatch::<Self>(value)),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for Decimal {
    const TYPE_NAME: &'static str = "Decimal";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Numeric(d) => Ok(*d),
            Value::Integer(i) => Ok(Self::from(*i)),
            Value::SmallInt(i) => Ok(Self::from(*i)),
            Value::Real(r) => Self::try_from(*r).map_err(|_| mismatch::<Self>(value)),
            Value::Text(s) | Value::Char(s) => s.trim().parse().map_err(|_| mismatch::<Self>(value)),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromValue for NaiveDate {
    const TYPE_NAME: &'static str = "NaiveDate";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::Timestamp(ts) => Ok(ts.date()),
            Value::Text(s) => Self::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| mismatch::<Self>(value)),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromValue for NaiveDateTime {
    const TYPE_NAME: &'static str = "NaiveDateTime";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            Value::TimestampTz(ts) => Ok(ts.naive_utc()),
            Value::Date(d) => d.and_hms_opt(0, 0, 0).ok_or_else(|| mismatch::<Self>(value)),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    const TYPE_NAME: &'static str = "DateTime<Utc>";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::TimestampTz(ts) => Ok(*ts),
            Value::Timestamp(ts) => Ok(ts.and_utc()),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromValue for Uuid {
    const TYPE_NAME: &'static str = "Uuid";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Uuid(u) => Ok(*u),
            Value::Text(s) => Self::parse_str(s.trim()).map_err(|_| mismatch::<Self>(value)),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromValue for Vec<u8> {
    const TYPE_NAME: &'static str = "Vec<u8>";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Bytea(b) => Ok(b.clone()),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl FromValue for serde_json::Value {
    const TYPE_NAME: &'static str = "JSON";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        Ok(value.to_json())
    }
}

impl FromValue for Value {
    const TYPE_NAME: &'static str = "Value";

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_value(value: &Value) -> Result<Self, ExecutionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Reads column 1 of a single-column row and coerces it to `T`.
pub struct SingleColumnRowMapper<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromValue> SingleColumnRowMapper<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: FromValue> Default for SingleColumnRowMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FromValue> RowMapper<T> for SingleColumnRowMapper<T> {
    fn map_row(&self, row: &Row, _row_num: usize) -> Result<T, ExecutionError> {
        if row.len() != 1 {
            return Err(ExecutionError::incorrect_column_count(1, row.len()));
        }
        match row.get(1) {
            Some(value) => T::from_value(value),
            None => Err(ExecutionError::incorrect_column_count(1, 0)),
        }
    }
}

/// Row as an ordered column-label → value mapping.
///
/// Lookups ignore ASCII case. When a result has two columns with the same
/// label, the later one wins, at the position of the first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnMap {
    entries: Vec<(String, Value)>,
}

impl ColumnMap {
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&column))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for ColumnMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, &value.to_json())?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnMapRowMapper;

impl RowMapper<ColumnMap> for ColumnMapRowMapper {
    fn map_row(&self, row: &Row, _row_num: usize) -> Result<ColumnMap, ExecutionError> {
        let mut map = ColumnMap::default();
        for (column, value) in row.iter() {
            map.insert(column, value.clone());
        }
        Ok(map)
    }
}
