use std::sync::Arc;

use super::value::Value;

/// One positioned row of a result cursor.
///
/// Column labels are shared between all rows of the same cursor, so building
/// a row only allocates its values. Positional access is 1-based to match
/// the column numbering drivers report.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Convenience constructor for ad-hoc rows (tests, fake drivers)
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at 1-based column position
    pub fn get(&self, position: usize) -> Option<&Value> {
        position.checked_sub(1).and_then(|i| self.values.get(i))
    }

    /// Value by column label, compared case-insensitively
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|i| self.values.get(i))
    }

    /// Iterates `(label, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}
