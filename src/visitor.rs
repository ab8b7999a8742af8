//! SQL visitor pipeline: ordered text rewrites applied to every rendered
//! fragment before execution.

use crate::core::VisitorError;
use crate::dialect::DialectKind;

pub trait SqlVisitor {
    fn name(&self) -> &str;

    /// Visitors can be limited to some targets; others skip them
    fn applies_to(&self, _dialect: DialectKind) -> bool {
        true
    }

    fn modify_sql(&self, sql: &str) -> Result<String, VisitorError>;
}

/// Replaces every occurrence of `find` with `replace`.
#[derive(Debug, Clone)]
pub struct ReplaceVisitor {
    pub find: String,
    pub replace: String,
    pub dialects: Vec<DialectKind>,
}

impl ReplaceVisitor {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
            dialects: Vec::new(),
        }
    }

    #[must_use]
    pub fn only_for(mut self, dialects: &[DialectKind]) -> Self {
        self.dialects = dialects.to_vec();
        self
    }
}

impl SqlVisitor for ReplaceVisitor {
    fn name(&self) -> &str {
        "replace"
    }

    fn applies_to(&self, dialect: DialectKind) -> bool {
        self.dialects.is_empty() || self.dialects.contains(&dialect)
    }

    fn modify_sql(&self, sql: &str) -> Result<String, VisitorError> {
        if self.find.is_empty() {
            return Err(VisitorError::new(self.name(), "search text is empty"));
        }
        Ok(sql.replace(&self.find, &self.replace))
    }
}

#[derive(Debug, Clone)]
pub struct AppendVisitor {
    pub value: String,
}

impl AppendVisitor {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

impl SqlVisitor for AppendVisitor {
    fn name(&self) -> &str {
        "append"
    }

    fn modify_sql(&self, sql: &str) -> Result<String, VisitorError> {
        Ok(format!("{sql}{}", self.value))
    }
}

#[derive(Debug, Clone)]
pub struct PrependVisitor {
    pub value: String,
}

impl PrependVisitor {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

impl SqlVisitor for PrependVisitor {
    fn name(&self) -> &str {
        "prepend"
    }

    fn modify_sql(&self, sql: &str) -> Result<String, VisitorError> {
        Ok(format!("{}{sql}", self.value))
    }
}

/// Closure-backed visitor.
pub struct FnVisitor<F> {
    name: String,
    f: F,
}

impl<F> FnVisitor<F>
where
    F: Fn(&str) -> Result<String, VisitorError>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> SqlVisitor for FnVisitor<F>
where
    F: Fn(&str) -> Result<String, VisitorError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn modify_sql(&self, sql: &str) -> Result<String, VisitorError> {
        (self.f)(sql)
    }
}

/// Runs each applicable visitor, in list order, over each fragment.
///
/// Output has exactly as many fragments as input. The first visitor failure
/// aborts the whole rendering.
pub fn apply_visitors(
    fragments: &[String],
    visitors: &[Box<dyn SqlVisitor>],
    dialect: DialectKind,
) -> Result<Vec<String>, VisitorError> {
    let active: Vec<&dyn SqlVisitor> = visitors
        .iter()
        .map(|v| &**v)
        .filter(|v| v.applies_to(dialect))
        .collect();

    fragments
        .iter()
        .map(|fragment| {
            active
                .iter()
                .try_fold(fragment.clone(), |sql, visitor| visitor.modify_sql(&sql))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_visitors_apply_in_list_order() {
        let visitors: Vec<Box<dyn SqlVisitor>> = vec![
            Box::new(AppendVisitor::new(" b")),
            Box::new(PrependVisitor::new("a ")),
            Box::new(ReplaceVisitor::new("a", "x")),
        ];
        let out = apply_visitors(&fragments(&["s"]), &visitors, DialectKind::Generic).unwrap();
        // replace(prepend(append(s)))
        assert_eq!(out, vec!["x s b".to_string()]);

        let reversed: Vec<Box<dyn SqlVisitor>> = vec![
            Box::new(ReplaceVisitor::new("a", "x")),
            Box::new(PrependVisitor::new("a ")),
            Box::new(AppendVisitor::new(" b")),
        ];
        let out = apply_visitors(&fragments(&["s"]), &reversed, DialectKind::Generic).unwrap();
        assert_eq!(out, vec!["a s b".to_string()]);
    }

    #[test]
    fn test_every_fragment_is_visited_and_count_is_kept() {
        let visitors: Vec<Box<dyn SqlVisitor>> = vec![Box::new(AppendVisitor::new(";"))];
        let out = apply_visitors(&fragments(&["one", "two", "three"]), &visitors, DialectKind::Generic)
            .unwrap();
        assert_eq!(out, fragments(&["one;", "two;", "three;"]));

        let none = apply_visitors(&[], &visitors, DialectKind::Generic).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_duplicate_visitors_are_not_collapsed() {
        let visitors: Vec<Box<dyn SqlVisitor>> = vec![
            Box::new(AppendVisitor::new("!")),
            Box::new(AppendVisitor::new("!")),
        ];
        let out = apply_visitors(&fragments(&["hi"]), &visitors, DialectKind::Generic).unwrap();
        assert_eq!(out, fragments(&["hi!!"]));
    }

    #[test]
    fn test_dialect_filter_skips_visitor() {
        let visitors: Vec<Box<dyn SqlVisitor>> = vec![Box::new(
            ReplaceVisitor::new("NOW()", "SYSDATE").only_for(&[DialectKind::Oracle]),
        )];
        let sql = fragments(&["SELECT NOW()"]);
        assert_eq!(
            apply_visitors(&sql, &visitors, DialectKind::Postgres).unwrap(),
            fragments(&["SELECT NOW()"])
        );
        assert_eq!(
            apply_visitors(&sql, &visitors, DialectKind::Oracle).unwrap(),
            fragments(&["SELECT SYSDATE"])
        );
    }

    #[test]
    fn test_failure_aborts_rendering() {
        let visitors: Vec<Box<dyn SqlVisitor>> = vec![
            Box::new(AppendVisitor::new(" x")),
            Box::new(FnVisitor::new("reject", |sql: &str| {
                if sql.contains("DROP") {
                    Err(VisitorError::new("reject", "DROP is not allowed"))
                } else {
                    Ok(sql.to_string())
                }
            })),
        ];
        let err = apply_visitors(&fragments(&["SELECT 1", "DROP TABLE t"]), &visitors, DialectKind::Generic)
            .unwrap_err();
        assert_eq!(err.visitor, "reject");
        assert_eq!(err.message, "DROP is not allowed");
    }
}
