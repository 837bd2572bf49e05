use crate::core::{PurgeError, Result, Row, Schema, Value};
use std::collections::HashSet;

/// Row predicate evaluated against a table schema.
///
/// The engine selects work by key sets and timestamp windows only, so a
/// small closed predicate tree replaces a general expression evaluator.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches every row.
    All,
    Eq(String, Value),
    /// Half-open interval: from <= column < to.
    Range {
        column: String,
        from: Value,
        to: Value,
    },
    /// column IN (set). An empty set matches nothing.
    InList(String, HashSet<Value>),
    /// Composite-key membership: (col_a, col_b) IN (pairs).
    InPairs(String, String, HashSet<(Value, Value)>),
    And(Vec<Filter>),
}

impl Filter {
    pub fn matches(&self, row: &Row, schema: &Schema) -> Result<bool> {
        match self {
            Filter::All => Ok(true),

            Filter::Eq(column, value) => {
                let cell = cell(row, schema, column)?;
                if cell.is_null() || value.is_null() {
                    return Ok(false);
                }
                Ok(cell == value)
            }

            Filter::Range { column, from, to } => {
                let cell = cell(row, schema, column)?;
                if cell.is_null() {
                    return Ok(false);
                }
                let ge_from = cell.compare(from)? != std::cmp::Ordering::Less;
                let lt_to = cell.compare(to)? == std::cmp::Ordering::Less;
                Ok(ge_from && lt_to)
            }

            Filter::InList(column, set) => {
                let cell = cell(row, schema, column)?;
                if cell.is_null() {
                    return Ok(false);
                }
                Ok(set.contains(cell))
            }

            Filter::InPairs(col_a, col_b, pairs) => {
                let a = cell(row, schema, col_a)?;
                let b = cell(row, schema, col_b)?;
                if a.is_null() || b.is_null() {
                    return Ok(false);
                }
                Ok(pairs.contains(&(a.clone(), b.clone())))
            }

            Filter::And(filters) => {
                for f in filters {
                    if !f.matches(row, schema)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

fn cell<'a>(row: &'a Row, schema: &Schema, column: &str) -> Result<&'a Value> {
    let idx = schema
        .find_column_index(column)
        .ok_or_else(|| PurgeError::ColumnNotFound(column.to_string(), "<filter>".to_string()))?;
    row.get(idx).ok_or_else(|| {
        PurgeError::ConstraintViolation(format!("Row is missing column '{}'", column))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType};
    use chrono::{TimeZone, Utc};

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("id", DataType::Integer),
            Column::new("ts", DataType::Timestamp),
        ])
    }

    fn ts(year: i32) -> Value {
        Value::Timestamp(Utc.with_ymd_and_hms(year, 6, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_eq_and_null() {
        let s = schema();
        let row = vec![Value::Integer(7), ts(2024)];
        assert!(Filter::Eq("id".into(), Value::Integer(7))
            .matches(&row, &s)
            .unwrap());
        let null_row = vec![Value::Null, ts(2024)];
        assert!(!Filter::Eq("id".into(), Value::Integer(7))
            .matches(&null_row, &s)
            .unwrap());
    }

    #[test]
    fn test_range_half_open() {
        let s = schema();
        let row = vec![Value::Integer(1), ts(2024)];
        let hit = Filter::Range {
            column: "ts".into(),
            from: ts(2024),
            to: ts(2025),
        };
        let miss = Filter::Range {
            column: "ts".into(),
            from: ts(2022),
            to: ts(2024),
        };
        assert!(hit.matches(&row, &s).unwrap());
        // Upper bound is exclusive.
        assert!(!miss.matches(&row, &s).unwrap());
    }

    #[test]
    fn test_in_pairs() {
        let s = schema();
        let row = vec![Value::Integer(1), ts(2024)];
        let mut pairs = HashSet::new();
        pairs.insert((Value::Integer(1), ts(2024)));
        assert!(Filter::InPairs("id".into(), "ts".into(), pairs.clone())
            .matches(&row, &s)
            .unwrap());
        let other = vec![Value::Integer(2), ts(2024)];
        assert!(!Filter::InPairs("id".into(), "ts".into(), pairs)
            .matches(&other, &s)
            .unwrap());
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let s = schema();
        let row = vec![Value::Integer(1), ts(2024)];
        assert!(!Filter::InList("id".into(), HashSet::new())
            .matches(&row, &s)
            .unwrap());
    }

    #[test]
    fn test_unknown_column_errors() {
        let s = schema();
        let row = vec![Value::Integer(1), ts(2024)];
        assert!(Filter::Eq("nope".into(), Value::Integer(1))
            .matches(&row, &s)
            .is_err());
    }
}
