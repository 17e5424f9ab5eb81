use std::sync::Arc;

use async_trait::async_trait;

use crate::coercion::{NativeValue, coerce};
use crate::error::SqlBridgeError;
use crate::results::Row;

/// One cursor row before coercion.
#[derive(Debug)]
pub struct RawRow {
    /// Column labels, positional and possibly repeated
    pub labels: Arc<Vec<String>>,
    pub values: Vec<NativeValue>,
}

/// Driver-side iterator over the rows of an executed statement.
#[async_trait]
pub trait RowCursor: Send {
    /// Advance to the next row; `Ok(None)` once the cursor is exhausted.
    ///
    /// # Errors
    /// Returns a statement failure if the driver cannot fetch the row.
    async fn next_row(&mut self) -> Result<Option<RawRow>, SqlBridgeError>;
}

/// Coerce every value of one raw row, keeping column order.
///
/// # Errors
/// Returns `SqlBridgeError::ConversionFailure` if the row shape does not match its labels or
/// a value cannot be coerced.
pub fn materialize_row(raw: RawRow) -> Result<Row, SqlBridgeError> {
    let RawRow { labels, values } = raw;
    if labels.len() != values.len() {
        return Err(SqlBridgeError::ConversionFailure(format!(
            "row has {} values for {} columns",
            values.len(),
            labels.len()
        )));
    }

    let mut row_values = Vec::with_capacity(values.len());
    for value in values {
        row_values.push(coerce(value)?);
    }
    Ok(Row::new(labels, row_values))
}

/// Drain `cursor`, producing one [`Row`] per result row.
///
/// All or nothing: the first fetch or coercion failure aborts the read and no rows are
/// returned.
///
/// # Errors
/// Returns the first error raised by the cursor or by value coercion.
pub async fn materialize(cursor: &mut (dyn RowCursor + '_)) -> Result<Vec<Row>, SqlBridgeError> {
    let mut rows = Vec::new();
    while let Some(raw) = cursor.next_row().await? {
        rows.push(materialize_row(raw)?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::types::TransportValue;

    struct ScriptedCursor {
        steps: VecDeque<Result<Option<RawRow>, SqlBridgeError>>,
    }

    #[async_trait]
    impl RowCursor for ScriptedCursor {
        async fn next_row(&mut self) -> Result<Option<RawRow>, SqlBridgeError> {
            self.steps.pop_front().unwrap_or(Ok(None))
        }
    }

    fn labels(names: &[&str]) -> Arc<Vec<String>> {
        Arc::new(names.iter().map(ToString::to_string).collect())
    }

    #[tokio::test]
    async fn materializes_rows_in_order() {
        let cols = labels(&["id", "name"]);
        let mut cursor = ScriptedCursor {
            steps: VecDeque::from(vec![
                Ok(Some(RawRow {
                    labels: Arc::clone(&cols),
                    values: vec![NativeValue::Int(1), NativeValue::Text("a".into())],
                })),
                Ok(Some(RawRow {
                    labels: Arc::clone(&cols),
                    values: vec![NativeValue::Int(2), NativeValue::Null],
                })),
            ]),
        };

        let rows = materialize(&mut cursor).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some(&TransportValue::from("a")));
        assert!(rows[1].get("name").unwrap().is_null());
    }

    #[tokio::test]
    async fn mid_read_failure_returns_no_rows() {
        let cols = labels(&["id"]);
        let mut cursor = ScriptedCursor {
            steps: VecDeque::from(vec![
                Ok(Some(RawRow {
                    labels: Arc::clone(&cols),
                    values: vec![NativeValue::Int(1)],
                })),
                Err(SqlBridgeError::StatementFailure("connection reset".into())),
            ]),
        };

        let err = materialize(&mut cursor).await.unwrap_err();
        assert_eq!(err, SqlBridgeError::StatementFailure("connection reset".into()));
    }

    #[test]
    fn shape_mismatch_is_a_conversion_failure() {
        let raw = RawRow {
            labels: labels(&["a", "b"]),
            values: vec![NativeValue::Int(1)],
        };
        assert!(matches!(
            materialize_row(raw),
            Err(SqlBridgeError::ConversionFailure(_))
        ));
    }
}
