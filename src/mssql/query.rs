use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::TryStreamExt;
use futures_util::stream::{BoxStream, StreamExt};
use tiberius::{Column, ColumnData, ColumnType, FromSql, QueryItem, QueryStream};

use crate::coercion::{Decimal, NativeValue};
use crate::error::SqlBridgeError;
use crate::materialize::{RawRow, RowCursor};

/// Cursor over the first result set of a Tiberius query stream.
///
/// Rows of later result sets (multi-statement batches, procedures returning several sets)
/// are read and discarded so the stream is always drained to its end.
pub(super) struct TiberiusCursor<'a> {
    stream: BoxStream<'a, tiberius::Result<QueryItem>>,
    labels: Option<Arc<Vec<String>>>,
}

impl<'a> TiberiusCursor<'a> {
    pub(super) fn new(stream: QueryStream<'a>) -> Self {
        Self {
            stream: stream.boxed(),
            labels: None,
        }
    }
}

#[async_trait]
impl RowCursor for TiberiusCursor<'_> {
    async fn next_row(&mut self) -> Result<Option<RawRow>, SqlBridgeError> {
        while let Some(item) = self.stream.try_next().await.map_err(|e| {
            SqlBridgeError::StatementFailure(format!("SQL Server row fetch error: {e}"))
        })? {
            match item {
                QueryItem::Metadata(meta) if meta.result_index() == 0 => {
                    self.labels = Some(column_labels(meta.columns()));
                }
                QueryItem::Metadata(_) => {}
                QueryItem::Row(row) if row.result_index() == 0 => {
                    let labels = match &self.labels {
                        Some(labels) => Arc::clone(labels),
                        None => {
                            let labels = column_labels(row.columns());
                            self.labels = Some(Arc::clone(&labels));
                            labels
                        }
                    };
                    let column_types: Vec<ColumnType> =
                        row.columns().iter().map(Column::column_type).collect();
                    let mut values = Vec::with_capacity(labels.len());
                    for (data, column_type) in row.into_iter().zip(column_types) {
                        values.push(column_value(column_type, data)?);
                    }
                    return Ok(Some(RawRow { labels, values }));
                }
                QueryItem::Row(_) => {}
            }
        }
        Ok(None)
    }
}

fn column_labels(columns: &[Column]) -> Arc<Vec<String>> {
    Arc::new(columns.iter().map(|col| col.name().to_string()).collect())
}

/// Like [`native_value`], but `MONEY`/`SMALLMONEY` columns, which Tiberius hands over as
/// floats, are turned back into four-place decimals.
fn column_value(
    column_type: ColumnType,
    data: ColumnData<'static>,
) -> Result<NativeValue, SqlBridgeError> {
    match (column_type, data) {
        (ColumnType::Money | ColumnType::Money4, ColumnData::F64(v)) => {
            Ok(v.map_or(NativeValue::Null, money))
        }
        (ColumnType::Money | ColumnType::Money4, ColumnData::F32(v)) => {
            Ok(v.map_or(NativeValue::Null, |v| money(f64::from(v))))
        }
        (_, data) => native_value(data),
    }
}

/// Money is a fixed-point integer count of ten-thousandths on the wire.
#[allow(clippy::cast_possible_truncation)]
fn money(value: f64) -> NativeValue {
    NativeValue::Decimal(Decimal::new((value * 1e4).round() as i128, 4))
}

/// Map one Tiberius column value onto the driver-independent [`NativeValue`].
///
/// This is the only place that knows SQL Server's wire types.
pub(super) fn native_value(data: ColumnData<'static>) -> Result<NativeValue, SqlBridgeError> {
    let value = match data {
        ColumnData::U8(v) => v.map(NativeValue::TinyInt),
        ColumnData::I16(v) => v.map(NativeValue::SmallInt),
        ColumnData::I32(v) => v.map(NativeValue::Int),
        ColumnData::I64(v) => v.map(NativeValue::BigInt),
        ColumnData::F32(v) => v.map(NativeValue::Real),
        ColumnData::F64(v) => v.map(NativeValue::Float),
        ColumnData::Bit(v) => v.map(NativeValue::Bit),
        ColumnData::String(v) => v.map(|s| NativeValue::Text(s.into_owned())),
        ColumnData::Binary(v) => v.map(|b| NativeValue::Binary(b.into_owned())),
        ColumnData::Numeric(v) => {
            v.map(|n| NativeValue::Decimal(Decimal::new(n.value(), n.scale())))
        }
        ColumnData::Guid(v) => v.map(|g| NativeValue::Other(Box::new(g))),
        ColumnData::Xml(v) => {
            v.map(|x| NativeValue::Other(Box::new(x.into_owned().into_string())))
        }
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(&data)
                .map_err(temporal_error)?
                .map(NativeValue::Timestamp)
        }
        ColumnData::Date(_) => NaiveDate::from_sql(&data)
            .map_err(temporal_error)?
            .map(NativeValue::Date),
        ColumnData::Time(_) => NaiveTime::from_sql(&data)
            .map_err(temporal_error)?
            .map(NativeValue::Time),
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(&data)
            .map_err(temporal_error)?
            .map(NativeValue::TimestampWithOffset),
    };
    Ok(value.unwrap_or(NativeValue::Null))
}

fn temporal_error(err: tiberius::error::Error) -> SqlBridgeError {
    SqlBridgeError::ConversionFailure(format!("unreadable temporal value: {err}"))
}
