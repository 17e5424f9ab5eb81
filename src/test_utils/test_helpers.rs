//! Helper utilities for testing and development.

use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::results::Row;
use crate::types::TransportValue;

/// Create a test row with the given column names and values.
#[must_use]
pub fn create_test_row(column_names: &[&str], values: Vec<TransportValue>) -> Row {
    let names = column_names.iter().map(ToString::to_string).collect();
    Row::new(Arc::new(names), values)
}

/// Config pointing at a `sales` database on host `db`, as used throughout the tests.
#[must_use]
pub fn test_config(connection_id: &str) -> ConnectionConfig {
    ConnectionConfig::new(connection_id, "db", 1433, "sales", "u", "p")
}
