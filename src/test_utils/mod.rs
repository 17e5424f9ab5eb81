//! In-memory driver and helpers for exercising the bridge without a SQL Server.

mod fake;
mod test_helpers;

pub use fake::{
    CallKind, FakeDriver, FakeLargeObject, FakeResponse, FakeResultSet, RecordedCall,
};
pub use test_helpers::{create_test_row, test_config};
