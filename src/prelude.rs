//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::coercion::{Decimal, LargeObject, NativeValue, coerce};
pub use crate::config::ConnectionConfig;
pub use crate::driver::{DriverConnection, SqlDriver};
pub use crate::error::{ErrorKind, SqlBridgeError};
pub use crate::executor::{
    Command, CommandExecutor, Dispatcher, Failure, Payload, Reply, split_script,
};
pub use crate::materialize::{RawRow, RowCursor, materialize};
pub use crate::registry::ConnectionRegistry;
pub use crate::results::Row;
pub use crate::translation::{Translated, procedure_call, translate_placeholders};
pub use crate::types::{Number, TransportValue};

#[cfg(feature = "mssql")]
pub use crate::mssql::{MssqlClient, TiberiusDriver, create_mssql_client};
