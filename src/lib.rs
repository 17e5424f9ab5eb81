//! Async command bridge for SQL Server.
//!
//! A caller names a connection once with [`CommandExecutor::connect`], then issues reads,
//! writes, stored-procedure calls and scripts against that name. Every operation opens its
//! own physical connection from the stored config, binds positional `?` parameters, and
//! returns rows as ordered column/value pairs of [`TransportValue`]s, so nothing
//! driver specific crosses the boundary.
//!
//! ```rust,no_run
//! use mssql_bridge::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlBridgeError> {
//! let bridge = CommandExecutor::mssql();
//! bridge
//!     .connect(ConnectionConfig::new("c1", "db", 1433, "sales", "u", "p"))
//!     .await?;
//! let rows = bridge
//!     .read("c1", "SELECT id, total FROM orders WHERE id = ?", &[42.into()])
//!     .await?;
//! assert_eq!(rows[0].get("total").and_then(TransportValue::as_text), Some("19.99"));
//! bridge.disconnect("c1").await?;
//! # Ok(())
//! # }
//! ```

pub mod coercion;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod materialize;
pub mod prelude;
pub mod registry;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::ConnectionConfig;
pub use error::{ErrorKind, SqlBridgeError};
pub use executor::{Command, CommandExecutor, Dispatcher, Reply};
pub use registry::ConnectionRegistry;
pub use results::Row;
pub use types::{Number, TransportValue};
