use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::error::SqlBridgeError;
use crate::materialize::RowCursor;
use crate::types::TransportValue;

/// Opens physical connections from stored configs.
///
/// The executor never keeps a connection beyond a single operation; implementations
/// should not pool or cache them either.
#[async_trait]
pub trait SqlDriver: Send + Sync {
    /// Open and authenticate a new connection, honoring the config's login timeout.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::ConnectFailure` on network, authentication or timeout failure.
    async fn open(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DriverConnection>, SqlBridgeError>;
}

/// A single open physical connection.
///
/// Statement text reaching `query` and `execute` already uses the driver's numbered
/// placeholders (`@P1`, `@P2`, ...) and `params` binds to them in order.
#[async_trait]
pub trait DriverConnection: Send {
    /// Execute a statement that returns rows.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::StatementFailure` if preparation or execution fails.
    async fn query<'a>(
        &'a mut self,
        sql: &str,
        params: &[TransportValue],
    ) -> Result<Box<dyn RowCursor + 'a>, SqlBridgeError>;

    /// Execute DML and return the affected-row count reported by the server.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::StatementFailure` if execution fails.
    async fn execute(&mut self, sql: &str, params: &[TransportValue])
    -> Result<u64, SqlBridgeError>;

    /// Run raw statement text without parameters.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::StatementFailure` if execution fails.
    async fn batch(&mut self, sql: &str) -> Result<(), SqlBridgeError>;

    /// Close the connection. Dropping without closing must still release it.
    ///
    /// # Errors
    /// Returns the driver error raised while shutting the connection down.
    async fn close(self: Box<Self>) -> Result<(), SqlBridgeError>;
}
