mod dispatch;
mod script;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::driver::{DriverConnection, SqlDriver};
use crate::error::SqlBridgeError;
use crate::materialize::materialize;
use crate::registry::ConnectionRegistry;
use crate::results::Row;
use crate::translation::{procedure_call, translate_placeholders};
use crate::types::TransportValue;

pub use dispatch::{Command, Dispatcher, Failure, Payload, Reply};
pub use script::split_script;

/// The bridge's public operation set.
///
/// Only configs are shared between calls, through the registry. Every read, write,
/// procedure call or script opens its own physical connection from the stored config and
/// closes it before returning, whether the operation succeeded or not.
///
/// ```rust,no_run
/// use mssql_bridge::prelude::*;
///
/// # async fn demo() -> Result<(), SqlBridgeError> {
/// let bridge = CommandExecutor::mssql();
/// bridge
///     .connect(ConnectionConfig::new("c1", "db", 1433, "sales", "u", "p"))
///     .await?;
/// let updated = bridge
///     .write("c1", "UPDATE orders SET status=? WHERE id=?", &["shipped".into(), 42.into()])
///     .await?;
/// let rows = bridge
///     .read("c1", "SELECT id, total FROM orders WHERE id=?", &[42.into()])
///     .await?;
/// # let _ = (updated, rows);
/// # Ok(())
/// # }
/// ```
pub struct CommandExecutor {
    registry: Arc<ConnectionRegistry>,
    driver: Arc<dyn SqlDriver>,
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("registry", &self.registry)
            .field("driver", &"<SqlDriver>")
            .finish()
    }
}

impl CommandExecutor {
    #[must_use]
    pub fn new(driver: Arc<dyn SqlDriver>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry, driver }
    }

    /// Executor backed by the Tiberius SQL Server driver and an empty registry.
    #[cfg(feature = "mssql")]
    #[must_use]
    pub fn mssql() -> Self {
        Self::new(
            Arc::new(crate::mssql::TiberiusDriver),
            Arc::new(ConnectionRegistry::new()),
        )
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Verify the config can log in, then remember it under its connection id.
    ///
    /// The probe connection is closed straight away; later operations open their own.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::InvalidArgument` for a blank connection id and
    /// `SqlBridgeError::ConnectFailure` for any failure while opening the probe.
    pub async fn connect(&self, config: ConnectionConfig) -> Result<bool, SqlBridgeError> {
        validate_connection_id(&config.connection_id)?;
        info!(
            connection_id = %config.connection_id,
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connecting"
        );

        let probe = self.driver.open(&config).await.map_err(|err| match err {
            SqlBridgeError::ConnectFailure(_) => err,
            other => SqlBridgeError::ConnectFailure(other.to_string()),
        })?;
        release(probe, &config.connection_id).await;

        if self.registry.put(config).await.is_some() {
            debug!("replaced an existing connection config");
        }
        Ok(true)
    }

    /// Forget the config for `connection_id`. Unknown ids are fine.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::InvalidArgument` for a blank connection id.
    pub async fn disconnect(&self, connection_id: &str) -> Result<bool, SqlBridgeError> {
        validate_connection_id(connection_id)?;
        let existed = self.registry.remove(connection_id).await;
        info!(connection_id, existed, "disconnected");
        Ok(true)
    }

    /// Run a query with positional `?` parameters and materialize every row.
    ///
    /// # Errors
    /// Returns `ConfigNotFound` for an unknown id, `ConnectFailure` if the connection cannot
    /// be opened, and `StatementFailure`/`ConversionFailure` for anything after that,
    /// including a placeholder/parameter count mismatch.
    pub async fn read(
        &self,
        connection_id: &str,
        sql: &str,
        params: &[TransportValue],
    ) -> Result<Vec<Row>, SqlBridgeError> {
        validate_connection_id(connection_id)?;
        debug!(connection_id, sql_len = sql.len(), params = params.len(), "read");

        let mut conn = self.open_for(connection_id).await?;
        let outcome = query_rows(conn.as_mut(), sql, params).await;
        release(conn, connection_id).await;
        outcome
    }

    /// Run DML with positional `?` parameters and return the affected-row count.
    ///
    /// # Errors
    /// Same as [`CommandExecutor::read`].
    pub async fn write(
        &self,
        connection_id: &str,
        sql: &str,
        params: &[TransportValue],
    ) -> Result<u64, SqlBridgeError> {
        validate_connection_id(connection_id)?;
        debug!(connection_id, sql_len = sql.len(), params = params.len(), "write");

        let mut conn = self.open_for(connection_id).await?;
        let outcome = execute_dml(conn.as_mut(), sql, params).await;
        release(conn, connection_id).await;
        outcome
    }

    /// Call a stored procedure with one positional argument per parameter and materialize
    /// its first result set. A procedure that returns no result set yields no rows.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::InvalidArgument` for a blank procedure name, otherwise the
    /// same as [`CommandExecutor::read`].
    pub async fn call_procedure(
        &self,
        connection_id: &str,
        procedure_name: &str,
        params: &[TransportValue],
    ) -> Result<Vec<Row>, SqlBridgeError> {
        validate_connection_id(connection_id)?;
        if procedure_name.trim().is_empty() {
            return Err(SqlBridgeError::InvalidArgument(
                "procedure name must not be empty".to_string(),
            ));
        }
        debug!(connection_id, procedure_name, params = params.len(), "call procedure");

        let sql = procedure_call(procedure_name.trim(), params.len());
        let mut conn = self.open_for(connection_id).await?;
        let outcome = query_rows(conn.as_mut(), &sql, params).await;
        release(conn, connection_id).await;
        outcome
    }

    /// Run each `;`-separated statement of `script` in order on one connection, stopping
    /// at the first failure. See [`split_script`] for the splitting rules.
    ///
    /// # Errors
    /// Returns `ConfigNotFound`, `ConnectFailure`, or the `StatementFailure` of the first
    /// statement that failed.
    pub async fn execute_script(
        &self,
        connection_id: &str,
        script: &str,
    ) -> Result<bool, SqlBridgeError> {
        validate_connection_id(connection_id)?;
        let statements = split_script(script);
        debug!(connection_id, statements = statements.len(), "execute script");

        let mut conn = self.open_for(connection_id).await?;
        let outcome = run_statements(conn.as_mut(), &statements).await;
        release(conn, connection_id).await;
        outcome.map(|()| true)
    }

    async fn open_for(
        &self,
        connection_id: &str,
    ) -> Result<Box<dyn DriverConnection>, SqlBridgeError> {
        let config = self.registry.get(connection_id).await?;
        self.driver.open(&config).await
    }
}

fn validate_connection_id(connection_id: &str) -> Result<(), SqlBridgeError> {
    if connection_id.trim().is_empty() {
        return Err(SqlBridgeError::InvalidArgument(
            "connection id must not be empty".to_string(),
        ));
    }
    Ok(())
}

async fn query_rows(
    conn: &mut dyn DriverConnection,
    sql: &str,
    params: &[TransportValue],
) -> Result<Vec<Row>, SqlBridgeError> {
    let translated = translate_placeholders(sql);
    translated.check_arity(params.len())?;
    let mut cursor = conn.query(&translated.sql, params).await?;
    materialize(cursor.as_mut()).await
}

async fn execute_dml(
    conn: &mut dyn DriverConnection,
    sql: &str,
    params: &[TransportValue],
) -> Result<u64, SqlBridgeError> {
    let translated = translate_placeholders(sql);
    translated.check_arity(params.len())?;
    conn.execute(&translated.sql, params).await
}

async fn run_statements(
    conn: &mut dyn DriverConnection,
    statements: &[&str],
) -> Result<(), SqlBridgeError> {
    for (idx, statement) in statements.iter().enumerate() {
        if let Err(err) = conn.batch(statement).await {
            debug!(statement = idx + 1, of = statements.len(), "script stopped");
            return Err(err);
        }
    }
    Ok(())
}

/// Close a connection opened for one operation. A failed close is logged and never
/// replaces the operation's own outcome.
async fn release(conn: Box<dyn DriverConnection>, connection_id: &str) {
    if let Err(err) = conn.close().await {
        warn!(connection_id, error = %err, "failed to close connection");
    }
}
