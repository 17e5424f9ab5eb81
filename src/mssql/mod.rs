// MSSQL module - SQL Server driver for the bridge, built on Tiberius
//
// - config: Tiberius config from a stored connection config
// - client: Raw client creation with login timeout
// - params: Positional parameter binding
// - query: Column value mapping and the result cursor

pub mod client;
pub mod config;
pub mod params;
mod query;

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::driver::{DriverConnection, SqlDriver};
use crate::error::SqlBridgeError;
use crate::materialize::RowCursor;
use crate::types::TransportValue;

pub use client::create_mssql_client;
pub use config::{MssqlClient, build_tiberius_config};
pub use params::bind_query_params;

use query::TiberiusCursor;

/// Production driver: every `open` is a fresh TCP connection and TDS login.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiberiusDriver;

#[async_trait]
impl SqlDriver for TiberiusDriver {
    async fn open(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DriverConnection>, SqlBridgeError> {
        let client = create_mssql_client(config).await?;
        Ok(Box::new(TiberiusConnection { client }))
    }
}

/// One open SQL Server connection. Dropping it closes the socket.
pub struct TiberiusConnection {
    client: MssqlClient,
}

impl std::fmt::Debug for TiberiusConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TiberiusConnection")
            .field(&"<MssqlClient>")
            .finish()
    }
}

#[async_trait]
impl DriverConnection for TiberiusConnection {
    async fn query<'a>(
        &'a mut self,
        sql: &str,
        params: &[TransportValue],
    ) -> Result<Box<dyn RowCursor + 'a>, SqlBridgeError> {
        let query_builder = bind_query_params(sql.to_owned(), params);
        let stream = query_builder.query(&mut self.client).await.map_err(|e| {
            SqlBridgeError::StatementFailure(format!("SQL Server query error: {e}"))
        })?;
        Ok(Box::new(TiberiusCursor::new(stream)))
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: &[TransportValue],
    ) -> Result<u64, SqlBridgeError> {
        let query_builder = bind_query_params(sql.to_owned(), params);
        let exec_result = query_builder.execute(&mut self.client).await.map_err(|e| {
            SqlBridgeError::StatementFailure(format!("SQL Server DML execution error: {e}"))
        })?;
        Ok(exec_result.rows_affected().iter().sum())
    }

    /// Plain SQL batch, not `sp_executesql`, so temp tables, `SET` options and `USE` carry
    /// over to the next statement on this connection.
    async fn batch(&mut self, sql: &str) -> Result<(), SqlBridgeError> {
        let batch_error = |e: tiberius::error::Error| {
            SqlBridgeError::StatementFailure(format!("SQL Server batch execution error: {e}"))
        };
        self.client
            .simple_query(sql)
            .await
            .map_err(batch_error)?
            .into_results()
            .await
            .map_err(batch_error)?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), SqlBridgeError> {
        self.client.close().await?;
        Ok(())
    }
}
