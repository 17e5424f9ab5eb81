use tiberius::{Client, Config as TiberiusConfig};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use super::config::{MssqlClient, build_tiberius_config};
use crate::config::ConnectionConfig;
use crate::error::SqlBridgeError;

/// Open and authenticate a new SQL Server connection for `config`.
///
/// The config's login timeout bounds the TCP connect and the TDS login together.
///
/// # Errors
/// Returns `SqlBridgeError::ConnectFailure` if the config is malformed, the server is
/// unreachable, login fails, or the login timeout elapses.
pub async fn create_mssql_client(config: &ConnectionConfig) -> Result<MssqlClient, SqlBridgeError> {
    config.validate()?;
    let tiberius_config = build_tiberius_config(config)?;

    match config.login_timeout() {
        Some(limit) => tokio::time::timeout(limit, connect(tiberius_config))
            .await
            .map_err(|_| {
                SqlBridgeError::ConnectFailure(format!(
                    "login timed out after {}s",
                    limit.as_secs()
                ))
            })?,
        None => connect(tiberius_config).await,
    }
}

async fn connect(config: TiberiusConfig) -> Result<MssqlClient, SqlBridgeError> {
    let tcp = TcpStream::connect(config.get_addr())
        .await
        .map_err(|e| SqlBridgeError::ConnectFailure(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| SqlBridgeError::ConnectFailure(format!("TCP connection error: {e}")))?;

    Client::connect(config, tcp.compat_write())
        .await
        .map_err(|e| SqlBridgeError::ConnectFailure(format!("SQL Server connection error: {e}")))
}
