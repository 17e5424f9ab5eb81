use tiberius::{AuthMethod, Client, Config as TiberiusConfig};
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::config::ConnectionConfig;
use crate::error::SqlBridgeError;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Translate a stored config into a Tiberius config.
///
/// The address comes from the ADO connection string (host, port, database only); the
/// credentials are attached separately.
///
/// # Errors
/// Returns `SqlBridgeError::ConnectFailure` if the connection string cannot be parsed.
pub fn build_tiberius_config(config: &ConnectionConfig) -> Result<TiberiusConfig, SqlBridgeError> {
    let mut tiberius_config =
        TiberiusConfig::from_ado_string(&config.connection_string()).map_err(|e| {
            SqlBridgeError::ConnectFailure(format!("invalid connection string: {e}"))
        })?;
    tiberius_config.authentication(AuthMethod::sql_server(&config.username, &config.password));
    tiberius_config.trust_cert();
    Ok(tiberius_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_comes_from_host_and_port() {
        let cfg = ConnectionConfig::new("c1", "db.internal", 14330, "sales", "u", "p");
        let tiberius_config = build_tiberius_config(&cfg).unwrap();
        assert_eq!(tiberius_config.get_addr(), "db.internal:14330");
    }
}
