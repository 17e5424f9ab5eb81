use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SqlBridgeError;

/// How to (re)establish a physical connection for one logical connection id.
///
/// Stored in the [`ConnectionRegistry`](crate::registry::ConnectionRegistry) after a successful
/// `connect` and never mutated afterwards; reconnecting with the same id replaces it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub connection_id: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Login timeout in seconds; `None` or `0` leaves the wait unbounded.
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("connection_id", &self.connection_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(
        connection_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            host: host.into(),
            port,
            database: database.into(),
            username: username.into(),
            password: password.into(),
            timeout_seconds: None,
        }
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, timeout_seconds: Option<u32>) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Driver address for this config. Credentials are not part of it.
    #[must_use]
    pub fn connection_string(&self) -> String {
        connection_string(&self.host, self.port, &self.database)
    }

    #[must_use]
    pub fn login_timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(u64::from(secs)))
    }

    /// Reject configs that can never produce a connection.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::ConnectFailure` for an empty host, a zero port, or a host or
    /// database name that would change the meaning of the connection string.
    pub fn validate(&self) -> Result<(), SqlBridgeError> {
        if self.host.trim().is_empty() {
            return Err(SqlBridgeError::ConnectFailure(
                "malformed config: host is empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(SqlBridgeError::ConnectFailure(
                "malformed config: port must be non-zero".to_string(),
            ));
        }
        reject_delimiters("host", &self.host, &[';', '=', ','])?;
        reject_delimiters("database", &self.database, &[';', '='])?;
        Ok(())
    }
}

fn reject_delimiters(field: &str, value: &str, delimiters: &[char]) -> Result<(), SqlBridgeError> {
    match value.chars().find(|c| delimiters.contains(c)) {
        Some(c) => Err(SqlBridgeError::ConnectFailure(format!(
            "malformed config: {field} must not contain '{c}'"
        ))),
        None => Ok(()),
    }
}

/// Build the ADO-style address SQL Server drivers understand, e.g.
/// `server=tcp:db,1433;database=sales`.
///
/// Values are inserted as-is; [`ConnectionConfig::validate`] rejects the ones that would
/// split into extra keys.
#[must_use]
pub fn connection_string(host: &str, port: u16, database: &str) -> String {
    format!("server=tcp:{host},{port};database={database}")
}
