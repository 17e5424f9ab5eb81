use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::ConnectionConfig;
use crate::error::{ErrorKind, SqlBridgeError};
use crate::results::Row;
use crate::types::TransportValue;

use super::CommandExecutor;

/// One boundary call, as an external transport would carry it.
///
/// ```json
/// {"method": "read", "connectionId": "c1", "query": "SELECT 1 AS one", "params": []}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Connect {
        config: ConnectionConfig,
    },
    Disconnect {
        connection_id: String,
    },
    Read {
        connection_id: String,
        query: String,
        #[serde(default)]
        params: Vec<TransportValue>,
    },
    Write {
        connection_id: String,
        query: String,
        #[serde(default)]
        params: Vec<TransportValue>,
    },
    CallProcedure {
        connection_id: String,
        procedure_name: String,
        #[serde(default)]
        params: Vec<TransportValue>,
    },
    ExecuteScript {
        connection_id: String,
        script: String,
    },
}

impl Command {
    /// Method tag, for logging.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Command::Connect { .. } => "connect",
            Command::Disconnect { .. } => "disconnect",
            Command::Read { .. } => "read",
            Command::Write { .. } => "write",
            Command::CallProcedure { .. } => "callProcedure",
            Command::ExecuteScript { .. } => "executeScript",
        }
    }
}

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Acknowledgement from connect, disconnect and executeScript
    Ack(bool),
    /// Affected-row count from write
    Count(u64),
    /// Rows from read and callProcedure
    Rows(Vec<Row>),
}

/// Failure half of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<SqlBridgeError> for Failure {
    fn from(err: SqlBridgeError) -> Self {
        Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Reply to one command: `{"ok": ...}` or `{"error": {"kind": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reply {
    Ok(Payload),
    Error(Failure),
}

impl Reply {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }
}

impl<T: Into<Payload>> From<Result<T, SqlBridgeError>> for Reply {
    fn from(result: Result<T, SqlBridgeError>) -> Self {
        match result {
            Ok(payload) => Reply::Ok(payload.into()),
            Err(err) => Reply::Error(err.into()),
        }
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Payload::Ack(value)
    }
}

impl From<u64> for Payload {
    fn from(value: u64) -> Self {
        Payload::Count(value)
    }
}

impl From<Vec<Row>> for Payload {
    fn from(value: Vec<Row>) -> Self {
        Payload::Rows(value)
    }
}

impl CommandExecutor {
    /// Run one command to completion and fold its outcome into a [`Reply`].
    pub async fn run(&self, command: Command) -> Reply {
        match command {
            Command::Connect { config } => self.connect(config).await.into(),
            Command::Disconnect { connection_id } => self.disconnect(&connection_id).await.into(),
            Command::Read {
                connection_id,
                query,
                params,
            } => self.read(&connection_id, &query, &params).await.into(),
            Command::Write {
                connection_id,
                query,
                params,
            } => self.write(&connection_id, &query, &params).await.into(),
            Command::CallProcedure {
                connection_id,
                procedure_name,
                params,
            } => self
                .call_procedure(&connection_id, &procedure_name, &params)
                .await
                .into(),
            Command::ExecuteScript {
                connection_id,
                script,
            } => self.execute_script(&connection_id, &script).await.into(),
        }
    }
}

/// Task-per-command front end for a shared [`CommandExecutor`].
///
/// Each submitted command runs on its own tokio task, so a slow login or statement only
/// holds up the caller that issued it. Commands for the same connection id are not
/// serialized against each other.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    executor: Arc<CommandExecutor>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }

    #[must_use]
    pub fn executor(&self) -> &Arc<CommandExecutor> {
        &self.executor
    }

    /// Spawn `command` and hand back its join handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, command: Command) -> JoinHandle<Reply> {
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            let method = command.method();
            let reply = executor.run(command).await;
            if let Reply::Error(failure) = &reply {
                tracing::debug!(method, kind = ?failure.kind, message = %failure.message, "command failed");
            }
            reply
        })
    }

    /// Spawn `command` and deliver its reply to `callback` from the task.
    pub fn submit_with<F>(&self, command: Command, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Reply) + Send + 'static,
    {
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            let reply = executor.run(command).await;
            callback(reply);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_commands() {
        let command: Command = serde_json::from_str(
            r#"{"method":"callProcedure","connectionId":"c1","procedureName":"dbo.p","params":[1,"x"]}"#,
        )
        .unwrap();
        match command {
            Command::CallProcedure {
                connection_id,
                procedure_name,
                params,
            } => {
                assert_eq!(connection_id, "c1");
                assert_eq!(procedure_name, "dbo.p");
                assert_eq!(params, vec![TransportValue::from(1), "x".into()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn params_default_to_empty() {
        let command: Command =
            serde_json::from_str(r#"{"method":"read","connectionId":"c1","query":"SELECT 1"}"#)
                .unwrap();
        assert!(matches!(command, Command::Read { ref params, .. } if params.is_empty()));
        assert_eq!(command.method(), "read");
    }

    #[test]
    fn replies_serialize_ok_and_error() {
        let ok: Reply = Ok::<u64, SqlBridgeError>(1).into();
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"ok":1}"#);

        let err: Reply = Err::<bool, _>(SqlBridgeError::ConfigNotFound("c1".into())).into();
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"error":{"kind":"configNotFound","message":"Connection not found: c1"}}"#
        );
    }
}
