//! Line-oriented harness: one JSON request per stdin line, one JSON reply per stdout line.
//!
//! ```text
//! {"id":1,"command":{"method":"connect","config":{"connectionId":"c1","host":"db","port":1433,"database":"sales","username":"u","password":"p"}}}
//! {"id":1,"reply":{"ok":true}}
//! ```
//! Requests run concurrently, so replies may come back out of order; match them by `id`.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mssql_bridge::error::ErrorKind;
use mssql_bridge::executor::Failure;
use mssql_bridge::{Command, CommandExecutor, Dispatcher, Reply};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive the SQL Server bridge over stdin/stdout")]
struct Args {
    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: JsonValue,
    command: Command,
}

#[derive(Debug, Serialize)]
struct Response {
    id: JsonValue,
    reply: Reply,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let dispatcher = Dispatcher::new(Arc::new(CommandExecutor::mssql()));
    let (tx, mut rx) = mpsc::unbounded_channel::<Response>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_string(&response)?;
            line.push('\n');
            stdout.write_all(line.as_bytes()).await?;
            stdout.flush().await?;
        }
        anyhow::Ok(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "rejected malformed request");
                let failure = Failure {
                    kind: ErrorKind::InvalidArgument,
                    message: format!("malformed request: {err}"),
                };
                let _ = tx.send(Response {
                    id: JsonValue::Null,
                    reply: Reply::Error(failure),
                });
                continue;
            }
        };

        let tx = tx.clone();
        let id = request.id;
        dispatcher.submit_with(request.command, move |reply| {
            let _ = tx.send(Response { id, reply });
        });
    }

    drop(tx);
    writer.await.context("stdout writer task panicked")??;
    tracing::info!("stdin closed, shutting down");
    Ok(())
}
