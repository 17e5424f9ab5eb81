use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::coercion::{LargeObject, NativeValue};
use crate::config::ConnectionConfig;
use crate::driver::{DriverConnection, SqlDriver};
use crate::error::SqlBridgeError;
use crate::materialize::{RawRow, RowCursor};
use crate::types::TransportValue;

/// Which connection method a recorded call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Query,
    Execute,
    Batch,
}

/// A statement the fake received, for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub sql: String,
    pub params: Vec<TransportValue>,
}

/// Scripted outcome for the next statement executed on any fake connection.
#[derive(Debug)]
pub enum FakeResponse {
    /// Rows for `query`; an `execute` consuming it reports 0 affected rows
    Rows(FakeResultSet),
    /// Affected-row count for `execute`; a `query` consuming it yields no rows
    Affected(u64),
    /// The statement fails with `SqlBridgeError::StatementFailure`
    Fail(String),
}

/// Rows a fake query returns, optionally failing part way through.
#[derive(Debug)]
pub struct FakeResultSet {
    labels: Arc<Vec<String>>,
    rows: VecDeque<Vec<NativeValue>>,
    fail_after: Option<(usize, String)>,
}

impl FakeResultSet {
    #[must_use]
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: Arc::new(labels.iter().map(ToString::to_string).collect()),
            rows: VecDeque::new(),
            fail_after: None,
        }
    }

    #[must_use]
    pub fn row(mut self, values: Vec<NativeValue>) -> Self {
        self.rows.push_back(values);
        self
    }

    /// Fail the fetch after `rows` rows have been handed out.
    #[must_use]
    pub fn fail_after(mut self, rows: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((rows, message.into()));
        self
    }
}

/// A large object whose read either succeeds with fixed bytes or fails.
#[derive(Debug)]
pub struct FakeLargeObject {
    content: Result<Vec<u8>, String>,
}

impl FakeLargeObject {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { content: Ok(bytes) }
    }

    #[must_use]
    pub fn broken(message: impl Into<String>) -> Self {
        Self {
            content: Err(message.into()),
        }
    }

    #[must_use]
    pub fn into_native(self) -> NativeValue {
        NativeValue::LargeBinary(Box::new(self))
    }
}

impl LargeObject for FakeLargeObject {
    fn read_all(self: Box<Self>) -> io::Result<Vec<u8>> {
        self.content.map_err(io::Error::other)
    }
}

#[derive(Debug, Default)]
struct FakeState {
    responses: Mutex<VecDeque<FakeResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
    rejected_hosts: Mutex<HashMap<String, String>>,
    slow_hosts: Mutex<HashMap<String, Duration>>,
    opened_configs: Mutex<Vec<ConnectionConfig>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    dropped_unclosed: AtomicUsize,
    fail_close: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("fake driver state poisoned")
}

/// An in-memory [`SqlDriver`] for tests.
///
/// Records every statement, replays scripted responses in FIFO order, and counts opened,
/// closed and dropped-without-close connections so leak checks are straightforward:
/// ```rust
/// use mssql_bridge::test_utils::{FakeDriver, FakeResponse};
///
/// let driver = FakeDriver::new().with_response(FakeResponse::Affected(1));
/// assert_eq!(driver.open_connections(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Arc<FakeState>,
}

impl FakeDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(self, response: FakeResponse) -> Self {
        self.push_response(response);
        self
    }

    pub fn push_response(&self, response: FakeResponse) {
        lock(&self.state.responses).push_back(response);
    }

    /// Refuse logins to `host` with `message`.
    pub fn reject_host(&self, host: &str, message: impl Into<String>) {
        lock(&self.state.rejected_hosts).insert(host.to_string(), message.into());
    }

    /// Delay every open against `host` by `delay`.
    pub fn delay_host(&self, host: &str, delay: Duration) {
        lock(&self.state.slow_hosts).insert(host.to_string(), delay);
    }

    /// Make `close` report an error (the connection still counts as closed).
    pub fn fail_closes(&self, fail: bool) {
        self.state.fail_close.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state.calls).clone()
    }

    #[must_use]
    pub fn last_call(&self) -> Option<RecordedCall> {
        lock(&self.state.calls).last().cloned()
    }

    #[must_use]
    pub fn opened_configs(&self) -> Vec<ConnectionConfig> {
        lock(&self.state.opened_configs).clone()
    }

    #[must_use]
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Connections that were dropped without an explicit `close`.
    #[must_use]
    pub fn dropped_unclosed(&self) -> usize {
        self.state.dropped_unclosed.load(Ordering::SeqCst)
    }

    /// Connections currently open.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.opened() - self.closed() - self.dropped_unclosed()
    }

    /// Assert every opened connection was closed explicitly.
    pub fn assert_no_leaks(&self) {
        assert_eq!(
            self.open_connections(),
            0,
            "connections still open: opened {}, closed {}, dropped {}",
            self.opened(),
            self.closed(),
            self.dropped_unclosed()
        );
        assert_eq!(
            self.dropped_unclosed(),
            0,
            "connections were dropped without close"
        );
    }
}

#[async_trait]
impl SqlDriver for FakeDriver {
    async fn open(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DriverConnection>, SqlBridgeError> {
        let delay = lock(&self.state.slow_hosts).get(&config.host).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let rejection = lock(&self.state.rejected_hosts).get(&config.host).cloned();
        if let Some(message) = rejection {
            return Err(SqlBridgeError::ConnectFailure(message));
        }

        lock(&self.state.opened_configs).push(config.clone());
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }
}

struct FakeConnection {
    state: Arc<FakeState>,
    closed: bool,
}

impl FakeConnection {
    fn record(&self, kind: CallKind, sql: &str, params: &[TransportValue]) -> Option<FakeResponse> {
        lock(&self.state.calls).push(RecordedCall {
            kind,
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        lock(&self.state.responses).pop_front()
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        if !self.closed {
            self.state.dropped_unclosed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl DriverConnection for FakeConnection {
    async fn query<'a>(
        &'a mut self,
        sql: &str,
        params: &[TransportValue],
    ) -> Result<Box<dyn RowCursor + 'a>, SqlBridgeError> {
        let cursor = match self.record(CallKind::Query, sql, params) {
            Some(FakeResponse::Rows(set)) => FakeCursor {
                labels: set.labels,
                rows: set.rows,
                fail_after: set.fail_after,
                yielded: 0,
            },
            Some(FakeResponse::Fail(message)) => {
                return Err(SqlBridgeError::StatementFailure(message));
            }
            Some(FakeResponse::Affected(_)) | None => FakeCursor {
                labels: Arc::new(Vec::new()),
                rows: VecDeque::new(),
                fail_after: None,
                yielded: 0,
            },
        };
        Ok(Box::new(cursor))
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: &[TransportValue],
    ) -> Result<u64, SqlBridgeError> {
        match self.record(CallKind::Execute, sql, params) {
            Some(FakeResponse::Affected(count)) => Ok(count),
            Some(FakeResponse::Fail(message)) => Err(SqlBridgeError::StatementFailure(message)),
            Some(FakeResponse::Rows(_)) | None => Ok(0),
        }
    }

    async fn batch(&mut self, sql: &str) -> Result<(), SqlBridgeError> {
        match self.record(CallKind::Batch, sql, &[]) {
            Some(FakeResponse::Fail(message)) => Err(SqlBridgeError::StatementFailure(message)),
            _ => Ok(()),
        }
    }

    async fn close(mut self: Box<Self>) -> Result<(), SqlBridgeError> {
        self.closed = true;
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(SqlBridgeError::StatementFailure(
                "connection reset during close".to_string(),
            ));
        }
        Ok(())
    }
}

struct FakeCursor {
    labels: Arc<Vec<String>>,
    rows: VecDeque<Vec<NativeValue>>,
    fail_after: Option<(usize, String)>,
    yielded: usize,
}

#[async_trait]
impl RowCursor for FakeCursor {
    async fn next_row(&mut self) -> Result<Option<RawRow>, SqlBridgeError> {
        if let Some((limit, message)) = &self.fail_after
            && self.yielded == *limit
        {
            return Err(SqlBridgeError::StatementFailure(message.clone()));
        }
        Ok(self.rows.pop_front().map(|values| {
            self.yielded += 1;
            RawRow {
                labels: Arc::clone(&self.labels),
                values,
            }
        }))
    }
}
