#![cfg(feature = "test-utils")]

use std::sync::Arc;
use std::time::Duration;

use mssql_bridge::coercion::NativeValue;
use mssql_bridge::error::ErrorKind;
use mssql_bridge::executor::Payload;
use mssql_bridge::test_utils::{FakeDriver, FakeResponse, FakeResultSet, test_config};
use mssql_bridge::{
    Command, CommandExecutor, ConnectionConfig, ConnectionRegistry, Dispatcher, Reply,
    SqlBridgeError,
};
use tokio::sync::oneshot;

fn dispatcher(driver: &FakeDriver) -> Dispatcher {
    Dispatcher::new(Arc::new(CommandExecutor::new(
        Arc::new(driver.clone()),
        Arc::new(ConnectionRegistry::new()),
    )))
}

fn read(connection_id: &str, query: &str) -> Command {
    Command::Read {
        connection_id: connection_id.to_string(),
        query: query.to_string(),
        params: Vec::new(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn commands_from_json_round_trip_through_replies() {
    let driver = FakeDriver::new().with_response(FakeResponse::Rows(
        FakeResultSet::new(&["one"]).row(vec![NativeValue::Int(1)]),
    ));
    let dispatcher = dispatcher(&driver);

    let connect: Command = serde_json::from_str(
        r#"{"method":"connect","config":{"connectionId":"c1","host":"db","port":1433,"database":"sales","username":"u","password":"p"}}"#,
    )
    .unwrap();
    let reply = dispatcher.submit(connect).await.unwrap();
    assert_eq!(serde_json::to_string(&reply).unwrap(), r#"{"ok":true}"#);

    let query: Command = serde_json::from_str(
        r#"{"method":"read","connectionId":"c1","query":"SELECT 1 AS one"}"#,
    )
    .unwrap();
    let reply = dispatcher.submit(query).await.unwrap();
    assert_eq!(serde_json::to_string(&reply).unwrap(), r#"{"ok":[{"one":1}]}"#);

    let reply = dispatcher.submit(read("nope", "SELECT 1")).await.unwrap();
    match reply {
        Reply::Error(failure) => assert_eq!(failure.kind, ErrorKind::ConfigNotFound),
        Reply::Ok(payload) => panic!("expected failure, got {payload:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_login_does_not_block_other_connections() -> Result<(), SqlBridgeError> {
    let driver = FakeDriver::new();
    let dispatcher = dispatcher(&driver);
    let executor = Arc::clone(dispatcher.executor());

    executor
        .connect(ConnectionConfig::new("slow", "far-away", 1433, "sales", "u", "p"))
        .await?;
    executor.connect(test_config("fast")).await?;
    driver.delay_host("far-away", Duration::from_secs(2));

    let slow = dispatcher.submit(read("slow", "SELECT 1"));
    let fast = dispatcher.submit(read("fast", "SELECT 1"));

    let fast_reply = tokio::time::timeout(Duration::from_millis(500), fast)
        .await
        .expect("fast read finished while the slow login was pending")
        .unwrap();
    assert!(fast_reply.is_ok());
    assert!(!slow.is_finished());

    assert!(slow.await.unwrap().is_ok());
    driver.assert_no_leaks();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_writes_each_get_their_own_connection() -> Result<(), SqlBridgeError> {
    let driver = FakeDriver::new();
    let dispatcher = dispatcher(&driver);
    dispatcher.executor().connect(test_config("c1")).await?;

    let handles: Vec<_> = (0..16)
        .map(|i| {
            dispatcher.submit(Command::Write {
                connection_id: "c1".into(),
                query: "UPDATE counters SET n = n + 1 WHERE id = ?".into(),
                params: vec![i.into()],
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Reply::Ok(Payload::Count(0)));
    }

    assert_eq!(driver.opened(), 17);
    driver.assert_no_leaks();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_racing_disconnect_either_finds_the_config_or_not() -> Result<(), SqlBridgeError> {
    let driver = FakeDriver::new();
    let dispatcher = dispatcher(&driver);
    dispatcher.executor().connect(test_config("c1")).await?;

    let reads: Vec<_> = (0..8).map(|_| dispatcher.submit(read("c1", "SELECT 1"))).collect();
    let disconnect = dispatcher.submit(Command::Disconnect {
        connection_id: "c1".into(),
    });

    assert_eq!(disconnect.await.unwrap(), Reply::Ok(Payload::Ack(true)));
    for handle in reads {
        match handle.await.unwrap() {
            Reply::Ok(Payload::Rows(rows)) => assert!(rows.is_empty()),
            Reply::Error(failure) => assert_eq!(failure.kind, ErrorKind::ConfigNotFound),
            other => panic!("unexpected reply {other:?}"),
        }
    }
    driver.assert_no_leaks();
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn submit_with_delivers_to_the_callback() {
    let driver = FakeDriver::new();
    let dispatcher = dispatcher(&driver);
    let (tx, rx) = oneshot::channel();

    dispatcher.submit_with(
        Command::Disconnect {
            connection_id: "c1".into(),
        },
        move |reply| {
            let _ = tx.send(reply);
        },
    );

    assert_eq!(rx.await.unwrap(), Reply::Ok(Payload::Ack(true)));
}
