#![cfg(feature = "test-utils")]

use std::sync::Arc;

use mssql_bridge::coercion::NativeValue;
use mssql_bridge::test_utils::{FakeDriver, FakeResponse, FakeResultSet, test_config};
use mssql_bridge::{CommandExecutor, ConnectionRegistry, SqlBridgeError, TransportValue};

fn bridge(driver: &FakeDriver) -> CommandExecutor {
    CommandExecutor::new(Arc::new(driver.clone()), Arc::new(ConnectionRegistry::new()))
}

#[tokio::test(flavor = "current_thread")]
async fn every_operation_closes_its_connection() -> Result<(), SqlBridgeError> {
    let driver = FakeDriver::new();
    let bridge = bridge(&driver);

    bridge.connect(test_config("c1")).await?;
    bridge.read("c1", "SELECT 1", &[]).await?;
    bridge.write("c1", "DELETE FROM t WHERE id = ?", &[1.into()]).await?;
    bridge.call_procedure("c1", "dbo.p", &[]).await?;
    bridge.execute_script("c1", "SELECT 1; SELECT 2").await?;
    bridge.disconnect("c1").await?;

    assert_eq!(driver.opened(), 5);
    assert_eq!(driver.closed(), 5);
    driver.assert_no_leaks();
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn failing_operations_close_their_connection() -> Result<(), SqlBridgeError> {
    let driver = FakeDriver::new();
    let bridge = bridge(&driver);
    bridge.connect(test_config("c1")).await?;

    driver.push_response(FakeResponse::Fail("deadlock victim".into()));
    assert!(bridge.read("c1", "SELECT 1", &[]).await.is_err());

    driver.push_response(FakeResponse::Fail("deadlock victim".into()));
    assert!(bridge.write("c1", "DELETE FROM t", &[]).await.is_err());

    assert!(bridge.write("c1", "DELETE FROM t WHERE id = ?", &[]).await.is_err());

    driver.push_response(FakeResponse::Rows(
        FakeResultSet::new(&["id"])
            .row(vec![NativeValue::Int(1)])
            .fail_after(0, "lost connection"),
    ));
    assert!(bridge.call_procedure("c1", "dbo.p", &[]).await.is_err());

    driver.push_response(FakeResponse::Fail("syntax error".into()));
    assert!(bridge.execute_script("c1", "SELEC 1").await.is_err());

    assert_eq!(driver.opened(), 6);
    driver.assert_no_leaks();
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn close_failure_does_not_mask_the_result() -> Result<(), SqlBridgeError> {
    let driver = FakeDriver::new().with_response(FakeResponse::Rows(
        FakeResultSet::new(&["n"]).row(vec![NativeValue::TinyInt(3)]),
    ));
    driver.fail_closes(true);
    let bridge = bridge(&driver);

    assert!(bridge.connect(test_config("c1")).await?);
    let rows = bridge.read("c1", "SELECT 3 AS n", &[]).await?;
    assert_eq!(rows[0].get("n"), Some(&TransportValue::from(3)));

    driver.push_response(FakeResponse::Fail("boom".into()));
    let err = bridge.write("c1", "DELETE FROM t", &[]).await.unwrap_err();
    assert_eq!(err, SqlBridgeError::StatementFailure("boom".into()));

    driver.assert_no_leaks();
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_connection_opens_nothing() {
    let driver = FakeDriver::new();
    let bridge = bridge(&driver);

    for err in [
        bridge.read("ghost", "SELECT 1", &[]).await.unwrap_err(),
        bridge.write("ghost", "DELETE FROM t", &[]).await.unwrap_err(),
        bridge.call_procedure("ghost", "dbo.p", &[]).await.unwrap_err(),
    ] {
        assert_eq!(err, SqlBridgeError::ConfigNotFound("ghost".into()));
    }
    assert_eq!(
        bridge.execute_script("ghost", "SELECT 1").await.unwrap_err(),
        SqlBridgeError::ConfigNotFound("ghost".into())
    );
    assert_eq!(driver.opened(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn host_going_away_after_connect_is_a_connect_failure() -> Result<(), SqlBridgeError> {
    let driver = FakeDriver::new();
    let bridge = bridge(&driver);
    bridge.connect(test_config("c1")).await?;

    driver.reject_host("db", "server was not found or was not accessible");
    let err = bridge.read("c1", "SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, SqlBridgeError::ConnectFailure(_)));
    assert!(bridge.registry().contains("c1").await, "config stays registered");
    driver.assert_no_leaks();
    Ok(())
}
