use log::LevelFilter;
use sshbook_core::Session;
use tokio::{
    sync::broadcast,
    time::{timeout, Duration},
};

mod common;
use common::fake_connection::FakeConnection;

#[tokio::test]
async fn roundtrip_and_write_path() {
    //   Logs will appear only when you run with `-- --nocapture`
    //   or when the test fails.
    let _ = env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();

    // ── Setup ────────────────────────────────────────────────────────────
    let (fake_connection, test_to_fake_tx, mut fake_to_test_rx) = FakeConnection::new();

    let session = Session::open(Box::new(fake_connection))
        .await
        .expect("open should succeed");

    let mut subscriber_rx: broadcast::Receiver<Vec<u8>> = session.subscribe();

    // ── Round-trip path (remote → session → subscriber) ──────────────────
    let incoming_bytes = b"web1 login: ".to_vec();
    test_to_fake_tx
        .send(incoming_bytes.clone())
        .await
        .expect("send into fake should succeed");

    let echoed_bytes = timeout(Duration::from_millis(200), subscriber_rx.recv())
        .await
        .expect("timeout waiting for echo")
        .expect("broadcast channel closed unexpectedly");

    assert_eq!(
        echoed_bytes, incoming_bytes,
        "subscriber should receive the exact bytes injected into the fake connection"
    );

    // ── Write path (subscriber → session → remote) ───────────────────────
    let bytes_written = session
        .write_bytes(b"ls\n")
        .await
        .expect("write_bytes should succeed");

    assert_eq!(
        bytes_written, 3,
        "write_bytes should report the number of bytes handed to the connection"
    );

    let written = timeout(Duration::from_millis(200), fake_to_test_rx.recv())
        .await
        .expect("timeout waiting for the write to reach the connection")
        .expect("fake connection channel closed unexpectedly");
    assert_eq!(written, b"ls\n".to_vec());

    session.close().await.expect("close should succeed");
}

#[tokio::test]
async fn close_ends_io_task_and_drops_connection() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();

    let (fake_connection, _test_to_fake_tx, mut fake_to_test_rx) = FakeConnection::new();

    let session = Session::open(Box::new(fake_connection))
        .await
        .expect("open should succeed");

    session.close().await.expect("close should succeed");

    // The connection was disconnected and dropped by the I/O task, so its
    // write channel must be closed by now.
    let closed = timeout(Duration::from_millis(200), fake_to_test_rx.recv())
        .await
        .expect("timeout waiting for the connection to be dropped");
    assert!(
        closed.is_none(),
        "no further writes can arrive once the session is closed"
    );
}
