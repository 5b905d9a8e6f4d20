//! A deterministic in-process stand-in for anything implementing
//! `sshbook_core::connections::connection::Connection`.
//!
//! * Push "remote output" into the connection with
//!   `test_to_fake_tx.send(bytes).await`.
//! * Receive everything the session wrote out via `fake_to_test_rx`; the
//!   channel closes when the session drops the connection, so a `None` from
//!   `recv` doubles as a "disconnected" assertion.
//!
//! This lets integration tests exercise the real async machinery (tasks,
//! channels, broadcasts) without an SSH server.

use async_trait::async_trait;
use sshbook_core::connections::{connection::Connection, errors::ConnectionError};
use tokio::sync::mpsc;

pub struct FakeConnection {
    /// Bytes pushed by the test, served as reads from the "remote" side.
    test_to_fake_rx: mpsc::Receiver<Vec<u8>>,
    /// Bytes written by the session, forwarded back to the test.
    fake_to_test_tx: mpsc::Sender<Vec<u8>>,
}

impl FakeConnection {
    /// Returns the fake plus its two test-side channel ends:
    /// 1. `FakeConnection`: box it and hand it to `Session::open`.
    /// 2. `mpsc::Sender`: inject simulated remote output.
    /// 3. `mpsc::Receiver`: observe every chunk the session wrote.
    pub fn new() -> (Self, mpsc::Sender<Vec<u8>>, mpsc::Receiver<Vec<u8>>) {
        let (test_to_fake_tx, test_to_fake_rx) = mpsc::channel(32);
        let (fake_to_test_tx, fake_to_test_rx) = mpsc::channel(32);

        (
            Self {
                test_to_fake_rx,
                fake_to_test_tx,
            },
            test_to_fake_tx,
            fake_to_test_rx,
        )
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError> {
        let _ = self.fake_to_test_tx.send(data.to_vec()).await;
        Ok(data.len())
    }

    async fn read(&mut self, destination_buffer: &mut [u8]) -> Result<usize, ConnectionError> {
        match self.test_to_fake_rx.recv().await {
            Some(incoming_chunk) => {
                // Chunks injected by tests are small; a partial-read path like
                // a real stream's is not needed here.
                let bytes_to_copy = incoming_chunk.len().min(destination_buffer.len());
                destination_buffer[..bytes_to_copy]
                    .copy_from_slice(&incoming_chunk[..bytes_to_copy]);
                Ok(bytes_to_copy)
            }
            None => Err(ConnectionError::Other(
                "test closed the channel; no more data".into(),
            )),
        }
    }
}
