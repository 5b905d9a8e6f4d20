use crate::connections::connection::Connection;
use crate::connections::errors::ConnectionError;
use log::{debug, error, info};
use tokio::sync::{broadcast, mpsc};

enum IoEvent {
    Write(Vec<u8>),
    Stop,
}

/// An open connection driven by a dedicated I/O task.
///
/// The task owns the `Connection` and multiplexes two event sources with
/// `tokio::select!`: an mpsc channel carrying writes and the stop signal, and
/// the connection's read future. Everything read from the connection is
/// broadcast to subscribers, so the output consumer runs independently of
/// whoever feeds input and neither side can starve the other.
///
/// One session maps to one remote shell; there is no registry of concurrent
/// sessions. `close` consumes the session, so a closed session cannot be
/// written to by construction.
pub struct Session {
    io_task: tokio::task::JoinHandle<()>,
    write_stop_tx: mpsc::Sender<IoEvent>,
    broadcast_tx: broadcast::Sender<Vec<u8>>,
}

impl Session {
    /// Takes ownership of a *not-yet-connected* `Connection`, connects it,
    /// and spawns the I/O task. Connect failures are returned to the caller
    /// before any task is spawned.
    pub async fn open(
        mut conn: Box<dyn Connection + Send + Unpin>,
    ) -> Result<Self, ConnectionError> {
        conn.connect().await?;

        // Remote output fans out to all subscribers (terminal echo, tests).
        let (broadcast_tx, _) = broadcast::channel::<Vec<u8>>(256);

        // Public API -> I/O task.
        let (write_stop_tx, mut write_stop_rx) = mpsc::channel::<IoEvent>(32);

        let broadcast_tx_clone = broadcast_tx.clone();
        let io_task = tokio::spawn(async move {
            info!("Session I/O task started.");
            let mut buf = [0u8; 1024];
            loop {
                tokio::select! {
                    event = write_stop_rx.recv() => {
                        match event {
                            Some(IoEvent::Write(data)) => {
                                debug!("Write: {} bytes to connection", data.len());
                                if let Err(e) = conn.write(&data).await {
                                    error!("Session write error: {}", e);
                                    break;
                                }
                            },
                            Some(IoEvent::Stop) | None => {
                                info!("Stop received. Exiting session task.");
                                break;
                            },
                        }
                    },
                    result = conn.read(&mut buf) => {
                        match result {
                            Ok(0) => {
                                debug!("Read 0 bytes from connection");
                            },
                            Ok(n) => {
                                debug!("Read {} bytes from connection", n);
                                let _ = broadcast_tx_clone.send(buf[..n].to_vec());
                            },
                            Err(e) => {
                                debug!("Session read error: {}", e);
                                break;
                            },
                        }
                    }
                }
            }
            let _ = conn.disconnect().await;
            info!("Session I/O task ended.");
        });

        Ok(Self {
            io_task,
            write_stop_tx,
            broadcast_tx,
        })
    }

    /// Subscribe to the remote output byte stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<u8>> {
        self.broadcast_tx.subscribe()
    }

    /// Queue bytes for the remote side. Returns the number of bytes handed
    /// to the I/O task.
    pub async fn write_bytes(&self, data: &[u8]) -> Result<usize, ConnectionError> {
        self.write_stop_tx
            .send(IoEvent::Write(data.to_vec()))
            .await
            .map_err(|_| ConnectionError::Other("Session already closed".into()))?;
        Ok(data.len())
    }

    /// Stop the I/O task and disconnect. Always safe to call exactly once;
    /// consuming `self` makes a double close unrepresentable.
    pub async fn close(self) -> Result<(), ConnectionError> {
        let _ = self.write_stop_tx.send(IoEvent::Stop).await;
        let _ = self.io_task.await;
        Ok(())
    }
}
