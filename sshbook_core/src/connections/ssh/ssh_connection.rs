use crate::connections::ssh::host_key::HostKeyPolicy;
use crate::connections::{connection::Connection, errors::ConnectionError};
use async_trait::async_trait;
use log::{error, info};
use ssh2::{Channel, Session};

use std::io::ErrorKind;
use std::{
    collections::VecDeque,
    io::{Read, Write},
    net::TcpStream,
    thread,
    time::Duration,
};
use tokio::sync::mpsc;

/// Password-authenticated SSH shell over `ssh2`.
///
/// `connect` performs the blocking session setup (TCP, handshake, host-key
/// check, auth, PTY + shell) on a blocking task so failures surface to the
/// caller, then hands the non-blocking channel to a dedicated worker thread
/// that bridges it to tokio mpsc channels.
pub struct SshConnection {
    host: String,
    port: u16,
    username: String,
    password: String,
    host_key_policy: HostKeyPolicy,

    write_tx: Option<mpsc::Sender<Vec<u8>>>,
    read_rx: Option<mpsc::Receiver<Vec<u8>>>,

    leftovers: VecDeque<u8>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SshConnection {
    pub fn new(
        host: String,
        port: u16,
        username: String,
        password: String,
        host_key_policy: HostKeyPolicy,
    ) -> Self {
        Self {
            host,
            port,
            username,
            password,
            host_key_policy,
            write_tx: None,
            read_rx: None,
            leftovers: VecDeque::new(),
            worker: None,
        }
    }
}

/// Blocking part of connection setup. Runs on a blocking task; every failure
/// here aborts the connect and is reported to the caller.
fn establish(
    addr: &str,
    host: &str,
    username: &str,
    password: &str,
    policy: &HostKeyPolicy,
) -> Result<(Session, Channel), ConnectionError> {
    let tcp = TcpStream::connect(addr)?;
    tcp.set_read_timeout(Some(Duration::from_millis(500))).ok();
    tcp.set_write_timeout(Some(Duration::from_millis(500))).ok();

    let mut session = Session::new()?;
    session.set_tcp_stream(tcp);
    session.handshake()?;

    policy.verify(host, &session)?;

    session
        .userauth_password(username, password)
        .map_err(|e| ConnectionError::AuthError(e.to_string()))?;
    if !session.authenticated() {
        return Err(ConnectionError::AuthError(
            "server rejected the credentials".into(),
        ));
    }

    let mut channel = session.channel_session()?;
    channel
        .request_pty("xterm", None, Some((80, 24, 0, 0)))
        .ok();
    channel.shell()?;
    session.set_blocking(false);

    Ok((session, channel))
}

/// Byte stream driven by the worker loop. Implemented by `ssh2::Channel`;
/// tests substitute their own.
trait ShellStream: Read + Write {
    fn at_eof(&self) -> bool;
}

impl ShellStream for Channel {
    fn at_eof(&self) -> bool {
        self.eof()
    }
}

/// Worker-thread I/O loop: drains pending writes, forwards remote output,
/// exits when either channel end is dropped or the stream reaches EOF.
fn io_loop<S: ShellStream>(
    mut stream: S,
    mut write_rx: mpsc::Receiver<Vec<u8>>,
    read_tx: mpsc::Sender<Vec<u8>>,
) {
    let mut buf = [0u8; 1024];

    loop {
        // outgoing
        loop {
            match write_rx.try_recv() {
                Ok(pkt) => {
                    if let Err(e) = stream.write_all(&pkt) {
                        error!("SSH write error: {}", e);
                        return;
                    }
                    stream.flush().ok();
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => return,
            }
        }

        // incoming
        match stream.read(&mut buf) {
            Ok(0) => {
                if stream.at_eof() {
                    info!("SSH channel reached EOF");
                    return;
                }
            }
            Ok(n) => {
                if read_tx.blocking_send(buf[..n].to_vec()).is_err() {
                    return; // receiver gone
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => { /* WouldBlock */ }
            Err(e) => {
                error!("SSH read error: {}", e);
                return;
            }
        }

        thread::sleep(Duration::from_millis(2));
    }
}

#[async_trait]
impl Connection for SshConnection {
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        let addr = format!("{}:{}", self.host, self.port);
        let host = self.host.clone();
        let username = self.username.clone();
        let password = self.password.clone();
        let policy = self.host_key_policy.clone();

        info!("Connecting to SSH server at {}", addr);

        let (session, channel) = tokio::task::spawn_blocking(move || {
            establish(&addr, &host, &username, &password, &policy)
        })
        .await
        .map_err(|_| ConnectionError::Other("SSH setup task panicked".into()))??;

        info!("SSH connection established");

        let (write_tx, write_rx) = mpsc::channel::<Vec<u8>>(32);
        let (read_tx, read_rx) = mpsc::channel::<Vec<u8>>(32);

        let worker = thread::spawn(move || {
            let _session = session; // keeps the transport alive for the channel's lifetime
            io_loop(channel, write_rx, read_tx)
        });

        self.write_tx = Some(write_tx);
        self.read_rx = Some(read_rx);
        self.worker = Some(worker);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ConnectionError> {
        self.write_tx = None; // tell worker to exit
        // Closing the read side too unblocks a worker stuck publishing remote
        // output into a full channel; otherwise the join below can wait forever.
        self.read_rx = None;
        if let Some(jh) = self.worker.take() {
            let _ = jh.join();
        }
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError> {
        match &self.write_tx {
            Some(tx) => {
                tx.send(data.to_vec())
                    .await
                    .map_err(|_| ConnectionError::Other("SSH write channel closed".into()))?;
                Ok(data.len())
            }
            None => Err(ConnectionError::Other("Not connected".into())),
        }
    }

    async fn read(&mut self, buffer: &mut [u8]) -> Result<usize, ConnectionError> {
        // serve leftovers first
        if !self.leftovers.is_empty() {
            let n = std::cmp::min(buffer.len(), self.leftovers.len());
            for (dst, src) in buffer.iter_mut().take(n).zip(self.leftovers.drain(..n)) {
                *dst = src;
            }
            return Ok(n);
        }

        match &mut self.read_rx {
            Some(rx) => match rx.recv().await {
                Some(mut chunk) => {
                    let n = std::cmp::min(buffer.len(), chunk.len());
                    buffer[..n].copy_from_slice(&chunk[..n]);
                    if chunk.len() > n {
                        self.leftovers.extend(chunk.split_off(n));
                    }
                    Ok(n)
                }
                None => Err(ConnectionError::Other("SSH connection closed".into())),
            },
            None => Err(ConnectionError::Other("Not connected".into())),
        }
    }
}
