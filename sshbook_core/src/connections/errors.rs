use std::fmt::{self, Display};

/// A central error enum for connection-related errors.
#[derive(Debug)]
pub enum ConnectionError {
    IoError(std::io::Error),
    /// The server rejected the supplied credentials.
    AuthError(String),
    /// The presented host key was rejected by the active policy.
    HostKeyRejected(String),
    /// SSH transport/protocol failure (handshake, channel setup, ...).
    ProtocolError(String),
    Other(String),
}

/// Convert from std::io::Error.
impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> ConnectionError {
        ConnectionError::IoError(err)
    }
}

/// Convert from ssh2::Error.
/// Without this, `map_err(ConnectionError::from)` won't work around ssh2 calls.
impl From<ssh2::Error> for ConnectionError {
    fn from(err: ssh2::Error) -> Self {
        ConnectionError::ProtocolError(err.to_string())
    }
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::IoError(e) => write!(f, "IO error: {}", e),
            ConnectionError::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            ConnectionError::HostKeyRejected(msg) => write!(f, "Host key rejected: {}", msg),
            ConnectionError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            ConnectionError::Other(msg) => write!(f, "Other error: {}", msg),
        }
    }
}

impl std::error::Error for ConnectionError {}
