use crate::connections::errors::ConnectionError;
use async_trait::async_trait;

/// A byte-stream transport to a remote shell.
///
/// Implementations are created in a disconnected state; `connect` performs
/// the actual session setup and must be called before `read`/`write`.
#[async_trait]
pub trait Connection {
    async fn connect(&mut self) -> Result<(), ConnectionError>;
    async fn disconnect(&mut self) -> Result<(), ConnectionError>;
    async fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError>;
    async fn read(&mut self, buffer: &mut [u8]) -> Result<usize, ConnectionError>;
}
