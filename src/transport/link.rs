//! Dial seam between the transport channel and the physical bridge.
//!
//! [`BridgeLink`] abstracts how the byte stream to the controller is
//! established so the reconnect state machine can be exercised against an
//! in-memory duplex in tests. Production uses [`TcpLink`].

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Byte stream to the bridge. Object-safe alias over the tokio I/O traits.
pub trait BridgeStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> BridgeStream for T {}

/// Establishes a fresh connection to the device bridge.
#[async_trait]
pub trait BridgeLink: Send + Sync {
    /// Dials the bridge, returning a connected byte stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the bridge is unreachable;
    /// the caller counts the failure and schedules a retry.
    async fn dial(&self) -> std::io::Result<Box<dyn BridgeStream>>;
}

/// TCP connection to the bridge's serial-over-network endpoint.
#[derive(Debug, Clone)]
pub struct TcpLink {
    addr: String,
}

impl TcpLink {
    /// Creates a link dialing `addr` (`host:port`).
    #[must_use]
    pub fn new(addr: String) -> Self {
        Self { addr }
    }
}

#[async_trait]
impl BridgeLink for TcpLink {
    async fn dial(&self) -> std::io::Result<Box<dyn BridgeStream>> {
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}
