//! Transports exposing the emulator as a serial-like device.
//!
//! The reference deployment is a pseudo-terminal (feature `pty`): senders
//! open the slave path exactly as they would a USB serial port. A TCP
//! server is provided for machines without pty support and for loopback
//! testing.

#[cfg(feature = "pty")]
mod pty;
#[cfg(feature = "pty")]
pub use pty::PtyTransport;

use crate::controller::Emulator;
use thiserror::Error;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::info;

/// Errors from transport setup.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "pty")]
    #[error("pty: {0}")]
    Pty(#[from] nix::Error),
}

/// Serves the emulator over TCP, one sender at a time. Each connection
/// talks to a freshly powered-on controller.
pub async fn serve_tcp<A: ToSocketAddrs>(addr: A) -> Result<(), TransportError> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    info!(%local, "GRBL emulator listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "sender connected");
        let (reader, writer) = stream.into_split();
        let mut emulator = Emulator::attach(reader, writer, Some(local.to_string()));
        emulator.closed().await;
        emulator.close();
        info!(%peer, "sender disconnected");
    }
}
