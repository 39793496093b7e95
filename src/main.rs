//! Emulator binary.
//!
//! Default transport is a pseudo-terminal (feature `pty`): the slave path
//! is logged at startup and senders open it as a serial port. `--tcp ADDR`
//! serves over TCP instead; `--stdio` attaches to stdin/stdout.

use grbl_sim::controller::Emulator;
use grbl_sim::transport;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("--tcp") => {
            let addr = args.next().unwrap_or_else(|| "127.0.0.1:23123".to_string());
            transport::serve_tcp(addr).await?;
        }
        Some("--stdio") => serve_stdio().await,
        None => serve_default().await?,
        Some(other) => {
            eprintln!("usage: grbl-sim [--tcp ADDR | --stdio]");
            return Err(format!("unknown argument: {}", other).into());
        }
    }
    Ok(())
}

async fn serve_stdio() {
    info!("GRBL emulator on stdio");
    let mut emulator = Emulator::attach(
        tokio::io::stdin(),
        tokio::io::stdout(),
        Some("stdio".to_string()),
    );
    emulator.closed().await;
}

#[cfg(feature = "pty")]
async fn serve_default() -> Result<(), Box<dyn std::error::Error>> {
    let pty = transport::PtyTransport::open()?;
    let (reader, writer) = pty.split()?;
    info!(port = pty.slave_path(), "GRBL emulator listening");
    let mut emulator = Emulator::attach(reader, writer, Some(pty.slave_path().to_string()));
    emulator.closed().await;
    Ok(())
}

#[cfg(not(feature = "pty"))]
async fn serve_default() -> Result<(), Box<dyn std::error::Error>> {
    serve_stdio().await;
    Ok(())
}
