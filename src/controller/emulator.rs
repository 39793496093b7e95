//! Emulator assembly.
//!
//! Wires the framer, the machine, the outbound writer and the executor
//! over one bidirectional byte stream. The writer task is the sole writer
//! of outbound bytes, so response frames stay atomic; the reader task
//! serialises command handling against executor ticks through the shared
//! machine lock.

use super::frame::Frame;
use super::framer::{Framer, Input};
use super::machine::{LineAction, Machine};
use super::settings::Settings;
use super::state::StatusSnapshot;
use super::{executor, homing};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A GRBL controller attached to a byte stream.
///
/// Dropping the emulator leaves its tasks running until the peer
/// disconnects; call [`Emulator::close`] for a deterministic stop.
pub struct Emulator {
    machine: Arc<Mutex<Machine>>,
    status_rx: watch::Receiver<StatusSnapshot>,
    shutdown_tx: watch::Sender<bool>,
    reader: Option<JoinHandle<()>>,
}

impl Emulator {
    /// Attaches a freshly powered-on controller with default settings.
    pub fn attach<R, W>(reader: R, writer: W, port_name: Option<String>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::with_settings(Settings::default(), reader, writer, port_name)
    }

    pub fn with_settings<R, W>(
        settings: Settings,
        reader: R,
        writer: W,
        port_name: Option<String>,
    ) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let machine = Machine::new(settings, frame_tx.clone(), port_name);
        let (status_tx, status_rx) = watch::channel(machine.snapshot());
        let machine = Arc::new(Mutex::new(machine));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(write_frames(writer, frame_rx));
        tokio::spawn(executor::run_executor(
            Arc::clone(&machine),
            status_tx,
            shutdown_rx.clone(),
        ));
        let reader_task = tokio::spawn(read_bytes(
            reader,
            Arc::clone(&machine),
            frame_tx,
            shutdown_rx,
        ));

        Self {
            machine,
            status_rx,
            shutdown_tx,
            reader: Some(reader_task),
        }
    }

    /// Coherent view of the controller right now.
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.machine.lock().await.snapshot()
    }

    /// Latest per-tick snapshot, for observers that want push updates
    /// (e.g. a position renderer) without polling the lock.
    pub fn subscribe_status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status_rx.clone()
    }

    /// Stops the tasks and releases the transport. In-flight motion is
    /// abandoned.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Waits until the peer disconnects or [`Emulator::close`] is called.
    pub async fn closed(&mut self) {
        if let Some(task) = self.reader.take() {
            let _ = task.await;
        }
    }
}

/// Drains the frame channel onto the transport. Write failures mean the
/// sender disconnected; the channel keeps draining so the simulation
/// never blocks on a dead peer.
async fn write_frames<W>(mut writer: W, mut frames: mpsc::UnboundedReceiver<Frame>)
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    while let Some(frame) = frames.recv().await {
        let text = frame.to_string();
        if let Err(e) = writer.write_all(text.as_bytes()).await {
            debug!(error = %e, "dropping frame, write failed");
            continue;
        }
        let _ = writer.flush().await;
    }
}

/// Feeds transport bytes through the framer and dispatches the results.
async fn read_bytes<R>(
    mut reader: R,
    machine: Arc<Mutex<Machine>>,
    frames: mpsc::UnboundedSender<Frame>,
    mut shutdown: watch::Receiver<bool>,
) where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut framer = Framer::new();
    let mut buf = [0u8; 512];
    loop {
        let n = tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    info!("transport closed");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    debug!(error = %e, "read failed");
                    break;
                }
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };

        for &byte in &buf[..n] {
            match framer.push(byte) {
                Some(Input::Realtime(cmd)) => machine.lock().await.handle_realtime(cmd),
                Some(Input::Line(line)) => {
                    let action = machine.lock().await.handle_line(&line);
                    if let LineAction::StartHoming(epoch) = action {
                        tokio::spawn(homing::run_homing(Arc::clone(&machine), epoch));
                    }
                }
                Some(Input::Overflow) => {
                    let _ = frames.send(Frame::Error(1));
                }
                None => {}
            }
        }
    }
}
