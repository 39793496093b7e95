//! GRBL v1.1 CNC controller emulator.
//!
//! Speaks the GRBL serial protocol — `\r\n`-terminated command lines plus
//! single-byte real-time commands — over any byte stream, interprets a
//! narrow G-code subset (G0/G1 linear, G2/G3 arcs, G10/G92 work offsets,
//! G90/G91 distance modes, `$` system commands, jogging and homing), and
//! integrates a simulated 3-axis machine position through time so sender
//! software observes plausible controller behavior.
//!
//! ```ignore
//! use grbl_sim::controller::Emulator;
//!
//! let (client, server) = tokio::io::duplex(4096);
//! let (reader, writer) = tokio::io::split(server);
//! let emulator = Emulator::attach(reader, writer, None);
//! // Write "$$\r\n" on `client` and read the settings dump back.
//! let status = emulator.snapshot().await;
//! ```

pub mod controller;
pub mod transport;
