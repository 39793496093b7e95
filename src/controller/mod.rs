//! GRBL v1.1 controller emulation.
//!
//! **Public API:** [`Emulator`] — attach to any async byte stream, observe
//! with [`Emulator::snapshot`] or [`Emulator::subscribe_status`], stop with
//! [`Emulator::close`].
//!
//! Protocol types (frames, real-time commands, settings, machine state)
//! are re-exported.

mod arc;
mod emulator;
mod executor;
mod frame;
mod framer;
mod gcode;
mod homing;
mod machine;
mod settings;
mod state;

pub use arc::CHORD_MM;
pub use emulator::*;
pub use executor::TICK_INTERVAL_MS;
pub use frame::*;
pub use framer::*;
pub use gcode::ParseError;
pub use homing::{BACKOFF_DWELL, BACKOFF_MM, SEEK_TOLERANCE_MM};
pub use machine::*;
pub use settings::*;
pub use state::*;
