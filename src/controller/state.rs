//! Controller state types.
//!
//! Types only — no logic beyond small accessors. Used by the interpreter,
//! the executor and anything that observes machine status.

use serde::{Deserialize, Serialize};

/// Position in machine coordinates, millimetres per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ZERO: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Axis component by index (0 = X, 1 = Y, 2 = Z).
    pub fn axis(&self, i: usize) -> f64 {
        match i {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn set_axis(&mut self, i: usize, value: f64) {
        match i {
            0 => self.x = value,
            1 => self.y = value,
            _ => self.z = value,
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Supervisor state. Wire spellings are exact GRBL 1.1 state names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    Idle,
    Run,
    Hold,
    Home,
    Alarm,
    Jog,
}

impl MachineState {
    /// Exact state name as it appears in a status report.
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineState::Idle => "Idle",
            MachineState::Run => "Run",
            MachineState::Hold => "Hold",
            MachineState::Home => "Home",
            MachineState::Alarm => "Alarm",
            MachineState::Jog => "Jog",
        }
    }
}

/// Modal motion mode, latched by G0/G1/G2/G3 and persisting across blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    #[default]
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
}

/// Coherent view of the controller for status reports and external
/// observers (e.g. a visualization front-end sampling position).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: MachineState,
    /// Machine position.
    pub mpos: Position,
    /// Work coordinate offset; `machine = work + wco`.
    pub wco: Position,
    /// Active feed rate in mm/min.
    pub feed_rate: f64,
    /// Transport identifier (e.g. pty slave path), if known.
    pub port_name: Option<String>,
}

impl StatusSnapshot {
    /// Snapshot of a freshly powered-on controller.
    pub fn idle() -> Self {
        Self {
            state: MachineState::Idle,
            mpos: Position::ZERO,
            wco: Position::ZERO,
            feed_rate: 1000.0,
            port_name: None,
        }
    }
}
