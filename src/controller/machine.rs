//! Controller core: the shared machine state and everything that mutates it.
//!
//! One `Machine` lives behind a single coarse mutex. The reader task calls
//! [`Machine::handle_line`] / [`Machine::handle_realtime`], the executor
//! task calls [`Machine::tick`], and the homing coordinator drives the
//! homing setpoint. Response frames go out through an unbounded channel to
//! the writer task; a send failure means the peer disconnected and is
//! ignored so simulation continues.

use super::arc;
use super::frame::{Frame, HARD_LIMIT_MSG};
use super::framer::RealtimeCommand;
use super::gcode::{self, ParseError};
use super::settings::{self, Settings};
use super::state::{MachineState, MotionMode, Position, StatusSnapshot};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A waypoint closer than this is considered reached.
pub const REACH_TOLERANCE_MM: f64 = 1e-3;

/// Feed rate floor (mm/min); `F` words below it are clamped up.
pub const FEED_FLOOR_MM_MIN: f64 = 0.1;

/// Travel speed while homing (mm/min).
pub const HOMING_FEED_MM_MIN: f64 = 500.0;

/// Slowest effective feed for Run/Jog motion (mm/min).
pub const MIN_RUN_FEED_MM_MIN: f64 = 100.0;

/// Follow-up the caller of [`Machine::handle_line`] must perform outside
/// the lock (the machine itself cannot spawn tasks).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineAction {
    None,
    /// Spawn the homing coordinator with this epoch.
    StartHoming(u64),
}

pub struct Machine {
    pub(crate) state: MachineState,
    /// Live machine position; mutated by `tick` and by homing snaps.
    pub(crate) mpos: Position,
    /// Planner target: queue tail destination, start point of the next block.
    pub(crate) target: Position,
    pub(crate) wco: Position,
    pub(crate) feed_rate: f64,
    pub(crate) motion_mode: MotionMode,
    pub(crate) relative: bool,
    pub(crate) queue: VecDeque<Position>,
    pub(crate) settings: Settings,
    pub(crate) homing_active: bool,
    pub(crate) homing_epoch: u64,
    /// Executor setpoint while state is Home; owned by the homing task.
    pub(crate) homing_target: Position,
    port_name: Option<String>,
    out: mpsc::UnboundedSender<Frame>,
}

impl Machine {
    pub fn new(
        settings: Settings,
        out: mpsc::UnboundedSender<Frame>,
        port_name: Option<String>,
    ) -> Self {
        Self {
            state: MachineState::Idle,
            mpos: Position::ZERO,
            target: Position::ZERO,
            wco: Position::ZERO,
            feed_rate: 1000.0,
            motion_mode: MotionMode::Rapid,
            relative: false,
            queue: VecDeque::new(),
            settings,
            homing_active: false,
            homing_epoch: 0,
            homing_target: Position::ZERO,
            port_name,
            out,
        }
    }

    /// Coherent view for status reports and external observers.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            mpos: self.mpos,
            wco: self.wco,
            feed_rate: self.feed_rate,
            port_name: self.port_name.clone(),
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    fn send(&self, frame: Frame) {
        let _ = self.out.send(frame);
    }

    /// Applies a real-time byte. Serialised against executor ticks by the
    /// shared lock.
    pub fn handle_realtime(&mut self, cmd: RealtimeCommand) {
        match cmd {
            RealtimeCommand::StatusReport => self.send(Frame::Status(self.snapshot())),
            RealtimeCommand::CycleStart => {
                if self.state == MachineState::Hold {
                    if self.queue.is_empty() {
                        self.state = MachineState::Idle;
                        self.target = self.mpos;
                    } else {
                        self.state = MachineState::Run;
                    }
                    debug!(state = self.state.as_str(), "resume");
                }
            }
            RealtimeCommand::FeedHold => {
                if self.state == MachineState::Run {
                    self.state = MachineState::Hold;
                    debug!("feed hold");
                }
            }
            RealtimeCommand::SoftReset => self.soft_reset(),
        }
    }

    /// Soft reset: cancels homing and motion. A jog in progress is simply
    /// discarded; anything else lands in Alarm.
    fn soft_reset(&mut self) {
        let was_jog = self.state == MachineState::Jog;
        self.homing_active = false;
        self.queue.clear();
        self.target = self.mpos;
        self.state = if was_jog {
            MachineState::Idle
        } else {
            MachineState::Alarm
        };
        info!(state = self.state.as_str(), "soft reset");
        self.send(Frame::Welcome);
    }

    /// Handles one complete command line. Every path answers with exactly
    /// one `ok` or `error:<n>`.
    pub fn handle_line(&mut self, line: &str) -> LineAction {
        let cmd = line.trim().to_uppercase();
        debug!(line = %cmd, "command");

        if self.state == MachineState::Alarm && !alarm_allowed(&cmd) {
            self.send(Frame::Error(9));
            return LineAction::None;
        }

        if cmd == "$$" {
            for (id, value) in self.settings.iter() {
                self.send(Frame::Setting { id, value });
            }
            self.send(Frame::Ok);
        } else if cmd == "$H" || cmd == "$HA" {
            let epoch = self.start_homing();
            self.send(Frame::Ok);
            return LineAction::StartHoming(epoch);
        } else if let Some(block) = cmd.strip_prefix("$J=") {
            match self.run_block(block, true) {
                Ok(()) => self.send(Frame::Ok),
                Err(e) => {
                    warn!(error = %e, "jog rejected");
                    self.send(Frame::Error(1));
                }
            }
        } else if cmd == "$X" {
            if self.state == MachineState::Alarm {
                self.state = MachineState::Idle;
                info!("alarm cleared");
            }
            self.send(Frame::Ok);
        } else if cmd == "$I" {
            self.send(Frame::BuildInfo);
            self.send(Frame::Ok);
        } else if cmd == "$G" {
            self.send(Frame::ParserState);
            self.send(Frame::Ok);
        } else if cmd.starts_with('$') {
            if let Some((id, value)) = settings::parse_assignment(&cmd) {
                self.settings.set(id, value);
                debug!(id, value, "setting stored");
            }
            // Any other well-formed system command succeeds, matching
            // sender expectations.
            self.send(Frame::Ok);
        } else {
            match self.run_block(&cmd, false) {
                Ok(()) => self.send(Frame::Ok),
                Err(e) => {
                    warn!(error = %e, "block rejected");
                    self.send(Frame::Error(1));
                }
            }
        }
        LineAction::None
    }

    fn start_homing(&mut self) -> u64 {
        self.homing_epoch += 1;
        self.homing_active = true;
        self.homing_target = self.mpos;
        self.queue.clear();
        self.state = MachineState::Home;
        info!("homing started");
        self.homing_epoch
    }

    /// Interprets one G-code block. `jog` blocks keep the persistent
    /// distance mode untouched and enter Jog instead of Run.
    fn run_block(&mut self, block: &str, jog: bool) -> Result<(), ParseError> {
        let stripped = gcode::strip_comments(block);
        let words = gcode::tokenize(&stripped)?;

        // G10/G92: work-offset assignment, no motion.
        if words.iter().any(|w| gcode::is_g(w, 10) || gcode::is_g(w, 92)) {
            for w in &words {
                match w.letter {
                    'X' => self.wco.x = self.mpos.x - w.value,
                    'Y' => self.wco.y = self.mpos.y - w.value,
                    'Z' => self.wco.z = self.mpos.z - w.value,
                    _ => {}
                }
            }
            debug!(wco = ?self.wco, "work offset set");
            return Ok(());
        }

        for w in &words {
            if gcode::is_g(w, 0) {
                self.motion_mode = MotionMode::Rapid;
            } else if gcode::is_g(w, 1) {
                self.motion_mode = MotionMode::Linear;
            } else if gcode::is_g(w, 2) {
                self.motion_mode = MotionMode::ArcCw;
            } else if gcode::is_g(w, 3) {
                self.motion_mode = MotionMode::ArcCcw;
            }
        }

        let mut relative = self.relative;
        for w in &words {
            if gcode::is_g(w, 90) {
                relative = false;
                if !jog {
                    self.relative = false;
                }
            } else if gcode::is_g(w, 91) {
                relative = true;
                if !jog {
                    self.relative = true;
                }
            }
        }

        let start = self.target;
        let mut target = self.target;
        let (mut i, mut j) = (0.0, 0.0);
        let mut has_motion = false;
        for w in &words {
            match w.letter {
                'F' => self.feed_rate = w.value.max(FEED_FLOOR_MM_MIN),
                'X' => {
                    target.x = if relative {
                        start.x + w.value
                    } else {
                        w.value + self.wco.x
                    };
                    has_motion = true;
                }
                'Y' => {
                    target.y = if relative {
                        start.y + w.value
                    } else {
                        w.value + self.wco.y
                    };
                    has_motion = true;
                }
                'Z' => {
                    target.z = if relative {
                        start.z + w.value
                    } else {
                        w.value + self.wco.z
                    };
                    has_motion = true;
                }
                'I' => {
                    i = w.value;
                    has_motion = true;
                }
                'J' => {
                    j = w.value;
                    has_motion = true;
                }
                // Plane is fixed to XY; a K offset selects no other plane.
                'K' => has_motion = true,
                'M' => self.apply_m(w.value),
                // G handled above; S and T are parsed without effect.
                _ => {}
            }
        }

        if has_motion {
            match self.motion_mode {
                MotionMode::Rapid | MotionMode::Linear => self.queue.push_back(target),
                MotionMode::ArcCw => self.queue.extend(arc::expand(start, target, i, j, true)),
                MotionMode::ArcCcw => self.queue.extend(arc::expand(start, target, i, j, false)),
            }
            self.target = target;
            if !self.homing_active {
                self.state = if jog {
                    MachineState::Jog
                } else {
                    MachineState::Run
                };
            }
        }
        Ok(())
    }

    fn apply_m(&mut self, value: f64) {
        match value as i64 {
            0 => {
                self.state = MachineState::Hold;
                info!("program pause");
            }
            // Spindle on/off and program end: parsed, no modelled effect.
            3 | 4 | 5 | 30 => {}
            _ => {}
        }
    }

    /// One executor tick: advance `mpos` toward the active target by
    /// `speed * dt` and enforce soft limits.
    pub fn tick(&mut self, dt: f64) {
        if !matches!(
            self.state,
            MachineState::Run | MachineState::Home | MachineState::Jog
        ) {
            return;
        }

        let target = match self.state {
            MachineState::Home => self.homing_target,
            _ => self.queue.front().copied().unwrap_or(self.target),
        };

        let dist = self.mpos.distance_to(&target);
        if dist <= REACH_TOLERANCE_MM {
            // Home: the homing coordinator polls position, nothing to pop.
            if matches!(self.state, MachineState::Run | MachineState::Jog) {
                self.advance_queue();
            }
            return;
        }

        let feed = match self.state {
            MachineState::Home => HOMING_FEED_MM_MIN,
            _ => self.feed_rate.max(MIN_RUN_FEED_MM_MIN),
        };
        let step = feed / 60.0 * dt;

        let mut next = if step >= dist {
            target
        } else {
            let s = step / dist;
            Position::new(
                self.mpos.x + (target.x - self.mpos.x) * s,
                self.mpos.y + (target.y - self.mpos.y) * s,
                self.mpos.z + (target.z - self.mpos.z) * s,
            )
        };

        let limits = self.settings.max_travel();
        let mut clamped = false;
        for axis in 0..3 {
            let v = next.axis(axis);
            let max = limits.axis(axis);
            if v < 0.0 || v > max {
                next.set_axis(axis, v.min(max).max(0.0));
                clamped = true;
            }
        }

        self.mpos = next;

        if clamped && !self.homing_active {
            self.queue.clear();
            self.target = self.mpos;
            self.state = MachineState::Alarm;
            warn!(mpos = ?self.mpos, "soft limit breach");
            self.send(Frame::Alarm(1));
            self.send(Frame::Message(HARD_LIMIT_MSG.to_string()));
        } else if step >= dist && matches!(self.state, MachineState::Run | MachineState::Jog) {
            self.advance_queue();
        }
    }

    fn advance_queue(&mut self) {
        self.queue.pop_front();
        if self.queue.is_empty() && !self.homing_active {
            self.state = MachineState::Idle;
            self.target = self.mpos;
        }
    }
}

fn alarm_allowed(cmd: &str) -> bool {
    cmd == "$X"
        || cmd == "$H"
        || cmd == "$HA"
        || cmd == "$$"
        || cmd.starts_with("$I")
        || cmd.starts_with("$G")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn machine() -> (Machine, UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Machine::new(Settings::default(), tx, None), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Frame>) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Runs ticks until the machine leaves Run/Jog/Home or the step
    /// budget runs out.
    fn run_to_rest(m: &mut Machine) {
        for _ in 0..100_000 {
            m.tick(0.01);
            if !matches!(
                m.state,
                MachineState::Run | MachineState::Jog | MachineState::Home
            ) {
                return;
            }
        }
        panic!("machine did not come to rest");
    }

    #[test]
    fn test_initial_state() {
        let (m, _rx) = machine();
        assert_eq!(m.state, MachineState::Idle);
        assert_eq!(m.mpos, Position::ZERO);
        assert_eq!(m.target, Position::ZERO);
        assert_eq!(m.feed_rate, 1000.0);
        assert_eq!(m.motion_mode, MotionMode::Rapid);
        assert!(!m.relative);
        assert!(m.queue.is_empty());
    }

    #[test]
    fn test_linear_move_queues_and_runs() {
        let (mut m, mut rx) = machine();
        m.handle_line("G90 G1 X10 Y0 Z0 F600");
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);
        assert_eq!(m.state, MachineState::Run);
        assert_eq!(m.queue.len(), 1);
        assert_eq!(m.target, Position::new(10.0, 0.0, 0.0));
        assert_eq!(m.feed_rate, 600.0);

        run_to_rest(&mut m);
        assert_eq!(m.state, MachineState::Idle);
        assert!(m.mpos.distance_to(&Position::new(10.0, 0.0, 0.0)) <= 1e-3);
        assert_eq!(m.mpos, m.target);
    }

    #[test]
    fn test_motion_mode_persists_across_blocks() {
        let (mut m, _rx) = machine();
        m.handle_line("G1 X1 F600");
        run_to_rest(&mut m);
        // No G word: the latched G1 still applies.
        m.handle_line("X2");
        assert_eq!(m.state, MachineState::Run);
        assert_eq!(m.target.x, 2.0);
    }

    #[test]
    fn test_relative_then_absolute() {
        let (mut m, _rx) = machine();
        m.handle_line("G90 G1 X5 Y5 F6000");
        run_to_rest(&mut m);
        m.handle_line("G91");
        m.handle_line("G1 X2 Y3");
        run_to_rest(&mut m);
        assert!(m.mpos.distance_to(&Position::new(7.0, 8.0, 0.0)) <= 1e-3);
        m.handle_line("G90 X0");
        run_to_rest(&mut m);
        assert!(m.mpos.distance_to(&Position::new(0.0, 8.0, 0.0)) <= 1e-3);
    }

    #[test]
    fn test_axes_not_mentioned_keep_planner_target() {
        let (mut m, _rx) = machine();
        m.handle_line("G0 X10 Y20 Z5");
        m.handle_line("X1");
        assert_eq!(m.target, Position::new(1.0, 20.0, 5.0));
    }

    #[test]
    fn test_work_offset_g92() {
        let (mut m, mut rx) = machine();
        m.handle_line("G0 X5 Y5");
        run_to_rest(&mut m);
        drain(&mut rx);

        m.handle_line("G92 X0 Y0 Z0");
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);
        assert_eq!(m.state, MachineState::Idle);
        assert!(m.queue.is_empty());
        assert!((m.wco.x - 5.0).abs() < 1e-9);
        assert!((m.wco.y - 5.0).abs() < 1e-9);

        // Work X2 now means machine X7.
        m.handle_line("G90 G1 X2");
        assert!((m.target.x - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_arc_block_expands_to_waypoints() {
        let (mut m, _rx) = machine();
        m.handle_line("G0 X10 Y0");
        run_to_rest(&mut m);
        // Counter-clockwise quarter circle, stays inside the work envelope.
        m.handle_line("G3 X0 Y10 I-10 J0 F600");
        assert!(m.queue.len() > 10);
        assert_eq!(m.target, Position::new(0.0, 10.0, 0.0));
        run_to_rest(&mut m);
        assert_eq!(m.state, MachineState::Idle);
        assert!(m.mpos.distance_to(&Position::new(0.0, 10.0, 0.0)) <= 1e-2);
    }

    #[test]
    fn test_malformed_block_is_error_1() {
        let (mut m, mut rx) = machine();
        m.handle_line("G1 Q10");
        assert_eq!(drain(&mut rx), vec![Frame::Error(1)]);
        assert_eq!(m.state, MachineState::Idle);
        assert!(m.queue.is_empty());
    }

    #[test]
    fn test_feed_floor() {
        let (mut m, _rx) = machine();
        m.handle_line("G1 X1 F0.05");
        assert_eq!(m.feed_rate, FEED_FLOOR_MM_MIN);
    }

    #[test]
    fn test_m0_holds() {
        let (mut m, _rx) = machine();
        m.handle_line("G1 X10 F600");
        m.handle_line("M0");
        assert_eq!(m.state, MachineState::Hold);
        // Executor is frozen in Hold.
        let before = m.mpos;
        m.tick(0.1);
        assert_eq!(m.mpos, before);
        // Resume with a non-empty queue goes back to Run.
        m.handle_realtime(RealtimeCommand::CycleStart);
        assert_eq!(m.state, MachineState::Run);
    }

    #[test]
    fn test_resume_with_empty_queue_is_idle() {
        let (mut m, _rx) = machine();
        m.handle_line("M0");
        assert_eq!(m.state, MachineState::Hold);
        m.handle_realtime(RealtimeCommand::CycleStart);
        assert_eq!(m.state, MachineState::Idle);
    }

    #[test]
    fn test_feed_hold_realtime() {
        let (mut m, _rx) = machine();
        m.handle_line("G1 X50 F600");
        m.handle_realtime(RealtimeCommand::FeedHold);
        assert_eq!(m.state, MachineState::Hold);
    }

    #[test]
    fn test_soft_limit_breach_alarms_and_clamps() {
        let (mut m, mut rx) = machine();
        m.handle_line("G90 G1 X500 F2000");
        drain(&mut rx);
        run_to_rest(&mut m);
        assert_eq!(m.state, MachineState::Alarm);
        assert_eq!(m.mpos.x, 300.0);
        assert!(m.queue.is_empty());
        assert_eq!(m.target, m.mpos);
        let frames = drain(&mut rx);
        assert_eq!(frames[0], Frame::Alarm(1));
        assert!(matches!(frames[1], Frame::Message(_)));
    }

    #[test]
    fn test_alarm_gates_gcode() {
        let (mut m, mut rx) = machine();
        m.handle_realtime(RealtimeCommand::SoftReset);
        assert_eq!(m.state, MachineState::Alarm);
        drain(&mut rx);

        m.handle_line("G1 X1");
        assert_eq!(drain(&mut rx), vec![Frame::Error(9)]);

        m.handle_line("$X");
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);
        assert_eq!(m.state, MachineState::Idle);

        m.handle_line("G1 X1 F600");
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);
        assert_eq!(m.state, MachineState::Run);
    }

    #[test]
    fn test_alarm_allows_queries() {
        let (mut m, mut rx) = machine();
        m.handle_realtime(RealtimeCommand::SoftReset);
        drain(&mut rx);

        m.handle_line("$$");
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), m.settings.len() + 1);
        assert_eq!(frames.last(), Some(&Frame::Ok));

        m.handle_line("$I");
        assert_eq!(drain(&mut rx), vec![Frame::BuildInfo, Frame::Ok]);

        m.handle_line("$G");
        assert_eq!(drain(&mut rx), vec![Frame::ParserState, Frame::Ok]);
    }

    #[test]
    fn test_settings_dump_and_assignment() {
        let (mut m, mut rx) = machine();
        m.handle_line("$$");
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 35);
        assert_eq!(frames[0], Frame::Setting { id: 0, value: 10.0 });
        assert_eq!(frames.last(), Some(&Frame::Ok));

        m.handle_line("$131=222.5");
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);
        assert_eq!(m.settings.get(131), Some(222.5));
    }

    #[test]
    fn test_unknown_system_command_is_ok() {
        let (mut m, mut rx) = machine();
        m.handle_line("$SLP");
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);
    }

    #[test]
    fn test_jog_enters_jog_state_without_latching_mode() {
        let (mut m, mut rx) = machine();
        m.handle_line("$J=G91 X5 F600");
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);
        assert_eq!(m.state, MachineState::Jog);
        assert_eq!(m.target.x, 5.0);
        // Persistent distance mode untouched.
        assert!(!m.relative);
        run_to_rest(&mut m);
        assert_eq!(m.state, MachineState::Idle);
    }

    #[test]
    fn test_soft_reset_during_jog_returns_to_idle() {
        let (mut m, mut rx) = machine();
        m.handle_line("$J=G91 X50 F600");
        drain(&mut rx);
        m.tick(0.01);
        m.handle_realtime(RealtimeCommand::SoftReset);
        assert_eq!(m.state, MachineState::Idle);
        assert!(m.queue.is_empty());
        assert_eq!(m.target, m.mpos);
        assert_eq!(drain(&mut rx), vec![Frame::Welcome]);
    }

    #[test]
    fn test_soft_reset_during_run_alarms() {
        let (mut m, mut rx) = machine();
        m.handle_line("G1 X50 F600");
        drain(&mut rx);
        m.handle_realtime(RealtimeCommand::SoftReset);
        assert_eq!(m.state, MachineState::Alarm);
        assert!(m.queue.is_empty());
        assert_eq!(drain(&mut rx), vec![Frame::Welcome]);
    }

    #[test]
    fn test_status_report_matches_state() {
        let (mut m, mut rx) = machine();
        m.handle_realtime(RealtimeCommand::StatusReport);
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            Frame::Status(s) => {
                assert_eq!(s.state, MachineState::Idle);
                assert_eq!(s.mpos, Position::ZERO);
            }
            other => panic!("expected status frame, got {:?}", other),
        }
    }

    #[test]
    fn test_status_report_does_not_disturb_motion() {
        let (mut m, mut rx) = machine();
        m.handle_line("G1 X10 F600");
        m.tick(0.05);
        let mpos = m.mpos;
        let state = m.state;
        for _ in 0..5 {
            m.handle_realtime(RealtimeCommand::StatusReport);
        }
        assert_eq!(m.mpos, mpos);
        assert_eq!(m.state, state);
        drain(&mut rx);
    }

    #[test]
    fn test_homing_command_requests_coordinator() {
        let (mut m, mut rx) = machine();
        let action = m.handle_line("$H");
        assert_eq!(action, LineAction::StartHoming(1));
        assert_eq!(m.state, MachineState::Home);
        assert!(m.homing_active);
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);

        // A second $H supersedes the first epoch.
        let action = m.handle_line("$HA");
        assert_eq!(action, LineAction::StartHoming(2));
    }

    #[test]
    fn test_comment_stripped_block() {
        let (mut m, mut rx) = machine();
        m.handle_line("G1 (rough pass) X3 F600");
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);
        assert_eq!(m.target.x, 3.0);
    }

    #[test]
    fn test_spindle_words_accepted_without_effect() {
        let (mut m, mut rx) = machine();
        m.handle_line("M3 S1000");
        assert_eq!(drain(&mut rx), vec![Frame::Ok]);
        assert_eq!(m.state, MachineState::Idle);
        m.handle_line("M5");
        m.handle_line("M30");
        assert_eq!(drain(&mut rx), vec![Frame::Ok, Frame::Ok]);
    }

    #[test]
    fn test_run_position_is_monotonic_toward_target() {
        let (mut m, _rx) = machine();
        m.handle_line("G1 X100 F100");
        let mut last_x = 0.0;
        for _ in 0..50 {
            m.tick(0.05);
            assert!(m.mpos.x >= last_x);
            last_x = m.mpos.x;
        }
        assert!(last_x > 0.0);
    }
}
