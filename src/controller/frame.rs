//! Outbound response frames.
//!
//! Each frame implements `Display` to produce the exact bytes sent on the
//! wire, `\r\n` line endings included. The writer task serializes whole
//! frames so they stay atomic on the stream.

use super::settings::format_value;
use super::state::StatusSnapshot;
use std::fmt;

/// Message block accompanying a soft-limit `ALARM:1`.
pub const HARD_LIMIT_MSG: &str = "Hard limit triggered. Machine position is \
likely lost due to sudden and immediate halt. Re-homing is highly recommended.";

/// One response frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// `ok` — line accepted.
    Ok,
    /// `error:<n>` — line rejected.
    Error(u8),
    /// `ALARM:<n>` — alarm raised.
    Alarm(u8),
    /// `[MSG:...]` informational block.
    Message(String),
    /// `<State|MPos:..|WCO:..|FS:..>` status report.
    Status(StatusSnapshot),
    /// One `$n=v` line of a settings dump.
    Setting { id: u16, value: f64 },
    /// Welcome banner printed on soft reset.
    Welcome,
    /// `$I` build info block.
    BuildInfo,
    /// `$G` parser state block. Fixed text; modal variables are not tracked.
    ParserState,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Ok => write!(f, "ok\r\n"),
            Frame::Error(n) => write!(f, "error:{}\r\n", n),
            Frame::Alarm(n) => write!(f, "ALARM:{}\r\n", n),
            Frame::Message(msg) => write!(f, "[MSG:{}]\r\n", msg),
            Frame::Status(s) => write!(
                f,
                "<{}|MPos:{:.3},{:.3},{:.3}|WCO:{:.3},{:.3},{:.3}|FS:{},0>\r\n",
                s.state.as_str(),
                s.mpos.x,
                s.mpos.y,
                s.mpos.z,
                s.wco.x,
                s.wco.y,
                s.wco.z,
                s.feed_rate as i64,
            ),
            Frame::Setting { id, value } => {
                write!(f, "${}={}\r\n", id, format_value(*value))
            }
            Frame::Welcome => write!(f, "Grbl 1.1f ['$' for help]\r\n"),
            Frame::BuildInfo => write!(f, "[VER:1.1f.20170801:]\r\n[OPT:V,15,128]\r\n"),
            Frame::ParserState => {
                write!(f, "[GC:G0 G54 G17 G21 G90 G94 M5 M9 T0 F0 S0]\r\n")
            }
        }
    }
}
