//! Byte framer for the inbound stream.
//!
//! Consumes raw bytes one at a time. Real-time command bytes are extracted
//! out-of-band and never touch the line accumulator; CR/LF flushes the
//! accumulated line. Everything else, UTF-8 or not, is opaque line content.

/// Longest accepted command line. Anything longer is discarded and the
/// terminator yields [`Input::Overflow`].
pub const MAX_LINE_LEN: usize = 256;

/// Real-time single-byte command, interpreted immediately and out-of-band
/// of the line protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RealtimeCommand {
    /// Status report request (`?`).
    StatusReport,
    /// Cycle start / resume (`~`).
    CycleStart,
    /// Feed hold (`!`).
    FeedHold,
    /// Soft reset (Ctrl-X, 0x18).
    SoftReset,
}

impl RealtimeCommand {
    /// Decodes a real-time byte, or `None` for ordinary line content.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'?' => Some(RealtimeCommand::StatusReport),
            b'~' => Some(RealtimeCommand::CycleStart),
            b'!' => Some(RealtimeCommand::FeedHold),
            0x18 => Some(RealtimeCommand::SoftReset),
            _ => None,
        }
    }

    /// The wire byte.
    pub fn as_byte(self) -> u8 {
        match self {
            RealtimeCommand::StatusReport => b'?',
            RealtimeCommand::CycleStart => b'~',
            RealtimeCommand::FeedHold => b'!',
            RealtimeCommand::SoftReset => 0x18,
        }
    }
}

/// One unit of input produced by the framer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Real-time byte, delivered immediately.
    Realtime(RealtimeCommand),
    /// A complete, trimmed, non-empty command line.
    Line(String),
    /// A terminated line that exceeded [`MAX_LINE_LEN`] and was discarded.
    Overflow,
}

/// Accumulates bytes into command lines, extracting real-time bytes.
#[derive(Debug, Default)]
pub struct Framer {
    buf: Vec<u8>,
    overflowed: bool,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte; returns an [`Input`] when the byte completes one.
    pub fn push(&mut self, byte: u8) -> Option<Input> {
        if let Some(rt) = RealtimeCommand::from_byte(byte) {
            return Some(Input::Realtime(rt));
        }
        match byte {
            b'\r' | b'\n' => {
                let overflowed = std::mem::take(&mut self.overflowed);
                let line = String::from_utf8_lossy(&self.buf).trim().to_string();
                self.buf.clear();
                if overflowed {
                    Some(Input::Overflow)
                } else if line.is_empty() {
                    None
                } else {
                    Some(Input::Line(line))
                }
            }
            _ => {
                if self.buf.len() >= MAX_LINE_LEN {
                    self.overflowed = true;
                } else {
                    self.buf.push(byte);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_str(framer: &mut Framer, s: &str) -> Vec<Input> {
        s.bytes().filter_map(|b| framer.push(b)).collect()
    }

    #[test]
    fn test_line_flush_on_newline() {
        let mut f = Framer::new();
        let inputs = push_str(&mut f, "G0 X10\n");
        assert_eq!(inputs, vec![Input::Line("G0 X10".to_string())]);
    }

    #[test]
    fn test_line_flush_on_cr() {
        let mut f = Framer::new();
        let inputs = push_str(&mut f, "$$\r");
        assert_eq!(inputs, vec![Input::Line("$$".to_string())]);
    }

    #[test]
    fn test_crlf_yields_single_line() {
        let mut f = Framer::new();
        let inputs = push_str(&mut f, "G1 X1\r\n");
        assert_eq!(inputs, vec![Input::Line("G1 X1".to_string())]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut f = Framer::new();
        assert!(push_str(&mut f, "\n\r\n   \n").is_empty());
    }

    #[test]
    fn test_realtime_extracted_mid_line() {
        let mut f = Framer::new();
        let inputs = push_str(&mut f, "G1 ?X10\n");
        assert_eq!(
            inputs,
            vec![
                Input::Realtime(RealtimeCommand::StatusReport),
                Input::Line("G1 X10".to_string()),
            ]
        );
    }

    #[test]
    fn test_all_realtime_bytes() {
        let mut f = Framer::new();
        assert_eq!(
            f.push(b'?'),
            Some(Input::Realtime(RealtimeCommand::StatusReport))
        );
        assert_eq!(
            f.push(b'~'),
            Some(Input::Realtime(RealtimeCommand::CycleStart))
        );
        assert_eq!(
            f.push(b'!'),
            Some(Input::Realtime(RealtimeCommand::FeedHold))
        );
        assert_eq!(
            f.push(0x18),
            Some(Input::Realtime(RealtimeCommand::SoftReset))
        );
    }

    #[test]
    fn test_realtime_roundtrip() {
        for b in [b'?', b'~', b'!', 0x18] {
            assert_eq!(RealtimeCommand::from_byte(b).unwrap().as_byte(), b);
        }
        assert_eq!(RealtimeCommand::from_byte(b'G'), None);
    }

    #[test]
    fn test_overflow_discards_line() {
        let mut f = Framer::new();
        for _ in 0..(MAX_LINE_LEN + 10) {
            assert_eq!(f.push(b'X'), None);
        }
        assert_eq!(f.push(b'\n'), Some(Input::Overflow));
        // Next line is framed normally again.
        let inputs = push_str(&mut f, "G0 X1\n");
        assert_eq!(inputs, vec![Input::Line("G0 X1".to_string())]);
    }

    #[test]
    fn test_non_utf8_bytes_are_line_content() {
        let mut f = Framer::new();
        assert_eq!(f.push(0xFF), None);
        assert!(f.push(b'\n').is_some());
    }
}
