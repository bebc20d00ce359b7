//! Serial link framing.
//!
//! Engine to host, every frame starts with a single letter:
//! * `L<text>\n` - a log line.
//! * `R` / `S` - the computer wants a byte from the tape reader /
//!   teleprinter.  The host answers with exactly one byte.
//! * `P<byte>` / `Q<byte>` - the computer punched / printed a byte.  The host
//!   does not answer.
//! * `0x00` - the engine has (re)started the computer.
//!
//! Host to engine, bytes are data unless escaped:
//! * `255, 255` - a literal data byte of 255.
//! * `255, x` for any other `x` - restart.
//! * `D` outside a read - toggle the timing profile.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use core::fmt;
use heapless::Vec;
use static_assertions::const_assert;

use crate::request::RequestKind;

/// Host to engine escape byte.
pub const ESCAPE: u8 = 255;

/// Host to engine timing profile toggle.
pub const TOGGLE_TIMING: u8 = b'D';

/// Engine to host restart announcement.
pub const RESTART_ANNOUNCE: u8 = 0x00;

/// Longest log text sent, excluding the letter and newline.
pub const LOG_LINE_MAX: usize = 120;

/// Longest encoded frame.
pub const FRAME_MAX: usize = LOG_LINE_MAX + 2;

const LOG: u8 = b'L';
const READ_TAPE: u8 = b'R';
const READ_TELEPRINTER: u8 = b'S';
const PUNCH_TAPE: u8 = b'P';
const WRITE_TELEPRINTER: u8 = b'Q';

const_assert!(RESTART_ANNOUNCE != LOG);
const_assert!(RESTART_ANNOUNCE != READ_TAPE);
const_assert!(RESTART_ANNOUNCE != PUNCH_TAPE);
const_assert!(TOGGLE_TIMING != ESCAPE);

/// An encoded frame.
pub type FrameBuf = Vec<u8, FRAME_MAX>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The frame did not fit the buffer.
    Overflow,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => write!(f, "frame overflow"),
        }
    }
}

/// One engine to host frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    Log(&'a str),
    ReadTape,
    ReadTeleprinter,
    PunchTape(u8),
    WriteTeleprinter(u8),
    RestartAnnounce,
}

impl<'a> Frame<'a> {
    /// The frame that starts a transfer of the given kind.  `data` is the
    /// punched byte, ignored for reads.
    pub fn for_request(kind: RequestKind, data: u8) -> Option<Self> {
        match kind {
            RequestKind::ReadTape => Some(Self::ReadTape),
            RequestKind::ReadTeleprinter => Some(Self::ReadTeleprinter),
            RequestKind::PunchTape => Some(Self::PunchTape(data)),
            RequestKind::WriteTeleprinter => Some(Self::WriteTeleprinter(data)),
            RequestKind::None | RequestKind::Malformed => None,
        }
    }

    /// Encode the frame.  Log text has newlines replaced by spaces and is cut
    /// at [`LOG_LINE_MAX`] bytes.
    pub fn encode(&self) -> Result<FrameBuf, FrameError> {
        let mut buf = FrameBuf::new();
        match *self {
            Self::Log(text) => {
                push(&mut buf, LOG)?;
                for &b in text.as_bytes().iter().take(LOG_LINE_MAX) {
                    push(&mut buf, if b == b'\n' { b' ' } else { b })?;
                }
                push(&mut buf, b'\n')?;
            }
            Self::ReadTape => push(&mut buf, READ_TAPE)?,
            Self::ReadTeleprinter => push(&mut buf, READ_TELEPRINTER)?,
            Self::PunchTape(data) => {
                push(&mut buf, PUNCH_TAPE)?;
                push(&mut buf, data)?;
            }
            Self::WriteTeleprinter(data) => {
                push(&mut buf, WRITE_TELEPRINTER)?;
                push(&mut buf, data)?;
            }
            Self::RestartAnnounce => push(&mut buf, RESTART_ANNOUNCE)?,
        }
        Ok(buf)
    }
}

fn push(buf: &mut FrameBuf, b: u8) -> Result<(), FrameError> {
    buf.push(b).map_err(|_| FrameError::Overflow)
}

/// A decoded host byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Inbound {
    Byte(u8),
    Restart,
}

/// Undoes the host's escaping, one byte at a time.
#[derive(Clone, Copy, Debug, Default)]
pub struct Deframer {
    escaped: bool,
}

impl Deframer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte from the host.  Returns `None` while an escape sequence
    /// is incomplete.
    pub fn push(&mut self, b: u8) -> Option<Inbound> {
        if self.escaped {
            self.escaped = false;
            if b == ESCAPE {
                Some(Inbound::Byte(ESCAPE))
            } else {
                Some(Inbound::Restart)
            }
        } else if b == ESCAPE {
            self.escaped = true;
            None
        } else {
            Some(Inbound::Byte(b))
        }
    }

    /// Drop any half-received escape sequence.
    pub fn reset(&mut self) {
        self.escaped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::vec::Vec;

    #[test]
    fn single_letter_frames() {
        assert_eq!(Frame::ReadTape.encode().unwrap(), b"R");
        assert_eq!(Frame::ReadTeleprinter.encode().unwrap(), b"S");
        assert_eq!(Frame::RestartAnnounce.encode().unwrap(), [0u8]);
    }

    #[test]
    fn punch_frames_carry_data() {
        assert_eq!(Frame::PunchTape(0x1b).encode().unwrap(), [b'P', 0x1b]);
        assert_eq!(Frame::WriteTeleprinter(255).encode().unwrap(), [b'Q', 255]);
    }

    #[test]
    fn log_frame() {
        assert_eq!(
            Frame::Log("hello\nworld").encode().unwrap(),
            b"Lhello world\n"
        );
    }

    #[test]
    fn long_log_line_is_truncated() {
        let text = "x".repeat(LOG_LINE_MAX + 30);
        let buf = Frame::Log(&text).encode().unwrap();
        assert_eq!(buf.len(), FRAME_MAX);
        assert_eq!(buf[0], b'L');
        assert_eq!(buf[FRAME_MAX - 1], b'\n');
    }

    #[test]
    fn frames_for_requests() {
        assert_eq!(
            Frame::for_request(RequestKind::PunchTape, 7),
            Some(Frame::PunchTape(7))
        );
        assert_eq!(
            Frame::for_request(RequestKind::ReadTeleprinter, 7),
            Some(Frame::ReadTeleprinter)
        );
        assert_eq!(Frame::for_request(RequestKind::Malformed, 7), None);
        assert_eq!(Frame::for_request(RequestKind::None, 0), None);
    }

    #[test]
    fn escape_sequences() {
        let mut d = Deframer::new();
        assert_eq!(d.push(b'A'), Some(Inbound::Byte(b'A')));
        assert_eq!(d.push(ESCAPE), None);
        assert_eq!(d.push(ESCAPE), Some(Inbound::Byte(255)));
        assert_eq!(d.push(ESCAPE), None);
        assert_eq!(d.push(0), Some(Inbound::Restart));
        assert_eq!(d.push(ESCAPE), None);
        assert_eq!(d.push(b'D'), Some(Inbound::Restart));
    }

    #[test]
    fn reset_drops_half_sequence() {
        let mut d = Deframer::new();
        d.push(ESCAPE);
        d.reset();
        assert_eq!(d.push(0), Some(Inbound::Byte(0)));
    }

    proptest! {
        #[test]
        fn escaped_stream_decodes_to_original(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut wire = Vec::new();
            for &b in &data {
                if b == ESCAPE {
                    wire.push(ESCAPE);
                }
                wire.push(b);
            }
            let mut d = Deframer::new();
            let decoded: Vec<u8> = wire
                .iter()
                .filter_map(|&b| d.push(b))
                .map(|i| match i {
                    Inbound::Byte(b) => b,
                    Inbound::Restart => panic!("unexpected restart"),
                })
                .collect();
            prop_assert_eq!(decoded, data);
        }

        #[test]
        fn escape_then_non_escape_is_restart(x in 0u8..255) {
            let mut d = Deframer::new();
            prop_assert_eq!(d.push(ESCAPE), None);
            prop_assert_eq!(d.push(x), Some(Inbound::Restart));
        }
    }
}
