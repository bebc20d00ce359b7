// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

//! A simulated computer, host and clock for driving the engine in tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_time::{Duration, Instant};
use pts_engine::{Clock, EngineConfig, EngineStatus, HostLink, Ports, PtsBus, Signals, Watchdog};

/// Everything outside the engine.
#[derive(Default)]
pub struct World {
    /// Microseconds since boot.
    pub now: u64,

    // Computer side
    /// Lines the computer is driving.
    pub signals: Signals,
    /// The computer never drops its request after an acknowledgement.
    pub stuck: bool,
    /// The computer drops its reader request at this time.
    pub withdraw_read_at: Option<u64>,
    /// The computer drops its punch request as soon as a punch frame is sent.
    pub withdraw_punch_on_frame: bool,
    pub log_pin: bool,
    pub reader_data: u8,
    pub autostart: bool,
    pub ack: bool,
    ack_rise: u64,
    /// Width of every completed acknowledgement pulse, in microseconds.
    pub ack_widths: Vec<u64>,
    /// Reader data present when each acknowledgement rose.
    pub data_at_ack: Vec<u8>,
    pub reset: bool,
    /// Every change to the reset line, with its time.
    pub reset_history: Vec<(u64, bool)>,

    // Host side
    /// Bytes waiting for the engine to read.
    pub host_rx: VecDeque<u8>,
    /// Host replies, each released into `host_rx` when a read request frame
    /// is sent.
    pub replies: VecDeque<Vec<u8>>,
    /// Bytes the host sends once the clock reaches the given time.
    pub late_reply: Option<(u64, Vec<u8>)>,
    /// Every frame the engine sent.
    pub frames: Vec<Vec<u8>>,

    pub feeds: u32,
}

impl World {
    /// Frames other than log lines.
    pub fn protocol_frames(&self) -> Vec<Vec<u8>> {
        self.frames
            .iter()
            .filter(|f| f.first() != Some(&b'L'))
            .cloned()
            .collect()
    }

    /// The text of every log line.
    pub fn log_lines(&self) -> Vec<String> {
        self.frames
            .iter()
            .filter(|f| f.first() == Some(&b'L'))
            .map(|f| String::from_utf8_lossy(&f[1..f.len() - 1]).into_owned())
            .collect()
    }

    fn advance_events(&mut self) {
        if let Some(at) = self.withdraw_read_at {
            if self.now >= at {
                self.signals.remove(Signals::RDR_REQ);
                self.withdraw_read_at = None;
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct Sim(pub Rc<RefCell<World>>);

impl Sim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn world(&self) -> std::cell::RefMut<'_, World> {
        self.0.borrow_mut()
    }

    /// The computer raises a request.
    pub fn raise(&self, signals: Signals) {
        self.world().signals = signals;
    }

    /// The host sends bytes unprompted.
    pub fn host_sends(&self, bytes: &[u8]) {
        self.world().host_rx.extend(bytes.iter().copied());
    }

    /// The host will answer the next read request with `bytes`.
    pub fn host_replies(&self, bytes: &[u8]) {
        self.world().replies.push_back(bytes.to_vec());
    }

    pub fn ports(&self) -> Ports<SimBus, SimLink, SimClock, SimWatchdog> {
        Ports::new(
            SimBus(self.clone()),
            SimLink(self.clone()),
            SimClock(self.clone()),
            SimWatchdog(self.clone()),
        )
    }
}

pub struct SimBus(Sim);

impl PtsBus for SimBus {
    fn sample_raw(&mut self) -> Signals {
        let mut w = self.0.world();
        w.advance_events();
        w.signals
    }

    fn drive_reader_data(&mut self, data: u8) {
        self.0.world().reader_data = data;
    }

    fn set_ack(&mut self, high: bool) {
        let mut w = self.0.world();
        if high && !w.ack {
            let (now, data) = (w.now, w.reader_data);
            w.ack_rise = now;
            w.data_at_ack.push(data);
        } else if !high && w.ack {
            let width = w.now - w.ack_rise;
            w.ack_widths.push(width);
            if !w.stuck {
                w.signals.remove(Signals::REQUESTS);
            }
        }
        w.ack = high;
    }

    fn set_reset(&mut self, high: bool) {
        let mut w = self.0.world();
        if high {
            // A computer in reset drives nothing.
            w.signals = Signals::empty();
            w.withdraw_read_at = None;
        }
        let now = w.now;
        w.reset_history.push((now, high));
        w.reset = high;
    }

    fn set_autostart(&mut self, high: bool) {
        self.0.world().autostart = high;
    }

    fn logging_enabled(&mut self) -> bool {
        self.0.world().log_pin
    }
}

pub struct SimLink(Sim);

impl HostLink for SimLink {
    fn try_read(&mut self) -> Option<u8> {
        let mut w = self.0.world();
        let now = w.now;
        if matches!(w.late_reply, Some((at, _)) if now >= at) {
            if let Some((_, bytes)) = w.late_reply.take() {
                w.host_rx.extend(bytes);
            }
        }
        w.host_rx.pop_front()
    }

    async fn write(&mut self, bytes: &[u8]) {
        let mut w = self.0.world();
        w.frames.push(bytes.to_vec());
        match bytes.first() {
            Some(b'R') | Some(b'S') => {
                if let Some(reply) = w.replies.pop_front() {
                    w.host_rx.extend(reply);
                }
            }
            Some(b'P') | Some(b'Q') if w.withdraw_punch_on_frame => {
                w.signals.remove(Signals::PUN_REQ);
            }
            _ => (),
        }
    }
}

pub struct SimClock(Sim);

impl Clock for SimClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.0.0.borrow().now)
    }

    fn block_for(&mut self, duration: Duration) {
        self.0.world().now += duration.as_micros();
    }

    async fn sleep_until(&mut self, at: Instant) {
        let mut w = self.0.world();
        let now = w.now.max(at.as_micros());
        w.now = now;
    }
}

pub struct SimWatchdog(Sim);

impl Watchdog for SimWatchdog {
    async fn feed(&mut self) {
        self.0.world().feeds += 1;
    }
}

/// Default config with diagnostics forced.
pub fn config(diagnostics: bool) -> EngineConfig {
    EngineConfig {
        diagnostics: Some(diagnostics),
        ..EngineConfig::default()
    }
}

/// A status block that outlives the controller borrowing it.
pub fn status() -> &'static EngineStatus {
    Box::leak(Box::new(EngineStatus::new()))
}
