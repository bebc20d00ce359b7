//! The fault/recovery state machine around the transfer loop.
//!
//! ```text
//! Starting --> Running --> Faulted --> (power cycle) --> Starting
//!                              |
//!                              +--> Halted   (diagnostics off)
//! ```
//!
//! A host restart sequence takes the same path as a fault, except that it
//! always power cycles the computer and is never reported as a fault.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use core::fmt::Write;
use embassy_time::Duration;
use heapless::String;

use crate::config::EngineConfig;
use crate::fault::{ControllerState, EngineStatus, FaultCode, Stop};
use crate::frame::{Frame, Inbound, LOG_LINE_MAX, TOGGLE_TIMING};
use crate::hal::{Clock, HostLink, Ports, PtsBus, Watchdog};
use crate::request::RequestKind;
use crate::throttle::Profile;
use crate::transfer::{TransferEngine, send};

// Longest single sleep while the watchdog still needs feeding.
const FEED_SLICE: Duration = Duration::from_millis(100);

// Gap between idle checks while waiting for requests to clear, or while
// halted.
const IDLE_POLL: Duration = Duration::from_millis(1);

/// Runs the engine.  Owns the transfer engine and is the only thing that
/// decides what happens after a fault.
pub struct Controller<'s> {
    config: EngineConfig,
    engine: TransferEngine,
    status: &'s EngineStatus,
    state: ControllerState,
    diagnostics: bool,
}

impl<'s> Controller<'s> {
    pub fn new(config: EngineConfig, status: &'s EngineStatus) -> Self {
        status.set_state(ControllerState::Starting);
        Self {
            engine: TransferEngine::new(&config),
            config,
            status,
            state: ControllerState::Starting,
            diagnostics: false,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether faults are reported and recovered from, rather than halting.
    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }

    pub fn engine(&self) -> &TransferEngine {
        &self.engine
    }

    /// Run forever.
    pub async fn run<B, L, C, W>(&mut self, ports: &mut Ports<B, L, C, W>) -> !
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        loop {
            self.step(ports).await;
        }
    }

    /// Advance the state machine by one poll, start, or recovery.
    pub async fn step<B, L, C, W>(&mut self, ports: &mut Ports<B, L, C, W>) -> ControllerState
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        match self.state {
            ControllerState::Starting | ControllerState::Faulted => self.start(ports).await,
            ControllerState::Running => {
                if let Err(stop) = self.poll(ports).await {
                    self.recover(stop, ports).await;
                }
            }
            ControllerState::Halted => {
                ports.watchdog.feed().await;
                ports.pause(IDLE_POLL).await;
            }
        }
        self.state
    }

    /// Bring the computer up: initialise the outputs, power cycle it, and
    /// wait until it isn't requesting anything.
    pub async fn start<B, L, C, W>(&mut self, ports: &mut Ports<B, L, C, W>)
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        self.set_state(ControllerState::Starting);

        ports.bus.drive_reader_data(0);
        self.engine.cancel_ack(&mut ports.bus);
        ports.bus.set_autostart(self.config.autostart);
        self.engine.reset_link();

        self.diagnostics = match self.config.diagnostics {
            Some(enabled) => enabled,
            None => ports.bus.logging_enabled(),
        };
        debug!("Diagnostics {}", self.diagnostics);

        self.power_cycle(ports).await;

        while !self.engine.sample(&mut ports.bus).requests_clear() {
            ports.watchdog.feed().await;
            ports.pause(IDLE_POLL).await;
        }

        send(&mut ports.link, Some(Frame::RestartAnnounce)).await;
        let restarts = self.status.restarts();
        self.log(ports, format_args!("PicoPTS starting ({})", restarts))
            .await;
        info!("Engine running, restarts {}", restarts);

        self.set_state(ControllerState::Running);
    }

    /// One pass of the main loop: act on host bytes, then service any
    /// request from the computer.
    pub async fn poll<B, L, C, W>(&mut self, ports: &mut Ports<B, L, C, W>) -> Result<(), Stop>
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        ports.watchdog.feed().await;

        while let Some(inbound) = self.engine.poll_host(&mut ports.link) {
            match inbound {
                Inbound::Restart => {
                    info!("Host requested restart");
                    return Err(Stop::Restart);
                }
                Inbound::Byte(TOGGLE_TIMING) => {
                    let profile = self.engine.toggle_profile();
                    let name = match profile {
                        Profile::Fast => "fast",
                        Profile::Slow => "slow",
                    };
                    self.log(ports, format_args!("timing {}", name)).await;
                }
                Inbound::Byte(b) => {
                    if !self.diagnostics {
                        error!("Unknown command {=u8:#x}", b);
                        return Err(FaultCode::UnknownCommand.into());
                    }
                    warn!("Ignoring unknown command {=u8:#x}", b);
                    self.log(ports, format_args!("ignored command {}", b))
                        .await;
                }
            }
        }

        let signals = self.engine.sample(&mut ports.bus);
        let kind = RequestKind::classify(signals);
        if self.engine.execute(kind, ports).await?.is_some() {
            self.status.count_transfer();
        }
        Ok(())
    }

    /// Stop everything and decide whether to restart the computer.
    pub async fn recover<B, L, C, W>(&mut self, stop: Stop, ports: &mut Ports<B, L, C, W>)
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        self.engine.cancel_ack(&mut ports.bus);
        ports.bus.set_reset(true);
        self.engine.reset_link();
        self.set_state(ControllerState::Faulted);

        let restart = match stop {
            Stop::Restart => {
                self.log(ports, format_args!("restart requested")).await;
                true
            }
            Stop::Fault(code) => {
                self.status.set_fault(code);
                let signals = self.engine.last_signals();
                error!("Fault: {} signals: {}", code, signals);
                self.log(ports, format_args!("fault: {} signals: {}", code, signals))
                    .await;
                self.diagnostics
            }
        };

        if restart {
            self.status.count_restart();
            self.start(ports).await;
        } else {
            error!("Halted");
            self.set_state(ControllerState::Halted);
        }
    }

    // Hold the computer in reset for the settle interval, then let it run.
    async fn power_cycle<B, L, C, W>(&mut self, ports: &mut Ports<B, L, C, W>)
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        ports.bus.set_reset(true);
        let until = ports.clock.now() + self.config.reset_settle;
        loop {
            ports.watchdog.feed().await;
            let now = ports.clock.now();
            if now >= until {
                break;
            }
            let next = (now + FEED_SLICE).min(until);
            ports.clock.sleep_until(next).await;
        }
        ports.bus.set_reset(false);
    }

    // Send an L line, if diagnostics are on.
    async fn log<B, L, C, W>(&mut self, ports: &mut Ports<B, L, C, W>, args: core::fmt::Arguments<'_>)
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        if !self.diagnostics {
            return;
        }
        let mut line: String<LOG_LINE_MAX> = String::new();
        // Overlong lines are cut short, which is what the frame would do
        // anyway.
        let _ = line.write_fmt(args);
        send(&mut ports.link, Some(Frame::Log(&line))).await;
    }

    fn set_state(&mut self, state: ControllerState) {
        if self.state != state {
            debug!("State {} -> {}", self.state, state);
        }
        self.state = state;
        self.status.set_state(state);
    }
}
