//! Moving one byte between the computer and the host.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use embassy_time::Duration;

use crate::ack::AckGenerator;
use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::fault::{FaultCode, Stop};
use crate::frame::{Deframer, Frame, Inbound};
use crate::hal::{Clock, HostLink, Ports, PtsBus, Watchdog};
use crate::request::RequestKind;
use crate::signals::Signals;
use crate::throttle::{Profile, Reservation, Throttle};

/// A completed transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub kind: RequestKind,
    /// The byte moved, in whichever direction.
    pub data: u8,
    pub reservation: Reservation,
}

/// Runs transfers.  Owns everything that changes as transfers happen: the
/// device timers, the timing profile, the host byte decoder, and the most
/// recent line snapshot.
pub struct TransferEngine {
    throttle: Throttle,
    ack: AckGenerator,
    debouncer: Debouncer,
    deframer: Deframer,
    last: Signals,
    reply_recheck: Duration,
    host_poll_interval: Duration,
    clear_poll_limit: u32,
    clear_poll_interval: Duration,
}

impl TransferEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            throttle: Throttle::new(config.profiles, config.initial_profile),
            ack: AckGenerator::new(config.ack_width),
            debouncer: Debouncer::new(config.debounce_count),
            deframer: Deframer::new(),
            last: Signals::empty(),
            reply_recheck: config.reply_recheck,
            host_poll_interval: config.host_poll_interval,
            clear_poll_limit: config.clear_poll_limit,
            clear_poll_interval: config.clear_poll_interval,
        }
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    pub fn toggle_profile(&mut self) -> Profile {
        self.throttle.toggle_profile()
    }

    /// The snapshot most recently taken.
    pub fn last_signals(&self) -> Signals {
        self.last
    }

    /// Take a debounced snapshot.
    pub fn sample<B: PtsBus>(&mut self, bus: &mut B) -> Signals {
        self.last = self.debouncer.sample(bus);
        self.last
    }

    /// Decode the next complete host byte, if there is one waiting.
    pub fn poll_host<L: HostLink>(&mut self, link: &mut L) -> Option<Inbound> {
        loop {
            let b = link.try_read()?;
            if let Some(inbound) = self.deframer.push(b) {
                return Some(inbound);
            }
        }
    }

    pub fn cancel_ack<B: PtsBus>(&mut self, bus: &mut B) {
        self.ack.cancel(bus);
    }

    /// Forget any partly received escape sequence.
    pub fn reset_link(&mut self) {
        self.deframer.reset();
    }

    /// Carry out the request.  Returns `None` when there was nothing to do.
    pub async fn execute<B, L, C, W>(
        &mut self,
        kind: RequestKind,
        ports: &mut Ports<B, L, C, W>,
    ) -> Result<Option<Transfer>, Stop>
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        let transfer = match kind {
            RequestKind::None => return Ok(None),
            RequestKind::Malformed => {
                warn!("Reader and punch both requested: {}", self.last);
                return Err(FaultCode::SimultaneousRequest.into());
            }
            _ if kind.is_read() => self.read(kind, ports).await?,
            _ => self.punch(kind, ports).await?,
        };
        trace!("{} {=u8:#x} done", transfer.kind, transfer.data);
        Ok(Some(transfer))
    }

    async fn read<B, L, C, W>(
        &mut self,
        kind: RequestKind,
        ports: &mut Ports<B, L, C, W>,
    ) -> Result<Transfer, Stop>
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        let reservation = self.reserve(kind, ports).await?;
        send(&mut ports.link, Frame::for_request(kind, 0)).await;

        let data = self.await_reply(ports).await?;

        ports.bus.drive_reader_data(data);
        self.ack.pulse(&mut ports.bus, &mut ports.clock);
        self.await_clear(ports, Signals::RDR_REQ, FaultCode::ReadProtocolViolation)?;

        Ok(Transfer {
            kind,
            data,
            reservation,
        })
    }

    async fn punch<B, L, C, W>(
        &mut self,
        kind: RequestKind,
        ports: &mut Ports<B, L, C, W>,
    ) -> Result<Transfer, Stop>
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        let reservation = self.reserve(kind, ports).await?;
        let data = self.sample(&mut ports.bus).punch_data();
        send(&mut ports.link, Frame::for_request(kind, data)).await;

        // The computer must still be asking, otherwise it never sees the
        // acknowledgement.
        if !self.sample(&mut ports.bus).punch_requested() {
            warn!("Punch request withdrawn before acknowledgement");
            return Err(FaultCode::PunchProtocolViolation.into());
        }

        self.ack.pulse(&mut ports.bus, &mut ports.clock);
        self.await_clear(ports, Signals::PUN_REQ, FaultCode::PunchProtocolViolation)?;

        Ok(Transfer {
            kind,
            data,
            reservation,
        })
    }

    async fn reserve<B, L, C, W>(
        &mut self,
        kind: RequestKind,
        ports: &mut Ports<B, L, C, W>,
    ) -> Result<Reservation, Stop>
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        // Only called with a classified transfer.
        let device = kind
            .device()
            .ok_or(Stop::Fault(FaultCode::SimultaneousRequest))?;
        Ok(self.throttle.reserve(device, &mut ports.clock).await)
    }

    // Wait for the host to answer a read.  Every re-check interval make sure
    // the computer is still asking - if it isn't the byte has nowhere to go.
    async fn await_reply<B, L, C, W>(&mut self, ports: &mut Ports<B, L, C, W>) -> Result<u8, Stop>
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        let mut recheck_at = ports.clock.now() + self.reply_recheck;
        loop {
            match self.poll_host(&mut ports.link) {
                Some(Inbound::Byte(data)) => return Ok(data),
                Some(Inbound::Restart) => {
                    info!("Restart requested while awaiting reply");
                    return Err(Stop::Restart);
                }
                None => (),
            }

            let now = ports.clock.now();
            if now >= recheck_at {
                if !self.sample(&mut ports.bus).reader_requested() {
                    warn!("Reader request withdrawn before host replied");
                    return Err(FaultCode::ReadProtocolViolation.into());
                }
                debug!("Still waiting for host reply");
                recheck_at = now + self.reply_recheck;
            }

            ports.watchdog.feed().await;
            ports.pause(self.host_poll_interval).await;
        }
    }

    // Spin until the computer drops `line`, which it does once it has seen
    // the acknowledgement.
    fn await_clear<B, L, C, W>(
        &mut self,
        ports: &mut Ports<B, L, C, W>,
        line: Signals,
        fault: FaultCode,
    ) -> Result<(), Stop>
    where
        B: PtsBus,
        L: HostLink,
        C: Clock,
        W: Watchdog,
    {
        for _ in 0..self.clear_poll_limit {
            if !self.sample(&mut ports.bus).intersects(line) {
                return Ok(());
            }
            ports.clock.block_for(self.clear_poll_interval);
        }
        warn!("Request still asserted after acknowledgement: {}", self.last);
        Err(fault.into())
    }
}

/// Encode and send a frame.  Frames that don't encode are dropped.
pub async fn send<L: HostLink>(link: &mut L, frame: Option<Frame<'_>>) {
    let Some(frame) = frame else {
        return;
    };
    match frame.encode() {
        Ok(buf) => link.write(&buf).await,
        Err(e) => error!("Dropped frame: {}", e),
    }
}
