//! Per-device transfer rate limiting.
//!
//! Each device has a busy-until timestamp.  A transfer may not start before
//! it, and starting one pushes it out by the device's transfer period under
//! the active timing profile.  This keeps the emulated peripherals from ever
//! running faster than the computer's hardware expects.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

use embassy_time::{Duration, Instant};

use crate::hal::Clock;
use crate::request::Device;

/// Transfer periods for each device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DevicePeriods {
    pub reader: Duration,
    pub punch: Duration,
    pub teleprinter: Duration,
}

impl DevicePeriods {
    /// The same period for every device.
    pub const fn uniform(period: Duration) -> Self {
        Self {
            reader: period,
            punch: period,
            teleprinter: period,
        }
    }

    pub fn get(&self, device: Device) -> Duration {
        match device {
            Device::Reader => self.reader,
            Device::Punch => self.punch,
            Device::Teleprinter => self.teleprinter,
        }
    }
}

/// Which set of periods is in force.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Profile {
    Fast,
    Slow,
}

impl Profile {
    pub fn toggled(self) -> Self {
        match self {
            Self::Fast => Self::Slow,
            Self::Slow => Self::Fast,
        }
    }
}

/// The fast and slow period sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingProfiles {
    pub fast: DevicePeriods,
    pub slow: DevicePeriods,
}

impl TimingProfiles {
    pub fn periods(&self, profile: Profile) -> &DevicePeriods {
        match profile {
            Profile::Fast => &self.fast,
            Profile::Slow => &self.slow,
        }
    }
}

/// A granted transfer slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub device: Device,
    /// When the transfer was allowed to begin.
    pub start: Instant,
    /// The period charged to the device for this transfer.
    pub period: Duration,
}

impl Reservation {
    /// The earliest the next transfer on the same device may begin.
    pub fn next_free(&self) -> Instant {
        self.start + self.period
    }
}

/// Busy-until timestamps for every device, plus the active profile.
///
/// Owned by the transfer engine - nothing else writes these.
pub struct Throttle {
    profiles: TimingProfiles,
    active: Profile,
    busy_until: [Instant; 3],
}

impl Throttle {
    /// All devices start idle.
    pub fn new(profiles: TimingProfiles, active: Profile) -> Self {
        Self {
            profiles,
            active,
            busy_until: [Instant::from_ticks(0); 3],
        }
    }

    pub fn active(&self) -> Profile {
        self.active
    }

    /// The period the next reservation on `device` will be charged.
    pub fn period(&self, device: Device) -> Duration {
        self.profiles.periods(self.active).get(device)
    }

    pub fn busy_until(&self, device: Device) -> Instant {
        self.busy_until[device.index()]
    }

    /// Swap between the fast and slow profiles.  The whole profile changes
    /// in one step, so no device ever runs under a mix of the two.
    /// Reservations already granted keep the period they were given.
    pub fn toggle_profile(&mut self) -> Profile {
        self.active = self.active.toggled();
        info!("Timing profile now {}", self.active);
        self.active
    }

    /// Wait until `device` is free, then mark it busy for one period.
    pub async fn reserve<C: Clock>(&mut self, device: Device, clock: &mut C) -> Reservation {
        let ready = self.busy_until[device.index()];
        if clock.now() < ready {
            trace!("{} busy, waiting", device);
            clock.sleep_until(ready).await;
        }
        let start = clock.now().max(ready);
        let period = self.period(device);
        self.busy_until[device.index()] = start + period;
        Reservation {
            device,
            start,
            period,
        }
    }
}
