//! Handles displaying the state of the engine on the LED.
//!
//! - Running: on
//! - Starting or restarting after a fault: blinking
//! - Halted: repeating groups of short pulses, one group per fault code
//!   pulse count

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};
use embassy_rp::gpio::{AnyPin, Level, Output};
use embassy_time::{Duration, Instant, Timer};
use pts_engine::{ControllerState, EngineStatus};

use crate::constants::{
    LOOP_LOG_INTERVAL, STATUS_DISPLAY_BLINK_TIMER, STATUS_DISPLAY_GROUP_GAP_TIMER,
    STATUS_DISPLAY_PULSE_TIMER, STATUS_DISPLAY_TIMER, STATUS_DISPLAY_WATCHDOG_TIMER,
};
use crate::infra::watchdog::{TaskId, WatchdogType};
use crate::link::ENGINE_STATUS;

/// What the LED is showing.
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub enum DisplayType {
    /// LED is fully on
    On,
    /// LED toggles every [`STATUS_DISPLAY_BLINK_TIMER`]
    Blink,
    /// LED flashes this many short pulses, then pauses
    Pulses(u8),
}

impl DisplayType {
    /// How the engine's status should be shown.
    pub fn for_status(status: &EngineStatus) -> Self {
        match status.state() {
            ControllerState::Running => Self::On,
            ControllerState::Starting | ControllerState::Faulted => Self::Blink,
            ControllerState::Halted => match status.fault() {
                Some(code) => Self::Pulses(code.pulse_count()),
                None => Self::Blink,
            },
        }
    }
}

/// Status display management.
pub struct StatusDisplay {
    /// The GPIO pin connected to the LED
    led: Output<'static>,

    current: DisplayType,

    /// When the LED last changed, and how long it stays as it is
    last_change: Instant,
    step: Duration,

    /// Position within a pulse group: even is on, odd is off
    phase: u8,
}

impl StatusDisplay {
    /// Creates a new StatusDisplay.  The LED is initially blinking, as the
    /// engine is starting.
    pub fn new(led_pin: AnyPin) -> Self {
        Self {
            led: Output::new(led_pin, Level::High),
            current: DisplayType::Blink,
            last_change: Instant::now(),
            step: STATUS_DISPLAY_BLINK_TIMER,
            phase: 0,
        }
    }

    /// Change what the LED displays.  Restarts the pattern if it differs
    /// from the current one.
    pub fn update(&mut self, display: DisplayType) {
        if self.current == display {
            return;
        }
        debug!("Status display {} -> {}", self.current, display);
        self.current = display;
        self.phase = 0;
        self.last_change = Instant::now();
        self.step = match display {
            DisplayType::On => STATUS_DISPLAY_TIMER,
            DisplayType::Blink => STATUS_DISPLAY_BLINK_TIMER,
            DisplayType::Pulses(_) => STATUS_DISPLAY_PULSE_TIMER,
        };
        self.led.set_high();
    }

    /// Perform an action on the status display if one is required.  Doesn't
    /// block.  Returns the maximum Duration until the next time this
    /// function should be called.
    pub fn do_work(&mut self) -> Duration {
        let elapsed = Instant::now().duration_since(self.last_change);
        if elapsed < self.step {
            return self.step - elapsed;
        }

        match self.current {
            DisplayType::On => self.led.set_high(),
            DisplayType::Blink => self.led.toggle(),
            DisplayType::Pulses(count) => {
                // Don't let a zero count stall the pattern.
                let phases = count.max(1) * 2;
                self.phase = (self.phase + 1) % phases;
                self.led.set_level(if self.phase % 2 == 0 {
                    Level::High
                } else {
                    Level::Low
                });
                self.step = if self.phase == phases - 1 {
                    STATUS_DISPLAY_GROUP_GAP_TIMER
                } else {
                    STATUS_DISPLAY_PULSE_TIMER
                };
            }
        }
        self.last_change = Instant::now();
        self.step
    }
}

/// Runs the status display, and logs a heartbeat with the engine's
/// counters.
#[embassy_executor::task]
pub async fn status_task(mut display: StatusDisplay, watchdog: &'static WatchdogType) -> ! {
    let core = embassy_rp::pac::SIO.cpuid().read();
    info!("Core{}: Status task started", core);

    let id = TaskId::Display;
    watchdog
        .register_task(&id, STATUS_DISPLAY_WATCHDOG_TIMER)
        .await;

    let mut next_log_instant = Instant::now();
    loop {
        watchdog.feed(&id).await;

        let now = Instant::now();
        if now >= next_log_instant {
            info!(
                "Core{}: Engine {} uptime {}s transfers {} restarts {}",
                core,
                ENGINE_STATUS.state(),
                now.as_secs(),
                ENGINE_STATUS.transfers(),
                ENGINE_STATUS.restarts()
            );
            next_log_instant += LOOP_LOG_INTERVAL;
        }

        display.update(DisplayType::for_status(&ENGINE_STATUS));
        let next_update = display.do_work();

        // Wake in time for the next LED change, but check the engine's
        // state at least every STATUS_DISPLAY_TIMER.
        Timer::after(Duration::min(next_update, STATUS_DISPLAY_TIMER)).await;
    }
}
