//! Implements task handling support, including dual core support.

// Copyright (c) 2025 Piers Finlayson <piers@piers.rocks>
//
// GPLv3 licensed - see https://www.gnu.org/licenses/gpl-3.0.html

#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};
use embassy_executor::Executor;
use embassy_rp::multicore::{Stack, spawn_core1 as rp_spawn_core1};
use embassy_rp::peripherals::CORE1;
use pts_engine::{Controller, EngineConfig, Ports};
use static_cell::{ConstStaticCell, StaticCell};

use crate::constants::{CORE1_STACK_SIZE, ENGINE_WATCHDOG_TIMER};
use crate::infra::gpio::PicoBus;
use crate::infra::watchdog::{TaskId, WatchdogType, reboot_normal};
use crate::link::{ENGINE_STATUS, EngineWatchdog, PipeLink, SystemClock};

// Threading and tasks model
//
// On the Pico we have 2 cores available - 0 and 1.
//
// Core 0 is the main core, and is where main() runs.  We use it for
// everything except the engine:
// - the embassy USB stack
// - the serial receive and transmit tasks
// - the status display task
// - the watchdog task
//
// Core 1 runs only the engine.  The engine busy-waits for its short
// protocol timings, such as the acknowledgement pulse, so giving it a core
// of its own keeps those timings tight and keeps it from starving USB.
//
// Tasks on core 0 are spawned with the Spawner passed into main().  Core 1
// tasks must be spawned via an Executor, which we store in a non-public
// static, so it can only be accessed via this module.

//
// Statics
//

// A stack for core 1.  We will take it and use it mutably in core1_spawn.
static CORE1_STACK: ConstStaticCell<Stack<CORE1_STACK_SIZE>> = ConstStaticCell::new(Stack::new());

// An executor for core 1.
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

/// Start core 1 and run the engine on it.  The bus and watchdog are moved
/// across to the engine task.
pub fn core1_spawn(p_core1: CORE1, bus: PicoBus, watchdog: &'static WatchdogType) {
    rp_spawn_core1(p_core1, CORE1_STACK.take(), move || {
        let executor1 = EXECUTOR1.init(Executor::new());
        executor1.run(|spawner| {
            spawn_or_reboot(spawner.spawn(engine_task(bus, watchdog)), "Engine");
        })
    });
}

/// Runs the engine, forever.
#[embassy_executor::task]
pub async fn engine_task(bus: PicoBus, watchdog: &'static WatchdogType) -> ! {
    let core: u32 = embassy_rp::pac::SIO.cpuid().read();
    info!("Core{}: Engine task started", core);

    // Register with the watchdog
    watchdog
        .register_task(&TaskId::Engine, ENGINE_WATCHDOG_TIMER)
        .await;

    let mut ports = Ports::new(bus, PipeLink, SystemClock, EngineWatchdog::new(watchdog));
    let mut controller = Controller::new(EngineConfig::default(), &ENGINE_STATUS);
    controller.run(&mut ports).await
}

/// Method to spawn tasks.  Can be called on either core.
///
/// Using the Spawner object to spawn can fail, because too many instances of
/// that task are already running.  By default only 1 is allowed at once, but
/// is configurable with e.g. #[embassy_executor::task(pool_size = 4).
///
/// We handle that by rebooting - but it shouldn't happen if tasks are only
/// spawned at start of day.
///
/// Example:
/// ```ignore
/// spawn_or_reboot(spawner.spawn(my_task()), "my_task");
/// ```
pub fn spawn_or_reboot<T, E: defmt::Format>(spawn_result: Result<T, E>, task_name: &str) {
    match spawn_result {
        Ok(_) => {
            let core: u32 = embassy_rp::pac::SIO.cpuid().read();
            debug!("Core{}: Spawned task {}", core, task_name);
        }
        Err(e) => {
            error!("Failed to spawn task: {}, error: {}", task_name, e);
            reboot_normal();
        }
    }
}
