/*
 * Scripted end-to-end run of the controller on a host.
 *
 * A fake peripheral sits on a fake bus, the sensors follow a fixed
 * timeline, and the whole stack runs on the std executor with real
 * (compressed) timing. The run starts with the rail left energized by
 * a previous session, walks through charger unplug, operator departure
 * and return, then a manual toggle while the idle countdown runs, and
 * ends when the idle shutdown fires.
 */

use core::convert::Infallible;

use aux_controller::io::{
    ButtonInput, DisplayFrame, DisplayOutput, NetworkName, PowerFeed, PowerSourceInput,
    PresenceProbe, ScanResults, ShutdownControl,
};
use aux_controller::rail::{RailController, SharedRailController, StartupFallback};
use aux_controller::state::SharedControllerState;
use aux_controller::tasks::button_task::ButtonWatcher;
use aux_controller::tasks::display_task::DisplayRefreshLoop;
use aux_controller::tasks::idle_task::IdleShutdownWatcher;
use aux_controller::tasks::power_source_task::PowerSourceWatcher;
use aux_controller::tasks::presence_task::PresenceWatcher;
use embassy_executor::Spawner;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Instant, Timer};
use embedded_hal::i2c::{ErrorType, Operation};
use embedded_hal_async::i2c::I2c;
use remote_switch::RemoteSwitch;
use static_cell::StaticCell;

// scenario timeline, relative to the start captured after startup
const UNPLUG_AT: Duration = Duration::from_millis(700);
const DEPART_AT: Duration = Duration::from_millis(1000);
const RETURN_AT: Duration = Duration::from_millis(1900);
const CLICK_AT: Duration = Duration::from_millis(2500);
const GRACE: Duration = Duration::from_millis(1500);

// device-side view of the register file
const REG_POWER_STATE: u8 = 0x01;
const REG_BOOT_DEFAULT: u8 = 0x02;
const REG_RESET: u8 = 0x06;
const RESET_SENTINEL: u8 = 0xFF;

/// Register-level model of the switch peripheral, logging rail
/// transitions from the device side.
struct SimBus {
    power_state: u8,
    boot_default: u8,
}

impl SimBus {
    /// Peripheral as a previous session left it: rail energized, boot
    /// default still set to energize.
    fn left_energized() -> Self {
        SimBus {
            power_state: 1,
            boot_default: 1,
        }
    }

    fn register(&self, register: u8) -> u8 {
        match register {
            REG_POWER_STATE => self.power_state,
            REG_BOOT_DEFAULT => self.boot_default,
            _ => 0,
        }
    }

    fn apply(&mut self, register: u8, value: u8) {
        match register {
            REG_POWER_STATE => {
                if self.power_state != value {
                    log::info!(
                        "peripheral: rail output {}",
                        if value == 1 { "energized" } else { "off" }
                    );
                }
                self.power_state = value;
            }
            REG_BOOT_DEFAULT => {
                log::info!("peripheral: boot default stored as {}", value);
                self.boot_default = value;
            }
            REG_RESET if value == RESET_SENTINEL => {
                log::info!("peripheral: restarting into stored default");
                self.power_state = self.boot_default;
            }
            _ => {}
        }
    }
}

impl ErrorType for SimBus {
    type Error = Infallible;
}

impl I2c for SimBus {
    async fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Infallible> {
        let mut selected = None;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => match **bytes {
                    [register] => selected = Some(register),
                    [register, value] => self.apply(register, value),
                    _ => {}
                },
                Operation::Read(buffer) => {
                    let register = selected.take().unwrap_or(0);
                    for byte in buffer.iter_mut() {
                        *byte = self.register(register);
                    }
                }
            }
        }
        Ok(())
    }
}

/// On the charger until the scripted unplug, on battery after.
struct ScriptedPowerFeed {
    start: Instant,
}

impl PowerSourceInput for ScriptedPowerFeed {
    type Error = Infallible;

    async fn read(&mut self) -> Result<PowerFeed, Infallible> {
        if Instant::now() < self.start + UNPLUG_AT {
            Ok(PowerFeed::Accessory)
        } else {
            Ok(PowerFeed::Battery)
        }
    }
}

/// The home network drops out of the skyline between departure and
/// return; an unrelated network is always in range.
struct ScriptedSkyline {
    start: Instant,
    home_ssid: &'static str,
}

impl PresenceProbe for ScriptedSkyline {
    type Error = Infallible;

    async fn scan(&mut self) -> Result<ScanResults, Infallible> {
        let now = Instant::now();
        let mut visible = ScanResults::new();
        push_name(&mut visible, "cafe-guest");
        let home_gone = now >= self.start + DEPART_AT && now < self.start + RETURN_AT;
        if !home_gone {
            push_name(&mut visible, self.home_ssid);
        }
        Ok(visible)
    }
}

fn push_name(results: &mut ScanResults, name: &str) {
    let name = NetworkName::try_from(name).unwrap();
    results.push(name).unwrap();
}

/// One click at the scripted instant, then silence.
struct ScriptedButton {
    start: Instant,
    pressed: bool,
}

impl ButtonInput for ScriptedButton {
    async fn wait_for_click(&mut self) {
        if self.pressed {
            core::future::pending::<()>().await;
        }
        Timer::at(self.start + CLICK_AT).await;
        self.pressed = true;
    }
}

struct ConsoleDisplay;

impl DisplayOutput for ConsoleDisplay {
    async fn render(&mut self, frame: &DisplayFrame) {
        log::info!(
            "display: power={:?} presence={:?} rail={:?} countdown={:?}",
            frame.power_source,
            frame.presence,
            frame.aux_switch,
            frame.countdown
        );
    }

    fn set_backlight(&mut self, on: bool) {
        log::info!("display: backlight {}", if on { "on" } else { "off" });
    }
}

struct SimShutdown;

impl ShutdownControl for SimShutdown {
    async fn enter_low_power(&mut self) {
        log::info!("host entering low power, scenario complete");
        std::process::exit(0);
    }
}

static RECORD: SharedControllerState = SharedControllerState::new();
static RAIL: StaticCell<SharedRailController<'static, SimBus, Delay>> = StaticCell::new();

#[embassy_executor::task]
async fn power_task(watcher: PowerSourceWatcher<'static, ScriptedPowerFeed, SimBus, Delay>) {
    watcher.run().await
}

#[embassy_executor::task]
async fn presence_task(watcher: PresenceWatcher<'static, ScriptedSkyline, SimBus, Delay>) {
    watcher.run().await
}

#[embassy_executor::task]
async fn button_task(watcher: ButtonWatcher<'static, ScriptedButton, SimBus, Delay>) {
    watcher.run().await
}

#[embassy_executor::task]
async fn display_task(refresh: DisplayRefreshLoop<'static, ConsoleDisplay>) {
    refresh.run().await
}

#[embassy_executor::task]
async fn idle_task(watcher: IdleShutdownWatcher<'static, SimShutdown>) {
    watcher.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let writers = RECORD.claim_writers().unwrap();

    let link = RemoteSwitch::new(SimBus::left_energized(), Delay);
    let mut controller = RailController::new(link, &RECORD, writers.aux_switch);
    let outcome = controller.startup(StartupFallback::ProceedUnknown).await;
    log::info!("startup: {:?}", outcome);

    let rail: &'static SharedRailController<'static, SimBus, Delay> =
        RAIL.init(Mutex::new(controller));

    let start = Instant::now();
    let home_ssid = credentials::home_network().get_ssid();

    spawner
        .spawn(power_task(PowerSourceWatcher::new(
            ScriptedPowerFeed { start },
            writers.power_source,
            rail,
            Duration::from_millis(50),
        )))
        .unwrap();
    spawner
        .spawn(presence_task(PresenceWatcher::new(
            ScriptedSkyline { start, home_ssid },
            home_ssid,
            writers.presence,
            rail,
            Duration::from_millis(300),
        )))
        .unwrap();
    spawner
        .spawn(button_task(ButtonWatcher::new(
            ScriptedButton {
                start,
                pressed: false,
            },
            &RECORD,
            writers.wake_request,
            rail,
        )))
        .unwrap();
    spawner
        .spawn(display_task(DisplayRefreshLoop::new(
            ConsoleDisplay,
            &RECORD,
            writers.backlight,
            GRACE,
            Duration::from_millis(50),
            Duration::from_secs(60),
        )))
        .unwrap();
    spawner
        .spawn(idle_task(IdleShutdownWatcher::new(
            SimShutdown,
            &RECORD,
            GRACE,
            Duration::from_millis(100),
        )))
        .unwrap();

    // the scripted run reaches low power in under five seconds
    Timer::after_secs(10).await;
    log::error!("scenario never reached low power");
    std::process::exit(1);
}
