#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use aux_controller::io::{
    ButtonInput, DisplayFrame, DisplayOutput, NetworkName, PowerFeed, PowerSourceInput,
    PresenceProbe, ScanResults, ShutdownControl,
};
use aux_controller::rail::{RailController, SharedRailController};
use aux_controller::state::{AuxSwitchWriter, SharedControllerState};
use embassy_sync::mutex::Mutex;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use remote_switch::{RemoteSwitch, DEFAULT_ADDRESS};

// device-side view of the register file
const REG_POWER_STATE: u8 = 0x01;
const REG_BOOT_DEFAULT: u8 = 0x02;
const REG_RESET: u8 = 0x06;
const RESET_SENTINEL: u8 = 0xFF;

#[derive(Debug)]
pub struct FakeBusError(pub ErrorKind);

impl i2c::Error for FakeBusError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Register-level model of the switch peripheral.
struct SwitchDevice {
    power_state: u8,
    boot_default: u8,
    resets: u32,
    data_writes: u32,
    boot_default_writes: u32,
    fail_kind: Option<ErrorKind>,
}

impl SwitchDevice {
    fn new() -> Self {
        SwitchDevice {
            power_state: 0,
            boot_default: 0,
            resets: 0,
            data_writes: 0,
            boot_default_writes: 0,
            fail_kind: None,
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
        self.data_writes += 1;
        match register {
            REG_POWER_STATE => self.power_state = value,
            REG_BOOT_DEFAULT => {
                self.boot_default_writes += 1;
                self.boot_default = value;
            }
            REG_RESET if value == RESET_SENTINEL => {
                self.resets += 1;
                // a restart brings the rail up in the persisted default
                self.power_state = self.boot_default;
            }
            _ => {}
        }
    }
}

/// Cloneable bus handle onto one [`SwitchDevice`], so a test keeps a
/// view of the registers after the other handle moves into the rail
/// controller.
#[derive(Clone)]
pub struct SharedSwitchDevice {
    device: Rc<RefCell<SwitchDevice>>,
}

impl SharedSwitchDevice {
    pub fn new() -> Self {
        SharedSwitchDevice {
            device: Rc::new(RefCell::new(SwitchDevice::new())),
        }
    }

    pub fn power_state(&self) -> u8 {
        self.device.borrow().power_state
    }

    pub fn boot_default(&self) -> u8 {
        self.device.borrow().boot_default
    }

    pub fn resets(&self) -> u32 {
        self.device.borrow().resets
    }

    pub fn data_writes(&self) -> u32 {
        self.device.borrow().data_writes
    }

    pub fn boot_default_writes(&self) -> u32 {
        self.device.borrow().boot_default_writes
    }

    pub fn seed_power_state(&self, value: u8) {
        self.device.borrow_mut().power_state = value;
    }

    pub fn seed_boot_default(&self, value: u8) {
        self.device.borrow_mut().boot_default = value;
    }

    pub fn fail_with(&self, kind: ErrorKind) {
        self.device.borrow_mut().fail_kind = Some(kind);
    }

    pub fn heal(&self) {
        self.device.borrow_mut().fail_kind = None;
    }
}

impl ErrorType for SharedSwitchDevice {
    type Error = FakeBusError;
}

impl I2c for SharedSwitchDevice {
    async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), FakeBusError> {
        let mut device = self.device.borrow_mut();
        if let Some(kind) = device.fail_kind {
            return Err(FakeBusError(kind));
        }
        if address != DEFAULT_ADDRESS {
            return Err(FakeBusError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)));
        }

        let mut selected = None;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => match **bytes {
                    [register] => selected = Some(register),
                    [register, value] => device.apply(register, value),
                    _ => return Err(FakeBusError(ErrorKind::Other)),
                },
                Operation::Read(buffer) => {
                    let register = selected.take().unwrap_or(0);
                    for byte in buffer.iter_mut() {
                        *byte = device.register(register);
                    }
                }
            }
        }
        Ok(())
    }
}

pub struct NoopDelay;

impl DelayNs for NoopDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// Builds a shared rail controller over a fake peripheral.
pub fn rail_for<'a>(
    record: &'a SharedControllerState,
    writer: AuxSwitchWriter<'a>,
    device: &SharedSwitchDevice,
) -> SharedRailController<'a, SharedSwitchDevice, NoopDelay> {
    let link = RemoteSwitch::new(device.clone(), NoopDelay);
    Mutex::new(RailController::new(link, record, writer))
}

/// Feeds a scripted sequence of multiplexer reads. Panics when the
/// script runs dry so a test cannot silently overpoll.
pub struct ScriptedPowerSource {
    readings: VecDeque<Result<PowerFeed, ()>>,
}

impl ScriptedPowerSource {
    pub fn new(readings: impl IntoIterator<Item = Result<PowerFeed, ()>>) -> Self {
        ScriptedPowerSource {
            readings: readings.into_iter().collect(),
        }
    }
}

impl PowerSourceInput for ScriptedPowerSource {
    type Error = ();

    async fn read(&mut self) -> Result<PowerFeed, ()> {
        self.readings.pop_front().expect("power source script exhausted")
    }
}

/// Feeds a scripted sequence of network scans.
pub struct ScriptedProbe {
    scans: VecDeque<Result<Vec<&'static str>, ()>>,
}

impl ScriptedProbe {
    pub fn new(scans: impl IntoIterator<Item = Result<Vec<&'static str>, ()>>) -> Self {
        ScriptedProbe {
            scans: scans.into_iter().collect(),
        }
    }
}

impl PresenceProbe for ScriptedProbe {
    type Error = ();

    async fn scan(&mut self) -> Result<ScanResults, ()> {
        let names = self.scans.pop_front().expect("presence script exhausted")?;
        let mut results = ScanResults::new();
        for name in names {
            let name = NetworkName::try_from(name).expect("scripted name too long");
            results.push(name).expect("scripted scan too large");
        }
        Ok(results)
    }
}

/// Never clicks. For tests that drive click handling directly.
pub struct PendingButton;

impl ButtonInput for PendingButton {
    async fn wait_for_click(&mut self) {
        core::future::pending::<()>().await
    }
}

#[derive(Default)]
struct DisplayLog {
    frames: Vec<DisplayFrame>,
    backlight: Vec<bool>,
}

/// Display fake recording every render and backlight transition, shared
/// so the log stays readable after the other handle moves into the
/// refresh loop.
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    log: Rc<RefCell<DisplayLog>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        RecordingDisplay::default()
    }

    pub fn render_count(&self) -> usize {
        self.log.borrow().frames.len()
    }

    pub fn last_frame(&self) -> Option<DisplayFrame> {
        self.log.borrow().frames.last().copied()
    }

    pub fn backlight_calls(&self) -> Vec<bool> {
        self.log.borrow().backlight.clone()
    }
}

impl DisplayOutput for RecordingDisplay {
    async fn render(&mut self, frame: &DisplayFrame) {
        self.log.borrow_mut().frames.push(*frame);
    }

    fn set_backlight(&mut self, on: bool) {
        self.log.borrow_mut().backlight.push(on);
    }
}

/// Counts low-power entries instead of halting anything.
#[derive(Clone, Default)]
pub struct CountingShutdown {
    entries: Rc<Cell<u32>>,
}

impl CountingShutdown {
    pub fn new() -> Self {
        CountingShutdown::default()
    }

    pub fn entries(&self) -> u32 {
        self.entries.get()
    }
}

impl ShutdownControl for CountingShutdown {
    async fn enter_low_power(&mut self) {
        self.entries.set(self.entries.get() + 1);
    }
}
