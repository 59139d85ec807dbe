/*
 * Driver for the USB remote switch peripheral.
 *
 * The peripheral exposes a byte-wide register file over I2C. Every
 * transaction is a one byte register select followed by either a one
 * byte payload (command) or a one byte response (query). There are no
 * multi-byte payloads.
 *
 * The power-state register is volatile and resets when the peripheral
 * loses power. The boot-default register is non-volatile and defines
 * the rail state the peripheral comes back up in.
 */

#![no_std]

pub(crate) mod fmt;

use embedded_hal::i2c::{Error as I2cError, ErrorKind};
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

/// Factory-default 7-bit bus address of the peripheral.
pub const DEFAULT_ADDRESS: u8 = 0x15;

// the peripheral commits boot-default writes to non-volatile storage,
// allow for its internal commit latency on both sides of the write
const SETTLE_DELAY_MS: u32 = 100;

const RESET_SENTINEL: u8 = 0xFF;

#[repr(u8)]
#[allow(dead_code)]
enum Register {
    PowerState = 0x01,
    BootDefault = 0x02,
    Reset = 0x06,
}

/// Rail state as reported by (or commanded to) the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchState {
    Unknown,
    Off,
    On,
}

impl SwitchState {
    fn from_wire(byte: u8) -> SwitchState {
        match byte {
            0 => SwitchState::Off,
            1 => SwitchState::On,
            _ => SwitchState::Unknown,
        }
    }
}

/// Outcome of a boot-default update, distinguishing the idempotent
/// skip from an actual non-volatile write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootDefaultUpdate {
    Unchanged,
    Written,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// The peripheral did not acknowledge. Callers must treat the rail
    /// state as unknown, not as off.
    NoResponse,
    /// Any other transport-level failure.
    Bus(E),
}

fn classify<E: I2cError>(err: E) -> LinkError<E> {
    match err.kind() {
        ErrorKind::NoAcknowledge(_) => LinkError::NoResponse,
        _ => LinkError::Bus(err),
    }
}

/// USB remote switch driver.
///
/// Generic over the bus and delay so the same driver runs against
/// hardware I2C peripherals and host-side fakes. Holds no state beyond
/// the bus address; the peripheral is the source of truth.
pub struct RemoteSwitch<I, D> {
    bus: I,
    delay: D,
    address: u8,
}

impl<I: I2c, D: DelayNs> RemoteSwitch<I, D> {
    /// Creates a driver talking to the factory-default address.
    pub fn new(bus: I, delay: D) -> Self {
        Self::new_with_address(bus, delay, DEFAULT_ADDRESS)
    }

    /// Creates a driver for a peripheral strapped to a non-default address.
    pub fn new_with_address(bus: I, delay: D, address: u8) -> Self {
        RemoteSwitch { bus, delay, address }
    }

    /// Hands the bus and delay back, consuming the driver.
    pub fn release(self) -> (I, D) {
        (self.bus, self.delay)
    }

    async fn write_register(&mut self, register: Register, value: u8) -> Result<(), LinkError<I::Error>> {
        self.bus
            .write(self.address, &[register as u8, value])
            .await
            .map_err(classify)
    }

    async fn read_register(&mut self, register: Register) -> Result<u8, LinkError<I::Error>> {
        let mut response = [0u8; 1];
        self.bus
            .write_read(self.address, &[register as u8], &mut response)
            .await
            .map_err(classify)?;
        Ok(response[0])
    }

    /// Commands the rail on or off. Fire-and-forget, no read-back.
    pub async fn set_power_state(&mut self, on: bool) -> Result<(), LinkError<I::Error>> {
        self.write_register(Register::PowerState, on as u8).await
    }

    /// Reads the current rail state. A response byte outside the wire
    /// encoding decodes as [`SwitchState::Unknown`].
    pub async fn read_power_state(&mut self) -> Result<SwitchState, LinkError<I::Error>> {
        let byte = self.read_register(Register::PowerState).await?;
        Ok(SwitchState::from_wire(byte))
    }

    /// Reads the persisted boot-default state.
    pub async fn read_boot_default(&mut self) -> Result<SwitchState, LinkError<I::Error>> {
        let byte = self.read_register(Register::BootDefault).await?;
        Ok(SwitchState::from_wire(byte))
    }

    /// Persists the rail state the peripheral boots into.
    ///
    /// Read-modify-write with an idempotence guard: the stored default
    /// is read first, and a matching value returns
    /// [`BootDefaultUpdate::Unchanged`] with no write issued, so
    /// repeated calls cost no non-volatile write cycles. A failed read
    /// aborts the update before anything is written.
    pub async fn update_boot_default(&mut self, on: bool) -> Result<BootDefaultUpdate, LinkError<I::Error>> {
        let requested = on as u8;
        let current = self.read_register(Register::BootDefault).await?;
        if current == requested {
            trace!("boot default already {}, skipping write", requested);
            return Ok(BootDefaultUpdate::Unchanged);
        }

        self.delay.delay_ms(SETTLE_DELAY_MS).await;
        self.write_register(Register::BootDefault, requested).await?;
        self.delay.delay_ms(SETTLE_DELAY_MS).await;

        debug!("boot default written to {}", requested);
        Ok(BootDefaultUpdate::Written)
    }

    /// Requests a peripheral restart. Does not wait for or verify the
    /// restart; the peripheral drops off the bus while it reboots.
    pub async fn reset(&mut self) -> Result<(), LinkError<I::Error>> {
        debug!("peripheral reset requested");
        self.write_register(Register::Reset, RESET_SENTINEL).await
    }
}
