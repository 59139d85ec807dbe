use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use embassy_time::Instant;
use remote_switch::SwitchState;

/// Upstream supply currently energizing the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSource {
    Unknown,
    Accessory,
    Battery,
}

impl PowerSource {
    fn from_u8(raw: u8) -> PowerSource {
        match raw {
            1 => PowerSource::Accessory,
            2 => PowerSource::Battery,
            _ => PowerSource::Unknown,
        }
    }
}

/// Whether the trusted network is currently visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Presence {
    Unknown,
    Present,
    Away,
}

impl Presence {
    fn from_u8(raw: u8) -> Presence {
        match raw {
            1 => Presence::Present,
            2 => Presence::Away,
            _ => Presence::Unknown,
        }
    }
}

fn switch_state_from_u8(raw: u8) -> SwitchState {
    match raw {
        1 => SwitchState::Off,
        2 => SwitchState::On,
        _ => SwitchState::Unknown,
    }
}

fn switch_state_to_u8(state: SwitchState) -> u8 {
    match state {
        SwitchState::Unknown => 0,
        SwitchState::Off => 1,
        SwitchState::On => 2,
    }
}

/// Snapshot of the sensed fields. Field loads are individually atomic
/// and relaxed; the combination may be transiently stale, which is fine
/// because the policy re-runs on every change and converges within one
/// poll interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerState {
    pub aux_switch: SwitchState,
    pub power_source: PowerSource,
    pub presence: Presence,
    pub last_change: Instant,
}

/// The one shared record every task coordinates through. Sensed fields
/// start unknown and are only written through the per-field handles in
/// [`StateWriters`]; reads are open to everyone.
pub struct SharedControllerState {
    aux_switch: AtomicU8,
    power_source: AtomicU8,
    presence: AtomicU8,

    // embassy-time ticks are u64, but 32bit targets have no AtomicU64,
    // so changes are stamped in milliseconds. overflow occurs in ~49.7 days
    last_change_ms: AtomicU32,

    // display coordination lives in the record too: the display task
    // owns the backlight flag, the button task owns the wake stamp.
    // the two tasks never message each other directly
    backlight_on: AtomicBool,
    last_wake_request_ms: AtomicU32,

    writers_claimed: AtomicBool,
}

impl SharedControllerState {
    pub const fn new() -> SharedControllerState {
        SharedControllerState {
            aux_switch: AtomicU8::new(0),
            power_source: AtomicU8::new(0),
            presence: AtomicU8::new(0),
            last_change_ms: AtomicU32::new(0),
            backlight_on: AtomicBool::new(true),
            last_wake_request_ms: AtomicU32::new(0),
            writers_claimed: AtomicBool::new(false),
        }
    }

    pub fn get_state(&self) -> ControllerState {
        ControllerState {
            aux_switch: self.get_aux_switch(),
            power_source: self.get_power_source(),
            presence: self.get_presence(),
            last_change: self.last_change(),
        }
    }

    pub fn get_aux_switch(&self) -> SwitchState {
        switch_state_from_u8(self.aux_switch.load(Ordering::Relaxed))
    }

    pub fn get_power_source(&self) -> PowerSource {
        PowerSource::from_u8(self.power_source.load(Ordering::Relaxed))
    }

    pub fn get_presence(&self) -> Presence {
        Presence::from_u8(self.presence.load(Ordering::Relaxed))
    }

    /// Instant of the most recent change to any sensed field.
    pub fn last_change(&self) -> Instant {
        Instant::from_millis(self.last_change_ms.load(Ordering::Relaxed) as u64)
    }

    pub fn backlight_on(&self) -> bool {
        self.backlight_on.load(Ordering::Relaxed)
    }

    pub fn last_wake_request_ms(&self) -> u32 {
        self.last_wake_request_ms.load(Ordering::Relaxed)
    }

    /// Splits the record into its per-field write handles. Succeeds
    /// exactly once for the record's lifetime; each handle then moves
    /// into the one task that owns that field.
    pub fn claim_writers(&self) -> Option<StateWriters<'_>> {
        if self.writers_claimed.swap(true, Ordering::Relaxed) {
            return None;
        }
        Some(StateWriters {
            aux_switch: AuxSwitchWriter { record: self },
            power_source: PowerSourceWriter { record: self },
            presence: PresenceWriter { record: self },
            backlight: BacklightWriter { record: self },
            wake_request: WakeRequestWriter { record: self },
        })
    }

    fn stamp_change(&self) {
        self.last_change_ms
            .store(Instant::now().as_millis() as u32, Ordering::Relaxed);
    }
}

/// Write handles for [`SharedControllerState`], one per field. None of
/// them are clonable, so handing a field's writer to its task makes the
/// single-writer rule a compile-time property.
pub struct StateWriters<'a> {
    pub aux_switch: AuxSwitchWriter<'a>,
    pub power_source: PowerSourceWriter<'a>,
    pub presence: PresenceWriter<'a>,
    pub backlight: BacklightWriter<'a>,
    pub wake_request: WakeRequestWriter<'a>,
}

pub struct AuxSwitchWriter<'a> {
    record: &'a SharedControllerState,
}

impl<'a> AuxSwitchWriter<'a> {
    /// Stores a new rail state. Returns whether the value changed;
    /// storing the current value leaves the change stamp untouched.
    pub fn set(&mut self, aux_switch: SwitchState) -> bool {
        if self.record.get_aux_switch() == aux_switch {
            return false;
        }
        self.record
            .aux_switch
            .store(switch_state_to_u8(aux_switch), Ordering::Relaxed);
        self.record.stamp_change();
        true
    }
}

pub struct PowerSourceWriter<'a> {
    record: &'a SharedControllerState,
}

impl<'a> PowerSourceWriter<'a> {
    /// Stores a new power-source reading. Returns whether it changed;
    /// storing the current value leaves the change stamp untouched.
    pub fn set(&mut self, power_source: PowerSource) -> bool {
        if self.record.get_power_source() == power_source {
            return false;
        }
        self.record
            .power_source
            .store(power_source as u8, Ordering::Relaxed);
        self.record.stamp_change();
        true
    }
}

pub struct PresenceWriter<'a> {
    record: &'a SharedControllerState,
}

impl<'a> PresenceWriter<'a> {
    /// Stores a new presence reading. Returns whether it changed;
    /// storing the current value leaves the change stamp untouched.
    pub fn set(&mut self, presence: Presence) -> bool {
        if self.record.get_presence() == presence {
            return false;
        }
        self.record.presence.store(presence as u8, Ordering::Relaxed);
        self.record.stamp_change();
        true
    }
}

pub struct BacklightWriter<'a> {
    record: &'a SharedControllerState,
}

impl<'a> BacklightWriter<'a> {
    pub fn set(&mut self, on: bool) {
        self.record.backlight_on.store(on, Ordering::Relaxed);
    }
}

pub struct WakeRequestWriter<'a> {
    record: &'a SharedControllerState,
}

impl<'a> WakeRequestWriter<'a> {
    /// Stamps a display wake request. The display task consumes it by
    /// comparing against the stamp it last handled.
    pub fn request_wake(&mut self) {
        // stamp 0 means "never", keep real requests nonzero
        let now_ms = Instant::now().as_millis().max(1) as u32;
        self.record
            .last_wake_request_ms
            .store(now_ms, Ordering::Relaxed);
    }
}
