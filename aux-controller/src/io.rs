use heapless::{String, Vec};
use remote_switch::SwitchState;

use crate::policy::ShutdownCountdown;
use crate::state::{ControllerState, PowerSource, Presence};

/// Longest network name carried through a scan, in bytes.
pub const MAX_NETWORK_NAME_LEN: usize = 32;

/// Upper bound on networks a single scan can report.
pub const MAX_VISIBLE_NETWORKS: usize = 16;

pub type NetworkName = String<MAX_NETWORK_NAME_LEN>;
pub type ScanResults = Vec<NetworkName, MAX_VISIBLE_NETWORKS>;

/// Which upstream feed the power multiplexer sees live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerFeed {
    Accessory,
    Battery,
}

impl From<PowerFeed> for PowerSource {
    fn from(feed: PowerFeed) -> PowerSource {
        match feed {
            PowerFeed::Accessory => PowerSource::Accessory,
            PowerFeed::Battery => PowerSource::Battery,
        }
    }
}

/// One discrete read of the power-source multiplexer.
#[allow(async_fn_in_trait)]
pub trait PowerSourceInput {
    type Error;
    async fn read(&mut self) -> Result<PowerFeed, Self::Error>;
}

/// Lists the networks currently in range.
#[allow(async_fn_in_trait)]
pub trait PresenceProbe {
    type Error;
    async fn scan(&mut self) -> Result<ScanResults, Self::Error>;
}

/// Debounced, edge-detected button clicks. Resolves once per click.
#[allow(async_fn_in_trait)]
pub trait ButtonInput {
    async fn wait_for_click(&mut self);
}

/// Everything the display needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayFrame {
    pub power_source: PowerSource,
    pub presence: Presence,
    pub aux_switch: SwitchState,
    pub countdown: ShutdownCountdown,
}

impl DisplayFrame {
    pub fn new(state: &ControllerState, countdown: ShutdownCountdown) -> DisplayFrame {
        DisplayFrame {
            power_source: state.power_source,
            presence: state.presence,
            aux_switch: state.aux_switch,
            countdown,
        }
    }
}

/// Rendering and backlight control, implemented outside the engine.
#[allow(async_fn_in_trait)]
pub trait DisplayOutput {
    async fn render(&mut self, frame: &DisplayFrame);
    fn set_backlight(&mut self, on: bool);
}

/// Low-power mode entry point. Never returns under normal operation.
#[allow(async_fn_in_trait)]
pub trait ShutdownControl {
    async fn enter_low_power(&mut self);
}
