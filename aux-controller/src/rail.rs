use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use remote_switch::{RemoteSwitch, SwitchState};

use crate::policy;
use crate::state::{AuxSwitchWriter, SharedControllerState};

/// What to do when the peripheral cannot be read at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupFallback {
    /// Leave the recorded state unknown and let reconciliation converge.
    ProceedUnknown,
    /// Ask the caller to restart the controller after its fixed delay.
    RequestRestart,
}

/// How startup actually went, for callers and tests to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupOutcome {
    /// The recorded rail state was seeded from the peripheral.
    Synced(SwitchState),
    /// The peripheral was unreadable, proceeding with the state unknown.
    ProceedingUnknown,
    /// The peripheral was unreadable and the fallback demands a restart.
    RestartRequired,
}

/// The single logical owner of the switch bus.
///
/// Owns the driver and the one write handle for the recorded rail
/// state, so every bus transaction and every `aux_switch` update flows
/// through here. Tasks share it as [`SharedRailController`] and hold
/// the lock across each complete transaction.
pub struct RailController<'a, I, D> {
    link: RemoteSwitch<I, D>,
    record: &'a SharedControllerState,
    writer: AuxSwitchWriter<'a>,
}

pub type SharedRailController<'a, I, D> = Mutex<CriticalSectionRawMutex, RailController<'a, I, D>>;

impl<'a, I: I2c, D: DelayNs> RailController<'a, I, D> {
    pub fn new(
        link: RemoteSwitch<I, D>,
        record: &'a SharedControllerState,
        writer: AuxSwitchWriter<'a>,
    ) -> Self {
        RailController { link, record, writer }
    }

    /// Seeds the recorded rail state from the peripheral and pushes the
    /// safe boot default. Read failures follow `fallback`; a failed
    /// boot-default update is logged and dropped, since the update
    /// aborts on its own read failure rather than writing blind.
    pub async fn startup(&mut self, fallback: StartupFallback) -> StartupOutcome {
        let outcome = match self.link.read_power_state().await {
            Ok(state) => {
                self.writer.set(state);
                info!("rail state synced from peripheral: {:?}", state);
                StartupOutcome::Synced(state)
            }
            Err(_) => match fallback {
                StartupFallback::ProceedUnknown => {
                    warn!("switch peripheral unreadable at startup, proceeding unknown");
                    StartupOutcome::ProceedingUnknown
                }
                StartupFallback::RequestRestart => {
                    error!("switch peripheral unreadable at startup, restart required");
                    return StartupOutcome::RestartRequired;
                }
            },
        };

        // a peripheral power-cycle must not energize the rail ahead of policy
        if self.link.update_boot_default(false).await.is_err() {
            warn!("boot default update aborted");
        }

        outcome
    }

    /// Recomputes the desired rail state from the record and pushes it
    /// to the peripheral if it differs from what is recorded. Called by
    /// the sensing watchers after a field change lands; unchanged
    /// inputs mean no traffic here.
    pub async fn reconcile(&mut self) {
        let state = self.record.get_state();
        let desired = match policy::desired_switch_state(state.power_source, state.presence) {
            Some(desired) => desired,
            None => return,
        };
        if desired == state.aux_switch {
            return;
        }
        self.apply(desired).await;
    }

    /// Manual override from the button. Flips the recorded state; an
    /// unknown rail is treated as off, so the first manual action on an
    /// unsynced controller energizes it.
    pub async fn toggle(&mut self) {
        let target = match self.record.get_aux_switch() {
            SwitchState::On => SwitchState::Off,
            SwitchState::Off | SwitchState::Unknown => SwitchState::On,
        };
        info!("manual toggle to {:?}", target);
        self.apply(target).await;
    }

    async fn apply(&mut self, target: SwitchState) {
        match self.link.set_power_state(target == SwitchState::On).await {
            Ok(()) => {
                if self.writer.set(target) {
                    info!("aux rail commanded {:?}", target);
                }
            }
            Err(_) => {
                // the rail state is unverified now, record it honestly
                self.writer.set(SwitchState::Unknown);
                warn!("aux rail command failed, state unknown");
            }
        }
    }

    /// Tears the controller down, handing the driver back.
    pub fn release(self) -> RemoteSwitch<I, D> {
        self.link
    }
}
