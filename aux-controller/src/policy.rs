use embassy_time::{Duration, Instant};
use remote_switch::SwitchState;

use crate::state::{ControllerState, PowerSource, Presence};

/// Switch decision for a pair of sensor values.
///
/// Battery power with the operator away is the one combination that
/// needs the rail energized: the dependent device has to stay powered
/// and reachable while nobody is around to mind it. Every other fully
/// known combination turns the rail off. An unknown on either input
/// yields no decision at all.
pub fn desired_switch_state(power_source: PowerSource, presence: Presence) -> Option<SwitchState> {
    match (power_source, presence) {
        (PowerSource::Unknown, _) | (_, Presence::Unknown) => None,
        (PowerSource::Battery, Presence::Away) => Some(SwitchState::On),
        _ => Some(SwitchState::Off),
    }
}

/// The instant the idle grace window expires, if one is armed. The
/// window runs only while the host is on battery with the operator
/// present; any record change re-arms it.
pub fn shutdown_deadline(state: &ControllerState, grace: Duration) -> Option<Instant> {
    if state.power_source == PowerSource::Battery && state.presence == Presence::Present {
        Some(state.last_change + grace)
    } else {
        None
    }
}

/// Time left before the idle shutdown fires. `None` means no shutdown
/// is pending at all; zero means the deadline has passed.
pub fn remaining_before_shutdown(
    state: &ControllerState,
    grace: Duration,
    now: Instant,
) -> Option<Duration> {
    let deadline = shutdown_deadline(state, grace)?;
    if now >= deadline {
        Some(Duration::from_ticks(0))
    } else {
        Some(deadline - now)
    }
}

/// Granularity tiers for the rendered countdown: seconds tick in the
/// final minute, minutes up to an hour, plain running state beyond that
/// or when no shutdown is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutdownCountdown {
    Running,
    Minutes(u32),
    Seconds(u32),
}

pub fn countdown_display(remaining: Option<Duration>) -> ShutdownCountdown {
    let remaining = match remaining {
        Some(remaining) => remaining,
        None => return ShutdownCountdown::Running,
    };
    let secs = remaining.as_secs();
    if secs < 60 {
        ShutdownCountdown::Seconds(secs as u32)
    } else if secs < 60 * 60 {
        ShutdownCountdown::Minutes((secs / 60) as u32)
    } else {
        ShutdownCountdown::Running
    }
}
