use embassy_time::{Duration, Instant, Ticker};

use crate::io::ShutdownControl;
use crate::policy;
use crate::state::SharedControllerState;

/// Forces the low-power shutdown once the grace window expires in the
/// attended-on-battery state. Fires once per window; any record change
/// re-arms it.
pub struct IdleShutdownWatcher<'a, SD> {
    shutdown: SD,
    record: &'a SharedControllerState,
    grace: Duration,
    check_interval: Duration,
    fired_for_change: Option<Instant>,
}

impl<'a, SD: ShutdownControl> IdleShutdownWatcher<'a, SD> {
    pub fn new(
        shutdown: SD,
        record: &'a SharedControllerState,
        grace: Duration,
        check_interval: Duration,
    ) -> Self {
        IdleShutdownWatcher {
            shutdown,
            record,
            grace,
            check_interval,
            fired_for_change: None,
        }
    }

    /// One deadline check against `now`.
    pub async fn check_once(&mut self, now: Instant) {
        let state = self.record.get_state();
        match policy::remaining_before_shutdown(&state, self.grace, now) {
            None => {
                // left the attended-on-battery state, disarm
                self.fired_for_change = None;
            }
            Some(remaining) => {
                if remaining.as_ticks() > 0 {
                    return;
                }
                if self.fired_for_change == Some(state.last_change) {
                    return;
                }
                self.fired_for_change = Some(state.last_change);
                warn!("idle grace expired, entering low power");
                self.shutdown.enter_low_power().await;
            }
        }
    }

    pub async fn run(mut self) -> ! {
        info!("idle shutdown watcher running");
        let mut ticker = Ticker::every(self.check_interval);
        loop {
            ticker.next().await;
            self.check_once(Instant::now()).await;
        }
    }
}
