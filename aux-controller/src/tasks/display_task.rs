use embassy_time::{Duration, Instant, Ticker};

use crate::io::{DisplayFrame, DisplayOutput};
use crate::policy;
use crate::state::{BacklightWriter, SharedControllerState};

/// Drives renders off record changes and countdown ticks, and owns the
/// backlight: lit on every render or wake request, dimmed after the
/// inactivity window.
pub struct DisplayRefreshLoop<'a, O> {
    display: O,
    record: &'a SharedControllerState,
    backlight_writer: BacklightWriter<'a>,
    grace: Duration,
    refresh_interval: Duration,
    dim_timeout: Duration,
    last_frame: Option<DisplayFrame>,
    last_render: Instant,
    handled_wake_ms: u32,
}

impl<'a, O: DisplayOutput> DisplayRefreshLoop<'a, O> {
    pub fn new(
        display: O,
        record: &'a SharedControllerState,
        backlight_writer: BacklightWriter<'a>,
        grace: Duration,
        refresh_interval: Duration,
        dim_timeout: Duration,
    ) -> Self {
        DisplayRefreshLoop {
            display,
            record,
            backlight_writer,
            grace,
            refresh_interval,
            dim_timeout,
            last_frame: None,
            last_render: Instant::now(),
            handled_wake_ms: 0,
        }
    }

    /// One scheduler pass against `now`. The frame's countdown is
    /// bucketed, so equality checks give exactly the tick-down renders:
    /// one per second in the final minute, one per minute before that.
    pub async fn refresh_once(&mut self, now: Instant) {
        let state = self.record.get_state();
        let remaining = policy::remaining_before_shutdown(&state, self.grace, now);
        let frame = DisplayFrame::new(&state, policy::countdown_display(remaining));

        let wake_stamp = self.record.last_wake_request_ms();
        if wake_stamp != self.handled_wake_ms {
            self.handled_wake_ms = wake_stamp;
            self.turn_backlight(true);
            // a wake restarts the dim window even with nothing new to draw
            self.last_render = now;
        }

        if self.last_frame != Some(frame) {
            self.turn_backlight(true);
            self.display.render(&frame).await;
            self.last_frame = Some(frame);
            self.last_render = now;
            return;
        }

        if self.record.backlight_on() && now >= self.last_render + self.dim_timeout {
            debug!("display idle, backlight off");
            self.turn_backlight(false);
        }
    }

    fn turn_backlight(&mut self, on: bool) {
        if self.record.backlight_on() != on {
            self.display.set_backlight(on);
            self.backlight_writer.set(on);
        }
    }

    pub async fn run(mut self) -> ! {
        info!("display refresh loop running");
        let mut ticker = Ticker::every(self.refresh_interval);
        loop {
            self.refresh_once(Instant::now()).await;
            ticker.next().await;
        }
    }
}
