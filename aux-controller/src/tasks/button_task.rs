use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::io::ButtonInput;
use crate::rail::SharedRailController;
use crate::state::{SharedControllerState, WakeRequestWriter};

/// Turns debounced clicks into display wakes or manual rail toggles. A
/// click on a dark display means "let me look", never "toggle".
pub struct ButtonWatcher<'a, B, I, D> {
    button: B,
    record: &'a SharedControllerState,
    wake_writer: WakeRequestWriter<'a>,
    rail: &'a SharedRailController<'a, I, D>,
}

impl<'a, B: ButtonInput, I: I2c, D: DelayNs> ButtonWatcher<'a, B, I, D> {
    pub fn new(
        button: B,
        record: &'a SharedControllerState,
        wake_writer: WakeRequestWriter<'a>,
        rail: &'a SharedRailController<'a, I, D>,
    ) -> Self {
        ButtonWatcher {
            button,
            record,
            wake_writer,
            rail,
        }
    }

    /// Handles exactly one click.
    pub async fn handle_click(&mut self) {
        if !self.record.backlight_on() {
            debug!("click wakes the display");
            self.wake_writer.request_wake();
            return;
        }
        self.rail.lock().await.toggle().await;
    }

    pub async fn run(mut self) -> ! {
        info!("button watcher running");
        loop {
            self.button.wait_for_click().await;
            self.handle_click().await;
        }
    }
}
