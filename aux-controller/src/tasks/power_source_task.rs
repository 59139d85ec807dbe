use embassy_time::{Duration, Ticker};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::io::PowerSourceInput;
use crate::rail::SharedRailController;
use crate::state::{PowerSource, PowerSourceWriter};

/// Samples the power-source multiplexer and lands changes in the
/// record, reconciling the rail whenever the source actually flips.
pub struct PowerSourceWatcher<'a, P, I, D> {
    input: P,
    writer: PowerSourceWriter<'a>,
    rail: &'a SharedRailController<'a, I, D>,
    poll_interval: Duration,
}

impl<'a, P: PowerSourceInput, I: I2c, D: DelayNs> PowerSourceWatcher<'a, P, I, D> {
    pub fn new(
        input: P,
        writer: PowerSourceWriter<'a>,
        rail: &'a SharedRailController<'a, I, D>,
        poll_interval: Duration,
    ) -> Self {
        PowerSourceWatcher {
            input,
            writer,
            rail,
            poll_interval,
        }
    }

    /// One sample. Read failures keep the previous value and wait for
    /// the next poll.
    pub async fn poll_once(&mut self) {
        match self.input.read().await {
            Ok(feed) => {
                let source: PowerSource = feed.into();
                if self.writer.set(source) {
                    info!("power source now {:?}", source);
                    self.rail.lock().await.reconcile().await;
                }
            }
            Err(_) => {
                warn!("power source read failed, keeping last value");
            }
        }
    }

    pub async fn run(mut self) -> ! {
        info!("power source watcher running");
        let mut ticker = Ticker::every(self.poll_interval);
        loop {
            self.poll_once().await;
            ticker.next().await;
        }
    }
}
