use embassy_time::{Duration, Ticker};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::io::PresenceProbe;
use crate::rail::SharedRailController;
use crate::state::{Presence, PresenceWriter};

/// Scans for the trusted network on a slow cadence and lands
/// present/away transitions in the record.
pub struct PresenceWatcher<'a, S, I, D> {
    probe: S,
    trusted_ssid: &'a str,
    writer: PresenceWriter<'a>,
    rail: &'a SharedRailController<'a, I, D>,
    scan_interval: Duration,
}

impl<'a, S: PresenceProbe, I: I2c, D: DelayNs> PresenceWatcher<'a, S, I, D> {
    pub fn new(
        probe: S,
        trusted_ssid: &'a str,
        writer: PresenceWriter<'a>,
        rail: &'a SharedRailController<'a, I, D>,
        scan_interval: Duration,
    ) -> Self {
        PresenceWatcher {
            probe,
            trusted_ssid,
            writer,
            rail,
            scan_interval,
        }
    }

    /// One scan. A failed scan is not the same as an empty one: the
    /// previous value is kept and the probe retried next interval.
    pub async fn scan_once(&mut self) {
        match self.probe.scan().await {
            Ok(networks) => {
                let visible = networks
                    .iter()
                    .any(|name| name.as_str() == self.trusted_ssid);
                let presence = if visible { Presence::Present } else { Presence::Away };
                if self.writer.set(presence) {
                    info!("presence now {:?}", presence);
                    self.rail.lock().await.reconcile().await;
                }
            }
            Err(_) => {
                warn!("presence scan failed, keeping last value");
            }
        }
    }

    pub async fn run(mut self) -> ! {
        info!("presence watcher running");
        let mut ticker = Ticker::every(self.scan_interval);
        loop {
            self.scan_once().await;
            ticker.next().await;
        }
    }
}
