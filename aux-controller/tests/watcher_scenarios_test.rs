mod common;

use aux_controller::io::PowerFeed;
use aux_controller::state::{PowerSource, Presence, SharedControllerState};
use aux_controller::tasks::button_task::ButtonWatcher;
use aux_controller::tasks::power_source_task::PowerSourceWatcher;
use aux_controller::tasks::presence_task::PresenceWatcher;
use common::{rail_for, PendingButton, ScriptedPowerSource, ScriptedProbe, SharedSwitchDevice};
use embassy_futures::block_on;
use embassy_time::Duration;
use remote_switch::SwitchState;

const HOME_SSID: &str = "home-net";
const POLL: Duration = Duration::from_millis(100);
const SCAN: Duration = Duration::from_secs(60);

#[test]
fn attended_accessory_lands_off_then_battery_cutover_energizes() {
    block_on(async {
        let record = SharedControllerState::new();
        let mut writers = record.claim_writers().unwrap();
        let device = SharedSwitchDevice::new();
        let rail = rail_for(&record, writers.aux_switch, &device);

        let source = ScriptedPowerSource::new([Ok(PowerFeed::Accessory), Ok(PowerFeed::Battery)]);
        let mut power = PowerSourceWatcher::new(source, writers.power_source, &rail, POLL);

        let probe = ScriptedProbe::new([
            Ok(vec![HOME_SSID, "cafe-guest"]),
            Ok(vec!["cafe-guest"]),
        ]);
        let mut presence = PresenceWatcher::new(probe, HOME_SSID, writers.presence, &rail, SCAN);

        power.poll_once().await;
        assert_eq!(record.get_power_source(), PowerSource::Accessory);
        // presence still unknown, so no command yet
        assert_eq!(device.data_writes(), 0);

        presence.scan_once().await;
        assert_eq!(record.get_presence(), Presence::Present);
        assert_eq!(record.get_aux_switch(), SwitchState::Off);
        assert_eq!(device.data_writes(), 1);

        // unplugged from the charger, operator still in range: stays off
        power.poll_once().await;
        assert_eq!(record.get_power_source(), PowerSource::Battery);
        assert_eq!(record.get_aux_switch(), SwitchState::Off);
        assert_eq!(device.data_writes(), 1);

        // operator out of range on battery: rail comes up
        presence.scan_once().await;
        assert_eq!(record.get_presence(), Presence::Away);
        assert_eq!(record.get_aux_switch(), SwitchState::On);
        assert_eq!(device.power_state(), 1);
    });
}

#[test]
fn unchanged_readings_cause_no_traffic_or_stamp_movement() {
    block_on(async {
        let record = SharedControllerState::new();
        let mut writers = record.claim_writers().unwrap();
        let device = SharedSwitchDevice::new();
        let rail = rail_for(&record, writers.aux_switch, &device);

        let source = ScriptedPowerSource::new([Ok(PowerFeed::Battery), Ok(PowerFeed::Battery)]);
        let mut power = PowerSourceWatcher::new(source, writers.power_source, &rail, POLL);

        let probe = ScriptedProbe::new([
            Ok(vec![HOME_SSID]),
            Ok(vec![HOME_SSID, "cafe-guest"]),
        ]);
        let mut presence = PresenceWatcher::new(probe, HOME_SSID, writers.presence, &rail, SCAN);

        power.poll_once().await;
        presence.scan_once().await;
        let stamp = record.last_change();
        let writes = device.data_writes();

        // second round reads the same values, nothing may move
        power.poll_once().await;
        presence.scan_once().await;
        assert_eq!(record.last_change(), stamp);
        assert_eq!(device.data_writes(), writes);
    });
}

#[test]
fn sensor_failures_keep_the_last_reading() {
    block_on(async {
        let record = SharedControllerState::new();
        let mut writers = record.claim_writers().unwrap();
        let device = SharedSwitchDevice::new();
        let rail = rail_for(&record, writers.aux_switch, &device);

        let source = ScriptedPowerSource::new([Ok(PowerFeed::Battery), Err(())]);
        let mut power = PowerSourceWatcher::new(source, writers.power_source, &rail, POLL);

        let probe = ScriptedProbe::new([Ok(vec![HOME_SSID]), Err(())]);
        let mut presence = PresenceWatcher::new(probe, HOME_SSID, writers.presence, &rail, SCAN);

        power.poll_once().await;
        presence.scan_once().await;
        assert_eq!(record.get_power_source(), PowerSource::Battery);
        assert_eq!(record.get_presence(), Presence::Present);

        power.poll_once().await;
        presence.scan_once().await;
        assert_eq!(record.get_power_source(), PowerSource::Battery);
        assert_eq!(record.get_presence(), Presence::Present);
    });
}

#[test]
fn manual_override_holds_until_the_inputs_move() {
    block_on(async {
        let record = SharedControllerState::new();
        let mut writers = record.claim_writers().unwrap();
        let device = SharedSwitchDevice::new();
        let rail = rail_for(&record, writers.aux_switch, &device);

        let source = ScriptedPowerSource::new([
            Ok(PowerFeed::Accessory),
            Ok(PowerFeed::Accessory),
            Ok(PowerFeed::Battery),
        ]);
        let mut power = PowerSourceWatcher::new(source, writers.power_source, &rail, POLL);

        let probe = ScriptedProbe::new([Ok(vec![HOME_SSID])]);
        let mut presence = PresenceWatcher::new(probe, HOME_SSID, writers.presence, &rail, SCAN);

        let mut button = ButtonWatcher::new(PendingButton, &record, writers.wake_request, &rail);

        power.poll_once().await;
        presence.scan_once().await;
        assert_eq!(record.get_aux_switch(), SwitchState::Off);

        // operator forces the rail on from the panel
        button.handle_click().await;
        assert_eq!(record.get_aux_switch(), SwitchState::On);

        // the same reading again does not fight the override
        power.poll_once().await;
        assert_eq!(record.get_aux_switch(), SwitchState::On);

        // a real input change puts policy back in charge
        power.poll_once().await;
        assert_eq!(record.get_power_source(), PowerSource::Battery);
        assert_eq!(record.get_aux_switch(), SwitchState::Off);
        assert_eq!(device.power_state(), 0);
    });
}
