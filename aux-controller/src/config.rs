use embassy_time::Duration;

/// Bus address of the switch peripheral for this deployment.
pub const SWITCH_BUS_ADDRESS: u8 = remote_switch::DEFAULT_ADDRESS;

/// How often the power-source multiplexer is sampled.
pub const POWER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How often the presence probe scans for the trusted network. Scans
/// are expensive, keep this in the tens of seconds.
pub const PRESENCE_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// How often the idle watcher re-checks the shutdown deadline.
pub const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Display scheduler tick. Renders only happen on frame changes, the
/// tick just bounds detection latency.
pub const DISPLAY_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// The backlight powers down after this long without a render.
pub const DISPLAY_DIM_TIMEOUT: Duration = Duration::from_secs(60);

/// Unattended-dwell time on battery before the controller forces a
/// low-power shutdown. Deployments pick something in the 60-300s band.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(300);
