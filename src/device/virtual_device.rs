use super::{AudioStream, Capability, DevicePlatform, PlatformError, RingerMode, WifiControl};
use crate::{lock_or_recover, log_debug};
use std::collections::HashSet;
use std::sync::Mutex;

const DEFAULT_MAX_VOLUME: u32 = 7;

/// Point-in-time view of the virtual device, for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub wifi_enabled: bool,
    pub ringer_mode: RingerMode,
    pub ring_volume: u32,
    pub notification_volume: u32,
    pub torch_on: bool,
    pub wifi_panel_opened: usize,
    pub capability_requests: usize,
}

struct VirtualState {
    wifi_enabled: bool,
    wifi_control: WifiControl,
    // Simulates a radio that ignores set requests.
    wifi_stuck: bool,
    ringer_mode: RingerMode,
    ring_volume: u32,
    notification_volume: u32,
    max_volume: u32,
    torch_on: bool,
    has_torch: bool,
    denied: HashSet<Capability>,
    fail_next: Option<PlatformError>,
    wifi_panel_opened: usize,
    capability_requests: usize,
}

/// In-memory device used where no real platform adapter exists.
pub struct VirtualDevice {
    state: Mutex<VirtualState>,
}

impl Default for VirtualDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDevice {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(VirtualState {
                wifi_enabled: false,
                wifi_control: WifiControl::Direct,
                wifi_stuck: false,
                ringer_mode: RingerMode::Normal,
                ring_volume: DEFAULT_MAX_VOLUME,
                notification_volume: DEFAULT_MAX_VOLUME,
                max_volume: DEFAULT_MAX_VOLUME,
                torch_on: false,
                has_torch: true,
                denied: HashSet::new(),
                fail_next: None,
                wifi_panel_opened: 0,
                capability_requests: 0,
            }),
        }
    }

    fn with_state(self, apply: impl FnOnce(&mut VirtualState)) -> Self {
        apply(&mut lock_or_recover(&self.state, "VirtualDevice::with_state"));
        self
    }

    pub fn with_wifi(self, enabled: bool) -> Self {
        self.with_state(|state| state.wifi_enabled = enabled)
    }

    pub fn with_wifi_control(self, control: WifiControl) -> Self {
        self.with_state(|state| state.wifi_control = control)
    }

    pub fn with_ringer_mode(self, mode: RingerMode) -> Self {
        self.with_state(|state| state.ringer_mode = mode)
    }

    pub fn with_max_volume(self, max: u32) -> Self {
        self.with_state(|state| state.max_volume = max)
    }

    pub fn without_torch(self) -> Self {
        self.with_state(|state| state.has_torch = false)
    }

    pub fn with_stuck_wifi(self) -> Self {
        self.with_state(|state| state.wifi_stuck = true)
    }

    pub fn deny(self, capability: Capability) -> Self {
        self.with_state(|state| {
            state.denied.insert(capability);
        })
    }

    pub fn grant(&self, capability: Capability) {
        lock_or_recover(&self.state, "VirtualDevice::grant").denied.remove(&capability);
    }

    /// Make the next platform call fail with `err`.
    pub fn fail_next(&self, err: PlatformError) {
        lock_or_recover(&self.state, "VirtualDevice::fail_next").fail_next = Some(err);
    }

    /// Change Wi-Fi behind the actuator's back, like the user flipping it in settings.
    pub fn set_wifi_externally(&self, enabled: bool) {
        lock_or_recover(&self.state, "VirtualDevice::set_wifi_externally").wifi_enabled = enabled;
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        let state = lock_or_recover(&self.state, "VirtualDevice::snapshot");
        DeviceSnapshot {
            wifi_enabled: state.wifi_enabled,
            ringer_mode: state.ringer_mode,
            ring_volume: state.ring_volume,
            notification_volume: state.notification_volume,
            torch_on: state.torch_on,
            wifi_panel_opened: state.wifi_panel_opened,
            capability_requests: state.capability_requests,
        }
    }

    fn call<T>(
        &self,
        op: &str,
        body: impl FnOnce(&mut VirtualState) -> Result<T, PlatformError>,
    ) -> Result<T, PlatformError> {
        let mut state = lock_or_recover(&self.state, op);
        if let Some(err) = state.fail_next.take() {
            log_debug(&format!("virtual device: injected failure in {op}: {err}"));
            return Err(err);
        }
        body(&mut state)
    }
}

impl DevicePlatform for VirtualDevice {
    fn has_capability(&self, capability: Capability) -> bool {
        !lock_or_recover(&self.state, "VirtualDevice::has_capability")
            .denied
            .contains(&capability)
    }

    fn request_capabilities(&self, capabilities: &[Capability]) {
        let labels: Vec<&str> = capabilities.iter().map(|cap| cap.label()).collect();
        log_debug(&format!("virtual device: grant requested for {}", labels.join(", ")));
        lock_or_recover(&self.state, "VirtualDevice::request_capabilities").capability_requests +=
            1;
    }

    fn wifi_control(&self) -> WifiControl {
        lock_or_recover(&self.state, "VirtualDevice::wifi_control").wifi_control
    }

    fn wifi_enabled(&self) -> Result<bool, PlatformError> {
        self.call("wifi_enabled", |state| Ok(state.wifi_enabled))
    }

    fn set_wifi_enabled(&self, enabled: bool) -> Result<(), PlatformError> {
        self.call("set_wifi_enabled", |state| {
            if state.wifi_control != WifiControl::Direct {
                return Err(PlatformError::Security(
                    "direct wifi changes are not allowed".to_string(),
                ));
            }
            if !state.wifi_stuck {
                state.wifi_enabled = enabled;
            }
            Ok(())
        })
    }

    fn open_wifi_panel(&self) -> Result<(), PlatformError> {
        self.call("open_wifi_panel", |state| {
            state.wifi_panel_opened += 1;
            Ok(())
        })
    }

    fn ringer_mode(&self) -> Result<RingerMode, PlatformError> {
        self.call("ringer_mode", |state| Ok(state.ringer_mode))
    }

    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), PlatformError> {
        self.call("set_ringer_mode", |state| {
            state.ringer_mode = mode;
            Ok(())
        })
    }

    fn max_volume(&self, _stream: AudioStream) -> Result<u32, PlatformError> {
        self.call("max_volume", |state| Ok(state.max_volume))
    }

    fn set_volume(&self, stream: AudioStream, level: u32) -> Result<(), PlatformError> {
        self.call("set_volume", |state| {
            let level = level.min(state.max_volume);
            match stream {
                AudioStream::Ring => state.ring_volume = level,
                AudioStream::Notification => state.notification_volume = level,
            }
            Ok(())
        })
    }

    fn set_torch(&self, on: bool) -> Result<(), PlatformError> {
        self.call("set_torch", |state| {
            if !state.has_torch {
                return Err(PlatformError::Failure("no torch-capable camera".to_string()));
            }
            state.torch_on = on;
            Ok(())
        })
    }
}
