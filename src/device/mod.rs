//! Device-state changes requested by voice commands.
//!
//! [`DeviceActuator`] owns the decision logic (capability pre-checks,
//! idempotence, confirmation). Everything platform-specific sits behind
//! [`DevicePlatform`] so the same logic drives a real adapter or
//! [`VirtualDevice`].

mod actuator;
mod virtual_device;

pub use actuator::DeviceActuator;
pub use virtual_device::{DeviceSnapshot, VirtualDevice};

use thiserror::Error;

/// Grants an operation needs before it touches the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ChangeWifiState,
    AccessWifiState,
    ModifyAudioSettings,
    Camera,
}

impl Capability {
    pub fn label(self) -> &'static str {
        match self {
            Capability::ChangeWifiState => "change_wifi_state",
            Capability::AccessWifiState => "access_wifi_state",
            Capability::ModifyAudioSettings => "modify_audio_settings",
            Capability::Camera => "camera",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingerMode {
    Normal,
    Vibrate,
    Silent,
}

impl RingerMode {
    pub fn is_muted(self) -> bool {
        !matches!(self, RingerMode::Normal)
    }

    pub fn label(self) -> &'static str {
        match self {
            RingerMode::Normal => "normal",
            RingerMode::Vibrate => "vibrate",
            RingerMode::Silent => "silent",
        }
    }
}

/// Volume streams rebalanced when sound comes back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStream {
    Ring,
    Notification,
}

/// How the platform lets apps change the Wi-Fi radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiControl {
    /// The app may flip the radio itself.
    Direct,
    /// Only a system settings panel may; the user finishes the change.
    SettingsPanel,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("platform denied access: {0}")]
    Security(String),
    #[error("platform call failed: {0}")]
    Failure(String),
}

/// Live device state and setters. Implementations never cache on behalf of callers.
pub trait DevicePlatform: Send + Sync {
    fn has_capability(&self, capability: Capability) -> bool;

    /// Ask for missing grants. Fire-and-forget; the current command still fails.
    fn request_capabilities(&self, _capabilities: &[Capability]) {}

    fn wifi_control(&self) -> WifiControl;
    fn wifi_enabled(&self) -> Result<bool, PlatformError>;
    fn set_wifi_enabled(&self, enabled: bool) -> Result<(), PlatformError>;
    fn open_wifi_panel(&self) -> Result<(), PlatformError>;

    fn ringer_mode(&self) -> Result<RingerMode, PlatformError>;
    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), PlatformError>;
    fn max_volume(&self, stream: AudioStream) -> Result<u32, PlatformError>;
    fn set_volume(&self, stream: AudioStream, level: u32) -> Result<(), PlatformError>;

    fn set_torch(&self, on: bool) -> Result<(), PlatformError>;
}
