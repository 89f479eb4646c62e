use super::{AudioStream, Capability, DevicePlatform, PlatformError, RingerMode, WifiControl};
use crate::catalog::{ResponseCatalog, ResponseCategory};
use crate::error::FaultKind;
use crate::{log_debug, log_fault};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WIFI_CAPABILITIES: [Capability; 2] =
    [Capability::ChangeWifiState, Capability::AccessWifiState];

pub struct DeviceActuator {
    platform: Arc<dyn DevicePlatform>,
    catalog: Arc<ResponseCatalog>,
    wifi_settle: Duration,
    // The torch has no readable state on most platforms, so this mirror is the source of truth.
    flashlight_on: AtomicBool,
}

impl DeviceActuator {
    pub fn new(
        platform: Arc<dyn DevicePlatform>,
        catalog: Arc<ResponseCatalog>,
        wifi_settle: Duration,
    ) -> Self {
        Self {
            platform,
            catalog,
            wifi_settle,
            flashlight_on: AtomicBool::new(false),
        }
    }

    pub fn platform(&self) -> &Arc<dyn DevicePlatform> {
        &self.platform
    }

    /// Returns the missing subset of `needed`, requesting it from the platform.
    fn missing_capabilities(&self, needed: &[Capability]) -> Vec<Capability> {
        let missing: Vec<Capability> = needed
            .iter()
            .copied()
            .filter(|cap| !self.platform.has_capability(*cap))
            .collect();
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(|cap| cap.label()).collect();
            log_fault(
                FaultKind::PermissionDenied,
                &format!("missing capabilities: {}", labels.join(", ")),
            );
            self.platform.request_capabilities(&missing);
        }
        missing
    }

    pub fn toggle_wifi(&self, enable: bool) -> String {
        if !self.missing_capabilities(&WIFI_CAPABILITIES).is_empty() {
            return "Дай разрешения на управление и доступ к Wi-Fi, господин!".to_string();
        }
        match self.try_toggle_wifi(enable) {
            Ok(reply) => reply,
            Err(PlatformError::Security(detail)) => {
                log_fault(FaultKind::PermissionDenied, &format!("toggle_wifi: {detail}"));
                "Нет прав на управление Wi-Fi, проверь разрешения!".to_string()
            }
            Err(err) => {
                log_fault(FaultKind::PlatformRejected, &format!("toggle_wifi: {err}"));
                "Что-то пошло не так с Wi-Fi, господин!".to_string()
            }
        }
    }

    fn try_toggle_wifi(&self, enable: bool) -> Result<String, PlatformError> {
        let current = self.platform.wifi_enabled()?;
        log_debug(&format!("wifi currently enabled={current}, requested={enable}"));
        if current == enable {
            return Ok(if enable {
                "Wi-Fi уже включён, господин!"
            } else {
                "Wi-Fi уже выключен, господин!"
            }
            .to_string());
        }

        match self.platform.wifi_control() {
            WifiControl::SettingsPanel => {
                self.platform.open_wifi_panel()?;
                Ok("Господин, включите или выключите Wi-Fi в настройках!".to_string())
            }
            WifiControl::Direct => {
                self.platform.set_wifi_enabled(enable)?;
                if !self.wifi_settle.is_zero() {
                    thread::sleep(self.wifi_settle);
                }
                let confirmed = self.platform.wifi_enabled()?;
                tracing::info!(requested = enable, confirmed, "wifi toggle");
                if confirmed == enable {
                    let category = if enable {
                        ResponseCategory::WifiOn
                    } else {
                        ResponseCategory::WifiOff
                    };
                    Ok(self.catalog.pick(category))
                } else {
                    log_fault(
                        FaultKind::PlatformRejected,
                        &format!("wifi stayed enabled={confirmed} after toggle"),
                    );
                    Ok(format!(
                        "Не удалось {} Wi-Fi, господин!",
                        if enable { "включить" } else { "выключить" }
                    ))
                }
            }
        }
    }

    pub fn set_mute(&self, mute: bool) -> String {
        if !self
            .missing_capabilities(&[Capability::ModifyAudioSettings])
            .is_empty()
        {
            return "Дай разрешение на управление звуком, господин!".to_string();
        }
        match self.try_set_mute(mute) {
            Ok(reply) => reply,
            Err(PlatformError::Security(detail)) => {
                log_fault(FaultKind::PermissionDenied, &format!("set_mute: {detail}"));
                "Нет прав на управление звуком, проверь разрешения!".to_string()
            }
            Err(err) => {
                log_fault(FaultKind::PlatformRejected, &format!("set_mute: {err}"));
                "Звук не хочет слушаться, господин! Проверь настройки.".to_string()
            }
        }
    }

    fn try_set_mute(&self, mute: bool) -> Result<String, PlatformError> {
        let current = self.platform.ringer_mode()?;
        log_debug(&format!("ringer mode {}, mute requested={mute}", current.label()));
        if mute && current != RingerMode::Vibrate {
            self.platform.set_ringer_mode(RingerMode::Vibrate)?;
            tracing::info!(mode = "vibrate", "ringer mode changed");
            return Ok(self.catalog.pick(ResponseCategory::SoundOff));
        }
        if !mute && current.is_muted() {
            self.platform.set_ringer_mode(RingerMode::Normal)?;
            for stream in [AudioStream::Ring, AudioStream::Notification] {
                let max = self.platform.max_volume(stream)?;
                self.platform.set_volume(stream, max / 2)?;
            }
            tracing::info!(mode = "normal", "ringer mode changed");
            return Ok(self.catalog.pick(ResponseCategory::SoundOn));
        }
        Ok(if mute {
            "Уже в режиме вибрации, господин!"
        } else {
            "Звук уже включён, господин!"
        }
        .to_string())
    }

    pub fn toggle_flashlight(&self, enable: bool) -> String {
        if !self.missing_capabilities(&[Capability::Camera]).is_empty() {
            return "Дай разрешение на камеру, господин, иначе фонарик не включить!".to_string();
        }
        if self.flashlight_on.load(Ordering::SeqCst) == enable {
            return if enable {
                "Фонарик уже светит, господин!"
            } else {
                "Фонарик уже выключен, господин!"
            }
            .to_string();
        }
        match self.platform.set_torch(enable) {
            Ok(()) => {
                self.flashlight_on.store(enable, Ordering::SeqCst);
                let category = if enable {
                    ResponseCategory::FlashlightOn
                } else {
                    ResponseCategory::FlashlightOff
                };
                self.catalog.pick(category)
            }
            Err(err) => {
                log_fault(FaultKind::PlatformRejected, &format!("set_torch: {err}"));
                format!(
                    "Не удалось {} фонарик, господин!",
                    if enable { "включить" } else { "выключить" }
                )
            }
        }
    }
}
