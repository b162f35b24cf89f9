//! Setting payloads and well-known endpoint paths.
//!
//! Paths are relative to the API version segment: the client turns
//! `shooting/settings/iso` into `<base>/ver100/shooting/settings/iso`.

use serde::{Deserialize, Serialize};

/// Body of a setting GET or PUT response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingResponse {
    /// Current value, absent when the setting is unavailable in the
    /// current shooting mode
    pub value: Option<String>,
    /// Values the camera accepts right now
    pub ability: Option<Vec<String>>,
}

impl SettingResponse {
    /// Whether `candidate` is among the advertised values. A response with
    /// no ability list accepts nothing.
    pub fn accepts(&self, candidate: &str) -> bool {
        self.ability
            .as_ref()
            .is_some_and(|ability| ability.iter().any(|a| a == candidate))
    }
}

/// Body of a setting PUT request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingValue {
    pub value: String,
}

impl SettingValue {
    pub fn new(value: impl Into<String>) -> Self {
        SettingValue {
            value: value.into(),
        }
    }
}

pub const DEVICE_INFORMATION: &str = "deviceinformation";
pub const STORAGE: &str = "devicestatus/storage";
pub const BATTERY: &str = "devicestatus/battery";

pub const SHOOTING_SETTINGS: &str = "shooting/settings";
pub const ISO: &str = "shooting/settings/iso";
pub const TV: &str = "shooting/settings/tv";
pub const AV: &str = "shooting/settings/av";
pub const EXPOSURE_COMPENSATION: &str = "shooting/settings/exposure";
pub const WHITE_BALANCE: &str = "shooting/settings/wb";

pub const SHUTTER_BUTTON: &str = "shooting/control/shutterbutton";

/// Maps a short setting name (`iso`, `tv`, `exposure`...) to its endpoint.
/// Anything else is taken as a name under `shooting/settings`.
pub fn setting_endpoint(name: &str) -> String {
    match name.to_ascii_lowercase().as_str() {
        "iso" => ISO.to_string(),
        "tv" | "shutter" => TV.to_string(),
        "av" | "aperture" => AV.to_string(),
        "exposure" | "ev" => EXPOSURE_COMPENSATION.to_string(),
        "wb" | "whitebalance" => WHITE_BALANCE.to_string(),
        other => format!("{}/{}", SHOOTING_SETTINGS, other.trim_matches('/')),
    }
}
