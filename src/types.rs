use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Registry-issued device identifier
pub type DeviceId = Uuid;

/// Device name, the addressing key at the audio server
pub type DeviceName = String;

/// Option priority, higher values are preferred
pub type Priority = i32;

/// Kind of a switch
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchRole {
    #[default]
    Unknown,
    /// Selects the profile of a sound card
    DeviceProfile,
    /// Selects the port of a stream
    Port,
    /// Microphone boost or similar hardware gain stage
    Boost,
}

impl SwitchRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchRole::Unknown => "unknown",
            SwitchRole::DeviceProfile => "device-profile",
            SwitchRole::Port => "port",
            SwitchRole::Boost => "boost",
        }
    }
}

impl fmt::Display for SwitchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
