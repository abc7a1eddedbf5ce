use crate::types::{Priority, SwitchRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command sent to the audio server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Command {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: CommandKind,
}

/// Command payloads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum CommandKind {
    /// Switch a card to another profile
    SetCardProfile { device: String, option: String },
}

impl Command {
    /// Create a new command with a fresh id
    pub fn new(kind: CommandKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    /// Create a card profile command
    pub fn set_card_profile(device: impl Into<String>, option: impl Into<String>) -> Self {
        Self::new(CommandKind::SetCardProfile {
            device: device.into(),
            option: option.into(),
        })
    }

    /// Get the command ID
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// State change reported by the audio server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A device appeared
    DeviceAdded {
        device: String,
        #[serde(default)]
        label: String,
    },

    /// A device went away
    DeviceRemoved { device: String },

    /// A device gained a switch
    SwitchAdded {
        device: String,
        switch: String,
        #[serde(default)]
        label: String,
        #[serde(default)]
        role: SwitchRole,
    },

    /// A switch gained an option
    OptionAdded {
        device: String,
        switch: String,
        option: String,
        #[serde(default)]
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        #[serde(default)]
        priority: Priority,
    },

    /// An option is no longer available
    OptionRemoved {
        device: String,
        switch: String,
        option: String,
    },

    /// A switch lost all of its options
    OptionsCleared { device: String, switch: String },

    /// The server switched a device to another option
    ActiveOptionChanged {
        device: String,
        role: SwitchRole,
        #[serde(default)]
        option: Option<String>,
    },
}

impl ServerEvent {
    /// Get the name of the device the event refers to
    pub fn device(&self) -> &str {
        match self {
            ServerEvent::DeviceAdded { device, .. }
            | ServerEvent::DeviceRemoved { device }
            | ServerEvent::SwitchAdded { device, .. }
            | ServerEvent::OptionAdded { device, .. }
            | ServerEvent::OptionRemoved { device, .. }
            | ServerEvent::OptionsCleared { device, .. }
            | ServerEvent::ActiveOptionChanged { device, .. } => device,
        }
    }
}
