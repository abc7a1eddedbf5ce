use crate::types::Priority;
use serde::{Deserialize, Serialize};

/// One selectable choice of a switch
///
/// Options never change after construction. When the server reports a
/// different shape for a choice, the old option is removed and a new one is
/// added in its place, so an `Arc<SwitchOption>` held by a caller stays valid
/// and unchanged.
///
/// Two options are equal when their names are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchOption {
    name: String,
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default)]
    priority: Priority,
}

impl SwitchOption {
    /// Create a new option
    pub fn new(name: impl Into<String>, label: impl Into<String>, priority: Priority) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            icon: None,
            priority,
        }
    }

    /// Set the icon name
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Get the option name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the icon name, if the backend provides one
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Get the priority
    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl PartialEq for SwitchOption {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SwitchOption {}
