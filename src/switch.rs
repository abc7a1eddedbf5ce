use crate::backend::SwitchBackend;
use crate::error::{Result, SwitchError};
use crate::option::SwitchOption;
use crate::registry::DeviceHandle;
use crate::types::{DeviceName, SwitchRole};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Construction parameters of a switch
///
/// The device binding is fixed here; a switch cannot be moved to another
/// device afterwards.
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    pub name: String,
    pub label: String,
    pub role: SwitchRole,
    pub device: DeviceHandle,
}

/// Ordered set of mutually exclusive options on a device
///
/// `Switch` is a cheap handle; clones share the same options and active
/// option. Options are kept sorted by descending priority, with options of
/// equal priority in the order they were added.
///
/// Activation is two-phase. [`request_activate`](Self::request_activate)
/// only sends a command through the backend. The active option changes when
/// the server confirms it through [`confirm_active`](Self::confirm_active).
#[derive(Clone)]
pub struct Switch {
    name: String,
    label: String,
    role: SwitchRole,
    device: DeviceHandle,
    backend: Arc<dyn SwitchBackend>,
    state: Arc<Mutex<SwitchState>>,
}

#[derive(Default)]
struct SwitchState {
    options: Vec<Arc<SwitchOption>>,
    active: Option<Arc<SwitchOption>>,
}

impl SwitchState {
    fn find(&self, name: &str) -> Option<&Arc<SwitchOption>> {
        self.options.iter().find(|o| o.name() == name)
    }
}

impl Switch {
    /// Create a switch bound to the device in `config`
    pub fn new(config: SwitchConfig, backend: Arc<dyn SwitchBackend>) -> Self {
        Self {
            name: config.name,
            label: config.label,
            role: config.role,
            device: config.device,
            backend,
            state: Arc::new(Mutex::new(SwitchState::default())),
        }
    }

    /// Get the switch name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the switch role
    pub fn role(&self) -> SwitchRole {
        self.role
    }

    /// Get the name of the owning device, or `None` if it was removed
    pub fn device(&self) -> Option<DeviceName> {
        self.device.resolve()
    }

    /// Get the handle to the owning device
    pub fn device_handle(&self) -> &DeviceHandle {
        &self.device
    }

    /// Add an option at its priority position
    ///
    /// Adding a name that is already present does nothing, since the server
    /// may report the same option more than once. Returns whether the option
    /// was inserted.
    pub fn add_option(&self, option: SwitchOption) -> bool {
        let mut state = self.lock();

        if state.find(option.name()).is_some() {
            tracing::debug!("Switch {} already has option {}", self.name, option.name());
            return false;
        }

        // Equal priorities go after the existing ones
        let index = state
            .options
            .iter()
            .position(|o| o.priority() < option.priority())
            .unwrap_or(state.options.len());

        state.options.insert(index, Arc::new(option));
        true
    }

    /// Remove an option the server no longer offers
    ///
    /// Unsets the active option if it was the removed one.
    pub fn remove_option(&self, name: &str) -> Option<Arc<SwitchOption>> {
        let mut state = self.lock();

        let index = state.options.iter().position(|o| o.name() == name)?;
        let removed = state.options.remove(index);

        if state.active.as_ref().is_some_and(|a| a.name() == name) {
            tracing::debug!("Active option {} of switch {} was removed", name, self.name);
            state.active = None;
        }

        Some(removed)
    }

    /// Remove all options and unset the active option
    pub fn clear_options(&self) {
        let mut state = self.lock();
        state.options.clear();
        state.active = None;
    }

    /// Get the options in priority order
    pub fn list_options(&self) -> Vec<Arc<SwitchOption>> {
        self.lock().options.clone()
    }

    /// Find an option by exact name
    pub fn find_option_by_name(&self, name: &str) -> Option<Arc<SwitchOption>> {
        self.lock().find(name).cloned()
    }

    /// Get the option the server last confirmed as active
    pub fn active_option(&self) -> Option<Arc<SwitchOption>> {
        self.lock().active.clone()
    }

    /// Ask the backend to activate `option`
    ///
    /// Success means the command was sent, not that the device switched.
    pub fn request_activate(&self, option: &SwitchOption) -> Result<()> {
        if self.lock().find(option.name()).is_none() {
            return Err(SwitchError::InvalidOption {
                switch: self.name.clone(),
                option: option.name().to_string(),
            });
        }

        let device = self
            .device
            .resolve()
            .ok_or_else(|| SwitchError::DeviceUnavailable(self.name.clone()))?;

        if !self.backend.activate(&device, option.name()) {
            return Err(SwitchError::TransportFailure {
                device,
                option: option.name().to_string(),
            });
        }

        tracing::debug!("Requested option {} on device {}", option.name(), device);
        Ok(())
    }

    /// Ask the backend to activate the option called `name`
    pub fn request_activate_by_name(&self, name: &str) -> Result<()> {
        match self.find_option_by_name(name) {
            Some(option) => self.request_activate(&option),
            None => {
                tracing::debug!("Invalid option name {} for switch {}", name, self.name);
                Err(SwitchError::UnknownOptionName {
                    switch: self.name.clone(),
                    name: name.to_string(),
                })
            }
        }
    }

    /// Record the server's confirmation that `name` is now active
    ///
    /// Names that are not options of this switch are ignored. Returns `true`
    /// when the active option changed.
    pub fn confirm_active(&self, name: &str) -> bool {
        let mut state = self.lock();

        let Some(option) = state.find(name).cloned() else {
            tracing::debug!("Ignoring unknown active option {} for switch {}", name, self.name);
            return false;
        };

        if state.active.as_ref().is_some_and(|a| a.name() == name) {
            return false;
        }

        state.active = Some(option);
        true
    }

    /// Check whether two handles refer to the same switch
    pub fn same_switch(&self, other: &Switch) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn lock(&self) -> MutexGuard<'_, SwitchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Switch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Switch")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("device", &self.device)
            .field("options", &state.options.len())
            .field("active", &state.active.as_ref().map(|a| a.name().to_string()))
            .finish()
    }
}
