use crate::backend::SwitchBackend;
use crate::registry::DeviceHandle;
use crate::switch::{Switch, SwitchConfig};
use crate::types::{DeviceId, SwitchRole};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Addressable audio device exposing switches
///
/// `Device` is a cheap handle; clones share the same switch list.
#[derive(Clone)]
pub struct Device {
    name: String,
    label: String,
    handle: DeviceHandle,
    switches: Arc<Mutex<Vec<Switch>>>,
}

impl Device {
    /// Create a device from a registry handle
    pub(crate) fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        handle: DeviceHandle,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            handle,
            switches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the device name used to address it at the server
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the registry id
    pub fn id(&self) -> DeviceId {
        self.handle.id()
    }

    /// Check whether the device is still registered
    pub fn is_present(&self) -> bool {
        self.handle.is_present()
    }

    /// Get a snapshot of the device's switches in creation order
    pub fn switches(&self) -> Vec<Switch> {
        self.lock().clone()
    }

    /// Find a switch by name
    pub fn switch(&self, name: &str) -> Option<Switch> {
        self.lock().iter().find(|s| s.name() == name).cloned()
    }

    /// Find the first switch with the given role
    pub fn switch_by_role(&self, role: SwitchRole) -> Option<Switch> {
        self.lock().iter().find(|s| s.role() == role).cloned()
    }

    /// Create a switch bound to this device
    ///
    /// Returns the existing switch if one with the same name is present.
    pub fn add_switch(
        &self,
        name: impl Into<String>,
        label: impl Into<String>,
        role: SwitchRole,
        backend: Arc<dyn SwitchBackend>,
    ) -> Switch {
        let name = name.into();
        let mut switches = self.lock();

        if let Some(existing) = switches.iter().find(|s| s.name() == name) {
            return existing.clone();
        }

        tracing::debug!("Adding {} switch {} to device {}", role, name, self.name);

        let switch = Switch::new(
            SwitchConfig {
                name,
                label: label.into(),
                role,
                device: self.handle.clone(),
            },
            backend,
        );
        switches.push(switch.clone());
        switch
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Switch>> {
        self.switches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("id", &self.id())
            .field("switches", &self.lock().len())
            .finish()
    }
}
