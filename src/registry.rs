use crate::types::{DeviceId, DeviceName};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Registry of live devices, owned by the device provider
///
/// Switches do not point at their device directly. They keep a
/// [`DeviceHandle`] and resolve it here on every use, so a removed device
/// shows up as absent instead of as a stale object.
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    devices: Arc<Mutex<BTreeMap<DeviceId, DeviceName>>>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device name and return a handle to it
    pub fn register(&self, name: impl Into<DeviceName>) -> DeviceHandle {
        let id = Uuid::new_v4();
        self.lock().insert(id, name.into());

        DeviceHandle {
            id,
            registry: self.clone(),
        }
    }

    /// Remove a device, degrading every handle to it
    pub(crate) fn unregister(&self, id: DeviceId) -> Option<DeviceName> {
        self.lock().remove(&id)
    }

    /// Resolve a device id to its name
    pub fn resolve(&self, id: DeviceId) -> Option<DeviceName> {
        self.lock().get(&id).cloned()
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<DeviceId, DeviceName>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Non-owning reference from a switch to its device
#[derive(Clone)]
pub struct DeviceHandle {
    id: DeviceId,
    registry: DeviceRegistry,
}

impl DeviceHandle {
    /// Get the id of the referenced device
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Get the device name, or `None` once the device has been removed
    pub fn resolve(&self) -> Option<DeviceName> {
        self.registry.resolve(self.id)
    }

    /// Check whether the device still exists
    pub fn is_present(&self) -> bool {
        self.resolve().is_some()
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("id", &self.id)
            .field("device", &self.resolve())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_degrades_after_unregister() {
        let registry = DeviceRegistry::new();
        let handle = registry.register("alsa_card.pci-0000_00_1f.3");
        let copy = handle.clone();

        assert_eq!(handle.resolve().as_deref(), Some("alsa_card.pci-0000_00_1f.3"));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(handle.id()).is_some());
        assert!(!handle.is_present());
        assert!(copy.resolve().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn same_name_gets_distinct_ids() {
        let registry = DeviceRegistry::new();
        let first = registry.register("card");
        let second = registry.register("card");

        assert_ne!(first.id(), second.id());
        registry.unregister(first.id());
        assert!(!first.is_present());
        assert!(second.is_present());
    }
}
