use crate::backend::SwitchBackend;
use crate::config::Config;
use crate::device::Device;
use crate::error::{Result, SwitchError};
use crate::option::SwitchOption;
use crate::protocol::ServerEvent;
use crate::registry::DeviceRegistry;
use crate::subscription::EventReceiver;
use crate::types::SwitchRole;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Change applied by a mixer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MixerUpdate {
    /// A device was added
    DeviceAdded(String),

    /// A device was removed
    DeviceRemoved(String),

    /// The server confirmed a different active option, or the active option
    /// went away (`option` is `None`)
    ActiveOptionChanged {
        device: String,
        switch: String,
        option: Option<String>,
    },
}

/// Device provider keeping devices and switches in sync with the server
///
/// The mixer owns the device registry that switches resolve their device
/// through. Server events are applied with [`apply`](Self::apply), either
/// directly or by the background task started with [`start`](Self::start).
///
/// # Example
///
/// ```no_run
/// use mixer_switch::{ChannelConnection, Mixer, ProfileBackend};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (connection, _commands) = ChannelConnection::new();
///     let connection = Arc::new(connection);
///     let events = connection.subscribe();
///
///     let mut mixer = Mixer::new(Arc::new(ProfileBackend::new(connection.clone())));
///     mixer.start(events);
///
///     if let Some(device) = mixer.device("alsa_card.pci-0000_00_1f.3") {
///         for switch in device.switches() {
///             switch.request_activate_by_name("output:hdmi-stereo")?;
///         }
///     }
///
///     mixer.stop().await;
///     Ok(())
/// }
/// ```
pub struct Mixer {
    core: Arc<MixerCore>,
    config: Config,
    stop_tx: Option<broadcast::Sender<()>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

struct MixerCore {
    devices: Mutex<BTreeMap<String, Device>>,
    registry: DeviceRegistry,
    backend: Arc<dyn SwitchBackend>,
    update_tx: broadcast::Sender<MixerUpdate>,
}

impl Mixer {
    /// Create a mixer whose switches activate options through `backend`
    pub fn new(backend: Arc<dyn SwitchBackend>) -> Self {
        Self::with_config(backend, Config::default())
    }

    /// Create a mixer with the given configuration
    pub fn with_config(backend: Arc<dyn SwitchBackend>, config: Config) -> Self {
        let (update_tx, _) = broadcast::channel(config.update_capacity.max(1));

        Self {
            core: Arc::new(MixerCore {
                devices: Mutex::new(BTreeMap::new()),
                registry: DeviceRegistry::new(),
                backend,
                update_tx,
            }),
            config,
            stop_tx: None,
            task_handle: None,
        }
    }

    /// Subscribe to applied changes
    pub fn subscribe_updates(&self) -> broadcast::Receiver<MixerUpdate> {
        self.core.update_tx.subscribe()
    }

    /// Get a snapshot of the known devices, ordered by name
    pub fn devices(&self) -> Vec<Device> {
        self.core.lock().values().cloned().collect()
    }

    /// Find a device by name
    pub fn device(&self, name: &str) -> Option<Device> {
        self.core.lock().get(name).cloned()
    }

    /// Get the number of known devices
    pub fn device_count(&self) -> usize {
        self.core.lock().len()
    }

    /// Get the registry switches resolve their devices through
    pub fn registry(&self) -> &DeviceRegistry {
        &self.core.registry
    }

    /// Apply one server event
    ///
    /// Events naming unknown devices or switches fail without side effects.
    pub fn apply(&self, event: ServerEvent) -> Result<()> {
        self.core.apply(event)
    }

    /// Check whether the event task is running
    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start applying events from `events` in a background task
    ///
    /// A running task is replaced. The task ends when the connection closes or
    /// [`stop`](Self::stop) is called. Failing events are logged and skipped.
    pub fn start(&mut self, mut events: EventReceiver) {
        self.abort();

        let (stop_tx, mut stop_rx) = broadcast::channel(1);
        self.stop_tx = Some(stop_tx);

        let core = self.core.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        tracing::info!("Mixer event task stopped");
                        break;
                    }
                    event = events.recv() => {
                        let Ok(event) = event else {
                            tracing::info!("Event channel closed");
                            break;
                        };
                        if let Err(e) = core.apply(event) {
                            tracing::warn!("Failed to apply server event: {}", e);
                        }
                    }
                }
            }
        });

        self.task_handle = Some(handle);
    }

    /// Stop the event task
    ///
    /// Devices and switches are kept and can be used after stopping.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut handle) = self.task_handle.take() {
            if tokio::time::timeout(self.config.stop_grace(), &mut handle)
                .await
                .is_err()
            {
                tracing::warn!("Mixer event task did not stop in time, aborting");
                handle.abort();
            }
        }
    }

    fn abort(&mut self) {
        self.stop_tx = None;
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Mixer {
    fn drop(&mut self) {
        self.abort();
    }
}

impl MixerCore {
    fn apply(&self, event: ServerEvent) -> Result<()> {
        match event {
            ServerEvent::DeviceAdded { device, label } => {
                let mut devices = self.lock();
                if devices.contains_key(&device) {
                    tracing::debug!("Device {} already known", device);
                    return Ok(());
                }

                tracing::info!("Device added: {}", device);
                let handle = self.registry.register(device.clone());
                devices.insert(device.clone(), Device::new(device.clone(), label, handle));
                drop(devices);

                self.notify(MixerUpdate::DeviceAdded(device));
            }
            ServerEvent::DeviceRemoved { device } => {
                let removed = self
                    .lock()
                    .remove(&device)
                    .ok_or_else(|| SwitchError::DeviceNotFound(device.clone()))?;

                tracing::info!("Device removed: {}", device);
                self.registry.unregister(removed.id());
                self.notify(MixerUpdate::DeviceRemoved(device));
            }
            ServerEvent::SwitchAdded {
                device,
                switch,
                label,
                role,
            } => {
                self.device(&device)?
                    .add_switch(switch, label, role, self.backend.clone());
            }
            ServerEvent::OptionAdded {
                device,
                switch,
                option,
                label,
                icon,
                priority,
            } => {
                let mut option = SwitchOption::new(option, label, priority);
                if let Some(icon) = icon {
                    option = option.with_icon(icon);
                }

                self.device(&device)?
                    .switch(&switch)
                    .ok_or_else(|| SwitchError::SwitchNotFound(format!("{}/{}", device, switch)))?
                    .add_option(option);
            }
            ServerEvent::OptionRemoved {
                device,
                switch,
                option,
            } => {
                let target = self
                    .device(&device)?
                    .switch(&switch)
                    .ok_or_else(|| SwitchError::SwitchNotFound(format!("{}/{}", device, switch)))?;

                let was_active = target
                    .active_option()
                    .is_some_and(|active| active.name() == option);

                if target.remove_option(&option).is_some() && was_active {
                    self.notify(MixerUpdate::ActiveOptionChanged {
                        device,
                        switch,
                        option: None,
                    });
                }
            }
            ServerEvent::OptionsCleared { device, switch } => {
                let target = self
                    .device(&device)?
                    .switch(&switch)
                    .ok_or_else(|| SwitchError::SwitchNotFound(format!("{}/{}", device, switch)))?;

                let had_active = target.active_option().is_some();
                target.clear_options();

                if had_active {
                    self.notify(MixerUpdate::ActiveOptionChanged {
                        device,
                        switch,
                        option: None,
                    });
                }
            }
            ServerEvent::ActiveOptionChanged {
                device,
                role,
                option,
            } => {
                let target = self.switch_by_role(&device, role)?;

                let Some(option) = option else {
                    tracing::debug!("No active option reported for {} switch of {}", role, device);
                    return Ok(());
                };

                if target.confirm_active(&option) {
                    tracing::debug!("Device {} switched {} to {}", device, target.name(), option);
                    self.notify(MixerUpdate::ActiveOptionChanged {
                        device,
                        switch: target.name().to_string(),
                        option: Some(option),
                    });
                }
            }
        }

        Ok(())
    }

    fn device(&self, name: &str) -> Result<Device> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| SwitchError::DeviceNotFound(name.to_string()))
    }

    fn switch_by_role(&self, device: &str, role: SwitchRole) -> Result<crate::switch::Switch> {
        self.device(device)?
            .switch_by_role(role)
            .ok_or_else(|| SwitchError::SwitchNotFound(format!("{}/{}", device, role)))
    }

    fn notify(&self, update: MixerUpdate) {
        // No subscribers is fine
        let _ = self.update_tx.send(update);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Device>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ProfileBackend;
    use crate::connection::ChannelConnection;

    struct AcceptAll;

    impl SwitchBackend for AcceptAll {
        fn activate(&self, _device_name: &str, _option_name: &str) -> bool {
            true
        }
    }

    fn populated_mixer() -> Mixer {
        let mixer = Mixer::new(Arc::new(AcceptAll));
        let events = vec![
            ServerEvent::DeviceAdded {
                device: "card0".to_string(),
                label: "Built-in Audio".to_string(),
            },
            ServerEvent::SwitchAdded {
                device: "card0".to_string(),
                switch: "profile".to_string(),
                label: "Profile".to_string(),
                role: SwitchRole::DeviceProfile,
            },
            ServerEvent::OptionAdded {
                device: "card0".to_string(),
                switch: "profile".to_string(),
                option: "off".to_string(),
                label: "Off".to_string(),
                icon: None,
                priority: 0,
            },
            ServerEvent::OptionAdded {
                device: "card0".to_string(),
                switch: "profile".to_string(),
                option: "analog-stereo".to_string(),
                label: "Analog Stereo".to_string(),
                icon: Some("audio-card".to_string()),
                priority: 10,
            },
        ];
        for event in events {
            mixer.apply(event).unwrap();
        }
        mixer
    }

    fn active_changed(option: &str) -> ServerEvent {
        ServerEvent::ActiveOptionChanged {
            device: "card0".to_string(),
            role: SwitchRole::DeviceProfile,
            option: Some(option.to_string()),
        }
    }

    #[test]
    fn discovery_events_build_devices() {
        let mixer = populated_mixer();

        assert_eq!(mixer.device_count(), 1);
        let device = mixer.device("card0").unwrap();
        assert_eq!(device.label(), "Built-in Audio");

        let switch = device.switch("profile").unwrap();
        let options = switch.list_options();
        assert_eq!(options[0].name(), "analog-stereo");
        assert_eq!(options[0].icon(), Some("audio-card"));
        assert_eq!(options[1].name(), "off");
    }

    #[test]
    fn repeated_discovery_is_idempotent() {
        let mixer = populated_mixer();
        let id = mixer.device("card0").unwrap().id();

        mixer
            .apply(ServerEvent::DeviceAdded {
                device: "card0".to_string(),
                label: String::new(),
            })
            .unwrap();
        mixer
            .apply(ServerEvent::OptionAdded {
                device: "card0".to_string(),
                switch: "profile".to_string(),
                option: "off".to_string(),
                label: "Off".to_string(),
                icon: None,
                priority: 99,
            })
            .unwrap();

        let device = mixer.device("card0").unwrap();
        assert_eq!(device.id(), id);
        assert_eq!(device.switch("profile").unwrap().list_options().len(), 2);
    }

    #[test]
    fn active_option_follows_confirmation() {
        let mixer = populated_mixer();
        let mut updates = mixer.subscribe_updates();
        let switch = mixer.device("card0").unwrap().switch("profile").unwrap();

        mixer.apply(active_changed("off")).unwrap();

        assert_eq!(switch.active_option().unwrap().name(), "off");
        assert_eq!(
            updates.try_recv().unwrap(),
            MixerUpdate::ActiveOptionChanged {
                device: "card0".to_string(),
                switch: "profile".to_string(),
                option: Some("off".to_string()),
            }
        );

        // Same option again is not a change
        mixer.apply(active_changed("off")).unwrap();
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn confirmation_for_unknown_option_is_ignored() {
        let mixer = populated_mixer();
        let switch = mixer.device("card0").unwrap().switch("profile").unwrap();
        mixer.apply(active_changed("analog-stereo")).unwrap();

        mixer.apply(active_changed("surround-51")).unwrap();
        mixer
            .apply(ServerEvent::ActiveOptionChanged {
                device: "card0".to_string(),
                role: SwitchRole::DeviceProfile,
                option: None,
            })
            .unwrap();

        assert_eq!(switch.active_option().unwrap().name(), "analog-stereo");
    }

    #[test]
    fn removing_active_option_notifies() {
        let mixer = populated_mixer();
        mixer.apply(active_changed("off")).unwrap();
        let mut updates = mixer.subscribe_updates();

        mixer
            .apply(ServerEvent::OptionRemoved {
                device: "card0".to_string(),
                switch: "profile".to_string(),
                option: "off".to_string(),
            })
            .unwrap();

        let switch = mixer.device("card0").unwrap().switch("profile").unwrap();
        assert!(switch.active_option().is_none());
        assert_eq!(
            updates.try_recv().unwrap(),
            MixerUpdate::ActiveOptionChanged {
                device: "card0".to_string(),
                switch: "profile".to_string(),
                option: None,
            }
        );
    }

    #[test]
    fn cleared_switch_unsets_active_option() {
        let mixer = populated_mixer();
        mixer.apply(active_changed("analog-stereo")).unwrap();
        let mut updates = mixer.subscribe_updates();

        mixer
            .apply(ServerEvent::OptionsCleared {
                device: "card0".to_string(),
                switch: "profile".to_string(),
            })
            .unwrap();

        let switch = mixer.device("card0").unwrap().switch("profile").unwrap();
        assert!(switch.list_options().is_empty());
        assert!(switch.active_option().is_none());
        assert_eq!(
            updates.try_recv().unwrap(),
            MixerUpdate::ActiveOptionChanged {
                device: "card0".to_string(),
                switch: "profile".to_string(),
                option: None,
            }
        );

        // Confirmations for the old options are ignored until rediscovery
        mixer.apply(active_changed("analog-stereo")).unwrap();
        assert!(switch.active_option().is_none());
    }

    #[test]
    fn device_removal_degrades_held_switches() {
        let mixer = populated_mixer();
        let switch = mixer.device("card0").unwrap().switch("profile").unwrap();
        assert!(switch.request_activate_by_name("off").is_ok());

        mixer
            .apply(ServerEvent::DeviceRemoved {
                device: "card0".to_string(),
            })
            .unwrap();

        assert_eq!(mixer.device_count(), 0);
        assert!(mixer.registry().is_empty());
        assert!(switch.device().is_none());
        assert!(matches!(
            switch.request_activate_by_name("off"),
            Err(SwitchError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn re_added_device_does_not_revive_old_switches() {
        let mixer = populated_mixer();
        let old = mixer.device("card0").unwrap().switch("profile").unwrap();

        mixer
            .apply(ServerEvent::DeviceRemoved {
                device: "card0".to_string(),
            })
            .unwrap();
        mixer
            .apply(ServerEvent::DeviceAdded {
                device: "card0".to_string(),
                label: String::new(),
            })
            .unwrap();

        assert!(old.device().is_none());
        assert!(mixer.device("card0").unwrap().switches().is_empty());
    }

    #[test]
    fn events_for_unknown_targets_fail() {
        let mixer = populated_mixer();

        assert!(matches!(
            mixer.apply(ServerEvent::DeviceRemoved {
                device: "card9".to_string()
            }),
            Err(SwitchError::DeviceNotFound(_))
        ));
        assert!(matches!(
            mixer.apply(ServerEvent::OptionRemoved {
                device: "card0".to_string(),
                switch: "port".to_string(),
                option: "off".to_string(),
            }),
            Err(SwitchError::SwitchNotFound(_))
        ));
        assert!(matches!(
            mixer.apply(ServerEvent::ActiveOptionChanged {
                device: "card0".to_string(),
                role: SwitchRole::Boost,
                option: Some("on".to_string()),
            }),
            Err(SwitchError::SwitchNotFound(_))
        ));
        assert_eq!(mixer.device_count(), 1);
    }

    #[tokio::test]
    async fn event_task_keeps_up_with_discovery_burst() {
        let (connection, _commands) = ChannelConnection::new();
        let mut mixer = Mixer::new(Arc::new(AcceptAll));
        let mut updates = mixer.subscribe_updates();
        mixer.start(connection.subscribe());

        // The task has not run yet, so the whole burst queues up first
        connection.deliver(ServerEvent::DeviceAdded {
            device: "card0".to_string(),
            label: String::new(),
        });
        connection.deliver(ServerEvent::SwitchAdded {
            device: "card0".to_string(),
            switch: "profile".to_string(),
            label: String::new(),
            role: SwitchRole::DeviceProfile,
        });
        for i in 0..300 {
            connection.deliver(ServerEvent::OptionAdded {
                device: "card0".to_string(),
                switch: "profile".to_string(),
                option: format!("profile-{}", i),
                label: String::new(),
                icon: None,
                priority: i,
            });
        }
        connection.deliver(active_changed("profile-150"));

        let wait = async {
            loop {
                if let MixerUpdate::ActiveOptionChanged { .. } = updates.recv().await.unwrap() {
                    break;
                }
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(2), wait)
            .await
            .unwrap();

        let switch = mixer.device("card0").unwrap().switch("profile").unwrap();
        let options = switch.list_options();
        assert_eq!(options.len(), 300);
        assert_eq!(options[0].name(), "profile-299");
        assert_eq!(switch.active_option().unwrap().name(), "profile-150");

        mixer.stop().await;
    }

    #[tokio::test]
    async fn event_task_applies_connection_events() {
        let (connection, _commands) = ChannelConnection::new();
        let connection = Arc::new(connection);
        let mut mixer = Mixer::new(Arc::new(ProfileBackend::new(connection.clone())));
        let mut updates = mixer.subscribe_updates();

        mixer.start(connection.subscribe());
        assert!(mixer.is_running());

        connection
            .handle_message(r#"{"event": "device-added", "device": "card0", "label": "Card"}"#)
            .unwrap();

        let update = tokio::time::timeout(std::time::Duration::from_secs(1), updates.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update, MixerUpdate::DeviceAdded("card0".to_string()));

        mixer.stop().await;
        assert!(!mixer.is_running());
        assert_eq!(mixer.device_count(), 1);
    }
}
