use crate::connection::Connection;
use std::sync::Arc;

/// Backend adapter turning activation requests into server commands
///
/// `activate` returns `true` when the command was accepted for transmission.
/// It says nothing about whether the hardware actually switched: the server
/// confirms that later with a separate event. Implementations must not block
/// waiting for that confirmation.
pub trait SwitchBackend: Send + Sync {
    fn activate(&self, device_name: &str, option_name: &str) -> bool;
}

/// Adapter for device profile switches
///
/// Forwards activation requests to the connection as card profile changes.
pub struct ProfileBackend {
    connection: Arc<dyn Connection>,
}

impl ProfileBackend {
    /// Create an adapter sending commands over the given connection
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }

    /// Get the underlying connection
    pub fn connection(&self) -> Arc<dyn Connection> {
        self.connection.clone()
    }
}

impl SwitchBackend for ProfileBackend {
    fn activate(&self, device_name: &str, option_name: &str) -> bool {
        tracing::debug!("Setting profile {} on device {}", option_name, device_name);

        let sent = self.connection.set_option(device_name, option_name);
        if !sent {
            tracing::warn!(
                "Failed to send profile {} for device {}",
                option_name,
                device_name
            );
        }
        sent
    }
}
