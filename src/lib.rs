//! Backend-agnostic switches for audio mixer devices
//!
//! A switch is a named, ordered set of mutually exclusive options exposed by
//! an audio device, such as the profile selector of a sound card
//! ("analog-stereo", "hdmi-stereo", "off"). This library provides:
//!
//! - The generic switch/option model with deterministic priority ordering
//! - Non-owning switch to device references that degrade when a device is removed
//! - A backend adapter contract for sending activation commands
//! - A mixer that applies server events and reports confirmed changes
//! - An in-process channel connection for driving it all without a server
//!
//! # Quick Start
//!
//! ```no_run
//! use mixer_switch::{ChannelConnection, Mixer, ProfileBackend, ServerEvent, SwitchRole};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (connection, mut commands) = ChannelConnection::new();
//!     let connection = Arc::new(connection);
//!
//!     let mixer = Mixer::new(Arc::new(ProfileBackend::new(connection.clone())));
//!     mixer.apply(ServerEvent::DeviceAdded {
//!         device: "card0".into(),
//!         label: "Built-in Audio".into(),
//!     })?;
//!     mixer.apply(ServerEvent::SwitchAdded {
//!         device: "card0".into(),
//!         switch: "profile".into(),
//!         label: "Profile".into(),
//!         role: SwitchRole::DeviceProfile,
//!     })?;
//!     mixer.apply(ServerEvent::OptionAdded {
//!         device: "card0".into(),
//!         switch: "profile".into(),
//!         option: "off".into(),
//!         label: "Off".into(),
//!         icon: None,
//!         priority: 0,
//!     })?;
//!
//!     let switch = mixer.device("card0").and_then(|d| d.switch("profile")).unwrap();
//!     switch.request_activate_by_name("off")?;
//!
//!     // The server sees the command and answers with an event
//!     if let Some(command) = commands.recv().await {
//!         println!("Server received {:?}", command);
//!     }
//!     mixer.apply(ServerEvent::ActiveOptionChanged {
//!         device: "card0".into(),
//!         role: SwitchRole::DeviceProfile,
//!         option: Some("off".into()),
//!     })?;
//!
//!     assert_eq!(switch.active_option().unwrap().name(), "off");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Option**: immutable choice with a name, label, icon and priority
//! - **Switch**: ordered options, active option and activation requests
//! - **Device**: owns switches, addressed at the server by name
//! - **Registry**: resolves switch to device references, present or absent
//! - **Backend**: adapter turning activation requests into commands
//! - **Connection**: command transport and server event channel
//! - **Mixer**: device provider applying server events

mod backend;
mod config;
mod connection;
mod device;
mod error;
mod mixer;
mod option;
mod protocol;
mod registry;
mod subscription;
mod switch;
mod types;

// Public exports
pub use backend::{ProfileBackend, SwitchBackend};
pub use config::Config;
pub use connection::{ChannelConnection, CommandReceiver, Connection};
pub use device::Device;
pub use error::{Result, SwitchError};
pub use mixer::{Mixer, MixerUpdate};
pub use option::SwitchOption;
pub use protocol::{Command, CommandKind, ServerEvent};
pub use registry::{DeviceHandle, DeviceRegistry};
pub use subscription::EventReceiver;
pub use switch::{Switch, SwitchConfig};
pub use types::{DeviceId, DeviceName, Priority, SwitchRole};
