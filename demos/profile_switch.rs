//! Drives a mixer against a simulated audio server.
//!
//! The "server" task answers every profile command with a confirmation event,
//! so the switch's active option follows each request.
//!
//! Run with `cargo run --example profile_switch`

use mixer_switch::{
    ChannelConnection, CommandKind, Mixer, MixerUpdate, ProfileBackend, ServerEvent, SwitchRole,
};
use std::sync::Arc;
use std::time::Duration;

const CARD: &str = "alsa_card.pci-0000_00_1f.3";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let (connection, mut commands) = ChannelConnection::new();
    let connection = Arc::new(connection);

    let mut mixer = Mixer::new(Arc::new(ProfileBackend::new(connection.clone())));
    let mut updates = mixer.subscribe_updates();
    mixer.start(connection.subscribe());

    // Simulated server: confirm every profile change
    let server = connection.clone();
    tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            match command.kind {
                CommandKind::SetCardProfile { device, option } => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    server.deliver(ServerEvent::ActiveOptionChanged {
                        device,
                        role: SwitchRole::DeviceProfile,
                        option: Some(option),
                    });
                }
            }
        }
    });

    connection.deliver(ServerEvent::DeviceAdded {
        device: CARD.to_string(),
        label: "Built-in Audio".to_string(),
    });
    connection.deliver(ServerEvent::SwitchAdded {
        device: CARD.to_string(),
        switch: "profile".to_string(),
        label: "Profile".to_string(),
        role: SwitchRole::DeviceProfile,
    });
    for (name, label, priority) in [
        ("output:analog-stereo", "Analog Stereo Output", 6500),
        ("output:hdmi-stereo", "Digital Stereo (HDMI) Output", 5900),
        ("off", "Off", 0),
    ] {
        connection.deliver(ServerEvent::OptionAdded {
            device: CARD.to_string(),
            switch: "profile".to_string(),
            option: name.to_string(),
            label: label.to_string(),
            icon: None,
            priority,
        });
    }

    // Wait for the device to show up
    while let Ok(update) = updates.recv().await {
        if update == MixerUpdate::DeviceAdded(CARD.to_string()) {
            break;
        }
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let Some(switch) = mixer.device(CARD).and_then(|d| d.switch("profile")) else {
        return Err("profile switch was not discovered".into());
    };

    println!("Options of {}:", switch.label());
    for option in switch.list_options() {
        println!("  {:<24} {:<32} priority {}", option.name(), option.label(), option.priority());
    }

    for name in ["output:hdmi-stereo", "surround-71", "off"] {
        match switch.request_activate_by_name(name) {
            Ok(()) => {
                if let Ok(Ok(update)) =
                    tokio::time::timeout(Duration::from_secs(1), updates.recv()).await
                {
                    println!("Confirmed: {:?}", update);
                }
            }
            Err(e) => println!("Request for {} failed: {}", name, e),
        }
        println!(
            "Active option: {}",
            switch.active_option().map(|o| o.name().to_string()).unwrap_or_default()
        );
    }

    mixer.stop().await;
    Ok(())
}
