use crate::error::Result;
use crate::protocol::{Command, ServerEvent};
use crate::subscription::EventReceiver;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Transport to the audio server
///
/// `set_option` queues a command and returns immediately. The outcome of the
/// command arrives later as a [`ServerEvent`].
pub trait Connection: Send + Sync {
    fn set_option(&self, device_name: &str, option_name: &str) -> bool;
}

/// In-process connection backed by tokio channels
///
/// Commands go out on an unbounded queue read through a [`CommandReceiver`].
/// Server events are fed in with [`deliver`](Self::deliver) or
/// [`handle_message`](Self::handle_message) and copied into the queue of
/// every [`EventReceiver`]. Event queues are unbounded: a mixer that falls
/// behind during a discovery burst still sees every event, in order.
pub struct ChannelConnection {
    command_tx: mpsc::UnboundedSender<Command>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ServerEvent>>>,
}

/// Server side of a [`ChannelConnection`]'s command queue
pub struct CommandReceiver {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl ChannelConnection {
    /// Create a connection and the receiving end of its command queue
    pub fn new() -> (Self, CommandReceiver) {
        let (command_tx, rx) = mpsc::unbounded_channel();

        (
            Self {
                command_tx,
                subscribers: Mutex::new(Vec::new()),
            },
            CommandReceiver { rx },
        )
    }

    /// Subscribe to server events delivered from now on
    pub fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        EventReceiver::new(rx)
    }

    /// Queue a server event for all subscribers
    ///
    /// Returns the number of subscribers that received it. Dropped receivers
    /// are forgotten.
    pub fn deliver(&self, event: ServerEvent) -> usize {
        tracing::debug!("Received event: {:?}", event);

        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Parse a JSON server message and deliver it
    pub fn handle_message(&self, text: &str) -> Result<()> {
        tracing::debug!("Received: {}", text);

        let event: ServerEvent = serde_json::from_str(text)?;
        self.deliver(event);
        Ok(())
    }

    /// Check whether the command receiver is still alive
    pub fn is_connected(&self) -> bool {
        !self.command_tx.is_closed()
    }

    fn send(&self, command: Command) -> bool {
        match serde_json::to_string(&command) {
            Ok(json) => tracing::debug!("Sending: {}", json),
            Err(e) => tracing::debug!("Sending unserializable command {:?}: {}", command, e),
        }

        self.command_tx.send(command).is_ok()
    }
}

impl Connection for ChannelConnection {
    fn set_option(&self, device_name: &str, option_name: &str) -> bool {
        if !is_valid_name(device_name) || !is_valid_name(option_name) {
            tracing::warn!(
                "Refusing malformed names: device {:?}, option {:?}",
                device_name,
                option_name
            );
            return false;
        }

        let sent = self.send(Command::set_card_profile(device_name, option_name));
        if !sent {
            tracing::error!("Connection closed, dropped command for {}", device_name);
        }
        sent
    }
}

impl CommandReceiver {
    /// Receive the next command, or `None` once the connection is dropped
    pub async fn recv(&mut self) -> Option<Command> {
        self.rx.recv().await
    }

    /// Try to receive a command without blocking
    pub fn try_recv(&mut self) -> Option<Command> {
        self.rx.try_recv().ok()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_control)
}
