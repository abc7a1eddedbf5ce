use crate::error::{Result, SwitchError};
use crate::protocol::ServerEvent;
use tokio::sync::mpsc;

/// Queue of server events for one subscriber
///
/// Every subscriber gets its own unbounded queue, so a slow reader never
/// loses events; they wait until it catches up.
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl EventReceiver {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ServerEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next server event
    ///
    /// Queued events are still handed out after the connection is dropped;
    /// `ConnectionClosed` comes once the queue is drained.
    pub async fn recv(&mut self) -> Result<ServerEvent> {
        self.rx.recv().await.ok_or(SwitchError::ConnectionClosed)
    }

    /// Take the next queued event, `None` if the queue is empty
    pub fn try_recv(&mut self) -> Result<Option<ServerEvent>> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SwitchError::ConnectionClosed),
        }
    }

    /// Number of events waiting in the queue
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
