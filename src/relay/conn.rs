use std::fmt;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::event::Outbound;

/// Process-unique id of one transport connection. Two registrations of the
/// same user from different sockets get different ids, which is how a
/// superseded socket is told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Non-owning handle to a live connection: the transport keeps the socket,
/// the relay only keeps the sending half of its bounded outbound queue.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnId,
    tx: mpsc::Sender<Outbound>,
}

impl Connection {
    pub fn new(id: ConnId, tx: mpsc::Sender<Outbound>) -> Self {
        Self { id, tx }
    }

    /// Creates a handle together with the receiving end the transport drains.
    pub fn channel(id: ConnId, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(id, tx), rx)
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Never blocks. A full or closed queue loses this event for this peer only.
    pub fn send(&self, event: Outbound) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(conn = %self.id, "send queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(conn = %self.id, "connection gone, dropping event");
                false
            }
        }
    }
}
