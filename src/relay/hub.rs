use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::conn::{ConnId, Connection};
use super::event::{is_broadcast, Message, Outbound, PresenceStatus};

struct Binding {
    conn: Connection,
    name: Option<String>,
}

#[derive(Default)]
struct Inner {
    // a user is in here iff its connection is online
    online: BTreeMap<String, Binding>,
    history: Vec<Message>,
}

/// What `register` did, for the transport's logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub roster: Vec<String>,
    /// The connection this registration displaced, if the user was already online.
    /// That connection is not told about it.
    pub superseded: Option<ConnId>,
}

/// Presence registry, message history and routing.
///
/// Every operation takes the one lock, works out who should receive what,
/// releases the lock and only then pushes onto the per-connection queues.
#[derive(Default)]
pub struct Relay {
    inner: Mutex<Inner>,
    next_conn: AtomicU64,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_conn_id(&self) -> ConnId {
        ConnId(self.next_conn.fetch_add(1, Ordering::Relaxed))
    }

    /// Binds `user_id` to `conn`, overwriting any earlier binding. The new
    /// connection gets the full roster; everybody else gets an online presence.
    pub fn register(&self, user_id: &str, name: Option<String>, conn: Connection) -> Registration {
        let (registration, others) = {
            let mut inner = self.inner.lock();
            let superseded = inner
                .online
                .insert(user_id.to_owned(), Binding { conn: conn.clone(), name: name.clone() })
                .map(|old| old.conn.id())
                .filter(|old| *old != conn.id());
            let roster: Vec<String> = inner.online.keys().cloned().collect();
            let others = distinct(
                inner.online.values().filter(|binding| binding.conn.id() != conn.id()),
            );
            (Registration { roster, superseded }, others)
        };

        tracing::info!(
            user_id,
            conn = %conn.id(),
            online = registration.roster.len(),
            superseded = ?registration.superseded,
            "registered"
        );

        conn.send(Outbound::Roster { user_ids: registration.roster.clone() });
        emit(
            &others,
            Outbound::Presence {
                user_id: user_id.to_owned(),
                name,
                status: PresenceStatus::Online,
            },
        );

        registration
    }

    /// Appends to history, then delivers to whoever is online and addressed.
    /// Returns how many connections the message was handed to.
    pub fn route(&self, message: Message) -> usize {
        let recipients = {
            let mut inner = self.inner.lock();
            inner.history.push(message.clone());

            if message.is_broadcast() {
                distinct(inner.online.values())
            } else {
                let to = message.to.as_deref().and_then(|to| inner.online.get(to));
                let from = inner.online.get(&message.from);
                distinct(to.into_iter().chain(from))
            }
        };

        tracing::debug!(
            id = %message.id,
            from = %message.from,
            to = ?message.to,
            recipients = recipients.len(),
            "routed message"
        );

        let delivered = recipients.len();
        emit(&recipients, Outbound::Message(message));
        delivered
    }

    /// Forwards a typing signal. Nothing is stored; an offline target is a no-op.
    pub fn relay_typing(&self, from: &str, to: Option<&str>) -> usize {
        let recipients: Vec<Connection> = {
            let inner = self.inner.lock();
            if is_broadcast(to) {
                let sender = inner.online.get(from).map(|binding| binding.conn.id());
                distinct(
                    inner.online.values().filter(|binding| Some(binding.conn.id()) != sender),
                )
            } else {
                to.and_then(|to| inner.online.get(to))
                    .map(|binding| binding.conn.clone())
                    .into_iter()
                    .collect()
            }
        };

        let delivered = recipients.len();
        emit(&recipients, Outbound::Typing { from: from.to_owned() });
        delivered
    }

    /// Called when the transport loses `conn`. Removes every user bound to
    /// exactly this connection and tells everyone left, once per user. A
    /// connection that was already superseded matches nobody.
    pub fn unregister(&self, conn: ConnId) -> Vec<String> {
        let (removed, remaining) = {
            let mut inner = self.inner.lock();
            let mut removed: Vec<(String, Option<String>)> = Vec::new();
            inner.online.retain(|user_id, binding| {
                if binding.conn.id() != conn {
                    return true;
                }
                removed.push((user_id.clone(), binding.name.take()));
                false
            });
            (removed, distinct(inner.online.values()))
        };

        for (user_id, name) in &removed {
            tracing::info!(user_id = %user_id, %conn, online = remaining.len(), "unregistered");
            emit(
                &remaining,
                Outbound::Presence {
                    user_id: user_id.clone(),
                    name: name.clone(),
                    status: PresenceStatus::Offline,
                },
            );
        }

        removed.into_iter().map(|(user_id, _)| user_id).collect()
    }

    pub fn history(&self) -> Vec<Message> {
        self.inner.lock().history.clone()
    }

    pub fn roster(&self) -> Vec<String> {
        self.inner.lock().online.keys().cloned().collect()
    }
}

/// One handle per connection, however many user ids it is registered under.
fn distinct<'a>(bindings: impl IntoIterator<Item = &'a Binding>) -> Vec<Connection> {
    let mut conns: Vec<Connection> = Vec::new();
    for binding in bindings {
        if conns.iter().all(|conn| conn.id() != binding.conn.id()) {
            conns.push(binding.conn.clone());
        }
    }
    conns
}

fn emit(conns: &[Connection], event: Outbound) {
    for conn in conns {
        conn.send(event.clone());
    }
}
