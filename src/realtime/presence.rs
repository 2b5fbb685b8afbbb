use axum::extract::ws::Message as WsMessage;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Event name for the online-user-set broadcast.
pub const ONLINE_USERS_EVENT: &str = "getOnlineUsers";
/// Event name for direct delivery of a newly created message.
pub const NEW_MESSAGE_EVENT: &str = "newMessage";

/// The outbound half of one established connection. Cloneable so the
/// message-send path can push without touching the socket task.
pub type ConnectionSender = mpsc::UnboundedSender<WsMessage>;

#[derive(Serialize)]
struct SocketEvent<'a, T: Serialize> {
    event: &'a str,
    data: T,
}

/// Serializes an event and pushes it to one connection, fire-and-forget.
/// A closed channel means the connection is already going away.
pub fn push_event<T: Serialize>(sender: &ConnectionSender, event: &str, data: &T) {
    let payload = SocketEvent { event, data };
    match sonic_rs::to_string(&payload) {
        Ok(json) => {
            let _ = sender.send(WsMessage::Text(json.into()));
        }
        Err(e) => tracing::error!("Failed to serialize {} event: {}", event, e),
    }
}

#[derive(Default)]
struct Inner {
    /// Every established connection, keyed by connection id.
    connections: HashMap<Uuid, ConnectionSender>,
    /// At most one connection id per user; a later connection overwrites.
    online: HashMap<Uuid, Uuid>,
}

/// Process-wide registry of established real-time connections and the
/// user -> connection presence mapping.
///
/// Owned by `AppState`; its lifetime is the server process. Multi-instance
/// deployments would need an external shared registry instead.
#[derive(Default)]
pub struct PresenceRegistry {
    inner: RwLock<Inner>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an established connection and, when a user id was supplied,
    /// records it as that user's active connection. Broadcasts the updated
    /// online-user set to every connection.
    pub async fn connect(&self, conn_id: Uuid, user_id: Option<Uuid>, sender: ConnectionSender) {
        {
            let mut inner = self.inner.write().await;
            inner.connections.insert(conn_id, sender);
            if let Some(user_id) = user_id {
                if let Some(old) = inner.online.insert(user_id, conn_id) {
                    tracing::debug!(%user_id, old_conn = %old, "Presence superseded by a newer connection");
                }
            }
        }
        self.broadcast_online_users().await;
    }

    /// Removes a closed connection and, if it is still the user's active
    /// connection, their presence entry. A stale disconnect racing a newer
    /// connection for the same user is a no-op on the presence map.
    pub async fn disconnect(&self, conn_id: Uuid, user_id: Option<Uuid>) {
        {
            let mut inner = self.inner.write().await;
            inner.connections.remove(&conn_id);
            if let Some(user_id) = user_id {
                if inner.online.get(&user_id) == Some(&conn_id) {
                    inner.online.remove(&user_id);
                }
            }
        }
        self.broadcast_online_users().await;
    }

    /// Returns the sender for a user's active connection, if any.
    pub async fn lookup(&self, user_id: &Uuid) -> Option<ConnectionSender> {
        let inner = self.inner.read().await;
        let conn_id = inner.online.get(user_id)?;
        inner.connections.get(conn_id).cloned()
    }

    /// The current set of online user ids.
    pub async fn online_users(&self) -> Vec<Uuid> {
        self.inner.read().await.online.keys().copied().collect()
    }

    /// Emits the current online-user set to every established connection.
    /// Delivery is best-effort; failed sends are ignored.
    pub async fn broadcast_online_users(&self) {
        let (users, senders): (Vec<Uuid>, Vec<ConnectionSender>) = {
            let inner = self.inner.read().await;
            (
                inner.online.keys().copied().collect(),
                inner.connections.values().cloned().collect(),
            )
        };

        for sender in &senders {
            push_event(sender, ONLINE_USERS_EVENT, &users);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tokio::sync::mpsc::UnboundedReceiver;

    #[derive(Deserialize)]
    struct OnlineUsersEvent {
        event: String,
        data: Vec<Uuid>,
    }

    fn channel() -> (ConnectionSender, UnboundedReceiver<WsMessage>) {
        mpsc::unbounded_channel()
    }

    fn next_online_event(rx: &mut UnboundedReceiver<WsMessage>) -> OnlineUsersEvent {
        match rx.try_recv().expect("expected a broadcast frame") {
            WsMessage::Text(text) => sonic_rs::from_str(text.as_str()).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_then_disconnect_updates_the_broadcast_set() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();
        let (tx, mut rx) = channel();

        registry.connect(conn, Some(user), tx).await;
        let event = next_online_event(&mut rx);
        assert_eq!(event.event, ONLINE_USERS_EVENT);
        assert_eq!(event.data, vec![user]);

        registry.disconnect(conn, Some(user)).await;
        assert!(registry.online_users().await.is_empty());
        assert!(registry.lookup(&user).await.is_none());
    }

    #[tokio::test]
    async fn two_users_both_appear_in_the_broadcast() {
        let registry = PresenceRegistry::new();
        let (user_a, user_b) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_a, mut rx_a) = channel();
        let (tx_b, _rx_b) = channel();

        registry.connect(Uuid::new_v4(), Some(user_a), tx_a).await;
        let _ = next_online_event(&mut rx_a);

        registry.connect(Uuid::new_v4(), Some(user_b), tx_b).await;
        let event = next_online_event(&mut rx_a);
        assert_eq!(event.data.len(), 2);
        assert!(event.data.contains(&user_a));
        assert!(event.data.contains(&user_b));
    }

    #[tokio::test]
    async fn anonymous_connections_receive_broadcasts_without_presence() {
        let registry = PresenceRegistry::new();
        let (tx, mut rx) = channel();

        registry.connect(Uuid::new_v4(), None, tx).await;
        let event = next_online_event(&mut rx);
        assert!(event.data.is_empty());
        assert!(registry.online_users().await.is_empty());
    }

    #[tokio::test]
    async fn a_later_connection_overwrites_presence_for_the_same_user() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let (conn_1, conn_2) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_1, _rx_1) = channel();
        let (tx_2, mut rx_2) = channel();

        registry.connect(conn_1, Some(user), tx_1).await;
        registry.connect(conn_2, Some(user), tx_2.clone()).await;

        // The registry must route to the newer connection now.
        let sender = registry.lookup(&user).await.unwrap();
        push_event(&sender, "probe", &"ping");
        let _ = next_online_event(&mut rx_2); // connect broadcast
        assert!(rx_2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn stale_disconnect_does_not_erase_a_newer_connection() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let (conn_1, conn_2) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_1, _rx_1) = channel();
        let (tx_2, _rx_2) = channel();

        registry.connect(conn_1, Some(user), tx_1).await;
        registry.connect(conn_2, Some(user), tx_2).await;

        // The first connection's late close must not clobber the second's
        // presence entry.
        registry.disconnect(conn_1, Some(user)).await;
        assert_eq!(registry.online_users().await, vec![user]);
        assert!(registry.lookup(&user).await.is_some());
    }

    #[tokio::test]
    async fn push_to_a_dropped_connection_is_a_silent_no_op() {
        let (tx, rx) = channel();
        drop(rx);
        push_event(&tx, NEW_MESSAGE_EVENT, &"payload");
    }
}
