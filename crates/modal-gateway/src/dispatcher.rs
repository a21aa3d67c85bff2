use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use modal_types::events::RoomEvent;

/// Identifies one WebSocket connection for its lifetime.
pub type ConnId = Uuid;

/// Tracks live connections and the calculation rooms they joined.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// Per-connection send channels: conn_id -> sender
    connections: RwLock<HashMap<ConnId, mpsc::UnboundedSender<RoomEvent>>>,

    /// Room membership: room name -> conn_ids
    rooms: RwLock<HashMap<String, HashSet<ConnId>>>,

    /// Persisted presence per connection: conn_id -> user ids it put online
    announced: RwLock<HashMap<ConnId, HashSet<i64>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection. Returns its id and the receiver its
    /// writer task drains.
    pub async fn register(&self) -> (ConnId, mpsc::UnboundedReceiver<RoomEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.connections.write().await.insert(conn_id, tx);
        (conn_id, rx)
    }

    /// Forget a connection and take it out of every room. Returns the user
    /// ids it announced that no other live connection still announces.
    pub async fn unregister(&self, conn_id: ConnId) -> Vec<i64> {
        self.inner.connections.write().await.remove(&conn_id);

        {
            let mut rooms = self.inner.rooms.write().await;
            for members in rooms.values_mut() {
                members.remove(&conn_id);
            }
            rooms.retain(|_, members| !members.is_empty());
        }

        let mut announced = self.inner.announced.write().await;
        let Some(mine) = announced.remove(&conn_id) else {
            return Vec::new();
        };
        let mut stale: Vec<i64> = mine
            .into_iter()
            .filter(|id| !announced.values().any(|ids| ids.contains(id)))
            .collect();
        stale.sort_unstable();
        stale
    }

    pub async fn announce(&self, conn_id: ConnId, user_id: i64) {
        self.inner
            .announced
            .write()
            .await
            .entry(conn_id)
            .or_default()
            .insert(user_id);
    }

    pub async fn withdraw(&self, conn_id: ConnId, user_id: i64) {
        let mut announced = self.inner.announced.write().await;
        if let Some(ids) = announced.get_mut(&conn_id) {
            ids.remove(&user_id);
            if ids.is_empty() {
                announced.remove(&conn_id);
            }
        }
    }

    pub async fn join(&self, conn_id: ConnId, room: String) {
        self.inner
            .rooms
            .write()
            .await
            .entry(room)
            .or_default()
            .insert(conn_id);
    }

    pub async fn leave(&self, conn_id: ConnId, room: &str) {
        let mut rooms = self.inner.rooms.write().await;
        if let Some(members) = rooms.get_mut(room) {
            members.remove(&conn_id);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    pub async fn room_size(&self, room: &str) -> usize {
        self.inner
            .rooms
            .read()
            .await
            .get(room)
            .map_or(0, HashSet::len)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.connections.read().await.len()
    }

    /// Send to every member of `room` except `sender`, who need not be a
    /// member. Returns how many connections were handed the event.
    pub async fn send_to_room_except(&self, room: &str, sender: ConnId, event: RoomEvent) -> usize {
        let targets: Vec<ConnId> = match self.inner.rooms.read().await.get(room) {
            Some(members) => members.iter().copied().filter(|id| *id != sender).collect(),
            None => return 0,
        };

        let connections = self.inner.connections.read().await;
        targets
            .iter()
            .filter_map(|id| connections.get(id))
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    /// Send to every connection except `sender`.
    pub async fn broadcast_except(&self, sender: ConnId, event: RoomEvent) -> usize {
        self.inner
            .connections
            .read()
            .await
            .iter()
            .filter(|(id, _)| **id != sender)
            .filter(|(_, tx)| tx.send(event.clone()).is_ok())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chat(text: &str) -> RoomEvent {
        RoomEvent::CalculationMessage {
            message: json!(text),
            user: json!({ "name": "ann" }),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn room_relay_skips_sender_and_outsiders() {
        let dispatcher = Dispatcher::new();
        let (a, mut rx_a) = dispatcher.register().await;
        let (b, mut rx_b) = dispatcher.register().await;
        let (_c, mut rx_c) = dispatcher.register().await;

        dispatcher.join(a, "calculation-1".into()).await;
        dispatcher.join(b, "calculation-1".into()).await;

        let delivered = dispatcher
            .send_to_room_except("calculation-1", a, chat("hi"))
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(rx_b.try_recv().unwrap(), chat("hi"));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_member_can_send_into_room() {
        let dispatcher = Dispatcher::new();
        let (outsider, _rx) = dispatcher.register().await;
        let (member, mut rx_member) = dispatcher.register().await;
        dispatcher.join(member, "calculation-x".into()).await;

        let delivered = dispatcher
            .send_to_room_except("calculation-x", outsider, chat("knock"))
            .await;
        assert_eq!(delivered, 1);
        assert!(rx_member.try_recv().is_ok());

        assert_eq!(
            dispatcher
                .send_to_room_except("calculation-empty", outsider, chat("void"))
                .await,
            0
        );
    }

    #[tokio::test]
    async fn leave_and_unregister_clean_up_rooms() {
        let dispatcher = Dispatcher::new();
        let (a, _rx_a) = dispatcher.register().await;
        let (b, _rx_b) = dispatcher.register().await;
        dispatcher.join(a, "calculation-1".into()).await;
        dispatcher.join(a, "calculation-2".into()).await;
        dispatcher.join(b, "calculation-2".into()).await;

        dispatcher.leave(a, "calculation-1").await;
        assert_eq!(dispatcher.room_size("calculation-1").await, 0);

        dispatcher.unregister(a).await;
        assert_eq!(dispatcher.room_size("calculation-2").await, 1);
        assert_eq!(dispatcher.connection_count().await, 1);
    }

    #[tokio::test]
    async fn unregister_reports_presence_nobody_else_holds() {
        let dispatcher = Dispatcher::new();
        let (a, _rx_a) = dispatcher.register().await;
        let (b, _rx_b) = dispatcher.register().await;
        dispatcher.announce(a, 1).await;
        dispatcher.announce(a, 2).await;
        dispatcher.announce(b, 2).await;
        dispatcher.announce(a, 3).await;
        dispatcher.withdraw(a, 3).await;

        assert_eq!(dispatcher.unregister(a).await, vec![1]);
        assert_eq!(dispatcher.unregister(b).await, vec![2]);
    }

    #[tokio::test]
    async fn broadcast_reaches_everyone_else() {
        let dispatcher = Dispatcher::new();
        let (a, mut rx_a) = dispatcher.register().await;
        let (_b, mut rx_b) = dispatcher.register().await;
        let (_c, mut rx_c) = dispatcher.register().await;

        assert_eq!(dispatcher.broadcast_except(a, chat("all")).await, 2);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_ok());
    }
}
