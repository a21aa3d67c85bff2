use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use modal_db::Store;
use modal_types::events::{PresenceStatus, RoomCommand, RoomEvent};
use modal_types::models::timestamp_now;

use crate::dispatcher::{ConnId, Dispatcher};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Serve one `/ws` client until it closes, errors or stops answering pings.
///
/// `session_user` is the user id from a token checked at upgrade time. Guests
/// may join rooms and relay presence, but only a session's own id is written
/// to the store's online set.
pub async fn handle_connection(
    socket: WebSocket,
    dispatcher: Dispatcher,
    store: Arc<dyn Store>,
    session_user: Option<i64>,
) {
    let (mut sender, mut receiver) = socket.split();
    let (conn_id, mut rx) = dispatcher.register().await;
    info!("{} connected (user {:?})", conn_id, session_user);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward room events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            error!("failed to encode room event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let dispatcher_recv = dispatcher.clone();
    let store_recv = store.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<RoomCommand>(&text) {
                    Ok(cmd) => {
                        handle_command(&dispatcher_recv, &store_recv, conn_id, session_user, cmd)
                            .await
                    }
                    Err(e) => {
                        warn!(
                            "{} bad frame: {} -- raw: {}",
                            conn_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    disconnect(&dispatcher, &store, conn_id).await;
    info!("{} disconnected", conn_id);
}

/// Drop a connection. Users it put online that no other connection still
/// holds are taken out of the store and announced offline.
pub async fn disconnect(dispatcher: &Dispatcher, store: &Arc<dyn Store>, conn_id: ConnId) {
    for user_id in dispatcher.unregister(conn_id).await {
        persist_presence(store, user_id, PresenceStatus::Offline).await;
        dispatcher
            .broadcast_except(
                conn_id,
                RoomEvent::UserStatus {
                    user_id: Value::from(user_id),
                    status: PresenceStatus::Offline,
                    timestamp: timestamp_now(),
                },
            )
            .await;
    }
}

/// Apply one client command. Relays never echo back to the sender.
pub async fn handle_command(
    dispatcher: &Dispatcher,
    store: &Arc<dyn Store>,
    conn_id: ConnId,
    session_user: Option<i64>,
    cmd: RoomCommand,
) {
    match cmd {
        RoomCommand::JoinCalculation { calculation_id } => {
            let room = calculation_id.room();
            info!("{} joined {}", conn_id, room);
            dispatcher.join(conn_id, room).await;
        }

        RoomCommand::LeaveCalculation { calculation_id } => {
            let room = calculation_id.room();
            info!("{} left {}", conn_id, room);
            dispatcher.leave(conn_id, &room).await;
        }

        RoomCommand::ShareCalculation {
            calculation_id,
            calculation,
            user,
        } => {
            let event = RoomEvent::CalculationShared {
                calculation,
                user,
                timestamp: timestamp_now(),
            };
            let n = dispatcher
                .send_to_room_except(&calculation_id.room(), conn_id, event)
                .await;
            debug!("{} shared calculation {} with {} peers", conn_id, calculation_id, n);
        }

        RoomCommand::CalculationUpdate {
            calculation_id,
            calculation,
            user,
        } => {
            let event = RoomEvent::CalculationUpdated {
                calculation,
                user,
                timestamp: timestamp_now(),
            };
            dispatcher
                .send_to_room_except(&calculation_id.room(), conn_id, event)
                .await;
        }

        RoomCommand::CalculationChat {
            calculation_id,
            message,
            user,
        } => {
            let event = RoomEvent::CalculationMessage {
                message,
                user,
                timestamp: timestamp_now(),
            };
            dispatcher
                .send_to_room_except(&calculation_id.room(), conn_id, event)
                .await;
        }

        RoomCommand::UserOnline { user_id } => {
            set_presence(dispatcher, store, conn_id, session_user, user_id, PresenceStatus::Online)
                .await;
        }

        RoomCommand::UserOffline { user_id } => {
            set_presence(dispatcher, store, conn_id, session_user, user_id, PresenceStatus::Offline)
                .await;
        }
    }
}

/// Numeric user id from a frame, which may carry it as a number or a string.
fn numeric_user_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

async fn set_presence(
    dispatcher: &Dispatcher,
    store: &Arc<dyn Store>,
    conn_id: ConnId,
    session_user: Option<i64>,
    user_id: Value,
    status: PresenceStatus,
) {
    match numeric_user_id(&user_id).filter(|id| Some(*id) == session_user) {
        Some(id) => {
            match status {
                PresenceStatus::Online => dispatcher.announce(conn_id, id).await,
                PresenceStatus::Offline => dispatcher.withdraw(conn_id, id).await,
            }
            persist_presence(store, id, status).await;
        }
        None => debug!(
            "{} relayed presence for {} without a matching session; not persisted",
            conn_id, user_id
        ),
    }

    dispatcher
        .broadcast_except(
            conn_id,
            RoomEvent::UserStatus {
                user_id,
                status,
                timestamp: timestamp_now(),
            },
        )
        .await;
}

async fn persist_presence(store: &Arc<dyn Store>, id: i64, status: PresenceStatus) {
    let store = store.clone();
    let result = tokio::task::spawn_blocking(move || match status {
        PresenceStatus::Online => store.add_online_user(id),
        PresenceStatus::Offline => store.remove_online_user(id),
    })
    .await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("failed to record user {} as {:?}: {}", id, status, e),
        Err(e) => error!("spawn_blocking join error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modal_db::JsonStore;
    use modal_types::events::CalculationId;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, Arc<dyn Store>) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("database.json"));
        store.init().unwrap();
        (dir, Arc::new(store))
    }

    fn online(user_id: Value) -> RoomCommand {
        RoomCommand::UserOnline { user_id }
    }

    fn status_of(event: RoomEvent) -> (Value, PresenceStatus) {
        match event {
            RoomEvent::UserStatus {
                user_id, status, ..
            } => (user_id, status),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn share_reaches_room_peers_only() {
        let (_dir, store) = store();
        let dispatcher = Dispatcher::new();
        let (a, mut rx_a) = dispatcher.register().await;
        let (b, mut rx_b) = dispatcher.register().await;

        for conn in [a, b] {
            handle_command(
                &dispatcher,
                &store,
                conn,
                None,
                RoomCommand::JoinCalculation {
                    calculation_id: CalculationId::Number(5),
                },
            )
            .await;
        }

        handle_command(
            &dispatcher,
            &store,
            a,
            None,
            RoomCommand::ShareCalculation {
                calculation_id: CalculationId::Text("5".into()),
                calculation: json!({ "type": "prime", "input": "7" }),
                user: json!({ "name": "ann" }),
            },
        )
        .await;

        match rx_b.try_recv().unwrap() {
            RoomEvent::CalculationShared {
                calculation, user, ..
            } => {
                assert_eq!(calculation["input"], "7");
                assert_eq!(user["name"], "ann");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn own_presence_updates_store_and_peers() {
        let (_dir, store) = store();
        let dispatcher = Dispatcher::new();
        let (a, mut rx_a) = dispatcher.register().await;
        let (_b, mut rx_b) = dispatcher.register().await;

        handle_command(&dispatcher, &store, a, Some(12), online(json!("12"))).await;
        assert_eq!(store.get_online_users().unwrap(), vec![12]);
        assert_eq!(
            status_of(rx_b.try_recv().unwrap()),
            (json!("12"), PresenceStatus::Online)
        );
        assert!(rx_a.try_recv().is_err());

        handle_command(
            &dispatcher,
            &store,
            a,
            Some(12),
            RoomCommand::UserOffline { user_id: json!(12) },
        )
        .await;
        assert!(store.get_online_users().unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_users_presence_is_relayed_not_stored() {
        let (_dir, store) = store();
        let dispatcher = Dispatcher::new();
        let (guest, _rx) = dispatcher.register().await;
        let (signed_in, _rx2) = dispatcher.register().await;
        let (_peer, mut rx_peer) = dispatcher.register().await;

        handle_command(&dispatcher, &store, guest, None, online(json!(40))).await;
        handle_command(&dispatcher, &store, signed_in, Some(3), online(json!(40))).await;

        assert!(store.get_online_users().unwrap().is_empty());
        assert_eq!(
            status_of(rx_peer.try_recv().unwrap()),
            (json!(40), PresenceStatus::Online)
        );
        assert!(rx_peer.try_recv().is_ok());
    }

    #[tokio::test]
    async fn disconnect_takes_announced_users_offline() {
        let (_dir, store) = store();
        let dispatcher = Dispatcher::new();
        let (tab1, _rx1) = dispatcher.register().await;
        let (tab2, _rx2) = dispatcher.register().await;
        let (_peer, mut rx_peer) = dispatcher.register().await;

        handle_command(&dispatcher, &store, tab1, Some(8), online(json!(8))).await;
        handle_command(&dispatcher, &store, tab2, Some(8), online(json!(8))).await;
        while rx_peer.try_recv().is_ok() {}

        // another tab still holds the user
        disconnect(&dispatcher, &store, tab1).await;
        assert_eq!(store.get_online_users().unwrap(), vec![8]);
        assert!(rx_peer.try_recv().is_err());

        disconnect(&dispatcher, &store, tab2).await;
        assert!(store.get_online_users().unwrap().is_empty());
        assert_eq!(
            status_of(rx_peer.try_recv().unwrap()),
            (json!(8), PresenceStatus::Offline)
        );
    }

    #[test]
    fn user_ids_from_frames() {
        assert_eq!(numeric_user_id(&json!(4)), Some(4));
        assert_eq!(numeric_user_id(&json!(" 9 ")), Some(9));
        assert_eq!(numeric_user_id(&json!("guest")), None);
        assert_eq!(numeric_user_id(&json!(null)), None);
    }
}
