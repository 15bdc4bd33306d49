use std::sync::Arc;

use axum::{
    extract::{Extension, Path, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::IntoResponse,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use crate::dto::event_dto::DraftEvent;
use crate::services::coordinator::SharedCoordinator;

const ROOM_CAPACITY: usize = 64;

/// Fan-out of draft events, one channel per league. Delivery is best effort:
/// slow receivers lose events and are expected to poll the draft status.
#[derive(Clone, Default)]
pub struct DraftBroadcaster {
    rooms: Arc<DashMap<i64, broadcast::Sender<DraftEvent>>>,
}

impl DraftBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, league_id: i64) -> broadcast::Receiver<DraftEvent> {
        self.rooms
            .entry(league_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Number of observers that received the event.
    pub fn publish(&self, league_id: i64, event: DraftEvent) -> usize {
        debug!("League {} -> {}", league_id, event.kind());
        match self.rooms.get(&league_id) {
            Some(tx) => tx.send(event).unwrap_or(0),
            None => 0,
        }
    }

    pub fn observers(&self, league_id: i64) -> usize {
        self.rooms.get(&league_id).map(|tx| tx.receiver_count()).unwrap_or(0)
    }

    /// Drop the league's room if nobody is listening. A later subscribe
    /// opens a fresh one.
    pub fn release(&self, league_id: i64) {
        self.rooms.remove_if(&league_id, |_, tx| tx.receiver_count() == 0);
    }

    pub fn open_rooms(&self) -> usize {
        self.rooms.len()
    }
}

/* Web Socket stuff */
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(league_id): Path<i64>,
    Extension(coordinator): Extension<SharedCoordinator>,
) -> impl IntoResponse {
    let events = coordinator.events().clone();
    let rx = events.subscribe(league_id);
    ws.on_upgrade(move |socket| handle_socket(socket, league_id, events, rx))
}

async fn handle_socket(
    socket: WebSocket,
    league_id: i64,
    events: DraftBroadcaster,
    mut rx: broadcast::Receiver<DraftEvent>,
) {
    info!("Observer joined draft room for league {}", league_id);
    let (mut sender, mut receiver) = socket.split();

    // Task to send messages to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Observer in league {} missed {} events", league_id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize draft event: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Observers are read-only; just wait for the socket to close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    let send_finished = tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            true
        }
        _ = &mut recv_task => false,
    };
    if !send_finished {
        // the receiver lives in the send task; wait for it to drop
        send_task.abort();
        let _ = send_task.await;
    }
    events.release(league_id);

    info!("Observer left draft room for league {}", league_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn events_stay_inside_their_league() {
        let hub = DraftBroadcaster::new();
        let mut one = hub.subscribe(1);
        let mut two = hub.subscribe(2);

        let event = DraftEvent::DraftCompleted { league_id: 1, timestamp: Utc::now() };
        assert_eq!(hub.publish(1, event.clone()), 1);

        assert_eq!(one.recv().await.unwrap(), event);
        assert!(matches!(two.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
    }

    #[test]
    fn idle_rooms_are_released() {
        let hub = DraftBroadcaster::new();
        let rx = hub.subscribe(3);
        hub.release(3);
        assert_eq!(hub.open_rooms(), 1);
        assert_eq!(hub.observers(3), 1);

        drop(rx);
        hub.release(3);
        assert_eq!(hub.open_rooms(), 0);
        hub.release(3);
    }

    #[test]
    fn publishing_without_observers_is_fine() {
        let hub = DraftBroadcaster::new();
        let event = DraftEvent::DraftCompleted { league_id: 9, timestamp: Utc::now() };
        assert_eq!(hub.publish(9, event), 0);
        assert_eq!(hub.observers(9), 0);
    }
}
