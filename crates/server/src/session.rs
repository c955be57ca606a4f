use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use shared::{
    error::ApiError,
    protocol::{ClientFrame, ServerFrame},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chatroom::{Chatroom, Subscription};

/// Per-connection state. Only the joined user name is tracked.
#[derive(Debug, Default)]
struct Connection {
    user: Option<String>,
}

pub(crate) async fn ws_connection(room: Chatroom, socket: WebSocket) {
    let connection_id = Uuid::new_v4();
    let Subscription {
        archive,
        frames,
        presence,
    } = room.subscribe();
    info!(
        %connection_id,
        participants = room.participants(),
        replayed = archive.len(),
        "connected"
    );
    let (mut sender, mut receiver) = socket.split();
    let (replies_tx, mut replies_rx) = mpsc::channel::<ServerFrame>(16);

    let send_task = tokio::spawn(async move {
        for event in archive {
            if send_frame(&mut sender, &ServerFrame::Chat(event)).await.is_err() {
                return;
            }
        }

        let mut frames = BroadcastStream::new(frames);
        loop {
            let frame = tokio::select! {
                Some(frame) = replies_rx.recv() => frame,
                next = frames.next() => match next {
                    Some(Ok(frame)) => frame,
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        warn!(%connection_id, skipped, "connection lagged behind the room");
                        continue;
                    }
                    None => break,
                },
            };
            if send_frame(&mut sender, &frame).await.is_err() {
                break;
            }
        }
    });

    let mut connection = Connection::default();
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match ClientFrame::decode(&text) {
                Ok(frame) => handle_frame(&room, &mut connection, frame, connection_id),
                Err(error) => {
                    warn!(%connection_id, %error, "rejected client frame");
                    let _ = replies_tx
                        .send(ServerFrame::Error(ApiError::from(error)))
                        .await;
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some(user) = connection.user.take() {
        debug!(%connection_id, %user, "leave on disconnect");
        room.leave(&user);
    }
    send_task.abort();
    drop(presence);
    info!(%connection_id, "disconnected");
}

fn handle_frame(room: &Chatroom, connection: &mut Connection, frame: ClientFrame, id: Uuid) {
    match frame {
        ClientFrame::Join(user) => {
            debug!(connection_id = %id, %user, "join");
            room.join(&user);
            connection.user = Some(user);
        }
        ClientFrame::Chat(message) => {
            debug!(
                connection_id = %id,
                user = %message.user,
                timestamp = message.timestamp,
                "message received"
            );
            room.say(message);
        }
        ClientFrame::Typing(user) => room.typing(&user),
        ClientFrame::Leave(user) => match connection.user.take() {
            Some(joined) => {
                debug!(connection_id = %id, user = %joined, "leave");
                room.leave(&joined);
            }
            None => debug!(connection_id = %id, %user, "leave ignored before join"),
        },
    }
}

async fn send_frame<S>(sender: &mut S, frame: &ServerFrame) -> Result<(), ()>
where
    S: futures::Sink<Message> + Unpin,
{
    let Some(text) = encode_frame(frame) else {
        return Ok(());
    };
    sender.send(Message::Text(text)).await.map_err(|_| ())
}

/// Serializes a frame for the wire. A frame that fails to encode is logged and
/// skipped so the connection stays up.
pub(crate) fn encode_frame(frame: &ServerFrame) -> Option<String> {
    match serde_json::to_string(frame) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(%err, event = %frame.name(), "failed to encode server frame");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
