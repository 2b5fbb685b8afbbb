use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::state::AppState;

/// Connection-time parameters. The user id is supplied as a query parameter;
/// connections without one still receive broadcasts but hold no presence.
#[derive(Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
}

/// Upgrades `GET /ws` into the real-time fan-out channel.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.user_id))
}

/// Drives one connection: register, pump outbound frames, unregister.
///
/// Inbound frames are drained and ignored; the channel is push-only from the
/// server's point of view. Registration and removal each trigger an
/// online-user broadcast, strictly ordered within this connection's lifetime.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: Option<Uuid>) {
    let conn_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    tracing::debug!(%conn_id, user_id = ?user_id, "Socket established");
    state.presence.connect(conn_id, user_id, tx).await;

    let mut writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = &mut writer => break,
        }
    }

    state.presence.disconnect(conn_id, user_id).await;
    writer.abort();
    tracing::debug!(%conn_id, "Socket closed");
}
