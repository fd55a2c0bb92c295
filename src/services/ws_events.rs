//! Outbound event delivery to connected WebSocket clients.

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{dto::ws::ServerMessage, state::SharedState};

/// Send an event to a single connection. A missing or closed connection is
/// not an error: the socket task cleans itself up on its own.
pub fn send_to_connection(state: &SharedState, conn: Uuid, message: &ServerMessage) {
    let Some(connection) = state.connections().get(&conn) else {
        debug!(%conn, "skipping send: connection gone");
        return;
    };

    let tx = connection.tx.clone();
    drop(connection);

    send_message_to_websocket(&tx, message);
}

/// Send an event to every listed session member.
pub fn send_to_members(state: &SharedState, members: &[Uuid], message: &ServerMessage) {
    for conn in members {
        send_to_connection(state, *conn, message);
    }
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are permanent (a bug in the payload type) and are
/// only logged; a closed writer channel means the client is going away.
pub fn send_message_to_websocket(tx: &mpsc::UnboundedSender<Message>, message: &ServerMessage) {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound event `{message:?}`");
            return;
        }
    };

    if tx.send(Message::Text(payload.into())).is_err() {
        debug!("writer channel closed; dropping outbound event");
    }
}
