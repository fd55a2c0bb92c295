use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::ClientMessage,
    services::room_service::{self, SessionBinding, SessionRole},
    state::{ClientConnection, SharedState},
};

/// Handle the full lifecycle of one client WebSocket connection.
///
/// The connection gets a fresh identity at upgrade time; its role in a
/// session is whatever the last successful `create-session`/`attach`/`join`
/// established. Closing the socket fires exactly one disconnect action.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let conn_id = Uuid::new_v4();
    state.connections().insert(
        conn_id,
        ClientConnection {
            id: conn_id,
            tx: outbound_tx.clone(),
        },
    );
    info!(%conn_id, "client connected");

    let mut binding: Option<SessionBinding> = None;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match ClientMessage::from_json_str(&text) {
                Ok(inbound) => {
                    if let Some(bound) = dispatch(&state, conn_id, inbound).await {
                        binding = Some(bound);
                    }
                }
                Err(err) => {
                    warn!(%conn_id, error = %err, "failed to parse client message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(%conn_id, "client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%conn_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.connections().remove(&conn_id);
    room_service::disconnect(&state, conn_id, binding).await;
    info!(%conn_id, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Route one inbound event to its handler. Returns the new session binding
/// when the event successfully bound the connection to a session.
async fn dispatch(
    state: &SharedState,
    conn_id: Uuid,
    inbound: ClientMessage,
) -> Option<SessionBinding> {
    match inbound {
        ClientMessage::CreateSession => {
            let pin = room_service::create_session(state, conn_id);
            Some(SessionBinding {
                pin,
                role: SessionRole::Host,
            })
        }
        ClientMessage::Attach { pin } => room_service::attach(state, conn_id, &pin)
            .await
            .then_some(SessionBinding {
                pin,
                role: SessionRole::Host,
            }),
        ClientMessage::Join { pin, name } => room_service::join(state, conn_id, &pin, &name)
            .await
            .then_some(SessionBinding {
                pin,
                role: SessionRole::Participant,
            }),
        ClientMessage::LoadQuiz { pin, questions } => {
            room_service::load_quiz(state, conn_id, &pin, questions).await;
            None
        }
        ClientMessage::NextQuestion { pin } => {
            room_service::next_question(state, conn_id, &pin).await;
            None
        }
        ClientMessage::Reveal { pin } => {
            room_service::reveal(state, conn_id, &pin).await;
            None
        }
        ClientMessage::Answer { pin, option_index } => {
            room_service::submit_answer(state, conn_id, &pin, option_index).await;
            None
        }
        ClientMessage::Unknown => {
            warn!(%conn_id, "ignoring unrecognized client message");
            None
        }
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
