use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use indexer_notifier::{Frame, Inbound, Notifier, Outbound, Subscription};
use tracing::{debug, info};

use super::ApiContext;

/// Upgrade to the push channel
pub async fn ws_handler(ws: WebSocketUpgrade, State(ctx): State<ApiContext>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx.notifier))
}

/// Pump queued frames out and answer pings until either side goes away.
/// The registry closes the queue when it drops a subscriber, which ends
/// the loop here.
async fn handle_socket(socket: WebSocket, notifier: Notifier) {
    let Subscription { id, mut receiver } = notifier.subscribe().await;
    let (mut sender, mut inbound) = socket.split();

    info!(client = %id, subscribers = notifier.subscriber_count(), "Subscriber connected");

    loop {
        tokio::select! {
            frame = receiver.recv() => {
                let message = match frame {
                    Some(Frame::Text(text)) => Message::Text(text.as_ref().into()),
                    Some(Frame::Probe) => Message::Ping(Bytes::new()),
                    None => {
                        debug!(client = %id, "Subscriber dropped by registry");
                        break;
                    }
                };
                if sender.send(message).await.is_err() {
                    break;
                }
            }
            msg = inbound.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        notifier.mark_alive(&id);
                        if let Some(Inbound::Ping) = Inbound::parse(text.as_str()) {
                            notifier.reply(&id, &Outbound::Pong);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => notifier.mark_alive(&id),
                    Some(Err(e)) => {
                        debug!(client = %id, error = %e, "Websocket error");
                        break;
                    }
                }
            }
        }
    }

    notifier.unsubscribe(&id);
    info!(client = %id, subscribers = notifier.subscriber_count(), "Subscriber disconnected");
}
