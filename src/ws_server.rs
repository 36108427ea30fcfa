// WebSocket hub connecting the operator surface and overlay viewers.
//
// Every connected client may send control messages (forwarded to the app
// loop as [`WsEvent::Message`]) and receives every outbound frame fanned
// out from the broadcast channel.

use futures_util::stream::Stream;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{info, warn};

/// Events emitted by the hub to the application layer.
#[derive(Debug, PartialEq)]
pub enum WsEvent {
    /// A client has connected.
    Connected { addr: String },
    /// A client has disconnected.
    Disconnected { addr: String },
    /// A text message was received from a client (raw JSON string).
    Message(String),
}

/// Run the hub on the given port.
///
/// Binds `127.0.0.1:{port}` and accepts any number of concurrent
/// connections. Each connection gets its own subscription to `frames`
/// so overlay viewers joining mid-session receive every frame from that
/// point on. Runs until the task is cancelled or the app channel closes.
pub async fn run(
    port: u16,
    tx: mpsc::Sender<WsEvent>,
    frames: broadcast::Sender<String>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("WebSocket hub listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let addr_str = addr.to_string();
        info!("Accepted TCP connection from {addr_str}");

        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!("WebSocket handshake failed for {addr_str}: {e}");
                continue;
            }
        };

        if tx
            .send(WsEvent::Connected {
                addr: addr_str.clone(),
            })
            .await
            .is_err()
        {
            break;
        }

        let client_tx = tx.clone();
        let frame_rx = frames.subscribe();
        tokio::spawn(async move {
            serve_client(ws_stream, client_tx, frame_rx, addr_str).await;
        });
    }

    Ok(())
}

/// Drive one client: forward its text messages to the app loop and push
/// broadcast frames down its write half until either side closes.
async fn serve_client<S>(
    ws_stream: WebSocketStream<S>,
    tx: mpsc::Sender<WsEvent>,
    mut frames: broadcast::Receiver<String>,
    addr: String,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if tx.send(WsEvent::Message(text.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {addr} sent close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error from {addr}: {e}");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ignore Binary, Ping, Pong, Frame variants.
                    }
                    None => break,
                }
            }
            frame = frames.recv() => {
                match frame {
                    Ok(json) => {
                        if write.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // A slow viewer missed frames; the next frame it
                        // receives is the freshest state anyway.
                        warn!("Client {addr} lagged, skipped {skipped} frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    let _ = tx.send(WsEvent::Disconnected { addr }).await;
}

/// Process raw WebSocket [`Message`] items from any [`Stream`], forwarding
/// text payloads through `tx`. Pure logic with no I/O; the read half of
/// [`serve_client`] follows the same rules, and this is the unit-test
/// target for them.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<WsEvent>,
    addr: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                if tx.send(WsEvent::Message(text.to_string())).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Ignore Binary, Ping, Pong, Frame variants.
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tokio_tungstenite::tungstenite::Error as WsError;

    fn mock_stream(
        messages: Vec<Result<Message, WsError>>,
    ) -> impl Stream<Item = Result<Message, WsError>> + Unpin {
        stream::iter(messages)
    }

    #[tokio::test]
    async fn control_payload_is_forwarded_verbatim() {
        let (tx, mut rx) = mpsc::channel(64);
        let payload = r#"{"type":"POINTER_UP","team":"a"}"#;
        let messages = vec![Ok(Message::Text(payload.into()))];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), WsEvent::Message(payload.to_string()));
    }

    #[tokio::test]
    async fn messages_keep_arrival_order() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text(r#"{"type":"SET_SCORE","team":"a","score":1}"#.into())),
            Ok(Message::Text(r#"{"type":"SET_SCORE","team":"a","score":2}"#.into())),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert!(matches!(rx.recv().await.unwrap(), WsEvent::Message(m) if m.contains("\"score\":1")));
        assert!(matches!(rx.recv().await.unwrap(), WsEvent::Message(m) if m.contains("\"score\":2")));
    }

    #[tokio::test]
    async fn close_frame_stops_processing() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text("before".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("after".into())),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), WsEvent::Message("before".into()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn transport_error_stops_processing() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text("before".into())),
            Err(WsError::ConnectionClosed),
            Ok(Message::Text("after".into())),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), WsEvent::Message("before".into()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_text_frames_are_ignored() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Binary(vec![1, 2, 3].into())),
            Ok(Message::Ping(vec![].into())),
            Ok(Message::Text("only-this".into())),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), WsEvent::Message("only-this".into()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_app_channel_yields_err() {
        let (tx, rx) = mpsc::channel(64);
        drop(rx);
        let messages = vec![Ok(Message::Text("orphan".into()))];
        assert!(process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .is_err());
    }
}
