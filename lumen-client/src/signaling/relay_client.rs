use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use lumen_core::{ClientSignal, ServerSignal};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Opens the relay WebSocket at `url`.
///
/// Returns the outbound sender and the stream of decoded relay frames. The
/// receiver yields `None` once the socket is gone.
pub async fn connect_relay(
    url: &str,
) -> Result<(
    mpsc::UnboundedSender<ClientSignal>,
    mpsc::UnboundedReceiver<ServerSignal>,
)> {
    let (socket, _) = connect_async(url)
        .await
        .with_context(|| format!("Failed to connect to relay at {}", url))?;
    info!("Connected to relay at {}", url);

    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientSignal>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerSignal>();

    tokio::spawn(async move {
        while let Some(signal) = out_rx.recv().await {
            let json = match serde_json::to_string(&signal) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal: {}", e);
                    continue;
                }
            };
            if sender.send(Message::text(json)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ServerSignal>(text.as_str()) {
                    Ok(signal) => {
                        if in_tx.send(signal).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid ServerSignal from relay: {}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
        debug!("Relay connection closed");
    });

    Ok((out_tx, in_rx))
}
