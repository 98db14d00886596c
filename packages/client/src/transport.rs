//! Transport seam between the connection manager and the network.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use crate::error::ClientError;

/// Build the hub URL, appending `token` as an encoded query parameter.
///
/// Query parameters already present on `base` are kept.
pub fn hub_url(base: &str, token: Option<&str>) -> Result<String, ClientError> {
    let mut url = Url::parse(base)?;
    if let Some(token) = token {
        url.query_pairs_mut().append_pair("token", token);
    }
    Ok(url.into())
}

/// One live connection, as a pair of text-frame channels.
///
/// The inbound receiver yields `None` once the connection is gone. Dropping
/// every outbound sender closes the connection.
pub struct Transport {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Transport, ClientError>;
}

/// WebSocket transport over tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Transport, ClientError> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        // Writer: ends when every outbound sender is dropped
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = write.send(Message::text(frame)).await {
                    tracing::warn!("Failed to send frame: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        // Reader: ends on close, on error or once nobody listens anymore
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(text.to_string()).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("Server closed the connection");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Transport {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
