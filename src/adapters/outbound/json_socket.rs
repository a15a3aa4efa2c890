use crate::common::{ScenarioError, ScenarioResult};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket carrying one JSON document per text frame.
pub struct JsonSocket {
    endpoint: String,
    stream: WsStream,
}

impl JsonSocket {
    pub async fn connect(endpoint: &str) -> ScenarioResult<Self> {
        let (stream, _response) = connect_async(endpoint).await.map_err(|e| ScenarioError::Connection {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            stream,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send_json(&mut self, value: &Value) -> ScenarioResult<()> {
        let text = serde_json::to_string(value)?;
        tracing::debug!(endpoint = %self.endpoint, %text, "send");
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Next JSON frame; control frames are skipped, a close from the peer is an error.
    pub async fn recv_json(&mut self) -> ScenarioResult<Value> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!(endpoint = %self.endpoint, %text, "recv");
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Binary(bytes))) => return Ok(serde_json::from_slice(&bytes)?),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => continue,
                Some(Ok(Message::Close(_))) | None => {
                    return Err(ScenarioError::Protocol(format!(
                        "{} closed the connection",
                        self.endpoint
                    )))
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    pub async fn close(&mut self) -> ScenarioResult<()> {
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
