//! Async WebSocket transport for the nPoint query protocol

use anyhow::Result;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::trace;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One WebSocket connection to a device, with every operation bounded by
/// the same per-operation timeout.
///
/// The connection lives exactly as long as this struct; dropping it on any
/// exit path releases the socket.
pub struct WsTransport {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
    op_timeout: Duration,
}

impl WsTransport {
    /// Open a WebSocket session to `ws://addr:port` within `op_timeout`.
    pub async fn connect(addr: Ipv4Addr, port: u16, op_timeout: Duration) -> Result<Self> {
        let url = format!("ws://{}:{}", addr, port);
        let (ws, _response) = timeout(op_timeout, connect_async(url.as_str())).await??;
        trace!(url = %url, "WebSocket session opened");

        let (sink, stream) = ws.split();
        Ok(Self {
            sink,
            stream,
            op_timeout,
        })
    }

    /// Send one text frame.
    pub async fn send_text(&mut self, payload: String) -> Result<()> {
        timeout(self.op_timeout, self.sink.send(Message::Text(payload.into()))).await??;
        Ok(())
    }

    /// Receive the next text frame, skipping control frames.
    pub async fn recv_text(&mut self) -> Result<String> {
        loop {
            let msg = timeout(self.op_timeout, self.stream.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection closed"))??;

            match msg {
                Message::Text(text) => return Ok(text.to_string()),
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => anyhow::bail!("connection closed by peer"),
                other => anyhow::bail!("unexpected frame: {:?}", other),
            }
        }
    }

    /// Best-effort close handshake. Errors are ignored; the socket is
    /// released when the transport drops either way.
    pub async fn close(&mut self) {
        let _ = timeout(self.op_timeout, self.sink.close()).await;
    }
}
