//! Socket seam.
//!
//! [`Connector`] opens a [`Link`]; a link moves text frames and reports
//! lifecycle events. [`WsConnector`] is the tokio-tungstenite implementation;
//! tests substitute in-memory links.

use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Close code reported when the socket vanished without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code reported for a close frame that carried no status.
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Something that happened on an open link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A text frame arrived.
    Text(String),
    /// The socket reported an error. A close follows.
    Error(String),
    /// The socket closed with this code.
    Closed(u16),
}

/// An open socket.
pub trait Link: Send {
    /// Send one text frame.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Wait for the next event. After [`LinkEvent::Closed`] the link is dead.
    fn next_event(&mut self) -> impl Future<Output = LinkEvent> + Send;
}

/// Opens links to a URL.
pub trait Connector: Send + Sync {
    type Link: Link;

    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Link, TransportError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to open socket: {0}")]
    Connect(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// WebSocket connector over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Link = WsLink;

    async fn connect(&self, url: &str) -> Result<WsLink, TransportError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        tracing::debug!("WebSocket handshake with {} complete", url);
        Ok(WsLink {
            stream,
            failed: false,
        })
    }
}

pub struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    failed: bool,
}

impl Link for WsLink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> LinkEvent {
        if self.failed {
            return LinkEvent::Closed(ABNORMAL_CLOSURE);
        }
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return LinkEvent::Text(text.to_string()),
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.map_or(NO_STATUS_RECEIVED, |f| u16::from(f.code));
                    return LinkEvent::Closed(code);
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::debug!("Ignoring binary frame");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.failed = true;
                    return LinkEvent::Error(e.to_string());
                }
                None => return LinkEvent::Closed(ABNORMAL_CLOSURE),
            }
        }
    }
}
