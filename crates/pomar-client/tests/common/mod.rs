//! In-memory links for driving a `ConnectionManager` without sockets.

#![allow(dead_code)]

use pomar_client::{ABNORMAL_CLOSURE, Connector, Link, LinkEvent, TransportError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub struct MemoryLink {
    inbound: mpsc::UnboundedReceiver<LinkEvent>,
    outbound: mpsc::UnboundedSender<String>,
}

impl Link for MemoryLink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Connect("remote end dropped".to_string()))
    }

    async fn next_event(&mut self) -> LinkEvent {
        self.inbound
            .recv()
            .await
            .unwrap_or(LinkEvent::Closed(ABNORMAL_CLOSURE))
    }
}

/// The relay's side of a [`MemoryLink`]. Dropping it closes the link.
pub struct Remote {
    events: mpsc::UnboundedSender<LinkEvent>,
    sent: mpsc::UnboundedReceiver<String>,
}

impl Remote {
    pub fn push(&self, frame: &str) {
        self.events
            .send(LinkEvent::Text(frame.to_string()))
            .unwrap();
    }

    pub fn error(&self, message: &str) {
        self.events
            .send(LinkEvent::Error(message.to_string()))
            .unwrap();
    }

    pub fn close(&self, code: u16) {
        self.events.send(LinkEvent::Closed(code)).unwrap();
    }

    /// Next frame the client sent, parsed.
    pub async fn next_frame(&mut self) -> serde_json::Value {
        let text = self.sent.recv().await.expect("client link dropped");
        serde_json::from_str(&text).unwrap()
    }

    pub fn try_next_frame(&mut self) -> Option<serde_json::Value> {
        self.sent
            .try_recv()
            .ok()
            .map(|text| serde_json::from_str(&text).unwrap())
    }
}

pub fn memory_link() -> (MemoryLink, Remote) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    (
        MemoryLink {
            inbound: events_rx,
            outbound: sent_tx,
        },
        Remote {
            events: events_tx,
            sent: sent_rx,
        },
    )
}

#[derive(Default)]
struct Inner {
    links: Mutex<VecDeque<MemoryLink>>,
    attempts: Mutex<Vec<Instant>>,
    handshake: Duration,
}

/// Hands out queued links in order; refuses once the queue is empty.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    inner: Arc<Inner>,
}

impl MemoryConnector {
    pub fn new(links: impl IntoIterator<Item = MemoryLink>) -> Self {
        let connector = Self::default();
        connector.inner.links.lock().unwrap().extend(links);
        connector
    }

    /// Every connect takes `handshake` before it resolves.
    pub fn slow(links: impl IntoIterator<Item = MemoryLink>, handshake: Duration) -> Self {
        let connector = Self {
            inner: Arc::new(Inner {
                handshake,
                ..Inner::default()
            }),
        };
        connector.inner.links.lock().unwrap().extend(links);
        connector
    }

    /// When each connection attempt happened.
    pub fn attempts(&self) -> Vec<Instant> {
        self.inner.attempts.lock().unwrap().clone()
    }
}

impl Connector for MemoryConnector {
    type Link = MemoryLink;

    async fn connect(&self, _url: &str) -> Result<MemoryLink, TransportError> {
        self.inner.attempts.lock().unwrap().push(Instant::now());
        tokio::time::sleep(self.inner.handshake).await;
        let next = self.inner.links.lock().unwrap().pop_front();
        next.ok_or_else(|| TransportError::Connect("connection refused".to_string()))
    }
}
