//! Connection manager.
//!
//! Owns the socket and the [`ChatController`]. One `run` call drives the
//! whole session: open, dispatch frames, send user input, fire the sync timer,
//! and reopen the socket after the reconnect delay whenever it closes.

use crate::config::ChatConfig;
use crate::controller::{ChatAction, ChatController};
use crate::transport::{Connector, Link, LinkEvent, TransportError};
use crate::view::ViewUpdate;
use pomar_core::{ConnectionState, Frame, RetryPolicy};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub struct ConnectionManager<C: Connector> {
    connector: C,
    url: String,
    reconnect: RetryPolicy,
    controller: ChatController,
    state: ConnectionState,
    attempts: u32,
    updates: Option<mpsc::UnboundedSender<ViewUpdate>>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, config: &ChatConfig) -> Self {
        Self {
            connector,
            url: config.url.clone(),
            reconnect: config.reconnect,
            controller: ChatController::new(config),
            state: ConnectionState::Closed,
            attempts: 0,
            updates: None,
        }
    }

    /// Forward view updates to a frontend.
    pub fn with_updates(mut self, updates: mpsc::UnboundedSender<ViewUpdate>) -> Self {
        self.updates = Some(updates);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connection attempts made so far, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    /// Run until the reconnect policy gives up.
    ///
    /// With the default unbounded policy this never returns. Lines received on
    /// `input` are sent as chat messages while the socket is open and dropped
    /// otherwise.
    pub async fn run(&mut self, input: &mut mpsc::Receiver<String>) {
        loop {
            self.attempts += 1;
            self.state = ConnectionState::Connecting;
            tracing::info!("Connecting to {} (attempt {})", self.url, self.attempts);

            match self.connect(input).await {
                Ok(link) => {
                    self.state = ConnectionState::Open;
                    self.controller.on_open();
                    self.flush();
                    let code = self.session(link, input).await;
                    self.state = ConnectionState::Closed;
                    tracing::info!("Socket closed with code {}", code);
                    self.controller.on_close(code);
                }
                Err(e) => {
                    self.state = ConnectionState::Closed;
                    self.controller.on_connect_failed(&e.to_string());
                }
            }
            self.flush();

            if !self.reconnect.allows_another(self.attempts) {
                tracing::info!("Giving up after {} attempts", self.attempts);
                return;
            }
            self.wait(self.reconnect.delay, input).await;
            self.controller.on_reconnecting();
            self.flush();
        }
    }

    /// Open a link, discarding input typed while the handshake is pending.
    async fn connect(
        &self,
        input: &mut mpsc::Receiver<String>,
    ) -> Result<C::Link, TransportError> {
        let connect = self.connector.connect(&self.url);
        tokio::pin!(connect);
        let mut input_open = true;
        loop {
            tokio::select! {
                result = &mut connect => return result,
                line = input.recv(), if input_open => discard(line, &mut input_open),
            }
        }
    }

    /// Pump one open link until it closes. Returns the close code.
    async fn session(&mut self, mut link: C::Link, input: &mut mpsc::Receiver<String>) -> u16 {
        let mut sync_at: Option<Instant> = None;
        let mut input_open = true;

        loop {
            let deadline = sync_at;
            let sync_timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                event = link.next_event() => match event {
                    LinkEvent::Text(text) => {
                        let actions = self.controller.on_text(&text);
                        self.apply(&mut link, actions, &mut sync_at).await;
                    }
                    LinkEvent::Error(e) => self.controller.on_error(&e),
                    LinkEvent::Closed(code) => return code,
                },
                line = input.recv(), if input_open => match line {
                    Some(line) => {
                        if let Some(frame) = self.controller.compose(&line) {
                            self.send(&mut link, frame).await;
                        }
                    }
                    None => input_open = false,
                },
                () = sync_timer => {
                    sync_at = None;
                    if let Some(frame) = self.controller.sync_request() {
                        self.send(&mut link, frame).await;
                    }
                }
            }
            self.flush();
        }
    }

    async fn apply(
        &mut self,
        link: &mut C::Link,
        actions: Vec<ChatAction>,
        sync_at: &mut Option<Instant>,
    ) {
        for action in actions {
            match action {
                ChatAction::Send(frame) => self.send(link, frame).await,
                ChatAction::ScheduleSync(delay) => *sync_at = Some(Instant::now() + delay),
            }
        }
    }

    /// Send a frame. Failures are logged, never propagated.
    async fn send(&mut self, link: &mut C::Link, frame: Frame) {
        if !self.state.is_open() {
            tracing::warn!("Socket not open, dropping {} frame", frame.kind());
            return;
        }
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{}", e);
                return;
            }
        };
        tracing::debug!("Outbound {} frame", frame.kind());
        if let Err(e) = link.send_text(text).await {
            tracing::warn!("Failed to send {} frame: {}", frame.kind(), e);
        }
    }

    /// Sleep out the reconnect delay, discarding input typed meanwhile.
    async fn wait(&mut self, delay: Duration, input: &mut mpsc::Receiver<String>) {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        let mut input_open = true;
        loop {
            tokio::select! {
                () = &mut sleep => return,
                line = input.recv(), if input_open => discard(line, &mut input_open),
            }
        }
    }

    fn flush(&mut self) {
        let updates = self.controller.view_mut().take_updates();
        if let Some(tx) = &self.updates {
            for update in updates {
                let _ = tx.send(update);
            }
        }
    }
}

fn discard(line: Option<String>, input_open: &mut bool) {
    match line {
        Some(_) => tracing::debug!("Not connected, dropping input"),
        None => *input_open = false,
    }
}
