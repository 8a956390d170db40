//! Chat controller.
//!
//! A sans-I/O state machine: it consumes decoded frames and connection
//! lifecycle events, updates the message store and the view, and returns
//! [`ChatAction`]s for the connection manager to execute.

use crate::config::ChatConfig;
use crate::view::{Bubble, ChatView, Side};
use pomar_core::{Frame, Message, MessageStore, User, UserId, lookup, lookup_name, timestamp_now};
use std::collections::BTreeMap;
use std::time::Duration;

/// Side effects requested by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    /// Send a frame if the socket is writable.
    Send(Frame),
    /// Call [`ChatController::sync_request`] after the delay.
    ScheduleSync(Duration),
}

/// Owns the chat session state: identity, history, peers and view.
#[derive(Debug)]
pub struct ChatController {
    sync_delay: Duration,
    current_user: Option<&'static User>,
    store: MessageStore,
    peers: BTreeMap<UserId, &'static User>,
    view: ChatView,
}

impl ChatController {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            sync_delay: config.sync_delay,
            current_user: None,
            store: MessageStore::new(),
            peers: BTreeMap::new(),
            view: ChatView::new(config.scroll),
        }
    }

    pub fn current_user(&self) -> Option<&'static User> {
        self.current_user
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ChatView {
        &mut self.view
    }

    /// A peer announced through `identify`, if still connected.
    pub fn peer(&self, id: UserId) -> Option<&'static User> {
        self.peers.get(&id).copied()
    }

    pub fn peers(&self) -> impl Iterator<Item = &'static User> + '_ {
        self.peers.values().copied()
    }

    pub fn on_open(&mut self) {
        self.view.system("Connected to server!");
    }

    pub fn on_close(&mut self, code: u16) {
        self.view
            .system(format!("Disconnected from server (code: {code})!"));
    }

    pub fn on_reconnecting(&mut self) {
        self.view.system("Trying to reconnect...");
    }

    pub fn on_error(&mut self, error: &str) {
        tracing::error!("WebSocket error: {}", error);
        self.view.system("Connection error");
    }

    pub fn on_connect_failed(&mut self, error: &str) {
        tracing::error!("Failed to create WebSocket: {}", error);
        self.view.system("Failed to connect. Try again later.");
    }

    /// Decode and dispatch one inbound text frame.
    pub fn on_text(&mut self, text: &str) -> Vec<ChatAction> {
        match Frame::decode(text) {
            Ok(frame) => self.handle(frame),
            Err(e) => {
                tracing::warn!("Dropping inbound frame: {}", e);
                self.view.system("Error processing message");
                Vec::new()
            }
        }
    }

    /// Dispatch one decoded frame.
    pub fn handle(&mut self, frame: Frame) -> Vec<ChatAction> {
        tracing::debug!("Inbound {} frame", frame.kind());
        match frame {
            Frame::Message {
                id,
                sender,
                sender_id,
                content,
                timestamp,
            } => {
                self.handle_message(id, sender.as_deref(), sender_id, content, timestamp);
                Vec::new()
            }
            Frame::Identify {
                username,
                client_id,
            } => {
                self.handle_identify(username, client_id);
                Vec::new()
            }
            Frame::IdClient { content } => self.handle_identification(&content),
            Frame::UserCount { count } => {
                self.view.set_user_count(count);
                Vec::new()
            }
            Frame::UserDesconect { content } => {
                self.handle_user_disconnect(&content);
                Vec::new()
            }
            Frame::SyncRequest {
                client_id,
                message_count,
                target_client_id,
                ..
            } => self.handle_sync_request(client_id, message_count, target_client_id),
            Frame::SyncResponse {
                target_client_id,
                history,
                ..
            } => {
                self.handle_sync_response(target_client_id, history);
                Vec::new()
            }
            Frame::Unknown => Vec::new(),
        }
    }

    /// Turn user input into an outgoing message.
    ///
    /// Returns `None` for blank input or before the relay assigned an
    /// identity. Callers must only compose while the socket is writable.
    pub fn compose(&mut self, input: &str) -> Option<Frame> {
        let content = input.trim();
        if content.is_empty() {
            return None;
        }
        let Some(me) = self.current_user else {
            tracing::warn!("Cannot send before the relay assigned an identity");
            return None;
        };

        let id = self.store.next_free_id(Some(me.id));
        let timestamp = timestamp_now();
        self.store.record(Message {
            id,
            timestamp: timestamp.clone(),
            sender_id: Some(me.id),
            content: content.to_string(),
        });
        self.view.push(Bubble {
            side: Side::Outgoing,
            author: Some(me),
            timestamp: Some(timestamp.clone()),
            text: content.to_string(),
        });

        Some(Frame::Message {
            id: Some(id),
            sender: Some(me.name.to_string()),
            sender_id: Some(me.id),
            content: content.to_string(),
            timestamp: Some(timestamp),
        })
    }

    /// The broadcast asking peers for missing history.
    pub fn sync_request(&self) -> Option<Frame> {
        let me = self.current_user?;
        Some(Frame::SyncRequest {
            client_id: me.id,
            username: me.name.to_string(),
            message_count: self.store.len(),
            target_client_id: None,
        })
    }

    fn side_of(&self, sender_id: Option<UserId>) -> Side {
        match (sender_id, self.current_user) {
            (Some(sender), Some(me)) if sender == me.id => Side::Outgoing,
            _ => Side::Incoming,
        }
    }

    fn handle_message(
        &mut self,
        id: Option<u64>,
        sender: Option<&str>,
        sender_id: Option<UserId>,
        content: String,
        timestamp: Option<String>,
    ) {
        let id = match id {
            Some(id) => {
                self.store.observe_id(id);
                id
            }
            None => self.store.next_free_id(sender_id),
        };
        let inserted = self.store.record(Message {
            id,
            timestamp: timestamp.clone().unwrap_or_else(timestamp_now),
            sender_id,
            content: content.clone(),
        });
        if !inserted {
            tracing::debug!("Ignoring duplicate message {} from {:?}", id, sender_id);
            return;
        }

        let author = sender_id.and_then(lookup).or_else(|| sender.and_then(lookup_name));
        self.view.push(Bubble {
            side: self.side_of(sender_id),
            author,
            timestamp,
            text: content,
        });
    }

    fn handle_identify(&mut self, username: Option<String>, client_id: Option<UserId>) {
        let peer = client_id.and_then(lookup);
        if let Some(peer) = peer {
            self.peers.insert(peer.id, peer);
        }
        let name = username
            .or_else(|| peer.map(|p| p.name.to_string()))
            .unwrap_or_else(|| "New user".to_string());
        self.view.system(format!("{name} connected"));
    }

    fn handle_identification(&mut self, content: &str) -> Vec<ChatAction> {
        let user = match content.parse::<UserId>() {
            Ok(id) => lookup(id),
            Err(e) => {
                tracing::warn!("Bad idClient payload: {}", e);
                None
            }
        };
        let Some(me) = user else {
            self.view
                .system(format!("Unknown identity assigned: {content}"));
            return Vec::new();
        };

        self.current_user = Some(me);
        self.view.set_identity(me);
        self.view
            .system(format!("You are connected as {}", me.name));
        tracing::info!("Identified as {} ({})", me.name, me.id);

        vec![
            ChatAction::Send(Frame::Identify {
                username: Some(me.name.to_string()),
                client_id: Some(me.id),
            }),
            ChatAction::ScheduleSync(self.sync_delay),
        ]
    }

    fn handle_user_disconnect(&mut self, content: &str) {
        let user = content.parse::<UserId>().ok().and_then(lookup);
        match user {
            Some(user) => {
                self.peers.remove(&user.id);
                self.view.system(format!("{} disconnected", user.name));
            }
            None => self.view.system(format!("User {content} disconnected")),
        }
    }

    fn handle_sync_request(
        &self,
        requester: UserId,
        message_count: usize,
        target: Option<UserId>,
    ) -> Vec<ChatAction> {
        if target.is_some() {
            return Vec::new();
        }
        let Some(me) = self.current_user else {
            return Vec::new();
        };
        if self.store.len() <= message_count {
            return Vec::new();
        }
        tracing::info!(
            "Answering sync request from {} ({} < {})",
            requester,
            message_count,
            self.store.len()
        );
        vec![ChatAction::Send(Frame::SyncResponse {
            target_client_id: requester,
            history: self.store.history(),
            sender: me.name.to_string(),
            sender_id: me.id,
        })]
    }

    fn handle_sync_response(&mut self, target: UserId, history: Vec<Message>) {
        let Some(me) = self.current_user else {
            return;
        };
        if target != me.id || history.is_empty() {
            tracing::debug!("Ignoring sync response for {}", target);
            return;
        }

        if self.store.is_empty() {
            self.view.clear();
        }
        for message in history {
            self.store.observe_id(message.id);
            if self.store.contains(message.id, message.sender_id) {
                continue;
            }
            self.view.push(Bubble {
                side: self.side_of(message.sender_id),
                author: message.sender_id.and_then(lookup),
                timestamp: Some(message.timestamp.clone()),
                text: message.content.clone(),
            });
            self.store.record(message);
        }
        self.view.system("History synchronized!");
    }
}
