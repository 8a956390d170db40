//! Chat client for the pomar relay.
//!
//! - [`ChatController`]: session state machine (identity, history, sync)
//! - [`ConnectionManager`]: socket lifecycle and reconnect loop
//! - [`ChatView`]: what a frontend paints
//! - [`Connector`]: socket seam, with [`WsConnector`] for real WebSockets

mod config;
mod connection;
mod controller;
mod transport;
pub mod view;

pub use config::{ChatConfig, DEFAULT_URL, RECONNECT_DELAY, SYNC_DELAY, ScrollConfig};
pub use connection::ConnectionManager;
pub use controller::{ChatAction, ChatController};
pub use transport::{
    ABNORMAL_CLOSURE, Connector, Link, LinkEvent, NO_STATUS_RECEIVED, TransportError, WsConnector,
    WsLink,
};
pub use view::{Bubble, ChatView, Side, ViewUpdate};
