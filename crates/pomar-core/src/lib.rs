//! Core types for pomar.
//!
//! This crate holds the protocol primitives shared by the chat client: wire
//! frames, the static user directory and the deduplicating message store. It
//! performs no I/O.

mod protocol;
mod retry;
mod store;
mod user;

pub use protocol::{Frame, FrameError};
pub use retry::RetryPolicy;
pub use store::{Message, MessageStore, TIMESTAMP_FORMAT, timestamp_now};
pub use user::{DIRECTORY, SYSTEM_NAME, User, UserId, UserIdParseError, lookup, lookup_name};

/// Socket lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket is being opened.
    Connecting,
    /// Frames can be sent.
    Open,
    /// Socket is gone; a reconnect may be pending.
    Closed,
}

impl ConnectionState {
    /// Whether the socket is currently writable.
    pub fn is_open(self) -> bool {
        self == ConnectionState::Open
    }
}
