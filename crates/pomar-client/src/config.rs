//! Client configuration.

use pomar_core::RetryPolicy;
use std::time::Duration;

/// Relay endpoint on the access point.
pub const DEFAULT_URL: &str = "ws://192.168.4.1:81/ws";

/// Wait before reopening a closed socket.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Wait after identifying before asking peers for history, so the
/// `identify` broadcast reaches them first.
pub const SYNC_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub url: String,
    pub reconnect: RetryPolicy,
    pub sync_delay: Duration,
    pub scroll: ScrollConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            reconnect: RetryPolicy::forever(RECONNECT_DELAY),
            sync_delay: SYNC_DELAY,
            scroll: ScrollConfig::default(),
        }
    }
}

/// Scroll affordance settings. Heights are in abstract pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollConfig {
    /// Distance moved per scroll step.
    pub step: f64,
    /// Repeat interval while a scroll control is held.
    pub interval: Duration,
    /// Smallest indicator position, in percent.
    pub indicator_min: f64,
    /// Height contributed by each bubble.
    pub bubble_height: f64,
    /// Visible height of the chat container.
    pub viewport_height: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            step: 40.0,
            interval: Duration::from_millis(50),
            indicator_min: 12.0,
            bubble_height: 64.0,
            viewport_height: 480.0,
        }
    }
}
