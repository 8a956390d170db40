//! Chat view model.
//!
//! [`ChatView`] is what a frontend paints: the bubble list, the scroll
//! position and the header fields. Every change is also queued as a
//! [`ViewUpdate`] so a frontend can repaint incrementally with
//! [`ChatView::take_updates`].

use crate::config::ScrollConfig;
use pomar_core::{SYSTEM_NAME, User};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Which side of the conversation a bubble sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Outgoing,
    Incoming,
    System,
}

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub side: Side,
    pub author: Option<&'static User>,
    pub timestamp: Option<String>,
    pub text: String,
}

impl Bubble {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            side: Side::System,
            author: None,
            timestamp: None,
            text: text.into(),
        }
    }

    /// Name shown in the bubble header.
    pub fn author_name(&self) -> Option<&'static str> {
        match self.side {
            Side::System => Some(SYSTEM_NAME),
            _ => self.author.map(|user| user.name),
        }
    }

    /// Avatar style of the author, if any.
    pub fn avatar(&self) -> Option<&'static str> {
        self.author.and_then(|user| user.avatar)
    }
}

impl fmt::Display for Bubble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.side {
            Side::Outgoing => '>',
            Side::Incoming => '<',
            Side::System => '*',
        };
        write!(f, "{marker} ")?;
        if let Some(ts) = &self.timestamp {
            write!(f, "[{ts}] ")?;
        }
        match self.author_name() {
            Some(name) => write!(f, "{name}: {}", self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

/// A change to the view, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Appended(Bubble),
    Cleared,
    UserCount(u32),
    Identity {
        name: &'static str,
        avatar: Option<&'static str>,
    },
    /// Bottom offset of the scroll indicator, in percent.
    Indicator(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    fn sign(self) -> f64 {
        match self {
            ScrollDirection::Up => -1.0,
            ScrollDirection::Down => 1.0,
        }
    }
}

/// Scroll position of the chat container.
#[derive(Debug, Clone)]
pub struct ScrollState {
    config: ScrollConfig,
    top: f64,
    content_height: f64,
}

impl ScrollState {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            top: 0.0,
            content_height: 0.0,
        }
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    /// How far the container can scroll.
    pub fn scrollable(&self) -> f64 {
        (self.content_height - self.config.viewport_height).max(0.0)
    }

    /// Move one step in `direction`, clamped to the content.
    pub fn scroll_by(&mut self, direction: ScrollDirection) {
        let next = self.top + direction.sign() * self.config.step;
        self.top = next.clamp(0.0, self.scrollable());
    }

    pub fn scroll_to_bottom(&mut self) {
        self.top = self.scrollable();
    }

    /// Bottom offset of the position indicator, in percent.
    ///
    /// A container with nothing to scroll counts as fully scrolled.
    pub fn indicator_bottom(&self) -> f64 {
        let scrollable = self.scrollable();
        let percentage = if scrollable > 0.0 {
            self.top / scrollable * 100.0
        } else {
            100.0
        };
        100.0 - percentage.max(self.config.indicator_min).min(100.0)
    }

    fn grow(&mut self) {
        self.content_height += self.config.bubble_height;
    }

    fn reset(&mut self) {
        self.top = 0.0;
        self.content_height = 0.0;
    }
}

/// The chat surface.
#[derive(Debug, Clone)]
pub struct ChatView {
    bubbles: Vec<Bubble>,
    scroll: ScrollState,
    user_count: Option<u32>,
    identity: Option<&'static User>,
    updates: Vec<ViewUpdate>,
}

impl ChatView {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            bubbles: Vec::new(),
            scroll: ScrollState::new(config),
            user_count: None,
            identity: None,
            updates: Vec::new(),
        }
    }

    /// Append a bubble and scroll to it.
    pub fn push(&mut self, bubble: Bubble) {
        self.scroll.grow();
        self.bubbles.push(bubble.clone());
        self.updates.push(ViewUpdate::Appended(bubble));
        self.scroll_to_bottom();
    }

    pub fn system(&mut self, text: impl Into<String>) {
        self.push(Bubble::system(text));
    }

    /// Remove every bubble.
    pub fn clear(&mut self) {
        self.bubbles.clear();
        self.scroll.reset();
        self.updates.push(ViewUpdate::Cleared);
    }

    pub fn set_user_count(&mut self, count: u32) {
        self.user_count = Some(count);
        self.updates.push(ViewUpdate::UserCount(count));
    }

    pub fn set_identity(&mut self, user: &'static User) {
        self.identity = Some(user);
        self.updates.push(ViewUpdate::Identity {
            name: user.name,
            avatar: user.avatar,
        });
    }

    pub fn scroll_by(&mut self, direction: ScrollDirection) {
        self.scroll.scroll_by(direction);
        self.updates
            .push(ViewUpdate::Indicator(self.scroll.indicator_bottom()));
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll.scroll_to_bottom();
        self.updates
            .push(ViewUpdate::Indicator(self.scroll.indicator_bottom()));
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn user_count(&self) -> Option<u32> {
        self.user_count
    }

    pub fn identity(&self) -> Option<&'static User> {
        self.identity
    }

    /// Drain the queued updates.
    pub fn take_updates(&mut self) -> Vec<ViewUpdate> {
        std::mem::take(&mut self.updates)
    }
}

/// Press-and-hold repeat for the scroll controls.
///
/// While held, the direction is sent on the tick channel once immediately and
/// then every interval. The repeat task is aborted on release, cancel or drop.
#[derive(Debug)]
pub struct HoldToScroll {
    interval: Duration,
    timer: Option<JoinHandle<()>>,
}

impl HoldToScroll {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Start repeating. Returns `false` if a repeat is already running.
    ///
    /// Must be called inside a tokio runtime.
    pub fn press(
        &mut self,
        direction: ScrollDirection,
        ticks: mpsc::UnboundedSender<ScrollDirection>,
    ) -> bool {
        if self.is_active() {
            return false;
        }
        if ticks.send(direction).is_err() {
            return false;
        }
        let period = self.interval;
        self.timer = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                if ticks.send(direction).is_err() {
                    break;
                }
            }
        }));
        true
    }

    /// Stop repeating (mouse up, touch end).
    pub fn release(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Input was lost mid-press (touch cancel).
    pub fn cancel(&mut self) {
        self.release();
    }
}

impl Drop for HoldToScroll {
    fn drop(&mut self) {
        self.release();
    }
}

/// Elements a chat frontend is expected to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    ChatContainer,
    ScrollUp,
    ScrollDown,
    ScrollIndicator,
    ChatInput,
    SendButton,
    UserCount,
    UserName,
    ProfileImage,
}

impl Element {
    pub const ALL: [Element; 9] = [
        Element::ChatContainer,
        Element::ScrollUp,
        Element::ScrollDown,
        Element::ScrollIndicator,
        Element::ChatInput,
        Element::SendButton,
        Element::UserCount,
        Element::UserName,
        Element::ProfileImage,
    ];

    /// Element id, or a CSS selector for the profile image.
    pub fn selector(self) -> &'static str {
        match self {
            Element::ChatContainer => "msger-chat",
            Element::ScrollUp => "scroll-up",
            Element::ScrollDown => "scroll-down",
            Element::ScrollIndicator => "scroll-position",
            Element::ChatInput => "chat-input-text",
            Element::SendButton => "sendButton",
            Element::UserCount => "userCount",
            Element::UserName => "user_name",
            Element::ProfileImage => ".chat-header-perfil .msg-img",
        }
    }
}

/// Check a frontend for the expected elements.
///
/// Missing elements are reported but never block startup.
pub fn missing_elements(present: impl Fn(&str) -> bool) -> Vec<Element> {
    let missing: Vec<Element> = Element::ALL
        .into_iter()
        .filter(|element| !present(element.selector()))
        .collect();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|e| e.selector()).collect();
        tracing::error!("Some chat elements were not found: {}", names.join(", "));
    }
    missing
}
