//! User-facing banners.
//!
//! Banners are dismissible and expire on their own after a fixed TTL
//! (five seconds by default).

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::render::{Element, Node};

pub const DEFAULT_BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Success,
}

impl BannerKind {
    fn alert_class(&self) -> &'static str {
        match self {
            BannerKind::Error => "alert-danger",
            BannerKind::Success => "alert-success",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    pub id: u64,
    pub kind: BannerKind,
    pub message: String,
    pub raised_at: Instant,
}

impl Banner {
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.raised_at) >= ttl
    }

    pub fn to_node(&self) -> Node {
        Element::new("div")
            .class("alert alert-dismissible fade show")
            .class(self.kind.alert_class())
            .attr("role", "alert")
            .attr("data-banner-id", self.id.to_string())
            .text(self.message.as_str())
            .child(
                Element::new("button")
                    .class("btn-close")
                    .attr("type", "button")
                    .attr("data-bs-dismiss", "alert")
                    .attr("aria-label", "Close"),
            )
            .into()
    }
}

/// Receives user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: BannerKind, message: &str);

    fn error(&self, message: &str) {
        self.notify(BannerKind::Error, message);
    }

    fn success(&self, message: &str) {
        self.notify(BannerKind::Success, message);
    }
}

/// Keeps live banners, newest first.
#[derive(Debug)]
pub struct BannerBoard {
    ttl: Duration,
    state: Mutex<BoardState>,
}

#[derive(Debug, Default)]
struct BoardState {
    next_id: u64,
    banners: Vec<Banner>,
}

impl Default for BannerBoard {
    fn default() -> Self {
        Self::new(DEFAULT_BANNER_TTL)
    }
}

impl BannerBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(BoardState::default()),
        }
    }

    pub fn raise_at(&self, kind: BannerKind, message: &str, now: Instant) -> u64 {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.banners.insert(
            0,
            Banner {
                id,
                kind,
                message: message.to_string(),
                raised_at: now,
            },
        );
        id
    }

    /// Returns false when the banner was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.lock();
        let before = state.banners.len();
        state.banners.retain(|banner| banner.id != id);
        state.banners.len() != before
    }

    /// Drops expired banners and returns the remaining ones.
    pub fn active_at(&self, now: Instant) -> Vec<Banner> {
        let mut state = self.lock();
        let ttl = self.ttl;
        state.banners.retain(|banner| !banner.is_expired(now, ttl));
        state.banners.clone()
    }

    pub fn active(&self) -> Vec<Banner> {
        self.active_at(Instant::now())
    }

    pub fn render_at(&self, now: Instant) -> Vec<Node> {
        self.active_at(now).iter().map(Banner::to_node).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoardState> {
        // A poisoned board still holds valid banners.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for BannerBoard {
    fn notify(&self, kind: BannerKind, message: &str) {
        self.raise_at(kind, message, Instant::now());
    }
}

/// Notifier for terminal front-ends: banners become log lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: BannerKind, message: &str) {
        match kind {
            BannerKind::Error => log::error!("{}", message),
            BannerKind::Success => log::info!("{}", message),
        }
    }
}
