//! Lightbox: modal viewer over the gallery index.

pub mod controller;
pub mod view;

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ViewerConfig;
use crate::tasks::RequestKind;

pub use controller::Lightbox;
pub use view::{LightboxView, PlayRequest, PlaySettler};

/// Read-only snapshot of the controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightboxState {
    /// Position of the presented item; `None` while closed.
    pub current_position: Option<usize>,
    pub has_prev: bool,
    pub has_next: bool,
    /// An edit panel owns the keyboard; shortcuts other than Escape are ignored.
    pub editing_active: bool,
}

impl LightboxState {
    pub fn is_open(&self) -> bool {
        self.current_position.is_some()
    }
}

/// Keys the lightbox reacts to while it has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxKey {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Escape,
    Delete,
}

/// Whether the host should suppress its own handling of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

/// Things worth telling the user that happened during a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum LightboxEvent {
    ContentsReloaded { album_id: String, count: usize },
    Saved { source: String },
    Deleted { source: String },
    Downloaded { path: PathBuf },
    Failed { kind: RequestKind, message: String },
}

/// Tunables for a controller instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightboxOptions {
    pub fill_fraction: f64,
    /// Pause between closing a video and opening its neighbour.
    pub video_reopen_delay: Duration,
}

impl Default for LightboxOptions {
    fn default() -> Self {
        Self {
            fill_fraction: crate::fit::DEFAULT_FILL_FRACTION,
            video_reopen_delay: Duration::from_millis(100),
        }
    }
}

impl From<&ViewerConfig> for LightboxOptions {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            fill_fraction: config.effective_fill_fraction(),
            video_reopen_delay: Duration::from_millis(config.video_reopen_delay_ms),
        }
    }
}
