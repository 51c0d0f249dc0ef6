//! View bindings the lightbox controller drives.

use std::path::PathBuf;
use std::sync::mpsc;

use crate::error::Result;
use crate::fit::{FitResult, Viewport};
use crate::gallery::{GalleryIndex, MediaItem};

/// Pending outcome of a video play request.
///
/// Playback start is asynchronous: the view hands back a `PlayRequest` and
/// settles it later through the paired [`PlaySettler`].
#[derive(Debug)]
pub struct PlayRequest {
    receiver: Option<mpsc::Receiver<std::result::Result<(), String>>>,
    settled: Option<std::result::Result<(), String>>,
}

/// Settles a [`PlayRequest`]. Dropping it unsettled rejects the request.
#[derive(Debug)]
pub struct PlaySettler {
    sender: mpsc::Sender<std::result::Result<(), String>>,
}

impl PlaySettler {
    pub fn resolve(self) {
        let _ = self.sender.send(Ok(()));
    }

    pub fn reject(self, reason: impl Into<String>) {
        let _ = self.sender.send(Err(reason.into()));
    }
}

impl PlayRequest {
    /// A request that settles when the returned settler is used.
    pub fn pending() -> (PlaySettler, PlayRequest) {
        let (sender, receiver) = mpsc::channel();
        (
            PlaySettler { sender },
            PlayRequest {
                receiver: Some(receiver),
                settled: None,
            },
        )
    }

    /// A request that already started playing.
    pub fn resolved() -> Self {
        Self {
            receiver: None,
            settled: Some(Ok(())),
        }
    }

    /// A request the view refused outright.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            receiver: None,
            settled: Some(Err(reason.into())),
        }
    }

    /// Check for settlement without blocking. `None` while still pending.
    pub fn poll(&mut self) -> Option<&std::result::Result<(), String>> {
        if self.settled.is_none() {
            if let Some(receiver) = &self.receiver {
                match receiver.try_recv() {
                    Ok(outcome) => self.settled = Some(outcome),
                    Err(mpsc::TryRecvError::Empty) => {}
                    Err(mpsc::TryRecvError::Disconnected) => {
                        self.settled = Some(Err("play request abandoned".to_string()));
                    }
                }
            }
        }
        self.settled.as_ref()
    }
}

/// Rendering surface of a lightbox, injected into the controller.
///
/// The controller owns all state; implementations only reflect it.
pub trait LightboxView {
    /// Current visible area, in pixels.
    fn viewport(&self) -> Viewport;

    /// Load `item` into the matching viewer element, size the surface to `fit`
    /// (also as its maximum size, clipping overflow) and show it.
    fn present(&mut self, item: &MediaItem, fit: FitResult);

    /// Hide the surface and release its media source.
    fn dismiss(&mut self);

    /// Show or hide the previous/next controls.
    fn set_navigation(&mut self, has_prev: bool, has_next: bool);

    /// Start playback of the presented video.
    fn play_video(&mut self) -> PlayRequest;

    fn pause_video(&mut self);

    /// Show the edit-properties panel with its fields populated.
    fn show_edit_panel(&mut self, alt: &str, caption: &str);

    fn hide_edit_panel(&mut self);

    /// Store downloaded bytes under `filename`, returning where they went.
    fn save_download(&mut self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;

    /// The gallery was rebuilt; re-render it.
    fn contents_changed(&mut self, _index: &GalleryIndex) {}

    /// Bring the gallery entry at `position` into view.
    fn reveal(&mut self, _position: usize) {}
}
