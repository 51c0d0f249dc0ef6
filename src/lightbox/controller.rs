//! Lightbox controller: open/close/navigate state machine with edit, delete
//! and download actions against the album server.
//!
//! Everything runs on the caller's (UI) thread except server requests, which
//! go through a [`RequestManager`] and come back on [`Lightbox::poll_updates`].
//! Two counters keep late responses from corrupting newer views:
//! - the presentation generation, bumped by every open and close, decides
//!   whether a save/delete completion may still close the lightbox;
//! - the reload generation, bumped by every contents request, decides whether
//!   a contents response is the latest one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::{download_filename, ContentApi};
use crate::error::{Error, Result};
use crate::fit::ViewportFitter;
use crate::gallery::{Direction, GalleryIndex, MediaItem, MediaKind};
use crate::tasks::{Completion, PendingRequest, RequestId, RequestKind, RequestManager, RequestOutcome};

use super::view::{LightboxView, PlayRequest};
use super::{KeyOutcome, LightboxEvent, LightboxKey, LightboxOptions, LightboxState};

/// Reopen queued by video navigation, fired once `due` has passed.
#[derive(Debug, Clone, Copy)]
struct ScheduledOpen {
    position: usize,
    due: Instant,
}

pub struct Lightbox<V: LightboxView> {
    view: V,
    api: Arc<dyn ContentApi>,
    index: GalleryIndex,
    fitter: ViewportFitter,
    requests: RequestManager,
    state: LightboxState,
    presentation: u64,
    reload_generation: u64,
    /// Play request of the presented video.
    playback: Option<PlayRequest>,
    /// Play requests of closed videos that still need a pause once they settle.
    awaiting_pause: Vec<PlayRequest>,
    /// Play for the presented video is held back until `awaiting_pause` drains.
    deferred_play: bool,
    scheduled_open: Option<ScheduledOpen>,
    video_reopen_delay: Duration,
}

impl<V: LightboxView> Lightbox<V> {
    pub fn new(view: V, api: Arc<dyn ContentApi>, options: LightboxOptions) -> Self {
        Self {
            view,
            api,
            index: GalleryIndex::default(),
            fitter: ViewportFitter::new(options.fill_fraction),
            requests: RequestManager::new(),
            state: LightboxState::default(),
            presentation: 0,
            reload_generation: 0,
            playback: None,
            awaiting_pause: Vec::new(),
            deferred_play: false,
            scheduled_open: None,
            video_reopen_delay: options.video_reopen_delay,
        }
    }

    pub fn state(&self) -> LightboxState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn gallery(&self) -> &GalleryIndex {
        &self.index
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.state.current_position.and_then(|p| self.index.get(p))
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Gallery and view together, for renderers that need both.
    pub fn split_mut(&mut self) -> (&GalleryIndex, &mut V) {
        (&self.index, &mut self.view)
    }

    pub fn pending_requests(&self) -> Vec<&PendingRequest> {
        self.requests.pending_requests()
    }

    /// Requests in flight, a queued reopen, or a video still waiting for its pause.
    pub fn is_busy(&self) -> bool {
        self.requests.has_pending() || self.scheduled_open.is_some() || !self.awaiting_pause.is_empty()
    }

    // --- Presentation ---

    /// Present the item at `position`.
    ///
    /// Rejects unknown positions and degenerate media before touching any state.
    pub fn open(&mut self, position: usize) -> Result<()> {
        let Some(item) = self.index.get(position).cloned() else {
            tracing::debug!(position, "Ignoring open of missing position");
            return Err(Error::InvalidPosition(position));
        };
        let fit = match self
            .fitter
            .fit(item.natural_width, item.natural_height, self.view.viewport())
        {
            Ok(fit) => fit,
            Err(e) => {
                tracing::warn!(source = %item.source, error = %e, "Cannot fit media into viewport");
                return Err(e);
            }
        };

        self.scheduled_open = None;
        if self.is_open() {
            self.teardown();
        }

        self.presentation += 1;
        let has_prev = self.index.neighbor(position, Direction::Previous).is_some();
        let has_next = self.index.neighbor(position, Direction::Next).is_some();
        self.state = LightboxState {
            current_position: Some(position),
            has_prev,
            has_next,
            editing_active: false,
        };

        self.view.hide_edit_panel();
        self.view.set_navigation(has_prev, has_next);
        self.view.present(&item, fit);
        self.view.reveal(position);

        if item.kind == MediaKind::Video {
            self.start_playback();
        }

        tracing::debug!(
            position,
            kind = item.kind.label(),
            width = fit.display_width,
            height = fit.display_height,
            "Lightbox opened"
        );
        Ok(())
    }

    /// Hide the lightbox. A no-op when already closed, apart from dropping a queued reopen.
    pub fn close(&mut self) {
        self.scheduled_open = None;
        if !self.is_open() {
            return;
        }
        self.teardown();
        tracing::debug!("Lightbox closed");
    }

    /// Close the current presentation and open its neighbour in `direction`, if any.
    pub fn navigate(&mut self, direction: Direction) {
        let Some(position) = self.state.current_position else {
            return;
        };
        let was_video = self
            .current_item()
            .map(|item| item.kind == MediaKind::Video)
            .unwrap_or(false);
        let target = self.index.neighbor(position, direction);

        self.close();

        match target {
            Some(target) if was_video && !self.video_reopen_delay.is_zero() => {
                // Let the video teardown finish before loading the next source.
                self.scheduled_open = Some(ScheduledOpen {
                    position: target,
                    due: Instant::now() + self.video_reopen_delay,
                });
            }
            Some(target) => {
                if let Err(e) = self.open(target) {
                    tracing::warn!(position = target, error = %e, "Failed to open neighbour");
                }
            }
            None => {}
        }
    }

    fn start_playback(&mut self) {
        if self.awaiting_pause.is_empty() {
            self.playback = Some(self.view.play_video());
            self.deferred_play = false;
        } else {
            // An earlier video has not been paused yet.
            self.deferred_play = true;
        }
    }

    /// Pause the presented video, or park its play request until it settles.
    fn stop_playback(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            let settled = playback.poll().cloned();
            match settled {
                Some(Ok(())) => self.view.pause_video(),
                Some(Err(reason)) => {
                    tracing::debug!(reason = %reason, "Video never started; nothing to pause");
                }
                None => self.awaiting_pause.push(playback),
            }
        }
        self.deferred_play = false;
    }

    fn teardown(&mut self) {
        self.stop_playback();

        if self.state.editing_active {
            self.view.hide_edit_panel();
        }
        self.view.dismiss();

        self.state = LightboxState::default();
        self.presentation += 1;
    }

    // --- Editing ---

    /// Show the edit panel for the current item, or hide it if it is showing.
    pub fn toggle_edit(&mut self) {
        if !self.is_open() {
            return;
        }
        if self.state.editing_active {
            self.cancel_edit();
            return;
        }
        let Some(item) = self.current_item() else {
            return;
        };
        let (alt, caption) = (item.alt_text().to_string(), item.caption_text().to_string());
        self.view.show_edit_panel(&alt, &caption);
        self.state.editing_active = true;
    }

    pub fn cancel_edit(&mut self) {
        if self.state.editing_active {
            self.view.hide_edit_panel();
            self.state.editing_active = false;
        }
    }

    /// Send new alt text and caption for the current item. On completion the
    /// lightbox closes (if still showing the same presentation) and the
    /// contents are reloaded, whether or not the server accepted the change.
    pub fn save_edit(&mut self, alt: &str, caption: &str) -> Option<RequestId> {
        let source = self.current_item()?.source.clone();
        let api = Arc::clone(&self.api);
        let (alt, caption) = (alt.to_string(), caption.to_string());

        tracing::info!(source = %source, "Saving content properties");
        Some(self.requests.spawn(RequestKind::SaveEdit, self.presentation, move || {
            api.update_content(&source, &alt, &caption)?;
            Ok(RequestOutcome::Saved { source })
        }))
    }

    /// Delete the current item. Completes like [`Lightbox::save_edit`].
    pub fn delete_current(&mut self) -> Option<RequestId> {
        let source = self.current_item()?.source.clone();
        let api = Arc::clone(&self.api);

        tracing::info!(source = %source, "Deleting content");
        Some(self.requests.spawn(RequestKind::DeleteContent, self.presentation, move || {
            api.delete_content(&source)?;
            Ok(RequestOutcome::Deleted { source })
        }))
    }

    /// Fetch the current item's bytes and hand them to the view for saving.
    pub fn download(&mut self) -> Option<RequestId> {
        let source = self.current_item()?.source.clone();
        let filename = download_filename(&source).to_string();
        let api = Arc::clone(&self.api);

        tracing::debug!(source = %source, filename = %filename, "Downloading content");
        Some(self.requests.spawn(RequestKind::Download, self.presentation, move || {
            let bytes = api.fetch_content(&source)?;
            Ok(RequestOutcome::Downloaded { filename, bytes })
        }))
    }

    // --- Keyboard ---

    /// Dispatch a key pressed while the lightbox has focus.
    ///
    /// Escape always closes. Everything else is ignored while editing so the
    /// edit panel keeps its keys.
    pub fn handle_key(&mut self, key: LightboxKey) -> KeyOutcome {
        if !self.is_open() {
            // Between a video and its neighbour the lightbox is closed but not done.
            if key == LightboxKey::Escape && self.scheduled_open.is_some() {
                self.close();
                return KeyOutcome::Handled;
            }
            return KeyOutcome::Ignored;
        }
        if self.state.editing_active && key != LightboxKey::Escape {
            return KeyOutcome::Ignored;
        }

        match key {
            LightboxKey::Escape => self.close(),
            LightboxKey::ArrowLeft => self.navigate(Direction::Previous),
            LightboxKey::ArrowRight => self.navigate(Direction::Next),
            LightboxKey::ArrowDown => {
                self.download();
            }
            LightboxKey::ArrowUp => self.toggle_edit(),
            LightboxKey::Delete => {
                self.delete_current();
            }
        }
        KeyOutcome::Handled
    }

    // --- Contents ---

    /// Switch to another album: close, drop the current gallery and load the new one.
    pub fn show_album(&mut self, album_id: &str) -> Option<RequestId> {
        self.close();
        self.index = GalleryIndex::new(Some(album_id.to_string()), Vec::new());
        self.view.contents_changed(&self.index);
        self.reload()
    }

    /// Request a full contents reload of the current album.
    pub fn reload(&mut self) -> Option<RequestId> {
        let album_id = self.index.album_id()?.to_string();
        let api = Arc::clone(&self.api);

        self.reload_generation += 1;
        tracing::debug!(album = %album_id, generation = self.reload_generation, "Reloading contents");
        Some(self.requests.spawn(RequestKind::LoadContents, self.reload_generation, move || {
            let contents = api.list_contents(&album_id)?;
            Ok(RequestOutcome::Contents { album_id, contents })
        }))
    }

    /// Replace the gallery wholesale.
    ///
    /// An open presentation is re-validated by source: it follows its item to
    /// the new position, or closes when the item is gone.
    pub fn replace_index(&mut self, index: GalleryIndex) {
        let previous = self.current_item().cloned();
        self.index = index;
        self.view.contents_changed(&self.index);

        let Some(previous) = previous else {
            return;
        };
        let Some(position) = self.index.position_of(&previous.source) else {
            tracing::debug!(source = %previous.source, "Presented item disappeared on reload");
            self.close();
            return;
        };

        self.state.current_position = Some(position);
        self.state.has_prev = self.index.neighbor(position, Direction::Previous).is_some();
        self.state.has_next = self.index.neighbor(position, Direction::Next).is_some();
        self.view.set_navigation(self.state.has_prev, self.state.has_next);

        let Some(item) = self.index.get(position).cloned() else {
            return;
        };
        if (MediaItem { position, ..previous }) != item {
            self.represent(item);
        }
    }

    /// Show the refreshed data of the presented item in place.
    fn represent(&mut self, item: MediaItem) {
        let fit = match self
            .fitter
            .fit(item.natural_width, item.natural_height, self.view.viewport())
        {
            Ok(fit) => fit,
            Err(e) => {
                tracing::warn!(source = %item.source, error = %e, "Reloaded media no longer fits; closing");
                self.close();
                return;
            }
        };

        tracing::debug!(source = %item.source, "Presented item changed on reload");
        if item.kind == MediaKind::Video {
            self.stop_playback();
        }
        self.view.present(&item, fit);
        if item.kind == MediaKind::Video {
            self.start_playback();
        }
    }

    // --- Polling ---

    /// Apply finished requests, settle video pauses and fire a due reopen.
    /// Call once per turn of the UI loop.
    pub fn poll_updates(&mut self) -> Vec<LightboxEvent> {
        let mut events = Vec::new();

        for completion in self.requests.poll_completions() {
            self.apply_completion(completion, &mut events);
        }

        let view = &mut self.view;
        self.awaiting_pause.retain_mut(|playback| match playback.poll() {
            Some(Ok(())) => {
                view.pause_video();
                false
            }
            Some(Err(reason)) => {
                tracing::debug!(reason = %reason, "Closed video never started");
                false
            }
            None => true,
        });

        if self.deferred_play && self.awaiting_pause.is_empty() {
            self.deferred_play = false;
            if self.current_item().map(|item| item.kind) == Some(MediaKind::Video) {
                self.playback = Some(self.view.play_video());
            }
        }

        if let Some(scheduled) = self.scheduled_open {
            if Instant::now() >= scheduled.due {
                self.scheduled_open = None;
                if self.index.exists(scheduled.position) {
                    if let Err(e) = self.open(scheduled.position) {
                        tracing::warn!(position = scheduled.position, error = %e, "Failed to open neighbour");
                    }
                } else {
                    tracing::debug!(position = scheduled.position, "Queued position vanished before reopen");
                }
            }
        }

        events
    }

    fn apply_completion(&mut self, completion: Completion, events: &mut Vec<LightboxEvent>) {
        let Completion {
            kind,
            generation,
            result,
            ..
        } = completion;

        match kind {
            RequestKind::LoadContents => {
                if generation != self.reload_generation {
                    tracing::debug!(generation, latest = self.reload_generation, "Discarding stale contents");
                    return;
                }
                match result {
                    Ok(RequestOutcome::Contents { album_id, contents }) => {
                        if self.index.album_id() != Some(album_id.as_str()) {
                            tracing::debug!(album = %album_id, "Discarding contents of another album");
                            return;
                        }
                        let index = GalleryIndex::from_contents(&album_id, contents);
                        let count = index.len();
                        self.replace_index(index);
                        tracing::info!(album = %album_id, count, "Contents loaded");
                        events.push(LightboxEvent::ContentsReloaded { album_id, count });
                    }
                    Ok(other) => tracing::warn!(outcome = ?other, "Unexpected contents outcome"),
                    Err(e) => {
                        tracing::warn!(error = %e, "Error loading contents");
                        events.push(failed(kind, &e));
                    }
                }
            }
            RequestKind::SaveEdit | RequestKind::DeleteContent => {
                match result {
                    Ok(RequestOutcome::Saved { source }) => events.push(LightboxEvent::Saved { source }),
                    Ok(RequestOutcome::Deleted { source }) => events.push(LightboxEvent::Deleted { source }),
                    Ok(other) => tracing::warn!(outcome = ?other, "Unexpected update outcome"),
                    Err(e) => {
                        tracing::error!(request = kind.display_name(), error = %e, "Update request failed");
                        events.push(failed(kind, &e));
                    }
                }
                if generation == self.presentation {
                    self.close();
                }
                self.reload();
            }
            RequestKind::Download => match result {
                Ok(RequestOutcome::Downloaded { filename, bytes }) => {
                    match self.view.save_download(&filename, &bytes) {
                        Ok(path) => {
                            tracing::info!(path = ?path, bytes = bytes.len(), "Download saved");
                            events.push(LightboxEvent::Downloaded { path });
                        }
                        Err(e) => {
                            tracing::error!(filename = %filename, error = %e, "Error saving download");
                            events.push(failed(kind, &e));
                        }
                    }
                }
                Ok(other) => tracing::warn!(outcome = ?other, "Unexpected download outcome"),
                Err(e) => {
                    tracing::error!(error = %e, "Error downloading content");
                    events.push(failed(kind, &e));
                }
            },
            RequestKind::LoadAlbums => {
                tracing::debug!("Album list completion routed to lightbox; ignoring");
            }
        }
    }
}

fn failed(kind: RequestKind, error: &Error) -> LightboxEvent {
    LightboxEvent::Failed {
        kind,
        message: error.to_string(),
    }
}
