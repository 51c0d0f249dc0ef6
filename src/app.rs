use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use kalbum::api::{ContentApi, HttpContentApi};
use kalbum::config::Config;
use kalbum::lightbox::{KeyOutcome, Lightbox, LightboxEvent, LightboxKey, LightboxOptions};
use kalbum::tasks::{RequestKind, RequestManager, RequestOutcome};

use crate::ui;
use crate::ui::album_dialog::AlbumDialog;
use crate::ui::lightbox::TerminalView;

/// Rows moved by Ctrl+d / Ctrl+u in the gallery.
const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Gallery,
    AlbumSelect,
    Help,
}

pub struct App {
    pub config: Config,
    pub api: Arc<HttpContentApi>,
    pub lightbox: Lightbox<TerminalView>,
    pub mode: AppMode,
    pub album_dialog: AlbumDialog,
    /// Requests owned by the app rather than the lightbox (the album list).
    pub requests: RequestManager,
    pub status_message: Option<String>,
    pub should_quit: bool,
    /// Terminal graphics can leave artifacts behind when the lightbox closes.
    pub clear_on_next_render: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        let api = Arc::new(HttpContentApi::from_config(&config.server));
        let content_api: Arc<dyn ContentApi> = api.clone();
        let view = TerminalView::new(Arc::clone(&content_api), &config);
        let lightbox = Lightbox::new(view, content_api, LightboxOptions::from(&config.viewer));

        let mut app = Self {
            config,
            api,
            lightbox,
            mode: AppMode::AlbumSelect,
            album_dialog: AlbumDialog::default(),
            requests: RequestManager::new(),
            status_message: None,
            should_quit: false,
            clear_on_next_render: false,
        };

        app.load_albums();
        if let Some(album_id) = app.config.default_album.clone() {
            app.lightbox.show_album(&album_id);
            app.mode = AppMode::Gallery;
        }
        app
    }

    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        while !self.should_quit {
            self.poll_album_requests();

            let was_open = self.lightbox.is_open();
            for event in self.lightbox.poll_updates() {
                self.report(event);
            }
            if was_open && !self.lightbox.is_open() {
                self.clear_on_next_render = true;
            }

            let size = terminal.size()?;
            // Last row is the status bar
            self.lightbox
                .view_mut()
                .set_area(Rect::new(0, 0, size.width, size.height.saturating_sub(1)));

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key)?,
                    Event::Resize(_, _) => self.clear_on_next_render = true,
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Title for the gallery: the album's name when known, else its id.
    pub fn album_title(&self) -> String {
        match self.lightbox.gallery().album_id() {
            Some(id) => self
                .album_dialog
                .albums
                .iter()
                .find(|a| a.id == id)
                .map(|a| a.name.clone())
                .unwrap_or_else(|| id.to_string()),
            None => "No album".to_string(),
        }
    }

    fn load_albums(&mut self) {
        if self.requests.is_pending(RequestKind::LoadAlbums) {
            return;
        }
        self.album_dialog.loading = true;
        let api = Arc::clone(&self.api);
        self.requests.spawn(RequestKind::LoadAlbums, 0, move || {
            // A missing token only matters for writes; listing still works.
            if let Err(e) = api.bootstrap_session() {
                tracing::warn!(error = %e, "Could not read CSRF token from index page");
            }
            tracing::debug!(has_token = api.session().csrf_token().is_some(), "Session bootstrapped");
            Ok(RequestOutcome::Albums(api.list_albums()?))
        });
    }

    fn poll_album_requests(&mut self) {
        for completion in self.requests.poll_completions() {
            match completion.result {
                Ok(RequestOutcome::Albums(albums)) => {
                    tracing::info!(count = albums.len(), "Albums loaded");
                    let current = self.lightbox.gallery().album_id().map(str::to_string);
                    self.album_dialog.set_albums(albums, current.as_deref());
                }
                Ok(other) => tracing::warn!(outcome = ?other, "Unexpected album list outcome"),
                Err(e) => {
                    tracing::error!(error = %e, "Error loading albums");
                    self.album_dialog.loading = false;
                    self.album_dialog.error = Some(e.to_string());
                    self.status_message = Some(format!("{}: {}", completion.kind.display_name(), e));
                }
            }
        }
    }

    fn report(&mut self, event: LightboxEvent) {
        self.status_message = Some(match event {
            LightboxEvent::ContentsReloaded { count, .. } => format!("Loaded {} items", count),
            LightboxEvent::Saved { .. } => "Properties saved".to_string(),
            LightboxEvent::Deleted { source } => {
                format!("Deleted {}", kalbum::api::download_filename(&source))
            }
            LightboxEvent::Downloaded { path } => format!("Saved to {}", path.display()),
            LightboxEvent::Failed { kind, message } => format!("{} failed: {}", kind.display_name(), message),
        });
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        self.status_message = None;

        if self.mode == AppMode::Help {
            self.mode = AppMode::Gallery;
            return Ok(());
        }

        if self.lightbox.is_open() {
            if self.lightbox.state().editing_active {
                self.handle_edit_key(key);
            } else {
                self.handle_lightbox_key(key);
            }
            if !self.lightbox.is_open() {
                self.clear_on_next_render = true;
            }
            return Ok(());
        }

        match self.mode {
            AppMode::AlbumSelect => self.handle_album_key(key),
            AppMode::Gallery => self.handle_gallery_key(key),
            AppMode::Help => {}
        }
        Ok(())
    }

    fn handle_lightbox_key(&mut self, key: KeyEvent) {
        let mapped = match key.code {
            KeyCode::Left | KeyCode::Char('h') => Some(LightboxKey::ArrowLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(LightboxKey::ArrowRight),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('e') => Some(LightboxKey::ArrowUp),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('d') => Some(LightboxKey::ArrowDown),
            KeyCode::Esc | KeyCode::Char('q') => Some(LightboxKey::Escape),
            KeyCode::Delete | KeyCode::Char('x') => Some(LightboxKey::Delete),
            KeyCode::Char('?') => {
                self.mode = AppMode::Help;
                None
            }
            _ => None,
        };

        if let Some(lightbox_key) = mapped {
            if self.lightbox.handle_key(lightbox_key) == KeyOutcome::Ignored {
                tracing::trace!(key = ?lightbox_key, "Lightbox ignored key");
            }
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.lightbox.handle_key(LightboxKey::Escape);
                return;
            }
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.lightbox.cancel_edit();
                return;
            }
            KeyCode::Enter => {
                let values = self
                    .lightbox
                    .view()
                    .edit_panel
                    .as_ref()
                    .map(|panel| (panel.alt.text.clone(), panel.caption.text.clone()));
                if let Some((alt, caption)) = values {
                    self.lightbox.save_edit(&alt, &caption);
                    self.status_message = Some("Saving...".to_string());
                }
                return;
            }
            _ => {}
        }

        let Some(panel) = self.lightbox.view_mut().edit_panel.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => panel.toggle_focus(),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => panel.revert(),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => panel.focused_mut().clear(),
            KeyCode::Backspace => panel.focused_mut().backspace(),
            KeyCode::Delete => panel.focused_mut().delete(),
            KeyCode::Left if key.modifiers.contains(KeyModifiers::CONTROL) => {
                panel.focused_mut().move_cursor_word_left()
            }
            KeyCode::Right if key.modifiers.contains(KeyModifiers::CONTROL) => {
                panel.focused_mut().move_cursor_word_right()
            }
            KeyCode::Left => panel.focused_mut().move_cursor_left(),
            KeyCode::Right => panel.focused_mut().move_cursor_right(),
            KeyCode::Home => panel.focused_mut().move_cursor_home(),
            KeyCode::End => panel.focused_mut().move_cursor_end(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                panel.focused_mut().handle_char(c)
            }
            _ => {}
        }
    }

    fn handle_album_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.album_dialog.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.album_dialog.move_up(),
            KeyCode::Char('r') => self.load_albums(),
            KeyCode::Enter | KeyCode::Char('l') => {
                if let Some(album) = self.album_dialog.selected_album() {
                    let album_id = album.id.clone();
                    tracing::info!(album = %album_id, "Opening album");
                    self.lightbox.show_album(&album_id);
                    self.lightbox.view_mut().list.go_to_top();
                    self.mode = AppMode::Gallery;
                }
            }
            KeyCode::Esc => {
                if self.lightbox.gallery().album_id().is_some() {
                    self.mode = AppMode::Gallery;
                }
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_gallery_key(&mut self, key: KeyEvent) {
        let len = self.lightbox.gallery().len();
        let list = &mut self.lightbox.view_mut().list;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.mode = AppMode::Help,
            // Cancels a video neighbour that is still waiting to open.
            KeyCode::Esc => {
                if self.lightbox.handle_key(LightboxKey::Escape) == KeyOutcome::Handled {
                    tracing::debug!("Queued reopen cancelled");
                }
            }
            KeyCode::Char('a') => {
                self.mode = AppMode::AlbumSelect;
                if self.album_dialog.albums.is_empty() {
                    self.load_albums();
                }
            }
            KeyCode::Char('r') => {
                if self.lightbox.reload().is_some() {
                    self.status_message = Some("Reloading...".to_string());
                }
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => list.page_down(len, PAGE_SIZE),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => list.page_up(PAGE_SIZE),
            KeyCode::Char('j') | KeyCode::Down => list.move_down(len),
            KeyCode::Char('k') | KeyCode::Up => list.move_up(),
            KeyCode::Char('g') | KeyCode::Home => list.go_to_top(),
            KeyCode::Char('G') | KeyCode::End => list.go_to_bottom(len),
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                let position = list.selected;
                if let Err(e) = self.lightbox.open(position) {
                    self.status_message = Some(format!("Cannot open: {}", e));
                }
            }
            _ => {}
        }
    }
}
