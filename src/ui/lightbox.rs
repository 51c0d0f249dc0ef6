//! Terminal rendering of the lightbox: the `LightboxView` the controller drives.

use image::{imageops::FilterType, DynamicImage};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};
use ratatui_image::{picker::Picker, protocol::StatefulProtocol, Resize, StatefulImage};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use kalbum::api::{download_filename, ContentApi};
use kalbum::config::{Config, ImageProtocol};
use kalbum::fit::{FitResult, Viewport};
use kalbum::gallery::{GalleryIndex, MediaItem, MediaKind};
use kalbum::lightbox::{LightboxView, PlayRequest};

use super::edit_dialog::{self, EditPropertiesDialog};
use super::gallery::GalleryList;

/// Rows taken by the caption line and the frame border around the media.
const CHROME_ROWS: u16 = 3;
const CHROME_COLS: u16 = 2;

type LoadResult = (String, std::result::Result<DynamicImage, String>);

/// What is currently on screen.
struct Presented {
    item: MediaItem,
    fit: FitResult,
    protocol: Option<StatefulProtocol>,
    load_error: Option<String>,
    playing: bool,
}

pub struct TerminalView {
    api: Arc<dyn ContentApi>,
    picker: Option<Picker>,
    /// Terminal area available to the lightbox, in cells.
    area: Rect,
    cell_width_px: u16,
    cell_height_px: u16,
    download_dir: PathBuf,
    presented: Option<Presented>,
    has_prev: bool,
    has_next: bool,
    pub edit_panel: Option<EditPropertiesDialog>,
    pub list: GalleryList,
    sender: mpsc::Sender<LoadResult>,
    receiver: mpsc::Receiver<LoadResult>,
}

impl TerminalView {
    pub fn new(api: Arc<dyn ContentApi>, config: &Config) -> Self {
        let picker = Self::create_picker(config);
        let (sender, receiver) = mpsc::channel();
        Self {
            api,
            picker,
            area: Rect::default(),
            cell_width_px: config.viewer.cell_width_px.max(1),
            cell_height_px: config.viewer.cell_height_px.max(1),
            download_dir: config.downloads.dir.clone(),
            presented: None,
            has_prev: false,
            has_next: false,
            edit_panel: None,
            list: GalleryList::default(),
            sender,
            receiver,
        }
    }

    fn create_picker(config: &Config) -> Option<Picker> {
        if !config.viewer.image_preview {
            return None;
        }
        match config.viewer.protocol {
            ImageProtocol::None => None,
            ImageProtocol::Halfblocks => Some(Picker::from_fontsize((
                config.viewer.cell_width_px.max(1),
                config.viewer.cell_height_px.max(1),
            ))),
            _ => match Picker::from_query_stdio() {
                Ok(picker) => Some(picker),
                Err(e) => {
                    tracing::warn!(error = ?e, "Terminal image protocol query failed; previews disabled");
                    None
                }
            },
        }
    }

    /// Record the terminal area the lightbox may cover.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    /// Apply finished preview loads for the presented item; others are stale.
    pub fn poll_async_loads(&mut self) {
        while let Ok((source, result)) = self.receiver.try_recv() {
            let Some(presented) = self.presented.as_mut() else {
                continue;
            };
            if presented.item.source != source {
                continue;
            }
            match result {
                Ok(dyn_img) => {
                    if let Some(ref mut picker) = self.picker {
                        presented.protocol = Some(picker.new_resize_protocol(dyn_img));
                    }
                }
                Err(message) => presented.load_error = Some(message),
            }
        }
    }

    fn media_rows(&self) -> u16 {
        self.area.height.saturating_sub(CHROME_ROWS)
    }

    fn media_cols(&self) -> u16 {
        self.area.width.saturating_sub(CHROME_COLS)
    }

    /// Load the still shown for `item`: the asset itself, or a video's thumbnail.
    fn start_preview_load(&self, item: &MediaItem, fit: FitResult) {
        if self.picker.is_none() {
            return;
        }
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        let source = item.source.clone();
        let locator = match item.kind {
            MediaKind::Image => item.source.clone(),
            MediaKind::Video => item.thumbnail.clone(),
        };
        let width = fit.display_width.ceil().max(1.0) as u32;
        let height = fit.display_height.ceil().max(1.0) as u32;

        let spawned = std::thread::Builder::new()
            .name("kalbum-preview".to_string())
            .spawn(move || {
                let result = api
                    .fetch_content(&locator)
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| image::load_from_memory(&bytes).map_err(|e| e.to_string()))
                    .map(|img| img.resize(width, height, FilterType::Triangle));
                if let Err(ref e) = result {
                    tracing::debug!(locator = %locator, error = %e, "Preview load failed");
                }
                let _ = sender.send((source, result));
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Failed to spawn preview loader");
        }
    }
}

impl LightboxView for TerminalView {
    fn viewport(&self) -> Viewport {
        Viewport::new(
            f64::from(self.media_cols()) * f64::from(self.cell_width_px),
            f64::from(self.media_rows()) * f64::from(self.cell_height_px),
        )
    }

    fn present(&mut self, item: &MediaItem, fit: FitResult) {
        self.start_preview_load(item, fit);
        self.presented = Some(Presented {
            item: item.clone(),
            fit,
            protocol: None,
            load_error: None,
            playing: false,
        });
    }

    fn dismiss(&mut self) {
        self.presented = None;
    }

    fn set_navigation(&mut self, has_prev: bool, has_next: bool) {
        self.has_prev = has_prev;
        self.has_next = has_next;
    }

    fn play_video(&mut self) -> PlayRequest {
        match self.presented.as_mut() {
            Some(presented) if presented.item.kind == MediaKind::Video => {
                presented.playing = true;
                PlayRequest::resolved()
            }
            _ => PlayRequest::rejected("no video presented"),
        }
    }

    fn pause_video(&mut self) {
        if let Some(presented) = self.presented.as_mut() {
            presented.playing = false;
        }
    }

    fn show_edit_panel(&mut self, alt: &str, caption: &str) {
        self.edit_panel = Some(EditPropertiesDialog::new(alt, caption));
    }

    fn hide_edit_panel(&mut self) {
        self.edit_panel = None;
    }

    fn save_download(&mut self, filename: &str, bytes: &[u8]) -> kalbum::Result<PathBuf> {
        std::fs::create_dir_all(&self.download_dir)?;
        let path = self.download_dir.join(safe_filename(filename));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    fn contents_changed(&mut self, index: &GalleryIndex) {
        self.list.clamp(index.len());
    }

    fn reveal(&mut self, position: usize) {
        self.list.select(position);
    }
}

/// The trailing locator segment, or a fallback when it can't name a file.
fn safe_filename(filename: &str) -> &str {
    let name = download_filename(filename);
    match name {
        "" | "." | ".." => "download",
        name => name,
    }
}

/// Cells needed to show `fit` pixels, centred in `area`.
fn media_rect(area: Rect, fit: FitResult, cell_width_px: u16, cell_height_px: u16) -> Rect {
    let cols = (fit.display_width / f64::from(cell_width_px)).ceil() as u16;
    let rows = (fit.display_height / f64::from(cell_height_px)).ceil() as u16;
    let width = cols.clamp(1, area.width.max(1)).min(area.width);
    let height = rows.clamp(1, area.height.max(1)).min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

pub fn render(frame: &mut Frame, view: &mut TerminalView, area: Rect) {
    view.poll_async_loads();

    let (cell_w, cell_h) = (view.cell_width_px, view.cell_height_px);
    let (has_prev, has_next) = (view.has_prev, view.has_next);
    let Some(presented) = view.presented.as_mut() else {
        return;
    };

    frame.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let name = download_filename(&presented.item.source).to_string();
    let title = format!(
        " {} {}x{} ",
        name, presented.item.natural_width as u32, presented.item.natural_height as u32
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
        .title_bottom(Line::from(nav_hint(has_prev, has_next)).right_aligned())
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);

    let media_area = media_rect(inner, presented.fit, cell_w, cell_h);
    if let Some(ref mut protocol) = presented.protocol {
        let image = StatefulImage::new(None).resize(Resize::Fit(None));
        frame.render_stateful_widget(image, media_area, protocol);
    } else {
        let placeholder = match (&presented.load_error, presented.item.kind) {
            (Some(e), _) => format!("Preview unavailable: {}", e),
            (None, MediaKind::Image) => "Loading...".to_string(),
            (None, MediaKind::Video) => format!("[{}]", presented.item.content_type),
        };
        let text = Paragraph::new(placeholder)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(text, centered_line(media_area));
    }

    if presented.item.kind == MediaKind::Video {
        let status = if presented.playing { "▶ Playing" } else { "⏸ Paused" };
        let badge = Paragraph::new(status).style(Style::default().fg(Color::Green));
        frame.render_widget(badge, Rect::new(inner.x, inner.y, inner.width.min(12), 1.min(inner.height)));
    }

    let caption = match presented.item.caption.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => presented.item.alt_text(),
    };
    let caption_line = Paragraph::new(caption.to_string())
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center);
    frame.render_widget(caption_line, chunks[1]);

    if let Some(ref panel) = view.edit_panel {
        edit_dialog::render(frame, panel, area);
    }
}

fn nav_hint(has_prev: bool, has_next: bool) -> String {
    let prev = if has_prev { "← prev" } else { "" };
    let next = if has_next { "next →" } else { "" };
    format!(" {} ↑:edit ↓:download Del:delete Esc:close {} ", prev, next)
}

fn centered_line(area: Rect) -> Rect {
    Rect::new(area.x, area.y + area.height / 2, area.width, 1.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalbum::api::{AlbumSummary, ContentData};
    use kalbum::config::ViewerConfig;

    struct NoServer;

    impl ContentApi for NoServer {
        fn list_albums(&self) -> kalbum::Result<Vec<AlbumSummary>> {
            Ok(Vec::new())
        }
        fn list_contents(&self, _album_id: &str) -> kalbum::Result<Vec<ContentData>> {
            Ok(Vec::new())
        }
        fn update_content(&self, _locator: &str, _alt: &str, _text: &str) -> kalbum::Result<()> {
            Ok(())
        }
        fn delete_content(&self, _locator: &str) -> kalbum::Result<()> {
            Ok(())
        }
        fn fetch_content(&self, _locator: &str) -> kalbum::Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn view_in(dir: &std::path::Path) -> TerminalView {
        let mut config = Config::default();
        config.viewer = ViewerConfig {
            image_preview: false,
            ..ViewerConfig::default()
        };
        config.downloads.dir = dir.to_path_buf();
        TerminalView::new(Arc::new(NoServer), &config)
    }

    #[test]
    fn test_viewport_is_measured_in_pixels() {
        let temp = tempfile::tempdir().unwrap();
        let mut view = view_in(temp.path());
        view.set_area(Rect::new(0, 0, 102, 53));
        let viewport = view.viewport();
        assert_eq!(viewport.width, 1000.0);
        assert_eq!(viewport.height, 1000.0);
    }

    #[test]
    fn test_save_download_writes_into_download_dir() {
        let temp = tempfile::tempdir().unwrap();
        let mut view = view_in(&temp.path().join("nested"));

        let path = view.save_download("beach.jpg", b"jpeg").unwrap();
        assert_eq!(path, temp.path().join("nested").join("beach.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg");

        let path = view.save_download("..", b"x").unwrap();
        assert!(path.ends_with("download"));
    }

    #[test]
    fn test_play_requires_presented_video() {
        let temp = tempfile::tempdir().unwrap();
        let mut view = view_in(temp.path());
        assert!(matches!(view.play_video().poll(), Some(Err(_))));
    }

    #[test]
    fn test_media_rect_centres_fit() {
        let area = Rect::new(0, 0, 100, 50);
        let fit = FitResult {
            display_width: 500.0,
            display_height: 200.0,
        };
        let rect = media_rect(area, fit, 10, 20);
        assert_eq!(rect, Rect::new(25, 20, 50, 10));
    }
}
