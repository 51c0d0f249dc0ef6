//! Gallery list: one row per rendered album item.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use kalbum::api::download_filename;
use kalbum::gallery::{GalleryIndex, MediaItem, MediaKind};

/// Selection and scroll state of the gallery list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GalleryList {
    pub selected: usize,
    pub scroll_offset: usize,
}

impl GalleryList {
    pub fn select(&mut self, position: usize) {
        self.selected = position;
    }

    pub fn move_down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn go_to_bottom(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    pub fn page_down(&mut self, len: usize, page: usize) {
        self.selected = (self.selected + page).min(len.saturating_sub(1));
    }

    pub fn page_up(&mut self, page: usize) {
        self.selected = self.selected.saturating_sub(page);
    }

    /// Keep the selection inside a list of `len` rows.
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
        self.scroll_offset = self.scroll_offset.min(self.selected);
    }

    /// Scroll just enough for the selection to be visible in `visible` rows.
    fn adjust_scroll(&mut self, visible: usize) {
        if visible == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible {
            self.scroll_offset = self.selected + 1 - visible;
        }
    }
}

fn item_line(item: &MediaItem, selected: bool, width: usize) -> Line<'static> {
    let icon = match item.kind {
        MediaKind::Image => "▣",
        MediaKind::Video => "▶",
    };
    let added = item
        .added
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "          ".to_string());
    let name = download_filename(&item.source);
    let size = format!("{}x{}", item.natural_width as u32, item.natural_height as u32);

    let mut text = format!(
        " {} {:<32} {:>11}  {}  {}",
        icon,
        name,
        size,
        added,
        item.caption_text()
    );
    if text.chars().count() > width {
        text = text.chars().take(width.saturating_sub(1)).collect::<String>() + "…";
    }

    let style = if selected {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else if item.kind == MediaKind::Video {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default()
    };
    Line::from(Span::styled(text, style))
}

pub fn render(frame: &mut Frame, index: &GalleryIndex, list: &mut GalleryList, title: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", title));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if index.is_empty() {
        let text = Paragraph::new("No images or videos in this album")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(text, inner);
        return;
    }

    let visible = inner.height as usize;
    list.clamp(index.len());
    list.adjust_scroll(visible);

    let lines: Vec<Line> = index
        .iter()
        .skip(list.scroll_offset)
        .take(visible)
        .map(|item| item_line(item, item.position == list.selected, inner.width as usize))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut list = GalleryList::default();
        list.move_up();
        assert_eq!(list.selected, 0);
        list.move_down(3);
        list.move_down(3);
        list.move_down(3);
        assert_eq!(list.selected, 2);
        list.page_up(10);
        assert_eq!(list.selected, 0);
        list.page_down(3, 10);
        assert_eq!(list.selected, 2);
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut list = GalleryList {
            selected: 8,
            scroll_offset: 5,
        };
        list.clamp(3);
        assert_eq!(list.selected, 2);
        assert_eq!(list.scroll_offset, 2);
        list.clamp(0);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_scroll_follows_selection() {
        let mut list = GalleryList::default();
        list.select(12);
        list.adjust_scroll(5);
        assert_eq!(list.scroll_offset, 8);
        list.select(3);
        list.adjust_scroll(5);
        assert_eq!(list.scroll_offset, 3);
    }
}
