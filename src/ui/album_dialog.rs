//! Album picker shown on startup and on demand.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use kalbum::api::AlbumSummary;

/// Album list state.
#[derive(Debug, Default)]
pub struct AlbumDialog {
    pub albums: Vec<AlbumSummary>,
    pub selected: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl AlbumDialog {
    /// Replace the list, keeping the selection on `current` when it is still there.
    pub fn set_albums(&mut self, albums: Vec<AlbumSummary>, current: Option<&str>) {
        self.selected = current
            .and_then(|id| albums.iter().position(|a| a.id == id))
            .unwrap_or(0);
        self.albums = albums;
        self.loading = false;
        self.error = None;
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.albums.len() {
            self.selected += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_album(&self) -> Option<&AlbumSummary> {
        self.albums.get(self.selected)
    }
}

pub fn render(frame: &mut Frame, dialog: &AlbumDialog) {
    let area = frame.area();

    let dialog_width = 50.min(area.width.saturating_sub(4));
    let dialog_height = 16.min(area.height.saturating_sub(4));

    let dialog_x = (area.width.saturating_sub(dialog_width)) / 2;
    let dialog_y = (area.height.saturating_sub(dialog_height)) / 2;

    let dialog_area = Rect::new(dialog_x, dialog_y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Albums ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    if dialog.loading {
        let text = Paragraph::new("Loading albums...")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(text, chunks[0]);
    } else if let Some(ref error) = dialog.error {
        let text = Paragraph::new(format!("Could not load albums:\n{}", error))
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        frame.render_widget(text, chunks[0]);
    } else if dialog.albums.is_empty() {
        let text = Paragraph::new("No albums")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(text, chunks[0]);
    } else {
        let visible = chunks[0].height as usize;
        let offset = (dialog.selected + 1).saturating_sub(visible);
        let lines: Vec<Line> = dialog
            .albums
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(idx, album)| {
                let style = if idx == dialog.selected {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!(" {} ", album.name), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), chunks[0]);
    }

    let help = Paragraph::new("j/k:move  Enter:open  r:refresh  Esc:close")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(id: &str) -> AlbumSummary {
        AlbumSummary {
            id: id.to_string(),
            name: id.to_uppercase(),
        }
    }

    #[test]
    fn test_set_albums_keeps_current_selected() {
        let mut dialog = AlbumDialog {
            loading: true,
            ..AlbumDialog::default()
        };
        dialog.set_albums(vec![album("a"), album("b"), album("c")], Some("c"));
        assert_eq!(dialog.selected, 2);
        assert!(!dialog.loading);

        dialog.set_albums(vec![album("a")], Some("c"));
        assert_eq!(dialog.selected_album().map(|a| a.id.as_str()), Some("a"));
    }

    #[test]
    fn test_movement_is_bounded() {
        let mut dialog = AlbumDialog::default();
        dialog.set_albums(vec![album("a"), album("b")], None);
        dialog.move_down();
        dialog.move_down();
        assert_eq!(dialog.selected, 1);
        dialog.move_up();
        dialog.move_up();
        assert_eq!(dialog.selected, 0);
    }
}
