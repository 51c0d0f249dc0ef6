pub mod album_dialog;
mod dialogs;
pub mod edit_dialog;
pub mod gallery;
pub mod lightbox;
mod status_bar;

use ratatui::prelude::*;
use ratatui::widgets::Clear;

use crate::app::{App, AppMode};

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    if app.clear_on_next_render {
        frame.render_widget(Clear, area);
        app.clear_on_next_render = false;
    }

    // Content area + status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let title = app.album_title();
    if app.lightbox.is_open() {
        lightbox::render(frame, app.lightbox.view_mut(), main_chunks[0]);
    } else {
        let (index, view) = app.lightbox.split_mut();
        gallery::render(frame, index, &mut view.list, &title, main_chunks[0]);
    }

    status_bar::render(frame, app, main_chunks[1]);

    match app.mode {
        AppMode::AlbumSelect => album_dialog::render(frame, &app.album_dialog),
        AppMode::Help => dialogs::render_help(frame, area),
        AppMode::Gallery => {}
    }
}
