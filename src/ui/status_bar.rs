use ratatui::{prelude::*, widgets::Paragraph};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(ref message) = app.status_message {
        let line = Line::from(vec![Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Yellow).bg(Color::DarkGray),
        )]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let gallery = app.lightbox.gallery();
    let item_count = gallery.len();
    let video_count = gallery
        .iter()
        .filter(|item| item.kind == kalbum::MediaKind::Video)
        .count();

    let position = match app.lightbox.state().current_position {
        Some(p) => format!("{}/{}", p + 1, item_count),
        None if item_count > 0 => format!("{}/{}", app.lightbox.view().list.selected + 1, item_count),
        None => "0/0".to_string(),
    };

    // In-flight server requests
    let task_indicators: Vec<String> = app
        .requests
        .pending_requests()
        .into_iter()
        .chain(app.lightbox.pending_requests())
        .map(|request| format!("[{}:{}s]", request.kind.short_name(), request.elapsed().as_secs()))
        .collect();

    let mut spans = vec![
        Span::styled(
            format!(" {} ", app.album_title()),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        ),
        Span::styled(
            format!(" {} images, {} videos ", item_count - video_count, video_count),
            Style::default().fg(Color::Gray),
        ),
    ];

    if !task_indicators.is_empty() {
        spans.push(Span::styled(
            format!(" {} ", task_indicators.join(" ")),
            Style::default().fg(Color::Cyan),
        ));
    }

    let content_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let help_text = if app.lightbox.state().editing_active {
        format!(" {} | Enter:save Tab:field Esc:close ", position)
    } else if app.lightbox.is_open() {
        format!(" {} | ←/→ ↑:edit ↓:get Esc ", position)
    } else {
        format!(" {} | a:albums r:reload ?:help q:quit ", position)
    };
    let help_len = help_text.chars().count();

    let available = area.width as usize;
    if available > content_len + help_len {
        spans.push(Span::raw(" ".repeat(available - content_len - help_len)));
    }

    spans.push(Span::styled(
        help_text,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
